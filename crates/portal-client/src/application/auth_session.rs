//! AuthSession: the observable, single-flight auth state machine.
//!
//! # State cell
//!
//! The current [`AuthState`] lives in a `tokio::sync::watch` channel.  The
//! presentation layer either polls [`AuthSession::current_state`] or holds a
//! receiver from [`AuthSession::subscribe`] and awaits `changed()`.
//!
//! # Single flight
//!
//! `submit_*` moves the cell to `Loading` *inside the channel's write lock*
//! and only then spawns the request.  A second submission that arrives while
//! the cell is `Loading` sees that state under the same lock and is rejected
//! with [`SubmitError::AlreadyInFlight`] without touching the cell.  The only
//! writer that can take the cell out of `Loading` is the spawned request task,
//! so each accepted submission produces exactly one terminal write.  A task
//! that panics (a misbehaving [`SuccessHook`](crate::application::auth_client::SuccessHook))
//! still makes that write: `Error` with [`INTERRUPTED_MESSAGE`].
//!
//! ```text
//!             submit_*                 request task
//!   Idle ───────────────► Loading ───────────────────► Success | Error
//!    ▲                       ▲                               │
//!    │ reset()               └───────── submit_* ────────────┤
//!    └───────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;

use portal_core::{AuthOperation, AuthResult, AuthState, Credentials, RegistrationRequest};
use tokio::sync::watch;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::application::auth_client::AuthClient;
use crate::application::submission::{
    Completion, SubmitError, Submission, INTERRUPTED_MESSAGE,
};

/// One client session's auth state machine.
///
/// Cloning is cheap; clones share the same state cell and client.
#[derive(Clone)]
pub struct AuthSession {
    client: Arc<AuthClient>,
    state: Arc<watch::Sender<AuthState>>,
}

impl AuthSession {
    /// Creates a session in the `Idle` state.
    pub fn new(client: Arc<AuthClient>) -> Self {
        let (state, _) = watch::channel(AuthState::Idle);
        Self {
            client,
            state: Arc::new(state),
        }
    }

    /// Starts a login attempt.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::AlreadyInFlight`] if a request is already
    /// `Loading`.
    pub fn submit_login(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Submission<AuthState>, SubmitError> {
        let credentials = Credentials::new(username, password);
        let client = Arc::clone(&self.client);
        self.submit(AuthOperation::Login, async move {
            client.login(&credentials).await
        })
    }

    /// Starts a registration attempt.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::AlreadyInFlight`] if a request is already
    /// `Loading`.
    pub fn submit_register(
        &self,
        nickname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Submission<AuthState>, SubmitError> {
        let request = RegistrationRequest::new(nickname, username, password);
        let client = Arc::clone(&self.client);
        self.submit(AuthOperation::Register, async move {
            client.register(&request).await
        })
    }

    /// Snapshot of the current state.
    pub fn current_state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// A receiver that observes every subsequent state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Returns a terminal state to `Idle`.  Has no effect while `Loading`.
    pub fn reset(&self) {
        self.state.send_if_modified(|state| {
            if state.is_terminal() {
                *state = AuthState::Idle;
                true
            } else {
                false
            }
        });
    }

    fn submit<F>(
        &self,
        operation: AuthOperation,
        request: F,
    ) -> Result<Submission<AuthState>, SubmitError>
    where
        F: Future<Output = AuthResult> + Send + 'static,
    {
        if !self.try_begin() {
            debug!("{operation} rejected: a request is already in flight");
            return Err(SubmitError::AlreadyInFlight);
        }

        let request_id = Uuid::new_v4();
        let state = Arc::clone(&self.state);
        let (completion, submission) = Completion::channel(
            request_id,
            move |terminal| {
                state.send_replace(terminal);
            },
            AuthState::Error(INTERRUPTED_MESSAGE.to_string()),
        );
        let span = info_span!("auth_request", %request_id, operation = %operation);

        tokio::spawn(
            async move {
                let terminal = AuthState::from(request.await);
                debug!(state = ?terminal, "publishing terminal state");
                completion.complete(terminal);
            }
            .instrument(span),
        );

        Ok(submission)
    }

    /// Moves the cell to `Loading` unless it already is.
    fn try_begin(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_loading() {
                false
            } else {
                *state = AuthState::Loading;
                true
            }
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::auth_client::{AuthEndpoints, SuccessHook};
    use crate::application::transport::{
        HttpRequest, MockTransport, RawResponse, Transport, TransportError,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use tokio_test::{assert_err, assert_ok};

    fn endpoints() -> AuthEndpoints {
        AuthEndpoints {
            login_url: "http://auth.test/login".to_string(),
            register_url: "http://auth.test/register".to_string(),
        }
    }

    fn ok(body: &str) -> RawResponse {
        RawResponse {
            status: 200,
            reason: "OK".to_string(),
            body: body.as_bytes().to_vec(),
        }
    }

    /// Holds every request until `release` is notified and counts sends.
    struct GatedTransport {
        release: Notify,
        sends: AtomicUsize,
        body: &'static str,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn send(&self, _request: HttpRequest) -> Result<RawResponse, TransportError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(ok(self.body))
        }
    }

    fn session_with(transport: Arc<dyn Transport>) -> AuthSession {
        AuthSession::new(Arc::new(AuthClient::new(transport, endpoints())))
    }

    #[tokio::test]
    async fn test_new_session_is_idle() {
        let session = session_with(Arc::new(MockTransport::new()));
        assert_eq!(session.current_state(), AuthState::Idle);
    }

    #[tokio::test]
    async fn test_login_failure_publishes_server_message() {
        // Arrange
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .return_once(|_| Ok(ok(r#"{"success":false,"message":"bad credentials"}"#)));
        let session = session_with(Arc::new(transport));

        // Act
        let submission = assert_ok!(session.submit_login("alice", "wrong"));
        let outcome = assert_ok!(submission.outcome().await);

        // Assert
        assert_eq!(outcome, AuthState::Error("bad credentials".to_string()));
        assert_eq!(session.current_state(), outcome);
    }

    #[tokio::test]
    async fn test_register_success_exposes_server_message() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .return_once(|_| Ok(ok(r#"{"status":"success","message":"ok"}"#)));
        let session = session_with(Arc::new(transport));

        let outcome = session
            .submit_register("Al", "alice", "pw")
            .unwrap()
            .outcome()
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AuthState::Success {
                nickname: "Al".to_string(),
                message: Some("ok".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_second_submit_while_loading_is_rejected() {
        // Arrange
        let transport = Arc::new(GatedTransport {
            release: Notify::new(),
            sends: AtomicUsize::new(0),
            body: r#"{"success":true,"nickname":"Al"}"#,
        });
        let session = session_with(transport.clone());
        let mut states = session.subscribe();

        // Act
        let first = assert_ok!(session.submit_login("alice", "pw"));
        let second = session.submit_login("alice", "pw");
        let third = session.submit_register("Al", "alice", "pw");

        // Assert: only the first was accepted and the cell is still Loading
        assert_eq!(assert_err!(second).to_string(), "a request is already in flight");
        assert_eq!(third.unwrap_err(), SubmitError::AlreadyInFlight);
        assert!(session.current_state().is_loading());

        transport.release.notify_one();
        let outcome = assert_ok!(first.outcome().await);
        assert_eq!(
            outcome,
            AuthState::Success {
                nickname: "Al".to_string(),
                message: None,
            }
        );
        assert_eq!(transport.sends.load(Ordering::SeqCst), 1);

        // Exactly one terminal write follows the Loading write.
        states.borrow_and_update();
        assert!(!states.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_new_attempt_allowed_after_terminal_state() {
        let mut transport = MockTransport::new();
        let mut replies = vec![
            Ok(ok(r#"{"success":true,"nickname":"Al"}"#)),
            Ok(ok(r#"{"success":false,"message":"bad credentials"}"#)),
        ];
        transport
            .expect_send()
            .times(2)
            .returning(move |_| replies.remove(0));
        let session = session_with(Arc::new(transport));

        let first = session.submit_login("alice", "wrong").unwrap();
        first.outcome().await.unwrap();
        let second = session.submit_login("alice", "wrong").unwrap();
        let outcome = second.outcome().await.unwrap();

        assert_eq!(outcome, AuthState::Error("bad credentials".to_string()));
    }

    #[tokio::test]
    async fn test_dropped_submission_still_updates_state() {
        // Arrange
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .return_once(|_| Ok(ok(r#"{"success":true,"nickname":"Al"}"#)));
        let session = session_with(Arc::new(transport));
        let mut states = session.subscribe();

        // Act
        drop(session.submit_login("alice", "pw").unwrap());
        let terminal = states
            .wait_for(AuthState::is_terminal)
            .await
            .map(|s| s.clone())
            .unwrap();

        // Assert
        assert_eq!(
            terminal,
            AuthState::Success {
                nickname: "Al".to_string(),
                message: None,
            }
        );
    }

    struct PanickingHook;

    impl SuccessHook for PanickingHook {
        fn on_success(&self, _operation: AuthOperation, _nickname: &str) {
            panic!("hook failed");
        }
    }

    #[tokio::test]
    async fn test_panicking_hook_does_not_leave_session_loading() {
        // Arrange
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(2)
            .returning(|_| Ok(ok(r#"{"success":true,"nickname":"Al"}"#)));
        let client = AuthClient::new(Arc::new(transport), endpoints())
            .with_success_hook(Arc::new(PanickingHook));
        let session = AuthSession::new(Arc::new(client));

        // Act
        let outcome = session.submit_login("alice", "pw").unwrap().outcome().await;

        // Assert: the cell left Loading and the next attempt is accepted
        assert_eq!(outcome, Err(SubmitError::Interrupted));
        assert_eq!(
            session.current_state(),
            AuthState::Error(INTERRUPTED_MESSAGE.to_string())
        );
        let retry = assert_ok!(session.submit_login("alice", "pw"));
        assert_eq!(retry.outcome().await, Err(SubmitError::Interrupted));
    }

    #[tokio::test]
    async fn test_reset_returns_terminal_state_to_idle() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .return_once(|_| Ok(ok(r#"{"success":false}"#)));
        let session = session_with(Arc::new(transport));

        session.submit_login("a", "b").unwrap().outcome().await.unwrap();
        session.reset();

        assert_eq!(session.current_state(), AuthState::Idle);
    }
}
