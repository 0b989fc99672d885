//! AuthClient: composes Transport and codec into `login` and `register`.
//!
//! # Failure normalisation
//!
//! Every way a request can go wrong ends up as one [`AuthResult::Failure`]
//! with a [`ErrorKind`] attached.  The checks run in a fixed order and the
//! first one that fires wins:
//!
//! ```text
//! transport error ─► Network      (detail: transport message)
//! status not 2xx  ─► Server       (detail: "HTTP 503 Service Unavailable")
//! body undecodable ► Protocol     (detail: decoder message)
//! flag false      ─► Application  (detail: server message, may be empty)
//! flag true       ─► Success
//! ```
//!
//! The client holds no per-request state, so one instance can serve any
//! number of sequential or concurrent requests.

use std::sync::Arc;

use portal_core::{
    decode_reply, encode_login, encode_register, AuthOperation, AuthResult, Credentials,
    EncodeError, ErrorKind, RegistrationRequest, ReplyShape, UNKNOWN_NICKNAME,
};
use tracing::{debug, error, info, warn};

use crate::application::transport::{HttpRequest, Transport};

/// Called once for every successful login or register.
///
/// This is the attachment point for anything that must happen after the
/// server accepted the account (storing a session token, remembering the last
/// username).  The hook runs on the request task and must not block.
#[cfg_attr(test, mockall::automock)]
pub trait SuccessHook: Send + Sync {
    fn on_success(&self, operation: AuthOperation, nickname: &str);
}

/// Fully resolved endpoint URLs for the two operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    pub login_url: String,
    pub register_url: String,
}

/// Stateless login/register client.
pub struct AuthClient {
    transport: Arc<dyn Transport>,
    endpoints: AuthEndpoints,
    success_hook: Option<Arc<dyn SuccessHook>>,
}

impl AuthClient {
    pub fn new(transport: Arc<dyn Transport>, endpoints: AuthEndpoints) -> Self {
        Self {
            transport,
            endpoints,
            success_hook: None,
        }
    }

    /// Installs a hook invoked after every successful request.
    pub fn with_success_hook(mut self, hook: Arc<dyn SuccessHook>) -> Self {
        self.success_hook = Some(hook);
        self
    }

    pub fn endpoints(&self) -> &AuthEndpoints {
        &self.endpoints
    }

    /// Logs in with `credentials`.
    ///
    /// A successful reply without a nickname yields [`UNKNOWN_NICKNAME`].
    pub async fn login(&self, credentials: &Credentials) -> AuthResult {
        debug!(username = %credentials.username, "sending login request");
        let body = match encode_login(credentials) {
            Ok(body) => body,
            Err(e) => return encoding_failed(AuthOperation::Login, e),
        };
        let request = HttpRequest::post_json(&self.endpoints.login_url, body);
        self.exchange(AuthOperation::Login, request, None).await
    }

    /// Registers a new account.
    ///
    /// The register reply carries no nickname, so a successful result reports
    /// the nickname that was submitted.
    pub async fn register(&self, request: &RegistrationRequest) -> AuthResult {
        debug!(username = %request.username, "sending register request");
        let body = match encode_register(request) {
            Ok(body) => body,
            Err(e) => return encoding_failed(AuthOperation::Register, e),
        };
        let http = HttpRequest::post_json(&self.endpoints.register_url, body);
        self.exchange(AuthOperation::Register, http, Some(&request.nickname))
            .await
    }

    async fn exchange(
        &self,
        operation: AuthOperation,
        request: HttpRequest,
        submitted_nickname: Option<&str>,
    ) -> AuthResult {
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("{operation} request failed in transport: {e}");
                return AuthResult::failure(ErrorKind::Network, e.to_string());
            }
        };

        if !response.is_success() {
            warn!("{operation} request rejected with {}", response.status_line());
            return AuthResult::failure(ErrorKind::Server, response.status_line());
        }

        let reply = match decode_reply(ReplyShape::from(operation), &response.body) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("{operation} reply could not be decoded: {e}");
                return AuthResult::failure(ErrorKind::Protocol, e.to_string());
            }
        };

        if !reply.success {
            info!("{operation} refused by server");
            return AuthResult::failure(ErrorKind::Application, reply.message.unwrap_or_default());
        }

        let nickname = reply
            .nickname
            .or_else(|| submitted_nickname.map(str::to_string))
            .unwrap_or_else(|| UNKNOWN_NICKNAME.to_string());

        info!(%nickname, "{operation} succeeded");
        if let Some(hook) = &self.success_hook {
            hook.on_success(operation, &nickname);
        }

        AuthResult::Success {
            nickname,
            message: reply.message,
        }
    }
}

fn encoding_failed(operation: AuthOperation, e: EncodeError) -> AuthResult {
    error!("{operation} request could not be encoded: {e}");
    AuthResult::failure(ErrorKind::Protocol, e.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::transport::{
        Method, MockTransport, RawResponse, TransportError, TransportErrorKind,
    };

    fn endpoints() -> AuthEndpoints {
        AuthEndpoints {
            login_url: "http://auth.test/api/loginUser.php".to_string(),
            register_url: "http://auth.test/api/registerUser.php".to_string(),
        }
    }

    fn ok(body: &str) -> RawResponse {
        RawResponse {
            status: 200,
            reason: "OK".to_string(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn client_replying(
        reply: Result<RawResponse, TransportError>,
    ) -> (AuthClient, Arc<MockTransport>) {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .return_once(move |_| reply);
        let transport = Arc::new(transport);
        (AuthClient::new(transport.clone(), endpoints()), transport)
    }

    #[tokio::test]
    async fn test_login_success_preserves_nickname() {
        // Arrange
        let (client, _t) = client_replying(Ok(ok(r#"{"success":true,"nickname":"Al"}"#)));

        // Act
        let result = client.login(&Credentials::new("alice", "pw")).await;

        // Assert
        assert_eq!(
            result,
            AuthResult::Success {
                nickname: "Al".to_string(),
                message: None,
            }
        );
    }

    #[tokio::test]
    async fn test_login_success_without_nickname_uses_unknown() {
        let (client, _t) = client_replying(Ok(ok(r#"{"success":true,"message":"hi"}"#)));

        let result = client.login(&Credentials::new("alice", "pw")).await;

        assert_eq!(
            result,
            AuthResult::Success {
                nickname: UNKNOWN_NICKNAME.to_string(),
                message: Some("hi".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_login_false_flag_is_application_failure() {
        let (client, _t) = client_replying(Ok(ok(
            r#"{"success":false,"message":"bad credentials","nickname":"Al"}"#,
        )));

        let result = client.login(&Credentials::new("alice", "wrong")).await;

        assert_eq!(
            result,
            AuthResult::failure(ErrorKind::Application, "bad credentials")
        );
    }

    #[tokio::test]
    async fn test_non_2xx_is_server_failure_regardless_of_body() {
        // Arrange: body would decode as success if it were inspected
        let (client, _t) = client_replying(Ok(RawResponse {
            status: 500,
            reason: "Internal Server Error".to_string(),
            body: br#"{"success":true,"nickname":"Al"}"#.to_vec(),
        }));

        // Act
        let result = client.login(&Credentials::new("alice", "pw")).await;

        // Assert
        assert_eq!(
            result,
            AuthResult::failure(ErrorKind::Server, "HTTP 500 Internal Server Error")
        );
    }

    #[tokio::test]
    async fn test_transport_error_is_network_failure() {
        let (client, _t) = client_replying(Err(TransportError::new(
            TransportErrorKind::ConnectFailed,
            "connection refused",
        )));

        let result = client.login(&Credentials::new("alice", "pw")).await;

        let AuthResult::Failure { reason, detail } = result else {
            panic!("expected a failure");
        };
        assert_eq!(reason, ErrorKind::Network);
        assert!(detail.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_protocol_failure() {
        let (client, _t) = client_replying(Ok(ok("<html>502 Bad Gateway</html>")));

        let result = client.login(&Credentials::new("alice", "pw")).await;

        assert!(matches!(
            result,
            AuthResult::Failure {
                reason: ErrorKind::Protocol,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_register_posts_json_to_register_url() {
        // Arrange
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                let body: serde_json::Value =
                    serde_json::from_slice(req.body.as_deref().unwrap_or_default()).unwrap();
                req.method == Method::Post
                    && req.url == "http://auth.test/api/registerUser.php"
                    && body
                        == serde_json::json!({"nickname": "Al", "username": "alice", "password": "pw"})
            })
            .times(1)
            .return_once(|_| Ok(ok(r#"{"status":"success","message":"ok"}"#)));
        let client = AuthClient::new(Arc::new(transport), endpoints());

        // Act
        let result = client
            .register(&RegistrationRequest::new("Al", "alice", "pw"))
            .await;

        // Assert
        assert_eq!(
            result,
            AuthResult::Success {
                nickname: "Al".to_string(),
                message: Some("ok".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_register_non_success_status_is_application_failure() {
        let (client, _t) = client_replying(Ok(ok(
            r#"{"status":"error","message":"username taken"}"#,
        )));

        let result = client
            .register(&RegistrationRequest::new("Al", "alice", "pw"))
            .await;

        assert_eq!(
            result,
            AuthResult::failure(ErrorKind::Application, "username taken")
        );
    }

    #[tokio::test]
    async fn test_success_hook_runs_once_on_success() {
        // Arrange
        let mut hook = MockSuccessHook::new();
        hook.expect_on_success()
            .withf(|op, nickname| *op == AuthOperation::Login && nickname == "Al")
            .times(1)
            .return_const(());
        let (client, _t) = client_replying(Ok(ok(r#"{"success":true,"nickname":"Al"}"#)));
        let client = client.with_success_hook(Arc::new(hook));

        // Act
        let result = client.login(&Credentials::new("alice", "pw")).await;

        // Assert
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_success_hook_not_called_on_failure() {
        let mut hook = MockSuccessHook::new();
        hook.expect_on_success().never();
        let (client, _t) = client_replying(Ok(ok(r#"{"success":false}"#)));
        let client = client.with_success_hook(Arc::new(hook));

        let result = client.login(&Credentials::new("alice", "pw")).await;

        assert!(!result.is_success());
    }
}
