//! Handle returned by the single-flight state machines.
//!
//! Submitting a request never blocks: the caller gets a [`Submission`] back
//! immediately and may await its outcome, or drop it and watch the state cell
//! instead.  Dropping the handle does not cancel the request; the terminal
//! state is still published to the cell.
//!
//! The request task holds the other end, a [`Completion`].  It writes the
//! terminal state to the cell before it answers the caller, and it writes a
//! fallback state if the task dies without completing, so a cell that went
//! `Loading` always leaves it.

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::warn;
use uuid::Uuid;

/// User-facing text published when a request task dies without a result.
pub const INTERRUPTED_MESSAGE: &str = "The request ended before producing a result";

/// Errors from submitting to, or waiting on, a state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// A request is already `Loading` on this state cell; nothing was sent.
    #[error("a request is already in flight")]
    AlreadyInFlight,
    /// The request task ended without reporting an outcome (it panicked, or
    /// the runtime shut down).
    #[error("the request ended before producing a result")]
    Interrupted,
}

/// One accepted request, resolving to the terminal state it published.
#[derive(Debug)]
pub struct Submission<S> {
    request_id: Uuid,
    outcome: oneshot::Receiver<S>,
}

impl<S> Submission<S> {
    pub(crate) fn new(request_id: Uuid, outcome: oneshot::Receiver<S>) -> Self {
        Self {
            request_id,
            outcome,
        }
    }

    /// Identifier that appears as `request_id` in this request's log span.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Waits for the terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Interrupted`] if the request task was dropped
    /// before completing.
    pub async fn outcome(self) -> Result<S, SubmitError> {
        self.outcome.await.map_err(|_| SubmitError::Interrupted)
    }
}

/// Request-task side of a [`Submission`].
pub(crate) struct Completion<S> {
    publish: Box<dyn Fn(S) + Send>,
    reply: Option<oneshot::Sender<S>>,
    abandoned: Option<S>,
}

impl<S: Clone> Completion<S> {
    /// Pairs a completion with the caller's handle.
    ///
    /// `publish` writes a terminal state to the cell.  `abandoned` is what it
    /// writes if the completion is dropped before [`complete`](Self::complete).
    pub(crate) fn channel(
        request_id: Uuid,
        publish: impl Fn(S) + Send + 'static,
        abandoned: S,
    ) -> (Self, Submission<S>) {
        let (tx, rx) = oneshot::channel();
        let completion = Self {
            publish: Box::new(publish),
            reply: Some(tx),
            abandoned: Some(abandoned),
        };
        (completion, Submission::new(request_id, rx))
    }

    /// Publishes `terminal` to the cell, then to the caller if it still
    /// waits.
    pub(crate) fn complete(mut self, terminal: S) {
        self.abandoned = None;
        (self.publish)(terminal.clone());
        if let Some(reply) = self.reply.take() {
            let _ = reply.send(terminal);
        }
    }
}

impl<S> Drop for Completion<S> {
    fn drop(&mut self) {
        // The reply sender is dropped after this, so a waiting caller sees
        // `Interrupted` only once the cell has left `Loading`.
        if let Some(state) = self.abandoned.take() {
            warn!("request task ended without a result");
            (self.publish)(state);
        }
    }
}
