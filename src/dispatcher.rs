use std::io::Write;

use crate::types::ServerEvent;

pub const COMPLETION_NOTICE: &str = "\n\n>>> Response complete\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Awaiting,
    Streaming,
    Done,
    Failed,
}

impl DispatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Done | DispatchState::Failed)
    }
}

/// What the connection owner should do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Close,
}

/// Drives the per-connection state machine and writes the user-visible stream.
///
/// Deltas are written as they arrive, without a trailing newline, and flushed
/// immediately. Once the dispatcher reaches `Done` or `Failed` every later
/// event is ignored.
pub struct Dispatcher<W: Write> {
    out: W,
    state: DispatchState,
    text: String,
    error: Option<String>,
}

impl<W: Write> Dispatcher<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            state: DispatchState::Awaiting,
            text: String::new(),
            error: None,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Every delta received so far, concatenated.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The server error message, when the dispatcher failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    pub fn handle(&mut self, event: &ServerEvent) -> std::io::Result<Action> {
        if self.state.is_terminal() {
            tracing::debug!("ignoring event after {:?}: {:?}", self.state, event);
            return Ok(Action::Continue);
        }

        match event {
            ServerEvent::Error(e) => {
                let message = e.error().message();
                tracing::error!(
                    "server error: type={:?}, code={:?}, message={}",
                    e.error().error_type(),
                    e.error().code(),
                    message
                );
                writeln!(self.out, "\n[ERROR] Server returned error: {message}")?;
                self.out.flush()?;
                self.error = Some(message.to_string());
                self.state = DispatchState::Failed;
                Ok(Action::Close)
            }
            ServerEvent::ResponseTextDelta(delta) => {
                self.state = DispatchState::Streaming;
                self.text.push_str(delta.delta());
                write!(self.out, "{}", delta.delta())?;
                self.out.flush()?;
                Ok(Action::Continue)
            }
            ServerEvent::ResponseDone(done) => {
                if let Some(status) = done.response().and_then(|r| r.status()) {
                    if status != "completed" {
                        tracing::warn!("response finished with status {}", status);
                    }
                }
                write!(self.out, "{COMPLETION_NOTICE}")?;
                self.out.flush()?;
                self.state = DispatchState::Done;
                Ok(Action::Close)
            }
            ServerEvent::SessionCreated(e) => {
                tracing::debug!("session created: {:?}", e.session().id());
                Ok(Action::Continue)
            }
            ServerEvent::SessionUpdated(e) => {
                tracing::debug!("session updated: modalities={:?}", e.session().modalities());
                Ok(Action::Continue)
            }
            ServerEvent::ConversationItemCreated(e) => {
                tracing::debug!("conversation item created: {:?}", e.item().id());
                Ok(Action::Continue)
            }
            ServerEvent::ResponseCreated(e) => {
                tracing::debug!("response created: {:?}", e.response().id());
                Ok(Action::Continue)
            }
            ServerEvent::ResponseTextDone(e) => {
                tracing::debug!("response text done: {} chars", e.text().chars().count());
                Ok(Action::Continue)
            }
            ServerEvent::RateLimitsUpdated(e) => {
                for limit in e.rate_limits() {
                    tracing::debug!(
                        "rate limit {}: {}/{} remaining, resets in {}s",
                        limit.name(),
                        limit.remaining(),
                        limit.limit(),
                        limit.reset_seconds()
                    );
                }
                Ok(Action::Continue)
            }
            ServerEvent::Close { .. } | ServerEvent::Unknown => Ok(Action::Continue),
        }
    }
}
