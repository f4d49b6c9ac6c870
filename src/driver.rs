use std::future::Future;
use std::io::Write;
use std::path::PathBuf;

use crate::audio;
use crate::client;
use crate::config::Config;
use crate::dispatcher::{Action, DispatchState, Dispatcher};
use crate::initiator;
use crate::instructions::EMPTY_CRITIQUE;
use crate::transport::{Inbound, Transport};
use crate::types::ServerEvent;

/// Failures that end a run before any connection is attempted, or that stop
/// the console from being written.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// The full text of a completed response.
#[derive(Debug, Clone, PartialEq)]
pub struct Critique {
    text: String,
}

impl Critique {
    fn new(text: &str) -> Self {
        let text = if text.is_empty() { EMPTY_CRITIQUE } else { text };
        Self {
            text: text.to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// How a run that reached the connection stage ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed(Critique),
    /// The server sent an `error` event.
    ServerError(String),
    /// The recording could not be prepared; no frames were sent.
    AudioFailed(String),
    /// Connecting, sending or reading failed underneath the protocol.
    TransportFailed(String),
    /// The server closed the connection before the response completed.
    ClosedEarly { reason: Option<String> },
    /// No response text arrived within the configured timeout.
    TimedOut,
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SessionOutcome::Completed(_))
    }
}

/// Runs one session against the realtime endpoint, writing the streamed
/// critique and lifecycle notices to `out`.
pub async fn run<W: Write>(config: &Config, out: W) -> Result<SessionOutcome, SessionError> {
    run_with(config, out, || client::connect(config)).await
}

/// Runs one session over the transport produced by `connect`.
///
/// The input file is checked before `connect` is called. The call returns
/// once the transport's inbound stream has ended.
pub async fn run_with<T, C, Fut, W>(
    config: &Config,
    mut out: W,
    connect: C,
) -> Result<SessionOutcome, SessionError>
where
    T: Transport,
    C: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
    W: Write,
{
    let path = config.audio_path();
    if !path.exists() {
        writeln!(
            out,
            "Error: cannot find {}; record a WAV file there first.",
            path.display()
        )?;
        return Err(SessionError::MissingInput(path.to_path_buf()));
    }

    let mut transport = match connect().await {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!("failed to connect: {:#}", e);
            writeln!(out, "\n[WebSocket Error] {e:#}")?;
            return Ok(SessionOutcome::TransportFailed(format!("{e:#}")));
        }
    };
    writeln!(out, ">>> Connection established")?;

    let outcome = drive(&mut transport, config, &mut out).await?;
    writeln!(out, "\n>>> Connection closed")?;
    out.flush()?;

    tracing::info!("session finished: {}", outcome_label(&outcome));
    Ok(outcome)
}

async fn drive<T: Transport, W: Write>(
    transport: &mut T,
    config: &Config,
    out: &mut W,
) -> Result<SessionOutcome, SessionError> {
    let prepared = match audio::prepare(config.audio_path()) {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::error!("audio processing failed: {}", e);
            writeln!(out, "Audio processing failed: {e}")?;
            close(transport).await;
            drain(transport).await;
            return Ok(SessionOutcome::AudioFailed(e.to_string()));
        }
    };

    if let Err(e) = initiator::initiate(transport, config, prepared).await {
        tracing::error!("failed to start the session: {:#}", e);
        writeln!(out, "\n[WebSocket Error] {e:#}")?;
        close(transport).await;
        drain(transport).await;
        return Ok(SessionOutcome::TransportFailed(format!("{e:#}")));
    }
    writeln!(out, ">>> Sent prompt and audio data")?;
    writeln!(out, ">>> Waiting for the model to respond...")?;
    out.flush()?;

    let deadline = config
        .response_timeout()
        .map(|timeout| tokio::time::Instant::now() + timeout);

    let mut dispatcher = Dispatcher::new(&mut *out);
    let mut close_requested = false;
    let mut close_reason = None;
    let mut transport_error = None;
    let mut timed_out = false;

    loop {
        // The timeout only guards the wait for the first fragment of text.
        let waiting = dispatcher.state() == DispatchState::Awaiting && !close_requested;
        let next = match deadline {
            Some(deadline) if waiting => {
                match tokio::time::timeout_at(deadline, transport.recv()).await {
                    Ok(next) => next,
                    Err(_) => {
                        tracing::warn!("no response within {:?}", config.response_timeout());
                        writeln!(dispatcher.writer(), "\n[Timeout] No response from the model")?;
                        timed_out = true;
                        close(transport).await;
                        break;
                    }
                }
            }
            _ => transport.recv().await,
        };

        let Some(inbound) = next else {
            break;
        };
        match inbound {
            Inbound::Event(ServerEvent::Close { reason }) => {
                close_reason = reason;
            }
            Inbound::Event(event) => {
                if dispatcher.handle(&event)? == Action::Close && !close_requested {
                    close_requested = true;
                    close(transport).await;
                }
            }
            Inbound::TransportError(e) => {
                writeln!(dispatcher.writer(), "\n[WebSocket Error] {e}")?;
                transport_error = Some(e);
            }
        }
    }

    let outcome = match dispatcher.state() {
        DispatchState::Done => SessionOutcome::Completed(Critique::new(dispatcher.text())),
        DispatchState::Failed => {
            SessionOutcome::ServerError(dispatcher.error().unwrap_or_default().to_string())
        }
        DispatchState::Awaiting | DispatchState::Streaming => {
            if timed_out {
                SessionOutcome::TimedOut
            } else if let Some(e) = transport_error {
                SessionOutcome::TransportFailed(e)
            } else {
                writeln!(dispatcher.writer(), "\n>>> Connection closed without a response")?;
                SessionOutcome::ClosedEarly {
                    reason: close_reason,
                }
            }
        }
    };
    Ok(outcome)
}

async fn close<T: Transport>(transport: &mut T) {
    if let Err(e) = transport.close().await {
        tracing::warn!("failed to close connection: {:#}", e);
    }
}

/// Waits for the connection to wind down after a local close.
async fn drain<T: Transport>(transport: &mut T) {
    while let Some(inbound) = transport.recv().await {
        tracing::debug!("discarding after close: {:?}", inbound);
    }
}

fn outcome_label(outcome: &SessionOutcome) -> &'static str {
    match outcome {
        SessionOutcome::Completed(_) => "completed",
        SessionOutcome::ServerError(_) => "server error",
        SessionOutcome::AudioFailed(_) => "audio failed",
        SessionOutcome::TransportFailed(_) => "transport failed",
        SessionOutcome::ClosedEarly { .. } => "closed early",
        SessionOutcome::TimedOut => "timed out",
    }
}
