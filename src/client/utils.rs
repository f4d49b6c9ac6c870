use secrecy::ExposeSecret;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;

use crate::client::consts::{AUTHORIZATION_HEADER, OPENAI_BETA_HEADER, OPENAI_BETA_REALTIME};
use crate::config::Config;
use crate::types::events::server::{
    ErrorDetails, ErrorEvent, ResponseDoneEvent, ResponseTextDeltaEvent,
};
use crate::types::ServerEvent;

pub fn build_request(config: &Config) -> tokio_tungstenite::tungstenite::Result<Request> {
    let mut request = config.url().into_client_request()?;
    request.headers_mut().insert(
        AUTHORIZATION_HEADER,
        format!("Bearer {}", config.api_key().expose_secret())
            .as_str()
            .parse()?,
    );
    request
        .headers_mut()
        .insert(OPENAI_BETA_HEADER, OPENAI_BETA_REALTIME.parse()?);
    Ok(request)
}

/// Parses one inbound text frame.
///
/// Frames carrying `error`, `response.text.delta` or `response.done` are never
/// dropped over fields the client does not read: when the full model rejects
/// them, only the tag and the consumed field are taken. Any other frame that
/// fails to parse is skipped.
pub fn parse_server_event(text: &str) -> Option<ServerEvent> {
    let err = match serde_json::from_str::<ServerEvent>(text) {
        Ok(event) => return Some(event),
        Err(err) => err,
    };

    let value = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => value,
        Err(_) => {
            tracing::error!("failed to deserialize event: {}, text=> {:?}", err, text);
            return None;
        }
    };
    let event = match value.get("type").and_then(|v| v.as_str()) {
        Some("error") => {
            let message = value
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            ServerEvent::Error(ErrorEvent::new(ErrorDetails::new(message)))
        }
        Some("response.text.delta") => match value.get("delta").and_then(|v| v.as_str()) {
            Some(delta) => ServerEvent::ResponseTextDelta(ResponseTextDeltaEvent::new(delta)),
            None => {
                tracing::error!("text delta without a delta: {}, text=> {:?}", err, text);
                return None;
            }
        },
        Some("response.done") => ServerEvent::ResponseDone(ResponseDoneEvent::new()),
        _ => {
            tracing::error!("failed to deserialize event: {}, text=> {:?}", err, text);
            return None;
        }
    };
    tracing::warn!("partially parsed {}: {}", event_label(&event), err);
    Some(event)
}

fn event_label(event: &ServerEvent) -> &'static str {
    match event {
        ServerEvent::Error(_) => "error",
        ServerEvent::ResponseTextDelta(_) => "response.text.delta",
        ServerEvent::ResponseDone(_) => "response.done",
        _ => "event",
    }
}
