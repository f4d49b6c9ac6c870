use anyhow::{Context, Result};

use crate::audio::PreparedAudio;
use crate::config::Config;
use crate::instructions::coach_instructions;
use crate::transport::Transport;
use crate::types::events::client::{
    ConversationItemCreateEvent, ResponseCreateEvent, SessionUpdateEvent,
};
use crate::types::{ClientEvent, Item, MessageItem, Session};

/// Text-only session carrying the coaching instructions.
pub fn session_update(config: &Config) -> ClientEvent {
    let session = Session::new()
        .with_modalities_disable_audio()
        .with_instructions(&coach_instructions(config.language()))
        .build();
    ClientEvent::SessionUpdate(SessionUpdateEvent::new(session))
}

/// User message with the prompt first and the recording second.
pub fn conversation_item(config: &Config, audio: PreparedAudio) -> ClientEvent {
    let message = MessageItem::builder()
        .with_input_text(config.prompt())
        .with_input_audio(audio.into_encoded())
        .build();
    ClientEvent::ConversationItemCreate(ConversationItemCreateEvent::new(Item::Message(message)))
}

pub fn response_trigger() -> ClientEvent {
    ClientEvent::ResponseCreate(ResponseCreateEvent::new())
}

/// Sends the session configuration, the conversation item and the response
/// trigger, in that order, without waiting for acknowledgements.
pub async fn initiate<T: Transport + ?Sized>(
    transport: &mut T,
    config: &Config,
    audio: PreparedAudio,
) -> Result<()> {
    transport
        .send(session_update(config))
        .await
        .context("failed to send session update")?;

    transport
        .send(conversation_item(config, audio))
        .await
        .context("failed to send prompt and audio")?;
    tracing::info!("sent prompt and audio data");

    transport
        .send(response_trigger())
        .await
        .context("failed to request a response")?;
    tracing::info!("waiting for the model to respond");
    Ok(())
}
