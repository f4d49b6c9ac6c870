use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use pronunciation_coach::dispatcher::COMPLETION_NOTICE;
use pronunciation_coach::instructions::EMPTY_CRITIQUE;
use pronunciation_coach::types::events::server::{
    ErrorDetails, ErrorEvent, ResponseDoneEvent, ResponseTextDeltaEvent,
};
use pronunciation_coach::types::{ClientEvent, ServerEvent};
use pronunciation_coach::{
    driver, parse_server_event, Config, Inbound, SessionError, SessionOutcome, Transport,
};

/// What the driver did to the transport.
#[derive(Default)]
struct Log {
    sent: Vec<ClientEvent>,
    closes: usize,
}

/// Replays a fixed list of inbound items and records everything sent.
struct ScriptedTransport {
    script: VecDeque<Inbound>,
    log: Arc<Mutex<Log>>,
    /// When set, `recv` never returns once the script is exhausted.
    hang_when_empty: bool,
}

impl ScriptedTransport {
    fn new(script: Vec<Inbound>) -> (Self, Arc<Mutex<Log>>) {
        let log = Arc::new(Mutex::new(Log::default()));
        let transport = Self {
            script: script.into(),
            log: log.clone(),
            hang_when_empty: false,
        };
        (transport, log)
    }

    fn hanging() -> (Self, Arc<Mutex<Log>>) {
        let (mut transport, log) = Self::new(Vec::new());
        transport.hang_when_empty = true;
        (transport, log)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, event: ClientEvent) -> Result<()> {
        self.log.lock().unwrap().sent.push(event);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Inbound> {
        match self.script.pop_front() {
            Some(inbound) => Some(inbound),
            None if self.hang_when_empty => std::future::pending().await,
            None => None,
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}

fn delta(text: &str) -> Inbound {
    Inbound::Event(ServerEvent::ResponseTextDelta(ResponseTextDeltaEvent::new(text)))
}

fn done() -> Inbound {
    Inbound::Event(ServerEvent::ResponseDone(ResponseDoneEvent::new()))
}

fn server_error(message: &str) -> Inbound {
    Inbound::Event(ServerEvent::Error(ErrorEvent::new(ErrorDetails::new(message))))
}

/// Parses raw server frames the way the websocket reader does; frames that
/// cannot be used are skipped.
fn from_wire(frames: &[&str]) -> Vec<Inbound> {
    frames
        .iter()
        .filter_map(|frame| parse_server_event(frame))
        .map(Inbound::Event)
        .collect()
}

fn write_clip(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..1600 {
        writer.write_sample(((i % 100) * 100) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn config_for(path: &Path) -> Config {
    Config::builder()
        .with_api_key("sk-test")
        .with_audio_path(path)
        .build()
        .unwrap()
}

/// Runs the driver over `transport`, returning its result and console output.
async fn run_scripted(
    config: &Config,
    transport: ScriptedTransport,
) -> (Result<SessionOutcome, SessionError>, String) {
    let mut out = Vec::new();
    let result = driver::run_with(config, &mut out, || async { Ok(transport) }).await;
    (result, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn streams_deltas_and_completes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    write_clip(&path);
    let config = config_for(&path);

    let (transport, log) = ScriptedTransport::new(vec![delta("Hel"), delta("lo"), done()]);
    let (result, out) = run_scripted(&config, transport).await;

    let outcome = result.unwrap();
    assert!(outcome.is_success());
    match outcome {
        SessionOutcome::Completed(critique) => assert_eq!(critique.text(), "Hello"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(out.contains(">>> Connection established"));
    assert!(out.contains(&format!("Hello{COMPLETION_NOTICE}")));
    assert_eq!(log.lock().unwrap().closes, 1);
}

#[tokio::test]
async fn frames_are_sent_in_fixed_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    write_clip(&path);
    let config = config_for(&path);

    let (transport, log) = ScriptedTransport::new(vec![done()]);
    run_scripted(&config, transport).await.0.unwrap();

    let log = log.lock().unwrap();
    let order: Vec<&str> = log.sent.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        order,
        vec!["session.update", "conversation.item.create", "response.create"]
    );
}

#[tokio::test]
async fn server_error_closes_once_and_stops_processing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    write_clip(&path);
    let config = config_for(&path);

    let (transport, log) = ScriptedTransport::new(vec![
        delta("Par"),
        server_error("Invalid audio"),
        delta("ignored"),
        server_error("second"),
        done(),
    ]);
    let (result, out) = run_scripted(&config, transport).await;

    let outcome = result.unwrap();
    assert!(!outcome.is_success());
    assert_eq!(outcome, SessionOutcome::ServerError("Invalid audio".to_string()));
    assert!(out.contains("[ERROR] Server returned error: Invalid audio"));
    assert!(!out.contains("ignored"));
    assert!(!out.contains("second"));
    assert!(!out.contains(COMPLETION_NOTICE));
    assert_eq!(log.lock().unwrap().closes, 1);
}

#[tokio::test]
async fn missing_input_never_connects() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&dir.path().join("absent.wav"));
    let connects = AtomicUsize::new(0);

    let mut out = Vec::new();
    let result = driver::run_with(&config, &mut out, || async {
        connects.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedTransport::new(Vec::new()).0)
    })
    .await;

    assert!(matches!(result, Err(SessionError::MissingInput(_))));
    assert_eq!(connects.load(Ordering::SeqCst), 0);
    assert!(String::from_utf8(out).unwrap().contains("cannot find"));
}

#[tokio::test]
async fn decode_failure_opens_then_closes_without_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.wav");
    std::fs::write(&path, "this is a text file, not a recording").unwrap();
    let config = config_for(&path);

    let (transport, log) = ScriptedTransport::new(Vec::new());
    let (result, out) = run_scripted(&config, transport).await;

    assert!(matches!(result.unwrap(), SessionOutcome::AudioFailed(_)));
    assert!(out.contains(">>> Connection established"));
    assert!(out.contains("Audio processing failed"));
    let log = log.lock().unwrap();
    assert!(log.sent.is_empty());
    assert_eq!(log.closes, 1);
}

#[tokio::test]
async fn empty_response_uses_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    write_clip(&path);
    let config = config_for(&path);

    let (transport, _) = ScriptedTransport::new(vec![done()]);
    let (result, _) = run_scripted(&config, transport).await;

    match result.unwrap() {
        SessionOutcome::Completed(critique) => assert_eq!(critique.text(), EMPTY_CRITIQUE),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn server_close_before_completion_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    write_clip(&path);
    let config = config_for(&path);

    let (transport, log) = ScriptedTransport::new(vec![
        delta("Hal"),
        Inbound::Event(ServerEvent::Close {
            reason: Some("1011 server error".to_string()),
        }),
    ]);
    let (result, out) = run_scripted(&config, transport).await;

    assert_eq!(
        result.unwrap(),
        SessionOutcome::ClosedEarly {
            reason: Some("1011 server error".to_string())
        }
    );
    assert!(out.contains("closed without a response"));
    assert_eq!(log.lock().unwrap().closes, 0);
}

#[tokio::test]
async fn transport_error_ends_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    write_clip(&path);
    let config = config_for(&path);

    let (transport, _) =
        ScriptedTransport::new(vec![Inbound::TransportError("connection reset".to_string())]);
    let (result, out) = run_scripted(&config, transport).await;

    assert_eq!(
        result.unwrap(),
        SessionOutcome::TransportFailed("connection reset".to_string())
    );
    assert!(out.contains("[WebSocket Error] connection reset"));
}

#[tokio::test]
async fn connect_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    write_clip(&path);
    let config = config_for(&path);

    let mut out = Vec::new();
    let result = driver::run_with(&config, &mut out, || async {
        Err::<ScriptedTransport, _>(anyhow::anyhow!("handshake refused"))
    })
    .await;

    assert_eq!(
        result.unwrap(),
        SessionOutcome::TransportFailed("handshake refused".to_string())
    );
    assert!(String::from_utf8(out).unwrap().contains("handshake refused"));
}

#[tokio::test]
async fn silent_server_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    write_clip(&path);
    let config = Config::builder()
        .with_api_key("sk-test")
        .with_audio_path(&path)
        .with_response_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let (transport, log) = ScriptedTransport::hanging();
    let (result, out) = run_scripted(&config, transport).await;

    assert_eq!(result.unwrap(), SessionOutcome::TimedOut);
    assert!(out.contains("[Timeout]"));
    let log = log.lock().unwrap();
    assert_eq!(log.sent.len(), 3);
    assert_eq!(log.closes, 1);
}

#[tokio::test]
async fn realistic_frames_with_extra_fields_complete() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    write_clip(&path);
    let config = config_for(&path);

    let script = from_wire(&[
        r#"{"type":"session.updated","event_id":"ev_1","session":{"modalities":["smell"]}}"#,
        r#"{"type":"response.text.delta","event_id":"ev_2","response_id":"resp_1","item_id":"item_1","output_index":-1,"content_index":0,"delta":"Good "}"#,
        r#"{"type":"response.text.delta","delta":"try","item_id":42}"#,
        r#"{"type":"response.done","response":{"status":"completed","usage":{"total_tokens":5}}}"#,
    ]);
    let (transport, log) = ScriptedTransport::new(script);
    let (result, out) = run_scripted(&config, transport).await;

    match result.unwrap() {
        SessionOutcome::Completed(critique) => assert_eq!(critique.text(), "Good try"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(out.contains(&format!("Good try{COMPLETION_NOTICE}")));
    assert_eq!(log.lock().unwrap().closes, 1);
}

#[tokio::test]
async fn error_after_unparseable_frame_still_ends_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    write_clip(&path);
    let config = config_for(&path);

    let script = from_wire(&[
        "not json at all",
        r#"{"type":"session.updated","session":{"modalities":["smell"]}}"#,
        r#"{"type":"error","error":{"type":"invalid_request_error","message":"bad key","code":401}}"#,
        r#"{"type":"response.done"}"#,
    ]);
    assert_eq!(script.len(), 2);
    let (transport, log) = ScriptedTransport::new(script);
    let (result, out) = run_scripted(&config, transport).await;

    assert_eq!(
        result.unwrap(),
        SessionOutcome::ServerError("bad key".to_string())
    );
    assert!(out.contains("[ERROR] Server returned error: bad key"));
    assert!(!out.contains(COMPLETION_NOTICE));
    assert_eq!(log.lock().unwrap().closes, 1);
}
