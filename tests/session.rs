//! Session state machine scenarios
//!
//! Drives the full session lifecycle against fake capture, sink, and
//! transport: permission handling, teardown idempotence, interruption, and
//! the capture → transport frame path.

mod common;

use common::{FakeCapture, FakeSink, FakeTransport, audio_payload, test_setup};
use nova_voice::audio::{CapturePipeline, codec};
use nova_voice::live::ServerEvent;
use nova_voice::{Error, PlaybackScheduler, SessionState, VoiceSession};

type TestSession = VoiceSession<FakeCapture, FakeSink, FakeTransport>;

fn make_session(capture: &FakeCapture, sink: &FakeSink, transport: FakeTransport) -> TestSession {
    VoiceSession::new(
        CapturePipeline::with_frame_size(capture.clone(), 4),
        PlaybackScheduler::new(sink.clone()),
        transport,
        test_setup(),
    )
}

#[tokio::test]
async fn start_brings_the_session_active() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let mut session = make_session(&capture, &sink, FakeTransport::new());

    assert_eq!(session.state(), SessionState::Idle);
    session.start().await.unwrap();

    assert_eq!(session.state(), SessionState::Active);
    assert!(capture.is_running());
    assert_eq!(session.transport().connect_count, 1);

    let snapshot = session.snapshot();
    assert!(snapshot.is_active);
    assert!(snapshot.is_listening);
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn denied_microphone_leaves_the_session_idle() {
    let capture = FakeCapture::denied();
    let sink = FakeSink::new();
    let mut session = make_session(&capture, &sink, FakeTransport::new());

    let result = session.start().await;
    assert!(matches!(result, Err(Error::Permission(_))));

    assert_eq!(session.state(), SessionState::Idle);
    assert!(!capture.is_running());
    assert_eq!(session.transport().connect_count, 0);

    let snapshot = session.snapshot();
    assert!(!snapshot.is_active);
    assert!(snapshot.error.is_some());
}

#[tokio::test]
async fn failed_handshake_closes_and_releases_everything() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let mut session = make_session(&capture, &sink, FakeTransport::refusing());

    let result = session.start().await;
    assert!(matches!(result, Err(Error::Connection(_))));

    assert_eq!(session.state(), SessionState::Closed);
    assert!(!capture.is_running());
    assert!(session.snapshot().error.is_some());
}

#[tokio::test]
async fn starting_twice_never_opens_a_second_stream() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let mut session = make_session(&capture, &sink, FakeTransport::new());

    session.start().await.unwrap();
    let result = session.start().await;
    assert!(matches!(result, Err(Error::Voice(_))));

    assert_eq!(session.transport().connect_count, 1);
    assert_eq!(capture.start_count(), 1);
    assert_eq!(session.state(), SessionState::Active);
}

#[tokio::test]
async fn stop_is_idempotent_and_safe_before_start() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();

    // Never started: stop is a no-op and the session stays Idle
    let mut session = make_session(&capture, &sink, FakeTransport::new());
    session.stop().await;
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.transport().close_count, 0);

    // Started: the first stop tears down, the second does nothing
    session.start().await.unwrap();
    session.stop().await;
    session.stop().await;

    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.transport().close_count, 1);
    assert!(!capture.is_running());
    assert!(!session.snapshot().is_active);
}

#[tokio::test]
async fn closed_session_cannot_be_restarted() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let mut session = make_session(&capture, &sink, FakeTransport::new());

    session.start().await.unwrap();
    session.stop().await;

    assert!(matches!(session.start().await, Err(Error::Voice(_))));
    assert_eq!(session.transport().connect_count, 1);
}

#[tokio::test]
async fn transcript_accumulates_and_clears_on_turn_complete() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let mut session = make_session(&capture, &sink, FakeTransport::new());
    session.start().await.unwrap();

    session
        .handle_event(ServerEvent::Transcript("It sounds ".to_string()))
        .await;
    session
        .handle_event(ServerEvent::Transcript("difficult.".to_string()))
        .await;
    assert_eq!(session.snapshot().transcription, "It sounds difficult.");

    session.handle_event(ServerEvent::TurnComplete).await;
    assert!(session.snapshot().transcription.is_empty());
}

#[tokio::test]
async fn malformed_audio_is_skipped_without_ending_the_session() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let mut session = make_session(&capture, &sink, FakeTransport::new());
    session.start().await.unwrap();

    session
        .handle_event(ServerEvent::Audio("not base64!!".to_string()))
        .await;

    assert_eq!(session.state(), SessionState::Active);
    assert!(sink.started().is_empty());

    // A good chunk afterwards still plays
    session
        .handle_event(ServerEvent::Audio(audio_payload(0.1)))
        .await;
    assert_eq!(sink.started().len(), 1);
}

#[tokio::test]
async fn interruption_cuts_playback_and_reschedules_fresh() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let mut session = make_session(&capture, &sink, FakeTransport::new());
    session.start().await.unwrap();

    // A then B queue back-to-back from the session clock
    session
        .handle_event(ServerEvent::Audio(audio_payload(0.5)))
        .await;
    session
        .handle_event(ServerEvent::Audio(audio_payload(0.25)))
        .await;

    let started = sink.started();
    assert_eq!(started.len(), 2);
    assert!((started[0].at - 0.0).abs() < 1e-9);
    assert!((started[1].at - 0.5).abs() < 1e-9);

    // The user speaks over the reply mid-playback
    sink.set_clock(0.2);
    session.handle_event(ServerEvent::Interrupted).await;

    let stopped = sink.stopped();
    assert!(stopped.contains(&started[0].id));
    assert!(stopped.contains(&started[1].id));
    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(session.scheduler().active_len(), 0);

    // C schedules from the post-interrupt clock, not stale future time
    session
        .handle_event(ServerEvent::Audio(audio_payload(0.3)))
        .await;
    let started = sink.started();
    assert_eq!(started.len(), 3);
    assert!((started[2].at - 0.2).abs() < 1e-9);
}

#[tokio::test]
async fn interruption_clears_the_transcript() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let mut session = make_session(&capture, &sink, FakeTransport::new());
    session.start().await.unwrap();

    session
        .handle_event(ServerEvent::Transcript("I was saying".to_string()))
        .await;
    session.handle_event(ServerEvent::Interrupted).await;

    assert!(session.snapshot().transcription.is_empty());
    assert!(session.snapshot().is_active);
}

#[tokio::test]
async fn capture_frames_reach_the_transport_encoded() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let mut session = make_session(&capture, &sink, FakeTransport::new());
    session.start().await.unwrap();

    capture.push_samples(vec![0.5, -0.5, 0.25, -0.25]);
    capture.push_samples(vec![0.1, 0.2, 0.3, 0.4]);
    session.forward_frames().await.unwrap();

    let frames = &session.transport().sent_frames;
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], codec::encode_frame(&[0.5, -0.5, 0.25, -0.25]));
    assert_eq!(frames[1], codec::encode_frame(&[0.1, 0.2, 0.3, 0.4]));
}

#[tokio::test]
async fn frames_captured_before_the_handshake_are_dropped() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let mut session = make_session(&capture, &sink, FakeTransport::new());

    capture.push_samples(vec![0.5; 8]);
    session.start().await.unwrap();
    session.forward_frames().await.unwrap();

    assert!(session.transport().sent_frames.is_empty());
}

#[tokio::test]
async fn events_after_stop_schedule_nothing() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let mut session = make_session(&capture, &sink, FakeTransport::new());
    session.start().await.unwrap();
    session.stop().await;

    session
        .handle_event(ServerEvent::Audio(audio_payload(0.1)))
        .await;
    assert!(sink.started().is_empty());
}

#[tokio::test]
async fn remote_close_tears_the_session_down() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let mut session = make_session(&capture, &sink, FakeTransport::new());
    session.start().await.unwrap();

    session.handle_event(ServerEvent::Closed).await;

    assert_eq!(session.state(), SessionState::Closed);
    assert!(!capture.is_running());
    assert_eq!(session.transport().close_count, 1);
}

#[tokio::test]
async fn run_drains_scripted_events_then_closes() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let transport = FakeTransport::scripted(vec![
        ServerEvent::Transcript("hello".to_string()),
        ServerEvent::Audio(audio_payload(0.2)),
        ServerEvent::TurnComplete,
    ]);
    let mut session = make_session(&capture, &sink, transport);

    session.start().await.unwrap();
    session.run().await.unwrap();

    // Stream exhausted: the session closed itself after applying every event
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(sink.started().len(), 1);
    assert!(session.snapshot().transcription.is_empty());
    assert_eq!(session.transport().close_count, 1);
}

#[tokio::test]
async fn run_requires_a_started_session() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let mut session = make_session(&capture, &sink, FakeTransport::new());

    assert!(matches!(session.run().await, Err(Error::Voice(_))));
}

#[tokio::test]
async fn mid_session_transport_error_is_fatal() {
    let capture = FakeCapture::new();
    let sink = FakeSink::new();
    let mut transport = FakeTransport::new();
    transport.events = vec![
        Ok(ServerEvent::Audio(audio_payload(0.2))),
        Err(Error::Connection("stream reset".to_string())),
    ]
    .into();
    let mut session = make_session(&capture, &sink, transport);

    session.start().await.unwrap();
    session.run().await.unwrap();

    assert_eq!(session.state(), SessionState::Closed);
    assert!(!capture.is_running());
    assert_eq!(session.scheduler().active_len(), 0);

    let snapshot = session.snapshot();
    assert!(!snapshot.is_active);
    assert!(snapshot.error.as_deref().unwrap_or_default().contains("stream reset"));
}
