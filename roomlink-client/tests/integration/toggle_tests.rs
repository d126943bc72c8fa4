use roomlink_client::{LocalStream, MeshCommand, TrackKind};
use roomlink_core::SessionId;

use crate::integration::init_tracing;
use crate::utils::{MeshHarness, answer_from, roster};

#[tokio::test]
async fn toggling_mutes_the_stream_without_renegotiation() {
    init_tracing();
    let mut harness = MeshHarness::join("r1").await;
    let a = SessionId::new();

    harness.client.process_relay_event(roster(&[&a])).await;
    harness.client.process_relay_event(answer_from(&a, "sdp-a")).await;

    let signals_before = harness.relay.signal_count();
    let transport = harness.factory.transport_for(&a).unwrap();
    let calls_before = transport.calls().len();

    assert!(harness.client.process_command(MeshCommand::ToggleVideo));
    assert!(!harness.stream.is_enabled(TrackKind::Video));
    assert!(harness.stream.is_enabled(TrackKind::Audio));

    assert!(harness.client.process_command(MeshCommand::ToggleAudio));
    assert!(!harness.stream.is_enabled(TrackKind::Audio));

    // No offers, no answers, no candidates, no transport calls: muting is
    // purely a local track state change.
    assert_eq!(harness.relay.signal_count(), signals_before);
    assert_eq!(transport.calls().len(), calls_before);
}

#[tokio::test]
async fn toggling_twice_restores_the_track() {
    init_tracing();
    let mut harness = MeshHarness::join("r1").await;

    assert!(harness.client.process_command(MeshCommand::ToggleVideo));
    assert!(harness.client.process_command(MeshCommand::ToggleVideo));
    assert!(harness.stream.is_enabled(TrackKind::Video));
}

#[tokio::test]
async fn leave_command_stops_the_loop() {
    init_tracing();
    let mut harness = MeshHarness::join("r1").await;

    assert!(!harness.client.process_command(MeshCommand::Leave));
}
