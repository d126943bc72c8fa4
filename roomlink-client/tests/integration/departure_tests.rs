use roomlink_client::{LinkPhase, RenderUpdate, TransportEvent};
use roomlink_core::{IceCandidateInit, SessionId};

use crate::integration::init_tracing;
use crate::utils::{MeshHarness, TransportCall, answer_from, offer_from, roster, user_left};

#[tokio::test]
async fn user_left_tears_down_the_record() {
    init_tracing();
    let mut harness = MeshHarness::join("r1").await;
    let a = SessionId::new();

    harness.client.process_relay_event(roster(&[&a])).await;
    harness.client.process_relay_event(answer_from(&a, "sdp-a")).await;
    assert_eq!(harness.client.link_phase(&a), Some(LinkPhase::Connected));

    harness.client.process_relay_event(user_left(&a)).await;

    assert_eq!(harness.client.link_count(), 0);
    let transport = harness.factory.transport_for(&a).unwrap();
    assert_eq!(transport.calls().last(), Some(&TransportCall::Close));
    assert!(matches!(
        harness.next_render_update(),
        Some(RenderUpdate::PeerRemoved { sid }) if sid == a
    ));
}

#[tokio::test]
async fn late_signal_builds_a_fresh_record() {
    init_tracing();
    let mut harness = MeshHarness::join("r1").await;
    let a = SessionId::new();

    harness.client.process_relay_event(offer_from(&a, "sdp-1")).await;
    harness.client.process_relay_event(user_left(&a)).await;

    // The stale transport stays closed; a late offer starts over on a new
    // one instead of resurrecting it.
    harness.client.process_relay_event(offer_from(&a, "sdp-2")).await;

    assert_eq!(harness.client.link_count(), 1);
    assert_eq!(harness.client.link_phase(&a), Some(LinkPhase::Answered));

    let transports = harness.factory.transports_for(&a);
    assert_eq!(transports.len(), 2);
    assert_eq!(transports[0].calls().last(), Some(&TransportCall::Close));
    assert!(!transports[1].calls().contains(&TransportCall::Close));
}

#[tokio::test]
async fn user_left_for_unknown_peer_is_harmless() {
    init_tracing();
    let mut harness = MeshHarness::join("r1").await;

    harness.client.process_relay_event(user_left(&SessionId::new())).await;

    assert_eq!(harness.client.link_count(), 0);
    assert!(harness.next_render_update().is_none());
}

#[tokio::test]
async fn candidate_event_for_departed_peer_is_dropped() {
    init_tracing();
    let mut harness = MeshHarness::join("r1").await;
    let a = SessionId::new();

    harness.client.process_relay_event(offer_from(&a, "sdp-1")).await;
    let answers_before = harness.relay.signal_count();
    harness.client.process_relay_event(user_left(&a)).await;

    // A candidate the platform gathered before the teardown resolves late;
    // it must not reach the relay.
    harness
        .client
        .process_transport_event(TransportEvent::CandidateGenerated {
            sid: a.clone(),
            candidate: IceCandidateInit {
                candidate: "candidate:late".to_string(),
                sdp_mid: None,
                sdp_m_line_index: None,
            },
        })
        .await;

    assert_eq!(harness.relay.signal_count(), answers_before);
    assert!(harness.relay.candidates_to(&a).is_empty());
}

#[tokio::test]
async fn track_for_departed_peer_is_not_rendered() {
    init_tracing();
    let mut harness = MeshHarness::join("r1").await;
    let a = SessionId::new();

    harness.client.process_relay_event(offer_from(&a, "sdp-1")).await;
    harness.client.process_relay_event(user_left(&a)).await;
    let _ = harness.next_render_update(); // PeerRemoved

    harness
        .client
        .process_transport_event(TransportEvent::TrackReceived {
            sid: a.clone(),
            track: "remote-track".to_string(),
        })
        .await;

    assert!(harness.next_render_update().is_none());
}
