use roomlink_core::{RoomId, ServerEvent};

use crate::integration::create_relay;
use crate::utils::TestPeer;

#[tokio::test]
async fn first_joiner_gets_empty_roster() {
    let relay = create_relay();
    let room = RoomId::from("r1");

    let (_a, roster) = TestPeer::join(&relay, &room);
    assert!(roster.is_empty());
}

#[tokio::test]
async fn joiner_learns_earlier_members_in_join_order() {
    let relay = create_relay();
    let room = RoomId::from("r1");

    let (a, _) = TestPeer::join(&relay, &room);
    let (b, roster_b) = TestPeer::join(&relay, &room);
    assert_eq!(roster_b, vec![a.sid.clone()]);

    let (_c, roster_c) = TestPeer::join(&relay, &room);
    assert_eq!(roster_c, vec![a.sid.clone(), b.sid.clone()]);
}

#[tokio::test]
async fn existing_members_are_not_notified_of_a_join() {
    let relay = create_relay();
    let room = RoomId::from("r1");

    let (mut a, _) = TestPeer::join(&relay, &room);
    let (_b, _) = TestPeer::join(&relay, &room);

    // The newcomer carries the burden of reaching out; the relay stays
    // silent toward earlier members.
    assert!(a.next_event().is_none());
}

#[tokio::test]
async fn rooms_are_isolated() {
    let relay = create_relay();

    let (a, _) = TestPeer::join(&relay, &RoomId::from("r1"));
    let (_b, roster) = TestPeer::join(&relay, &RoomId::from("r2"));

    assert!(roster.is_empty());
    assert!(!roster.contains(&a.sid));
}

#[tokio::test]
async fn welcome_carries_the_assigned_sid() {
    let relay = create_relay();

    // TestPeer::connect asserts the welcome payload internally; two
    // connections must get distinct ids.
    let a = TestPeer::connect(&relay);
    let b = TestPeer::connect(&relay);
    assert_ne!(a.sid, b.sid);
}

#[tokio::test]
async fn rejoining_moves_the_session_between_rooms() {
    let relay = create_relay();
    let r1 = RoomId::from("r1");
    let r2 = RoomId::from("r2");

    let (mut a, _) = TestPeer::join(&relay, &r1);
    let (mut b, _) = TestPeer::join(&relay, &r1);

    relay.handle_event(
        &b.sid,
        roomlink_core::ClientEvent::Join {
            room_id: r2.clone(),
        },
    );
    match b.next_event() {
        Some(ServerEvent::ExistingParticipants { sids }) => assert!(sids.is_empty()),
        other => panic!("expected roster, got {:?}", other),
    }

    // A's room no longer contains B, so a later departure of B must not
    // reach A.
    relay.disconnect(&b.sid);
    assert!(a.next_event().is_none());
}
