use super::Harness;
use crate::utils::fake_engine::{FakeEngineFactory, stream_from};
use meshcall_client::{CloseReason, Role, SessionEvent, SessionState, TileState};
use meshcall_core::{ClientRequest, InboundSignal, OutboundSignal, PeerId, ServerEvent};
use serde_json::json;

#[test]
fn test_snapshot_opens_initiator_sessions() {
    let mut h = Harness::new();
    let (a, b) = (PeerId::new(), PeerId::new());

    h.manager
        .handle_server_event(ServerEvent::AllUsers(vec![a, b, h.me]));

    assert_eq!(
        h.engines.created(),
        vec![(a, Role::Initiator), (b, Role::Initiator)]
    );
    assert_eq!(h.manager.session_state(&a), Some(SessionState::Negotiating));
    assert_eq!(h.manager.session_state(&h.me), None);
    assert_eq!(h.manager.participant_count(), 3);

    let tiles = h.manager.grid().tiles();
    assert_eq!(tiles.len(), 2);
    assert!(tiles.iter().all(|t| t.state == TileState::Loading));
    assert_eq!(tiles[0].label, format!("User {}", a.short()));
}

#[test]
fn test_join_opens_responder_session() {
    let mut h = Harness::new();
    let c = PeerId::new();

    h.manager.handle_server_event(ServerEvent::UserJoined(c));
    h.manager.handle_server_event(ServerEvent::UserJoined(c));

    assert_eq!(h.engines.created(), vec![(c, Role::Responder)]);
    assert_eq!(h.manager.participant_count(), 2);
    assert!(h.drain_outbound().is_empty());
}

#[test]
fn test_signal_from_unknown_peer_creates_responder() {
    let mut h = Harness::new();
    let c = PeerId::new();
    let offer = json!({ "type": "offer", "sdp": "v=0" });

    h.manager.handle_server_event(ServerEvent::Signal(InboundSignal {
        from: c,
        signal: offer.clone(),
    }));

    assert_eq!(h.engines.created(), vec![(c, Role::Responder)]);
    assert_eq!(h.engines.log(&c).received, vec![offer]);
}

#[test]
fn test_local_signals_sent_once_each_in_order() {
    let mut h = Harness::new();
    let a = PeerId::new();
    h.manager.handle_server_event(ServerEvent::AllUsers(vec![a]));

    for i in 0..3 {
        h.engines
            .emit(a, SessionEvent::LocalSignal(json!({ "seq": i })));
    }
    assert_eq!(h.manager.process_pending(), 3);

    let expected: Vec<ClientRequest> = (0..3)
        .map(|i| {
            ClientRequest::Signal(OutboundSignal {
                to: a,
                signal: json!({ "seq": i }),
            })
        })
        .collect();
    assert_eq!(h.drain_outbound(), expected);
}

#[test]
fn test_stream_marks_session_connected() {
    let mut h = Harness::new();
    let a = PeerId::new();
    h.manager.handle_server_event(ServerEvent::AllUsers(vec![a]));

    h.engines
        .emit(a, SessionEvent::StreamEstablished(stream_from(a)));
    h.manager.process_pending();

    let session = h.manager.session(&a).unwrap();
    assert_eq!(session.state(), SessionState::Connected);
    assert_eq!(session.remote_stream(), Some(&stream_from(a)));
    assert_eq!(
        h.manager.grid().tile(&a).unwrap().state,
        TileState::Live(stream_from(a))
    );
}

#[test]
fn test_user_left_tears_down_once() {
    let mut h = Harness::new();
    let (a, b) = (PeerId::new(), PeerId::new());
    h.manager.handle_server_event(ServerEvent::AllUsers(vec![a, b]));

    h.manager.handle_server_event(ServerEvent::UserLeft(a));
    h.manager.handle_server_event(ServerEvent::UserLeft(a));
    h.engines
        .emit(a, SessionEvent::Closed(CloseReason::ClosedByPeer));
    h.manager.process_pending();

    assert_eq!(h.engines.log(&a).destroyed, 1);
    assert!(h.manager.session(&a).is_none());
    assert!(h.manager.grid().tile(&a).is_none());

    assert_eq!(h.manager.session_state(&b), Some(SessionState::Negotiating));
    assert_eq!(h.manager.participant_count(), 2);
}

#[test]
fn test_engine_failure_treated_as_departure() {
    let mut h = Harness::new();
    let a = PeerId::new();
    h.manager.handle_server_event(ServerEvent::UserJoined(a));

    h.engines.emit(
        a,
        SessionEvent::Closed(CloseReason::Failed("ice failed".into())),
    );
    h.manager.process_pending();

    assert!(h.manager.session(&a).is_none());
    assert!(h.manager.grid().is_empty());
    assert_eq!(h.engines.log(&a).destroyed, 1);

    // A late signal re-opens negotiation as responder.
    h.manager.handle_server_event(ServerEvent::Signal(InboundSignal {
        from: a,
        signal: json!({ "type": "offer" }),
    }));
    assert_eq!(h.manager.session_state(&a), Some(SessionState::Negotiating));
}

#[test]
fn test_events_after_close_are_ignored() {
    let mut h = Harness::new();
    let a = PeerId::new();
    h.manager.handle_server_event(ServerEvent::AllUsers(vec![a]));
    h.manager.handle_server_event(ServerEvent::UserLeft(a));

    h.engines
        .emit(a, SessionEvent::LocalSignal(json!({ "type": "offer" })));
    h.engines
        .emit(a, SessionEvent::StreamEstablished(stream_from(a)));
    h.manager.process_pending();

    assert!(h.drain_outbound().is_empty());
    assert!(h.manager.grid().is_empty());
}

#[test]
fn test_view_subscribers_follow_grid() {
    let mut h = Harness::new();
    let view = h.manager.subscribe();
    let a = PeerId::new();

    h.manager.handle_server_event(ServerEvent::UserJoined(a));
    assert!(view.has_changed().unwrap());
    assert_eq!(view.borrow().len(), 1);

    h.manager.handle_server_event(ServerEvent::UserLeft(a));
    assert!(view.borrow().is_empty());
}

#[test]
fn test_engine_creation_failure_skips_peer() {
    let mut h = Harness::with_factory(FakeEngineFactory::refusing());
    let a = PeerId::new();

    h.manager.handle_server_event(ServerEvent::AllUsers(vec![a]));
    h.manager.handle_server_event(ServerEvent::Signal(InboundSignal {
        from: a,
        signal: json!({}),
    }));

    assert!(h.manager.session(&a).is_none());
    assert!(h.manager.grid().is_empty());
    assert_eq!(h.manager.participant_count(), 1);
}

#[test]
fn test_close_all_releases_every_engine() {
    let mut h = Harness::new();
    let (a, b) = (PeerId::new(), PeerId::new());
    h.manager.handle_server_event(ServerEvent::AllUsers(vec![a]));
    h.manager.handle_server_event(ServerEvent::UserJoined(b));

    h.manager.close_all();

    assert!(h.manager.remote_ids().is_empty());
    assert_eq!(h.engines.log(&a).destroyed, 1);
    assert_eq!(h.engines.log(&b).destroyed, 1);
}

#[test]
fn test_retired_engine_cannot_touch_new_session() {
    let mut h = Harness::new();
    let a = PeerId::new();
    h.manager.handle_server_event(ServerEvent::UserJoined(a));
    h.engines.emit(
        a,
        SessionEvent::Closed(CloseReason::Failed("ice failed".into())),
    );
    h.manager.process_pending();

    h.manager.handle_server_event(ServerEvent::UserJoined(a));
    assert_eq!(h.engines.engine_count(&a), 2);

    // The first engine reports its own shutdown after being replaced.
    h.engines
        .emit_from(a, 0, SessionEvent::LocalSignal(json!({ "type": "offer" })));
    h.engines
        .emit_from(a, 0, SessionEvent::Closed(CloseReason::ClosedByPeer));
    h.engines
        .emit_from(a, 0, SessionEvent::StreamEstablished(stream_from(a)));
    assert_eq!(h.manager.process_pending(), 3);

    assert_eq!(h.manager.session_state(&a), Some(SessionState::Negotiating));
    assert_eq!(h.manager.grid().tile(&a).unwrap().state, TileState::Loading);
    assert!(h.drain_outbound().is_empty());
    assert_eq!(h.engines.log(&a).destroyed, 0);
    assert_eq!(h.engines.log_of(&a, 0).destroyed, 1);

    h.engines
        .emit(a, SessionEvent::LocalSignal(json!({ "type": "answer" })));
    h.manager.process_pending();
    assert_eq!(h.drain_outbound().len(), 1);
}
