//! Integration tests for the session: a real `Session` wired to an
//! in-memory transport, with the test playing the rover backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use roverlink_protocol::{ClientId, RequestId};
use roverlink_session::*;
use roverlink_transport::{EventReceiver, MemoryPeer, MemoryTransport, TransportError};
use serde_json::{Value, json};

// =========================================================================
// Harness
// =========================================================================

/// Records every presenter side effect as a line of text.
#[derive(Clone, Default)]
struct RecordingPresenter {
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingPresenter {
    fn lines(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl Presenter for RecordingPresenter {
    fn show_notification(&mut self, notification: &Notification) {
        self.log.lock().unwrap().push(notification.to_string());
    }

    fn show_blocked_dialog(&mut self, message: &str) {
        self.log.lock().unwrap().push(format!("show: {message}"));
    }

    fn hide_blocked_dialog(&mut self) {
        self.log.lock().unwrap().push("hide".into());
    }
}

struct Harness {
    session: Session,
    peer: MemoryPeer,
    events: EventReceiver,
    presenter: RecordingPresenter,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    fn with_config(config: SessionConfig) -> Self {
        let (conn, peer) = MemoryTransport::pair();
        let (handle, events) = conn.into_parts();
        let presenter = RecordingPresenter::default();
        let session = Session::new(config, handle, presenter.clone());
        let mut harness = Self {
            session,
            peer,
            events,
            presenter,
        };
        harness.peer.open();
        harness.pump();
        harness
    }

    /// Feeds every queued transport event to the session.
    fn pump(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.session.handle_event(event);
        }
    }

    fn deliver(&mut self, frame: Value) {
        self.peer.deliver(frame.to_string());
        self.pump();
    }

    fn call(&mut self, method: &str, params: Value) {
        self.deliver(json!({"method": method, "params": params}));
    }

    /// Assigns an identity and discards the resulting client info frame.
    fn assign(&mut self, id: i64) {
        self.call("setClientId", json!([id]));
        self.sent();
    }

    fn sent(&mut self) -> Vec<Value> {
        self.peer
            .drain()
            .iter()
            .map(|frame| serde_json::from_str(frame).unwrap())
            .collect()
    }
}

fn recorder() -> (Arc<Mutex<Vec<Value>>>, ResponseCallback) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: ResponseCallback = Box::new(move |v| sink.lock().unwrap().push(v));
    (seen, callback)
}

// =========================================================================
// Outbound encoding and ids
// =========================================================================

#[test]
fn test_request_ids_increase_by_one() {
    let mut h = Harness::new();

    let ids = vec![
        h.session.stop().unwrap(),
        h.session.drive_forward().unwrap(),
        h.session.turn_left().unwrap(),
        h.session.camera_reset_position().unwrap(),
    ];

    assert_eq!(ids, vec![RequestId(1), RequestId(2), RequestId(3), RequestId(4)]);
    let wire_ids: Vec<_> = h.sent().iter().map(|f| f["id"].clone()).collect();
    assert_eq!(wire_ids, vec![json!(1), json!(2), json!(3), json!(4)]);
}

#[test]
fn test_outbound_frames_use_configured_constants() {
    let mut h = Harness::with_config(SessionConfig {
        drive_speed: 350,
        turn_rate: 120,
        camera_step: 5,
        ..SessionConfig::default()
    });

    h.session.drive_backward().unwrap();
    h.session.turn_right().unwrap();
    h.session.camera_move_up().unwrap();

    let sent = h.sent();
    assert_eq!(
        sent[0],
        json!({"jsonrpc": "2.0", "method": "driveBackward", "params": [350], "id": 1})
    );
    assert_eq!(sent[1]["params"], json!([120]));
    assert_eq!(sent[2]["method"], "turnHeadUp");
    assert_eq!(sent[2]["params"], json!([5]));
}

#[test]
fn test_ping_carries_last_allocated_id() {
    let mut h = Harness::new();

    h.session.send_ping().unwrap();
    h.session.send_ping().unwrap();

    let sent = h.sent();
    assert_eq!(sent[0]["params"], json!([0]));
    assert_eq!(sent[0]["id"], 1);
    assert_eq!(sent[1]["params"], json!([1]));
    assert_eq!(sent[1]["id"], 2);
}

#[test]
fn test_last_sent_tracks_latest_frame() {
    let mut h = Harness::new();
    h.session.set_killswitch(true, "maintenance").unwrap();

    let frame = h.peer.drain().pop().unwrap();
    assert_eq!(h.session.store().last_sent(), Some(frame.as_str()));
}

#[test]
fn test_send_on_closed_socket_fails() {
    let mut h = Harness::new();
    h.peer.close("server went away");
    h.pump();

    let result = h.session.stop();

    assert!(matches!(
        result,
        Err(SessionError::Transport(TransportError::NotOpen))
    ));
    assert!(!h.session.store().is_connected());
    assert!(h.session.store().last_sent().is_none());
}

// =========================================================================
// Inbound routing
// =========================================================================

#[test]
fn test_results_and_errors_are_collected() {
    let mut h = Harness::new();
    let id = h.session.send_ping().unwrap();

    h.deliver(json!({"id": id.0, "result": "pong 1"}));
    h.deliver(json!({"id": 9, "error": {"code": -32601}}));

    let store = h.session.store();
    assert_eq!(store.response_for(id).unwrap().result, json!("pong 1"));
    assert_eq!(store.errors().len(), 1);
    assert_eq!(
        store.last_error().unwrap().error,
        json!({"code": -32601})
    );
    assert!(store.error_for(RequestId(9)).is_some());
}

#[test]
fn test_malformed_frames_do_not_touch_the_store() {
    let mut h = Harness::new();
    let mut rx = h.session.subscribe();
    let _ = rx.borrow_and_update();
    let before = h.session.store().clone();

    h.peer.deliver("not json at all");
    h.peer.deliver("[1, 2, 3]");
    h.peer.deliver(r#"{"id": 1, "jsonrpc": "2.0"}"#);
    h.peer.deliver(r#"{"id": 1, "result": 1, "error": 2}"#);
    h.pump();

    assert!(!rx.has_changed().unwrap());
    assert_eq!(*h.session.store(), before);
}

#[test]
fn test_unknown_method_and_bad_params_are_ignored() {
    let mut h = Harness::new();
    let before = h.session.store().clone();

    h.call("selfDestruct", json!([]));
    h.call("setClientId", json!(["seven"]));
    h.call("updateConnectedUsers", json!([[1]]));

    assert_eq!(*h.session.store(), before);
    assert_eq!(h.session.identity_state(), IdentityState::Pending);
    assert!(h.sent().is_empty());
}

#[test]
fn test_roster_and_collisions_are_overwritten() {
    let mut h = Harness::new();

    h.call("updateConnectedUsers", json!([[{"id": 1}, {"id": 2}], ["10.0.0.3"]]));
    h.call("updateConnectedUsers", json!([[{"id": 2}], []]));
    h.call(
        "updateCollisionInformation",
        json!([{
            "taintedReadings": true,
            "collisionFrontLeft": "Close",
            "collisionFrontRight": "None",
            "collisionBackLeft": "Far",
            "collisionBackRight": "None"
        }]),
    );

    let store = h.session.store();
    assert_eq!(store.roster().connected_users, vec![json!({"id": 2})]);
    assert!(store.roster().blocked_users.is_empty());
    assert!(store.collisions().tainted_readings);
    assert_eq!(store.collisions().collision_front_left, json!("Close"));
}

#[test]
fn test_server_notifications_are_recorded_and_shown() {
    let mut h = Harness::new();

    h.call("incomingNotification", json!(["rover online"]));
    h.call("showAlertNotification", json!(["battery low"]));
    h.call("showErrorNotification", json!(["motor fault"]));

    let kinds: Vec<_> = h
        .session
        .store()
        .notifications()
        .iter()
        .map(|n| n.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![NotificationKind::Info, NotificationKind::Alert, NotificationKind::Error]
    );
    assert_eq!(
        h.presenter.lines(),
        vec![
            "[info] rover online".to_string(),
            "[alert] battery low".to_string(),
            "[error] motor fault".to_string(),
        ]
    );
}

#[test]
fn test_notification_history_is_bounded() {
    let mut h = Harness::with_config(SessionConfig {
        retention: 2,
        ..SessionConfig::default()
    });

    for msg in ["a", "b", "c"] {
        h.call("incomingNotification", json!([msg]));
    }

    let kept: Vec<_> = h
        .session
        .store()
        .notifications()
        .iter()
        .map(|n| n.message.clone())
        .collect();
    assert_eq!(kept, vec!["b".to_string(), "c".to_string()]);
}

// =========================================================================
// Identity
// =========================================================================

#[test]
fn test_client_id_resolves_and_announces_client_info() {
    let mut h = Harness::with_config(SessionConfig {
        client_info: ClientInfo {
            browser: "console".into(),
            os: "plan9".into(),
        },
        ..SessionConfig::default()
    });

    h.call("setClientId", json!([7]));

    assert_eq!(h.session.identity_state(), IdentityState::Resolved(ClientId(7)));
    assert_eq!(h.session.client_id(), ClientId(7));
    assert!(h.session.identity_deadline().is_none());
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["method"], "setClientInformation");
    assert_eq!(sent[0]["params"], json!([7, "console", "plan9"]));
}

#[test]
fn test_second_client_id_does_not_reannounce() {
    let mut h = Harness::new();
    h.assign(7);

    h.call("setClientId", json!([8]));

    assert_eq!(h.session.identity_state(), IdentityState::Resolved(ClientId(7)));
    assert_eq!(h.session.client_id(), ClientId(8));
    assert!(h.sent().is_empty());
}

#[test]
fn test_deadline_rejects_and_late_id_does_not_resettle() {
    let mut h = Harness::new();
    let future = h.session.identity();

    h.session.on_identity_deadline();
    h.session.on_identity_deadline();
    h.call("setClientId", json!([4]));

    assert_eq!(h.session.identity_state(), IdentityState::Rejected);
    assert_eq!(future.state(), IdentityState::Rejected);
    assert_eq!(h.session.client_id(), ClientId(4));
    assert!(h.sent().is_empty());
}

#[test]
fn test_deadline_after_resolution_is_a_no_op() {
    let mut h = Harness::new();
    h.assign(3);

    h.session.on_identity_deadline();

    assert_eq!(h.session.identity_state(), IdentityState::Resolved(ClientId(3)));
}

#[tokio::test(start_paused = true)]
async fn test_identity_deadline_follows_config() {
    let start = tokio::time::Instant::now();
    let h = Harness::with_config(SessionConfig {
        identity_timeout: Duration::from_millis(1500),
        ..SessionConfig::default()
    });

    assert_eq!(
        h.session.identity_deadline(),
        Some(start + Duration::from_millis(1500))
    );
}

#[tokio::test]
async fn test_identity_future_resolves_from_frame() {
    let mut h = Harness::new();
    let future = h.session.identity();

    h.call("setClientId", json!([12]));

    assert_eq!(future.wait().await.unwrap(), ClientId(12));
}

// =========================================================================
// Driver arbitration
// =========================================================================

#[test]
fn test_own_id_makes_driver_available() {
    let mut h = Harness::new();
    h.assign(7);
    h.call("updateRoverState", json!([{"currentDriverId": 3}]));
    assert!(!h.session.store().driver().is_driver_available);

    h.call("updateRoverState", json!([{"currentDriverId": 7}]));

    assert!(h.session.store().driver().is_driver_available);
    assert!(h.sent().is_empty());
}

#[test]
fn test_empty_seat_on_driving_view_requests_it() {
    let mut h = Harness::new();
    h.assign(7);
    h.session.set_view(View::Driving);

    h.call("updateRoverState", json!([{"currentDriverId": -1}]));

    assert!(!h.session.store().driver().is_driver_available);
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["method"], "enterDriverMode");
    assert_eq!(sent[0]["params"], json!([7]));
}

#[test]
fn test_empty_seat_elsewhere_changes_nothing() {
    let mut h = Harness::new();
    h.assign(7);

    h.call("updateRoverState", json!([{"currentDriverId": -1}]));

    assert!(h.session.store().driver().is_driver_available);
    assert!(h.sent().is_empty());
}

#[test]
fn test_other_driver_makes_seat_unavailable_without_request() {
    let mut h = Harness::new();
    h.assign(7);
    h.session.set_view(View::Driving);

    h.call("updateRoverState", json!([{"currentDriverId": 2}]));

    assert!(!h.session.store().driver().is_driver_available);
    assert!(h.sent().is_empty());
}

#[test]
fn test_killswitch_applies_without_driver_id() {
    let mut h = Harness::new();

    h.call("updateRoverState", json!([{"isKillswitchEnabled": true}]));

    let driver = h.session.store().driver();
    assert!(driver.is_killswitch_enabled);
    assert!(driver.is_driver_available);
}

#[test]
fn test_enter_driver_mode_with_identity_sends_now() {
    let mut h = Harness::new();
    h.assign(5);

    let future = h.session.enter_driver_mode().unwrap();

    assert_eq!(future.state(), IdentityState::Resolved(ClientId(5)));
    let sent = h.sent();
    assert_eq!(sent[0]["method"], "enterDriverMode");
    assert_eq!(sent[0]["params"], json!([5]));
}

#[test]
fn test_enter_driver_mode_waits_for_identity() {
    let mut h = Harness::new();

    h.session.enter_driver_mode().unwrap();
    assert!(h.sent().is_empty());

    h.call("setClientId", json!([6]));

    let methods: Vec<_> = h.sent().iter().map(|f| f["method"].clone()).collect();
    assert_eq!(methods, vec![json!("setClientInformation"), json!("enterDriverMode")]);
}

#[test]
fn test_release_driver_needs_no_identity() {
    let mut h = Harness::new();

    h.session.release_driver().unwrap();
    let sent = h.sent();
    assert_eq!(sent[0]["method"], "releaseDriver");
    assert_eq!(sent[0]["params"], json!([]));

    h.assign(4);
    h.session.exit_driver_mode().unwrap();
    let sent = h.sent();
    assert_eq!(sent[0]["method"], "exitDriverMode");
    assert_eq!(sent[0]["params"], json!([4]));
}

#[test]
fn test_unassigned_client_id_keeps_identity_pending() {
    let mut h = Harness::new();
    h.session.enter_driver_mode().unwrap();

    h.call("setClientId", json!([0]));

    assert_eq!(h.session.identity_state(), IdentityState::Pending);
    assert!(h.session.identity_deadline().is_some());
    assert!(h.sent().is_empty());

    h.call("setClientId", json!([6]));

    assert_eq!(h.session.identity_state(), IdentityState::Resolved(ClientId(6)));
    let sent = h.sent();
    let methods: Vec<_> = sent.iter().map(|f| f["method"].clone()).collect();
    assert_eq!(methods, vec![json!("setClientInformation"), json!("enterDriverMode")]);
    assert_eq!(sent[1]["params"], json!([6]));
}

#[test]
fn test_enter_driver_mode_dropped_when_identity_rejected() {
    let mut h = Harness::new();
    h.session.enter_driver_mode().unwrap();

    h.session.on_identity_deadline();
    h.call("setClientId", json!([6]));
    h.session.enter_driver_mode().unwrap();

    assert!(h.sent().is_empty());
}

#[test]
fn test_exit_driver_mode_uses_held_identity() {
    let mut h = Harness::new();

    h.session.exit_driver_mode().unwrap();

    let sent = h.sent();
    assert_eq!(sent[0]["method"], "exitDriverMode");
    assert_eq!(sent[0]["params"], json!([0]));
}

// =========================================================================
// Blocking
// =========================================================================

#[test]
fn test_blocking_dialog_shows_once() {
    let mut h = Harness::new();

    h.call("setMyBlockingState", json!(["10.0.0.8", true]));
    h.call("setMyBlockingState", json!(["10.0.0.8", true]));

    assert_eq!(h.presenter.lines(), vec![format!("show: {BLOCKED_MESSAGE}")]);
    let store = h.session.store();
    assert!(store.block_status().is_blocked);
    assert_eq!(store.block_status().ip_address, "10.0.0.8");
}

#[test]
fn test_unblocking_hides_dialog() {
    let mut h = Harness::new();

    h.call("setMyBlockingState", json!(["10.0.0.8", false]));
    h.call("setMyBlockingState", json!(["10.0.0.8", true]));
    h.call("setMyBlockingState", json!(["10.0.0.8", false]));

    assert_eq!(
        h.presenter.lines(),
        vec![format!("show: {BLOCKED_MESSAGE}"), "hide".to_string()]
    );
}

// =========================================================================
// Callbacks
// =========================================================================

#[test]
fn test_second_snapshot_request_replaces_callback() {
    let mut h = Harness::new();
    let (first, cb1) = recorder();
    let (second, cb2) = recorder();

    h.session.get_camera_snapshot(cb1).unwrap();
    h.session.get_camera_snapshot(cb2).unwrap();
    h.call("incomingSnapshot", json!(["data:image/jpeg;base64,AAAA"]));
    h.call("incomingSnapshot", json!(["data:image/jpeg;base64,BBBB"]));

    assert!(first.lock().unwrap().is_empty());
    assert_eq!(
        *second.lock().unwrap(),
        vec![json!("data:image/jpeg;base64,AAAA")]
    );
}

#[test]
fn test_logging_entries_request_and_callback() {
    let mut h = Harness::new();
    h.assign(2);
    let (seen, cb) = recorder();

    h.session
        .get_logging_entries(Some("2024-01-01T00:00:00".into()), cb)
        .unwrap();
    h.call("incomingLogEntries", json!([[{"msg": "boot"}]]));

    let sent = h.sent();
    assert_eq!(sent[0]["params"], json!([2, "2024-01-01T00:00:00"]));
    assert_eq!(*seen.lock().unwrap(), vec![json!([{"msg": "boot"}])]);
}

#[test]
fn test_uptime_without_identity_is_refused() {
    let mut h = Harness::new();
    let (seen, cb) = recorder();

    let result = h.session.get_system_up_time(cb);
    h.call("incomingSystemUpTime", json!([1234]));

    assert!(matches!(result, Err(SessionError::IdentityUnavailable)));
    assert!(h.sent().is_empty());
    assert!(seen.lock().unwrap().is_empty());
    let store = h.session.store();
    let last = store.notifications().last().unwrap();
    assert_eq!(last.kind, NotificationKind::Error);
    assert_eq!(last.message, UPTIME_UNAVAILABLE_MESSAGE);
}

#[test]
fn test_uptime_with_identity_is_sent() {
    let mut h = Harness::new();
    h.assign(9);
    let (seen, cb) = recorder();

    h.session.get_system_up_time(cb).unwrap();
    h.call("incomingSystemUpTime", json!(["3 days"]));

    let sent = h.sent();
    assert_eq!(sent[0]["method"], "getSystemUpTime");
    assert_eq!(sent[0]["params"], json!([9]));
    assert_eq!(*seen.lock().unwrap(), vec![json!("3 days")]);
}

// =========================================================================
// Misc commands
// =========================================================================

#[test]
fn test_heartbeat_requires_identity() {
    let mut h = Harness::new();
    assert!(matches!(
        h.session.heartbeat(),
        Err(SessionError::IdentityUnavailable)
    ));
    assert!(h.session.store().notifications().is_empty());

    h.assign(4);
    h.session.heartbeat().unwrap();

    let sent = h.sent();
    assert_eq!(sent[0]["method"], "heartbeat");
    assert_eq!(sent[0]["params"], json!([4]));
}

#[test]
fn test_show_alert_notification_stays_local() {
    let mut h = Harness::new();

    h.session.show_alert_notification("check the camera");
    h.session.send_alert_notification("all stop").unwrap();

    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["method"], "distributeAlertNotification");
    assert_eq!(h.presenter.lines(), vec!["[alert] check the camera".to_string()]);
}
