//! End-to-end flows through the access engine with mock hardware.

use latchkey_core::{LockConfig, LockReason, LockStatus, ManualClock};
use latchkey_engine::{
    AccessEngine, Command, CommandKind, CommandSender, EngineEvent, Peripherals, QueueError,
    RecordingSink,
};
use latchkey_hardware::mock::{
    MockContactSensor, MockContactSensorHandle, MockIndicator, MockIndicatorHandle, MockKeypad,
    MockKeypadHandle, MockLockActuator, MockLockActuatorHandle, MockRfid, MockRfidHandle,
};
use latchkey_hardware::{DoorContact, DoorHardware, KeypadInput, LockModule};
use latchkey_storage::{CardRegistry, CredentialStore, MemoryRecord};
use rstest::rstest;

const WALL_START: u64 = 1_700_000_000;
const CARD_A: [u8; 4] = [0x04, 0xAB, 0xCD, 0xEF];
const CARD_B: [u8; 4] = [0x0A, 0x0B, 0x0C, 0x0D];
const TICK_MS: u64 = 10;

struct Rig {
    engine: AccessEngine<ManualClock, RecordingSink>,
    clock: ManualClock,
    sink: RecordingSink,
    sender: CommandSender,
    keys: MockKeypadHandle,
    rfid: MockRfidHandle,
    contact: MockContactSensorHandle,
    actuator: MockLockActuatorHandle,
    led: MockIndicatorHandle,
    credentials_record: MemoryRecord,
    cards_record: MemoryRecord,
}

impl Rig {
    fn new() -> Self {
        Self::with_config(LockConfig::default())
    }

    fn with_config(config: LockConfig) -> Self {
        Self::with_records(config, MemoryRecord::new(), MemoryRecord::new())
    }

    fn with_records(config: LockConfig, credentials: MemoryRecord, cards: MemoryRecord) -> Self {
        let clock = ManualClock::new(WALL_START);
        let sink = RecordingSink::new();
        let (keypad, keys) = MockKeypad::new();
        let (reader, rfid) = MockRfid::new();
        let (actuator, actuator_handle) = MockLockActuator::new();
        let (led, led_handle) = MockIndicator::new();
        let (sensor, contact) = MockContactSensor::new(false);

        let door = DoorHardware::new(
            LockModule::new(Box::new(actuator), Box::new(led)),
            DoorContact::new(Box::new(sensor), config.contact_debounce_ms),
        );
        let mut engine = AccessEngine::new(
            config,
            clock.clone(),
            sink.clone(),
            CredentialStore::new(Box::new(credentials.clone())),
            CardRegistry::new(Box::new(cards.clone())),
            Peripherals {
                keypad: Box::new(keypad),
                reader: Box::new(reader),
                door,
            },
        );
        engine.init().unwrap();
        let sender = engine.sender();

        Self {
            engine,
            clock,
            sink,
            sender,
            keys,
            rfid,
            contact,
            actuator: actuator_handle,
            led: led_handle,
            credentials_record: credentials,
            cards_record: cards,
        }
    }

    fn step(&mut self) {
        self.clock.advance_ms(TICK_MS);
        self.engine.tick();
    }

    fn run_for(&mut self, ms: u64) {
        for _ in 0..ms / TICK_MS {
            self.step();
        }
    }

    fn command(&mut self, kind: CommandKind, payload: &str) {
        self.sender
            .try_send(Command::new(kind, "mqtt", payload))
            .unwrap();
        self.step();
    }

    fn set_master(&mut self, code: &str) {
        self.command(
            CommandKind::Credential,
            &format!(r#"{{"action":"add","type":"permanent","code":"{}"}}"#, code),
        );
    }

    fn type_keys(&mut self, keys: &str) {
        self.keys.type_keys(keys).unwrap();
        self.step();
    }

    /// Present a card, take it away and wait out the reader debounce.
    fn swipe(&mut self, uid: &[u8]) {
        self.rfid.present_card(uid.to_vec());
        self.run_for(150);
        self.rfid.remove_card();
        self.run_for(2_500);
    }

    fn open_door(&mut self) {
        self.contact.set_open(true);
        self.run_for(200);
    }

    fn close_door(&mut self) {
        self.contact.set_open(false);
        self.run_for(200);
    }

    fn status(&self) -> LockStatus {
        self.engine.lock_status()
    }
}

fn logs(events: &[EngineEvent]) -> Vec<(String, String, Option<String>)> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Log {
                event,
                method,
                detail,
            } => Some((event.clone(), method.clone(), detail.clone())),
            _ => None,
        })
        .collect()
}

fn has_log(events: &[EngineEvent], name: &str) -> bool {
    events.iter().any(|e| e.log_name() == Some(name))
}

fn log_detail(events: &[EngineEvent], name: &str) -> Option<String> {
    logs(events)
        .into_iter()
        .find(|(event, _, _)| event == name)
        .and_then(|(_, _, detail)| detail)
}

fn lock_changes(events: &[EngineEvent]) -> Vec<(LockStatus, LockReason)> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::LockState { state, reason } => Some((*state, *reason)),
            _ => None,
        })
        .collect()
}

fn enroll_statuses(events: &[EngineEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::EnrollStatus { status } => Some(status.clone()),
            _ => None,
        })
        .collect()
}

fn credential_codes(events: &[EngineEvent]) -> Option<Vec<String>> {
    events.iter().rev().find_map(|e| match e {
        EngineEvent::CredentialList { entries } => {
            Some(entries.iter().map(|c| c.code.clone()).collect())
        }
        _ => None,
    })
}

// ----------------------------------------------------------------------
// Startup
// ----------------------------------------------------------------------

#[test]
fn test_startup_publishes_locked_state_and_lists() {
    let rig = Rig::new();
    let events = rig.sink.events();

    assert_eq!(lock_changes(&events), vec![(LockStatus::Locked, LockReason::Startup)]);
    assert!(events.iter().any(|e| matches!(e, EngineEvent::CredentialList { .. })));
    assert!(events.iter().any(|e| matches!(e, EngineEvent::CardList { .. })));
    assert_eq!(rig.actuator.is_locked(), Some(true));
    assert!(!rig.led.is_on());
}

#[test]
fn test_startup_restores_stored_credentials() {
    let credentials = MemoryRecord::with_contents(
        r#"{"master":"8642","timestamp":1,"items":[{"code":"5555","kind":"timed"}]}"#,
    );
    let cards = MemoryRecord::with_contents(r#"{"timestamp":1,"items":[{"uid":"04ABCDEF","name":"Front"}]}"#);
    let mut rig = Rig::with_records(LockConfig::default(), credentials, cards);

    assert!(rig.engine.credentials().has_master());
    assert_eq!(rig.engine.cards().len(), 1);

    rig.type_keys("5555#");
    assert_eq!(rig.status(), LockStatus::Unlocked);
}

#[test]
fn test_unreadable_record_starts_empty() {
    let credentials = MemoryRecord::with_contents("{ not json");
    let rig = Rig::with_records(LockConfig::default(), credentials, MemoryRecord::new());

    assert!(!rig.engine.credentials().has_master());
    assert_eq!(
        logs(&rig.sink.events())
            .into_iter()
            .find(|(event, _, _)| event == "storage_load_failed")
            .map(|(_, method, _)| method),
        Some("credentials".to_string())
    );
}

// ----------------------------------------------------------------------
// Keypad
// ----------------------------------------------------------------------

#[test]
fn test_master_pin_unlocks_then_auto_relocks() {
    let mut rig = Rig::new();
    rig.set_master("4321");
    rig.sink.take();

    rig.type_keys("4321#");
    assert_eq!(rig.status(), LockStatus::Unlocked);
    assert_eq!(rig.actuator.is_locked(), Some(false));

    rig.run_for(4_900);
    assert_eq!(rig.status(), LockStatus::Unlocked);
    rig.run_for(200);
    assert_eq!(rig.status(), LockStatus::Locked);
    assert_eq!(rig.actuator.is_locked(), Some(true));

    let events = rig.sink.take();
    assert_eq!(
        lock_changes(&events),
        vec![
            (LockStatus::Unlocked, LockReason::Pin),
            (LockStatus::Locked, LockReason::Auto)
        ]
    );
    assert!(has_log(&events, "door_unlocked"));
    assert!(has_log(&events, "door_locked"));
}

#[test]
fn test_led_blinks_only_while_unlocked() {
    let mut rig = Rig::new();
    rig.engine.request_unlock(LockReason::Remote);
    rig.run_for(3_500);
    assert!(rig.led.toggles() >= 3);

    rig.engine.request_lock(LockReason::Remote);
    rig.step();
    let toggles = rig.led.toggles();
    assert!(!rig.led.is_on());
    rig.run_for(3_000);
    assert_eq!(rig.led.toggles(), toggles);
}

#[test]
fn test_lockout_after_failed_attempts() {
    let mut rig = Rig::new();
    rig.set_master("4321");
    rig.sink.take();

    for _ in 0..5 {
        rig.type_keys("1111#");
    }
    assert!(rig.engine.is_locked_out());
    let events = rig.sink.take();
    assert_eq!(log_detail(&events, "pin_lockout"), Some("30s".to_string()));
    assert_eq!(
        logs(&events)
            .iter()
            .filter(|(event, _, _)| event == "access_denied")
            .count(),
        5
    );

    // The right code is swallowed during lockout
    rig.type_keys("4321#");
    assert_eq!(rig.status(), LockStatus::Locked);
    assert!(lock_changes(&rig.sink.take()).is_empty());

    rig.run_for(30_000);
    assert!(!rig.engine.is_locked_out());
    rig.type_keys("4321#");
    assert_eq!(rig.status(), LockStatus::Unlocked);
    assert_eq!(rig.engine.failed_attempts(), 0);
}

#[test]
fn test_short_pin_counts_as_failure() {
    let mut rig = Rig::new();
    rig.set_master("4321");
    rig.sink.take();

    rig.type_keys("12#");
    assert_eq!(rig.engine.failed_attempts(), 1);
    assert_eq!(
        log_detail(&rig.sink.take(), "access_denied"),
        Some("too_short".to_string())
    );
}

#[test]
fn test_star_cancels_entry() {
    let mut rig = Rig::new();
    rig.set_master("4321");

    rig.type_keys("99*4321#");
    assert_eq!(rig.status(), LockStatus::Unlocked);
    assert_eq!(rig.engine.failed_attempts(), 0);
}

#[test]
fn test_one_time_code_works_once() {
    let mut rig = Rig::new();
    rig.command(
        CommandKind::Credential,
        r#"{"action":"add","type":"temp","code":"246810"}"#,
    );
    assert_eq!(rig.engine.credentials().list().len(), 1);
    assert!(has_log(&rig.sink.take(), "passcode_added"));

    rig.type_keys("246810#");
    assert_eq!(rig.status(), LockStatus::Unlocked);
    assert!(rig.engine.credentials().list().is_empty());
    assert_eq!(credential_codes(&rig.sink.take()), Some(vec![]));

    rig.engine.request_lock(LockReason::Remote);
    rig.type_keys("246810#");
    assert_eq!(rig.status(), LockStatus::Locked);
    assert_eq!(
        log_detail(&rig.sink.take(), "access_denied"),
        Some("no_match".to_string())
    );
}

#[test]
fn test_timed_code_respects_window() {
    let mut rig = Rig::new();
    let payload = format!(
        r#"{{"action":"add","type":"timed","code":"7777","effective_at":{},"expire_at":{}}}"#,
        WALL_START + 100,
        WALL_START + 200
    );
    rig.command(CommandKind::Credential, &payload);
    rig.sink.take();

    let press = |rig: &mut Rig, keys: &str| {
        for c in keys.chars() {
            rig.engine.handle_key(KeypadInput::from_char(c).unwrap());
        }
    };

    press(&mut rig, "7777#");
    assert_eq!(rig.status(), LockStatus::Locked);
    assert_eq!(
        log_detail(&rig.sink.take(), "access_denied"),
        Some("not_yet_effective".to_string())
    );

    rig.clock.set_wall_secs(WALL_START + 100);
    press(&mut rig, "7777#");
    assert_eq!(rig.status(), LockStatus::Unlocked);

    rig.engine.request_lock(LockReason::Remote);
    rig.clock.set_wall_secs(WALL_START + 199);
    press(&mut rig, "7777#");
    assert_eq!(rig.status(), LockStatus::Unlocked);
    assert_eq!(rig.engine.credentials().list().len(), 1);

    rig.engine.request_lock(LockReason::Remote);
    rig.sink.take();
    rig.clock.set_wall_secs(WALL_START + 200);
    press(&mut rig, "7777#");
    assert_eq!(rig.status(), LockStatus::Locked);
    assert!(rig.engine.credentials().list().is_empty());
    assert_eq!(
        log_detail(&rig.sink.take(), "access_denied"),
        Some("expired".to_string())
    );
}

#[test]
fn test_sweep_drops_expired_codes() {
    let mut rig = Rig::new();
    let payload = format!(
        r#"{{"action":"add","type":"timed","code":"3333","expire_at":{}}}"#,
        WALL_START + 5
    );
    rig.command(CommandKind::Credential, &payload);
    rig.sink.take();

    rig.run_for(6_000);
    assert!(rig.engine.credentials().list().is_empty());
    let events = rig.sink.take();
    assert_eq!(log_detail(&events, "passcodes_expired"), Some("1".to_string()));
    assert_eq!(credential_codes(&events), Some(vec![]));
}

// ----------------------------------------------------------------------
// Cards
// ----------------------------------------------------------------------

#[test]
fn test_enrolled_card_unlocks_unknown_is_denied() {
    let mut rig = Rig::new();
    rig.command(CommandKind::Card, r#"{"action":"add","id":"04:ab:cd:ef"}"#);
    assert!(rig.engine.cards().exists("04ABCDEF"));
    assert_eq!(rig.engine.cards().list()[0].name, "ICCard1");
    rig.sink.take();

    rig.swipe(&CARD_B);
    assert_eq!(rig.status(), LockStatus::Locked);
    assert_eq!(
        log_detail(&rig.sink.take(), "access_denied"),
        Some("0A0B0C0D".to_string())
    );

    rig.rfid.present_card(CARD_A.to_vec());
    rig.run_for(150);
    assert_eq!(rig.status(), LockStatus::Unlocked);
    assert_eq!(
        lock_changes(&rig.sink.take()),
        vec![(LockStatus::Unlocked, LockReason::Card)]
    );

    // Held in the field: read once
    rig.run_for(1_000);
    assert!(lock_changes(&rig.sink.take()).is_empty());
    assert_eq!(rig.rfid.read_count(), 2);
}

#[test]
fn test_swipe_enrollment_same_card_twice() {
    let mut rig = Rig::new();
    rig.command(CommandKind::Card, r#"{"action":"start_swipe_add"}"#);
    assert!(rig.engine.is_enrolling());

    rig.swipe(&CARD_A);
    assert!(rig.engine.cards().is_empty());
    rig.swipe(&CARD_A);

    assert!(!rig.engine.is_enrolling());
    assert!(rig.engine.cards().exists("04ABCDEF"));
    assert_eq!(rig.engine.cards().list()[0].name, "ICCard1");
    assert_eq!(rig.status(), LockStatus::Locked);

    let events = rig.sink.take();
    assert_eq!(
        enroll_statuses(&events),
        vec!["swipe_add_started", "swipe_add_first_card", "swipe_add_completed"]
    );
    assert!(logs(&events).contains(&(
        "card_added".to_string(),
        "swipe_add".to_string(),
        Some("04ABCDEF".to_string())
    )));
}

#[test]
fn test_swipe_enrollment_mismatch() {
    let mut rig = Rig::new();
    rig.command(CommandKind::Card, r#"{"action":"start_swipe_add"}"#);
    rig.swipe(&CARD_A);
    rig.swipe(&CARD_B);

    assert!(!rig.engine.is_enrolling());
    assert!(rig.engine.cards().is_empty());
    assert_eq!(
        log_detail(&rig.sink.take(), "swipe_add_failed"),
        Some("mismatch".to_string())
    );
}

#[test]
fn test_swipe_enrollment_times_out() {
    let config = LockConfig {
        swipe_add_timeout_ms: 5_000,
        ..LockConfig::default()
    };
    let mut rig = Rig::with_config(config);
    rig.command(CommandKind::Card, r#"{"action":"start_swipe_add"}"#);
    rig.swipe(&CARD_A);
    rig.run_for(5_000);

    assert!(!rig.engine.is_enrolling());
    let events = rig.sink.take();
    assert_eq!(log_detail(&events, "swipe_add_failed"), Some("timeout".to_string()));
    assert_eq!(enroll_statuses(&events).last().map(String::as_str), Some("swipe_add_failed"));

    // Back to normal authentication
    rig.swipe(&CARD_A);
    assert!(rig.engine.cards().is_empty());
    assert!(has_log(&rig.sink.take(), "access_denied"));
}

#[test]
fn test_swipe_enrollment_rejects_enrolled_card() {
    let mut rig = Rig::new();
    rig.command(CommandKind::Card, r#"{"action":"add","id":"04ABCDEF","name":"Front"}"#);
    rig.command(CommandKind::Card, r#"{"action":"start_swipe_add"}"#);
    rig.swipe(&CARD_A);
    rig.swipe(&CARD_A);

    assert_eq!(rig.engine.cards().len(), 1);
    let events = rig.sink.take();
    assert_eq!(log_detail(&events, "card_add_failed"), Some("duplicate".to_string()));
    assert_eq!(enroll_statuses(&events).last().map(String::as_str), Some("swipe_add_failed"));
}

#[test]
fn test_card_commands() {
    let mut rig = Rig::new();
    rig.command(CommandKind::Card, r#"{"action":"add","id":"aa:bb:cc:dd","name":"Desk"}"#);
    rig.command(CommandKind::Card, r#"{"action":"add","id":"AABBCCDD"}"#);
    assert_eq!(
        log_detail(&rig.sink.take(), "card_add_failed"),
        Some("duplicate".to_string())
    );

    rig.command(CommandKind::Card, r#"{"action":"delete","id":"aabbccdd"}"#);
    assert!(rig.engine.cards().is_empty());
    let events = rig.sink.take();
    assert_eq!(log_detail(&events, "card_deleted"), Some("AABBCCDD".to_string()));
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::CardList { cards } if cards.is_empty())));

    rig.command(CommandKind::Card, r#"{"action":"delete","id":"AABBCCDD"}"#);
    assert_eq!(
        log_detail(&rig.sink.take(), "card_delete_failed"),
        Some("not_found".to_string())
    );
}

// ----------------------------------------------------------------------
// Door
// ----------------------------------------------------------------------

#[test]
fn test_door_close_locks_immediately_with_zero_delay() {
    let config = LockConfig {
        auto_relock_delay_ms: 0,
        ..LockConfig::default()
    };
    let mut rig = Rig::with_config(config);
    rig.engine.request_unlock(LockReason::Remote);
    rig.open_door();
    assert!(rig.engine.is_door_open());
    assert_eq!(rig.status(), LockStatus::Unlocked);

    rig.close_door();
    assert_eq!(rig.status(), LockStatus::Locked);
    assert_eq!(
        lock_changes(&rig.sink.take()).last(),
        Some(&(LockStatus::Locked, LockReason::DoorClosed))
    );
}

#[test]
fn test_door_close_rearms_relock() {
    let config = LockConfig {
        unlock_duration_ms: 1_000,
        auto_relock_delay_ms: 5_000,
        ..LockConfig::default()
    };
    let mut rig = Rig::with_config(config);
    rig.engine.request_unlock(LockReason::Remote);
    rig.open_door();
    rig.close_door();

    let events = rig.sink.take();
    assert_eq!(log_detail(&events, "relock_scheduled"), Some("5000ms".to_string()));
    assert!(has_log(&events, "door_opened"));
    assert!(has_log(&events, "door_closed"));

    rig.run_for(4_700);
    assert_eq!(rig.status(), LockStatus::Unlocked);
    rig.run_for(300);
    assert_eq!(rig.status(), LockStatus::Locked);
    assert_eq!(
        lock_changes(&rig.sink.take()),
        vec![(LockStatus::Locked, LockReason::Auto)]
    );
}

#[test]
fn test_door_bounce_is_debounced() {
    let mut rig = Rig::new();
    for _ in 0..5 {
        rig.contact.set_open(true);
        rig.step();
        rig.contact.set_open(false);
        rig.step();
    }
    rig.run_for(200);
    assert!(!rig.engine.is_door_open());
    assert!(!has_log(&rig.sink.take(), "door_opened"));
}

#[test]
fn test_door_close_while_locked_does_nothing() {
    let mut rig = Rig::new();
    rig.open_door();
    rig.close_door();
    let events = rig.sink.take();
    assert!(lock_changes(&events).is_empty());
    assert!(!has_log(&events, "relock_scheduled"));
}

#[test]
fn test_actuator_fault_is_reported() {
    let mut rig = Rig::new();
    rig.actuator.set_fail(true);
    rig.command(CommandKind::Control, r#"{"action":"unlock"}"#);

    assert_eq!(rig.status(), LockStatus::Unlocked);
    assert!(has_log(&rig.sink.take(), "actuator_fault"));
}

// ----------------------------------------------------------------------
// Remote commands
// ----------------------------------------------------------------------

#[test]
fn test_remote_control() {
    let mut rig = Rig::new();
    rig.command(CommandKind::Control, r#"{"action":"unlock"}"#);
    rig.command(CommandKind::Control, r#"{"action":"lock"}"#);

    assert_eq!(
        lock_changes(&rig.sink.take()),
        vec![
            (LockStatus::Unlocked, LockReason::Remote),
            (LockStatus::Locked, LockReason::Remote)
        ]
    );
}

#[test]
fn test_master_change_requires_old_code() {
    let mut rig = Rig::new();
    rig.set_master("1234");
    assert_eq!(
        log_detail(&rig.sink.take(), "master_set"),
        Some("****34".to_string())
    );

    rig.set_master("5678");
    let events = rig.sink.take();
    assert!(events.contains(&EngineEvent::PasscodeError {
        error: "old_master_required".into()
    }));
    assert!(rig.engine.credentials().verify_master("1234"));

    rig.command(
        CommandKind::Credential,
        r#"{"action":"add","type":"permanent","code":"5678","old_code":"1234"}"#,
    );
    assert!(has_log(&rig.sink.take(), "master_changed"));
    assert!(rig.engine.credentials().verify_master("5678"));

    rig.command(CommandKind::Credential, r#"{"action":"delete","code":"5678"}"#);
    assert!(has_log(&rig.sink.take(), "master_deleted"));
    assert!(!rig.engine.credentials().has_master());
}

#[rstest]
#[case(r#"{"action":"add","type":"one_time","code":"12"}"#, "invalid_length")]
#[case(r#"{"action":"add","type":"one_time","code":"12345678901"}"#, "invalid_length")]
#[case(r#"{"action":"add","type":"timed","code":"1234","expire_at":1000}"#, "already_expired")]
#[case(r#"{"action":"add","type":"timed","code":"1234","effective_at":1800000000,"expire_at":1800000000}"#, "invalid_window")]
fn test_temporary_code_rejections(#[case] payload: &str, #[case] reason: &str) {
    let mut rig = Rig::new();
    rig.command(CommandKind::Credential, payload);

    assert!(rig.engine.credentials().list().is_empty());
    assert_eq!(
        log_detail(&rig.sink.take(), "add_passcode_failed"),
        Some(reason.to_string())
    );
}

#[test]
fn test_repeated_temporary_code_is_added_and_oldest_decides() {
    let mut rig = Rig::new();
    rig.set_master("1234");
    rig.command(CommandKind::Credential, r#"{"action":"add","type":"temp","code":"1234"}"#);
    assert!(has_log(&rig.sink.take(), "passcode_added"));

    rig.command(
        CommandKind::Credential,
        r#"{"action":"add","type":"timed","code":"2468","effective_at":1800000000}"#,
    );
    rig.command(CommandKind::Credential, r#"{"action":"add","type":"temp","code":"2468"}"#);
    assert!(!has_log(&rig.sink.take(), "add_passcode_failed"));
    assert_eq!(rig.engine.credentials().list().len(), 3);

    // The pending timed entry was added first, so it answers.
    rig.sink.take();
    rig.type_keys("2468#");
    assert_eq!(rig.status(), LockStatus::Locked);
    assert_eq!(rig.engine.failed_attempts(), 1);
    assert_eq!(
        log_detail(&rig.sink.take(), "access_denied"),
        Some("not_yet_effective".to_string())
    );
    assert_eq!(rig.engine.credentials().list().len(), 3);
}

#[test]
fn test_delete_temporary_code() {
    let mut rig = Rig::new();
    rig.command(CommandKind::Credential, r#"{"action":"add","type":"temp","code":"9090"}"#);
    rig.command(CommandKind::Credential, r#"{"action":"delete","code":"9090"}"#);
    assert!(rig.engine.credentials().list().is_empty());
    assert!(has_log(&rig.sink.take(), "passcode_deleted"));

    rig.command(CommandKind::Credential, r#"{"action":"delete","code":"9090"}"#);
    assert_eq!(
        log_detail(&rig.sink.take(), "passcode_delete_failed"),
        Some("not_found".to_string())
    );
}

#[rstest]
#[case(CommandKind::Credential, "{{{")]
#[case(CommandKind::Credential, r#"{"action":"add","type":"forever","code":"1234"}"#)]
#[case(CommandKind::Card, r#"{"action":"explode"}"#)]
#[case(CommandKind::Control, r#"{"action":"open_sesame"}"#)]
fn test_malformed_payload_is_rejected(#[case] kind: CommandKind, #[case] payload: &str) {
    let mut rig = Rig::new();
    rig.sink.take();
    rig.command(kind, payload);

    let events = rig.sink.take();
    assert!(has_log(&events, "command_rejected"));
    assert!(lock_changes(&events).is_empty());
}

#[test]
fn test_network_config_handed_out() {
    let mut rig = Rig::new();
    rig.command(
        CommandKind::ApplyNetworkConfig,
        r#"{"wifi_ssid":"site","wifi_pass":"secret","mqtt_host":"broker.local"}"#,
    );
    let config = rig.engine.network_config().cloned().unwrap();
    assert_eq!(config.mqtt_port, 8883);
    assert_eq!(config.wifi_pass, "secret");
    let events = rig.sink.take();
    let published = events
        .iter()
        .find(|e| matches!(e, EngineEvent::NetworkConfig { config } if config.wifi_ssid == "site"))
        .unwrap();
    assert!(!published.to_json().unwrap().contains("secret"));

    rig.command(CommandKind::ApplyNetworkConfig, r#"{"wifi_ssid":"site"}"#);
    assert!(has_log(&rig.sink.take(), "network_config_failed"));
    assert_eq!(
        rig.engine.network_config().map(|c| c.mqtt_host.as_str()),
        Some("broker.local")
    );
}

#[test]
fn test_sync_commands_and_periodic_sync() {
    let config = LockConfig {
        sync_interval_ms: 2_000,
        ..LockConfig::default()
    };
    let mut rig = Rig::with_config(config);
    rig.sink.take();

    rig.command(CommandKind::SyncCards, "");
    assert!(rig
        .sink
        .take()
        .iter()
        .any(|e| matches!(e, EngineEvent::CardList { .. })));

    rig.run_for(2_100);
    assert!(rig
        .sink
        .take()
        .iter()
        .any(|e| matches!(e, EngineEvent::CredentialList { .. })));
}

#[test]
fn test_full_queue_drops_without_blocking() {
    let mut rig = Rig::new();
    let capacity = rig.engine.config().command_queue_capacity;
    for _ in 0..capacity {
        rig.sender
            .try_send(Command::new(CommandKind::SyncCards, "mqtt", ""))
            .unwrap();
    }
    assert_eq!(
        rig.sender
            .try_send(Command::new(CommandKind::SyncCards, "mqtt", "")),
        Err(QueueError::Full { capacity })
    );
    assert_eq!(rig.engine.pending_commands(), capacity);

    rig.sink.take();
    rig.step();
    assert_eq!(rig.engine.pending_commands(), 0);
    let lists = rig
        .sink
        .take()
        .iter()
        .filter(|e| matches!(e, EngineEvent::CardList { .. }))
        .count();
    assert_eq!(lists, capacity);
}

// ----------------------------------------------------------------------
// Persistence failures
// ----------------------------------------------------------------------

#[test]
fn test_unconfirmed_write_is_kept_and_retried() {
    let mut rig = Rig::new();
    rig.credentials_record.set_fail_writes(true);

    rig.set_master("2468");
    assert!(rig.engine.credentials().verify_master("2468"));
    assert!(rig.engine.credentials().is_dirty());
    let events = rig.sink.take();
    assert!(has_log(&events, "storage_unconfirmed"));
    assert!(has_log(&events, "master_set"));

    rig.type_keys("2468#");
    assert_eq!(rig.status(), LockStatus::Unlocked);

    rig.credentials_record.set_fail_writes(false);
    rig.run_for(1_100);
    assert!(!rig.engine.credentials().is_dirty());
    assert!(has_log(&rig.sink.take(), "storage_confirmed"));
    assert!(rig
        .credentials_record
        .contents()
        .is_some_and(|json| json.contains("2468")));
}

#[test]
fn test_card_write_failure_keeps_card() {
    let mut rig = Rig::new();
    rig.cards_record.set_fail_writes(true);
    rig.command(CommandKind::Card, r#"{"action":"add","id":"04ABCDEF"}"#);

    assert!(rig.engine.cards().exists("04ABCDEF"));
    assert!(rig.engine.flush().is_err());

    rig.cards_record.set_fail_writes(false);
    rig.engine.flush().unwrap();
    assert!(!rig.engine.cards().is_dirty());
}
