//! The access engine: one cooperative control loop owning every piece of
//! lock state.
//!
//! [`AccessEngine::tick`] is called repeatedly by the runtime (a tokio
//! interval in the simulator, the main loop on a board). Each tick runs, in
//! order:
//!
//! 1. queued commands
//! 2. door hardware poll and the door-closed rule
//! 3. the auto-relock check
//! 4. pending key presses
//! 5. the swipe-enrollment deadline
//! 6. one card-scan cycle
//! 7. the once-per-second expiry sweep, which also retries unconfirmed writes
//! 8. the periodic credential-list re-publication
//!
//! Nothing in a tick waits. Outcomes are published through the
//! [`EventSink`].

use latchkey_core::constants::{ENROLLED_CARD_NAME_PREFIX, EXPIRY_SWEEP_INTERVAL_MS};
use latchkey_core::{
    CardUid, Clock, CredentialKind, LockConfig, LockReason, LockStatus, NetworkConfig, mask_code,
};
use latchkey_hardware::{
    CardReader, DoorHardware, DoorPosition, HardwareEvent, HardwareModule, Keypad, KeypadInput,
    ModuleContext,
};
use latchkey_storage::{
    AuthDecision, CardRegistry, Credential, CredentialStore, DenialReason, StorageError,
    StorageResult, ValidityWindow,
};
use tracing::{debug, error, info, warn};

use crate::commands::{CardCommand, ControlCommand, CredentialCommand};
use crate::enroll::{EnrollStep, SwipeEnroll};
use crate::error::Result;
use crate::events::{CardSummary, CredentialSummary, EngineEvent, EventSink};
use crate::lock_state::LockStateMachine;
use crate::pin_entry::{KeyAction, PinEntry};
use crate::queue::{Command, CommandKind, CommandQueue, CommandSender};
use crate::scan::{CardScanner, ScanPhase};

/// Key presses handled per tick at most.
const MAX_KEYS_PER_TICK: usize = 16;

/// The devices the engine drives.
pub struct Peripherals {
    pub keypad: Box<dyn Keypad>,
    pub reader: Box<dyn CardReader>,
    pub door: DoorHardware,
}

pub struct AccessEngine<C: Clock, S: EventSink> {
    config: LockConfig,
    clock: C,
    sink: S,

    credentials: CredentialStore,
    cards: CardRegistry,

    keypad: Box<dyn Keypad>,
    reader: Box<dyn CardReader>,
    door: DoorHardware,

    lock: LockStateMachine,
    pin: PinEntry,
    scanner: CardScanner,
    enroll: SwipeEnroll,

    queue: CommandQueue,
    network: Option<NetworkConfig>,

    last_sweep_ms: u64,
    last_sync_ms: u64,
}

impl<C: Clock, S: EventSink> AccessEngine<C, S> {
    /// Assemble an engine. Nothing is touched until [`init`](Self::init).
    pub fn new(
        config: LockConfig,
        clock: C,
        sink: S,
        credentials: CredentialStore,
        cards: CardRegistry,
        peripherals: Peripherals,
    ) -> Self {
        Self {
            pin: PinEntry::new(config.max_pin_length),
            scanner: CardScanner::new(config.rfid_debounce_ms),
            queue: CommandQueue::new(config.command_queue_capacity),
            credentials: credentials.with_min_master_length(config.min_pin_length),
            config,
            clock,
            sink,
            cards,
            keypad: peripherals.keypad,
            reader: peripherals.reader,
            door: peripherals.door,
            lock: LockStateMachine::new(),
            enroll: SwipeEnroll::Inactive,
            network: None,
            last_sweep_ms: 0,
            last_sync_ms: 0,
        }
    }

    /// Bring up hardware, load the stores and publish the initial state.
    ///
    /// A store that cannot be loaded starts empty; a reader that does not
    /// answer is retried by the scan cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the door hardware cannot be initialized.
    pub fn init(&mut self) -> Result<()> {
        let now = self.clock.now_ms();

        let mut ctx = ModuleContext::new(now);
        self.door.init(&mut ctx)?;
        debug!(door = ?self.door.door_position(), "Door hardware ready");

        if let Err(e) = self.reader.init() {
            warn!(error = %e, "Card reader init failed, will retry while scanning");
        }
        info!(keypad = %self.keypad.info().name, reader = %self.reader.info().name, "Input devices ready");

        match self.credentials.load() {
            Ok(report) => info!(
                loaded = report.loaded,
                dropped = report.dropped,
                master = self.credentials.has_master(),
                "Credentials loaded"
            ),
            Err(e) => {
                error!(error = %e, "Credential record unreadable, starting empty");
                self.publish(EngineEvent::log_with("storage_load_failed", "credentials", e.to_string()));
            }
        }
        match self.cards.load() {
            Ok(report) => info!(loaded = report.loaded, dropped = report.dropped, "Cards loaded"),
            Err(e) => {
                error!(error = %e, "Card record unreadable, starting empty");
                self.publish(EngineEvent::log_with("storage_load_failed", "cards", e.to_string()));
            }
        }

        self.lock.lock(LockReason::Startup, now);
        self.publish(EngineEvent::LockState {
            state: LockStatus::Locked,
            reason: LockReason::Startup,
        });
        self.publish_credential_list();
        self.publish_card_list();

        self.last_sweep_ms = now;
        self.last_sync_ms = now;
        Ok(())
    }

    /// Run one control-loop iteration.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();

        for command in self.queue.drain() {
            self.dispatch(&command, now);
        }

        self.poll_door(now);

        if self.lock.should_auto_relock(now) {
            self.lock_door(LockReason::Auto, now);
        }

        self.poll_keypad(now);

        if self.enroll.check_timeout(now) {
            self.enroll_timed_out();
        }

        if let Some(uid) = self.scanner.poll(self.reader.as_mut(), now) {
            self.on_card(uid, now);
        }

        if now.saturating_sub(self.last_sweep_ms) >= EXPIRY_SWEEP_INTERVAL_MS {
            self.last_sweep_ms = now;
            self.housekeeping();
        }

        if self.config.sync_interval_ms > 0
            && now.saturating_sub(self.last_sync_ms) >= self.config.sync_interval_ms
        {
            self.last_sync_ms = now;
            debug!("Periodic credential list sync");
            self.publish_credential_list();
        }
    }

    /// Producer handle for asynchronous triggers.
    pub fn sender(&self) -> CommandSender {
        self.queue.sender()
    }

    /// Commands waiting for the next tick.
    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    /// Handle one key press now, outside the tick.
    pub fn handle_key(&mut self, key: KeypadInput) {
        let now = self.clock.now_ms();
        self.on_key(key, now);
    }

    /// Evaluate a card read now, outside the tick.
    pub fn evaluate_card(&mut self, uid: CardUid) {
        let now = self.clock.now_ms();
        self.on_card(uid, now);
    }

    /// Handle one command now, bypassing the queue.
    pub fn handle_command(&mut self, command: &Command) {
        let now = self.clock.now_ms();
        self.dispatch(command, now);
    }

    pub fn request_unlock(&mut self, reason: LockReason) {
        let now = self.clock.now_ms();
        self.unlock(reason, now);
    }

    pub fn request_lock(&mut self, reason: LockReason) {
        let now = self.clock.now_ms();
        self.lock_door(reason, now);
    }

    /// Write any unconfirmed store state.
    ///
    /// # Errors
    ///
    /// Returns the first write error; both stores are attempted.
    pub fn flush(&mut self) -> Result<()> {
        let credentials = self.credentials.flush();
        let cards = self.cards.flush();
        credentials?;
        cards?;
        Ok(())
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn lock_state(&self) -> &LockStateMachine {
        &self.lock
    }

    pub fn lock_status(&self) -> LockStatus {
        self.lock.status()
    }

    pub fn is_locked_out(&self) -> bool {
        self.pin.is_locked_out(self.clock.now_ms())
    }

    pub fn failed_attempts(&self) -> u32 {
        self.pin.failed_count()
    }

    pub fn is_enrolling(&self) -> bool {
        self.enroll.is_active()
    }

    pub fn scan_phase(&self) -> &ScanPhase {
        self.scanner.phase()
    }

    pub fn is_door_open(&self) -> bool {
        self.door.is_door_open()
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn cards(&self) -> &CardRegistry {
        &self.cards
    }

    /// Last accepted provisioning record.
    pub fn network_config(&self) -> Option<&NetworkConfig> {
        self.network.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ------------------------------------------------------------------
    // Lock
    // ------------------------------------------------------------------

    fn unlock(&mut self, reason: LockReason, now: u64) {
        let transition = self.lock.unlock(self.config.unlock_duration_ms, reason, now);
        if let Err(e) = self.door.release(now) {
            error!(error = %e, "Lock actuator failed to release");
            self.publish(EngineEvent::log_with("actuator_fault", reason.as_str(), e.to_string()));
        }
        if transition.is_change() {
            info!(reason = %reason, relock_in_ms = self.config.unlock_duration_ms, "Door unlocked");
        } else {
            debug!(reason = %reason, "Unlock deadline extended");
        }
        self.publish(EngineEvent::LockState {
            state: LockStatus::Unlocked,
            reason,
        });
        self.publish(EngineEvent::log("door_unlocked", reason.as_str()));
    }

    fn lock_door(&mut self, reason: LockReason, now: u64) {
        let transition = self.lock.lock(reason, now);
        if let Err(e) = self.door.engage() {
            error!(error = %e, "Lock actuator failed to engage");
            self.publish(EngineEvent::log_with("actuator_fault", reason.as_str(), e.to_string()));
        }
        if transition.is_change() {
            info!(reason = %reason, "Door locked");
        }
        self.publish(EngineEvent::LockState {
            state: LockStatus::Locked,
            reason,
        });
        self.publish(EngineEvent::log("door_locked", reason.as_str()));
    }

    fn poll_door(&mut self, now: u64) {
        let mut ctx = ModuleContext::new(now);
        if let Err(e) = self.door.poll(&mut ctx) {
            warn!(error = %e, "Door hardware poll failed");
        }
        for event in ctx.take_events() {
            match event {
                HardwareEvent::Door(DoorPosition::Open) => {
                    info!("Door opened");
                    self.publish(EngineEvent::log("door_opened", "contact"));
                }
                HardwareEvent::Door(DoorPosition::Closed) => {
                    info!("Door closed");
                    self.publish(EngineEvent::log("door_closed", "contact"));
                    self.on_door_closed(now);
                }
                other => debug!(event = ?other, "Unhandled hardware event"),
            }
        }
    }

    fn on_door_closed(&mut self, now: u64) {
        if self.lock.is_locked() {
            return;
        }
        let delay = self.config.auto_relock_delay_ms;
        if delay == 0 {
            self.lock_door(LockReason::DoorClosed, now);
        } else {
            self.lock.rearm_auto_relock(delay, now);
            info!(delay_ms = delay, "Relock scheduled after door closed");
            self.publish(EngineEvent::log_with(
                "relock_scheduled",
                "door_closed",
                format!("{}ms", delay),
            ));
        }
    }

    // ------------------------------------------------------------------
    // Keypad
    // ------------------------------------------------------------------

    fn poll_keypad(&mut self, now: u64) {
        for _ in 0..MAX_KEYS_PER_TICK {
            match self.keypad.poll_key() {
                Ok(Some(key)) => self.on_key(key, now),
                Ok(None) => break,
                Err(e) => {
                    debug!(error = %e, "Keypad poll failed");
                    break;
                }
            }
        }
    }

    fn on_key(&mut self, key: KeypadInput, now: u64) {
        match self.pin.handle_key(key, now) {
            KeyAction::Submit(code) => self.submit_pin(code, now),
            KeyAction::LockedOut => debug!(
                remaining_secs = self.pin.remaining_lockout_secs(now),
                "Key ignored during lockout"
            ),
            KeyAction::BufferFull => debug!("PIN buffer full, digit dropped"),
            KeyAction::Cleared => debug!("PIN entry cleared"),
            KeyAction::Appended | KeyAction::Ignored => {}
        }
    }

    fn submit_pin(&mut self, code: String, now: u64) {
        if code.chars().count() < self.config.min_pin_length {
            debug!(len = code.len(), "PIN shorter than minimum");
            self.pin_failed("too_short", now);
            return;
        }

        match self.credentials.validate_and_consume(&code, self.clock.now_secs()) {
            AuthDecision::Authorized(kind) => {
                info!(code = %mask_code(&code), kind = %kind, "PIN accepted");
                self.pin.record_success();
                self.unlock(LockReason::Pin, now);
                if kind == CredentialKind::OneTime {
                    self.publish_credential_list();
                }
            }
            AuthDecision::Denied(reason) => {
                info!(code = %mask_code(&code), reason = reason.as_str(), "PIN denied");
                if reason == DenialReason::Expired {
                    self.publish_credential_list();
                }
                self.pin_failed(reason.as_str(), now);
            }
        }
    }

    fn pin_failed(&mut self, detail: &str, now: u64) {
        let locked_out = self.pin.record_failed_attempt(
            self.config.max_failed_attempts,
            self.config.lockout_duration_ms,
            now,
        );
        self.publish(EngineEvent::log_with("access_denied", "pin", detail));
        if locked_out {
            let secs = self.pin.remaining_lockout_secs(now);
            warn!(lockout_secs = secs, "Too many failed PIN attempts, keypad locked out");
            self.publish(EngineEvent::log_with("pin_lockout", "pin", format!("{}s", secs)));
        }
    }

    // ------------------------------------------------------------------
    // Cards
    // ------------------------------------------------------------------

    fn on_card(&mut self, uid: CardUid, now: u64) {
        if let Some(step) = self
            .enroll
            .on_swipe(uid.clone(), self.config.swipe_add_timeout_ms, now)
        {
            self.on_enroll_step(step);
            return;
        }

        if self.cards.contains(&uid) {
            info!(uid = %uid, "Card accepted");
            self.unlock(LockReason::Card, now);
        } else {
            info!(uid = %uid, "Unknown card");
            self.publish(EngineEvent::log_with("access_denied", "card", uid.as_str()));
        }
    }

    fn on_enroll_step(&mut self, step: EnrollStep) {
        match step {
            EnrollStep::FirstSwipe(uid) => {
                info!(uid = %uid, "Swipe enrollment: present the card again");
                self.publish_enroll_status("swipe_add_first_card");
            }
            EnrollStep::Confirmed(uid) => {
                let status = if self.add_card(&uid, None, "swipe_add") {
                    "swipe_add_completed"
                } else {
                    "swipe_add_failed"
                };
                self.publish_enroll_status(status);
            }
            EnrollStep::Mismatch { first, second } => {
                warn!(first = %first, second = %second, "Swipe enrollment: different cards");
                self.publish(EngineEvent::log_with("swipe_add_failed", "swipe_add", "mismatch"));
                self.publish_enroll_status("swipe_add_failed");
            }
            EnrollStep::TimedOut => self.enroll_timed_out(),
        }
    }

    fn enroll_timed_out(&mut self) {
        warn!("Swipe enrollment timed out");
        self.publish(EngineEvent::log_with("swipe_add_failed", "swipe_add", "timeout"));
        self.publish_enroll_status("swipe_add_failed");
    }

    /// Enroll `uid`, naming it `ICCard<N+1>` when no name is given.
    ///
    /// # Returns
    ///
    /// Returns `false` if the registry refused the card.
    fn add_card(&mut self, uid: &CardUid, name: Option<String>, method: &str) -> bool {
        let name = name
            .unwrap_or_else(|| format!("{}{}", ENROLLED_CARD_NAME_PREFIX, self.cards.len() + 1));
        let result = self
            .cards
            .add(uid.as_str(), Some(&name), self.clock.now_secs())
            .map(|_| ());
        match self.confirm(result, (), "cards") {
            Ok(()) => {
                self.publish(EngineEvent::log_with("card_added", method, uid.as_str()));
                self.publish_card_list();
                true
            }
            Err(e) => {
                let detail = match e {
                    StorageError::Duplicate(_) => "duplicate".to_string(),
                    other => other.to_string(),
                };
                warn!(uid = %uid, reason = %detail, "Card not added");
                self.publish(EngineEvent::log_with("card_add_failed", method, detail));
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    fn dispatch(&mut self, command: &Command, now: u64) {
        debug!(kind = %command.kind, source = %command.source, "Handling command");
        let source = command.source.as_str();
        let result = match command.kind {
            CommandKind::ApplyNetworkConfig => {
                self.apply_network_config(&command.payload, source);
                Ok(())
            }
            CommandKind::Credential => CredentialCommand::parse(&command.payload)
                .map(|cmd| self.handle_credential(cmd, source)),
            CommandKind::Card => {
                CardCommand::parse(&command.payload).map(|cmd| self.handle_card(cmd, source, now))
            }
            CommandKind::Control => ControlCommand::parse(&command.payload).map(|cmd| match cmd {
                ControlCommand::Unlock => self.unlock(LockReason::Remote, now),
                ControlCommand::Lock => self.lock_door(LockReason::Remote, now),
            }),
            CommandKind::SyncCredentials => {
                self.publish_credential_list();
                Ok(())
            }
            CommandKind::SyncCards => {
                self.publish_card_list();
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!(kind = %command.kind, source, error = %e, "Command rejected");
            self.publish(EngineEvent::log_with("command_rejected", source, e.to_string()));
        }
    }

    fn apply_network_config(&mut self, payload: &str, source: &str) {
        match NetworkConfig::from_json_str(payload) {
            Ok(config) => {
                info!(
                    ssid = %config.wifi_ssid,
                    host = %config.mqtt_host,
                    port = config.mqtt_port,
                    "Network configuration accepted"
                );
                self.network = Some(config.clone());
                self.publish(EngineEvent::NetworkConfig { config });
                self.publish(EngineEvent::log("network_config_applied", source));
            }
            Err(e) => {
                warn!(error = %e, "Network configuration rejected");
                self.publish(EngineEvent::log_with("network_config_failed", source, e.to_string()));
            }
        }
    }

    fn handle_credential(&mut self, command: CredentialCommand, source: &str) {
        let now_secs = self.clock.now_secs();
        match command {
            CredentialCommand::SetMaster { code, old_code } => {
                if !self.config.pin_length_ok(&code) {
                    self.publish(EngineEvent::log_with("add_passcode_failed", source, "invalid_length"));
                    return;
                }
                let had_master = self.credentials.has_master();
                if had_master
                    && !old_code
                        .as_deref()
                        .is_some_and(|old| self.credentials.verify_master(old))
                {
                    warn!("Master change refused: current master not proven");
                    self.publish(EngineEvent::PasscodeError {
                        error: "old_master_required".into(),
                    });
                    return;
                }
                let result = self.credentials.set_master(&code, now_secs);
                match self.confirm(result, (), "credentials") {
                    Ok(()) => {
                        let event = if had_master { "master_changed" } else { "master_set" };
                        self.publish(EngineEvent::log_with(event, source, mask_code(&code)));
                        self.publish_credential_list();
                    }
                    Err(e) => {
                        self.publish(EngineEvent::log_with("add_passcode_failed", source, e.to_string()));
                    }
                }
            }
            CredentialCommand::AddTemporary(entry) => {
                if let Some(reason) = self.temporary_rejection(&entry, now_secs) {
                    info!(code = %entry.masked(), reason, "Temporary passcode refused");
                    self.publish(EngineEvent::log_with("add_passcode_failed", source, reason));
                    return;
                }
                let masked = entry.masked();
                let result = self.credentials.add_timed_or_one_time(entry, now_secs);
                match self.confirm(result, (), "credentials") {
                    Ok(()) => {
                        self.publish(EngineEvent::log_with("passcode_added", source, masked));
                        self.publish_credential_list();
                    }
                    Err(e) => {
                        self.publish(EngineEvent::log_with("add_passcode_failed", source, e.to_string()));
                    }
                }
            }
            CredentialCommand::Delete { code } => {
                let (event, result) = if self.credentials.verify_master(&code) {
                    ("master_deleted", self.credentials.clear_master(now_secs))
                } else {
                    ("passcode_deleted", self.credentials.remove_by_code(&code, now_secs))
                };
                match self.confirm(result, true, "credentials") {
                    Ok(true) => {
                        self.publish(EngineEvent::log_with(event, source, mask_code(&code)));
                        self.publish_credential_list();
                    }
                    Ok(false) => {
                        self.publish(EngineEvent::log_with("passcode_delete_failed", source, "not_found"));
                    }
                    Err(e) => {
                        self.publish(EngineEvent::log_with("passcode_delete_failed", source, e.to_string()));
                    }
                }
            }
        }
    }

    fn temporary_rejection(&self, entry: &Credential, now_secs: u64) -> Option<&'static str> {
        if !self.config.pin_length_ok(&entry.code) {
            return Some("invalid_length");
        }
        if entry.expire_at != 0 && entry.effective_at >= entry.expire_at {
            return Some("invalid_window");
        }
        if entry.is_expired(now_secs) {
            return Some("already_expired");
        }
        None
    }

    fn handle_card(&mut self, command: CardCommand, source: &str, now: u64) {
        match command {
            CardCommand::Add { id, name } => match CardUid::new(&id) {
                Ok(uid) => {
                    self.add_card(&uid, name, source);
                }
                Err(e) => {
                    self.publish(EngineEvent::log_with("card_add_failed", source, e.to_string()));
                }
            },
            CardCommand::Delete { id } => {
                let result = self.cards.remove(&id, self.clock.now_secs());
                match self.confirm(result, true, "cards") {
                    Ok(true) => {
                        let uid = CardUid::new(&id).map_or(id, String::from);
                        self.publish(EngineEvent::log_with("card_deleted", source, uid));
                        self.publish_card_list();
                    }
                    Ok(false) => {
                        self.publish(EngineEvent::log_with("card_delete_failed", source, "not_found"));
                    }
                    Err(e) => {
                        self.publish(EngineEvent::log_with("card_delete_failed", source, e.to_string()));
                    }
                }
            }
            CardCommand::StartSwipeAdd => {
                self.enroll.start(self.config.swipe_add_timeout_ms, now);
                info!(
                    timeout_secs = self.enroll.remaining_secs(now),
                    "Swipe enrollment started"
                );
                self.publish_enroll_status("swipe_add_started");
            }
        }
    }

    // ------------------------------------------------------------------
    // Housekeeping and publishing
    // ------------------------------------------------------------------

    fn housekeeping(&mut self) {
        let dropped = self.credentials.sweep_expired(self.clock.now_secs());
        if dropped > 0 {
            self.publish(EngineEvent::log_with("passcodes_expired", "sweep", dropped.to_string()));
            self.publish_credential_list();
        }

        if self.credentials.is_dirty() {
            match self.credentials.flush() {
                Ok(()) => self.publish(EngineEvent::log("storage_confirmed", "credentials")),
                Err(e) => debug!(error = %e, "Credential record still not written"),
            }
        }
        if self.cards.is_dirty() {
            match self.cards.flush() {
                Ok(()) => self.publish(EngineEvent::log("storage_confirmed", "cards")),
                Err(e) => debug!(error = %e, "Card record still not written"),
            }
        }
    }

    /// Treat an unconfirmed write as applied.
    ///
    /// The store keeps the change and stays dirty; the sweep retries the
    /// write. Refused input passes through unchanged.
    fn confirm<T>(&mut self, result: StorageResult<T>, applied: T, store: &str) -> StorageResult<T> {
        match result {
            Err(e) if !e.is_rejection() => {
                warn!(store, error = %e, "Change kept in memory but not yet persisted");
                self.publish(EngineEvent::log_with("storage_unconfirmed", store, e.to_string()));
                Ok(applied)
            }
            other => other,
        }
    }

    fn publish_credential_list(&mut self) {
        let now_secs = self.clock.now_secs();
        let mut entries = Vec::with_capacity(self.credentials.list().len() + 1);
        if let Some(master) = self.credentials.master() {
            entries.push(CredentialSummary::master(master));
        }
        entries.extend(
            self.credentials
                .list()
                .iter()
                .map(|entry| CredentialSummary::from_credential(entry, now_secs)),
        );
        self.publish(EngineEvent::CredentialList { entries });
    }

    fn publish_card_list(&mut self) {
        let cards = self.cards.list().iter().map(CardSummary::from).collect();
        self.publish(EngineEvent::CardList { cards });
    }

    fn publish_enroll_status(&mut self, status: &str) {
        self.publish(EngineEvent::EnrollStatus {
            status: status.to_string(),
        });
    }

    fn publish(&mut self, event: EngineEvent) {
        self.sink.publish(event);
    }
}
