//! Card-scan state machine.
//!
//! Reading a proximity card is a poll-driven sequence rather than one
//! blocking call: the reader is polled at a fixed cadence, a card in the
//! field is read (with retries) once, and then held until it leaves the
//! field so it is not read again.
//!
//! # Phases
//!
//! - `Idle`: no card. Presence moves to `Trying`.
//! - `Trying`: a card is in the field and has not been read yet. Collisions
//!   are retried, read failures are counted and every
//!   [`SCAN_REINIT_EVERY_FAILS`] of them the reader is reinitialized.
//! - `Held`: the card was read. Stays here until presence has been absent
//!   for longer than [`SCAN_REMOVE_GRACE_MS`].
//!
//! After a successful read an idle scanner waits `rfid_debounce_ms` before
//! starting a new cycle.

use latchkey_core::CardUid;
use latchkey_core::constants::{
    SCAN_ATTEMPT_INTERVAL_MS, SCAN_POLL_INTERVAL_MS, SCAN_REINIT_EVERY_FAILS,
    SCAN_REMOVE_GRACE_MS,
};
use latchkey_hardware::{CardReader, HardwareError};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Trying {
        last_attempt: Option<u64>,
        fail_count: u32,
    },
    Held {
        uid: CardUid,
    },
}

#[derive(Debug, Clone)]
pub struct CardScanner {
    phase: ScanPhase,
    debounce_ms: u64,
    last_cycle: Option<u64>,
    last_read: Option<u64>,
    presence_last_seen: u64,
}

impl CardScanner {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            phase: ScanPhase::Idle,
            debounce_ms,
            last_cycle: None,
            last_read: None,
            presence_last_seen: 0,
        }
    }

    pub fn phase(&self) -> &ScanPhase {
        &self.phase
    }

    /// Run one scan cycle if the cadence allows it.
    ///
    /// # Returns
    ///
    /// Returns the UID of a card that was read during this cycle. A held
    /// card is only reported once.
    pub fn poll(&mut self, reader: &mut dyn CardReader, now: u64) -> Option<CardUid> {
        if let Some(last) = self.last_cycle
            && now.saturating_sub(last) < SCAN_POLL_INTERVAL_MS
        {
            return None;
        }
        self.last_cycle = Some(now);

        if self.phase == ScanPhase::Idle
            && let Some(read_at) = self.last_read
            && now.saturating_sub(read_at) < self.debounce_ms
        {
            return None;
        }

        let present = match reader.is_card_present() {
            Ok(present) => present,
            Err(e) => {
                debug!(error = %e, "Presence check failed");
                false
            }
        };
        if present {
            self.presence_last_seen = now;
        }
        let absent_for = now.saturating_sub(self.presence_last_seen);

        match &mut self.phase {
            ScanPhase::Idle => {
                if present {
                    debug!("Card in field");
                    self.phase = ScanPhase::Trying {
                        last_attempt: None,
                        fail_count: 0,
                    };
                }
                None
            }
            ScanPhase::Trying {
                last_attempt,
                fail_count,
            } => {
                if !present && absent_for > SCAN_REMOVE_GRACE_MS {
                    debug!(fail_count = *fail_count, "Card left before it was read");
                    self.phase = ScanPhase::Idle;
                    return None;
                }
                if let Some(last) = *last_attempt
                    && now.saturating_sub(last) < SCAN_ATTEMPT_INTERVAL_MS
                {
                    return None;
                }
                *last_attempt = Some(now);

                let read = reader.read_uid().and_then(|card| {
                    card.card_uid()
                        .map_err(|e| HardwareError::invalid_data(e.to_string()))
                });
                match read {
                    Ok(uid) => {
                        halt(reader);
                        info!(uid = %uid, "Card read");
                        self.last_read = Some(now);
                        self.phase = ScanPhase::Held { uid: uid.clone() };
                        Some(uid)
                    }
                    Err(e) if e.is_retryable() => {
                        debug!(error = %e, "Card read retry");
                        halt(reader);
                        None
                    }
                    Err(e) => {
                        *fail_count += 1;
                        debug!(error = %e, fail_count = *fail_count, "Card read failed");
                        halt(reader);
                        if *fail_count % SCAN_REINIT_EVERY_FAILS == 0 {
                            warn!(fail_count = *fail_count, "Reinitializing card reader");
                            if let Err(e) = reader.reinit() {
                                warn!(error = %e, "Card reader reinit failed");
                            }
                        }
                        None
                    }
                }
            }
            ScanPhase::Held { uid } => {
                if !present && absent_for > SCAN_REMOVE_GRACE_MS {
                    debug!(uid = %uid, "Card removed");
                    self.phase = ScanPhase::Idle;
                }
                None
            }
        }
    }
}

fn halt(reader: &mut dyn CardReader) {
    if let Err(e) = reader.halt() {
        debug!(error = %e, "Card halt failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latchkey_hardware::mock::{MockRfid, MockRfidHandle, ReadFault};

    const UID: [u8; 4] = [0x04, 0xAB, 0xCD, 0xEF];

    struct Bench {
        scanner: CardScanner,
        reader: MockRfid,
        handle: MockRfidHandle,
        now: u64,
    }

    impl Bench {
        fn new() -> Self {
            let (reader, handle) = MockRfid::new();
            Self {
                scanner: CardScanner::new(2_000),
                reader,
                handle,
                now: 0,
            }
        }

        /// Advance one cadence step and poll.
        fn step(&mut self) -> Option<CardUid> {
            self.now += SCAN_POLL_INTERVAL_MS;
            self.scanner.poll(&mut self.reader, self.now)
        }

        fn run(&mut self, steps: usize) -> Vec<CardUid> {
            (0..steps).filter_map(|_| self.step()).collect()
        }
    }

    #[test]
    fn test_card_read_once_while_held() {
        let mut bench = Bench::new();
        bench.handle.present_card(UID.to_vec());

        let reads = bench.run(50);
        assert_eq!(reads.len(), 1);
        assert_eq!(reads[0].as_str(), "04ABCDEF");
        assert!(matches!(bench.scanner.phase(), ScanPhase::Held { .. }));
        assert_eq!(bench.handle.read_count(), 1);
    }

    #[test]
    fn test_cadence_skips_early_polls() {
        let mut bench = Bench::new();
        bench.handle.present_card(UID.to_vec());
        assert!(bench.scanner.poll(&mut bench.reader, 100).is_none());
        assert!(bench.scanner.poll(&mut bench.reader, 110).is_none());
        assert_eq!(bench.handle.read_count(), 0);
        assert!(bench.scanner.poll(&mut bench.reader, 130).is_some());
    }

    #[test]
    fn test_collision_is_retried() {
        let mut bench = Bench::new();
        bench.handle.present_card(UID.to_vec());
        bench
            .handle
            .script_faults([ReadFault::Collision, ReadFault::Collision]);

        let reads = bench.run(10);
        assert_eq!(reads.len(), 1);
        assert_eq!(bench.handle.read_count(), 3);
        assert_eq!(bench.handle.reinit_count(), 0);
    }

    #[test]
    fn test_reinit_every_25_failures() {
        let mut bench = Bench::new();
        bench.handle.present_card(UID.to_vec());
        bench.handle.fail_all_reads(true);

        bench.run(51);
        assert_eq!(bench.handle.read_count(), 50);
        assert_eq!(bench.handle.reinit_count(), 2);
        assert!(matches!(bench.scanner.phase(), ScanPhase::Trying { .. }));

        bench.handle.fail_all_reads(false);
        assert_eq!(bench.run(1).len(), 1);
    }

    #[test]
    fn test_short_dropout_keeps_card_held() {
        let mut bench = Bench::new();
        bench.handle.present_card(UID.to_vec());
        assert_eq!(bench.run(3).len(), 1);

        // 10 polls at 30 ms is 300 ms, inside the grace period
        bench.handle.drop_presence(10);
        assert!(bench.run(20).is_empty());
        assert!(matches!(bench.scanner.phase(), ScanPhase::Held { .. }));
    }

    #[test]
    fn test_removed_card_returns_to_idle_then_debounces() {
        let mut bench = Bench::new();
        bench.handle.present_card(UID.to_vec());
        assert_eq!(bench.run(3).len(), 1);

        bench.handle.remove_card();
        bench.run(15);
        assert_eq!(bench.scanner.phase(), &ScanPhase::Idle);

        // Back in the field within the debounce window: not read again
        bench.handle.present_card(UID.to_vec());
        assert!(bench.run(20).is_empty());

        // Past the debounce window
        assert_eq!(bench.run(60).len(), 1);
    }

    #[test]
    fn test_card_leaving_while_trying_returns_idle() {
        let mut bench = Bench::new();
        bench.handle.present_card(UID.to_vec());
        bench.handle.fail_all_reads(true);
        bench.run(5);
        assert!(matches!(bench.scanner.phase(), ScanPhase::Trying { .. }));

        bench.handle.remove_card();
        bench.run(15);
        assert_eq!(bench.scanner.phase(), &ScanPhase::Idle);
    }

    #[test]
    fn test_oversized_uid_counts_as_failure() {
        let mut bench = Bench::new();
        bench.handle.present_card(vec![0x5A; 11]);
        assert!(bench.run(10).is_empty());
        assert!(matches!(
            bench.scanner.phase(),
            ScanPhase::Trying { fail_count, .. } if *fail_count > 0
        ));
    }
}
