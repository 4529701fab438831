//! Mock door peripherals: contact sensor, lock actuator, indicator LED.

use crate::{
    HardwareError, Result,
    traits::{ContactSensor, Indicator, LockActuator},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

/// Mock reed switch. The handle sets the raw reading.
#[derive(Debug)]
pub struct MockContactSensor {
    open: Arc<AtomicBool>,
}

impl MockContactSensor {
    pub fn new(open: bool) -> (Self, MockContactSensorHandle) {
        let open = Arc::new(AtomicBool::new(open));
        (
            Self { open: open.clone() },
            MockContactSensorHandle { open },
        )
    }
}

impl ContactSensor for MockContactSensor {
    fn read_open_raw(&mut self) -> Result<bool> {
        Ok(self.open.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone)]
pub struct MockContactSensorHandle {
    open: Arc<AtomicBool>,
}

impl MockContactSensorHandle {
    /// Set the raw (undebounced) reading.
    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::SeqCst);
    }
}

const POSITION_UNSET: u8 = 0;
const POSITION_LOCKED: u8 = 1;
const POSITION_OPEN: u8 = 2;

#[derive(Debug, Default)]
struct ActuatorState {
    position: AtomicU8,
    moves: AtomicU32,
    fail: AtomicBool,
}

/// Mock lock mechanism recording the last commanded position.
#[derive(Debug)]
pub struct MockLockActuator {
    state: Arc<ActuatorState>,
}

impl MockLockActuator {
    pub fn new() -> (Self, MockLockActuatorHandle) {
        let state = Arc::new(ActuatorState::default());
        (
            Self {
                state: state.clone(),
            },
            MockLockActuatorHandle { state },
        )
    }
}

impl LockActuator for MockLockActuator {
    fn set_locked(&mut self, locked: bool) -> Result<()> {
        if self.state.fail.load(Ordering::SeqCst) {
            return Err(HardwareError::actuator("simulated actuator fault"));
        }
        let position = if locked {
            POSITION_LOCKED
        } else {
            POSITION_OPEN
        };
        self.state.position.store(position, Ordering::SeqCst);
        self.state.moves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MockLockActuatorHandle {
    state: Arc<ActuatorState>,
}

impl MockLockActuatorHandle {
    /// Last commanded position, `None` before the first command.
    pub fn is_locked(&self) -> Option<bool> {
        match self.state.position.load(Ordering::SeqCst) {
            POSITION_UNSET => None,
            position => Some(position == POSITION_LOCKED),
        }
    }

    /// Number of successful commands.
    pub fn moves(&self) -> u32 {
        self.state.moves.load(Ordering::SeqCst)
    }

    /// Make every following command fail until reset.
    pub fn set_fail(&self, fail: bool) {
        self.state.fail.store(fail, Ordering::SeqCst);
    }
}

/// Mock status LED.
#[derive(Debug)]
pub struct MockIndicator {
    on: Arc<AtomicBool>,
    toggles: Arc<AtomicU32>,
}

impl MockIndicator {
    pub fn new() -> (Self, MockIndicatorHandle) {
        let on = Arc::new(AtomicBool::new(false));
        let toggles = Arc::new(AtomicU32::new(0));
        (
            Self {
                on: on.clone(),
                toggles: toggles.clone(),
            },
            MockIndicatorHandle { on, toggles },
        )
    }
}

impl Indicator for MockIndicator {
    fn set_on(&mut self, on: bool) -> Result<()> {
        if self.on.swap(on, Ordering::SeqCst) != on {
            self.toggles.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MockIndicatorHandle {
    on: Arc<AtomicBool>,
    toggles: Arc<AtomicU32>,
}

impl MockIndicatorHandle {
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    /// Number of on/off changes so far.
    pub fn toggles(&self) -> u32 {
        self.toggles.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actuator_records_position() {
        let (mut actuator, handle) = MockLockActuator::new();
        assert_eq!(handle.is_locked(), None);

        actuator.set_locked(false).unwrap();
        assert_eq!(handle.is_locked(), Some(false));
        actuator.set_locked(true).unwrap();
        assert_eq!(handle.is_locked(), Some(true));
        assert_eq!(handle.moves(), 2);
    }

    #[test]
    fn test_indicator_counts_changes_only() {
        let (mut led, handle) = MockIndicator::new();
        led.set_on(false).unwrap();
        led.set_on(true).unwrap();
        led.set_on(true).unwrap();
        led.set_on(false).unwrap();
        assert_eq!(handle.toggles(), 2);
        assert!(!handle.is_on());
    }

    #[test]
    fn test_contact_sensor_follows_handle() {
        let (mut sensor, handle) = MockContactSensor::new(false);
        assert!(!sensor.read_open_raw().unwrap());
        handle.set_open(true);
        assert!(sensor.read_open_raw().unwrap());
    }
}
