//! Door-contact debouncing.
//!
//! A reed switch chatters for tens of milliseconds when the door moves.
//! [`ContactDebouncer`] turns the raw samples into a stable open/closed
//! state: the stable state only follows the raw one after the raw reading
//! has held the same value for the whole debounce interval, and each flip
//! is reported exactly once.

use crate::error::Result;
use crate::module::{HardwareModule, ModuleContext};
use crate::traits::ContactSensor;
use crate::types::{DoorPosition, HardwareEvent};
use tracing::{debug, warn};

/// Raw-to-stable filter for a binary input.
///
/// # Examples
///
/// ```
/// use latchkey_hardware::contact::ContactDebouncer;
///
/// let mut debouncer = ContactDebouncer::new(80);
/// debouncer.reset(false, 0);
///
/// assert_eq!(debouncer.update(true, 10), None);  // raw change, timer starts
/// assert_eq!(debouncer.update(true, 50), None);  // not held long enough
/// assert_eq!(debouncer.update(true, 90), Some(true));
/// assert_eq!(debouncer.update(true, 500), None); // already reported
/// ```
#[derive(Debug, Clone)]
pub struct ContactDebouncer {
    debounce_ms: u64,
    stable_open: bool,
    raw_open: bool,
    last_change_ms: u64,
}

impl ContactDebouncer {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            stable_open: false,
            raw_open: false,
            last_change_ms: 0,
        }
    }

    /// Accept `raw_open` as the stable state without a transition.
    pub fn reset(&mut self, raw_open: bool, now_ms: u64) {
        self.stable_open = raw_open;
        self.raw_open = raw_open;
        self.last_change_ms = now_ms;
    }

    /// Feed one sample. Returns the new stable state when it flips.
    pub fn update(&mut self, raw_open: bool, now_ms: u64) -> Option<bool> {
        if raw_open != self.raw_open {
            self.raw_open = raw_open;
            self.last_change_ms = now_ms;
            return None;
        }

        if raw_open == self.stable_open {
            return None;
        }

        if now_ms.saturating_sub(self.last_change_ms) < self.debounce_ms {
            return None;
        }

        self.stable_open = raw_open;
        Some(raw_open)
    }

    /// Debounced state.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.stable_open
    }
}

/// Door-contact module: a sensor plus its debouncer.
///
/// Emits [`HardwareEvent::Door`] on every debounced transition.
pub struct DoorContact {
    sensor: Box<dyn ContactSensor>,
    debouncer: ContactDebouncer,
    inverted: bool,
}

impl DoorContact {
    pub fn new(sensor: Box<dyn ContactSensor>, debounce_ms: u64) -> Self {
        Self {
            sensor,
            debouncer: ContactDebouncer::new(debounce_ms),
            inverted: false,
        }
    }

    /// Treat the raw reading as "closed" instead of "open", for switches
    /// wired the other way round.
    #[must_use]
    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// Debounced door position.
    #[must_use]
    pub fn position(&self) -> DoorPosition {
        DoorPosition::from_open(self.debouncer.is_open())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.debouncer.is_open()
    }

    fn read_open(&mut self) -> Result<bool> {
        Ok(self.sensor.read_open_raw()? != self.inverted)
    }
}

impl HardwareModule for DoorContact {
    fn name(&self) -> &'static str {
        "door_contact"
    }

    fn init(&mut self, ctx: &mut ModuleContext) -> Result<()> {
        let open = self.read_open()?;
        self.debouncer.reset(open, ctx.now_ms);
        debug!("Door contact initial state: {}", if open { "open" } else { "closed" });
        Ok(())
    }

    fn poll(&mut self, ctx: &mut ModuleContext) -> Result<()> {
        let open = match self.read_open() {
            Ok(open) => open,
            Err(e) => {
                warn!("Door contact read failed: {}", e);
                return Err(e);
            }
        };

        if let Some(stable) = self.debouncer.update(open, ctx.now_ms) {
            let position = DoorPosition::from_open(stable);
            debug!("Door {:?} at {}ms", position, ctx.now_ms);
            ctx.emit(HardwareEvent::Door(position));
        }
        Ok(())
    }
}

impl std::fmt::Debug for DoorContact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoorContact")
            .field("debouncer", &self.debouncer)
            .field("inverted", &self.inverted)
            .finish()
    }
}
