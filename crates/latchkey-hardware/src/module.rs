//! Cooperative hardware modules.
//!
//! A module wraps one or more devices with the little state machine that
//! drives them (debouncing, LED blinking). The control loop calls
//! [`HardwareModule::init`] once and then [`HardwareModule::poll`] on every
//! iteration; neither may block. Modules report what they observed by
//! pushing [`HardwareEvent`]s into the [`ModuleContext`] instead of calling
//! back into the engine.

use crate::error::Result;
use crate::types::HardwareEvent;

/// Per-call context handed to modules.
#[derive(Debug, Default)]
pub struct ModuleContext {
    /// Monotonic time of this loop iteration.
    pub now_ms: u64,
    events: Vec<HardwareEvent>,
}

impl ModuleContext {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms,
            events: Vec::new(),
        }
    }

    /// Record an event for the caller.
    pub fn emit(&mut self, event: HardwareEvent) {
        self.events.push(event);
    }

    /// Events emitted so far, in order.
    pub fn events(&self) -> &[HardwareEvent] {
        &self.events
    }

    /// Take the emitted events, leaving the context empty.
    pub fn take_events(&mut self) -> Vec<HardwareEvent> {
        std::mem::take(&mut self.events)
    }
}

/// A pollable piece of lock hardware.
pub trait HardwareModule: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Bring the module to its initial state.
    ///
    /// # Errors
    ///
    /// Returns an error if a device could not be initialized.
    fn init(&mut self, ctx: &mut ModuleContext) -> Result<()>;

    /// Advance the module by one loop iteration.
    ///
    /// # Errors
    ///
    /// Returns an error if a device failed during this iteration. The
    /// module stays usable and is polled again on the next iteration.
    fn poll(&mut self, ctx: &mut ModuleContext) -> Result<()>;
}
