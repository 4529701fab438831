//! Lock mechanism and status LED.
//!
//! The module only *drives* the hardware; the decision to lock or unlock is
//! made by the engine. While released, the LED blinks with a one-second
//! period; while engaged it stays dark.

use crate::error::Result;
use crate::module::{HardwareModule, ModuleContext};
use crate::traits::{Indicator, LockActuator};
use latchkey_core::constants::INDICATOR_BLINK_PERIOD_MS;
use tracing::{info, warn};

pub struct LockModule {
    actuator: Box<dyn LockActuator>,
    indicator: Box<dyn Indicator>,
    engaged: bool,
    led_on: bool,
    last_toggle_ms: u64,
}

impl LockModule {
    pub fn new(actuator: Box<dyn LockActuator>, indicator: Box<dyn Indicator>) -> Self {
        Self {
            actuator,
            indicator,
            engaged: true,
            led_on: false,
            last_toggle_ms: 0,
        }
    }

    /// Drive the mechanism to locked and switch the LED off.
    ///
    /// # Errors
    ///
    /// Returns an error if the actuator could not be driven. The LED is
    /// switched off regardless.
    pub fn engage(&mut self) -> Result<()> {
        self.engaged = true;
        self.set_led(false);
        info!("Lock engaged");
        self.actuator.set_locked(true)
    }

    /// Drive the mechanism open and start blinking the LED.
    ///
    /// # Errors
    ///
    /// Returns an error if the actuator could not be driven.
    pub fn release(&mut self, now_ms: u64) -> Result<()> {
        self.engaged = false;
        self.set_led(false);
        self.last_toggle_ms = now_ms;
        info!("Lock released");
        self.actuator.set_locked(false)
    }

    #[must_use]
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    #[must_use]
    pub fn led_on(&self) -> bool {
        self.led_on
    }

    fn set_led(&mut self, on: bool) {
        self.led_on = on;
        if let Err(e) = self.indicator.set_on(on) {
            warn!("Indicator write failed: {}", e);
        }
    }
}

impl HardwareModule for LockModule {
    fn name(&self) -> &'static str {
        "lock"
    }

    fn init(&mut self, _ctx: &mut ModuleContext) -> Result<()> {
        self.engage()
    }

    fn poll(&mut self, ctx: &mut ModuleContext) -> Result<()> {
        if self.engaged {
            return Ok(());
        }
        if ctx.now_ms.saturating_sub(self.last_toggle_ms) >= INDICATOR_BLINK_PERIOD_MS {
            self.last_toggle_ms = ctx.now_ms;
            let on = !self.led_on;
            self.set_led(on);
        }
        Ok(())
    }
}

impl std::fmt::Debug for LockModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockModule")
            .field("engaged", &self.engaged)
            .field("led_on", &self.led_on)
            .finish()
    }
}
