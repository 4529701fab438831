//! Door hardware composite: lock module plus door contact.

use crate::contact::DoorContact;
use crate::error::Result;
use crate::lock::LockModule;
use crate::module::{HardwareModule, ModuleContext};
use crate::types::DoorPosition;
use tracing::warn;

/// Everything mounted on the door, polled as one module.
///
/// The contact is polled before the lock so the engine sees a door event in
/// the same iteration it happened.
#[derive(Debug)]
pub struct DoorHardware {
    lock: LockModule,
    contact: DoorContact,
}

impl DoorHardware {
    pub fn new(lock: LockModule, contact: DoorContact) -> Self {
        Self { lock, contact }
    }

    /// Debounced door position.
    #[must_use]
    pub fn door_position(&self) -> DoorPosition {
        self.contact.position()
    }

    #[must_use]
    pub fn is_door_open(&self) -> bool {
        self.contact.is_open()
    }

    /// Drive the mechanism open.
    ///
    /// # Errors
    ///
    /// Returns an error if the actuator could not be driven.
    pub fn release(&mut self, now_ms: u64) -> Result<()> {
        self.lock.release(now_ms)
    }

    /// Drive the mechanism locked.
    ///
    /// # Errors
    ///
    /// Returns an error if the actuator could not be driven.
    pub fn engage(&mut self) -> Result<()> {
        self.lock.engage()
    }

    pub fn lock_module(&self) -> &LockModule {
        &self.lock
    }
}

impl HardwareModule for DoorHardware {
    fn name(&self) -> &'static str {
        "door"
    }

    fn init(&mut self, ctx: &mut ModuleContext) -> Result<()> {
        self.lock.init(ctx)?;
        self.contact.init(ctx)
    }

    fn poll(&mut self, ctx: &mut ModuleContext) -> Result<()> {
        // A contact fault must not stop the LED from blinking.
        let contact = self.contact.poll(ctx);
        if let Err(e) = self.lock.poll(ctx) {
            warn!("Lock module poll failed: {}", e);
        }
        contact
    }
}
