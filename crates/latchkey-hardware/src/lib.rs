//! Hardware abstraction layer for the latchkey door lock.
//!
//! This crate provides trait-based abstractions for the lock's peripherals
//! (keypad, proximity-card reader, door contact, lock actuator, status LED)
//! together with the small modules that drive them and mock implementations
//! for tests and simulation.
//!
//! # Design Philosophy
//!
//! - **Poll-based**: the firmware runs one cooperative control loop that
//!   must never block, so device methods are synchronous and return
//!   immediately with whatever is available.
//! - **Object-safe**: all device traits can be used as `Box<dyn Trait>`,
//!   so a board can mix real drivers and mocks freely.
//! - **Error-aware**: all operations return [`Result<T>`] with a
//!   [`HardwareError`]; [`HardwareError::is_retryable`] marks faults the
//!   card scanner retries.
//!
//! # Modules
//!
//! Devices are composed into [`HardwareModule`]s with an
//! `init`/`poll` lifecycle:
//!
//! - [`DoorContact`] debounces the reed switch and emits door events
//! - [`LockModule`] drives the actuator and blinks the LED while open
//! - [`DoorHardware`] owns both and is what the engine polls
//!
//! ```
//! use latchkey_hardware::mock::{MockContactSensor, MockIndicator, MockLockActuator};
//! use latchkey_hardware::{DoorContact, DoorHardware, HardwareModule, LockModule, ModuleContext};
//!
//! # fn main() -> latchkey_hardware::Result<()> {
//! let (actuator, actuator_handle) = MockLockActuator::new();
//! let (led, _led_handle) = MockIndicator::new();
//! let (sensor, _sensor_handle) = MockContactSensor::new(false);
//!
//! let mut door = DoorHardware::new(
//!     LockModule::new(Box::new(actuator), Box::new(led)),
//!     DoorContact::new(Box::new(sensor), 80),
//! );
//! door.init(&mut ModuleContext::new(0))?;
//!
//! assert_eq!(actuator_handle.is_locked(), Some(true));
//! assert!(!door.is_door_open());
//! # Ok(())
//! # }
//! ```

pub mod contact;
pub mod door;
pub mod error;
pub mod lock;
pub mod mock;
pub mod module;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use contact::{ContactDebouncer, DoorContact};
pub use door::DoorHardware;
pub use error::{HardwareError, Result};
pub use lock::LockModule;
pub use module::{HardwareModule, ModuleContext};
pub use traits::{
    CardData, CardReader, CardType, ContactSensor, Indicator, Keypad, KeypadInput, LockActuator,
    MAX_UID_LENGTH, MIN_UID_LENGTH,
};
pub use types::{DeviceInfo, DoorPosition, HardwareEvent};
