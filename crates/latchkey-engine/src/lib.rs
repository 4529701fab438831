//! Access-control engine for the latchkey door lock.
//!
//! This crate holds the lock's decision logic: the state machines for the
//! lock, keypad PIN entry, card scanning and swipe enrollment, the command
//! inbox fed by asynchronous triggers, and the [`AccessEngine`] that runs
//! them all from one cooperative control loop.
//!
//! # Examples
//!
//! ```
//! use latchkey_core::{LockConfig, LockStatus, ManualClock};
//! use latchkey_engine::{AccessEngine, Command, CommandKind, Peripherals, RecordingSink};
//! use latchkey_hardware::mock::{
//!     MockContactSensor, MockIndicator, MockKeypad, MockLockActuator, MockRfid,
//! };
//! use latchkey_hardware::{DoorContact, DoorHardware, LockModule};
//! use latchkey_storage::{CardRegistry, CredentialStore, MemoryRecord};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let clock = ManualClock::new(1_700_000_000);
//! let sink = RecordingSink::new();
//! let (keypad, keys) = MockKeypad::new();
//! let (reader, _card_handle) = MockRfid::new();
//! let (actuator, _) = MockLockActuator::new();
//! let (led, _) = MockIndicator::new();
//! let (sensor, _) = MockContactSensor::new(false);
//!
//! let mut engine = AccessEngine::new(
//!     LockConfig::default(),
//!     clock.clone(),
//!     sink.clone(),
//!     CredentialStore::new(Box::new(MemoryRecord::new())),
//!     CardRegistry::new(Box::new(MemoryRecord::new())),
//!     Peripherals {
//!         keypad: Box::new(keypad),
//!         reader: Box::new(reader),
//!         door: DoorHardware::new(
//!             LockModule::new(Box::new(actuator), Box::new(led)),
//!             DoorContact::new(Box::new(sensor), 80),
//!         ),
//!     },
//! );
//! engine.init()?;
//!
//! engine.sender().try_send(Command::new(
//!     CommandKind::Credential,
//!     "mqtt",
//!     r#"{"action":"add","type":"permanent","code":"4321"}"#,
//! ))?;
//! engine.tick();
//!
//! keys.type_keys("4321#")?;
//! clock.advance_ms(30);
//! engine.tick();
//! assert_eq!(engine.lock_status(), LockStatus::Unlocked);
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod engine;
pub mod enroll;
pub mod error;
pub mod events;
pub mod lock_state;
pub mod pin_entry;
pub mod queue;
pub mod scan;

pub use commands::{CardCommand, ControlCommand, CredentialCommand};
pub use engine::{AccessEngine, Peripherals};
pub use enroll::{EnrollStep, SwipeEnroll};
pub use error::{EngineError, Result};
pub use events::{CardSummary, ChannelSink, CredentialSummary, EngineEvent, EventSink, RecordingSink};
pub use lock_state::{LockState, LockStateMachine, LockTransition};
pub use pin_entry::{KeyAction, PinEntry};
pub use queue::{Command, CommandKind, CommandQueue, CommandSender, QueueError};
pub use scan::{CardScanner, ScanPhase};
