//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be controlled
//! programmatically without requiring physical hardware. Each mock comes
//! with a handle that the test (or the simulator) keeps to drive it.

pub mod door;
pub mod keypad;
pub mod rfid;

// Re-export commonly used types
pub use door::{
    MockContactSensor, MockContactSensorHandle, MockIndicator, MockIndicatorHandle,
    MockLockActuator, MockLockActuatorHandle,
};
pub use keypad::{MockKeypad, MockKeypadHandle};
pub use rfid::{MockRfid, MockRfidHandle, ReadFault};
