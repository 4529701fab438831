//! Mock keypad implementation for testing and simulation.
//!
//! This module provides a simulated keypad that is fed programmatically
//! through a handle, for tests and for the desktop simulator.

use crate::{
    HardwareError, Result,
    traits::{Keypad, KeypadInput},
    types::DeviceInfo,
};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Keys buffered by the mock before presses start failing.
const KEY_BUFFER: usize = 64;

/// Mock keypad device for testing and development.
///
/// Key presses are queued through a [`MockKeypadHandle`] and returned one
/// at a time by [`Keypad::poll_key`].
///
/// # Examples
///
/// ```
/// use latchkey_hardware::mock::MockKeypad;
/// use latchkey_hardware::traits::{Keypad, KeypadInput};
///
/// let (mut keypad, handle) = MockKeypad::new();
/// handle.type_keys("12#").unwrap();
///
/// assert_eq!(keypad.poll_key().unwrap(), Some(KeypadInput::Digit(1)));
/// assert_eq!(keypad.poll_key().unwrap(), Some(KeypadInput::Digit(2)));
/// assert_eq!(keypad.poll_key().unwrap(), Some(KeypadInput::Hash));
/// assert_eq!(keypad.poll_key().unwrap(), None);
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    /// Channel receiver for simulated input
    input_rx: mpsc::Receiver<KeypadInput>,

    /// Device name
    name: String,
}

impl MockKeypad {
    /// Create a new mock keypad with the default name.
    pub fn new() -> (Self, MockKeypadHandle) {
        Self::with_name("Mock Keypad".to_string())
    }

    /// Create a new mock keypad with a custom name.
    pub fn with_name(name: String) -> (Self, MockKeypadHandle) {
        let (input_tx, input_rx) = mpsc::channel(KEY_BUFFER);

        let keypad = Self {
            input_rx,
            name: name.clone(),
        };

        let handle = MockKeypadHandle { input_tx, name };

        (keypad, handle)
    }
}

impl Keypad for MockKeypad {
    fn poll_key(&mut self) -> Result<Option<KeypadInput>> {
        match self.input_rx.try_recv() {
            Ok(input) => Ok(Some(input)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(HardwareError::disconnected("Keypad input channel closed"))
            }
        }
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.name.clone(), "Mock 4x4 matrix")
    }
}

/// Handle for controlling a mock keypad.
///
/// This handle can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    /// Channel sender for simulated input
    input_tx: mpsc::Sender<KeypadInput>,

    /// Device name
    name: String,
}

impl MockKeypadHandle {
    /// Queue a key press, waiting for buffer space.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped and the channel is closed.
    pub async fn send_input(&self, input: KeypadInput) -> Result<()> {
        self.input_tx
            .send(input)
            .await
            .map_err(|_| HardwareError::disconnected("Keypad input channel closed"))
    }

    /// Queue a key press without waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is full or the keypad was dropped.
    pub fn press(&self, input: KeypadInput) -> Result<()> {
        self.input_tx
            .try_send(input)
            .map_err(|e| HardwareError::other(format!("{}: key press dropped: {}", self.name, e)))
    }

    /// Queue one press per character of `keys` (`0-9`, `*`, `#`, `A-D`).
    ///
    /// # Errors
    ///
    /// Returns an error on a character that is not on the keypad, or if a
    /// press could not be queued.
    pub fn type_keys(&self, keys: &str) -> Result<()> {
        for c in keys.chars() {
            let input = KeypadInput::from_char(c)
                .ok_or_else(|| HardwareError::invalid_data(format!("No key for '{}'", c)))?;
            self.press(input)?;
        }
        Ok(())
    }

    /// Send a sequence of digit inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if any digit is greater than 9 or the keypad has
    /// been dropped.
    pub async fn send_digits(&self, digits: &[u8]) -> Result<()> {
        for &digit in digits {
            let input = KeypadInput::digit(digit)?;
            self.send_input(input).await?;
        }
        Ok(())
    }

    /// Send a complete PIN code followed by `#`.
    ///
    /// # Errors
    ///
    /// Returns an error if any digit is greater than 9 or the keypad has
    /// been dropped.
    pub async fn send_pin(&self, digits: &[u8]) -> Result<()> {
        self.send_digits(digits).await?;
        self.send_input(KeypadInput::Hash).await
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
