//! Hardware device trait definitions.
//!
//! This module defines the contract between the lock engine and its
//! peripherals: keypad, proximity-card reader, door contact, lock actuator
//! and indicator LED.
//!
//! The engine runs a single cooperative control loop that must never block,
//! so every method here is synchronous and non-blocking: devices are
//! *polled*, and a read either returns what is available right now or an
//! error. The traits are object-safe and are used as `Box<dyn Trait>`, which
//! lets a board swap a mock for a real driver without touching the engine.

use crate::error::{HardwareError, Result};
use crate::types::DeviceInfo;
use latchkey_core::CardUid;

/// Input from a keypad device.
///
/// Represents all keys found on the lock's 4x4 matrix keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum KeypadInput {
    /// Numeric digit (0-9).
    Digit(u8),

    /// Star key (*).
    Star,

    /// Hash/pound key (#).
    Hash,

    /// Letter key (A-D).
    Letter(char),
}

impl KeypadInput {
    /// Create a digit input.
    ///
    /// # Errors
    ///
    /// Returns an error if the digit is greater than 9.
    ///
    /// # Examples
    ///
    /// ```
    /// use latchkey_hardware::traits::KeypadInput;
    ///
    /// assert_eq!(KeypadInput::digit(5).unwrap(), KeypadInput::Digit(5));
    /// assert!(KeypadInput::digit(10).is_err());
    /// ```
    pub fn digit(d: u8) -> Result<Self> {
        if d > 9 {
            return Err(HardwareError::invalid_data(format!(
                "Digit must be 0-9, got {}",
                d
            )));
        }
        Ok(Self::Digit(d))
    }

    /// Map a key legend to an input.
    ///
    /// Returns `None` for characters that are not on the keypad.
    ///
    /// # Examples
    ///
    /// ```
    /// use latchkey_hardware::traits::KeypadInput;
    ///
    /// assert_eq!(KeypadInput::from_char('7'), Some(KeypadInput::Digit(7)));
    /// assert_eq!(KeypadInput::from_char('#'), Some(KeypadInput::Hash));
    /// assert_eq!(KeypadInput::from_char('b'), Some(KeypadInput::Letter('B')));
    /// assert_eq!(KeypadInput::from_char('x'), None);
    /// ```
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => c.to_digit(10).map(|d| Self::Digit(d as u8)),
            '*' => Some(Self::Star),
            '#' => Some(Self::Hash),
            'A'..='D' | 'a'..='d' => Some(Self::Letter(c.to_ascii_uppercase())),
            _ => None,
        }
    }
}

/// Keypad device abstraction.
///
/// # Examples
///
/// ```
/// use latchkey_hardware::mock::MockKeypad;
/// use latchkey_hardware::traits::{Keypad, KeypadInput};
///
/// let (mut keypad, handle) = MockKeypad::new();
/// handle.press(KeypadInput::Digit(4)).unwrap();
///
/// assert_eq!(keypad.poll_key().unwrap(), Some(KeypadInput::Digit(4)));
/// assert_eq!(keypad.poll_key().unwrap(), None);
/// ```
pub trait Keypad: Send {
    /// Return the next pressed key, if any, without waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad is disconnected.
    fn poll_key(&mut self) -> Result<Option<KeypadInput>>;

    /// Device metadata.
    fn info(&self) -> DeviceInfo;
}

/// Card family, from the SAK byte of the select answer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardType {
    MifareClassic1K,
    MifareUltralight,
    Unknown(u8),
}

/// ISO 14443 UID length bounds, in bytes.
pub const MIN_UID_LENGTH: usize = 4;
pub const MAX_UID_LENGTH: usize = 10;

/// Result of a successful anticollision/select.
#[derive(Debug, Clone)]
pub struct CardData {
    pub uid: Vec<u8>,
    pub card_type: CardType,
    /// When the card was read.
    pub read_at: chrono::DateTime<chrono::Utc>,
}

impl CardData {
    /// Card data stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the UID is not 4 to 10 bytes long.
    ///
    /// # Examples
    ///
    /// ```
    /// use latchkey_hardware::traits::{CardData, CardType};
    ///
    /// let card = CardData::new(vec![0x04, 0xAB, 0xCD, 0xEF], CardType::MifareClassic1K).unwrap();
    /// assert_eq!(card.uid_hex(), "04ABCDEF");
    /// assert!(CardData::new(vec![0x04, 0xAB], CardType::MifareClassic1K).is_err());
    /// ```
    pub fn new(uid: Vec<u8>, card_type: CardType) -> Result<Self> {
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&uid.len()) {
            return Err(HardwareError::invalid_data(format!(
                "Card UID length must be between {} and {} bytes, got {}",
                MIN_UID_LENGTH,
                MAX_UID_LENGTH,
                uid.len()
            )));
        }
        Ok(Self {
            uid,
            card_type,
            read_at: chrono::Utc::now(),
        })
    }

    pub fn uid_hex(&self) -> String {
        self.uid.iter().map(|b| format!("{:02X}", b)).collect()
    }

    /// The normalized identifier the registry stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the UID cannot form a valid identifier.
    pub fn card_uid(&self) -> latchkey_core::Result<CardUid> {
        CardUid::from_bytes(&self.uid)
    }
}

/// Proximity-card reader abstraction.
///
/// Modeled on MFRC522-class readers: presence detection (REQA/WUPA) is
/// separate from the anticollision/select sequence that yields the UID.
/// The scan state machine calls these in short bursts from the control
/// loop, so none of them may wait for a card.
pub trait CardReader: Send {
    /// Bring the reader up. Called once at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader does not answer.
    fn init(&mut self) -> Result<()>;

    /// Check whether a card is in the field right now.
    ///
    /// # Errors
    ///
    /// Returns an error on a bus fault.
    fn is_card_present(&mut self) -> Result<bool>;

    /// Run anticollision and select, returning the card's UID.
    ///
    /// # Errors
    ///
    /// - [`HardwareError::Collision`] when several cards answered
    /// - [`HardwareError::CardReadError`] when the exchange failed
    fn read_uid(&mut self) -> Result<CardData>;

    /// Put the selected card to sleep so it stops answering.
    ///
    /// # Errors
    ///
    /// Returns an error on a bus fault.
    fn halt(&mut self) -> Result<()>;

    /// Reset and reconfigure the reader after repeated failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader does not come back.
    fn reinit(&mut self) -> Result<()>;

    /// Device metadata.
    fn info(&self) -> DeviceInfo;
}

/// Raw door-contact input (reed switch or similar).
pub trait ContactSensor: Send {
    /// Undebounced reading: `true` when the door is open.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be sampled.
    fn read_open_raw(&mut self) -> Result<bool>;
}

/// Lock mechanism (solenoid, motor, servo).
pub trait LockActuator: Send {
    /// Drive the mechanism to the locked (`true`) or open position.
    ///
    /// # Errors
    ///
    /// Returns an error if the mechanism cannot be driven.
    fn set_locked(&mut self, locked: bool) -> Result<()>;
}

/// Single status LED.
pub trait Indicator: Send {
    /// Switch the LED.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be driven.
    fn set_on(&mut self, on: bool) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case('0', Some(KeypadInput::Digit(0)))]
    #[case('9', Some(KeypadInput::Digit(9)))]
    #[case('*', Some(KeypadInput::Star))]
    #[case('#', Some(KeypadInput::Hash))]
    #[case('A', Some(KeypadInput::Letter('A')))]
    #[case('d', Some(KeypadInput::Letter('D')))]
    #[case('E', None)]
    #[case(' ', None)]
    fn test_keypad_from_char(#[case] c: char, #[case] expected: Option<KeypadInput>) {
        assert_eq!(KeypadInput::from_char(c), expected);
    }

    #[test]
    fn test_card_data_uid_length() {
        assert!(CardData::new(vec![0x01, 0x02], CardType::MifareClassic1K).is_err());
        assert!(CardData::new(vec![0x01; 11], CardType::MifareClassic1K).is_err());
        assert!(CardData::new(vec![0x01; 4], CardType::MifareClassic1K).is_ok());
        assert!(CardData::new(vec![0x01; 10], CardType::MifareUltralight).is_ok());
    }

    #[test]
    fn test_card_data_normalized_uid() {
        let card = CardData::new(vec![0x04, 0xAB, 0x0C, 0xEF], CardType::MifareClassic1K).unwrap();
        assert_eq!(card.uid_hex(), "04AB0CEF");
        assert_eq!(card.card_uid().unwrap().as_str(), "04AB0CEF");
    }
}
