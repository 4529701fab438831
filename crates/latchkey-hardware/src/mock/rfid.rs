//! Mock proximity-card reader for testing and simulation.
//!
//! The reader and its handle share one state: the handle puts cards in and
//! out of the field and scripts read faults, the reader answers the scan
//! state machine from that state and counts what it was asked to do.

use crate::{
    HardwareError, Result,
    traits::{CardData, CardReader, CardType},
    types::DeviceInfo,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Scripted outcome of a `read_uid` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFault {
    /// Several cards answered.
    Collision,
    /// The exchange failed (CRC, timeout).
    ReadError,
}

#[derive(Debug, Default)]
struct ReaderState {
    card: Option<(Vec<u8>, CardType)>,
    /// Presence polls that report "absent" although a card is in the field.
    dropouts: u32,
    faults: VecDeque<ReadFault>,
    fail_forever: bool,
    init_count: u32,
    reinit_count: u32,
    read_count: u32,
    halt_count: u32,
}

fn lock(state: &Mutex<ReaderState>) -> MutexGuard<'_, ReaderState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock RFID reader for testing and development.
///
/// # Examples
///
/// ```
/// use latchkey_hardware::mock::MockRfid;
/// use latchkey_hardware::traits::CardReader;
///
/// let (mut reader, handle) = MockRfid::new();
/// assert!(!reader.is_card_present().unwrap());
///
/// handle.present_card(vec![0x04, 0xAB, 0xCD, 0xEF]);
/// assert!(reader.is_card_present().unwrap());
/// assert_eq!(reader.read_uid().unwrap().uid_hex(), "04ABCDEF");
/// ```
#[derive(Debug)]
pub struct MockRfid {
    state: Arc<Mutex<ReaderState>>,

    /// Device name
    name: String,
}

impl MockRfid {
    /// Create a new mock RFID reader with the default name.
    pub fn new() -> (Self, MockRfidHandle) {
        Self::with_name("Mock RFID Reader".to_string())
    }

    /// Create a new mock RFID reader with a custom name.
    pub fn with_name(name: String) -> (Self, MockRfidHandle) {
        let state = Arc::new(Mutex::new(ReaderState::default()));
        let reader = Self {
            state: state.clone(),
            name,
        };
        (reader, MockRfidHandle { state })
    }
}

impl CardReader for MockRfid {
    fn init(&mut self) -> Result<()> {
        lock(&self.state).init_count += 1;
        Ok(())
    }

    fn is_card_present(&mut self) -> Result<bool> {
        let mut state = lock(&self.state);
        if state.card.is_none() {
            return Ok(false);
        }
        if state.dropouts > 0 {
            state.dropouts -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    fn read_uid(&mut self) -> Result<CardData> {
        let mut state = lock(&self.state);
        state.read_count += 1;

        let fault = if state.fail_forever {
            Some(ReadFault::ReadError)
        } else {
            state.faults.pop_front()
        };
        match fault {
            Some(ReadFault::Collision) => return Err(HardwareError::Collision),
            Some(ReadFault::ReadError) => {
                return Err(HardwareError::card_read("no answer to select"));
            }
            None => {}
        }

        match &state.card {
            Some((uid, card_type)) => CardData::new(uid.clone(), card_type.clone()),
            None => Err(HardwareError::card_read("no card in field")),
        }
    }

    fn halt(&mut self) -> Result<()> {
        lock(&self.state).halt_count += 1;
        Ok(())
    }

    fn reinit(&mut self) -> Result<()> {
        lock(&self.state).reinit_count += 1;
        Ok(())
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.name.clone(), "Mock MFRC522")
    }
}

/// Handle for controlling a mock RFID reader. Clones share the reader.
#[derive(Debug, Clone)]
pub struct MockRfidHandle {
    state: Arc<Mutex<ReaderState>>,
}

impl MockRfidHandle {
    /// Put a Mifare Classic 1K card with this UID in the field.
    pub fn present_card(&self, uid: Vec<u8>) {
        self.present_card_of_type(uid, CardType::MifareClassic1K);
    }

    /// Put a card of the given type in the field.
    pub fn present_card_of_type(&self, uid: Vec<u8>, card_type: CardType) {
        let mut state = lock(&self.state);
        state.card = Some((uid, card_type));
        state.dropouts = 0;
    }

    /// Take the card out of the field.
    pub fn remove_card(&self) {
        lock(&self.state).card = None;
    }

    /// Make the next `polls` presence checks miss the card.
    pub fn drop_presence(&self, polls: u32) {
        lock(&self.state).dropouts = polls;
    }

    /// Queue faults for the next reads, in order.
    pub fn script_faults(&self, faults: impl IntoIterator<Item = ReadFault>) {
        lock(&self.state).faults.extend(faults);
    }

    /// Make every read fail until reset.
    pub fn fail_all_reads(&self, fail: bool) {
        lock(&self.state).fail_forever = fail;
    }

    pub fn init_count(&self) -> u32 {
        lock(&self.state).init_count
    }

    pub fn reinit_count(&self) -> u32 {
        lock(&self.state).reinit_count
    }

    pub fn read_count(&self) -> u32 {
        lock(&self.state).read_count
    }

    pub fn halt_count(&self) -> u32 {
        lock(&self.state).halt_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_faults_then_success() {
        let (mut reader, handle) = MockRfid::new();
        handle.present_card(vec![1, 2, 3, 4]);
        handle.script_faults([ReadFault::Collision, ReadFault::ReadError]);

        assert!(matches!(reader.read_uid(), Err(HardwareError::Collision)));
        assert!(matches!(
            reader.read_uid(),
            Err(HardwareError::CardReadError { .. })
        ));
        assert_eq!(reader.read_uid().unwrap().uid_hex(), "01020304");
        assert_eq!(handle.read_count(), 3);
    }

    #[test]
    fn test_presence_dropout() {
        let (mut reader, handle) = MockRfid::new();
        handle.present_card(vec![1, 2, 3, 4]);
        handle.drop_presence(2);

        assert!(!reader.is_card_present().unwrap());
        assert!(!reader.is_card_present().unwrap());
        assert!(reader.is_card_present().unwrap());
    }

    #[test]
    fn test_counters() {
        let (mut reader, handle) = MockRfid::new();
        reader.init().unwrap();
        reader.reinit().unwrap();
        reader.halt().unwrap();
        assert_eq!(
            (handle.init_count(), handle.reinit_count(), handle.halt_count()),
            (1, 1, 1)
        );
    }

    #[test]
    fn test_read_without_card_fails() {
        let (mut reader, handle) = MockRfid::new();
        assert!(reader.read_uid().is_err());
        handle.present_card(vec![1, 2, 3, 4]);
        handle.remove_card();
        assert!(!reader.is_card_present().unwrap());
    }
}
