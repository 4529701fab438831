//! Keypad PIN entry with failed-attempt lockout.

use latchkey_core::clock::remaining_ms;
use latchkey_hardware::KeypadInput;

/// What a key press did to the entry buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Digit added to the buffer.
    Appended,
    /// Digit dropped, the buffer is full.
    BufferFull,
    /// `*` emptied the buffer.
    Cleared,
    /// `#` handed over the buffer; it is now empty.
    Submit(String),
    /// Letter key, not part of a PIN.
    Ignored,
    /// Keypad locked out, key discarded.
    LockedOut,
}

/// PIN buffer, failed-attempt counter and lockout window.
///
/// Times are monotonic milliseconds.
#[derive(Clone)]
pub struct PinEntry {
    buffer: String,
    max_len: usize,
    failed_count: u32,
    lockout_until: Option<u64>,
}

impl PinEntry {
    pub fn new(max_len: usize) -> Self {
        Self {
            buffer: String::with_capacity(max_len),
            max_len,
            failed_count: 0,
            lockout_until: None,
        }
    }

    /// Feed one key press.
    ///
    /// While locked out every key is discarded.
    pub fn handle_key(&mut self, key: KeypadInput, now: u64) -> KeyAction {
        if self.is_locked_out(now) {
            return KeyAction::LockedOut;
        }
        match key {
            KeypadInput::Digit(d) => {
                if self.append_digit(char::from(b'0' + d)) {
                    KeyAction::Appended
                } else {
                    KeyAction::BufferFull
                }
            }
            KeypadInput::Star => {
                self.clear();
                KeyAction::Cleared
            }
            KeypadInput::Hash => KeyAction::Submit(std::mem::take(&mut self.buffer)),
            KeypadInput::Letter(_) => KeyAction::Ignored,
            _ => KeyAction::Ignored,
        }
    }

    /// Append a digit. Returns `false` and does nothing at maximum length.
    pub fn append_digit(&mut self, digit: char) -> bool {
        if self.buffer.len() >= self.max_len {
            return false;
        }
        self.buffer.push(digit);
        true
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn failed_count(&self) -> u32 {
        self.failed_count
    }

    /// Count a failed submit.
    ///
    /// Reaching `max_attempts` arms a lockout of `lockout_ms` and resets the
    /// counter.
    ///
    /// # Returns
    ///
    /// Returns `true` if this attempt started a lockout.
    pub fn record_failed_attempt(&mut self, max_attempts: u32, lockout_ms: u64, now: u64) -> bool {
        self.buffer.clear();
        self.failed_count += 1;
        if self.failed_count >= max_attempts {
            self.lockout_until = Some(now.saturating_add(lockout_ms));
            self.failed_count = 0;
            return true;
        }
        false
    }

    /// Reset counter, lockout and buffer after an accepted PIN.
    pub fn record_success(&mut self) {
        self.buffer.clear();
        self.failed_count = 0;
        self.lockout_until = None;
    }

    pub fn is_locked_out(&self, now: u64) -> bool {
        self.lockout_until.is_some_and(|until| now < until)
    }

    /// Whole seconds of lockout left, rounded up.
    pub fn remaining_lockout_secs(&self, now: u64) -> u64 {
        self.lockout_until
            .map_or(0, |until| remaining_ms(now, until).div_ceil(1000))
    }
}

impl std::fmt::Debug for PinEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinEntry")
            .field("buffered", &self.buffer.len())
            .field("max_len", &self.max_len)
            .field("failed_count", &self.failed_count)
            .field("lockout_until", &self.lockout_until)
            .finish()
    }
}
