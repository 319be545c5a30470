//! The 16 key hex keypad and the state machine behind `Fx0A`.
//!
//! Key state changes only through `press`/`release`, fed from outside at its
//! own cadence. `Fx0A` never blocks: the interpreter parks itself in
//! `KeyWait::Waiting` and re-runs the instruction every cycle until a key is
//! down.

pub const KEY_COUNT: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyWait {
    Idle,
    Waiting,
}

#[derive(Clone, Debug)]
pub struct Keypad {
    held: [bool; KEY_COUNT],
    wait: KeyWait,
    captured: bool,
}

impl Keypad {
    pub fn new() -> Self {
        Keypad {
            held: [false; KEY_COUNT],
            wait: KeyWait::Idle,
            captured: false,
        }
    }

    /// key went down; keys outside 0x0-0xF are ignored
    pub fn press(&mut self, key: u8) {
        if let Some(k) = self.held.get_mut(key as usize) {
            *k = true;
        }
    }

    /// key came up; keys outside 0x0-0xF are ignored
    pub fn release(&mut self, key: u8) {
        if let Some(k) = self.held.get_mut(key as usize) {
            *k = false;
        }
    }

    /// only the low nibble of `key` is significant, as with a register value
    pub fn is_held(&self, key: u8) -> bool {
        self.held[(key & 0xf) as usize]
    }

    /// lowest numbered key currently down
    pub fn first_held(&self) -> Option<u8> {
        self.held.iter().position(|k| *k).map(|k| k as u8)
    }

    pub fn held(&self) -> &[bool; KEY_COUNT] {
        &self.held
    }

    pub fn wait_state(&self) -> KeyWait {
        self.wait
    }

    pub fn is_waiting(&self) -> bool {
        self.wait == KeyWait::Waiting
    }

    /// did the last `Fx0A` complete with a key
    pub fn key_captured(&self) -> bool {
        self.captured
    }

    /// one pass of `Fx0A`. `Idle` moves to `Waiting` without looking at the
    /// keys; while `Waiting` a held key ends the wait and is returned.
    pub fn poll_wait(&mut self) -> Option<u8> {
        match self.wait {
            KeyWait::Idle => {
                self.wait = KeyWait::Waiting;
                self.captured = false;
                None
            }
            KeyWait::Waiting => {
                let key = self.first_held()?;
                self.wait = KeyWait::Idle;
                self.captured = true;
                Some(key)
            }
        }
    }
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}
