use crate::debug::DebugOption;
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use log::{trace, warn};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::{Duration, Instant};

/// Something that happened on the input device, already mapped to the
/// machine's 16 logical keys
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(u8),
    KeyUp(u8),
    Debug(DebugOption),
    Quit,
}

/// Feeds key transitions to the environment
pub trait Input {
    /// everything that happened since the last poll; never blocks
    fn poll(&mut self) -> io::Result<Vec<InputEvent>>;
}

/// the 4x4 hex keypad laid over the left-hand side of a qwerty keyboard
///   1 2 3 C      1 2 3 4
///   4 5 6 D  =>  q w e r
///   7 8 9 E      a s d f
///   A 0 B F      z x c v
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

const DEBUG_KEYMAP: [(char, DebugOption); 3] = [
    ('j', DebugOption::Enabled),
    ('k', DebugOption::StepByStep),
    ('l', DebugOption::NextStep),
];

/// what a physical key means to us
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mapped {
    Key(u8),
    Debug(DebugOption),
    Quit,
}

struct Keymap {
    keys: HashMap<char, u8>,
    debug: HashMap<char, DebugOption>,
}

impl Keymap {
    fn conventional() -> Self {
        Keymap {
            keys: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            debug: HashMap::from(DEBUG_KEYMAP),
        }
    }

    fn map(&self, evt: KeyEvent) -> Option<Mapped> {
        match evt.code {
            KeyCode::Esc => Some(Mapped::Quit),
            KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Mapped::Quit)
            }
            KeyCode::Char(c) => {
                let c = c.to_ascii_lowercase();
                self.keys
                    .get(&c)
                    .map(|k| Mapped::Key(*k))
                    .or_else(|| self.debug.get(&c).map(|d| Mapped::Debug(*d)))
            }
            _ => None,
        }
    }
}

/// Terminals only report presses (and auto-repeats), never releases, so a
/// key counts as held until it hasn't been seen for `hold`.
struct HeldKeys {
    hold: Duration,
    last_seen: HashMap<u8, Instant>,
}

impl HeldKeys {
    fn new(hold: Duration) -> Self {
        HeldKeys {
            hold,
            last_seen: HashMap::new(),
        }
    }

    /// a press or repeat of `key`; only the first one is a transition
    fn seen(&mut self, key: u8, now: Instant) -> Option<InputEvent> {
        match self.last_seen.insert(key, now) {
            None => Some(InputEvent::KeyDown(key)),
            Some(_) => None,
        }
    }

    /// releases for every key that has gone quiet
    fn expire(&mut self, now: Instant) -> Vec<InputEvent> {
        let hold = self.hold;
        let mut released: Vec<u8> = self
            .last_seen
            .iter()
            .filter(|(_, t)| now.saturating_duration_since(**t) > hold)
            .map(|(k, _)| *k)
            .collect();
        released.sort_unstable();
        for k in &released {
            self.last_seen.remove(k);
        }
        released.into_iter().map(InputEvent::KeyUp).collect()
    }
}

/// long enough to bridge the gap before a terminal starts auto-repeating
const STDIN_HOLD: Duration = Duration::from_millis(500);

/// simple implementation of Input, reading the terminal through crossterm
pub struct StdinInput {
    keymap: Keymap,
    held: HeldKeys,
}

impl StdinInput {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            keymap: Keymap::conventional(),
            held: HeldKeys::new(STDIN_HOLD),
        })
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        // nothing useful to do if the terminal is already gone
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for StdinInput {
    fn poll(&mut self) -> io::Result<Vec<InputEvent>> {
        let mut events = Vec::new();
        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(evt) => match self.keymap.map(evt) {
                    Some(Mapped::Key(k)) => events.extend(self.held.seen(k, Instant::now())),
                    Some(Mapped::Debug(d)) => events.push(InputEvent::Debug(d)),
                    Some(Mapped::Quit) => events.push(InputEvent::Quit),
                    None => warn!("can't map {:?} to a CHIP-8 key", evt.code),
                },
                other => trace!("ignoring terminal event {:?}", other),
            }
        }
        events.extend(self.held.expire(Instant::now()));
        Ok(events)
    }
}

/// dummy Input implementation for testing: hands out one scripted batch per
/// poll, then asks to quit once the script runs out
pub struct DummyInput {
    batches: VecDeque<Vec<InputEvent>>,
}

impl DummyInput {
    pub fn new(batches: Vec<Vec<InputEvent>>) -> Self {
        DummyInput {
            batches: batches.into(),
        }
    }
}

impl Input for DummyInput {
    fn poll(&mut self) -> io::Result<Vec<InputEvent>> {
        Ok(self
            .batches
            .pop_front()
            .unwrap_or_else(|| vec![InputEvent::Quit]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn test_conventional_layout() {
        let m = Keymap::conventional();
        assert_eq!(m.map(key('1')), Some(Mapped::Key(0x1)));
        assert_eq!(m.map(key('4')), Some(Mapped::Key(0xc)));
        assert_eq!(m.map(key('x')), Some(Mapped::Key(0x0)));
        assert_eq!(m.map(key('V')), Some(Mapped::Key(0xf)));
        assert_eq!(m.map(key('p')), None);
    }

    #[test]
    fn test_debug_and_quit_keys() {
        let m = Keymap::conventional();
        assert_eq!(m.map(key('k')), Some(Mapped::Debug(DebugOption::StepByStep)));
        assert_eq!(m.map(key('l')), Some(Mapped::Debug(DebugOption::NextStep)));
        assert_eq!(
            m.map(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)),
            Some(Mapped::Quit)
        );
        assert_eq!(
            m.map(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Mapped::Quit)
        );
        // plain c is key B
        assert_eq!(m.map(key('c')), Some(Mapped::Key(0xb)));
    }

    #[test]
    fn test_held_keys_release_after_quiet() {
        let t0 = Instant::now();
        let mut h = HeldKeys::new(Duration::from_millis(100));
        assert_eq!(h.seen(5, t0), Some(InputEvent::KeyDown(5)));
        // auto-repeat keeps it down without a new transition
        assert_eq!(h.seen(5, t0 + Duration::from_millis(80)), None);
        assert!(h.expire(t0 + Duration::from_millis(150)).is_empty());
        assert_eq!(
            h.expire(t0 + Duration::from_millis(181)),
            vec![InputEvent::KeyUp(5)]
        );
        assert_eq!(
            h.seen(5, t0 + Duration::from_millis(200)),
            Some(InputEvent::KeyDown(5))
        );
    }

    #[test]
    fn test_dummy_input_script() -> io::Result<()> {
        let mut i = DummyInput::new(vec![vec![InputEvent::KeyDown(3)], vec![]]);
        assert_eq!(i.poll()?, vec![InputEvent::KeyDown(3)]);
        assert_eq!(i.poll()?, vec![]);
        assert_eq!(i.poll()?, vec![InputEvent::Quit]);
        Ok(())
    }
}
