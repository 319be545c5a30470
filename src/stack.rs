use crate::memory::{CHIP8_FONT, CHIP8_FONT_ADDR, CHIP8_PROGRAM_ADDR};

/// Return addresses live in their own fixed array rather than in RAM. The
/// capacity is what would fit between the top of the font and the program
/// base if the stack were two bytes per entry growing down from 0x200.
pub const CALL_STACK_DEPTH: usize =
    (CHIP8_PROGRAM_ADDR as usize - CHIP8_FONT_ADDR as usize - CHIP8_FONT.len()) / 2;

pub struct CallStack {
    entries: [u16; CALL_STACK_DEPTH],
    depth: usize,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack {
            entries: [0; CALL_STACK_DEPTH],
            depth: 0,
        }
    }

    /// push a return address; `None` when full
    pub fn push(&mut self, addr: u16) -> Option<()> {
        let slot = self.entries.get_mut(self.depth)?;
        *slot = addr;
        self.depth += 1;
        Some(())
    }

    /// pop the most recent return address; `None` when empty
    pub fn pop(&mut self) -> Option<u16> {
        self.depth = self.depth.checked_sub(1)?;
        Some(self.entries[self.depth])
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// where the stack pointer would sit on the real machine: it starts at the
    /// program base and drops two bytes per call
    pub fn pointer(&self) -> u16 {
        CHIP8_PROGRAM_ADDR - 2 * self.depth as u16
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity() {
        assert_eq!(CALL_STACK_DEPTH, 176);
    }

    #[test]
    fn test_push_pop_lifo() {
        let mut s = CallStack::new();
        assert_eq!(s.pointer(), 0x200);
        s.push(0x202).unwrap();
        s.push(0x340).unwrap();
        assert_eq!(s.depth(), 2);
        assert_eq!(s.pointer(), 0x1fc);
        assert_eq!(s.pop(), Some(0x340));
        assert_eq!(s.pop(), Some(0x202));
        assert_eq!(s.pointer(), 0x200);
    }

    #[test]
    fn test_underflow_detected() {
        let mut s = CallStack::new();
        assert_eq!(s.pop(), None);
        assert_eq!(s.depth(), 0);
    }

    #[test]
    fn test_overflow_detected() {
        let mut s = CallStack::new();
        for i in 0..CALL_STACK_DEPTH {
            assert!(s.push(i as u16).is_some());
        }
        assert!(s.push(0xfff).is_none());
        assert_eq!(s.depth(), CALL_STACK_DEPTH);
        assert_eq!(s.pointer(), 0xa0);
    }
}
