use crate::error::{Chip8Error, Result};
use log::{debug, warn};
use std::io;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting.
//     every address is taken modulo RAM size, so nothing here can index out of bounds

/// Represents the machine's byte-addressable memory
pub trait MemoryMap {
    /// read one byte; the address wraps at the top of memory
    fn read_byte(&self, addr: u16) -> u8;

    /// write one byte; the address wraps at the top of memory
    fn write_byte(&mut self, addr: u16, value: u8);

    /// get a big-endian two-byte word (an instruction)
    fn get_word(&self, addr: u16) -> u16 {
        u16::from_be_bytes([self.read_byte(addr), self.read_byte(addr.wrapping_add(1))])
    }

    /// copy `len` bytes starting at `addr` into a fresh buffer
    fn read_bytes(&self, addr: u16, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| self.read_byte(addr.wrapping_add(i as u16)))
            .collect()
    }

    /// write a chunk of bytes, byte by byte
    fn write(&mut self, data: &[u8], addr: u16) {
        for (i, b) in data.iter().enumerate() {
            self.write_byte(addr.wrapping_add(i as u16), *b);
        }
    }
}

/// Defines the CHIP-8 standard 4K memory map
///   0x0000-0x004f  unused (interpreter on the original hardware)
///   0x0050-0x009f  built-in hex font, read-only to programs
///   0x00a0-0x01ff  unused
///   0x0200-0x0fff  program
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// biggest program that fits
pub const CHIP8_MAX_PROGRAM_BYTES: usize = CHIP8_RAM_SIZE_BYTES - CHIP8_PROGRAM_ADDR as usize;

pub const CHIP8_FONT_ADDR: u16 = 0x050;
pub const CHIP8_GLYPH_BYTES: u16 = 5;
pub const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

fn wrap(addr: u16) -> usize {
    addr as usize % CHIP8_RAM_SIZE_BYTES
}

fn is_font(addr: usize) -> bool {
    let start = CHIP8_FONT_ADDR as usize;
    (start..start + CHIP8_FONT.len()).contains(&addr)
}

impl MemoryMap for Chip8MemoryMap {
    fn read_byte(&self, addr: u16) -> u8 {
        self.bytes[wrap(addr)]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        let a = wrap(addr);
        if is_font(a) {
            warn!("ignoring write of 0x{:02x} to font memory at 0x{:03x}", value, a);
            return;
        }
        self.bytes[a] = value;
    }
}

impl Chip8MemoryMap {
    /// zeroed memory with the font baked in
    pub fn new() -> Self {
        let mut bytes = vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice();
        let start = CHIP8_FONT_ADDR as usize;
        bytes[start..start + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
        Chip8MemoryMap { bytes }
    }

    /// load a CHIP-8 program at 0x200, returning its length
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize> {
        // there's probably a slicker way of bounding the read, but programs are tiny
        let mut buf = Vec::new();
        let len = reader.read_to_end(&mut buf)?;
        if len == 0 {
            return Err(Chip8Error::EmptyProgram);
        }
        if len > CHIP8_MAX_PROGRAM_BYTES {
            return Err(Chip8Error::ProgramTooLarge {
                len,
                max: CHIP8_MAX_PROGRAM_BYTES,
            });
        }
        let start = CHIP8_PROGRAM_ADDR as usize;
        self.bytes[start..start + len].copy_from_slice(&buf);
        debug!("loaded {} byte program at 0x{:03x}", len, start);
        Ok(len)
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_zeroed() {
        let m = Chip8MemoryMap::new();
        // NB. memory is zeroed from 0x200 because before that we bake in the font
        assert_eq!(m.bytes[0x200..], [0; 0xe00]);
        assert_eq!(m.bytes[..0x50], [0; 0x50]);
    }

    #[test]
    fn test_font_baked_in() {
        let m = Chip8MemoryMap::new();
        assert_eq!(m.read_bytes(0x50, 80), CHIP8_FONT.to_vec());
        // glyph for "A"
        assert_eq!(m.read_bytes(0x50 + 10 * 5, 5), [0xF0, 0x90, 0xF0, 0x90, 0x90]);
    }

    #[test]
    fn test_font_is_write_protected() {
        let mut m = Chip8MemoryMap::new();
        m.write(&[0; 4], 0x4e);
        assert_eq!(m.read_byte(0x4e), 0);
        assert_eq!(m.read_byte(0x4f), 0);
        assert_eq!(m.read_byte(0x50), 0xF0);
        assert_eq!(m.read_byte(0x51), 0x90);
        m.write_byte(0xa0, 0x12);
        assert_eq!(m.read_byte(0xa0), 0x12);
    }

    #[test]
    fn test_read_word() {
        let mut m = Chip8MemoryMap::new();
        m.write(&[0, 1, 2, 3, 4, 5, 6, 7], 0x300);
        assert_eq!(m.get_word(0x304), 0x0405);
    }

    #[test]
    fn test_addresses_wrap() {
        let mut m = Chip8MemoryMap::new();
        m.write(&[0xab, 0xcd], 0xfff);
        assert_eq!(m.read_byte(0xfff), 0xab);
        assert_eq!(m.read_byte(0x000), 0xcd);
        assert_eq!(m.get_word(0xfff), 0xabcd);
        assert_eq!(m.read_byte(0x1fff), 0xab);
    }

    #[test]
    fn test_program_load_ok() -> Result<()> {
        let mut dst = Chip8MemoryMap::new();
        let mut prog: &[u8] = &[0x00, 0xe0, 0x12, 0x00];
        assert_eq!(dst.load_program(&mut prog)?, 4);
        assert_eq!(dst.read_bytes(0x200, 4), [0x00, 0xe0, 0x12, 0x00]);
        assert_eq!(dst.read_byte(0x204), 0);
        Ok(())
    }

    #[test]
    fn test_program_fills_memory() -> Result<()> {
        let mut dst = Chip8MemoryMap::new();
        let big = vec![0x11; CHIP8_MAX_PROGRAM_BYTES];
        let mut prog: &[u8] = &big;
        dst.load_program(&mut prog)?;
        assert_eq!(dst.read_byte(0xfff), 0x11);
        Ok(())
    }

    #[test]
    fn test_program_too_large() {
        let mut dst = Chip8MemoryMap::new();
        let big = vec![0; CHIP8_MAX_PROGRAM_BYTES + 1];
        let mut prog: &[u8] = &big;
        match dst.load_program(&mut prog) {
            Err(Chip8Error::ProgramTooLarge { len, max }) => {
                assert_eq!(len, 3585);
                assert_eq!(max, 3584);
            }
            other => panic!("expected ProgramTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_program_rejected() {
        let mut dst = Chip8MemoryMap::new();
        let mut prog: &[u8] = &[];
        assert!(matches!(
            dst.load_program(&mut prog),
            Err(Chip8Error::EmptyProgram)
        ));
    }
}
