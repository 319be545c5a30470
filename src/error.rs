use std::io;
use thiserror::Error;

/// Everything that can stop the machine.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("program is {len} bytes; at most {max} fit above 0x200")]
    ProgramTooLarge { len: usize, max: usize },
    #[error("program is empty")]
    EmptyProgram,
    #[error("call stack overflow at 0x{pc:04x}")]
    StackOverflow { pc: u16 },
    #[error("return with empty call stack at 0x{pc:04x}")]
    StackUnderflow { pc: u16 },
    #[error("audio error: {0}")]
    Audio(String),
}

pub type Result<T> = std::result::Result<T, Chip8Error>;
