//! # instruction
//!
//! Each instruction is a big-endian 16 bit word. The fields are:
//!
//! | Field  | Bits       | Meaning                         |
//! |--------|------------|---------------------------------|
//! | `kind` | 0xF000     | instruction family              |
//! | `x`    | 0x0F00     | first register selector         |
//! | `y`    | 0x00F0     | second register selector        |
//! | `n`    | 0x000F     | 4 bit constant / sub-family     |
//! | `nn`   | 0x00FF     | 8 bit constant / sub-family     |
//! | `nnn`  | 0x0FFF     | 12 bit address                  |
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    pub fn kind(self) -> u8 {
        (self.0 >> 12) as u8
    }
    pub fn x(self) -> u8 {
        ((self.0 >> 8) & 0xf) as u8
    }
    pub fn y(self) -> u8 {
        ((self.0 >> 4) & 0xf) as u8
    }
    pub fn n(self) -> u8 {
        (self.0 & 0xf) as u8
    }
    pub fn nn(self) -> u8 {
        (self.0 & 0xff) as u8
    }
    pub fn nnn(self) -> u16 {
        self.0 & 0x0fff
    }
}

/// register to register arithmetic, `8xyN`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Assign,
    Or,
    And,
    Xor,
    /// VF = carry
    Add,
    /// x - y, VF = no borrow
    Sub,
    /// VF = bit shifted out
    ShiftRight,
    /// y - x, VF = no borrow
    SubReverse,
    /// VF = bit shifted out
    ShiftLeft,
}

impl AluOp {
    fn from_n(n: u8) -> Option<AluOp> {
        Some(match n {
            0x0 => AluOp::Assign,
            0x1 => AluOp::Or,
            0x2 => AluOp::And,
            0x3 => AluOp::Xor,
            0x4 => AluOp::Add,
            0x5 => AluOp::Sub,
            0x6 => AluOp::ShiftRight,
            0x7 => AluOp::SubReverse,
            0xe => AluOp::ShiftLeft,
            _ => return None,
        })
    }

    fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Assign => "LD",
            AluOp::Or => "OR",
            AluOp::And => "AND",
            AluOp::Xor => "XOR",
            AluOp::Add => "ADD",
            AluOp::Sub => "SUB",
            AluOp::ShiftRight => "SHR",
            AluOp::SubReverse => "SUBN",
            AluOp::ShiftLeft => "SHL",
        }
    }
}

/// Every instruction the machine understands; register operands are 0-15.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    ClearScreen,
    Return,
    Jump(u16),
    Call(u16),
    SkipIfEqualConst { x: u8, nn: u8 },
    SkipIfNotEqualConst { x: u8, nn: u8 },
    SkipIfEqual { x: u8, y: u8 },
    LoadConst { x: u8, nn: u8 },
    AddConst { x: u8, nn: u8 },
    Alu { op: AluOp, x: u8, y: u8 },
    SkipIfNotEqual { x: u8, y: u8 },
    LoadIndex(u16),
    JumpOffset(u16),
    Random { x: u8, nn: u8 },
    Draw { x: u8, y: u8, n: u8 },
    SkipIfKey(u8),
    SkipIfNotKey(u8),
    ReadDelay(u8),
    WaitKey(u8),
    SetDelay(u8),
    SetSound(u8),
    AddIndex(u8),
    LoadGlyph(u8),
    StoreBcd(u8),
    StoreRegisters(u8),
    LoadRegisters(u8),
    /// anything else, including `0nnn` machine calls; executes as a no-op
    Unknown(u16),
}

impl Instruction {
    pub fn decode(word: u16) -> Instruction {
        use Instruction::*;
        let op = Opcode(word);
        let (x, y, n, nn, nnn) = (op.x(), op.y(), op.n(), op.nn(), op.nnn());
        match op.kind() {
            0x0 => match word {
                0x00e0 => ClearScreen,
                0x00ee => Return,
                _ => Unknown(word),
            },
            0x1 => Jump(nnn),
            0x2 => Call(nnn),
            0x3 => SkipIfEqualConst { x, nn },
            0x4 => SkipIfNotEqualConst { x, nn },
            0x5 if n == 0 => SkipIfEqual { x, y },
            0x6 => LoadConst { x, nn },
            0x7 => AddConst { x, nn },
            0x8 => match AluOp::from_n(n) {
                Some(op) => Alu { op, x, y },
                None => Unknown(word),
            },
            0x9 if n == 0 => SkipIfNotEqual { x, y },
            0xa => LoadIndex(nnn),
            0xb => JumpOffset(nnn),
            0xc => Random { x, nn },
            0xd => Draw { x, y, n },
            0xe => match nn {
                0x9e => SkipIfKey(x),
                0xa1 => SkipIfNotKey(x),
                _ => Unknown(word),
            },
            0xf => match nn {
                0x07 => ReadDelay(x),
                0x0a => WaitKey(x),
                0x15 => SetDelay(x),
                0x18 => SetSound(x),
                0x1e => AddIndex(x),
                0x29 => LoadGlyph(x),
                0x33 => StoreBcd(x),
                0x55 => StoreRegisters(x),
                0x65 => LoadRegisters(x),
                _ => Unknown(word),
            },
            _ => Unknown(word),
        }
    }
}

/// disassembly, in the usual Cowgod mnemonics
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(a) => write!(f, "JP 0x{:03X}", a),
            Call(a) => write!(f, "CALL 0x{:03X}", a),
            SkipIfEqualConst { x, nn } => write!(f, "SE V{:X}, 0x{:02X}", x, nn),
            SkipIfNotEqualConst { x, nn } => write!(f, "SNE V{:X}, 0x{:02X}", x, nn),
            SkipIfEqual { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            LoadConst { x, nn } => write!(f, "LD V{:X}, 0x{:02X}", x, nn),
            AddConst { x, nn } => write!(f, "ADD V{:X}, 0x{:02X}", x, nn),
            Alu {
                op: op @ (AluOp::ShiftRight | AluOp::ShiftLeft),
                x,
                ..
            } => write!(f, "{} V{:X}", op.mnemonic(), x),
            Alu { op, x, y } => write!(f, "{} V{:X}, V{:X}", op.mnemonic(), x, y),
            SkipIfNotEqual { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            LoadIndex(a) => write!(f, "LD I, 0x{:03X}", a),
            JumpOffset(a) => write!(f, "JP V0, 0x{:03X}", a),
            Random { x, nn } => write!(f, "RND V{:X}, 0x{:02X}", x, nn),
            Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            SkipIfKey(x) => write!(f, "SKP V{:X}", x),
            SkipIfNotKey(x) => write!(f, "SKNP V{:X}", x),
            ReadDelay(x) => write!(f, "LD V{:X}, DT", x),
            WaitKey(x) => write!(f, "LD V{:X}, K", x),
            SetDelay(x) => write!(f, "LD DT, V{:X}", x),
            SetSound(x) => write!(f, "LD ST, V{:X}", x),
            AddIndex(x) => write!(f, "ADD I, V{:X}", x),
            LoadGlyph(x) => write!(f, "LD F, V{:X}", x),
            StoreBcd(x) => write!(f, "LD B, V{:X}", x),
            StoreRegisters(x) => write!(f, "LD [I], V{:X}", x),
            LoadRegisters(x) => write!(f, "LD V{:X}, [I]", x),
            Unknown(w) => write!(f, "??? 0x{:04X}", w),
        }
    }
}
