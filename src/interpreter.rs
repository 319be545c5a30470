//! # interpreter
//!
//! The machine state and the fetch/decode/execute cycle. Visible state is:
//!  * 4K of memory, with the hex font at 0x050 and programs from 0x200
//!  * V0-VF 8 bit registers; VF doubles as carry/borrow/collision flag
//!  * I, a 16 bit index register
//!  * the program counter, starting at 0x200, two bytes per instruction
//!  * a call stack (its pointer drops two bytes per call from 0x200)
//!  * delay and sound timers, ticked down by the timer clock
//!  * the 64x32 frame buffer and the 16 key keypad
//!
//! Nothing here blocks or sleeps; pacing is the environment's problem.
use crate::config::Chip8Config;
use crate::error::{Chip8Error, Result};
use crate::framebuffer::{FrameBuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::instruction::{AluOp, Instruction};
use crate::keypad::Keypad;
use crate::memory::{
    Chip8MemoryMap, MemoryMap, CHIP8_FONT_ADDR, CHIP8_GLYPH_BYTES, CHIP8_PROGRAM_ADDR,
};
use crate::stack::CallStack;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;

pub const REGISTER_COUNT: usize = 16;
const FLAG: usize = 0xf;
const INSTRUCTION_BYTES: u16 = 2;

/// What the audio device should do after a timer tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToneChange {
    Start,
    Stop,
}

/// Point-in-time copy of everything the debugger shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MachineStatus {
    pub opcode: u16,
    pub program_counter: u16,
    pub index: u16,
    pub stack_pointer: u16,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub registers: [u8; REGISTER_COUNT],
    pub waiting_for_key: bool,
    pub key_captured: bool,
}

pub struct Chip8Interpreter {
    memory: Chip8MemoryMap,
    program_counter: u16,
    index: u16,
    stack: CallStack,
    delay_timer: u8,
    sound_timer: u8,
    v: [u8; REGISTER_COUNT],
    display: FrameBuffer,
    keypad: Keypad,
    current_opcode: u16,
    y_wrap: bool,
    tone_on: bool,
    rng: StdRng,
}

impl Chip8Interpreter {
    pub fn new(config: &Chip8Config) -> Chip8Interpreter {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Chip8Interpreter {
            memory: Chip8MemoryMap::new(),
            program_counter: CHIP8_PROGRAM_ADDR,
            index: 0,
            stack: CallStack::new(),
            delay_timer: 0,
            sound_timer: 0,
            v: [0; REGISTER_COUNT],
            display: FrameBuffer::new(),
            keypad: Keypad::new(),
            current_opcode: 0,
            y_wrap: config.y_wrap,
            tone_on: false,
            rng,
        }
    }

    /// load a chip8 program; the first instruction becomes `current_opcode`
    /// so it can be inspected before anything runs
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize> {
        let len = self.memory.load_program(reader)?;
        self.current_opcode = self.memory.get_word(self.program_counter);
        Ok(len)
    }

    /// one fetch/decode/execute cycle
    pub fn step(&mut self) -> Result<Instruction> {
        let word = self.memory.get_word(self.program_counter);
        self.current_opcode = word;
        let instruction = Instruction::decode(word);
        trace!("0x{:03x}: {}", self.program_counter, instruction);
        self.program_counter = self.program_counter.wrapping_add(INSTRUCTION_BYTES);
        self.execute(instruction)?;
        Ok(instruction)
    }

    /// run one decoded instruction. the program counter is expected to
    /// already point past it
    pub fn execute(&mut self, instruction: Instruction) -> Result<()> {
        use Instruction::*;
        match instruction {
            ClearScreen => self.display.clear(),
            Return => {
                self.program_counter = self.stack.pop().ok_or(Chip8Error::StackUnderflow {
                    pc: self.instruction_addr(),
                })?;
            }
            Jump(addr) => self.program_counter = addr,
            Call(addr) => {
                self.stack
                    .push(self.program_counter)
                    .ok_or(Chip8Error::StackOverflow {
                        pc: self.instruction_addr(),
                    })?;
                self.program_counter = addr;
            }
            SkipIfEqualConst { x, nn } => self.skip_if(self.v[x as usize] == nn),
            SkipIfNotEqualConst { x, nn } => self.skip_if(self.v[x as usize] != nn),
            SkipIfEqual { x, y } => self.skip_if(self.v[x as usize] == self.v[y as usize]),
            SkipIfNotEqual { x, y } => self.skip_if(self.v[x as usize] != self.v[y as usize]),
            LoadConst { x, nn } => self.v[x as usize] = nn,
            AddConst { x, nn } => self.v[x as usize] = self.v[x as usize].wrapping_add(nn),
            Alu { op, x, y } => self.alu(op, x as usize, y as usize),
            LoadIndex(addr) => self.index = addr,
            JumpOffset(addr) => self.program_counter = self.v[0] as u16 + addr,
            Random { x, nn } => self.v[x as usize] = self.rng.gen::<u8>() & nn,
            Draw { x, y, n } => self.draw(x as usize, y as usize, n as usize),
            SkipIfKey(x) => self.skip_if(self.keypad.is_held(self.v[x as usize])),
            SkipIfNotKey(x) => self.skip_if(!self.keypad.is_held(self.v[x as usize])),
            ReadDelay(x) => self.v[x as usize] = self.delay_timer,
            WaitKey(x) => match self.keypad.poll_wait() {
                Some(key) => self.v[x as usize] = key,
                // come back to this instruction next cycle
                None => {
                    self.program_counter = self.program_counter.wrapping_sub(INSTRUCTION_BYTES)
                }
            },
            SetDelay(x) => self.delay_timer = self.v[x as usize],
            SetSound(x) => self.sound_timer = self.v[x as usize],
            AddIndex(x) => self.index = self.index.wrapping_add(self.v[x as usize] as u16),
            LoadGlyph(x) => {
                self.index = CHIP8_FONT_ADDR + (self.v[x as usize] & 0xf) as u16 * CHIP8_GLYPH_BYTES
            }
            StoreBcd(x) => {
                let vx = self.v[x as usize];
                self.memory
                    .write(&[vx / 100, (vx / 10) % 10, vx % 10], self.index);
            }
            StoreRegisters(x) => {
                let regs = self.v;
                self.memory.write(&regs[..=x as usize], self.index);
            }
            LoadRegisters(x) => {
                let bytes = self.memory.read_bytes(self.index, x as usize + 1);
                self.v[..=x as usize].copy_from_slice(&bytes);
            }
            Unknown(word) => trace!("ignoring unknown opcode 0x{:04x}", word),
        }
        Ok(())
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.program_counter = self.program_counter.wrapping_add(INSTRUCTION_BYTES);
        }
    }

    /// address of the instruction being executed
    fn instruction_addr(&self) -> u16 {
        self.program_counter.wrapping_sub(INSTRUCTION_BYTES)
    }

    // VF is always written last, so it holds the flag even when it is also x
    fn alu(&mut self, op: AluOp, x: usize, y: usize) {
        let (vx, vy) = (self.v[x], self.v[y]);
        let flag = match op {
            AluOp::Assign => {
                self.v[x] = vy;
                None
            }
            AluOp::Or => {
                self.v[x] = vx | vy;
                None
            }
            AluOp::And => {
                self.v[x] = vx & vy;
                None
            }
            AluOp::Xor => {
                self.v[x] = vx ^ vy;
                None
            }
            AluOp::Add => {
                let (sum, carry) = vx.overflowing_add(vy);
                self.v[x] = sum;
                Some(carry)
            }
            AluOp::Sub => {
                let (diff, borrow) = vx.overflowing_sub(vy);
                self.v[x] = diff;
                Some(!borrow)
            }
            AluOp::ShiftRight => {
                self.v[x] = vx >> 1;
                Some(vx & 0x01 != 0)
            }
            AluOp::SubReverse => {
                let (diff, borrow) = vy.overflowing_sub(vx);
                self.v[x] = diff;
                Some(!borrow)
            }
            AluOp::ShiftLeft => {
                self.v[x] = vx << 1;
                Some(vx & 0x80 != 0)
            }
        };
        if let Some(f) = flag {
            self.v[FLAG] = f as u8;
        }
    }

    fn draw(&mut self, x: usize, y: usize, n: usize) {
        let col = self.v[x] as usize % DISPLAY_WIDTH;
        let row = self.v[y] as usize % DISPLAY_HEIGHT;
        let sprite = self.memory.read_bytes(self.index, n);
        self.v[FLAG] = 0;
        if self.display.draw_sprite(col, row, &sprite, self.y_wrap) {
            self.v[FLAG] = 1;
        }
    }

    /// one 60Hz tick: count both timers down towards zero and report whether
    /// the tone should start or stop
    pub fn tick_timers(&mut self) -> Option<ToneChange> {
        let sounding = self.sound_timer > 0;
        let change = if sounding != self.tone_on {
            self.tone_on = sounding;
            debug!("tone {}", if sounding { "on" } else { "off" });
            Some(if sounding {
                ToneChange::Start
            } else {
                ToneChange::Stop
            })
        } else {
            None
        };
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
        change
    }

    pub fn press_key(&mut self, key: u8) {
        self.keypad.press(key);
    }

    pub fn release_key(&mut self, key: u8) {
        self.keypad.release(key);
    }

    pub fn display(&self) -> &FrameBuffer {
        &self.display
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn memory(&self) -> &Chip8MemoryMap {
        &self.memory
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.v
    }

    pub fn current_opcode(&self) -> u16 {
        self.current_opcode
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn tone_on(&self) -> bool {
        self.tone_on
    }

    pub fn status(&self) -> MachineStatus {
        MachineStatus {
            opcode: self.current_opcode,
            program_counter: self.program_counter,
            index: self.index,
            stack_pointer: self.stack.pointer(),
            delay_timer: self.delay_timer,
            sound_timer: self.sound_timer,
            registers: self.v,
            waiting_for_key: self.keypad.is_waiting(),
            key_captured: self.keypad.key_captured(),
        }
    }
}
