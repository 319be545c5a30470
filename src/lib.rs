//! A CHIP-8 virtual machine.
//!
//! ## Design
//!
//! * two logical clocks, not cycle-accurate hardware timing: ~700Hz for
//!   instructions, 60Hz for the delay/sound timers and frame refresh
//! * the interpreter never blocks; `Fx0A` parks on the same instruction
//!   until a key is down
//! * display, input and audio are traits so the core can be driven from a
//!   terminal, a window or a test
//! * an optional debugger thread can pause, single-step and dump state
//!
//! Model
//!
//! Environment
//!  |-- display, input, sound, config
//!  |-- interpreter(config)
//!  |    |-- memory (font, program), call stack, registers, timers
//!  |    |-- frame buffer, keypad
//!  |    `-- instruction set: decode to `Instruction`, then execute
//!  |-- debugger (optional; own thread, shares only its option set)
//!  `-- main loop
//!       |-- apply input events (keys, debug toggles, quit)
//!       |-- for each due instruction tick: unless the debugger holds us, step
//!       |-- for each due timer tick: tick timers, start/stop tone, draw frame
//!       `-- sleep until the earlier of the two next ticks
pub mod clock;
pub mod config;
pub mod debug;
pub mod display;
pub mod environment;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod keypad;
pub mod memory;
pub mod sound;
pub mod stack;

pub use config::Chip8Config;
pub use environment::Chip8Environment;
pub use error::{Chip8Error, Result};
pub use interpreter::Chip8Interpreter;
