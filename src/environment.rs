//! The environment sets everything up and runs the main loop. It owns the
//! interpreter outright and borrows the display, input and audio devices.
//!
//! Two clocks drive it: the instruction clock runs one fetch/execute per
//! tick (unless the debugger is holding it), the timer clock ticks the delay
//! and sound timers and pushes a frame to the display. Both live on this one
//! thread; they only differ in period.
use crate::clock::{sleep_until, Clock};
use crate::config::Chip8Config;
use crate::debug::{DebugHandle, DebugOption};
use crate::display::Display;
use crate::error::Result;
use crate::input::{Input, InputEvent};
use crate::interpreter::{Chip8Interpreter, ToneChange};
use crate::sound::Sound;
use log::{info, trace, warn};
use std::io;
use std::sync::mpsc::Sender;
use std::time::Instant;

struct AttachedDebugger {
    handle: DebugHandle,
    keys: Sender<DebugOption>,
}

pub struct Chip8Environment<'a> {
    interpreter: Chip8Interpreter,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    debugger: Option<AttachedDebugger>,
    config: Chip8Config,
}

impl<'a> Chip8Environment<'a> {
    pub fn new(
        config: Chip8Config,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
    ) -> Self {
        let interpreter = Chip8Interpreter::new(&config);
        Self::with_interpreter(config, interpreter, display, input, sound)
    }

    /// wrap an interpreter that's already been set up, e.g. with its program
    /// loaded before any device was opened
    pub fn with_interpreter(
        config: Chip8Config,
        interpreter: Chip8Interpreter,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
    ) -> Self {
        Chip8Environment {
            interpreter,
            display,
            input,
            sound,
            debugger: None,
            config,
        }
    }

    /// gate execution on `handle` and forward debug keys to `keys`
    pub fn attach_debugger(&mut self, handle: DebugHandle, keys: Sender<DebugOption>) {
        handle.publish(self.interpreter.status());
        self.debugger = Some(AttachedDebugger { handle, keys });
    }

    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize> {
        let len = self.interpreter.load_program(reader)?;
        if let Some(d) = &self.debugger {
            d.handle.publish(self.interpreter.status());
        }
        Ok(len)
    }

    pub fn interpreter(&self) -> &Chip8Interpreter {
        &self.interpreter
    }

    /// apply pending input; false once shutdown has been asked for
    pub fn handle_input(&mut self) -> Result<bool> {
        for event in self.input.poll()? {
            match event {
                InputEvent::KeyDown(k) => self.interpreter.press_key(k),
                InputEvent::KeyUp(k) => self.interpreter.release_key(k),
                InputEvent::Debug(option) => match &self.debugger {
                    Some(d) => {
                        if d.keys.send(option).is_err() {
                            warn!("debugger has gone away; dropping {:?}", option);
                        }
                    }
                    None => trace!("no debugger attached; ignoring {:?}", option),
                },
                InputEvent::Quit => return Ok(false),
            }
        }
        Ok(true)
    }

    /// one tick of the instruction clock
    pub fn instruction_tick(&mut self) -> Result<()> {
        if let Some(d) = &self.debugger {
            if !d.handle.should_execute() {
                return Ok(());
            }
        }
        self.interpreter.step()?;
        Ok(())
    }

    /// one tick of the timer clock: timers, tone, frame
    pub fn timer_tick(&mut self) -> Result<()> {
        match self.interpreter.tick_timers() {
            Some(ToneChange::Start) => self.sound.tone_on()?,
            Some(ToneChange::Stop) => self.sound.tone_off()?,
            None => {}
        }
        self.display.draw(self.interpreter.display())?;
        if let Some(d) = &self.debugger {
            d.handle.publish(self.interpreter.status());
        }
        Ok(())
    }

    /// run until the input device asks us to stop or the program fails
    pub fn main_loop(&mut self) -> Result<()> {
        let start = Instant::now();
        let mut instructions = Clock::from_hz(self.config.instruction_hz, start);
        let mut timers = Clock::from_hz(self.config.timer_hz, start);
        info!(
            "running at {}Hz, timers at {}Hz",
            self.config.instruction_hz, self.config.timer_hz
        );

        let result = self.run_clocks(&mut instructions, &mut timers);

        // don't leave a tone running whatever happened
        if self.interpreter.tone_on() {
            self.sound.tone_off()?;
        }
        result
    }

    fn run_clocks(&mut self, instructions: &mut Clock, timers: &mut Clock) -> Result<()> {
        while self.handle_input()? {
            let now = Instant::now();
            for _ in 0..instructions.due(now) {
                self.instruction_tick()?;
            }
            for _ in 0..timers.due(now) {
                self.timer_tick()?;
            }
            sleep_until(instructions.next_tick().min(timers.next_tick()));
        }
        info!("shutting down");
        Ok(())
    }
}
