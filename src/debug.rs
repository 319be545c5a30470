//! Debugger: pause, single step and a live register dump.
//!
//! The debugger runs on its own thread. The only state it shares with the
//! execution loop is the option set, behind a single mutex that is held just
//! long enough to read or flip a flag. It never touches the interpreter
//! itself; the execution loop publishes a [`MachineStatus`] copy once per
//! frame and the debugger formats whatever it last saw.
use crate::instruction::Instruction;
use crate::interpreter::MachineStatus;
use log::{debug, info, trace};
use std::fmt;
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// the toggles a user can flip
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugOption {
    /// show the dump
    Enabled,
    /// only execute when told to
    StepByStep,
    /// one-shot: let exactly one instruction through
    NextStep,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugOptions {
    pub enabled: bool,
    pub step_by_step: bool,
    pub next_step: bool,
}

impl DebugOptions {
    /// what a freshly attached debugger starts with: visible and paused
    pub fn paused() -> Self {
        DebugOptions {
            enabled: true,
            step_by_step: true,
            next_step: false,
        }
    }

    fn flag(&mut self, option: DebugOption) -> &mut bool {
        match option {
            DebugOption::Enabled => &mut self.enabled,
            DebugOption::StepByStep => &mut self.step_by_step,
            DebugOption::NextStep => &mut self.next_step,
        }
    }
}

struct Shared {
    options: Mutex<DebugOptions>,
    status: Mutex<Option<MachineStatus>>,
}

// a panic elsewhere can't leave a bool half written, so a poisoned lock is
// still good to use
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cloneable handle on the debugger's shared state
#[derive(Clone)]
pub struct DebugHandle {
    shared: Arc<Shared>,
}

impl DebugHandle {
    pub fn new(options: DebugOptions) -> Self {
        DebugHandle {
            shared: Arc::new(Shared {
                options: Mutex::new(options),
                status: Mutex::new(None),
            }),
        }
    }

    pub fn options(&self) -> DebugOptions {
        *lock(&self.shared.options)
    }

    pub fn set(&self, option: DebugOption, value: bool) {
        *lock(&self.shared.options).flag(option) = value;
    }

    /// flip an option, returning its new value
    pub fn toggle(&self, option: DebugOption) -> bool {
        let mut options = lock(&self.shared.options);
        let flag = options.flag(option);
        *flag = !*flag;
        *flag
    }

    /// the instruction clock asks this before every fetch. Outside step mode
    /// it's always yes; in step mode it's yes once per `NextStep`. Every
    /// fetch consumes a pending `NextStep`, so one pressed while running
    /// can't leak into a later pause.
    pub fn should_execute(&self) -> bool {
        let mut options = lock(&self.shared.options);
        let advance = std::mem::take(&mut options.next_step);
        if !options.step_by_step {
            return true;
        }
        if advance {
            trace!("single step");
        }
        advance
    }

    pub fn publish(&self, status: MachineStatus) {
        *lock(&self.shared.status) = Some(status);
    }

    pub fn latest_status(&self) -> Option<MachineStatus> {
        lock(&self.shared.status).clone()
    }
}

fn bool_str(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

/// the text dump: mode flags, instruction, pointers, timers, registers, key wait
pub fn render_dump(options: &DebugOptions, status: &MachineStatus) -> String {
    Dump { options, status }.to_string()
}

struct Dump<'a> {
    options: &'a DebugOptions,
    status: &'a MachineStatus,
}

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (options, status) = (self.options, self.status);
        writeln!(f, "DEBUG WINDOW")?;
        writeln!(f, "ON: {}", bool_str(options.enabled))?;
        writeln!(f, "STEP BY STEP: {}", bool_str(options.step_by_step))?;
        writeln!(f, "OPCODE: {}", Instruction::decode(status.opcode))?;
        writeln!(
            f,
            "PC: {:04X} I: {:04X} S: {:04X}",
            status.program_counter, status.index, status.stack_pointer
        )?;
        writeln!(
            f,
            "DT: {:02X} ST: {:02X}",
            status.delay_timer, status.sound_timer
        )?;
        for (row, regs) in status.registers.chunks(4).enumerate() {
            for (i, v) in regs.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "V{:X}: {:02X}", row * 4 + i, v)?;
            }
            writeln!(f)?;
        }
        writeln!(
            f,
            "WAITING FOR KEY: {} KEY CAPTURED: {}",
            bool_str(status.waiting_for_key),
            bool_str(status.key_captured)
        )
    }
}

/// Somewhere to put the dump
pub trait DebugSurface {
    fn show(&mut self, text: &str) -> io::Result<()>;
}

/// Holds the latest dump for a renderer to pick up; clones share the text
#[derive(Clone, Default)]
pub struct DebugPanel {
    text: Arc<Mutex<String>>,
}

impl DebugPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        lock(&self.text).clone()
    }
}

impl DebugSurface for DebugPanel {
    fn show(&mut self, text: &str) -> io::Result<()> {
        let mut t = lock(&self.text);
        t.clear();
        t.push_str(text);
        Ok(())
    }
}

/// The debugger's own loop: toggle keys arrive over a channel, and the dump
/// is redrawn at its own refresh rate. Dropping the sender ends the loop.
pub struct DebugController {
    handle: DebugHandle,
    keys: Receiver<DebugOption>,
    surface: Box<dyn DebugSurface + Send>,
    refresh: Duration,
}

impl DebugController {
    pub fn new(
        handle: DebugHandle,
        surface: Box<dyn DebugSurface + Send>,
        refresh_hz: u32,
    ) -> (Self, Sender<DebugOption>) {
        let (tx, keys) = mpsc::channel();
        let refresh = Duration::from_nanos(1_000_000_000 / refresh_hz.max(1) as u64);
        (
            DebugController {
                handle,
                keys,
                surface,
                refresh,
            },
            tx,
        )
    }

    pub fn spawn(self) -> io::Result<thread::JoinHandle<io::Result<()>>> {
        thread::Builder::new()
            .name("chip8-debug".into())
            .spawn(move || self.run())
    }

    pub fn run(mut self) -> io::Result<()> {
        let mut next_refresh = Instant::now();
        loop {
            let timeout = next_refresh.saturating_duration_since(Instant::now());
            match self.keys.recv_timeout(timeout) {
                Ok(option) => {
                    let value = self.handle.toggle(option);
                    info!("debug option {:?} -> {}", option, value);
                    self.refresh()?;
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.refresh()?;
                    next_refresh += self.refresh;
                    let now = Instant::now();
                    if next_refresh < now {
                        next_refresh = now + self.refresh;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("debugger stopped");
        Ok(())
    }

    fn refresh(&mut self) -> io::Result<()> {
        let options = self.handle.options();
        let text = match (options.enabled, self.handle.latest_status()) {
            (true, Some(status)) => render_dump(&options, &status),
            _ => String::new(),
        };
        self.surface.show(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> MachineStatus {
        let mut registers = [0u8; 16];
        registers[0xa] = 0x2b;
        MachineStatus {
            opcode: 0x6a2b,
            program_counter: 0x202,
            index: 0x300,
            stack_pointer: 0x1fe,
            delay_timer: 0x10,
            sound_timer: 0,
            registers,
            waiting_for_key: true,
            key_captured: false,
        }
    }

    #[test]
    fn test_free_running_always_executes() {
        let h = DebugHandle::new(DebugOptions::default());
        for _ in 0..5 {
            assert!(h.should_execute());
        }
    }

    #[test]
    fn test_step_mode_gates_execution() {
        let h = DebugHandle::new(DebugOptions::paused());
        for _ in 0..5 {
            assert!(!h.should_execute());
        }
        h.set(DebugOption::NextStep, true);
        assert!(h.should_execute());
        assert!(!h.options().next_step);
        assert!(!h.should_execute());
    }

    #[test]
    fn test_advance_while_running_is_consumed() {
        let h = DebugHandle::new(DebugOptions::default());
        h.set(DebugOption::NextStep, true);
        assert!(h.should_execute());
        assert!(!h.options().next_step);
        h.set(DebugOption::StepByStep, true);
        assert!(!h.should_execute());
        h.set(DebugOption::NextStep, true);
        assert!(h.should_execute());
        assert!(!h.should_execute());
    }

    #[test]
    fn test_toggle() {
        let h = DebugHandle::new(DebugOptions::default());
        assert!(h.toggle(DebugOption::StepByStep));
        assert!(h.options().step_by_step);
        assert!(!h.toggle(DebugOption::StepByStep));
        // clones see the same options
        let h2 = h.clone();
        h2.toggle(DebugOption::Enabled);
        assert!(h.options().enabled);
    }

    #[test]
    fn test_publish_status() {
        let h = DebugHandle::new(DebugOptions::default());
        assert_eq!(h.latest_status(), None);
        h.publish(status());
        assert_eq!(h.latest_status(), Some(status()));
    }

    #[test]
    fn test_render_dump() {
        let text = render_dump(&DebugOptions::paused(), &status());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "DEBUG WINDOW");
        assert_eq!(lines[1], "ON: True");
        assert_eq!(lines[2], "STEP BY STEP: True");
        assert_eq!(lines[3], "OPCODE: LD VA, 0x2B");
        assert_eq!(lines[4], "PC: 0202 I: 0300 S: 01FE");
        assert_eq!(lines[5], "DT: 10 ST: 00");
        assert_eq!(lines[6], "V0: 00 V1: 00 V2: 00 V3: 00");
        assert_eq!(lines[8], "V8: 00 V9: 00 VA: 2B VB: 00");
        assert_eq!(lines[10], "WAITING FOR KEY: True KEY CAPTURED: False");
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn test_controller_toggles_and_stops() {
        let h = DebugHandle::new(DebugOptions::default());
        h.publish(status());
        let panel = DebugPanel::new();
        let (controller, keys) = DebugController::new(h.clone(), Box::new(panel.clone()), 200);
        let thread = controller.spawn().unwrap();
        keys.send(DebugOption::Enabled).unwrap();
        keys.send(DebugOption::StepByStep).unwrap();
        drop(keys);
        thread.join().unwrap().unwrap();
        assert!(h.options().enabled);
        assert!(h.options().step_by_step);
        assert!(panel.text().starts_with("DEBUG WINDOW\nON: True\nSTEP BY STEP: True"));
    }

    #[test]
    fn test_toggle_redraws_before_stopping() -> io::Result<()> {
        let h = DebugHandle::new(DebugOptions::default());
        h.publish(status());
        let panel = DebugPanel::new();
        // slow enough that no timed refresh fires during the test
        let (controller, keys) = DebugController::new(h.clone(), Box::new(panel.clone()), 1);
        keys.send(DebugOption::Enabled).unwrap();
        keys.send(DebugOption::StepByStep).unwrap();
        drop(keys);
        controller.run()?;
        assert!(panel.text().starts_with("DEBUG WINDOW\nON: True\nSTEP BY STEP: True"));
        Ok(())
    }

    #[test]
    fn test_hidden_dump_is_blank() {
        let h = DebugHandle::new(DebugOptions::default());
        h.publish(status());
        let mut panel = DebugPanel::new();
        panel.show("stale").unwrap();
        let (mut controller, _keys) = DebugController::new(h, Box::new(panel.clone()), 30);
        controller.refresh().unwrap();
        assert_eq!(panel.text(), "");
    }
}
