use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use chip8vm::config::{DEFAULT_INSTRUCTION_HZ, DEFAULT_TIMER_HZ};
use chip8vm::debug::{DebugController, DebugHandle, DebugOptions, DebugPanel};
use chip8vm::display::MonoTermDisplay;
use chip8vm::input::StdinInput;
use chip8vm::sound::{Mute, SimpleBeep, Sound};
use chip8vm::{Chip8Config, Chip8Environment, Chip8Interpreter};
use clap::Parser;
use log::{error, info};

/// Run a CHIP-8 program in the terminal
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// program image, loaded verbatim at 0x200
    program: PathBuf,

    /// instructions per second
    #[arg(long, default_value_t = DEFAULT_INSTRUCTION_HZ)]
    cpu_hz: u32,

    /// timer ticks (and frames) per second
    #[arg(long, default_value_t = DEFAULT_TIMER_HZ)]
    timer_hz: u32,

    /// wrap sprites around the screen edges instead of clipping
    #[arg(long)]
    wrap: bool,

    /// fixed random seed
    #[arg(long)]
    seed: Option<u64>,

    /// attach the debugger (starts paused; j: dump, k: step mode, l: next step)
    #[arg(long)]
    debug: bool,

    /// no sound
    #[arg(long)]
    mute: bool,

    /// write logs here instead of stderr (stdout belongs to the display)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<(), Box<dyn Error>> {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(path) = log_file {
        builder.target(env_logger::Target::Pipe(Box::new(File::create(path)?)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let config = Chip8Config {
        instruction_hz: args.cpu_hz,
        timer_hz: args.timer_hz,
        y_wrap: args.wrap,
        seed: args.seed,
        ..Chip8Config::default()
    };

    // fail on a bad program before touching the terminal
    let mut interpreter = Chip8Interpreter::new(&config);
    let len = interpreter.load_program(&mut File::open(&args.program)?)?;
    info!("loaded {} ({} bytes)", args.program.display(), len);

    let panel = args.debug.then(DebugPanel::new);
    let mut display = MonoTermDisplay::new(panel.clone())?;
    let mut input = StdinInput::new()?;
    let mut sound: Box<dyn Sound> = if args.mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };

    let mut env = Chip8Environment::with_interpreter(
        config.clone(),
        interpreter,
        &mut display,
        &mut input,
        sound.as_mut(),
    );

    let debugger = match panel {
        Some(panel) => {
            let handle = DebugHandle::new(DebugOptions::paused());
            let (controller, keys) =
                DebugController::new(handle.clone(), Box::new(panel), config.debug_refresh_hz);
            env.attach_debugger(handle, keys);
            Some(controller.spawn()?)
        }
        None => None,
    };

    let result = env.main_loop();
    // dropping the environment closes the debugger's key channel
    drop(env);
    if let Some(thread) = debugger {
        match thread.join() {
            Ok(r) => r?,
            Err(_) => error!("debugger thread panicked"),
        }
    }
    result?;
    Ok(())
}
