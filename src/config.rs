/// Knobs for a machine run. Everything that isn't the program itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chip8Config {
    /// instructions executed per second
    pub instruction_hz: u32,
    /// delay/sound timer decrements (and frames drawn) per second
    pub timer_hz: u32,
    /// how often the debugger redraws its text dump
    pub debug_refresh_hz: u32,
    /// wrap sprites around the screen edges instead of clipping them
    pub y_wrap: bool,
    /// fixed seed for `Cxnn`; entropy when `None`
    pub seed: Option<u64>,
}

pub const DEFAULT_INSTRUCTION_HZ: u32 = 700;
pub const DEFAULT_TIMER_HZ: u32 = 60;
pub const DEFAULT_DEBUG_REFRESH_HZ: u32 = 30;

impl Default for Chip8Config {
    fn default() -> Self {
        Chip8Config {
            instruction_hz: DEFAULT_INSTRUCTION_HZ,
            timer_hz: DEFAULT_TIMER_HZ,
            debug_refresh_hz: DEFAULT_DEBUG_REFRESH_HZ,
            y_wrap: false,
            seed: None,
        }
    }
}
