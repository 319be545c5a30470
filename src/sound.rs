use crate::error::{Chip8Error, Result};
use beep::beep;
use log::debug;

/// The audio device only ever hears two things: start the tone, stop it.
pub trait Sound {
    fn tone_on(&mut self) -> Result<()>;
    fn tone_off(&mut self) -> Result<()>;
}

const SIMPLEBEEP_PITCH: u16 = 2093; // C

/// PC speaker tone through the beep crate
pub struct SimpleBeep {
    is_beeping: bool,
}

impl SimpleBeep {
    pub fn new() -> Self {
        SimpleBeep { is_beeping: false }
    }
}

impl Default for SimpleBeep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sound for SimpleBeep {
    fn tone_on(&mut self) -> Result<()> {
        if !self.is_beeping {
            beep(SIMPLEBEEP_PITCH).map_err(|e| Chip8Error::Audio(e.to_string()))?;
            self.is_beeping = true;
        }
        Ok(())
    }

    fn tone_off(&mut self) -> Result<()> {
        if self.is_beeping {
            beep(0).map_err(|e| Chip8Error::Audio(e.to_string()))?;
            self.is_beeping = false;
        }
        Ok(())
    }
}

impl Drop for SimpleBeep {
    fn drop(&mut self) {
        // don't leave the speaker screaming after we exit
        if self.is_beeping {
            let _ = beep(0);
        }
    }
}

/// silence, but keeps count so tests can see what would have been heard
#[derive(Default)]
pub struct Mute {
    pub starts: usize,
    pub stops: usize,
}

impl Mute {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sound for Mute {
    fn tone_on(&mut self) -> Result<()> {
        debug!("(muted) tone on");
        self.starts += 1;
        Ok(())
    }

    fn tone_off(&mut self) -> Result<()> {
        debug!("(muted) tone off");
        self.stops += 1;
        Ok(())
    }
}
