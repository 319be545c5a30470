use crate::debug::DebugPanel;
use crate::framebuffer::{FrameBuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders, Paragraph};
use tui::Terminal;

/// Display is used by the environment to put the frame buffer on a screen. It
/// is pulled once per timer tick and never writes back.
pub trait Display {
    fn draw(&mut self, frame: &FrameBuffer) -> io::Result<()>;
}

// store useful metadata about the terminal
struct Resolution(usize, usize);

impl Resolution {
    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas coordinates of every pixel equal to `lit`; y grows downward on
    /// the machine and upward on the canvas
    fn bitplane_from_rows<'a>(
        &self,
        rows: &'a [u64],
        lit: bool,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let w = self.0;
        rows.iter().enumerate().flat_map(move |(y, row)| {
            (0..w).filter_map(move |x| {
                let on = row & (1u64 << (63 - x)) != 0;
                (on == lit).then(|| (x as f64, -1.0 * y as f64))
            })
        })
    }
}

const DEBUG_PANEL_WIDTH: u16 = 40;
const DEBUG_PANEL_HEIGHT: u16 = 13;

/// monochrome display in a terminal, rendered using TUI and Crossterm, with
/// room on the right for the debugger's dump
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
    panel: Option<DebugPanel>,
}

impl MonoTermDisplay {
    pub fn new(panel: Option<DebugPanel>) -> io::Result<MonoTermDisplay> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(DISPLAY_WIDTH, DISPLAY_HEIGHT),
            panel,
        })
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        // expand each bitplane into x, y float coords, suitable for TUI
        let rows = frame.rows();
        let unlit: Vec<_> = self.resolution.bitplane_from_rows(rows, false).collect();
        let lit: Vec<_> = self.resolution.bitplane_from_rows(rows, true).collect();
        let debug_text = self.panel.as_ref().map(DebugPanel::text).unwrap_or_default();
        let (x_bounds, y_bounds) = (self.resolution.x_bounds(), self.resolution.y_bounds());
        let (w, h) = (self.resolution.0 as u16, self.resolution.1 as u16);

        self.terminal.draw(|f| {
            let screen = f.size();
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(x_bounds)
                .y_bounds(y_bounds)
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &unlit,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, Rect::new(0, 0, 2 + w, 2 + h).intersection(screen));

            let area = Rect::new(2 + w, 0, DEBUG_PANEL_WIDTH, DEBUG_PANEL_HEIGHT);
            if !debug_text.is_empty() && screen.right() > area.x {
                let panel = Paragraph::new(debug_text.as_str())
                    .block(Block::default().title("DEBUG").borders(Borders::ALL));
                f.render_widget(panel, area.intersection(screen));
            }
        })?;
        Ok(())
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        // nothing useful to do if the terminal is already gone
        let _ = self.terminal.show_cursor();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// useful for testing non-display routines; remembers the last frame
pub struct DummyDisplay {
    pub frames: usize,
    pub last: Option<FrameBuffer>,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay {
            frames: 0,
            last: None,
        }
    }
}

impl Default for DummyDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        self.frames += 1;
        self.last = Some(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.x_bounds(), [0.0, 63.0]);
    }

    #[test]
    fn test_y_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.y_bounds(), [-31.0, 0.0]);
    }

    #[test]
    fn test_bitplanes_partition_screen() {
        let r = Resolution(64, 32);
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(0, 0, &[0xc0], false);
        fb.draw_sprite(63, 31, &[0x80], false);
        let lit: Vec<_> = r.bitplane_from_rows(fb.rows(), true).collect();
        assert_eq!(lit, vec![(0.0, 0.0), (1.0, 0.0), (63.0, -31.0)]);
        assert_eq!(r.bitplane_from_rows(fb.rows(), false).count(), 2048 - 3);
    }

    #[test]
    fn test_dummy_display_records_frames() -> io::Result<()> {
        let mut d = DummyDisplay::new();
        let mut fb = FrameBuffer::new();
        d.draw(&fb)?;
        fb.draw_sprite(1, 1, &[0xff], false);
        d.draw(&fb)?;
        assert_eq!(d.frames, 2);
        assert_eq!(d.last, Some(fb));
        Ok(())
    }
}
