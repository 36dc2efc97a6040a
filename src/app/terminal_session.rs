use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::Print;
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};

use crate::error::AppResult;
use crate::render::Viewport;

pub(crate) trait TerminalSurface {
    /// Terminal size in cells.
    fn size(&self) -> io::Result<(u16, u16)>;

    fn show_status(&mut self, lines: &[String]) -> io::Result<()>;
}

pub(crate) struct TerminalSession {
    stdout: Stdout,
    active: bool,
}

impl TerminalSession {
    pub(crate) fn enter() -> AppResult<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen, Hide) {
            cleanup_terminal_enter_failure(&mut stdout);
            return Err(err.into());
        }

        Ok(Self {
            stdout,
            active: true,
        })
    }

    pub(crate) fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        disable_raw_mode()?;
        execute!(self.stdout, LeaveAlternateScreen, Show)?;
        self.active = false;
        Ok(())
    }
}

impl TerminalSurface for TerminalSession {
    fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    fn show_status(&mut self, lines: &[String]) -> io::Result<()> {
        queue!(self.stdout, Clear(ClearType::All))?;
        for (row, line) in lines.iter().enumerate() {
            queue!(self.stdout, MoveTo(0, row as u16), Print(line))?;
        }
        self.stdout.flush()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

fn cleanup_terminal_enter_failure(stdout: &mut Stdout) {
    let _ = execute!(stdout, LeaveAlternateScreen, Show);
    let _ = disable_raw_mode();
}

/// Pixel viewport for a terminal of `columns` x `rows` cells. Prefers the
/// pixel size the terminal reports and falls back to `cell_px` per cell.
pub(crate) fn terminal_viewport(columns: u16, rows: u16, cell_px: (u16, u16)) -> Viewport {
    if let Ok(size) = crossterm::terminal::window_size()
        && size.width > 0
        && size.height > 0
    {
        return Viewport::new(u32::from(size.width), u32::from(size.height));
    }
    cells_to_viewport(columns, rows, cell_px)
}

pub(crate) fn cells_to_viewport(columns: u16, rows: u16, cell_px: (u16, u16)) -> Viewport {
    Viewport::new(
        u32::from(columns).saturating_mul(u32::from(cell_px.0.max(1))),
        u32::from(rows).saturating_mul(u32::from(cell_px.1.max(1))),
    )
}
