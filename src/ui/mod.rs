// Interactive mode. app.rs runs the loop, events.rs turns terminal input into
// messages, view.rs draws AppState. This file owns raw mode and the alternate
// screen.

mod app;
pub mod events;
pub mod view;

pub use app::App;
pub use events::EventHandler;

use std::io;
use std::panic;
use std::sync::Once;

use anyhow::Result;
use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};

type Backend = CrosstermBackend<io::Stdout>;

static PANIC_HOOK: Once = Once::new();

/// The alternate screen in raw mode. Dropping it, or panicking while it is up,
/// hands the shell back in cooked mode with a visible cursor.
pub struct Screen {
    terminal: Terminal<Backend>,
}

impl Screen {
    pub fn enter() -> Result<Self> {
        PANIC_HOOK.call_once(|| {
            let previous = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                restore_terminal();
                previous(info);
            }));
        });

        // leftovers from a run that was killed
        restore_terminal();

        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, cursor::Hide) {
            restore_terminal();
            return Err(e.into());
        }
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;
        Ok(Self { terminal })
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }

    /// Width and height in cells.
    pub fn size(&self) -> Result<(u16, u16)> {
        let area = self.terminal.size()?;
        Ok((area.width, area.height))
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    terminal::disable_raw_mode().ok();
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show).ok();
}
