use crate::tui::render::{self, Summary};
use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::text::{Line, Text};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use std::io::{self, IsTerminal, Stdout, Write};

/// Where refresh frames go. Each `present` call replaces the previous frame entirely.
pub trait Screen {
    fn enter(&mut self) -> io::Result<()>;
    fn present(&mut self, header: &[Line<'static>], body: &[Line<'static>]) -> io::Result<()>;
    fn leave(&mut self) -> io::Result<()>;
    fn is_terminal(&self) -> bool;
    fn print_summary(&mut self, summary: &Summary) -> io::Result<()>;
}

/// Full-screen rendering on the terminal's alternate buffer. ratatui diffs successive frames,
/// so a refresh only rewrites the cells that changed.
pub struct AltScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl AltScreen {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new(CrosstermBackend::new(io::stdout()))?,
            active: false,
        })
    }
}

impl Screen for AltScreen {
    fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        self.active = true;
        self.terminal.clear()
    }

    fn present(&mut self, header: &[Line<'static>], body: &[Line<'static>]) -> io::Result<()> {
        self.terminal.draw(|f| draw_frame(f, header, body))?;
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        execute!(io::stdout(), LeaveAlternateScreen, Show)
    }

    fn is_terminal(&self) -> bool {
        true
    }

    fn print_summary(&mut self, summary: &Summary) -> io::Result<()> {
        write_styled_summary(&mut io::stdout(), summary)
    }
}

fn line_count(lines: &[Line<'_>]) -> u16 {
    u16::try_from(lines.len()).unwrap_or(u16::MAX)
}

/// Header pinned at the top; the body scrolls so its last line stays visible when the run
/// has more lines than the terminal has rows.
pub fn draw_frame(f: &mut Frame, header: &[Line<'static>], body: &[Line<'static>]) {
    let area = f.area();
    let [top, rest] = Layout::vertical([
        Constraint::Length(line_count(header).min(area.height)),
        Constraint::Min(0),
    ])
    .areas(area);

    f.render_widget(Paragraph::new(Text::from(header.to_vec())), top);
    let overflow = line_count(body).saturating_sub(rest.height);
    f.render_widget(
        Paragraph::new(Text::from(body.to_vec())).scroll((overflow, 0)),
        rest,
    );
}

/// Summary for the normal screen: blank separator, coloured symbol, bold name, cyan id.
pub fn write_styled_summary(out: &mut impl Write, summary: &Summary) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{} {} {} completed with '{}'",
        summary.symbol.with(summary.tone.term_color()),
        summary.name.as_str().bold(),
        format!("({})", summary.id).cyan(),
        summary.conclusion
    )?;
    out.flush()
}

impl Drop for AltScreen {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

/// Appends every frame as plain text. Used when stdout is not a terminal and in tests.
pub struct PlainScreen<W: Write> {
    out: W,
    tty: bool,
}

impl<W: Write> PlainScreen<W> {
    pub fn new(out: W) -> Self {
        Self { out, tty: false }
    }

    /// Behave as if attached to a terminal, so the summary line is written too.
    pub fn with_terminal(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Screen for PlainScreen<W> {
    fn enter(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn present(&mut self, header: &[Line<'static>], body: &[Line<'static>]) -> io::Result<()> {
        self.out.write_all(render::plain_text(header).as_bytes())?;
        self.out.write_all(render::plain_text(body).as_bytes())?;
        self.out.flush()
    }

    fn leave(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        self.tty
    }

    fn print_summary(&mut self, summary: &Summary) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", summary.plain())?;
        self.out.flush()
    }
}

/// Alternate screen on a tty, plain text otherwise.
pub fn stdout_screen() -> io::Result<Box<dyn Screen>> {
    if io::stdout().is_terminal() {
        Ok(Box::new(AltScreen::new()?))
    } else {
        Ok(Box::new(PlainScreen::new(io::stdout())))
    }
}
