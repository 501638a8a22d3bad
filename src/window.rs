use {
    crate::{
        dashboard::Theme,
        meter::{self, Canvas},
        widget::{Surface, WidgetTree},
    },
    crossterm::{
        ExecutableCommand, QueueableCommand, cursor,
        style::{self, Color, Stylize},
        terminal,
    },
    std::io::{self, Write},
};

/// the terminal, taken over for the lifetime of the window.
///
/// the terminal is restored when this is dropped.
pub struct Window {
    out: io::Stdout,
    /// the terminal size at the last draw.
    size: (u16, u16),
}

// === impl Window ===

impl Window {
    /// switches the terminal to raw mode and the alternate screen.
    pub fn open() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        out.execute(terminal::EnterAlternateScreen)?
            .execute(cursor::Hide)?;
        let size = terminal::size()?;

        Ok(Self { out, size })
    }

    fn flush(&mut self, canvas: &Canvas) -> io::Result<()> {
        let Self { out, .. } = self;

        for y in 0..canvas.height() {
            out.queue(cursor::MoveTo(0, y))?;

            // print runs of one color, rather than one cell at a time.
            let mut run = String::new();
            let mut run_color = None;
            for cell in canvas.row(y) {
                if cell.color != run_color && !run.is_empty() {
                    Self::print(out, &run, run_color)?;
                    run.clear();
                }
                run_color = cell.color;
                run.push(cell.ch);
            }
            Self::print(out, &run, run_color)?;
        }

        out.queue(style::ResetColor)?;
        out.flush()
    }

    fn print(out: &mut io::Stdout, text: &str, theme: Option<Theme>) -> io::Result<()> {
        match theme {
            Some(theme) => out.queue(style::PrintStyledContent(text.with(color(theme)))),
            None => out.queue(style::Print(text)),
        }
        .map(drop)
    }
}

impl Surface for Window {
    /// clears the screen.
    fn clear(&mut self) -> io::Result<()> {
        self.out
            .execute(terminal::Clear(terminal::ClearType::All))
            .map(drop)
    }

    fn draw(&mut self, tree: &WidgetTree) -> io::Result<()> {
        let size = terminal::size()?;
        if size != self.size {
            log::debug!("terminal resized to {size:?}");
            self.size = size;
            self.clear()?;
        }

        let (cols, rows) = size;
        let mut canvas = Canvas::new(cols, rows);
        meter::paint(tree, &mut canvas);
        self.flush(&canvas)
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        let Self { out, .. } = self;

        let restored = out
            .execute(style::ResetColor)
            .and_then(|out| out.execute(cursor::Show))
            .and_then(|out| out.execute(terminal::LeaveAlternateScreen))
            .map(drop)
            .and_then(|()| terminal::disable_raw_mode());
        if let Err(error) = restored {
            log::error!("failed to restore the terminal: {error}");
        }
    }
}

/// the terminal color of a theme.
fn color(theme: Theme) -> Color {
    match theme.get() {
        1 => Color::Red,
        2 => Color::Green,
        3 => Color::Yellow,
        4 => Color::Blue,
        5 => Color::Magenta,
        6 => Color::Cyan,
        7 => Color::White,
        _ => Color::Grey,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_theme_has_a_distinct_color() {
        let colors = (Theme::MIN..=Theme::MAX)
            .filter_map(Theme::new)
            .map(color)
            .collect::<Vec<_>>();
        assert_eq!(colors.len(), 8);
        for (i, a) in colors.iter().enumerate() {
            assert!(!colors[i + 1..].contains(a), "{a:?} is repeated");
        }
        assert_eq!(color(Theme::default()), Color::Green);
    }
}
