//! Incremental terminal output.

use std::io::{self, Write};

/// Writes the growing revealed text without repeating what is already on
/// screen.
#[derive(Debug)]
pub struct StreamPrinter<W: Write> {
    out: W,
    printed: usize,
}

impl<W: Write> StreamPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out, printed: 0 }
    }

    /// Prints the part of `full_content` not printed yet.
    ///
    /// Text that no longer extends what was printed (a new run) is printed
    /// from the start on a fresh line.
    pub fn update(&mut self, full_content: &str) -> io::Result<()> {
        let extends = full_content.len() >= self.printed
            && full_content.is_char_boundary(self.printed);
        if !extends {
            writeln!(self.out)?;
            self.printed = 0;
        }
        let fresh = &full_content[self.printed..];
        if fresh.is_empty() {
            return Ok(());
        }
        self.out.write_all(fresh.as_bytes())?;
        self.out.flush()?;
        self.printed = full_content.len();
        Ok(())
    }

    /// Ends the output with a newline if anything was printed.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.printed > 0 {
            writeln!(self.out)?;
            self.out.flush()?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
