//! Operator interaction for generation decisions.

use std::io::{self, BufRead, Write};

/// Interactive questions asked while resolving relationships.
pub trait Prompt {
    fn confirm(&mut self, question: &str, default: bool) -> io::Result<bool>;

    fn prompt_text(&mut self, label: &str, default: &str) -> io::Result<String>;

    fn notice(&mut self, message: &str);
}

/// Line-based prompt over any reader/writer pair.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stderr> {
    /// Reads stdin and writes questions to stderr, keeping stdout for results.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_answer(&mut self) -> io::Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for an answer",
            ));
        }
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Prompt for TerminalPrompt<R, W> {
    fn confirm(&mut self, question: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            write!(self.output, "{question} {hint} ")?;
            self.output.flush()?;

            let answer = self.read_answer()?.to_ascii_lowercase();
            match answer.as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please answer yes or no.")?,
            }
        }
    }

    fn prompt_text(&mut self, label: &str, default: &str) -> io::Result<String> {
        write!(self.output, "{label} [{default}]: ")?;
        self.output.flush()?;

        let answer = self.read_answer()?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    fn notice(&mut self, message: &str) {
        let _ = writeln!(self.output, "{message}");
    }
}
