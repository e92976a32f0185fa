//! Operator interaction: line prompts and inline image previews.
//!
//! The ingest and rename workflows only talk to the terminal through
//! [`Prompt`] and [`Preview`], so tests can drive them with scripted input.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Asks the operator a question and reads one line back.
pub trait Prompt {
    /// Returns the answer without its line terminator, or `None` at end of input.
    fn ask(&mut self, question: &str) -> io::Result<Option<String>>;
}

/// [`Prompt`] over any buffered reader and writer; stdin/stdout in the CLI.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

/// The prompt the binary uses.
pub type StdinPrompt = LinePrompt<io::StdinLock<'static>, io::Stdout>;

impl StdinPrompt {
    pub fn stdin() -> Self {
        LinePrompt::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Shows an image to the operator before they answer a prompt.
pub trait Preview {
    fn show(&mut self, path: &Path) -> io::Result<()>;
}

/// iTerm2 inline image protocol.
///
/// Terminals that do not speak it print nothing visible.
pub struct ITermPreview<W> {
    output: W,
}

impl ITermPreview<io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            output: io::stdout(),
        }
    }
}

impl<W: Write> ITermPreview<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}

/// Build the `OSC 1337 ; File=...` escape sequence for raw image bytes.
pub fn iterm_inline_image(bytes: &[u8]) -> String {
    format!(
        "\x1b]1337;File=inline=1;width=auto;height=auto;preserveAspectRatio=1:{}\x07",
        STANDARD.encode(bytes)
    )
}

impl<W: Write> Preview for ITermPreview<W> {
    fn show(&mut self, path: &Path) -> io::Result<()> {
        let bytes = std::fs::read(path)?;
        writeln!(self.output, "{}", iterm_inline_image(&bytes))?;
        self.output.flush()
    }
}

/// A preview that shows nothing.
pub struct NoPreview;

impl Preview for NoPreview {
    fn show(&mut self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}
