use std::io::{self, BufRead, Write};

use log::{debug, error, warn};
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;
use rustyline::{CompletionType, Config as RLConfig};

use crate::shell::error::ShellError;
use crate::utils::config::Config;

#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// A line that is not valid UTF-8, decoded lossily for the echo.
    Undecodable(String),
    Interrupted,
    Eof,
}

/// Where the driver gets its lines from.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome, ShellError>;

    fn add_history(&mut self, _line: &str) {}

    fn save_history(&mut self) {}
}

/// Line editor for a terminal, with persistent history.
pub struct ReadlineManager<'a> {
    config: &'a Config,
    editor: Editor<(), FileHistory>,
}

impl<'a> ReadlineManager<'a> {
    pub fn new(config: &'a Config) -> Result<Self, ShellError> {
        let rl_config = RLConfig::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(config.get_edit_mode())
            .build();

        let editor = Editor::with_config(rl_config).map_err(|err| {
            error!("Failed to initialize readline: {}", err);
            readline_to_shell_error(err)
        })?;
        let mut manager = Self { config, editor };
        manager.load_history();
        Ok(manager)
    }

    fn load_history(&mut self) {
        if let Err(err) = self.editor.load_history(&self.config.history_file) {
            warn!(
                "Failed to load history: {} {}",
                self.config.history_file.display(),
                err
            );
        } else {
            debug!("History loaded");
        }
    }
}

impl LineSource for ReadlineManager<'_> {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome, ShellError> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(ReadlineError::Io(ref e)) if e.kind() == io::ErrorKind::InvalidData => Ok(ReadOutcome::Undecodable(String::new())),
            Err(err) => Err(readline_to_shell_error(err)),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(err) = self.editor.add_history_entry(line) {
            warn!("Failed to add history entry: {}", err);
        }
    }

    fn save_history(&mut self) {
        if let Err(err) = self.editor.save_history(&self.config.history_file) {
            error!("Failed to save history: {}", err);
        } else {
            debug!("History saved");
        }
    }
}

fn readline_to_shell_error(err: ReadlineError) -> ShellError {
    match err {
        ReadlineError::Io(e) => ShellError::Io(e),
        other => ShellError::Io(io::Error::new(io::ErrorKind::Other, other.to_string())),
    }
}

/// Plain reader for piped or redirected input: writes the prompt itself and
/// reads whole lines.
pub struct StreamReader<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> StreamReader<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }
}

impl<R: BufRead, W: Write> LineSource for StreamReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome, ShellError> {
        self.prompt_out.write_all(prompt.as_bytes())?;
        self.prompt_out.flush()?;

        let mut bytes = Vec::new();
        if self.input.read_until(b'\n', &mut bytes)? == 0 {
            return Ok(ReadOutcome::Eof);
        }
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        match String::from_utf8(bytes) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(e) => Ok(ReadOutcome::Undecodable(
                String::from_utf8_lossy(e.as_bytes()).into_owned(),
            )),
        }
    }
}
