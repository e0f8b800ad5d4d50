use log::{debug, error, info, warn};
use std::io::{self, IsTerminal, Write};

use crate::shell::context::ExecContext;
use crate::shell::error::{LexError, ShellError};
use crate::shell::executor::{Executor, Flow};
use crate::shell::parser::{tokenize, Parser};
use crate::shell::readline::{LineSource, ReadOutcome, ReadlineManager, StreamReader};
use crate::shell::signals::{self, SignalController};
use crate::utils::config::Config;
use crate::utils::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Execute,
    /// Print each parsed command instead of running it.
    SyntaxOnly,
}

pub struct Shell<'a> {
    config: &'a Config,
    theme: Theme,
    executor: Executor,
    mode: Mode,
    interactive: bool,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config, context: ExecContext, mode: Mode) -> Result<Self, ShellError> {
        let interactive = io::stdin().is_terminal();
        let signals = SignalController::install(config.reminder_secs)?;
        Ok(Self {
            config,
            theme: Theme::for_terminal(interactive),
            executor: Executor::new(context, signals),
            mode,
            interactive,
        })
    }

    #[cfg(test)]
    fn with_executor(config: &'a Config, executor: Executor, mode: Mode) -> Self {
        Self {
            config,
            theme: Theme::plain(),
            executor,
            mode,
            interactive: false,
        }
    }

    /// Returns the process exit status.
    pub fn run(&mut self) -> Result<i32, ShellError> {
        debug!("Starting {}...", self.executor.context().short_name());

        let code = if self.interactive {
            let mut source = ReadlineManager::new(self.config)?;
            let result = self.run_loop(&mut source, &mut io::stdout());
            source.save_history();
            result?
        } else {
            let mut source = StreamReader::new(io::stdin().lock(), io::stdout());
            self.run_loop(&mut source, &mut io::stdout())?
        };

        debug!("Leaving {}, status {}", self.executor.context().short_name(), code);
        Ok(code)
    }

    fn run_loop<S, W>(&mut self, source: &mut S, out: &mut W) -> Result<i32, ShellError>
    where
        S: LineSource + ?Sized,
        W: Write,
    {
        let prompt = self.theme.prompt.clone();
        loop {
            match source.read_line(&prompt)? {
                ReadOutcome::Line(line) => {
                    writeln!(out, "{}", line)?;
                    out.flush()?;

                    if !line.trim().is_empty() {
                        source.add_history(&line);
                    }
                    match self.handle_input(&line, out) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Exit(code)) => {
                            info!("exit command, leaving");
                            return Ok(code);
                        }
                        Err(e) if e.is_fatal() => {
                            error!("Fatal error: {}", e);
                            return Err(e);
                        }
                        Err(e) => self.report(&e),
                    }
                }
                ReadOutcome::Undecodable(line) => {
                    writeln!(out, "{}", line)?;
                    out.flush()?;
                    warn!("Discarding a line that is not valid UTF-8");
                    self.report(&ShellError::Lex(LexError::InvalidUtf8));
                }
                ReadOutcome::Interrupted => {
                    warn!("Received interrupt...");
                    signals::idle_interrupt();
                }
                ReadOutcome::Eof => {
                    debug!("Received EOF");
                    writeln!(out)?;
                    out.flush()?;
                    return Ok(0);
                }
            }
        }
    }

    fn handle_input<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow, ShellError> {
        let tokens = tokenize(line)?;
        if tokens.is_empty() {
            return Ok(Flow::Continue);
        }

        let command = Parser::new(tokens).parse_command()?;
        match self.mode {
            Mode::Execute => self.executor.execute(command),
            Mode::SyntaxOnly => {
                write!(out, "{}", command)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn report(&self, err: &ShellError) {
        debug!("Command failed: {:?}", err);
        let message = self.executor.context().diagnostic(err);
        eprintln!("{}", (self.theme.error_style)(message));
    }
}
