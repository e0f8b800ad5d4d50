use std::ffi::CString;
use std::fmt;

use crate::shell::error::ShellError;

/// One parsed command line: a program, its arguments and where its standard
/// streams should point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    arguments: Vec<String>,
    stdin: Option<String>,
    stdout: Option<String>,
}

impl Command {
    pub fn new(
        name: String,
        arguments: Vec<String>,
        stdin: Option<String>,
        stdout: Option<String>,
    ) -> Self {
        debug_assert!(!name.is_empty());
        Self {
            name,
            arguments,
            stdin,
            stdout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn arg_count(&self) -> usize {
        self.arguments.len()
    }

    pub fn stdin_path(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    pub fn stdout_path(&self) -> Option<&str> {
        self.stdout.as_deref()
    }

    /// Builds the argument vector handed to `execvp`: the name first, then
    /// the arguments in order. `execvp` appends the terminating null pointer.
    pub fn argv(&self) -> Result<Vec<CString>, ShellError> {
        let mut argv = Vec::new();
        argv.try_reserve_exact(self.arguments.len() + 1)?;
        argv.push(CString::new(self.name.as_str())?);
        for arg in &self.arguments {
            argv.push(CString::new(arg.as_str())?);
        }
        Ok(argv)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Command name: {}", self.name)?;
        for arg in &self.arguments {
            writeln!(f, "Command arg: {}", arg)?;
        }
        if let Some(stdin) = &self.stdin {
            writeln!(f, "Command stdin: {}", stdin)?;
        }
        if let Some(stdout) = &self.stdout {
            writeln!(f, "Command stdout: {}", stdout)?;
        }
        Ok(())
    }
}
