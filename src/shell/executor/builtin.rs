use std::env;

use log::debug;

use super::executor::Flow;
use crate::shell::error::ShellError;
use crate::shell::parser::ast::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    Setenv,
    Unsetenv,
    Cd,
}

impl Builtin {
    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "exit" => Some(Builtin::Exit),
            "setenv" => Some(Builtin::Setenv),
            "unsetenv" => Some(Builtin::Unsetenv),
            "cd" => Some(Builtin::Cd),
            _ => None,
        }
    }

    pub fn run(self, command: &Command) -> Result<Flow, ShellError> {
        if command.stdin_path().is_some() || command.stdout_path().is_some() {
            debug!("Builtin ignores redirection: {}", command.name());
        }

        match self {
            Builtin::Exit => return Ok(Flow::Exit(0)),
            Builtin::Setenv => builtin_setenv(command.arguments())?,
            Builtin::Unsetenv => builtin_unsetenv(command.arguments())?,
            Builtin::Cd => builtin_cd(command.arguments())?,
        }
        Ok(Flow::Continue)
    }
}

// std::env panics on these instead of returning an error.
fn check_variable(name: &str) -> Result<(), ShellError> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(ShellError::InvalidVariable(name.to_string()));
    }
    Ok(())
}

fn builtin_setenv(args: &[String]) -> Result<(), ShellError> {
    let (name, value) = match args {
        [name] => (name, ""),
        [name, value] => (name, value.as_str()),
        _ => return Err(ShellError::MissingVariable),
    };
    check_variable(name)?;
    if value.contains('\0') {
        return Err(ShellError::InvalidVariable(name.clone()));
    }

    debug!("Setting variable: {}={}", name, value);
    env::set_var(name, value);
    Ok(())
}

fn builtin_unsetenv(args: &[String]) -> Result<(), ShellError> {
    let [name] = args else {
        return Err(ShellError::MissingVariable);
    };
    check_variable(name)?;

    debug!("Removing variable: {}", name);
    env::remove_var(name);
    Ok(())
}

fn builtin_cd(args: &[String]) -> Result<(), ShellError> {
    let path = match args {
        [] => env::var("HOME").map_err(|_| ShellError::HomeNotSet)?,
        [path] => path.clone(),
        _ => return Err(ShellError::TooManyArguments),
    };

    debug!("Changing directory: {}", path);
    env::set_current_dir(&path).map_err(|e| ShellError::ChangeDir(path, e))
}
