use std::collections::TryReserveError;
use std::ffi::NulError;
use std::{error, fmt, io};

use super::parser::lexer::RedirectOp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    UnmatchedQuote,
    InvalidUtf8,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnmatchedQuote => write!(f, "unmatched quote"),
            LexError::InvalidUtf8 => write!(f, "invalid UTF-8"),
        }
    }
}

impl error::Error for LexError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    MissingCommandName,
    MultipleRedirection(RedirectOp),
    MissingFileName(RedirectOp),
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::MissingCommandName => write!(f, "missing command name"),
            SyntaxError::MultipleRedirection(op) => {
                write!(f, "multiple redirection of {}", op.stream_name())
            }
            SyntaxError::MissingFileName(op) => {
                write!(f, "{} redirection without file name", op.stream_name())
            }
        }
    }
}

impl error::Error for SyntaxError {}

/// Everything that can go wrong between reading a line and finishing its
/// command.
#[derive(Debug)]
pub enum ShellError {
    Lex(LexError),
    Syntax(SyntaxError),
    MissingVariable,
    InvalidVariable(String),
    TooManyArguments,
    HomeNotSet,
    ChangeDir(String, io::Error),
    InvalidArgument(NulError),
    Alloc(TryReserveError),
    Sys(nix::Error),
    Io(io::Error),
}

impl ShellError {
    /// Fatal errors end the shell; the rest are reported and the loop goes on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ShellError::Alloc(_) | ShellError::Sys(_) | ShellError::Io(_)
        )
    }
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::Lex(e) => write!(f, "{}", e),
            ShellError::Syntax(e) => write!(f, "{}", e),
            ShellError::MissingVariable => write!(f, "missing variable"),
            ShellError::InvalidVariable(name) => write!(f, "{}: invalid variable", name),
            ShellError::TooManyArguments => write!(f, "too many arguments"),
            ShellError::HomeNotSet => write!(f, "HOME is not set."),
            ShellError::ChangeDir(path, e) => write!(f, "{}: {}", path, e),
            ShellError::InvalidArgument(e) => write!(f, "invalid argument: {}", e),
            ShellError::Alloc(e) => write!(f, "{}", e),
            ShellError::Sys(e) => write!(f, "{}", e.desc()),
            ShellError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl error::Error for ShellError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ShellError::Lex(e) => Some(e),
            ShellError::Syntax(e) => Some(e),
            ShellError::ChangeDir(_, e) => Some(e),
            ShellError::InvalidArgument(e) => Some(e),
            ShellError::Alloc(e) => Some(e),
            ShellError::Sys(e) => Some(e),
            ShellError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LexError> for ShellError {
    fn from(e: LexError) -> Self {
        ShellError::Lex(e)
    }
}

impl From<SyntaxError> for ShellError {
    fn from(e: SyntaxError) -> Self {
        ShellError::Syntax(e)
    }
}

impl From<NulError> for ShellError {
    fn from(e: NulError) -> Self {
        ShellError::InvalidArgument(e)
    }
}

impl From<TryReserveError> for ShellError {
    fn from(e: TryReserveError) -> Self {
        ShellError::Alloc(e)
    }
}

impl From<nix::Error> for ShellError {
    fn from(e: nix::Error) -> Self {
        ShellError::Sys(e)
    }
}

impl From<io::Error> for ShellError {
    fn from(e: io::Error) -> Self {
        ShellError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_messages() {
        assert_eq!(
            SyntaxError::MultipleRedirection(RedirectOp::Input).to_string(),
            "multiple redirection of standard input"
        );
        assert_eq!(
            SyntaxError::MissingFileName(RedirectOp::Output).to_string(),
            "standard output redirection without file name"
        );
    }

    #[test]
    fn test_fatal_policy() {
        assert!(ShellError::Sys(nix::Error::ECHILD).is_fatal());
        assert!(ShellError::Io(io::Error::from(io::ErrorKind::BrokenPipe)).is_fatal());
        assert!(!ShellError::MissingVariable.is_fatal());
        assert!(!ShellError::Syntax(SyntaxError::MissingCommandName).is_fatal());
        assert!(!ShellError::Lex(LexError::InvalidUtf8).is_fatal());
    }
}
