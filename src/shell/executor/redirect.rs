use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};

use nix::unistd::dup2;

use crate::shell::parser::ast::Command;

const STDOUT_MODE: u32 = 0o600;

#[derive(Debug)]
pub struct RedirectError {
    pub path: String,
    pub source: io::Error,
}

impl std::fmt::Display for RedirectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.source)
    }
}

/// Points the calling process's stdin/stdout at the command's files.
/// Only ever called in a forked child.
pub fn apply(command: &Command) -> Result<(), RedirectError> {
    if let Some(path) = command.stdin_path() {
        let file = File::open(path).map_err(|source| RedirectError {
            path: path.to_string(),
            source,
        })?;
        replace_stream(file, libc::STDIN_FILENO).map_err(|source| RedirectError {
            path: path.to_string(),
            source,
        })?;
    }

    if let Some(path) = command.stdout_path() {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(STDOUT_MODE)
            .open(path)
            .map_err(|source| RedirectError {
                path: path.to_string(),
                source,
            })?;
        replace_stream(file, libc::STDOUT_FILENO).map_err(|source| RedirectError {
            path: path.to_string(),
            source,
        })?;
    }

    Ok(())
}

/// Duplicates `file` onto `target`. The temporary descriptor is closed when
/// `file` drops, on success and on failure alike.
fn replace_stream(file: File, target: RawFd) -> io::Result<()> {
    if file.as_raw_fd() == target {
        // The standard descriptor was closed, so open() reused its number.
        let _ = file.into_raw_fd();
        return Ok(());
    }
    dup2(file.as_raw_fd(), target).map_err(io::Error::from)?;
    Ok(())
}
