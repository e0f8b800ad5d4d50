use std::env;
use std::path::Path;

/// Process-wide, read-only facts shared by the driver and the executor.
#[derive(Debug, Clone)]
pub struct ExecContext {
    pgm_name: String,
}

impl ExecContext {
    pub fn new(pgm_name: impl Into<String>) -> Self {
        Self {
            pgm_name: pgm_name.into(),
        }
    }

    /// Uses `argv[0]` as the diagnostic prefix, falling back to the crate
    /// name when the process was started without one.
    pub fn from_args() -> Self {
        let pgm_name = env::args()
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
        Self::new(pgm_name)
    }

    pub fn pgm_name(&self) -> &str {
        &self.pgm_name
    }

    pub fn short_name(&self) -> &str {
        Path::new(&self.pgm_name)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.pgm_name)
    }

    pub fn diagnostic(&self, message: impl std::fmt::Display) -> String {
        format!("{}: {}", self.pgm_name, message)
    }
}
