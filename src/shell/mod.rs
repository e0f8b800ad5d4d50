mod context;
mod error;
mod executor;
mod parser;
mod readline;
#[allow(clippy::module_inception)]
mod shell;
pub mod signals;

pub use context::ExecContext;
pub use shell::{Mode, Shell};
