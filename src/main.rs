use argh::FromArgs;
use log::debug;
use std::process;

use crate::shell::{ExecContext, Mode, Shell};
use crate::utils::config::Config;
use crate::utils::log::init_logger;

mod shell;
mod utils;

#[derive(FromArgs)]
/// A small interactive shell with built-ins and I/O redirection.
struct Cli {
    /// print each parsed command instead of running it
    #[argh(switch)]
    syntax_only: bool,
}

fn main() {
    let cli: Cli = argh::from_env();
    let config = Config::new();
    init_logger(&config);
    debug!("Configuration loaded, history at {}", config.history_file.display());

    let context = ExecContext::from_args();
    let mode = if cli.syntax_only {
        Mode::SyntaxOnly
    } else {
        Mode::Execute
    };

    let code = match Shell::new(&config, context.clone(), mode).and_then(|mut shell| shell.run()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", context.diagnostic(&e));
            1
        }
    };
    process::exit(code);
}
