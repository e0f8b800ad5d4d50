use std::ffi::CString;
use std::io::{self, Write};

use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{execvp, fork, ForkResult, Pid};

use super::builtin::Builtin;
use super::redirect;
use crate::shell::context::ExecContext;
use crate::shell::error::ShellError;
use crate::shell::parser::ast::Command;
use crate::shell::signals::{self, SignalController, SignalState};

/// What the driver should do after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

pub struct Executor {
    context: ExecContext,
    signals: SignalController,
    last_status: Option<WaitStatus>,
}

impl Executor {
    pub fn new(context: ExecContext, signals: SignalController) -> Self {
        Self {
            context,
            signals,
            last_status: None,
        }
    }

    pub fn context(&self) -> &ExecContext {
        &self.context
    }

    /// Status of the most recent external command.
    pub fn last_status(&self) -> Option<WaitStatus> {
        self.last_status
    }

    /// Runs one command and consumes it.
    pub fn execute(&mut self, command: Command) -> Result<Flow, ShellError> {
        match Builtin::from_name(command.name()) {
            Some(Builtin::Exit) => {
                debug!("Running builtin: exit");
                self.signals.shut_down();
                Ok(Flow::Exit(0))
            }
            Some(builtin) => {
                debug!("Running builtin: {:?}", command);
                self.signals
                    .scoped(SignalState::RunningBuiltin, || builtin.run(&command))?
            }
            None => {
                debug!("Running external command: {} ({} arguments)", command.name(), command.arg_count());
                self.execute_external(&command)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn execute_external(&mut self, command: &Command) -> Result<(), ShellError> {
        let argv = command.argv()?;

        io::stdout().flush()?;
        io::stderr().flush()?;

        let status = self.signals.scoped(SignalState::AwaitingChild, || {
            spawn_and_wait(&self.context, command, &argv)
        })??;

        match status {
            WaitStatus::Exited(pid, code) => debug!("Child {} exited with status {}", pid, code),
            WaitStatus::Signaled(pid, sig, _) => warn!("Child {} killed by signal {}", pid, sig),
            other => debug!("Child status: {:?}", other),
        }
        self.last_status = Some(status);
        Ok(())
    }
}

fn spawn_and_wait(
    context: &ExecContext,
    command: &Command,
    argv: &[CString],
) -> Result<WaitStatus, ShellError> {
    // SAFETY: the child only resets signals, redirects and execs or exits.
    match unsafe { fork() }? {
        ForkResult::Child => run_child(context, command, argv),
        ForkResult::Parent { child } => wait_for(child),
    }
}

fn run_child(context: &ExecContext, command: &Command, argv: &[CString]) -> ! {
    if let Err(e) = signals::reset_for_child() {
        eprintln!("{}: {}", context.pgm_name(), e.desc());
        child_exit();
    }

    if let Err(e) = redirect::apply(command) {
        eprintln!("{}: {}", context.pgm_name(), e);
        child_exit();
    }

    let err = match argv.first() {
        Some(program) => match execvp(program, argv) {
            Ok(never) => match never {},
            Err(e) => e,
        },
        None => Errno::ENOENT,
    };
    eprintln!("{}: {}: {}", context.pgm_name(), command.name(), err.desc());
    child_exit()
}

fn child_exit() -> ! {
    // SAFETY: _exit skips atexit handlers and the buffers copied from the parent.
    unsafe { libc::_exit(libc::EXIT_FAILURE) }
}

fn wait_for(child: Pid) -> Result<WaitStatus, ShellError> {
    loop {
        match waitpid(child, None) {
            Ok(status) => return Ok(status),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::sync::Mutex;

    // Environment, working directory and children are process-wide.
    static PROCESS_LOCK: Mutex<()> = Mutex::new(());

    fn executor() -> Executor {
        Executor::new(ExecContext::new("ish"), SignalController::detached())
    }

    fn command(name: &str, args: &[&str], stdin: Option<&str>, stdout: Option<&str>) -> Command {
        Command::new(
            name.to_string(),
            args.iter().map(|s| s.to_string()).collect(),
            stdin.map(str::to_string),
            stdout.map(str::to_string),
        )
    }

    fn scratch(name: &str) -> PathBuf {
        env::temp_dir().join(format!("ish-{}-{}", name, std::process::id()))
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_setenv_and_unsetenv() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut executor = executor();

        let flow = executor
            .execute(command("setenv", &["ISH_TEST_VAR"], None, None))
            .unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(env::var("ISH_TEST_VAR").unwrap(), "");

        executor
            .execute(command("setenv", &["ISH_TEST_VAR", "value"], None, None))
            .unwrap();
        assert_eq!(env::var("ISH_TEST_VAR").unwrap(), "value");

        executor
            .execute(command("unsetenv", &["ISH_TEST_VAR"], None, None))
            .unwrap();
        assert!(env::var_os("ISH_TEST_VAR").is_none());
    }

    #[test]
    fn test_setenv_without_variable() {
        let mut executor = executor();
        let result = executor.execute(command("setenv", &[], None, None));
        assert!(matches!(result, Err(ShellError::MissingVariable)));
        assert_eq!(executor.signals.state(), SignalState::Idle);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_cd_defaults_to_home() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let original_dir = env::current_dir().unwrap();
        let original_home = env::var_os("HOME");
        let home = scratch("home");
        fs::create_dir_all(&home).unwrap();
        let expected = home.canonicalize().unwrap();

        env::set_var("HOME", &home);
        let result = executor().execute(command("cd", &[], None, None));
        let now = env::current_dir().unwrap();

        env::set_current_dir(&original_dir).unwrap();
        match original_home {
            Some(value) => env::set_var("HOME", value),
            None => env::remove_var("HOME"),
        }
        fs::remove_dir_all(&home).unwrap();

        assert_eq!(result.unwrap(), Flow::Continue);
        assert_eq!(now, expected);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_cd_rejects_extra_arguments() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let before = env::current_dir().unwrap();
        let result = executor().execute(command("cd", &["/", "/tmp"], None, None));
        assert!(matches!(result, Err(ShellError::TooManyArguments)));
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_cd_to_missing_directory() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let result = executor().execute(command("cd", &["/nonexistent/ish"], None, None));
        let err = result.unwrap_err();
        assert!(matches!(err, ShellError::ChangeDir(..)));
        assert!(!err.is_fatal());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_exit_ignores_arguments_and_redirection() {
        let mut executor = executor();
        let flow = executor
            .execute(command("exit", &["now"], Some("/nonexistent/ish/input"), None))
            .unwrap();
        assert_eq!(flow, Flow::Exit(0));
        assert!(executor.last_status().is_none());
        assert_eq!(executor.signals.state(), SignalState::RunningBuiltin);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_stdout_redirection() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let out = scratch("echo-out");
        let mut executor = executor();

        let flow = executor
            .execute(command("echo", &["hello", "world"], None, out.to_str()))
            .unwrap();
        assert_eq!(flow, Flow::Continue);
        assert!(matches!(
            executor.last_status(),
            Some(WaitStatus::Exited(_, 0))
        ));

        assert_eq!(fs::read_to_string(&out).unwrap(), "hello world\n");
        let mode = fs::metadata(&out).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        fs::remove_file(&out).unwrap();
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_stdout_redirection_truncates() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let out = scratch("truncate-out");
        fs::write(&out, "a much longer line that must disappear\n").unwrap();

        executor()
            .execute(command("echo", &["short"], None, out.to_str()))
            .unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "short\n");
        fs::remove_file(&out).unwrap();
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_stdin_and_stdout_redirection() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let input = scratch("cat-in");
        let out = scratch("cat-out");
        fs::write(&input, "first\nsecond\n").unwrap();

        executor()
            .execute(command("cat", &[], input.to_str(), out.to_str()))
            .unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "first\nsecond\n");

        fs::remove_file(&input).unwrap();
        fs::remove_file(&out).unwrap();
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_unknown_program_fails_only_the_child() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut executor = executor();
        let flow = executor
            .execute(command("ish-no-such-program", &["x"], None, None))
            .unwrap();
        assert_eq!(flow, Flow::Continue);
        assert!(matches!(
            executor.last_status(),
            Some(WaitStatus::Exited(_, 1))
        ));
        assert_eq!(executor.signals.state(), SignalState::Idle);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_missing_input_file_fails_only_the_child() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let out = scratch("never-written");
        let mut executor = executor();
        executor
            .execute(command(
                "cat",
                &[],
                Some("/nonexistent/ish/input"),
                out.to_str(),
            ))
            .unwrap();
        assert!(matches!(
            executor.last_status(),
            Some(WaitStatus::Exited(_, 1))
        ));
        assert!(!out.exists());
    }
}
