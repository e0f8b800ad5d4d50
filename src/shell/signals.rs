//! Interactive signal handling.
//!
//! The shell moves between three states. Each state decides what SIGINT
//! does while the shell sits in it:
//!
//! * `Idle` - waiting for input; SIGINT runs the idle reminder handler.
//! * `RunningBuiltin` - a built-in is mutating shell state; SIGINT is ignored.
//! * `AwaitingChild` - a child is running; SIGINT is ignored here and the
//!   child puts it back to the default action before exec.
//!
//! SIGALRM only marks the end of the reminder window and is handled quietly
//! in every state.

use std::sync::atomic::{AtomicU32, Ordering};

use log::{debug, error};
use nix::sys::signal::{
    sigaction, sigprocmask, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal,
};
use nix::unistd::alarm;

const REMINDER: &[u8] = b"To exit the shell, issue an 'exit' command\n";

pub const DEFAULT_REMINDER_SECS: u32 = 5;

static REMINDER_SECS: AtomicU32 = AtomicU32::new(DEFAULT_REMINDER_SECS);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    Idle,
    RunningBuiltin,
    AwaitingChild,
}

impl SignalState {
    fn interrupt_handler(self) -> SigHandler {
        match self {
            SignalState::Idle => SigHandler::Handler(handle_idle_interrupt),
            SignalState::RunningBuiltin | SignalState::AwaitingChild => SigHandler::SigIgn,
        }
    }
}

pub struct SignalController {
    state: SignalState,
    installed: bool,
}

impl SignalController {
    /// Takes over SIGINT and SIGALRM for the whole process and enters `Idle`.
    pub fn install(reminder_secs: u32) -> nix::Result<Self> {
        REMINDER_SECS.store(reminder_secs.max(1), Ordering::Relaxed);

        let mut mask = SigSet::empty();
        mask.add(Signal::SIGINT);
        mask.add(Signal::SIGALRM);
        sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&mask), None)?;

        set_handler(Signal::SIGALRM, SigHandler::Handler(handle_alarm))?;

        let mut controller = Self {
            state: SignalState::RunningBuiltin,
            installed: true,
        };
        controller.transition(SignalState::Idle)?;
        debug!("Signal handling installed, reminder window {}s", reminder_secs);
        Ok(controller)
    }

    /// Tracks state transitions without touching process dispositions.
    pub fn detached() -> Self {
        Self {
            state: SignalState::Idle,
            installed: false,
        }
    }

    pub fn state(&self) -> SignalState {
        self.state
    }

    fn transition(&mut self, next: SignalState) -> nix::Result<()> {
        if self.state == next {
            return Ok(());
        }
        if self.installed {
            set_handler(Signal::SIGINT, next.interrupt_handler())?;
        }
        debug!("Signal state {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Runs `f` in `phase`, then returns to `Idle` whatever `f` returned.
    pub fn scoped<T>(&mut self, phase: SignalState, f: impl FnOnce() -> T) -> nix::Result<T> {
        self.transition(phase)?;
        let result = f();
        self.transition(SignalState::Idle)?;
        Ok(result)
    }

    /// Leaves `Idle` for good; used right before the shell exits.
    pub fn shut_down(&mut self) {
        if let Err(e) = self.transition(SignalState::RunningBuiltin) {
            error!("Failed to ignore SIGINT: {}", e);
        }
    }
}

fn set_handler(signal: Signal, handler: SigHandler) -> nix::Result<()> {
    let action = SigAction::new(handler, SaFlags::SA_RESTART, SigSet::empty());
    // SAFETY: the handlers below only call async-signal-safe functions.
    unsafe { sigaction(signal, &action) }?;
    Ok(())
}

/// Runs in a freshly forked child: default SIGINT, nothing blocked.
pub fn reset_for_child() -> nix::Result<()> {
    set_handler(Signal::SIGINT, SigHandler::SigDfl)?;
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGINT);
    mask.add(Signal::SIGALRM);
    sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&mask), None)
}

/// A second interrupt inside the reminder window prints the reminder.
/// Every interrupt opens a new window. Returns whether the reminder was
/// printed.
pub fn idle_interrupt() -> bool {
    let reminded = alarm::cancel().is_some();
    if reminded {
        // SAFETY: write(2) on a static buffer is async-signal-safe.
        unsafe {
            libc::write(
                libc::STDOUT_FILENO,
                REMINDER.as_ptr().cast(),
                REMINDER.len(),
            );
        }
    }
    let _ = alarm::set(REMINDER_SECS.load(Ordering::Relaxed));
    reminded
}

extern "C" fn handle_idle_interrupt(_: libc::c_int) {
    let saved = errno::errno();
    let _ = idle_interrupt();
    errno::set_errno(saved);
}

extern "C" fn handle_alarm(_: libc::c_int) {}
