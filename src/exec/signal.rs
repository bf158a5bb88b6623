//! The shell's process-wide signal dispositions.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::log::dev_info;
use crate::system::setsid;
use crate::system::signal::{consts::*, SignalHandler, SignalHandlerBehavior, SignalNumber};
use crate::system::_exit;

/// Foreground-only mode. Flipped from signal context, read once per prompt
/// cycle by the supervisor loop; both sides tolerate a stale value, so no
/// ordering stronger than relaxed is needed for this single bit.
static FOREGROUND_ONLY: AtomicBool = AtomicBool::new(false);

extern "C" fn toggle_foreground_only(_signal: SignalNumber) {
    // asynchronous signal context: one atomic flip and nothing else
    FOREGROUND_ONLY.fetch_xor(true, Ordering::Relaxed);
}

extern "C" fn exit_unless_group_leader(_signal: SignalNumber) {
    // A shell reparented into another group must honor a termination request;
    // the group leader itself stays up to finish its own shutdown. getpid,
    // getpgrp and _exit are all async-signal-safe.
    // SAFETY: both calls take no arguments and always succeed.
    if unsafe { libc::getpid() != libc::getpgrp() } {
        _exit(libc::EXIT_FAILURE);
    }
}

/// Read the current foreground-only mode.
pub(crate) fn foreground_only() -> bool {
    FOREGROUND_ONLY.load(Ordering::Relaxed)
}

/// Install the shell's signal dispositions, once, at startup.
///
/// The shell becomes a session leader where possible, ignores the keyboard
/// interrupt meant for its foreground children, toggles foreground-only mode
/// on the stop request, and honors a termination request only when it is not
/// the group leader. These dispositions last for the process lifetime;
/// freshly forked children override them as needed before their exec.
pub(crate) fn install() -> io::Result<()> {
    if let Err(err) = setsid() {
        // already a process-group leader; nothing to do
        dev_info!("cannot create a new session: {err}");
    }

    SignalHandler::register(SIGINT, SignalHandlerBehavior::Ignore)?.forget();
    SignalHandler::register(
        SIGTSTP,
        SignalHandlerBehavior::Handler(toggle_foreground_only),
    )?
    .forget();
    SignalHandler::register(
        SIGTERM,
        SignalHandlerBehavior::Handler(exit_unless_group_leader),
    )?
    .forget();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{foreground_only, toggle_foreground_only};
    use crate::system::signal::consts::SIGTSTP;

    #[test]
    fn toggling_twice_restores_the_mode() {
        assert!(!foreground_only());
        toggle_foreground_only(SIGTSTP);
        assert!(foreground_only());
        toggle_foreground_only(SIGTSTP);
        assert!(!foreground_only());
    }
}
