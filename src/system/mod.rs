use std::io;

use crate::cutils::cerr;

pub mod interface;
pub mod signal;
pub mod wait;

use interface::ProcessId;
use signal::SignalNumber;

pub(crate) fn _exit(status: libc::c_int) -> ! {
    // SAFETY: `_exit` terminates the process and performs no cleanup handlers,
    // which is exactly what a forked child that cannot continue needs.
    unsafe { libc::_exit(status) }
}

pub(crate) enum ForkResult {
    // Parent process branch with the child process' PID.
    Parent(ProcessId),
    // Child process branch.
    Child,
}

unsafe fn inner_fork() -> io::Result<ForkResult> {
    let pid = cerr(unsafe { libc::fork() })?;
    if pid == 0 {
        Ok(ForkResult::Child)
    } else {
        Ok(ForkResult::Parent(ProcessId::new(pid)))
    }
}

#[cfg(target_os = "linux")]
/// Create a new process.
pub(crate) fn fork() -> io::Result<ForkResult> {
    // SAFETY: `fork` is implemented using `clone` in linux so we don't need to worry about signal
    // safety.
    unsafe { inner_fork() }
}

#[cfg(not(target_os = "linux"))]
/// Create a new process.
///
/// # Safety
///
/// In a multithreaded program, only async-signal-safe functions are guaranteed to work in the
/// child process until a call to `execve` or a similar function is done.
pub(crate) unsafe fn fork() -> io::Result<ForkResult> {
    inner_fork()
}

/// Run the current process in a new session, becoming the session and
/// process-group leader. Fails when the process already leads a group.
pub(crate) fn setsid() -> io::Result<ProcessId> {
    // SAFETY: `setsid` takes no arguments and is always safe to call.
    cerr(unsafe { libc::setsid() }).map(ProcessId::new)
}

/// Send a signal to a process with the specified ID.
#[cfg(test)]
pub(crate) fn kill(pid: ProcessId, signal: SignalNumber) -> io::Result<()> {
    // SAFETY: This function cannot cause UB even if `pid` is not a valid process ID or if
    // `signal` is not a valid signal code.
    cerr(unsafe { libc::kill(pid.get(), signal) }).map(|_| ())
}

/// Send a signal to a process group with the specified ID.
pub(crate) fn killpg(pgid: ProcessId, signal: SignalNumber) -> io::Result<()> {
    // SAFETY: This function cannot cause UB even if `pgid` is not a valid process ID or if
    // `signal` is not a valid signal code.
    cerr(unsafe { libc::killpg(pgid.get(), signal) }).map(|_| ())
}

/// Get the process group ID of the current process.
pub(crate) fn getpgrp() -> ProcessId {
    // SAFETY: `getpgrp` takes no arguments and always succeeds.
    ProcessId::new(unsafe { libc::getpgrp() })
}

/// Return the process identifier for the current process.
pub(crate) fn process_id() -> ProcessId {
    // NOTE libstd casts the `i32` that `libc::getpid` returns into `u32`;
    // here we cast it back into a `pid_t`
    ProcessId::new(std::process::id() as libc::pid_t)
}

pub(crate) fn make_zeroed_sigaction() -> libc::sigaction {
    // SAFETY: since sigaction is a C struct, all-zeroes is a valid representation
    // We cannot use a "literal struct" initialization method since the exact representation
    // of libc::sigaction is not fixed
    unsafe { std::mem::zeroed() }
}

#[cfg(test)]
mod tests {
    use super::{fork, getpgrp, kill, killpg, process_id, ForkResult, _exit};
    use crate::system::wait::{Wait, WaitOptions};

    #[test]
    fn process_id_matches_libstd() {
        assert_eq!(process_id().get() as u32, std::process::id());
    }

    #[test]
    fn forked_child_is_waitable() {
        let ForkResult::Parent(child_pid) = fork().unwrap() else {
            _exit(7);
        };

        let (pid, status) = child_pid.wait(WaitOptions::new()).unwrap();
        assert_eq!(pid, child_pid);
        assert_eq!(status.exit_status(), Some(7));
    }

    #[test]
    fn kill_terminates_a_child() {
        let mut child = std::process::Command::new("/bin/sleep")
            .arg("1")
            .spawn()
            .unwrap();
        kill(
            super::ProcessId(child.id() as libc::pid_t),
            super::signal::consts::SIGKILL,
        )
        .unwrap();
        assert!(!child.wait().unwrap().success());
    }

    #[test]
    fn group_of_the_current_process_is_valid() {
        // signal 0 performs error checking without delivering anything
        killpg(getpgrp(), 0).unwrap();
    }
}
