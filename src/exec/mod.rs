pub(crate) mod jobs;
pub(crate) mod signal;

use std::ffi::CString;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use crate::common::CommandSpec;
use crate::cutils::cerr;
use crate::log::{dev_error, dev_info};
use crate::system::interface::ProcessId;
use crate::system::signal::{consts::*, SignalHandler, SignalHandlerBehavior, SignalNumber};
use crate::system::wait::{Wait, WaitError, WaitOptions, WaitStatus};
use crate::system::{fork, ForkResult, _exit};

const NULL_DEVICE: &str = "/dev/null";

// child-side failure codes: 1 before the exec is attempted, 127 when the
// program cannot be executed at all
const REDIRECT_FAILURE: libc::c_int = 1;
const COMMAND_NOT_FOUND: libc::c_int = 127;

/// How a child ended: a normal exit code or the signal that killed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandStatus {
    Exited(libc::c_int),
    Signaled(SignalNumber),
}

impl CommandStatus {
    /// Extract the terminal status, if the state change was a termination.
    pub(crate) fn from_wait(status: &WaitStatus) -> Option<Self> {
        if let Some(code) = status.exit_status() {
            Some(Self::Exited(code))
        } else {
            status.term_signal().map(Self::Signaled)
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandStatus::Exited(code) => write!(f, "exit value {code}"),
            CommandStatus::Signaled(signal) => write!(f, "terminated by signal {signal}"),
        }
    }
}

/// Materialize one parsed command as a running process.
///
/// The parent branch returns the child's pid immediately and never blocks;
/// deciding whether to wait is the caller's business. The child branch
/// configures its own signal dispositions and standard streams, then replaces
/// itself with the target program, surviving only long enough to report a
/// failure.
pub(crate) fn launch(spec: &CommandSpec, foreground: bool) -> io::Result<ProcessId> {
    let ForkResult::Parent(child_pid) = fork().map_err(|err| {
        dev_error!("unable to fork command process: {err}");
        err
    })?
    else {
        exec_child(spec, foreground)
    };

    dev_info!("launched {} with pid {child_pid}", spec.name);

    Ok(child_pid)
}

fn exec_child(spec: &CommandSpec, foreground: bool) -> ! {
    // children never take part in the shell's foreground-only toggle
    if let Ok(handler) = SignalHandler::register(SIGTSTP, SignalHandlerBehavior::Ignore) {
        handler.forget();
    }

    // only a foreground child may be killed from the keyboard; background
    // children keep inheriting the shell's ignored disposition
    if foreground {
        if let Ok(handler) = SignalHandler::register(SIGINT, SignalHandlerBehavior::Default) {
            handler.forget();
        }
    }

    // a background command without explicit redirections reads from and
    // writes to the null device instead of sharing the terminal
    let implicit = (!foreground).then(|| Path::new(NULL_DEVICE));

    let _stdin = match spec.stdin.as_deref().or(implicit) {
        Some(path) => match open_input(path) {
            Ok(file) => Some(file),
            Err(err) => {
                eprintln_ignore_io_error!(
                    "minsh: cannot redirect input to {}: {err}",
                    path.display()
                );
                _exit(REDIRECT_FAILURE);
            }
        },
        None => None,
    };

    let _stdout = match spec.stdout.as_deref().or(implicit) {
        Some(path) => match open_output(path) {
            Ok(file) => Some(file),
            Err(err) => {
                eprintln_ignore_io_error!(
                    "minsh: cannot redirect output to {}: {err}",
                    path.display()
                );
                _exit(REDIRECT_FAILURE);
            }
        },
        None => None,
    };

    let err = exec(spec);

    eprintln_ignore_io_error!("minsh: {}: {err}", spec.name);
    _exit(COMMAND_NOT_FOUND)
}

fn open_input(path: &Path) -> io::Result<File> {
    let file = File::open(path)?;
    redirect(&file, libc::STDIN_FILENO)?;
    Ok(file)
}

fn open_output(path: &Path) -> io::Result<File> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .open(path)?;
    redirect(&file, libc::STDOUT_FILENO)?;
    Ok(file)
}

/// Duplicate `file` onto a standard stream. The duplicate survives the exec;
/// the original, now redundant descriptor is flagged close-on-exec so it
/// cannot leak into the program image.
fn redirect(file: &File, stream: libc::c_int) -> io::Result<()> {
    // SAFETY: `dup2` and `fcntl` cannot cause UB for any descriptor values.
    cerr(unsafe { libc::dup2(file.as_raw_fd(), stream) })?;
    cerr(unsafe { libc::fcntl(file.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) })?;
    Ok(())
}

/// Replace the current image with the target program, resolving the name
/// through the standard search path. Only returns if the replacement failed.
fn exec(spec: &CommandSpec) -> io::Error {
    let Ok(name) = CString::new(spec.name.as_str()) else {
        return embedded_nul();
    };

    let mut args = Vec::with_capacity(spec.args.len());
    for arg in &spec.args {
        let Ok(arg) = CString::new(arg.as_str()) else {
            return embedded_nul();
        };
        args.push(arg);
    }

    // exec-style consumption requires a null-terminated argument vector
    let mut argv: Vec<*const libc::c_char> = args.iter().map(|arg| arg.as_ptr()).collect();
    argv.push(std::ptr::null());

    // SAFETY: `name` and every entry of `argv` point to valid NUL-terminated
    // strings that outlive the call, and `argv` ends with a null pointer.
    unsafe { libc::execvp(name.as_ptr(), argv.as_ptr()) };

    io::Error::last_os_error()
}

fn embedded_nul() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "embedded nul byte")
}

/// Block until the given foreground child terminates and report how it ended.
///
/// The blocking status-wait provides the no-missed-wakeup guarantee on its
/// own: a signal delivered at any point either interrupts the call (retried
/// here) or is handled before the call suspends, so a termination can never
/// slip between checking and sleeping. A spurious wakeup only costs one extra
/// loop iteration.
pub(crate) fn wait_foreground(pid: ProcessId) -> io::Result<CommandStatus> {
    loop {
        match pid.wait(WaitOptions::new()) {
            Ok((_, status)) => {
                if let Some(status) = CommandStatus::from_wait(&status) {
                    return Ok(status);
                }
                // a state change that is not a termination; keep waiting
            }
            Err(WaitError::NotReady) => {}
            Err(WaitError::Io(err)) if was_interrupted(&err) => {}
            Err(WaitError::Io(err)) => return Err(err),
        }
    }
}

fn was_interrupted(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::Interrupted
}
