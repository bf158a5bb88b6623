//! The interactive supervisor loop.

mod builtins;

use std::io::{self, BufRead, Write};

use crate::common::{CommandSpec, Error};
use crate::exec::{self, jobs::JobRegistry, signal, CommandStatus};
use crate::log::{dev_debug, dev_info, dev_warn, user_error, user_warn};
use crate::system::process_id;

use builtins::Builtin;

pub(crate) struct ShellState {
    /// Status of the most recent foreground command, reported by `status`.
    pub(crate) last_status: CommandStatus,
    /// The loop's copy of the foreground-only mode, refreshed once per cycle.
    foreground_only: bool,
}

impl ShellState {
    fn new() -> Self {
        Self {
            last_status: CommandStatus::Exited(0),
            foreground_only: false,
        }
    }
}

pub fn main() {
    crate::log::ShellLogger::new("minsh: ").into_global_logger();

    match run() {
        Ok(()) => {}
        Err(error) => {
            user_error!("{error}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<(), Error> {
    signal::install()?;

    let shell_pid = process_id();
    let mut state = ShellState::new();
    let mut registry = JobRegistry::new();
    let mut input = io::stdin().lock();

    loop {
        announce_mode_change(&mut state);

        for (pid, status) in registry.reap_all() {
            println_ignore_io_error!("background pid {pid} is done: {status}");
        }

        let Some(line) = read_line(&mut input) else {
            // end of input behaves like `exit`
            builtins::exit_shell();
        };

        let spec = match CommandSpec::parse(&line, shell_pid) {
            Ok(Some(spec)) => spec,
            Ok(None) => continue,
            Err(error) => {
                user_error!("{error}");
                continue;
            }
        };
        dev_debug!("parsed {spec:?}");

        if let Some(builtin) = Builtin::recognize(&spec.name) {
            builtin.run(&spec, &state);
            continue;
        }

        dispatch(&spec, &mut state, &mut registry)?;
    }
}

/// Pick up an asynchronous mode toggle, collapsing any number of deliveries
/// since the previous cycle into their net value.
fn announce_mode_change(state: &mut ShellState) {
    let mode = signal::foreground_only();
    if mode != state.foreground_only {
        if mode {
            println_ignore_io_error!("\nEntering foreground-only mode (& is now ignored)");
        } else {
            println_ignore_io_error!("\nExiting foreground-only mode");
        }
        state.foreground_only = mode;
    }
}

/// Show the prompt and read one line. Returns `None` at end of input.
fn read_line(input: &mut impl BufRead) -> Option<String> {
    loop {
        let mut stdout = io::stdout();
        let _ = write!(stdout, ": ");
        let _ = stdout.flush();

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => return None,
            Ok(_) => return Some(line),
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                // the offending bytes were consumed; skip them and re-prompt
                user_warn!("cannot read input line: {err}");
            }
            Err(err) => {
                dev_warn!("input stream is broken: {err}");
                return None;
            }
        }
    }
}

/// Resolve the effective run mode, launch the command, and either hand the
/// child to the registry or wait it out.
fn dispatch(
    spec: &CommandSpec,
    state: &mut ShellState,
    registry: &mut JobRegistry,
) -> Result<(), Error> {
    // a toggle that arrives mid-command only affects later requests
    let background = spec.background && !state.foreground_only;

    let child_pid = match exec::launch(spec, !background) {
        Ok(pid) => pid,
        Err(err) => {
            user_error!("cannot fork for {}: {err}", spec.name);
            return Ok(());
        }
    };

    if background {
        println_ignore_io_error!("background pid is {child_pid}");
        registry.register(child_pid).map_err(Error::JobTable)?;
        dev_info!("tracking {} background jobs", registry.len());
    } else {
        match exec::wait_foreground(child_pid) {
            Ok(status) => {
                if let CommandStatus::Signaled(signal) = status {
                    println_ignore_io_error!("terminated by signal {signal}");
                }
                state.last_status = status;
            }
            Err(err) => user_error!("cannot wait for pid {child_pid}: {err}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{dispatch, ShellState};
    use crate::common::CommandSpec;
    use crate::exec::jobs::JobRegistry;
    use crate::exec::CommandStatus;
    use crate::system::process_id;

    fn spec(line: &str) -> CommandSpec {
        CommandSpec::parse(line, process_id()).unwrap().unwrap()
    }

    #[test]
    fn foreground_only_mode_forces_a_synchronous_run() {
        let mut state = ShellState::new();
        state.foreground_only = true;
        let mut registry = JobRegistry::new();

        let spec = spec("true &");
        assert!(spec.background);

        dispatch(&spec, &mut state, &mut registry).unwrap();

        // waited on synchronously, never registered
        assert_eq!(registry.len(), 0);
        assert_eq!(state.last_status, CommandStatus::Exited(0));
    }

    #[test]
    fn background_jobs_do_not_touch_the_foreground_status() {
        let mut state = ShellState::new();
        state.last_status = CommandStatus::Exited(7);
        let mut registry = JobRegistry::new();

        dispatch(&spec("sleep 30 &"), &mut state, &mut registry).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(state.last_status, CommandStatus::Exited(7));

        // leave no stray sleeper behind
        let pid = registry.pids()[0];
        crate::system::kill(pid, crate::system::signal::consts::SIGKILL).unwrap();
        while registry.reap_all().is_empty() {}
        assert_eq!(registry.len(), 0);
    }
}
