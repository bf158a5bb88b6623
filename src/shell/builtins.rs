use std::env;
use std::path::PathBuf;

use crate::common::CommandSpec;
use crate::log::user_error;
use crate::system::signal::consts::{SIGKILL, SIGTERM};
use crate::system::{getpgrp, killpg};

use super::ShellState;

/// The commands the shell answers itself, recognized by name before any
/// process is launched. Redirections and background requests on these are
/// ignored.
pub(crate) enum Builtin {
    Exit,
    Cd,
    Status,
}

impl Builtin {
    pub(crate) fn recognize(name: &str) -> Option<Self> {
        match name {
            "exit" => Some(Self::Exit),
            "cd" => Some(Self::Cd),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    pub(crate) fn run(self, spec: &CommandSpec, state: &ShellState) {
        match self {
            Self::Exit => exit_shell(),
            Self::Cd => change_directory(&spec.args[1..]),
            Self::Status => println_ignore_io_error!("{}", state.last_status),
        }
    }
}

/// Terminate every process in the shell's group, then the shell itself.
///
/// The shell survives its own group-wide SIGTERM because its handler only
/// exits non-leaders; children die from it whether tracked or not, so the
/// job registry needs no farewell pass.
pub(crate) fn exit_shell() -> ! {
    if killpg(getpgrp(), SIGTERM).is_err() {
        killpg(getpgrp(), SIGKILL).ok();
    }
    std::process::exit(0)
}

fn change_directory(args: &[String]) {
    let destination = match args {
        [] => match env::var_os("HOME") {
            Some(home) => PathBuf::from(home),
            None => {
                user_error!("cd: HOME is not set");
                return;
            }
        },
        [path] => PathBuf::from(path),
        _ => {
            user_error!("cd: too many arguments");
            return;
        }
    };

    if let Err(err) = env::set_current_dir(&destination) {
        user_error!("cd: {}: {err}", destination.display());
        return;
    }

    // keep the environment's view of the working directory in sync
    match env::current_dir() {
        Ok(cwd) => env::set_var("PWD", cwd),
        Err(err) => user_error!("cd: cannot resolve working directory: {err}"),
    }
}
