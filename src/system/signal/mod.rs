//! Utilities to install and restore signal dispositions.

mod handler;
mod set;

pub(crate) use handler::{SignalHandler, SignalHandlerBehavior};

pub(crate) type SignalNumber = libc::c_int;

macro_rules! define_consts {
    ($($signal:ident,)*) => {
        pub(crate) mod consts {
            pub(crate) use libc::{$($signal,)*};
        }

        pub(crate) fn signal_name(signal: SignalNumber) -> &'static str {
            match signal {
                $(consts::$signal => stringify!($signal),)*
                _ => "unknown signal",
            }
        }
    };
}

define_consts! {
    SIGINT,
    SIGQUIT,
    SIGTSTP,
    SIGTERM,
    SIGCHLD,
    SIGCONT,
    SIGUSR1,
    SIGUSR2,
    SIGKILL,
    SIGSTOP,
}
