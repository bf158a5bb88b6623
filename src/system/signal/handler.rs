use std::io;

use crate::log::dev_warn;

use super::{consts::*, set::SignalAction, signal_name, SignalNumber};

/// A registered disposition for one signal.
///
/// When a value of this type is dropped, it restores the action that was in
/// place before [`SignalHandler::register`] was called. Call
/// [`SignalHandler::forget`] for dispositions that should outlive the scope
/// that installed them.
pub(crate) struct SignalHandler {
    signal: SignalNumber,
    original_action: SignalAction,
}

impl SignalHandler {
    const FORBIDDEN: &'static [SignalNumber] = &[SIGKILL, SIGSTOP];

    /// Register a new action for the given signal.
    ///
    /// # Panics
    ///
    /// If it is not possible to override the action for the provided signal.
    pub(crate) fn register(
        signal: SignalNumber,
        behavior: SignalHandlerBehavior,
    ) -> io::Result<Self> {
        if Self::FORBIDDEN.contains(&signal) {
            panic!(
                "the {} signal action cannot be overridden",
                signal_name(signal)
            );
        }

        let action = SignalAction::new(behavior)?;
        let original_action = action.register(signal)?;

        Ok(Self {
            signal,
            original_action,
        })
    }

    /// Leave the registered action in place for the rest of the process
    /// lifetime instead of restoring the original on drop.
    pub(crate) fn forget(self) {
        std::mem::forget(self)
    }
}

impl Drop for SignalHandler {
    #[track_caller]
    fn drop(&mut self) {
        let signal = self.signal;
        if let Err(err) = self.original_action.register(signal) {
            dev_warn!(
                "cannot restore original action for {}: {err}",
                signal_name(signal),
            )
        }
    }
}

/// The possible dispositions a [`SignalHandler`] can install.
pub(crate) enum SignalHandlerBehavior {
    /// Execute the default action for the signal.
    Default,
    /// Ignore the arrival of the signal.
    Ignore,
    /// Run the given function inside the asynchronous signal context. The
    /// function must only perform async-signal-safe operations.
    Handler(extern "C" fn(SignalNumber)),
}

#[cfg(test)]
mod tests {
    use super::{SignalHandler, SignalHandlerBehavior};
    use crate::system::signal::consts::*;

    #[test]
    fn drop_restores_previous_action() {
        // registering twice in a row must work: the second registration saves
        // what the first one installed and drop unwinds them in order.
        let outer = SignalHandler::register(SIGUSR1, SignalHandlerBehavior::Ignore).unwrap();
        let inner = SignalHandler::register(SIGUSR1, SignalHandlerBehavior::Default).unwrap();
        drop(inner);
        drop(outer);
    }

    #[test]
    #[should_panic]
    fn sigkill_cannot_be_overridden() {
        let _ = SignalHandler::register(SIGKILL, SignalHandlerBehavior::Ignore);
    }
}
