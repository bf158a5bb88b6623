use std::{io, mem::MaybeUninit};

use crate::cutils::cerr;
use crate::system::make_zeroed_sigaction;

use super::{handler::SignalHandlerBehavior, SignalNumber};

#[repr(transparent)]
pub(super) struct SignalAction {
    raw: libc::sigaction,
}

impl SignalAction {
    pub(super) fn new(behavior: SignalHandlerBehavior) -> io::Result<Self> {
        // This guarantees that syscalls won't be interrupted by this signal as
        // long as the handler is alive.
        let sa_flags = libc::SA_RESTART;

        // A custom handler runs with every other signal masked so it cannot be
        // interleaved with a second delivery while it is still executing.
        let (sa_sigaction, sa_mask) = match behavior {
            SignalHandlerBehavior::Default => (libc::SIG_DFL, SignalSet::empty()?),
            SignalHandlerBehavior::Ignore => (libc::SIG_IGN, SignalSet::empty()?),
            SignalHandlerBehavior::Handler(handler) => {
                (handler as libc::sighandler_t, SignalSet::full()?)
            }
        };

        let mut raw = make_zeroed_sigaction();
        raw.sa_sigaction = sa_sigaction;
        raw.sa_mask = sa_mask.raw;
        raw.sa_flags = sa_flags;

        Ok(Self { raw })
    }

    pub(super) fn register(&self, signal: SignalNumber) -> io::Result<Self> {
        let mut original_action = MaybeUninit::<Self>::zeroed();

        // SAFETY: `self.raw` is a valid, initialized sigaction and the third
        // parameter is a writable location of the same layout.
        cerr(unsafe { libc::sigaction(signal, &self.raw, original_action.as_mut_ptr().cast()) })?;

        // SAFETY: `sigaction` filled the output parameter on success.
        Ok(unsafe { original_action.assume_init() })
    }
}

// A signal set used to mask signals while a handler runs.
#[repr(transparent)]
struct SignalSet {
    raw: libc::sigset_t,
}

impl SignalSet {
    /// Create an empty set.
    fn empty() -> io::Result<Self> {
        let mut set = MaybeUninit::<Self>::zeroed();

        // SAFETY: `set` points to a writable location of `sigset_t` layout.
        cerr(unsafe { libc::sigemptyset(set.as_mut_ptr().cast()) })?;

        // SAFETY: `sigemptyset` initialized the set on success.
        Ok(unsafe { set.assume_init() })
    }

    /// Create a set containing all the signals.
    fn full() -> io::Result<Self> {
        let mut set = MaybeUninit::<Self>::zeroed();

        // SAFETY: `set` points to a writable location of `sigset_t` layout.
        cerr(unsafe { libc::sigfillset(set.as_mut_ptr().cast()) })?;

        // SAFETY: `sigfillset` initialized the set on success.
        Ok(unsafe { set.assume_init() })
    }
}
