use std::collections::TryReserveError;

use crate::log::user_warn;
use crate::system::interface::ProcessId;
use crate::system::wait::{Wait, WaitError, WaitOptions};

use super::CommandStatus;

/// Starting capacity and lower bound for the tracked-job table.
const FLOOR_CAPACITY: usize = 8;

/// The set of background children whose termination the shell has not
/// observed yet.
///
/// Growth and shrinkage follow an explicit amortized policy instead of the
/// container's own heuristics: capacity doubles when occupancy crosses three
/// quarters of it and halves when occupancy drops under one quarter, never
/// going below [`FLOOR_CAPACITY`].
pub(crate) struct JobRegistry {
    jobs: Vec<ProcessId>,
    capacity: usize,
}

impl JobRegistry {
    pub(crate) fn new() -> Self {
        Self {
            jobs: Vec::new(),
            capacity: FLOOR_CAPACITY,
        }
    }

    /// Number of jobs still being tracked.
    pub(crate) fn len(&self) -> usize {
        self.jobs.len()
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    pub(crate) fn pids(&self) -> Vec<ProcessId> {
        self.jobs.clone()
    }

    /// Start tracking a background child.
    ///
    /// The only possible failure is a reservation failure, which the caller
    /// must treat as fatal: an untracked child could never be reaped or
    /// reported.
    pub(crate) fn register(&mut self, pid: ProcessId) -> Result<(), TryReserveError> {
        if self.jobs.len() > self.capacity * 3 / 4 {
            self.capacity *= 2;
        }
        self.jobs
            .try_reserve_exact(self.capacity - self.jobs.len())?;
        self.jobs.push(pid);
        Ok(())
    }

    /// Check every tracked job without blocking; terminated ones are removed
    /// from the table and returned in registry order. A job that has not
    /// finished is skipped and rechecked on the next pass.
    pub(crate) fn reap_all(&mut self) -> Vec<(ProcessId, CommandStatus)> {
        let mut reaped = Vec::new();

        let mut index = 0;
        while index < self.jobs.len() {
            let pid = self.jobs[index];
            match pid.wait(WaitOptions::new().no_hang()) {
                Err(WaitError::NotReady) => index += 1,
                Ok((_, status)) => match CommandStatus::from_wait(&status) {
                    Some(status) => {
                        reaped.push((pid, status));
                        self.remove(index);
                    }
                    None => index += 1,
                },
                Err(WaitError::Io(err)) => {
                    // a job that cannot be waited for would stay here forever
                    user_warn!("lost track of background pid {pid}: {err}");
                    self.remove(index);
                }
            }
        }

        reaped
    }

    /// Remove the entry at `index`, shifting the remaining entries left.
    fn remove(&mut self, index: usize) {
        self.jobs.remove(index);
        if self.jobs.len() < self.capacity / 4 && self.capacity > FLOOR_CAPACITY {
            self.capacity /= 2;
            self.jobs.shrink_to(self.capacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{JobRegistry, FLOOR_CAPACITY};
    use crate::exec::CommandStatus;
    use crate::system::interface::ProcessId;
    use crate::system::kill;
    use crate::system::signal::consts::SIGKILL;

    // pids far beyond any kernel's pid range never name one of our children;
    // reaping them reports a wait error and drops the entry, which is what
    // the capacity tests below use to drive removals
    fn register_fakes(registry: &mut JobRegistry, count: usize) {
        for offset in 0..count {
            let pid = ProcessId(libc::pid_t::MAX - offset as libc::pid_t);
            registry.register(pid).unwrap();
        }
    }

    #[test]
    fn capacity_doubles_only_past_three_quarters() {
        let mut registry = JobRegistry::new();
        assert_eq!(registry.capacity(), FLOOR_CAPACITY);

        register_fakes(&mut registry, 7);
        assert_eq!(registry.capacity(), FLOOR_CAPACITY);

        register_fakes(&mut registry, 1);
        assert_eq!(registry.capacity(), 2 * FLOOR_CAPACITY);
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn capacity_halves_only_below_one_quarter() {
        let mut registry = JobRegistry::new();
        register_fakes(&mut registry, 8);
        assert_eq!(registry.capacity(), 16);

        // every fake is unwaitable, so a single pass empties the table,
        // shrinking it on the way down but never past the floor
        let reaped = registry.reap_all();
        assert_eq!(reaped, vec![]);
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.capacity(), FLOOR_CAPACITY);
    }

    #[test]
    fn capacity_never_drops_below_the_floor() {
        let mut registry = JobRegistry::new();
        register_fakes(&mut registry, 2);
        registry.reap_all();
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.capacity(), FLOOR_CAPACITY);
    }

    #[test]
    fn running_jobs_are_skipped_and_finished_ones_reported() {
        let mut registry = JobRegistry::new();

        let done = std::process::Command::new("sh")
            .args(["-c", "exit 3"])
            .spawn()
            .unwrap();
        let done_pid = ProcessId(done.id() as libc::pid_t);

        let running = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let running_pid = ProcessId(running.id() as libc::pid_t);

        registry.register(done_pid).unwrap();
        registry.register(running_pid).unwrap();

        let mut reaped = registry.reap_all();
        while reaped.is_empty() {
            reaped = registry.reap_all();
        }
        assert_eq!(reaped, vec![(done_pid, CommandStatus::Exited(3))]);
        assert_eq!(registry.len(), 1);

        kill(running_pid, SIGKILL).unwrap();
        let mut reaped = registry.reap_all();
        while reaped.is_empty() {
            reaped = registry.reap_all();
        }
        assert_eq!(reaped, vec![(running_pid, CommandStatus::Signaled(SIGKILL))]);
        assert_eq!(registry.len(), 0);
    }
}
