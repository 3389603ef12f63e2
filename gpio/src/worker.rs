//! Background task plumbing shared by the scanners and simulators.

use crate::GpioResult;
use log::warn;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Cooperative stop signal.
///
/// [`wait`](StopFlag::wait) doubles as the delay mechanism and the
/// cancellation check: a task that only ever sleeps through it is guaranteed
/// to observe a stop request within one wait interval.
#[derive(Debug, Default)]
pub struct StopFlag {
    raised: Mutex<bool>,
    cond: Condvar,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        *crate::lock(&self.raised) = true;
        self.cond.notify_all();
    }

    pub fn is_raised(&self) -> bool {
        *crate::lock(&self.raised)
    }

    /// Blocks for up to `timeout`, returning early once the flag is raised.
    /// Returns whether the flag was raised.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut raised = crate::lock(&self.raised);
        while !*raised {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .cond
                .wait_timeout(raised, deadline - now)
                .unwrap_or_else(|err| err.into_inner());
            raised = guard;
        }
        true
    }
}

/// A named background thread with a bounded-join shutdown.
pub struct Worker {
    name: String,
    stop: Arc<StopFlag>,
    done: Arc<StopFlag>,
    handle: Option<JoinHandle<()>>,
}

/// Marks the task finished even when it unwinds.
struct DoneGuard(Arc<StopFlag>);

impl Drop for DoneGuard {
    fn drop(&mut self) {
        self.0.raise();
    }
}

impl Worker {
    pub fn spawn<F>(name: &str, task: F) -> GpioResult<Self>
    where
        F: FnOnce(&StopFlag) + Send + 'static,
    {
        let stop = Arc::new(StopFlag::new());
        let done = Arc::new(StopFlag::new());
        let task_stop = stop.clone();
        let task_done = done.clone();
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let _done = DoneGuard(task_done);
                task(&task_stop);
            })?;
        Ok(Self {
            name: name.to_string(),
            stop,
            done,
            handle: Some(handle),
        })
    }

    /// Raises the stop flag and waits up to `grace` for the task to finish.
    ///
    /// Returns false if the task kept running past the grace period; the
    /// thread is left detached in that case so the caller never hangs.
    pub fn shutdown(&mut self, grace: Duration) -> bool {
        self.stop.raise();
        if self.done.wait(grace) {
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
            true
        } else {
            warn!("worker `{}` did not stop within {:?}", self.name, grace);
            self.handle.take();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn wait_runs_out_when_not_raised() {
        let flag = StopFlag::new();
        let start = Instant::now();
        assert!(!flag.wait(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn wait_returns_early_once_raised() {
        let flag = Arc::new(StopFlag::new());
        let raiser = flag.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            raiser.raise();
        });

        let start = Instant::now();
        assert!(flag.wait(Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn wait_on_raised_flag_is_immediate() {
        let flag = StopFlag::new();
        flag.raise();
        assert!(flag.wait(Duration::ZERO));
        assert!(flag.wait(Duration::from_secs(1)));
    }

    #[test]
    fn shutdown_joins_a_cooperative_task() {
        let mut worker = Worker::spawn("cooperative", |stop| {
            while !stop.wait(Duration::from_millis(5)) {}
        })
        .unwrap();

        assert!(worker.shutdown(Duration::from_secs(2)));
    }

    #[test]
    fn shutdown_gives_up_on_a_stuck_task() {
        let mut worker = Worker::spawn("stuck", |_stop| {
            thread::sleep(Duration::from_millis(300));
        })
        .unwrap();

        let start = Instant::now();
        assert!(!worker.shutdown(Duration::from_millis(30)));
        assert!(start.elapsed() < Duration::from_millis(300));
    }

    #[test]
    fn done_is_raised_even_on_panic() {
        let mut worker = Worker::spawn("panicky", |_stop| panic!("boom")).unwrap();
        assert!(worker.shutdown(Duration::from_secs(2)));
    }
}
