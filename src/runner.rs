//! Background activity supervision.
//!
//! At most one activity thread exists at a time. Replacement is strict
//! stop-before-start: the old thread is signalled and joined before the new
//! one spawns, so two activities can never interleave writes on the LED
//! surfaces. Cancellation is cooperative: the flag is checked between
//! steps, so steps must stay short and bounded. A step that blocks
//! forever would hang the handoff.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use anyhow::Result;

/// What an activity reports after one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Done,
}

/// A restartable, step-wise unit of background work.
///
/// `step` renders one frame (or equivalent) and returns promptly; the
/// supervisor loop owns pacing against the cancel flag.
pub trait Activity: Send {
    fn name(&self) -> &'static str;
    fn step(&mut self) -> Result<StepOutcome>;
}

/// Supervises the single background activity slot.
pub struct TaskRunner {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    redraw: Arc<AtomicBool>,
}

impl TaskRunner {
    /// `redraw` is shared with the controller loop: it is raised whenever an
    /// activity terminates on its own so the menu gets repainted by the
    /// thread that owns the screen.
    pub fn new(redraw: Arc<AtomicBool>) -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            handle: None,
            redraw,
        }
    }

    /// Replace whatever is running with `activity`.
    ///
    /// Does not return until the previous activity thread (if any) has
    /// observed the cancel signal and been joined.
    pub fn start(&mut self, activity: Box<dyn Activity>) -> Result<()> {
        self.stop_if_running();
        self.stop.store(false, Ordering::Release);

        let stop = Arc::clone(&self.stop);
        let redraw = Arc::clone(&self.redraw);
        let name = activity.name();

        let handle = thread::Builder::new()
            .name(format!("effect-{name}"))
            .spawn(move || {
                tracing::info!(activity = name, "activity started");
                let mut activity = activity;
                let mut cancelled = false;
                loop {
                    if stop.load(Ordering::Acquire) {
                        cancelled = true;
                        break;
                    }
                    match activity.step() {
                        Ok(StepOutcome::Continue) => {}
                        Ok(StepOutcome::Done) => {
                            tracing::info!(activity = name, "activity finished");
                            break;
                        }
                        Err(err) => {
                            tracing::error!(activity = name, "activity failed: {err:#}");
                            break;
                        }
                    }
                }
                // A cancelled activity is about to be replaced (or the
                // process is exiting); only self-termination needs the
                // controller to repaint the menu.
                if !cancelled {
                    redraw.store(true, Ordering::Release);
                }
            })?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Signal and join the current activity. Idempotent; a no-op when idle.
    pub fn stop_if_running(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop.store(true, Ordering::Release);
            if handle.join().is_err() {
                tracing::error!("activity thread panicked");
                self.redraw.store(true, Ordering::Release);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        self.stop_if_running();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::time::Duration;

    struct CountingActivity {
        name: &'static str,
        writes: Arc<AtomicU64>,
        limit: Option<u64>,
    }

    impl Activity for CountingActivity {
        fn name(&self) -> &'static str {
            self.name
        }

        fn step(&mut self) -> Result<StepOutcome> {
            let done = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
            thread::sleep(Duration::from_millis(1));
            match self.limit {
                Some(limit) if done >= limit => Ok(StepOutcome::Done),
                _ => Ok(StepOutcome::Continue),
            }
        }
    }

    struct FailingActivity;

    impl Activity for FailingActivity {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn step(&mut self) -> Result<StepOutcome> {
            anyhow::bail!("panel fell off")
        }
    }

    #[test]
    fn handoff_joins_previous_activity_before_new_one_starts() {
        let redraw = Arc::new(AtomicBool::new(false));
        let mut runner = TaskRunner::new(Arc::clone(&redraw));

        let a_writes = Arc::new(AtomicU64::new(0));
        let b_writes = Arc::new(AtomicU64::new(0));

        runner
            .start(Box::new(CountingActivity {
                name: "a",
                writes: Arc::clone(&a_writes),
                limit: None,
            }))
            .unwrap();
        while a_writes.load(Ordering::SeqCst) == 0 {
            thread::sleep(Duration::from_millis(1));
        }

        runner
            .start(Box::new(CountingActivity {
                name: "b",
                writes: Arc::clone(&b_writes),
                limit: None,
            }))
            .unwrap();
        let a_after_handoff = a_writes.load(Ordering::SeqCst);

        // A is fully joined: no write from A may land after start() returned.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(a_writes.load(Ordering::SeqCst), a_after_handoff);
        assert!(b_writes.load(Ordering::SeqCst) > 0);

        runner.stop_if_running();
    }

    #[test]
    fn stop_if_running_is_idempotent() {
        let mut runner = TaskRunner::new(Arc::new(AtomicBool::new(false)));
        runner.stop_if_running();
        assert!(!runner.is_running());

        runner
            .start(Box::new(CountingActivity {
                name: "solo",
                writes: Arc::new(AtomicU64::new(0)),
                limit: None,
            }))
            .unwrap();
        runner.stop_if_running();
        runner.stop_if_running();
        assert!(!runner.is_running());
    }

    #[test]
    fn self_terminating_activity_requests_redraw() {
        let redraw = Arc::new(AtomicBool::new(false));
        let mut runner = TaskRunner::new(Arc::clone(&redraw));

        runner
            .start(Box::new(CountingActivity {
                name: "finite",
                writes: Arc::new(AtomicU64::new(0)),
                limit: Some(3),
            }))
            .unwrap();
        for _ in 0..200 {
            if redraw.load(Ordering::SeqCst) {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(redraw.load(Ordering::SeqCst));
    }

    #[test]
    fn failing_activity_stops_and_requests_redraw() {
        let redraw = Arc::new(AtomicBool::new(false));
        let mut runner = TaskRunner::new(Arc::clone(&redraw));

        runner.start(Box::new(FailingActivity)).unwrap();
        for _ in 0..200 {
            if redraw.load(Ordering::SeqCst) {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(redraw.load(Ordering::SeqCst));
        runner.stop_if_running();
        assert!(!runner.is_running());
    }

    #[test]
    fn cancelled_activity_does_not_request_redraw() {
        let redraw = Arc::new(AtomicBool::new(false));
        let mut runner = TaskRunner::new(Arc::clone(&redraw));

        runner
            .start(Box::new(CountingActivity {
                name: "cancelled",
                writes: Arc::new(AtomicU64::new(0)),
                limit: None,
            }))
            .unwrap();
        runner.stop_if_running();
        assert!(!redraw.load(Ordering::SeqCst));
    }
}
