//! Deferred re-focus of the text input after a commit closes the calendar.
//!
//! The engine only emits [`Effect::ScheduleRefocus`] / [`Effect::CancelRefocus`];
//! this scheduler is the host-side interpreter for those effects. A newly
//! scheduled refocus always supersedes a pending one, and a canceled task
//! never runs.

use std::time::Duration;

use chrono::TimeZone;
use chronopick_proto::ports::host::Effect;
use tokio::{runtime::Handle, task::JoinHandle, time::sleep};

/// Cancelable one-shot refocus task.
#[derive(Debug, Default)]
pub struct RefocusScheduler {
    task: Option<JoinHandle<()>>,
}

impl RefocusScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `refocus` to run once after `delay`, aborting any refocus
    /// still pending.
    pub fn schedule<F>(&mut self, runtime: &Handle, delay: Duration, refocus: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        self.task = Some(runtime.spawn(async move {
            sleep(delay).await;
            refocus();
        }));
    }

    /// Aborts the pending refocus, if any. The callback will not run.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Interprets the refocus-related effects of one transition batch.
    pub fn apply<Tz, F>(
        &mut self,
        effects: &[Effect<Tz>],
        runtime: &Handle,
        delay: Duration,
        refocus: F,
    ) where
        Tz: TimeZone,
        F: Fn() + Send + Sync + Clone + 'static,
    {
        for effect in effects {
            match effect {
                Effect::ScheduleRefocus => self.schedule(runtime, delay, refocus.clone()),
                Effect::CancelRefocus => self.cancel(),
                _ => {}
            }
        }
    }
}

impl Drop for RefocusScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
