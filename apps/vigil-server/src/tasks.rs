use futures_util::FutureExt;
use std::{
    borrow::Cow,
    time::{Duration, Instant},
};

use tokio::task::JoinHandle;
use tracing::{debug, trace};

#[derive(Debug)]
pub struct TaskHandle {
    name: Cow<'static, str>,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub fn new(name: impl Into<Cow<'static, str>>, handle: JoinHandle<()>) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_inner(self) -> (Cow<'static, str>, JoinHandle<()>) {
        (self.name, self.handle)
    }
}

/// Top-level background tasks owned by the process.
#[derive(Default)]
pub struct TaskManager {
    tasks: Vec<TaskHandle>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn push(&mut self, task: TaskHandle) {
        trace!(target: "vigil::tasks", task = task.name(), "task registered");
        self.tasks.push(task);
    }

    pub fn push_handle(&mut self, name: impl Into<Cow<'static, str>>, handle: JoinHandle<()>) {
        self.push(TaskHandle::new(name, handle));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait up to `grace` for each task to finish on its own, then abort it.
    /// Tasks are expected to watch a cancellation token that was fired before
    /// this is called.
    pub async fn shutdown_with_grace(self, grace: Duration) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        for task in self.tasks {
            let (name, mut handle) = task.into_inner();

            if grace.is_zero() {
                handle.abort();
                if let Err(err) = handle.await {
                    debug!(target: "vigil::tasks", task = %name, ?err, "task join after abort failed");
                }
                report.aborted.push(name.into_owned());
                continue;
            }

            let sleeper = tokio::time::sleep(grace);
            tokio::pin!(sleeper);
            tokio::select! {
                res = &mut handle => {
                    if let Err(err) = res {
                        debug!(target: "vigil::tasks", task = %name, ?err, "task exited with error");
                    }
                    report.completed.push(name.into_owned());
                }
                _ = &mut sleeper => {
                    handle.abort();
                    if let Err(err) = handle.await {
                        debug!(target: "vigil::tasks", task = %name, ?err, "task join after abort failed");
                    }
                    report.aborted.push(name.into_owned());
                }
            }
        }
        report
    }
}

/// Which tasks stopped by themselves and which had to be aborted.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    pub completed: Vec<String>,
    pub aborted: Vec<String>,
}

/// Spawn a background loop that is restarted with exponential backoff when it
/// panics. A normal return ends it for good.
pub fn spawn_supervised<F, Fut>(name: impl Into<Cow<'static, str>>, mut factory: F) -> TaskHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let name_cow = name.into();
    let name_for_task = name_cow.clone();
    let handle = tokio::spawn(async move {
        let mut backoff_ms: u64 = 200;
        let window = Duration::from_secs(30);
        let mut window_start = Instant::now();
        let mut restarts_in_window: u32 = 0;
        loop {
            let result = std::panic::AssertUnwindSafe(factory()).catch_unwind().await;
            if result.is_ok() {
                debug!(target: "vigil::tasks", task = %name_for_task, "supervised task completed");
                break;
            }
            let now = Instant::now();
            if now.duration_since(window_start) > window {
                window_start = now;
                restarts_in_window = 0;
                backoff_ms = 200;
            }
            restarts_in_window = restarts_in_window.saturating_add(1);
            tracing::error!(
                target: "vigil::tasks",
                task = %name_for_task,
                backoff_ms,
                restarts_in_window,
                "supervised task panicked; restarting"
            );
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms = backoff_ms.saturating_mul(2).min(10_000);
        }
    });
    TaskHandle::new(name_cow, handle)
}
