//! Manages the lifecycle of the background tasks that run next to the poller.
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, Instrument};

/// A centralized manager for spawned tasks.
///
/// This struct is responsible for:
/// - Spawning tasks and keeping track of their `JoinHandle`s.
/// - Handing out the shutdown receiver those tasks listen on.
/// - Awaiting all tasks on shutdown and reporting the ones that panicked.
#[derive(Clone, Debug)]
pub struct TaskManager {
    handles: Arc<Mutex<Vec<(&'static str, JoinHandle<()>)>>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl TaskManager {
    /// Creates a new `TaskManager` whose tasks stop on `shutdown_rx`.
    pub fn new(shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            handles: Arc::new(Mutex::new(Vec::new())),
            shutdown_rx,
        }
    }

    /// Spawns a new task and adds its handle to the manager.
    ///
    /// The task runs inside the caller's current span.
    pub fn spawn<F>(&self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        debug!(task_name = name, "Spawning task");
        let handle = tokio::spawn(future.in_current_span());
        self.lock_handles().push((name, handle));
    }

    /// Returns a clone of the shutdown receiver.
    pub fn get_shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Number of tasks spawned and not yet awaited.
    pub fn len(&self) -> usize {
        self.lock_handles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits for all managed tasks to complete.
    ///
    /// The caller is expected to have triggered the shutdown signal first.
    /// Returns the names of the tasks that panicked.
    pub async fn shutdown(self) -> Vec<&'static str> {
        let handles = self.lock_handles().drain(..).collect::<Vec<_>>();
        info!(
            "TaskManager shutting down. Waiting for {} tasks to complete...",
            handles.len()
        );

        let (task_names, handles): (Vec<&'static str>, Vec<JoinHandle<()>>) =
            handles.into_iter().unzip();
        let results = join_all(handles).await;

        let mut panicked = Vec::new();
        for (task_name, result) in task_names.into_iter().zip(results) {
            match result {
                Ok(()) => debug!(task_name, "Task shut down gracefully."),
                Err(e) => {
                    error!(task_name, error = %e, "Task panicked during shutdown.");
                    panicked.push(task_name);
                }
            }
        }

        if panicked.is_empty() {
            info!("All tasks shut down gracefully.");
        } else {
            error!("{} tasks panicked during shutdown: {:?}", panicked.len(), panicked);
        }
        panicked
    }

    fn lock_handles(&self) -> std::sync::MutexGuard<'_, Vec<(&'static str, JoinHandle<()>)>> {
        // A poisoned lock only means a spawn panicked mid-push; the list is still usable.
        self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_awaits_tasks() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let manager = TaskManager::new(shutdown_rx);

        for name in ["first", "second"] {
            let mut rx = manager.get_shutdown_rx();
            manager.spawn(name, async move {
                let _ = rx.changed().await;
            });
        }
        assert_eq!(manager.len(), 2);
        assert!(!manager.is_empty());

        shutdown_tx.send(true).unwrap();
        let panicked = tokio::time::timeout(Duration::from_secs(1), manager.shutdown())
            .await
            .expect("tasks did not stop");

        assert!(panicked.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_reports_panicked_tasks() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let manager = TaskManager::new(shutdown_rx);
        assert!(manager.is_empty());

        manager.spawn("healthy", async {});
        manager.spawn("broken", async { panic!("task failure") });

        let panicked = manager.shutdown().await;

        assert_eq!(panicked, vec!["broken"]);
    }
}
