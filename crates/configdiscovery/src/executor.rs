//! # Executors
//!
//! An [`Executor`] runs one supervised task per available item. It is itself
//! an observer: making an item available starts its task, making it
//! unavailable cancels the task and waits for it to finish, so nothing the
//! task does can race past the unavailable call.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use futures::FutureExt;
use futures::future::BoxFuture;
use futures::future::Shared;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use crate::client::Client;
use crate::client::ClientObserver;
use crate::connector::Connector;
use crate::error::Result;
use crate::inspector::Inspector;
use crate::target::Target;
use crate::target::TargetObserver;

type TaskFn<T> = Arc<dyn Fn(CancellationToken, T) -> BoxFuture<'static, ()> + Send + Sync>;

/// Resolves once the task has finished. Any number of callers may await it.
type Done = Shared<BoxFuture<'static, ()>>;

struct Task {
    id: u64,
    cancel: CancellationToken,
    done: Done,
    /// Cancelled but not yet finished. The entry stays until `done`
    /// resolves so that at most one task per item exists at a time.
    stopping: bool,
}

pub struct Executor<T> {
    parent: CancellationToken,
    task: TaskFn<T>,
    tasks: Mutex<HashMap<T, Task>>,
    next_id: AtomicU64,
}

/// Runs a task per available target.
pub type TargetExecutor = Executor<Target>;

/// Runs a task per connected client.
pub type ClientExecutor = Executor<Client>;

impl<T> Executor<T>
where
    T: Clone + Eq + Hash + Send + 'static,
{
    /// Creates an executor whose tasks are children of `parent`; cancelling
    /// `parent` cancels every task.
    pub fn new(
        parent: CancellationToken,
        task: impl Fn(CancellationToken, T) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    ) -> Self {
        Self { parent, task: Arc::new(task), tasks: Mutex::new(HashMap::new()), next_id: AtomicU64::new(0) }
    }

    /// Starts a task for `item` unless one is already running.
    ///
    /// If the previous task for `item` is still stopping, waits for it to
    /// finish first.
    pub async fn start(&self, item: &T) -> bool {
        loop {
            let (id, done) = {
                let mut tasks = self.lock();
                match tasks.get(item) {
                    Some(task) if task.stopping => (task.id, task.done.clone()),
                    Some(_) => return false,
                    None => {
                        let task = self.spawn(item);
                        tasks.insert(item.clone(), task);
                        return true;
                    }
                }
            };
            done.await;
            self.forget(item, id);
        }
    }

    /// Cancels the task for `item` and waits for it to finish. Returns false
    /// if no task was tracked.
    pub async fn stop(&self, item: &T) -> bool {
        let (id, done) = {
            let mut tasks = self.lock();
            let Some(task) = tasks.get_mut(item) else {
                return false;
            };
            task.stopping = true;
            task.cancel.cancel();
            (task.id, task.done.clone())
        };
        done.await;
        self.forget(item, id);
        true
    }

    /// Cancels every task and waits for all of them to finish.
    pub async fn stop_all(&self) {
        let pending: Vec<(T, u64, Done)> = {
            let mut tasks = self.lock();
            tasks
                .iter_mut()
                .map(|(item, task)| {
                    task.stopping = true;
                    task.cancel.cancel();
                    (item.clone(), task.id, task.done.clone())
                })
                .collect()
        };
        join_all(pending.iter().map(|(_, _, done)| done.clone())).await;
        for (item, id, _) in &pending {
            self.forget(item, *id);
        }
    }

    /// Number of tracked tasks, including ones that are still stopping.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn spawn(&self, item: &T) -> Task {
        let cancel = self.parent.child_token();
        let handle = tokio::spawn((self.task)(cancel.clone(), item.clone()));
        let done = async move {
            if let Err(e) = handle.await {
                warn!(error = %e, "supervised task did not finish cleanly");
            }
        }
        .boxed()
        .shared();
        Task { id: self.next_id.fetch_add(1, Ordering::Relaxed), cancel, done, stopping: false }
    }

    /// Drops the entry for `item` if it still belongs to task `id`.
    fn forget(&self, item: &T, id: u64) {
        let mut tasks = self.lock();
        if tasks.get(item).is_some_and(|task| task.id == id) {
            tasks.remove(item);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<T, Task>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TargetExecutor {
    /// Runs `connector` against every available target.
    pub fn for_connector(parent: CancellationToken, connector: Arc<Connector>) -> Self {
        Self::new(parent, move |cancel, target| {
            let connector = connector.clone();
            Box::pin(async move { log_exit("connector", &target.name, connector.watch(&cancel, &target).await) })
        })
    }
}

impl ClientExecutor {
    /// Runs `inspector` against every connected client.
    pub fn for_inspector(parent: CancellationToken, inspector: Arc<Inspector>) -> Self {
        Self::new(parent, move |cancel, client| {
            let inspector = inspector.clone();
            Box::pin(async move {
                let name = client.target().name.clone();
                log_exit("inspector", &name, inspector.run(&cancel, &client).await)
            })
        })
    }
}

fn log_exit(task: &str, name: &str, result: Result<()>) {
    match result {
        Ok(()) => debug!(task, name, "task finished"),
        Err(e) if e.is_cancelled() => debug!(task, name, "task cancelled"),
        Err(e) => warn!(task, name, error = %e, "task failed"),
    }
}

#[async_trait::async_trait]
impl TargetObserver for TargetExecutor {
    async fn target_available(&self, target: &Target) {
        self.start(target).await;
    }

    async fn target_unavailable(&self, target: &Target) {
        self.stop(target).await;
    }
}

#[async_trait::async_trait]
impl ClientObserver for ClientExecutor {
    async fn client_connected(&self, client: &Client) {
        self.start(client).await;
    }

    async fn client_disconnected(&self, client: &Client) {
        self.stop(client).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use std::sync::atomic::Ordering;

    use super::*;

    fn counting(parent: &CancellationToken, finished: Arc<AtomicUsize>) -> Executor<u32> {
        Executor::new(parent.clone(), move |cancel, _| {
            let finished = finished.clone();
            Box::pin(async move {
                cancel.cancelled().await;
                finished.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let finished = Arc::new(AtomicUsize::new(0));
        let exec = counting(&CancellationToken::new(), finished.clone());

        assert!(exec.start(&1).await);
        assert!(!exec.start(&1).await);
        assert_eq!(exec.len(), 1);

        assert!(exec.stop(&1).await);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(!exec.stop(&1).await);
        assert!(exec.is_empty());
    }

    #[tokio::test]
    async fn test_stop_all_waits_for_every_task() {
        let finished = Arc::new(AtomicUsize::new(0));
        let exec = counting(&CancellationToken::new(), finished.clone());
        for i in 0..3 {
            exec.start(&i).await;
        }
        exec.stop_all().await;
        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert!(exec.is_empty());
    }

    #[tokio::test]
    async fn test_parent_cancellation_reaches_tasks() {
        let parent = CancellationToken::new();
        let finished = Arc::new(AtomicUsize::new(0));
        let exec = counting(&parent, finished.clone());
        exec.start(&7).await;

        parent.cancel();
        // The task already ended; stopping only collects it.
        assert!(exec.stop(&7).await);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_waits_for_a_stop_in_flight() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let exec = Arc::new(Executor::<u32>::new(CancellationToken::new(), {
            let (running, peak) = (running.clone(), peak.clone());
            move |cancel, _| {
                let (running, peak) = (running.clone(), peak.clone());
                Box::pin(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    cancel.cancelled().await;
                    // Slow teardown, like delivering a disconnect.
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            }
        }));

        assert!(exec.start(&1).await);
        let stopping = {
            let exec = exec.clone();
            tokio::spawn(async move { exec.stop(&1).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Returns only after the old task is gone, then starts a new one.
        assert!(exec.start(&1).await);
        assert!(stopping.await.unwrap());
        assert_eq!(exec.len(), 1);

        exec.stop(&1).await;
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(running.load(Ordering::SeqCst), 0);
        assert!(exec.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_stops_both_wait() {
        let finished = Arc::new(AtomicUsize::new(0));
        let exec = counting(&CancellationToken::new(), finished.clone());
        exec.start(&1).await;

        let (a, b) = tokio::join!(exec.stop(&1), exec.stop(&1));
        assert!(a && b);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(exec.is_empty());
    }
}
