//! Worker Pool
//!
//! A fixed set of named worker threads draining one shared FIFO queue.
//!
//! # Locking
//! The queue has its own mutex, held only to push or pop a task. Tasks run
//! with no pool lock held, so a task blocked on store I/O never stalls
//! submission or other workers.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::{Condvar, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::error::{KvError, Result};

/// Unit of work executed by a worker thread.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

struct Queue {
    tasks: VecDeque<Task>,
    shutdown: bool,
    /// Workers that have not yet exited their loop
    live_workers: usize,
}

struct Shared {
    queue: Mutex<Queue>,
    available: Condvar,
    /// Signalled each time a worker exits
    exited: Condvar,
    panicked: AtomicU64,
}

// == Worker Pool ==
/// Bounded pool of worker threads with an unbounded task queue.
///
/// Tasks start in submission order; with more than one worker their
/// completion order is unspecified.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_ids: Vec<ThreadId>,
    size: usize,
}

impl WorkerPool {
    // == Constructor ==
    /// Spawns `size` worker threads named `kv-worker-<n>`.
    ///
    /// # Panics
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> std::io::Result<Self> {
        assert!(size > 0, "Worker count must be greater than 0");

        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                tasks: VecDeque::new(),
                shutdown: false,
                live_workers: 0,
            }),
            available: Condvar::new(),
            exited: Condvar::new(),
            panicked: AtomicU64::new(0),
        });

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("kv-worker-{}", id))
                .spawn(move || worker_loop(id, &worker_shared));

            match spawned {
                Ok(handle) => {
                    shared.queue.lock().live_workers += 1;
                    workers.push(handle);
                }
                Err(err) => {
                    error!("Failed to spawn worker {}: {}", id, err);
                    stop_and_join(&shared, workers);
                    return Err(err);
                }
            }
        }

        info!("Worker pool started with {} workers", size);

        let worker_ids = workers.iter().map(|handle| handle.thread().id()).collect();
        Ok(Self {
            shared,
            workers: Mutex::new(workers),
            worker_ids,
            size,
        })
    }

    // == Submit ==
    /// Queues a task and wakes one idle worker. Never blocks.
    ///
    /// Fails with [`KvError::ShuttingDown`] once shutdown has begun.
    pub fn submit<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut queue = self.shared.queue.lock();
            if queue.shutdown {
                return Err(KvError::ShuttingDown);
            }
            queue.tasks.push_back(Box::new(task));
        }
        self.shared.available.notify_one();
        Ok(())
    }

    // == Execute ==
    /// Queues `job` and returns a receiver for its output.
    ///
    /// If the job panics the sender is dropped during unwinding, so the
    /// receiver resolves to an error instead of hanging.
    pub fn execute<F, T>(&self, job: F) -> Result<oneshot::Receiver<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply, receiver) = oneshot::channel();
        self.submit(move || {
            if reply.send(job()).is_err() {
                debug!("Requester went away before the task completed");
            }
        })?;
        Ok(receiver)
    }

    // == Run ==
    /// Runs a fallible job on the pool and awaits its result.
    pub async fn run<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let receiver = self.execute(job)?;
        receiver
            .await
            .map_err(|_| KvError::Internal("task terminated without a reply".to_string()))?
    }

    // == Shutdown ==
    /// Stops accepting tasks, lets workers drain the queue, and joins them.
    ///
    /// Idempotent, and every caller returns only once all workers have
    /// exited, not just the caller that joins the handles. When called from
    /// inside a task the calling worker is neither joined nor waited for; it
    /// exits after its current task.
    pub fn shutdown(&self) {
        {
            let mut queue = self.shared.queue.lock();
            if !queue.shutdown {
                info!(
                    "Worker pool shutting down, draining {} queued tasks",
                    queue.tasks.len()
                );
                queue.shutdown = true;
            }
        }

        let workers = std::mem::take(&mut *self.workers.lock());
        stop_and_join(&self.shared, workers);

        let own_worker = usize::from(self.worker_ids.contains(&thread::current().id()));
        let mut queue = self.shared.queue.lock();
        while queue.live_workers > own_worker {
            self.shared.exited.wait(&mut queue);
        }
    }

    pub fn worker_count(&self) -> usize {
        self.size
    }

    /// Number of tasks waiting for a worker.
    pub fn queued(&self) -> usize {
        self.shared.queue.lock().tasks.len()
    }

    /// Number of tasks that panicked since the pool started.
    pub fn panicked(&self) -> u64 {
        self.shared.panicked.load(Ordering::Relaxed)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.queue.lock().shutdown
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("queued", &self.queued())
            .finish()
    }
}

/// Sets the stop flag, wakes every worker and joins the given handles.
fn stop_and_join(shared: &Shared, workers: Vec<JoinHandle<()>>) {
    shared.queue.lock().shutdown = true;
    shared.available.notify_all();

    let current = thread::current().id();
    for handle in workers {
        if handle.thread().id() == current {
            continue;
        }
        if handle.join().is_err() {
            warn!("Worker thread terminated abnormally");
        }
    }
}

fn worker_loop(id: usize, shared: &Shared) {
    debug!("Worker {} started", id);

    loop {
        let task = {
            let mut queue = shared.queue.lock();
            loop {
                if let Some(task) = queue.tasks.pop_front() {
                    break task;
                }
                if queue.shutdown {
                    queue.live_workers -= 1;
                    shared.exited.notify_all();
                    debug!("Worker {} exiting", id);
                    return;
                }
                shared.available.wait(&mut queue);
            }
        };

        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            shared.panicked.fetch_add(1, Ordering::Relaxed);
            error!("Worker {}: task panicked, worker continues", id);
        }
    }
}
