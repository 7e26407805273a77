use crossbeam::channel::{Receiver, Sender, unbounded};
use log::{debug, info, warn};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use super::{Executor, SubmitError, Task};

/// Configuration for a [`ThreadPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads. Must be greater than 0.
    pub threads: usize,
    /// Prefix for worker thread names. Workers are named `"{name}-{index}"`.
    pub name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            name: String::from("herald-pool"),
        }
    }
}

enum Message {
    Task(Task),
    Shutdown,
}

struct Worker {
    id: usize,
    handle: Option<thread::JoinHandle<()>>,
}

/// A fixed-size pool of worker threads fed from a shared FIFO queue.
/// Tasks can be submitted from any thread and will be executed by worker threads.
///
/// Dropping the pool stops accepting new work, lets the workers drain everything that was
/// queued before the drop, and joins them.
pub struct ThreadPool {
    name: String,
    sender: Sender<Message>,
    closed: Arc<AtomicBool>,
    workers: Vec<Worker>,
}

impl ThreadPool {
    /// Creates a pool with `size` workers and the default thread name prefix.
    ///
    /// # Panics
    ///
    /// Panics if `size` is 0.
    pub fn new(size: usize) -> io::Result<Self> {
        Self::with_config(PoolConfig {
            threads: size,
            ..PoolConfig::default()
        })
    }

    /// Creates a pool with a single worker. Tasks run one at a time in submission order.
    pub fn single_threaded(name: impl Into<String>) -> io::Result<Self> {
        Self::with_config(PoolConfig {
            threads: 1,
            name: name.into(),
        })
    }

    /// Creates a pool from a [`PoolConfig`].
    ///
    /// # Panics
    ///
    /// Panics if `config.threads` is 0.
    pub fn with_config(config: PoolConfig) -> io::Result<Self> {
        assert!(config.threads > 0, "Thread pool size must be greater than 0");

        let (sender, receiver) = unbounded();
        let mut workers = Vec::with_capacity(config.threads);

        for id in 0..config.threads {
            match Worker::new(id, &config.name, receiver.clone()) {
                Ok(worker) => workers.push(worker),
                Err(err) => {
                    // Stop the workers that did start before reporting the failure.
                    for _ in &workers {
                        let _ = sender.send(Message::Shutdown);
                    }
                    for worker in &mut workers {
                        worker.join();
                    }
                    return Err(err);
                }
            }
        }

        info!("Started pool '{}' with {} worker(s)", config.name, config.threads);

        Ok(ThreadPool {
            name: config.name,
            sender,
            closed: Arc::new(AtomicBool::new(false)),
            workers,
        })
    }

    /// Queues a task for execution on one of the workers.
    /// Tasks are started in FIFO order, but completion order is non-deterministic.
    pub fn execute<F>(&self, f: F) -> Result<(), SubmitError>
    where
        F: FnOnce() + Send + 'static,
    {
        send(&self.sender, &self.closed, Box::new(f))
    }

    /// Returns a handle that can be used to submit tasks from other threads.
    ///
    /// The handle may outlive the pool; submissions after the pool is dropped fail with
    /// [`SubmitError::Shutdown`].
    pub fn handle(&self) -> PoolHandle {
        PoolHandle {
            sender: self.sender.clone(),
            closed: Arc::clone(&self.closed),
        }
    }

    /// Returns the number of worker threads in the pool.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Returns the thread name prefix of this pool.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Executor for ThreadPool {
    fn submit(&self, task: Task) -> Result<(), SubmitError> {
        send(&self.sender, &self.closed, task)
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);

        // Shutdown markers queue behind any pending tasks, so those still run.
        for _ in &self.workers {
            let _ = self.sender.send(Message::Shutdown);
        }

        for worker in &mut self.workers {
            worker.join();
        }

        info!("Pool '{}' shut down", self.name);
    }
}

impl Worker {
    fn new(id: usize, pool_name: &str, receiver: Receiver<Message>) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name(format!("{pool_name}-{id}"))
            .spawn(move || {
                loop {
                    match receiver.recv() {
                        Ok(Message::Task(task)) => {
                            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                                warn!("Worker {id} recovered from a panicking task");
                            }
                        }
                        Ok(Message::Shutdown) => {
                            break;
                        }
                        Err(_) => {
                            // Channel disconnected, exit
                            break;
                        }
                    }
                }
            })?;

        Ok(Worker {
            id,
            handle: Some(handle),
        })
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Worker {} exited abnormally", self.id);
            } else {
                debug!("Worker {} stopped", self.id);
            }
        }
    }
}

/// A handle to submit tasks to a [`ThreadPool`] from other threads.
/// Clone this handle to share it across threads.
#[derive(Clone)]
pub struct PoolHandle {
    sender: Sender<Message>,
    closed: Arc<AtomicBool>,
}

impl PoolHandle {
    /// Queues a task on the pool this handle was taken from.
    pub fn execute<F>(&self, f: F) -> Result<(), SubmitError>
    where
        F: FnOnce() + Send + 'static,
    {
        send(&self.sender, &self.closed, Box::new(f))
    }

    /// Returns `true` once the owning pool has been dropped.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Executor for PoolHandle {
    fn submit(&self, task: Task) -> Result<(), SubmitError> {
        send(&self.sender, &self.closed, task)
    }
}

fn send(sender: &Sender<Message>, closed: &AtomicBool, task: Task) -> Result<(), SubmitError> {
    if closed.load(Ordering::SeqCst) {
        return Err(SubmitError::Shutdown);
    }
    sender
        .send(Message::Task(task))
        .map_err(|_| SubmitError::Shutdown)
}
