//! Background execution for work that must stay off the render path.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Sender, unbounded};
use tracing::{debug, warn};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait Spawn: Send + Sync {
    fn spawn(&self, job: Job);
}

/// A single dedicated thread that runs jobs in submission order.
///
/// The thread exits once every handle to the worker has been dropped and the
/// queue is drained.
pub struct WorkerThread {
    tx: Sender<Job>,
}

impl WorkerThread {
    pub fn new(name: &str) -> std::io::Result<Self> {
        let (tx, rx) = unbounded::<Job>();
        thread::Builder::new().name(name.to_string()).spawn(move || {
            while let Ok(job) = rx.recv() {
                job();
            }
            debug!("worker queue closed");
        })?;
        Ok(WorkerThread { tx })
    }
}

impl Spawn for WorkerThread {
    fn spawn(&self, job: Job) {
        if self.tx.send(job).is_err() {
            warn!("worker thread is gone; dropping job");
        }
    }
}

/// Cooperative cancellation for a scheduled job. The job is live while the
/// shared token still holds the generation it was issued with.
#[derive(Clone, Debug)]
pub struct CancelToken {
    generation: u64,
    token: Arc<AtomicU64>,
}

impl CancelToken {
    pub fn new(token: Arc<AtomicU64>, generation: u64) -> Self { Self { generation, token } }

    pub fn is_cancelled(&self) -> bool { self.token.load(Ordering::Acquire) != self.generation }
}
