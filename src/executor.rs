//! Serial command queue
//!
//! This module provides:
//! - `CommandExecutor`, which runs submitted operations one at a time in
//!   submission order on a dedicated worker task
//! - `TaskHandle`, a future resolving to the operation's own result
//!
//! A failing (or panicking) operation never stops the queue; the next
//! operation starts as soon as the previous one settled.

use crate::error::ExecutorError;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

struct QueuedTask {
    id: u64,
    job: Job,
}

#[derive(Default)]
struct ExecutorState {
    pending: AtomicUsize,
    running: AtomicBool,
    next_id: AtomicU64,
}

/// FIFO executor with at most one operation in flight
pub struct CommandExecutor {
    sender: mpsc::UnboundedSender<QueuedTask>,
    state: Arc<ExecutorState>,
}

impl CommandExecutor {
    /// Create the executor and spawn its worker on the current tokio runtime
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let state = Arc::new(ExecutorState::default());
        tokio::spawn(run_worker(receiver, Arc::clone(&state)));
        Self { sender, state }
    }

    /// Enqueue `operation`; it is invoked only after every earlier
    /// submission has settled.
    ///
    /// Dropping the returned handle does not cancel the operation.
    pub fn submit<F, Fut, T, E>(&self, operation: F) -> TaskHandle<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<ExecutorError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let job: Job = Box::pin(async move {
            let result = operation().await;
            // Receiver may be gone; the operation still ran to completion
            let _ = tx.send(result);
        });

        self.state.pending.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(QueuedTask { id, job }).is_err() {
            // Worker is gone: the job (and its sender) is dropped, so the
            // handle resolves to `Aborted`
            self.state.pending.fetch_sub(1, Ordering::SeqCst);
            warn!(task = id, "command queue is closed");
        } else {
            debug!(task = id, "command queued");
        }

        TaskHandle { receiver: rx }
    }

    /// Number of operations queued or in flight
    pub fn pending(&self) -> usize {
        self.state.pending.load(Ordering::SeqCst)
    }

    /// Returns true while an operation is in flight
    pub fn is_busy(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }
}

async fn run_worker(mut receiver: mpsc::UnboundedReceiver<QueuedTask>, state: Arc<ExecutorState>) {
    while let Some(QueuedTask { id, job }) = receiver.recv().await {
        state.running.store(true, Ordering::SeqCst);
        debug!(task = id, "command started");

        // Spawned so a panic surfaces as a JoinError instead of killing the worker
        match tokio::spawn(job).await {
            Ok(()) => debug!(task = id, "command finished"),
            Err(e) => warn!(task = id, error = %e, "command aborted"),
        }

        state.running.store(false, Ordering::SeqCst);
        state.pending.fetch_sub(1, Ordering::SeqCst);
    }
    debug!("command queue closed");
}

/// Completion handle for a submitted operation
#[derive(Debug)]
pub struct TaskHandle<T, E> {
    receiver: oneshot::Receiver<Result<T, E>>,
}

impl<T, E: From<ExecutorError>> Future for TaskHandle<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver)
            .poll(cx)
            .map(|received| match received {
                Ok(result) => result,
                Err(_) => Err(ExecutorError::Aborted.into()),
            })
    }
}
