//! Privileged execution contexts.
//!
//! Host state may only be touched from one thread. Work destined for that
//! thread travels through a [`TaskQueue`] and is drained by the matching
//! [`TaskPump`], either from the host's own loop via
//! [`TaskPump::run_pending`] or on a dedicated thread via [`WorkerContext`].

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};
use thiserror::Error;
use tracing::{debug, error};

use super::BRIDGE_TARGET;

const CLOSE_POLL: Duration = Duration::from_millis(50);

/// Unit of work run on the privileged context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Returned when a task is submitted to a context that no longer accepts work.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("execution context is closed")]
pub struct ContextClosed;

/// A place work can be submitted for serial execution on the host's
/// privileged thread.
pub trait ExecutionContext: Send + Sync {
    /// Enqueues a task. Tasks run one at a time in submission order.
    ///
    /// # Errors
    ///
    /// Returns [`ContextClosed`] when the context has shut down.
    fn submit(&self, task: Task) -> Result<(), ContextClosed>;
}

impl<T> ExecutionContext for Arc<T>
where
    T: ExecutionContext + ?Sized,
{
    fn submit(&self, task: Task) -> Result<(), ContextClosed> {
        (**self).submit(task)
    }
}

/// Creates a connected queue and pump.
#[must_use]
pub fn task_queue() -> (TaskQueue, TaskPump) {
    let (sender, receiver) = unbounded();
    let closed = Arc::new(AtomicBool::new(false));
    (
        TaskQueue {
            sender,
            closed: Arc::clone(&closed),
        },
        TaskPump { receiver, closed },
    )
}

/// Submit side of a task queue. Cheap to clone.
#[derive(Clone)]
pub struct TaskQueue {
    sender: Sender<Task>,
    closed: Arc<AtomicBool>,
}

impl TaskQueue {
    /// Stops accepting tasks. Tasks already queued are still run by the pump.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Whether [`TaskQueue::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ExecutionContext for TaskQueue {
    fn submit(&self, task: Task) -> Result<(), ContextClosed> {
        if self.is_closed() {
            return Err(ContextClosed);
        }
        self.sender.send(task).map_err(|_| ContextClosed)
    }
}

/// Drain side of a task queue, owned by the privileged thread.
pub struct TaskPump {
    receiver: Receiver<Task>,
    closed: Arc<AtomicBool>,
}

impl TaskPump {
    /// Runs every task queued right now without blocking. Returns the number
    /// of tasks run.
    ///
    /// Hosts with their own main loop call this once per tick.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(task) => {
                    run_task(task);
                    ran += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return ran,
            }
        }
    }

    /// Runs tasks as they arrive until the queue is closed or every sender
    /// is dropped, then drains what is left.
    pub fn run_until_closed(&self) {
        while !self.closed.load(Ordering::SeqCst) {
            match self.receiver.recv_timeout(CLOSE_POLL) {
                Ok(task) => run_task(task),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
        self.run_pending();
    }
}

fn run_task(task: Task) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
        error!(
            target: BRIDGE_TARGET,
            panic = %panic_message(payload.as_ref()),
            "task panicked on the execution context"
        );
    }
}

/// Extracts the message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unknown panic payload")
    }
}

/// Privileged context backed by a dedicated thread.
///
/// Used by hosts without a main loop of their own and by the daemon binary.
pub struct WorkerContext {
    queue: TaskQueue,
    handle: Option<thread::JoinHandle<()>>,
}

impl WorkerContext {
    /// Spawns the worker thread.
    ///
    /// # Errors
    ///
    /// Returns the operating system error when the thread cannot be created.
    pub fn spawn(name: &str) -> io::Result<Self> {
        let (queue, pump) = task_queue();
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                debug!(target: BRIDGE_TARGET, "execution context started");
                pump.run_until_closed();
                debug!(target: BRIDGE_TARGET, "execution context stopped");
            })?;
        Ok(Self {
            queue,
            handle: Some(handle),
        })
    }

    /// A submit handle for this worker.
    #[must_use]
    pub fn queue(&self) -> TaskQueue {
        self.queue.clone()
    }

    /// Closes the queue and waits for queued tasks to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.queue.close();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!(target: BRIDGE_TARGET, "execution context thread panicked");
        }
    }
}

impl ExecutionContext for WorkerContext {
    fn submit(&self, task: Task) -> Result<(), ContextClosed> {
        self.queue.submit(task)
    }
}

impl Drop for WorkerContext {
    fn drop(&mut self) {
        self.stop();
    }
}
