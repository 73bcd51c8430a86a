//! Posted task queue for handing work back to the UI thread.
//!
//! Background threads never mutate UI-owned state directly. They post a
//! closure through a [`UiTaskSender`], and the UI thread applies it during
//! its own turn by calling [`UiTaskQueue::process_batch`] or
//! [`UiTaskQueue::process_all`].
//!
//! There is no cancel call. A task that applies a late result (an image that
//! finished loading, say) checks the identity token of its target when it
//! runs and returns early if the target was replaced or removed meanwhile.
//!
//! # Example
//!
//! ```
//! use horizon_listsync_core::UiTaskQueue;
//! use std::cell::Cell;
//!
//! let queue = UiTaskQueue::<Cell<u32>>::new();
//! let sender = queue.sender();
//!
//! std::thread::spawn(move || {
//!     sender.post(|counter: &Cell<u32>| counter.set(counter.get() + 1)).unwrap();
//! })
//! .join()
//! .unwrap();
//!
//! let counter = Cell::new(0);
//! assert_eq!(queue.process_all(&counter), 1);
//! assert_eq!(counter.get(), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::SignalError;
use crate::logging::{PerfSpan, span_names, targets};

/// A unique identifier for a posted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw u64 value of this task ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Global counter for generating unique task IDs.
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

/// A boxed task closure run against the UI-side context.
type BoxedTask<C> = Box<dyn FnOnce(&C) + Send + 'static>;

struct TaskData<C> {
    id: TaskId,
    task: BoxedTask<C>,
}

/// Cloneable, `Send` handle for posting tasks from any thread.
pub struct UiTaskSender<C> {
    sender: Sender<TaskData<C>>,
}

impl<C> Clone for UiTaskSender<C> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<C> UiTaskSender<C> {
    /// Post a task to be run on the UI thread.
    ///
    /// Fails with [`SignalError::QueueClosed`] once the queue has been dropped.
    pub fn post<F>(&self, task: F) -> Result<TaskId, SignalError>
    where
        F: FnOnce(&C) + Send + 'static,
    {
        let id = next_task_id();
        self.sender
            .send(TaskData {
                id,
                task: Box::new(task),
            })
            .map_err(|_| SignalError::QueueClosed)?;
        tracing::trace!(target: targets::TASK, task_id = id.as_u64(), "task posted");
        Ok(id)
    }
}

/// The UI-thread end of the posted task queue.
pub struct UiTaskQueue<C> {
    sender: Sender<TaskData<C>>,
    receiver: Receiver<TaskData<C>>,
    batch_size: usize,
}

impl<C> Default for UiTaskQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> UiTaskQueue<C> {
    /// Create a new task queue.
    pub fn new() -> Self {
        Self::with_batch_size(10)
    }

    /// Create a new task queue with a custom batch size.
    pub fn with_batch_size(batch_size: usize) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            batch_size: batch_size.max(1),
        }
    }

    /// Get a sender that can be moved to other threads.
    pub fn sender(&self) -> UiTaskSender<C> {
        UiTaskSender {
            sender: self.sender.clone(),
        }
    }

    /// Post a task from the UI thread itself.
    pub fn post<F>(&self, task: F) -> TaskId
    where
        F: FnOnce(&C) + Send + 'static,
    {
        let id = next_task_id();
        // The queue owns a receiver, so the channel cannot be disconnected here.
        let _ = self.sender.send(TaskData {
            id,
            task: Box::new(task),
        });
        id
    }

    /// Check if there are any pending tasks.
    pub fn has_pending(&self) -> bool {
        !self.receiver.is_empty()
    }

    /// Get the number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Process up to `batch_size` tasks.
    ///
    /// Returns the number of tasks processed.
    pub fn process_batch(&self, context: &C) -> usize {
        let _span = PerfSpan::new(span_names::TASK);
        let mut count = 0;
        while count < self.batch_size {
            match self.receiver.try_recv() {
                Ok(data) => {
                    Self::run(data, context);
                    count += 1;
                }
                Err(_) => break,
            }
        }
        count
    }

    /// Process all pending tasks, including ones posted while processing.
    ///
    /// Returns the number of tasks processed.
    pub fn process_all(&self, context: &C) -> usize {
        let _span = PerfSpan::new(span_names::TASK);
        let mut count = 0;
        while let Ok(data) = self.receiver.try_recv() {
            Self::run(data, context);
            count += 1;
        }
        count
    }

    fn run(data: TaskData<C>, context: &C) {
        let _span = tracing::trace_span!(target: targets::TASK, "ui_task", task_id = data.id.as_u64()).entered();
        (data.task)(context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_post_and_process_in_order() {
        let queue = UiTaskQueue::<RefCell<Vec<u32>>>::new();
        queue.post(|log| log.borrow_mut().push(1));
        queue.post(|log| log.borrow_mut().push(2));
        assert_eq!(queue.pending_count(), 2);

        let log = RefCell::new(Vec::new());
        assert_eq!(queue.process_all(&log), 2);
        assert_eq!(*log.borrow(), vec![1, 2]);
        assert!(!queue.has_pending());
    }

    #[test]
    fn test_batch_limit() {
        let queue = UiTaskQueue::<RefCell<u32>>::with_batch_size(3);
        for _ in 0..5 {
            queue.post(|n| *n.borrow_mut() += 1);
        }
        let n = RefCell::new(0);
        assert_eq!(queue.process_batch(&n), 3);
        assert_eq!(queue.process_batch(&n), 2);
        assert_eq!(*n.borrow(), 5);
    }

    #[test]
    fn test_cross_thread_post() {
        let queue = UiTaskQueue::<RefCell<Vec<usize>>>::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sender = queue.sender();
                std::thread::spawn(move || {
                    sender.post(move |log| log.borrow_mut().push(i)).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let log = RefCell::new(Vec::new());
        assert_eq!(queue.process_all(&log), 4);
        let mut seen = log.into_inner();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_post_after_queue_dropped() {
        let queue = UiTaskQueue::<()>::new();
        let sender = queue.sender();
        drop(queue);
        assert_eq!(sender.post(|_| {}), Err(SignalError::QueueClosed));
    }

    #[test]
    fn test_task_ids_increase() {
        let queue = UiTaskQueue::<()>::new();
        let a = queue.post(|_| {});
        let b = queue.post(|_| {});
        assert!(b > a);
    }
}
