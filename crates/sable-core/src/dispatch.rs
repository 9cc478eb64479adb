//! Owner-thread dispatch.
//!
//! Some graphics work has to run on the thread that owns the device. A
//! [`ThreadDispatcher`] lives on that thread and drains a job queue whenever
//! it is pumped. Other threads hold a cloneable [`DispatchHandle`] and call
//! [`DispatchHandle::invoke`], which blocks until the owner has run the job
//! and hands the result back.
//!
//! ```
//! use sable_core::dispatch::ThreadDispatcher;
//!
//! let dispatcher = ThreadDispatcher::new();
//! let handle = dispatcher.handle();
//!
//! let worker = std::thread::spawn(move || handle.invoke(|| 6 * 7));
//! while !worker.is_finished() {
//!     dispatcher.pump_timeout(std::time::Duration::from_millis(10));
//! }
//! assert_eq!(worker.join().unwrap().unwrap(), 42);
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::{self, ThreadId};
use std::time::Duration;

use crate::profiling::profile_function;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Errors returned to the thread that invoked a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The dispatcher was dropped before the job could run.
    Disconnected,
    /// The job panicked on the owner thread.
    Panicked(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Disconnected => write!(f, "owner thread dispatcher is gone"),
            DispatchError::Panicked(msg) => write!(f, "dispatched job panicked: {}", msg),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Receives and runs jobs on the thread that created it.
pub struct ThreadDispatcher {
    sender: flume::Sender<Job>,
    receiver: flume::Receiver<Job>,
    owner: ThreadId,
}

impl ThreadDispatcher {
    /// Creates a dispatcher owned by the calling thread.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            sender,
            receiver,
            owner: thread::current().id(),
        }
    }

    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle {
            sender: self.sender.clone(),
            owner: self.owner,
        }
    }

    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Number of jobs waiting to be pumped.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Runs every queued job without waiting. Returns how many ran.
    pub fn pump(&self) -> usize {
        profile_function!();
        debug_assert_eq!(
            thread::current().id(),
            self.owner,
            "ThreadDispatcher pumped off its owner thread"
        );

        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Waits up to `timeout` for the first job, then drains the queue.
    pub fn pump_timeout(&self, timeout: Duration) -> usize {
        debug_assert_eq!(
            thread::current().id(),
            self.owner,
            "ThreadDispatcher pumped off its owner thread"
        );

        match self.receiver.recv_timeout(timeout) {
            Ok(job) => {
                job();
                1 + self.pump()
            }
            Err(_) => 0,
        }
    }
}

impl Default for ThreadDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ThreadDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadDispatcher")
            .field("owner", &self.owner)
            .field("pending", &self.receiver.len())
            .finish()
    }
}

/// Sends jobs to a [`ThreadDispatcher`].
#[derive(Clone, Debug)]
pub struct DispatchHandle {
    sender: flume::Sender<Job>,
    owner: ThreadId,
}

impl DispatchHandle {
    pub fn is_owner_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Runs `job` on the owner thread and returns its result.
    ///
    /// Called from the owner thread the job runs inline. From any other
    /// thread the call blocks until the owner pumps the queue.
    pub fn invoke<F, R>(&self, job: F) -> Result<R, DispatchError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_owner_thread() {
            return run_guarded(job);
        }

        let (reply, response) = flume::bounded(1);
        let job: Job = Box::new(move || {
            // The caller may have given up; nothing to report then.
            let _ = reply.send(run_guarded(job));
        });

        self.sender
            .send(job)
            .map_err(|_| DispatchError::Disconnected)?;

        response.recv().map_err(|_| DispatchError::Disconnected)?
    }
}

fn run_guarded<F, R>(job: F) -> Result<R, DispatchError>
where
    F: FnOnce() -> R,
{
    catch_unwind(AssertUnwindSafe(job)).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::warn!("Dispatched job panicked: {}", message);
        DispatchError::Panicked(message)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn pump_until_done<T>(dispatcher: &ThreadDispatcher, worker: &thread::JoinHandle<T>) {
        while !worker.is_finished() {
            dispatcher.pump_timeout(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_invoke_on_owner_runs_inline() {
        let dispatcher = ThreadDispatcher::new();
        let handle = dispatcher.handle();

        assert!(handle.is_owner_thread());
        assert_eq!(handle.invoke(|| 5), Ok(5));
        assert_eq!(dispatcher.pending(), 0);
    }

    #[test]
    fn test_cross_thread_invoke_blocks_until_pumped() {
        let dispatcher = ThreadDispatcher::new();
        let handle = dispatcher.handle();
        let owner = dispatcher.owner();
        let returned = Arc::new(AtomicBool::new(false));

        let flag = returned.clone();
        let worker = thread::spawn(move || {
            let ran_on = handle.invoke(|| thread::current().id());
            flag.store(true, Ordering::SeqCst);
            ran_on
        });

        // Nothing pumps yet, so the worker must still be waiting.
        while dispatcher.pending() == 0 {
            thread::yield_now();
        }
        assert!(!returned.load(Ordering::SeqCst));

        pump_until_done(&dispatcher, &worker);
        assert_eq!(worker.join().unwrap(), Ok(owner));
        assert!(returned.load(Ordering::SeqCst));
    }

    #[test]
    fn test_user_errors_are_returned() {
        let dispatcher = ThreadDispatcher::new();
        let handle = dispatcher.handle();

        let worker = thread::spawn(move || handle.invoke(|| Err::<(), _>("bad input".to_string())));
        pump_until_done(&dispatcher, &worker);

        assert_eq!(worker.join().unwrap(), Ok(Err("bad input".to_string())));
    }

    #[test]
    fn test_panic_becomes_error() {
        let dispatcher = ThreadDispatcher::new();
        let handle = dispatcher.handle();

        let worker = thread::spawn(move || handle.invoke(|| -> u32 { panic!("boom") }));
        pump_until_done(&dispatcher, &worker);

        assert_eq!(
            worker.join().unwrap(),
            Err(DispatchError::Panicked("boom".to_string()))
        );
    }

    #[test]
    fn test_dropped_dispatcher_disconnects() {
        let dispatcher = ThreadDispatcher::new();
        let handle = dispatcher.handle();
        drop(dispatcher);

        let result = thread::spawn(move || handle.invoke(|| 1)).join().unwrap();
        assert_eq!(result, Err(DispatchError::Disconnected));
    }

    #[test]
    fn test_pump_timeout_with_empty_queue() {
        let dispatcher = ThreadDispatcher::new();
        assert_eq!(dispatcher.pump_timeout(Duration::from_millis(1)), 0);
        assert_eq!(dispatcher.pump(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    fn test_pump_timeout_off_owner_thread_panics() {
        let dispatcher = ThreadDispatcher::new();
        let result = thread::spawn(move || dispatcher.pump_timeout(Duration::from_millis(1))).join();
        assert!(result.is_err());
    }
}
