//! Where work runs and where its results land.
//!
//! Store calls go to a [`Background`] executor; completions and observer
//! events are queued on a [`MainQueue`] and run by whoever owns the matching
//! [`MainLoop`], usually a UI event loop.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait Executor: Send + Sync + 'static {
    fn execute(&self, job: Job);
}

/// Runs jobs on the blocking thread pool of a tokio runtime.
#[derive(Debug, Clone)]
pub struct Background {
    handle: Handle,
}

impl Background {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running inside.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| Error::NoRuntime)
    }
}

impl Executor for Background {
    fn execute(&self, job: Job) {
        // Detached; results travel back through the main queue.
        drop(self.handle.spawn_blocking(job));
    }
}

/// Sending half of the main execution context.
#[derive(Debug, Clone)]
pub struct MainQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl Executor for MainQueue {
    fn execute(&self, job: Job) {
        if self.tx.send(job).is_err() {
            tracing::debug!("main loop is gone, dropping delivery");
        }
    }
}

/// Owner of the main execution context. Jobs run on the thread that drives it.
#[derive(Debug)]
pub struct MainLoop {
    rx: mpsc::UnboundedReceiver<Job>,
}

pub fn main_queue() -> (MainQueue, MainLoop) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MainQueue { tx }, MainLoop { rx })
}

impl MainLoop {
    /// Run every job queued so far without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Wait for the next job and run it. `false` once every queue is dropped.
    pub async fn turn(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    pub async fn run(mut self) {
        while self.turn().await {}
    }
}

/// Run `work` on `background`, then hand its output to `resume` on `main`.
pub fn submit<T, W, R>(background: &dyn Executor, main: Arc<dyn Executor>, work: W, resume: R)
where
    T: Send + 'static,
    W: FnOnce() -> T + Send + 'static,
    R: FnOnce(T) + Send + 'static,
{
    background.execute(Box::new(move || {
        let value = work();
        main.execute(Box::new(move || resume(value)));
    }));
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use tokio::sync::oneshot;
    use tokio::time::timeout;

    use super::*;

    #[test]
    fn background_needs_a_runtime() {
        assert_eq!(Background::current().unwrap_err(), Error::NoRuntime);
    }

    #[test]
    fn run_pending_drains_in_order() {
        let (queue, mut main) = main_queue();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        for i in 0..3 {
            let seen = seen.clone();
            queue.execute(Box::new(move || seen.lock().unwrap().push(i)));
        }
        assert_eq!(main.run_pending(), 3);
        assert_eq!(main.run_pending(), 0);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn dropped_loop_discards_jobs() {
        let (queue, main) = main_queue();
        drop(main);
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        queue.execute(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn submit_works_off_main_and_resumes_on_main() {
        let (queue, mut main) = main_queue();
        let background = Background::current().unwrap();
        let main_thread = thread::current().id();
        let (tx, rx) = oneshot::channel();

        submit(
            &background,
            Arc::new(queue),
            || thread::current().id(),
            move |worker| {
                let _ = tx.send((worker, thread::current().id()));
            },
        );

        assert!(timeout(Duration::from_secs(5), main.turn()).await.unwrap());
        let (worker, resumed) = rx.await.unwrap();
        assert_ne!(worker, main_thread);
        assert_eq!(resumed, main_thread);
    }
}
