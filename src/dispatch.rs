use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
};

/// Handle to the background delivery of one report.
///
/// A dispatch runs its email send and log write on separate threads. The
/// caller decides what to do with it:
///
/// - [`wait`](Self::wait) blocks until every job has finished,
/// - [`detach`](Self::detach) (or dropping the handle) lets them run on
///   their own,
/// - [`is_finished`](Self::is_finished) polls.
///
/// Detached jobs are not awaited at process exit: a report dispatched just
/// before `main` returns may never reach the mail server or the log.
///
/// # Examples
///
/// ```rust
/// use reportkit::Reporter;
///
/// let reporter = Reporter::builder("shop").build();
/// let err = std::io::Error::other("payment gateway timeout");
///
/// // Fire and forget:
/// reporter.error(&(), &err).detach();
///
/// // Or make sure delivery finished before shutting down:
/// reporter.error(&(), &err).wait();
/// ```
#[derive(Default)]
pub struct Dispatch {
    jobs: Vec<JoinHandle<()>>,
}

impl Dispatch {
    /// A dispatch with no jobs; waiting on it returns immediately.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Runs `job` on its own thread and tracks it. If no thread can be
    /// spawned the job runs on the current thread instead.
    pub(crate) fn spawn<F>(&mut self, name: &str, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // The closure is moved into the thread on success only; keep it
        // reachable for the inline fallback.
        let job = Arc::new(Mutex::new(Some(job)));
        let threaded = Arc::clone(&job);
        let spawned = thread::Builder::new()
            .name(format!("reportkit-{name}"))
            .spawn(move || run_once(&threaded));

        match spawned {
            Ok(handle) => self.jobs.push(handle),
            Err(error) => {
                tracing::warn!(
                    target: "reportkit",
                    %error,
                    job = name,
                    "could not spawn dispatch thread, running inline"
                );
                run_once(&job);
            }
        }
    }

    /// Blocks until every job has finished.
    ///
    /// A job that panicked is logged and otherwise ignored.
    pub fn wait(self) {
        for handle in self.jobs {
            if handle.join().is_err() {
                tracing::warn!(target: "reportkit", "report dispatch job panicked");
            }
        }
    }

    /// Lets the jobs finish in the background.
    pub fn detach(self) {}

    /// Whether every job has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.jobs.iter().all(JoinHandle::is_finished)
    }

    /// Number of jobs started for this dispatch.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}

fn run_once<F: FnOnce()>(slot: &Mutex<Option<F>>) {
    let job = slot
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    if let Some(job) = job {
        job();
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("jobs", &self.jobs.len())
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    static_assertions::assert_impl_all!(Dispatch: Send, Sync);

    #[test]
    fn test_wait_joins_all_jobs() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut dispatch = Dispatch::none();
        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            dispatch.spawn("test", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert!(dispatch.job_count() <= 3);
        dispatch.wait();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_empty_dispatch() {
        let dispatch = Dispatch::none();
        assert!(dispatch.is_finished());
        assert_eq!(dispatch.job_count(), 0);
        dispatch.wait();
    }

    #[test]
    fn test_panicking_job_does_not_propagate() {
        let mut dispatch = Dispatch::none();
        dispatch.spawn("test", || panic!("sender exploded"));
        dispatch.wait();
    }
}
