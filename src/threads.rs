use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;

use log::{trace, warn};
use thiserror::Error;

/// Splits `start..end` into contiguous ranges whose lengths differ by at
/// most one, longer ranges first.
pub struct RangeSplitter;

impl RangeSplitter {
    pub fn split(start: usize, end: usize, n: usize) -> Vec<(usize, usize)> {
        let len = end.saturating_sub(start);
        let n = n.clamp(1, len.max(1));
        let size = len / n;
        let size_xtra = len % n;

        let mut ranges = Vec::with_capacity(n);
        let mut lo = start;
        for i in 0..n {
            let hi = lo + size + usize::from(i < size_xtra);
            ranges.push((lo, hi));
            lo = hi;
        }
        ranges
    }
}

pub trait Split {
    type Part;

    fn split_parts(&self, n: usize) -> Vec<Self::Part>;

    fn parts(&self, n: usize) -> Vec<SplitPart<Self::Part>> {
        self.split_parts(n)
            .into_iter()
            .enumerate()
            .map(|(n, part)| SplitPart::new(part, n))
            .collect()
    }
}

pub trait Join<P>: Sized {
    fn join_parts(parts: Vec<P>) -> Result<Self, JoinError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("no parts to join")]
    Empty,
    #[error("expected {expected} parts, got {got}")]
    Missing { expected: usize, got: usize },
    #[error("part {0} is out of range")]
    OutOfRange(usize),
    #[error("part {0} was received twice")]
    Duplicate(usize),
    #[error("parts do not fit together")]
    Mismatch,
}

#[derive(Debug)]
pub struct SplitPart<T> {
    pub n: usize,
    pub part: T,
}

impl<T> SplitPart<T> {
    pub fn new(part: T, n: usize) -> Self {
        Self { part, n }
    }

    /// Puts `splits` back in part order. Every index in `0..expected` must be
    /// present exactly once.
    pub fn ordered(splits: Vec<SplitPart<T>>, expected: usize) -> Result<Vec<T>, JoinError> {
        if expected == 0 {
            return Err(JoinError::Empty);
        }
        if splits.len() != expected {
            return Err(JoinError::Missing {
                expected,
                got: splits.len(),
            });
        }
        let mut slots: Vec<Option<T>> = (0..expected).map(|_| None).collect();
        for s in splits {
            match slots.get_mut(s.n) {
                None => return Err(JoinError::OutOfRange(s.n)),
                Some(Some(_)) => return Err(JoinError::Duplicate(s.n)),
                Some(slot) => *slot = Some(s.part),
            }
        }
        // Same count and no duplicates, so every slot is filled.
        Ok(slots.into_iter().flatten().collect())
    }
}

struct Worker<I> {
    tx: Option<mpsc::Sender<SplitPart<I>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl<I> Worker<I>
where
    I: Send + 'static,
{
    /// A job that panics is reported back as `None` and the worker keeps
    /// serving.
    fn spawn<O, F>(id: usize, f: F, results: mpsc::Sender<SplitPart<Option<O>>>) -> Self
    where
        O: Send + 'static,
        F: Fn(I) -> O + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<SplitPart<I>>();
        let handle = thread::spawn(move || {
            for job in rx {
                trace!("worker {} took part {}", id, job.n);
                let n = job.n;
                let out = catch_unwind(AssertUnwindSafe(|| f(job.part))).ok();
                if out.is_none() {
                    warn!("worker {} panicked on part {}", id, n);
                }
                let done = SplitPart::new(out, n);
                if results.send(done).is_err() {
                    return;
                }
            }
        });

        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    fn send(&self, part: SplitPart<I>) -> bool {
        match &self.tx {
            Some(tx) => tx.send(part).is_ok(),
            None => false,
        }
    }
}

impl<I> Drop for Worker<I> {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }
}

/// Fixed set of long-lived threads, each running the same job function.
/// Jobs are handed out round-robin and results come back tagged with their
/// part index.
pub struct WorkerPool<I, O> {
    workers: Vec<Worker<I>>,
    rx: mpsc::Receiver<SplitPart<Option<O>>>,
}

impl<I, O> WorkerPool<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn with<G, F>(n: usize, make: G) -> Self
    where
        G: Fn() -> F,
        F: Fn(I) -> O + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let workers = (0..n.max(1))
            .map(|id| Worker::spawn(id, make(), tx.clone()))
            .collect();
        Self { workers, rx }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Runs every part and returns the outputs in part order. Blocks until
    /// all dispatched parts are back; parts whose job panicked count as
    /// missing.
    pub fn run(&self, parts: Vec<SplitPart<I>>) -> Result<Vec<O>, JoinError> {
        // Leftovers of an earlier run that failed part-way.
        while self.rx.try_recv().is_ok() {}

        let expected = parts.len();
        let mut sent = 0;
        for (i, part) in parts.into_iter().enumerate() {
            let n = part.n;
            if self.workers[i % self.workers.len()].send(part) {
                sent += 1;
            } else {
                warn!("worker {} is gone, part {} dropped", i % self.workers.len(), n);
            }
        }

        let mut done = Vec::with_capacity(sent);
        for _ in 0..sent {
            match self.rx.recv() {
                Ok(SplitPart { n, part: Some(part) }) => done.push(SplitPart::new(part, n)),
                Ok(SplitPart { part: None, .. }) => (),
                Err(_) => break,
            }
        }
        SplitPart::ordered(done, expected)
    }
}
