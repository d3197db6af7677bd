//! Concurrent generation-and-deduplication pipeline
//!
//! A pool of generator workers expands base words into candidates, sheds
//! probable duplicates through the shared [`SeenFilter`], and feeds a bounded
//! channel. A single writer thread performs the authoritative uniqueness
//! check against the [`Store`] and commits in batches.
//!
//! Synchronization discipline: the bloom filter uses atomic bit updates, the
//! counters are relaxed atomics, and the store handle is owned exclusively by
//! the writer. No ordering of candidates is guaranteed or needed; the single
//! writer serializes the only correctness-relevant check.
//!
//! Cancellation is cooperative. The shutdown flag is observed between words
//! in each worker's shard loop, inside blocked queue pushes (bounded-timeout
//! send loop), and in the writer's main loop. On shutdown the writer drains
//! whatever is buffered without further blocking, force-commits the partial
//! batch, and exits; nothing that reached the writer is silently lost.

use crate::seen::SeenFilter;
use crate::store::{Store, StoreError};
use crate::variants::{self, RuleSet};

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// How often a blocked push re-checks the shutdown flag.
const PUSH_POLL: Duration = Duration::from_millis(50);
/// How often the idle writer re-checks the shutdown flag and flush deadline.
const WRITER_POLL: Duration = Duration::from_millis(50);

/// Pipeline tuning knobs, read once at startup.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub commit_retries: u32,
    pub retry_backoff: Duration,
    /// Seed for enhancement randomness; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            queue_capacity: 4096,
            batch_size: 1000,
            flush_interval: Duration::from_secs(2),
            commit_retries: 5,
            retry_backoff: Duration::from_millis(100),
            seed: None,
        }
    }
}

/// Process-wide cancellation flag, observed cooperatively by every component.
#[derive(Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Monotonic counters for one run, shared across all pipeline threads.
#[derive(Debug, Default)]
pub struct RunCounters {
    /// Candidates produced by variation generation
    pub generated: AtomicU64,
    /// Candidates shed by the probabilistic filter before the queue
    pub filtered: AtomicU64,
    /// Candidates popped from the queue by the writer
    pub popped: AtomicU64,
    /// Candidates the store reported as already present
    pub rejected: AtomicU64,
    /// Candidates durably committed
    pub committed: AtomicU64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_generated(&self, n: u64) {
        self.generated.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_filtered(&self, n: u64) {
        self.filtered.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_popped(&self, n: u64) {
        self.popped.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_rejected(&self, n: u64) {
        self.rejected.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_committed(&self, n: u64) {
        self.committed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    pub fn popped(&self) -> u64 {
        self.popped.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn committed(&self) -> u64 {
        self.committed.load(Ordering::Relaxed)
    }

    /// Rough number of candidates enqueued but not yet popped.
    pub fn approx_queue_depth(&self) -> u64 {
        self.generated()
            .saturating_sub(self.filtered())
            .saturating_sub(self.popped())
    }
}

/// A store failure that forced the writer to drop its staged batch.
#[derive(Debug, Error)]
#[error("store failure after retries, dropping {dropped} staged candidates: {source}")]
pub struct WriterError {
    pub dropped: usize,
    #[source]
    pub source: StoreError,
}

/// Split the word list into contiguous shards, one per worker.
///
/// Static partitioning: word-to-candidate expansion cost is roughly uniform,
/// so there is nothing to rebalance at runtime.
pub fn shard(words: Vec<String>, shards: usize) -> Vec<Vec<String>> {
    if words.is_empty() {
        return Vec::new();
    }
    let shards = shards.max(1).min(words.len());
    let chunk = (words.len() + shards - 1) / shards;
    words.chunks(chunk).map(|c| c.to_vec()).collect()
}

/// Run the full pipeline to completion (or until shutdown).
///
/// Blocks until every worker has finished its shard and the writer has
/// drained and committed. Returns an error only when the store fails fatally;
/// an interrupted run that drains cleanly is `Ok`.
pub fn run(
    words: Vec<String>,
    rules: Arc<RuleSet>,
    filter: Arc<SeenFilter>,
    store: Box<dyn Store>,
    counters: Arc<RunCounters>,
    shutdown: Shutdown,
    config: &PipelineConfig,
) -> anyhow::Result<()> {
    let shards = shard(words, config.workers);
    let (tx, rx) = crossbeam_channel::bounded::<String>(config.queue_capacity.max(1));

    let mut workers = Vec::with_capacity(shards.len());
    for (idx, shard_words) in shards.into_iter().enumerate() {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(idx as u64)),
            None => StdRng::from_entropy(),
        };
        let tx = tx.clone();
        let rules = Arc::clone(&rules);
        let filter = Arc::clone(&filter);
        let counters = Arc::clone(&counters);
        let shutdown = shutdown.clone();

        let handle = thread::Builder::new()
            .name(format!("gen-worker-{}", idx))
            .spawn(move || {
                generator_worker(shard_words, &rules, &filter, &counters, &shutdown, tx, rng)
            })?;
        workers.push(handle);
    }

    // The writer observes end-of-stream once every worker sender is gone
    drop(tx);

    let writer = Writer {
        store,
        batch_size: config.batch_size.max(1),
        flush_interval: config.flush_interval,
        max_retries: config.commit_retries,
        retry_backoff: config.retry_backoff,
        counters: Arc::clone(&counters),
        shutdown: shutdown.clone(),
    };
    let writer_handle = thread::Builder::new()
        .name("db-writer".to_string())
        .spawn(move || writer.run(rx))?;

    for handle in workers {
        if handle.join().is_err() {
            log::error!("Generator worker panicked");
        }
    }

    match writer_handle.join() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            log::error!("{}", e);
            Err(e.into())
        }
        Err(_) => anyhow::bail!("Writer thread panicked"),
    }
}

/// One generator worker: expand each word in the shard, shed probable
/// duplicates, push the rest. Per-word failures never abort the run.
fn generator_worker(
    words: Vec<String>,
    rules: &RuleSet,
    filter: &SeenFilter,
    counters: &RunCounters,
    shutdown: &Shutdown,
    tx: Sender<String>,
    mut rng: StdRng,
) {
    for word in words {
        if shutdown.is_triggered() {
            return;
        }

        let candidates = variants::generate(&word, rules, &mut rng);
        counters.add_generated(candidates.len() as u64);

        for candidate in candidates {
            if !filter.insert(&candidate) {
                counters.add_filtered(1);
                continue;
            }

            // Backpressure: block on a full queue, but keep re-checking the
            // shutdown flag so we never deadlock against a stopped writer.
            let mut pending = candidate;
            loop {
                match tx.send_timeout(pending, PUSH_POLL) {
                    Ok(()) => break,
                    Err(SendTimeoutError::Timeout(returned)) => {
                        if shutdown.is_triggered() {
                            return;
                        }
                        pending = returned;
                    }
                    Err(SendTimeoutError::Disconnected(_)) => return,
                }
            }
        }
    }
}

/// Single consumer: authoritative dedup against the store, batched commits.
struct Writer {
    store: Box<dyn Store>,
    batch_size: usize,
    flush_interval: Duration,
    max_retries: u32,
    retry_backoff: Duration,
    counters: Arc<RunCounters>,
    shutdown: Shutdown,
}

impl Writer {
    fn run(mut self, rx: Receiver<String>) -> Result<(), WriterError> {
        let mut staged = 0usize;
        let mut batch_started = Instant::now();

        loop {
            if self.shutdown.is_triggered() {
                return self.drain(&rx, staged);
            }

            match rx.recv_timeout(WRITER_POLL) {
                Ok(candidate) => {
                    self.counters.add_popped(1);
                    match self.stage(&candidate) {
                        Ok(true) => self.counters.add_rejected(1),
                        Ok(false) => {
                            if staged == 0 {
                                batch_started = Instant::now();
                            }
                            staged += 1;
                        }
                        Err(e) => {
                            return Err(WriterError {
                                dropped: staged,
                                source: e,
                            })
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return self.drain(&rx, staged),
            }

            // Commit on a full batch, or flush a stale partial batch so slow
            // candidate arrival still bounds durability lag
            if staged >= self.batch_size
                || (staged > 0 && batch_started.elapsed() >= self.flush_interval)
            {
                self.commit(staged)?;
                staged = 0;
            }
        }
    }

    /// Graceful drain: process whatever is buffered without blocking, then
    /// force-commit the partial batch.
    fn drain(mut self, rx: &Receiver<String>, mut staged: usize) -> Result<(), WriterError> {
        while let Ok(candidate) = rx.try_recv() {
            self.counters.add_popped(1);
            match self.stage(&candidate) {
                Ok(true) => self.counters.add_rejected(1),
                Ok(false) => staged += 1,
                Err(e) => {
                    return Err(WriterError {
                        dropped: staged,
                        source: e,
                    })
                }
            }
        }

        if staged > 0 {
            self.commit(staged)?;
        }
        Ok(())
    }

    fn stage(&mut self, candidate: &str) -> Result<bool, StoreError> {
        let store = &mut self.store;
        Self::with_retries(
            self.max_retries,
            self.retry_backoff,
            || store.exists_or_insert(candidate),
        )
    }

    fn commit(&mut self, staged: usize) -> Result<(), WriterError> {
        let store = &mut self.store;
        Self::with_retries(self.max_retries, self.retry_backoff, || {
            store.commit_batch()
        })
        .map_err(|e| WriterError {
            dropped: staged,
            source: e,
        })?;

        self.counters.add_committed(staged as u64);
        log::debug!("Committed batch of {} candidates", staged);
        Ok(())
    }

    fn with_retries<T>(
        max_retries: u32,
        backoff: Duration,
        mut op: impl FnMut() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut attempt = 0u32;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max_retries => {
                    attempt += 1;
                    let delay = backoff * (1u32 << (attempt - 1).min(10));
                    log::warn!(
                        "Transient store error (attempt {}/{}): {}; retrying in {:?}",
                        attempt,
                        max_retries,
                        e,
                        delay
                    );
                    thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
