//! # Passforge
//!
//! High-performance password candidate generator for penetration testing.
//!
//! ## Features
//!
//! - **Wordlist mutation**: leetspeak substitutions, casing variants, and
//!   complexity enhancement over a base dictionary
//! - **Concurrent pipeline**: a pool of generator workers feeding a single
//!   database writer through a bounded channel
//! - **Two-stage deduplication**: a lock-free bloom filter sheds probable
//!   duplicates cheaply; the writer checks authoritatively against the store
//! - **Durable batching**: atomic SQLite commits with retry/backoff, so a
//!   crash or interrupt never leaves half a batch behind
//! - **Graceful shutdown**: Ctrl-C drains in-flight candidates and flushes
//!   the partial batch before exit
//!
//! ## Usage
//!
//! ```bash
//! # Mutate the system dictionary into passwords.db
//! passforge -o passwords.db
//!
//! # Custom wordlist and substitution table, reproducible run
//! passforge -d rockyou.txt -s "a:@4,e:3,o:0" --seed 1337
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use passforge::pipeline::{self, PipelineConfig, RunCounters, Shutdown};
//! use passforge::seen::SeenFilter;
//! use passforge::store::SqliteStore;
//! use passforge::variants::RuleSet;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let words = vec!["password".to_string(), "hunter".to_string()];
//! let store = SqliteStore::open(Path::new("passwords.db")).unwrap();
//! let filter = Arc::new(SeenFilter::with_rate(1_000_000, 0.001));
//! let counters = Arc::new(RunCounters::new());
//!
//! pipeline::run(
//!     words,
//!     Arc::new(RuleSet::defaults()),
//!     filter,
//!     Box::new(store),
//!     counters,
//!     Shutdown::new(),
//!     &PipelineConfig::default(),
//! )
//! .unwrap();
//! ```

pub mod cli;
pub mod pipeline;
pub mod progress;
pub mod seen;
pub mod store;
pub mod variants;
pub mod wordlist;

pub use cli::Args;
pub use pipeline::{PipelineConfig, RunCounters, Shutdown};
