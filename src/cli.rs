//! Command-line interface definition for passforge
//!
//! Provides argument parsing and validation for the password candidate
//! generator. Configuration is read once at startup and immutable thereafter.

use crate::pipeline::PipelineConfig;
use crate::variants::{RuleSet, DEFAULT_MAX_PRODUCT};
use crate::wordlist::WordFilter;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// High-performance password candidate generator for penetration testing
///
/// Mutates a base wordlist through leetspeak substitutions, casing variants,
/// and complexity enhancement, deduplicates concurrently, and commits unique
/// candidates to a SQLite database in durable batches.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "passforge",
    author = "m0h1nd4",
    version,
    about = "High-performance password candidate generator for penetration testing",
    long_about = r#"
╔══════════════════════════════════════════════════════════════════════════════╗
║                            PASSFORGE v1.0.0                                  ║
║                 Wordlist Mutation & Deduplication Engine                      ║
║                         For Penetration Testing                               ║
╚══════════════════════════════════════════════════════════════════════════════╝

Expand a base wordlist into password candidates via character substitutions
(a→@4, e→3, t→7, ...), casing variants, and complexity enhancement. Candidates
are deduplicated in-flight by a lock-free bloom filter, checked authoritatively
against the output database, and committed in atomic batches. Ctrl-C drains
and flushes before exit, so committed work is never lost or duplicated.

EXAMPLES:
    # Mutate the system dictionary into passwords.db
    passforge -o passwords.db

    # Custom wordlist, 8 workers, only words of 6-8 chars
    passforge -d rockyou.txt -o passwords.db -w 8 --min-length 6 --max-length 8

    # Custom substitution table, reproducible run
    passforge -d words.txt -s "a:@4,e:3,o:0" --seed 1337

    # Raw substitution/case variants only, no complexity enhancement
    passforge -d words.txt --no-enhance

SUBSTITUTION TABLE FORMAT:
    Comma-separated CHAR:REPLACEMENTS entries, e.g. "a:@4,b:8,s:$5".
    Default: a:@4, b:8, e:3, g:9, i:1!, o:0, s:$5, t:7
"#,
    after_help = "For more information, visit: https://github.com/m0h1nd4/passforge"
)]
pub struct Args {
    /// Base wordlist path
    #[arg(
        short = 'd',
        long,
        value_name = "PATH",
        default_value = "/usr/share/dict/words"
    )]
    pub dictionary: PathBuf,

    /// Output SQLite database path
    #[arg(short = 'o', long, value_name = "PATH", default_value = "passwords.db")]
    pub database: PathBuf,

    /// Minimum base word length
    #[arg(long, value_name = "LEN", default_value_t = 4)]
    pub min_length: usize,

    /// Maximum base word length
    #[arg(long, value_name = "LEN", default_value_t = 8)]
    pub max_length: usize,

    /// Regex pattern base words must match
    #[arg(short = 'p', long, value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Substitution table override (format: "a:@4,b:8,...")
    #[arg(short = 's', long, value_name = "TABLE")]
    pub substitutions: Option<String>,

    /// Digit pool for complexity enhancement
    #[arg(long, value_name = "CHARS", default_value = "0123456789")]
    pub digits: String,

    /// Symbol pool for complexity enhancement
    #[arg(long, value_name = "CHARS", default_value = "!@#$%&")]
    pub symbols: String,

    /// Disable complexity enhancement (raw substitution/case variants only)
    #[arg(long, default_value_t = false)]
    pub no_enhance: bool,

    /// Number of generator workers (default: auto-detect)
    #[arg(short = 'w', long, value_name = "NUM")]
    pub workers: Option<usize>,

    /// Candidate queue capacity (backpressure bound)
    #[arg(long, value_name = "NUM", default_value_t = 4096)]
    pub queue_capacity: usize,

    /// Candidates per database commit
    #[arg(short = 'b', long, value_name = "NUM", default_value_t = 1000)]
    pub batch_size: usize,

    /// Flush a partial batch after this many milliseconds
    #[arg(long, value_name = "MILLIS", default_value_t = 2000)]
    pub flush_interval: u64,

    /// Commit retry attempts on transient database errors
    #[arg(long, value_name = "NUM", default_value_t = 5)]
    pub commit_retries: u32,

    /// Base backoff between commit retries, in milliseconds
    #[arg(long, value_name = "MILLIS", default_value_t = 100)]
    pub retry_backoff: u64,

    /// Expected candidate count (sizes the duplicate pre-filter)
    #[arg(long, value_name = "NUM", default_value_t = 10_000_000)]
    pub expected_candidates: usize,

    /// Target false-positive rate for the duplicate pre-filter
    #[arg(long, value_name = "RATE", default_value_t = 0.001)]
    pub false_positive_rate: f64,

    /// RNG seed for reproducible enhancement (default: entropy)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Quiet mode - minimal output
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Verbose mode - detailed logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Validate argument combinations that clap cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_length == 0 {
            anyhow::bail!("--min-length must be at least 1");
        }
        if self.min_length > self.max_length {
            anyhow::bail!(
                "--min-length ({}) must be <= --max-length ({})",
                self.min_length,
                self.max_length
            );
        }
        if self.batch_size == 0 {
            anyhow::bail!("--batch-size must be at least 1");
        }
        if self.queue_capacity == 0 {
            anyhow::bail!("--queue-capacity must be at least 1");
        }
        if !(self.false_positive_rate > 0.0 && self.false_positive_rate < 1.0) {
            anyhow::bail!("--false-positive-rate must be between 0 and 1 (exclusive)");
        }
        if !self.no_enhance && (self.digits.is_empty() || self.symbols.is_empty()) {
            anyhow::bail!("--digits and --symbols must be non-empty unless --no-enhance is set");
        }
        if let Some(workers) = self.workers {
            if workers == 0 {
                anyhow::bail!("--workers must be at least 1");
            }
        }
        Ok(())
    }

    /// Build the base word filter.
    pub fn word_filter(&self) -> anyhow::Result<WordFilter> {
        WordFilter::new(self.min_length, self.max_length, self.pattern.as_deref())
    }

    /// Build the variation rule set.
    pub fn rule_set(&self) -> anyhow::Result<RuleSet> {
        let substitutions = match self.substitutions.as_deref() {
            Some(table) => RuleSet::parse_substitutions(table)?,
            None => RuleSet::defaults().substitutions,
        };

        Ok(RuleSet {
            substitutions,
            digits: self.digits.chars().collect(),
            symbols: self.symbols.chars().collect(),
            enhance: !self.no_enhance,
            max_product: DEFAULT_MAX_PRODUCT,
        })
    }

    /// Build the pipeline configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            workers: self.workers.unwrap_or_else(num_cpus::get).max(1),
            queue_capacity: self.queue_capacity,
            batch_size: self.batch_size,
            flush_interval: Duration::from_millis(self.flush_interval),
            commit_retries: self.commit_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff),
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::parse_from(std::iter::once("passforge").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);

        assert_eq!(args.min_length, 4);
        assert_eq!(args.max_length, 8);
        assert_eq!(args.batch_size, 1000);
        assert_eq!(args.queue_capacity, 4096);
        assert!(!args.no_enhance);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let args = parse(&["--min-length", "9", "--max-length", "8"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_fp_rate() {
        let args = parse(&["--false-positive-rate", "1.5"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_requires_pools_when_enhancing() {
        let args = parse(&["--symbols", ""]);
        assert!(args.validate().is_err());

        let args = parse(&["--symbols", "", "--no-enhance"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_custom_substitution_table() {
        let args = parse(&["-s", "a:@4,e:3"]);
        let rules = args.rule_set().unwrap();

        assert_eq!(rules.substitutions.get(&'a'), Some(&vec!['@', '4']));
        assert_eq!(rules.substitutions.get(&'e'), Some(&vec!['3']));
        assert!(rules.substitutions.get(&'t').is_none());
    }

    #[test]
    fn test_default_substitution_table() {
        let args = parse(&[]);
        let rules = args.rule_set().unwrap();

        assert_eq!(rules.substitutions.get(&'t'), Some(&vec!['7']));
        assert_eq!(rules.substitutions.get(&'s'), Some(&vec!['$', '5']));
    }

    #[test]
    fn test_malformed_substitution_table_rejected() {
        let args = parse(&["-s", "a@4"]);
        assert!(args.rule_set().is_err());
    }

    #[test]
    fn test_pipeline_config_mapping() {
        let args = parse(&["-w", "3", "--flush-interval", "500", "--seed", "42"]);
        let config = args.pipeline_config();

        assert_eq!(config.workers, 3);
        assert_eq!(config.flush_interval, Duration::from_millis(500));
        assert_eq!(config.seed, Some(42));
    }
}
