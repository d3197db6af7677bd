//! Passforge - High-performance password candidate generation for penetration testing
//!
//! Main entry point for the command-line application.

use clap::Parser;
use std::process;
use std::sync::Arc;

use passforge::cli::Args;
use passforge::pipeline::{self, RunCounters, Shutdown};
use passforge::progress::{
    print_banner, print_error, print_header, print_info, print_success, print_summary,
    print_warning, Monitor, RunTimer,
};
use passforge::seen::SeenFilter;
use passforge::store::SqliteStore;
use passforge::wordlist;

fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up logging
    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    } else if !args.quiet {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    // Run the application
    if let Err(e) = run(args) {
        print_error(&format!("{}", e));

        // Print chain of errors
        let mut source = e.source();
        while let Some(err) = source {
            print_error(&format!("  Caused by: {}", err));
            source = err.source();
        }

        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    // Print banner unless quiet mode
    if !args.quiet {
        print_banner();
    }

    // Validate arguments
    args.validate()?;

    let rules = Arc::new(args.rule_set()?);
    let word_filter = args.word_filter()?;
    let config = args.pipeline_config();

    // Wire Ctrl-C / SIGTERM to the cooperative shutdown flag
    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        let quiet = args.quiet;
        ctrlc::set_handler(move || {
            if !quiet {
                print_warning("Interrupt received, draining and flushing...");
            }
            shutdown.trigger();
        })?;
    }

    if !args.quiet {
        print_header("Loading wordlist...");
    }

    let words = wordlist::load_words(&args.dictionary, &word_filter)?;
    if words.is_empty() {
        print_warning("No base words matched the configured filters!");
        return Ok(());
    }

    let filter = Arc::new(SeenFilter::with_rate(
        args.expected_candidates,
        args.false_positive_rate,
    ));
    let store = SqliteStore::open(&args.database)?;
    let counters = Arc::new(RunCounters::new());

    if !args.quiet {
        print_info(&format!("Base words:   {}", words.len()));
        print_info(&format!("Database:     {:?}", args.database));
        if args.verbose {
            print_config(&args, &config, &filter);
        }
        print_header("Generating candidates...");
    }

    let timer = RunTimer::start();
    let monitor = Monitor::spawn(Arc::clone(&counters), args.quiet);

    let result = pipeline::run(
        words,
        rules,
        Arc::clone(&filter),
        Box::new(store),
        Arc::clone(&counters),
        shutdown.clone(),
        &config,
    );

    monitor.finish();

    // Counters are reported even when the store failed or the run was
    // interrupted - the process never exits silently
    if !args.quiet {
        print_summary(&counters, timer.elapsed(), filter.memory_usage());
        if shutdown.is_triggered() && result.is_ok() {
            print_info("Interrupted: in-flight candidates drained and flushed");
        } else if result.is_ok() {
            print_success(&format!("All candidates committed to {:?}", args.database));
        }
    }

    result
}

/// Print configuration summary
fn print_config(args: &Args, config: &pipeline::PipelineConfig, filter: &SeenFilter) {
    print_header("Configuration");

    print_info(&format!("Dictionary:     {:?}", args.dictionary));
    print_info(&format!(
        "Word length:    {}-{}",
        args.min_length, args.max_length
    ));

    if let Some(ref pattern) = args.pattern {
        print_info(&format!("Word pattern:   {}", pattern));
    }

    print_info(&format!("Enhancement:    {}", !args.no_enhance));
    print_info(&format!("Workers:        {}", config.workers));
    print_info(&format!("Queue capacity: {}", config.queue_capacity));
    print_info(&format!("Batch size:     {}", config.batch_size));
    print_info(&format!("Flush interval: {:?}", config.flush_interval));
    print_info(&format!(
        "Seen filter:    {} hashes, {}",
        filter.num_hashes(),
        bytesize::ByteSize(filter.memory_usage() as u64)
    ));

    if let Some(seed) = args.seed {
        print_info(&format!("RNG seed:       {}", seed));
    }
}
