//! Progress display module
//!
//! Styled terminal output and a live counter monitor for the pentesting
//! aesthetic. The monitor thread watches the shared run counters and keeps a
//! spinner updated while the pipeline works.

use crate::pipeline::RunCounters;

use bytesize::ByteSize;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Print the application banner
pub fn print_banner() {
    let banner = r#"
╔══════════════════════════════════════════════════════════════════════════════╗
║                                                                              ║
║   ██████╗  █████╗ ███████╗███████╗███████╗ ██████╗ ██████╗  ██████╗ ███████╗ ║
║   ██╔══██╗██╔══██╗██╔════╝██╔════╝██╔════╝██╔═══██╗██╔══██╗██╔════╝ ██╔════╝ ║
║   ██████╔╝███████║███████╗███████╗█████╗  ██║   ██║██████╔╝██║  ███╗█████╗   ║
║   ██╔═══╝ ██╔══██║╚════██║╚════██║██╔══╝  ██║   ██║██╔══██╗██║   ██║██╔══╝   ║
║   ██║     ██║  ██║███████║███████║██║     ╚██████╔╝██║  ██║╚██████╔╝███████╗ ║
║   ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝      ╚═════╝ ╚═╝  ╚═╝ ╚═════╝ ╚══════╝ ║
║                                                                              ║
║                   Wordlist Mutation & Deduplication Engine                    ║
║                         For Penetration Testing                               ║
║                                                              v1.0.0          ║
╚══════════════════════════════════════════════════════════════════════════════╝
"#;

    println!("{}", banner.green());
}

/// Print a section header
pub fn print_header(text: &str) {
    println!("\n{} {}", "▶".green(), text.green().bold());
}

/// Print an info message
pub fn print_info(text: &str) {
    println!("  {} {}", "ℹ".cyan(), text);
}

/// Print a success message
pub fn print_success(text: &str) {
    println!("  {} {}", "✔".green(), text.green());
}

/// Print a warning message
pub fn print_warning(text: &str) {
    println!("  {} {}", "⚠".yellow(), text.yellow());
}

/// Print an error message
pub fn print_error(text: &str) {
    eprintln!("  {} {}", "✖".red(), text.red());
}

/// Create a styled spinner for indeterminate progress
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();

    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
    );

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Background thread keeping a spinner in sync with the run counters.
pub struct Monitor {
    done: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Monitor {
    /// Spawn the monitor. Hidden (still joinable) in quiet mode.
    pub fn spawn(counters: Arc<RunCounters>, quiet: bool) -> Self {
        let done = Arc::new(AtomicBool::new(false));
        let done_flag = Arc::clone(&done);

        let handle = std::thread::spawn(move || {
            let pb = if quiet {
                ProgressBar::hidden()
            } else {
                create_spinner("Generating...")
            };

            while !done_flag.load(Ordering::Relaxed) {
                pb.set_message(format!(
                    "generated {} | filtered {} | committed {} | queue ~{}",
                    format_number(counters.generated()),
                    format_number(counters.filtered()),
                    format_number(counters.committed()),
                    format_number(counters.approx_queue_depth()),
                ));
                std::thread::sleep(Duration::from_millis(200));
            }

            pb.finish_and_clear();
        });

        Self {
            done,
            handle: Some(handle),
        }
    }

    /// Stop the monitor and clear the spinner.
    pub fn finish(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.done.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Print the final run summary
pub fn print_summary(counters: &RunCounters, elapsed: Duration, filter_memory: usize) {
    let generated = counters.generated();
    let filtered = counters.filtered();
    let rejected = counters.rejected();
    let committed = counters.committed();

    println!();
    println!("{}", "═".repeat(60).green());
    println!("{}", "                      RUN COMPLETE".green().bold());
    println!("{}", "═".repeat(60).green());
    println!();

    println!(
        "  {} {}",
        "Candidates generated: ".green(),
        format_number(generated)
    );
    println!(
        "  {} {}",
        "Filtered (probable):  ".yellow(),
        format_number(filtered)
    );
    println!(
        "  {} {}",
        "Rejected (in store):  ".yellow(),
        format_number(rejected)
    );
    println!(
        "  {} {}",
        "Committed (unique):   ".green().bold(),
        format_number(committed).green().bold()
    );

    println!();
    println!(
        "  {} {}",
        "Duration:             ".green(),
        format_duration(elapsed)
    );
    if elapsed.as_secs_f64() > 0.0 {
        println!(
            "  {} {:.0} candidates/sec",
            "Throughput:           ".green(),
            generated as f64 / elapsed.as_secs_f64()
        );
    }
    println!(
        "  {} {}",
        "Filter memory:        ".green(),
        ByteSize(filter_memory as u64)
    );
    println!();
    println!("{}", "═".repeat(60).green());
}

/// Format a number with thousand separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    }
}

/// Elapsed-time helper usable before the summary prints.
pub struct RunTimer {
    start: Instant,
}

impl RunTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for RunTimer {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(123), "123");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30.0s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m");
    }

    #[test]
    fn test_monitor_finishes() {
        let counters = Arc::new(RunCounters::new());
        counters.add_generated(5);

        let monitor = Monitor::spawn(Arc::clone(&counters), true);
        std::thread::sleep(Duration::from_millis(50));
        monitor.finish();
    }
}
