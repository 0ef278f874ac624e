use std::time::Duration;

use owo_colors::OwoColorize;
use reviewlens_core::BatchSummary;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "ReviewLens".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Extract ratings, price and review sentiment from product pages\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print the per-URL outcome table of a batch run
pub fn print_batch_summary(summary: &BatchSummary, results_dir: &std::path::Path, elapsed: Duration) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Batch Summary".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());

    for (index, url) in &summary.succeeded {
        eprintln!("  {} {} {}", "✓".green(), format!("#{}", index).dimmed(), url.bright_white());
    }
    for (index, url, error) in &summary.failed {
        eprintln!("  {} {} {}", "✗".red(), format!("#{}", index).dimmed(), url.bright_white());
        eprintln!("      {}", error.bright_red());
    }

    eprintln!(
        "\n  {} {}/{}",
        "Succeeded:".dimmed(),
        summary.succeeded.len().to_string().bright_white(),
        summary.total
    );
    eprintln!("  {} {}", "Results:".dimmed(), results_dir.display().bright_white());
    eprintln!("  {} {:.1}s\n", "Elapsed:".dimmed(), elapsed.as_secs_f64());
}
