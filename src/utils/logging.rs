// file: src/utils/logging.rs
// description: tracing subscriber initialization and colored cli output helpers

use crate::stages::StageReport;
use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// `RUST_LOG` wins over the `--verbose` default when set.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_ansi(colored_output);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg.red())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}

pub fn format_step(step: usize, total: usize, msg: &str) -> String {
    format!("{} {}", format!("[{}/{}]", step, total).cyan().bold(), msg)
}

/// One line per stage: rows in and out plus whatever was excluded.
pub fn format_report(report: &StageReport) -> String {
    let mut excluded = Vec::new();
    if report.skipped > 0 {
        excluded.push(format!("{} skipped", report.skipped));
    }
    if report.filtered > 0 {
        excluded.push(format!("{} filtered", report.filtered));
    }
    if report.duplicates > 0 {
        excluded.push(format!("{} duplicates", report.duplicates));
    }
    if report.null_timestamps > 0 {
        excluded.push(format!("{} without timestamp", report.null_timestamps));
    }

    let mut line = format!(
        "{:<7} {} -> {}",
        report.stage.to_string().bold(),
        report.input_rows,
        report.output_rows
    );
    if !excluded.is_empty() {
        line.push_str(&format!(" ({})", excluded.join(", ")).dimmed().to_string());
    }
    if let Some(artifact) = &report.artifact {
        line.push_str(&format!("  {}", artifact.to_string().cyan()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::Stage;

    #[test]
    fn test_format_report_lists_exclusions() {
        colored::control::set_override(false);

        let mut report = StageReport::new(Stage::Silver);
        report.input_rows = 10;
        report.output_rows = 7;
        report.filtered = 2;
        report.duplicates = 1;

        let line = format_report(&report);
        assert!(line.contains("10 -> 7"));
        assert!(line.contains("2 filtered, 1 duplicates"));
        assert!(!line.contains("skipped"));
    }
}
