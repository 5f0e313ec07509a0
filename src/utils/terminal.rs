//! Terminal output utilities

use std::time::Duration;

use console::style;

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{}: {}", style("error").red().bold(), message);
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{}: {}", style("warning").yellow().bold(), message);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{}: {}", style("success").green().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{}: {}", style("info").blue().bold(), message);
}

/// Banner shown when a target starts
pub fn print_target_header(name: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(name).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Line shown instead of a banner for a skipped target
pub fn print_target_skipped(name: &str) {
    println!("\n{} {}", style("Skipping").yellow().bold(), name);
}

/// Format a duration as `m:ss` or `0.42s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}:{:02}", secs / 60, secs % 60)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(420)), "0.42s");
        assert_eq!(format_duration(Duration::from_secs(59)), "59.00s");
        assert_eq!(format_duration(Duration::from_secs(61)), "1:01");
        assert_eq!(format_duration(Duration::from_secs(600)), "10:00");
    }
}
