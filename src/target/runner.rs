//! Sequential, fail-fast plan execution

use std::time::{Duration, Instant};

use anyhow::Result;
use console::style;

use super::graph::Target;
use crate::utils::terminal;

/// What happened to a planned target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    Succeeded,
    Failed,
    Skipped,
    NotRun,
}

impl std::fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetStatus::Succeeded => write!(f, "Succeeded"),
            TargetStatus::Failed => write!(f, "Failed"),
            TargetStatus::Skipped => write!(f, "Skipped"),
            TargetStatus::NotRun => write!(f, "NotRun"),
        }
    }
}

/// Outcome of one planned target
#[derive(Debug, Clone)]
pub struct TargetOutcome {
    pub name: String,
    pub status: TargetStatus,
    pub duration: Duration,
}

/// Result of running a plan
#[derive(Debug)]
pub struct ExecutionReport {
    /// One entry per planned target, in plan order
    pub outcomes: Vec<TargetOutcome>,

    /// The error that stopped the run, if any
    pub failure: Option<anyhow::Error>,
}

impl ExecutionReport {
    /// Whether every executed target succeeded
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Names of targets with the given status
    pub fn with_status(&self, status: TargetStatus) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.status == status)
            .map(|o| o.name.as_str())
            .collect()
    }

    pub fn total_duration(&self) -> Duration {
        self.outcomes.iter().map(|o| o.duration).sum()
    }

    /// Print the per-target summary table
    pub fn print_summary(&self) {
        println!("\n{}", "═".repeat(48));
        println!("{:<28} {:<10} {:>8}", "Target", "Status", "Duration");
        println!("{}", "─".repeat(48));
        for outcome in &self.outcomes {
            // Pad before styling so ANSI codes don't break alignment
            let label = format!("{:<10}", outcome.status.to_string());
            let label = match outcome.status {
                TargetStatus::Succeeded => style(label).green(),
                TargetStatus::Failed => style(label).red().bold(),
                TargetStatus::Skipped => style(label).yellow(),
                TargetStatus::NotRun => style(label).dim(),
            };
            let duration = match outcome.status {
                TargetStatus::Succeeded | TargetStatus::Failed => {
                    terminal::format_duration(outcome.duration)
                }
                _ => "-".to_string(),
            };
            println!("{:<28} {} {:>8}", outcome.name, label, duration);
        }
        println!("{}", "─".repeat(48));
        println!(
            "{:<28} {:<10} {:>8}",
            "Total",
            "",
            terminal::format_duration(self.total_duration())
        );
        println!("{}\n", "═".repeat(48));

        if self.succeeded() {
            terminal::print_success("Build succeeded");
        } else {
            let failed = self.with_status(TargetStatus::Failed);
            terminal::print_error(&format!("Build failed in {}", failed.join(", ")));
        }
    }

    /// Turn the report into the run's result
    pub fn into_result(self) -> Result<()> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Run each planned target in order, stopping at the first failure
///
/// Targets named in `skip` (case-insensitive) are not executed. Targets after
/// a failure are reported as [`TargetStatus::NotRun`].
pub fn execute<A, F>(plan: &[&Target<A>], skip: &[String], mut run: F) -> ExecutionReport
where
    F: FnMut(&Target<A>) -> Result<()>,
{
    let mut outcomes = Vec::with_capacity(plan.len());
    let mut failure = None;

    for &target in plan {
        if failure.is_some() {
            outcomes.push(TargetOutcome {
                name: target.name.clone(),
                status: TargetStatus::NotRun,
                duration: Duration::ZERO,
            });
            continue;
        }

        if skip.iter().any(|s| s.eq_ignore_ascii_case(&target.name)) {
            tracing::debug!(target_name = %target.name, "skipping target");
            terminal::print_target_skipped(&target.name);
            outcomes.push(TargetOutcome {
                name: target.name.clone(),
                status: TargetStatus::Skipped,
                duration: Duration::ZERO,
            });
            continue;
        }

        terminal::print_target_header(&target.name);
        let start = Instant::now();
        let result = run(target);
        let duration = start.elapsed();

        match result {
            Ok(()) => {
                tracing::debug!(target_name = %target.name, ?duration, "target succeeded");
                outcomes.push(TargetOutcome {
                    name: target.name.clone(),
                    status: TargetStatus::Succeeded,
                    duration,
                });
            }
            Err(err) => {
                tracing::debug!(target_name = %target.name, error = %err, "target failed");
                outcomes.push(TargetOutcome {
                    name: target.name.clone(),
                    status: TargetStatus::Failed,
                    duration,
                });
                failure = Some(err.context(format!("Target '{}' failed", target.name)));
            }
        }
    }

    ExecutionReport { outcomes, failure }
}
