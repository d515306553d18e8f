//! Console output formatting

use colored::Colorize;
use toolgate_domain::{
    AlertEvent, AlertTransition, HealthState, Invocation, InvocationOutcome, Severity,
    StepDegradation, WorkflowRun,
};
use toolgate_infrastructure::{ConfigIssue, IssueSeverity, RegistrationReport};
use toolgate_application::{ProbeReport, StatusSnapshot};

/// Formats orchestration results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn format_invocation(invocation: &Invocation) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {} via {} in {}ms ({} live attempt(s))\n",
            Self::outcome(invocation.outcome),
            invocation.tool_name.as_str().bold(),
            invocation.used_mode,
            invocation.latency.as_millis(),
            invocation.live_attempts
        ));

        if let Some(notice) = &invocation.degraded_notice {
            let mut line = format!("degraded result: {}", notice.reason.as_str());
            if let Some(live_error) = &notice.live_error {
                line.push_str(&format!(" (live error: {})", live_error));
            }
            output.push_str(&format!("{}\n", line.yellow()));
        }

        if let Some(error) = &invocation.error {
            output.push_str(&format!("{} {}\n", "Error:".red().bold(), error));
        }

        if let Some(result) = &invocation.result {
            output.push_str(&Self::pretty(result));
            output.push('\n');
        }
        output
    }

    pub fn format_run(run: &WorkflowRun) -> String {
        let mut output = String::new();
        output.push_str(&Self::header(&format!("Workflow {}", run.workflow)));
        output.push_str(&format!("{} {}\n", "Run:".cyan().bold(), run.run_id));

        for (step_id, step) in &run.results {
            let marker = if run.is_degraded(step_id) {
                "~".yellow()
            } else {
                "✓".green()
            };
            output.push_str(&format!(
                "\n{} {} ({} via {}, {}ms)\n{}\n",
                marker,
                step_id.as_str().bold(),
                step.tool_name,
                step.used_mode,
                step.invocation.latency.as_millis(),
                Self::pretty(&step.value)
            ));
        }

        let failed: Vec<_> = run
            .degraded_steps
            .iter()
            .filter(|d| !matches!(d.degradation, StepDegradation::Substituted { .. }))
            .collect();
        if !failed.is_empty() {
            output.push_str(&format!("\n{}\n", "Incomplete steps:".red().bold()));
            for step in failed {
                let reason = match &step.degradation {
                    StepDegradation::DeadlineExceeded => "deadline exceeded".to_string(),
                    StepDegradation::Failed { outcome, detail } => match detail {
                        Some(detail) => format!("{}: {}", outcome.as_str(), detail),
                        None => outcome.as_str().to_string(),
                    },
                    StepDegradation::MissingInput { source_step } => {
                        format!("missing input from '{}'", source_step)
                    }
                    StepDegradation::Substituted { cause } => cause.as_str().to_string(),
                };
                output.push_str(&format!("  ✗ {} ({}): {}\n", step.step_id, step.tool_name, reason));
            }
        }

        output.push_str(&format!(
            "\n{} step(s) succeeded, {} degraded or incomplete\n",
            run.succeeded_count(),
            run.degraded_steps.len()
        ));
        output
    }

    pub fn format_status(snapshot: &StatusSnapshot) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Tool Status"));

        if snapshot.tools.is_empty() {
            output.push_str("No tools registered.\n");
        }

        for tool in &snapshot.tools {
            let availability = if tool.available {
                "available".green()
            } else {
                "unavailable".red()
            };
            output.push_str(&format!(
                "\n{} [{}] {} health={}\n",
                tool.name.as_str().bold(),
                tool.mode,
                availability,
                Self::health(tool.health.state())
            ));
            if !tool.missing_config.is_empty() {
                output.push_str(&format!(
                    "  missing config: {}\n",
                    tool.missing_config.join(", ").red()
                ));
            }

            let stats = &tool.stats;
            let rate = stats
                .success_rate
                .map(|r| format!("{:.1}%", r * 100.0))
                .unwrap_or_else(|| "-".to_string());
            let latency = stats
                .avg_latency
                .map(|l| format!("{}ms", l.as_millis()))
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "  window: {} call(s), success {}, avg latency {}, {} timeout(s), {} degraded, {} config error(s)\n",
                stats.total,
                rate,
                latency,
                stats.timeout_count,
                stats.degraded_count,
                stats.config_error_count
            ));

            for alert in tool.firing_alerts() {
                output.push_str(&format!(
                    "  {} {} ({})\n",
                    "ALERT".red().bold(),
                    alert.rule_id,
                    Self::severity(alert.severity)
                ));
            }
        }

        if !snapshot.recent_alerts.is_empty() {
            output.push_str(&format!("\n{}\n", "Recent alert transitions:".cyan().bold()));
            for event in &snapshot.recent_alerts {
                output.push_str(&Self::alert_line(event));
            }
        }
        output
    }

    pub fn format_probes(reports: &[ProbeReport]) -> String {
        let mut output = String::new();
        for report in reports {
            let result = if report.ok {
                "ok".green()
            } else {
                "failed".red()
            };
            output.push_str(&format!("probe {} {} -> {}", report.tool, result, report.state));
            if let Some(error) = &report.error {
                output.push_str(&format!(" ({})", error));
            }
            output.push('\n');
        }
        output
    }

    pub fn format_registration(report: &RegistrationReport) -> String {
        let mut output = String::new();
        for (tool, error) in &report.unavailable {
            output.push_str(&format!("{} {}: {}\n", "unavailable".yellow(), tool, error));
        }
        for (tool, reason) in &report.rejected {
            output.push_str(&format!("{} {}: {}\n", "rejected".red(), tool, reason));
        }
        output
    }

    pub fn format_issues(issues: &[ConfigIssue]) -> String {
        let mut output = String::new();
        for issue in issues {
            let label = match issue.severity {
                IssueSeverity::Error => "error".red().bold(),
                IssueSeverity::Warning => "warning".yellow().bold(),
            };
            output.push_str(&format!("{}: {}\n", label, issue));
        }
        output
    }

    fn alert_line(event: &AlertEvent) -> String {
        let transition = match event.transition {
            AlertTransition::Fired => "fired".red(),
            AlertTransition::Resolved => "resolved".green(),
        };
        format!(
            "  {} {} {} {}: {}\n",
            event.at.format("%H:%M:%S"),
            event.tool_name,
            event.rule_id,
            transition,
            event.detail
        )
    }

    fn outcome(outcome: InvocationOutcome) -> colored::ColoredString {
        match outcome {
            InvocationOutcome::Success => "SUCCESS".green().bold(),
            InvocationOutcome::Timeout => "TIMEOUT".red().bold(),
            InvocationOutcome::Error => "ERROR".red().bold(),
            InvocationOutcome::ConfigError => "CONFIG ERROR".red().bold(),
        }
    }

    fn health(state: HealthState) -> colored::ColoredString {
        match state {
            HealthState::Healthy => state.as_str().green(),
            HealthState::Unhealthy => state.as_str().red(),
            HealthState::Unknown => state.as_str().dimmed(),
        }
    }

    fn severity(severity: Severity) -> colored::ColoredString {
        match severity {
            Severity::Critical => "critical".red(),
            Severity::Warning => "warning".yellow(),
        }
    }

    fn pretty(value: &serde_json::Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    }

    fn header(title: &str) -> String {
        let line = "═".repeat(60);
        format!("{}\n{}\n{}\n", line.cyan(), title.bold(), line.cyan())
    }
}
