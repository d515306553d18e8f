//! CLI entrypoint for toolgate
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;
mod output;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use commands::{Cli, Command, OutputFormat};
use output::ConsoleFormatter;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use toolgate_application::{Orchestrator, WorkflowError};
use toolgate_domain::ToolMode;
use toolgate_infrastructure::{
    BackendFactory, ConfigLoader, EnvConfigSource, FileConfig, IssueSeverity,
    JsonlInvocationLogger, TracingAlertNotifier, WorkflowLoader,
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(cli.verbose, cli.log_dir.as_deref());

    info!("Starting toolgate");

    let mut file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())?
    };
    if let Some(mode) = &cli.mode {
        let mode: ToolMode = mode.parse().map_err(|e: String| anyhow!(e))?;
        file_config.override_mode(mode);
    }

    let issues = file_config.validate();

    if let Command::Config = cli.command {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        println!();
        if issues.is_empty() {
            println!("No configuration issues.");
        } else {
            print!("{}", ConsoleFormatter::format_issues(&issues));
        }
        println!();
        println!("{}", toml::to_string_pretty(&file_config)?);
        return Ok(ExitCode::SUCCESS);
    }

    for issue in &issues {
        match issue.severity {
            IssueSeverity::Error => warn!(field = %issue.field, "Config error: {}", issue.message),
            IssueSeverity::Warning => info!(field = %issue.field, "Config warning: {}", issue.message),
        }
    }

    // === Dependency Injection ===
    let orchestrator = build_orchestrator(&file_config);
    let report = BackendFactory::new()?.register_tools(&orchestrator, &file_config, &EnvConfigSource);
    if !report.is_clean() {
        eprint!("{}", ConsoleFormatter::format_registration(&report));
    }

    let result = execute(&cli, &orchestrator).await;
    orchestrator.shutdown().await;
    result
}

fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    // Logs go to stderr so JSON output on stdout stays parseable
    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "toolgate.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(EnvFilter::new(level))
                .with(console)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(EnvFilter::new(level))
                .with(console)
                .init();
            None
        }
    }
}

fn build_orchestrator(config: &FileConfig) -> Orchestrator {
    let mut builder = Orchestrator::builder(config.to_orchestrator_config())
        .with_alert_notifier(Arc::new(TracingAlertNotifier));

    if let Some(path) = &config.orchestrator.invocation_log
        && let Some(logger) = JsonlInvocationLogger::new(path)
    {
        info!(path = %logger.path().display(), "Logging invocations");
        builder = builder.with_invocation_logger(Arc::new(logger));
    }

    builder.build()
}

async fn execute(cli: &Cli, orchestrator: &Orchestrator) -> Result<ExitCode> {
    match &cli.command {
        Command::Invoke {
            tool,
            params,
            timeout_ms,
        } => {
            let params: serde_json::Value =
                serde_json::from_str(params).context("--params must be valid JSON")?;
            orchestrator.start();

            let invocation = orchestrator
                .invoke(tool, params, timeout_ms.map(Duration::from_millis))
                .await?;
            emit(cli.output, &invocation, || {
                ConsoleFormatter::format_invocation(&invocation)
            })?;
            Ok(exit_code(invocation.is_success()))
        }

        Command::Run { workflow, check } => {
            let definition = WorkflowLoader::from_path(workflow)?;
            if *check {
                orchestrator.validate_workflow(&definition)?;
                println!("{} is valid ({} step(s))", definition.name, definition.steps.len());
                return Ok(ExitCode::SUCCESS);
            }

            orchestrator.start();
            match orchestrator.run_workflow(&definition).await {
                Ok(run) => {
                    emit(cli.output, &run, || ConsoleFormatter::format_run(&run))?;
                    Ok(exit_code(run.degraded_steps.is_empty()))
                }
                Err(WorkflowError::AllStepsFailed(run)) => {
                    emit(cli.output, &run, || ConsoleFormatter::format_run(&run))?;
                    Ok(ExitCode::FAILURE)
                }
                Err(e) => Err(e.into()),
            }
        }

        Command::Status { probe } => {
            if *probe {
                let reports = orchestrator.probe_now().await;
                if let OutputFormat::Text = cli.output {
                    print!("{}", ConsoleFormatter::format_probes(&reports));
                }
            }
            let snapshot = orchestrator.snapshot();
            emit(cli.output, &snapshot, || ConsoleFormatter::format_status(&snapshot))?;
            Ok(exit_code(snapshot.firing_count() == 0))
        }

        Command::Watch { every_secs } => {
            orchestrator.start();
            let mut ticker = tokio::time::interval(Duration::from_secs((*every_secs).max(1)));
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted, shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let snapshot = orchestrator.snapshot();
                        emit(cli.output, &snapshot, || ConsoleFormatter::format_status(&snapshot))?;
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Config => Ok(ExitCode::SUCCESS),
    }
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
