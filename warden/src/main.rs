// warden/src/main.rs

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Infrastructure (Config & Adapters)
use warden_core::infrastructure::config::load_config;
use warden_core::infrastructure::store::MemoryStore;

// Domain (types surfacing in the CLI output)
use warden_core::domain::profile::{Profiler, ProfilingReport};
use warden_core::domain::governance::Verdict;
use warden_core::domain::record::{RawRow, row_from_json};

// Application (Use Cases)
use warden_core::application::{
    ExecutionModeArg, Orchestrator, PipelineRequest, PipelineResponse, ResponseStatus,
};

use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Data-quality control plane: profile, generate, execute, certify", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Full,
    Incremental,
}

#[derive(Subcommand)]
enum Commands {
    /// 🚦 Runs the full pipeline (Profiling -> Rules -> Execution -> Governance)
    Run {
        /// JSON file holding the dataset rows (a top-level array of objects)
        #[arg(long)]
        dataset: PathBuf,

        /// Logical dataset identifier
        #[arg(long)]
        dataset_id: String,

        /// Execution mode
        #[arg(long, value_enum, default_value = "full")]
        mode: Mode,

        /// Cutoff timestamp (RFC 3339) for incremental mode
        #[arg(long)]
        since: Option<String>,

        /// Pipeline configuration file (YAML); defaults apply when absent
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit the raw response as JSON instead of tables
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// 🔎 Profiles a dataset without generating or executing rules
    Profile {
        /// JSON file holding the dataset rows (a top-level array of objects)
        #[arg(long)]
        dataset: PathBuf,

        /// Logical dataset identifier
        #[arg(long)]
        dataset_id: String,

        /// Pipeline configuration file (YAML); defaults apply when absent
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit the raw profiling report as JSON instead of tables
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug warden run ... to see stage-level details
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    match cli.command {
        // --- USE CASE: FULL PIPELINE RUN ---
        Commands::Run {
            dataset,
            dataset_id,
            mode,
            since,
            config,
            json,
        } => {
            let start = std::time::Instant::now();

            let config = load_config(config.as_deref())?;
            let rows = load_rows(&dataset, &dataset_id)?;

            let store = Arc::new(MemoryStore::new());
            store.insert_dataset(&dataset_id, rows).await;

            let request = PipelineRequest {
                dataset_id,
                dataset_version: None,
                execution_mode: match mode {
                    Mode::Full => ExecutionModeArg::Full,
                    Mode::Incremental => ExecutionModeArg::Incremental,
                },
                last_execution_ts: since,
            };

            let orchestrator = Orchestrator::new(store, config);
            match orchestrator.run(request).await {
                Ok(response) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&response)?);
                    } else {
                        render_response(&response, start.elapsed());
                    }
                    if response.status == ResponseStatus::Error {
                        // Contract violations must fail CI/CD
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    if json {
                        let response = PipelineResponse::from_error(&e);
                        println!("{}", serde_json::to_string_pretty(&response)?);
                    } else {
                        eprintln!("💥 PIPELINE ERROR [{}]: {}", e.code(), e);
                    }
                    std::process::exit(1);
                }
            }
        }

        // --- USE CASE: PROFILING ONLY ---
        Commands::Profile {
            dataset,
            dataset_id,
            config,
            json,
        } => {
            let config = load_config(config.as_deref())?;
            let rows = load_rows(&dataset, &dataset_id)?;

            let profiler = Profiler {
                sample_cap: config.sample_cap,
                recency_window_days: config.recency_window_days,
                max_sample_values: config.max_sample_values,
            };
            match profiler.profile(&dataset_id, &rows).await {
                Ok(report) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        render_profile(&report);
                    }
                }
                Err(e) => {
                    eprintln!("💥 PROFILING ERROR [{}]: {}", e.code(), e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Reads a dataset file: a JSON array where each element is one row object.
fn load_rows(path: &Path, dataset_id: &str) -> anyhow::Result<Vec<RawRow>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read dataset file '{}': {e}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("dataset file '{}' is not valid JSON: {e}", path.display()))?;
    let items = value.as_array().ok_or_else(|| {
        anyhow::anyhow!(
            "dataset file '{}' must hold a top-level JSON array of row objects",
            path.display()
        )
    })?;
    let rows = items
        .iter()
        .map(|item| row_from_json(dataset_id, item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn render_response(response: &PipelineResponse, elapsed: std::time::Duration) {
    if let Some(summary) = &response.execution_summary {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Rules", "Passed", "Failed", "Critical failure"]);
        table.add_row(vec![
            summary.total_rules.to_string(),
            summary.passed.to_string(),
            summary.failed.to_string(),
            summary.critical_failure.to_string(),
        ]);
        println!("{table}");
    }

    if let Some(dashboard) = &response.dashboard {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Dimension", "Rules", "Violated", "Avg success rate"]);
        if let Some(breakdown) = dashboard
            .views
            .get("dimension_breakdown")
            .and_then(|v| v.as_object())
        {
            for (dimension, stats) in breakdown {
                table.add_row(vec![
                    dimension.clone(),
                    stats["rules"].to_string(),
                    stats["violated"].to_string(),
                    format!("{:.3}", stats["avg_success_rate"].as_f64().unwrap_or(0.0)),
                ]);
            }
        }
        println!("{table}");
        if let Some(rate) = dashboard
            .views
            .get("overall_pass_rate")
            .and_then(|v| v.as_f64())
        {
            println!(
                "📈 overall pass rate: {rate:.3} (dashboard contract {})",
                dashboard.contract_version
            );
        }
    }

    if let Some(trust) = &response.trust_report {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            "Truth score",
            "Verdict",
            "Inconsistencies",
            "Deduplicated rules",
        ]);
        table.add_row(vec![
            format!("{}/100", trust.truth_score),
            match trust.verdict {
                Verdict::Certified => "CERTIFIED".to_string(),
                Verdict::ContractViolation => "CONTRACT VIOLATION".to_string(),
            },
            trust.inconsistencies_found.len().to_string(),
            trust.deduplicated_rules.to_string(),
        ]);
        println!("{table}");

        for inconsistency in &trust.inconsistencies_found {
            eprintln!("  ⚠️  {:?}: {}", inconsistency.check, inconsistency.detail);
        }
    }

    for failure in &response.failed_steps {
        eprintln!("  ⚠️  degraded step {:?} [{}]: {}", failure.stage, failure.code, failure.message);
    }

    println!(
        "📋 incidents raised: {} | steps: {}",
        response.incident_count,
        response
            .completed_steps
            .iter()
            .map(|s| format!("{s:?}"))
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    match response.status {
        ResponseStatus::Success => {
            println!("\n✨ {} in {:.2?}", response.code, elapsed);
        }
        ResponseStatus::Error => {
            eprintln!("\n❌ {}", response.code);
        }
    }
}

fn render_profile(report: &ProfilingReport) {
    println!(
        "📊 {}: {} rows, {} columns ({} ms)",
        report.dataset_id, report.row_count, report.column_count, report.elapsed_ms
    );

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Column",
        "Type",
        "Completeness",
        "Uniqueness",
        "Validity",
        "Distinct",
        "Nulls",
        "Samples",
    ]);
    for column in &report.columns {
        table.add_row(vec![
            column.column.clone(),
            column.inferred_type.to_string(),
            format!("{:.3}", column.completeness),
            format!("{:.3}", column.uniqueness),
            format!("{:.3}", column.validity),
            column.distinct_count.to_string(),
            column.null_count.to_string(),
            column.sample_values.join(", "),
        ]);
    }
    println!("{table}");

    for score in &report.dimensions {
        match score.score {
            Some(value) if score.computed => {
                println!("  {}: {:.3} ({})", score.dimension, value, score.formula);
            }
            _ => {
                let reason = score.reason.as_deref().unwrap_or("not computed");
                println!("  {}: omitted ({})", score.dimension, reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run_defaults() {
        let args = Cli::parse_from([
            "warden",
            "run",
            "--dataset",
            "rows.json",
            "--dataset-id",
            "orders",
        ]);
        match args.command {
            Commands::Run {
                dataset,
                dataset_id,
                mode,
                since,
                json,
                ..
            } => {
                assert_eq!(dataset.to_string_lossy(), "rows.json");
                assert_eq!(dataset_id, "orders");
                assert_eq!(mode, Mode::Full);
                assert_eq!(since, None);
                assert!(!json);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_incremental() {
        let args = Cli::parse_from([
            "warden",
            "run",
            "--dataset",
            "rows.json",
            "--dataset-id",
            "orders",
            "--mode",
            "incremental",
            "--since",
            "2026-01-15T00:00:00Z",
        ]);
        match args.command {
            Commands::Run { mode, since, .. } => {
                assert_eq!(mode, Mode::Incremental);
                assert_eq!(since, Some("2026-01-15T00:00:00Z".to_string()));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_profile() {
        let args = Cli::parse_from([
            "warden",
            "profile",
            "--dataset",
            "rows.json",
            "--dataset-id",
            "orders",
            "--json",
        ]);
        match args.command {
            Commands::Profile { json, .. } => assert!(json),
            _ => panic!("Expected Profile command"),
        }
    }
}
