use palette_recon::config::Configuration;
use palette_recon::error::AppError;
use palette_recon::pipeline::orchestration::{ReconciliationPipeline, RunOutcome, TracingProgress};
use palette_recon::pipeline::ReportOutcome;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::Level;

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

fn log_preview(outcome: &RunOutcome, limit: usize) {
    let result = &outcome.result;
    if result.is_empty() {
        if outcome.counts().dropped_records > 0 {
            tracing::info!(
                "No missing colors among decoded records ({} rows were dropped)",
                outcome.counts().dropped_records
            );
        } else {
            tracing::info!("All records match! No missing colors found.");
        }
        return;
    }

    tracing::info!("Missing records detected:");
    for record in result.iter().take(limit) {
        tracing::info!("  {:<30} {}", record.name, record.raw_code);
    }
    if result.len() > limit {
        tracing::info!("(...showing first {} of {} missing records)", limit, result.len());
    }
}

fn log_failure_hints(error: &AppError) {
    let hint = match error {
        AppError::ImageDecode { .. } => "check the image path and that the file is a valid image",
        AppError::Schema { .. } | AppError::TableRead { .. } => {
            "check the table path, delimiter and column names"
        }
        AppError::ColorDecode { .. } => "fix the listed color codes or enable drop_invalid_rows",
        AppError::OutputWrite { .. } | AppError::SummaryWrite { .. } => {
            "check that the output location exists and is writable"
        }
        AppError::Configuration(_) => "check palette-recon.toml and PALETTE_RECON_* variables",
        AppError::Task(_) => "rerun; a pipeline task stopped unexpectedly",
    };
    tracing::error!("Hint: {}", hint);
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let configuration = match Configuration::load() {
        Ok(configuration) => configuration,
        Err(e) => {
            tracing::error!("{}", e);
            log_failure_hints(&e);
            return ExitCode::FAILURE;
        }
    };
    let preview_limit = configuration.preview_limit;
    tracing::info!("=== Region Validation Tool ===");
    tracing::info!("Table: {}", configuration.table_path.display());
    tracing::info!("Image: {}", configuration.image_path.display());
    tracing::info!("Color column: {}", configuration.color_column);

    let pipeline = match ReconciliationPipeline::builder(configuration)
        .observer(Arc::new(TracingProgress))
        .build()
    {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("{}", e);
            log_failure_hints(&e);
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let exit = match pipeline.run().await {
        Ok(outcome) => {
            log_preview(&outcome, preview_limit);
            if let Some(ReportOutcome::Written { path, rows }) = &outcome.summary.report {
                tracing::info!("Saved {} missing records to {}", rows, path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let Some(outcome) = e.outcome() {
                log_preview(outcome, preview_limit);
            }
            tracing::error!("Operation failed: {}", e);
            log_failure_hints(e.app_error());
            ExitCode::FAILURE
        }
    };
    tracing::info!("Total processing time: {:.2} seconds", start.elapsed().as_secs_f64());
    exit
}
