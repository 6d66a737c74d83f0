use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use ms2rescore::engine::command::SystemRunner;
use ms2rescore::engine::config::{Configuration, RescoreConfig};
use ms2rescore::workflows::{self, rescore::RescoreSummary};
use tracing::{debug, info, warn};

pub async fn run(configuration: Configuration) -> Result<()> {
    info!("Validating configuration...");
    let config = RescoreConfig::from_configuration(configuration)?;
    debug!("Resolved configuration: {:?}", config);

    println!(
        "Rescoring {} ({} pipeline, {} processes)...",
        config.psm_file.display(),
        config.pipeline,
        config.processes
    );
    info!("Invoking the core rescoring workflow...");

    let summary = tokio::task::spawn_blocking(move || {
        let reporter = CliProgressHandler::reporter(config.show_progress_bar);
        workflows::rescore::run(&config, &SystemRunner, &reporter)
    })
    .await
    .map_err(|e| CliError::Other(anyhow::anyhow!("Rescoring task failed: {}", e)))??;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RescoreSummary) {
    info!(
        "Workflow finished for {} feature set(s).",
        summary.feature_sets.len()
    );
    println!("MS²PIP predictions: {}", summary.predictions.display());

    if summary.feature_sets.is_empty() {
        println!("No PIN files were generated; configure `commands.features` to rescore.");
        return;
    }

    for outcome in &summary.feature_sets {
        if outcome.rescored {
            println!(
                "✓ {} features rescored: {}",
                outcome.feature_set,
                outcome.files.pout.display()
            );
        } else {
            println!(
                "  {} features ready for rescoring: {}",
                outcome.feature_set,
                outcome.files.pin.display()
            );
        }
    }

    let failed = summary.failed_feature_sets().count();
    if failed > 0 {
        warn!("{} feature set(s) were not rescored.", failed);
    }
    if summary.removed_files > 0 {
        debug!("Removed {} temporary file(s).", summary.removed_files);
    }
}
