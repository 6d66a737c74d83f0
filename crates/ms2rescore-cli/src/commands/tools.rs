use crate::error::Result;
use ms2rescore::engine::command::{self, CommandRunner, SystemRunner, ToolStatus};
use ms2rescore::engine::config::Configuration;
use ms2rescore::engine::error::RescoreError;
use tracing::info;

pub async fn run(configuration: Configuration) -> Result<()> {
    let statuses = tokio::task::spawn_blocking(move || {
        probe(&configuration, &SystemRunner)
    })
    .await
    .map_err(|e| anyhow::anyhow!("Tool check task failed: {}", e))?;

    for status in &statuses {
        println!("{}", describe(status));
    }

    match statuses.iter().find(|s| s.required && !s.available) {
        Some(missing) => Err(RescoreError::ToolUnavailable {
            tool: missing.tool,
            hint: missing.tool.hint(),
        }
        .into()),
        None => {
            info!("All required tools are available.");
            Ok(())
        }
    }
}

fn probe(configuration: &Configuration, runner: &dyn CommandRunner) -> Vec<ToolStatus> {
    let percolator_required = configuration
        .ms2rescore
        .rescoring_engine
        .keys()
        .any(|k| k.eq_ignore_ascii_case("percolator"));
    command::probe_tools(runner, percolator_required)
}

fn describe(status: &ToolStatus) -> String {
    let mark = if status.available { "✓" } else { "✗" };
    let requirement = if status.required {
        "required"
    } else {
        "optional"
    };
    format!(
        "{} {} ({}, {})",
        mark,
        status.tool,
        status.tool.program(),
        requirement
    )
}
