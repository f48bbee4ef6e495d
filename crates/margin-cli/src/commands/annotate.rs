//! `margin tags | frontmatter | proofread`

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use margin_core::settings::validate_service_url;
use margin_core::{
    AnnotationOrchestrator, AppSettings, ConfigStore, DocumentAccessor, FileWorkspace,
    HttpAnnotationClient, MemoryConfigStore, Operation, OperationOutcome, OperationReport,
};

use super::Context;
use crate::cli::ServiceOverrides;
use crate::terminal::TerminalNotifier;

/// Applies per-run overrides on top of the persisted settings
pub fn apply_overrides(
    mut settings: AppSettings,
    overrides: &ServiceOverrides,
) -> anyhow::Result<AppSettings> {
    if let Some(url) = &overrides.api_url {
        validate_service_url(url).with_context(|| format!("--api-url {}", url))?;
        settings.service_url = url.clone();
    }
    if let Some(model) = &overrides.model {
        settings.model = model.clone();
    }
    if let Some(api_key) = &overrides.api_key {
        settings.api_key = Some(api_key.clone());
    }
    settings.normalize();
    Ok(settings)
}

pub async fn run(
    ctx: &Context,
    file: &Path,
    operation: Operation,
    overrides: &ServiceOverrides,
) -> anyhow::Result<bool> {
    let settings = apply_overrides(ctx.settings_manager().load(), overrides)?;

    let workspace = FileWorkspace::new();
    workspace
        .open(file)
        .with_context(|| format!("cannot open {}", file.display()))?;

    let orchestrator = AnnotationOrchestrator::new(
        Arc::new(HttpAnnotationClient::new()?),
        DocumentAccessor::new(workspace),
        Arc::new(MemoryConfigStore::new(settings)),
        Arc::new(TerminalNotifier::new(ctx.json)),
    );

    let report = orchestrator.run(operation).await;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", summary(&report));
    }

    Ok(report.is_done())
}

/// One-line human summary of a run
pub fn summary(report: &OperationReport) -> String {
    let target = report.document_id.as_deref().unwrap_or("-");
    match &report.outcome {
        OperationOutcome::Done => format!(
            "{} {}: done in {} ms",
            report.operation, target, report.duration_ms
        ),
        OperationOutcome::Failed(reason) => {
            format!("{} {}: failed ({})", report.operation, target, reason)
        }
    }
}
