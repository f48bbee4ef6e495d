//! `margin models`

use margin_core::settings::KNOWN_MODELS;
use margin_core::ConfigStore;
use serde::Serialize;

use super::Context;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    id: &'static str,
    display_name: &'static str,
    selected: bool,
}

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let current = ctx.settings_manager().load().model;
    let entries: Vec<ModelEntry> = KNOWN_MODELS
        .iter()
        .map(|&(id, display_name)| ModelEntry {
            id,
            display_name,
            selected: id == current,
        })
        .collect();

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        let marker = if entry.selected { "*" } else { " " };
        println!("{} {:<24} {}", marker, entry.id, entry.display_name);
    }
    Ok(())
}
