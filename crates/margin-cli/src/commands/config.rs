//! `margin config`

use anyhow::Context as _;
use margin_core::settings::model_display_name;
use margin_core::{AppSettings, ConfigStore, SettingsManager};

use super::Context;
use crate::cli::{ConfigCommand, ConfigKey};

pub fn run(ctx: &Context, action: ConfigCommand) -> anyhow::Result<()> {
    let manager = ctx.settings_manager();

    let settings = match action {
        ConfigCommand::Show => manager.load(),
        ConfigCommand::Set { key, value } => {
            let updated = set_value(manager.load(), key, &value);
            manager
                .save(&updated)
                .with_context(|| format!("cannot set {}", key_name(key)))?
        }
        ConfigCommand::ResetUrl => manager
            .reset_service_url()
            .context("cannot reset service URL")?,
        ConfigCommand::Reset => manager.reset().context("cannot reset settings")?,
    };

    print_settings(ctx, &manager, &settings)
}

/// Returns `settings` with one key replaced; an empty API key clears it
pub fn set_value(mut settings: AppSettings, key: ConfigKey, value: &str) -> AppSettings {
    match key {
        ConfigKey::ApiUrl => settings.service_url = value.trim().to_string(),
        ConfigKey::Model => settings.model = value.trim().to_string(),
        ConfigKey::ApiKey => {
            settings.api_key = Some(value.trim().to_string()).filter(|key| !key.is_empty())
        }
        ConfigKey::Property => settings.metadata_property_name = value.trim().to_string(),
    }
    settings
}

fn key_name(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::ApiUrl => "api-url",
        ConfigKey::Model => "model",
        ConfigKey::ApiKey => "api-key",
        ConfigKey::Property => "property",
    }
}

/// Masks all but the last four characters of a secret
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len().max(4));
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

fn print_settings(
    ctx: &Context,
    manager: &SettingsManager,
    settings: &AppSettings,
) -> anyhow::Result<()> {
    let mut shown = settings.clone();
    shown.api_key = shown.api_key.as_deref().map(mask_secret);

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    let model = match model_display_name(&shown.model) {
        Some(name) => format!("{} ({})", shown.model, name),
        None => shown.model.clone(),
    };
    println!("settings: {}", manager.settings_path().display());
    println!("api-url:  {}", shown.service_url);
    println!("model:    {}", model);
    println!(
        "api-key:  {}",
        shown.api_key.as_deref().unwrap_or("(not set)")
    );
    println!("property: {}", shown.metadata_property_name);
    println!("timeout:  {}s", shown.request_timeout_secs);
    Ok(())
}
