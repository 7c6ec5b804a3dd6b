use anyhow::{bail, Result};
use pmswitch_core::preference::{PackageManager, PreferenceValue};

use crate::bootstrap::AppBootstrap;
use crate::render;

pub async fn use_package_manager(
    app: &AppBootstrap,
    package_manager: PackageManager,
    as_json: bool,
) -> Result<()> {
    apply(app, PreferenceValue::ToolChoice(package_manager), as_json).await
}

pub async fn set_monitoring(app: &AppBootstrap, enabled: bool, as_json: bool) -> Result<()> {
    apply(app, PreferenceValue::MonitorEnabled(enabled), as_json).await
}

async fn apply(app: &AppBootstrap, value: PreferenceValue, as_json: bool) -> Result<()> {
    let controller = &app.controller;
    controller.start().await;

    let settings = controller.settings();
    settings.set_preference(value).await;
    let confirmed = settings.confirmed(value.kind());
    let snapshot = settings.snapshot();
    controller.shutdown();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{}", render::settings(&snapshot));
    }

    if confirmed != value {
        bail!("Failed to save {}; kept {}", value, confirmed);
    }
    Ok(())
}
