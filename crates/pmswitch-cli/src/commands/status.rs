use anyhow::Result;
use serde_json::json;

use crate::bootstrap::AppBootstrap;
use crate::render;

pub async fn run(app: &AppBootstrap, as_json: bool) -> Result<()> {
    let controller = &app.controller;
    controller.start().await;

    let settings = controller.settings().snapshot();
    let updates = controller.updates().snapshot();
    if as_json {
        let view = json!({ "settings": settings, "update": updates });
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", render::settings(&settings));
        println!("{}", render::update(&updates));
    }

    controller.shutdown();
    Ok(())
}
