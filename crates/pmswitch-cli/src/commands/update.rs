use anyhow::{bail, Result};
use pmswitch_core::update::UpdatePhase;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::bootstrap::AppBootstrap;
use crate::render;

pub async fn run(app: &AppBootstrap, assume_yes: bool) -> Result<()> {
    let controller = &app.controller;
    controller.start().await;
    let updates = controller.updates();

    println!("Checking for updates (current {})...", env!("CARGO_PKG_VERSION"));
    updates.check_for_updates().await;

    let Some(version) = updates.snapshot().available_version().map(str::to_string) else {
        println!("{}", render::update(&updates.snapshot()));
        controller.shutdown();
        return Ok(());
    };

    if !assume_yes && !confirm(&format!("Install version {}? [y/N] ", version)).await? {
        updates.dismiss();
        println!("{}", render::update(&updates.snapshot()));
        controller.shutdown();
        return Ok(());
    }

    let mut rx = updates.subscribe();
    let printer = tokio::spawn(async move {
        let mut last = None;
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            let line = render::update(&snapshot);
            if last.as_ref() != Some(&line) {
                println!("{}", line);
                last = Some(line);
            }
        }
    });

    updates.accept_update().await;
    printer.abort();

    let snapshot = updates.snapshot();
    controller.shutdown();
    println!("{}", render::update(&snapshot));

    match snapshot.phase {
        UpdatePhase::Finished { .. } | UpdatePhase::Installing { .. } => Ok(()),
        _ => bail!(
            "Update {} was not installed: {}",
            version,
            snapshot.last_error.as_deref().unwrap_or("unknown error")
        ),
    }
}

async fn confirm(prompt: &str) -> Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut answer).await?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
