//! Interactive session: intents are read from stdin, snapshot changes are
//! printed as they are published.

use anyhow::Result;
use pmswitch_application::SettingsSnapshot;
use pmswitch_core::preference::{PackageManager, PreferenceValue};
use pmswitch_core::update::UpdateSnapshot;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::bootstrap::AppBootstrap;
use crate::render;

const HELP: &str = "commands: use <npm|pnpm|yarn|bun> | monitor <on|off> | check | accept | dismiss | status | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Set(PreferenceValue),
    Check,
    Accept,
    Dismiss,
    Status,
    Help,
    Quit,
}

fn parse_intent(line: &str) -> Result<Intent, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Intent::Help);
    };
    let argument = words.next();

    match (command, argument) {
        ("use", Some(pm)) => pm
            .parse::<PackageManager>()
            .map(|pm| Intent::Set(PreferenceValue::ToolChoice(pm)))
            .map_err(|_| format!("unknown package manager '{}'", pm)),
        ("monitor", Some("on")) => Ok(Intent::Set(PreferenceValue::MonitorEnabled(true))),
        ("monitor", Some("off")) => Ok(Intent::Set(PreferenceValue::MonitorEnabled(false))),
        ("check", None) => Ok(Intent::Check),
        ("accept", None) => Ok(Intent::Accept),
        ("dismiss", None) => Ok(Intent::Dismiss),
        ("status", None) => Ok(Intent::Status),
        ("help", _) => Ok(Intent::Help),
        ("quit" | "exit", None) => Ok(Intent::Quit),
        _ => Err(format!("cannot parse '{}'", line.trim())),
    }
}

fn spawn_printer(
    mut settings_rx: watch::Receiver<SettingsSnapshot>,
    mut updates_rx: watch::Receiver<UpdateSnapshot>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = settings_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = *settings_rx.borrow_and_update();
                    println!("{}", render::settings(&snapshot));
                }
                changed = updates_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = updates_rx.borrow_and_update().clone();
                    println!("{}", render::update(&snapshot));
                }
            }
        }
    })
}

pub async fn run(app: &AppBootstrap) -> Result<()> {
    let controller = &app.controller;
    controller.start().await;

    let settings = controller.settings();
    let updates = controller.updates();
    println!("{}", render::settings(&settings.snapshot()));
    println!("{}", render::update(&updates.snapshot()));
    println!("{}", HELP);

    let printer = spawn_printer(settings.subscribe(), updates.subscribe());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            biased;
            _ = app.quit_signal.notified() => {
                tracing::info!("[Run] Quit received");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("[Run] Interrupted");
                controller.shutdown();
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    controller.shutdown();
                    break;
                };
                match parse_intent(&line) {
                    Ok(Intent::Set(value)) => {
                        let settings = settings.clone();
                        tokio::spawn(async move { settings.set_preference(value).await });
                    }
                    Ok(Intent::Check) => {
                        let updates = updates.clone();
                        tokio::spawn(async move { updates.check_for_updates().await });
                    }
                    Ok(Intent::Accept) => {
                        let updates = updates.clone();
                        tokio::spawn(async move { updates.accept_update().await });
                    }
                    Ok(Intent::Dismiss) => updates.dismiss(),
                    Ok(Intent::Status) => {
                        println!("{}", render::settings(&settings.snapshot()));
                        println!("{}", render::update(&updates.snapshot()));
                    }
                    Ok(Intent::Help) => println!("{}", HELP),
                    Ok(Intent::Quit) => controller.quit().await,
                    Err(message) => println!("{}\n{}", message, HELP),
                }
            }
        }
    }

    printer.abort();
    Ok(())
}
