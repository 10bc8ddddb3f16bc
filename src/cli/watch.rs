//! Interactive session: each stdin line edits the controller the way a form
//! field would, and every settled status is printed as it arrives.

use super::ui;
use crate::core::{Catalog, ConversionController, ConversionStatus, Snapshot};
use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    Amount(String),
    From(String),
    To(String),
    Swap,
    Convert,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<WatchCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err("Empty input".to_string());
    };
    let arg = parts.next();
    if parts.next().is_some() {
        return Err(format!("Too many arguments: {}", line.trim()));
    }

    match (head.to_ascii_lowercase().as_str(), arg) {
        ("from", Some(code)) => Ok(WatchCommand::From(code.to_string())),
        ("to", Some(code)) => Ok(WatchCommand::To(code.to_string())),
        ("amount", Some(amount)) => Ok(WatchCommand::Amount(amount.to_string())),
        ("from" | "to" | "amount", None) => Err(format!("'{head}' needs a value")),
        ("swap", None) => Ok(WatchCommand::Swap),
        ("convert" | "c", None) => Ok(WatchCommand::Convert),
        ("help" | "?", None) => Ok(WatchCommand::Help),
        ("quit" | "exit" | "q", None) => Ok(WatchCommand::Quit),
        (_, None) => Ok(WatchCommand::Amount(head.to_string())),
        (_, Some(_)) => Err(format!("Unknown command: {head}")),
    }
}

fn print_help() {
    println!(
        "{}",
        ui::style_text(
            "Type an amount, 'from CODE', 'to CODE', 'swap', 'convert' or 'quit'.",
            ui::StyleType::Subtle
        )
    );
}

fn render(snapshot: &Snapshot, catalog: &Catalog) {
    let request = &snapshot.request;
    match &snapshot.status {
        ConversionStatus::Idle => {}
        ConversionStatus::Loading { .. } => println!(
            "{}",
            ui::style_text(
                &format!("Loading {} -> {}...", request.source, request.target),
                ui::StyleType::Subtle
            )
        ),
        ConversionStatus::Succeeded(result) => {
            for line in ui::result_lines(request, result, catalog) {
                println!("{line}");
            }
        }
        ConversionStatus::Failed(err) => {
            println!(
                "{}",
                ui::style_text(&format!("⚠️ {err}"), ui::StyleType::Error)
            )
        }
    }
}

async fn render_updates(mut updates: watch::Receiver<Snapshot>, catalog: Catalog) {
    let mut last_status = updates.borrow_and_update().status.clone();
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        if snapshot.status != last_status {
            render(&snapshot, &catalog);
            last_status = snapshot.status;
        }
    }
}

pub async fn run(controller: &ConversionController) -> Result<()> {
    let snapshot = controller.snapshot();
    println!(
        "{} {} {} -> {}",
        ui::style_text("Watching", ui::StyleType::Title),
        snapshot.request.amount,
        snapshot.request.source,
        snapshot.request.target
    );
    print_help();

    let renderer = tokio::spawn(render_updates(
        controller.subscribe(),
        controller.catalog().clone(),
    ));
    controller.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(WatchCommand::Amount(amount)) => controller.set_amount(&amount),
            Ok(WatchCommand::From(code)) => controller.set_source_currency(&code),
            Ok(WatchCommand::To(code)) => controller.set_target_currency(&code),
            Ok(WatchCommand::Swap) => {
                controller.swap();
                let request = controller.snapshot().request;
                println!(
                    "{}",
                    ui::style_text(
                        &format!("{} -> {}", request.source, request.target),
                        ui::StyleType::Subtle
                    )
                );
            }
            Ok(WatchCommand::Convert) => {
                // The renderer prints the outcome.
                let _ = controller.convert().await;
            }
            Ok(WatchCommand::Help) => print_help(),
            Ok(WatchCommand::Quit) => break,
            Err(message) => println!("{}", ui::style_text(&message, ui::StyleType::Error)),
        }
    }

    controller.shutdown();
    renderer.abort();
    Ok(())
}
