use super::ui;
use crate::core::ConversionController;
use anyhow::Result;

/// Runs a single conversion with the controller's current values.
pub async fn run(controller: &ConversionController) -> Result<()> {
    let spinner = ui::new_spinner("Fetching exchange rates...");
    let outcome = controller.convert().await;
    spinner.finish_and_clear();

    let snapshot = controller.snapshot();
    match outcome {
        Ok(result) => {
            println!(
                "{}",
                ui::style_text("Conversion result", ui::StyleType::Title)
            );
            for line in ui::result_lines(&snapshot.request, &result, controller.catalog()) {
                println!("{line}");
            }
            Ok(())
        }
        Err(err) => {
            println!(
                "{}",
                ui::style_text(&format!("⚠️ {err}"), ui::StyleType::Error)
            );
            Err(err.into())
        }
    }
}
