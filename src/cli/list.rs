use super::ui;
use crate::core::Session;
use anyhow::Result;
use tracing::warn;

/// Renders the current mode's rate list, filtered by an optional
/// case-insensitive substring query on the code.
pub async fn run(session: &Session, query: Option<&str>) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching {} rates...", session.mode()));
    let store = match session.rates().await {
        Ok(store) => store,
        Err(e) => {
            pb.finish_and_clear();
            warn!("{e:#}");
            println!(
                "{}",
                ui::style_text("No rate data available, try again later.", ui::StyleType::Error)
            );
            return Ok(());
        }
    };
    pb.finish_and_clear();

    let query = query.unwrap_or("");
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Code"), ui::header_cell("USD Rate")]);

    let mut shown = 0;
    for record in store.filter(query) {
        table.add_row(vec![
            ui::numeric_cell(&record.code),
            ui::numeric_cell(&format!("{:.6}", record.usd_rate)),
        ]);
        shown += 1;
    }

    if shown == 0 {
        println!(
            "{}",
            ui::style_text(
                &format!("No {} codes match '{}'", session.mode(), query),
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    println!("{table}");
    println!(
        "{}",
        ui::style_text(
            &format!("{shown} of {} {} codes", store.len(), session.mode()),
            ui::StyleType::Subtle
        )
    );

    Ok(())
}
