use super::ui;
use crate::config::DisplayConfig;
use crate::core::{Session, Slot, parse_amount};
use anyhow::Result;
use tracing::warn;

/// Drives the session through the widget flow: open the `from` slot, choose,
/// open the `to` slot, choose, then convert. All conversion failures surface
/// as a user message and leave the session intact; nothing here is fatal.
pub async fn run(
    session: &mut Session,
    from: &str,
    to: &str,
    amount_input: &str,
    display: &DisplayConfig,
) -> Result<()> {
    let amount = match parse_amount(amount_input) {
        Ok(amount) => amount,
        Err(e) => {
            println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
            return Ok(());
        }
    };

    let pb = ui::new_spinner(&format!("Fetching {} rates...", session.mode()));
    let loaded = session.open_slot(Slot::From).await.map(|_| ());
    pb.finish_and_clear();

    if let Err(e) = loaded {
        warn!("{e:#}");
        println!(
            "{}",
            ui::style_text("No rate data available, try again later.", ui::StyleType::Error)
        );
        return Ok(());
    }
    session.choose(from);

    // Same mode, so the store is already cached; no second fetch happens
    let _ = session.open_slot(Slot::To).await;
    session.choose(to);

    match session.convert(amount) {
        Ok(conversion) => {
            let amount_line = format!(
                "{} {} = {} {}",
                amount,
                conversion.from,
                conversion.amount_line(display.amount_decimals),
                conversion.to
            );
            println!("{}", ui::style_text(&amount_line, ui::StyleType::Result));

            let (forward, backward) = conversion.rate_lines(display.rate_decimals);
            println!("{}", ui::style_text(&forward, ui::StyleType::Rate));
            println!("{}", ui::style_text(&backward, ui::StyleType::Rate));
        }
        Err(e) => {
            println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
        }
    }

    Ok(())
}
