use super::ui;
use crate::core::error::Result;
use crate::core::valuation::PortfolioSnapshot;
use comfy_table::Cell;

fn ratio_cell(value: &Result<f64>) -> Cell {
    match value {
        Ok(v) => ui::percent_cell(*v),
        Err(_) => ui::na_cell(true),
    }
}

/// Per-asset holdings with their spot value and lifetime flows.
pub fn holdings_table(snapshot: &PortfolioSnapshot, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Asset"),
        ui::header_cell("Units"),
        ui::header_cell(&format!("Price ({currency})")),
        ui::header_cell(&format!("Value ({currency})")),
        ui::header_cell("Invested"),
        ui::header_cell("Earned"),
        ui::header_cell("Donated"),
    ]);

    for holding in &snapshot.current.holdings {
        let flows = snapshot
            .accumulators
            .by_asset
            .get(&holding.asset)
            .copied()
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(holding.asset.as_str()),
            ui::amount_cell(holding.units),
            ui::amount_cell(holding.price),
            ui::amount_cell(holding.value),
            ui::amount_cell(flows.invested),
            ui::amount_cell(flows.earned),
            ui::amount_cell(flows.donated),
        ]);
    }

    table.to_string()
}

/// Portfolio-wide totals. `current_year` anchors the CAGR.
pub fn totals_table(snapshot: &PortfolioSnapshot, current_year: i32) -> String {
    let acc = &snapshot.accumulators;
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);

    table.add_row(vec![Cell::new("Earned"), ui::amount_cell(acc.earned_sum())]);
    table.add_row(vec![
        Cell::new("Invested"),
        ui::amount_cell(acc.invested_sum()),
    ]);
    table.add_row(vec![Cell::new("Donated"), ui::amount_cell(acc.donated_sum())]);
    table.add_row(vec![
        Cell::new("Current valuation"),
        ui::amount_cell(snapshot.current_valuation_sum()),
    ]);
    table.add_row(vec![Cell::new("Total P/L"), ratio_cell(&snapshot.total_pl())]);
    table.add_row(vec![
        Cell::new("CAGR"),
        ratio_cell(&snapshot.cagr(current_year)),
    ]);

    table.to_string()
}

pub fn run(snapshot: &PortfolioSnapshot, currency: &str, current_year: i32) -> Result<()> {
    println!("{}\n", ui::style_text("Holdings", ui::StyleType::Title));
    println!("{}", holdings_table(snapshot, currency));
    ui::print_separator();
    println!("{}\n", ui::style_text("Totals", ui::StyleType::Title));
    println!("{}", totals_table(snapshot, current_year));
    println!(
        "\n{}",
        ui::style_text(
            &format!("All amounts in {currency}"),
            ui::StyleType::Subtle
        )
    );
    Ok(())
}
