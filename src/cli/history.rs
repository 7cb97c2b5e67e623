use super::ui;
use crate::core::error::Result;
use crate::core::replay::Accumulators;
use comfy_table::Cell;

/// Portfolio value at the end of every week in which the ledger has activity.
pub fn history_table(acc: &Accumulators, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Week of"),
        ui::header_cell(&format!("Valuation ({currency})")),
        ui::header_cell("Change"),
    ]);

    let mut previous: Option<f64> = None;
    for (week, value) in acc.weekly_valuation.iter() {
        let change = match previous {
            Some(p) if p != 0.0 => ui::percent_cell(value / p - 1.0),
            Some(_) => ui::na_cell(true),
            None => ui::na_cell(false),
        };
        table.add_row(vec![
            Cell::new(week.to_string()),
            ui::amount_cell(*value),
            change,
        ]);
        previous = Some(*value);
    }

    table.to_string()
}

pub fn run(acc: &Accumulators, currency: &str) -> Result<()> {
    println!("{}\n", ui::style_text("Weekly valuation", ui::StyleType::Title));
    println!("{}", history_table(acc, currency));
    Ok(())
}
