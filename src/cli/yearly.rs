use super::ui;
use crate::core::error::Result;
use crate::core::valuation::PortfolioSnapshot;
use comfy_table::Cell;

fn ratio_cell(value: Option<&Result<f64>>) -> Cell {
    match value {
        Some(Ok(v)) => ui::percent_cell(*v),
        Some(Err(_)) => ui::na_cell(true),
        None => ui::na_cell(false),
    }
}

/// One row per fiscal year: closing valuation, flows, P/L and growth.
pub fn yearly_table(snapshot: &PortfolioSnapshot, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Year"),
        ui::header_cell(&format!("Valuation ({currency})")),
        ui::header_cell("Invested"),
        ui::header_cell("Earned"),
        ui::header_cell("Donated"),
        ui::header_cell("P/L"),
        ui::header_cell("P/L w/o earnings"),
        ui::header_cell("YoY"),
    ]);

    let yearly = snapshot.yearly_valuation();
    let pl = snapshot.yearly_pl();
    let pl_ex_earnings = snapshot.yearly_pl_ex_earnings();
    // The first year has no predecessor to grow from
    let yoy: Vec<Option<Result<f64>>> = std::iter::once(None)
        .chain(snapshot.yoy_growth().into_iter().map(|(_, g)| Some(g)))
        .collect();

    for (i, (year, valuation)) in yearly.iter().enumerate() {
        let flows = snapshot.accumulators.year_flows(year);
        table.add_row(vec![
            Cell::new(year.to_string()),
            ui::amount_cell(*valuation),
            ui::amount_cell(flows.invested),
            ui::amount_cell(flows.earned),
            ui::amount_cell(flows.donated),
            ratio_cell(pl.get(i).map(|(_, r)| r)),
            ratio_cell(pl_ex_earnings.get(i).map(|(_, r)| r)),
            ratio_cell(yoy.get(i).and_then(|g| g.as_ref())),
        ]);
    }

    table.to_string()
}

pub fn run(snapshot: &PortfolioSnapshot, currency: &str) -> Result<()> {
    println!("{}\n", ui::style_text("Yearly performance", ui::StyleType::Title));
    if snapshot.yearly_valuation().is_empty() {
        println!(
            "{}",
            ui::style_text("No valuations recorded", ui::StyleType::Subtle)
        );
        return Ok(());
    }
    println!("{}", yearly_table(snapshot, currency));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar::{fiscal_year, week_start};
    use crate::core::oracle::tests::day;
    use crate::core::replay::{Accumulators, Flows};
    use crate::core::valuation::CurrentValuation;

    fn snapshot() -> PortfolioSnapshot {
        let mut acc = Accumulators::default();
        for (instant, value) in [(day(2020, 6, 3), 0.0), (day(2021, 6, 2), 200.0)] {
            acc.weekly_valuation.insert(week_start(instant), value);
            acc.yearly_valuation.insert(fiscal_year(instant), value);
        }
        acc.by_year.insert(
            fiscal_year(day(2021, 6, 2)),
            Flows {
                invested: 100.0,
                earned: 60.0,
                donated: 0.0,
            },
        );
        PortfolioSnapshot::new(acc, CurrentValuation::default())
    }

    #[test]
    fn test_yearly_table_rows() {
        let output = yearly_table(&snapshot(), "EUR");
        assert!(output.contains("2020"));
        assert!(output.contains("2021"));
        assert!(output.contains("Valuation (EUR)"));
        // 200 / (100 + 60) - 1
        assert!(output.contains("25.00%"));
        // (200 - 60) / 100 - 1
        assert!(output.contains("40.00%"));
    }

    #[test]
    fn test_yearly_table_marks_errors() {
        // 2020 has no flows and 2021 grows from a zero valuation
        let output = yearly_table(&snapshot(), "EUR");
        assert!(output.matches("N/A").count() >= 3);
    }
}
