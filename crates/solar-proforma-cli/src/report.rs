use chrono::Utc;
use rust_decimal::Decimal;

use solar_proforma_core::assumptions::{
    AmortizationStyle, FinancingAssumptions, ProjectAssumptions,
};
use solar_proforma_core::proforma::ProformaOutput;
use solar_proforma_core::types::ComputationOutput;

/// Render a Markdown investment summary for a completed model run.
pub fn render_summary(
    project: &ProjectAssumptions,
    financing: &FinancingAssumptions,
    output: &ComputationOutput<ProformaOutput>,
) -> String {
    let metrics = &output.result.metrics;
    let mut md = String::new();

    md.push_str(&format!("# {} – Investment Summary\n\n", project.name));
    md.push_str(&format!("Run date: {}\n\n", Utc::now().format("%Y-%m-%d")));

    md.push_str("## Key Assumptions\n\n");
    md.push_str(&format!("- Capacity: {} MW\n", project.capacity_mw));
    md.push_str(&format!("- Capex: ${}\n", money(project.capex)));
    md.push_str(&format!("- Annual opex: ${}\n", money(project.opex_annual)));
    md.push_str(&format!("- PPA price: ${}/MWh\n", project.ppa_price));
    md.push_str(&format!("- Degradation: {}/yr\n", pct(project.degradation)));
    md.push_str(&format!(
        "- Capacity factor: {}\n",
        pct(project.capacity_factor)
    ));
    md.push_str(&format!(
        "- Project life: {} years from COD {}\n",
        project.project_life_years, project.cod_year
    ));
    md.push_str(&format!(
        "- Debt: {} of capex at {} over {} years ({})\n",
        pct(financing.debt_fraction),
        pct(financing.interest_rate),
        financing.tenor_years,
        style_label(&financing.amortization)
    ));
    md.push_str(&format!(
        "- Discount rate: {}\n\n",
        pct(financing.discount_rate)
    ));

    md.push_str("## Financial Results\n\n");
    md.push_str(&format!(
        "- Equity investment: ${}\n",
        money(metrics.equity_investment)
    ));
    match metrics.levered_irr {
        Some(irr) => md.push_str(&format!("- Levered IRR: {}\n", pct(irr))),
        None => md.push_str("- Levered IRR: Undefined\n"),
    }
    md.push_str(&format!("- NPV: ${}\n", money(metrics.npv)));
    match metrics.min_dscr {
        Some(dscr) => md.push_str(&format!("- Minimum DSCR: {}x\n", dscr.round_dp(2))),
        None => md.push_str("- Minimum DSCR: n/a (no debt service)\n"),
    }
    match metrics.payback_year {
        Some(year) => md.push_str(&format!("- Payback: year {}\n", year)),
        None => md.push_str("- Payback: Not reached\n"),
    }
    if let Some(balloon) = metrics.terminal_balloon {
        md.push_str(&format!(
            "- Unretired debt at end of tenor: ${}\n",
            money(balloon)
        ));
    }

    if !output.warnings.is_empty() {
        md.push_str("\n## Warnings\n\n");
        for warning in &output.warnings {
            md.push_str(&format!("- {}\n", warning));
        }
    }

    md
}

fn style_label(style: &AmortizationStyle) -> &'static str {
    match style {
        AmortizationStyle::LevelPayment => "level payment",
        AmortizationStyle::Sculpted { .. } => "sculpted",
    }
}

/// Format a fractional rate as a percentage with two decimals.
fn pct(rate: Decimal) -> String {
    let mut scaled = rate * Decimal::ONE_HUNDRED;
    scaled.rescale(2);
    format!("{}%", scaled)
}

/// Format a money amount with comma thousands separators, rounded to
/// whole dollars.
fn money(amount: Decimal) -> String {
    let rounded = amount.round_dp(0);
    let raw = rounded.abs().to_string();
    let digits = raw.split('.').next().unwrap_or(&raw);

    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(dec!(27000000)), "27,000,000");
        assert_eq!(money(dec!(950)), "950");
        assert_eq!(money(dec!(-1234567.89)), "-1,234,568");
    }

    #[test]
    fn pct_scales_and_rounds() {
        assert_eq!(pct(dec!(0.055)), "5.50%");
        assert_eq!(pct(dec!(0.7)), "70.00%");
    }
}
