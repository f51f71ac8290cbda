use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use solar_proforma_core::assumptions::{
    AmortizationStyle, FinancingAssumptions, ProjectAssumptions,
};
use solar_proforma_core::proforma::run_proforma;
use solar_proforma_core::time_value;
use solar_proforma_core::ProformaError;

// ===========================================================================
// Cash Flow Model acceptance tests
// ===========================================================================

/// A viable 100 MW project: 70% leverage at 5.5% over 18 years,
/// level-payment, 8% discount rate, 25-year life.
fn reference_project() -> ProjectAssumptions {
    ProjectAssumptions {
        name: "Caldera Flats Solar".into(),
        capacity_mw: dec!(100),
        capex: dec!(90_000_000),
        opex_annual: dec!(1_500_000),
        ppa_price: dec!(40),
        degradation: dec!(0.005),
        capacity_factor: dec!(0.28),
        cod_year: 2027,
        project_life_years: 25,
    }
}

fn reference_financing() -> FinancingAssumptions {
    FinancingAssumptions {
        debt_fraction: dec!(0.70),
        interest_rate: dec!(0.055),
        tenor_years: 18,
        amortization: AmortizationStyle::LevelPayment,
        discount_rate: dec!(0.08),
    }
}

#[test]
fn test_reference_project_metrics() {
    let result = run_proforma(&reference_project(), &reference_financing()).unwrap();
    let metrics = &result.result.metrics;

    // A healthy levered project: defined IRR in a plausible band,
    // covenant-clean coverage, payback inside the project life.
    let irr = metrics.levered_irr.expect("IRR should be defined");
    assert!(
        irr > dec!(0.05) && irr < dec!(0.16),
        "levered IRR {irr} outside expected band"
    );

    let min_dscr = metrics.min_dscr.expect("min DSCR should be defined");
    assert!(min_dscr >= Decimal::ONE, "min DSCR {min_dscr} sub-covenant");

    let payback = metrics.payback_year.expect("payback should be reached");
    assert!(payback < 25, "payback year {payback}");

    assert_eq!(metrics.equity_investment, dec!(27_000_000));
    assert_eq!(metrics.terminal_balloon, None);
}

#[test]
fn test_irr_zeroes_npv_of_equity_series() {
    let result = run_proforma(&reference_project(), &reference_financing()).unwrap();
    let out = &result.result;

    let mut flows = vec![-out.metrics.equity_investment];
    flows.extend(out.schedule.iter().map(|row| row.levered_cash_flow));

    let irr = out.metrics.levered_irr.unwrap();
    let residual = time_value::npv(irr, &flows).unwrap();
    assert!(
        residual.abs() < dec!(0.01),
        "NPV at IRR should be ~0, got {residual}"
    );
}

#[test]
fn test_npv_decreases_with_discount_rate() {
    let project = reference_project();
    let mut npvs = Vec::new();
    for rate in [dec!(0.05), dec!(0.08), dec!(0.11)] {
        let mut financing = reference_financing();
        financing.discount_rate = rate;
        let result = run_proforma(&project, &financing).unwrap();
        npvs.push(result.result.metrics.npv);
    }
    assert!(npvs[0] > npvs[1] && npvs[1] > npvs[2], "NPVs {npvs:?}");
}

#[test]
fn test_schedule_identities_hold_every_year() {
    let project = reference_project();
    let result = run_proforma(&project, &reference_financing()).unwrap();
    let schedule = &result.result.schedule;

    let retention = Decimal::ONE - project.degradation;
    for (i, row) in schedule.iter().enumerate() {
        assert_eq!(row.ebitda, row.revenue - row.opex, "year {}", row.year);
        assert_eq!(
            row.debt_service,
            row.interest + row.principal,
            "year {}",
            row.year
        );
        if i > 0 {
            let ratio = row.revenue / schedule[i - 1].revenue;
            assert!(
                (ratio - retention).abs() < dec!(0.000000001),
                "year {}: revenue ratio {ratio}",
                row.year
            );
        }
    }
}

#[test]
fn test_debt_fully_retired_and_never_negative() {
    let result = run_proforma(&reference_project(), &reference_financing()).unwrap();
    let schedule = &result.result.schedule;

    for row in schedule {
        assert!(row.debt_balance >= Decimal::ZERO, "year {}", row.year);
    }
    assert_eq!(schedule[17].debt_balance, Decimal::ZERO);
    assert_eq!(schedule[24].debt_balance, Decimal::ZERO);
}

#[test]
fn test_identical_inputs_identical_outputs() {
    let project = reference_project();
    let financing = reference_financing();

    let first = run_proforma(&project, &financing).unwrap();
    let second = run_proforma(&project, &financing).unwrap();

    assert_eq!(first.result, second.result);
}

#[test]
fn test_invalid_degradation_returns_no_schedule() {
    let mut project = reference_project();
    project.degradation = dec!(1.2);

    let err = run_proforma(&project, &reference_financing()).unwrap_err();
    match err {
        ProformaError::InvalidAssumption { field, reason } => {
            assert_eq!(field, "degradation");
            assert!(reason.contains("[0, 1)"));
        }
        other => panic!("Expected InvalidAssumption, got: {other:?}"),
    }
}

#[test]
fn test_undefined_irr_for_never_positive_series() {
    // PPA priced so low that EBITDA is negative every year: the equity
    // series never changes sign, so IRR and payback are undefined states,
    // not errors and not sentinels.
    let mut project = reference_project();
    project.ppa_price = dec!(5);

    let result = run_proforma(&project, &reference_financing()).unwrap();
    let metrics = &result.result.metrics;

    assert_eq!(metrics.levered_irr, None);
    assert_eq!(metrics.payback_year, None);
    assert!(metrics.npv < Decimal::ZERO);
}
