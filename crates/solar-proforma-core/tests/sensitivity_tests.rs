use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use solar_proforma_core::assumptions::{
    AmortizationStyle, FinancingAssumptions, ProjectAssumptions,
};
use solar_proforma_core::sensitivity::{
    run_sensitivity, Perturbation, PerturbationMode, ScenarioOutcome, SensitivityField,
};

fn base_project() -> ProjectAssumptions {
    ProjectAssumptions {
        name: "Caldera Flats Solar".into(),
        capacity_mw: dec!(100),
        capex: dec!(90_000_000),
        opex_annual: dec!(1_500_000),
        ppa_price: dec!(35),
        degradation: dec!(0.005),
        capacity_factor: dec!(0.28),
        cod_year: 2027,
        project_life_years: 25,
    }
}

fn base_financing() -> FinancingAssumptions {
    FinancingAssumptions {
        debt_fraction: dec!(0.70),
        interest_rate: dec!(0.055),
        tenor_years: 18,
        amortization: AmortizationStyle::LevelPayment,
        discount_rate: dec!(0.08),
    }
}

#[test]
fn test_ppa_sweep_preserves_order_and_base_case() {
    // Base PPA of $35/MWh swept across five prices; the $35 entry must
    // reproduce the base metrics exactly.
    let perturbations = vec![Perturbation {
        field: SensitivityField::PpaPrice,
        values: vec![dec!(30), dec!(32), dec!(35), dec!(38), dec!(40)],
        mode: PerturbationMode::Absolute,
    }];

    let result = run_sensitivity(&base_project(), &base_financing(), &perturbations).unwrap();
    let out = &result.result;

    let applied: Vec<_> = out.scenarios.iter().map(|s| s.applied_value).collect();
    assert_eq!(
        applied,
        vec![dec!(30), dec!(32), dec!(35), dec!(38), dec!(40)]
    );

    match &out.scenarios[2].outcome {
        ScenarioOutcome::Computed { metrics, delta } => {
            assert_eq!(*metrics, out.base);
            assert_eq!(delta.npv, dec!(0));
        }
        ScenarioOutcome::Failed { error } => panic!("base-value scenario failed: {error}"),
    }

    // NPV deltas rise monotonically with price
    let npv_deltas: Vec<_> = out
        .scenarios
        .iter()
        .map(|s| match &s.outcome {
            ScenarioOutcome::Computed { delta, .. } => delta.npv,
            ScenarioOutcome::Failed { error } => panic!("scenario failed: {error}"),
        })
        .collect();
    for pair in npv_deltas.windows(2) {
        assert!(pair[0] < pair[1], "NPV deltas not increasing: {npv_deltas:?}");
    }
}

#[test]
fn test_mixed_perturbations_keep_declared_order() {
    let perturbations = vec![
        Perturbation {
            field: SensitivityField::Capex,
            values: vec![dec!(-0.10), dec!(0.10)],
            mode: PerturbationMode::PercentOffset,
        },
        Perturbation {
            field: SensitivityField::DebtFraction,
            values: vec![dec!(0.60), dec!(0.80)],
            mode: PerturbationMode::Absolute,
        },
    ];

    let result = run_sensitivity(&base_project(), &base_financing(), &perturbations).unwrap();
    let out = &result.result;

    assert_eq!(out.scenarios.len(), 4);
    assert_eq!(out.scenarios[0].field, SensitivityField::Capex);
    assert_eq!(out.scenarios[0].applied_value, dec!(81_000_000));
    assert_eq!(out.scenarios[1].applied_value, dec!(99_000_000));
    assert_eq!(out.scenarios[2].field, SensitivityField::DebtFraction);
    assert_eq!(out.scenarios[3].applied_value, dec!(0.80));
}

#[test]
fn test_bad_value_does_not_hide_other_scenarios() {
    let perturbations = vec![Perturbation {
        field: SensitivityField::DebtFraction,
        values: vec![dec!(0.60), dec!(1.50), dec!(0.80)],
        mode: PerturbationMode::Absolute,
    }];

    let result = run_sensitivity(&base_project(), &base_financing(), &perturbations).unwrap();
    let out = &result.result;

    assert_eq!(out.scenarios.len(), 3);
    assert!(matches!(
        out.scenarios[0].outcome,
        ScenarioOutcome::Computed { .. }
    ));
    match &out.scenarios[1].outcome {
        ScenarioOutcome::Failed { error } => {
            assert!(error.contains("debt_fraction"), "error: {error}");
        }
        ScenarioOutcome::Computed { .. } => panic!("expected a recorded failure"),
    }
    assert!(matches!(
        out.scenarios[2].outcome,
        ScenarioOutcome::Computed { .. }
    ));
}
