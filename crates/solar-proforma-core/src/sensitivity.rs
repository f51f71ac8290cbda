use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::{FinancingAssumptions, ProjectAssumptions};
use crate::proforma::{self, ProjectMetrics};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ProformaResult;

// ---------------------------------------------------------------------------
// Perturbation types
// ---------------------------------------------------------------------------

/// Assumption fields the engine can perturb, one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityField {
    CapacityMw,
    Capex,
    OpexAnnual,
    PpaPrice,
    Degradation,
    CapacityFactor,
    DebtFraction,
    InterestRate,
    DiscountRate,
}

impl SensitivityField {
    /// Reporting name, matching the input field it overrides.
    pub fn name(&self) -> &'static str {
        match self {
            SensitivityField::CapacityMw => "capacity_mw",
            SensitivityField::Capex => "capex",
            SensitivityField::OpexAnnual => "opex_annual",
            SensitivityField::PpaPrice => "ppa_price",
            SensitivityField::Degradation => "degradation",
            SensitivityField::CapacityFactor => "capacity_factor",
            SensitivityField::DebtFraction => "debt_fraction",
            SensitivityField::InterestRate => "interest_rate",
            SensitivityField::DiscountRate => "discount_rate",
        }
    }

    fn base_value(
        &self,
        project: &ProjectAssumptions,
        financing: &FinancingAssumptions,
    ) -> Decimal {
        match self {
            SensitivityField::CapacityMw => project.capacity_mw,
            SensitivityField::Capex => project.capex,
            SensitivityField::OpexAnnual => project.opex_annual,
            SensitivityField::PpaPrice => project.ppa_price,
            SensitivityField::Degradation => project.degradation,
            SensitivityField::CapacityFactor => project.capacity_factor,
            SensitivityField::DebtFraction => financing.debt_fraction,
            SensitivityField::InterestRate => financing.interest_rate,
            SensitivityField::DiscountRate => financing.discount_rate,
        }
    }

    fn apply(
        &self,
        value: Decimal,
        project: &mut ProjectAssumptions,
        financing: &mut FinancingAssumptions,
    ) {
        match self {
            SensitivityField::CapacityMw => project.capacity_mw = value,
            SensitivityField::Capex => project.capex = value,
            SensitivityField::OpexAnnual => project.opex_annual = value,
            SensitivityField::PpaPrice => project.ppa_price = value,
            SensitivityField::Degradation => project.degradation = value,
            SensitivityField::CapacityFactor => project.capacity_factor = value,
            SensitivityField::DebtFraction => financing.debt_fraction = value,
            SensitivityField::InterestRate => financing.interest_rate = value,
            SensitivityField::DiscountRate => financing.discount_rate = value,
        }
    }
}

/// How perturbation values are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerturbationMode {
    /// Values replace the base value directly
    #[default]
    Absolute,
    /// Values are fractional offsets: applied = base x (1 + offset)
    PercentOffset,
}

/// A single-field sweep, applied one value at a time against the base case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Perturbation {
    pub field: SensitivityField,
    pub values: Vec<Decimal>,
    #[serde(default)]
    pub mode: PerturbationMode,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Metric deltas against the base case. Optional metrics carry a delta
/// only when both the base and the scenario define them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsDelta {
    pub npv: Money,
    pub levered_irr: Option<Rate>,
    pub min_dscr: Option<Decimal>,
    pub payback_years: Option<i64>,
}

/// Outcome of a single perturbed run. A failed scenario is recorded in
/// place and never aborts the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Computed {
        metrics: ProjectMetrics,
        delta: MetricsDelta,
    },
    Failed {
        error: String,
    },
}

/// One perturbed scenario: which field was moved, the absolute value
/// applied, and what came out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub field: SensitivityField,
    pub applied_value: Decimal,
    pub outcome: ScenarioOutcome,
}

/// Base metrics plus one result per perturbation value, in declared order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub base: ProjectMetrics,
    pub scenarios: Vec<ScenarioResult>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Run one-variable-at-a-time sensitivities against a base case.
///
/// The base case is computed first; an invalid base is a hard error.
/// Each perturbation value then gets a cloned assumption snapshot with
/// only the targeted field overwritten, re-runs the model, and records
/// metric deltas. Result order follows declared perturbation order, then
/// value order within each perturbation. Evaluation is sequential; each
/// scenario is a pure function of its own snapshot.
pub fn run_sensitivity(
    project: &ProjectAssumptions,
    financing: &FinancingAssumptions,
    perturbations: &[Perturbation],
) -> ProformaResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let base_run = proforma::run_proforma(project, financing)?;
    let base = base_run.result.metrics;

    let mut scenarios: Vec<ScenarioResult> = Vec::new();
    for perturbation in perturbations {
        let base_value = perturbation.field.base_value(project, financing);

        for value in &perturbation.values {
            let applied_value = match perturbation.mode {
                PerturbationMode::Absolute => *value,
                PerturbationMode::PercentOffset => base_value * (Decimal::ONE + *value),
            };

            let mut scenario_project = project.clone();
            let mut scenario_financing = financing.clone();
            perturbation
                .field
                .apply(applied_value, &mut scenario_project, &mut scenario_financing);

            let outcome = match proforma::run_proforma(&scenario_project, &scenario_financing) {
                Ok(run) => {
                    let metrics = run.result.metrics;
                    let delta = delta_vs_base(&base, &metrics);
                    ScenarioOutcome::Computed { metrics, delta }
                }
                Err(e) => {
                    warnings.push(format!(
                        "Scenario {} = {} failed: {}",
                        perturbation.field.name(),
                        applied_value,
                        e
                    ));
                    ScenarioOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };

            scenarios.push(ScenarioResult {
                field: perturbation.field,
                applied_value,
                outcome,
            });
        }
    }

    let output = SensitivityOutput { base, scenarios };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-Variable Sensitivity Analysis",
        &serde_json::json!({
            "project": project.name,
            "perturbations": perturbations.len(),
            "scenarios": output.scenarios.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn delta_vs_base(base: &ProjectMetrics, scenario: &ProjectMetrics) -> MetricsDelta {
    MetricsDelta {
        npv: scenario.npv - base.npv,
        levered_irr: match (scenario.levered_irr, base.levered_irr) {
            (Some(s), Some(b)) => Some(s - b),
            _ => None,
        },
        min_dscr: match (scenario.min_dscr, base.min_dscr) {
            (Some(s), Some(b)) => Some(s - b),
            _ => None,
        },
        payback_years: match (scenario.payback_year, base.payback_year) {
            (Some(s), Some(b)) => Some(i64::from(s) - i64::from(b)),
            _ => None,
        },
    }
}
