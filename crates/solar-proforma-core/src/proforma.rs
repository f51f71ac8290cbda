use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::{self, AmortizationStyle, FinancingAssumptions, ProjectAssumptions};
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ProformaResult;

/// Hours in a year, for converting capacity and capacity factor to energy.
const HOURS_PER_YEAR: Decimal = dec!(8760);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One project-year of the levered cash flow schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleYear {
    /// Operating year, 1-based
    pub year: u32,
    /// Calendar year (COD year + year - 1)
    pub calendar_year: i32,
    /// Net generation in MWh after degradation
    pub energy_mwh: Decimal,
    /// Gross energy revenue
    pub revenue: Money,
    /// Operating cost
    pub opex: Money,
    /// EBITDA = revenue - opex
    pub ebitda: Money,
    /// Interest portion of debt service
    pub interest: Money,
    /// Principal portion of debt service
    pub principal: Money,
    /// Total debt service (interest + principal)
    pub debt_service: Money,
    /// Loan balance at end of year
    pub debt_balance: Money,
    /// EBITDA / debt service; None in years with no debt service
    pub dscr: Option<Decimal>,
    /// Levered free cash flow = EBITDA - debt service
    pub levered_cash_flow: Money,
    /// Running total including the year-0 equity outflow
    pub cumulative_cash_flow: Money,
}

/// Summary metrics for one model run. Undefined metrics are `None`,
/// never a numeric placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetrics {
    /// Sponsor equity = capex x (1 - debt fraction)
    pub equity_investment: Money,
    /// Levered IRR on the equity cash flow series; None when the series
    /// never changes sign
    pub levered_irr: Option<Rate>,
    /// NPV of the equity series at the financing discount rate
    pub npv: Money,
    /// Minimum DSCR across years with debt service; None if unlevered
    pub min_dscr: Option<Decimal>,
    /// First year cumulative cash flow reaches zero; None if never
    /// reached within the project life
    pub payback_year: Option<u32>,
    /// Principal still outstanding at tenor end under sculpted
    /// amortization; None when the loan fully retires
    pub terminal_balloon: Option<Money>,
}

/// Cash flow schedule plus derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProformaOutput {
    /// Per-year rows, ordered year 1..N
    pub schedule: Vec<ScheduleYear>,
    /// Run-level summary metrics
    pub metrics: ProjectMetrics,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Run the levered cash flow model for a single project.
///
/// Pure function of its inputs: validates every domain bound up front,
/// builds the year-by-year schedule, amortizes the term loan (level
/// payment or sculpted to a target DSCR), and derives IRR, NPV, minimum
/// DSCR, and simple payback. Identical inputs produce identical output.
pub fn run_proforma(
    project: &ProjectAssumptions,
    financing: &FinancingAssumptions,
) -> ProformaResult<ComputationOutput<ProformaOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // ── Validation ───────────────────────────────────────────────────
    assumptions::validate(project, financing)?;

    let life = project.project_life_years as usize;

    // ── Revenue and opex schedule ────────────────────────────────────
    let energy_year1 = project.capacity_mw * project.capacity_factor * HOURS_PER_YEAR;
    let retention = Decimal::ONE - project.degradation;

    let mut energy: Vec<Decimal> = Vec::with_capacity(life);
    let mut ebitda: Vec<Money> = Vec::with_capacity(life);
    let mut output_mwh = energy_year1;
    for year in 1..=life {
        if year > 1 {
            output_mwh *= retention;
        }
        energy.push(output_mwh);
        ebitda.push(output_mwh * project.ppa_price - project.opex_annual);
    }

    // ── Debt schedule ────────────────────────────────────────────────
    let initial_principal = project.capex * financing.debt_fraction;
    let equity = project.capex - initial_principal;

    let debt = build_debt_schedule(initial_principal, financing, &ebitda, life)?;

    // ── Assemble schedule rows ───────────────────────────────────────
    let mut schedule: Vec<ScheduleYear> = Vec::with_capacity(life);
    let mut equity_flows: Vec<Money> = Vec::with_capacity(life + 1);
    equity_flows.push(-equity);
    let mut cumulative = -equity;

    for i in 0..life {
        let debt_service = debt.interest[i] + debt.principal[i];
        let dscr = if debt_service > Decimal::ZERO {
            Some(ebitda[i] / debt_service)
        } else {
            None
        };
        let cash_flow = ebitda[i] - debt_service;
        cumulative += cash_flow;
        equity_flows.push(cash_flow);

        let revenue = energy[i] * project.ppa_price;
        schedule.push(ScheduleYear {
            year: (i + 1) as u32,
            calendar_year: project.cod_year + i as i32,
            energy_mwh: energy[i],
            revenue,
            opex: project.opex_annual,
            ebitda: ebitda[i],
            interest: debt.interest[i],
            principal: debt.principal[i],
            debt_service,
            debt_balance: debt.balance[i],
            dscr,
            levered_cash_flow: cash_flow,
            cumulative_cash_flow: cumulative,
        });
    }

    // ── Metrics ──────────────────────────────────────────────────────
    let levered_irr = time_value::irr(&equity_flows)?;
    let npv = time_value::npv(financing.discount_rate, &equity_flows)?;

    let min_dscr = schedule.iter().filter_map(|row| row.dscr).min();
    let payback_year = schedule
        .iter()
        .find(|row| row.cumulative_cash_flow >= Decimal::ZERO)
        .map(|row| row.year);

    // ── Warnings ─────────────────────────────────────────────────────
    if levered_irr.is_none() {
        warnings.push("Levered IRR is undefined: equity cash flows never change sign".into());
    }
    if let Some(min) = min_dscr {
        if min < Decimal::ONE {
            warnings.push(format!("Minimum DSCR of {min} is below 1.0x — sub-covenant"));
        }
    }
    if let Some(balloon) = debt.terminal_balloon {
        warnings.push(format!(
            "Sculpted debt service cannot retire the loan by tenor end; terminal balloon of {balloon} outstanding"
        ));
    }

    let output = ProformaOutput {
        schedule,
        metrics: ProjectMetrics {
            equity_investment: equity,
            levered_irr,
            npv,
            min_dscr,
            payback_year,
            terminal_balloon: debt.terminal_balloon,
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Levered Solar Proforma (annual)",
        &serde_json::json!({
            "project": project.name,
            "capacity_mw": project.capacity_mw.to_string(),
            "capex": project.capex.to_string(),
            "ppa_price": project.ppa_price.to_string(),
            "debt_fraction": financing.debt_fraction.to_string(),
            "amortization": format!("{:?}", financing.amortization),
            "discount_rate": financing.discount_rate.to_string(),
            "project_life_years": project.project_life_years,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Debt schedule
// ---------------------------------------------------------------------------

struct DebtSchedule {
    interest: Vec<Money>,
    principal: Vec<Money>,
    balance: Vec<Money>,
    terminal_balloon: Option<Money>,
}

/// Build the per-year loan schedule over the full project life. Years
/// beyond the tenor carry zero service; under sculpted amortization any
/// balance the target-DSCR service could not retire by tenor end is
/// reported as a terminal balloon, never silently re-termed.
fn build_debt_schedule(
    initial: Money,
    financing: &FinancingAssumptions,
    ebitda: &[Money],
    life: usize,
) -> ProformaResult<DebtSchedule> {
    let mut sched = DebtSchedule {
        interest: vec![Decimal::ZERO; life],
        principal: vec![Decimal::ZERO; life],
        balance: vec![Decimal::ZERO; life],
        terminal_balloon: None,
    };

    if initial <= Decimal::ZERO {
        return Ok(sched);
    }

    let tenor = financing.tenor_years as usize;
    let mut balance = initial;

    match &financing.amortization {
        AmortizationStyle::LevelPayment => {
            let payment =
                time_value::annuity_payment(initial, financing.interest_rate, financing.tenor_years)?;
            for i in 0..life {
                if i < tenor && balance > Decimal::ZERO {
                    let interest = balance * financing.interest_rate;
                    // Final tenor year retires the balance exactly,
                    // absorbing any rounding residue.
                    let principal = if i == tenor - 1 {
                        balance
                    } else {
                        (payment - interest).min(balance)
                    };
                    sched.interest[i] = interest;
                    sched.principal[i] = principal;
                    balance -= principal;
                }
                sched.balance[i] = balance;
            }
        }
        AmortizationStyle::Sculpted { target_dscr } => {
            for i in 0..life {
                if i < tenor && balance > Decimal::ZERO {
                    let interest = balance * financing.interest_rate;
                    // Service = EBITDA / target holds DSCR at the target;
                    // interest is always paid, principal only from excess,
                    // capped at full retirement.
                    let target_service = ebitda[i] / target_dscr;
                    let principal = (target_service - interest)
                        .max(Decimal::ZERO)
                        .min(balance);
                    sched.interest[i] = interest;
                    sched.principal[i] = principal;
                    balance -= principal;
                }
                sched.balance[i] = balance;
            }
            if balance > Decimal::ZERO {
                sched.terminal_balloon = Some(balance);
            }
        }
    }

    Ok(sched)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
