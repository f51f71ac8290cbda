use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ProformaError;
use crate::types::{Money, Rate};
use crate::ProformaResult;

/// Technical and commercial assumptions for a single project.
///
/// A read-only snapshot supplied per call; the engine never retains it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAssumptions {
    /// Project name / identifier
    pub name: String,
    /// Nameplate capacity in MW
    pub capacity_mw: Decimal,
    /// Total installed cost
    pub capex: Money,
    /// Annual operating cost, flat over the project life
    pub opex_annual: Money,
    /// Contracted energy price in $/MWh
    pub ppa_price: Money,
    /// Annual output degradation (decimal, e.g. 0.005 = 0.5%/yr)
    pub degradation: Rate,
    /// Net capacity factor in year 1 (decimal)
    pub capacity_factor: Decimal,
    /// First calendar year of commercial operation
    pub cod_year: i32,
    /// Operating life in years
    pub project_life_years: u32,
}

/// Capital structure and debt terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingAssumptions {
    /// Debt share of capex (decimal, 0 to 1)
    pub debt_fraction: Decimal,
    /// Annual interest rate on the term loan
    pub interest_rate: Rate,
    /// Loan tenor in years
    pub tenor_years: u32,
    /// Principal repayment profile
    pub amortization: AmortizationStyle,
    /// Discount rate for NPV
    pub discount_rate: Rate,
}

/// How loan principal is repaid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum AmortizationStyle {
    /// Constant total debt service over the tenor (annuity)
    LevelPayment,
    /// Debt service sized each year to hold DSCR at the target
    Sculpted { target_dscr: Decimal },
}

/// Check every domain bound before any computation. Returns the first
/// violated bound as `InvalidAssumption` naming the offending field.
pub fn validate(
    project: &ProjectAssumptions,
    financing: &FinancingAssumptions,
) -> ProformaResult<()> {
    if project.capacity_mw <= Decimal::ZERO {
        return invalid("capacity_mw", "Capacity must be positive");
    }
    if project.capex <= Decimal::ZERO {
        return invalid("capex", "Capex must be positive");
    }
    if project.opex_annual < Decimal::ZERO {
        return invalid("opex_annual", "Opex cannot be negative");
    }
    if project.ppa_price <= Decimal::ZERO {
        return invalid("ppa_price", "PPA price must be positive");
    }
    if project.degradation < Decimal::ZERO || project.degradation >= Decimal::ONE {
        return invalid("degradation", "Degradation must be in [0, 1)");
    }
    if project.capacity_factor <= Decimal::ZERO || project.capacity_factor > Decimal::ONE {
        return invalid("capacity_factor", "Capacity factor must be in (0, 1]");
    }
    if project.project_life_years == 0 {
        return invalid("project_life_years", "Project life must be at least 1 year");
    }

    if financing.debt_fraction < Decimal::ZERO || financing.debt_fraction > Decimal::ONE {
        return invalid("debt_fraction", "Debt fraction must be in [0, 1]");
    }
    if financing.interest_rate < Decimal::ZERO {
        return invalid("interest_rate", "Interest rate cannot be negative");
    }
    if financing.tenor_years > project.project_life_years {
        return invalid("tenor_years", "Tenor cannot exceed project life");
    }
    if financing.debt_fraction > Decimal::ZERO && financing.tenor_years == 0 {
        return invalid("tenor_years", "A levered project needs a tenor of at least 1 year");
    }
    if let AmortizationStyle::Sculpted { target_dscr } = financing.amortization {
        if target_dscr < Decimal::ONE {
            return invalid("target_dscr", "Target DSCR must be >= 1.0");
        }
    }
    if financing.discount_rate <= Decimal::ZERO {
        return invalid("discount_rate", "Discount rate must be positive");
    }

    Ok(())
}

fn invalid(field: &str, reason: &str) -> ProformaResult<()> {
    Err(ProformaError::InvalidAssumption {
        field: field.into(),
        reason: reason.into(),
    })
}
