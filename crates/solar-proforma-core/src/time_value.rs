use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ProformaError;
use crate::types::{Money, Rate};
use crate::ProformaResult;

/// Absolute NPV convergence tolerance for the IRR root search.
pub const NPV_TOLERANCE: Decimal = dec!(0.000001);
/// Newton-Raphson iteration budget before falling back to bisection.
pub const MAX_NEWTON_ITERATIONS: u32 = 50;
/// Bisection iteration budget.
pub const MAX_BISECTION_ITERATIONS: u32 = 200;
/// Lowest rate the IRR search will consider (-99%).
pub const RATE_FLOOR: Decimal = dec!(-0.99);
/// Highest rate the IRR search will consider (1000%).
pub const RATE_CEILING: Decimal = dec!(10.0);

/// Rates probed when hunting for a bisection bracket after Newton fails.
const BRACKET_SCAN: [Decimal; 12] = [
    dec!(-0.9),
    dec!(-0.75),
    dec!(-0.5),
    dec!(-0.25),
    dec!(-0.1),
    Decimal::ZERO,
    dec!(0.1),
    dec!(0.25),
    dec!(0.5),
    dec!(1),
    dec!(2.5),
    RATE_CEILING,
];

/// Net Present Value of a series of cash flows. Period 0 is undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> ProformaResult<Money> {
    if rate <= dec!(-1) {
        return Err(ProformaError::InvalidAssumption {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        if discount.is_zero() {
            return Err(ProformaError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Internal Rate of Return of a cash flow series.
///
/// Returns `Ok(None)` when the series never changes sign, so no root can
/// exist; undefined is a valid outcome, not an error. Otherwise searches
/// with Newton-Raphson from an 8% guess (rate clamped to
/// [`RATE_FLOOR`, `RATE_CEILING`]) and falls back to deterministic
/// bisection over a fixed bracket scan. Converged when |NPV| falls below
/// [`NPV_TOLERANCE`].
pub fn irr(cash_flows: &[Money]) -> ProformaResult<Option<Rate>> {
    if cash_flows.len() < 2 {
        return Err(ProformaError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let has_negative = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    let has_positive = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    if !has_negative || !has_positive {
        return Ok(None);
    }

    let mut rate = dec!(0.08);
    for _ in 0..MAX_NEWTON_ITERATIONS {
        let Some((npv_val, dnpv)) = npv_and_derivative(rate, cash_flows) else {
            break;
        };

        if npv_val.abs() < NPV_TOLERANCE {
            return Ok(Some(rate));
        }
        if dnpv.is_zero() {
            break;
        }
        let Some(step) = npv_val.checked_div(dnpv) else {
            break;
        };
        rate -= step;

        if rate < RATE_FLOOR {
            rate = RATE_FLOOR;
        } else if rate > RATE_CEILING {
            rate = RATE_CEILING;
        }
    }

    bisect(cash_flows)
}

/// Annual payment amortizing `principal` over `tenor_years` at `rate`.
pub fn annuity_payment(principal: Money, rate: Rate, tenor_years: u32) -> ProformaResult<Money> {
    if tenor_years == 0 {
        return Err(ProformaError::InvalidAssumption {
            field: "tenor_years".into(),
            reason: "Annuity payment requires at least one period".into(),
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(tenor_years));
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut factor = Decimal::ONE;
    for _ in 0..tenor_years {
        factor *= one_plus_r;
    }

    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(ProformaError::DivisionByZero {
            context: "annuity factor".into(),
        });
    }

    Ok(principal * rate * factor / denominator)
}

/// NPV evaluation that treats degenerate or overflowing discount factors
/// as unevaluable instead of panicking.
fn try_npv(rate: Rate, cash_flows: &[Money]) -> Option<Decimal> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut result = Decimal::ZERO;
    let mut discount = Decimal::ONE;
    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        if discount.is_zero() {
            return None;
        }
        result = result.checked_add(cf.checked_div(discount)?)?;
    }
    Some(result)
}

fn npv_and_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        if discount.is_zero() {
            return None;
        }
        npv_val = npv_val.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let t_dec = Decimal::from(t as i64);
            let denominator = discount.checked_mul(one_plus_r)?;
            let term = t_dec.checked_mul(*cf)?.checked_div(denominator)?;
            dnpv = dnpv.checked_sub(term)?;
        }
    }

    Some((npv_val, dnpv))
}

/// Deterministic bisection fallback: scan for adjacent probe rates whose
/// NPVs bracket a root, then halve. No bracket means no reportable root.
fn bisect(cash_flows: &[Money]) -> ProformaResult<Option<Rate>> {
    let mut bracket: Option<(Rate, Decimal, Rate)> = None;
    let mut prev: Option<(Rate, Decimal)> = None;

    for r in BRACKET_SCAN {
        let Some(v) = try_npv(r, cash_flows) else {
            prev = None;
            continue;
        };
        if v.abs() < NPV_TOLERANCE {
            return Ok(Some(r));
        }
        if let Some((prev_rate, prev_val)) = prev {
            if (prev_val < Decimal::ZERO) != (v < Decimal::ZERO) {
                bracket = Some((prev_rate, prev_val, r));
                break;
            }
        }
        prev = Some((r, v));
    }

    let Some((mut lo, mut lo_val, mut hi)) = bracket else {
        return Ok(None);
    };

    for _ in 0..MAX_BISECTION_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        let Some(mid_val) = try_npv(mid, cash_flows) else {
            return Ok(None);
        };
        if mid_val.abs() < NPV_TOLERANCE || hi - lo < dec!(0.000000000001) {
            return Ok(Some(mid));
        }
        if (mid_val < Decimal::ZERO) == (lo_val < Decimal::ZERO) {
            lo = mid;
            lo_val = mid_val;
        } else {
            hi = mid;
        }
    }

    Err(ProformaError::ConvergenceFailure {
        function: "irr".into(),
        iterations: MAX_BISECTION_ITERATIONS,
        last_delta: try_npv((lo + hi) / dec!(2), cash_flows).unwrap_or(Decimal::ZERO),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_at_minus_one() {
        let cfs = vec![dec!(-100), dec!(50)];
        assert!(npv(dec!(-1), &cfs).is_err());
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs).unwrap().expect("IRR should be defined");
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_root_zeroes_npv() {
        let cfs = vec![dec!(-5000), dec!(1500), dec!(1500), dec!(1500), dec!(1500)];
        let rate = irr(&cfs).unwrap().expect("IRR should be defined");
        let residual = npv(rate, &cfs).unwrap();
        assert!(residual.abs() < dec!(0.01), "residual NPV {residual}");
    }

    #[test]
    fn test_irr_undefined_all_negative() {
        let cfs = vec![dec!(-1000), dec!(-50), dec!(-50)];
        assert_eq!(irr(&cfs).unwrap(), None);
    }

    #[test]
    fn test_irr_undefined_all_positive() {
        let cfs = vec![dec!(1000), dec!(50), dec!(50)];
        assert_eq!(irr(&cfs).unwrap(), None);
    }

    #[test]
    fn test_irr_insufficient_flows() {
        assert!(irr(&[dec!(-1000)]).is_err());
    }

    #[test]
    fn test_annuity_payment_known_value() {
        // 1000 at 10% over 3 years => 402.11
        let payment = annuity_payment(dec!(1000), dec!(0.10), 3).unwrap();
        assert!((payment - dec!(402.11)).abs() < dec!(0.01));
    }

    #[test]
    fn test_annuity_payment_zero_rate() {
        let payment = annuity_payment(dec!(1200), dec!(0), 4).unwrap();
        assert_eq!(payment, dec!(300));
    }
}
