// src/services/calculations.rs
//! Defensive numeric helpers: bad inputs give `0` (or [`Payback::Unbounded`])
//! instead of NaN or a panic.

use crate::models::Payback;

pub const CO2_LBS_PER_KWH: f64 = 0.85;

/// Non-finite and negative values become `0.0`.
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Requested size when it is a usable positive number, otherwise `fallback`.
pub fn resolve_system_size(requested: Option<f64>, fallback: f64) -> f64 {
    match requested {
        Some(kw) if kw.is_finite() && kw > 0.0 => kw,
        _ => non_negative(fallback),
    }
}

pub fn calculate_gross_cost(system_size_kw: f64, cost_per_watt: f64) -> f64 {
    non_negative(system_size_kw) * 1000.0 * non_negative(cost_per_watt)
}

/// Rebate comes off first, then the credit applies to what is left.
pub fn calculate_net_cost(gross_cost: f64, itc_rate: f64, rebate: f64) -> f64 {
    let basis = (non_negative(gross_cost) - non_negative(rebate)).max(0.0);
    basis * (1.0 - non_negative(itc_rate).min(1.0))
}

/// Bill savings in whole dollars for `kwh` priced at `rate`.
pub fn annual_savings_usd(kwh: f64, rate: f64) -> f64 {
    (non_negative(kwh) * non_negative(rate)).round()
}

pub fn simple_payback_years(net_cost: f64, annual_savings: f64) -> Payback {
    if !(net_cost.is_finite() && annual_savings.is_finite()) || net_cost <= 0.0 || annual_savings <= 0.0 {
        return Payback::Unbounded;
    }
    Payback::Years(round_to(net_cost / annual_savings, 1))
}

/// Pounds of CO2 avoided, whole pounds.
pub fn calculate_co2_offset(kwh: f64, lbs_per_kwh: f64) -> f64 {
    (non_negative(kwh) * non_negative(lbs_per_kwh)).round()
}

/// Removes `shading_pct` percent of production. Out-of-range shading is ignored.
pub fn apply_shading(kwh: f64, shading_pct: Option<f64>) -> f64 {
    let kwh = non_negative(kwh);
    match shading_pct {
        Some(pct) if pct.is_finite() && (0.0..=100.0).contains(&pct) => kwh * (1.0 - pct / 100.0),
        _ => kwh,
    }
}

/// Remaining output share in `year` (1-based); losses compound year over year.
pub fn degradation_factor(degradation_rate: f64, year: u32) -> f64 {
    let rate = non_negative(degradation_rate).min(1.0);
    (1.0 - rate).powi(year.saturating_sub(1) as i32)
}

pub fn escalation_factor(escalation_rate: f64, year: u32) -> f64 {
    (1.0 + non_negative(escalation_rate)).powi(year.saturating_sub(1) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use quickcheck_macros::quickcheck;

    #[test]
    fn savings_reference_value() {
        assert_eq!(annual_savings_usd(10450.0, 0.287), 2999.0);
    }

    #[test]
    fn savings_zero_for_bad_inputs() {
        assert_eq!(annual_savings_usd(0.0, 0.2), 0.0);
        assert_eq!(annual_savings_usd(-10.0, 0.2), 0.0);
        assert_eq!(annual_savings_usd(1000.0, -0.2), 0.0);
        assert_eq!(annual_savings_usd(f64::NAN, 0.2), 0.0);
        assert_eq!(annual_savings_usd(1000.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn payback_reference_value() {
        assert_eq!(simple_payback_years(15750.0, 2999.0), Payback::Years(5.3));
    }

    #[test]
    fn payback_unbounded_without_cost_or_savings() {
        assert_eq!(simple_payback_years(0.0, 2999.0), Payback::Unbounded);
        assert_eq!(simple_payback_years(15750.0, 0.0), Payback::Unbounded);
        assert_eq!(simple_payback_years(15750.0, -5.0), Payback::Unbounded);
        assert_eq!(simple_payback_years(f64::NAN, 100.0), Payback::Unbounded);
    }

    #[test]
    fn net_cost_applies_rebate_before_credit() {
        assert_relative_eq!(calculate_net_cost(22500.0, 0.30, 0.0), 15750.0, epsilon = 1e-9);
        assert_relative_eq!(calculate_net_cost(22500.0, 0.30, 1000.0), 15050.0, epsilon = 1e-9);
        assert_eq!(calculate_net_cost(500.0, 0.30, 1000.0), 0.0);
    }

    #[test]
    fn gross_cost_from_size_and_price() {
        assert_relative_eq!(calculate_gross_cost(7.5, 3.0), 22500.0);
        assert_eq!(calculate_gross_cost(f64::NAN, 3.0), 0.0);
    }

    #[test]
    fn co2_reference_value() {
        assert_eq!(calculate_co2_offset(10000.0, CO2_LBS_PER_KWH), 8500.0);
        assert_eq!(calculate_co2_offset(-1.0, CO2_LBS_PER_KWH), 0.0);
    }

    #[test]
    fn default_assumptions_use_grid_emission_factor() {
        let assumptions = crate::models::CostAssumptions::default();
        assert_eq!(assumptions.co2_lbs_per_kwh, CO2_LBS_PER_KWH);
    }

    #[test]
    fn shading_derates_only_valid_percentages() {
        assert_relative_eq!(apply_shading(1000.0, Some(10.0)), 900.0);
        assert_eq!(apply_shading(1000.0, Some(150.0)), 1000.0);
        assert_eq!(apply_shading(1000.0, None), 1000.0);
        assert_eq!(apply_shading(-1000.0, Some(10.0)), 0.0);
    }

    #[test]
    fn system_size_prefers_valid_request() {
        assert_eq!(resolve_system_size(Some(6.0), 7.5), 6.0);
        assert_eq!(resolve_system_size(Some(-6.0), 7.5), 7.5);
        assert_eq!(resolve_system_size(None, f64::NAN), 0.0);
    }

    #[test]
    fn degradation_compounds() {
        assert_eq!(degradation_factor(0.005, 1), 1.0);
        assert_relative_eq!(degradation_factor(0.005, 3), 0.995 * 0.995);
        assert_relative_eq!(escalation_factor(0.03, 3), 1.03 * 1.03);
    }

    #[quickcheck]
    fn savings_monotonic_in_kwh(a: u32, b: u32, rate_milli: u16) -> bool {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let rate = f64::from(rate_milli % 1000) / 1000.0;
        annual_savings_usd(f64::from(lo), rate) <= annual_savings_usd(f64::from(hi), rate)
    }

    #[quickcheck]
    fn savings_monotonic_in_rate(kwh: u32, a: u16, b: u16) -> bool {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let kwh = f64::from(kwh);
        annual_savings_usd(kwh, f64::from(lo) / 1000.0) <= annual_savings_usd(kwh, f64::from(hi) / 1000.0)
    }

    #[quickcheck]
    fn payback_monotonic_in_cost(a: u32, b: u32, savings: u16) -> bool {
        let savings = f64::from(savings) + 1.0;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        match (
            simple_payback_years(f64::from(lo), savings),
            simple_payback_years(f64::from(hi), savings),
        ) {
            (Payback::Years(x), Payback::Years(y)) => x <= y,
            // Zero cost is unbounded; any positive cost after it is finite.
            (Payback::Unbounded, _) => lo == 0,
            (Payback::Years(_), Payback::Unbounded) => false,
        }
    }
}
