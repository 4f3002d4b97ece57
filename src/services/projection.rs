// src/services/projection.rs
//! 25-year savings projection. Pure given its inputs.
//!
//! Running totals (cumulative savings, net cashflow, NPV, payback) are kept
//! unrounded; only the rows handed back for display are rounded.

use crate::models::{
    CashflowYear, CostAssumptions, EstimateRequest, Payback, ProductionProfile, RateResult,
    PROJECTION_YEARS,
};
use crate::services::calculations::{
    apply_shading, calculate_co2_offset, calculate_gross_cost, calculate_net_cost,
    degradation_factor, escalation_factor, non_negative, resolve_system_size, simple_payback_years,
};

#[derive(Debug, Clone, PartialEq)]
pub struct FinancialProjection {
    pub system_size_kw: f64,
    pub shading_pct: f64,
    pub annual_production_kwh: f64,
    pub monthly_production_kwh: Vec<f64>,
    pub gross_cost_usd: f64,
    pub net_cost_usd: f64,
    pub year1_savings_usd: f64,
    pub payback_year: u32,
    pub simple_payback: Payback,
    pub npv_25yr_usd: f64,
    pub co2_offset_lbs_per_year: f64,
    pub co2_offset_lbs_25yr: f64,
    pub cashflow: Vec<CashflowYear>,
}

/// Unrounded per-year figures; [`CashflowYear`] rows are rounded copies.
#[derive(Debug, Clone, Copy)]
struct YearFigures {
    year: u32,
    production_kwh: f64,
    savings_usd: f64,
    cumulative_savings_usd: f64,
    net_cashflow_usd: f64,
}

fn project_years(
    annual_kwh: f64,
    rate: f64,
    annual_om: f64,
    net_cost: f64,
    assumptions: &CostAssumptions,
) -> Vec<YearFigures> {
    let mut cumulative = 0.0;
    (1..=PROJECTION_YEARS)
        .map(|year| {
            let production = annual_kwh * degradation_factor(assumptions.degradation_rate, year);
            let price = rate * escalation_factor(assumptions.rate_escalation, year);
            let savings = production * price - annual_om;
            cumulative += savings;
            YearFigures {
                year,
                production_kwh: production,
                savings_usd: savings,
                cumulative_savings_usd: cumulative,
                net_cashflow_usd: cumulative - net_cost,
            }
        })
        .collect()
}

/// First year with non-negative net cashflow, or the horizon length if none.
fn payback_year(years: &[YearFigures]) -> u32 {
    years
        .iter()
        .find(|y| y.net_cashflow_usd >= 0.0)
        .map(|y| y.year)
        .unwrap_or(PROJECTION_YEARS)
}

/// Present value of each year's savings, discounted `year` periods.
pub fn npv(savings_by_year: &[(u32, f64)], discount_rate: f64) -> f64 {
    let base = 1.0 + non_negative(discount_rate);
    savings_by_year
        .iter()
        .map(|(year, savings)| savings / base.powi(*year as i32))
        .sum()
}

pub fn project_financials(
    request: &EstimateRequest,
    profile: &ProductionProfile,
    rate: &RateResult,
    assumptions: &CostAssumptions,
) -> FinancialProjection {
    let system_size_kw = resolve_system_size(request.system_size_kw, profile.system_capacity_kw);
    let shading = request.shading_pct;
    let annual_kwh = apply_shading(profile.annual_kwh, shading);
    let monthly_kwh: Vec<f64> = profile
        .monthly_kwh
        .iter()
        .map(|kwh| apply_shading(*kwh, shading).round())
        .collect();

    let rate = non_negative(rate.rate_usd_per_kwh);
    let gross_cost = calculate_gross_cost(system_size_kw, assumptions.cost_per_watt);
    let net_cost = calculate_net_cost(gross_cost, assumptions.itc_rate, assumptions.rebate_usd);
    let annual_om = system_size_kw * non_negative(assumptions.om_per_kw_year);
    let year1_savings = annual_kwh * rate - annual_om;

    let years = project_years(annual_kwh, rate, annual_om, net_cost, assumptions);

    let payback = payback_year(&years);
    let savings: Vec<(u32, f64)> = years.iter().map(|y| (y.year, y.savings_usd)).collect();
    let npv_25yr = npv(&savings, assumptions.discount_rate);
    let lifetime_kwh: f64 = years.iter().map(|y| y.production_kwh).sum();

    let cashflow = years
        .iter()
        .map(|y| CashflowYear {
            year: y.year,
            production_kwh: y.production_kwh.round(),
            savings_usd: y.savings_usd.round(),
            cumulative_savings_usd: y.cumulative_savings_usd.round(),
            net_cashflow_usd: y.net_cashflow_usd.round(),
        })
        .collect();

    FinancialProjection {
        system_size_kw,
        shading_pct: shading
            .filter(|pct| pct.is_finite() && (0.0..=100.0).contains(pct))
            .unwrap_or(0.0),
        annual_production_kwh: annual_kwh.round(),
        monthly_production_kwh: monthly_kwh,
        gross_cost_usd: gross_cost.round(),
        net_cost_usd: net_cost.round(),
        year1_savings_usd: year1_savings.round(),
        payback_year: payback,
        simple_payback: simple_payback_years(net_cost, year1_savings),
        npv_25yr_usd: npv_25yr.round(),
        co2_offset_lbs_per_year: calculate_co2_offset(annual_kwh, assumptions.co2_lbs_per_kwh),
        co2_offset_lbs_25yr: calculate_co2_offset(lifetime_kwh, assumptions.co2_lbs_per_kwh),
        cashflow,
    }
}
