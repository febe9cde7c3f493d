//! Multi-year financial trend calculator.
//!
//! Works on any number of annual records in any order; records are sorted by
//! `period_end` descending before anything is derived. Callers guarantee
//! `period_end` is unique.

use crate::models::{
    percentage_of, round2, AnnualFinancialRecord, FinancialRatios, FinancialTrends,
    LatestYearSummary, TrendDirection, TrendSummary,
};

/// Growth (percent) above which a metric is growing, below whose negative it is declining.
pub const GROWTH_THRESHOLD_PCT: f64 = 5.0;
/// EBITDA-margin change (percentage points) treated as a real move.
pub const MARGIN_THRESHOLD_PP: f64 = 1.0;
/// Number of most recent periods averaged.
pub const AVERAGE_WINDOW: usize = 3;
/// Index of the comparison record for CAGR, in descending order.
const CAGR_LOOKBACK: usize = 3;
/// CAGR is always annualised over three years, even when the comparison
/// record is only two periods back (three records available). Kept for
/// compatibility with previously persisted trend figures.
pub const CAGR_EXPONENT_YEARS: f64 = 3.0;

/// Returns the records sorted by `period_end`, newest first.
pub fn sort_descending(records: &[AnnualFinancialRecord]) -> Vec<&AnnualFinancialRecord> {
    let mut sorted: Vec<&AnnualFinancialRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.period_end.cmp(&a.period_end));
    sorted
}

/// `(latest - previous) / previous * 100`, when both are present and previous is nonzero.
///
/// Unrounded, so direction labels see the exact value; round only for output.
pub fn growth_pct(latest: Option<f64>, previous: Option<f64>) -> Option<f64> {
    match (latest, previous) {
        (Some(l), Some(p)) if p != 0.0 => {
            let growth = (l - p) / p * 100.0;
            growth.is_finite().then_some(growth)
        }
        _ => None,
    }
}

/// `(latest / earlier)^(1/3) - 1` as a percentage, when the earlier value is positive.
pub fn cagr_pct(latest: Option<f64>, earlier: Option<f64>) -> Option<f64> {
    match (latest, earlier) {
        (Some(l), Some(e)) if e > 0.0 && l >= 0.0 => {
            let cagr = ((l / e).powf(1.0 / CAGR_EXPONENT_YEARS) - 1.0) * 100.0;
            cagr.is_finite().then(|| round2(cagr))
        }
        _ => None,
    }
}

/// Labels a growth percentage; `rising` is the label used above the threshold.
pub fn direction(growth: Option<f64>, rising: TrendDirection) -> Option<TrendDirection> {
    growth.map(|g| {
        if g > GROWTH_THRESHOLD_PCT {
            rising
        } else if g < -GROWTH_THRESHOLD_PCT {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        }
    })
}

/// Labels an EBITDA-margin change in percentage points.
pub fn margin_direction(latest: Option<f64>, previous: Option<f64>) -> Option<TrendDirection> {
    match (latest, previous) {
        (Some(l), Some(p)) => {
            let delta = l - p;
            Some(if delta > MARGIN_THRESHOLD_PP {
                TrendDirection::Improving
            } else if delta < -MARGIN_THRESHOLD_PP {
                TrendDirection::Declining
            } else {
                TrendDirection::Stable
            })
        }
        _ => None,
    }
}

/// Mean of the present values; missing values count in neither numerator nor denominator.
pub fn average_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    if present.is_empty() {
        None
    } else {
        Some(round2(present.iter().sum::<f64>() / present.len() as f64))
    }
}

/// Derives ratios from a record's raw fields.
///
/// Each ratio is only produced when its inputs are present and the
/// denominator is nonzero.
pub fn derive_ratios(record: &AnnualFinancialRecord) -> FinancialRatios {
    let pnl = &record.profit_and_loss;
    let gross_profit = pnl
        .gross_profit
        .or_else(|| match (pnl.revenue, pnl.cost_of_sales) {
            (Some(r), Some(c)) => Some(r - c),
            _ => None,
        });
    let ebitda = pnl.ebitda.or_else(|| {
        pnl.operating_profit
            .map(|op| op + pnl.depreciation.unwrap_or(0.0) + pnl.amortisation.unwrap_or(0.0))
    });
    let revenue_per_employee = match (pnl.revenue, record.employee_count()) {
        (Some(r), Some(n)) if n > 0 => Some(round2(r / f64::from(n))),
        _ => None,
    };

    FinancialRatios {
        ebitda_margin: percentage_of(ebitda, pnl.revenue).map(round2),
        gross_margin: percentage_of(gross_profit, pnl.revenue).map(round2),
        net_margin: percentage_of(pnl.net_profit, pnl.revenue).map(round2),
        current_ratio: match (
            record.balance_sheet.current_assets,
            record.balance_sheet.current_liabilities,
        ) {
            (Some(a), Some(l)) if l != 0.0 => Some(round2(a / l)),
            _ => None,
        },
        revenue_per_employee,
        recurring_revenue_percentage: record.recurring_revenue_percentage().map(round2),
    }
}

fn latest_summary(record: &AnnualFinancialRecord) -> LatestYearSummary {
    LatestYearSummary {
        period_start: record.period_start,
        period_end: record.period_end,
        revenue: record.revenue(),
        profit: record.profit(),
        ebitda: record.ebitda(),
        ebitda_margin: record.ebitda_margin().map(round2),
        employee_count: record.employee_count(),
        recurring_revenue_percentage: record.recurring_revenue_percentage().map(round2),
        net_assets: record.balance_sheet.net_assets,
        cash: record.balance_sheet.cash,
    }
}

/// Computes growth, CAGR and rolling averages from annual records.
///
/// # Arguments
///
/// * `records` - Annual records in any order, unique by `period_end`.
///
/// # Returns
///
/// * `TrendSummary` - Derived trends (absent fields could not be computed)
///   and a projection of the most recent record.
pub fn compute_trends(records: &[AnnualFinancialRecord]) -> TrendSummary {
    let sorted = sort_descending(records);
    let Some(latest) = sorted.first().copied() else {
        return TrendSummary::default();
    };

    let mut trends = FinancialTrends::default();

    if let Some(previous) = sorted.get(1).copied() {
        let revenue_growth = growth_pct(latest.revenue(), previous.revenue());
        let profit_growth = growth_pct(latest.profit(), previous.profit());
        let ebitda_growth = growth_pct(latest.ebitda(), previous.ebitda());
        let employee_growth = growth_pct(
            latest.employee_count().map(f64::from),
            previous.employee_count().map(f64::from),
        );

        trends.revenue_trend = direction(revenue_growth, TrendDirection::Growing);
        trends.profit_trend = direction(profit_growth, TrendDirection::Improving);
        trends.ebitda_trend = direction(ebitda_growth, TrendDirection::Improving);
        trends.employee_trend = direction(employee_growth, TrendDirection::Growing);

        trends.revenue_growth_1y = revenue_growth.map(round2);
        trends.profit_growth_1y = profit_growth.map(round2);
        trends.ebitda_growth_1y = ebitda_growth.map(round2);
        trends.employee_growth_1y = employee_growth.map(round2);
        trends.ebitda_margin_trend =
            margin_direction(latest.ebitda_margin(), previous.ebitda_margin());
    }

    if sorted.len() >= 3 {
        let earlier = sorted[CAGR_LOOKBACK.min(sorted.len() - 1)];
        trends.revenue_cagr_3y = cagr_pct(latest.revenue(), earlier.revenue());
        trends.profit_cagr_3y = cagr_pct(latest.profit(), earlier.profit());
    }

    let window = &sorted[..sorted.len().min(AVERAGE_WINDOW)];
    trends.average_revenue_3y = average_present(window.iter().map(|r| r.revenue()));
    trends.average_profit_3y = average_present(window.iter().map(|r| r.profit()));
    trends.average_ebitda_3y = average_present(window.iter().map(|r| r.ebitda()));
    trends.average_ebitda_margin_3y = average_present(window.iter().map(|r| r.ebitda_margin()));
    trends.average_recurring_revenue_percentage_3y =
        average_present(window.iter().map(|r| r.recurring_revenue_percentage()));

    tracing::debug!(
        "Computed trends over {} record(s); latest period ends {}",
        sorted.len(),
        latest.period_end
    );

    TrendSummary {
        trends,
        latest_year_summary: Some(latest_summary(latest)),
    }
}
