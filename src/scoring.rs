//! Size/Age/Location attractiveness scorer.
//!
//! Four independent factors worth up to 25 points each:
//!
//! - **Age**: 8.33 points per year trading, full credit from 3 years.
//! - **Size**: 25 points if any band (employees, revenue, EBITDA - checked in
//!   that order) is satisfied, otherwise partial credit for the first
//!   dimension that earns any.
//! - **Tech alignment**: 8.33 points per distinct aligned vendor, full credit at 3.
//! - **Location**: step function over distance from the reference point.

use chrono::{NaiveDate, Utc};

use crate::distance::DistanceResolver;
use crate::models::{
    round2, CompanyRecord, CompanyScore, FactorName, FinancialSnapshot, ScoreFactor,
};
use crate::thesis::{dimension_value, matched_tech_vendors, satisfied_size_band, SIZE_BANDS};

pub const FACTOR_MAX_POINTS: f64 = 25.0;
const POINTS_PER_YEAR: f64 = 8.33;
const FULL_CREDIT_YEARS: f64 = 3.0;
const POINTS_PER_VENDOR: f64 = 8.33;
const FULL_CREDIT_VENDORS: usize = 3;
const PARTIAL_SIZE_MAX_POINTS: f64 = 15.0;

/// `(max distance km, points)`, checked in order; beyond the last step scores 0.
const LOCATION_STEPS: [(f64, f64); 5] = [
    (25.0, 25.0),
    (50.0, 20.0),
    (100.0, 15.0),
    (150.0, 10.0),
    (200.0, 5.0),
];

/// Age points for the given years trading.
pub fn age_points(years_active: f64) -> f64 {
    if years_active >= FULL_CREDIT_YEARS {
        FACTOR_MAX_POINTS
    } else {
        (years_active.max(0.0) * POINTS_PER_YEAR).min(FACTOR_MAX_POINTS)
    }
}

/// Tech alignment points for a count of distinct aligned vendors.
pub fn tech_points(distinct_matches: usize) -> f64 {
    if distinct_matches >= FULL_CREDIT_VENDORS {
        FACTOR_MAX_POINTS
    } else {
        (distinct_matches as f64 * POINTS_PER_VENDOR).min(FACTOR_MAX_POINTS)
    }
}

/// Location points for a resolved distance; unresolved scores 0.
pub fn location_points(distance_km: Option<f64>) -> f64 {
    let km = match distance_km {
        Some(km) if km.is_finite() => km,
        _ => return 0.0,
    };
    LOCATION_STEPS
        .iter()
        .find(|(max_km, _)| km <= *max_km)
        .map_or(0.0, |(_, points)| *points)
}

/// Partial size credit for a value outside `[min, max]`.
pub fn partial_size_points(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        (value / min * PARTIAL_SIZE_MAX_POINTS).max(0.0)
    } else if value > max {
        (PARTIAL_SIZE_MAX_POINTS - (value - max) / max * PARTIAL_SIZE_MAX_POINTS).max(0.0)
    } else {
        FACTOR_MAX_POINTS
    }
}

/// Size factor: full band match first, then partial credit in priority order.
///
/// Only the first dimension with nonzero partial credit is reported, even if
/// a later dimension would earn more.
pub fn size_factor(financials: &FinancialSnapshot) -> ScoreFactor {
    if let Some((band, value)) = satisfied_size_band(financials) {
        return ScoreFactor {
            name: FactorName::Size,
            value: format!(
                "{} {} within {}-{}",
                band.dimension.as_str(),
                value,
                band.min,
                band.max
            ),
            points: FACTOR_MAX_POINTS,
            dimension: Some(band.dimension),
        };
    }

    for band in SIZE_BANDS.iter() {
        let Some(value) = dimension_value(financials, band.dimension) else {
            continue;
        };
        let points = partial_size_points(value, band.min, band.max);
        if points > 0.0 {
            return ScoreFactor {
                name: FactorName::Size,
                value: format!(
                    "{} {} outside {}-{} (partial)",
                    band.dimension.as_str(),
                    value,
                    band.min,
                    band.max
                ),
                points: round2(points),
                dimension: Some(band.dimension),
            };
        }
    }

    ScoreFactor {
        name: FactorName::Size,
        value: "no qualifying size data".to_string(),
        points: 0.0,
        dimension: None,
    }
}

fn age_factor(company: &CompanyRecord, as_of: NaiveDate) -> ScoreFactor {
    let years = company.years_active(as_of);
    ScoreFactor {
        name: FactorName::Age,
        value: format!("{:.2} years", years),
        points: round2(age_points(years)),
        dimension: None,
    }
}

fn tech_factor(company: &CompanyRecord) -> ScoreFactor {
    let matched = matched_tech_vendors(&company.enrichment.technology_vendors);
    let value = if matched.is_empty() {
        "no aligned vendors".to_string()
    } else {
        matched.join(", ")
    };
    ScoreFactor {
        name: FactorName::TechAlignment,
        value,
        points: round2(tech_points(matched.len())),
        dimension: None,
    }
}

fn location_factor(distance_km: Option<f64>) -> ScoreFactor {
    let value = match distance_km {
        Some(km) if km.is_finite() => format!("{:.1} km", km),
        _ => "distance unknown".to_string(),
    };
    ScoreFactor {
        name: FactorName::Location,
        value,
        points: location_points(distance_km),
        dimension: None,
    }
}

/// Scores a company given an already-resolved distance. Pure.
pub fn score_with_distance(
    company: &CompanyRecord,
    distance_km: Option<f64>,
    as_of: NaiveDate,
) -> CompanyScore {
    let factors = vec![
        age_factor(company, as_of),
        size_factor(&company.financials),
        tech_factor(company),
        location_factor(distance_km),
    ];

    let total: f64 = factors.iter().map(|f| f.points).sum();
    let score = round2(total.clamp(0.0, 100.0));

    tracing::debug!(
        "Scored {} ({}): {} [{}]",
        company.registry_number,
        company.name,
        score,
        factors
            .iter()
            .map(|f| format!("{:?}={}", f.name, f.points))
            .collect::<Vec<_>>()
            .join(", ")
    );

    CompanyScore { score, factors }
}

/// Resolves the company's distance: the stored value first, then the resolver.
pub async fn resolve_company_distance(
    company: &CompanyRecord,
    resolver: &dyn DistanceResolver,
) -> Option<f64> {
    if let Some(km) = company.distance_km.filter(|km| km.is_finite()) {
        return Some(km);
    }
    resolver
        .resolve_distance(
            company.address.text.as_deref(),
            company.address.structured.as_ref(),
        )
        .await
}

/// Scores a company as of the given date, resolving distance through `resolver`.
///
/// # Arguments
///
/// * `company` - The validated company record.
/// * `resolver` - Distance capability; only called when the record has no stored distance.
/// * `as_of` - Date the age factor is measured at.
///
/// # Returns
///
/// * `CompanyScore` - Total 0 - 100 and the four factors.
pub async fn score_as_of(
    company: &CompanyRecord,
    resolver: &dyn DistanceResolver,
    as_of: NaiveDate,
) -> CompanyScore {
    let distance = resolve_company_distance(company, resolver).await;
    score_with_distance(company, distance, as_of)
}

/// Scores a company as of today.
pub async fn score(company: &CompanyRecord, resolver: &dyn DistanceResolver) -> CompanyScore {
    score_as_of(company, resolver, Utc::now().date_naive()).await
}
