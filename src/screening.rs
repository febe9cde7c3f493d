//! Explicit screening workflow over the four scoring components.
//!
//! This module runs the scorer, classifier, thesis matcher and trend
//! calculator for one company and shapes the results the way the storage
//! layer persists them:
//! 1. Attractiveness score (resolving distance cache-first)
//! 2. MSP classification (only when enrichment text exists)
//! 3. Thesis match (recomputed on demand, never persisted)
//! 4. Financial trends (only when annual records exist)
//!
//! Timestamps are always supplied by the caller.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::classifier::classify;
use crate::distance::DistanceResolver;
use crate::models::{
    AnnualFinancialRecord, CompanyRecord, CompanyScore, MspClassification, ThesisMatch,
    TrendSummary,
};
use crate::scoring::score_as_of;
use crate::thesis::match_criteria_as_of;
use crate::trends::compute_trends;
use crate::vocabulary::MSP_VOCABULARY;

/// Attractiveness score as persisted on the company record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBlock {
    #[serde(flatten)]
    pub result: CompanyScore,
    pub scored_at: DateTime<Utc>,
}

/// MSP classification as persisted in the enrichment block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationBlock {
    #[serde(flatten)]
    pub result: MspClassification,
    pub classified_at: DateTime<Utc>,
    pub vocabulary_version: String,
    pub vocabulary_fingerprint: String,
}

/// Everything the screening layer derives for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub registry_number: String,
    pub name: String,
    pub score: ScoreBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationBlock>,
    pub thesis: ThesisMatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financials: Option<TrendSummary>,
}

impl ScreeningReport {
    /// MSP likelihood score, or 0 when the company was not classified.
    pub fn msp_score(&self) -> u8 {
        self.classification
            .as_ref()
            .map_or(0, |c| c.result.score)
    }
}

/// Classifies a company's enrichment signals.
///
/// Returns `None` when there is nothing to classify; callers invoke this
/// explicitly after updating enrichment data rather than relying on a save hook.
pub fn refresh_classification(
    company: &CompanyRecord,
    as_of: DateTime<Utc>,
) -> Option<ClassificationBlock> {
    if company.enrichment.is_empty() {
        tracing::debug!(
            "No enrichment signals for {}; skipping classification",
            company.registry_number
        );
        return None;
    }

    let result = classify(&company.enrichment, &company.name, &company.industry_codes);

    Some(ClassificationBlock {
        result,
        classified_at: as_of,
        vocabulary_version: MSP_VOCABULARY.version.to_string(),
        vocabulary_fingerprint: MSP_VOCABULARY.fingerprint(),
    })
}

/// Runs all four components for a company.
///
/// # Arguments
///
/// * `company` - The validated company record.
/// * `financials` - Annual records (any order); empty when none were extracted.
/// * `resolver` - Distance capability used when the record has no stored distance.
/// * `as_of` - Caller-supplied timestamp; also the date ages are measured at.
///
/// # Returns
///
/// * `ScreeningReport` - Derived values for the caller to merge and persist.
pub async fn screen_company(
    company: &CompanyRecord,
    financials: &[AnnualFinancialRecord],
    resolver: &dyn DistanceResolver,
    as_of: DateTime<Utc>,
) -> ScreeningReport {
    let today = as_of.date_naive();

    let score = score_as_of(company, resolver, today).await;
    let classification = refresh_classification(company, as_of);
    let thesis = match_criteria_as_of(company, today);
    let trends = (!financials.is_empty()).then(|| compute_trends(financials));

    tracing::info!(
        "Screened {} ({}): score={} msp={} thesis_match={}",
        company.registry_number,
        company.name,
        score.score,
        classification
            .as_ref()
            .map_or("n/a".to_string(), |c| c.result.score.to_string()),
        thesis.matches
    );

    ScreeningReport {
        registry_number: company.registry_number.clone(),
        name: company.name.clone(),
        score: ScoreBlock {
            result: score,
            scored_at: as_of,
        },
        classification,
        thesis,
        financials: trends,
    }
}

/// Orders reports for review: thesis matches first, then attractiveness
/// score, then MSP likelihood (all descending), then registry number.
pub fn rank_reports(reports: &mut [ScreeningReport]) {
    reports.sort_by(|a, b| {
        b.thesis
            .matches
            .cmp(&a.thesis.matches)
            .then_with(|| {
                b.score
                    .result
                    .score
                    .partial_cmp(&a.score.result.score)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| b.msp_score().cmp(&a.msp_score()))
            .then_with(|| a.registry_number.cmp(&b.registry_number))
    });
}
