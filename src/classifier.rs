//! MSP likelihood classifier.
//!
//! Scores how likely a company is to be an IT managed-service provider from
//! caller-extracted enrichment text. All vocabulary, weights and thresholds
//! come from [`MSP_VOCABULARY`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::models::{Confidence, EnrichmentSignals, Indicator, IndicatorCategory, MspClassification};
use crate::thesis::matching_industry_codes;
use crate::vocabulary::{CategoryRule, MSP_VOCABULARY};

static DESCRIPTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    MSP_VOCABULARY
        .description_patterns
        .terms
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::error!("Invalid description pattern '{}': {}", pattern, e);
                None
            }
        })
        .collect()
});

/// Narrow provider profile flagged for operators. Does not affect the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MspSpecialization {
    Backup,
    Security,
    BackupAndSecurity,
}

impl MspSpecialization {
    pub fn as_str(&self) -> &'static str {
        match self {
            MspSpecialization::Backup => "backup",
            MspSpecialization::Security => "security",
            MspSpecialization::BackupAndSecurity => "backup_and_security",
        }
    }
}

/// Evidence and points for one weighted category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEvidence {
    pub matched: Vec<String>,
    /// Evidence ratio, 0.0 - 1.0.
    pub ratio: f64,
    pub points: f64,
}

impl CategoryEvidence {
    fn new(matched: Vec<String>, ratio: f64, weight: f64) -> Self {
        let ratio = ratio.clamp(0.0, 1.0);
        Self {
            matched,
            ratio,
            points: ratio * weight,
        }
    }
}

/// Per-category breakdown behind a classification.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScores {
    pub negative_matches: Vec<String>,
    pub context_penalty: f64,
    /// Keyword evidence, with `points` already multiplied by the context penalty.
    pub keywords: CategoryEvidence,
    pub services: CategoryEvidence,
    pub vendors: CategoryEvidence,
    pub description: CategoryEvidence,
    pub industry_codes: Vec<String>,
    pub industry_points: f64,
}

impl CategoryScores {
    pub fn total(&self) -> f64 {
        self.keywords.points
            + self.services.points
            + self.vendors.points
            + self.description.points
            + self.industry_points
    }
}

/// Lowercases and turns `-`/`_` into spaces so "software-development" and
/// "software development" match the same phrase.
pub fn normalize_text(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect()
}

/// Whole-word (or simple plural) occurrence of `term` in `haystack`.
///
/// Both arguments are expected to be normalised already.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    haystack.match_indices(term).any(|(start, _)| {
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let mut rest = haystack[start + term.len()..].chars();
        let after_ok = match rest.next() {
            None => true,
            Some('s') => rest.next().map_or(true, |c| !c.is_alphanumeric()),
            Some(c) => !c.is_alphanumeric(),
        };
        before_ok && after_ok
    })
}

/// All text sources joined into one normalised corpus, one source per line.
pub fn build_corpus(signals: &EnrichmentSignals, company_name: &str) -> String {
    signals
        .keywords
        .iter()
        .chain(signals.services.iter())
        .chain(signals.technology_vendors.iter())
        .map(String::as_str)
        .chain(signals.description.as_deref())
        .chain(std::iter::once(company_name))
        .map(normalize_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Negative-context phrases present in the corpus.
pub fn negative_matches(corpus: &str) -> Vec<String> {
    MSP_VOCABULARY
        .negative_context
        .phrases
        .iter()
        .filter(|phrase| contains_term(corpus, phrase))
        .map(|phrase| phrase.to_string())
        .collect()
}

/// `1.0` with no negative matches, else `max(floor, 1 - per_match * count)`.
pub fn context_penalty(match_count: usize) -> f64 {
    let rule = &MSP_VOCABULARY.negative_context;
    if match_count == 0 {
        1.0
    } else {
        (1.0 - rule.per_match * match_count as f64).max(rule.floor)
    }
}

fn terms_in(text: &str, rule: &CategoryRule) -> Vec<String> {
    rule.terms
        .iter()
        .filter(|term| contains_term(text, term))
        .map(|term| term.to_string())
        .collect()
}

/// Entries that match at least one term of the rule, in their original form.
fn matching_entries(entries: &[String], rule: &CategoryRule) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| {
            let normalized = normalize_text(entry);
            rule.terms.iter().any(|term| contains_term(&normalized, term))
        })
        .cloned()
        .collect()
}

/// Distinct MSP keywords in the corpus over the keyword vocabulary size,
/// scaled by `penalty`.
pub fn keyword_evidence(corpus: &str, penalty: f64) -> CategoryEvidence {
    let rule = &MSP_VOCABULARY.keywords;
    let matched = terms_in(corpus, rule);
    let ratio = matched.len() as f64 / rule.terms.len() as f64;
    let mut evidence = CategoryEvidence::new(matched, ratio, rule.weight);
    evidence.points *= penalty;
    evidence
}

/// Declared services matching the service vocabulary over the number of declared services.
pub fn service_evidence(services: &[String]) -> CategoryEvidence {
    let rule = &MSP_VOCABULARY.services;
    let matched = matching_entries(services, rule);
    let ratio = matched.len() as f64 / services.len().max(1) as f64;
    CategoryEvidence::new(matched, ratio, rule.weight)
}

/// Vendor entries matching the infrastructure vendor vocabulary over the number of entries.
pub fn vendor_evidence(vendors: &[String]) -> CategoryEvidence {
    let rule = &MSP_VOCABULARY.vendors;
    let matched = matching_entries(vendors, rule);
    let ratio = matched.len() as f64 / vendors.len().max(1) as f64;
    CategoryEvidence::new(matched, ratio, rule.weight)
}

/// Description patterns matched over the pattern count.
pub fn description_evidence(description: Option<&str>) -> CategoryEvidence {
    let rule = &MSP_VOCABULARY.description_patterns;
    let text = normalize_text(description.unwrap_or_default());
    let matched: Vec<String> = if text.trim().is_empty() {
        Vec::new()
    } else {
        DESCRIPTION_PATTERNS
            .iter()
            .filter_map(|re| re.find(&text).map(|m| m.as_str().to_string()))
            .collect()
    };
    let ratio = matched.len() as f64 / rule.terms.len().max(1) as f64;
    CategoryEvidence::new(matched, ratio, rule.weight)
}

/// Backup-only or security-only service evidence with no broad infrastructure
/// or helpdesk evidence.
pub fn detect_specialization(signals: &EnrichmentSignals) -> Option<MspSpecialization> {
    let rule = &MSP_VOCABULARY.specialization;
    let text = signals
        .services
        .iter()
        .chain(signals.keywords.iter())
        .map(|s| normalize_text(s))
        .collect::<Vec<_>>()
        .join("\n");

    let has_any = |terms: &[&str]| terms.iter().any(|t| contains_term(&text, t));

    if has_any(rule.broad_terms) {
        return None;
    }

    match (has_any(rule.backup_terms), has_any(rule.security_terms)) {
        (true, true) => Some(MspSpecialization::BackupAndSecurity),
        (true, false) => Some(MspSpecialization::Backup),
        (false, true) => Some(MspSpecialization::Security),
        (false, false) => None,
    }
}

/// Confidence gating: high on score alone; medium also requires the context
/// penalty not to have bitten too hard.
pub fn confidence_tier(score: f64, penalty: f64, any_negative: bool) -> Confidence {
    let thresholds = &MSP_VOCABULARY.confidence;
    let min_penalty = if any_negative {
        thresholds.medium_min_penalty_with_negatives
    } else {
        thresholds.medium_min_penalty
    };

    if score >= thresholds.high_score {
        Confidence::High
    } else if score >= thresholds.medium_score && penalty >= min_penalty {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Computes every weighted category independently.
pub fn score_categories(
    signals: &EnrichmentSignals,
    company_name: &str,
    industry_codes: &[String],
) -> CategoryScores {
    let corpus = build_corpus(signals, company_name);
    let negative = negative_matches(&corpus);
    let penalty = context_penalty(negative.len());
    let industry = matching_industry_codes(industry_codes);
    let industry_points = if industry.is_empty() {
        0.0
    } else {
        MSP_VOCABULARY.industry_bonus
    };

    CategoryScores {
        keywords: keyword_evidence(&corpus, penalty),
        services: service_evidence(&signals.services),
        vendors: vendor_evidence(&signals.technology_vendors),
        description: description_evidence(signals.description.as_deref()),
        negative_matches: negative,
        context_penalty: penalty,
        industry_codes: industry,
        industry_points,
    }
}

/// Classifies a company's MSP likelihood.
///
/// # Arguments
///
/// * `signals` - Pre-extracted enrichment text.
/// * `company_name` - Registered name, added to the text corpus.
/// * `industry_codes` - SIC codes (description suffixes tolerated).
///
/// # Returns
///
/// * `MspClassification` - Integer score 0 - 100, confidence tier and per-category indicators.
pub fn classify(
    signals: &EnrichmentSignals,
    company_name: &str,
    industry_codes: &[String],
) -> MspClassification {
    if signals.is_empty() {
        tracing::debug!(
            "No enrichment signals for '{}'; classifying as score 0",
            company_name
        );
        return unclassified();
    }

    let scores = score_categories(signals, company_name, industry_codes);
    let total = scores.total();
    let score = total.round().clamp(0.0, 100.0) as u8;
    let confidence = confidence_tier(
        f64::from(score),
        scores.context_penalty,
        !scores.negative_matches.is_empty(),
    );
    let specialization = detect_specialization(signals);

    tracing::debug!(
        "MSP classification for '{}': score={} ({:.2}) confidence={:?} penalty={:.2} negatives={:?}",
        company_name,
        score,
        total,
        confidence,
        scores.context_penalty,
        scores.negative_matches
    );

    let indicator = |category, evidence: Vec<String>| Indicator {
        category,
        found: !evidence.is_empty(),
        evidence,
    };

    let indicators = vec![
        indicator(IndicatorCategory::MspKeywords, scores.keywords.matched),
        indicator(IndicatorCategory::Services, scores.services.matched),
        indicator(IndicatorCategory::TechnologyVendors, scores.vendors.matched),
        indicator(
            IndicatorCategory::DescriptionPatterns,
            scores.description.matched,
        ),
        indicator(IndicatorCategory::IndustryCodes, scores.industry_codes),
        indicator(IndicatorCategory::NegativeContext, scores.negative_matches),
        indicator(
            IndicatorCategory::SpecializedMsp,
            specialization
                .map(|s| vec![s.as_str().to_string()])
                .unwrap_or_default(),
        ),
    ];

    MspClassification {
        score,
        confidence,
        indicators,
    }
}

/// Result for a company with no enrichment text: nothing found, score 0.
///
/// The name and industry codes alone never produce evidence.
fn unclassified() -> MspClassification {
    let indicators = [
        IndicatorCategory::MspKeywords,
        IndicatorCategory::Services,
        IndicatorCategory::TechnologyVendors,
        IndicatorCategory::DescriptionPatterns,
        IndicatorCategory::IndustryCodes,
        IndicatorCategory::NegativeContext,
        IndicatorCategory::SpecializedMsp,
    ]
    .into_iter()
    .map(|category| Indicator {
        category,
        found: false,
        evidence: Vec::new(),
    })
    .collect();

    MspClassification {
        score: 0,
        confidence: Confidence::Low,
        indicators,
    }
}
