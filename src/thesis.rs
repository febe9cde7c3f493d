//! Acquisition thesis: the fixed target profile and the criteria matcher.
//!
//! The profile constants here are shared with the attractiveness scorer
//! (size bands, vendor vocabulary) and the classifier (industry codes).

use chrono::{NaiveDate, Utc};

use crate::models::{
    CompanyRecord, CriterionName, CriterionResult, FinancialSnapshot, SizeDimension, ThesisMatch,
};

/// Minimum years trading for a target.
pub const MIN_YEARS_ACTIVE: f64 = 3.0;

/// Inclusive `[min, max]` band for one size dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeBand {
    pub dimension: SizeDimension,
    pub min: f64,
    pub max: f64,
}

impl SizeBand {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Size bands in the fixed priority order: employees, revenue, EBITDA.
pub const SIZE_BANDS: [SizeBand; 3] = [
    SizeBand {
        dimension: SizeDimension::Employees,
        min: 15.0,
        max: 40.0,
    },
    SizeBand {
        dimension: SizeDimension::Revenue,
        min: 3_000_000.0,
        max: 6_000_000.0,
    },
    SizeBand {
        dimension: SizeDimension::Ebitda,
        min: 500_000.0,
        max: 1_000_000.0,
    },
];

/// SIC codes of the target sector: IT consultancy and computer facilities management.
pub const TARGET_INDUSTRY_CODES: [u32; 2] = [62020, 62030];

/// Vendors whose presence signals alignment with the acquirer's stack.
pub const TECH_VENDOR_VOCABULARY: [&str; 8] = [
    "microsoft",
    "cisco",
    "vmware",
    "dell",
    "fortinet",
    "sophos",
    "datto",
    "connectwise",
];

/// Reads the snapshot value for a size dimension.
pub fn dimension_value(financials: &FinancialSnapshot, dimension: SizeDimension) -> Option<f64> {
    match dimension {
        SizeDimension::Employees => financials.employee_count.map(f64::from),
        SizeDimension::Revenue => financials.revenue,
        SizeDimension::Ebitda => financials.ebitda,
    }
}

/// The first band (in priority order) whose value is present and inside the band.
pub fn satisfied_size_band(financials: &FinancialSnapshot) -> Option<(SizeBand, f64)> {
    SIZE_BANDS.iter().find_map(|band| {
        dimension_value(financials, band.dimension)
            .filter(|value| band.contains(*value))
            .map(|value| (*band, value))
    })
}

/// Parses the leading numeric code of an industry code entry.
///
/// Accepts entries like `"62020"`, `"62020 - Information technology consultancy activities"`
/// or `" 62030: Computer facilities management"`.
pub fn parse_industry_code(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Codes from `codes` that match one of the target industry codes.
pub fn matching_industry_codes(codes: &[String]) -> Vec<String> {
    codes
        .iter()
        .filter(|code| {
            parse_industry_code(code).is_some_and(|c| TARGET_INDUSTRY_CODES.contains(&c))
        })
        .cloned()
        .collect()
}

/// Distinct vendor vocabulary terms found in the given vendor entries (case-insensitive).
pub fn matched_tech_vendors(vendors: &[String]) -> Vec<&'static str> {
    let lowered: Vec<String> = vendors.iter().map(|v| v.to_lowercase()).collect();
    TECH_VENDOR_VOCABULARY
        .iter()
        .copied()
        .filter(|term| lowered.iter().any(|v| v.contains(term)))
        .collect()
}

/// Evaluates all six thesis criteria against today's date.
pub fn match_criteria(company: &CompanyRecord) -> ThesisMatch {
    match_criteria_as_of(company, Utc::now().date_naive())
}

/// Evaluates all six thesis criteria as of the given date.
///
/// `matches` is the conjunction of criteria 1 - 5; the technology-alignment
/// criterion is informational only.
pub fn match_criteria_as_of(company: &CompanyRecord, as_of: NaiveDate) -> ThesisMatch {
    let criteria = vec![
        age_criterion(company, as_of),
        status_criterion(company),
        clean_criterion(company),
        industry_criterion(company),
        size_criterion(&company.financials),
        tech_criterion(company),
    ];

    let matches = criteria
        .iter()
        .filter(|c| c.name != CriterionName::TechAlignment)
        .all(|c| c.met);

    tracing::debug!(
        "Thesis match for {}: {} ({}/{} criteria met)",
        company.registry_number,
        matches,
        criteria.iter().filter(|c| c.met).count(),
        criteria.len()
    );

    ThesisMatch { matches, criteria }
}

fn age_criterion(company: &CompanyRecord, as_of: NaiveDate) -> CriterionResult {
    let years = company.years_active(as_of);
    let met = years >= MIN_YEARS_ACTIVE;
    CriterionResult {
        name: CriterionName::Age,
        met,
        detail: format!(
            "incorporated {} ({:.1} years; minimum {})",
            company.incorporation_date, years, MIN_YEARS_ACTIVE
        ),
    }
}

fn status_criterion(company: &CompanyRecord) -> CriterionResult {
    let met = company.status.trim().eq_ignore_ascii_case("active");
    CriterionResult {
        name: CriterionName::Status,
        met,
        detail: format!("status is '{}'", company.status),
    }
}

fn clean_criterion(company: &CompanyRecord) -> CriterionResult {
    let met = !company.has_insolvency_history && !company.has_been_liquidated;
    let detail = match (company.has_insolvency_history, company.has_been_liquidated) {
        (false, false) => "no insolvency history or liquidation".to_string(),
        (true, false) => "insolvency history on record".to_string(),
        (false, true) => "company has been liquidated".to_string(),
        (true, true) => "insolvency history on record and company has been liquidated".to_string(),
    };
    CriterionResult {
        name: CriterionName::Clean,
        met,
        detail,
    }
}

fn industry_criterion(company: &CompanyRecord) -> CriterionResult {
    let matching = matching_industry_codes(&company.industry_codes);
    let detail = if !matching.is_empty() {
        format!("matching industry code(s): {}", matching.join(", "))
    } else if company.industry_codes.is_empty() {
        "no industry codes on record".to_string()
    } else {
        format!(
            "no code matches {:?} (have: {})",
            TARGET_INDUSTRY_CODES,
            company.industry_codes.join(", ")
        )
    };
    CriterionResult {
        name: CriterionName::IndustryCode,
        met: !matching.is_empty(),
        detail,
    }
}

fn size_criterion(financials: &FinancialSnapshot) -> CriterionResult {
    if let Some((band, value)) = satisfied_size_band(financials) {
        return CriterionResult {
            name: CriterionName::Size,
            met: true,
            detail: format!(
                "{} {} within {}-{}",
                band.dimension.as_str(),
                value,
                band.min,
                band.max
            ),
        };
    }

    if !financials.has_size_data() {
        return CriterionResult {
            name: CriterionName::Size,
            met: true,
            detail: "no size data available; passing by default".to_string(),
        };
    }

    let observed: Vec<String> = SIZE_BANDS
        .iter()
        .filter_map(|band| {
            dimension_value(financials, band.dimension)
                .map(|v| format!("{}={}", band.dimension.as_str(), v))
        })
        .collect();

    CriterionResult {
        name: CriterionName::Size,
        met: false,
        detail: format!("outside all size bands ({})", observed.join(", ")),
    }
}

fn tech_criterion(company: &CompanyRecord) -> CriterionResult {
    let matched = matched_tech_vendors(&company.enrichment.technology_vendors);
    let detail = if matched.is_empty() {
        "no aligned technology vendors found".to_string()
    } else {
        format!("aligned vendors: {}", matched.join(", "))
    };
    CriterionResult {
        name: CriterionName::TechAlignment,
        met: !matched.is_empty(),
        detail,
    }
}
