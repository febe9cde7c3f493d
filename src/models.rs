use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

// ============ Company Models ============

/// A validated business-registry record as supplied by the ingestion layer.
///
/// The screening layer only ever reads these records; nothing in this crate
/// mutates or persists them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// Registry (company) number.
    pub registry_number: String,
    /// Registered company name.
    pub name: String,
    /// Registry status (e.g., "active", "dissolved").
    pub status: String,
    /// Date of incorporation.
    pub incorporation_date: NaiveDate,
    /// Whether the registry reports any insolvency history.
    #[serde(default)]
    pub has_insolvency_history: bool,
    /// Whether the company has ever been liquidated.
    #[serde(default)]
    pub has_been_liquidated: bool,
    /// Industry classification (SIC) codes, possibly with description suffixes.
    #[serde(default)]
    pub industry_codes: Vec<String>,
    /// Latest known single-point financial figures.
    #[serde(default)]
    pub financials: FinancialSnapshot,
    /// Registered office address.
    #[serde(default)]
    pub address: Address,
    /// Pre-extracted enrichment signals (website, filings).
    #[serde(default)]
    pub enrichment: EnrichmentSignals,
    /// Previously resolved distance from the reference point, in km.
    #[serde(default)]
    pub distance_km: Option<f64>,
}

impl CompanyRecord {
    /// Parses a company record from its JSON representation.
    ///
    /// # Arguments
    ///
    /// * `raw` - The JSON document.
    ///
    /// # Returns
    ///
    /// * `Result<CompanyRecord, AppError>` - The record, or `BadRequest` if the
    ///   document is malformed (e.g., an unparsable incorporation date).
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::BadRequest(format!("Invalid company record: {}", e)))
    }

    /// Whole days between incorporation and `as_of`.
    pub fn days_active(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.incorporation_date).num_days()
    }

    /// Years active, using a flat 365-day year. Never negative.
    pub fn years_active(&self, as_of: NaiveDate) -> f64 {
        (self.days_active(as_of) as f64 / 365.0).max(0.0)
    }
}

/// Latest known headline financials for a company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    /// Annual revenue (turnover) in GBP.
    pub revenue: Option<f64>,
    /// Profit in GBP.
    pub profit: Option<f64>,
    /// EBITDA in GBP.
    pub ebitda: Option<f64>,
    /// Number of employees.
    pub employee_count: Option<u32>,
}

impl FinancialSnapshot {
    /// True when any of revenue, EBITDA or employee count is present and nonzero.
    pub fn has_size_data(&self) -> bool {
        self.revenue.is_some_and(|v| v != 0.0)
            || self.ebitda.is_some_and(|v| v != 0.0)
            || self.employee_count.is_some_and(|v| v != 0)
    }
}

/// Address in free-text and/or structured form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Single-line address text.
    pub text: Option<String>,
    /// Structured fields, when the registry provides them.
    pub structured: Option<StructuredAddress>,
}

/// Structured address fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredAddress {
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Caller-extracted enrichment text used by the classifier and the scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentSignals {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub technology_vendors: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl EnrichmentSignals {
    /// True when no enrichment text of any kind is present.
    pub fn is_empty(&self) -> bool {
        let blank = |values: &[String]| values.iter().all(|v| v.trim().is_empty());
        blank(&self.keywords)
            && blank(&self.services)
            && blank(&self.technology_vendors)
            && self
                .description
                .as_deref()
                .map_or(true, |d| d.trim().is_empty())
    }
}

// ============ Annual Financial Models ============

/// One accounting period's extracted financial statements.
///
/// Records are unique by `period_end` within a company (guaranteed by the
/// extraction pipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualFinancialRecord {
    /// First day of the accounting period.
    pub period_start: NaiveDate,
    /// Last day of the accounting period.
    pub period_end: NaiveDate,
    #[serde(default)]
    pub profit_and_loss: ProfitAndLoss,
    #[serde(default)]
    pub balance_sheet: BalanceSheet,
    #[serde(default)]
    pub revenue_breakdown: RevenueBreakdown,
    #[serde(default)]
    pub employees: EmployeeData,
    #[serde(default)]
    pub technology: TechnologyData,
    /// Ratios computed by the extraction pipeline, if any.
    #[serde(default)]
    pub ratios: FinancialRatios,
    #[serde(default)]
    pub provenance: Provenance,
}

impl AnnualFinancialRecord {
    /// Creates an otherwise-empty record for the given period.
    pub fn new(period_start: NaiveDate, period_end: NaiveDate) -> Self {
        Self {
            period_start,
            period_end,
            profit_and_loss: ProfitAndLoss::default(),
            balance_sheet: BalanceSheet::default(),
            revenue_breakdown: RevenueBreakdown::default(),
            employees: EmployeeData::default(),
            technology: TechnologyData::default(),
            ratios: FinancialRatios::default(),
            provenance: Provenance::default(),
        }
    }

    pub fn revenue(&self) -> Option<f64> {
        self.profit_and_loss.revenue
    }

    pub fn profit(&self) -> Option<f64> {
        self.profit_and_loss.net_profit
    }

    pub fn ebitda(&self) -> Option<f64> {
        self.profit_and_loss.ebitda
    }

    pub fn employee_count(&self) -> Option<u32> {
        self.employees.employee_count
    }

    /// EBITDA margin in percent: the extracted ratio, else derived from raw fields.
    pub fn ebitda_margin(&self) -> Option<f64> {
        self.ratios
            .ebitda_margin
            .or_else(|| percentage_of(self.ebitda(), self.revenue()))
    }

    /// Recurring revenue share in percent: extracted value, else derived.
    pub fn recurring_revenue_percentage(&self) -> Option<f64> {
        self.revenue_breakdown
            .recurring_revenue_percentage
            .or_else(|| {
                let recurring = self.revenue_breakdown.recurring_revenue;
                let total = match (recurring, self.revenue_breakdown.one_time_revenue) {
                    (Some(r), Some(o)) => Some(r + o),
                    _ => self.revenue(),
                };
                percentage_of(recurring, total)
            })
    }
}

/// `part / whole * 100`, only when both are present and `whole` is nonzero.
pub(crate) fn percentage_of(part: Option<f64>, whole: Option<f64>) -> Option<f64> {
    match (part, whole) {
        (Some(p), Some(w)) if w != 0.0 => Some(p / w * 100.0),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfitAndLoss {
    pub revenue: Option<f64>,
    pub cost_of_sales: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_profit: Option<f64>,
    pub profit_before_tax: Option<f64>,
    pub net_profit: Option<f64>,
    pub ebitda: Option<f64>,
    pub depreciation: Option<f64>,
    pub amortisation: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub total_assets: Option<f64>,
    pub current_assets: Option<f64>,
    pub current_liabilities: Option<f64>,
    pub net_assets: Option<f64>,
    pub cash: Option<f64>,
    pub total_debt: Option<f64>,
}

/// Split of revenue into recurring (contracted) and one-time income.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub recurring_revenue: Option<f64>,
    pub one_time_revenue: Option<f64>,
    pub recurring_revenue_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeData {
    pub employee_count: Option<u32>,
    pub staff_costs: Option<f64>,
    pub directors_remuneration: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnologyData {
    pub technology_spend: Option<f64>,
    #[serde(default)]
    pub vendor_mentions: Vec<String>,
}

/// Derived ratios. Margins and shares are percentages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRatios {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebitda_margin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_margin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_margin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_per_employee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_revenue_percentage: Option<f64>,
}

/// Where an extracted record came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Identifier of the filing document the figures were extracted from.
    pub source_document_id: Option<String>,
    /// When the extraction ran.
    pub extracted_at: Option<DateTime<Utc>>,
    /// Extraction confidence, 0.0 - 1.0.
    pub confidence_score: Option<f64>,
}

// ============ Scoring Output Models ============

/// Named factor of the attractiveness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorName {
    Age,
    Size,
    TechAlignment,
    Location,
}

/// Size dimension that earned the size factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeDimension {
    Employees,
    Revenue,
    Ebitda,
}

impl SizeDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeDimension::Employees => "employees",
            SizeDimension::Revenue => "revenue",
            SizeDimension::Ebitda => "ebitda",
        }
    }
}

/// One factor's contribution to the attractiveness score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactor {
    pub name: FactorName,
    /// Human-readable description of the measured value.
    pub value: String,
    /// Points awarded, 0 - 25.
    pub points: f64,
    /// For the size factor, the dimension that earned the points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<SizeDimension>,
}

/// Weighted 0 - 100 acquisition-attractiveness score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyScore {
    pub score: f64,
    pub factors: Vec<ScoreFactor>,
}

impl CompanyScore {
    pub fn factor(&self, name: FactorName) -> Option<&ScoreFactor> {
        self.factors.iter().find(|f| f.name == name)
    }
}

// ============ Classification Output Models ============

/// Classifier certainty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Evidence category reported by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorCategory {
    MspKeywords,
    Services,
    TechnologyVendors,
    DescriptionPatterns,
    IndustryCodes,
    NegativeContext,
    SpecializedMsp,
}

/// Evidence found (or not) for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub category: IndicatorCategory,
    pub found: bool,
    pub evidence: Vec<String>,
}

/// MSP likelihood classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MspClassification {
    /// Likelihood score, 0 - 100.
    pub score: u8,
    pub confidence: Confidence,
    pub indicators: Vec<Indicator>,
}

impl MspClassification {
    pub fn indicator(&self, category: IndicatorCategory) -> Option<&Indicator> {
        self.indicators.iter().find(|i| i.category == category)
    }

    /// Operator signal: backup-only or security-only MSP evidence.
    pub fn is_specialized(&self) -> bool {
        self.indicator(IndicatorCategory::SpecializedMsp)
            .is_some_and(|i| i.found)
    }
}

// ============ Thesis Output Models ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionName {
    Age,
    Status,
    Clean,
    IndustryCode,
    Size,
    TechAlignment,
}

/// Result of a single thesis criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub name: CriterionName,
    pub met: bool,
    pub detail: String,
}

/// Per-criterion thesis report plus the aggregate verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThesisMatch {
    pub matches: bool,
    pub criteria: Vec<CriterionResult>,
}

impl ThesisMatch {
    pub fn criterion(&self, name: CriterionName) -> Option<&CriterionResult> {
        self.criteria.iter().find(|c| c.name == name)
    }
}

// ============ Trend Output Models ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Growing,
    Improving,
    Stable,
    Declining,
}

/// Multi-year derived metrics. Absent fields could not be computed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialTrends {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_growth_1y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_growth_1y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebitda_growth_1y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_growth_1y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_trend: Option<TrendDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_trend: Option<TrendDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebitda_trend: Option<TrendDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_trend: Option<TrendDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebitda_margin_trend: Option<TrendDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_cagr_3y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_cagr_3y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_revenue_3y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_profit_3y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_ebitda_3y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_ebitda_margin_3y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_recurring_revenue_percentage_3y: Option<f64>,
}

/// Headline figures of the most recent accounting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestYearSummary {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub revenue: Option<f64>,
    pub profit: Option<f64>,
    pub ebitda: Option<f64>,
    pub ebitda_margin: Option<f64>,
    pub employee_count: Option<u32>,
    pub recurring_revenue_percentage: Option<f64>,
    pub net_assets: Option<f64>,
    pub cash: Option<f64>,
}

/// Output of the trend calculator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub trends: FinancialTrends,
    pub latest_year_summary: Option<LatestYearSummary>,
}

/// Rounds to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
