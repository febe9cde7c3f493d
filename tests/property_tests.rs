/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_msp_screener::classifier::{classify, contains_term, normalize_text};
use rust_msp_screener::models::{
    AnnualFinancialRecord, CompanyRecord, EnrichmentSignals, FinancialSnapshot,
};
use rust_msp_screener::scoring::{age_points, score_with_distance};
use rust_msp_screener::trends::compute_trends;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn company(age_days: i64, financials: FinancialSnapshot, vendors: Vec<String>) -> CompanyRecord {
    let mut company = CompanyRecord {
        registry_number: "00000001".to_string(),
        name: "Property Test Ltd".to_string(),
        status: "active".to_string(),
        incorporation_date: as_of() - Duration::days(age_days),
        has_insolvency_history: false,
        has_been_liquidated: false,
        industry_codes: vec![],
        financials,
        address: Default::default(),
        enrichment: Default::default(),
        distance_km: None,
    };
    company.enrichment.technology_vendors = vendors;
    company
}

// Property: the attractiveness score is bounded and is the sum of its factors
proptest! {
    #[test]
    fn score_is_bounded_sum_of_factors(
        age_days in -2_000i64..20_000,
        employees in proptest::option::of(0u32..500),
        revenue in proptest::option::of(-1_000_000.0f64..50_000_000.0),
        ebitda in proptest::option::of(-500_000.0f64..5_000_000.0),
        distance in proptest::option::of(0.0f64..1_000.0),
        vendors in proptest::collection::vec("[A-Za-z ]{0,12}", 0..5)
    ) {
        let financials = FinancialSnapshot { revenue, profit: None, ebitda, employee_count: employees };
        let result = score_with_distance(&company(age_days, financials, vendors), distance, as_of());

        let sum: f64 = result.factors.iter().map(|f| f.points).sum();
        prop_assert!(result.score >= 0.0 && result.score <= 100.0);
        prop_assert!((result.score - (sum * 100.0).round() / 100.0).abs() < 1e-9);
        prop_assert!(result.factors.iter().all(|f| f.points >= 0.0 && f.points <= 25.0));
    }

    #[test]
    fn age_points_monotone_and_saturating(a in 0.0f64..10.0, b in 0.0f64..10.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(age_points(lo) <= age_points(hi));
        if hi >= 3.0 {
            prop_assert_eq!(age_points(hi), 25.0);
        }
    }
}

// Property: classification never panics and stays within 0-100
proptest! {
    #[test]
    fn classify_never_panics(
        keywords in proptest::collection::vec("\\PC{0,30}", 0..6),
        services in proptest::collection::vec("\\PC{0,30}", 0..6),
        vendors in proptest::collection::vec("\\PC{0,20}", 0..6),
        description in proptest::option::of("\\PC{0,200}"),
        name in "\\PC{0,40}",
        codes in proptest::collection::vec("[0-9]{0,5}( - [a-z ]{0,20})?", 0..3)
    ) {
        let signals = EnrichmentSignals { keywords, services, technology_vendors: vendors, description };
        let result = classify(&signals, &name, &codes);
        prop_assert!(result.score <= 100);
    }

    #[test]
    fn term_matching_never_panics(haystack in "\\PC*", term in "\\PC{0,10}") {
        let _ = contains_term(&normalize_text(&haystack), &normalize_text(&term));
    }
}

// Property: trend outputs are always finite
proptest! {
    #[test]
    fn trends_are_finite(
        values in proptest::collection::vec(
            (proptest::option::of(-1e9f64..1e9), proptest::option::of(-1e8f64..1e8), proptest::option::of(0u32..1_000)),
            0..7
        )
    ) {
        let records: Vec<AnnualFinancialRecord> = values
            .into_iter()
            .enumerate()
            .map(|(i, (revenue, profit, employees))| {
                let year = 2010 + i as i32;
                let mut r = AnnualFinancialRecord::new(
                    NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
                    NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
                );
                r.profit_and_loss.revenue = revenue;
                r.profit_and_loss.net_profit = profit;
                r.employees.employee_count = employees;
                r
            })
            .collect();

        let trends = compute_trends(&records).trends;
        let numbers = [
            trends.revenue_growth_1y,
            trends.profit_growth_1y,
            trends.employee_growth_1y,
            trends.revenue_cagr_3y,
            trends.profit_cagr_3y,
            trends.average_revenue_3y,
            trends.average_profit_3y,
            trends.average_ebitda_margin_3y,
            trends.average_recurring_revenue_percentage_3y,
        ];
        prop_assert!(numbers.iter().flatten().all(|v| v.is_finite()));
    }
}
