/// Integration tests with a mocked postcode geocoder
/// Tests distance resolution and the screening workflow without hitting real external services
use chrono::{NaiveDate, TimeZone, Utc};
use rust_msp_screener::distance::{
    CachedDistanceResolver, DistanceResolver, GeoPoint, PostcodeGeocoder,
};
use rust_msp_screener::models::{
    AnnualFinancialRecord, CompanyRecord, EnrichmentSignals, FactorName, FinancialSnapshot,
    StructuredAddress,
};
use rust_msp_screener::screening::{rank_reports, refresh_classification, screen_company};
use rust_msp_screener::vocabulary::MSP_VOCABULARY;
use std::time::Duration;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// London reference point.
fn reference() -> GeoPoint {
    GeoPoint::new(51.5074, -0.1278)
}

/// Helper function to create a geocoder against the mock server
fn create_test_geocoder(base_url: String) -> PostcodeGeocoder {
    PostcodeGeocoder::new(base_url, reference(), Duration::from_secs(5), 3).unwrap()
}

/// Postcodes.io-shaped success body for Cambridge.
fn cambridge_response() -> serde_json::Value {
    serde_json::json!({
        "status": 200,
        "result": {
            "postcode": "CB2 1TN",
            "latitude": 52.2053,
            "longitude": 0.1218
        }
    })
}

fn create_test_company(registry_number: &str, postcode: &str) -> CompanyRecord {
    CompanyRecord {
        registry_number: registry_number.to_string(),
        name: "Fenland Managed IT Ltd".to_string(),
        status: "active".to_string(),
        incorporation_date: NaiveDate::from_ymd_opt(2012, 4, 2).unwrap(),
        has_insolvency_history: false,
        has_been_liquidated: false,
        industry_codes: vec!["62020 - Information technology consultancy activities".to_string()],
        financials: FinancialSnapshot {
            revenue: Some(4_100_000.0),
            profit: Some(350_000.0),
            ebitda: Some(610_000.0),
            employee_count: Some(26),
        },
        address: rust_msp_screener::models::Address {
            text: Some(format!("12 Station Road, Cambridge {}", postcode)),
            structured: None,
        },
        enrichment: EnrichmentSignals {
            keywords: vec!["managed services".to_string(), "helpdesk".to_string()],
            services: vec!["Managed IT support".to_string()],
            technology_vendors: vec!["Microsoft 365".to_string(), "Datto".to_string()],
            description: Some("Fully managed IT support for SMEs.".to_string()),
        },
        distance_km: None,
    }
}

#[tokio::test]
async fn test_geocoder_resolves_postcode_distance() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/postcodes/CB2(%20| )1TN$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cambridge_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let geocoder = create_test_geocoder(mock_server.uri());
    let structured = StructuredAddress {
        postal_code: Some("cb21tn".to_string()),
        ..Default::default()
    };

    let km = geocoder
        .resolve_distance(None, Some(&structured))
        .await
        .expect("distance should resolve");

    // Cambridge is roughly 80 km from central London.
    assert!((70.0..90.0).contains(&km), "got {}", km);
}

#[tokio::test]
async fn test_unknown_postcode_is_unresolved() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/postcodes/.+$"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "status": 404,
            "error": "Postcode not found"
        })))
        .mount(&mock_server)
        .await;

    let geocoder = create_test_geocoder(mock_server.uri());
    let km = geocoder
        .resolve_distance(Some("1 Nowhere Lane, ZZ9 9ZZ"), None)
        .await;

    assert_eq!(km, None);
}

#[tokio::test]
async fn test_address_without_postcode_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cambridge_response()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let geocoder = create_test_geocoder(mock_server.uri());
    assert_eq!(geocoder.resolve_distance(Some("Cambridge"), None).await, None);
}

#[tokio::test]
async fn test_circuit_opens_after_repeated_failures() {
    let mock_server = MockServer::start().await;

    // Threshold is 3: the remaining lookups are rejected without a request.
    Mock::given(method("GET"))
        .and(path_regex(r"^/postcodes/.+$"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let geocoder = create_test_geocoder(mock_server.uri());
    for postcode in ["AB1 2CD", "EF3 4GH", "IJ5 6KL", "MN7 8PQ", "RS9 1TU"] {
        let km = geocoder.resolve_distance(Some(postcode), None).await;
        assert_eq!(km, None);
    }
}

#[tokio::test]
async fn test_not_found_does_not_open_circuit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/postcodes/.+$"))
        .respond_with(ResponseTemplate::new(404))
        .expect(5)
        .mount(&mock_server)
        .await;

    let geocoder = create_test_geocoder(mock_server.uri());
    for postcode in ["AB1 2CD", "EF3 4GH", "IJ5 6KL", "MN7 8PQ", "RS9 1TU"] {
        assert_eq!(geocoder.resolve_distance(Some(postcode), None).await, None);
    }
}

#[tokio::test]
async fn test_cached_resolver_requests_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/postcodes/CB2(%20| )1TN$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cambridge_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolver = CachedDistanceResolver::new(
        create_test_geocoder(mock_server.uri()),
        Duration::from_secs(60),
        100,
    );

    // Same postcode written differently shares one cache entry.
    let first = resolver.resolve_distance(Some("Cambridge CB2 1TN"), None).await;
    let second = resolver.resolve_distance(Some("cb21tn"), None).await;

    assert!(first.is_some());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_screen_company_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/postcodes/CB2(%20| )1TN$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cambridge_response()))
        .mount(&mock_server)
        .await;

    let resolver = CachedDistanceResolver::new(
        create_test_geocoder(mock_server.uri()),
        Duration::from_secs(60),
        100,
    );
    let company = create_test_company("09111222", "CB2 1TN");

    let mut latest = AnnualFinancialRecord::new(
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
    );
    latest.profit_and_loss.revenue = Some(4_100_000.0);
    let mut previous = AnnualFinancialRecord::new(
        NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
    );
    previous.profit_and_loss.revenue = Some(3_700_000.0);

    let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let report = screen_company(&company, &[previous, latest], &resolver, as_of).await;

    assert_eq!(report.registry_number, "09111222");
    assert_eq!(report.score.scored_at, as_of);
    assert_eq!(
        report.score.result.factor(FactorName::Location).unwrap().points,
        15.0
    );
    assert!(report.thesis.matches);

    let classification = report.classification.as_ref().unwrap();
    assert_eq!(classification.vocabulary_version, MSP_VOCABULARY.version);
    assert_eq!(classification.vocabulary_fingerprint, MSP_VOCABULARY.fingerprint());
    assert!(classification.result.score > 0);

    let trends = report.financials.as_ref().unwrap();
    assert_eq!(trends.trends.revenue_growth_1y, Some(10.81));

    // The persisted shape flattens the score block.
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["score"]["score"].is_number());
    assert!(json["score"]["scored_at"].is_string());
}

#[tokio::test]
async fn test_stored_distance_skips_geocoder() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cambridge_response()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let geocoder = create_test_geocoder(mock_server.uri());
    let mut company = create_test_company("09111333", "CB2 1TN");
    company.distance_km = Some(12.0);

    let report = screen_company(&company, &[], &geocoder, Utc::now()).await;

    assert_eq!(
        report.score.result.factor(FactorName::Location).unwrap().points,
        25.0
    );
    assert!(report.financials.is_none());
}

#[test]
fn test_refresh_classification_skips_empty_signals() {
    let mut company = create_test_company("09111444", "CB2 1TN");
    company.enrichment = EnrichmentSignals::default();
    assert!(refresh_classification(&company, Utc::now()).is_none());
}

#[tokio::test]
async fn test_rank_reports_orders_matches_first() {
    let mock_server = MockServer::start().await;
    let geocoder = create_test_geocoder(mock_server.uri());
    let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

    let mut near = create_test_company("00000003", "CB2 1TN");
    near.distance_km = Some(10.0);
    let mut far = create_test_company("00000002", "CB2 1TN");
    far.distance_km = Some(180.0);
    let mut dissolved = create_test_company("00000001", "CB2 1TN");
    dissolved.distance_km = Some(5.0);
    dissolved.status = "dissolved".to_string();

    let mut reports = vec![
        screen_company(&dissolved, &[], &geocoder, as_of).await,
        screen_company(&far, &[], &geocoder, as_of).await,
        screen_company(&near, &[], &geocoder, as_of).await,
    ];
    rank_reports(&mut reports);

    let order: Vec<&str> = reports.iter().map(|r| r.registry_number.as_str()).collect();
    assert_eq!(order, vec!["00000003", "00000002", "00000001"]);
}
