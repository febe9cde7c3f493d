/// Unit tests for the MSP likelihood classifier
/// Tests category scoring, negative-context penalty and confidence gating
use rust_msp_screener::classifier::{classify, score_categories};
use rust_msp_screener::models::{Confidence, EnrichmentSignals, IndicatorCategory};
use rust_msp_screener::vocabulary::MSP_VOCABULARY;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn typical_msp_signals() -> EnrichmentSignals {
    EnrichmentSignals {
        keywords: strings(&["managed services", "IT support", "helpdesk", "cyber security"]),
        services: strings(&["Managed IT support", "Cloud backup", "Helpdesk"]),
        technology_vendors: strings(&["Microsoft 365", "Datto", "Sophos"]),
        description: Some(
            "We are a managed IT services provider offering proactive support and 24/7 monitoring to SMEs."
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod empty_input_tests {
    use super::*;

    #[test]
    fn test_empty_enrichment_scores_zero_low() {
        let result = classify(&EnrichmentSignals::default(), "Acme Holdings Ltd", &[]);

        assert_eq!(result.score, 0);
        assert_eq!(result.confidence, Confidence::Low);
        assert!(!result.indicators.is_empty());
        assert!(result.indicators.iter().all(|i| !i.found));
        assert!(result.indicators.iter().all(|i| i.evidence.is_empty()));
    }

    #[test]
    fn test_name_and_code_alone_earn_nothing() {
        let codes = strings(&["62020"]);
        let result = classify(&EnrichmentSignals::default(), "Acme IT Support Ltd", &codes);

        assert_eq!(result.score, 0);
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.indicators.len(), 7);
        assert!(result.indicators.iter().all(|i| !i.found));
    }

    #[test]
    fn test_blank_strings_count_as_empty() {
        let signals = EnrichmentSignals {
            keywords: strings(&["", "  "]),
            description: Some("   ".to_string()),
            ..Default::default()
        };
        let result = classify(&signals, "Acme IT Support Ltd", &strings(&["62020"]));
        assert_eq!(result.score, 0);
    }
}

#[cfg(test)]
mod category_tests {
    use super::*;

    #[test]
    fn test_typical_msp_is_high_confidence() {
        let codes = strings(&["62020 - Information technology consultancy activities"]);
        let result = classify(&typical_msp_signals(), "Northgate Technology Ltd", &codes);

        // keywords 8/28*30 + services 25 + vendors 20 + patterns 3/10*15 + industry 10
        assert_eq!(result.score, 68);
        assert_eq!(result.confidence, Confidence::High);
        assert!(!result.is_specialized());
        assert!(
            !result
                .indicator(IndicatorCategory::NegativeContext)
                .unwrap()
                .found
        );
    }

    #[test]
    fn test_category_breakdown() {
        let scores = score_categories(&typical_msp_signals(), "Northgate Technology Ltd", &[]);

        assert_eq!(scores.keywords.matched.len(), 8);
        assert_eq!(scores.services.points, 25.0);
        assert_eq!(scores.vendors.points, 20.0);
        assert_eq!(scores.description.matched.len(), 3);
        assert!((scores.description.points - 4.5).abs() < 1e-9);
        assert_eq!(scores.industry_points, 0.0);
        assert_eq!(scores.context_penalty, 1.0);
    }

    #[test]
    fn test_vendor_ratio_relative_to_entries() {
        let signals = EnrichmentSignals {
            technology_vendors: strings(&["Microsoft", "Salesforce"]),
            ..Default::default()
        };
        let scores = score_categories(&signals, "", &[]);
        assert_eq!(scores.vendors.matched, strings(&["Microsoft"]));
        assert!((scores.vendors.points - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_industry_bonus_with_description_suffix() {
        let signals = EnrichmentSignals {
            description: Some("Family business based in Leeds.".to_string()),
            ..Default::default()
        };
        let codes = strings(&["62030 - Computer facilities management activities"]);
        let result = classify(&signals, "Acme Ltd", &codes);

        assert_eq!(result.score, 10);
        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.indicator(IndicatorCategory::IndustryCodes).unwrap().found);
    }

    #[test]
    fn test_non_target_code_earns_no_bonus() {
        let codes = strings(&["62012 - Business and domestic software development"]);
        let scores = score_categories(&EnrichmentSignals::default(), "Acme Ltd", &codes);
        assert_eq!(scores.industry_points, 0.0);
    }
}

#[cfg(test)]
mod negative_context_tests {
    use super::*;

    #[test]
    fn test_four_negatives_cap_penalty_and_confidence() {
        let signals = EnrichmentSignals {
            keywords: strings(MSP_VOCABULARY.keywords.terms),
            description: Some(
                "Software development house offering web development, web design and digital transformation."
                    .to_string(),
            ),
            ..Default::default()
        };

        let scores = score_categories(&signals, "Pixel Forge Ltd", &[]);
        assert_eq!(scores.negative_matches.len(), 4);
        assert!((scores.context_penalty - 0.3).abs() < 1e-9);
        // Before the penalty the keyword category alone is worth the full 30.
        assert_eq!(scores.keywords.ratio, 1.0);
        assert!((scores.keywords.points - 9.0).abs() < 1e-9);

        let result = classify(&signals, "Pixel Forge Ltd", &[]);
        assert_ne!(result.confidence, Confidence::High);
        assert_eq!(result.score, 9);
        let negative = result.indicator(IndicatorCategory::NegativeContext).unwrap();
        assert!(negative.found);
        assert_eq!(negative.evidence.len(), 4);
    }

    #[test]
    fn test_hyphenated_phrases_match() {
        let signals = EnrichmentSignals {
            keywords: strings(&["Software-Development", "systems_integrator"]),
            ..Default::default()
        };
        let scores = score_categories(&signals, "", &[]);
        assert_eq!(
            scores.negative_matches,
            strings(&["software development", "systems integrator"])
        );
        assert!((scores.context_penalty - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_medium_requires_mild_penalty_when_negatives_present() {
        // One negative phrase: penalty 0.8 keeps medium.
        let mild = EnrichmentSignals {
            services: strings(&["IT support"]),
            description: Some("Also offers web design.".to_string()),
            ..Default::default()
        };
        let result = classify(&mild, "Acme Ltd", &[]);
        assert_eq!(result.score, 26);
        assert_eq!(result.confidence, Confidence::Medium);

        // Three negative phrases: penalty 0.4 drops to low at a similar score.
        let heavy = EnrichmentSignals {
            services: strings(&["IT support"]),
            description: Some("Bespoke software, web design and app development.".to_string()),
            ..Default::default()
        };
        let result = classify(&heavy, "Acme Ltd", &[]);
        assert_eq!(result.score, 25);
        assert_eq!(result.confidence, Confidence::Low);
    }
}

#[cfg(test)]
mod specialization_tests {
    use super::*;

    #[test]
    fn test_backup_only_provider_is_flagged_without_scoring() {
        let backup_only = EnrichmentSignals {
            services: strings(&["Cloud backup", "Disaster recovery"]),
            ..Default::default()
        };
        let result = classify(&backup_only, "Vaultline Ltd", &[]);
        let flag = result.indicator(IndicatorCategory::SpecializedMsp).unwrap();

        assert!(result.is_specialized());
        assert_eq!(flag.evidence, strings(&["backup"]));

        // The flag does not change the score.
        let scores = score_categories(&backup_only, "Vaultline Ltd", &[]);
        assert_eq!(u8::try_from(scores.total().round() as i64).unwrap(), result.score);
    }

    #[test]
    fn test_security_only_provider_is_flagged() {
        let security_only = EnrichmentSignals {
            services: strings(&["Penetration testing", "Managed security"]),
            ..Default::default()
        };
        let result = classify(&security_only, "Redline Cyber Ltd", &[]);
        let flag = result.indicator(IndicatorCategory::SpecializedMsp).unwrap();
        assert_eq!(flag.evidence, strings(&["security"]));
    }
}

#[cfg(test)]
mod idempotence_tests {
    use super::*;

    #[test]
    fn test_classification_is_deterministic() {
        let codes = strings(&["62020"]);
        let first = classify(&typical_msp_signals(), "Northgate Technology Ltd", &codes);
        let second = classify(&typical_msp_signals(), "Northgate Technology Ltd", &codes);
        assert_eq!(first, second);
    }
}
