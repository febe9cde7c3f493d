//! Versioned configuration table for the MSP likelihood classifier.
//!
//! Every term list, weight and threshold the classifier uses lives here so a
//! category's contribution can be tuned and tested on its own. Bump
//! `version` whenever any value changes; persisted classifications record
//! both the version and the table fingerprint.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Weighted evidence category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRule {
    /// Maximum points the category contributes.
    pub weight: f64,
    pub terms: &'static [&'static str],
}

/// Confidence tier thresholds.
#[derive(Debug, Clone, Serialize)]
pub struct ConfidenceThresholds {
    pub high_score: f64,
    pub medium_score: f64,
    /// Minimum context penalty for "medium" when any negative phrase matched.
    pub medium_min_penalty_with_negatives: f64,
    /// Minimum context penalty for "medium" otherwise.
    pub medium_min_penalty: f64,
}

/// Negative-context penalty parameters: `max(floor, 1 - per_match * matches)`.
#[derive(Debug, Clone, Serialize)]
pub struct PenaltyRule {
    pub per_match: f64,
    pub floor: f64,
    pub phrases: &'static [&'static str],
}

/// Terms that identify a narrowly specialised provider.
#[derive(Debug, Clone, Serialize)]
pub struct SpecializationRule {
    pub backup_terms: &'static [&'static str],
    pub security_terms: &'static [&'static str],
    /// Broad infrastructure/helpdesk evidence that rules the flag out.
    pub broad_terms: &'static [&'static str],
}

/// Complete classifier configuration.
#[derive(Debug, Clone, Serialize)]
pub struct MspVocabulary {
    pub version: &'static str,
    pub keywords: CategoryRule,
    pub services: CategoryRule,
    pub vendors: CategoryRule,
    /// Regex patterns over the description; `terms` holds pattern sources.
    pub description_patterns: CategoryRule,
    pub industry_bonus: f64,
    pub negative_context: PenaltyRule,
    pub confidence: ConfidenceThresholds,
    pub specialization: SpecializationRule,
}

impl MspVocabulary {
    /// Hex SHA-256 of the table's canonical JSON serialisation.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_string(self)
            .expect("vocabulary table contains only strings and finite numbers");
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Total achievable points across all categories.
    pub fn max_score(&self) -> f64 {
        self.keywords.weight
            + self.services.weight
            + self.vendors.weight
            + self.description_patterns.weight
            + self.industry_bonus
    }
}

pub static MSP_VOCABULARY: MspVocabulary = MspVocabulary {
    version: "2024.1",
    keywords: CategoryRule {
        weight: 30.0,
        terms: &[
            "managed service",
            "managed it",
            "msp",
            "it support",
            "technical support",
            "helpdesk",
            "help desk",
            "service desk",
            "remote monitoring",
            "rmm",
            "network management",
            "network monitoring",
            "infrastructure management",
            "server management",
            "patch management",
            "endpoint management",
            "cloud services",
            "cloud hosting",
            "microsoft 365",
            "office 365",
            "backup",
            "disaster recovery",
            "business continuity",
            "cyber security",
            "cybersecurity",
            "it outsourcing",
            "proactive support",
            "sla",
        ],
    },
    services: CategoryRule {
        weight: 25.0,
        terms: &[
            "managed service",
            "managed it",
            "it support",
            "helpdesk",
            "help desk",
            "service desk",
            "remote monitoring",
            "network management",
            "infrastructure",
            "server management",
            "patch management",
            "endpoint",
            "cloud",
            "hosting",
            "backup",
            "disaster recovery",
            "cyber security",
            "cybersecurity",
            "security operations",
            "voip",
            "connectivity",
        ],
    },
    vendors: CategoryRule {
        weight: 20.0,
        terms: &[
            "microsoft",
            "azure",
            "office 365",
            "cisco",
            "meraki",
            "vmware",
            "citrix",
            "dell",
            "hpe",
            "lenovo",
            "fortinet",
            "sophos",
            "watchguard",
            "sonicwall",
            "palo alto",
            "datto",
            "veeam",
            "acronis",
            "connectwise",
            "kaseya",
            "n able",
            "ninjaone",
            "solarwinds",
            "autotask",
            "halopsa",
            "mimecast",
            "eset",
            "aws",
        ],
    },
    description_patterns: CategoryRule {
        weight: 15.0,
        terms: &[
            r"\bmanaged (it )?services? provider\b",
            r"\bfully managed\b",
            r"\b(24/7|24x7|round the clock) (support|monitoring)\b",
            r"\bproactive (it )?(support|monitoring|maintenance)\b",
            r"\b(outsourced|external) it (department|team|support)\b",
            r"\bit support (for|to) (small|medium|smes?|businesses)\b",
            r"\bfixed (monthly|price) (fee|support|contract)s?\b",
            r"\bservice level agreements?\b",
            r"\b(remote|on site|onsite) (support|engineers?)\b",
            r"\b(it|technology) partner\b",
        ],
    },
    industry_bonus: 10.0,
    negative_context: PenaltyRule {
        per_match: 0.2,
        floor: 0.3,
        phrases: &[
            "software development",
            "software house",
            "bespoke software",
            "app development",
            "web development",
            "web design",
            "digital transformation",
            "digital agency",
            "systems integrator",
            "management consultancy",
            "it recruitment",
            "recruitment agency",
            "training provider",
            "saas platform",
            "game development",
        ],
    },
    confidence: ConfidenceThresholds {
        high_score: 30.0,
        medium_score: 15.0,
        medium_min_penalty_with_negatives: 0.6,
        medium_min_penalty: 0.3,
    },
    specialization: SpecializationRule {
        backup_terms: &["backup", "disaster recovery", "business continuity"],
        security_terms: &[
            "cyber security",
            "cybersecurity",
            "penetration testing",
            "managed security",
            "security operations",
            "siem",
        ],
        broad_terms: &[
            "infrastructure",
            "helpdesk",
            "help desk",
            "service desk",
            "it support",
            "managed it",
            "network management",
        ],
    },
};
