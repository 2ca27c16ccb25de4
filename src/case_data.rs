//! Query tracks and per-case alteration data.
//!
//! An OQL line describes one track of the query: either a single gene or a
//! merged group of genes displayed as one track. Case data is aggregated per
//! line, keyed by the unique sample/patient keys the portal assigns.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub type SampleKey = String;
pub type PatientKey = String;
pub type ProfileId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OqlLine {
    Gene {
        gene: String,
    },
    MergedTrack {
        #[serde(default)]
        label: Option<String>,
        genes: Vec<String>,
    },
}

impl OqlLine {
    pub fn single(gene: &str) -> Self {
        Self::Gene {
            gene: gene.to_string(),
        }
    }

    pub fn merged(label: Option<&str>, genes: &[&str]) -> Self {
        Self::MergedTrack {
            label: label.map(|l| l.to_string()),
            genes: genes.iter().map(|g| g.to_string()).collect(),
        }
    }

    /// Gene symbols covered by this line, in track order.
    pub fn genes(&self) -> Vec<String> {
        match self {
            Self::Gene { gene } => vec![gene.clone()],
            Self::MergedTrack { genes, .. } => genes.clone(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Gene { gene } => gene.clone(),
            Self::MergedTrack { label, genes } => label
                .clone()
                .unwrap_or_else(|| genes.join(" / ")),
        }
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, Self::MergedTrack { .. })
    }
}

/// One alteration observed in one case for one gene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlterationEvent {
    pub gene: String,
    pub molecular_profile_id: ProfileId,
    pub alteration: String,
}

/// Alterations for one OQL line, aggregated by case key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseAggregatedData {
    #[serde(default)]
    pub samples: HashMap<SampleKey, Vec<AlterationEvent>>,
    #[serde(default)]
    pub patients: HashMap<PatientKey, Vec<AlterationEvent>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OqlTrackData {
    pub oql: OqlLine,
    pub cases: CaseAggregatedData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub sample_id: String,
    pub study_id: String,
    pub unique_sample_key: SampleKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: String,
    pub study_id: String,
    pub unique_patient_key: PatientKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MolecularProfile {
    pub molecular_profile_id: ProfileId,
    pub name: String,
}

/// Which molecular profiles cover each case. A case without an entry for a
/// profile was never assayed on it, so events attributed to that profile are
/// not counted for the case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageInformation {
    #[serde(default)]
    pub samples: HashMap<SampleKey, HashSet<ProfileId>>,
    #[serde(default)]
    pub patients: HashMap<PatientKey, HashSet<ProfileId>>,
}

impl CoverageInformation {
    pub fn sample_covered(&self, key: &str, profile_id: &str) -> bool {
        self.samples
            .get(key)
            .is_some_and(|profiles| profiles.contains(profile_id))
    }

    pub fn patient_covered(&self, key: &str, profile_id: &str) -> bool {
        self.patients
            .get(key)
            .is_some_and(|profiles| profiles.contains(profile_id))
    }
}

/// Case keys with sequencing data, per gene. Sample and patient granularity
/// are kept as separate maps since they come from separate portal endpoints.
pub type SequencedKeysByGene = HashMap<String, HashSet<String>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oql_line_genes() {
        let single = OqlLine::single("TP53");
        assert_eq!(single.genes(), vec!["TP53".to_string()]);
        assert_eq!(single.label(), "TP53");
        assert!(!single.is_merged());

        let merged = OqlLine::merged(Some("RTK"), &["EGFR", "ERBB2"]);
        assert_eq!(
            merged.genes(),
            vec!["EGFR".to_string(), "ERBB2".to_string()]
        );
        assert_eq!(merged.label(), "RTK");
        assert!(merged.is_merged());

        let unlabeled = OqlLine::merged(None, &["EGFR", "ERBB2"]);
        assert_eq!(unlabeled.label(), "EGFR / ERBB2");
    }

    #[test]
    fn test_coverage_lookup() {
        let mut coverage = CoverageInformation::default();
        coverage
            .patients
            .entry("P1".to_string())
            .or_default()
            .insert("study_mutations".to_string());
        assert!(coverage.patient_covered("P1", "study_mutations"));
        assert!(!coverage.patient_covered("P1", "study_cna"));
        assert!(!coverage.patient_covered("P2", "study_mutations"));
        assert!(!coverage.sample_covered("P1", "study_mutations"));
    }

    #[test]
    fn test_oql_line_serde() {
        let merged = OqlLine::merged(None, &["EGFR", "ERBB2"]);
        let json = serde_json::to_string(&merged).unwrap();
        let back: OqlLine = serde_json::from_str(&json).unwrap();
        assert_eq!(merged, back);
    }
}
