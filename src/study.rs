//! Study documents: the offline data source behind the fetcher seam.
//!
//! A study document bundles everything the portal would serve for one result
//! view: cases, coverage, sequencing keys, alteration calls, a gene catalog
//! for symbol validation, and curated pathway gene sets. A small demo study
//! ships embedded so the app opens with data, like the demo sequences the
//! original desktop tools load at startup.

use crate::case_data::{
    AlterationEvent, CaseAggregatedData, CoverageInformation, MolecularProfile, OqlLine,
    OqlTrackData, Patient, Sample, SequencedKeysByGene,
};
use crate::gene_lookup::GeneInfo;
use crate::store::{DataFetcher, StoreQuery};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One alteration call in a study file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyAlteration {
    pub gene: String,
    pub molecular_profile_id: String,
    pub sample_key: String,
    pub patient_key: String,
    pub alteration: String,
}

/// A curated pathway gene set. Relevance scores are computed against the
/// current overlay, not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathwayDef {
    pub name: String,
    pub genes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyDocument {
    pub name: String,
    pub query_genes: Vec<String>,
    pub samples: Vec<Sample>,
    pub patients: Vec<Patient>,
    pub molecular_profiles: Vec<MolecularProfile>,
    pub coverage: CoverageInformation,
    pub sequenced_sample_keys_by_gene: SequencedKeysByGene,
    pub sequenced_patient_keys_by_gene: SequencedKeysByGene,
    pub alterations: Vec<StudyAlteration>,
    pub gene_catalog: Vec<GeneInfo>,
    pub pathways: Vec<PathwayDef>,
}

impl StudyDocument {
    pub fn from_json_str(data: &str) -> Result<Self> {
        serde_json::from_str(data).context("Invalid study JSON")
    }

    pub fn load_from_path(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Could not read study file '{path}'"))?;
        Self::from_json_str(&text)
    }

    pub fn save_to_path(&self, path: &str) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(Path::new(path), text)
            .with_context(|| format!("Could not write study file '{path}'"))?;
        Ok(())
    }

    pub fn demo() -> Self {
        Self::from_json_str(include_str!("../assets/demo_study.json"))
            .expect("Embedded demo study is invalid")
    }
}

/// Fetcher over an in-memory study document.
pub struct InMemoryFetcher {
    study: StudyDocument,
}

impl InMemoryFetcher {
    pub fn new(study: StudyDocument) -> Self {
        Self { study }
    }

    pub fn study(&self) -> &StudyDocument {
        &self.study
    }

    fn keys_for_query(
        source: &SequencedKeysByGene,
        query: &StoreQuery,
    ) -> SequencedKeysByGene {
        query
            .genes
            .iter()
            .filter_map(|gene| {
                source
                    .get(gene)
                    .map(|keys| (gene.clone(), keys.clone()))
            })
            .collect()
    }
}

impl DataFetcher for InMemoryFetcher {
    fn samples(&self, _query: &StoreQuery) -> Result<Vec<Sample>> {
        Ok(self.study.samples.clone())
    }

    fn patients(&self, _query: &StoreQuery) -> Result<Vec<Patient>> {
        Ok(self.study.patients.clone())
    }

    fn coverage(&self, _query: &StoreQuery) -> Result<CoverageInformation> {
        Ok(self.study.coverage.clone())
    }

    fn sequenced_sample_keys_by_gene(&self, query: &StoreQuery) -> Result<SequencedKeysByGene> {
        Ok(Self::keys_for_query(
            &self.study.sequenced_sample_keys_by_gene,
            query,
        ))
    }

    fn sequenced_patient_keys_by_gene(&self, query: &StoreQuery) -> Result<SequencedKeysByGene> {
        Ok(Self::keys_for_query(
            &self.study.sequenced_patient_keys_by_gene,
            query,
        ))
    }

    fn selected_profiles(&self, _query: &StoreQuery) -> Result<Vec<MolecularProfile>> {
        Ok(self.study.molecular_profiles.clone())
    }

    /// One single-gene OQL line per queried gene, with the study's calls
    /// aggregated by case key.
    fn oql_track_data(&self, query: &StoreQuery) -> Result<Vec<OqlTrackData>> {
        let tracks = query
            .genes
            .iter()
            .map(|gene| {
                let mut cases = CaseAggregatedData::default();
                for call in self.study.alterations.iter().filter(|a| &a.gene == gene) {
                    let event = AlterationEvent {
                        gene: call.gene.clone(),
                        molecular_profile_id: call.molecular_profile_id.clone(),
                        alteration: call.alteration.clone(),
                    };
                    cases
                        .samples
                        .entry(call.sample_key.clone())
                        .or_default()
                        .push(event.clone());
                    cases
                        .patients
                        .entry(call.patient_key.clone())
                        .or_default()
                        .push(event);
                }
                OqlTrackData {
                    oql: OqlLine::Gene { gene: gene.clone() },
                    cases,
                }
            })
            .collect();
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alteration::CaseGranularity;
    use crate::store::ResultStore;

    #[test]
    fn test_demo_study_loads() {
        let study = StudyDocument::demo();
        assert_eq!(study.query_genes, vec!["TP53", "MDM2", "CDKN2A"]);
        assert!(!study.samples.is_empty());
        assert_eq!(study.samples.len(), study.patients.len());
        assert!(!study.pathways.is_empty());
        assert!(study
            .pathways
            .iter()
            .any(|p| p.name == "MAPK signaling pathway"));
        // Every pathway gene the demo uses is resolvable in its catalog
        // except the deliberately unknown ones.
        assert!(study
            .gene_catalog
            .iter()
            .any(|g| g.hugo_gene_symbol == "EGFR"));
    }

    #[test]
    fn test_save_load_round_trip() {
        let study = StudyDocument::demo();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study.json");
        study.save_to_path(path.to_str().unwrap()).unwrap();
        let back = StudyDocument::load_from_path(path.to_str().unwrap()).unwrap();
        assert_eq!(back.name, study.name);
        assert_eq!(back.query_genes, study.query_genes);
        assert_eq!(back.alterations, study.alterations);
    }

    #[test]
    fn test_fetcher_scopes_to_query() {
        let fetcher = InMemoryFetcher::new(StudyDocument::demo());
        let query = StoreQuery::new(&["TP53".to_string()]);
        let keys = fetcher.sequenced_patient_keys_by_gene(&query).unwrap();
        assert!(keys.contains_key("TP53"));
        assert_eq!(keys.len(), 1);

        let tracks = fetcher.oql_track_data(&query).unwrap();
        assert_eq!(tracks.len(), 1);
        assert!(tracks[0]
            .cases
            .patients
            .values()
            .flatten()
            .all(|event| event.gene == "TP53"));
    }

    #[test]
    fn test_demo_query_records() {
        let fetcher = InMemoryFetcher::new(StudyDocument::demo());
        let query = StoreQuery::new(&fetcher.study().query_genes.clone());
        let store = ResultStore::load_blocking(&fetcher, query).unwrap();
        let records = store.records(CaseGranularity::Patient).unwrap();
        assert_eq!(records.len(), 3);
        let tp53 = records.iter().find(|r| r.gene == "TP53").unwrap();
        assert_eq!(tp53.altered, 3);
        assert_eq!(tp53.sequenced, 6);
        assert_eq!(tp53.percent_altered, 50.0);
    }

    #[test]
    fn test_unknown_gene_has_empty_track() {
        let fetcher = InMemoryFetcher::new(StudyDocument::demo());
        let query = StoreQuery::new(&["UNKNOWN1".to_string()]);
        let tracks = fetcher.oql_track_data(&query).unwrap();
        assert_eq!(tracks.len(), 1);
        assert!(tracks[0].cases.patients.is_empty());
    }
}
