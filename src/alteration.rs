//! Per-gene alteration frequency records.
//!
//! A record counts how many cases carry at least one alteration on a track
//! against how many cases were sequenced for the track's genes. Records are
//! immutable once produced; the accumulator concatenates them, it never edits
//! them in place.

use crate::case_data::{
    CoverageInformation, MolecularProfile, OqlTrackData, SequencedKeysByGene,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterationRecord {
    pub gene: String,
    pub altered: usize,
    pub sequenced: usize,
    pub percent_altered: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseGranularity {
    Sample,
    Patient,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackAlterationInfo {
    pub altered: usize,
    pub sequenced: usize,
    pub percent: f64,
}

/// Altered/sequenced counts for one OQL line.
///
/// A case counts as altered when it carries at least one event whose profile
/// is among the selected profiles and actually covers the case. Sequenced is
/// the union of sequenced case keys over the line's genes.
pub fn alteration_info_for_track(
    granularity: CaseGranularity,
    track: &OqlTrackData,
    coverage: &CoverageInformation,
    sequenced_sample_keys_by_gene: &SequencedKeysByGene,
    sequenced_patient_keys_by_gene: &SequencedKeysByGene,
    selected_profiles: &[MolecularProfile],
) -> TrackAlterationInfo {
    let genes = track.oql.genes();
    let sequenced_by_gene = match granularity {
        CaseGranularity::Sample => sequenced_sample_keys_by_gene,
        CaseGranularity::Patient => sequenced_patient_keys_by_gene,
    };
    let sequenced: HashSet<&String> = genes
        .iter()
        .filter_map(|gene| sequenced_by_gene.get(gene))
        .flatten()
        .collect();

    let selected_ids: HashSet<&str> = selected_profiles
        .iter()
        .map(|p| p.molecular_profile_id.as_str())
        .collect();
    let cases = match granularity {
        CaseGranularity::Sample => &track.cases.samples,
        CaseGranularity::Patient => &track.cases.patients,
    };
    let altered = cases
        .iter()
        .filter(|(key, events)| {
            events.iter().any(|event| {
                let covered = match granularity {
                    CaseGranularity::Sample => {
                        coverage.sample_covered(key, &event.molecular_profile_id)
                    }
                    CaseGranularity::Patient => {
                        coverage.patient_covered(key, &event.molecular_profile_id)
                    }
                };
                covered && selected_ids.contains(event.molecular_profile_id.as_str())
            })
        })
        .count();

    let percent = if sequenced.is_empty() {
        0.0
    } else {
        altered as f64 * 100.0 / sequenced.len() as f64
    };
    TrackAlterationInfo {
        altered,
        sequenced: sequenced.len(),
        percent,
    }
}

/// One record per gene of the line, all sharing the line's counts.
pub fn records_for_track(
    granularity: CaseGranularity,
    track: &OqlTrackData,
    coverage: &CoverageInformation,
    sequenced_sample_keys_by_gene: &SequencedKeysByGene,
    sequenced_patient_keys_by_gene: &SequencedKeysByGene,
    selected_profiles: &[MolecularProfile],
) -> Vec<AlterationRecord> {
    let info = alteration_info_for_track(
        granularity,
        track,
        coverage,
        sequenced_sample_keys_by_gene,
        sequenced_patient_keys_by_gene,
        selected_profiles,
    );
    track
        .oql
        .genes()
        .into_iter()
        .map(|gene| AlterationRecord {
            gene,
            altered: info.altered,
            sequenced: info.sequenced,
            percent_altered: info.percent,
        })
        .collect()
}
