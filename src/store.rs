//! Result stores: asynchronous holders for everything the pathway tab needs.
//!
//! A store is created for a gene list and filled by a background thread that
//! asks a [`DataFetcher`] for each part. Parts arrive independently over an
//! mpsc channel and land in [`RemoteCell`]s; the UI loop polls the store each
//! frame and derived computations run only once every cell is complete.

use crate::alteration::{records_for_track, AlterationRecord, CaseGranularity};
use crate::case_data::{
    CoverageInformation, MolecularProfile, OqlTrackData, Patient, Sample, SequencedKeysByGene,
};
use crate::remote_cell::RemoteCell;
use anyhow::Result;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

/// The gene list a store is scoped to, in query order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    pub genes: Vec<String>,
}

impl StoreQuery {
    pub fn new(genes: &[String]) -> Self {
        Self {
            genes: genes.to_vec(),
        }
    }

    /// Canonical key for deciding whether an existing store still matches.
    pub fn key(&self) -> String {
        self.genes.join(" ")
    }
}

/// Data source seam. The portal REST client sits behind this in production;
/// tests and the offline demo use an in-memory study.
pub trait DataFetcher: Send + Sync {
    fn samples(&self, query: &StoreQuery) -> Result<Vec<Sample>>;
    fn patients(&self, query: &StoreQuery) -> Result<Vec<Patient>>;
    fn coverage(&self, query: &StoreQuery) -> Result<CoverageInformation>;
    fn sequenced_sample_keys_by_gene(&self, query: &StoreQuery) -> Result<SequencedKeysByGene>;
    fn sequenced_patient_keys_by_gene(&self, query: &StoreQuery) -> Result<SequencedKeysByGene>;
    fn selected_profiles(&self, query: &StoreQuery) -> Result<Vec<MolecularProfile>>;
    fn oql_track_data(&self, query: &StoreQuery) -> Result<Vec<OqlTrackData>>;
}

enum StoreDelta {
    Samples(Vec<Sample>),
    Patients(Vec<Patient>),
    Coverage(CoverageInformation),
    SequencedSampleKeys(SequencedKeysByGene),
    SequencedPatientKeys(SequencedKeysByGene),
    SelectedProfiles(Vec<MolecularProfile>),
    Tracks(Vec<OqlTrackData>),
}

/// Asynchronous result store for one gene list.
///
/// Parts that fail to fetch simply never complete; the store then never
/// reports ready and dependent views show nothing for it, which is the
/// intended failure surface.
pub struct ResultStore {
    query: StoreQuery,
    samples: RemoteCell<Vec<Sample>>,
    patients: RemoteCell<Vec<Patient>>,
    coverage: RemoteCell<CoverageInformation>,
    sequenced_sample_keys_by_gene: RemoteCell<SequencedKeysByGene>,
    sequenced_patient_keys_by_gene: RemoteCell<SequencedKeysByGene>,
    selected_profiles: RemoteCell<Vec<MolecularProfile>>,
    tracks: RemoteCell<Vec<OqlTrackData>>,
    rx: Option<Receiver<StoreDelta>>,
}

impl ResultStore {
    fn empty(query: StoreQuery) -> Self {
        Self {
            query,
            samples: RemoteCell::default(),
            patients: RemoteCell::default(),
            coverage: RemoteCell::default(),
            sequenced_sample_keys_by_gene: RemoteCell::default(),
            sequenced_patient_keys_by_gene: RemoteCell::default(),
            selected_profiles: RemoteCell::default(),
            tracks: RemoteCell::default(),
            rx: None,
        }
    }

    /// Start filling a store on a background thread.
    pub fn spawn(fetcher: Arc<dyn DataFetcher>, query: StoreQuery) -> Self {
        let (tx, rx) = channel();
        let mut store = Self::empty(query);
        store.rx = Some(rx);

        let thread_query = store.query.clone();
        thread::spawn(move || {
            // Failed parts are skipped: the sender closing without them is
            // how the UI learns the store will never be ready.
            if let Ok(samples) = fetcher.samples(&thread_query) {
                let _ = tx.send(StoreDelta::Samples(samples));
            }
            if let Ok(patients) = fetcher.patients(&thread_query) {
                let _ = tx.send(StoreDelta::Patients(patients));
            }
            if let Ok(coverage) = fetcher.coverage(&thread_query) {
                let _ = tx.send(StoreDelta::Coverage(coverage));
            }
            if let Ok(keys) = fetcher.sequenced_sample_keys_by_gene(&thread_query) {
                let _ = tx.send(StoreDelta::SequencedSampleKeys(keys));
            }
            if let Ok(keys) = fetcher.sequenced_patient_keys_by_gene(&thread_query) {
                let _ = tx.send(StoreDelta::SequencedPatientKeys(keys));
            }
            if let Ok(profiles) = fetcher.selected_profiles(&thread_query) {
                let _ = tx.send(StoreDelta::SelectedProfiles(profiles));
            }
            if let Ok(tracks) = fetcher.oql_track_data(&thread_query) {
                let _ = tx.send(StoreDelta::Tracks(tracks));
            }
        });
        store
    }

    /// Fill a store synchronously. Used by the CLI and by tests.
    pub fn load_blocking(fetcher: &dyn DataFetcher, query: StoreQuery) -> Result<Self> {
        let mut store = Self::empty(query);
        store.samples.complete(fetcher.samples(&store.query)?);
        store.patients.complete(fetcher.patients(&store.query)?);
        store.coverage.complete(fetcher.coverage(&store.query)?);
        store
            .sequenced_sample_keys_by_gene
            .complete(fetcher.sequenced_sample_keys_by_gene(&store.query)?);
        store
            .sequenced_patient_keys_by_gene
            .complete(fetcher.sequenced_patient_keys_by_gene(&store.query)?);
        store
            .selected_profiles
            .complete(fetcher.selected_profiles(&store.query)?);
        store
            .tracks
            .complete(fetcher.oql_track_data(&store.query)?);
        Ok(store)
    }

    /// Drain pending deltas. Returns true if any cell changed.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.rx else {
            return false;
        };
        let mut changed = false;
        loop {
            match rx.try_recv() {
                Ok(delta) => {
                    changed = true;
                    match delta {
                        StoreDelta::Samples(v) => self.samples.complete(v),
                        StoreDelta::Patients(v) => self.patients.complete(v),
                        StoreDelta::Coverage(v) => self.coverage.complete(v),
                        StoreDelta::SequencedSampleKeys(v) => {
                            self.sequenced_sample_keys_by_gene.complete(v)
                        }
                        StoreDelta::SequencedPatientKeys(v) => {
                            self.sequenced_patient_keys_by_gene.complete(v)
                        }
                        StoreDelta::SelectedProfiles(v) => self.selected_profiles.complete(v),
                        StoreDelta::Tracks(v) => self.tracks.complete(v),
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.rx = None;
                    break;
                }
            }
        }
        changed
    }

    /// All cells complete, including the per-line case data.
    pub fn is_ready(&self) -> bool {
        self.samples.is_complete()
            && self.patients.is_complete()
            && self.coverage.is_complete()
            && self.sequenced_sample_keys_by_gene.is_complete()
            && self.sequenced_patient_keys_by_gene.is_complete()
            && self.selected_profiles.is_complete()
            && self.tracks.is_complete()
    }

    pub fn query(&self) -> &StoreQuery {
        &self.query
    }

    pub fn samples(&self) -> Option<&Vec<Sample>> {
        self.samples.result()
    }

    pub fn patients(&self) -> Option<&Vec<Patient>> {
        self.patients.result()
    }

    pub fn coverage(&self) -> Option<&CoverageInformation> {
        self.coverage.result()
    }

    pub fn selected_profiles(&self) -> Option<&Vec<MolecularProfile>> {
        self.selected_profiles.result()
    }

    pub fn tracks(&self) -> Option<&Vec<OqlTrackData>> {
        self.tracks.result()
    }

    /// One record per gene per OQL line, or None while any part is pending.
    pub fn records(&self, granularity: CaseGranularity) -> Option<Vec<AlterationRecord>> {
        if !self.is_ready() {
            return None;
        }
        let coverage = self.coverage.result()?;
        let by_sample = self.sequenced_sample_keys_by_gene.result()?;
        let by_patient = self.sequenced_patient_keys_by_gene.result()?;
        let profiles = self.selected_profiles.result()?;
        let records = self
            .tracks
            .result()?
            .iter()
            .flat_map(|track| {
                records_for_track(
                    granularity,
                    track,
                    coverage,
                    by_sample,
                    by_patient,
                    profiles,
                )
            })
            .collect();
        Some(records)
    }
}
