//! Alteration data accumulation for the pathway tab.
//!
//! The accumulator owns the session's valid-gene set and the growing list of
//! alteration records for genes outside the original query. Pathway
//! selections feed it gene lists; unknown symbols are validated on a worker
//! thread, validated non-query genes get a secondary result store scoped to
//! the enlarged gene list, and once that store is fully ready its records are
//! appended and the merged list is published to the diagram.
//!
//! Records accumulated for earlier selections are never removed, reordered,
//! or deduplicated; a gene re-included by a later pathway shows up again.
//! Observed behavior of the production portal, kept on purpose (see
//! DESIGN.md).

use crate::alteration::{AlterationRecord, CaseGranularity};
use crate::diagram_bridge::DiagramBridge;
use crate::gene_lookup::{spawn_lookup, GeneLookup, GeneLookupResult};
use crate::message::{MessageBox, MessageState};
use crate::store::{DataFetcher, ResultStore, StoreQuery};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

pub struct AlterationAccumulator {
    fetcher: Arc<dyn DataFetcher>,
    lookup: Arc<dyn GeneLookup>,
    query_genes: Vec<String>,
    /// Symbol validity, accumulated across the session; never shrinks.
    valid_genes: HashMap<String, bool>,
    /// Validated non-query genes in discovery order.
    non_query_genes: Vec<String>,
    /// Records for non-query genes, append-only.
    accumulated: Vec<AlterationRecord>,
    secondary: Option<ResultStore>,
    secondary_key: Option<String>,
    secondary_applied: bool,
    pending_lookup: Option<Receiver<GeneLookupResult>>,
    pending_symbols: HashSet<String>,
}

impl AlterationAccumulator {
    pub fn new(
        fetcher: Arc<dyn DataFetcher>,
        lookup: Arc<dyn GeneLookup>,
        query_genes: &[String],
    ) -> Self {
        let mut valid_genes = HashMap::new();
        for gene in query_genes {
            valid_genes.insert(gene.to_ascii_uppercase(), true);
        }
        Self {
            fetcher,
            lookup,
            query_genes: query_genes.to_vec(),
            valid_genes,
            non_query_genes: Vec::new(),
            accumulated: Vec::new(),
            secondary: None,
            secondary_key: None,
            secondary_applied: false,
            pending_lookup: None,
            pending_symbols: HashSet::new(),
        }
    }

    pub fn query_genes(&self) -> &[String] {
        &self.query_genes
    }

    /// Validity table exposed to the diagram collaborator.
    pub fn validity_table(&self) -> &HashMap<String, bool> {
        &self.valid_genes
    }

    /// Query genes plus validated non-query genes, the diagram's gene list.
    pub fn current_gene_list(&self) -> Vec<String> {
        self.enlarged_genes()
    }

    pub fn has_pending_lookup(&self) -> bool {
        self.pending_lookup.is_some()
    }

    /// A secondary store exists whose records have not been applied yet.
    pub fn is_loading(&self) -> bool {
        self.pending_lookup.is_some()
            || self
                .secondary
                .as_ref()
                .is_some_and(|_| !self.secondary_applied)
    }

    pub fn accumulated(&self) -> &[AlterationRecord] {
        &self.accumulated
    }

    /// A pathway was selected in the diagram; validate whatever we have not
    /// seen before. Known symbols (valid or invalid) and symbols already in
    /// flight are not refetched.
    pub fn on_pathway_genes(&mut self, genes: &[String]) {
        let unknown: Vec<String> = genes
            .iter()
            .filter(|gene| !gene.trim().is_empty())
            .map(|gene| gene.to_string())
            .unique_by(|gene| gene.to_ascii_uppercase())
            .filter(|gene| {
                let key = gene.to_ascii_uppercase();
                !self.valid_genes.contains_key(&key) && !self.pending_symbols.contains(&key)
            })
            .collect();
        if unknown.is_empty() {
            return;
        }
        for gene in &unknown {
            self.pending_symbols.insert(gene.to_ascii_uppercase());
        }
        self.pending_lookup = Some(spawn_lookup(self.lookup.clone(), unknown));
    }

    /// Genes the diagram added to the running query. They become query genes
    /// from now on; records already accumulated for them stay where they are.
    pub fn add_query_genes(&mut self, genes: &[String]) {
        for gene in genes {
            let key = gene.to_ascii_uppercase();
            if !self
                .query_genes
                .iter()
                .any(|g| g.eq_ignore_ascii_case(gene))
            {
                self.query_genes.push(gene.clone());
            }
            self.valid_genes.insert(key, true);
        }
    }

    /// Advance all pending work. Returns true when the merged list changed.
    pub fn poll(
        &mut self,
        primary: &ResultStore,
        bridge: &mut DiagramBridge,
        message: &mut MessageBox,
    ) -> bool {
        let mut changed = false;
        if self.poll_lookup(message) {
            changed = true;
        }
        if self.poll_secondary(primary, bridge, message) {
            changed = true;
        }
        changed
    }

    fn poll_lookup(&mut self, message: &mut MessageBox) -> bool {
        let Some(rx) = &self.pending_lookup else {
            return false;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.pending_lookup = None;
                self.apply_lookup_result(result, message)
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                // Fetch failed; the symbols stay unknown and may be fetched
                // again by a later selection.
                self.pending_symbols.clear();
                self.pending_lookup = None;
                false
            }
        }
    }

    fn apply_lookup_result(&mut self, result: GeneLookupResult, message: &mut MessageBox) -> bool {
        for key in result.requested.iter().map(|s| s.to_ascii_uppercase()) {
            self.pending_symbols.remove(&key);
        }

        let mut newly_valid = Vec::new();
        for gene in &result.genes {
            let key = gene.hugo_gene_symbol.to_ascii_uppercase();
            let was_valid = self.valid_genes.get(&key).copied().unwrap_or(false);
            self.valid_genes.insert(key, true);
            let in_query = self
                .query_genes
                .iter()
                .any(|g| g.eq_ignore_ascii_case(&gene.hugo_gene_symbol));
            let known = self
                .non_query_genes
                .iter()
                .any(|g| g.eq_ignore_ascii_case(&gene.hugo_gene_symbol));
            if !was_valid && !in_query && !known {
                self.non_query_genes.push(gene.hugo_gene_symbol.clone());
                newly_valid.push(gene.hugo_gene_symbol.clone());
            }
        }

        // Anything requested that the service did not recognize is recorded
        // as invalid so the same pathway does not refetch it.
        for requested in &result.requested {
            let recognized = result.genes.iter().any(|gene| {
                gene.hugo_gene_symbol.eq_ignore_ascii_case(requested)
                    || gene
                        .aliases
                        .iter()
                        .any(|alias| alias.eq_ignore_ascii_case(requested))
            });
            if !recognized {
                self.valid_genes
                    .entry(requested.to_ascii_uppercase())
                    .or_insert(false);
            }
        }

        if newly_valid.is_empty() {
            return false;
        }
        message.set_loading();
        self.rebuild_secondary();
        true
    }

    fn enlarged_genes(&self) -> Vec<String> {
        self.query_genes
            .iter()
            .chain(self.non_query_genes.iter())
            .cloned()
            .unique_by(|gene| gene.to_ascii_uppercase())
            .collect()
    }

    fn rebuild_secondary(&mut self) {
        let query = StoreQuery::new(&self.enlarged_genes());
        let key = query.key();
        if self.secondary_key.as_deref() == Some(key.as_str()) {
            return;
        }
        // Replacing the store drops the stale generation's receiver; late
        // results for it are never surfaced.
        self.secondary = Some(ResultStore::spawn(self.fetcher.clone(), query));
        self.secondary_key = Some(key);
        self.secondary_applied = false;
    }

    fn poll_secondary(
        &mut self,
        primary: &ResultStore,
        bridge: &mut DiagramBridge,
        message: &mut MessageBox,
    ) -> bool {
        let Some(store) = &mut self.secondary else {
            return false;
        };
        store.poll();
        if !store.is_ready() || self.secondary_applied {
            return false;
        }
        self.secondary_applied = true;

        let Some(records) = store.records(CaseGranularity::Patient) else {
            return false;
        };
        let query_keys: HashSet<String> = self
            .query_genes
            .iter()
            .map(|g| g.to_ascii_uppercase())
            .collect();
        self.accumulated.extend(
            records
                .into_iter()
                .filter(|record| !query_keys.contains(&record.gene.to_ascii_uppercase())),
        );

        if *message.state() == MessageState::Loading {
            message.reset();
        }
        bridge.publish(&self.merged(primary));
        true
    }

    /// Query-gene records recomputed from the primary store, then the
    /// accumulated non-query records in discovery order.
    pub fn merged(&self, primary: &ResultStore) -> Vec<AlterationRecord> {
        let mut merged = primary
            .records(CaseGranularity::Patient)
            .unwrap_or_default();
        merged.extend(self.accumulated.iter().cloned());
        merged
    }
}
