//! Gene symbol validation.
//!
//! Pathways routinely reference genes outside the user's query. Before such
//! genes join a store they are validated against a lookup service that
//! returns the recognized subset with canonical symbol forms. Symbols the
//! service does not return are implicitly invalid; there is no error state
//! and no retry.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneInfo {
    pub hugo_gene_symbol: String,
    pub entrez_gene_id: i64,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Validation service seam.
pub trait GeneLookup: Send + Sync {
    /// The recognized subset of `symbols`, each in canonical form.
    fn fetch_genes(&self, symbols: &[String]) -> Result<Vec<GeneInfo>>;
}

/// Result of one validation fetch, tagged with what was asked for so the
/// consumer can record unreturned symbols as invalid.
#[derive(Debug, Clone)]
pub struct GeneLookupResult {
    pub requested: Vec<String>,
    pub genes: Vec<GeneInfo>,
}

/// Run one validation fetch on a worker thread. A fetch failure drops the
/// sender without a result; the consumer observes the disconnect and treats
/// the batch as unresolved.
pub fn spawn_lookup(
    lookup: Arc<dyn GeneLookup>,
    symbols: Vec<String>,
) -> Receiver<GeneLookupResult> {
    let (tx, rx) = channel();
    thread::spawn(move || {
        if let Ok(genes) = lookup.fetch_genes(&symbols) {
            let _ = tx.send(GeneLookupResult {
                requested: symbols,
                genes,
            });
        }
    });
    rx
}

/// Lookup over an in-memory catalog, used offline and in tests. Symbols
/// match case-insensitively against canonical names and aliases.
pub struct CatalogGeneLookup {
    by_key: HashMap<String, GeneInfo>,
}

impl CatalogGeneLookup {
    pub fn new(catalog: &[GeneInfo]) -> Self {
        let mut by_key = HashMap::new();
        for gene in catalog {
            by_key.insert(gene.hugo_gene_symbol.to_ascii_uppercase(), gene.clone());
            for alias in &gene.aliases {
                by_key
                    .entry(alias.to_ascii_uppercase())
                    .or_insert_with(|| gene.clone());
            }
        }
        Self { by_key }
    }
}

impl GeneLookup for CatalogGeneLookup {
    fn fetch_genes(&self, symbols: &[String]) -> Result<Vec<GeneInfo>> {
        let mut found = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for symbol in symbols {
            if let Some(gene) = self.by_key.get(&symbol.to_ascii_uppercase()) {
                if seen.insert(gene.hugo_gene_symbol.clone()) {
                    found.push(gene.clone());
                }
            }
        }
        Ok(found)
    }
}

/// Lookup against a portal HTTP endpoint. Always run behind [`spawn_lookup`];
/// the client blocks.
pub struct HttpGeneLookup {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpGeneLookup {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl GeneLookup for HttpGeneLookup {
    fn fetch_genes(&self, symbols: &[String]) -> Result<Vec<GeneInfo>> {
        let url = format!("{}/genes/fetch", self.base_url);
        let genes = self
            .client
            .post(url)
            .json(symbols)
            .send()?
            .error_for_status()?
            .json::<Vec<GeneInfo>>()?;
        Ok(genes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn catalog() -> Vec<GeneInfo> {
        vec![
            GeneInfo {
                hugo_gene_symbol: "TP53".to_string(),
                entrez_gene_id: 7157,
                aliases: vec!["P53".to_string()],
            },
            GeneInfo {
                hugo_gene_symbol: "MDM2".to_string(),
                entrez_gene_id: 4193,
                aliases: vec![],
            },
        ]
    }

    #[test]
    fn test_catalog_lookup_filters_unknown() {
        let lookup = CatalogGeneLookup::new(&catalog());
        let found = lookup
            .fetch_genes(&["TP53".to_string(), "NOSUCHGENE".to_string()])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].hugo_gene_symbol, "TP53");
    }

    #[test]
    fn test_catalog_lookup_canonicalizes() {
        let lookup = CatalogGeneLookup::new(&catalog());
        let found = lookup
            .fetch_genes(&["p53".to_string(), "mdm2".to_string()])
            .unwrap();
        let symbols: Vec<&str> = found.iter().map(|g| g.hugo_gene_symbol.as_str()).collect();
        assert_eq!(symbols, vec!["TP53", "MDM2"]);
    }

    #[test]
    fn test_alias_and_canonical_dedupe() {
        let lookup = CatalogGeneLookup::new(&catalog());
        let found = lookup
            .fetch_genes(&["TP53".to_string(), "P53".to_string()])
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_spawn_lookup_delivers_result() {
        let lookup: Arc<dyn GeneLookup> = Arc::new(CatalogGeneLookup::new(&catalog()));
        let rx = spawn_lookup(lookup, vec!["TP53".to_string(), "BOGUS".to_string()]);
        let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result.requested.len(), 2);
        assert_eq!(result.genes.len(), 1);
    }
}
