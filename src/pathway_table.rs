//! Ranked pathway table.
//!
//! Lists pathways with a relevance score and matched genes. One pathway is
//! selectable at a time through a radio control; sorting, filtering and the
//! fixed ten-row pagination are handled here so the egui layer stays thin.
//! Long names and gene lists are truncated for display with the full text on
//! hover; gene lists are cut at gene boundaries only.

use crate::alteration::AlterationRecord;
use anyhow::Result;
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs::File;
use std::path::Path;

pub const PAGE_SIZE: usize = 10;
pub const LENGTH_THRESHOLD: usize = 13;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayRow {
    pub name: String,
    pub score: f64,
    pub genes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathwayColumn {
    Name,
    Score,
    Genes,
}

impl PathwayColumn {
    pub fn header(self) -> &'static str {
        match self {
            Self::Name => "Pathway name",
            Self::Score => "Score",
            Self::Genes => "Genes matched",
        }
    }

    pub const ALL: [Self; 3] = [Self::Name, Self::Score, Self::Genes];
}

/// Display truncation: anything at or past the threshold is cut to the first
/// `threshold` characters plus an ellipsis.
pub fn truncate_text(text: &str, threshold: usize) -> String {
    if text.chars().count() < threshold {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(threshold).collect();
        out.push_str("...");
        out
    }
}

/// Gene-list truncation at gene boundaries. The running length including
/// separating spaces stays strictly below the threshold; a gene that does not
/// fit is dropped whole, never cut mid-symbol. Dropping anything appends the
/// ellipsis marker, so an oversize first gene yields just the marker.
pub fn truncate_gene_list(genes: &[String], threshold: usize) -> String {
    let mut out = String::new();
    let mut truncated = false;
    for gene in genes {
        let candidate = if out.is_empty() {
            gene.chars().count()
        } else {
            out.chars().count() + 1 + gene.chars().count()
        };
        if candidate >= threshold {
            truncated = true;
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(gene);
    }
    if truncated {
        out.push_str("...");
    }
    out
}

/// Two-decimal display form, "3" -> "3.00".
pub fn score_display(score: f64) -> String {
    format!("{score:.2}")
}

/// Plain decimal form used for filtering and download, "3" -> "3".
pub fn score_plain(score: f64) -> String {
    format!("{score}")
}

pub struct PathwayTableView {
    rows: Vec<PathwayRow>,
    selected: String,
    sort_column: PathwayColumn,
    sort_ascending: bool,
    filter: String,
    page: usize,
    length_threshold: usize,
}

impl Default for PathwayTableView {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            selected: String::new(),
            sort_column: PathwayColumn::Name,
            sort_ascending: true,
            filter: String::new(),
            page: 0,
            length_threshold: LENGTH_THRESHOLD,
        }
    }
}

impl PathwayTableView {
    pub fn new(rows: Vec<PathwayRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> &[PathwayRow] {
        &self.rows
    }

    pub fn set_rows(&mut self, rows: Vec<PathwayRow>) {
        self.rows = rows;
        self.page = 0;
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected == name
    }

    /// Exclusive selection; fires the callback once with the row name.
    pub fn select(&mut self, name: &str, on_change: &mut dyn FnMut(&str)) {
        self.selected = name.to_string();
        on_change(name);
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.to_string();
        self.page = 0;
    }

    pub fn sort_column(&self) -> PathwayColumn {
        self.sort_column
    }

    /// Clicking the active column flips the order, any other column sorts
    /// ascending.
    pub fn toggle_sort(&mut self, column: PathwayColumn) {
        if self.sort_column == column {
            self.sort_ascending = !self.sort_ascending;
        } else {
            self.sort_column = column;
            self.sort_ascending = true;
        }
    }

    fn matches_filter(&self, row: &PathwayRow) -> bool {
        if self.filter.is_empty() {
            return true;
        }
        let needle = self.filter.to_uppercase();
        row.name.to_uppercase().contains(&needle) || score_plain(row.score).contains(&needle)
    }

    fn compare(column: PathwayColumn, a: &PathwayRow, b: &PathwayRow) -> Ordering {
        match column {
            PathwayColumn::Name => a.name.cmp(&b.name),
            PathwayColumn::Score => a.score.total_cmp(&b.score),
            PathwayColumn::Genes => a.genes.cmp(&b.genes),
        }
    }

    /// Filtered and sorted rows, all pages.
    pub fn visible_rows(&self) -> Vec<&PathwayRow> {
        let mut rows: Vec<&PathwayRow> =
            self.rows.iter().filter(|r| self.matches_filter(r)).collect();
        rows.sort_by(|a, b| {
            let ordering = Self::compare(self.sort_column, a, b);
            if self.sort_ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        rows
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.visible_rows().len().div_ceil(PAGE_SIZE).max(1)
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.min(self.page_count() - 1);
    }

    pub fn page_rows(&self) -> Vec<&PathwayRow> {
        self.visible_rows()
            .into_iter()
            .skip(self.page * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect()
    }

    /// Plain-text rendering used for download/export, independent of the
    /// truncated display forms.
    pub fn download_text(row: &PathwayRow, column: PathwayColumn) -> String {
        match column {
            PathwayColumn::Name => row.name.clone(),
            PathwayColumn::Score => score_plain(row.score),
            PathwayColumn::Genes => row.genes.join(","),
        }
    }

    /// Write all filtered rows (every page) as CSV.
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(PathwayColumn::ALL.map(|c| c.header()))?;
        for row in self.visible_rows() {
            csv_writer.write_record(
                PathwayColumn::ALL.map(|column| Self::download_text(row, column)),
            )?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn export_csv(&self, path: &Path) -> Result<()> {
        self.write_csv(File::create(path)?)
    }

    pub fn render(&mut self, ui: &mut egui::Ui, on_select: &mut dyn FnMut(&str)) {
        ui.horizontal(|ui| {
            ui.label("Filter:");
            let response = ui.text_edit_singleline(&mut self.filter);
            if response.changed() {
                self.page = 0;
            }
        });

        let page_rows: Vec<PathwayRow> = self.page_rows().into_iter().cloned().collect();
        let mut clicked: Option<String> = None;
        let mut sort_clicked: Option<PathwayColumn> = None;

        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(140.0))
            .column(Column::auto().at_least(60.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                for column in PathwayColumn::ALL {
                    header.col(|ui| {
                        let marker = if self.sort_column == column {
                            if self.sort_ascending { " ▲" } else { " ▼" }
                        } else {
                            ""
                        };
                        if ui
                            .button(format!("{}{marker}", column.header()))
                            .clicked()
                        {
                            sort_clicked = Some(column);
                        }
                    });
                }
            })
            .body(|mut body| {
                for row in &page_rows {
                    body.row(18.0, |mut table_row| {
                        table_row.col(|ui| {
                            let checked = self.is_selected(&row.name);
                            let label = truncate_text(&row.name, self.length_threshold);
                            if ui
                                .radio(checked, label)
                                .on_hover_text(&row.name)
                                .clicked()
                            {
                                clicked = Some(row.name.clone());
                            }
                        });
                        table_row.col(|ui| {
                            ui.label(score_display(row.score));
                        });
                        table_row.col(|ui| {
                            ui.label(truncate_gene_list(&row.genes, self.length_threshold))
                                .on_hover_text(row.genes.join(" "));
                        });
                    });
                }
            });

        if let Some(column) = sort_clicked {
            self.toggle_sort(column);
        }
        if let Some(name) = clicked {
            self.select(&name, on_select);
        }

        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.page > 0, egui::Button::new("◀"))
                .clicked()
            {
                self.page -= 1;
            }
            ui.label(format!("Page {} of {}", self.page + 1, self.page_count()));
            if ui
                .add_enabled(self.page + 1 < self.page_count(), egui::Button::new("▶"))
                .clicked()
            {
                self.page += 1;
            }
        });
    }
}

/// Pathway rows ranked against the current overlay, for display while the
/// external diagram supplies none of its own: score is the number of matched
/// genes with any alteration, pathways ordered as given.
pub fn rows_with_match_scores(
    pathways: &[PathwayRow],
    records: &[AlterationRecord],
) -> Vec<PathwayRow> {
    pathways
        .iter()
        .map(|pathway| {
            let score = pathway
                .genes
                .iter()
                .filter(|gene| {
                    records
                        .iter()
                        .any(|r| r.gene.eq_ignore_ascii_case(gene) && r.altered > 0)
                })
                .count() as f64;
            PathwayRow {
                name: pathway.name.clone(),
                score,
                genes: pathway.genes.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<PathwayRow> {
        vec![
            PathwayRow {
                name: "MAPK signaling pathway".to_string(),
                score: 5.0,
                genes: vec!["TP53".to_string(), "MDM2".to_string()],
            },
            PathwayRow {
                name: "Cell Cycle".to_string(),
                score: 3.25,
                genes: vec!["CDKN2A".to_string(), "RB1".to_string()],
            },
            PathwayRow {
                name: "p53 signaling".to_string(),
                score: 12.0,
                genes: vec!["TP53".to_string()],
            },
        ]
    }

    #[test]
    fn test_truncate_text_threshold() {
        assert_eq!(truncate_text("short", 13), "short");
        // Length 13 with threshold 13 is already truncated.
        assert_eq!(truncate_text("exactly13char", 13), "exactly13char...");
        assert_eq!(
            truncate_text("MAPK signaling pathway", 13),
            "MAPK signalin..."
        );
        assert_eq!(truncate_text("twelve chars", 13), "twelve chars");
    }

    #[test]
    fn test_truncate_gene_list_word_boundary() {
        let genes: Vec<String> = ["TP53", "MDM2", "CDKN2A"]
            .iter()
            .map(|g| g.to_string())
            .collect();
        // "TP53 MDM2" is 9 chars, adding " CDKN2A" would reach 16.
        assert_eq!(truncate_gene_list(&genes, 13), "TP53 MDM2...");
        assert_eq!(truncate_gene_list(&genes, 20), "TP53 MDM2 CDKN2A");
    }

    #[test]
    fn test_truncate_gene_list_oversize_first_gene() {
        let genes = vec!["VERYLONGGENESYMBOL".to_string()];
        // The first gene alone busts the threshold: no partial symbol.
        assert_eq!(truncate_gene_list(&genes, 13), "...");
    }

    #[test]
    fn test_truncate_gene_list_strictly_below() {
        let genes: Vec<String> = ["ABCD", "EFGH"].iter().map(|g| g.to_string()).collect();
        // "ABCD EFGH" is exactly 9; with threshold 9 the second gene must go.
        assert_eq!(truncate_gene_list(&genes, 9), "ABCD...");
        assert_eq!(truncate_gene_list(&genes, 10), "ABCD EFGH");
    }

    #[test]
    fn test_score_display_two_decimals() {
        assert_eq!(score_display(3.0), "3.00");
        assert_eq!(score_display(3.256), "3.26");
        assert_eq!(score_plain(3.0), "3");
        assert_eq!(score_plain(3.25), "3.25");
    }

    #[test]
    fn test_filter_on_name_and_score() {
        let mut table = PathwayTableView::new(rows());
        table.set_filter("mapk");
        assert_eq!(table.visible_rows().len(), 1);
        table.set_filter("3.25");
        let visible = table.visible_rows();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Cell Cycle");
        table.set_filter("");
        assert_eq!(table.visible_rows().len(), 3);
    }

    #[test]
    fn test_sort_columns() {
        let mut table = PathwayTableView::new(rows());
        let names: Vec<&str> = table.visible_rows().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Cell Cycle", "MAPK signaling pathway", "p53 signaling"]
        );

        table.toggle_sort(PathwayColumn::Score);
        let scores: Vec<f64> = table.visible_rows().iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![3.25, 5.0, 12.0]);

        table.toggle_sort(PathwayColumn::Score);
        let scores: Vec<f64> = table.visible_rows().iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![12.0, 5.0, 3.25]);

        table.toggle_sort(PathwayColumn::Genes);
        let first = table.visible_rows()[0].genes.clone();
        assert_eq!(first[0], "CDKN2A");
    }

    #[test]
    fn test_exclusive_selection_fires_once() {
        let mut table = PathwayTableView::new(rows());
        let mut calls: Vec<String> = Vec::new();
        table.select("MAPK signaling pathway", &mut |name| {
            calls.push(name.to_string())
        });
        assert_eq!(calls, vec!["MAPK signaling pathway".to_string()]);
        assert!(table.is_selected("MAPK signaling pathway"));
        assert!(!table.is_selected("Cell Cycle"));
        assert!(!table.is_selected("p53 signaling"));

        table.select("Cell Cycle", &mut |_| {});
        assert!(!table.is_selected("MAPK signaling pathway"));
        assert!(table.is_selected("Cell Cycle"));
    }

    #[test]
    fn test_pagination_fixed_page_size() {
        let many: Vec<PathwayRow> = (0..25)
            .map(|i| PathwayRow {
                name: format!("Pathway {i:02}"),
                score: i as f64,
                genes: vec![],
            })
            .collect();
        let mut table = PathwayTableView::new(many);
        assert_eq!(table.page_count(), 3);
        assert_eq!(table.page_rows().len(), PAGE_SIZE);
        table.set_page(2);
        assert_eq!(table.page_rows().len(), 5);
        table.set_page(99);
        assert_eq!(table.page(), 2);
    }

    #[test]
    fn test_download_text() {
        let row = &rows()[0];
        assert_eq!(
            PathwayTableView::download_text(row, PathwayColumn::Name),
            "MAPK signaling pathway"
        );
        assert_eq!(
            PathwayTableView::download_text(row, PathwayColumn::Score),
            "5"
        );
        assert_eq!(
            PathwayTableView::download_text(row, PathwayColumn::Genes),
            "TP53,MDM2"
        );
    }

    #[test]
    fn test_csv_export() {
        let table = PathwayTableView::new(rows());
        let mut buffer = Vec::new();
        table.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "Pathway name,Score,Genes matched");
        assert_eq!(lines.next().unwrap(), "Cell Cycle,3.25,\"CDKN2A,RB1\"");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pathways.csv");
        table.export_csv(&path).unwrap();
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .starts_with("Pathway name"));
    }

    #[test]
    fn test_match_scores() {
        let records = vec![
            AlterationRecord {
                gene: "TP53".to_string(),
                altered: 3,
                sequenced: 10,
                percent_altered: 30.0,
            },
            AlterationRecord {
                gene: "MDM2".to_string(),
                altered: 0,
                sequenced: 10,
                percent_altered: 0.0,
            },
        ];
        let scored = rows_with_match_scores(&rows(), &records);
        assert_eq!(scored[0].score, 1.0);
        assert_eq!(scored[1].score, 0.0);
        assert_eq!(scored[2].score, 1.0);
    }
}
