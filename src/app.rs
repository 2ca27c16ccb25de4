//! The PathScope application shell.
//!
//! Wires the pathway tab together: the primary result store for the query
//! genes, the alteration accumulator, the diagram bridge, the pathway table
//! and the status message box. All background work is polled from `update`;
//! nothing blocks the UI loop.

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::accumulator::AlterationAccumulator;
use crate::alteration::AlterationRecord;
use crate::diagram_bridge::{DiagramBridge, DiagramEvent};
use crate::gene_lookup::{CatalogGeneLookup, GeneLookup};
use crate::message::MessageBox;
use crate::pathway_table::{rows_with_match_scores, PathwayRow, PathwayTableView};
use crate::store::{ResultStore, StoreQuery};
use crate::study::{InMemoryFetcher, StudyDocument};
use eframe::egui::{self, Ui};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Summary,
    Pathways,
}

pub struct PathScopeApp {
    fetcher: Arc<InMemoryFetcher>,
    primary: ResultStore,
    accumulator: AlterationAccumulator,
    bridge: DiagramBridge,
    overlay_rx: Receiver<Vec<AlterationRecord>>,
    overlay: Vec<AlterationRecord>,
    pathways: Vec<PathwayRow>,
    table: PathwayTableView,
    message: MessageBox,
    current_tab: Tab,
    load_error: Option<String>,
}

impl Default for PathScopeApp {
    fn default() -> Self {
        Self::new_with_study(crate::DEMO_STUDY.clone())
    }
}

impl PathScopeApp {
    pub fn new_with_study_path(path: Option<&str>) -> Self {
        match path {
            Some(path) => match StudyDocument::load_from_path(path) {
                Ok(study) => Self::new_with_study(study),
                Err(e) => {
                    let mut app = Self::default();
                    app.load_error = Some(e.to_string());
                    app
                }
            },
            None => Self::default(),
        }
    }

    pub fn new_with_study(study: StudyDocument) -> Self {
        let lookup: Arc<dyn GeneLookup> =
            Arc::new(CatalogGeneLookup::new(&study.gene_catalog));
        let pathways: Vec<PathwayRow> = study
            .pathways
            .iter()
            .map(|def| PathwayRow {
                name: def.name.clone(),
                score: 0.0,
                genes: def.genes.clone(),
            })
            .collect();
        let query_genes = study.query_genes.clone();
        let fetcher = Arc::new(InMemoryFetcher::new(study));
        let primary = ResultStore::spawn(fetcher.clone(), StoreQuery::new(&query_genes));
        let accumulator = AlterationAccumulator::new(fetcher.clone(), lookup, &query_genes);
        let mut bridge = DiagramBridge::default();
        let overlay_rx = bridge.subscribe();
        let table = PathwayTableView::new(rows_with_match_scores(&pathways, &[]));

        Self {
            fetcher,
            primary,
            accumulator,
            bridge,
            overlay_rx,
            overlay: Vec::new(),
            pathways,
            table,
            message: MessageBox::default(),
            current_tab: Tab::Pathways,
            load_error: None,
        }
    }

    fn load_study_from_file(&mut self, path: &str) {
        match StudyDocument::load_from_path(path) {
            Ok(study) => *self = Self::new_with_study(study),
            Err(e) => self.load_error = Some(e.to_string()),
        }
    }

    /// Advance all background work by one step.
    fn pump(&mut self) {
        self.primary.poll();

        for event in self.bridge.drain_events() {
            match event {
                DiagramEvent::PathwayChanged { genes } => {
                    self.accumulator.on_pathway_genes(&genes);
                }
                DiagramEvent::GenesAddedToQuery { genes } => {
                    self.accumulator.add_query_genes(&genes);
                    self.primary = ResultStore::spawn(
                        self.fetcher.clone(),
                        StoreQuery::new(self.accumulator.query_genes()),
                    );
                }
                DiagramEvent::ShowMessage { text } => self.message.show(&text),
            }
        }

        self.accumulator
            .poll(&self.primary, &mut self.bridge, &mut self.message);

        while let Ok(records) = self.overlay_rx.try_recv() {
            self.overlay = records;
        }

        let merged = self.accumulator.merged(&self.primary);
        let scored = rows_with_match_scores(&self.pathways, &merged);
        if scored != self.table.rows() {
            self.table.set_rows(scored);
        }
    }

    pub fn render_menu_bar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open study…").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Study", &["json"])
                        .pick_file()
                    {
                        self.load_study_from_file(&path.display().to_string());
                    }
                }
                if ui.button("Export pathway table…").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .set_file_name("pathways.csv")
                        .save_file()
                    {
                        if let Err(e) = self.table.export_csv(&path) {
                            self.load_error = Some(e.to_string());
                        }
                    }
                }
            });
        });
    }

    fn render_tab_strip(&mut self, ui: &mut Ui) {
        let previous = self.current_tab;
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.current_tab, Tab::Summary, "Summary");
            ui.selectable_value(&mut self.current_tab, Tab::Pathways, "Pathways");
        });
        // Leaving the pathway tab dismisses its notifications at once; any
        // in-flight fetches keep running.
        if previous == Tab::Pathways && self.current_tab != Tab::Pathways {
            self.message.reset();
        }
    }

    fn render_summary(&self, ui: &mut Ui) {
        let study = self.fetcher.study();
        ui.heading(&study.name);
        ui.label(format!(
            "Query genes: {}",
            self.accumulator.query_genes().join(" ")
        ));
        ui.label(format!(
            "{} samples, {} patients",
            study.samples.len(),
            study.patients.len()
        ));
        ui.label(format!(
            "Profiles: {}",
            study
                .molecular_profiles
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        ui.label(format!("{} curated pathways", self.pathways.len()));
    }

    /// Stand-in panel for the external diagram widget: shows the gene list
    /// and overlay data the widget would receive.
    fn render_diagram_panel(&self, ui: &mut Ui) {
        ui.heading("Pathway diagram");
        if self.table.selected().is_empty() {
            ui.label("No pathway selected.");
        } else {
            ui.label(self.table.selected());
        }
        ui.separator();

        ui.label(format!(
            "Genes: {}",
            self.accumulator.current_gene_list().join(" ")
        ));
        let invalid: Vec<&str> = self
            .accumulator
            .validity_table()
            .iter()
            .filter(|(_, valid)| !**valid)
            .map(|(gene, _)| gene.as_str())
            .collect();
        if !invalid.is_empty() {
            ui.label(format!("Not recognized: {}", invalid.join(" ")));
        }
        ui.separator();

        let merged = self.accumulator.merged(&self.primary);
        egui::ScrollArea::vertical().show(ui, |ui| {
            for record in &merged {
                ui.label(format!(
                    "{}: {}/{} ({:.1}%)",
                    record.gene, record.altered, record.sequenced, record.percent_altered
                ));
            }
        });
        if !self.overlay.is_empty() {
            ui.label(format!("Last push to diagram: {} records", self.overlay.len()));
        }
    }

    fn render_pathways(&mut self, ui: &mut Ui) {
        if !self.primary.is_ready() {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.spinner();
                ui.label("Loading study data…");
            });
            return;
        }

        let pathways = self.pathways.clone();
        let sender = self.bridge.event_sender();
        ui.columns(2, |columns| {
            self.render_diagram_panel(&mut columns[0]);
            self.table.render(&mut columns[1], &mut |name| {
                let genes = pathways
                    .iter()
                    .find(|p| p.name == name)
                    .map(|p| p.genes.clone())
                    .unwrap_or_default();
                let _ = sender.send(DiagramEvent::PathwayChanged { genes });
            });
        });
    }

    fn render_message_panel(&mut self, ui: &mut Ui, now: Instant) {
        ui.horizontal(|ui| {
            if self.accumulator.is_loading() {
                ui.spinner();
            }
            ui.label(self.message.text());
            if !self.message.is_default() && ui.button("✕").clicked() {
                self.message.dismiss(now);
            }
            if let Some(error) = &self.load_error {
                ui.colored_label(egui::Color32::RED, error);
            }
        });
    }
}

impl eframe::App for PathScopeApp {
    fn ui(&mut self, root_ui: &mut egui::Ui, _frame: &mut eframe::Frame) {
        let ctx = root_ui.ctx();
        let now = Instant::now();
        self.pump();
        self.message.tick(now);

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            self.render_menu_bar(ui);
            self.render_tab_strip(ui);
        });

        egui::TopBottomPanel::bottom("message").show(ctx, |ui| {
            self.render_message_panel(ui, now);
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.current_tab {
            Tab::Summary => self.render_summary(ui),
            Tab::Pathways => self.render_pathways(ui),
        });

        // Pending fetches and pending message clears need frames that are
        // not driven by input events.
        if self.accumulator.is_loading() || !self.primary.is_ready() || !self.message.is_default()
        {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn settled_app() -> PathScopeApp {
        let mut app = PathScopeApp::default();
        for _ in 0..2000 {
            app.pump();
            if app.primary.is_ready() {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        assert!(app.primary.is_ready());
        app
    }

    #[test]
    fn test_app_starts_on_pathway_tab() {
        let app = settled_app();
        assert_eq!(app.current_tab, Tab::Pathways);
        assert!(app.load_error.is_none());
        assert!(!app.table.rows().is_empty());
    }

    #[test]
    fn test_pathway_selection_flows_through_bridge() {
        let mut app = settled_app();
        let sender = app.bridge.event_sender();
        sender
            .send(DiagramEvent::PathwayChanged {
                genes: vec!["EGFR".to_string(), "KRAS".to_string()],
            })
            .unwrap();
        for _ in 0..2000 {
            app.pump();
            if !app.accumulator.is_loading() && !app.accumulator.accumulated().is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        let genes: Vec<&str> = app
            .accumulator
            .accumulated()
            .iter()
            .map(|r| r.gene.as_str())
            .collect();
        assert_eq!(genes, vec!["EGFR", "KRAS"]);
        // The published overlay reached the app's own subscription.
        assert_eq!(app.overlay.len(), app.accumulator.query_genes().len() + 2);
    }

    #[test]
    fn test_show_message_event() {
        let mut app = settled_app();
        let sender = app.bridge.event_sender();
        sender
            .send(DiagramEvent::ShowMessage {
                text: "2 genes not recognized".to_string(),
            })
            .unwrap();
        app.pump();
        assert_eq!(app.message.text(), "2 genes not recognized");
    }

    #[test]
    fn test_genes_added_to_query_rebuild_primary() {
        let mut app = settled_app();
        let before = app.accumulator.query_genes().len();
        let sender = app.bridge.event_sender();
        sender
            .send(DiagramEvent::GenesAddedToQuery {
                genes: vec!["BRAF".to_string()],
            })
            .unwrap();
        app.pump();
        assert_eq!(app.accumulator.query_genes().len(), before + 1);
        assert!(app.primary.query().genes.contains(&"BRAF".to_string()));
    }
}
