use lazy_static::lazy_static;
use study::StudyDocument;

pub mod about;
pub mod accumulator;
pub mod alteration;
pub mod app;
pub mod case_data;
pub mod diagram_bridge;
pub mod gene_lookup;
pub mod message;
pub mod pathway_table;
pub mod remote_cell;
pub mod store;
pub mod study;

lazy_static! {
    // Embedded demo cohort, parsed once
    pub static ref DEMO_STUDY: StudyDocument = StudyDocument::demo();
}
