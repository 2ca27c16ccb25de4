use pathscope::about;
use pathscope::alteration::CaseGranularity;
use pathscope::pathway_table::{
    rows_with_match_scores, PathwayColumn, PathwayRow, PathwayTableView,
};
use pathscope::store::{ResultStore, StoreQuery};
use pathscope::study::{InMemoryFetcher, StudyDocument};
use serde::Serialize;
use std::env;

#[derive(Serialize)]
struct StudySummary {
    name: String,
    query_genes: Vec<String>,
    sample_count: usize,
    patient_count: usize,
    profile_count: usize,
    pathway_count: usize,
}

fn usage() {
    eprintln!(
        "Usage:\n  \
  pathscope_cli --version\n  \
  pathscope_cli [--study PATH] summary\n  \
  pathscope_cli [--study PATH] table [FILTER]\n  \
  pathscope_cli [--study PATH] export-csv OUTPUT.csv\n  \
  pathscope_cli [--study PATH] alterations GENE [GENE...]\n\n  \
  Without --study the embedded demo study is used"
    );
}

fn load_study(path: Option<&str>) -> Result<StudyDocument, String> {
    match path {
        Some(path) => StudyDocument::load_from_path(path).map_err(|e| e.to_string()),
        None => Ok(StudyDocument::demo()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Could not serialize JSON output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn parse_global_study_arg(args: &[String]) -> (Option<String>, usize) {
    if args.len() >= 3 && args[1] == "--study" {
        return (Some(args[2].clone()), 3);
    }
    (None, 1)
}

fn query_records(
    study: &StudyDocument,
    genes: &[String],
) -> Result<Vec<pathscope::alteration::AlterationRecord>, String> {
    let fetcher = InMemoryFetcher::new(study.clone());
    let store = ResultStore::load_blocking(&fetcher, StoreQuery::new(genes))
        .map_err(|e| e.to_string())?;
    store
        .records(CaseGranularity::Patient)
        .ok_or_else(|| "Store did not load completely".to_string())
}

fn scored_table(study: &StudyDocument) -> Result<PathwayTableView, String> {
    let records = query_records(study, &study.query_genes)?;
    let pathways: Vec<PathwayRow> = study
        .pathways
        .iter()
        .map(|def| PathwayRow {
            name: def.name.clone(),
            score: 0.0,
            genes: def.genes.clone(),
        })
        .collect();
    Ok(PathwayTableView::new(rows_with_match_scores(
        &pathways, &records,
    )))
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    if args.len() <= 1 {
        usage();
        return Err("Missing command".to_string());
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }

    let (study_path, cmd_idx) = parse_global_study_arg(&args);
    if args.len() <= cmd_idx {
        usage();
        return Err("Missing command".to_string());
    }
    let study = load_study(study_path.as_deref())?;

    let command = &args[cmd_idx];
    match command.as_str() {
        "summary" => {
            let summary = StudySummary {
                name: study.name.clone(),
                query_genes: study.query_genes.clone(),
                sample_count: study.samples.len(),
                patient_count: study.patients.len(),
                profile_count: study.molecular_profiles.len(),
                pathway_count: study.pathways.len(),
            };
            print_json(&summary)
        }
        "table" => {
            let mut table = scored_table(&study)?;
            if let Some(filter) = args.get(cmd_idx + 1) {
                table.set_filter(filter);
            }
            for row in table.visible_rows() {
                println!(
                    "{}\t{}\t{}",
                    PathwayTableView::download_text(row, PathwayColumn::Name),
                    PathwayTableView::download_text(row, PathwayColumn::Score),
                    PathwayTableView::download_text(row, PathwayColumn::Genes),
                );
            }
            Ok(())
        }
        "export-csv" => {
            let output = args
                .get(cmd_idx + 1)
                .ok_or_else(|| "Missing output path".to_string())?;
            let table = scored_table(&study)?;
            table
                .export_csv(std::path::Path::new(output))
                .map_err(|e| e.to_string())?;
            println!("Wrote {output}");
            Ok(())
        }
        "alterations" => {
            let genes: Vec<String> = args[cmd_idx + 1..].to_vec();
            if genes.is_empty() {
                usage();
                return Err("Missing gene list".to_string());
            }
            let records = query_records(&study, &genes)?;
            print_json(&records)
        }
        other => {
            usage();
            Err(format!("Unknown command '{other}'"))
        }
    }
}
