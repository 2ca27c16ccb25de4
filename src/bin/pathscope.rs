use eframe::{egui, NativeOptions};
use pathscope::{about, app};
use std::env;

fn main() -> eframe::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }
    let study_path = args.iter().find(|a| !a.starts_with('-')).cloned();

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([420.0, 320.0]),
        ..Default::default()
    };

    eframe::run_native(
        "PathScope",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(app::PathScopeApp::new_with_study_path(
                study_path.as_deref(),
            )))
        }),
    )
}
