use std::time::{SystemTime, UNIX_EPOCH};

fn emit_build_version() {
    let n = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    println!("cargo:rustc-env=PATHSCOPE_BUILD_N={n}");
    println!("cargo:rustc-env=PATHSCOPE_DISPLAY_VERSION=0.1.{n}");
}

fn main() {
    emit_build_version();
}
