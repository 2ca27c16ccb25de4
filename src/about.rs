pub const PATHSCOPE_DISPLAY_VERSION: &str = env!("PATHSCOPE_DISPLAY_VERSION");
pub const PATHSCOPE_BUILD_N: &str = env!("PATHSCOPE_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "PathScope {}\nBuild {}\nPathway alteration overlay explorer",
        PATHSCOPE_DISPLAY_VERSION, PATHSCOPE_BUILD_N
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_text() {
        let text = version_cli_text();
        assert!(text.starts_with("PathScope "));
        assert!(text.contains("Build "));
    }
}
