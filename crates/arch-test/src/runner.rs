//! Project-level runner for `cargo test` integration.

use arch_test_core::{
    AnalysisCache, DiscoveryRequest, Engine, EngineError, MemberReflector, RuleEvaluator,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file names to search for, in priority order.
pub const CONFIG_CANDIDATES: &[&str] = &["arch-test.toml", ".arch-test.toml"];

/// Finds the engine configuration for a project.
///
/// Searches `start` and its ancestors for one of [`CONFIG_CANDIDATES`],
/// stopping after the first directory whose `Cargo.toml` declares a
/// workspace.
#[must_use]
pub fn find_config(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        for candidate in CONFIG_CANDIDATES {
            let path = dir.join(candidate);
            if path.is_file() {
                debug!("Using config {}", path.display());
                return Some(path);
            }
        }
        if has_workspace_section(&dir.join("Cargo.toml")) {
            break;
        }
    }
    None
}

/// Builds an engine for the project at `start`, configured from the
/// nearest config file if there is one.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed.
pub fn project_engine<R>(start: impl AsRef<Path>, reflector: R) -> Result<Engine, EngineError>
where
    R: MemberReflector + 'static,
{
    let mut builder = Engine::builder().reflector(reflector);
    if let Some(path) = find_config(start.as_ref()) {
        builder = builder.config_file(path);
    }
    builder.build()
}

/// Discovers and executes `request`, panicking with a report if any rule
/// fails or discovery is rejected.
///
/// # Panics
///
/// Panics if discovery fails or any rule does not pass.
pub fn assert_rules_pass<C, E>(engine: &Engine, request: &DiscoveryRequest, cache: &C, evaluator: &E)
where
    C: AnalysisCache,
    E: RuleEvaluator<C::Classes>,
{
    let summary = engine.run(request, cache, evaluator).unwrap_or_else(|e| {
        panic!("arch-test: discovery failed: {e}");
    });

    if !summary.is_success() {
        panic!("{}", summary.format_report());
    }
}

/// Checks whether a `Cargo.toml` file defines a `[workspace]` section
/// by parsing as TOML, avoiding false positives from comments or strings.
fn has_workspace_section(cargo_toml: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(cargo_toml) else {
        return false;
    };
    let Ok(table) = content.parse::<toml::Table>() else {
        return false;
    };
    table.contains_key("workspace")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_config_in_start_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".arch-test.toml"), "").unwrap();
        assert_eq!(
            find_config(dir.path()),
            Some(dir.path().join(".arch-test.toml"))
        );
    }

    #[test]
    fn prefers_unhidden_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("arch-test.toml"), "").unwrap();
        std::fs::write(dir.path().join(".arch-test.toml"), "").unwrap();
        assert_eq!(
            find_config(dir.path()),
            Some(dir.path().join("arch-test.toml"))
        );
    }

    #[test]
    fn finds_config_in_workspace_root() {
        let dir = tempfile::tempdir().unwrap();
        let member = dir.path().join("crates/member");
        std::fs::create_dir_all(&member).unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "[workspace]\nmembers = []\n").unwrap();
        std::fs::write(dir.path().join("arch-test.toml"), "").unwrap();

        assert_eq!(find_config(&member), Some(dir.path().join("arch-test.toml")));
    }

    #[test]
    fn stops_at_workspace_root() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = dir.path().join("workspace");
        std::fs::create_dir_all(&workspace).unwrap();
        std::fs::write(dir.path().join("arch-test.toml"), "").unwrap();
        std::fs::write(workspace.join("Cargo.toml"), "[workspace]\n").unwrap();

        assert_eq!(find_config(&workspace), None);
    }

    #[test]
    fn workspace_detection_ignores_comments() {
        let dir = tempfile::tempdir().unwrap();
        let cargo = dir.path().join("Cargo.toml");
        std::fs::write(&cargo, "# [workspace]\n[package]\nname = \"x\"\n").unwrap();
        assert!(!has_workspace_section(&cargo));
    }
}
