/// Platform-specific path computation
///
/// Config lives under the platform config directory (`$XDG_CONFIG_HOME` or
/// `~/.config` on Linux, `~/Library/Application Support` on macOS, `%APPDATA%`
/// on Windows). Reports default to the working directory.
use std::path::PathBuf;

const APP_DIR: &str = "commit-audit";

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Platform config directory, or `.` when it cannot be determined
    pub fn config_dir() -> PathBuf {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Returns: {config_dir}/commit-audit
    pub fn project_config_dir() -> PathBuf {
        Self::config_dir().join(APP_DIR)
    }

    /// Returns: {config_dir}/commit-audit/config.toml
    pub fn default_config_path() -> PathBuf {
        Self::project_config_dir().join("config.toml")
    }

    /// Returns: {repo_name}-report.json
    pub fn default_report_path(repo_name: &str) -> PathBuf {
        let name = repo_name.trim();
        let name = if name.is_empty() { "repository" } else { name };
        PathBuf::from(format!("{}-report.json", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_not_empty() {
        assert!(!PlatformPaths::config_dir().as_os_str().is_empty());
    }

    #[test]
    fn test_default_config_path() {
        let path = PlatformPaths::default_config_path();
        assert!(path.ends_with("commit-audit/config.toml"));
        assert!(path.starts_with(PlatformPaths::config_dir()));
    }

    #[test]
    fn test_default_report_path() {
        assert_eq!(
            PlatformPaths::default_report_path("widgets"),
            PathBuf::from("widgets-report.json")
        );
        assert_eq!(
            PlatformPaths::default_report_path(""),
            PathBuf::from("repository-report.json")
        );
    }
}
