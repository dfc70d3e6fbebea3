use crate::error::ReportError;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Raw response bodies kept next to the report in debug runs.
///
/// Each response lands in `{report-stem}-debug/{hash}.json`. The directory is
/// created on first write.
#[derive(Debug, Clone)]
pub struct DebugDump {
    dir: PathBuf,
}

impl DebugDump {
    /// Dump directory derived from the report path
    pub fn for_report(output: &Path) -> Self {
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        let parent = output.parent().unwrap_or_else(|| Path::new(""));

        Self {
            dir: parent.join(format!("{}-debug", stem)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one raw response, returning the file it went to
    pub fn write(&self, hash: &str, raw: &Value) -> Result<PathBuf, ReportError> {
        let path = self.dir.join(format!("{}.json", hash));
        let write_failed = |e: std::io::Error| ReportError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        std::fs::create_dir_all(&self.dir).map_err(write_failed)?;
        let content = serde_json::to_string_pretty(raw)
            .map_err(|e| ReportError::SerializeFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(write_failed)?;

        tracing::debug!("Saved raw response to {}", path.display());
        Ok(path)
    }
}
