use super::InferenceBackend;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// A model advertised by the inference service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    /// Size on disk in bytes (0 when unknown)
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_at: Option<String>,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            modified_at: None,
        }
    }

    /// Size in KB/MB/GB, or "Unknown size"
    pub fn human_size(&self) -> String {
        const KB: f64 = 1024.0;
        const MB: f64 = KB * 1024.0;
        const GB: f64 = MB * 1024.0;

        let size = self.size as f64;
        if self.size == 0 {
            "Unknown size".to_string()
        } else if size >= GB {
            format!("{:.1} GB", size / GB)
        } else if size >= MB {
            format!("{:.1} MB", size / MB)
        } else {
            format!("{:.1} KB", size / KB)
        }
    }
}

/// Chooses one model when several are available
pub trait ModelSelector {
    fn select(&mut self, models: &[ModelInfo]) -> Result<String, ModelError>;
}

/// Numbered menu on a reader/writer pair, normally stdin/stdout
pub struct InteractiveSelector<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InteractiveSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl InteractiveSelector<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> ModelSelector for InteractiveSelector<R, W> {
    fn select(&mut self, models: &[ModelInfo]) -> Result<String, ModelError> {
        if models.is_empty() {
            return Err(ModelError::NoModelsAvailable);
        }

        let io_err = |_| ModelError::SelectionAborted;

        writeln!(self.output, "\nAvailable models:").map_err(io_err)?;
        for (i, model) in models.iter().enumerate() {
            writeln!(self.output, "  {}. {} ({})", i + 1, model.name, model.human_size())
                .map_err(io_err)?;
        }

        loop {
            write!(self.output, "\nSelect a model (1-{}): ", models.len()).map_err(io_err)?;
            self.output.flush().map_err(io_err)?;

            let mut line = String::new();
            if self.input.read_line(&mut line).map_err(io_err)? == 0 {
                return Err(ModelError::SelectionAborted);
            }

            match line.trim().parse::<usize>() {
                Ok(choice) if (1..=models.len()).contains(&choice) => {
                    let selected = models[choice - 1].name.clone();
                    writeln!(self.output, "Selected model: {}", selected).map_err(io_err)?;
                    return Ok(selected);
                }
                Ok(_) => {
                    writeln!(self.output, "Please enter a number between 1 and {}", models.len())
                        .map_err(io_err)?;
                }
                Err(_) => {
                    writeln!(self.output, "Please enter a valid number").map_err(io_err)?;
                }
            }
        }
    }
}

/// Decide which model the run will use.
///
/// An explicit model wins. Otherwise the service is asked for its models: a
/// single model is picked automatically, several are handed to `selector`.
pub async fn resolve_model<B>(
    explicit: Option<&str>,
    backend: &B,
    selector: &mut dyn ModelSelector,
) -> Result<String, ModelError>
where
    B: InferenceBackend + ?Sized,
{
    if let Some(model) = explicit.map(str::trim).filter(|m| !m.is_empty()) {
        tracing::info!("Using specified model: {}", model);
        return Ok(model.to_string());
    }

    let models = backend.list_models().await.map_err(|e| {
        ModelError::NoModelSelected(format!(
            "could not list models at {}: {}",
            backend.endpoint(),
            e
        ))
    })?;

    match models.as_slice() {
        [] => Err(ModelError::NoModelsAvailable),
        [only] => {
            tracing::info!("Only one model available, using: {}", only.name);
            Ok(only.name.clone())
        }
        _ => selector.select(&models),
    }
}
