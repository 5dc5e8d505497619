use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use shared::TonePalette;
use tokio::process::Command;

use crate::config::ToneClassifierConfig;

/// Runs `stone.process` on argv[1] with palette argv[2] and prints the report as JSON.
const STONE_BOOTSTRAP: &str = r#"
import json, sys
import stone

def scalar(value):
    return value.item() if hasattr(value, "item") else str(value)

report = stone.process(sys.argv[1], tone_palette=sys.argv[2])
json.dump(report, sys.stdout, default=scalar)
"#;

#[derive(Debug, thiserror::Error)]
pub enum ToneError {
    #[error("{0}")]
    Failed(String),
    #[error("Failed to start tone classifier: {0}")]
    Spawn(#[from] io::Error),
    #[error("Malformed tone classifier output: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Tone classifier timed out after {0} seconds")]
    TimedOut(u64),
}

/// Classifier report as produced by the skin tone library.
#[derive(Debug, Default, Deserialize)]
pub struct RawToneReport {
    #[serde(default)]
    pub faces: Vec<RawFace>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawFace {
    pub coarse_tone_label: Option<String>,
    pub skin_tone: Option<String>,
    pub accuracy: Option<f64>,
}

#[async_trait]
pub trait ToneClassifier: Send + Sync {
    async fn process(&self, image: &Path, palette: TonePalette) -> Result<RawToneReport, ToneError>;
}

/// Invokes the skin tone library in a child process.
pub struct CommandToneClassifier {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandToneClassifier {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &ToneClassifierConfig) -> Self {
        match config.command.as_deref() {
            Some([program, args @ ..]) => Self::new(program.clone(), args.to_vec(), config.timeout),
            _ => Self::new(
                "python3",
                vec!["-c".to_string(), STONE_BOOTSTRAP.to_string()],
                config.timeout,
            ),
        }
    }
}

#[async_trait]
impl ToneClassifier for CommandToneClassifier {
    async fn process(
        &self,
        image: &Path,
        palette: TonePalette,
    ) -> Result<RawToneReport, ToneError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(image)
            .arg(palette.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ToneError::TimedOut(self.timeout.as_secs()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .map(|line| line.trim().to_string())
                .unwrap_or_else(|| format!("Tone classifier exited with {}", output.status));
            return Err(ToneError::Failed(detail));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}
