use crate::domain::ml::tensor::StateDict;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// On-disk checkpoint layout. Other top-level keys (epoch, optimizer state, ...)
/// are ignored on load.
#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    model_state_dict: StateDict,
}

/// JSON checkpoint persistence for network state dicts.
pub struct CheckpointStore;

impl CheckpointStore {
    pub fn load(path: &Path) -> Result<StateDict> {
        let file = File::open(path).with_context(|| format!("Failed to open checkpoint {:?}", path))?;
        let checkpoint: CheckpointFile = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse checkpoint {:?}", path))?;

        info!(
            "Loaded checkpoint from {:?} ({} tensors)",
            path,
            checkpoint.model_state_dict.len()
        );
        Ok(checkpoint.model_state_dict)
    }

    /// Atomic write: write to temp file then rename
    pub fn save(path: &Path, state: &StateDict) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create checkpoint directory {:?}", parent))?;
        }

        let temp_path = path.with_extension("tmp");
        {
            let file = File::create(&temp_path)
                .with_context(|| format!("Failed to create temp checkpoint {:?}", temp_path))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(
                &mut writer,
                &CheckpointFile {
                    model_state_dict: state.clone(),
                },
            )
            .context("Failed to serialize checkpoint")?;
            writer.flush().context("Failed to flush checkpoint")?;
        }
        fs::rename(&temp_path, path).with_context(|| format!("Failed to rename checkpoint to {:?}", path))?;

        info!("Saved checkpoint to {:?} ({} tensors)", path, state.len());
        Ok(())
    }
}
