// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the best model weights with Burn's
// NamedMpkFileRecorder at full precision.
//
// Files per model name (e.g. "BiLSTMNetwork"):
//   models/
//     BiLSTMNetwork.mpk           ← best weights, overwritten on each
//                                   validation F1 improvement
//     BiLSTMNetwork.config.json   ← architecture used to rebuild the
//                                   model before loading weights
//
// Loading fails if the stored weights do not match the
// architecture of the model they are loaded into.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};

use crate::ml::model::{FrameClassifier, FrameClassifierConfig};

/// Manages the single best-checkpoint file of one model name.
pub struct CheckpointManager {
    dir:        PathBuf,
    model_name: String,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>, model_name: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir, model_name: model_name.into() })
    }

    /// Path handed to the recorder; it appends the `.mpk` extension.
    fn record_path(&self) -> PathBuf {
        self.dir.join(&self.model_name)
    }

    /// The weight file as it exists on disk.
    pub fn weights_path(&self) -> PathBuf {
        self.dir.join(format!("{}.mpk", self.model_name))
    }

    fn config_path(&self) -> PathBuf {
        self.dir.join(format!("{}.config.json", self.model_name))
    }

    pub fn exists(&self) -> bool {
        self.weights_path().exists()
    }

    /// Overwrite the checkpoint with the given weights.
    pub fn save_model<B: Backend>(&self, model: &FrameClassifier<B>) -> Result<()> {
        let path = self.record_path();
        NamedMpkFileRecorder::<FullPrecisionSettings>::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;
        tracing::debug!("Saved checkpoint '{}'", self.weights_path().display());
        Ok(())
    }

    /// Load the checkpoint into a freshly built model of matching shape.
    pub fn load_model<B: Backend>(
        &self,
        model:  FrameClassifier<B>,
        device: &B::Device,
    ) -> Result<FrameClassifier<B>> {
        let path = self.record_path();
        tracing::info!("Loading checkpoint '{}'", self.weights_path().display());

        let record = NamedMpkFileRecorder::<FullPrecisionSettings>::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    self.weights_path().display()
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Persist the architecture next to the weights.
    pub fn save_config(&self, cfg: &FrameClassifierConfig) -> Result<()> {
        let path = self.config_path();
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    /// Stored architecture, if training has written one.
    pub fn load_config(&self) -> Result<Option<FrameClassifierConfig>> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(Some(serde_json::from_str(&json)?))
    }
}
