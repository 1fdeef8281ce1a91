// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// The `--test` workflow:
//
//   Step 1: Load the corpus, reload (or rebuild) the vocabulary
//   Step 2: Rebuild the saved architecture
//   Step 3: Load the best checkpoint for this model name
//   Step 4: Score the test split in inference mode

use anyhow::{bail, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu},
    prelude::*,
};

use crate::application::train_use_case::{corpus_texts, load_corpus, DeviceChoice, RunConfig};
use crate::data::{
    batcher::{BatchOrdering, BucketLoader},
    dataset::FrameDataset,
    loader::CsvCorpusLoader,
};
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::evaluator::{evaluate, EvaluationReport};

pub struct EvaluateUseCase {
    config: RunConfig,
}

impl EvaluateUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let report = match self.config.device {
            DeviceChoice::Cpu  => self.run::<NdArray<f32>>(NdArrayDevice::Cpu)?,
            DeviceChoice::Wgpu => self.run::<Wgpu>(WgpuDevice::default())?,
        };
        report.log();
        Ok(())
    }

    pub fn run<B: Backend>(&self, device: B::Device) -> Result<EvaluationReport> {
        let cfg        = &self.config;
        let model_name = cfg.model_name();

        // ── Step 1: Corpus and vocabulary ─────────────────────────────────────
        let splits = load_corpus(&CsvCorpusLoader::new(&cfg.data_dir))?;
        let vocab  = VocabStore::new(&cfg.models_dir, model_name).load_or_build(corpus_texts(&splits))?;
        let [_, _, test_examples] = &splits;

        // ── Step 2: Architecture ──────────────────────────────────────────────
        let checkpoints = CheckpointManager::new(&cfg.models_dir, model_name)?;
        if !checkpoints.exists() {
            bail!(
                "No checkpoint at '{}'. Train {} before running with --test",
                checkpoints.weights_path().display(),
                model_name,
            );
        }
        let model_config = match checkpoints.load_config()? {
            Some(saved) => saved,
            None => {
                tracing::warn!("No saved architecture for {}; using command-line options", model_name);
                cfg.model_config(vocab.len())
            }
        };

        // ── Step 3: Weights ───────────────────────────────────────────────────
        let model = checkpoints.load_model(model_config.init::<B>(&device), &device)?;

        // ── Step 4: Score ─────────────────────────────────────────────────────
        let test_dataset = FrameDataset::encode(test_examples, &vocab)?;
        let loader = BucketLoader::<B>::new(test_dataset, cfg.batch_size, BatchOrdering::Sorted, device);
        evaluate(&model, &loader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::Split;
    use crate::ml::model::FrameClassifier;
    use std::path::Path;

    type NdArrayModel = FrameClassifier<NdArray<f32>>;

    const HEADER: &str = "text,PERSON,LOC,ORG,WORK_OF_ART,PRODUCT,EVENT,OTHER\n";

    fn setup(root: &Path) -> RunConfig {
        let data = root.join("data");
        std::fs::create_dir_all(&data).unwrap();
        let body = format!(
            "{HEADER}alice went home,1,0,0,0,0,0,0\nparis,0,1,0,0,0,0,0\nthe big game,0,0,0,0,0,1,0\n"
        );
        for split in Split::ALL {
            std::fs::write(data.join(format!("ontonotes_ner_{split}.csv")), &body).unwrap();
        }
        RunConfig {
            data_dir:      data.display().to_string(),
            models_dir:    root.join("models").display().to_string(),
            graphs_dir:    root.join("graphs").display().to_string(),
            batch_size:    2,
            epochs:        3,
            lr:            0.05,
            hidden_size:   4,
            embedding_dim: 5,
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_evaluation_without_checkpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = setup(dir.path());
        let result = EvaluateUseCase::new(cfg).run::<NdArray<f32>>(NdArrayDevice::Cpu);
        assert!(result.is_err());
    }

    /// Save an untrained model, its config and the vocabulary the way
    /// training would.
    fn write_checkpoint(cfg: &RunConfig) -> NdArrayModel {
        let device = NdArrayDevice::Cpu;
        let name   = cfg.model_name();
        let splits = load_corpus(&CsvCorpusLoader::new(&cfg.data_dir)).unwrap();
        let vocab  = VocabStore::new(&cfg.models_dir, name).build_and_save(corpus_texts(&splits)).unwrap();

        let model_config = cfg.model_config(vocab.len());
        let ckpt  = CheckpointManager::new(&cfg.models_dir, name).unwrap();
        let model = model_config.init::<NdArray<f32>>(&device);
        ckpt.save_config(&model_config).unwrap();
        ckpt.save_model(&model).unwrap();
        assert!(ckpt.exists());
        model
    }

    #[test]
    fn test_evaluating_a_checkpoint_twice_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RunConfig { test: true, attention: true, ..setup(dir.path()) };
        write_checkpoint(&cfg);

        let use_case = EvaluateUseCase::new(cfg);
        let first    = use_case.run::<NdArray<f32>>(NdArrayDevice::Cpu).unwrap();
        let second   = use_case.run::<NdArray<f32>>(NdArrayDevice::Cpu).unwrap();
        assert_eq!(first.metrics, second.metrics);
        assert_eq!(first.examples, 3);
        assert!(first.peak_attention.is_some());
    }

    #[test]
    fn test_evaluation_scores_the_saved_weights() {
        let dir   = tempfile::tempdir().unwrap();
        let cfg   = RunConfig { test: true, ..setup(dir.path()) };
        let saved = write_checkpoint(&cfg);

        let report = EvaluateUseCase::new(cfg.clone()).run::<NdArray<f32>>(NdArrayDevice::Cpu).unwrap();

        let splits = load_corpus(&CsvCorpusLoader::new(&cfg.data_dir)).unwrap();
        let vocab  = VocabStore::new(&cfg.models_dir, cfg.model_name()).load().unwrap();
        let loader = BucketLoader::<NdArray<f32>>::new(
            FrameDataset::encode(&splits[2], &vocab).unwrap(),
            cfg.batch_size,
            BatchOrdering::Sorted,
            NdArrayDevice::Cpu,
        );
        let direct = evaluate(&saved, &loader).unwrap();
        assert_eq!(report.metrics, direct.metrics);
    }
}
