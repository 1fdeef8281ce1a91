// ============================================================
// Layer 1 — CLI Arguments
// ============================================================
// One flat option set; `--test` switches from training to
// evaluation. Long names are kebab-case and the underscore
// spellings are accepted as aliases.

use clap::{Args, ValueEnum};

use crate::application::train_use_case::{DeviceChoice, RunConfig, DEFAULT_VECTORS};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceArg {
    /// ndarray backend on the host CPU
    Cpu,
    /// wgpu backend on the default adapter
    Wgpu,
}

impl From<DeviceArg> for DeviceChoice {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Cpu  => DeviceChoice::Cpu,
            DeviceArg::Wgpu => DeviceChoice::Wgpu,
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Examples per batch
    #[arg(long, visible_alias = "batch_size", default_value_t = 64)]
    pub batch_size: usize,

    /// Skip training and evaluate the saved checkpoint on the test split
    #[arg(long, default_value_t = false)]
    pub test: bool,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 15)]
    pub epochs: usize,

    /// Initial learning rate
    #[arg(long, default_value_t = 0.001)]
    pub lr: f64,

    /// L2 penalty applied by the optimizer
    #[arg(long, visible_alias = "weight_decay", default_value_t = 0.001)]
    pub weight_decay: f64,

    /// Dropout probability on embeddings and between layers
    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    /// Ignored; kept so existing invocations still parse
    #[arg(long, default_value_t = 0.5)]
    pub momentum: f64,

    /// Epochs between learning-rate decays (0 disables decay)
    #[arg(long, default_value_t = 3)]
    pub step: usize,

    /// Multiplicative learning-rate decay factor
    #[arg(long, default_value_t = 0.1)]
    pub gamma: f64,

    /// Actually apply --weight-decay and the --step/--gamma schedule
    /// (off: constant learning rate, no L2 penalty)
    #[arg(long, visible_alias = "apply_decay", default_value_t = false)]
    pub apply_decay: bool,

    /// Hidden units per LSTM direction
    #[arg(long, visible_alias = "hidden_size", default_value_t = 128)]
    pub hidden_size: usize,

    /// Stacked bidirectional layers
    #[arg(long, visible_alias = "num_layers", default_value_t = 1)]
    pub num_layers: usize,

    /// Pool the hidden states with additive attention
    #[arg(long, default_value_t = false)]
    pub attention: bool,

    /// Directory holding ontonotes_ner_{train,val,test}.csv
    #[arg(long, visible_alias = "data_dir", default_value = "data")]
    pub data_dir: String,

    /// Checkpoints, model configs and vocabularies
    #[arg(long, visible_alias = "models_dir", default_value = "models")]
    pub models_dir: String,

    /// Loss plots and metric CSVs
    #[arg(long, visible_alias = "graphs_dir", default_value = "graphs")]
    pub graphs_dir: String,

    /// GloVe-format word vectors used to seed the embedding table
    #[arg(long, default_value = DEFAULT_VECTORS)]
    pub vectors: String,

    /// Width of the embedding table; must match the vectors file
    #[arg(long, visible_alias = "embedding_dim", default_value_t = 50)]
    pub embedding_dim: usize,

    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    pub device: DeviceArg,

    /// Seed for data-order shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// The application layer never sees clap types.
impl From<RunArgs> for RunConfig {
    fn from(a: RunArgs) -> Self {
        RunConfig {
            data_dir:      a.data_dir,
            models_dir:    a.models_dir,
            graphs_dir:    a.graphs_dir,
            vectors:       a.vectors,
            batch_size:    a.batch_size,
            test:          a.test,
            epochs:        a.epochs,
            lr:            a.lr,
            weight_decay:  a.weight_decay,
            dropout:       a.dropout,
            momentum:      a.momentum,
            step:          a.step,
            gamma:         a.gamma,
            apply_decay:   a.apply_decay,
            hidden_size:   a.hidden_size,
            num_layers:    a.num_layers,
            embedding_dim: a.embedding_dim,
            attention:     a.attention,
            device:        a.device.into(),
            seed:          a.seed,
        }
    }
}
