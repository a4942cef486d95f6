// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// The three subcommands and their flags. Backbone and version
// flags parse straight into domain types through their FromStr
// impls, so invalid values are rejected by clap itself.

use clap::{Args, Subcommand};

use crate::application::{
    estimate_use_case::EstimateConfig,
    init_use_case::InitConfig,
    summary_use_case::SummaryConfig,
};
use crate::domain::backbone::{BackboneKind, SqueezeNetVersion};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a cascade (optionally from pretrained backbones) and save it
    Init(InitArgs),

    /// Estimate the scene illuminant of one or more images
    Estimate(EstimateArgs),

    /// Print parameter counts and map sizes for a configuration
    Summary(SummaryArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where the cascade checkpoint is written
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Directory holding squeezenet1_0 / squeezenet1_1 / resnet18 / resnet34
    /// records. Stages are randomly initialised when omitted.
    #[arg(long)]
    pub weights_dir: Option<String>,

    /// SqueezeNet layout: 1.0 or 1.1
    #[arg(long, default_value = "1.1")]
    pub version: SqueezeNetVersion,

    /// squeezenet, hybrid-resnet18 or hybrid-resnet34
    #[arg(long, default_value = "squeezenet")]
    pub backbone: BackboneKind,

    /// Number of cascaded stages
    #[arg(long, default_value_t = 3)]
    pub num_stages: usize,

    /// Dropout probability inside each illuminant head
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,
}

impl From<InitArgs> for InitConfig {
    fn from(a: InitArgs) -> Self {
        InitConfig {
            checkpoint_dir: a.checkpoint_dir,
            weights_dir:    a.weights_dir,
            version:        a.version,
            backbone:       a.backbone,
            num_stages:     a.num_stages,
            dropout:        a.dropout,
        }
    }
}

#[derive(Args, Debug)]
pub struct EstimateArgs {
    /// Image files or directories
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Directory written by `init`
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Images are resized to this square size before estimation
    #[arg(long, default_value_t = 256)]
    pub input_size: u32,

    /// Images per forward pass
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    /// Append per-stage estimates to this CSV file
    #[arg(long)]
    pub report_csv: Option<String>,

    /// Write white-balanced full-resolution PNGs here
    #[arg(long)]
    pub corrected_dir: Option<String>,
}

impl From<EstimateArgs> for EstimateConfig {
    fn from(a: EstimateArgs) -> Self {
        EstimateConfig {
            checkpoint_dir: a.checkpoint_dir,
            inputs:         a.inputs,
            input_size:     a.input_size,
            batch_size:     a.batch_size,
            report_csv:     a.report_csv,
            corrected_dir:  a.corrected_dir,
        }
    }
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[arg(long, default_value = "1.1")]
    pub version: SqueezeNetVersion,

    #[arg(long, default_value = "squeezenet")]
    pub backbone: BackboneKind,

    #[arg(long, default_value_t = 3)]
    pub num_stages: usize,

    /// Square input side used for the shape trace
    #[arg(long, default_value_t = 256)]
    pub input_size: usize,
}

impl From<SummaryArgs> for SummaryConfig {
    fn from(a: SummaryArgs) -> Self {
        SummaryConfig {
            version:    a.version,
            backbone:   a.backbone,
            num_stages: a.num_stages,
            input_size: a.input_size,
        }
    }
}
