// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, hands them to a use case and
// prints the result. Three commands:
//   1. `init`     - build and save a cascade checkpoint
//   2. `estimate` - per-stage illuminants for images
//   3. `summary`  - parameter counts and map sizes

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EstimateArgs, InitArgs, SummaryArgs};

#[derive(Parser, Debug)]
#[command(
    name = "c4-illuminant",
    version,
    about = "Cascaded convolutional color constancy: estimate the scene illuminant of images."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init(args)     => run_init(args),
            Commands::Estimate(args) => run_estimate(args),
            Commands::Summary(args)  => run_summary(args),
        }
    }
}

fn run_init(args: InitArgs) -> Result<()> {
    use crate::application::init_use_case::InitUseCase;

    let cfg = InitUseCase::new(args.into()).execute()?;
    println!(
        "Saved {}-stage {} cascade (SqueezeNet {}).",
        cfg.num_stages, cfg.backbone, cfg.version,
    );
    Ok(())
}

fn run_estimate(args: EstimateArgs) -> Result<()> {
    use crate::application::estimate_use_case::EstimateUseCase;
    use crate::domain::illuminant::Illuminant;

    tracing::info!("Estimating illuminants for {} input(s)", args.inputs.len());
    let estimates = EstimateUseCase::new(args.into())?.execute()?;

    for estimate in &estimates {
        println!("{}", estimate.source);
        for (i, stage) in estimate.stages.iter().enumerate() {
            println!("  stage {}: r={:.4} g={:.4} b={:.4}", i + 1, stage.r, stage.g, stage.b);
        }
        let combined = estimate.combined();
        println!("  combined: r={:.4} g={:.4} b={:.4}", combined.r, combined.g, combined.b);
        let [cr, cg, cb] = combined.chromaticity();
        println!(
            "  chromaticity: r={cr:.4} g={cg:.4} b={cb:.4}, {:.2} deg from neutral",
            combined.angular_error(&Illuminant::neutral()),
        );
        if let Some(last) = estimate.final_stage() {
            tracing::debug!(
                "{}: final stage is {:.2} deg from neutral",
                estimate.source,
                last.angular_error(&Illuminant::neutral()),
            );
        }
    }
    Ok(())
}

fn run_summary(args: SummaryArgs) -> Result<()> {
    use crate::application::summary_use_case::SummaryUseCase;

    let size = args.input_size;
    let summary = SummaryUseCase::new(args.into()).execute()?;
    for (i, params) in summary.stage_params.iter().enumerate() {
        println!("stage {}: {} parameters", i + 1, params);
    }
    println!("total: {} parameters", summary.total_params());
    println!(
        "input {size}x{size} -> features {f}x{f} -> illuminant map {o}x{o}",
        f = summary.features_len,
        o = summary.output_len,
    );
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backbone::{BackboneKind, ResNetDepth, SqueezeNetVersion};

    #[test]
    fn test_init_defaults() {
        let cli = Cli::try_parse_from(["c4-illuminant", "init"]).unwrap();
        let Commands::Init(args) = cli.command else { panic!("expected init") };
        assert_eq!(args.version, SqueezeNetVersion::V1_1);
        assert_eq!(args.backbone, BackboneKind::SqueezeNet);
        assert_eq!(args.num_stages, 3);
        assert!(args.weights_dir.is_none());
    }

    #[test]
    fn test_backbone_and_version_flags() {
        let cli = Cli::try_parse_from([
            "c4-illuminant", "summary", "--version", "1.0", "--backbone", "hybrid-resnet18",
        ])
        .unwrap();
        let Commands::Summary(args) = cli.command else { panic!("expected summary") };
        assert_eq!(args.version, SqueezeNetVersion::V1_0);
        assert_eq!(args.backbone, BackboneKind::Hybrid(ResNetDepth::R18));
    }

    #[test]
    fn test_bad_version_rejected() {
        let err = Cli::try_parse_from(["c4-illuminant", "summary", "--version", "2.0"]).unwrap_err();
        assert!(err.to_string().contains("Unsupported SqueezeNet version"));
    }

    #[test]
    fn test_estimate_requires_inputs() {
        assert!(Cli::try_parse_from(["c4-illuminant", "estimate"]).is_err());
    }
}
