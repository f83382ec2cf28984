//! Command line arguments

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use id_text_locator::CandidateStrategy;

#[derive(Parser, Debug)]
#[command(
    name = "id-text-locator",
    version,
    about = "Locate text regions on photographed ID documents"
)]
pub struct Cli {
    /// Input images
    #[arg(required_unless_present = "print_config")]
    pub images: Vec<PathBuf>,

    /// Candidate generation strategy (overrides the config file)
    #[arg(short, long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// TOML config file (default: <config dir>/id-text-locator/config.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Report boxes in input image coordinates instead of normalized ones
    #[arg(long, default_value_t = false)]
    pub original_coords: bool,

    /// Worker threads for multi-image runs (default: number of CPUs)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Print the effective config as TOML and exit
    #[arg(long, default_value_t = false)]
    pub print_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum StrategyArg {
    /// MSER regions clustered into text lines
    RegionGrowing,
    /// Threshold + erosion field blobs split into tokens
    Morphological,
}

impl From<StrategyArg> for CandidateStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::RegionGrowing => CandidateStrategy::RegionGrowing,
            StrategyArg::Morphological => CandidateStrategy::MorphologicalThreshold,
        }
    }
}

impl Cli {
    /// Log filter directive for the requested verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Worker thread count
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(num_cpus::get).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["id-text-locator", "a.jpg"]).unwrap();
        assert_eq!(cli.images, vec![PathBuf::from("a.jpg")]);
        assert!(cli.strategy.is_none());
        assert!(!cli.original_coords);
        assert_eq!(cli.log_level(), "warn");
        assert!(cli.effective_jobs() >= 1);
    }

    #[test]
    fn test_parse_strategy_and_verbosity() {
        let cli = Cli::try_parse_from([
            "id-text-locator",
            "-s",
            "morphological",
            "-vv",
            "--jobs",
            "0",
            "a.jpg",
            "b.jpg",
        ])
        .unwrap();
        assert_eq!(cli.strategy, Some(StrategyArg::Morphological));
        assert_eq!(
            CandidateStrategy::from(StrategyArg::Morphological),
            CandidateStrategy::MorphologicalThreshold
        );
        assert_eq!(cli.log_level(), "debug");
        assert_eq!(cli.effective_jobs(), 1);
        assert_eq!(cli.images.len(), 2);
    }

    #[test]
    fn test_images_required() {
        assert!(Cli::try_parse_from(["id-text-locator"]).is_err());
        assert!(Cli::try_parse_from(["id-text-locator", "--print-config"]).is_ok());
    }
}
