// src/cli.rs
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, ADAPTIVE_OUTPUT};
use crate::error::{ChartError, Result};
use crate::services::layout::ScaleMode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ScaleArg {
    /// -25%..40% with ticks every 10%
    #[default]
    Fixed,
    /// Upper bound follows the best performer, annotated right axis
    Adaptive,
}

#[derive(Parser, Debug)]
#[command(name = "etf_compare")]
#[command(version, about = "Compare one-year returns of EIMI.L, CNDX.L, CBU0.L and IB01.L on a PNG chart")]
pub struct Cli {
    /// Where to write the chart (default: etfs_rok.png; fixed scale only)
    pub output: Option<PathBuf>,

    /// Y axis scaling
    #[arg(long, value_enum, default_value = "fixed")]
    pub scale: ScaleArg,

    /// Start the chart at the first date where every ticker has a price
    #[arg(long)]
    pub align_start: bool,
}

impl Cli {
    /// The adaptive chart always lands in `gem.png`, so an explicit output
    /// path is only accepted with the fixed scale.
    pub fn apply(&self, mut config: Config) -> Result<Config> {
        config.scale = match self.scale {
            ScaleArg::Fixed => ScaleMode::default(),
            ScaleArg::Adaptive => ScaleMode::adaptive(),
        };
        match (&self.output, self.scale) {
            (Some(output), ScaleArg::Adaptive) => {
                return Err(ChartError::Config(format!(
                    "output path {} cannot be combined with --scale adaptive",
                    output.display()
                )));
            }
            (Some(output), ScaleArg::Fixed) => config.output_path = output.clone(),
            (None, ScaleArg::Adaptive) => config.output_path = PathBuf::from(ADAPTIVE_OUTPUT),
            (None, ScaleArg::Fixed) => {}
        }
        config.align_start = self.align_start;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_keeps_defaults() {
        let cli = Cli::try_parse_from(["etf_compare"]).unwrap();
        let config = cli.apply(Config::default()).unwrap();
        assert_eq!(config.output_path, PathBuf::from("etfs_rok.png"));
        assert_eq!(config.scale, ScaleMode::default());
        assert!(!config.align_start);
    }

    #[test]
    fn positional_output_and_flags() {
        let cli = Cli::try_parse_from(["etf_compare", "out/year.png", "--align-start"]).unwrap();
        let config = cli.apply(Config::default()).unwrap();
        assert_eq!(config.output_path, PathBuf::from("out/year.png"));
        assert_eq!(config.scale, ScaleMode::default());
        assert!(config.align_start);
    }

    #[test]
    fn adaptive_scale_writes_gem_png() {
        let cli = Cli::try_parse_from(["etf_compare", "--scale", "adaptive"]).unwrap();
        let config = cli.apply(Config::default()).unwrap();
        assert!(config.scale.is_adaptive());
        assert_eq!(config.output_path, PathBuf::from("gem.png"));
    }

    #[test]
    fn adaptive_scale_rejects_output_path() {
        let cli = Cli::try_parse_from(["etf_compare", "out/year.png", "--scale", "adaptive"]).unwrap();
        assert!(matches!(cli.apply(Config::default()), Err(ChartError::Config(_))));
    }

    #[test]
    fn rejects_extra_positionals() {
        assert!(Cli::try_parse_from(["etf_compare", "a.png", "b.png"]).is_err());
    }
}
