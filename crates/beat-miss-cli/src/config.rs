use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use tracing::debug;

use beat_miss_core::config::{LookupKey, MetricSet};
use beat_miss_core::{ComparisonConfig, Metric};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LookupArg {
    Id,
    Name,
}

impl From<LookupArg> for LookupKey {
    fn from(arg: LookupArg) -> Self {
        match arg {
            LookupArg::Id => LookupKey::Id,
            LookupArg::Name => LookupKey::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MetricArg {
    Sales,
    Ebitda,
    Pat,
    EbitdaMargin,
    PatMargin,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Sales => Metric::Sales,
            MetricArg::Ebitda => Metric::Ebitda,
            MetricArg::Pat => Metric::Pat,
            MetricArg::EbitdaMargin => Metric::EbitdaMargin,
            MetricArg::PatMargin => Metric::PatMargin,
        }
    }
}

/// Flags that override the settings file
#[derive(Args, Debug, Default)]
pub struct ConfigOverrides {
    /// Inline band for sales/EBITDA/PAT, in percent
    #[arg(long)]
    pub inline_band_pct: Option<Decimal>,

    /// Inline band for margins, in basis points
    #[arg(long)]
    pub inline_band_bps: Option<Decimal>,

    /// Interpret the company key as an identifier or a display name
    #[arg(long)]
    pub lookup_key: Option<LookupArg>,

    /// Metrics to compare (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub metrics: Option<Vec<MetricArg>>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut ComparisonConfig) {
        if let Some(pct) = self.inline_band_pct {
            config.inline_band.percent = pct;
        }
        if let Some(bps) = self.inline_band_bps {
            config.inline_band.bps = bps;
        }
        if let Some(key) = self.lookup_key {
            config.lookup_key = key.into();
        }
        if let Some(ref metrics) = self.metrics {
            config.metrics = MetricSet::new(metrics.iter().copied().map(Metric::from));
        }
    }
}

/// Settings file (or `base`, or defaults) with flag overrides applied.
pub fn resolve_config(
    path: Option<&str>,
    base: Option<ComparisonConfig>,
    overrides: &ConfigOverrides,
) -> Result<ComparisonConfig, Box<dyn std::error::Error>> {
    let mut config = match (base, path) {
        (Some(config), _) => config,
        (None, Some(p)) => {
            debug!(path = p, "loading settings file");
            input::file::read_yaml(p)?
        }
        (None, None) => ComparisonConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}
