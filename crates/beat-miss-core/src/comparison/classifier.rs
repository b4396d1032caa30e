//! Beat classifier.
//!
//! Two policies live side by side. The binary flag (`is_beat`) is strict:
//! anything not strictly above zero is "not beat", and it is what
//! `total_beats` counts. The tri-state status (`tri_state`) adds an Inline
//! zone of configurable width around zero for reporting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BeatMissError;
use crate::types::{Bps, Metric, Percent};
use crate::BeatMissResult;

/// Outcome of a single metric comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BeatStatus {
    Beat,
    Inline,
    Miss,
}

impl BeatStatus {
    pub const ALL: [BeatStatus; 3] = [BeatStatus::Beat, BeatStatus::Inline, BeatStatus::Miss];

    pub fn as_str(&self) -> &'static str {
        match self {
            BeatStatus::Beat => "Beat",
            BeatStatus::Inline => "Inline",
            BeatStatus::Miss => "Miss",
        }
    }
}

impl fmt::Display for BeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BeatStatus {
    type Err = BeatMissError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Beat" => Ok(BeatStatus::Beat),
            "Inline" => Ok(BeatStatus::Inline),
            "Miss" => Ok(BeatStatus::Miss),
            other => Err(BeatMissError::InvalidInput {
                field: "flag".into(),
                reason: format!("'{other}' is not one of Beat, Inline, Miss"),
            }),
        }
    }
}

/// Half-width of the Inline zone around zero.
///
/// `percent` applies to the ratio metrics (sales, EBITDA, PAT), `bps` to
/// the margin spreads. Both default to zero, a strict threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineBand {
    pub percent: Percent,
    pub bps: Bps,
}

impl InlineBand {
    pub fn new(percent: Percent, bps: Bps) -> Self {
        InlineBand { percent, bps }
    }

    pub fn for_metric(&self, metric: Metric) -> Decimal {
        if metric.is_margin() {
            self.bps
        } else {
            self.percent
        }
    }

    pub fn validate(&self) -> BeatMissResult<()> {
        if self.percent < Decimal::ZERO {
            return Err(BeatMissError::InvalidInput {
                field: "inline_band.percent".into(),
                reason: "Inline band cannot be negative".into(),
            });
        }
        if self.bps < Decimal::ZERO {
            return Err(BeatMissError::InvalidInput {
                field: "inline_band.bps".into(),
                reason: "Inline band cannot be negative".into(),
            });
        }
        Ok(())
    }
}

/// True iff the difference is present and strictly greater than zero.
pub fn is_beat(difference: Option<Decimal>) -> bool {
    matches!(difference, Some(d) if d > Decimal::ZERO)
}

/// Beat above `+band`, Miss below `-band`, Inline otherwise.
///
/// Returns `None` when the difference itself is undefined.
pub fn tri_state(difference: Option<Decimal>, inline_band: Decimal) -> Option<BeatStatus> {
    let d = difference?;
    Some(if d > inline_band {
        BeatStatus::Beat
    } else if d < -inline_band {
        BeatStatus::Miss
    } else {
        BeatStatus::Inline
    })
}

/// Count of beaten metrics; every metric weighs the same.
pub fn total_beats<I>(flags: I) -> u32
where
    I: IntoIterator<Item = bool>,
{
    flags.into_iter().filter(|&f| f).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_is_beat_thresholds() {
        assert!(!is_beat(None));
        assert!(!is_beat(Some(dec!(0))));
        assert!(!is_beat(Some(dec!(-3.2))));
        assert!(is_beat(Some(dec!(0.0001))));
    }

    #[test]
    fn test_tri_state_strict_band() {
        assert_eq!(tri_state(Some(dec!(0.5)), dec!(0)), Some(BeatStatus::Beat));
        assert_eq!(tri_state(Some(dec!(0)), dec!(0)), Some(BeatStatus::Inline));
        assert_eq!(tri_state(Some(dec!(-0.5)), dec!(0)), Some(BeatStatus::Miss));
    }

    #[test]
    fn test_tri_state_with_tolerance() {
        let band = dec!(2);
        assert_eq!(tri_state(Some(dec!(1.9)), band), Some(BeatStatus::Inline));
        assert_eq!(tri_state(Some(dec!(2)), band), Some(BeatStatus::Inline));
        assert_eq!(tri_state(Some(dec!(-2)), band), Some(BeatStatus::Inline));
        assert_eq!(tri_state(Some(dec!(2.01)), band), Some(BeatStatus::Beat));
        assert_eq!(tri_state(Some(dec!(-2.01)), band), Some(BeatStatus::Miss));
    }

    #[test]
    fn test_tri_state_absent() {
        assert_eq!(tri_state(None, dec!(1)), None);
    }

    #[test]
    fn test_total_beats_counts_true_flags() {
        assert_eq!(total_beats([true, false, true, true, false]), 3);
        assert_eq!(total_beats(Vec::<bool>::new()), 0);
    }

    #[test]
    fn test_inline_band_per_metric() {
        let band = InlineBand::new(dec!(1.5), dec!(25));
        assert_eq!(band.for_metric(Metric::Sales), dec!(1.5));
        assert_eq!(band.for_metric(Metric::EbitdaMargin), dec!(25));
    }

    #[test]
    fn test_negative_band_rejected() {
        let band = InlineBand::new(dec!(-1), dec!(0));
        match band.validate().unwrap_err() {
            BeatMissError::InvalidInput { field, .. } => assert_eq!(field, "inline_band.percent"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_beat_status_parse() {
        assert_eq!("Inline".parse::<BeatStatus>().unwrap(), BeatStatus::Inline);
        assert!("beat!".parse::<BeatStatus>().is_err());
    }
}
