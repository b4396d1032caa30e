//! Flat broker-estimate rows as exported by the filter-driven dashboard.
//!
//! Numeric columns are coerced leniently: blanks and unparsable text
//! become `None` rather than failing the whole load.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::comparison::classifier::{tri_state, BeatStatus, InlineBand};
use crate::comparison::metrics::percent_difference;
use crate::error::BeatMissError;
use crate::types::{Metric, Money, Percent};
use crate::BeatMissResult;

/// Header columns an estimate export must carry, even when blank.
pub const REQUIRED_COLUMNS: [&str; 19] = [
    "co_code",
    "nsesymbol",
    "broker_name",
    "sales",
    "pat",
    "ebitda",
    "picked_type",
    "expected_sales",
    "expected_ebitda",
    "expected_pat",
    "ebitda_margin_percent",
    "pat_margin_percent",
    "sales_beat",
    "pat_beat",
    "ebitda_beat",
    "sales_flag",
    "pat_flag",
    "ebitda_flag",
    "overall_flag",
];

/// One broker's estimate for one company and period, with the actuals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimateRow {
    #[serde(default)]
    pub co_code: Option<String>,
    #[serde(default)]
    pub nsesymbol: Option<String>,
    #[serde(default)]
    pub broker_name: Option<String>,
    #[serde(default)]
    pub picked_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub sales: Option<Money>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub pat: Option<Money>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub ebitda: Option<Money>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub expected_sales: Option<Money>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub expected_ebitda: Option<Money>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub expected_pat: Option<Money>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub ebitda_margin_percent: Option<Percent>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub pat_margin_percent: Option<Percent>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub sales_beat: Option<Percent>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub pat_beat: Option<Percent>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub ebitda_beat: Option<Percent>,

    #[serde(default, deserialize_with = "lenient_status")]
    pub sales_flag: Option<BeatStatus>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub pat_flag: Option<BeatStatus>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub ebitda_flag: Option<BeatStatus>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub overall_flag: Option<BeatStatus>,
}

impl EstimateRow {
    /// Stored flag for sales, EBITDA or PAT.
    pub fn flag(&self, metric: Metric) -> Option<BeatStatus> {
        match metric {
            Metric::Sales => self.sales_flag,
            Metric::Ebitda => self.ebitda_flag,
            Metric::Pat => self.pat_flag,
            Metric::EbitdaMargin | Metric::PatMargin => None,
        }
    }
}

/// Reject a header row that lacks any of [`REQUIRED_COLUMNS`].
///
/// The error lists every missing column in declaration order.
pub fn validate_columns<'a, I>(headers: I) -> BeatMissResult<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = headers.into_iter().map(str::trim).collect();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !present.contains(column))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(BeatMissError::InvalidInput {
        field: "columns".into(),
        reason: format!("Missing required columns: {missing:?}"),
    })
}

/// Recompute the three amount flags (and beat percentages) of a row from
/// its actual and expected values.
///
/// For exports that carry values but no flags. `overall_flag` is left as
/// supplied.
pub fn classify_row(row: &EstimateRow, band: &InlineBand) -> EstimateRow {
    let sales_beat = percent_difference(row.sales, row.expected_sales);
    let ebitda_beat = percent_difference(row.ebitda, row.expected_ebitda);
    let pat_beat = percent_difference(row.pat, row.expected_pat);

    EstimateRow {
        sales_beat,
        ebitda_beat,
        pat_beat,
        sales_flag: tri_state(sales_beat, band.for_metric(Metric::Sales)),
        ebitda_flag: tri_state(ebitda_beat, band.for_metric(Metric::Ebitda)),
        pat_flag: tri_state(pat_beat, band.for_metric(Metric::Pat)),
        ..row.clone()
    }
}

// ---------------------------------------------------------------------------
// Lenient coercion
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCell {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let t = text.trim().replace(',', "");
    if t.is_empty() {
        return None;
    }
    Decimal::from_str(&t)
        .or_else(|_| Decimal::from_scientific(&t))
        .ok()
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawCell> = Option::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(RawCell::Bool(_)) => None,
        Some(RawCell::Int(i)) => Some(Decimal::from(i)),
        Some(RawCell::Float(f)) if f.is_finite() => parse_decimal(&f.to_string()),
        Some(RawCell::Float(_)) => None,
        Some(RawCell::Text(s)) => parse_decimal(&s),
    })
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<BeatStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_columns_accepts_full_header() {
        let mut headers: Vec<&str> = REQUIRED_COLUMNS.iter().rev().copied().collect();
        headers.push("extra_column");
        assert!(validate_columns(headers).is_ok());
    }

    #[test]
    fn test_validate_columns_names_missing() {
        let headers = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| *c != "nsesymbol" && *c != "sales_flag");
        let err = validate_columns(headers).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Invalid input: columns: Missing required columns: ["nsesymbol", "sales_flag"]"#
        );
    }

    #[test]
    fn test_coerces_numbers_and_text() {
        let row: EstimateRow = serde_json::from_value(serde_json::json!({
            "nsesymbol": "ACME",
            "broker_name": "Kotak",
            "sales": 1000,
            "pat": "101.5",
            "ebitda": "n/a",
            "expected_sales": 950.25,
            "expected_pat": "1,020",
            "expected_ebitda": null,
            "sales_flag": "Beat",
            "pat_flag": "beat",
        }))
        .unwrap();

        assert_eq!(row.sales, Some(dec!(1000)));
        assert_eq!(row.pat, Some(dec!(101.5)));
        assert_eq!(row.ebitda, None);
        assert_eq!(row.expected_sales, Some(dec!(950.25)));
        assert_eq!(row.expected_pat, Some(dec!(1020)));
        assert_eq!(row.expected_ebitda, None);
        assert_eq!(row.sales_flag, Some(BeatStatus::Beat));
        assert_eq!(row.pat_flag, None);
        assert_eq!(row.overall_flag, None);
    }

    #[test]
    fn test_classify_row_with_band() {
        let row = EstimateRow {
            sales: Some(dec!(101)),
            expected_sales: Some(dec!(100)),
            ebitda: Some(dec!(120)),
            expected_ebitda: Some(dec!(100)),
            pat: Some(dec!(80)),
            expected_pat: Some(dec!(100)),
            overall_flag: Some(BeatStatus::Inline),
            ..Default::default()
        };
        let classified = classify_row(&row, &InlineBand::new(dec!(2), dec!(0)));
        assert_eq!(classified.sales_flag, Some(BeatStatus::Inline));
        assert_eq!(classified.ebitda_flag, Some(BeatStatus::Beat));
        assert_eq!(classified.pat_flag, Some(BeatStatus::Miss));
        assert_eq!(classified.sales_beat, Some(dec!(1)));
        assert_eq!(classified.overall_flag, Some(BeatStatus::Inline));
    }

    #[test]
    fn test_classify_row_missing_expected() {
        let row = EstimateRow {
            sales: Some(dec!(101)),
            ..Default::default()
        };
        let classified = classify_row(&row, &InlineBand::default());
        assert_eq!(classified.sales_flag, None);
        assert_eq!(classified.sales_beat, None);
    }
}
