use serde::de::DeserializeOwned;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use beat_miss_core::summary::{validate_columns, EstimateRow};

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read a YAML settings file.
pub fn read_yaml<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read every estimate row of a headed CSV export.
pub fn read_estimate_csv(path: &str) -> Result<Vec<EstimateRow>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let file = fs::File::open(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_estimate_csv(file)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
}

/// Deserialise estimate rows from any reader once the header row carries
/// every required column.
pub fn parse_estimate_csv<R: Read>(
    reader: R,
) -> Result<Vec<EstimateRow>, Box<dyn std::error::Error>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    validate_columns(rdr.headers()?.iter())?;
    let rows = rdr.deserialize().collect::<Result<Vec<EstimateRow>, _>>()?;
    Ok(rows)
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beat_miss_core::comparison::BeatStatus;
    use rust_decimal::Decimal;

    const HEADER: &str = "co_code,nsesymbol,broker_name,picked_type,sales,pat,ebitda,\
expected_sales,expected_ebitda,expected_pat,ebitda_margin_percent,pat_margin_percent,\
sales_beat,pat_beat,ebitda_beat,sales_flag,pat_flag,ebitda_flag,overall_flag";

    #[test]
    fn test_parse_csv_estimate_rows() {
        let body = r#"101,ACME,Kotak,Standalone,1000,,200,950.5,,,,,,,,Beat,,,
101,ACME,Axis,Standalone,"1,020",12,200,n/a,,,,,,,,Miss,Inline,,
"#;
        let data = format!("{HEADER}\n{body}");
        let rows = parse_estimate_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sales, Some(Decimal::from(1000)));
        assert_eq!(rows[0].expected_sales, Some(Decimal::new(9505, 1)));
        assert_eq!(rows[0].sales_flag, Some(BeatStatus::Beat));
        assert_eq!(rows[0].pat, None);
        assert_eq!(rows[0].pat_flag, None);
        assert_eq!(rows[1].sales, Some(Decimal::from(1020)));
        assert_eq!(rows[1].expected_sales, None);
        assert_eq!(rows[1].pat_flag, Some(BeatStatus::Inline));
    }

    #[test]
    fn test_missing_columns_rejected() {
        let data = "nsesymbol,broker_name,sales,expected_sales\nACME,Kotak,1000,950\n";
        let err = parse_estimate_csv(data.as_bytes()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Missing required columns"));
        assert!(message.contains("\"co_code\""));
        assert!(message.contains("\"sales_flag\""));
        assert!(!message.contains("\"nsesymbol\""));
    }

    #[test]
    fn test_missing_file() {
        let err = read_json::<serde_json::Value>("does/not/exist.json").unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
    }
}
