//! CSV file data adapter.
//!
//! One file per symbol, `<dir>/<SYMBOL>.csv`, with a header row naming the columns
//! `timestamp,open,high,low,close,volume` (any order). Timestamps are RFC 3339 or epoch
//! milliseconds.

use chrono::{DateTime, TimeZone, Utc};
use csv::StringRecord;
use std::path::PathBuf;
use tracing::debug;

use crate::domain::error::TradebotError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;

const COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

#[derive(Debug)]
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn data_error(reason: impl Into<String>) -> TradebotError {
    TradebotError::Data {
        reason: reason.into(),
    }
}

fn column_indices(headers: &StringRecord) -> Result<[usize; 6], TradebotError> {
    let mut out = [0usize; 6];
    for (slot, name) in out.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| data_error(format!("missing {} column", name)))?;
    }
    Ok(out)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TradebotError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .ok_or_else(|| data_error(format!("invalid timestamp: {}", raw)))
}

fn parse_field(record: &StringRecord, idx: usize, name: &str) -> Result<f64, TradebotError> {
    let raw = record
        .get(idx)
        .ok_or_else(|| data_error(format!("missing {} value", name)))?;
    raw.trim()
        .parse()
        .map_err(|e| data_error(format!("invalid {} value {:?}: {}", name, raw, e)))
}

/// An empty or unparseable close marks the bar as unusable rather than failing the file.
fn parse_close(record: &StringRecord, idx: usize) -> f64 {
    record
        .get(idx)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(f64::NAN)
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, TradebotError> {
        let path = self.csv_path(symbol);
        if !path.is_file() {
            return Err(TradebotError::NoData {
                symbol: symbol.to_string(),
            });
        }

        let mut rdr = csv::Reader::from_path(&path)
            .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))?;
        let headers = rdr
            .headers()
            .map_err(|e| data_error(format!("CSV header error: {}", e)))?
            .clone();
        let [ts_idx, open_idx, high_idx, low_idx, close_idx, volume_idx] =
            column_indices(&headers)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| data_error(format!("CSV parse error: {}", e)))?;
            let raw_ts = record
                .get(ts_idx)
                .ok_or_else(|| data_error("missing timestamp value"))?;
            bars.push(Bar {
                timestamp: parse_timestamp(raw_ts)?,
                open: parse_field(&record, open_idx, "open")?,
                high: parse_field(&record, high_idx, "high")?,
                low: parse_field(&record, low_idx, "low")?,
                close: parse_close(&record, close_idx),
                volume: parse_field(&record, volume_idx, "volume")?,
            });
        }

        let read = bars.len();
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        debug!(
            symbol,
            bars = bars.len(),
            duplicates = read - bars.len(),
            "loaded bars"
        );

        if bars.is_empty() {
            return Err(TradebotError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradebotError> {
        let entries = std::fs::read_dir(&self.base_path).map_err(|e| {
            data_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| data_error(format!("directory entry error: {}", e)))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "timestamp,open,high,low,close,volume\n\
            2024-01-15T00:02:00Z,105.0,115.0,100.0,110.0,6.5\n\
            2024-01-15T00:00:00Z,100.0,110.0,90.0,105.0,5.0\n\
            2024-01-15T00:01:00Z,105.0,112.0,101.0,,4.0\n\
            2024-01-15T00:02:00Z,999.0,999.0,999.0,999.0,1.0\n";

        fs::write(path.join("BTCUSDT.csv"), csv_content).unwrap();
        fs::write(
            path.join("ETHUSDT.csv"),
            "open,close,timestamp,high,low,volume\n\
             10.0,11.0,1705276800000,12.0,9.0,3.0\n",
        )
        .unwrap();
        fs::write(path.join("notes.txt"), "not data").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_bars_sorts_and_drops_duplicates() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let bars = adapter.fetch_bars("BTCUSDT").unwrap();

        assert_eq!(bars.len(), 3);
        assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 5.0);
        // first occurrence of the duplicated 00:02 bar wins
        assert_eq!(bars[2].close, 110.0);
    }

    #[test]
    fn empty_close_becomes_invalid_bar() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let bars = adapter.fetch_bars("BTCUSDT").unwrap();
        assert!(bars[1].close.is_nan());
        assert!(!bars[1].has_valid_close());
    }

    #[test]
    fn epoch_millis_and_column_order() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let bars = adapter.fetch_bars("ETHUSDT").unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(
            bars[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(bars[0].close, 11.0);
        assert_eq!(bars[0].high, 12.0);
    }

    #[test]
    fn missing_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let err = adapter.fetch_bars("XYZ").unwrap_err();
        assert!(matches!(err, TradebotError::NoData { symbol } if symbol == "XYZ"));
    }

    #[test]
    fn bad_open_is_a_data_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "timestamp,open,high,low,close,volume\n2024-01-15T00:00:00Z,x,1,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_bars("BAD").unwrap_err();
        assert!(matches!(err, TradebotError::Data { reason } if reason.contains("open")));
    }

    #[test]
    fn missing_column_is_a_data_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("BAD.csv"), "timestamp,open,high,low,close\n").unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_bars("BAD").unwrap_err();
        assert!(matches!(err, TradebotError::Data { reason } if reason.contains("volume")));
    }

    #[test]
    fn header_only_file_is_no_data() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("EMPTY.csv"),
            "timestamp,open,high,low,close,volume\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_bars("EMPTY").unwrap_err(),
            TradebotError::NoData { .. }
        ));
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["BTCUSDT", "ETHUSDT"]);
    }
}
