//! INI file configuration adapter.

use crate::domain::error::TradebotError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TradebotError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| TradebotError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TradebotError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TradebotError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[backtest]
start_cash = 10000
fee = 0.00075
strategies = macd_rsi, donchian

[optimizer]
min_trades = 4
parallel = off

[donchian]
ch = 30
atr_mult = 2.5

[data]
dir = /var/lib/tradebot/bars
symbol = BTCUSDT
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn reads_every_section() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_double("backtest", "start_cash", 0.0), 10000.0);
        assert_eq!(adapter.get_double("backtest", "fee", 0.0), 0.00075);
        assert_eq!(
            adapter.get_string("backtest", "strategies"),
            Some("macd_rsi, donchian".to_string())
        );
        assert_eq!(adapter.get_int("optimizer", "min_trades", 6), 4);
        assert_eq!(adapter.get_int("donchian", "ch", 20), 30);
        assert_eq!(adapter.get_double("donchian", "atr_mult", 2.0), 2.5);
        assert_eq!(
            adapter.get_string("data", "symbol"),
            Some("BTCUSDT".to_string())
        );
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("bollinger", "bb_period"), None);
        assert_eq!(adapter.get_int("donchian", "exit_ch", 10), 10);
        assert_eq!(adapter.get_double("optimizer", "max_dd_cap", 0.25), 0.25);
        assert!(adapter.get_bool("missing", "parallel", true));
    }

    #[test]
    fn non_numeric_values_fall_back_to_defaults() {
        let adapter =
            FileConfigAdapter::from_string("[sma_cross]\nfast = ten\ntrail_pct = lots\n").unwrap();
        assert_eq!(adapter.get_int("sma_cross", "fast", 10), 10);
        assert_eq!(adapter.get_double("sma_cross", "trail_pct", 0.02), 0.02);
    }

    #[test]
    fn bool_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[optimizer]\na = true\nb = yes\nc = 1\nd = off\ne = no\nf = 0\ng = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("optimizer", "a", false));
        assert!(adapter.get_bool("optimizer", "b", false));
        assert!(adapter.get_bool("optimizer", "c", false));
        assert!(!adapter.get_bool("optimizer", "d", true));
        assert!(!adapter.get_bool("optimizer", "e", true));
        assert!(!adapter.get_bool("optimizer", "f", true));
        assert!(adapter.get_bool("optimizer", "g", true));
        assert!(!adapter.get_bool("optimizer", "parallel", false));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config(SAMPLE);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert!(!adapter.get_bool("optimizer", "parallel", true));
    }

    #[test]
    fn from_file_missing_is_a_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/tradebot.ini").unwrap_err();
        assert!(matches!(err, TradebotError::ConfigParse { file, .. } if file.contains("tradebot.ini")));
    }
}
