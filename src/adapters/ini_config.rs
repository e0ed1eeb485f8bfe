//! INI file configuration adapter.

use configparser::ini::Ini;
use std::path::Path;

use crate::domain::error::OppscanError;
use crate::ports::config::ConfigPort;

pub struct IniConfigAdapter {
    config: Ini,
}

impl IniConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, OppscanError> {
        let mut config = Ini::new();
        config.load(&path).map_err(|e| OppscanError::ConfigParse {
            file: path.as_ref().display().to_string(),
            reason: e,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, OppscanError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|e| OppscanError::ConfigParse {
                file: "<inline>".into(),
                reason: e,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for IniConfigAdapter {
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
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[data]
csv_path = /var/data/prices

[scan]
symbols = AAPL,MSFT,GOOG
top_n = 10
"#;
        let adapter = IniConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "csv_path"),
            Some("/var/data/prices".to_string())
        );
        assert_eq!(
            adapter.get_string("scan", "symbols"),
            Some("AAPL,MSFT,GOOG".to_string())
        );
        assert_eq!(adapter.get_int("scan", "top_n", 20), 10);
    }

    #[test]
    fn missing_key_is_none() {
        let adapter = IniConfigAdapter::from_string("[scan]\ntop_n = 5\n").unwrap();
        assert_eq!(adapter.get_string("scan", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn int_falls_back_on_non_numeric() {
        let adapter = IniConfigAdapter::from_string("[scan]\ntop_n = lots\n").unwrap();
        assert_eq!(adapter.get_int("scan", "top_n", 42), 42);
    }

    #[test]
    fn double_parses_value() {
        let adapter =
            IniConfigAdapter::from_string("[backtest]\ninitial_capital = 100000.5\n").unwrap();
        assert_eq!(
            adapter.get_double("backtest", "initial_capital", 0.0),
            100000.5
        );
    }

    #[test]
    fn bool_accepts_common_spellings() {
        let adapter =
            IniConfigAdapter::from_string("[scan]\na = true\nb = yes\nc = 0\n").unwrap();
        assert!(adapter.get_bool("scan", "a", false));
        assert!(adapter.get_bool("scan", "b", false));
        assert!(!adapter.get_bool("scan", "c", true));
        assert!(adapter.get_bool("scan", "missing", true));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[data]\nsource = synthetic\nseed = 42\n").unwrap();

        let adapter = IniConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("data", "source"),
            Some("synthetic".to_string())
        );
        assert_eq!(adapter.get_int("data", "seed", 0), 42);
    }

    #[test]
    fn missing_file_is_config_parse_error() {
        let result = IniConfigAdapter::from_file("/nonexistent/oppscan.ini");
        assert!(matches!(result, Err(OppscanError::ConfigParse { .. })));
    }
}
