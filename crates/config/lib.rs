use log::info;
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("cannot read config {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("cannot parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub geo: Vec<String>,
    pub sex: Vec<String>,
    pub age: Vec<String>,
    pub first_year: i32,
    pub last_year: i32,
    pub dpi: u32,
    /// width, height in inches
    pub figure_size: (f64, f64),
    pub out_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            geo: vec!["LT".to_string(), "Lithuania".to_string()],
            sex: vec!["T".to_string(), "Total".to_string()],
            age: vec!["TOTAL".to_string(), "Total".to_string()],
            first_year: 1990,
            last_year: 2024,
            dpi: 150,
            figure_size: (10.0, 6.0),
            out_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Reads `filename`, falling back to the defaults when it does not exist.
    pub fn new<P: AsRef<Path>>(filename: P) -> Result<Config> {
        let path = filename.as_ref();
        if !path.exists() {
            info!("config {:?} not found, using defaults", path);
            return Ok(Config::default());
        }
        let reader = File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_reader(reader).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!("config loaded: {:?}", path);
        Ok(config)
    }

    pub fn from_str(content: &str) -> Result<Config> {
        let config: Config = serde_yaml::from_str(content).map_err(|source| Error::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.first_year > self.last_year {
            return Err(Error::Invalid(format!(
                "first_year {} is after last_year {}",
                self.first_year, self.last_year
            )));
        }
        if self.dpi == 0 {
            return Err(Error::Invalid("dpi must be positive".to_string()));
        }
        let (w, h) = self.figure_size;
        if !(w > 0.0 && h > 0.0) {
            return Err(Error::Invalid(format!(
                "figure_size must be positive, got {}x{}",
                w, h
            )));
        }
        for (name, labels) in [("geo", &self.geo), ("sex", &self.sex), ("age", &self.age)] {
            if labels.is_empty() {
                return Err(Error::Invalid(format!("{} needs at least one label", name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_config() {
        let content = r##"geo: [LT]
sex: [T]
age: [TOTAL, Y_GE85]
first_year: 2000
last_year: 2020
dpi: 300
figure_size: [8.0, 4.5]
out_dir: charts
"##;
        let config = Config::from_str(content).unwrap();
        println!("{:?}", config);
        assert_eq!(config.geo, &["LT"]);
        assert_eq!(config.sex, &["T"]);
        assert_eq!(config.age, &["TOTAL", "Y_GE85"]);
        assert_eq!(config.first_year, 2000);
        assert_eq!(config.last_year, 2020);
        assert_eq!(config.dpi, 300);
        assert_eq!(config.figure_size, (8.0, 4.5));
        assert_eq!(config.out_dir, PathBuf::from("charts"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = Config::from_str("dpi: 72\n").unwrap();
        assert_eq!(config.dpi, 72);
        assert_eq!(config.geo, &["LT", "Lithuania"]);
        assert_eq!(config.first_year, 1990);
        assert_eq!(config.last_year, 2024);
        assert_eq!(config.figure_size, (10.0, 6.0));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::new("does-not-exist.lt-population.yml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_year_range() {
        let err = Config::from_str("first_year: 2025\nlast_year: 2024\n").unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
    }

    #[test]
    fn test_zero_dpi() {
        assert!(matches!(
            Config::from_str("dpi: 0\n").unwrap_err(),
            Error::Invalid(_)
        ));
    }

    #[test]
    fn test_unknown_key() {
        assert!(matches!(
            Config::from_str("colour: red\n").unwrap_err(),
            Error::Parse { .. }
        ));
    }
}
