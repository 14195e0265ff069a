use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use gasto_api::{ClientConfig, Endpoints, Messages};
use gasto_core::UserSettings;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::state::ensure_gasto_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiSection,
    pub display: DisplaySection,
    pub messages: Messages,
    pub recommendations: RecommendationsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    pub timeout_secs: u64,
    /// `limit` sent with transaction list requests
    pub transactions_limit: u32,
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplaySection {
    /// 0 for whole pesos, 2 for cents
    pub fraction_digits: u32,
    /// IANA zone used to pick "this month"
    pub timezone: String,
}

/// Where the recommendations panel gets its list from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    /// The backend's recommendations endpoint
    #[default]
    Server,
    /// Derived here from the transaction list
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RecommendationsSection {
    pub source: RecommendationSource,
    pub savings_goal: Option<Decimal>,
    pub spending_limit: Option<Decimal>,
}

impl Default for ApiSection {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            base_url: client.base_url,
            timeout_secs: client.timeout.as_secs(),
            transactions_limit: 500,
            endpoints: client.endpoints,
        }
    }
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            fraction_digits: 0,
            timezone: "America/Bogota".to_string(),
        }
    }
}

impl Config {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api.base_url.clone(),
            endpoints: self.api.endpoints.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs.max(1)),
        }
    }

    pub fn user_settings(&self) -> UserSettings {
        UserSettings {
            savings_goal: self.recommendations.savings_goal,
            spending_limit: self.recommendations.spending_limit,
        }
    }

    /// Rejects values serde accepts but the panels can't use
    pub fn validate(&self) -> Result<()> {
        let digits = self.display.fraction_digits;
        if digits != 0 && digits != 2 {
            bail!("display.fraction_digits must be 0 or 2, got {digits}");
        }
        self.timezone()?;
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz> {
        let tz = &self.display.timezone;
        tz.parse::<Tz>()
            .map_err(|_| anyhow::anyhow!("invalid timezone in config: {tz}"))
    }

    /// Today's date in the configured zone
    pub fn today(&self) -> Result<NaiveDate> {
        Ok(Utc::now().with_timezone(&self.timezone()?).date_naive())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_gasto_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    cfg.validate().with_context(|| format!("invalid config {}", p.display()))?;
    Ok(cfg)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://gastosmart.example"

            [recommendations]
            source = "local"
            spending_limit = 1500000
            "#,
        )
        .unwrap();

        assert_eq!(cfg.api.base_url, "https://gastosmart.example");
        assert_eq!(cfg.api.transactions_limit, 500);
        assert_eq!(cfg.api.endpoints, Endpoints::default());
        assert_eq!(cfg.display.timezone, "America/Bogota");
        assert_eq!(cfg.recommendations.source, RecommendationSource::Local);
        assert_eq!(cfg.user_settings().spending_limit, Some(Decimal::from(1_500_000)));
        assert_eq!(cfg.messages, Messages::default());
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&s).unwrap();
        assert_eq!(back, Config::default());
    }

    #[test]
    fn test_fraction_digits_must_be_whole_or_cents() {
        let dir = std::env::temp_dir().join(format!("gasto-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let p = dir.join("config.toml");

        std::fs::write(&p, "[display]\nfraction_digits = 1\n").unwrap();
        let err = load_config_from(&p).unwrap_err();
        assert!(format!("{err:#}").contains("fraction_digits"), "{err:#}");

        std::fs::write(&p, "[display]\nfraction_digits = 2\n").unwrap();
        assert_eq!(load_config_from(&p).unwrap().display.fraction_digits, 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_bad_timezone_rejected() {
        let mut cfg = Config::default();
        cfg.display.timezone = "Mars/Olympus".to_string();
        assert!(cfg.timezone().is_err());
        cfg.display.timezone = "America/Bogota".to_string();
        assert!(cfg.today().is_ok());
    }
}
