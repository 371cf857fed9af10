//! Desk configuration loaded from the data/ directory.
//!
//! Commission rates are configuration, not constants: the back office has
//! used both 500 and 1000 per lead depending on the screen.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRates {
    pub currency:         String,
    /// Paid per billable (or, on agent cards, paid) lead.
    pub billed_rate:      i64,
    /// Taken back per returned lead.
    pub return_deduction: i64,
    /// Manager commission per billed lead in their teams.
    pub manager_rate:     i64,
    /// Per-lead rate on the QA dashboard card.
    pub qa_rate:          i64,
}

impl Default for CommissionRates {
    fn default() -> Self {
        Self {
            currency:         "PKR".into(),
            billed_rate:      1000,
            return_deduction: 1000,
            manager_rate:     500,
            qa_rate:          500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeskSettings {
    /// Ids per statement inside a bulk transaction.
    pub bulk_chunk_size:     usize,
    pub team_cache_ttl_secs: i64,
    /// Days of history on dashboard trend charts.
    pub trend_window_days:   i64,
}

impl Default for DeskSettings {
    fn default() -> Self {
        Self {
            bulk_chunk_size:     500,
            team_cache_ttl_secs: 3600,
            trend_window_days:   30,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeskConfig {
    pub commission: CommissionRates,
    pub settings:   DeskSettings,
}

impl DeskConfig {
    /// Load from the data/ directory.
    /// In tests, use DeskConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let rates_path = format!("{data_dir}/commission/commission_rates.json");
        let rates_content = std::fs::read_to_string(&rates_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {rates_path}: {e}"))?;
        let commission: CommissionRates = serde_json::from_str(&rates_content)?;

        let settings_path = format!("{data_dir}/desk/desk_settings.json");
        let settings_content = std::fs::read_to_string(&settings_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {settings_path}: {e}"))?;
        let settings: DeskSettings = serde_json::from_str(&settings_content)?;

        if settings.bulk_chunk_size == 0 {
            anyhow::bail!("{settings_path}: bulk_chunk_size must be > 0");
        }
        if settings.team_cache_ttl_secs < 0 || settings.trend_window_days <= 0 {
            anyhow::bail!("{settings_path}: ttl must be >= 0 and trend window > 0");
        }

        Ok(Self { commission, settings })
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            commission: CommissionRates::default(),
            settings:   DeskSettings::default(),
        }
    }
}
