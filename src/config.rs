use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Rate;
use crate::errors::{DunningError, Result};
use crate::interest::DayCountConvention;

/// payment terms applied when neither the receipt nor the customer has any
pub const DEFAULT_PAYMENT_TERM_DAYS: u32 = 14;

/// days granted in a dunning letter before the next escalation
pub const DEFAULT_PAYMENT_DEADLINE_DAYS: u32 = 14;

/// crate-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DunningConfig {
    pub statutory: StatutoryRateConfig,
    pub default_payment_term_days: u32,
    pub payment_deadline_days: u32,
    pub day_count_convention: DayCountConvention,
}

impl Default for DunningConfig {
    fn default() -> Self {
        Self {
            statutory: StatutoryRateConfig::default(),
            default_payment_term_days: DEFAULT_PAYMENT_TERM_DAYS,
            payment_deadline_days: DEFAULT_PAYMENT_DEADLINE_DAYS,
            day_count_convention: DayCountConvention::Actual365,
        }
    }
}

impl DunningConfig {
    /// parse and validate a json document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: DunningConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.statutory.validate()?;
        if self.payment_deadline_days == 0 {
            return Err(DunningError::InvalidConfiguration {
                message: "payment deadline must be at least one day".to_string(),
            });
        }
        Ok(())
    }

    /// exact calendar-year proration instead of the 365-day year
    pub fn with_exact_day_count(mut self) -> Self {
        self.day_count_convention = DayCountConvention::ActualActual;
        self
    }
}

/// statutory late-payment interest: published base rate plus a fixed margin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatutoryRateConfig {
    /// base rate used when the settings store has none
    pub fallback_base_rate: Rate,
    /// margin in percentage points for private debtors
    pub consumer_margin: Decimal,
    /// margin in percentage points for commercial debtors
    pub business_margin: Decimal,
}

impl Default for StatutoryRateConfig {
    fn default() -> Self {
        Self {
            fallback_base_rate: Rate::from_percent(dec!(3.62)),
            consumer_margin: dec!(5),
            business_margin: dec!(9),
        }
    }
}

impl StatutoryRateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.consumer_margin.is_sign_negative() || self.business_margin.is_sign_negative() {
            return Err(DunningError::InvalidConfiguration {
                message: format!(
                    "statutory margins must not be negative: consumer {}, business {}",
                    self.consumer_margin, self.business_margin
                ),
            });
        }
        Ok(())
    }
}

/// sender details printed in letters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanySettings {
    pub name: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub managing_director: Option<String>,
    pub vat_id: Option<String>,
    pub commercial_register: Option<String>,
    pub bank: BankDetails,
}

/// remittance account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankDetails {
    pub bank_name: Option<String>,
    pub iban: Option<String>,
    pub bic: Option<String>,
    pub account_holder: Option<String>,
}
