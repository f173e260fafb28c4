use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::StatutoryRateConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{DunningError, Result};
use crate::types::{CustomerType, DunningStage};

/// how late-payment interest is charged
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum InterestMode {
    /// published base rate plus the statutory margin
    #[default]
    Statutory,
    /// fixed annual percentage agreed with the debtor
    Flat { rate: Rate },
    /// no interest
    None,
}

impl InterestMode {
    /// annual rate for a debtor under this mode
    pub fn rate_for(
        &self,
        statutory: &StatutoryRateConfig,
        customer_type: Option<CustomerType>,
        base_rate: Option<Rate>,
    ) -> Rate {
        match self {
            InterestMode::Statutory => statutory.resolve(customer_type, base_rate),
            InterestMode::Flat { rate } => *rate,
            InterestMode::None => Rate::ZERO,
        }
    }
}

/// fee and timing for one escalation stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFee {
    pub days_after_due: u32,
    pub fee: Money,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl StageFee {
    pub fn new(days_after_due: u32, fee: Money) -> Self {
        Self { days_after_due, fee, enabled: true }
    }

    pub fn disabled(days_after_due: u32) -> Self {
        Self { days_after_due, fee: Money::ZERO, enabled: false }
    }
}

/// fee schedule over the four fixed stages; an absent stage is disabled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSchedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<StageFee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dunning1: Option<StageFee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dunning2: Option<StageFee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dunning3: Option<StageFee>,
}

impl Default for StageSchedule {
    fn default() -> Self {
        Self {
            reminder: Some(StageFee::new(7, Money::ZERO)),
            dunning1: Some(StageFee::new(21, Money::from_decimal(dec!(5.00)))),
            dunning2: Some(StageFee::new(35, Money::from_decimal(dec!(10.00)))),
            dunning3: Some(StageFee::new(49, Money::from_decimal(dec!(15.00)))),
        }
    }
}

impl StageSchedule {
    pub fn get(&self, stage: &DunningStage) -> Option<&StageFee> {
        match stage {
            DunningStage::Reminder => self.reminder.as_ref(),
            DunningStage::Dunning1 => self.dunning1.as_ref(),
            DunningStage::Dunning2 => self.dunning2.as_ref(),
            DunningStage::Dunning3 => self.dunning3.as_ref(),
            DunningStage::Other(_) => None,
        }
    }

    /// configured stages in escalation order
    fn entries(&self) -> Vec<(DunningStage, &StageFee)> {
        DunningStage::KNOWN
            .iter()
            .filter_map(|stage| self.get(stage).map(|entry| (stage.clone(), entry)))
            .collect()
    }
}

/// per-customer (or default) dunning configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DunningRules {
    #[serde(default)]
    pub grace_days: u32,
    #[serde(default)]
    pub interest: InterestMode,
    #[serde(default)]
    pub stages: StageSchedule,
}

impl DunningRules {
    /// parse and validate rules coming from the rules store
    pub fn from_json(json: &str) -> Result<Self> {
        let rules: DunningRules = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<()> {
        for (stage, entry) in self.stages.entries() {
            if entry.fee.is_negative() {
                return Err(DunningError::NegativeFee {
                    stage: stage.to_string(),
                    fee: entry.fee,
                });
            }
        }
        if let InterestMode::Flat { rate } = self.interest {
            if rate.as_percent().is_sign_negative() {
                return Err(DunningError::InvalidConfiguration {
                    message: format!("flat interest rate must not be negative: {}", rate),
                });
            }
        }
        Ok(())
    }

    /// fee charged per invoice at `stage`; reminders are always free
    pub fn fee_for(&self, stage: &DunningStage) -> Money {
        if stage.is_reminder() {
            return Money::ZERO;
        }
        match self.stages.get(stage) {
            Some(entry) if entry.enabled => entry.fee,
            _ => Money::ZERO,
        }
    }

    /// most escalated enabled stage reached after `days_overdue` days
    pub fn stage_for(&self, days_overdue: i64) -> Option<DunningStage> {
        self.stages
            .entries()
            .into_iter()
            .rev()
            .find(|(_, entry)| {
                let threshold = i64::from(entry.days_after_due) + i64::from(self.grace_days);
                entry.enabled && days_overdue >= threshold
            })
            .map(|(stage, _)| stage)
    }
}

/// fee lookup that tolerates missing rules
pub fn stage_fee(rules: Option<&DunningRules>, stage: &DunningStage) -> Money {
    rules.map(|r| r.fee_for(stage)).unwrap_or(Money::ZERO)
}
