use crate::config::StatutoryRateConfig;
use crate::decimal::Rate;
use crate::types::CustomerType;

/// statutory late-payment rate with the default margins and fallback base rate
pub fn resolve_rate(customer_type: Option<CustomerType>, base_rate: Option<Rate>) -> Rate {
    StatutoryRateConfig::default().resolve(customer_type, base_rate)
}

impl StatutoryRateConfig {
    /// base rate plus the margin for the debtor's classification.
    ///
    /// An unclassified debtor accrues no statutory interest.
    pub fn resolve(&self, customer_type: Option<CustomerType>, base_rate: Option<Rate>) -> Rate {
        let Some(customer_type) = customer_type else {
            return Rate::ZERO;
        };
        let base = base_rate.unwrap_or(self.fallback_base_rate);
        match customer_type {
            CustomerType::Business => base.plus_points(self.business_margin),
            CustomerType::Consumer => base.plus_points(self.consumer_margin),
        }
    }
}
