use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// internal customer identifier
pub type CustomerId = Uuid;

/// dunning template identifier
pub type TemplateId = Uuid;

/// statutory classification of a debtor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    /// private individual
    Consumer,
    /// commercial debtor
    Business,
}

impl CustomerType {
    /// parse a stored classification; anything unrecognised is unclassified
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "consumer" => Some(CustomerType::Consumer),
            "business" => Some(CustomerType::Business),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Consumer => "consumer",
            CustomerType::Business => "business",
        }
    }
}

/// serde adapter: unknown or empty classifications deserialize to `None`
pub(crate) fn deserialize_customer_type<'de, D>(
    deserializer: D,
) -> Result<Option<CustomerType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(CustomerType::parse))
}

/// dunning escalation stage.
///
/// The four known stages form the fee schedule. Stages are operator data, so
/// anything else is carried through verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DunningStage {
    /// friendly payment reminder
    Reminder,
    /// first dunning notice
    Dunning1,
    /// second dunning notice
    Dunning2,
    /// final notice
    Dunning3,
    /// operator-defined stage
    Other(String),
}

impl DunningStage {
    /// the fixed fee-bearing stages in escalation order
    pub const KNOWN: [DunningStage; 4] = [
        DunningStage::Reminder,
        DunningStage::Dunning1,
        DunningStage::Dunning2,
        DunningStage::Dunning3,
    ];

    pub fn parse(value: &str) -> Self {
        match value {
            "reminder" => DunningStage::Reminder,
            "dunning1" => DunningStage::Dunning1,
            "dunning2" => DunningStage::Dunning2,
            "dunning3" => DunningStage::Dunning3,
            other => DunningStage::Other(other.to_string()),
        }
    }

    /// storage key
    pub fn as_str(&self) -> &str {
        match self {
            DunningStage::Reminder => "reminder",
            DunningStage::Dunning1 => "dunning1",
            DunningStage::Dunning2 => "dunning2",
            DunningStage::Dunning3 => "dunning3",
            DunningStage::Other(s) => s,
        }
    }

    /// label printed in letters and subjects
    pub fn display_name(&self) -> &str {
        match self {
            DunningStage::Reminder => "Zahlungserinnerung",
            DunningStage::Dunning1 => "1. Mahnung",
            DunningStage::Dunning2 => "2. Mahnung",
            DunningStage::Dunning3 => "Letzte Mahnung",
            DunningStage::Other(s) => s,
        }
    }

    pub fn is_reminder(&self) -> bool {
        matches!(self, DunningStage::Reminder)
    }
}

impl fmt::Display for DunningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for DunningStage {
    fn from(s: String) -> Self {
        DunningStage::parse(&s)
    }
}

impl From<&str> for DunningStage {
    fn from(s: &str) -> Self {
        DunningStage::parse(s)
    }
}

impl From<DunningStage> for String {
    fn from(stage: DunningStage) -> Self {
        stage.as_str().to_string()
    }
}
