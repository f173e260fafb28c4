use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{DunningError, Result};
use crate::records::{parse_amount, parse_date};
use crate::types::CustomerId;

/// invoice record as stored by the sync job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawReceipt {
    pub invoice_number: Option<String>,
    pub receipt_date: Option<String>,
    pub due_date: Option<String>,
    pub amount: Option<Value>,
    pub amount_open: Option<Value>,
    pub customer_id: Option<Uuid>,
}

/// typed invoice record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub invoice_number: String,
    pub receipt_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub total_amount: Money,
    pub open_amount: Money,
    pub customer_id: CustomerId,
}

impl Receipt {
    /// open receipt whose total equals its open amount
    pub fn new(
        customer_id: CustomerId,
        invoice_number: impl Into<String>,
        receipt_date: NaiveDate,
        open_amount: Money,
    ) -> Self {
        Self {
            invoice_number: invoice_number.into(),
            receipt_date,
            due_date: None,
            total_amount: open_amount,
            open_amount,
            customer_id,
        }
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_total(mut self, total_amount: Money) -> Self {
        self.total_amount = total_amount;
        self
    }

    /// still carries an unpaid balance
    pub fn is_open(&self) -> bool {
        self.open_amount.is_positive()
    }
}

impl TryFrom<RawReceipt> for Receipt {
    type Error = DunningError;

    fn try_from(raw: RawReceipt) -> Result<Self> {
        let invoice_number = raw
            .invoice_number
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or(DunningError::MissingField { field: "invoiceNumber" })?;
        let customer_id = raw
            .customer_id
            .ok_or(DunningError::MissingField { field: "customerId" })?;

        let receipt_date_raw = raw
            .receipt_date
            .ok_or(DunningError::MissingField { field: "receiptDate" })?;
        let receipt_date = parse_date(&receipt_date_raw).ok_or(DunningError::InvalidDate {
            field: "receiptDate",
            value: receipt_date_raw,
        })?;

        // due date is optional; a garbled one falls back to payment terms
        let due_date = match raw.due_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => {
                let parsed = parse_date(value);
                if parsed.is_none() {
                    warn!(%invoice_number, value, "unreadable due date, using payment terms");
                }
                parsed
            }
        };

        let total_amount = coerce_amount(&invoice_number, "amount", raw.amount.as_ref());
        let open_amount = coerce_amount(&invoice_number, "amountOpen", raw.amount_open.as_ref());

        Ok(Receipt {
            invoice_number,
            receipt_date,
            due_date,
            total_amount,
            open_amount,
            customer_id,
        })
    }
}

fn coerce_amount(invoice_number: &str, field: &'static str, value: Option<&Value>) -> Money {
    match value {
        None | Some(Value::Null) => Money::ZERO,
        Some(value) => parse_amount(value).unwrap_or_else(|| {
            warn!(invoice_number, field, %value, "malformed amount treated as zero");
            Money::ZERO
        }),
    }
}

/// result of converting a batch of sync records
#[derive(Debug, Default)]
pub struct ImportReport {
    pub receipts: Vec<Receipt>,
    /// position in the input batch and the reason it was skipped
    pub rejected: Vec<(usize, DunningError)>,
}

/// convert a batch of sync records, skipping those that cannot be typed
pub fn import_receipts(raws: impl IntoIterator<Item = RawReceipt>) -> ImportReport {
    let mut report = ImportReport::default();
    for (index, raw) in raws.into_iter().enumerate() {
        match Receipt::try_from(raw) {
            Ok(receipt) => report.receipts.push(receipt),
            Err(err) => {
                warn!(index, error = %err, "skipping receipt record");
                report.rejected.push((index, err));
            }
        }
    }
    debug!(
        imported = report.receipts.len(),
        rejected = report.rejected.len(),
        "receipt import finished"
    );
    report
}
