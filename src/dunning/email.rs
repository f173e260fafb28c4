use serde::{Deserialize, Serialize};

use crate::dunning::context::Totals;
use crate::errors::{DunningError, Result};
use crate::records::Customer;
use crate::template::RenderedEmail;
use crate::types::{CustomerId, TemplateId};

/// rendered letter plus the figures shown next to it before sending
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPreview {
    pub subject: String,
    pub html: String,
    pub text: String,
    pub invoice_count: usize,
    pub summe: Totals,
}

impl EmailPreview {
    pub fn new(email: RenderedEmail, invoice_count: usize, summe: Totals) -> Self {
        Self {
            subject: email.subject,
            html: email.html,
            text: email.text,
            invoice_count,
            summe,
        }
    }
}

/// request to send one dunning letter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub customer_id: CustomerId,
    pub template_id: TemplateId,
    #[serde(default)]
    pub recipient_email: Option<String>,
}

impl SendRequest {
    pub fn new(customer_id: CustomerId, template_id: TemplateId) -> Self {
        Self { customer_id, template_id, recipient_email: None }
    }

    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.recipient_email = Some(recipient.into());
        self
    }

    /// explicit recipient, else the customer's address
    pub fn recipient<'a>(&'a self, customer: &'a Customer) -> Result<&'a str> {
        self.recipient_email
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .or_else(|| customer.recipient())
            .ok_or(DunningError::MissingRecipient { customer_id: customer.id })
    }
}

/// message handed to the mail transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl OutgoingEmail {
    pub fn new(to: impl Into<String>, email: RenderedEmail) -> Self {
        Self {
            to: to.into(),
            subject: email.subject,
            html: email.html,
            text: email.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_recipient_fallback() {
        let customer = Customer::new("Acme GmbH").with_email("buchhaltung@acme.example");
        let request = SendRequest::new(customer.id, Uuid::new_v4());
        assert_eq!(request.recipient(&customer).unwrap(), "buchhaltung@acme.example");

        let request = request.to(" mahnwesen@acme.example ");
        assert_eq!(request.recipient(&customer).unwrap(), "mahnwesen@acme.example");
    }

    #[test]
    fn test_missing_recipient() {
        let customer = Customer::new("Ohne Mail");
        let request = SendRequest::new(customer.id, Uuid::new_v4()).to("  ");
        assert!(matches!(
            request.recipient(&customer),
            Err(DunningError::MissingRecipient { customer_id }) if customer_id == customer.id
        ));
    }

    #[test]
    fn test_send_request_from_json() {
        let request: SendRequest = serde_json::from_str(
            r#"{"customerId":"6f1c3f4e-4d1a-4a39-9d53-0c6b1f3f2a10","templateId":"0b8f2c1e-9d0a-4c55-8a5e-2f7d9c1b3a44"}"#,
        )
        .unwrap();
        assert!(request.recipient_email.is_none());
    }

    #[test]
    fn test_preview_shape() {
        let email = RenderedEmail {
            subject: "1. Mahnung".into(),
            html: "<p></p>".into(),
            text: String::new(),
        };
        let preview = EmailPreview::new(email, 2, Totals::default());
        let json = serde_json::to_value(&preview).unwrap();
        assert_eq!(json["invoiceCount"], 2);
        assert_eq!(json["summe"]["gesamt"], 0.0);
        assert_eq!(json["subject"], "1. Mahnung");
    }
}
