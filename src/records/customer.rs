use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::lenient_days;
use crate::types::{deserialize_customer_type, CustomerId, CustomerType};

/// debtor as mirrored from the accounting system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    /// posting account number in the accounting system
    #[serde(default)]
    pub account_number: Option<String>,
    pub name: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_customer_type")]
    pub customer_type: Option<CustomerType>,
    #[serde(default, deserialize_with = "lenient_days")]
    pub payment_terms_days: Option<u32>,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_number: None,
            name: name.into(),
            contact_person: None,
            street: None,
            postal_code: None,
            city: None,
            country: None,
            email: None,
            customer_type: None,
            payment_terms_days: None,
        }
    }

    pub fn with_type(mut self, customer_type: CustomerType) -> Self {
        self.customer_type = Some(customer_type);
        self
    }

    pub fn with_account_number(mut self, account_number: impl Into<String>) -> Self {
        self.account_number = Some(account_number.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_contact_person(mut self, contact_person: impl Into<String>) -> Self {
        self.contact_person = Some(contact_person.into());
        self
    }

    pub fn with_address(
        mut self,
        street: impl Into<String>,
        postal_code: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        self.street = Some(street.into());
        self.postal_code = Some(postal_code.into());
        self.city = Some(city.into());
        self
    }

    pub fn with_payment_terms(mut self, days: u32) -> Self {
        self.payment_terms_days = Some(days);
        self
    }

    /// usable recipient address, if any
    pub fn recipient(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_sync_record() {
        let json = r#"{
            "id": "8d5c1c36-6f0e-4b7a-9b0e-3b1f3f2a9c11",
            "accountNumber": "10042",
            "name": "Acme GmbH",
            "customerType": "business",
            "paymentTermsDays": "30",
            "email": "buchhaltung@acme.example"
        }"#;
        let customer: Customer = serde_json::from_str(json).unwrap();
        assert_eq!(customer.account_number.as_deref(), Some("10042"));
        assert_eq!(customer.customer_type, Some(CustomerType::Business));
        assert_eq!(customer.payment_terms_days, Some(30));
        assert!(customer.city.is_none());
    }

    #[test]
    fn test_unknown_classification_is_unset() {
        let json = r#"{
            "id": "8d5c1c36-6f0e-4b7a-9b0e-3b1f3f2a9c11",
            "name": "Jane Doe",
            "customerType": "government",
            "paymentTermsDays": "soon"
        }"#;
        let customer: Customer = serde_json::from_str(json).unwrap();
        assert_eq!(customer.customer_type, None);
        assert_eq!(customer.payment_terms_days, None);
    }

    #[test]
    fn test_recipient() {
        let customer = Customer::new("Acme GmbH");
        assert_eq!(customer.recipient(), None);

        let customer = customer.with_email("  ");
        assert_eq!(customer.recipient(), None);

        let customer = customer.with_email(" ap@acme.example ");
        assert_eq!(customer.recipient(), Some("ap@acme.example"));
    }
}
