use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;

#[derive(Error, Debug)]
pub enum DunningError {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid stage fee for {stage}: {fee}")]
    NegativeFee {
        stage: String,
        fee: Money,
    },

    #[error("invalid date in field {field}: {value:?}")]
    InvalidDate {
        field: &'static str,
        value: String,
    },

    #[error("missing required field: {field}")]
    MissingField {
        field: &'static str,
    },

    #[error("request for customer {actual} does not match customer {expected}")]
    CustomerMismatch {
        expected: Uuid,
        actual: Uuid,
    },

    #[error("no overdue invoices for customer {customer_id}")]
    NothingOverdue {
        customer_id: Uuid,
    },

    #[error("no recipient address for customer {customer_id}")]
    MissingRecipient {
        customer_id: Uuid,
    },

    #[error("no active template for stage {stage}")]
    TemplateNotFound {
        stage: String,
    },

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// errors raised while compiling or rendering a merge-field template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unterminated tag starting at offset {offset}")]
    UnterminatedTag {
        offset: usize,
    },

    #[error("empty tag at offset {offset}")]
    EmptyTag {
        offset: usize,
    },

    #[error("unclosed block {{{{#{name}}}}}")]
    UnclosedBlock {
        name: String,
    },

    #[error("closing tag {{{{/{found}}}}} does not match open block {expected:?}")]
    MismatchedBlock {
        expected: Option<String>,
        found: String,
    },

    #[error("{{{{else}}}} outside of a block at offset {offset}")]
    StrayElse {
        offset: usize,
    },

    #[error("unknown block helper: {name}")]
    UnknownBlock {
        name: String,
    },

    #[error("unknown helper: {name}")]
    UnknownHelper {
        name: String,
    },

    #[error("invalid expression {expression:?}: {message}")]
    InvalidExpression {
        expression: String,
        message: String,
    },

    #[error("helper {helper} failed: {message}")]
    HelperFailed {
        helper: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, DunningError>;
