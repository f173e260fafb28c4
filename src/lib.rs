pub mod config;
pub mod decimal;
pub mod dunning;
pub mod errors;
pub mod interest;
pub mod records;
pub mod rules;
pub mod template;
pub mod types;

// re-export key types
pub use config::{BankDetails, CompanySettings, DunningConfig, StatutoryRateConfig};
pub use decimal::{Money, Rate};
pub use dunning::{
    build_context, project_overdue_invoices, DunningCase, DunningRun, EmailContext, EmailPreview,
    OutgoingEmail, OverdueInvoice, OverdueProjector, SendRequest,
};
pub use errors::{DunningError, Result, TemplateError};
pub use interest::{
    calculate_interest, resolve_rate, DayCountConvention, InterestCalculation, InterestEngine,
};
pub use records::{import_receipts, Customer, ImportReport, RawReceipt, Receipt};
pub use rules::{DunningRules, InterestMode, StageFee, StageSchedule};
pub use template::{
    render, render_template, select_template, DunningTemplate, HelperRegistry, RenderedEmail,
    Template, TemplateEngine,
};
pub use types::{CustomerId, CustomerType, DunningStage, TemplateId};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
