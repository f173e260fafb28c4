//! Overdue projection, merge-field context and the per-batch dunning run.

pub mod context;
pub mod email;
pub mod projector;
pub mod run;

pub use context::{build_context, build_context_with_deadline, EmailContext, Totals};
pub use email::{EmailPreview, OutgoingEmail, SendRequest};
pub use projector::{project_overdue_invoices, OverdueInvoice, OverdueProjector};
pub use run::{DunningCase, DunningRun};
