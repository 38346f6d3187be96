//! Thin front-end adapters over the shared [`RiskPipeline`](crate::pipeline::RiskPipeline).
//!
//! Each adapter converts every failure into a user-visible message so a bad
//! request never takes the process down.

mod chat;
mod form;

pub use chat::{ChatFrontend, FORMAT_HINT, WELCOME};
pub use form::{FormFrontend, FormReport, FormSubmission};
