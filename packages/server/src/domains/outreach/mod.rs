//! Outreach templates and the send stage.

mod model;
pub mod send;
pub mod templates;

pub use model::{EmailTemplate, OutreachEntry, OutreachStatus};
pub use send::{run_send, SendOutcome};
pub use templates::{
    add_template, delete_template, ensure_templates, set_default_template, substitute,
};
