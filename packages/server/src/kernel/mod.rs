//! Kernel module - infrastructure and dependencies.

pub mod deps;
pub mod mailer;
pub mod places;
pub mod site_generator;
pub mod traits;

pub use deps::PipelineDeps;
pub use mailer::SmtpMailer;
pub use places::PlacesClient;
pub use site_generator::OpenAiGenerator;
pub use traits::{LeadSource, Mailer, SiteGenerator};
