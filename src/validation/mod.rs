pub(crate) mod sanitize;
pub(crate) mod validation_errors;
pub(crate) mod validation_rules;

pub use sanitize::{sanitize_draft, sanitize_text};
pub use validation_errors::ValidationError;
pub use validation_rules::{validate_draft, ValidationContext};
