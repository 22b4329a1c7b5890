//! Rendering of commit message and archive name templates.

use crate::project::ports::{BackendError, BackendResult};
use minijinja::Environment;
use serde::Serialize;

/// Values available to configured templates.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext<'a> {
    /// Project name.
    pub project: &'a str,
    /// Target branch.
    pub branch: &'a str,
    /// UTC timestamp formatted as `YYYYMMDDTHHMMSSZ`.
    pub timestamp: String,
    /// Archive extension, empty outside archive names.
    pub zip_type: &'a str,
}

/// Renders `template` with `context`.
///
/// # Errors
///
/// Returns [`BackendError::Rejected`] when the template does not parse or
/// renders to nothing.
pub fn render(operation: &str, template: &str, context: &TemplateContext<'_>) -> BackendResult<String> {
    let environment = Environment::new();
    let rendered = environment
        .render_str(template, context)
        .map_err(|error| BackendError::rejected(operation, error.to_string()))?;
    let trimmed = rendered.trim();
    if trimmed.is_empty() {
        return Err(BackendError::rejected(operation, "template rendered to an empty string"));
    }
    Ok(trimmed.to_owned())
}
