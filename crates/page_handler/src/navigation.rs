//! Navigation input normalization.

use net::url::{InputType, canonicalize_load_target_url, classify_input, input_type_name};

/// A classified, canonicalized navigation input.
#[derive(Debug, Clone, Default)]
pub struct NavigationInput {
    /// The input exactly as given.
    pub raw_input: String,
    /// Canonical URL the pipeline will load.
    pub canonical_url: String,
    /// How the input was classified.
    pub input_type: InputType,
}

/// Classify and canonicalize a raw navigation input.
pub fn normalize_input(raw_input: &str) -> Result<NavigationInput, String> {
    let input_type = classify_input(raw_input);
    if input_type == InputType::Unknown {
        return Err(format!("Unable to resolve input: {raw_input}"));
    }

    let canonical_url = canonicalize_load_target_url(raw_input)?;
    Ok(NavigationInput {
        raw_input: raw_input.to_owned(),
        canonical_url,
        input_type,
    })
}

/// Diagnostic name of the input's type.
#[must_use]
pub fn navigation_type_name(navigation: &NavigationInput) -> &'static str {
    input_type_name(navigation.input_type)
}
