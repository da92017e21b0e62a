#![forbid(unsafe_code)]

const MAX_NAME_CHARS: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameError {
    Empty,
    TooLong,
    ContainsControl,
}

impl NameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "name must not be empty",
            Self::TooLong => "name is too long",
            Self::ContainsControl => "name contains control characters",
        }
    }
}

impl std::fmt::Display for NameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for NameError {}

/// Node names are shown in a single-line tree, so line breaks count as control characters.
pub fn validate_name(value: &str) -> Result<(), NameError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(NameError::TooLong);
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(NameError::ContainsControl);
    }
    Ok(())
}
