use std::path::Path;

pub const ALLOWED_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".webp", ".tif"];

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid file type. Allowed: {}", ALLOWED_EXTENSIONS.join(", "))]
    UnsupportedExtension,
    #[error("File too large. Maximum size is {limit} bytes")]
    FileTooLarge { limit: usize },
}

/// Returns the lowercased extension, leading dot included, when it is one we accept.
pub fn validate_extension(filename: &str) -> Result<String, ValidationError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .ok_or(ValidationError::UnsupportedExtension)?;

    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(ValidationError::UnsupportedExtension)
    }
}

pub fn validate_size(len: usize, limit: usize) -> Result<(), ValidationError> {
    if len > limit {
        return Err(ValidationError::FileTooLarge { limit });
    }
    Ok(())
}
