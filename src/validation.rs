use std::path::Path;

use crate::error::{PipelineError, Result};

/// Largest result count a single search may request
pub const MAX_SEARCH_LIMIT: usize = 1000;

/// Largest page the search endpoint serves
pub const MAX_PAGE_SIZE: u32 = 100;

fn invalid(message: impl Into<String>) -> PipelineError {
    PipelineError::InvalidArgument(message.into())
}

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate the number of tweets requested by one search
    pub fn validate_search_limit(limit: usize) -> Result<()> {
        if limit > MAX_SEARCH_LIMIT {
            return Err(invalid(format!(
                "limit {limit} too large - decrease number to <= {MAX_SEARCH_LIMIT}"
            )));
        }

        Ok(())
    }

    /// Validate a search term
    pub fn validate_search_term(term: &str) -> Result<()> {
        if term.trim().is_empty() {
            return Err(invalid("Search term cannot be empty"));
        }

        // Query length cap of the search endpoint
        if term.chars().count() > 500 {
            return Err(invalid("Search term too long (max 500 characters)"));
        }

        if term.chars().any(char::is_control) {
            return Err(invalid("Search term contains invalid characters"));
        }

        Ok(())
    }

    /// Validate a table name before it is interpolated into SQL
    pub fn validate_table_name(name: &str) -> Result<()> {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return Err(invalid("Table name cannot be empty"));
        };

        if name.len() > 128 {
            return Err(invalid("Table name too long (max 128 characters)"));
        }

        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(invalid(format!("Table name must start with a letter or underscore: {name}")));
        }

        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid(format!("Table name contains invalid characters: {name}")));
        }

        if name.to_ascii_lowercase().starts_with("sqlite_") {
            return Err(invalid(format!("Table name uses a reserved prefix: {name}")));
        }

        Ok(())
    }

    /// Validate the store file path
    pub fn validate_store_path(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.trim().is_empty() {
            return Err(invalid("Store path cannot be empty"));
        }

        if path_str.contains('\0') {
            return Err(invalid("Store path contains invalid characters"));
        }

        // Check path length
        if path_str.len() > 4096 {
            return Err(invalid("Store path too long (max 4096 characters)"));
        }

        Ok(())
    }

    /// Validate a language filter code such as `en`
    pub fn validate_language(code: &str) -> Result<()> {
        if !(2..=3).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(invalid(format!("Invalid language code: {code}")));
        }

        Ok(())
    }

    /// Validate the per-request page size
    pub fn validate_page_size(page_size: u32) -> Result<()> {
        if page_size == 0 {
            return Err(invalid("Page size must be greater than 0"));
        }

        if page_size > MAX_PAGE_SIZE {
            return Err(invalid(format!("Page size too large (max {MAX_PAGE_SIZE})")));
        }

        Ok(())
    }
}
