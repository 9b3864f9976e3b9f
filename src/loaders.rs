//! Local-only resource loading
//!
//! Remote schema/document discovery is an explicit Non-goal (spec §1): a
//! `Location::Url` is only ever a `file:` URL produced by canonicalization,
//! and anything else is rejected rather than fetched.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::locations::Location;
use std::fs;

/// Resource loader for schema and instance documents
#[derive(Debug, Default)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
        }
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Load a resource as a string. Fails for any non-local location.
    pub fn load(&self, location: &Location) -> Result<String> {
        if let Location::String(s) = location {
            return Ok(s.clone());
        }

        let path = location.as_path().ok_or_else(|| {
            Error::Resource(format!(
                "non-local resource cannot be loaded: {}",
                location.as_str()
            ))
        })?;

        let content = fs::read_to_string(&path).map_err(|e| {
            Error::Resource(format!("failed to read file '{}': {}", path.display(), e))
        })?;

        self.limits.check_xml_size(content.len())?;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "<root>test</root>").unwrap();

        let location = Location::Path(file.path().to_path_buf());
        let loader = Loader::new();
        let content = loader.load(&location).unwrap();

        assert!(content.contains("<root>test</root>"));
    }

    #[test]
    fn test_load_from_string() {
        let location = Location::String("<root>test</root>".to_string());
        let loader = Loader::new();
        let content = loader.load(&location).unwrap();

        assert_eq!(content, "<root>test</root>");
    }

    #[test]
    fn test_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        let large_content = "x".repeat(11 * 1024 * 1024); // 11 MB
        write!(file, "{}", large_content).unwrap();

        let location = Location::Path(file.path().to_path_buf());
        let loader = Loader::new().with_limits(Limits::strict());
        let result = loader.load(&location);

        assert!(result.is_err());
    }

    #[test]
    fn test_remote_rejected() {
        let location = Location::Url(url::Url::parse("http://example.com/schema.xsd").unwrap());
        let loader = Loader::new();
        assert!(loader.load(&location).is_err());
    }
}
