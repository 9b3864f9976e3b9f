//! Resource location resolution
//!
//! This module handles resolution of resource locations (URLs, file paths, etc.)
//! for loading schemas and XML documents.

use crate::error::Result;
use std::path::PathBuf;
use url::Url;

/// Resource location - can be a URL, file path, or string identifier
#[derive(Debug, Clone)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// URL (http, https, ftp, etc.)
    Url(Url),
    /// String identifier (for in-memory resources)
    String(String),
}

impl Location {
    /// Create a location from a string (auto-detect type)
    pub fn from_str(s: &str) -> Result<Self> {
        // Try to parse as URL first
        if let Ok(url) = Url::parse(s) {
            if url.scheme() != "file" {
                return Ok(Location::Url(url));
            }
        }

        // Try as file path
        let path = PathBuf::from(s);
        if path.exists() || s.starts_with('/') || s.starts_with('.') {
            return Ok(Location::Path(path));
        }

        // Otherwise treat as string identifier
        Ok(Location::String(s.to_string()))
    }

    /// Get the location as a string
    pub fn as_str(&self) -> String {
        match self {
            Location::Path(p) => p.to_string_lossy().to_string(),
            Location::Url(u) => u.to_string(),
            Location::String(s) => s.clone(),
        }
    }

    /// Check if this is a remote location (URL)
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }

    /// Check if this is a local file
    pub fn is_file(&self) -> bool {
        matches!(self, Location::Path(_))
    }

    /// Create a location from a filesystem path, canonicalizing it to an
    /// absolute `file:` URL when possible. Falls back to `Location::Path`
    /// with the path unchanged if canonicalization fails (e.g. the file
    /// does not exist yet).
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Self {
        let path = path.as_ref();
        match std::fs::canonicalize(path).ok().and_then(|p| Url::from_file_path(p).ok()) {
            Some(url) => Location::Url(url),
            None => Location::Path(path.to_path_buf()),
        }
    }

    /// True unless this location resolves to a non-`file:` URL. Spec §4.1
    /// edge case (i): a resolution pointing outside the local filesystem is
    /// returned unchanged but treated by the caller as "non-local".
    pub fn is_local(&self) -> bool {
        match self {
            Location::Path(_) => true,
            Location::Url(u) => u.scheme() == "file",
            Location::String(_) => false,
        }
    }

    /// The underlying filesystem path, if this location is local.
    pub fn as_path(&self) -> Option<PathBuf> {
        match self {
            Location::Path(p) => Some(p.clone()),
            Location::Url(u) if u.scheme() == "file" => u.to_file_path().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_url() {
        let loc = Location::from_str("http://example.com/schema.xsd").unwrap();
        assert!(matches!(loc, Location::Url(_)));
        assert!(loc.is_remote());
    }

    #[test]
    fn test_location_from_path() {
        let loc = Location::from_str("/tmp/schema.xsd").unwrap();
        assert!(matches!(loc, Location::Path(_)));
        assert!(loc.is_file());
    }

    #[test]
    fn test_location_as_str() {
        let loc = Location::String("test".to_string());
        assert_eq!(loc.as_str(), "test");
    }
}
