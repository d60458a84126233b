//! Resolver for event-driven timing detectors.
//!
//! These detectors are built from numbered modules, each written as a
//! top-level member named `ts_qty_moduleNN`.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::container::{self, Container};

use super::{keys, MetadataResolver, ResolveError, Vendor, VendorResolver};

/// Full-name pattern of a module member
pub static MODULE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ts_qty_module\d{2}$").expect("module pattern is a valid regex")
});

/// Metadata resolver for event-driven timing detectors
pub struct EventDetectorResolver<'a> {
    base: MetadataResolver<'a>,
}

impl<'a> EventDetectorResolver<'a> {
    /// Wrap an open container
    pub fn new(container: &'a dyn Container) -> Self {
        Self {
            base: MetadataResolver::new(container),
        }
    }

    /// Shared primitives over the same container
    pub fn base(&self) -> &MetadataResolver<'a> {
        &self.base
    }

    /// Whether the file at `path` was written by this detector family.
    ///
    /// Opens its own short-lived handle, looks only at the top-level members
    /// and closes the handle again before returning.
    pub fn is_this_vendor<P: AsRef<Path>>(path: P) -> Result<bool, ResolveError> {
        let handle = container::open(path)?;
        Self::matches_vendor(handle.as_ref())
    }

    /// Same classification as [`is_this_vendor`](Self::is_this_vendor) on an
    /// already open container
    pub fn matches_vendor(container: &dyn Container) -> Result<bool, ResolveError> {
        Ok(container
            .root_members()?
            .iter()
            .any(|name| MODULE_PATTERN.is_match(name)))
    }

    /// Number of top-level module members
    pub fn module_count(&self) -> Result<usize, ResolveError> {
        Ok(self
            .base
            .container()
            .root_members()?
            .iter()
            .filter(|name| MODULE_PATTERN.is_match(name))
            .count())
    }

    /// Path of the software version node
    pub fn find_software_version(&self) -> Result<Option<String>, ResolveError> {
        self.base.first_path(keys::SOFTWARE_VERSION)
    }

    /// Path of the meta file layout version node
    pub fn find_meta_version(&self) -> Result<Option<String>, ResolveError> {
        self.base.first_path(keys::META_VERSION)
    }
}

impl VendorResolver for EventDetectorResolver<'_> {
    fn vendor(&self) -> Vendor {
        Vendor::EventDetector
    }

    fn base(&self) -> &MetadataResolver<'_> {
        &self.base
    }

    fn find_software_version(&self) -> Result<Option<String>, ResolveError> {
        EventDetectorResolver::find_software_version(self)
    }

    fn module_count(&self) -> Result<Option<usize>, ResolveError> {
        EventDetectorResolver::module_count(self).map(Some)
    }

    fn find_meta_version(&self) -> Result<Option<String>, ResolveError> {
        EventDetectorResolver::find_meta_version(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_pattern_is_full_match() {
        assert!(MODULE_PATTERN.is_match("ts_qty_module00"));
        assert!(MODULE_PATTERN.is_match("ts_qty_module17"));
        assert!(!MODULE_PATTERN.is_match("ts_qty_module1"));
        assert!(!MODULE_PATTERN.is_match("ts_qty_module001"));
        assert!(!MODULE_PATTERN.is_match("x_ts_qty_module00"));
        assert!(!MODULE_PATTERN.is_match("ts_qty_module0a"));
    }
}
