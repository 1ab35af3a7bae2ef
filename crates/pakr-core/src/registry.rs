//! Format name to packager lookup.

use std::collections::BTreeMap;

use crate::error::PackageError;
use crate::formats::{Apk, ArchLinux, Deb, Packager, Rpm};

/// Packagers keyed by format name.
///
/// Built once at startup, then shared by reference with every build; all
/// lookups after construction are read-only.
#[derive(Default)]
pub struct Registry {
    packagers: BTreeMap<String, Box<dyn Packager>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.packagers.keys()).finish()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the four built-in formats:
    /// `rpm`, `deb`, `apk` and `archlinux`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("rpm", Rpm);
        registry.register("deb", Deb);
        registry.register("apk", Apk);
        registry.register("archlinux", ArchLinux);
        registry
    }

    /// Add or replace the packager for `format`.
    pub fn register(&mut self, format: &str, packager: impl Packager + 'static) {
        self.packagers.insert(format.to_string(), Box::new(packager));
    }

    /// Look up the packager for `format`.
    ///
    /// # Errors
    ///
    /// Returns `PackageError::NoPackager` if nothing is registered under it.
    pub fn get(&self, format: &str) -> Result<&dyn Packager, PackageError> {
        self.packagers
            .get(format)
            .map(Box::as_ref)
            .ok_or_else(|| PackageError::NoPackager(format.to_string()))
    }

    /// True if `format` has a packager.
    pub fn contains(&self, format: &str) -> bool {
        self.packagers.contains_key(format)
    }

    /// Registered format names, sorted.
    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.packagers.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_formats() {
        let registry = Registry::with_defaults();
        let formats: Vec<&str> = registry.formats().collect();
        assert_eq!(formats, vec!["apk", "archlinux", "deb", "rpm"]);
        assert_eq!(
            registry.get("archlinux").unwrap().conventional_extension(),
            ".pkg.tar.zst"
        );
    }

    #[test]
    fn unknown_format_is_an_error() {
        let registry = Registry::with_defaults();
        let err = registry.get("msi").err().unwrap();
        assert_eq!(err.to_string(), "no packager registered for the format msi");
        assert!(!registry.contains("msi"));
    }

    #[test]
    fn register_replaces_existing() {
        let mut registry = Registry::new();
        registry.register("pkg", Deb);
        registry.register("pkg", Rpm);
        assert_eq!(registry.get("pkg").unwrap().conventional_extension(), ".rpm");
    }
}
