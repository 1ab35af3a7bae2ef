//! Per-format packagers.
//!
//! Every packager follows the same shape: [`prepare`] a private copy of the
//! descriptor (platform check, validation, architecture translation), check
//! the name against the format's grammar, resolve contents, then stream the
//! archive. Nothing reaches the output before validation has passed.

pub mod apk;
pub mod archlinux;
pub mod deb;
pub mod rpm;

use std::io::Write;

use pakr_schema::{Format, Info, translate};
use regex::Regex;

use crate::error::PackageError;

pub use apk::Apk;
pub use archlinux::ArchLinux;
pub use deb::Deb;
pub use rpm::Rpm;

/// The only platform any packager targets.
pub const LINUX: &str = "linux";

/// A package format encoder.
pub trait Packager: Send + Sync {
    /// Write a complete package for `info` to `w`.
    ///
    /// # Errors
    ///
    /// Returns a validation error before anything is written, or the first
    /// source or encoding failure. Output written before a failure is not a
    /// usable artifact.
    fn package(&self, info: &Info, w: &mut dyn Write) -> Result<(), PackageError>;

    /// The canonical artifact file name for `info`.
    fn conventional_file_name(&self, info: &Info) -> String;

    /// Extension of the artifact, including the leading dot.
    fn conventional_extension(&self) -> &'static str;
}

/// Copy `info` for one build: reject non-linux platforms, validate required
/// fields and translate the architecture unless `arch_override` is set.
///
/// # Errors
///
/// Returns `PackageError::UnsupportedPlatform` or `PackageError::FieldEmpty`.
pub fn prepare(
    info: &Info,
    format: Format,
    name: &'static str,
    arch_override: &str,
) -> Result<Info, PackageError> {
    if !info.platform.is_empty() && info.platform != LINUX {
        return Err(PackageError::UnsupportedPlatform {
            format: name,
            platform: info.platform.clone(),
        });
    }
    info.validate()?;

    let mut info = info.clone();
    info.arch = if arch_override.is_empty() {
        translate(&info.arch, format)
    } else {
        arch_override.to_string()
    };
    Ok(info)
}

/// Architecture a conventional file name should carry, without validating.
pub(crate) fn file_name_arch(info: &Info, format: Format, arch_override: &str) -> String {
    if arch_override.is_empty() {
        translate(&info.arch, format)
    } else {
        arch_override.to_string()
    }
}

/// Check `name` against `grammar`.
///
/// # Errors
///
/// Returns `PackageError::InvalidName` when it does not match.
pub(crate) fn check_name(
    grammar: &Regex,
    name: &str,
    format: &'static str,
) -> Result<(), PackageError> {
    if grammar.is_match(name) {
        Ok(())
    } else {
        Err(PackageError::InvalidName {
            format,
            name: name.to_string(),
        })
    }
}

/// Modification time for generated metadata: the descriptor's, or now.
pub(crate) fn build_time(info: &Info) -> u64 {
    info.mtime
        .unwrap_or_else(|| chrono::Utc::now().timestamp())
        .max(0) as u64
}
