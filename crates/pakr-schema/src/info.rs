//! The normalized package descriptor.
//!
//! An [`Info`] is built once per target format from the merged configuration,
//! has defaults applied through [`Info::with_defaults`], and is then treated
//! as read-only input for a single build.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::Content;

/// Platform assumed when the descriptor does not name one.
pub const DEFAULT_PLATFORM: &str = "linux";

/// Description used when the descriptor leaves it empty.
pub const DEFAULT_DESCRIPTION: &str = "no description given";

/// Descriptor validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InfoError {
    /// A required field is empty.
    #[error("package {0} must be provided")]
    FieldEmpty(&'static str),
}

/// Format-agnostic package metadata plus the overridable block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    /// Fields that per-format overrides may replace.
    #[serde(flatten)]
    pub overridables: Overridables,
    /// Package name.
    pub name: String,
    /// Architecture in descriptor spelling (`amd64`, `arm64`, ...).
    pub arch: String,
    /// Target operating system, `linux` by default.
    pub platform: String,
    /// Upgrade-ordering epoch.
    pub epoch: String,
    /// Upstream version, ideally semver shaped.
    pub version: String,
    /// Numeric build counter of this packaging of `version`.
    pub release: String,
    /// Free-text version qualifier (`beta-1`, `rc2`).
    pub prerelease: String,
    /// Archive section (Deb `Section`).
    pub section: String,
    /// Archive priority (Deb `Priority`).
    pub priority: String,
    /// Maintainer contact, `Name <email>`.
    pub maintainer: String,
    /// Long description.
    pub description: String,
    /// Vendor or distributor.
    pub vendor: String,
    /// Project homepage.
    pub homepage: String,
    /// License expression.
    pub license: String,
    /// Path to a changelog file (carried, not parsed).
    pub changelog: String,
    /// Timestamp (Unix seconds) stamped on generated metadata files.
    pub mtime: Option<i64>,
}

/// The subset of [`Info`] that per-format overrides may replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overridables {
    /// Packages this one replaces.
    pub replaces: Vec<String>,
    /// Virtual packages this one provides.
    pub provides: Vec<String>,
    /// Hard runtime dependencies.
    pub depends: Vec<String>,
    /// Weak dependencies installed by default.
    pub recommends: Vec<String>,
    /// Weak dependencies not installed by default.
    pub suggests: Vec<String>,
    /// Packages that cannot be installed alongside this one.
    pub conflicts: Vec<String>,
    /// Explicit content entries.
    pub contents: Vec<Content>,
    /// Source glob to destination root.
    pub files: BTreeMap<String, String>,
    /// Source glob to destination root, flagged as configuration.
    pub config_files: BTreeMap<String, String>,
    /// Link path to link target.
    pub symlinks: BTreeMap<String, String>,
    /// Directories created with no content.
    pub empty_folders: Vec<String>,
    /// Maintainer scripts shared by every format.
    pub scripts: Scripts,
    /// RPM-only settings.
    pub rpm: Rpm,
    /// Deb-only settings.
    pub deb: Deb,
    /// Arch Linux-only settings.
    pub archlinux: ArchLinux,
    /// APK-only settings.
    pub apk: Apk,
}

/// Maintainer lifecycle scripts, as paths read in full at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scripts {
    /// Runs before the package files are unpacked.
    pub preinstall: Option<PathBuf>,
    /// Runs after the package files are unpacked.
    pub postinstall: Option<PathBuf>,
    /// Runs before the package files are removed.
    pub preremove: Option<PathBuf>,
    /// Runs after the package files are removed.
    pub postremove: Option<PathBuf>,
}

/// Upgrade hooks supported by Arch Linux and APK.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeScripts {
    /// Runs before an upgrade.
    pub preupgrade: Option<PathBuf>,
    /// Runs after an upgrade.
    pub postupgrade: Option<PathBuf>,
}

/// RPM-only settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rpm {
    /// RPM `Group` tag.
    pub group: String,
    /// One-line summary; defaults to the first description line.
    pub summary: String,
    /// Payload codec: `gzip` (default), `zstd`, `xz` or `none`.
    pub compression: String,
    /// Source glob to destination root, packaged as `%config(noreplace)`.
    pub config_noreplace_files: BTreeMap<String, String>,
}

/// Deb-only settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deb {
    /// Extra control-archive scripts.
    pub scripts: DebScripts,
    /// dpkg trigger declarations.
    pub triggers: DebTriggers,
    /// Version metadata appended as `+metadata`.
    pub metadata: String,
    /// Data archive codec: `gzip` (default), `zstd` or `none`.
    pub compression: String,
    /// Architecture override, bypassing the alias table.
    pub arch: String,
}

/// Deb control-archive files beyond the maintainer scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebScripts {
    /// `debian/rules` style script.
    pub rules: Option<PathBuf>,
    /// debconf templates.
    pub templates: Option<PathBuf>,
    /// debconf config script.
    pub config: Option<PathBuf>,
}

/// dpkg trigger declarations, see `deb-triggers(5)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebTriggers {
    /// `interest` triggers.
    pub interest: Vec<String>,
    /// `interest-await` triggers.
    pub interest_await: Vec<String>,
    /// `interest-noawait` triggers.
    pub interest_noawait: Vec<String>,
    /// `activate` triggers.
    pub activate: Vec<String>,
    /// `activate-await` triggers.
    pub activate_await: Vec<String>,
    /// `activate-noawait` triggers.
    pub activate_noawait: Vec<String>,
}

/// Arch Linux-only settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchLinux {
    /// `pkgbase`; defaults to the package name.
    pub pkgbase: String,
    /// Architecture override, bypassing the alias table.
    pub arch: String,
    /// `packager`; defaults to the maintainer.
    pub packager: String,
    /// Upgrade hooks.
    pub scripts: UpgradeScripts,
}

/// APK-only settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Apk {
    /// Architecture override, bypassing the alias table.
    pub arch: String,
    /// Upgrade hooks.
    pub scripts: UpgradeScripts,
}

impl Info {
    /// Check the fields every packager needs.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::FieldEmpty`] naming the first empty field among
    /// name, arch and version.
    pub fn validate(&self) -> Result<(), InfoError> {
        if self.name.is_empty() {
            return Err(InfoError::FieldEmpty("name"));
        }
        if self.arch.is_empty() {
            return Err(InfoError::FieldEmpty("arch"));
        }
        if self.version.is_empty() {
            return Err(InfoError::FieldEmpty("version"));
        }
        Ok(())
    }

    /// Apply defaults and normalize the version fields.
    ///
    /// Platform defaults to `linux`, description to a placeholder, and the
    /// version is run through [`crate::version::normalize`].
    pub fn with_defaults(mut self) -> Self {
        if self.platform.is_empty() {
            self.platform = DEFAULT_PLATFORM.to_string();
        }
        if self.description.is_empty() {
            self.description = DEFAULT_DESCRIPTION.to_string();
        }
        crate::version::normalize(&mut self);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Info {
        Info {
            name: "foo".to_string(),
            arch: "amd64".to_string(),
            version: "1.0.0".to_string(),
            ..Info::default()
        }
    }

    #[test]
    fn defaults_platform_and_description() {
        let info = minimal().with_defaults();
        assert_eq!(info.platform, "linux");
        assert_eq!(info.description, "no description given");
    }

    #[test]
    fn keeps_explicit_platform() {
        let info = Info {
            platform: "darwin".to_string(),
            ..minimal()
        }
        .with_defaults();
        assert_eq!(info.platform, "darwin");
    }

    #[test]
    fn validate_reports_first_empty_field() {
        assert_eq!(
            Info::default().validate(),
            Err(InfoError::FieldEmpty("name"))
        );
        let no_arch = Info {
            arch: String::new(),
            ..minimal()
        };
        assert_eq!(no_arch.validate(), Err(InfoError::FieldEmpty("arch")));
        let no_version = Info {
            version: String::new(),
            ..minimal()
        };
        assert_eq!(no_version.validate(), Err(InfoError::FieldEmpty("version")));
        assert!(minimal().validate().is_ok());
    }

    #[test]
    fn error_message_names_field() {
        assert_eq!(
            InfoError::FieldEmpty("arch").to_string(),
            "package arch must be provided"
        );
    }
}
