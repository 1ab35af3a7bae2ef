//! Version normalization and per-format version strings.
//!
//! [`normalize`] runs once when defaults are applied. The `*_version`
//! functions render the normalized fields in each ecosystem's grammar:
//!
//! | format | grammar |
//! |--------|---------|
//! | RPM    | `version[~prerelease][+metadata]`, release separate |
//! | Deb    | `[epoch:]version[~prerelease][+metadata][-release]` |
//! | Arch   | `[epoch:]version[prerelease]-pkgrel`, no `-` in pkgver |
//! | APK    | `version[_prerelease]-r<release>` |

use thiserror::Error;

use crate::info::Info;

/// Release used when the descriptor does not carry one.
pub const DEFAULT_RELEASE: &str = "1";

/// Version rendering failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The epoch is not an unsigned integer.
    #[error("invalid epoch '{0}': must be an unsigned integer")]
    InvalidEpoch(String),
}

/// Canonicalize `info.version` when it parses as strict semver.
///
/// A leading `v` is ignored. On success the version becomes
/// `major.minor.patch`. A purely numeric pre-release fills an empty release
/// and is otherwise dropped; any other pre-release fills an empty
/// prerelease. Build metadata fills an empty `deb.metadata`. Versions that do
/// not parse are left untouched.
pub fn normalize(info: &mut Info) {
    let raw = info.version.strip_prefix('v').unwrap_or(&info.version);
    let Ok(parsed) = semver::Version::parse(raw) else {
        return;
    };

    info.version = format!("{}.{}.{}", parsed.major, parsed.minor, parsed.patch);

    let pre = parsed.pre.as_str();
    if is_numeric(pre) {
        if info.release.is_empty() {
            info.release = pre.to_string();
        }
    } else if !pre.is_empty() && info.prerelease.is_empty() {
        info.prerelease = pre.to_string();
    }

    let build = parsed.build.as_str();
    if !build.is_empty() && info.overridables.deb.metadata.is_empty() {
        info.overridables.deb.metadata = build.to_string();
    }
}

/// RPM `Version` tag: `version[~prerelease][+metadata]`.
///
/// When the release is empty and the version still carries a hyphen, only
/// the part before the first hyphen is used (see [`rpm_release`]).
pub fn rpm_version(info: &Info) -> String {
    let (version, _) = split_release(info);
    let mut out = version.to_string();
    if !info.prerelease.is_empty() {
        out.push('~');
        out.push_str(&underscored(&info.prerelease));
    }
    if !info.overridables.deb.metadata.is_empty() {
        out.push('+');
        out.push_str(&info.overridables.deb.metadata);
    }
    out
}

/// RPM `Release` tag, split from a combined `version-release` when needed.
pub fn rpm_release(info: &Info) -> String {
    match split_release(info) {
        (_, Some(release)) => release.to_string(),
        (_, None) => DEFAULT_RELEASE.to_string(),
    }
}

/// RPM epoch, when one is set.
///
/// # Errors
///
/// Returns [`VersionError::InvalidEpoch`] if the epoch does not fit a `u32`.
pub fn rpm_epoch(info: &Info) -> Result<Option<u32>, VersionError> {
    if info.epoch.is_empty() {
        return Ok(None);
    }
    info.epoch
        .parse()
        .map(Some)
        .map_err(|_| VersionError::InvalidEpoch(info.epoch.clone()))
}

/// Debian `Version` field.
pub fn deb_version(info: &Info) -> String {
    let mut out = String::new();
    if !info.epoch.is_empty() {
        out.push_str(&info.epoch);
        out.push(':');
    }
    out.push_str(&info.version);
    if !info.prerelease.is_empty() {
        out.push('~');
        out.push_str(&info.prerelease);
    }
    if !info.overridables.deb.metadata.is_empty() {
        out.push('+');
        out.push_str(&info.overridables.deb.metadata);
    }
    if !info.release.is_empty() {
        out.push('-');
        out.push_str(&info.release);
    }
    out
}

/// Arch Linux `pkgrel`: the numeric release, or `1`.
pub fn archlinux_pkgrel(info: &Info) -> u64 {
    info.release.parse().unwrap_or(1)
}

/// Arch Linux version without epoch or pkgrel: hyphen-free `version+prerelease`.
pub fn archlinux_pkgver(info: &Info) -> String {
    format!(
        "{}{}",
        underscored(&info.version),
        underscored(&info.prerelease)
    )
}

/// Full Arch Linux `pkgver` field: `[epoch:]pkgver-pkgrel`.
///
/// # Errors
///
/// Returns [`VersionError::InvalidEpoch`] if the epoch is not a `u64`.
pub fn archlinux_version(info: &Info) -> Result<String, VersionError> {
    let pkgver = archlinux_pkgver(info);
    let pkgrel = archlinux_pkgrel(info);
    if info.epoch.is_empty() {
        return Ok(format!("{pkgver}-{pkgrel}"));
    }
    let epoch: u64 = info
        .epoch
        .parse()
        .map_err(|_| VersionError::InvalidEpoch(info.epoch.clone()))?;
    Ok(format!("{epoch}:{pkgver}-{pkgrel}"))
}

/// APK `pkgver`: `version[_prerelease]-r<release>`.
pub fn apk_version(info: &Info) -> String {
    let mut out = info.version.clone();
    if !info.prerelease.is_empty() {
        out.push('_');
        out.push_str(&info.prerelease);
    }
    let release = if info.release.is_empty() {
        DEFAULT_RELEASE
    } else {
        &info.release
    };
    format!("{out}-r{release}")
}

fn split_release(info: &Info) -> (&str, Option<&str>) {
    if !info.release.is_empty() {
        return (&info.version, Some(&info.release));
    }
    match info.version.split_once('-') {
        Some((version, release)) => (version, Some(release)),
        None => (&info.version, None),
    }
}

fn underscored(s: &str) -> String {
    s.replace('-', "_")
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
