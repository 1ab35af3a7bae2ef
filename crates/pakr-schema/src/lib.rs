//! Package descriptor model for pakr.
//!
//! This crate is pure data: the [`Info`] descriptor and its per-format
//! [`Overridables`], the override [`Merge`] rules, TOML [`Config`] loading,
//! content entry typing, architecture alias tables and the version grammar
//! of each supported format. It performs no archive I/O.

pub mod arch;
pub mod config;
pub mod content;
pub mod hash;
pub mod info;
pub mod merge;
pub mod version;

// Re-exports
pub use arch::{Arch, Format, translate};
pub use config::{Config, ConfigError};
pub use content::{Content, ContentType, FileInfo, normalize_destination};
pub use hash::{FileDigests, HexDigest};
pub use info::{
    Apk, ArchLinux, Deb, DebScripts, DebTriggers, Info, InfoError, Overridables, Rpm, Scripts,
    UpgradeScripts,
};
pub use merge::Merge;
pub use version::VersionError;
