//! Content entries: one packaged path each.
//!
//! Destinations are package-relative and always carried in their canonical
//! `./usr/bin/tool` form. Formats derive their own spelling from it via
//! [`Content::relative_path`] (`usr/bin/tool`) or
//! [`Content::absolute_path`] (`/usr/bin/tool`).

use serde::{Deserialize, Serialize};

/// Default owner and group for packaged paths.
pub const DEFAULT_OWNER: &str = "root";

/// The single type tag of a content entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ContentType {
    /// Regular file copied from `src`.
    #[default]
    #[serde(rename = "file")]
    File,
    /// Directory; `src` is ignored.
    #[serde(rename = "dir")]
    Dir,
    /// Symbolic link; `src` holds the link target.
    #[serde(rename = "symlink")]
    Symlink,
    /// Configuration file preserved across upgrades when locally edited.
    #[serde(rename = "config")]
    Config,
    /// Configuration file never replaced on upgrade (RPM `%config(noreplace)`).
    #[serde(rename = "config|noreplace")]
    ConfigNoReplace,
}

impl ContentType {
    /// True for entries whose bytes come from a source file.
    pub fn has_content(self) -> bool {
        matches!(self, Self::File | Self::Config | Self::ConfigNoReplace)
    }

    /// True for entries listed in the format's backup/conffiles mechanism.
    pub fn is_config(self) -> bool {
        matches!(self, Self::Config | Self::ConfigNoReplace)
    }

    /// Permission bits used when neither the descriptor nor the filesystem
    /// supplies any.
    pub fn default_mode(self) -> u32 {
        match self {
            Self::Dir => 0o755,
            Self::Symlink => 0o777,
            Self::File | Self::Config | Self::ConfigNoReplace => 0o644,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::File => "file",
            Self::Dir => "dir",
            Self::Symlink => "symlink",
            Self::Config => "config",
            Self::ConfigNoReplace => "config|noreplace",
        };
        f.write_str(name)
    }
}

/// Ownership, permission and timing metadata for an entry.
///
/// Fields left unset in the descriptor are filled from the source file by
/// the content resolver, or fall back to per-type defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInfo {
    /// Permission bits (`0o755`), without file-type bits.
    pub mode: Option<u32>,
    /// Owning user name.
    pub owner: Option<String>,
    /// Owning group name.
    pub group: Option<String>,
    /// Modification time in Unix seconds.
    pub mtime: Option<i64>,
    /// Size in bytes, known once the source has been inspected.
    #[serde(skip)]
    pub size: u64,
}

/// One file, directory, symlink or config file placed inside the package.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Content {
    /// Source path, or link target for symlinks; empty for directories.
    #[serde(default, rename = "src")]
    pub source: String,
    /// Destination inside the package, e.g. `/usr/bin/tool`.
    #[serde(rename = "dst")]
    pub destination: String,
    /// Entry type.
    #[serde(default, rename = "type")]
    pub kind: ContentType,
    /// Explicit metadata overrides.
    #[serde(default)]
    pub file_info: FileInfo,
}

impl Content {
    /// Build an entry with a normalized destination.
    pub fn new(source: impl Into<String>, destination: &str, kind: ContentType) -> Self {
        Self {
            source: source.into(),
            destination: normalize_destination(destination),
            kind,
            file_info: FileInfo::default(),
        }
    }

    /// Destination without any leading `./` or `/`.
    pub fn relative_path(&self) -> &str {
        relative(&self.destination)
    }

    /// Destination with a single leading `/`.
    pub fn absolute_path(&self) -> String {
        format!("/{}", self.relative_path())
    }

    /// Effective permission bits.
    pub fn mode(&self) -> u32 {
        self.file_info
            .mode
            .map_or_else(|| self.kind.default_mode(), |m| m & 0o7777)
    }

    /// Effective owner.
    pub fn owner(&self) -> &str {
        self.file_info.owner.as_deref().unwrap_or(DEFAULT_OWNER)
    }

    /// Effective group.
    pub fn group(&self) -> &str {
        self.file_info.group.as_deref().unwrap_or(DEFAULT_OWNER)
    }

    /// Effective modification time (Unix seconds, never negative).
    pub fn mtime(&self) -> u64 {
        self.file_info.mtime.map_or(0, |t| t.max(0) as u64)
    }

    /// Size of the source content in bytes (zero for non-file entries).
    pub fn size(&self) -> u64 {
        if self.kind.has_content() {
            self.file_info.size
        } else {
            0
        }
    }
}

/// Canonicalize a destination to the `./a/b` form.
///
/// Repeated separators and `.` components are dropped, `..` pops the
/// previous component, and any trailing separator is removed.
pub fn normalize_destination(dst: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in dst.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("./{}", parts.join("/"))
}

fn relative(path: &str) -> &str {
    path.trim_start_matches("./").trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_destinations() {
        assert_eq!(normalize_destination("/usr/bin/fake"), "./usr/bin/fake");
        assert_eq!(normalize_destination("usr//bin/"), "./usr/bin");
        assert_eq!(normalize_destination("./etc/./fake/../x.conf"), "./etc/x.conf");
    }

    #[test]
    fn derives_format_spellings() {
        let content = Content::new("", "/var/log/whatever/", ContentType::Dir);
        assert_eq!(content.destination, "./var/log/whatever");
        assert_eq!(content.relative_path(), "var/log/whatever");
        assert_eq!(content.absolute_path(), "/var/log/whatever");
    }

    #[test]
    fn mode_defaults_follow_type() {
        assert_eq!(Content::new("", "/d", ContentType::Dir).mode(), 0o755);
        assert_eq!(Content::new("/x", "/l", ContentType::Symlink).mode(), 0o777);

        let mut file = Content::new("a", "/f", ContentType::File);
        file.file_info.mode = Some(0o100_600);
        assert_eq!(file.mode(), 0o600);
    }

    #[test]
    fn config_types_are_flagged() {
        assert!(ContentType::Config.is_config());
        assert!(ContentType::ConfigNoReplace.has_content());
        assert!(!ContentType::Symlink.has_content());
    }

    #[test]
    fn parses_from_toml() {
        let content: Content = toml::from_str(
            r#"
            src = "./build/tool.conf"
            dst = "/etc/tool.conf"
            type = "config|noreplace"
            file_info = { mode = 0o600, owner = "tool" }
            "#,
        )
        .unwrap();
        assert_eq!(content.kind, ContentType::ConfigNoReplace);
        assert_eq!(content.file_info.mode, Some(0o600));
        assert_eq!(content.owner(), "tool");
        assert_eq!(content.group(), "root");
    }
}
