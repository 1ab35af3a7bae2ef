//! Init command: write a sample descriptor

use anyhow::{Context, Result};
use std::path::Path;

use crate::ui::Output;

/// Commented sample descriptor written by `pakr init`.
pub const SAMPLE: &str = r#"# pakr package descriptor.
# Build with: pakr package -p deb -p rpm -p apk -p archlinux -t dist/
name = "foo"
arch = "amd64"
platform = "linux"
# `$VAR` and `${VAR}` are expanded in version and release,
# e.g. version = "${VERSION}".
version = "1.0.0"
release = "1"
section = "default"
priority = "extra"
maintainer = "Jane Doe <jane@example.com>"
description = """
Foo does things.
It does them well."""
vendor = "Example Corp"
homepage = "https://example.com"
license = "MIT"

depends = ["bash"]
recommends = []
suggests = []
conflicts = []
replaces = []
provides = []

# Source file or glob -> destination.
[files]
"./build/foo" = "/usr/bin/foo"

[config_files]
"./foo.conf" = "/etc/foo/foo.conf"

# Link path -> target.
[symlinks]
"/usr/local/bin/foo" = "/usr/bin/foo"

# Explicit entries with ownership and mode.
# [[contents]]
# src = "./docs"
# dst = "/usr/share/doc/foo"
# type = "file"
# file_info = { mode = 0o644, owner = "root", group = "root" }

# [scripts]
# preinstall = "./scripts/preinstall.sh"
# postinstall = "./scripts/postinstall.sh"
# preremove = "./scripts/preremove.sh"
# postremove = "./scripts/postremove.sh"

# Per-format overrides are merged over the fields above.
[overrides.rpm]
depends = ["bash >= 4"]

[overrides.deb.deb]
compression = "zstd"
"#;

/// Write [`SAMPLE`] to `path`, refusing to overwrite.
pub fn init(path: &Path, output: &Output) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Descriptor already exists: {}", path.display());
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    std::fs::write(path, SAMPLE).with_context(|| format!("Failed to write {}", path.display()))?;

    output.success(&format!("Created descriptor: {}", path.display()));
    output.info(&format!(
        "Edit it and run 'pakr package -f {} -p deb' to build.",
        path.display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pakr_schema::Config;
    use tempfile::TempDir;

    #[test]
    fn sample_is_a_valid_descriptor() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.info.name, "foo");
        assert!(config.validate(|f| f == "rpm" || f == "deb").is_ok());
        assert_eq!(config.get("deb").overridables.deb.compression, "zstd");
        assert_eq!(config.get("rpm").overridables.depends, vec!["bash >= 4"]);
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pakr.toml");
        init(&path, &Output::new(true)).unwrap();
        assert!(init(&path, &Output::new(true)).is_err());
    }
}
