//! RPM packages.
//!
//! Lead, signature header, header and cpio payload are produced by the
//! `rpm` crate. This module only maps the descriptor onto its builder:
//! version splitting, dependency parsing, file flags and scriptlets.

use std::fs;
use std::io::Write;
use std::sync::OnceLock;

use pakr_schema::{Content, ContentType, Format, Info, version};
use regex::Regex;
use rpm::{BuildConfig, CompressionType, Dependency, FileMode, FileOptions, PackageBuilder};
use tracing::{debug, info};

use crate::error::PackageError;
use crate::files;
use crate::formats::{Packager, check_name, file_name_arch, prepare};
use crate::scripts;

const FORMAT: &str = "rpm";

/// The RPM packager.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rpm;

fn name_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_+][A-Za-z0-9._+-]*$")
            .unwrap_or_else(|_| unreachable!("static pattern"))
    })
}

fn relation_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"^\s*(\S+?)\s*(<=|>=|=|<|>)\s*(\S+)\s*$")
            .unwrap_or_else(|_| unreachable!("static pattern"))
    })
}

impl Packager for Rpm {
    fn package(&self, info: &Info, w: &mut dyn Write) -> Result<(), PackageError> {
        let info = prepare(info, Format::Rpm, FORMAT, "")?;
        check_name(name_grammar(), &info.name, FORMAT)?;
        let compression = compression(&info.overridables.rpm.compression)?;
        let epoch = version::rpm_epoch(&info)?;
        let rpm_version = version::rpm_version(&info);
        let release = version::rpm_release(&info);

        let contents = files::resolve(&info, Format::Rpm)?;
        let over = &info.overridables;

        let mut builder = PackageBuilder::new(
            &info.name,
            &rpm_version,
            &info.license,
            &info.arch,
            &summary(&info),
        )
        .release(release.as_str())
        .using_config(BuildConfig::default().compression(compression))
        .description(info.description.as_str())
        .vendor(info.vendor.as_str())
        .url(info.homepage.as_str())
        .packager(info.maintainer.as_str())
        .group(over.rpm.group.as_str());
        if let Some(epoch) = epoch {
            builder = builder.epoch(epoch);
        }
        if let Some(mtime) = info.mtime {
            builder = builder.source_date(mtime.clamp(0, i64::from(u32::MAX)) as u32);
        }

        for content in &contents {
            builder = add_content(builder, content)?;
            debug!("archived {} ({})", content.absolute_path(), content.kind);
        }

        let hooks = &over.scripts;
        if let Some(body) = scripts::read(hooks.preinstall.as_deref())? {
            builder = builder.pre_install_script(String::from_utf8_lossy(&body).into_owned());
        }
        if let Some(body) = scripts::read(hooks.postinstall.as_deref())? {
            builder = builder.post_install_script(String::from_utf8_lossy(&body).into_owned());
        }
        if let Some(body) = scripts::read(hooks.preremove.as_deref())? {
            builder = builder.pre_uninstall_script(String::from_utf8_lossy(&body).into_owned());
        }
        if let Some(body) = scripts::read(hooks.postremove.as_deref())? {
            builder = builder.post_uninstall_script(String::from_utf8_lossy(&body).into_owned());
        }

        for dep in &over.depends {
            builder = builder.requires(dependency(dep));
        }
        for dep in &over.provides {
            builder = builder.provides(dependency(dep));
        }
        for dep in &over.conflicts {
            builder = builder.conflicts(dependency(dep));
        }
        for dep in &over.replaces {
            builder = builder.obsoletes(dependency(dep));
        }
        for dep in &over.recommends {
            builder = builder.recommends(dependency(dep));
        }
        for dep in &over.suggests {
            builder = builder.suggests(dependency(dep));
        }

        let package = builder.build()?;
        let mut w = w;
        package.write(&mut w)?;

        info!(
            "packaged {} {rpm_version}-{} for {}",
            info.name,
            version::rpm_release(&info),
            info.arch
        );
        Ok(())
    }

    fn conventional_file_name(&self, info: &Info) -> String {
        let arch = file_name_arch(info, Format::Rpm, "");
        format!(
            "{}-{}-{}.{arch}{}",
            info.name,
            version::rpm_version(info),
            version::rpm_release(info),
            self.conventional_extension()
        )
    }

    fn conventional_extension(&self) -> &'static str {
        ".rpm"
    }
}

fn compression(name: &str) -> Result<CompressionType, PackageError> {
    match name {
        "" | "gzip" => Ok(CompressionType::Gzip),
        "zstd" => Ok(CompressionType::Zstd),
        "xz" => Ok(CompressionType::Xz),
        "none" => Ok(CompressionType::None),
        other => Err(PackageError::UnsupportedCompression {
            format: FORMAT,
            codec: other.to_string(),
        }),
    }
}

/// The `Summary` tag: `rpm.summary`, else the first description line.
fn summary(info: &Info) -> String {
    let summary = &info.overridables.rpm.summary;
    if summary.is_empty() {
        info.description.lines().next().unwrap_or_default().to_string()
    } else {
        summary.clone()
    }
}

fn add_content(builder: PackageBuilder, content: &Content) -> Result<PackageBuilder, PackageError> {
    let path = content.absolute_path();
    let permissions = content.mode() as u16;
    let options = FileOptions::new(path.as_str())
        .user(content.owner())
        .group(content.group());

    let builder = match content.kind {
        ContentType::Dir => builder.with_file_contents(
            Vec::new(),
            options.mode(FileMode::Dir { permissions }),
        )?,
        ContentType::Symlink => {
            builder.with_file_contents(Vec::new(), options.symlink(content.source.as_str()))?
        }
        ContentType::File | ContentType::Config | ContentType::ConfigNoReplace => {
            let bytes = fs::read(&content.source)
                .map_err(|e| PackageError::unreadable(&content.source, e))?;
            let options = options.mode(FileMode::Regular { permissions });
            let options = match content.kind {
                ContentType::Config => options.is_config(),
                ContentType::ConfigNoReplace => options.is_config_noreplace(),
                _ => options,
            };
            builder.with_file_contents(bytes, options)?
        }
    };
    Ok(builder)
}

/// Parse `name` or `name op version` (spaces optional) into an RPM relation.
pub fn dependency(spec: &str) -> Dependency {
    let Some(caps) = relation_grammar().captures(spec) else {
        return Dependency::any(spec.trim());
    };
    let (name, op, ver) = (&caps[1], &caps[2], &caps[3]);
    match op {
        "<=" => Dependency::less_eq(name, ver),
        ">=" => Dependency::greater_eq(name, ver),
        "<" => Dependency::less(name, ver),
        ">" => Dependency::greater(name, ver),
        _ => Dependency::eq(name, ver),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> Info {
        Info {
            name: "foo".into(),
            arch: "amd64".into(),
            version: "1.0.0-beta.2".into(),
            release: "3".into(),
            description: "Foo does things\nand more".into(),
            ..Info::default()
        }
        .with_defaults()
    }

    #[test]
    fn parses_relations() {
        let same = |a: Dependency, b: Dependency| format!("{a:?}") == format!("{b:?}");
        assert!(same(dependency("bash"), Dependency::any("bash")));
        assert!(same(dependency("bash >= 4.0"), Dependency::greater_eq("bash", "4.0")));
        assert!(same(dependency("zsh<5"), Dependency::less("zsh", "5")));
        assert!(same(dependency("fish = 3.1"), Dependency::eq("fish", "3.1")));
    }

    #[test]
    fn summary_falls_back_to_first_description_line() {
        let mut info = example();
        assert_eq!(summary(&info), "Foo does things");
        info.overridables.rpm.summary = "short".into();
        assert_eq!(summary(&info), "short");
    }

    #[test]
    fn unknown_compression_is_rejected() {
        assert!(matches!(compression("lzma"), Err(PackageError::UnsupportedCompression { .. })));
        assert!(matches!(compression(""), Ok(CompressionType::Gzip)));
    }

    #[test]
    fn conventional_file_name_uses_rpm_arch() {
        assert_eq!(
            Rpm.conventional_file_name(&example()),
            "foo-1.0.0~beta.2-3.x86_64.rpm"
        );
    }

    #[test]
    fn builds_a_package_with_every_entry_kind() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("tool");
        fs::write(&src, "#!/bin/sh\n").unwrap();

        let mut info = example();
        info.overridables.files.insert(src.display().to_string(), "/usr/bin/tool".into());
        info.overridables.symlinks.insert("/usr/bin/t".into(), "/usr/bin/tool".into());
        info.overridables.empty_folders = vec!["/var/lib/foo".into()];
        info.overridables.depends = vec!["bash >= 4".into()];

        let mut out = Vec::new();
        Rpm.package(&info, &mut out).unwrap();
        assert_eq!(&out[..4], &[0xED, 0xAB, 0xEE, 0xDB]);

        let package = rpm::Package::parse(&mut out.as_slice()).unwrap();
        assert_eq!(package.metadata.get_version().unwrap(), "1.0.0~beta.2");
        assert_eq!(package.metadata.get_release().unwrap(), "3");
        assert_eq!(package.metadata.get_summary().unwrap(), "Foo does things");
        let mut paths: Vec<String> = package
            .metadata
            .get_file_paths()
            .unwrap()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        paths.sort();
        assert_eq!(paths, vec!["/usr/bin/t", "/usr/bin/tool", "/var/lib/foo"]);
    }
}
