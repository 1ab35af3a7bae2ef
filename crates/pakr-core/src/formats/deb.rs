//! Debian `.deb` packages.
//!
//! An `ar` archive of `debian-binary`, `control.tar.gz` and
//! `data.tar[.gz|.zst]`. The data tar is written first, into a temporary
//! file, because `control` needs the installed size and `md5sums` needs every
//! file digest.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{Seek, Write};
use std::sync::OnceLock;

use pakr_schema::{Content, ContentType, Format, Info, version};
use regex::Regex;
use tracing::{debug, info};

use crate::archive::{EntryMeta, TarWriter};
use crate::compress::{Codec, gzip};
use crate::error::PackageError;
use crate::files;
use crate::formats::{Packager, build_time, check_name, file_name_arch, prepare};
use crate::scripts::{self, Hook};

const FORMAT: &str = "deb";

/// Contents of the `debian-binary` member.
pub const DEBIAN_BINARY: &[u8] = b"2.0\n";

/// The Debian packager.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deb;

fn name_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9.+-]+$").unwrap_or_else(|_| unreachable!("static pattern"))
    })
}

/// What the control member needs to know about the data member.
#[derive(Debug, Default)]
struct DataSummary {
    installed_size: u64,
    md5sums: String,
    conffiles: String,
}

impl Packager for Deb {
    fn package(&self, info: &Info, w: &mut dyn Write) -> Result<(), PackageError> {
        let info = prepare(info, Format::Deb, FORMAT, &info.overridables.deb.arch)?;
        check_name(name_grammar(), &info.name, FORMAT)?;
        let codec = Codec::parse(&info.overridables.deb.compression, FORMAT)?;

        let mtime = build_time(&info);
        let contents = with_parent_dirs(files::resolve(&info, Format::Deb)?, mtime);
        let hooks = maintainer_scripts(&info)?;

        let (mut data, summary) = data_tar(&contents, codec, mtime)?;
        let control = control_tar(&info, &summary, &hooks, mtime)?;

        let data_len = data.stream_position()?;
        data.rewind()?;

        let mut ar = ar::Builder::new(w);
        ar.append(&ar_header("debian-binary", DEBIAN_BINARY.len() as u64, mtime), DEBIAN_BINARY)?;
        ar.append(&ar_header("control.tar.gz", control.len() as u64, mtime), control.as_slice())?;
        let data_name = format!("data.tar{}", codec.extension());
        ar.append(&ar_header(&data_name, data_len, mtime), &mut data)?;

        info!(
            "packaged {} {} for {}",
            info.name,
            version::deb_version(&info),
            info.arch
        );
        Ok(())
    }

    fn conventional_file_name(&self, info: &Info) -> String {
        let arch = file_name_arch(info, Format::Deb, &info.overridables.deb.arch);
        let mut bare = info.clone();
        bare.epoch.clear();
        format!(
            "{}_{}_{arch}{}",
            info.name,
            version::deb_version(&bare),
            self.conventional_extension()
        )
    }

    fn conventional_extension(&self) -> &'static str {
        ".deb"
    }
}

fn ar_header(name: &str, size: u64, mtime: u64) -> ar::Header {
    let mut header = ar::Header::new(name.as_bytes().to_vec(), size);
    header.set_mode(0o100_644);
    header.set_mtime(mtime);
    header.set_uid(0);
    header.set_gid(0);
    header
}

/// Add a directory entry for every ancestor that is not declared itself.
fn with_parent_dirs(mut contents: Vec<Content>, mtime: u64) -> Vec<Content> {
    let declared: BTreeSet<String> = contents.iter().map(|c| c.relative_path().to_string()).collect();
    let mut implicit = BTreeSet::new();
    for content in &contents {
        let mut path = content.relative_path();
        while let Some((parent, _)) = path.rsplit_once('/') {
            if !declared.contains(parent) {
                implicit.insert(parent.to_string());
            }
            path = parent;
        }
    }
    for dir in implicit {
        let mut entry = Content::new("", &dir, ContentType::Dir);
        entry.file_info.mtime = i64::try_from(mtime).ok();
        contents.push(entry);
    }
    contents.sort_by(|a, b| a.destination.cmp(&b.destination));
    contents
}

fn maintainer_scripts(info: &Info) -> Result<Vec<Hook>, PackageError> {
    let common = &info.overridables.scripts;
    let deb = &info.overridables.deb.scripts;
    scripts::collect(&[
        ("preinst", &common.preinstall),
        ("postinst", &common.postinstall),
        ("prerm", &common.preremove),
        ("postrm", &common.postremove),
        ("rules", &deb.rules),
        ("templates", &deb.templates),
        ("config", &deb.config),
    ])
}

fn data_tar(
    contents: &[Content],
    codec: Codec,
    mtime: u64,
) -> Result<(File, DataSummary), PackageError> {
    let mut summary = DataSummary::default();
    let mut tar = TarWriter::new(codec.encoder(tempfile::tempfile()?)?);
    tar.dir("./", EntryMeta::root(0o755, mtime))?;

    for content in contents {
        let rel = content.relative_path();
        let meta = EntryMeta::of(content);
        match content.kind {
            ContentType::Dir => tar.dir(&format!("./{rel}/"), meta)?,
            ContentType::Symlink => tar.symlink(&format!("./{rel}"), &content.source, meta)?,
            ContentType::File | ContentType::Config | ContentType::ConfigNoReplace => {
                let file = File::open(&content.source)
                    .map_err(|e| PackageError::unreadable(&content.source, e))?;
                let digests = tar
                    .stream(&format!("./{rel}"), file, content.size(), meta)
                    .map_err(|e| PackageError::unreadable(&content.source, e))?;
                summary.installed_size += digests.size;
                let _ = writeln!(summary.md5sums, "{}  {rel}", digests.md5);
                if content.kind.is_config() {
                    let _ = writeln!(summary.conffiles, "{}", content.absolute_path());
                }
            }
        }
        debug!("archived ./{rel} ({})", content.kind);
    }

    let file = tar.finish()?.finish()?;
    Ok((file, summary))
}

fn control_tar(
    info: &Info,
    summary: &DataSummary,
    hooks: &[Hook],
    mtime: u64,
) -> Result<Vec<u8>, PackageError> {
    let mut tar = TarWriter::new(Vec::new());
    tar.dir("./", EntryMeta::root(0o755, mtime))?;

    let control = render_control(info, summary.installed_size);
    tar.bytes("./control", control.as_bytes(), EntryMeta::root(0o644, mtime))?;
    tar.bytes("./md5sums", summary.md5sums.as_bytes(), EntryMeta::root(0o644, mtime))?;
    if !summary.conffiles.is_empty() {
        tar.bytes("./conffiles", summary.conffiles.as_bytes(), EntryMeta::root(0o644, mtime))?;
    }
    for hook in hooks {
        let mode = if hook.name == "templates" { 0o644 } else { 0o755 };
        tar.bytes(&format!("./{}", hook.name), &hook.body, EntryMeta::root(mode, mtime))?;
    }
    if let Some(triggers) = scripts::deb_triggers(&info.overridables.deb.triggers) {
        tar.bytes("./triggers", triggers.as_bytes(), EntryMeta::root(0o644, mtime))?;
    }

    Ok(gzip(&tar.finish()?)?)
}

/// Render the `control` file. `installed_size` is in bytes and is written
/// in KiB, rounded up.
pub fn render_control(info: &Info, installed_size: u64) -> String {
    let over = &info.overridables;
    let mut out = String::new();
    let mut field = |key: &str, value: &str| {
        if !value.is_empty() {
            let _ = writeln!(out, "{key}: {value}");
        }
    };
    field("Package", &info.name);
    field("Version", &version::deb_version(info));
    field("Section", &info.section);
    field("Priority", &info.priority);
    field("Architecture", &info.arch);
    field("Maintainer", &info.maintainer);
    field("Installed-Size", &installed_size.div_ceil(1024).to_string());
    field("Replaces", &over.replaces.join(", "));
    field("Provides", &over.provides.join(", "));
    field("Depends", &over.depends.join(", "));
    field("Recommends", &over.recommends.join(", "));
    field("Suggests", &over.suggests.join(", "));
    field("Conflicts", &over.conflicts.join(", "));
    field("Homepage", &info.homepage);
    field("Description", &description(&info.description));
    out
}

/// Fold a multi-line description into control-file continuation lines.
fn description(text: &str) -> String {
    let mut lines = text.trim_end().lines();
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push_str("\n ");
        out.push_str(if line.trim().is_empty() { "." } else { line });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> Info {
        let mut info = Info {
            name: "foo".into(),
            arch: "386".into(),
            version: "1.2.3".into(),
            epoch: "1".into(),
            release: "2".into(),
            section: "default".into(),
            priority: "extra".into(),
            maintainer: "Carlos <carlos@example.com>".into(),
            homepage: "http://example.com".into(),
            description: "Foo does things\n\nAnd more".into(),
            ..Info::default()
        };
        info.overridables.depends = vec!["bash".into(), "zsh (>= 5)".into()];
        info.with_defaults()
    }

    #[test]
    fn control_fields() {
        let info = prepare(&example(), Format::Deb, FORMAT, "").unwrap();
        let control = render_control(&info, 2049);
        assert_eq!(
            control,
            "Package: foo
Version: 1:1.2.3-2
Section: default
Priority: extra
Architecture: i386
Maintainer: Carlos <carlos@example.com>
Installed-Size: 3
Depends: bash, zsh (>= 5)
Homepage: http://example.com
Description: Foo does things
 .
 And more
"
        );
    }

    #[test]
    fn parent_dirs_are_added_once() {
        let contents = vec![
            Content::new("a", "/usr/bin/a", ContentType::File),
            Content::new("b", "/usr/bin/b", ContentType::File),
            Content::new("", "/usr", ContentType::Dir),
        ];
        let paths: Vec<String> = with_parent_dirs(contents, 0)
            .iter()
            .map(|c| c.relative_path().to_string())
            .collect();
        assert_eq!(paths, vec!["usr", "usr/bin", "usr/bin/a", "usr/bin/b"]);
    }

    #[test]
    fn conventional_file_name_drops_epoch() {
        assert_eq!(Deb.conventional_file_name(&example()), "foo_1.2.3-2_i386.deb");
    }

    #[test]
    fn rejects_uppercase_names() {
        let mut info = example();
        info.name = "Foo".into();
        let err = Deb.package(&info, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, PackageError::InvalidName { format: "deb", .. }));
    }
}
