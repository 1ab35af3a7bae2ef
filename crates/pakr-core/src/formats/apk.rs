//! Alpine `.apk` packages.
//!
//! Two gzip members back to back: a control tar (`.PKGINFO` and install
//! scripts) without end-of-archive blocks, then the data tar. `.PKGINFO`
//! pins the SHA-256 of the compressed data member, so the data member is
//! built first.

use std::fs;
use std::io::Write;
use std::sync::OnceLock;

use flate2::Compression;
use flate2::write::GzEncoder;
use pakr_schema::{Content, ContentType, Format, HexDigest, Info, version};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::archive::{EntryMeta, TarWriter, finish_cut};
use crate::compress::gzip;
use crate::digest::{Digester, HashingWriter};
use crate::error::PackageError;
use crate::files;
use crate::formats::{Packager, build_time, check_name, file_name_arch, prepare};
use crate::pkginfo::KeyValueWriter;
use crate::scripts::{self, Hook};

const FORMAT: &str = "apk";

/// PAX record apk-tools reads to verify each data entry.
pub const CHECKSUM_RECORD: &str = "APK-TOOLS.checksum.SHA1";

/// The Alpine packager.
#[derive(Debug, Clone, Copy, Default)]
pub struct Apk;

fn name_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._+-]*$")
            .unwrap_or_else(|_| unreachable!("static pattern"))
    })
}

/// The gzipped data member with the figures `.PKGINFO` records about it.
#[derive(Debug)]
struct DataMember {
    bytes: Vec<u8>,
    installed_size: u64,
    datahash: HexDigest,
}

impl Packager for Apk {
    fn package(&self, info: &Info, w: &mut dyn Write) -> Result<(), PackageError> {
        let info = prepare(info, Format::Apk, FORMAT, &info.overridables.apk.arch)?;
        check_name(name_grammar(), &info.name, FORMAT)?;
        if !info.epoch.is_empty() {
            warn!("apk has no epoch; ignoring epoch {}", info.epoch);
        }

        let contents = files::resolve(&info, Format::Apk)?;
        let hooks = install_scripts(&info)?;
        let mtime = build_time(&info);

        let data = data_member(&contents)?;
        let pkginfo = render_pkginfo(&info, &data, mtime);

        let mut control = TarWriter::new(Vec::new());
        control.bytes(".PKGINFO", &pkginfo, EntryMeta::root(0o644, mtime))?;
        for hook in &hooks {
            control.bytes(hook.name, &hook.body, EntryMeta::root(0o755, mtime))?;
        }
        let control = gzip(&finish_cut(control)?)?;

        w.write_all(&control)?;
        w.write_all(&data.bytes)?;
        w.flush()?;

        info!(
            "packaged {} {} for {}",
            info.name,
            version::apk_version(&info),
            info.arch
        );
        Ok(())
    }

    fn conventional_file_name(&self, info: &Info) -> String {
        let arch = file_name_arch(info, Format::Apk, &info.overridables.apk.arch);
        format!(
            "{}_{}_{arch}{}",
            info.name,
            version::apk_version(info),
            self.conventional_extension()
        )
    }

    fn conventional_extension(&self) -> &'static str {
        ".apk"
    }
}

fn install_scripts(info: &Info) -> Result<Vec<Hook>, PackageError> {
    let common = &info.overridables.scripts;
    let upgrade = &info.overridables.apk.scripts;
    scripts::collect(&[
        (".pre-install", &common.preinstall),
        (".post-install", &common.postinstall),
        (".pre-deinstall", &common.preremove),
        (".post-deinstall", &common.postremove),
        (".pre-upgrade", &upgrade.preupgrade),
        (".post-upgrade", &upgrade.postupgrade),
    ])
}

fn data_member(contents: &[Content]) -> Result<DataMember, PackageError> {
    let encoder = GzEncoder::new(HashingWriter::new(Vec::new()), Compression::default());
    let mut tar = TarWriter::new(encoder);
    let mut installed_size = 0;

    for content in contents {
        let path = content.relative_path();
        let meta = EntryMeta::of(content);
        match content.kind {
            ContentType::Dir => tar.dir(path, meta)?,
            ContentType::Symlink => {
                let sum = Digester::digest(content.source.as_bytes()).sha1.to_hex();
                tar.pax(path, &[(CHECKSUM_RECORD, sum.as_bytes())])?;
                tar.symlink(path, &content.source, meta)?;
            }
            ContentType::File | ContentType::Config | ContentType::ConfigNoReplace => {
                let bytes = fs::read(&content.source)
                    .map_err(|e| PackageError::unreadable(&content.source, e))?;
                let sum = Digester::digest(&bytes).sha1.to_hex();
                tar.pax(path, &[(CHECKSUM_RECORD, sum.as_bytes())])?;
                tar.bytes(path, &bytes, meta)?;
                installed_size += bytes.len() as u64;
            }
        }
        debug!("archived {path} ({})", content.kind);
    }

    let (bytes, digests) = tar.finish()?.finish()?.finish();
    Ok(DataMember {
        bytes,
        installed_size,
        datahash: digests.sha256,
    })
}

fn render_pkginfo(info: &Info, data: &DataMember, builddate: u64) -> Vec<u8> {
    let over = &info.overridables;
    let description = info.description.lines().collect::<Vec<_>>().join(" ");
    let conflicts = over.conflicts.iter().map(|c| format!("!{c}"));

    let mut w = KeyValueWriter::new();
    w.field("pkgname", &info.name)
        .field("pkgver", version::apk_version(info))
        .field("pkgdesc", description)
        .field("url", &info.homepage)
        .field("builddate", builddate)
        .field("packager", &info.maintainer)
        .field("size", data.installed_size)
        .field("arch", &info.arch)
        .field("origin", &info.name)
        .field("maintainer", &info.maintainer)
        .field("license", &info.license)
        .list("depend", &over.depends)
        .list("provides", &over.provides)
        .list("replaces", &over.replaces)
        .list("depend", conflicts)
        .field("datahash", &data.datahash);
    w.into_bytes()
}
