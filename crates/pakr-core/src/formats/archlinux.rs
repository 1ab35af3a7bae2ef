//! Arch Linux `.pkg.tar.zst` packages.
//!
//! The container is a zstd-compressed tar holding, in order, `.PKGINFO`,
//! `.MTREE` (gzip-compressed mtree text), `.INSTALL` when any hook is
//! declared, then the content entries. `.PKGINFO` and `.MTREE` describe the
//! content, so the content is first streamed into a [`Spool`] while it is
//! hashed, and spliced in after the metadata.

use std::fs::File;
use std::io::Write;
use std::sync::OnceLock;

use pakr_schema::{Content, ContentType, Format, Info, version};
use regex::Regex;
use tracing::{debug, info};

use crate::archive::{EntryMeta, Spool, TarWriter};
use crate::compress::{ZSTD_LEVEL, gzip};
use crate::digest::Digester;
use crate::error::PackageError;
use crate::files;
use crate::formats::{Packager, build_time, check_name, file_name_arch, prepare};
use crate::mtree::{self, ManifestEntry};
use crate::pkginfo::KeyValueWriter;
use crate::scripts;

const FORMAT: &str = "archlinux";

/// Packager shown when neither `archlinux.packager` nor a maintainer is set.
pub const UNKNOWN_PACKAGER: &str = "Unknown Packager";

/// The Arch Linux packager.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchLinux;

fn name_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"^[a-z0-9@._+][a-z0-9@._+-]*$")
            .unwrap_or_else(|_| unreachable!("static pattern"))
    })
}

impl Packager for ArchLinux {
    fn package(&self, info: &Info, w: &mut dyn Write) -> Result<(), PackageError> {
        let info = prepare(info, Format::ArchLinux, FORMAT, &info.overridables.archlinux.arch)?;
        check_name(name_grammar(), &info.name, FORMAT)?;
        check_name(name_grammar(), pkgbase(&info), FORMAT)?;
        let pkgver = version::archlinux_version(&info)?;

        let contents = files::resolve(&info, Format::ArchLinux)?;
        let hooks = install_hooks(&info)?;

        let mut spool = Spool::new()?;
        let (mut manifest, installed_size) = spool_contents(&mut spool, &contents)?;

        let mtime = build_time(&info);
        let pkginfo = render_pkginfo(&info, &pkgver, installed_size, mtime, &contents);
        let install = (!hooks.is_empty()).then(|| scripts::install_functions(&hooks));
        let mut metadata = vec![ManifestEntry::file(
            ".PKGINFO",
            mtime,
            0o644,
            &Digester::digest(&pkginfo),
        )];
        if let Some(install) = &install {
            metadata.push(ManifestEntry::file(".INSTALL", mtime, 0o644, &Digester::digest(install)));
        }
        manifest.splice(0..0, metadata);
        let mtree = gzip(mtree::render(&manifest).as_bytes())?;

        let encoder = zstd::stream::Encoder::new(w, ZSTD_LEVEL)?;
        let mut tar = TarWriter::new(encoder);
        tar.bytes(".PKGINFO", &pkginfo, EntryMeta::root(0o644, mtime))?;
        tar.bytes(".MTREE", &mtree, EntryMeta::root(0o644, mtime))?;
        if let Some(install) = &install {
            tar.bytes(".INSTALL", install, EntryMeta::root(0o644, mtime))?;
        }
        spool.drain_into(&mut tar)?;
        tar.finish()?.finish()?;

        info!("packaged {} {pkgver} for {}", info.name, info.arch);
        Ok(())
    }

    fn conventional_file_name(&self, info: &Info) -> String {
        let arch = file_name_arch(info, Format::ArchLinux, &info.overridables.archlinux.arch);
        format!(
            "{}-{}-{}-{arch}{}",
            info.name,
            version::archlinux_pkgver(info),
            version::archlinux_pkgrel(info),
            self.conventional_extension()
        )
    }

    fn conventional_extension(&self) -> &'static str {
        ".pkg.tar.zst"
    }
}

fn pkgbase(info: &Info) -> &str {
    let base = &info.overridables.archlinux.pkgbase;
    if base.is_empty() { &info.name } else { base }
}

fn install_hooks(info: &Info) -> Result<Vec<scripts::Hook>, PackageError> {
    let common = &info.overridables.scripts;
    let upgrade = &info.overridables.archlinux.scripts;
    scripts::collect(&[
        ("pre_install", &common.preinstall),
        ("post_install", &common.postinstall),
        ("pre_remove", &common.preremove),
        ("post_remove", &common.postremove),
        ("pre_upgrade", &upgrade.preupgrade),
        ("post_upgrade", &upgrade.postupgrade),
    ])
}

/// Write every content entry into the spool, returning the manifest lines
/// and the installed size in bytes.
fn spool_contents(
    spool: &mut Spool,
    contents: &[Content],
) -> Result<(Vec<ManifestEntry>, u64), PackageError> {
    let mut manifest = Vec::with_capacity(contents.len() + 1);
    let mut installed_size = 0;
    for content in contents {
        let path = content.relative_path();
        let meta = EntryMeta::of(content);
        let digests = match content.kind {
            ContentType::Dir => {
                spool.tar().dir(path, meta)?;
                None
            }
            ContentType::Symlink => {
                spool.tar().symlink(path, &content.source, meta)?;
                None
            }
            ContentType::File | ContentType::Config | ContentType::ConfigNoReplace => {
                let file = File::open(&content.source)
                    .map_err(|e| PackageError::unreadable(&content.source, e))?;
                let digests = spool
                    .tar()
                    .stream(path, file, content.size(), meta)
                    .map_err(|e| PackageError::unreadable(&content.source, e))?;
                installed_size += digests.size;
                Some(digests)
            }
        };
        debug!("archived {path} ({})", content.kind);
        manifest.push(ManifestEntry::for_content(content, digests.as_ref()));
    }
    Ok((manifest, installed_size))
}

/// Render `.PKGINFO`.
pub fn render_pkginfo(
    info: &Info,
    pkgver: &str,
    installed_size: u64,
    builddate: u64,
    contents: &[Content],
) -> Vec<u8> {
    let over = &info.overridables;
    let packager = [over.archlinux.packager.as_str(), info.maintainer.as_str()]
        .into_iter()
        .find(|p| !p.is_empty())
        .unwrap_or(UNKNOWN_PACKAGER);
    let backup = contents
        .iter()
        .filter(|c| c.kind.is_config())
        .map(Content::relative_path);

    let mut w = KeyValueWriter::new();
    w.field("pkgname", &info.name)
        .field("pkgbase", pkgbase(info))
        .field("pkgver", pkgver)
        .field("pkgdesc", &info.description)
        .field("url", &info.homepage)
        .field("builddate", builddate)
        .field("packager", packager)
        .field("size", installed_size)
        .field("arch", &info.arch)
        .field("license", &info.license)
        .list("replaces", &over.replaces)
        .list("conflict", &over.conflicts)
        .list("provides", &over.provides)
        .list("depend", &over.depends)
        .list("optdepend", over.recommends.iter().chain(&over.suggests))
        .list("backup", backup);
    w.into_bytes()
}
