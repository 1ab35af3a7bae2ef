//! BSD mtree manifests, as pacman reads them from `.MTREE`.

use std::fmt::Write as _;

use pakr_schema::{Content, ContentType, FileDigests, HexDigest};

/// What an mtree line describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestKind {
    /// A directory.
    Dir,
    /// A regular file with its size and digests.
    File {
        /// Size in bytes.
        size: u64,
        /// MD5 of the content.
        md5: HexDigest,
        /// SHA-256 of the content.
        sha256: HexDigest,
    },
    /// A symbolic link.
    Link {
        /// Link target.
        target: String,
    },
}

/// One mtree line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Package-relative path, without a leading `./`.
    pub path: String,
    /// Modification time, Unix seconds.
    pub mtime: u64,
    /// Permission bits.
    pub mode: u32,
    /// Entry type and type-specific fields.
    pub kind: ManifestKind,
}

impl ManifestEntry {
    /// Describe a generated or content file from its streamed digests.
    pub fn file(path: &str, mtime: u64, mode: u32, digests: &FileDigests) -> Self {
        Self {
            path: path.to_string(),
            mtime,
            mode,
            kind: ManifestKind::File {
                size: digests.size,
                md5: digests.md5.clone(),
                sha256: digests.sha256.clone(),
            },
        }
    }

    /// Describe a content entry; `digests` is required for file types.
    pub fn for_content(content: &Content, digests: Option<&FileDigests>) -> Self {
        let path = content.relative_path();
        let (mtime, mode) = (content.mtime(), content.mode());
        match (content.kind, digests) {
            (ContentType::Dir, _) => Self {
                path: path.to_string(),
                mtime,
                mode,
                kind: ManifestKind::Dir,
            },
            (ContentType::Symlink, _) => Self {
                path: path.to_string(),
                mtime,
                mode,
                kind: ManifestKind::Link {
                    target: content.source.clone(),
                },
            },
            (_, digests) => Self::file(path, mtime, mode, digests.unwrap_or(&FileDigests::default())),
        }
    }
}

/// Render entries as mtree text, one line each after the `#mtree` header.
pub fn render(entries: &[ManifestEntry]) -> String {
    let mut out = String::from("#mtree\n");
    for entry in entries {
        let _ = write!(
            out,
            "./{} time={}.0 mode={:o}",
            entry.path, entry.mtime, entry.mode
        );
        let _ = match &entry.kind {
            ManifestKind::Dir => writeln!(out, " type=dir"),
            ManifestKind::File { size, md5, sha256 } => writeln!(
                out,
                " size={size} type=file md5digest={md5} sha256digest={sha256}"
            ),
            ManifestKind::Link { target } => writeln!(out, " type=link link={target}"),
        };
    }
    out
}
