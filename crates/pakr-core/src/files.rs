//! Content resolution: descriptor maps and entries to concrete, sorted paths.
//!
//! Sources may be literal files, directories (walked recursively) or glob
//! patterns. Expansion keeps the subtree below the pattern's literal prefix,
//! so `build/*/tool` mapped to `/opt` yields `/opt/<dir>/tool`. The result is
//! sorted by destination, making archive order independent of filesystem
//! enumeration order.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use pakr_schema::{Content, ContentType, Format, Info, normalize_destination};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::PackageError;

const GLOB_META: &[char] = &['*', '?', '['];

/// Resolve every content source of `info` for a build of `format`.
///
/// `rpm.config_noreplace_files` only applies to RPM builds.
///
/// # Errors
///
/// Returns `PackageError::Glob` for malformed patterns or patterns matching
/// nothing, `PackageError::Source` for unreadable sources, and
/// `PackageError::Glob` when two different entries claim one destination.
pub fn resolve(info: &Info, format: Format) -> Result<Vec<Content>, PackageError> {
    let over = &info.overridables;
    let mut out = Vec::new();

    for content in &over.contents {
        match content.kind {
            ContentType::Dir => out.push(directory(&content.destination, content)),
            ContentType::Symlink => out.push(symlink(&content.destination, &content.source, content)),
            kind => {
                for (src, dst) in expand(&content.source, &content.destination)? {
                    out.push(file(src, &dst, kind, Some(content))?);
                }
            }
        }
    }

    let mut maps: Vec<(&BTreeMap<String, String>, ContentType)> = vec![
        (&over.files, ContentType::File),
        (&over.config_files, ContentType::Config),
    ];
    if format == Format::Rpm {
        maps.push((&over.rpm.config_noreplace_files, ContentType::ConfigNoReplace));
    }
    for (map, kind) in maps {
        for (pattern, dst) in map {
            for (src, dst) in expand(pattern, dst)? {
                out.push(file(src, &dst, kind, None)?);
            }
        }
    }

    for (link, target) in &over.symlinks {
        out.push(Content::new(target.clone(), link, ContentType::Symlink));
    }

    let defaults = Content::default();
    for dir in &over.empty_folders {
        out.push(directory(dir, &defaults));
    }

    out.sort_by(|a, b| a.destination.cmp(&b.destination));
    dedup(out)
}

/// Expand one source pattern into `(source file, destination)` pairs.
///
/// A literal file maps to `dst` (or `dst/<basename>` when `dst` ends with
/// `/`). A directory or glob match maps each file below it to `dst` plus
/// its path relative to the pattern's literal prefix.
///
/// # Errors
///
/// Returns `PackageError::Glob` if the pattern is invalid or matches nothing.
pub fn expand(pattern: &str, dst: &str) -> Result<Vec<(PathBuf, String)>, PackageError> {
    let glob_error = |reason: String| PackageError::Glob {
        pattern: pattern.to_string(),
        reason,
    };

    if !pattern.contains(GLOB_META) {
        let path = Path::new(pattern);
        let meta = fs::metadata(path).map_err(|e| PackageError::unreadable(path, e))?;
        if meta.is_dir() {
            return walk(path, path, dst);
        }
        let dst = if dst.ends_with('/') {
            let base = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            format!("{dst}{base}")
        } else {
            dst.to_string()
        };
        return Ok(vec![(path.to_path_buf(), normalize_destination(&dst))]);
    }

    // A directory match is walked, and `**` may match its files again.
    let prefix = literal_prefix(pattern);
    let matches = glob::glob(pattern).map_err(|e| glob_error(e.to_string()))?;
    let mut out = BTreeMap::new();
    for entry in matches {
        let path = entry.map_err(|e| glob_error(e.to_string()))?;
        out.extend(walk(&prefix, &path, dst)?);
    }
    if out.is_empty() {
        return Err(glob_error("matched no files".to_string()));
    }
    Ok(out.into_iter().collect())
}

fn walk(prefix: &Path, start: &Path, dst: &str) -> Result<Vec<(PathBuf, String)>, PackageError> {
    let mut out = Vec::new();
    for entry in WalkDir::new(start).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(start).to_path_buf();
            PackageError::unreadable(path, e.into())
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        let rel = entry.path().strip_prefix(prefix).unwrap_or(entry.path());
        let dst = normalize_destination(&format!("{dst}/{}", rel.to_string_lossy()));
        debug!("matched {} -> {dst}", entry.path().display());
        out.push((entry.path().to_path_buf(), dst));
    }
    Ok(out)
}

fn literal_prefix(pattern: &str) -> PathBuf {
    let cut = pattern.find(GLOB_META).unwrap_or(pattern.len());
    match pattern[..cut].rfind('/') {
        Some(0) => PathBuf::from("/"),
        Some(i) => PathBuf::from(&pattern[..i]),
        None => PathBuf::from("."),
    }
}

fn file(
    src: PathBuf,
    dst: &str,
    kind: ContentType,
    template: Option<&Content>,
) -> Result<Content, PackageError> {
    let meta = fs::symlink_metadata(&src).map_err(|e| PackageError::unreadable(&src, e))?;
    if meta.file_type().is_symlink() {
        let target = fs::read_link(&src).map_err(|e| PackageError::unreadable(&src, e))?;
        let defaults = Content::default();
        return Ok(symlink(
            dst,
            &target.to_string_lossy(),
            template.unwrap_or(&defaults),
        ));
    }

    let mut content = Content::new(src.to_string_lossy(), dst, kind);
    if let Some(template) = template {
        content.file_info = template.file_info.clone();
    }
    let info = &mut content.file_info;
    info.size = meta.len();
    if info.mode.is_none() {
        info.mode = Some(source_mode(&meta));
    }
    if info.mtime.is_none() {
        info.mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64);
    }
    Ok(content)
}

fn directory(dst: &str, template: &Content) -> Content {
    let mut content = Content::new("", dst, ContentType::Dir);
    content.file_info = template.file_info.clone();
    content.file_info.size = 0;
    content
}

fn symlink(dst: &str, target: &str, template: &Content) -> Content {
    let mut content = Content::new(target, dst, ContentType::Symlink);
    content.file_info = template.file_info.clone();
    content.file_info.size = 0;
    content
}

#[cfg(unix)]
fn source_mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn source_mode(meta: &fs::Metadata) -> u32 {
    if meta.permissions().readonly() { 0o444 } else { 0o644 }
}

/// Collapse repeated declarations of one directory, keeping the first, and
/// reject any other destination claimed twice.
fn dedup(sorted: Vec<Content>) -> Result<Vec<Content>, PackageError> {
    let mut out: Vec<Content> = Vec::with_capacity(sorted.len());
    for content in sorted {
        match out.last() {
            Some(last) if last.destination == content.destination => {
                if last.kind == ContentType::Dir && content.kind == ContentType::Dir {
                    continue;
                }
                return Err(PackageError::Glob {
                    pattern: content.source,
                    reason: format!("{} is already claimed", content.destination),
                });
            }
            _ => out.push(content),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::create_dir_all(root.join("share/doc")).unwrap();
        fs::write(root.join("bin/b"), "b").unwrap();
        fs::write(root.join("bin/a"), "aa").unwrap();
        fs::write(root.join("share/doc/README"), "readme").unwrap();
        fs::write(root.join("tool.conf"), "k=v").unwrap();
        dir
    }

    fn pattern(dir: &TempDir, rel: &str) -> String {
        format!("{}/{rel}", dir.path().display())
    }

    #[test]
    fn literal_file_maps_to_destination() {
        let dir = tree();
        let out = expand(&pattern(&dir, "tool.conf"), "/etc/tool/tool.conf").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1, "./etc/tool/tool.conf");

        let out = expand(&pattern(&dir, "tool.conf"), "/etc/tool/").unwrap();
        assert_eq!(out[0].1, "./etc/tool/tool.conf");
    }

    #[test]
    fn directory_keeps_subtree() {
        let dir = tree();
        let out = expand(&pattern(&dir, "share"), "/usr/share").unwrap();
        assert_eq!(out[0].1, "./usr/share/doc/README");
    }

    #[test]
    fn glob_is_relative_to_literal_prefix() {
        let dir = tree();
        let out = expand(&pattern(&dir, "bin/*"), "/usr/bin").unwrap();
        let dsts: Vec<&str> = out.iter().map(|(_, d)| d.as_str()).collect();
        assert_eq!(dsts, vec!["./usr/bin/a", "./usr/bin/b"]);
    }

    #[test]
    fn recursive_glob_lists_each_file_once() {
        let dir = tree();
        let out = expand(&pattern(&dir, "**/*"), "/opt/foo").unwrap();
        let dsts: Vec<&str> = out.iter().map(|(_, d)| d.as_str()).collect();
        assert_eq!(
            dsts,
            vec![
                "./opt/foo/bin/a",
                "./opt/foo/bin/b",
                "./opt/foo/share/doc/README",
                "./opt/foo/tool.conf",
            ]
        );

        let mut info = Info::default();
        info.overridables
            .contents
            .push(Content::new(pattern(&dir, "**/*"), "/opt/foo", ContentType::File));
        assert_eq!(resolve(&info, Format::Deb).unwrap().len(), 4);
    }

    #[test]
    fn glob_without_match_fails() {
        let dir = tree();
        let err = expand(&pattern(&dir, "nothing/*.go"), "/x").unwrap_err();
        assert!(matches!(err, PackageError::Glob { .. }));
    }

    #[test]
    fn missing_literal_is_a_source_error() {
        let err = expand("/nonexistent/pakr/file", "/x").unwrap_err();
        assert!(matches!(err, PackageError::Source { .. }));
    }

    #[test]
    fn resolve_is_sorted_and_typed() {
        let dir = tree();
        let mut info = Info::default();
        let over = &mut info.overridables;
        over.files.insert(pattern(&dir, "bin/*"), "/usr/lib/tool".into());
        over.config_files.insert(pattern(&dir, "tool.conf"), "/etc/tool.conf".into());
        over.symlinks.insert("/usr/bin/tool".into(), "/usr/lib/tool/a".into());
        over.empty_folders.push("/var/log/tool".into());
        over.contents.push(Content::new("", "/var/log/tool", ContentType::Dir));

        let out = resolve(&info, Format::Deb).unwrap();
        let dsts: Vec<(&str, ContentType)> = out
            .iter()
            .map(|c| (c.destination.as_str(), c.kind))
            .collect();
        assert_eq!(
            dsts,
            vec![
                ("./etc/tool.conf", ContentType::Config),
                ("./usr/bin/tool", ContentType::Symlink),
                ("./usr/lib/tool/a", ContentType::File),
                ("./usr/lib/tool/b", ContentType::File),
                ("./var/log/tool", ContentType::Dir),
            ]
        );
        assert_eq!(out[2].size(), 2);
        assert_eq!(out[1].source, "/usr/lib/tool/a");
    }

    #[test]
    fn explicit_file_info_wins_over_filesystem() {
        let dir = tree();
        let mut content = Content::new(pattern(&dir, "tool.conf"), "/etc/tool.conf", ContentType::File);
        content.file_info.mode = Some(0o600);
        content.file_info.mtime = Some(42);
        let mut info = Info::default();
        info.overridables.contents.push(content);

        let out = resolve(&info, Format::ArchLinux).unwrap();
        assert_eq!(out[0].mode(), 0o600);
        assert_eq!(out[0].mtime(), 42);
        assert_eq!(out[0].size(), 3);
    }

    #[test]
    fn noreplace_map_only_applies_to_rpm() {
        let dir = tree();
        let mut info = Info::default();
        info.overridables
            .rpm
            .config_noreplace_files
            .insert(pattern(&dir, "tool.conf"), "/etc/tool.conf".into());

        assert!(resolve(&info, Format::Deb).unwrap().is_empty());
        let rpm = resolve(&info, Format::Rpm).unwrap();
        assert_eq!(rpm[0].kind, ContentType::ConfigNoReplace);
    }

    #[test]
    fn repeated_directory_keeps_first_declaration() {
        let mut dir = Content::new("", "/var/log/tool", ContentType::Dir);
        dir.file_info.mode = Some(0o700);
        let mut info = Info::default();
        info.overridables.contents.push(dir);
        info.overridables.empty_folders.push("/var/log/tool".into());
        info.overridables.empty_folders.push("/var/log/tool/".into());

        let out = resolve(&info, Format::Rpm).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].mode(), 0o700);
    }

    #[test]
    fn conflicting_destinations_are_rejected() {
        let dir = tree();
        let mut info = Info::default();
        info.overridables
            .files
            .insert(pattern(&dir, "tool.conf"), "/etc/x".into());
        info.overridables
            .symlinks
            .insert("/etc/x".into(), "/etc/y".into());
        assert!(resolve(&info, Format::Deb).is_err());
    }

    #[test]
    fn order_is_stable_across_runs() {
        let dir = tree();
        let mut info = Info::default();
        info.overridables.files.insert(pattern(&dir, "*"), "/opt".into());
        let first = resolve(&info, Format::ArchLinux).unwrap();
        let second = resolve(&info, Format::ArchLinux).unwrap();
        assert_eq!(first, second);
    }
}
