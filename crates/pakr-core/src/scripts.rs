//! Maintainer scripts and Deb trigger declarations.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use pakr_schema::DebTriggers;

use crate::error::PackageError;

/// A lifecycle hook whose script has been read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    /// Hook name in the target format's vocabulary.
    pub name: &'static str,
    /// Full script text.
    pub body: Vec<u8>,
}

/// Read a script if a path is configured.
///
/// An unset or empty path means the hook is absent and yields `Ok(None)`.
///
/// # Errors
///
/// Returns `PackageError::Source` if the configured file cannot be read.
pub fn read(path: Option<&Path>) -> Result<Option<Vec<u8>>, PackageError> {
    match path.filter(|p| !p.as_os_str().is_empty()) {
        None => Ok(None),
        Some(path) => fs::read(path)
            .map(Some)
            .map_err(|e| PackageError::unreadable(path, e)),
    }
}

/// Read every configured script, keeping declaration order.
///
/// # Errors
///
/// Returns `PackageError::Source` for the first unreadable script.
pub fn collect(hooks: &[(&'static str, &Option<PathBuf>)]) -> Result<Vec<Hook>, PackageError> {
    let mut out = Vec::new();
    for &(name, path) in hooks {
        if let Some(body) = read(path.as_deref())? {
            out.push(Hook { name, body });
        }
    }
    Ok(out)
}

/// Render pacman's `.INSTALL`: one shell function per hook.
pub fn install_functions(hooks: &[Hook]) -> Vec<u8> {
    let mut out = Vec::new();
    for hook in hooks {
        out.extend_from_slice(format!("function {}() {{\n", hook.name).as_bytes());
        out.extend_from_slice(&hook.body);
        if !hook.body.ends_with(b"\n") {
            out.push(b'\n');
        }
        out.extend_from_slice(b"}\n\n");
    }
    out
}

/// Render a dpkg `triggers` file, or `None` when no trigger is declared.
pub fn deb_triggers(triggers: &DebTriggers) -> Option<String> {
    let directives: [(&str, &Vec<String>); 6] = [
        ("interest", &triggers.interest),
        ("interest-await", &triggers.interest_await),
        ("interest-noawait", &triggers.interest_noawait),
        ("activate", &triggers.activate),
        ("activate-await", &triggers.activate_await),
        ("activate-noawait", &triggers.activate_noawait),
    ];
    let mut out = String::new();
    for (directive, names) in directives {
        for name in names {
            let _ = writeln!(out, "{directive} {name}");
        }
    }
    if out.is_empty() { None } else { Some(out) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unset_path_is_absent() {
        assert_eq!(read(None).unwrap(), None);
    }

    #[test]
    fn empty_path_is_absent() {
        assert_eq!(read(Some(Path::new(""))).unwrap(), None);
        let hooks = collect(&[("pre_install", &Some(PathBuf::new()))]).unwrap();
        assert!(hooks.is_empty());
    }

    #[test]
    fn unreadable_path_is_a_source_error() {
        let err = read(Some(Path::new("/nonexistent/pakr/preinstall.sh"))).unwrap_err();
        assert!(matches!(err, PackageError::Source { .. }));
    }

    #[test]
    fn collects_in_declaration_order() {
        let dir = TempDir::new().unwrap();
        let pre = dir.path().join("pre.sh");
        let post = dir.path().join("post.sh");
        fs::write(&pre, "echo pre").unwrap();
        fs::write(&post, "echo post\n").unwrap();

        let hooks = collect(&[
            ("pre_install", &Some(pre)),
            ("pre_remove", &None),
            ("post_install", &Some(post)),
        ])
        .unwrap();
        let names: Vec<&str> = hooks.iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["pre_install", "post_install"]);

        let text = String::from_utf8(install_functions(&hooks)).unwrap();
        assert_eq!(
            text,
            "function pre_install() {\necho pre\n}\n\nfunction post_install() {\necho post\n}\n\n"
        );
    }

    #[test]
    fn renders_trigger_directives() {
        let triggers = DebTriggers {
            interest: vec!["foo".into()],
            activate_noawait: vec!["bar".into(), "baz".into()],
            ..DebTriggers::default()
        };
        assert_eq!(
            deb_triggers(&triggers).unwrap(),
            "interest foo\nactivate-noawait bar\nactivate-noawait baz\n"
        );
        assert_eq!(deb_triggers(&DebTriggers::default()), None);
    }
}
