//! Field-by-field override merging.
//!
//! Per-format override blocks are merged onto the base descriptor with
//! override-wins semantics:
//!
//! - strings and lists are replaced when the override is non-empty,
//! - maps are merged key by key, the override winning on collisions,
//! - optional script paths are replaced when the override sets them,
//! - nested per-format blocks merge recursively.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::info::{
    Apk, ArchLinux, Deb, DebScripts, DebTriggers, Overridables, Rpm, Scripts, UpgradeScripts,
};

/// Combine a base value with an override, producing the resolved value.
pub trait Merge {
    /// Merge `over` onto `self`; values set in `over` win.
    fn merge(self, over: Self) -> Self;
}

impl Merge for String {
    fn merge(self, over: Self) -> Self {
        if over.is_empty() { self } else { over }
    }
}

impl<T> Merge for Vec<T> {
    fn merge(self, over: Self) -> Self {
        if over.is_empty() { self } else { over }
    }
}

impl<V> Merge for BTreeMap<String, V> {
    fn merge(mut self, over: Self) -> Self {
        self.extend(over);
        self
    }
}

impl Merge for Option<PathBuf> {
    fn merge(self, over: Self) -> Self {
        over.or(self)
    }
}

impl Merge for Scripts {
    fn merge(self, over: Self) -> Self {
        Self {
            preinstall: self.preinstall.merge(over.preinstall),
            postinstall: self.postinstall.merge(over.postinstall),
            preremove: self.preremove.merge(over.preremove),
            postremove: self.postremove.merge(over.postremove),
        }
    }
}

impl Merge for UpgradeScripts {
    fn merge(self, over: Self) -> Self {
        Self {
            preupgrade: self.preupgrade.merge(over.preupgrade),
            postupgrade: self.postupgrade.merge(over.postupgrade),
        }
    }
}

impl Merge for Rpm {
    fn merge(self, over: Self) -> Self {
        Self {
            group: self.group.merge(over.group),
            summary: self.summary.merge(over.summary),
            compression: self.compression.merge(over.compression),
            config_noreplace_files: self
                .config_noreplace_files
                .merge(over.config_noreplace_files),
        }
    }
}

impl Merge for DebScripts {
    fn merge(self, over: Self) -> Self {
        Self {
            rules: self.rules.merge(over.rules),
            templates: self.templates.merge(over.templates),
            config: self.config.merge(over.config),
        }
    }
}

impl Merge for DebTriggers {
    fn merge(self, over: Self) -> Self {
        Self {
            interest: self.interest.merge(over.interest),
            interest_await: self.interest_await.merge(over.interest_await),
            interest_noawait: self.interest_noawait.merge(over.interest_noawait),
            activate: self.activate.merge(over.activate),
            activate_await: self.activate_await.merge(over.activate_await),
            activate_noawait: self.activate_noawait.merge(over.activate_noawait),
        }
    }
}

impl Merge for Deb {
    fn merge(self, over: Self) -> Self {
        Self {
            scripts: self.scripts.merge(over.scripts),
            triggers: self.triggers.merge(over.triggers),
            metadata: self.metadata.merge(over.metadata),
            compression: self.compression.merge(over.compression),
            arch: self.arch.merge(over.arch),
        }
    }
}

impl Merge for ArchLinux {
    fn merge(self, over: Self) -> Self {
        Self {
            pkgbase: self.pkgbase.merge(over.pkgbase),
            arch: self.arch.merge(over.arch),
            packager: self.packager.merge(over.packager),
            scripts: self.scripts.merge(over.scripts),
        }
    }
}

impl Merge for Apk {
    fn merge(self, over: Self) -> Self {
        Self {
            arch: self.arch.merge(over.arch),
            scripts: self.scripts.merge(over.scripts),
        }
    }
}

impl Merge for Overridables {
    fn merge(self, over: Self) -> Self {
        Self {
            replaces: self.replaces.merge(over.replaces),
            provides: self.provides.merge(over.provides),
            depends: self.depends.merge(over.depends),
            recommends: self.recommends.merge(over.recommends),
            suggests: self.suggests.merge(over.suggests),
            conflicts: self.conflicts.merge(over.conflicts),
            contents: self.contents.merge(over.contents),
            files: self.files.merge(over.files),
            config_files: self.config_files.merge(over.config_files),
            symlinks: self.symlinks.merge(over.symlinks),
            empty_folders: self.empty_folders.merge(over.empty_folders),
            scripts: self.scripts.merge(over.scripts),
            rpm: self.rpm.merge(over.rpm),
            deb: self.deb.merge(over.deb),
            archlinux: self.archlinux.merge(over.archlinux),
            apk: self.apk.merge(over.apk),
        }
    }
}
