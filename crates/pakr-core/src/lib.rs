//! Package assembly for pakr: content resolution, archive writing, integrity
//! manifests and the per-format packagers behind a [`Registry`].

pub mod archive;
pub mod compress;
pub mod digest;
pub mod error;
pub mod files;
pub mod formats;
pub mod mtree;
pub mod pkginfo;
pub mod registry;
pub mod scripts;

pub use error::PackageError;
pub use formats::Packager;
pub use registry::Registry;
