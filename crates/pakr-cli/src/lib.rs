//! pakr - a multi-format Linux packager
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Builds `.rpm`, `.deb`, `.apk` and Arch Linux `.pkg.tar.zst` packages from
//! a single TOML descriptor.
//!
//! # Overview
//!
//! A descriptor names the package, its version and the files it ships.
//! Per-format differences live in `[overrides.<format>]` blocks that are
//! merged over the base descriptor before each build.
//!
//! ```text
//! pakr init                         # write a sample pakr.toml
//! pakr package -p deb -p rpm -t dist/
//! ```

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Descriptor file used when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "pakr.toml";

#[derive(Debug, Parser)]
#[command(name = "pakr")]
#[command(author, version, about = "pakr - build rpm, deb, apk and Arch Linux packages")]
pub struct Cli {
    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build packages from a descriptor
    Package {
        /// Descriptor file
        #[arg(short = 'f', long = "config", default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Format to build; repeat for several (rpm, deb, apk, archlinux)
        #[arg(short = 'p', long = "packager", required = true)]
        packagers: Vec<String>,
        /// Output directory, or the artifact path when building one format
        #[arg(short, long, default_value = ".")]
        target: PathBuf,
    },
    /// Write a sample descriptor
    Init {
        /// Descriptor file to create
        #[arg(short = 'f', long = "config", default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
    /// Generate shell completions
    #[command(visible_alias = "completion")]
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
