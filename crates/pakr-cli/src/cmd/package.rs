//! Package command: build one artifact per requested format

use anyhow::{Context, Result, anyhow};
use pakr_core::Registry;
use pakr_schema::{Config, Info};
use std::io::{BufWriter, Write};
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use tracing::debug;

use crate::ui::Output;

/// Environment variable pinning generated timestamps.
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// Build every format in `formats` from the descriptor at `config_path`.
///
/// Builds run concurrently, one scoped thread per format. Each artifact is
/// written to a temporary file next to its destination and only renamed
/// into place once its build succeeded.
pub fn package(config_path: &Path, formats: &[String], target: &Path, output: &Output) -> Result<()> {
    let registry = Registry::with_defaults();
    let mut config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    config.validate(|f| registry.contains(f))?;
    for format in formats {
        registry.get(format)?;
        if let Some(notice) = ignored_fields(format, &config.get(format)) {
            output.warning(&notice);
        }
    }
    if let Some(epoch) = source_date_epoch()? {
        config.info.mtime = Some(epoch);
    }

    let into_dir = formats.len() > 1 || is_dir_target(target);
    let results: Vec<Result<PathBuf>> = std::thread::scope(|s| {
        let handles: Vec<_> = formats
            .iter()
            .map(|format| {
                let (registry, config) = (&registry, &config);
                s.spawn(move || build(registry, config, format, target, into_dir))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| Err(anyhow!("build thread panicked"))))
            .collect()
    });

    let mut failed = 0;
    for (format, result) in formats.iter().zip(results) {
        match result {
            Ok(path) => output.success(&format!("created {format} package: {}", path.display())),
            Err(e) => {
                output.error(&format!("{format}: {e:#}"));
                failed += 1;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} builds failed", formats.len());
    }
    Ok(())
}

/// Build a single format and persist it; returns the artifact path.
fn build(
    registry: &Registry,
    config: &Config,
    format: &str,
    target: &Path,
    into_dir: bool,
) -> Result<PathBuf> {
    let packager = registry.get(format)?;
    let info = config.get(format);
    let path = if into_dir {
        target.join(packager.conventional_file_name(&info))
    } else {
        target.to_path_buf()
    };
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    debug!("building {format} into {}", path.display());
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)
        .with_context(|| format!("Failed to create a temporary file in {}", dir.display()))?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        packager.package(&info, &mut w)?;
        w.flush()?;
    }
    tmp.persist(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Descriptor fields the format cannot represent and will drop.
fn ignored_fields(format: &str, info: &Info) -> Option<String> {
    (format == "apk" && !info.epoch.is_empty())
        .then(|| format!("apk has no epoch; ignoring epoch {}", info.epoch))
}

fn is_dir_target(target: &Path) -> bool {
    target.is_dir() || target.to_string_lossy().ends_with(MAIN_SEPARATOR)
}

fn source_date_epoch() -> Result<Option<i64>> {
    match std::env::var(SOURCE_DATE_EPOCH) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{SOURCE_DATE_EPOCH} must be an integer, got '{value}'")),
        _ => Ok(None),
    }
}
