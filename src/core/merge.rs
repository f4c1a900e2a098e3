//! Merge module - Concatenates source files into a single text dump
//!
//! Produces one file for review: a header, every matching source file under
//! its own separator, and a footer.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::utils;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Directory does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Files that made it into the dump and the ones that could not be read
#[derive(Debug, Default)]
pub struct MergeReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
    /// Size of the output file in bytes
    pub bytes: u64,
}

/// Make sure every extension starts with a dot
pub fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|ext| {
            let ext = ext.as_ref();
            if ext.starts_with('.') {
                ext.to_string()
            } else {
                format!(".{}", ext)
            }
        })
        .collect()
}

fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    extensions.iter().any(|ext| name.ends_with(ext.as_str()))
}

/// Collect the files under `dir` whose name ends with one of `extensions`,
/// sorted by path. `exclude` keeps the output file out of its own dump.
pub fn find_sources(
    dir: &Path,
    extensions: &[String],
    recursive: bool,
    exclude: Option<&Path>,
) -> Result<Vec<PathBuf>, MergeError> {
    if !dir.exists() {
        return Err(MergeError::NotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(MergeError::NotADirectory(dir.to_path_buf()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(max_depth)
    {
        let entry = entry?;
        if !entry.file_type().is_file() || !matches_extension(entry.path(), extensions) {
            continue;
        }
        if exclude.is_some_and(|out| out == entry.path()) {
            debug!(path = %entry.path().display(), "skipping output file");
            continue;
        }
        files.push(entry.into_path());
    }

    files.sort();
    Ok(files)
}

/// Write the dump of `files` into `out`. Paths are shown relative to
/// `base_dir`. Unreadable files are reported and left out.
pub fn write_merged<W: Write>(
    out: &mut W,
    files: &[PathBuf],
    base_dir: &Path,
) -> io::Result<MergeReport> {
    let rule = utils::rule();
    let mut report = MergeReport::default();

    writeln!(out, "# Fontes combinadas")?;
    writeln!(out, "# Diretório base: {}", base_dir.display())?;
    writeln!(out, "# Total de arquivos: {}", files.len())?;
    writeln!(out, "{}\n", rule)?;

    for path in files {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot read source file");
                report.skipped.push((path.clone(), err.to_string()));
                continue;
            }
        };

        let relative = path.strip_prefix(base_dir).unwrap_or(path);

        writeln!(out, "\n{}", rule)?;
        writeln!(out, "# Arquivo: {}", relative.display())?;
        writeln!(out, "{}\n", rule)?;

        out.write_all(content.as_bytes())?;
        if !content.is_empty() && !content.ends_with('\n') {
            out.write_all(b"\n")?;
        }

        report.written.push(relative.to_path_buf());
    }

    writeln!(out, "\n{}", rule)?;
    writeln!(out, "# Fim da combinação")?;
    writeln!(out, "{}", rule)?;

    Ok(report)
}

/// Write the dump of `files` to the file at `output`
pub fn merge_files(
    files: &[PathBuf],
    output: &Path,
    base_dir: &Path,
) -> Result<MergeReport, MergeError> {
    let write_err = |source| MergeError::Write {
        path: output.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(output).map_err(write_err)?);
    let mut report = write_merged(&mut writer, files, base_dir).map_err(write_err)?;
    writer.flush().map_err(write_err)?;
    drop(writer);

    report.bytes = fs::metadata(output).map_err(write_err)?.len();
    Ok(report)
}
