//! Intermediate-file lifecycle for composition runs.
//!
//! Row and row-group canvases are written next to the final sheet so
//! they can be inspected, then swept once the run is over. The guard
//! owns that sweep: it runs after an optional grace interval on
//! success, and immediately on drop when a run fails part-way, so no
//! exit path leaks intermediates. `disarm` keeps them on disk instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::output::Printer;

/// Filename prefix shared by every intermediate raster.
pub const INTERMEDIATE_PREFIX: &str = "temp_";

/// Scoped owner of one run's intermediate files.
pub struct IntermediateGuard {
    dir: PathBuf,
    files: Vec<PathBuf>,
    grace: Duration,
    armed: bool,
}

impl IntermediateGuard {
    pub fn new(dir: &Path, grace: Duration) -> Self {
        Self {
            dir: dir.to_path_buf(),
            files: Vec::new(),
            grace,
            armed: true,
        }
    }

    /// Register the path for one intermediate raster, named after its
    /// hierarchy level and key: `temp_<level>_<key>.png`.
    pub fn stage_path(&mut self, level: &str, key: &str) -> PathBuf {
        let path = self
            .dir
            .join(format!("{INTERMEDIATE_PREFIX}{level}_{key}.png"));
        self.files.push(path.clone());
        path
    }

    /// Paths registered so far.
    pub fn registered(&self) -> &[PathBuf] {
        &self.files
    }

    /// Keep the intermediates on disk after the run.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Wait out the inspection grace interval, then sweep.
    pub fn finish(mut self, printer: &Printer) {
        if self.armed && !self.files.is_empty() && !self.grace.is_zero() {
            std::thread::sleep(self.grace);
        }
        if self.armed {
            self.sweep(printer);
        }
        self.armed = false;
    }

    fn sweep(&mut self, printer: &Printer) {
        for path in self.files.drain(..) {
            if !path.exists() {
                continue;
            }
            if let Err(err) = std::fs::remove_file(&path) {
                printer.warning(
                    "Cleanup",
                    &format!("could not remove {}: {err}", path.display()),
                );
            }
        }
    }
}

impl Drop for IntermediateGuard {
    fn drop(&mut self) {
        // Failure path: sweep without the grace wait.
        if self.armed {
            self.sweep(&Printer::new());
        }
    }
}

/// Remove leftover files in `dir` whose names match any of `patterns`,
/// skipping paths listed in `exclude`. Returns the number removed.
///
/// Patterns are filename globs where `*` matches any run of characters;
/// final sheet outputs are protected by the exclude list.
pub fn sweep_stale(
    dir: &Path,
    patterns: &[String],
    exclude: &[PathBuf],
    printer: &Printer,
) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || exclude.contains(&path) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !patterns.iter().any(|p| matches_pattern(name, p)) {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(err) => printer.warning(
                "Cleanup",
                &format!("could not remove {}: {err}", path.display()),
            ),
        }
    }
    removed
}

/// Literal filename match with `*` as the only wildcard.
pub(crate) fn matches_pattern(name: &str, pattern: &str) -> bool {
    let name = name.as_bytes();
    let pattern = pattern.as_bytes();
    let (mut n, mut p) = (0, 0);
    let mut star: Option<usize> = None;
    let mut mark = 0;
    while n < name.len() {
        if p < pattern.len() && pattern[p] == name[n] {
            n += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            star = Some(p);
            mark = n;
            p += 1;
        } else if let Some(s) = star {
            p = s + 1;
            mark += 1;
            n = mark;
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}
