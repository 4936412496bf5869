//! Lifecycle of the intermediate files a merge job creates.
//!
//! Every temp file is registered with the job's [`ArtifactScope`] before it
//! is written. The scope deletes whatever it holds exactly once: when the
//! job calls [`ArtifactScope::release_all`], or on drop if the job never got
//! that far (early return, panic). Cleanup is advisory: a file that cannot
//! be removed is logged and left for [`sweep_stale`].

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use uuid::Uuid;

/// Prefix of every normalized-image temp file.
pub const TEMP_PREFIX: &str = "temp-";

/// Suffix of staging files used for atomic writes.
pub const STAGING_SUFFIX: &str = ".partial";

/// Outcome of releasing a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    /// Files that were deleted.
    pub removed: usize,
    /// Files that still exist because deletion failed.
    pub failed: usize,
}

/// Set of temp files owned by one merge job.
#[derive(Debug)]
pub struct ArtifactScope {
    job_id: Uuid,
    dir: PathBuf,
    registered: Vec<PathBuf>,
    next_seq: usize,
    released: bool,
}

impl ArtifactScope {
    /// Create a scope whose temp files live in `dir`.
    pub fn new(dir: impl Into<PathBuf>, job_id: Uuid) -> Self {
        Self {
            job_id,
            dir: dir.into(),
            registered: Vec::new(),
            next_seq: 0,
            released: false,
        }
    }

    /// Id of the owning job.
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Paths registered so far.
    pub fn registered(&self) -> &[PathBuf] {
        &self.registered
    }

    /// Add `path` to the cleanup set.
    pub fn register(&mut self, path: impl Into<PathBuf>) {
        self.registered.push(path.into());
    }

    /// Allocate and register a temp PDF path for the image at `source`.
    ///
    /// Names are `temp-<job>-<seq>-<basename>.pdf`; the job id keeps
    /// concurrent jobs apart and the sequence number keeps two sources with
    /// the same basename apart within a job.
    pub fn temp_pdf_path(&mut self, source: &Path) -> PathBuf {
        let basename = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image");

        let name = format!(
            "{}{}-{}-{}.pdf",
            TEMP_PREFIX,
            self.job_id.simple(),
            self.next_seq,
            basename
        );
        self.next_seq += 1;

        let path = self.dir.join(name);
        self.register(path.clone());
        path
    }

    /// Delete every registered path that still exists.
    ///
    /// Only the first call does any work.
    pub fn release_all(&mut self) -> ReleaseReport {
        let mut report = ReleaseReport::default();
        if self.released {
            return report;
        }
        self.released = true;

        for path in self.registered.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "removed temp artifact");
                    report.removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        job_id = %self.job_id,
                        path = %path.display(),
                        error = %e,
                        "failed to remove temp artifact"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }
}

impl Drop for ArtifactScope {
    fn drop(&mut self) {
        if !self.released {
            let report = self.release_all();
            tracing::debug!(
                job_id = %self.job_id,
                removed = report.removed,
                "released temp artifacts on drop"
            );
        }
    }
}

/// Length of a UUID in its simple (hyphenless) form.
const TOKEN_LEN: usize = 32;

fn is_token(s: &str) -> bool {
    s.len() == TOKEN_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Whether `name` has the exact shape of a temp file from
/// [`ArtifactScope::temp_pdf_path`]: `temp-<32 hex>-<digits>-<basename>.pdf`.
pub fn is_generated_temp(name: &str) -> bool {
    let Some(rest) = name.strip_prefix(TEMP_PREFIX) else {
        return false;
    };
    if !rest.ends_with(".pdf") {
        return false;
    }
    let Some((token, rest)) = rest.split_at_checked(TOKEN_LEN) else {
        return false;
    };
    let Some((seq, basename)) = rest.strip_prefix('-').and_then(|r| r.split_once('-')) else {
        return false;
    };

    is_token(token) && !seq.is_empty() && seq.bytes().all(|b| b.is_ascii_digit()) && !basename.is_empty()
}

/// Whether `name` has the exact shape of a writer staging file:
/// `.<output name>.<32 hex>.partial`.
pub fn is_staging(name: &str) -> bool {
    let Some(stem) = name
        .strip_prefix('.')
        .and_then(|n| n.strip_suffix(STAGING_SUFFIX))
    else {
        return false;
    };

    match stem.rsplit_once('.') {
        Some((output, token)) => !output.is_empty() && is_token(token),
        None => false,
    }
}

/// Remove a partially written file, ignoring one that is already gone.
pub(crate) fn discard(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partial output");
        }
    }
}

/// Delete temp and staging files in `root` older than `older_than`.
///
/// Recovers from jobs that died without running their scope (process
/// killed, power loss). Only names this crate generates are touched; an
/// upload that merely starts with `temp-` is left alone. Returns how many
/// files were removed.
pub fn sweep_stale(root: &Path, older_than: Duration) -> Result<usize, glob::PatternError> {
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let patterns: [(String, fn(&str) -> bool); 2] = [
        (format!("{escaped_root}/{TEMP_PREFIX}*.pdf"), is_generated_temp),
        (format!("{escaped_root}/.*{STAGING_SUFFIX}"), is_staging),
    ];

    let now = SystemTime::now();
    let mut removed = 0;

    for (pattern, generated) in &patterns {
        let entries = glob::glob(pattern)?;

        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry during sweep");
                    continue;
                }
            };

            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| generated(n));
            if !matches {
                continue;
            }

            let modified = match std::fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot stat stale candidate");
                    continue;
                }
            };

            let age = now.duration_since(modified).unwrap_or_default();
            if age < older_than {
                continue;
            }

            match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), age_secs = age.as_secs(), "swept stale artifact");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to sweep stale artifact");
                }
            }
        }
    }

    Ok(removed)
}
