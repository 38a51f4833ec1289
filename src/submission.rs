#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use anyhow::{Context, Result};
use regex::Regex;

/// Pattern for a corrected submission file name:
/// `<email>_<sheet>_corrected.pdf`, where the local part must not end in a
/// dot and the domain must contain one. Names starting with a dot or
/// containing `..` are rejected before matching (the regex crate has no
/// lookaround).
static FILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+[^.]@.+\..+)_(\d+)_corrected\.pdf$")
        .expect("corrected-submission pattern is valid")
});

/// A corrected submission derived from a matching file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Full path to the PDF on disk.
    pub path:      PathBuf,
    /// Bare file name the recipient and sheet were parsed from.
    pub file_name: String,
    /// Email address encoded in the file name.
    pub recipient: String,
    /// Exercise-sheet number, kept as the raw digit string from the name.
    pub sheet:     String,
}

impl Submission {
    /// Parses a single file name, returning `None` when it does not name a
    /// corrected submission.
    pub fn from_file_name(dir: &Path, name: &str) -> Option<Self> {
        if name.starts_with('.') || name.contains("..") {
            return None;
        }
        let caps = FILE_PATTERN.captures(name)?;
        Some(Self {
            path:      dir.join(name),
            file_name: name.to_string(),
            recipient: caps[1].to_string(),
            sheet:     caps[2].to_string(),
        })
    }
}

/// Lists `dir` and returns the corrected submissions found there, sorted by
/// file name so prompt numbering is stable across runs.
pub fn scan_dir(dir: &Path) -> Result<Vec<Submission>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Could not read directory {}", dir.display()))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Could not read a directory entry in {}", dir.display()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(submission) = Submission::from_file_name(dir, name) {
            found.push(submission);
        }
    }

    found.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(found)
}

/// Returns the sheet number shared by every submission, or `None` when the
/// batch mixes sheets. Sheets compare as raw digit strings, so `01` and `1`
/// count as different sheets.
pub fn single_sheet(submissions: &[Submission]) -> Option<&str> {
    let (first, rest) = submissions.split_first()?;
    rest.iter()
        .all(|s| s.sheet == first.sheet)
        .then(|| first.sheet.as_str())
}
