//! Output file naming.

use std::path::{Path, PathBuf};

use chrono::DateTime;
use chrono_tz::Tz;

const RANGE_FORMAT: &str = "%Y-%m-%d_%H-%M";
const UNKNOWN_RANGE: &str = "unknown_date_range";

/// Replace characters that are not allowed in file names.
pub fn sanitize_prefix(prefix: &str) -> String {
    prefix
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect()
}

/// `<prefix>_<earliest>_to_<latest>.csv`, or `<prefix>_unknown_date_range.csv`
/// unless both bounds are known.
pub fn derive_filename(
    prefix: &str,
    earliest: Option<&DateTime<Tz>>,
    latest: Option<&DateTime<Tz>>,
) -> String {
    let prefix = sanitize_prefix(prefix);
    match (earliest, latest) {
        (Some(e), Some(l)) => format!(
            "{prefix}_{}_to_{}.csv",
            e.format(RANGE_FORMAT),
            l.format(RANGE_FORMAT)
        ),
        _ => format!("{prefix}_{UNKNOWN_RANGE}.csv"),
    }
}

/// Final destination: the fixed `output` path when set, otherwise the derived
/// name inside `dir`.
pub fn resolve_output_path(dir: &Path, output: Option<&Path>, derived: &str) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => dir.join(derived),
    }
}
