use crate::error::{CompwatchError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "compwatch.yaml";
pub const DEFAULT_STATE_FILE: &str = "prev_comps.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve the configured state file against `root`. Absolute paths are kept.
pub fn state_path(root: &Path, state_file: &str) -> PathBuf {
    let p = Path::new(state_file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

// ---------------------------------------------------------------------------
// Country validation
// ---------------------------------------------------------------------------

static COUNTRY_RE: OnceLock<Regex> = OnceLock::new();

fn country_re() -> &'static Regex {
    COUNTRY_RE.get_or_init(|| Regex::new(r"^[A-Z]{2}$").unwrap())
}

pub fn validate_country(code: &str) -> Result<()> {
    if !country_re().is_match(code) {
        return Err(CompwatchError::InvalidCountry(code.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
