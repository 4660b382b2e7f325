//! Tradable-instrument master list.
//!
//! The list is a Shift_JIS CSV exported from the exchange listing, with at
//! least a code column and a name column. Candidate paths are tried in
//! order; the first that parses wins. When none does, a one-row fallback
//! universe is returned together with a notice.

use super::decode::decode_sjis;
use super::provider::DataError;
use crate::domain::Instrument;
use std::path::{Path, PathBuf};

/// Accepted header names for the code column.
const CODE_HEADERS: &[&str] = &["コード", "code"];
/// Accepted header names for the name column.
const NAME_HEADERS: &[&str] = &["銘柄名", "name"];

/// Result of loading the universe.
#[derive(Debug, Clone)]
pub struct UniverseLoad {
    pub instruments: Vec<Instrument>,
    /// The file the list came from; `None` when the fallback was used.
    pub source: Option<PathBuf>,
    /// Set when every candidate failed.
    pub notice: Option<String>,
}

impl UniverseLoad {
    pub fn is_fallback(&self) -> bool {
        self.source.is_none()
    }

    /// Instrument with exactly this code.
    pub fn find(&self, code: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.code == code)
    }

    /// Instruments whose code or name contains `query` (case-insensitive for
    /// ASCII).
    pub fn search(&self, query: &str) -> Vec<&Instrument> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return self.instruments.iter().collect();
        }
        self.instruments
            .iter()
            .filter(|i| i.display_name().to_lowercase().contains(&q))
            .collect()
    }
}

/// Loads the instrument list from an ordered list of candidate files.
#[derive(Debug, Clone)]
pub struct UniverseLoader {
    paths: Vec<PathBuf>,
}

impl UniverseLoader {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Single instrument used when no candidate file can be read.
    pub fn fallback() -> Vec<Instrument> {
        vec![Instrument::new("8306", "三菱UFJ")]
    }

    /// Try every candidate path in order. Never fails.
    pub fn load(&self) -> UniverseLoad {
        for path in &self.paths {
            match Self::load_file(path) {
                Ok(instruments) => {
                    tracing::info!(path = %path.display(), count = instruments.len(), "loaded universe");
                    return UniverseLoad {
                        instruments,
                        source: Some(path.clone()),
                        notice: None,
                    };
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "universe candidate rejected");
                }
            }
        }

        tracing::warn!(candidates = self.paths.len(), "no universe file found, using fallback");
        UniverseLoad {
            instruments: Self::fallback(),
            source: None,
            notice: Some(format!(
                "instrument list not found (tried {} location(s)); using fallback",
                self.paths.len()
            )),
        }
    }

    /// Read and parse one candidate file.
    pub fn load_file(path: &Path) -> Result<Vec<Instrument>, DataError> {
        let bytes = std::fs::read(path)?;
        let text = decode_sjis(&bytes)?;
        parse_universe(&text)
    }
}

/// Parse decoded universe CSV text.
pub fn parse_universe(text: &str) -> Result<Vec<Instrument>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    };
    let code_idx = find(CODE_HEADERS)
        .ok_or_else(|| DataError::Schema("missing code column".into()))?;
    let name_idx = find(NAME_HEADERS)
        .ok_or_else(|| DataError::Schema("missing name column".into()))?;

    let mut instruments = Vec::new();
    for record in reader.records() {
        let record = record?;
        let code = record.get(code_idx).unwrap_or("");
        if code.is_empty() {
            continue;
        }
        let name = record.get(name_idx).unwrap_or("");
        instruments.push(Instrument::new(code, name));
    }

    if instruments.is_empty() {
        return Err(DataError::Schema("no instruments listed".into()));
    }
    Ok(instruments)
}
