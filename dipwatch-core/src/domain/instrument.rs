use serde::{Deserialize, Serialize};

/// A tradable equity from the exchange listing.
///
/// Identified uniquely by `code` (e.g. "8306"). Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Instrument {
    pub code: String,
    pub name: String,
}

impl Instrument {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// Label shown in selectors and used as the series label: "8306 MUFG".
    pub fn display_name(&self) -> String {
        format!("{} {}", self.code, self.name)
    }

    /// Exchange-qualified ticker for the market-data provider ("8306" + ".T").
    pub fn ticker(&self, market_suffix: &str) -> String {
        format!("{}{market_suffix}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_joins_code_and_name() {
        let inst = Instrument::new("8306", "三菱UFJ");
        assert_eq!(inst.display_name(), "8306 三菱UFJ");
    }

    #[test]
    fn ticker_appends_market_suffix() {
        let inst = Instrument::new("1802", "Obayashi");
        assert_eq!(inst.ticker(".T"), "1802.T");
        assert_eq!(inst.ticker(""), "1802");
    }
}
