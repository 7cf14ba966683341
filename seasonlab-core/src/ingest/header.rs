//! Header resolution: case/spacing-insensitive, synonym-aware.

use std::collections::HashMap;

/// Canonical column roles the transformer looks up.
pub mod col {
    pub const DATE: &str = "date";
    pub const SYMBOL: &str = "symbol";
    pub const OPEN: &str = "open";
    pub const HIGH: &str = "high";
    pub const LOW: &str = "low";
    pub const CLOSE: &str = "close";
    pub const VOLUME: &str = "volume";
    pub const OPEN_INTEREST: &str = "openinterest";
}

/// Lowercase a header name and strip spaces, underscores, dots, and
/// hyphens, so "Open Interest" ≡ "open_interest" ≡ "openinterest".
pub fn normalize_header(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '.' | '-'))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Synonym → canonical role.
fn canonical_role(normalized: &str) -> Option<&'static str> {
    Some(match normalized {
        "date" | "tradedate" | "timestamp" => col::DATE,
        "symbol" | "ticker" | "instrument" => col::SYMBOL,
        "open" => col::OPEN,
        "high" => col::HIGH,
        "low" => col::LOW,
        "close" | "last" => col::CLOSE,
        "volume" | "vol" | "qty" => col::VOLUME,
        "openinterest" | "oi" => col::OPEN_INTEREST,
        _ => return None,
    })
}

/// Resolved mapping from canonical column role to record index.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    by_role: HashMap<&'static str, usize>,
}

impl HeaderMap {
    /// Build from raw header names. Unknown columns are ignored; when two
    /// headers resolve to the same role the first one wins.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut by_role = HashMap::new();
        for (idx, name) in headers.iter().enumerate() {
            if let Some(role) = canonical_role(&normalize_header(name.as_ref())) {
                by_role.entry(role).or_insert(idx);
            }
        }
        Self { by_role }
    }

    pub fn index_of(&self, role: &'static str) -> Option<usize> {
        self.by_role.get(role).copied()
    }

    /// Non-empty trimmed value of a role's column in `record`, if any.
    pub fn get<'a, S: AsRef<str>>(&self, record: &'a [S], role: &'static str) -> Option<&'a str> {
        let idx = self.index_of(role)?;
        record
            .get(idx)
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
    }
}
