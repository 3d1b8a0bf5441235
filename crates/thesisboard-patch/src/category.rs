use thesisboard_core::title_key;

/// Scorecard display names (as the generator writes them) → state keys.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("ETF Adoption", "etf"),
    ("Regulatory Clarity", "regulatory"),
    ("ODL Volume", "odl_volume"),
    ("Institutional Custody", "custody"),
    ("Macro Liquidity", "macro"),
    ("Ledger Activity", "ledger"),
    ("Market Structure", "market_structure"),
    ("Tokenization", "tokenization"),
];

/// Look up the state key for a category name.
///
/// Case, spacing, and punctuation are ignored, and the internal key itself is
/// accepted (`"odl_volume"`, `"ODL-Volume"`, and `"odl volume"` all map to
/// `odl_volume`).
pub fn category_key(name: &str) -> Option<&'static str> {
    let wanted = title_key(name);
    if wanted.is_empty() {
        return None;
    }
    CATEGORIES
        .iter()
        .find(|(display, key)| title_key(display) == wanted || title_key(key) == wanted)
        .map(|(_, key)| *key)
}
