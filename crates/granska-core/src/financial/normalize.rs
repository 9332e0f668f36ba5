use regex::Regex;
use std::sync::LazyLock;

/// Leading line numbering: `1.`, `2)`, `3a`, `IV.`, `B.`.
static LEADING_NUMBERING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+[a-z]?[.)]?|[ivx]+[.)]|[a-h][.)])\s+").expect("valid regex")
});

/// Normalize a statement row label for keyword matching.
///
/// Steps:
/// 1. Lowercase
/// 2. Collapse all whitespace (including no-break spaces) to single spaces
/// 3. Strip leading line numbering
/// 4. Strip trailing colons and dots
pub fn normalize_label(raw: &str) -> String {
    let collapsed = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let stripped = LEADING_NUMBERING.replace(&collapsed, "");
    stripped
        .trim_end_matches([':', '.', ' '])
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_whitespace() {
        assert_eq!(normalize_label("  Summa\u{00A0}RÖRELSENS   kostnader "), "summa rörelsens kostnader");
    }

    #[test]
    fn test_trailing_colon() {
        assert_eq!(normalize_label("Nettoomsättning:"), "nettoomsättning");
        assert_eq!(normalize_label("Årets resultat ..."), "årets resultat");
    }

    #[test]
    fn test_leading_numbering() {
        assert_eq!(normalize_label("1. Nettoomsättning"), "nettoomsättning");
        assert_eq!(normalize_label("3a) Övriga externa kostnader"), "övriga externa kostnader");
        assert_eq!(normalize_label("IV. Eget kapital"), "eget kapital");
        assert_eq!(normalize_label("B. Kortfristiga skulder"), "kortfristiga skulder");
    }

    #[test]
    fn test_numbers_inside_label_kept() {
        assert_eq!(normalize_label("Resultat 2023"), "resultat 2023");
        assert_eq!(normalize_label("EBITDA"), "ebitda");
    }
}
