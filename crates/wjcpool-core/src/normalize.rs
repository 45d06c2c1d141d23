// Name canonicalization shared by roster keys and provider records.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Characters dropped from a name after accent stripping and lowercasing.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '\'' | '\u{2019}')
}

/// Canonical matching key for a person's name.
///
/// Lowercases, decomposes to NFD and drops combining marks, then removes all
/// whitespace, hyphens and apostrophes. "José  O'Brien", "JOSE OBRIEN" and
/// "jose-obrien" all produce `joseobrien`. Idempotent.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| !is_separator(*c))
        .collect()
}

/// Key for a first/last name pair, as both rosters and provider records
/// carry them split.
pub fn name_key(first: &str, last: &str) -> String {
    normalize_name(&format!("{first}{last}"))
}

/// Canonical form of a country identifier (roster goalie pick or provider
/// competitor id): trimmed and case-folded.
pub fn normalize_country(country: &str) -> String {
    country.trim().to_lowercase()
}

/// Title-case a name for display: the first letter of every alphabetic run is
/// upper-cased, the rest lower-cased ("o'brien" -> "O'Brien").
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accents_case_and_punctuation_collapse_to_one_key() {
        let a = normalize_name("José  O'Brien");
        let b = normalize_name("JOSE OBRIEN");
        let c = normalize_name("jose-obrien");
        assert_eq!(a, "joseobrien");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn outer_whitespace_is_ignored() {
        assert_eq!(normalize_name("  Connor Bedard \t"), "connorbedard");
    }

    #[test]
    fn typographic_apostrophe_is_dropped() {
        assert_eq!(normalize_name("D\u{2019}Amico"), normalize_name("D'Amico"));
    }

    #[test]
    fn nordic_and_czech_diacritics_are_stripped() {
        assert_eq!(normalize_name("Jiří Kulich"), "jirikulich");
        assert_eq!(normalize_name("Kasper Halttunen"), "kasperhalttunen");
        assert_eq!(normalize_name("Jönsson-Fjällby"), "jonssonfjallby");
    }

    #[test]
    fn precomposed_and_decomposed_forms_match() {
        let precomposed = "Ren\u{00e9}";
        let decomposed = "Rene\u{0301}";
        assert_eq!(normalize_name(precomposed), normalize_name(decomposed));
    }

    #[test]
    fn normalization_is_idempotent() {
        for name in ["José  O'Brien", "Jiří Kulich", "İlker", "ÆSIR-Ö", "", "   "] {
            let once = normalize_name(name);
            assert_eq!(normalize_name(&once), once, "not idempotent for {name:?}");
        }
    }

    #[test]
    fn empty_input_gives_empty_key() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name(" - ' "), "");
    }

    #[test]
    fn name_key_joins_first_and_last() {
        assert_eq!(name_key("Macklin", "Celebrini"), "macklincelebrini");
        assert_eq!(name_key(" Jon ", " Doe"), normalize_name("Jon Doe"));
    }

    #[test]
    fn country_is_trimmed_and_case_folded() {
        assert_eq!(normalize_country("  USA "), "usa");
        assert_eq!(normalize_country("Finland"), "finland");
    }

    #[test]
    fn title_case_handles_apostrophes_and_hyphens() {
        assert_eq!(title_case("jon doe"), "Jon Doe");
        assert_eq!(title_case("o'brien"), "O'Brien");
        assert_eq!(title_case("JEAN-LUC picard"), "Jean-Luc Picard");
        assert_eq!(title_case("finland"), "Finland");
    }
}
