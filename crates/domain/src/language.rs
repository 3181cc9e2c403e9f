//! Languages attached to conferences and people, and locale matching.

use common::AggregateId;
use serde::{Deserialize, Serialize};

/// Fallback locale used whenever no better match exists.
pub const DEFAULT_LOCALE: &str = "en";

/// The aggregate a language entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LanguageOwner {
    Conference(AggregateId),
    Person(AggregateId),
}

/// A locale code registered on a conference or a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub owner: LanguageOwner,
    pub code: String,
}

impl Language {
    pub fn new(owner: LanguageOwner, code: impl Into<String>) -> Self {
        Self {
            owner,
            code: code.into(),
        }
    }
}

/// Normalizes a user-supplied code: trimmed and lowercased.
///
/// Returns None for blank input.
pub fn normalize_code(code: &str) -> Option<String> {
    let code = code.trim();
    (!code.is_empty()).then(|| code.to_lowercase())
}

/// Anything that carries an ordered list of languages.
pub trait LanguageRegistry {
    /// The languages in the order they were registered.
    fn languages(&self) -> &[Language];

    /// Lowercased codes, in registration order, without duplicates.
    fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = Vec::with_capacity(self.languages().len());
        for language in self.languages() {
            let code = language.code.to_lowercase();
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        codes
    }

    /// Returns true if `code` is registered (case-insensitive).
    fn has_language(&self, code: &str) -> bool {
        let code = code.to_lowercase();
        self.languages()
            .iter()
            .any(|language| language.code.to_lowercase() == code)
    }
}

/// Picks the locale to address `person` in for mails about `conference`.
///
/// "en" wins when the person speaks it, lists nothing, or shares no language
/// with the conference. Otherwise the first shared code in the person's own
/// order is used.
pub fn best_locale<P, C>(person: &P, conference: &C) -> String
where
    P: LanguageRegistry + ?Sized,
    C: LanguageRegistry + ?Sized,
{
    let own = person.codes();
    if own.is_empty() || own.iter().any(|code| code == DEFAULT_LOCALE) {
        return DEFAULT_LOCALE.to_string();
    }

    let offered = conference.codes();
    own.into_iter()
        .find(|code| offered.contains(code))
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Codes(Vec<Language>);

    impl Codes {
        fn person(codes: &[&str]) -> Self {
            let owner = LanguageOwner::Person(AggregateId::new());
            Self(codes.iter().map(|c| Language::new(owner, *c)).collect())
        }

        fn conference(codes: &[&str]) -> Self {
            let owner = LanguageOwner::Conference(AggregateId::new());
            Self(codes.iter().map(|c| Language::new(owner, *c)).collect())
        }
    }

    impl LanguageRegistry for Codes {
        fn languages(&self) -> &[Language] {
            &self.0
        }
    }

    #[test]
    fn shared_language_is_chosen() {
        let person = Codes::person(&["de"]);
        let conference = Codes::conference(&["en", "de"]);
        assert_eq!(best_locale(&person, &conference), "de");
    }

    #[test]
    fn person_without_languages_gets_english() {
        let person = Codes::person(&[]);
        let conference = Codes::conference(&["en", "de"]);
        assert_eq!(best_locale(&person, &conference), "en");
    }

    #[test]
    fn no_intersection_falls_back_to_english() {
        let person = Codes::person(&["fr"]);
        let conference = Codes::conference(&["en", "de"]);
        assert_eq!(best_locale(&person, &conference), "en");
    }

    #[test]
    fn english_speakers_always_get_english() {
        let person = Codes::person(&["de", "EN"]);
        let conference = Codes::conference(&["de"]);
        assert_eq!(best_locale(&person, &conference), "en");
    }

    #[test]
    fn first_match_follows_person_order() {
        let person = Codes::person(&["nl", "fr", "de"]);
        let conference = Codes::conference(&["de", "fr"]);
        assert_eq!(best_locale(&person, &conference), "fr");
    }

    #[test]
    fn codes_are_lowercased_and_deduplicated() {
        let conference = Codes::conference(&["DE", "en", "de"]);
        assert_eq!(conference.codes(), vec!["de", "en"]);
        assert!(conference.has_language("En"));
        assert!(!conference.has_language("fr"));
    }

    #[test]
    fn normalize_trims_and_rejects_blank() {
        assert_eq!(normalize_code("  PT-br "), Some("pt-br".to_string()));
        assert_eq!(normalize_code("   "), None);
    }

    #[test]
    fn owner_serializes_as_tagged_variant() {
        let id = AggregateId::new();
        let json = serde_json::to_value(LanguageOwner::Conference(id)).unwrap();
        assert_eq!(json["kind"], "conference");
        assert_eq!(json["id"], id.to_string());
    }
}
