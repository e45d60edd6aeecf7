//! Bilingual label handling
//!
//! Labelled entities store English and Arabic columns side by side. Callers
//! always pass the locale explicitly; there is no ambient current-language
//! state. Arabic falls back to English when the Arabic column is empty.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

impl Locale {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ar" | "ara" | "arabic" => Self::Ar,
            _ => Self::En,
        }
    }
}

/// Optional `?locale=` query parameter for label-bearing endpoints
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LocaleParams {
    pub locale: Option<Locale>,
}

/// A pair of bilingual label columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    #[serde(default)]
    pub ar: Option<String>,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, ar: Option<String>) -> Self {
        Self { en: en.into(), ar }
    }

    /// Label for the requested locale, falling back to English
    pub fn name(&self, locale: Locale) -> &str {
        match locale {
            Locale::En => &self.en,
            Locale::Ar => self
                .ar
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(&self.en),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arabic_label_used_when_present() {
        let text = LocalizedText::new("Concrete", Some("خرسانة".to_string()));
        assert_eq!(text.name(Locale::Ar), "خرسانة");
        assert_eq!(text.name(Locale::En), "Concrete");
    }

    #[test]
    fn arabic_falls_back_to_english() {
        let text = LocalizedText::new("Steel", None);
        assert_eq!(text.name(Locale::Ar), "Steel");

        let blank = LocalizedText::new("Steel", Some(String::new()));
        assert_eq!(blank.name(Locale::Ar), "Steel");
    }

    #[test]
    fn locale_parses_loosely() {
        assert_eq!(Locale::from_str("AR"), Locale::Ar);
        assert_eq!(Locale::from_str("en-US"), Locale::En);
    }
}
