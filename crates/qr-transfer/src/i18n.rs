use std::collections::HashMap;

use anyhow::{Context, Result};

const EN: &str = include_str!("../locales/en.json");
const JA: &str = include_str!("../locales/ja.json");

/// Supported page languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    En,
    Ja,
}

impl Lang {
    pub const DEFAULT: Lang = Lang::En;

    /// Pick the page language from an `Accept-Language` header value.
    ///
    /// Only the leading tag matters: `ja` wins when the header starts with it.
    pub fn from_accept_language(header: Option<&str>) -> Self {
        let header = header.unwrap_or_default().trim_start().to_ascii_lowercase();
        if header.starts_with("ja") {
            Lang::Ja
        } else {
            Lang::En
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Ja => "ja",
        }
    }
}

/// Key → string lookup with fallback to the default language, then to the key.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    dictionaries: HashMap<Lang, HashMap<String, String>>,
}

impl Translator {
    /// Load the dictionaries bundled with the binary.
    pub fn bundled() -> Result<Self> {
        let mut translator = Self::default();
        translator.insert_json(Lang::En, EN).context("loading en dictionary")?;
        translator.insert_json(Lang::Ja, JA).context("loading ja dictionary")?;
        Ok(translator)
    }

    pub fn insert_json(&mut self, lang: Lang, json: &str) -> Result<()> {
        let dictionary: HashMap<String, String> =
            serde_json::from_str(json).context("parsing translation dictionary")?;
        self.dictionaries.insert(lang, dictionary);
        Ok(())
    }

    pub fn t<'a>(&'a self, lang: Lang, key: &'a str) -> &'a str {
        [lang, Lang::DEFAULT]
            .iter()
            .find_map(|lang| self.dictionaries.get(lang)?.get(key))
            .map_or(key, String::as_str)
    }
}
