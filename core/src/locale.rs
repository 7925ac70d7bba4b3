use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages the event datasets exist in.
///
/// `Zh` is the base language: its dataset is the only one whose place names
/// match the coordinate index, so it is always loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
}

impl Locale {
    pub const BASE: Locale = Locale::Zh;
    pub const ALL: [Locale; 2] = [Locale::Zh, Locale::En];

    /// Parse a language tag such as `zh`, `zh-CN`, `en_US` or `EN`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match primary.as_str() {
            "zh" => Some(Self::Zh),
            "en" => Some(Self::En),
            _ => None,
        }
    }

    /// First supported tag in preference order, or the base language.
    pub fn preferred<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        tags.into_iter()
            .find_map(Self::from_tag)
            .unwrap_or(Self::BASE)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Zh => "zh",
            Self::En => "en",
        }
    }

    pub fn is_base(&self) -> bool {
        *self == Self::BASE
    }

    /// Name shown on the language switch.
    pub fn native_name(&self) -> &'static str {
        match self {
            Self::Zh => "中文",
            Self::En => "English",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_variants() {
        assert_eq!(Locale::from_tag("zh"), Some(Locale::Zh));
        assert_eq!(Locale::from_tag("zh-CN"), Some(Locale::Zh));
        assert_eq!(Locale::from_tag("en_US"), Some(Locale::En));
        assert_eq!(Locale::from_tag(" EN "), Some(Locale::En));
        assert_eq!(Locale::from_tag("fr"), None);
        assert_eq!(Locale::from_tag(""), None);
    }

    #[test]
    fn test_preferred_falls_back_to_base() {
        assert_eq!(Locale::preferred(["fr-FR", "en-GB"]), Locale::En);
        assert_eq!(Locale::preferred(["de", "fr"]), Locale::Zh);
        assert_eq!(Locale::preferred([]), Locale::BASE);
    }
}
