//! Locale identity.
//!
//! A [`Locale`] wraps a parsed BCP-47 language identifier. Two locales are
//! considered to *match* when their base-language subtags are equal; region,
//! script and variants are kept for display but never take part in matching.

use std::fmt;
use std::str::FromStr;

use unic_langid::LanguageIdentifier;

use crate::Error;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale(LanguageIdentifier);

impl Locale {
    /// Parses a language tag such as `en`, `bn-BD` or `en_US`.
    pub fn parse(tag: &str) -> Result<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(Error::LocaleNotSupported(String::new()));
        }
        tag.parse::<LanguageIdentifier>()
            .map(Self)
            .map_err(|_| Error::LocaleNotSupported(tag.to_string()))
    }

    /// The base-language subtag (`en` for `en-US`)
    pub fn language(&self) -> &str {
        self.0.language.as_str()
    }

    /// Whether `other` names the same base language
    pub fn matches(
        &self,
        other: &Locale,
    ) -> bool {
        self.language() == other.language()
    }

    pub fn as_langid(&self) -> &LanguageIdentifier {
        &self.0
    }

    /// Parses a comma-separated list, skipping blank and unparseable entries
    /// and dropping duplicates while keeping first-seen order.
    pub fn parse_list(value: &str) -> LocaleSet {
        let mut locales = LocaleSet::default();
        for tag in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match Locale::parse(tag) {
                Ok(locale) => {
                    locales.insert(locale);
                }
                Err(_) => tracing::warn!(tag, "ignoring unparseable locale tag"),
            }
        }
        locales
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Locale::parse(s)
    }
}

impl fmt::Display for Locale {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<LanguageIdentifier> for Locale {
    fn from(id: LanguageIdentifier) -> Self {
        Self(id)
    }
}

/// Ordered, duplicate-free set of active locales
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleSet(Vec<Locale>);

impl LocaleSet {
    pub fn new(locales: Vec<Locale>) -> Self {
        let mut set = Self::default();
        for locale in locales {
            set.insert(locale);
        }
        set
    }

    /// Adds `locale` unless an identical tag is already present.
    pub fn insert(
        &mut self,
        locale: Locale,
    ) -> bool {
        if self.0.contains(&locale) {
            return false;
        }
        self.0.push(locale);
        true
    }

    /// First registered locale sharing the base language of `requested`
    pub fn find_match(
        &self,
        requested: &Locale,
    ) -> Option<&Locale> {
        self.0.iter().find(|l| l.matches(requested))
    }

    pub fn contains(
        &self,
        locale: &Locale,
    ) -> bool {
        self.0.contains(locale)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Locale> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a LocaleSet {
    type Item = &'a Locale;
    type IntoIter = std::slice::Iter<'a, Locale>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Locale> for LocaleSet {
    fn from_iter<I: IntoIterator<Item = Locale>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
