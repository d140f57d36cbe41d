//! Locale to store-directory mapping.
//!
//! Each locale's translations live under `<base_dir>/<language>/`. The
//! trailing slash keeps directories prefix-free, so the mapping is injective
//! as long as no two active locales share a base language.

use crate::Error;
use crate::Locale;
use crate::LocaleSet;
use crate::Result;

/// Store prefix holding the translations of `locale`
pub fn directory_for(
    locale: &Locale,
    base_dir: &str,
) -> String {
    format!("{}/{}/", base_dir.trim_end_matches('/'), locale.language())
}

/// Directories of the active locale set, in locale order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryMap(Vec<(Locale, String)>);

impl DirectoryMap {
    /// Maps every locale to its directory.
    ///
    /// # Errors
    /// [`Error::DirectoryCollision`] when two distinct locales map to the same
    /// directory (e.g. `en-US` and `en-GB`).
    pub fn resolve(
        locales: &LocaleSet,
        base_dir: &str,
    ) -> Result<Self> {
        let mut entries: Vec<(Locale, String)> = Vec::with_capacity(locales.len());
        for locale in locales {
            let directory = directory_for(locale, base_dir);
            if let Some((first, _)) = entries.iter().find(|(_, d)| *d == directory) {
                return Err(Error::DirectoryCollision {
                    first: first.to_string(),
                    second: locale.to_string(),
                    directory,
                });
            }
            entries.push((locale.clone(), directory));
        }
        Ok(Self(entries))
    }

    pub fn get(
        &self,
        locale: &Locale,
    ) -> Option<&str> {
        self.0.iter().find(|(l, _)| l == locale).map(|(_, d)| d.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Locale, &str)> {
        self.0.iter().map(|(l, d)| (l, d.as_str()))
    }

    pub fn locales(&self) -> LocaleSet {
        self.0.iter().map(|(l, _)| l.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
