//! The settings model.
//!
//! One [`Settings`] value describes a whole sync: where the server is, how to
//! authenticate, where the vault lives, and one [`LibrarySettings`] block per
//! [`LibraryKind`]. Keys are snake_case; the camelCase names used by the
//! original plugin's settings tab are accepted as aliases.

use crate::error::{ErrorKind, Result};
use derive_more::{Display, Error};
use exn::ResultExt;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const REDACTED: &str = "********";

/// The three kinds of library a server can hold, in import order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryKind {
    Audiobooks,
    Ebooks,
    Podcasts,
}

impl LibraryKind {
    pub const ALL: [LibraryKind; 3] = [Self::Audiobooks, Self::Ebooks, Self::Podcasts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audiobooks => "audiobooks",
            Self::Ebooks => "ebooks",
            Self::Podcasts => "podcasts",
        }
    }
}

impl fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display("unknown library kind {_0:?} (expected audiobooks, ebooks or podcasts)")]
pub struct UnknownLibraryKind(#[error(not(source))] String);

impl FromStr for LibraryKind {
    type Err = UnknownLibraryKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audiobooks" | "audiobook" | "ab" => Ok(Self::Audiobooks),
            "ebooks" | "ebook" | "eb" => Ok(Self::Ebooks),
            "podcasts" | "podcast" | "pod" => Ok(Self::Podcasts),
            _ => Err(UnknownLibraryKind(s.to_string())),
        }
    }
}

/// Which author field names the author folder.
///
/// Parsing never fails: anything that isn't exactly `authorName` falls back
/// to [`SortBy::AuthorNameLF`], which is also what an unset value means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortBy {
    /// "Frank Herbert"
    AuthorName,
    /// "Herbert, Frank"
    #[default]
    AuthorNameLF,
}

impl SortBy {
    /// Key of the metadata field this variant reads.
    pub fn field(&self) -> &'static str {
        match self {
            Self::AuthorName => "authorName",
            Self::AuthorNameLF => "authorNameLF",
        }
    }
}

impl From<&str> for SortBy {
    fn from(value: &str) -> Self {
        match value {
            "authorName" => Self::AuthorName,
            _ => Self::AuthorNameLF,
        }
    }
}
impl From<String> for SortBy {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}
impl From<SortBy> for String {
    fn from(value: SortBy) -> Self {
        value.field().to_string()
    }
}

/// What to put in front of the title when a series has no number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingSeriesNumber {
    /// Write `null | Title.md`, matching vaults created by the plugin.
    #[default]
    Literal,
    /// Write `Title.md` inside the series folder.
    Omit,
}

/// Reads a string field, also accepting the numbers and booleans that
/// environment values such as `SHELFNOTE_AUDIOBOOKS__LIB=42` are parsed into.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    struct LenientString;

    impl Visitor<'_> for LenientString {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<String, E> {
            Ok(v)
        }

        fn visit_char<E: de::Error>(self, v: char) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i128<E: de::Error>(self, v: i128) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(LenientString)
}

/// Per-library settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    pub enable: bool,
    /// Vault-relative folder the notes are created in.
    #[serde(deserialize_with = "lenient_string")]
    pub dir: String,
    /// Server-side library id.
    #[serde(deserialize_with = "lenient_string")]
    pub lib: String,
    #[serde(alias = "sortBy")]
    pub sort_by: SortBy,
    /// Inline template text.
    #[serde(deserialize_with = "lenient_string")]
    pub template: String,
    /// Template file, absolute or relative to the vault. Wins over
    /// [`template`](Self::template) when set.
    #[serde(alias = "templateFile", skip_serializing_if = "Option::is_none")]
    pub template_file: Option<PathBuf>,
    #[serde(alias = "missingSeriesNumber")]
    pub missing_series_number: MissingSeriesNumber,
}

impl LibrarySettings {
    /// Check what importing this library needs beyond the global settings.
    pub fn validate(&self, kind: LibraryKind) -> Result<()> {
        if self.lib.trim().is_empty() {
            exn::bail!(ErrorKind::MissingLibraryId(kind));
        }
        Ok(())
    }

    /// The template text for this library.
    ///
    /// Reads [`template_file`](Self::template_file) when it is set, resolving
    /// relative paths against `vault`.
    pub fn resolve_template(&self, kind: LibraryKind, vault: &Path) -> Result<String> {
        let Some(file) = &self.template_file else {
            return Ok(self.template.clone());
        };
        let path = if file.is_absolute() { file.clone() } else { vault.join(file) };
        tracing::debug!(%kind, path = %path.display(), "Reading template file");
        std::fs::read_to_string(&path).or_raise(|| ErrorKind::Template(kind))
    }
}

/// Everything a sync needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server host name, e.g. `abs.example.org`. A scheme may be included.
    #[serde(deserialize_with = "lenient_string")]
    pub host: String,
    #[serde(alias = "apiKey", deserialize_with = "lenient_string")]
    pub api_key: String,
    /// Root directory of the vault.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault: Option<PathBuf>,
    #[serde(alias = "timeoutSecs")]
    pub timeout_secs: u64,
    pub audiobooks: LibrarySettings,
    pub ebooks: LibrarySettings,
    pub podcasts: LibrarySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: String::new(),
            api_key: String::new(),
            vault: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            audiobooks: LibrarySettings::default(),
            ebooks: LibrarySettings::default(),
            podcasts: LibrarySettings::default(),
        }
    }
}

impl Settings {
    pub fn library(&self, kind: LibraryKind) -> &LibrarySettings {
        match kind {
            LibraryKind::Audiobooks => &self.audiobooks,
            LibraryKind::Ebooks => &self.ebooks,
            LibraryKind::Podcasts => &self.podcasts,
        }
    }

    pub fn library_mut(&mut self, kind: LibraryKind) -> &mut LibrarySettings {
        match kind {
            LibraryKind::Audiobooks => &mut self.audiobooks,
            LibraryKind::Ebooks => &mut self.ebooks,
            LibraryKind::Podcasts => &mut self.podcasts,
        }
    }

    /// Check the settings and return the kinds to import, in import order.
    ///
    /// `only` narrows the run to a single kind; that kind must be enabled.
    /// Per-library problems such as a missing library id are left to
    /// [`LibrarySettings::validate`], so they only stop their own kind.
    ///
    /// ```
    /// use shelfnote_config::{LibraryKind, Settings};
    ///
    /// let mut settings = Settings::default();
    /// settings.host = "abs.example.org".into();
    /// settings.api_key = "secret".into();
    /// settings.podcasts.enable = true;
    /// settings.podcasts.lib = "lib_pod".into();
    /// assert_eq!(settings.validate(None).unwrap(), vec![LibraryKind::Podcasts]);
    /// ```
    pub fn validate(&self, only: Option<LibraryKind>) -> Result<Vec<LibraryKind>> {
        if self.host.trim().is_empty() {
            exn::bail!(ErrorKind::MissingHost);
        }
        if self.api_key.trim().is_empty() {
            exn::bail!(ErrorKind::MissingApiKey);
        }
        let kinds: Vec<LibraryKind> = LibraryKind::ALL
            .into_iter()
            .filter(|kind| only.is_none_or(|only| only == *kind))
            .filter(|kind| self.library(*kind).enable)
            .collect();
        if kinds.is_empty() {
            exn::bail!(ErrorKind::NoLibraryEnabled);
        }
        Ok(kinds)
    }

    /// Replace every library's `template` with its resolved text, reading
    /// template files relative to `vault`.
    pub fn resolve_templates(&mut self, vault: &Path) -> Result<()> {
        for kind in LibraryKind::ALL {
            let library = self.library_mut(kind);
            if library.template_file.is_some() {
                library.template = library.resolve_template(kind, vault)?;
                library.template_file = None;
            }
        }
        Ok(())
    }

    /// A copy that is safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.api_key.is_empty() {
            copy.api_key = REDACTED.to_string();
        }
        copy
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).or_raise(|| ErrorKind::Serialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::ops::Deref;

    fn configured() -> Settings {
        let mut settings = Settings::default();
        settings.host = "abs.example.org".into();
        settings.api_key = "secret".into();
        settings.audiobooks.enable = true;
        settings.audiobooks.lib = "lib_ab".into();
        settings.ebooks.enable = true;
        settings.ebooks.lib = "lib_eb".into();
        settings
    }

    #[rstest]
    #[case("authorName", SortBy::AuthorName)]
    #[case("authorNameLF", SortBy::AuthorNameLF)]
    #[case("", SortBy::AuthorNameLF)]
    #[case("AUTHORNAME", SortBy::AuthorNameLF)]
    #[case("narrator", SortBy::AuthorNameLF)]
    fn test_sort_by_parsing(#[case] input: &str, #[case] expected: SortBy) {
        assert_eq!(SortBy::from(input), expected);
    }

    #[rstest]
    #[case("audiobooks", LibraryKind::Audiobooks)]
    #[case("Ebooks", LibraryKind::Ebooks)]
    #[case(" pod ", LibraryKind::Podcasts)]
    fn test_library_kind_parsing(#[case] input: &str, #[case] expected: LibraryKind) {
        assert_eq!(input.parse::<LibraryKind>().unwrap(), expected);
    }

    #[test]
    fn test_library_kind_rejects_unknown() {
        assert!("comics".parse::<LibraryKind>().is_err());
    }

    #[test]
    fn test_validate_returns_enabled_kinds_in_order() {
        assert_eq!(configured().validate(None).unwrap(), vec![LibraryKind::Audiobooks, LibraryKind::Ebooks]);
        assert_eq!(configured().validate(Some(LibraryKind::Ebooks)).unwrap(), vec![LibraryKind::Ebooks]);
    }

    #[rstest]
    #[case::no_host(|s: &mut Settings| s.host.clear(), ErrorKind::MissingHost)]
    #[case::blank_host(|s: &mut Settings| s.host = "  ".into(), ErrorKind::MissingHost)]
    #[case::no_key(|s: &mut Settings| s.api_key.clear(), ErrorKind::MissingApiKey)]
    #[case::none_enabled(|s: &mut Settings| { s.audiobooks.enable = false; s.ebooks.enable = false; }, ErrorKind::NoLibraryEnabled)]
    fn test_validate_rejects(#[case] tweak: fn(&mut Settings), #[case] expected: ErrorKind) {
        let mut settings = configured();
        tweak(&mut settings);
        let err = settings.validate(None).unwrap_err();
        assert_eq!(err.deref(), &expected);
    }

    #[test]
    fn test_validate_leaves_library_ids_to_each_kind() {
        let mut settings = configured();
        settings.ebooks.lib = " ".into();
        assert_eq!(settings.validate(None).unwrap(), vec![LibraryKind::Audiobooks, LibraryKind::Ebooks]);
        assert!(settings.audiobooks.validate(LibraryKind::Audiobooks).is_ok());
        let err = settings.ebooks.validate(LibraryKind::Ebooks).unwrap_err();
        assert_eq!(err.deref(), &ErrorKind::MissingLibraryId(LibraryKind::Ebooks));
    }

    #[test]
    fn test_string_fields_accept_scalars() {
        let settings: Settings = toml::from_str("api_key = 12345\n[audiobooks]\nlib = 42\ndir = 2.5\n").unwrap();
        assert_eq!(settings.api_key, "12345");
        assert_eq!(settings.audiobooks.lib, "42");
        assert_eq!(settings.audiobooks.dir, "2.5");
        assert!(toml::from_str::<Settings>("host = [1]\n").is_err());
    }

    #[test]
    fn test_validate_only_disabled_kind() {
        let err = configured().validate(Some(LibraryKind::Podcasts)).unwrap_err();
        assert_eq!(err.deref(), &ErrorKind::NoLibraryEnabled);
    }

    #[test]
    fn test_redacted_hides_api_key() {
        let redacted = configured().redacted();
        assert_eq!(redacted.api_key, REDACTED);
        assert_eq!(redacted.host, "abs.example.org");
        assert!(!redacted.to_toml().unwrap().contains("secret"));
        assert_eq!(Settings::default().redacted().api_key, "");
    }

    #[test]
    fn test_toml_round_trip_keeps_enums_readable() {
        let mut settings = configured();
        settings.audiobooks.sort_by = SortBy::AuthorName;
        settings.audiobooks.missing_series_number = MissingSeriesNumber::Omit;
        let text = settings.to_toml().unwrap();
        assert!(text.contains(r#"sort_by = "authorName""#));
        assert!(text.contains(r#"missing_series_number = "omit""#));
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_resolve_inline_template() {
        let mut library = LibrarySettings::default();
        library.template = "# {{title}}".into();
        let template = library.resolve_template(LibraryKind::Audiobooks, Path::new("/vault")).unwrap();
        assert_eq!(template, "# {{title}}");
    }

    #[test]
    fn test_resolve_template_file_relative_to_vault() {
        let vault = tempfile::tempdir().unwrap();
        std::fs::write(vault.path().join("book.tpl"), "# {{title}} by {{authorName}}").unwrap();
        let mut library = LibrarySettings::default();
        library.template = "ignored".into();
        library.template_file = Some("book.tpl".into());
        let template = library.resolve_template(LibraryKind::Ebooks, vault.path()).unwrap();
        assert_eq!(template, "# {{title}} by {{authorName}}");
    }

    #[test]
    fn test_resolve_templates_in_place() {
        let vault = tempfile::tempdir().unwrap();
        std::fs::write(vault.path().join("podcast.tpl"), "{{description}}").unwrap();
        let mut settings = configured();
        settings.audiobooks.template = "inline".into();
        settings.podcasts.template_file = Some("podcast.tpl".into());
        settings.resolve_templates(vault.path()).unwrap();
        assert_eq!(settings.audiobooks.template, "inline");
        assert_eq!(settings.podcasts.template, "{{description}}");
        assert_eq!(settings.podcasts.template_file, None);
    }

    #[test]
    fn test_resolve_missing_template_file() {
        let vault = tempfile::tempdir().unwrap();
        let mut library = LibrarySettings::default();
        library.template_file = Some("missing.tpl".into());
        let err = library.resolve_template(LibraryKind::Podcasts, vault.path()).unwrap_err();
        assert_eq!(err.deref(), &ErrorKind::Template(LibraryKind::Podcasts));
    }
}
