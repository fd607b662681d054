//! Vault path validation.
//!
//! Note paths are built from remote metadata (author names, series titles,
//! book titles) so they must never be trusted to stay inside the vault.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a vault-relative path and returns its normalized form.
///
/// `.` components, repeated separators and a leading `/` are dropped. Any
/// `..` component is rejected, even one that would stay inside the vault,
/// since a folder named `..` is never a real author or series. NUL bytes
/// and Windows drive prefixes are rejected too, as is anything that
/// normalizes to an empty path.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use shelfnote_storage::validate_path;
/// assert!(validate_path("ABS/Audiobooks/Herbert, Frank/Dune/1 | Dune.md").is_ok());
/// assert!(validate_path("../outside.md").is_err());
/// assert_eq!(
///     validate_path("ABS//Podcasts/./Show/Episode.md").unwrap(),
///     Path::new("ABS/Podcasts/Show/Episode.md"),
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) => {
                // NUL passes through Path::components() on Unix but truncates in syscalls.
                if segment.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
                components.push(segment);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) | Component::ParentDir => exn::bail!(ErrorKind::InvalidPath(original.to_path_buf())),
        }
    }
    if components.is_empty() {
        exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
    }
    Ok(components.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Audiobooks/Herbert, Frank/Dune.md", "Audiobooks/Herbert, Frank/Dune.md")]
    #[case("Audiobooks/Herbert, Frank/Dune/null | Dune.md", "Audiobooks/Herbert, Frank/Dune/null | Dune.md")]
    #[case("Podcasts//Show///Episode.md", "Podcasts/Show/Episode.md")]
    #[case("./Ebooks/./Le Guin, Ursula/Earthsea.md", "Ebooks/Le Guin, Ursula/Earthsea.md")]
    #[case("/Ebooks/Book.md", "Ebooks/Book.md")]
    #[case("Ebooks/", "Ebooks")]
    fn test_normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(input).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("//")]
    #[case("..")]
    #[case("../Notes/escape.md")]
    #[case("Audiobooks/../../escape.md")]
    #[case("Ebooks/Author/../Book.md")]
    #[case("ABS/Audiobooks/../Escape.md")]
    #[case("Audio\0books/Book.md")]
    fn test_rejects(#[case] input: &str) {
        let err = validate(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_author_segment_with_empty_name_collapses() {
        // An absent author renders as an empty segment, so the note lands
        // directly inside the library folder.
        assert_eq!(validate("Audiobooks//Dune.md").unwrap(), Path::new("Audiobooks/Dune.md"));
    }
}
