use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Lazy, so `{{a}} {{b}}` is two tokens. Tokens never span lines.
regex!(TOKEN_REGEX, r"\{\{(.*?)\}\}");
// A number directly followed by a comma separates multiple series memberships.
regex!(SERIES_SEPARATOR_REGEX, r"\b\d+(?:\.\d+)?,");
regex!(SERIES_NUMBER_REGEX, r"\s+#(\d+(?:\.\d+)?)$");
