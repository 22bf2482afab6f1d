//! Resource locator conversion.

use reqwest::Url;

/// Anything that can name a remote image.
///
/// Raw strings are parsed; a string that does not parse yields `None`,
/// which callers treat as a silent no-op.
pub trait IntoLocator {
    /// Converts into a structured URL, or `None` if unparsable.
    fn into_locator(self) -> Option<Url>;
}

impl IntoLocator for Url {
    fn into_locator(self) -> Option<Url> {
        Some(self)
    }
}

impl IntoLocator for &Url {
    fn into_locator(self) -> Option<Url> {
        Some(self.clone())
    }
}

impl IntoLocator for &str {
    fn into_locator(self) -> Option<Url> {
        Url::parse(self.trim()).ok()
    }
}

impl IntoLocator for String {
    fn into_locator(self) -> Option<Url> {
        self.as_str().into_locator()
    }
}

impl IntoLocator for &String {
    fn into_locator(self) -> Option<Url> {
        self.as_str().into_locator()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("https://example.com/a.png", true ; "https_url")]
    #[test_case("  http://example.com/b.jpg ", true ; "surrounding_whitespace")]
    #[test_case("not a url", false ; "plain_words")]
    #[test_case("", false ; "empty")]
    #[test_case("/relative/path.png", false ; "relative_path")]
    fn test_str_into_locator(input: &str, parses: bool) {
        assert_eq!(input.into_locator().is_some(), parses);
    }

    #[test]
    fn test_url_passes_through() -> Result<(), Box<dyn std::error::Error>> {
        let url = Url::parse("https://example.com/c.webp")?;
        assert_eq!((&url).into_locator(), Some(url.clone()));
        assert_eq!(url.clone().into_locator(), Some(url));
        Ok(())
    }
}
