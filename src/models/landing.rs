//! The static HTML page served at `/`.

use anyhow::{Context, Result};
use std::{path::Path, sync::Arc};

const EMBEDDED_INDEX: &str = include_str!("../../templates/index.html");

/// Landing page markup, loaded once at startup and shared by reference.
#[derive(Clone, Debug)]
pub struct LandingPage {
    html: Arc<str>,
}

impl LandingPage {
    /// The page compiled into the binary.
    pub fn embedded() -> Self {
        Self {
            html: Arc::from(EMBEDDED_INDEX),
        }
    }

    /// Load the page from `path`, or fall back to the embedded page.
    ///
    /// A configured path that cannot be read is a startup error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let html = std::fs::read_to_string(path)
                    .with_context(|| format!("loading index template {}", path.display()))?;
                Ok(Self {
                    html: Arc::from(html),
                })
            }
            None => Ok(Self::embedded()),
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_page_contains_upload_form() {
        let page = LandingPage::load(None).unwrap();
        assert!(page.html().contains(r#"action="/upload""#));
        assert!(page.html().contains(r#"name="file""#));
    }

    #[test]
    fn custom_template_is_read_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<h1>relay</h1>").unwrap();

        let page = LandingPage::load(Some(file.path())).unwrap();
        assert_eq!(page.html(), "<h1>relay</h1>");
    }

    #[test]
    fn missing_template_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.html");
        let err = LandingPage::load(Some(missing.as_path())).unwrap_err();
        assert!(err.to_string().contains("absent.html"));
    }
}
