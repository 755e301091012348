//! File-backed template lookup

use std::io;
use std::path::{Component, Path, PathBuf};

use super::types::{TemplateError, TemplateResult, TemplateSource};

const LAYOUT_HTML: &str = "layout.html";
const LAYOUT_CSS: &str = "layout.css";

/// Resolves template ids to files under a root directory.
///
/// Nothing is cached: every [`load`](TemplateStore::load) reads the files
/// again, so edits on disk are picked up by the next send.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
    additional_css: Option<PathBuf>,
}

impl TemplateStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            additional_css: None,
        }
    }

    /// Append the stylesheet at `path` to `layout.css` when inlining
    pub fn with_additional_css(mut self, path: Option<PathBuf>) -> Self {
        self.additional_css = path;
        self
    }

    /// Template root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check whether `<id>.txt` or `<id>.html` exists
    pub async fn exists(&self, id: &str) -> bool {
        for extension in ["txt", "html"] {
            if let Some(path) = self.template_path(id, extension) {
                if is_file(&path).await {
                    return true;
                }
            }
        }
        false
    }

    /// Read everything needed to compile template `id`.
    ///
    /// Fails only when neither `<id>.txt` nor `<id>.html` can be read. The
    /// layout and stylesheets are optional.
    pub async fn load(&self, id: &str) -> TemplateResult<TemplateSource> {
        let not_found = || TemplateError::NotFound {
            template_id: id.to_string(),
            dir: self.root.display().to_string(),
        };

        let (txt_path, html_path) = match (
            self.template_path(id, "txt"),
            self.template_path(id, "html"),
        ) {
            (Some(txt), Some(html)) => (txt, html),
            _ => {
                tracing::debug!(template_id = %id, "Rejected template id");
                return Err(not_found());
            }
        };

        let text = read_optional(&txt_path).await;
        let html = read_optional(&html_path).await;

        if text.is_none() && html.is_none() {
            return Err(not_found());
        }

        let layout = match html {
            Some(_) => read_optional(&self.root.join(LAYOUT_HTML)).await,
            None => None,
        };

        let mut css = read_optional(&self.root.join(LAYOUT_CSS)).await;
        if let Some(extra_path) = &self.additional_css {
            match read_optional(extra_path).await {
                Some(extra) => {
                    let combined = css.get_or_insert_with(String::new);
                    if !combined.is_empty() && !combined.ends_with('\n') {
                        combined.push('\n');
                    }
                    combined.push_str(&extra);
                }
                None => tracing::warn!(
                    path = %extra_path.display(),
                    "Additional stylesheet could not be read, skipping"
                ),
            }
        }

        tracing::debug!(
            template_id = %id,
            has_text = text.is_some(),
            has_html = html.is_some(),
            has_layout = layout.is_some(),
            has_css = css.is_some(),
            "Loaded email template"
        );

        Ok(TemplateSource {
            id: id.to_string(),
            dir: self.root.display().to_string(),
            text,
            html,
            layout,
            css,
        })
    }

    /// `<root>/<id>.<extension>`, or `None` when `id` could escape the root.
    fn template_path(&self, id: &str, extension: &str) -> Option<PathBuf> {
        if !is_valid_id(id) {
            return None;
        }
        Some(self.root.join(format!("{}.{}", id, extension)))
    }
}

/// Ids are relative paths made of `[A-Za-z0-9_.-]` segments separated by `/`.
fn is_valid_id(id: &str) -> bool {
    if id.is_empty() || id.len() > 255 {
        return false;
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
    {
        return false;
    }

    Path::new(id)
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Read a file, treating a missing or unreadable file as absent.
async fn read_optional(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Some(contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Template file could not be read"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn store_with(files: &[(&str, &str)]) -> (tempfile::TempDir, TemplateStore) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, contents).unwrap();
        }
        let store = TemplateStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_valid_ids() {
        assert!(is_valid_id("welcome"));
        assert!(is_valid_id("account/password-reset_v2"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("../secrets"));
        assert!(!is_valid_id("/etc/passwd"));
        assert!(!is_valid_id("./welcome"));
        assert!(!is_valid_id("with space"));
    }

    #[tokio::test]
    async fn test_load_text_only() {
        let (_dir, store) = store_with(&[("welcome.txt", "Hi\nBody")]);

        let source = store.load("welcome").await.unwrap();
        assert_eq!(source.text.as_deref(), Some("Hi\nBody"));
        assert!(source.html.is_none());
        assert!(source.layout.is_none());
    }

    #[tokio::test]
    async fn test_layout_only_loaded_with_html() {
        let (_dir, store) = store_with(&[
            ("plain.txt", "Hi\nBody"),
            ("rich.html", "<p>Body</p>"),
            ("layout.html", "<body>{{content}}</body>"),
        ]);

        assert!(store.load("plain").await.unwrap().layout.is_none());
        assert!(store.load("rich").await.unwrap().layout.is_some());
    }

    #[tokio::test]
    async fn test_load_missing_template() {
        let (_dir, store) = store_with(&[("layout.html", "{{content}}")]);

        let err = store.load("nope").await.unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { ref template_id, .. } if template_id == "nope"));
        assert!(!store.exists("nope").await);
    }

    #[tokio::test]
    async fn test_traversal_is_not_found() {
        let (dir, _store) = store_with(&[("secret.txt", "Secret\nstuff")]);
        let nested = dir.path().join("templates");
        fs::create_dir_all(&nested).unwrap();
        let store = TemplateStore::new(&nested);

        assert!(matches!(
            store.load("../secret").await,
            Err(TemplateError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_additional_css_is_appended() {
        let (dir, store) = store_with(&[
            ("rich.html", "<p>Body</p>"),
            ("layout.css", "p { color: red; }"),
            ("extra.css", "p { margin: 0; }"),
        ]);
        let store = store.with_additional_css(Some(dir.path().join("extra.css")));

        let css = store.load("rich").await.unwrap().css.unwrap();
        assert_eq!(css, "p { color: red; }\np { margin: 0; }");
    }

    #[tokio::test]
    async fn test_missing_additional_css_is_skipped() {
        let (dir, store) = store_with(&[("rich.html", "<p>Body</p>")]);
        let store = store.with_additional_css(Some(dir.path().join("missing.css")));

        let source = store.load("rich").await.unwrap();
        assert!(source.css.is_none());
        assert!(store.exists("rich").await);
    }
}
