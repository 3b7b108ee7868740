//! Static asset resolution under the web root.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;

static MIME_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("css", "text/css;charset=UTF-8"),
        ("js", "application/x-javascript;charset=UTF-8"),
        ("map", "application/json;charset=UTF-8"),
        ("json", "application/json;charset=UTF-8"),
        ("html", "text/html"),
        ("xhtml", "text/html"),
        ("htm", "text/html"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("ico", "image/x-icon"),
        ("png", "image/png"),
        ("gif", "image/gif"),
        ("svg", "image/svg+xml"),
        ("woff", "application/font-woff"),
    ])
});

/// MIME type for `path` from its lower-cased extension.
///
/// `None` when the path has no extension or the extension is not in the table;
/// callers then send the body without an explicit content type.
#[must_use]
pub fn content_type_for(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    MIME_TYPES.get(ext.as_str()).copied()
}

/// An opened asset ready to be streamed.
#[derive(Debug)]
pub struct StaticAsset {
    pub file: File,
    pub content_type: Option<String>,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
    extra_types: HashMap<String, String>,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
            extra_types: HashMap::new(),
        }
    }

    /// Map `extension` (case-insensitive, without the dot) to `content_type`,
    /// overriding the built-in table.
    #[must_use]
    pub fn with_content_type(mut self, extension: &str, content_type: impl Into<String>) -> Self {
        self.extra_types.insert(
            extension.trim_start_matches('.').to_ascii_lowercase(),
            content_type.into(),
        );
        self
    }

    /// Content type for `path`, consulting custom mappings first.
    #[must_use]
    pub fn content_type(&self, path: &str) -> Option<String> {
        let custom = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.extra_types.get(&e.to_ascii_lowercase()));
        match custom {
            Some(ty) => Some(ty.clone()),
            None => content_type_for(path).map(str::to_string),
        }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Map a URL path onto the web root. Rejects `..`, roots and prefixes.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    /// Filesystem path of `url_path` if it names a regular file under the root.
    #[must_use]
    pub fn resolve(&self, url_path: &str) -> Option<PathBuf> {
        self.map_path(url_path).filter(|p| p.is_file())
    }

    /// Open the asset behind `url_path`.
    ///
    /// `Ok(None)` covers every not-found case: traversal attempts, missing
    /// files and directories. Only failures to open an existing regular file
    /// are reported as errors.
    pub fn open(&self, url_path: &str) -> io::Result<Option<StaticAsset>> {
        let Some(path) = self.resolve(url_path) else {
            return Ok(None);
        };
        let file = File::open(&path)?;
        Ok(Some(StaticAsset {
            file,
            content_type: self.content_type(url_path),
            path,
        }))
    }
}
