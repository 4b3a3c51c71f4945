//! Source buffers: one file's bytes plus the path they came from.

use std::fmt;
use std::sync::Arc;

/// One source file's contents, held as a byte buffer plus its path.
///
/// Byte-indexed throughout the pipeline; no byte-order-mark handling. The
/// `Arc<str>` keeps every `SourceLocation` cheap to clone without re-copying
/// the file on every token, and `Send`/`Sync` so a resolved tree can cross a
/// worker-pool thread boundary (see `saplang-cli`'s `schedule` module).
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: Arc<str>,
    contents: Arc<str>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: Arc::from(path.into().into_boxed_str()),
            contents: Arc::from(contents.into().into_boxed_str()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.contents.as_bytes()
    }

    /// The module identifier derived from the file-name stem.
    #[must_use]
    pub fn module_stem(&self) -> &str {
        let file_name = self.path.rsplit(['/', '\\']).next().unwrap_or(&self.path);
        file_name.split('.').next().unwrap_or(file_name)
    }

    fn path_rc(&self) -> Arc<str> {
        Arc::clone(&self.path)
    }

    #[must_use]
    pub fn location_at(&self, line: u32, col: u32, offset: u32) -> SourceLocation {
        SourceLocation {
            path: self.path_rc(),
            line,
            col,
            offset,
        }
    }
}

/// A single point in a source file: `path:line:col` plus the raw byte offset.
///
/// Lines and columns are 1-based, matching the `path:line:col <kind>: <msg>`
/// diagnostic format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SourceLocation {
    #[serde(skip, default = "default_path")]
    path: Arc<str>,
    pub line: u32,
    pub col: u32,
    pub offset: u32,
}

fn default_path() -> Arc<str> {
    Arc::from("")
}

impl SourceLocation {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// A placeholder location for synthesized declarations that have no
    /// corresponding source text (e.g. the error-recovery stand-in decl
    /// sema hands out in place of a failed lookup).
    pub(crate) fn synthetic() -> Self {
        Self { path: default_path(), line: 0, col: 0, offset: 0 }
    }

    #[cfg(test)]
    pub(crate) fn for_test(path: &str, line: u32, col: u32, offset: u32) -> Self {
        Self {
            path: Arc::from(path),
            line,
            col,
            offset,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::SourceFile;

    #[test]
    fn module_stem_strips_directory_and_extension() {
        let file = SourceFile::new("/tmp/proj/main.sl", "");
        assert_eq!(file.module_stem(), "main");
    }

    #[test]
    fn location_formats_as_path_line_col() {
        let file = SourceFile::new("a.sl", "fn");
        let loc = file.location_at(1, 3, 2);
        assert_eq!(loc.to_string(), "a.sl:1:3");
    }
}
