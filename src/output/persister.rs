//! Mirroring URI paths onto the local filesystem

use crate::url::CrawlUri;
use crate::{MirrorError, Result};
use std::path::PathBuf;

/// Folder and file name derived from a URI path, relative to the output root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParts {
    /// Directory relative to the output root; empty for the root itself
    pub folder: PathBuf,
    pub file_name: String,
}

impl PathParts {
    /// The file path relative to the output root
    pub fn relative_path(&self) -> PathBuf {
        self.folder.join(&self.file_name)
    }
}

/// Writes fetched content under a fixed output directory
///
/// The URI path `/a/b/c.html` maps to `<root>/a/b/c.html`. The site root and any
/// path ending in `/` map to the index file name inside that directory. The query
/// string is not part of the local path.
///
/// A real segment spelled like the index file name gets its first character
/// percent-escaped (`index.html` → `%69ndex.html`), so `/` and `/index.html`
/// land in different files. Normalized URIs always decode escapes of
/// unreserved characters, so no segment arrives in that escaped form.
#[derive(Debug, Clone)]
pub struct Persister {
    root: PathBuf,
    index_file_name: String,
}

impl Persister {
    pub fn new(root: impl Into<PathBuf>, index_file_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            index_file_name: index_file_name.into(),
        }
    }

    /// Splits the URI path into folder and file name
    ///
    /// Segments stay percent-encoded, so a decoded `/` can never introduce a
    /// directory level.
    pub fn path_parts(&self, uri: &CrawlUri) -> Result<PathParts> {
        let path = uri.path();
        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        for segment in &segments {
            if *segment == "." || *segment == ".." || segment.contains('\\') {
                return Err(MirrorError::UnmappablePath {
                    url: uri.to_string(),
                    reason: format!("path segment {:?} is not a plain name", segment),
                });
            }
        }

        let file_name = if path.ends_with('/') {
            self.index_file_name.clone()
        } else {
            match segments.pop() {
                Some(last) => self.escape_segment(last),
                None => self.index_file_name.clone(),
            }
        };

        Ok(PathParts {
            folder: segments.iter().map(|s| self.escape_segment(s)).collect(),
            file_name,
        })
    }

    fn escape_segment(&self, segment: &str) -> String {
        if segment != self.index_file_name {
            return segment.to_string();
        }
        let mut chars = segment.chars();
        match chars.next() {
            Some(first) => format!("%{:02X}{}", first as u32, chars.as_str()),
            None => String::new(),
        }
    }

    /// Absolute location the URI's content is written to
    pub fn local_path(&self, uri: &CrawlUri) -> Result<PathBuf> {
        Ok(self.root.join(self.path_parts(uri)?.relative_path()))
    }

    /// Writes `contents` to the URI's mirrored location, creating parent
    /// directories first
    ///
    /// Safe to call repeatedly for the same URI; the last write wins.
    pub async fn write(&self, uri: &CrawlUri, contents: &[u8]) -> Result<PathBuf> {
        let parts = self.path_parts(uri)?;
        let folder = self.root.join(&parts.folder);

        tokio::fs::create_dir_all(&folder)
            .await
            .map_err(|source| MirrorError::Persist {
                path: folder.clone(),
                source,
            })?;

        let path = folder.join(&parts.file_name);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| MirrorError::Persist {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(path)
    }
}
