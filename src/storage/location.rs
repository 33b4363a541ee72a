//! Storage roots on S3 or the local filesystem

use super::pattern::PathPattern;
use crate::config::{Credentials, StorageOptions};
use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::{Path as ObjectPath, PathPart};
use object_store::{ObjectMeta, ObjectStore};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// A root directory inside an object store
///
/// All paths handed to a location are relative to its root.
#[derive(Debug, Clone)]
pub struct StorageLocation {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Key prefix within the bucket (empty for local roots)
    prefix: String,
    /// URL scheme for logging (s3, file)
    scheme: String,
    /// Root as configured, for display
    root: String,
}

impl StorageLocation {
    /// Open an existing root for reading
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` or `s3a://bucket/path/` - AWS S3 or S3-compatible
    /// - `file:///local/path/`, `/local/path/` or `./path/` - local filesystem
    pub fn open(root: &str, credentials: &Credentials, options: &StorageOptions) -> Result<Self> {
        Self::parse(root, credentials, options, false)
    }

    /// Open a root for writing, creating local directories as needed
    pub fn open_or_create(
        root: &str,
        credentials: &Credentials,
        options: &StorageOptions,
    ) -> Result<Self> {
        Self::parse(root, credentials, options, true)
    }

    fn parse(
        root: &str,
        credentials: &Credentials,
        options: &StorageOptions,
        create: bool,
    ) -> Result<Self> {
        if root.starts_with("s3://") || root.starts_with("s3a://") {
            Self::parse_s3(root, credentials, options)
        } else if root.contains("://") && !root.starts_with("file://") {
            Err(Error::config(format!("Unsupported storage URL: {root}")))
        } else {
            Self::parse_local(root, create)
        }
    }

    /// Parse an S3 URL
    fn parse_s3(root: &str, credentials: &Credentials, options: &StorageOptions) -> Result<Self> {
        let url = Url::parse(root)?;
        let bucket = url
            .host_str()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| Error::config(format!("S3 URL has no bucket: {root}")))?;
        let prefix = url.path().trim_matches('/').to_string();

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_access_key_id(credentials.access_key_id())
            .with_secret_access_key(credentials.secret_access_key());

        if let Some(token) = credentials.session_token() {
            builder = builder.with_token(token);
        }
        if let Some(region) = &options.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &options.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if options.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create S3 client for {root}: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "s3".to_string(),
            root: root.to_string(),
        })
    }

    /// Parse local filesystem path
    fn parse_local(root: &str, create: bool) -> Result<Self> {
        let path = if root.starts_with("file://") {
            Url::parse(root)?
                .to_file_path()
                .map_err(|()| Error::config(format!("Invalid file URL: {root}")))?
        } else {
            PathBuf::from(root)
        };

        if create {
            std::fs::create_dir_all(&path).map_err(|e| {
                Error::config(format!("Failed to create directory {}: {e}", path.display()))
            })?;
        } else if !path.is_dir() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let store = LocalFileSystem::new_with_prefix(&path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: String::new(),
            scheme: "file".to_string(),
            root: root.to_string(),
        })
    }

    /// Get the scheme (s3, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Root as configured
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Human-readable form of a relative path
    pub fn display_path(&self, relative: &str) -> String {
        format!(
            "{}/{}",
            self.root.trim_end_matches('/'),
            relative.trim_start_matches('/')
        )
    }

    /// Resolve raw path segments under the root
    ///
    /// Segments are encoded individually, so a `/` inside a segment never
    /// creates an extra directory level.
    pub fn resolve<'a>(&'a self, segments: impl IntoIterator<Item = &'a str>) -> ObjectPath {
        let base = self
            .prefix
            .split('/')
            .filter(|s| !s.is_empty())
            .map(PathPart::from);
        ObjectPath::from_iter(base.chain(segments.into_iter().map(PathPart::from)))
    }

    /// Strip the root prefix from an object path
    fn relative<'a>(&self, path: &'a str) -> &'a str {
        if self.prefix.is_empty() {
            path
        } else {
            path.strip_prefix(self.prefix.as_str())
                .map_or(path, |rest| rest.trim_start_matches('/'))
        }
    }

    /// List every object under a relative directory
    ///
    /// A directory that does not exist lists as empty.
    pub async fn list(&self, relative_dir: &str) -> Result<Vec<ObjectMeta>> {
        let dir = self.resolve(relative_dir.split('/').filter(|s| !s.is_empty()));
        let prefix = if dir.as_ref().is_empty() {
            None
        } else {
            Some(&dir)
        };

        match self.store.list(prefix).try_collect::<Vec<_>>().await {
            Ok(mut objects) => {
                objects.sort_by(|a, b| a.location.cmp(&b.location));
                Ok(objects)
            }
            Err(object_store::Error::NotFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// List relative paths matching a pattern, sorted lexicographically
    pub async fn list_matching(&self, pattern: &PathPattern) -> Result<Vec<String>> {
        let objects = self.list(pattern.literal_prefix()).await?;
        let matched = objects
            .iter()
            .map(|meta| self.relative(meta.location.as_ref()).to_string())
            .filter(|path| pattern.matches(path))
            .collect();
        Ok(matched)
    }

    /// Read a whole object
    pub async fn read(&self, relative: &str) -> Result<Bytes> {
        let path = self.resolve(relative.split('/').filter(|s| !s.is_empty()));
        let data = self
            .store
            .get(&path)
            .await
            .map_err(|e| Error::storage(format!("Failed to read {path}: {e}")))?
            .bytes()
            .await
            .map_err(|e| Error::storage(format!("Failed to read {path}: {e}")))?;
        Ok(data)
    }

    /// Write bytes to the given path segments, returning the full path for logging
    pub async fn write(&self, segments: &[&str], data: Bytes) -> Result<String> {
        let path = self.resolve(segments.iter().copied());

        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| Error::storage(format!("Failed to write {path}: {e}")))?;

        Ok(format!("{}://{path}", self.scheme))
    }

    /// Delete every object under a relative directory, returning the count
    pub async fn delete_dir(&self, relative_dir: &str) -> Result<usize> {
        let objects = self.list(relative_dir).await?;
        for meta in &objects {
            self.store
                .delete(&meta.location)
                .await
                .map_err(|e| Error::storage(format!("Failed to delete {}: {e}", meta.location)))?;
        }
        Ok(objects.len())
    }
}
