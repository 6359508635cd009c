use std::time::{Duration, SystemTime};

use tracing::{info, span, Level};

use crate::{adapters, config, list, model, util};

pub const DEFAULT_SIGN_TTL_SECS: u64 = 600;

/// Filesystem-style surface over one bucket of an object store. Owns no
/// state beyond the bucket name, an optional root prefix and the injected
/// client; every method is a delegation, with `list_contents` and
/// `delete_dir` routed through the listing pipeline.
pub struct OssDisk {
    store: Box<dyn adapters::ObjectStore>,
    bucket: String,
    root: String,
    cancel: list::CancelFlag,
}

impl OssDisk {
    pub fn new(store: Box<dyn adapters::ObjectStore>, bucket: &str) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
            root: String::new(),
            cancel: list::CancelFlag::new(),
        }
    }

    pub fn from_config(config: &config::DiskConfig) -> Self {
        Self::new(Box::new(config.client()), &config.bucket)
    }

    pub fn with_root(mut self, root: &str) -> Self {
        self.root = util::path::normalize_root(root);
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Handle for aborting an in-flight `list_contents`/`delete_dir` from
    /// another thread.
    pub fn cancel_handle(&self) -> list::CancelFlag {
        self.cancel.clone()
    }

    fn key(&self, path: &str) -> String {
        util::path::join_root(&self.root, path)
    }

    pub fn write(&self, path: &str, contents: &[u8]) -> model::error::Result<()> {
        let span = span!(Level::INFO, "write", context = "write");
        let _e = span.enter();
        info!(path = path, size = contents.len(), "called");

        let key = self.key(path);
        self.store
            .put(&self.bucket, &key, Some(contents.to_vec()))
            .map_err(|err| model::error::DiskError::OperationFailed {
                op: "put_object",
                key,
                source: err,
            })
    }

    pub fn read(&self, path: &str) -> model::error::Result<Vec<u8>> {
        let span = span!(Level::INFO, "read", context = "read");
        let _e = span.enter();
        info!(path = path, "called");

        let key = self.key(path);
        let bytes = self
            .store
            .get(&self.bucket, &key, None)
            .map_err(|err| model::error::DiskError::OperationFailed {
                op: "get_object",
                key: key.clone(),
                source: err,
            })?;

        bytes.ok_or(model::error::DiskError::NotFound { key })
    }

    pub fn read_range(&self, path: &str, start: u64, end: u64) -> model::error::Result<Vec<u8>> {
        let span = span!(Level::INFO, "read_range", context = "read_range");
        let _e = span.enter();
        info!(path = path, start = start, end = end, "called");

        let key = self.key(path);
        let bytes = self
            .store
            .get(&self.bucket, &key, Some((start, end)))
            .map_err(|err| model::error::DiskError::OperationFailed {
                op: "get_object",
                key: key.clone(),
                source: err,
            })?;

        bytes.ok_or(model::error::DiskError::NotFound { key })
    }

    pub fn delete(&self, path: &str) -> model::error::Result<()> {
        let span = span!(Level::INFO, "delete", context = "delete");
        let _e = span.enter();
        info!(path = path, "called");

        let key = self.key(path);
        self.store
            .delete(&self.bucket, &key)
            .map_err(|err| model::error::DiskError::OperationFailed {
                op: "delete_object",
                key,
                source: err,
            })
    }

    pub fn copy(&self, src: &str, dst: &str) -> model::error::Result<()> {
        let span = span!(Level::INFO, "copy", context = "copy");
        let _e = span.enter();
        info!(src = src, dst = dst, "called");

        let src_key = self.key(src);
        let dst_key = self.key(dst);
        self.store
            .copy(&self.bucket, &src_key, &self.bucket, &dst_key)
            .map_err(|err| model::error::DiskError::OperationFailed {
                op: "copy_object",
                key: dst_key,
                source: err,
            })
    }

    pub fn rename(&self, src: &str, dst: &str) -> model::error::Result<()> {
        let span = span!(Level::INFO, "rename", context = "rename");
        let _e = span.enter();
        info!(src = src, dst = dst, "called");

        self.copy(src, dst)?;
        self.delete(src)
    }

    pub fn create_dir(&self, dirname: &str) -> model::error::Result<()> {
        let span = span!(Level::INFO, "create_dir", context = "create_dir");
        let _e = span.enter();
        info!(dirname = dirname, "called");

        let key = util::path::as_dir_prefix(&self.key(dirname));
        self.store
            .put(&self.bucket, &key, None)
            .map_err(|err| model::error::DiskError::OperationFailed {
                op: "put_object",
                key,
                source: err,
            })
    }

    /// Deletes everything under `dirname` plus its marker, in one batch.
    /// All-or-nothing: a listing failure aborts before anything is deleted.
    pub fn delete_dir(&self, dirname: &str) -> model::error::Result<()> {
        let span = span!(Level::INFO, "delete_dir", context = "delete_dir");
        let _e = span.enter();
        info!(dirname = dirname, "called");

        let marker = util::path::as_dir_prefix(&self.key(dirname));
        let request = list::ListRequest {
            bucket: self.bucket.clone(),
            prefix: marker.clone(),
            recursive: true,
            page_size: list::DEFAULT_PAGE_SIZE,
        };

        let listing = list::list_all(self.store.as_ref(), &request, &self.cancel)?;

        let mut keys: Vec<String> = listing.objects.into_iter().map(|o| o.key).collect();
        if !keys.contains(&marker) {
            keys.push(marker.clone());
        }

        self.store
            .delete_many(&self.bucket, &keys)
            .map_err(|err| model::error::DiskError::OperationFailed {
                op: "delete_objects",
                key: marker,
                source: err,
            })
    }

    pub fn exists(&self, path: &str) -> model::error::Result<bool> {
        let span = span!(Level::INFO, "exists", context = "exists");
        let _e = span.enter();
        info!(path = path, "called");

        let key = self.key(path);
        let head = self
            .store
            .head(&self.bucket, &key)
            .map_err(|err| model::error::DiskError::OperationFailed {
                op: "head_object",
                key,
                source: err,
            })?;

        Ok(head.is_some())
    }

    /// Lists `directory`, normalizes every object and unwalked sub-prefix,
    /// fills in the implied directories and returns the entries sorted
    /// parent-before-child.
    pub fn list_contents(
        &self,
        directory: &str,
        recursive: bool,
    ) -> model::error::Result<Vec<model::entry::Entry>> {
        let span = span!(Level::INFO, "list_contents", context = "list_contents");
        let _e = span.enter();
        info!(directory = directory, recursive = recursive, "called");

        let request = list::ListRequest {
            bucket: self.bucket.clone(),
            prefix: util::path::as_dir_prefix(&self.key(directory)),
            recursive,
            page_size: list::DEFAULT_PAGE_SIZE,
        };

        let listing = list::list_all(self.store.as_ref(), &request, &self.cancel)?;

        let mut entries: Vec<model::entry::Entry> = listing
            .objects
            .iter()
            .map(|o| list::normalize_object(o, &self.root))
            .collect();
        for prefix in &listing.prefixes {
            entries.push(list::normalize_prefix(prefix, &self.root));
        }

        let mut entries = list::emulate_directories(entries);
        entries.retain(|e| !e.path.is_empty());
        list::sort_entries(&mut entries);

        Ok(entries)
    }

    pub fn metadata(&self, path: &str) -> model::error::Result<model::entry::Entry> {
        let span = span!(Level::INFO, "metadata", context = "metadata");
        let _e = span.enter();
        info!(path = path, "called");

        let key = self.key(path);
        let head = self
            .store
            .head(&self.bucket, &key)
            .map_err(|err| model::error::DiskError::OperationFailed {
                op: "head_object",
                key: key.clone(),
                source: err,
            })?;

        match head {
            None => Err(model::error::DiskError::NotFound { key }),
            Some(raw) => Ok(list::normalize_object(&raw, &self.root)),
        }
    }

    pub fn file_size(&self, path: &str) -> model::error::Result<Option<i64>> {
        Ok(self.metadata(path)?.size)
    }

    pub fn mime_type(&self, path: &str) -> model::error::Result<Option<String>> {
        Ok(self.metadata(path)?.mime_type)
    }

    pub fn last_modified(&self, path: &str) -> model::error::Result<Option<SystemTime>> {
        Ok(self.metadata(path)?.last_modified)
    }

    pub fn visibility(&self, path: &str) -> model::error::Result<model::entry::Visibility> {
        let span = span!(Level::INFO, "visibility", context = "visibility");
        let _e = span.enter();
        info!(path = path, "called");

        let key = self.key(path);
        let visibility = self
            .store
            .get_acl(&self.bucket, &key)
            .map_err(|err| model::error::DiskError::OperationFailed {
                op: "get_object_acl",
                key: key.clone(),
                source: err,
            })?;

        visibility.ok_or(model::error::DiskError::NotFound { key })
    }

    pub fn set_visibility(
        &self,
        path: &str,
        visibility: model::entry::Visibility,
    ) -> model::error::Result<()> {
        let span = span!(Level::INFO, "set_visibility", context = "set_visibility");
        let _e = span.enter();
        info!(path = path, visibility = visibility.as_str(), "called");

        let key = self.key(path);
        self.store
            .put_acl(&self.bucket, &key, visibility)
            .map_err(|err| model::error::DiskError::OperationFailed {
                op: "put_object_acl",
                key,
                source: err,
            })
    }

    pub fn signed_url(&self, path: &str, ttl: Duration) -> model::error::Result<String> {
        let span = span!(Level::INFO, "signed_url", context = "signed_url");
        let _e = span.enter();
        info!(path = path, ttl_secs = ttl.as_secs(), "called");

        let key = self.key(path);
        self.store
            .sign_url(&self.bucket, &key, ttl)
            .map_err(|err| model::error::DiskError::OperationFailed {
                op: "presign_get_object",
                key,
                source: err,
            })
    }

    pub fn bucket_exists(&self) -> model::error::Result<bool> {
        let span = span!(Level::INFO, "bucket_exists", context = "bucket_exists");
        let _e = span.enter();
        info!(bucket = %self.bucket, "called");

        self.store
            .bucket_exists(&self.bucket)
            .map_err(|err| model::error::DiskError::OperationFailed {
                op: "head_bucket",
                key: self.bucket.clone(),
                source: err,
            })
    }
}
