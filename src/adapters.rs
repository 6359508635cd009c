use std::time::Duration;

use crate::model;

pub mod mock;
pub mod s3;

/// Object store client behind the disk. `list_page` is the remote listing
/// call the lister pages through; everything else is single-object
/// delegation. `get`, `head` and `get_acl` report a missing key as
/// `Ok(None)` so callers can tell "not found" from a transient failure.
pub trait ObjectStore {
    fn put(&self, bucket: &str, key: &str, body: Option<Vec<u8>>)
        -> Result<(), model::error::RemoteError>;

    fn get(
        &self,
        bucket: &str,
        key: &str,
        range: Option<(u64, u64)>,
    ) -> Result<Option<Vec<u8>>, model::error::RemoteError>;

    fn head(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<model::entry::RawObject>, model::error::RemoteError>;

    fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<(), model::error::RemoteError>;

    fn delete(&self, bucket: &str, key: &str) -> Result<(), model::error::RemoteError>;

    fn delete_many(&self, bucket: &str, keys: &[String])
        -> Result<(), model::error::RemoteError>;

    fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
        page_size: i32,
        token: Option<String>,
    ) -> Result<model::entry::Page, model::error::RemoteError>;

    fn get_acl(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<model::entry::Visibility>, model::error::RemoteError>;

    fn put_acl(
        &self,
        bucket: &str,
        key: &str,
        visibility: model::entry::Visibility,
    ) -> Result<(), model::error::RemoteError>;

    fn sign_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, model::error::RemoteError>;

    fn bucket_exists(&self, bucket: &str) -> Result<bool, model::error::RemoteError>;
}
