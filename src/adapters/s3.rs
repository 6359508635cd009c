use std::time::{Duration, SystemTime};

use aws_sdk_s3::{
    presigning::PresigningConfig,
    primitives::ByteStream,
    types::{Delete, ObjectCannedAcl, ObjectIdentifier, Permission},
};

use crate::{adapters, model, util};

const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

fn to_system_time(datetime: &aws_sdk_s3::primitives::DateTime) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::new(datetime.secs() as u64, datetime.subsec_nanos())
}

impl adapters::ObjectStore for aws_sdk_s3::Client {
    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Option<Vec<u8>>,
    ) -> Result<(), model::error::RemoteError> {
        let req = self
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body.unwrap_or_default()));

        util::poll::poll_until_ready_error(req.send()).map_err(|err| {
            model::error::RemoteError::new(format!("failed to put_object at: {}, {}", key, err))
        })?;

        Ok(())
    }

    fn get(
        &self,
        bucket: &str,
        key: &str,
        range: Option<(u64, u64)>,
    ) -> Result<Option<Vec<u8>>, model::error::RemoteError> {
        let mut req = self.get_object().bucket(bucket).key(key);

        if let Some((start, end)) = range {
            req = req.range(format!("bytes={}-{}", start, end));
        }

        let o = match util::poll::poll_until_ready_error(req.send()) {
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_no_such_key() {
                        return Ok(None);
                    }
                }

                return Err(model::error::RemoteError::new(format!(
                    "failed to get_object: {}, {}",
                    key, err
                )));
            }
            Ok(o) => o,
        };

        let bytes = util::poll::poll_until_ready_error(o.body.collect()).map_err(|err| {
            model::error::RemoteError::new(format!("failed to collect body: {}, {}", key, err))
        })?;

        Ok(Some(bytes.into_bytes().to_vec()))
    }

    fn head(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<model::entry::RawObject>, model::error::RemoteError> {
        let req = self.head_object().bucket(bucket).key(key);

        let ho = match util::poll::poll_until_ready_error(req.send()) {
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_not_found() {
                        return Ok(None);
                    }
                }

                return Err(model::error::RemoteError::new(format!(
                    "failed to head_object: {}, {}",
                    key, err
                )));
            }
            Ok(ho) => ho,
        };

        Ok(Some(model::entry::RawObject {
            key: key.to_string(),
            prefix: String::new(),
            last_modified: ho.last_modified().map(to_system_time),
            e_tag: ho.e_tag().map(str::to_string),
            size: ho.content_length(),
            mime_type: ho.content_type().map(str::to_string),
            storage_class: ho.storage_class().map(|sc| sc.as_str().to_string()),
        }))
    }

    fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<(), model::error::RemoteError> {
        let req = self
            .copy_object()
            .copy_source(format!("{}/{}", src_bucket, src_key))
            .bucket(dst_bucket)
            .key(dst_key);

        util::poll::poll_until_ready_error(req.send()).map_err(|err| {
            model::error::RemoteError::new(format!(
                "failed to copy_object to: {}, {}",
                dst_key, err
            ))
        })?;

        Ok(())
    }

    fn delete(&self, bucket: &str, key: &str) -> Result<(), model::error::RemoteError> {
        let req = self.delete_object().bucket(bucket).key(key);

        util::poll::poll_until_ready_error(req.send()).map_err(|err| {
            model::error::RemoteError::new(format!("failed to delete_object: {}, {}", key, err))
        })?;

        Ok(())
    }

    fn delete_many(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> Result<(), model::error::RemoteError> {
        let mut objects = Vec::new();
        for key in keys {
            let id = ObjectIdentifier::builder().key(key).build().map_err(|err| {
                model::error::RemoteError::new(format!(
                    "failed to build delete entry: {}, {}",
                    key, err
                ))
            })?;

            objects.push(id);
        }

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .build()
            .map_err(|err| {
                model::error::RemoteError::new(format!("failed to build delete_objects, {}", err))
            })?;

        let req = self.delete_objects().bucket(bucket).delete(delete);

        util::poll::poll_until_ready_error(req.send()).map_err(|err| {
            model::error::RemoteError::new(format!("failed to delete_objects, {}", err))
        })?;

        Ok(())
    }

    fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
        page_size: i32,
        token: Option<String>,
    ) -> Result<model::entry::Page, model::error::RemoteError> {
        let mut req = self
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .delimiter(delimiter)
            .max_keys(page_size);

        if let Some(tok) = token {
            req = req.continuation_token(tok);
        }

        let lo = util::poll::poll_until_ready_error(req.send()).map_err(|err| {
            model::error::RemoteError::new(format!("failed to list_objects at: {}, {}", prefix, err))
        })?;

        let mut objects = Vec::new();
        for o in lo.contents() {
            objects.push(model::entry::RawObject {
                key: o.key().unwrap_or("").to_string(),
                prefix: prefix.to_string(),
                last_modified: o.last_modified().map(to_system_time),
                e_tag: o.e_tag().map(str::to_string),
                size: o.size(),
                mime_type: None,
                storage_class: o.storage_class().map(|sc| sc.as_str().to_string()),
            });
        }

        let prefixes = lo
            .common_prefixes()
            .iter()
            .filter_map(|cp| cp.prefix().map(str::to_string))
            .collect();

        Ok(model::entry::Page {
            objects,
            prefixes,
            next_token: lo.next_continuation_token().map(str::to_string),
        })
    }

    fn get_acl(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<model::entry::Visibility>, model::error::RemoteError> {
        let req = self.get_object_acl().bucket(bucket).key(key);

        let acl = match util::poll::poll_until_ready_error(req.send()) {
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_no_such_key() {
                        return Ok(None);
                    }
                }

                return Err(model::error::RemoteError::new(format!(
                    "failed to get_object_acl: {}, {}",
                    key, err
                )));
            }
            Ok(acl) => acl,
        };

        for grant in acl.grants() {
            if grant.permission() != Some(&Permission::Read) {
                continue;
            }

            if let Some(grantee) = grant.grantee() {
                if grantee.uri() == Some(ALL_USERS_URI) {
                    return Ok(Some(model::entry::Visibility::Public));
                }
            }
        }

        Ok(Some(model::entry::Visibility::Private))
    }

    fn put_acl(
        &self,
        bucket: &str,
        key: &str,
        visibility: model::entry::Visibility,
    ) -> Result<(), model::error::RemoteError> {
        let canned = match visibility {
            model::entry::Visibility::Public => ObjectCannedAcl::PublicRead,
            model::entry::Visibility::Private => ObjectCannedAcl::Private,
        };

        let req = self.put_object_acl().bucket(bucket).key(key).acl(canned);

        util::poll::poll_until_ready_error(req.send()).map_err(|err| {
            model::error::RemoteError::new(format!("failed to put_object_acl: {}, {}", key, err))
        })?;

        Ok(())
    }

    fn sign_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, model::error::RemoteError> {
        let presigning = PresigningConfig::expires_in(expires_in).map_err(|err| {
            model::error::RemoteError::new(format!(
                "failed to build presigning config: {}, {}",
                key, err
            ))
        })?;

        let req = self.get_object().bucket(bucket).key(key).presigned(presigning);

        let presigned = util::poll::poll_until_ready_error(req).map_err(|err| {
            model::error::RemoteError::new(format!("failed to presign get_object: {}, {}", key, err))
        })?;

        Ok(presigned.uri().to_string())
    }

    fn bucket_exists(&self, bucket: &str) -> Result<bool, model::error::RemoteError> {
        let req = self.head_bucket().bucket(bucket);

        match util::poll::poll_until_ready_error(req.send()) {
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_not_found() {
                        return Ok(false);
                    }
                }

                Err(model::error::RemoteError::new(format!(
                    "failed to head_bucket: {}, {}",
                    bucket, err
                )))
            }
            Ok(_) => Ok(true),
        }
    }
}
