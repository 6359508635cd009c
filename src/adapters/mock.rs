use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};

use crate::{adapters, model};

#[derive(Clone)]
struct MockObject {
    body: Vec<u8>,
    last_modified: SystemTime,
}

/// In-memory store for tests and local wiring. Keys live in a sorted map so
/// `list_page` can reproduce the delimiter grouping and continuation-token
/// behavior of a real listing API: common prefixes are rolled up and emitted
/// exactly once across pages, and the token is the last key consumed.
#[derive(Clone, Default)]
pub struct MockStore {
    objects: Arc<Mutex<BTreeMap<String, MockObject>>>,
    acls: Arc<Mutex<HashMap<String, model::entry::Visibility>>>,
    listed_prefixes: Arc<Mutex<Vec<String>>>,
    fail_listing: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects(objects: &[(&str, usize)]) -> Self {
        let store = Self::new();
        for (key, size) in objects {
            store.seed(key, vec![0u8; *size]);
        }

        store
    }

    pub fn failing() -> Self {
        let mut store = Self::new();
        store.fail_listing = true;

        store
    }

    pub fn seed(&self, key: &str, body: Vec<u8>) {
        self.objects
            .lock()
            .expect("failed to acquire `objects` guard")
            .insert(
                key.to_string(),
                MockObject {
                    body,
                    last_modified: SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
                },
            );
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .expect("failed to acquire `objects` guard")
            .keys()
            .cloned()
            .collect()
    }

    /// Every prefix `list_page` has been asked for, in call order.
    pub fn listed_prefixes(&self) -> Vec<String> {
        self.listed_prefixes
            .lock()
            .expect("failed to acquire `listed_prefixes` guard")
            .clone()
    }

    fn raw_object(&self, key: &str, prefix: &str, object: &MockObject) -> model::entry::RawObject {
        model::entry::RawObject {
            key: key.to_string(),
            prefix: prefix.to_string(),
            last_modified: Some(object.last_modified),
            e_tag: Some(format!("\"{:x}\"", object.body.len())),
            size: Some(object.body.len() as i64),
            mime_type: None,
            storage_class: Some("Standard".to_string()),
        }
    }
}

impl adapters::ObjectStore for MockStore {
    fn put(
        &self,
        _bucket: &str,
        key: &str,
        body: Option<Vec<u8>>,
    ) -> Result<(), model::error::RemoteError> {
        self.seed(key, body.unwrap_or_default());

        Ok(())
    }

    fn get(
        &self,
        _bucket: &str,
        key: &str,
        range: Option<(u64, u64)>,
    ) -> Result<Option<Vec<u8>>, model::error::RemoteError> {
        let guard = self
            .objects
            .lock()
            .expect("failed to acquire `objects` guard");

        let object = match guard.get(key) {
            None => return Ok(None),
            Some(o) => o,
        };

        let bytes = match range {
            Some((start, end)) => {
                let start = start as usize;
                let end = (end as usize + 1).min(object.body.len());
                if start >= end {
                    Vec::new()
                } else {
                    object.body[start..end].to_vec()
                }
            }
            None => object.body.clone(),
        };

        Ok(Some(bytes))
    }

    fn head(
        &self,
        _bucket: &str,
        key: &str,
    ) -> Result<Option<model::entry::RawObject>, model::error::RemoteError> {
        let guard = self
            .objects
            .lock()
            .expect("failed to acquire `objects` guard");

        Ok(guard.get(key).map(|o| self.raw_object(key, "", o)))
    }

    fn copy(
        &self,
        _src_bucket: &str,
        src_key: &str,
        _dst_bucket: &str,
        dst_key: &str,
    ) -> Result<(), model::error::RemoteError> {
        let mut guard = self
            .objects
            .lock()
            .expect("failed to acquire `objects` guard");

        let object = match guard.get(src_key) {
            None => {
                return Err(model::error::RemoteError::new(format!(
                    "no such key: {}",
                    src_key
                )))
            }
            Some(o) => o.clone(),
        };

        guard.insert(dst_key.to_string(), object);

        Ok(())
    }

    fn delete(&self, _bucket: &str, key: &str) -> Result<(), model::error::RemoteError> {
        self.objects
            .lock()
            .expect("failed to acquire `objects` guard")
            .remove(key);

        Ok(())
    }

    fn delete_many(
        &self,
        _bucket: &str,
        keys: &[String],
    ) -> Result<(), model::error::RemoteError> {
        let mut guard = self
            .objects
            .lock()
            .expect("failed to acquire `objects` guard");

        for key in keys {
            guard.remove(key);
        }

        Ok(())
    }

    fn list_page(
        &self,
        _bucket: &str,
        prefix: &str,
        delimiter: &str,
        page_size: i32,
        token: Option<String>,
    ) -> Result<model::entry::Page, model::error::RemoteError> {
        self.listed_prefixes
            .lock()
            .expect("failed to acquire `listed_prefixes` guard")
            .push(prefix.to_string());

        if self.fail_listing {
            return Err(model::error::RemoteError::new(format!(
                "injected listing failure at: {}",
                prefix
            )));
        }

        let guard = self
            .objects
            .lock()
            .expect("failed to acquire `objects` guard");

        let keys: Vec<String> = guard
            .keys()
            .filter(|k| k.starts_with(prefix))
            .filter(|k| match &token {
                Some(tok) => k.as_str() > tok.as_str(),
                None => true,
            })
            .cloned()
            .collect();

        let mut objects = Vec::new();
        let mut prefixes = Vec::new();
        let mut next_token = None;
        let mut taken = 0usize;
        let mut i = 0usize;

        while i < keys.len() {
            if taken == page_size.max(1) as usize {
                next_token = Some(keys[i - 1].clone());
                break;
            }

            let key = &keys[i];
            let rest = &key[prefix.len()..];

            match rest.find(delimiter) {
                Some(pos) => {
                    // roll the whole group up into one common prefix
                    let group = format!("{}{}", prefix, &rest[..pos + delimiter.len()]);
                    while i < keys.len() && keys[i].starts_with(&group) {
                        i += 1;
                    }
                    prefixes.push(group);
                }
                None => {
                    objects.push(self.raw_object(key, prefix, &guard[key]));
                    i += 1;
                }
            }

            taken += 1;
        }

        Ok(model::entry::Page {
            objects,
            prefixes,
            next_token,
        })
    }

    fn get_acl(
        &self,
        _bucket: &str,
        key: &str,
    ) -> Result<Option<model::entry::Visibility>, model::error::RemoteError> {
        let objects = self
            .objects
            .lock()
            .expect("failed to acquire `objects` guard");

        if !objects.contains_key(key) {
            return Ok(None);
        }

        let acls = self.acls.lock().expect("failed to acquire `acls` guard");

        Ok(Some(
            acls.get(key)
                .copied()
                .unwrap_or(model::entry::Visibility::Private),
        ))
    }

    fn put_acl(
        &self,
        _bucket: &str,
        key: &str,
        visibility: model::entry::Visibility,
    ) -> Result<(), model::error::RemoteError> {
        self.acls
            .lock()
            .expect("failed to acquire `acls` guard")
            .insert(key.to_string(), visibility);

        Ok(())
    }

    fn sign_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, model::error::RemoteError> {
        Ok(format!(
            "https://{}.mock.example/{}?expires={}",
            bucket,
            key,
            expires_in.as_secs()
        ))
    }

    fn bucket_exists(&self, _bucket: &str) -> Result<bool, model::error::RemoteError> {
        Ok(true)
    }
}
