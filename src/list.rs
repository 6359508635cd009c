use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tracing::{info, span, Level};

use crate::{adapters, model, util};

pub const DELIMITER: &str = "/";
pub const DEFAULT_PAGE_SIZE: i32 = 30;

#[derive(Clone, Debug)]
pub struct ListRequest {
    pub bucket: String,
    pub prefix: String,
    pub recursive: bool,
    pub page_size: i32,
}

/// Flat result of one listing operation: every object discovered under the
/// walked prefixes, plus the sub-prefixes that were seen but not walked
/// (only populated for non-recursive requests).
#[derive(Clone, Debug, Default)]
pub struct Listing {
    pub objects: Vec<model::entry::RawObject>,
    pub prefixes: Vec<String>,
}

/// Cloneable cancellation handle. The lister checks it before every page
/// fetch and aborts with no partial results.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Pages through `request.prefix` and, when recursive, every discovered
/// sub-prefix, via an explicit worklist. The page loop terminates exactly
/// when the store returns no continuation token; a store that never does
/// violates the `ObjectStore` contract. Any page failure aborts the whole
/// listing.
pub fn list_all(
    store: &dyn adapters::ObjectStore,
    request: &ListRequest,
    cancel: &CancelFlag,
) -> Result<Listing, model::error::DiskError> {
    let span = span!(Level::INFO, "list_all", context = "list_all");
    let _e = span.enter();
    info!(prefix = %request.prefix, recursive = request.recursive, "called");

    let mut listing = Listing::default();
    let mut pending = vec![request.prefix.clone()];

    while let Some(prefix) = pending.pop() {
        let mut token: Option<String> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(model::error::DiskError::Cancelled {
                    prefix: request.prefix.clone(),
                });
            }

            let page = store
                .list_page(
                    &request.bucket,
                    &prefix,
                    DELIMITER,
                    request.page_size,
                    token,
                )
                .map_err(|err| model::error::DiskError::ListingFailed {
                    prefix: prefix.clone(),
                    source: err,
                })?;

            for mut object in page.objects {
                object.prefix = prefix.clone();
                listing.objects.push(object);
            }

            for sub in page.prefixes {
                if request.recursive {
                    pending.push(sub);
                } else {
                    listing.prefixes.push(sub);
                }
            }

            token = page.next_token;
            if token.is_none() {
                break;
            }
        }
    }

    Ok(listing)
}

/// Maps a raw object to an entry, stripping `strip_prefix` from the key.
/// A key ending with the delimiter is a directory marker: it keeps its
/// timestamp but never a size or mime type.
pub fn normalize_object(raw: &model::entry::RawObject, strip_prefix: &str) -> model::entry::Entry {
    let path = raw.key.strip_prefix(strip_prefix).unwrap_or(&raw.key);

    if path.ends_with(DELIMITER) {
        let path = path.trim_end_matches(DELIMITER).to_string();
        return model::entry::Entry {
            parent: util::path::parent(&path),
            path,
            kind: model::entry::EntryKind::Directory,
            size: None,
            mime_type: None,
            last_modified: raw.last_modified,
            storage_class: None,
        };
    }

    model::entry::Entry {
        path: path.to_string(),
        parent: util::path::parent(path),
        kind: model::entry::EntryKind::File,
        size: raw.size,
        mime_type: raw.mime_type.clone(),
        last_modified: raw.last_modified,
        storage_class: raw.storage_class.clone(),
    }
}

pub fn normalize_prefix(prefix: &str, strip_prefix: &str) -> model::entry::Entry {
    let path = prefix.strip_prefix(strip_prefix).unwrap_or(prefix);
    let path = path.trim_end_matches(DELIMITER).to_string();

    model::entry::Entry {
        parent: util::path::parent(&path),
        path,
        kind: model::entry::EntryKind::Directory,
        size: None,
        mime_type: None,
        last_modified: None,
        storage_class: None,
    }
}

/// Synthesizes the directory entries implied by every entry's parent chain,
/// exactly once each. Directories already present in the input are left
/// alone, so applying this twice is a no-op.
pub fn emulate_directories(mut entries: Vec<model::entry::Entry>) -> Vec<model::entry::Entry> {
    let mut seen: HashSet<String> = entries
        .iter()
        .filter(|e| e.kind == model::entry::EntryKind::Directory)
        .map(|e| e.path.clone())
        .collect();

    let mut synthesized = Vec::new();
    for entry in &entries {
        let mut dir = entry.parent.clone();

        while !dir.is_empty() && !seen.contains(&dir) {
            seen.insert(dir.clone());
            synthesized.push(model::entry::Entry {
                path: dir.clone(),
                parent: util::path::parent(&dir),
                kind: model::entry::EntryKind::Directory,
                size: None,
                mime_type: None,
                last_modified: None,
                storage_class: None,
            });

            dir = util::path::parent(&dir);
        }
    }

    entries.extend(synthesized);
    entries
}

/// Depth ascending, then lexicographic, so parents sort before children.
pub fn sort_entries(entries: &mut [model::entry::Entry]) {
    entries.sort_by(|a, b| {
        util::path::depth(&a.path)
            .cmp(&util::path::depth(&b.path))
            .then_with(|| a.path.cmp(&b.path))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockStore;

    fn request(prefix: &str, recursive: bool, page_size: i32) -> ListRequest {
        ListRequest {
            bucket: "dummy-bucket".to_string(),
            prefix: prefix.to_string(),
            recursive,
            page_size,
        }
    }

    fn raw(key: &str, size: Option<i64>) -> model::entry::RawObject {
        model::entry::RawObject {
            key: key.to_string(),
            prefix: String::new(),
            last_modified: None,
            e_tag: None,
            size,
            mime_type: None,
            storage_class: None,
        }
    }

    #[test]
    fn test_list_all_paginates_without_duplicates() {
        let store = MockStore::with_objects(&[
            ("a.txt", 1),
            ("b.txt", 1),
            ("c.txt", 1),
            ("d.txt", 1),
            ("e.txt", 1),
        ]);

        let cases = vec![1, 2, 3, 5, 30];

        for page_size in cases {
            let listing = list_all(&store, &request("", true, page_size), &CancelFlag::new())
                .expect("listing failed");

            let mut keys: Vec<String> = listing.objects.iter().map(|o| o.key.clone()).collect();
            keys.sort();
            keys.dedup();

            assert_eq!(keys.len(), 5, "failed for page size: {}", page_size);
        }
    }

    #[test]
    fn test_list_all_recursive_walks_sub_prefixes() {
        let store = MockStore::with_objects(&[("a/x", 1), ("a/b/y", 1)]);

        let listing = list_all(&store, &request("a/", true, 2), &CancelFlag::new())
            .expect("listing failed");

        let keys: Vec<&str> = listing.objects.iter().map(|o| o.key.as_str()).collect();
        assert!(keys.contains(&"a/x"), "missing a/x in: {:?}", keys);
        assert!(keys.contains(&"a/b/y"), "missing a/b/y in: {:?}", keys);
        assert!(listing.prefixes.is_empty());
    }

    #[test]
    fn test_list_all_non_recursive_fetches_start_prefix_only() {
        let store = MockStore::with_objects(&[("a/x", 1), ("a/b/y", 1), ("a/c/z", 1)]);

        let listing = list_all(&store, &request("a/", false, 30), &CancelFlag::new())
            .expect("listing failed");

        assert_eq!(store.listed_prefixes(), vec!["a/".to_string()]);
        assert_eq!(listing.objects.len(), 1);
        assert_eq!(listing.objects[0].key, "a/x");

        let mut prefixes = listing.prefixes.clone();
        prefixes.sort();
        assert_eq!(prefixes, vec!["a/b/".to_string(), "a/c/".to_string()]);
    }

    #[test]
    fn test_list_all_tags_discovery_prefix() {
        let store = MockStore::with_objects(&[("a/x", 1), ("a/b/y", 1)]);

        let listing = list_all(&store, &request("a/", true, 30), &CancelFlag::new())
            .expect("listing failed");

        for object in &listing.objects {
            let expected = if object.key == "a/x" { "a/" } else { "a/b/" };
            assert_eq!(object.prefix, expected, "failed for case: {}", object.key);
        }
    }

    #[test]
    fn test_list_all_empty_prefix_yields_empty_listing() {
        let store = MockStore::new();

        let listing = list_all(&store, &request("", true, 30), &CancelFlag::new())
            .expect("listing failed");

        assert!(listing.objects.is_empty());
        assert!(listing.prefixes.is_empty());
    }

    #[test]
    fn test_list_all_failure_aborts() {
        let store = MockStore::failing();

        let result = list_all(&store, &request("", true, 30), &CancelFlag::new());

        assert!(matches!(
            result,
            Err(model::error::DiskError::ListingFailed { .. })
        ));
    }

    #[test]
    fn test_list_all_cancelled_before_first_fetch() {
        let store = MockStore::with_objects(&[("a.txt", 1)]);
        let cancel = CancelFlag::new();
        cancel.cancel();

        let result = list_all(&store, &request("", true, 30), &cancel);

        assert!(matches!(
            result,
            Err(model::error::DiskError::Cancelled { .. })
        ));
        assert!(store.listed_prefixes().is_empty());
    }

    #[test]
    fn test_normalize_object() {
        let cases = vec![
            (
                "photos/2023/a.jpg",
                "",
                "photos/2023/a.jpg",
                "photos/2023",
                model::entry::EntryKind::File,
            ),
            ("logs/", "", "logs", "", model::entry::EntryKind::Directory),
            ("root/a/b.txt", "root/", "a/b.txt", "a", model::entry::EntryKind::File),
            ("file", "", "file", "", model::entry::EntryKind::File),
        ];

        for (key, strip, path, parent, kind) in cases {
            let entry = normalize_object(&raw(key, Some(1)), strip);

            assert_eq!(entry.path, path, "failed on `path` for case: {}", key);
            assert_eq!(entry.parent, parent, "failed on `parent` for case: {}", key);
            assert_eq!(entry.kind, kind, "failed on `kind` for case: {}", key);
        }
    }

    #[test]
    fn test_normalize_object_keeps_unknown_fields_unset() {
        let entry = normalize_object(&raw("file", None), "");
        assert_eq!(entry.size, None);
        assert_eq!(entry.mime_type, None);
        assert_eq!(entry.last_modified, None);

        let entry = normalize_object(&raw("file", Some(0)), "");
        assert_eq!(entry.size, Some(0));
    }

    #[test]
    fn test_normalize_object_directory_marker_drops_size() {
        let entry = normalize_object(&raw("logs/", Some(0)), "");

        assert_eq!(entry.kind, model::entry::EntryKind::Directory);
        assert_eq!(entry.size, None);
        assert_eq!(entry.mime_type, None);
    }

    #[test]
    fn test_normalize_prefix() {
        let cases = vec![
            ("logs/", "", "logs", ""),
            ("a/b/", "a/", "b", ""),
            ("a/b/", "", "a/b", "a"),
        ];

        for (prefix, strip, path, parent) in cases {
            let entry = normalize_prefix(prefix, strip);

            assert_eq!(entry.path, path, "failed on `path` for case: {}", prefix);
            assert_eq!(entry.parent, parent, "failed on `parent` for case: {}", prefix);
            assert_eq!(entry.kind, model::entry::EntryKind::Directory);
        }
    }

    #[test]
    fn test_emulate_directories_synthesizes_ancestors() {
        let entries = vec![normalize_object(&raw("docs/sub/b.txt", Some(1)), "")];

        let result = emulate_directories(entries);

        let mut dirs: Vec<&str> = result
            .iter()
            .filter(|e| e.is_dir())
            .map(|e| e.path.as_str())
            .collect();
        dirs.sort();

        assert_eq!(dirs, vec!["docs", "docs/sub"]);
    }

    #[test]
    fn test_emulate_directories_skips_present_directories() {
        let entries = vec![
            normalize_object(&raw("docs/", Some(0)), ""),
            normalize_object(&raw("docs/a.txt", Some(1)), ""),
        ];

        let result = emulate_directories(entries);

        let dirs: Vec<&model::entry::Entry> = result.iter().filter(|e| e.is_dir()).collect();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].path, "docs");
    }

    #[test]
    fn test_emulate_directories_idempotent() {
        let entries = vec![
            normalize_object(&raw("docs/a.txt", Some(1)), ""),
            normalize_object(&raw("docs/sub/b.txt", Some(2)), ""),
            normalize_object(&raw("other/c.txt", Some(3)), ""),
        ];

        let mut once = emulate_directories(entries);
        let mut twice = emulate_directories(once.clone());

        sort_entries(&mut once);
        sort_entries(&mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_sort_entries() {
        let mut entries = vec![
            normalize_object(&raw("docs/sub/b.txt", Some(1)), ""),
            normalize_object(&raw("docs/a.txt", Some(1)), ""),
            normalize_prefix("docs/", ""),
        ];

        sort_entries(&mut entries);

        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["docs", "docs/a.txt", "docs/sub/b.txt"]);
    }
}
