use std::time::SystemTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

/// One remote object as the store reported it. Fields the store did not
/// return stay `None` so "unknown" is distinguishable from "zero".
#[derive(Clone, Debug, PartialEq)]
pub struct RawObject {
    pub key: String,
    pub prefix: String,
    pub last_modified: Option<SystemTime>,
    pub e_tag: Option<String>,
    pub size: Option<i64>,
    pub mime_type: Option<String>,
    pub storage_class: Option<String>,
}

/// One page of a listing call.
#[derive(Clone, Debug, Default)]
pub struct Page {
    pub objects: Vec<RawObject>,
    pub prefixes: Vec<String>,
    pub next_token: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub path: String,
    pub parent: String,
    pub kind: EntryKind,
    pub size: Option<i64>,
    pub mime_type: Option<String>,
    pub last_modified: Option<SystemTime>,
    pub storage_class: Option<String>,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}
