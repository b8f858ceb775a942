//! Browsable file tree returned by a bundle fetch

use std::collections::BTreeMap;

use bytes::Bytes;

/// Flat map of slash-separated paths to file contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    files: BTreeMap<String, Bytes>,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, data: impl Into<Bytes>) {
        self.files.insert(normalize(path), data.into());
    }

    pub fn get(&self, path: &str) -> Option<&Bytes> {
        self.files.get(&normalize(path))
    }

    /// Leaf entries at any depth below `dir`, in path order
    pub fn files_under<'a>(&'a self, dir: &str) -> impl Iterator<Item = (&'a str, &'a Bytes)> + 'a {
        let prefix = match normalize(dir) {
            d if d.is_empty() => String::new(),
            d => format!("{d}/"),
        };
        self.files
            .iter()
            .filter(move |(path, _)| path.starts_with(&prefix))
            .map(|(path, data)| (path.as_str(), data))
    }

    /// Subtree below `dir`, keeping full paths
    pub fn subtree(&self, dir: &str) -> Self {
        Self {
            files: self
                .files_under(dir)
                .map(|(path, data)| (path.to_string(), data.clone()))
                .collect(),
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

pub(crate) fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
