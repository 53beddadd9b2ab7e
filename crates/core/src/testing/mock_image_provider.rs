//! Mock image provider for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::compose::ImageProvider;

/// Mock implementation of the [`ImageProvider`] trait. Returns configured
/// paths (empty by default, matching a failed search) and records queries.
#[derive(Default)]
pub struct MockImageProvider {
    paths: Mutex<Vec<PathBuf>>,
    queries: Mutex<Vec<String>>,
}

impl MockImageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_paths(&self, paths: Vec<PathBuf>) {
        *self.paths.lock().unwrap() = paths;
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn fetch(&self, query: &str, count: usize, _out_dir: &Path) -> Vec<PathBuf> {
        self.queries.lock().unwrap().push(query.to_string());
        let paths = self.paths.lock().unwrap();
        paths.iter().take(count).cloned().collect()
    }
}
