//! # Stream Registry
//!
//! Path-keyed lookup of the active recording streams.
//!
//! The map is behind one `RwLock`: many readers route notifications while a
//! single writer starts, replaces or drops streams. Each stream has its own
//! `Mutex`, so edits to different files never contend on the map lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::stream::DocStream;

pub type SharedStream = Arc<Mutex<DocStream>>;

#[derive(Debug, Default)]
pub struct StreamRegistry {
    streams: RwLock<HashMap<String, SharedStream>>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<SharedStream> {
        self.streams.read().get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.streams.read().contains_key(path)
    }

    /// Get the stream for `path`, creating it with `create` if absent
    pub fn get_or_insert_with(
        &self,
        path: &str,
        create: impl FnOnce() -> DocStream,
    ) -> (SharedStream, bool) {
        // Fast path under the read lock
        if let Some(stream) = self.streams.read().get(path) {
            return (stream.clone(), false);
        }

        let mut streams = self.streams.write();

        // Another thread may have created it in between
        if let Some(stream) = streams.get(path) {
            return (stream.clone(), false);
        }

        let stream = Arc::new(Mutex::new(create()));
        streams.insert(path.to_string(), stream.clone());
        (stream, true)
    }

    /// Install `stream`, returning the one it replaces
    pub fn insert(&self, stream: DocStream) -> Option<SharedStream> {
        let path = stream.path().to_string();
        self.streams.write().insert(path, Arc::new(Mutex::new(stream)))
    }

    pub fn remove(&self, path: &str) -> Option<SharedStream> {
        self.streams.write().remove(path)
    }

    /// Every stream at this moment. The map lock is released on return.
    pub fn snapshot(&self) -> Vec<SharedStream> {
        self.streams.read().values().cloned().collect()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.streams.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Remove every stream, returning them
    pub fn drain(&self) -> Vec<SharedStream> {
        self.streams.write().drain().map(|(_, stream)| stream).collect()
    }

    pub fn len(&self) -> usize {
        self.streams.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.read().is_empty()
    }
}
