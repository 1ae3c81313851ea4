//! One index per caller-supplied context
//!
//! A host that serves several data roots keeps one [`IndexRegistry`] and
//! asks it for the index belonging to each context token. Indexes are
//! opened on first request and closed explicitly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::errors::{IndexError, IndexResult};
use super::facade::FilesystemIndex;
use crate::config::IndexConfig;
use crate::record::RecordDecoder;

#[derive(Default)]
pub struct IndexRegistry {
    indexes: Mutex<HashMap<String, Arc<FilesystemIndex>>>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<FilesystemIndex>>> {
        self.indexes.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// The open index for `token`, opening one with `config` if there is
    /// none or the previous one was closed.
    ///
    /// An existing index is returned as is; `config` and `decoder` are then
    /// unused.
    ///
    /// # Errors
    ///
    /// `IndexError::Config` if another open context already uses the same
    /// index directory (opening would delete its buckets), otherwise any
    /// error from [`FilesystemIndex::open`].
    pub fn open_or_get(
        &self,
        token: &str,
        config: IndexConfig,
        decoder: Arc<dyn RecordDecoder>,
    ) -> IndexResult<Arc<FilesystemIndex>> {
        let mut indexes = self.lock();
        if let Some(index) = indexes.get(token) {
            if !index.is_closed() {
                return Ok(Arc::clone(index));
            }
        }

        let clash = indexes.iter().find(|(other, index)| {
            other.as_str() != token
                && !index.is_closed()
                && index.config().index_dir == config.index_dir
        });
        if let Some((other, _)) = clash {
            return Err(IndexError::Config(format!(
                "index_dir {} is already used by context '{}'",
                config.index_dir.display(),
                other
            )));
        }

        let index = Arc::new(FilesystemIndex::open(config, decoder)?);
        indexes.insert(token.to_string(), Arc::clone(&index));
        Ok(index)
    }

    /// The open index for `token`, if any
    pub fn get(&self, token: &str) -> Option<Arc<FilesystemIndex>> {
        self.lock()
            .get(token)
            .filter(|index| !index.is_closed())
            .cloned()
    }

    /// Close and forget the index for `token`. Returns whether there was one.
    ///
    /// Holders of the `Arc` see `IndexError::Closed` from then on.
    pub fn close(&self, token: &str) -> bool {
        let removed = self.lock().remove(token);
        match removed {
            Some(index) => {
                index.close();
                true
            }
            None => false,
        }
    }

    pub fn close_all(&self) {
        let drained: Vec<_> = self.lock().drain().map(|(_, index)| index).collect();
        for index in drained {
            index.close();
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for IndexRegistry {
    fn drop(&mut self) {
        self.close_all();
    }
}
