//! In-memory blob store for finished GIFs.
//!
//! A successful conversion does not write anywhere. It registers the encoded
//! bytes in an [`ObjectStore`] and hands the caller an [`ObjectUrl`], which
//! the caller resolves with [`ObjectStore::get`] and drops with
//! [`ObjectStore::revoke`].

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::{Arc, RwLock};

use uuid::Uuid;

/// URL scheme prefix of every [`ObjectUrl`].
const URL_PREFIX: &str = "blob:clip2gif/";

/// A reference to bytes held in an [`ObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    /// The URL as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ObjectUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Registry mapping [`ObjectUrl`]s to immutable byte blobs.
///
/// # Example
///
/// ```
/// use clip2gif::ObjectStore;
///
/// let store = ObjectStore::new();
/// let url = store.create_object_url(b"GIF89a".to_vec());
/// assert_eq!(store.get(&url).as_deref(), Some(&b"GIF89a"[..]));
///
/// assert!(store.revoke(&url));
/// assert!(store.get(&url).is_none());
/// ```
#[derive(Debug, Default)]
pub struct ObjectStore {
    blobs: RwLock<HashMap<ObjectUrl, Arc<[u8]>>>,
}

impl ObjectStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` and return a fresh URL for them.
    pub fn create_object_url(&self, bytes: Vec<u8>) -> ObjectUrl {
        let url = ObjectUrl(format!("{URL_PREFIX}{}", Uuid::new_v4()));
        log::debug!("Registering {} bytes as {url}", bytes.len());
        self.blobs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(url.clone(), Arc::from(bytes));
        url
    }

    /// The bytes behind `url`, if it has not been revoked.
    pub fn get(&self, url: &ObjectUrl) -> Option<Arc<[u8]>> {
        self.blobs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(url)
            .cloned()
    }

    /// Forget `url`. Returns `true` if it was registered.
    pub fn revoke(&self, url: &ObjectUrl) -> bool {
        self.blobs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(url)
            .is_some()
    }

    /// Number of live blobs.
    pub fn len(&self) -> usize {
        self.blobs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Returns `true` if no blobs are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
