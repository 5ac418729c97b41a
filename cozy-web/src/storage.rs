//! `localStorage` binding for the engine's key-value store.

use cozy_core::KeyValueStore;
use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::dom;

#[derive(Debug, thiserror::Error)]
pub enum WebStoreError {
    #[error("localStorage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WebStoreError {
    fn from_js(value: &JsValue) -> Self {
        Self::Storage(dom::js_error_message(value))
    }
}

/// Key-value store over a browser `Storage` object. Values are stored as-is
/// under the `cozy_*` keys so they stay readable from dev tools.
#[derive(Debug, Clone)]
pub struct WebStore {
    storage: Storage,
}

impl WebStore {
    #[must_use]
    pub const fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Bind to the page's `localStorage`.
    ///
    /// # Errors
    /// Returns [`WebStoreError::Unavailable`] when the browser refuses access.
    pub fn local() -> Result<Self, WebStoreError> {
        dom::local_storage()
            .map(Self::new)
            .map_err(|err| WebStoreError::Unavailable(dom::js_error_message(&err)))
    }
}

impl KeyValueStore for WebStore {
    type Error = WebStoreError;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        self.storage
            .get_item(key)
            .map_err(|err| WebStoreError::from_js(&err))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.storage
            .set_item(key, value)
            .map_err(|err| WebStoreError::from_js(&err))
    }

    fn remove_item(&self, key: &str) -> Result<(), Self::Error> {
        self.storage
            .remove_item(key)
            .map_err(|err| WebStoreError::from_js(&err))
    }

    fn clear(&self) -> Result<(), Self::Error> {
        self.storage
            .clear()
            .map_err(|err| WebStoreError::from_js(&err))
    }
}
