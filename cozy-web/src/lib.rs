#![forbid(unsafe_code)]
//! Browser bindings for Cozy Block: a `localStorage` store, a `Date.now()`
//! clock, a console logger and the [`app::CozyApp`] facade the front end
//! drives.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod app;
pub mod clock;
pub mod dom;
pub mod logger;
pub mod storage;
pub mod ticker;

pub use app::CozyApp;
pub use clock::BrowserClock;
pub use storage::{WebStore, WebStoreError};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    logger::init(level);
}
