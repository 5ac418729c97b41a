//! Repeating `setInterval` timer that owns its callback.

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use crate::dom;

/// One active interval. The interval is cleared on [`MissionTicker::stop`]
/// or when the ticker is dropped.
pub struct MissionTicker {
    handle: Rc<Cell<Option<i32>>>,
    _closure: Closure<dyn FnMut()>,
}

impl MissionTicker {
    /// Call `on_tick` every `interval_ms` until it returns `false`.
    ///
    /// # Errors
    /// Returns an error if the interval cannot be scheduled.
    pub fn start<F>(interval_ms: u32, mut on_tick: F) -> Result<Self, JsValue>
    where
        F: FnMut() -> bool + 'static,
    {
        let timeout = i32::try_from(interval_ms)
            .map_err(|_| JsValue::from_str("tick interval out of range"))?;
        let handle: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let slot = Rc::clone(&handle);
        let closure = Closure::wrap(Box::new(move || {
            if !on_tick() {
                // The closure stays alive until the ticker is dropped.
                clear(&slot);
            }
        }) as Box<dyn FnMut()>);
        let id = dom::window()?.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            timeout,
        )?;
        handle.set(Some(id));
        log::debug!("ticker {id} started every {interval_ms} ms");
        Ok(Self {
            handle,
            _closure: closure,
        })
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.get().is_some()
    }

    pub fn stop(&self) {
        clear(&self.handle);
    }
}

fn clear(handle: &Cell<Option<i32>>) {
    if let Some(id) = handle.take()
        && let Ok(window) = dom::window()
    {
        window.clear_interval_with_handle(id);
        log::debug!("ticker {id} stopped");
    }
}

impl Drop for MissionTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
