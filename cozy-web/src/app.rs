//! JavaScript facade over [`CozyEngine`].
//!
//! Results cross the boundary as plain JSON-shaped objects; errors become
//! rejected calls carrying the error message.

use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::rc::Rc;

use cozy_core::{
    CozyEngine, CozyEvent, DURATION_PRESETS, OUTFITS, PollOutcome, STRATEGIES, SubscriptionId,
};
use js_sys::Function;
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;

use crate::clock::BrowserClock;
use crate::dom;
use crate::storage::WebStore;
use crate::ticker::MissionTicker;

type WebEngine = CozyEngine<WebStore, BrowserClock>;

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn js_err(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn call_listener(listener: &Function, payload: &JsValue) {
    if let Err(err) = listener.call1(&JsValue::NULL, payload) {
        log::warn!("listener threw: {}", dom::js_error_message(&err));
    }
}

/// Combine `Math.random()` and `Date.now()` into a drop-roll seed.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn mix_seed(random: f64, now_ms: f64) -> u64 {
    let high = (random.clamp(0.0, 1.0) * u32::MAX as f64) as u64;
    (high << 32) ^ (now_ms.max(0.0) as u64)
}

#[wasm_bindgen]
pub struct CozyApp {
    engine: Rc<WebEngine>,
    ticker: RefCell<Option<MissionTicker>>,
    wallet_connected: Cell<bool>,
}

#[wasm_bindgen]
impl CozyApp {
    /// Open the profile stored in this page's `localStorage`.
    ///
    /// # Errors
    /// Fails when `localStorage` is unavailable.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Self, JsValue> {
        let store = WebStore::local().map_err(js_err)?;
        let seed = mix_seed(js_sys::Math::random(), js_sys::Date::now());
        log::info!("cozy app ready");
        Ok(Self {
            engine: Rc::new(CozyEngine::new(store, BrowserClock, seed)),
            ticker: RefCell::new(None),
            wallet_connected: Cell::new(false),
        })
    }

    /// Mirror the wallet widget's connection state. Missions only start
    /// while connected.
    #[wasm_bindgen(js_name = setWalletConnected)]
    pub fn set_wallet_connected(&self, connected: bool) {
        self.wallet_connected.set(connected);
    }

    #[wasm_bindgen(js_name = walletConnected)]
    pub fn wallet_connected(&self) -> bool {
        self.wallet_connected.get()
    }

    #[wasm_bindgen(js_name = tickIntervalMs)]
    pub fn tick_interval_ms(&self) -> u32 {
        self.engine.config().tick_interval_ms
    }

    /// # Errors
    /// Fails if the snapshot cannot be converted.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.snapshot())
    }

    // Events ----------------------------------------------------------------

    /// Register `listener` for every engine event. Returns the id for
    /// [`CozyApp::unsubscribe`].
    pub fn subscribe(&self, listener: Function) -> u32 {
        self.engine
            .events()
            .subscribe(move |event: &CozyEvent| match to_js(event) {
                Ok(payload) => call_listener(&listener, &payload),
                Err(err) => log::warn!("dropping event {event:?}: {}", dom::js_error_message(&err)),
            })
            .get()
    }

    pub fn unsubscribe(&self, id: u32) -> bool {
        self.engine
            .events()
            .unsubscribe(SubscriptionId::from_raw(id))
    }

    // Missions --------------------------------------------------------------

    /// Start a mission, returning its start time in ms since the epoch.
    ///
    /// # Errors
    /// Fails without a connected wallet or for an unusable length.
    #[allow(clippy::cast_precision_loss)]
    #[wasm_bindgen(js_name = startMission)]
    pub fn start_mission(&self, minutes: Option<f64>) -> Result<f64, JsValue> {
        self.engine
            .start_mission(self.wallet_connected.get(), minutes)
            .map(|started| started as f64)
            .map_err(js_err)
    }

    /// # Errors
    /// Fails if completion cannot be persisted.
    pub fn poll(&self) -> Result<JsValue, JsValue> {
        let outcome = self.engine.poll().map_err(js_err)?;
        to_js(&outcome)
    }

    /// # Errors
    /// Fails if completion cannot be persisted.
    pub fn skip(&self) -> Result<bool, JsValue> {
        self.engine.skip().map_err(js_err)
    }

    /// Poll on the engine's tick interval, handing each outcome to `on_tick`.
    /// Stops by itself once the mission is no longer running. Replaces any
    /// previous watch.
    ///
    /// # Errors
    /// Fails if the interval cannot be scheduled.
    #[wasm_bindgen(js_name = watchMission)]
    pub fn watch_mission(&self, on_tick: Function) -> Result<(), JsValue> {
        self.stop_watch();
        let engine = Rc::clone(&self.engine);
        let ticker = MissionTicker::start(self.tick_interval_ms(), move || {
            let outcome = match engine.poll() {
                Ok(outcome) => outcome,
                Err(err) => {
                    log::error!("mission poll failed: {err}");
                    return false;
                }
            };
            match to_js(&outcome) {
                Ok(payload) => call_listener(&on_tick, &payload),
                Err(err) => log::warn!("tick not delivered: {}", dom::js_error_message(&err)),
            }
            matches!(outcome, PollOutcome::Running(_))
        })?;
        self.ticker.replace(Some(ticker));
        Ok(())
    }

    #[wasm_bindgen(js_name = stopWatch)]
    pub fn stop_watch(&self) {
        if let Some(ticker) = self.ticker.borrow_mut().take() {
            ticker.stop();
        }
    }

    // Rewards ---------------------------------------------------------------

    /// # Errors
    /// Fails unless a completed mission is waiting to be claimed.
    #[wasm_bindgen(js_name = claimRewards)]
    pub fn claim_rewards(&self) -> Result<JsValue, JsValue> {
        let summary = self.engine.claim_rewards().map_err(js_err)?;
        to_js(&summary)
    }

    /// # Errors
    /// Fails if the mission record cannot be written.
    #[wasm_bindgen(js_name = returnHome)]
    pub fn return_home(&self) -> Result<(), JsValue> {
        self.engine.return_home().map_err(js_err)
    }

    /// The outfit for the new-outfit modal, or `null`. Reading clears it.
    ///
    /// # Errors
    /// Fails if the slot cannot be cleared.
    #[wasm_bindgen(js_name = takePendingUnlock)]
    pub fn take_pending_unlock(&self) -> Result<JsValue, JsValue> {
        let outfit = self.engine.take_pending_unlock().map_err(js_err)?;
        to_js(&outfit)
    }

    /// # Errors
    /// Fails for unknown or locked outfits when `wear_now` is set.
    #[wasm_bindgen(js_name = acknowledgeUnlock)]
    pub fn acknowledge_unlock(&self, id: &str, wear_now: bool) -> Result<JsValue, JsValue> {
        let worn = self
            .engine
            .acknowledge_unlock(id, wear_now)
            .map_err(js_err)?;
        to_js(&worn)
    }

    // Closet and strategies -------------------------------------------------

    /// # Errors
    /// Fails for unknown, owned, reward-only or unaffordable outfits.
    #[wasm_bindgen(js_name = purchaseOutfit)]
    pub fn purchase_outfit(&self, id: &str) -> Result<JsValue, JsValue> {
        let outfit = self.engine.purchase_outfit(id).map_err(js_err)?;
        to_js(outfit)
    }

    /// # Errors
    /// Fails for unknown or locked outfits.
    #[wasm_bindgen(js_name = equipOutfit)]
    pub fn equip_outfit(&self, id: &str) -> Result<JsValue, JsValue> {
        let outfit = self.engine.equip_outfit(id).map_err(js_err)?;
        to_js(outfit)
    }

    /// # Errors
    /// Fails for unknown strategy ids.
    #[wasm_bindgen(js_name = selectStrategy)]
    pub fn select_strategy(&self, id: &str) -> Result<JsValue, JsValue> {
        let strategy = self.engine.select_strategy(id).map_err(js_err)?;
        to_js(strategy)
    }

    /// # Errors
    /// Fails if the store cannot be cleared.
    #[wasm_bindgen(js_name = resetDemo)]
    pub fn reset_demo(&self) -> Result<(), JsValue> {
        self.stop_watch();
        self.engine.reset_demo().map_err(js_err)
    }

    // Catalogs --------------------------------------------------------------

    /// # Errors
    /// Fails if the catalog cannot be converted.
    pub fn outfits() -> Result<JsValue, JsValue> {
        to_js(&OUTFITS[..])
    }

    /// # Errors
    /// Fails if the catalog cannot be converted.
    pub fn strategies() -> Result<JsValue, JsValue> {
        to_js(&STRATEGIES[..])
    }

    /// # Errors
    /// Fails if the presets cannot be converted.
    #[wasm_bindgen(js_name = durationPresets)]
    pub fn duration_presets() -> Result<JsValue, JsValue> {
        to_js(&DURATION_PRESETS[..])
    }
}
