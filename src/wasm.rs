use wasm_bindgen::prelude::*;

use crate::notify::EventLog;
use crate::persist::SavedGame;
use crate::session::{Session, SessionState};
use crate::settings::Settings;
use crate::types::Color;

/// The computer thinks synchronously inside the calling method.
#[wasm_bindgen]
pub struct WasmSession {
    inner: Session<EventLog>,
}

#[wasm_bindgen]
impl WasmSession {
    #[wasm_bindgen(constructor)]
    pub fn new(
        strength: u8,
        competitive: bool,
        human_plays_first: bool,
    ) -> Result<WasmSession, JsError> {
        let settings = Settings {
            strength,
            competitive,
            human_color: if human_plays_first { Color::A } else { Color::B },
        };
        let inner = Session::new(settings, EventLog::new()).map_err(to_js)?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(js_name = newGame)]
    pub fn new_game(&mut self) -> Result<(), JsError> {
        self.inner.new_game().map_err(to_js)
    }

    /// Plays a human chip and lets the computer answer.
    #[wasm_bindgen(js_name = humanMove)]
    pub fn human_move(&mut self, row: i8, col: i8) -> Result<(), JsError> {
        self.inner.human_move(row, col).map_err(to_js)
    }

    #[wasm_bindgen(js_name = computerMove)]
    pub fn computer_move(&mut self) -> Result<(), JsError> {
        self.inner.computer_move().map_err(to_js)
    }

    /// Returns the hinted square as `row * 8 + col`, or -1 when blocked.
    pub fn hint(&mut self) -> Result<i32, JsError> {
        let mv = self.inner.request_hint().map_err(to_js)?;
        Ok(mv.square().map_or(-1, |square| square as i32))
    }

    #[wasm_bindgen(js_name = dismissHint)]
    pub fn dismiss_hint(&mut self) {
        self.inner.dismiss_hint();
    }

    pub fn undo(&mut self) -> Result<bool, JsError> {
        self.inner.undo().map_err(to_js)
    }

    pub fn interrupt(&self) {
        self.inner.interrupt();
    }

    pub fn resume(&mut self) -> Result<(), JsError> {
        self.inner.resume().map_err(to_js)
    }

    #[wasm_bindgen(js_name = switchSides)]
    pub fn switch_sides(&mut self) -> Result<(), JsError> {
        self.inner.switch_sides().map_err(to_js)
    }

    #[wasm_bindgen(js_name = setStrength)]
    pub fn set_strength(&mut self, level: u8) {
        self.inner.set_strength(level);
    }

    #[wasm_bindgen(js_name = setCompetitive)]
    pub fn set_competitive(&mut self, competitive: bool) {
        self.inner.set_competitive(competitive);
    }

    /// Applies a JSON settings object.
    #[wasm_bindgen(js_name = applySettings)]
    pub fn apply_settings(&mut self, json: &str) -> Result<(), JsError> {
        let settings = Settings::from_json(json).map_err(to_js)?;
        self.inner.apply_settings(&settings).map_err(to_js)
    }

    #[wasm_bindgen(js_name = isThinking)]
    pub fn is_thinking(&self) -> bool {
        self.inner.state() == SessionState::Thinking
    }

    #[wasm_bindgen(js_name = isInterrupted)]
    pub fn is_interrupted(&self) -> bool {
        self.inner.state() == SessionState::Interrupted
    }

    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.inner.state() == SessionState::GameOver
    }

    /// Board, counters and last changes as a plain object.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.view())?)
    }

    #[wasm_bindgen(js_name = scoreReport)]
    pub fn score_report(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.score_report())?)
    }

    /// Events since the last call, oldest first.
    #[wasm_bindgen(js_name = takeEvents)]
    pub fn take_events(&mut self) -> Result<JsValue, JsValue> {
        let events = self.inner.sink_mut().drain();
        Ok(serde_wasm_bindgen::to_value(&events)?)
    }

    pub fn save(&self) -> Result<String, JsError> {
        self.inner.save().to_json().map_err(to_js)
    }

    pub fn restore(&mut self, json: &str) -> Result<(), JsError> {
        let saved = SavedGame::from_json(json).map_err(to_js)?;
        self.inner.restore(&saved).map_err(to_js)
    }
}

fn to_js(err: impl std::error::Error) -> JsError {
    JsError::new(&err.to_string())
}
