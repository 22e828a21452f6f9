use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures talking to the editor host. Graph building and layout never
/// fail; only the transport does.
#[derive(Debug, Error)]
pub enum HostError {
	#[error("editor host API is not available in this page")]
	Unavailable,
	#[error("could not encode panel message: {0}")]
	Encode(#[source] serde_json::Error),
	#[error("could not decode panel message: {0}")]
	Decode(#[source] serde_json::Error),
	#[error("host call failed: {0}")]
	Js(String),
}

impl From<JsValue> for HostError {
	fn from(value: JsValue) -> Self {
		HostError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}
