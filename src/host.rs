//! Webview side of the editor host bridge.

use std::cell::OnceCell;

use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::MessageEvent;

use crate::error::HostError;
use crate::protocol::{Inbound, Outbound};

#[wasm_bindgen]
extern "C" {
	type HostApi;

	#[wasm_bindgen(catch, js_name = acquireVsCodeApi)]
	fn acquire_host_api() -> Result<HostApi, JsValue>;

	#[wasm_bindgen(method, catch, js_name = postMessage)]
	fn post_message(this: &HostApi, message: &JsValue) -> Result<(), JsValue>;
}

thread_local! {
	// The host hands its API out once per page; later calls throw.
	static HOST_API: OnceCell<Option<HostApi>> = const { OnceCell::new() };
}

/// Outbound half of the panel transport.
pub trait HostPort {
	fn post(&self, message: &Outbound) -> Result<(), HostError>;
}

/// Posts through the webview's `acquireVsCodeApi()` handle.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebviewHost;

impl HostPort for WebviewHost {
	fn post(&self, message: &Outbound) -> Result<(), HostError> {
		let value = js_sys::JSON::parse(&message.to_json()?)?;
		HOST_API.with(|cell| {
			let api = cell.get_or_init(|| match acquire_host_api() {
				Ok(api) => Some(api),
				Err(err) => {
					warn!("no editor host API: {err:?}");
					None
				}
			});
			match api {
				Some(api) => api.post_message(&value).map_err(HostError::from),
				None => Err(HostError::Unavailable),
			}
		})
	}
}

/// Listens for host messages on `window` until dropped.
pub struct MessageListener {
	callback: Closure<dyn FnMut(MessageEvent)>,
}

impl MessageListener {
	pub fn attach(mut on_message: impl FnMut(Inbound) + 'static) -> Result<Self, HostError> {
		let window = web_sys::window().ok_or(HostError::Unavailable)?;
		let callback = Closure::<dyn FnMut(MessageEvent)>::new(move |ev: MessageEvent| {
			match decode(&ev) {
				Ok(message) => on_message(message),
				Err(err) => warn!("ignoring panel message: {err}"),
			}
		});
		window.add_event_listener_with_callback("message", callback.as_ref().unchecked_ref())?;
		Ok(Self { callback })
	}
}

impl Drop for MessageListener {
	fn drop(&mut self) {
		if let Some(window) = web_sys::window() {
			let _ = window.remove_event_listener_with_callback(
				"message",
				self.callback.as_ref().unchecked_ref(),
			);
		}
	}
}

fn decode(ev: &MessageEvent) -> Result<Inbound, HostError> {
	let data = ev.data();
	let text = match data.as_string() {
		Some(text) => text,
		None => js_sys::JSON::stringify(&data)?.into(),
	};
	Inbound::from_json(&text)
}
