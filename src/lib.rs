//! Code-structure graph panel: turns an analyzer report into an interactive
//! force-directed graph inside an editor webview.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info};

pub mod components;
pub mod config;
pub mod error;
pub mod graph;
pub mod host;
mod pages;
pub mod protocol;

use crate::pages::panel::Panel;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Root view of the webview panel.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Code Structure Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Panel />
	}
}
