use leptos::prelude::*;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::components::force_graph::ForceGraphCanvas;
use crate::components::force_graph::types::node_style;
use crate::config::LayoutConfig;
use crate::graph::{DisplayGraph, NodeKind};
use crate::host::{HostPort, MessageListener, WebviewHost};
use crate::protocol::{self, Outbound, PanelUpdate};

fn post(message: Outbound, notice: RwSignal<Option<String>>) {
	if let Err(err) = WebviewHost.post(&message) {
		warn!("could not post {message:?}: {err}");
		notice.set(Some(format!("Editor host unreachable: {err}")));
	}
}

/// The whole webview: toolbar, legend and the graph canvas.
#[component]
pub fn Panel() -> impl IntoView {
	let graph = RwSignal::new(DisplayGraph::default());
	let config = RwSignal::new(LayoutConfig::default());
	let notice = RwSignal::new(None::<String>);
	let analyzing = RwSignal::new(true);
	let reset = RwSignal::new(0u32);

	// Runs once; the listener lives as long as this effect does.
	Effect::new(move |listener: Option<Option<MessageListener>>| {
		if let Some(listener) = listener {
			return listener;
		}
		let mut rng = StdRng::seed_from_u64(js_sys::Date::now() as u64);
		let attached = MessageListener::attach(move |message| {
			let update = config.with_untracked(|c| protocol::dispatch(message, c, &mut rng));
			match update {
				PanelUpdate::Show(next) => {
					info!("showing graph with {} nodes", next.nodes.len());
					analyzing.set(false);
					notice.set(None);
					graph.set(next);
				}
				PanelUpdate::Notify(message) => {
					analyzing.set(false);
					notice.set(Some(message));
				}
				PanelUpdate::Reconfigure(layout) => config.set(layout),
			}
		});
		match attached {
			Ok(listener) => {
				post(Outbound::Ready, notice);
				post(Outbound::Analyze, notice);
				Some(listener)
			}
			Err(err) => {
				warn!("panel cannot receive host messages: {err}");
				analyzing.set(false);
				notice.set(Some(format!("Cannot listen for the editor: {err}")));
				None
			}
		}
	});

	let refresh = move |_| {
		info!("requesting analysis");
		analyzing.set(true);
		post(Outbound::Analyze, notice);
	};
	let reset_view = move |_| reset.update(|generation| *generation = generation.wrapping_add(1));
	let on_navigate = Callback::new(move |request: Outbound| post(request, notice));

	let stats = move || {
		graph.with(|g| {
			let members = g
				.nodes
				.iter()
				.filter(|seeded| seeded.node.kind != NodeKind::Group)
				.count();
			format!("{members} nodes, {} links", g.links.len())
		})
	};

	view! {
		<div class="panel">
			<header class="panel-toolbar">
				<button on:click=refresh disabled=move || analyzing.get()>
					{move || if analyzing.get() { "Analyzing..." } else { "Refresh" }}
				</button>
				<button on:click=reset_view>"Reset view"</button>
				<span class="panel-stats">{stats}</span>
				<ul class="panel-legend">
					{NodeKind::ALL
						.iter()
						.map(|&kind| {
							let style = node_style(kind);
							view! {
								<li>
									<span
										class="legend-swatch"
										style=format!("background: {};", style.fill)
									/>
									{style.label}
								</li>
							}
						})
						.collect_view()}
				</ul>
			</header>
			{move || {
				notice
					.get()
					.map(|text| {
						view! {
							<div class="panel-notice">
								<span>{text}</span>
								<button on:click=move |_| notice.set(None)>"Dismiss"</button>
							</div>
						}
					})
			}}
			<div class="panel-body">
				{move || {
					graph
						.with(DisplayGraph::is_empty)
						.then(|| {
							view! {
								<p class="panel-empty">
									{move || {
										if analyzing.get() {
											"Analyzing project..."
										} else {
											"No classes, functions or routes found."
										}
									}}
								</p>
							}
						})
				}}
				<ForceGraphCanvas
					data=graph
					config=config
					reset=reset
					on_navigate=on_navigate
					fullscreen=true
				/>
			</div>
		</div>
	}
}
