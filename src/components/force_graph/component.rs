use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::info;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::{ForceGraphState, Tooltip};
use super::types::node_style;
use crate::config::LayoutConfig;
use crate::graph::DisplayGraph;
use crate::protocol::Outbound;

/// Seconds per animation frame fed to the hover easing.
const FRAME_DT: f64 = 0.016;

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn pointer_position(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	ev: &MouseEvent,
) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn document_hidden() -> bool {
	web_sys::window()
		.and_then(|w| w.document())
		.is_some_and(|d| d.hidden())
}

/// Animation and resize callbacks of a mounted canvas. Dropping it cancels
/// the pending frame and detaches the resize listener.
struct FrameLoop {
	animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
	frame: Rc<Cell<Option<i32>>>,
	resize: Option<Closure<dyn FnMut()>>,
}

impl Drop for FrameLoop {
	fn drop(&mut self) {
		let window = web_sys::window();
		if let (Some(id), Some(win)) = (self.frame.take(), window.as_ref()) {
			let _ = win.cancel_animation_frame(id);
		}
		if let (Some(cb), Some(win)) = (self.resize.take(), window.as_ref()) {
			let _ = win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
		// breaks the frame closure's reference to itself
		self.animate.borrow_mut().take();
		info!("graph canvas stopped");
	}
}

#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<DisplayGraph>,
	#[prop(into)] config: Signal<LayoutConfig>,
	/// Every change resets zoom, pan and drag pins.
	#[prop(into)]
	reset: Signal<u32>,
	on_navigate: Callback<Outbound>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let tooltip = RwSignal::new(None::<Tooltip>);
	let state: Rc<RefCell<Option<ForceGraphState>>> = Rc::new(RefCell::new(None));
	let state_init = state.clone();

	// The returned loop lives as long as this effect, which is disposed with
	// the component.
	Effect::new(move |running: Option<Option<FrameLoop>>| {
		if let Some(Some(running)) = running {
			return Some(running);
		}
		let canvas = canvas_ref.get()?;
		let window = web_sys::window()?;

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())?;
		let mut initial = ForceGraphState::new(config.get_untracked(), w, h);
		data.with_untracked(|graph| initial.load(graph));
		*state_init.borrow_mut() = Some(initial);
		info!("graph canvas mounted at {w}x{h}");

		let resize = fullscreen.then(|| {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			let cb = Closure::<dyn FnMut()>::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			});
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			cb
		});

		let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
		let frame = Rc::new(Cell::new(None));
		let (state_anim, animate_inner, frame_inner) =
			(state_init.clone(), animate.clone(), frame.clone());
		*animate.borrow_mut() = Some(Closure::new(move || {
			if !document_hidden() {
				if let Some(ref mut s) = *state_anim.borrow_mut() {
					s.tick(FRAME_DT);
					render::render(s, &ctx);
				}
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				frame_inner.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let Some(ref cb) = *animate.borrow() {
			frame.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}

		Some(FrameLoop {
			animate,
			frame,
			resize,
		})
	});

	let state_data = state.clone();
	Effect::new(move |_| {
		data.with(|graph| {
			if let Some(ref mut s) = *state_data.borrow_mut() {
				info!("loading graph with {} nodes", graph.nodes.len());
				s.load(graph);
			}
		});
		tooltip.set(None);
	});

	let state_config = state.clone();
	Effect::new(move |_| {
		let next = config.get();
		if let Some(ref mut s) = *state_config.borrow_mut() {
			s.set_config(next);
		}
	});

	let state_reset = state.clone();
	Effect::new(move |prev: Option<u32>| {
		let generation = reset.get();
		if prev.is_some() {
			if let Some(ref mut s) = *state_reset.borrow_mut() {
				s.reset_view();
			}
		}
		generation
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		let (next, cursor) = {
			let mut guard = state_mm.borrow_mut();
			let Some(s) = guard.as_mut() else {
				return;
			};
			s.pointer_move(x, y);
			let cursor = if s.drag.active || s.pan.active {
				"grabbing"
			} else if s.hover.node.and_then(|i| s.sim.node(i)).is_some_and(|n| n.is_navigable()) {
				"pointer"
			} else {
				"grab"
			};
			(s.tooltip(), cursor)
		};
		if tooltip.get_untracked() != next {
			tooltip.set(next);
		}
		if let Some(canvas) = canvas_ref.get() {
			let _ = web_sys::HtmlElement::style(&canvas).set_property("cursor", cursor);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		let request = state_mu
			.borrow_mut()
			.as_mut()
			.and_then(|s| s.pointer_up(x, y));
		if let Some(request) = request {
			on_navigate.run(request);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
		tooltip.set(None);
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.zoom_at(x, y, ev.delta_y());
		}
		tooltip.set(None);
	};

	view! {
		<div class="force-graph" style="position: relative; width: 100%; height: 100%;">
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			{move || tooltip.get().map(|tip| view! { <NodeTooltip tip=tip /> })}
		</div>
	}
}

#[component]
fn NodeTooltip(tip: Tooltip) -> impl IntoView {
	let style = format!(
		"position: absolute; left: {}px; top: {}px; pointer-events: none;",
		tip.screen_x + 14.0,
		tip.screen_y + 14.0
	);
	let location = match tip.line {
		Some(line) => format!("{}:{line}", tip.file),
		None => tip.file.clone(),
	};
	view! {
		<div class="node-tooltip" style=style>
			<div class="node-tooltip-title">
				<span
					class="node-tooltip-swatch"
					style=format!("background: {};", node_style(tip.kind).fill)
				/>
				<strong>{tip.name}</strong>
				<span class="node-tooltip-kind">{node_style(tip.kind).label}</span>
			</div>
			<div>"File: " {location}</div>
			<div>"App: " {tip.app}</div>
			{tip.view.map(|target| view! { <div>"View: " {target}</div> })}
			{tip.parent.map(|parent| view! { <div>"Class: " {parent}</div> })}
		</div>
	}
}
