use std::collections::HashSet;

use log::debug;

use super::simulation::Simulation;
use crate::config::LayoutConfig;
use crate::graph::{DisplayGraph, NodeKind};
use crate::protocol::Outbound;

/// Extra pick slack around a node's radius, in graph units.
pub const HIT_SLOP: f64 = 4.0;
/// Pointer travel (screen px) below which a press counts as a click.
pub const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub moved: bool,
	was_pinned: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
	pub highlight_t: f64,
	pub prev_node: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
	delay_t: f64,
}

/// Overlay contents for the hovered node, anchored in screen space.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
	pub name: String,
	pub kind: NodeKind,
	pub file: String,
	pub app: String,
	pub view: Option<String>,
	pub parent: Option<String>,
	pub line: Option<u32>,
	pub screen_x: f64,
	pub screen_y: f64,
}

/// Pointer, view and hover state layered over the simulation.
pub struct ForceGraphState {
	pub sim: Simulation,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
	/// Nodes the user pinned by dragging; reset releases these.
	user_pins: HashSet<usize>,
}

impl ForceGraphState {
	pub fn new(config: LayoutConfig, width: f64, height: f64) -> Self {
		Self {
			sim: Simulation::new(config, (width / 2.0, height / 2.0)),
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			flow_time: 0.0,
			user_pins: HashSet::new(),
		}
	}

	/// Swaps in a fresh graph. Drag pins from the previous graph are gone.
	pub fn load(&mut self, graph: &DisplayGraph) {
		self.sim.load(graph);
		self.user_pins.clear();
		self.drag = DragState::default();
		self.hover = HoverState::default();
		debug!(
			"layout loaded {} nodes ({} groups), {} links",
			self.sim.len(),
			self.sim.group_count(),
			self.sim.links().len()
		);
	}

	pub fn set_config(&mut self, config: LayoutConfig) {
		let config = config.sanitized();
		self.transform.k = self.transform.k.clamp(config.min_zoom, config.max_zoom);
		self.sim.set_config(config);
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(
			gx * self.transform.k + self.transform.x,
			gy * self.transform.k + self.transform.y,
		)
	}

	/// Closest node under the pointer, if any.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found: Option<(usize, f64)> = None;
		for (idx, _, (x, y)) in self.sim.nodes() {
			let reach = self.sim.radius(idx).unwrap_or(0.0) + HIT_SLOP;
			let dist = ((x - gx).powi(2) + (y - gy).powi(2)).sqrt();
			if dist < reach && found.is_none_or(|(_, best)| dist < best) {
				found = Some((idx, dist));
			}
		}
		found.map(|(idx, _)| idx)
	}

	/// Starts a node drag or a background pan. Returns `true` for a node.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) -> bool {
		match self.node_at_position(sx, sy) {
			Some(idx) => {
				self.drag = DragState {
					active: true,
					node_idx: Some(idx),
					start_x: sx,
					start_y: sy,
					moved: false,
					was_pinned: self.sim.is_pinned(idx),
				};
				if let Some((x, y)) = self.sim.position(idx) {
					self.sim.set_pin(idx, x, y);
				}
				let energy = self.sim.config().drag_alpha_target;
				self.sim.set_alpha_target(energy);
				self.sim.reheat(energy);
				true
			}
			None => {
				self.pan = PanState {
					active: true,
					start_x: sx,
					start_y: sy,
					transform_start_x: self.transform.x,
					transform_start_y: self.transform.y,
				};
				false
			}
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if !self.drag.active {
			let hovered = self.node_at_position(sx, sy);
			self.set_hover(hovered);
		}

		if self.drag.active {
			let Some(idx) = self.drag.node_idx else {
				return;
			};
			if !self.drag.moved {
				let travel = (sx - self.drag.start_x).hypot(sy - self.drag.start_y);
				if travel < CLICK_SLOP {
					return;
				}
				self.drag.moved = true;
			}
			let (gx, gy) = self.screen_to_graph(sx, sy);
			self.sim.set_pin(idx, gx, gy);
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	/// Ends the current gesture. A press that never moved is a click and
	/// may produce a navigation request.
	pub fn pointer_up(&mut self, sx: f64, sy: f64) -> Option<Outbound> {
		self.pan.active = false;
		if !self.drag.active {
			return None;
		}
		let drag = std::mem::take(&mut self.drag);
		let idx = drag.node_idx?;

		if drag.moved {
			let (gx, gy) = self.screen_to_graph(sx, sy);
			self.finish_drag(idx, gx, gy);
			return None;
		}
		self.sim.set_alpha_target(0.0);
		if !drag.was_pinned {
			self.sim.clear_pin(idx);
		}
		self.click(idx)
	}

	/// Pointer left the canvas: a moved node keeps its last position.
	pub fn pointer_leave(&mut self) {
		let drag = std::mem::take(&mut self.drag);
		if let Some(idx) = drag.node_idx {
			match self.sim.position(idx) {
				Some((x, y)) if drag.moved => self.finish_drag(idx, x, y),
				_ => {
					self.sim.set_alpha_target(0.0);
					if !drag.was_pinned {
						self.sim.clear_pin(idx);
					}
				}
			}
		}
		self.pan.active = false;
		self.set_hover(None);
	}

	fn finish_drag(&mut self, idx: usize, gx: f64, gy: f64) {
		self.sim.set_pin(idx, gx, gy);
		if self.sim.node(idx).is_some_and(|n| n.kind != NodeKind::Group) {
			self.user_pins.insert(idx);
		}
		self.sim.set_alpha_target(0.0);
		self.sim.reheat(self.sim.config().drag_alpha_target);
	}

	/// Navigation request for a node, or `None` for groups and nodes
	/// without a file.
	pub fn click(&self, idx: usize) -> Option<Outbound> {
		let node = self.sim.node(idx)?;
		node.is_navigable()
			.then(|| Outbound::open_file(node.file.clone(), node.line))
	}

	/// Zooms about the pointer, keeping the point under it fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let config = self.sim.config();
		let new_k = (self.transform.k * factor).clamp(config.min_zoom, config.max_zoom);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Identity transform, drag pins released, layout re-energized.
	pub fn reset_view(&mut self) {
		self.transform = ViewTransform::default();
		for idx in self.user_pins.drain() {
			self.sim.clear_pin(idx);
		}
		self.sim.reheat(self.sim.config().reheat_alpha);
		debug!("view reset");
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			self.hover.neighbors.extend(self.sim.neighbors(idx));
		}
	}

	/// Overlay for the hovered node; groups have none.
	pub fn tooltip(&self) -> Option<Tooltip> {
		let idx = self.hover.node?;
		let node = self.sim.node(idx)?;
		if node.kind == NodeKind::Group {
			return None;
		}
		let (x, y) = self.sim.position(idx)?;
		let (screen_x, screen_y) = self.graph_to_screen(x, y);
		Some(Tooltip {
			name: node.name.clone(),
			kind: node.kind,
			file: node.file.clone(),
			app: node.app.clone(),
			view: node.view.clone(),
			parent: node.parent.clone(),
			line: node.line,
			screen_x,
			screen_y,
		})
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: usize) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f64) {
		self.sim.tick();
		self.flow_time += dt;

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.sim.set_center(width / 2.0, height / 2.0);
	}
}
