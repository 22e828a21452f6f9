use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::simulation::BoundLink;
use super::state::ForceGraphState;
use super::types::{link_rgb, node_style};
use crate::graph::{LinkKind, NodeKind};

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_groups(state, ctx);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

/// Group anchors sit underneath everything else as soft discs.
fn draw_groups(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	for (idx, node, (x, y)) in state.sim.nodes() {
		if node.kind != NodeKind::Group {
			continue;
		}
		let radius = state.sim.radius(idx).unwrap_or(0.0);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str("rgba(127, 127, 127, 0.18)");
		ctx.fill();
		ctx.set_stroke_style_str("rgba(200, 200, 220, 0.5)");
		ctx.set_line_width(1.5 / k);
		ctx.stroke();

		ctx.set_fill_style_str("rgba(230, 230, 240, 0.9)");
		ctx.set_font(&format!("bold {}px sans-serif", 12.0 / k.max(0.5)));
		ctx.set_text_align("center");
		let _ = ctx.fill_text(&node.name, x, y + radius + 14.0 / k.max(0.5));
		ctx.set_text_align("start");
	}
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, dash, gap, arrow_size) = (1.5 / k, 8.0 / k, 4.0 / k, 8.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);

	for link in state.sim.links() {
		let (Some((x1, y1)), Some((x2, y2))) = (
			state.sim.position(link.source),
			state.sim.position(link.target),
		) else {
			continue;
		};
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		let is_highlighted =
			state.is_highlighted(link.source) && state.is_highlighted(link.target);
		let base = if link.kind.is_grouping() { 0.18 } else { 0.6 };

		// t=0: all edges at base, t=1: highlighted brighten, others dim
		let (edge_alpha, arrow_alpha, width) = if is_highlighted {
			(base + (0.9 - base) * t, 0.8 + 0.1 * t, line_width * (1.0 + 0.3 * t))
		} else {
			(base * (1.0 - 0.75 * t), 0.8 - 0.45 * t, line_width * (1.0 - 0.3 * t))
		};
		let rgb = link_rgb(link.kind);
		let (r1, r2) = endpoint_radii(state, link);

		ctx.set_stroke_style_str(&format!("rgba({rgb}, {edge_alpha})"));
		ctx.set_line_width(width);
		if link.kind == LinkKind::RoutesTo {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(dash_offset);
		} else {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		let (ux, uy) = (dx / dist, dy / dist);
		let directed = !link.kind.is_grouping();
		let tail = if directed { r2 + arrow_size } else { r2 };
		ctx.begin_path();
		ctx.move_to(x1 + ux * r1, y1 + uy * r1);
		ctx.line_to(x2 - ux * tail, y2 - uy * tail);
		ctx.stroke();

		if !directed {
			continue;
		}
		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(&format!("rgba({rgb}, {arrow_alpha})"));
		let (tip_x, tip_y) = (x2 - ux * r2, y2 - uy * r2);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn endpoint_radii(state: &ForceGraphState, link: &BoundLink) -> (f64, f64) {
	(
		state.sim.radius(link.source).unwrap_or(0.0),
		state.sim.radius(link.target).unwrap_or(0.0),
	)
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);
	let font = format!("{}px sans-serif", 10.0 / k.max(0.5));

	for (idx, node, (x, y)) in state.sim.nodes() {
		if node.kind == NodeKind::Group || (has_highlight && state.is_highlighted(idx)) {
			continue;
		}
		let base = state.sim.radius(idx).unwrap_or(0.0);
		let (alpha, radius) = (1.0 - 0.7 * t, base * (1.0 - 0.15 * t));

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node_style(node.kind).fill);
		ctx.fill();
		ctx.set_global_alpha(1.0);

		// methods crowd their class; only label them once zoomed in
		if node.kind != NodeKind::Method || k >= 1.5 {
			ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha * 0.8));
			ctx.set_font(&font);
			let _ = ctx.fill_text(&node.name, x + radius + 3.0, y + 3.0);
		}
	}

	if !has_highlight {
		return;
	}

	for (idx, node, (x, y)) in state.sim.nodes() {
		if node.kind == NodeKind::Group || !state.is_highlighted(idx) {
			continue;
		}
		let base = state.sim.radius(idx).unwrap_or(0.0);
		let is_hovered = state.is_hovered(idx);
		let is_neighbor =
			state.hover.neighbors.contains(&idx) || state.hover.prev_neighbors.contains(&idx);

		let (radius, glow_radius) = if is_hovered {
			(base * (1.0 + 0.35 * t), base * (1.8 + 1.2 * t))
		} else if is_neighbor {
			(base * (1.0 + 0.2 * t), base * (1.4 + 0.6 * t))
		} else {
			(base, 0.0)
		};

		if glow_radius > 0.0 && t > 0.01 {
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius) {
				let alpha = if is_hovered { 0.35 * t } else { 0.2 * t };
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {alpha})"));
				let _ = gradient
					.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node_style(node.kind).fill);
		ctx.fill();

		if is_hovered && t > 0.01 {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * t));
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		ctx.set_fill_style_str("white");
		ctx.set_font(&font);
		let _ = ctx.fill_text(&node.name, x + radius + 3.0, y + 3.0);
	}
}
