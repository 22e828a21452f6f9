//! Physics and view tuning. The host may override any field through a
//! `configure` message; missing fields keep their defaults.

use serde::Deserialize;

use crate::graph::model::{LinkKind, NodeKind};

/// Largest jitter, spacing or grid origin accepted from the host.
const MAX_EXTENT: f64 = 1.0e6;

fn finite_or(value: f64, fallback: f64) -> f64 {
	if value.is_finite() { value } else { fallback }
}

fn extent_or(value: f64, fallback: f64) -> f64 {
	finite_or(value, fallback).clamp(-MAX_EXTENT, MAX_EXTENT)
}

fn positive_or(value: f64, fallback: f64) -> f64 {
	if value.is_finite() && value > 0.0 { value } else { fallback }
}

/// Per-kind physical parameters.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct KindParams {
	/// Many-body strength; negative repels, zero opts out.
	pub charge: f64,
	/// Collision and hit-test radius in graph units.
	pub radius: f64,
}

impl Default for KindParams {
	fn default() -> Self {
		Self {
			charge: -120.0,
			radius: 8.0,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct KindTable {
	pub class: KindParams,
	pub function: KindParams,
	pub method: KindParams,
	pub url: KindParams,
	pub group: KindParams,
}

impl Default for KindTable {
	fn default() -> Self {
		Self {
			class: KindParams {
				charge: -220.0,
				radius: 12.0,
			},
			function: KindParams {
				charge: -150.0,
				radius: 9.0,
			},
			method: KindParams {
				charge: -80.0,
				radius: 6.0,
			},
			url: KindParams {
				charge: -150.0,
				radius: 9.0,
			},
			group: KindParams {
				charge: 0.0,
				radius: 28.0,
			},
		}
	}
}

impl KindParams {
	fn sanitized(self, fallback: KindParams) -> Self {
		Self {
			charge: finite_or(self.charge, fallback.charge),
			radius: extent_or(self.radius, fallback.radius).max(0.0),
		}
	}
}

impl KindTable {
	fn sanitized(self) -> Self {
		let base = Self::default();
		Self {
			class: self.class.sanitized(base.class),
			function: self.function.sanitized(base.function),
			method: self.method.sanitized(base.method),
			url: self.url.sanitized(base.url),
			group: self.group.sanitized(base.group),
		}
	}

	pub fn get(&self, kind: NodeKind) -> KindParams {
		match kind {
			NodeKind::Class => self.class,
			NodeKind::Function => self.function,
			NodeKind::Method => self.method,
			NodeKind::Url => self.url,
			NodeKind::Group => self.group,
		}
	}
}

/// Everything the augmenter, the simulation and the view read.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
	pub kinds: KindTable,
	/// Rest length of `contains` and `routes-to` links.
	pub structural_link_distance: f64,
	/// Rest length of `group-member` and `group-peer` links.
	pub group_link_distance: f64,
	pub link_strength: f64,
	pub center_strength: f64,
	pub collide_strength: f64,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f64,
	pub alpha_min: f64,
	pub alpha_decay: f64,
	/// Energy held while a node is being dragged.
	pub drag_alpha_target: f64,
	/// Energy injected when a graph loads or the view resets.
	pub reheat_alpha: f64,
	pub group_spacing: f64,
	pub group_origin_x: f64,
	pub group_origin_y: f64,
	/// Half-width of the square members are scattered in around their group.
	pub jitter: f64,
	pub max_group_peers: usize,
	pub min_zoom: f64,
	pub max_zoom: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			kinds: KindTable::default(),
			structural_link_distance: 40.0,
			group_link_distance: 110.0,
			link_strength: 1.0,
			center_strength: 0.02,
			collide_strength: 0.7,
			velocity_decay: 0.4,
			alpha_min: 0.001,
			// d3's default: reach alpha_min from 1.0 in about 300 ticks
			alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
			drag_alpha_target: 0.3,
			reheat_alpha: 1.0,
			group_spacing: 320.0,
			group_origin_x: 160.0,
			group_origin_y: 160.0,
			jitter: 60.0,
			max_group_peers: 2,
			min_zoom: 0.1,
			max_zoom: 10.0,
		}
	}
}

impl LayoutConfig {
	/// Repairs host-supplied values the layout cannot work with. Non-finite
	/// numbers fall back to the built-in tuning, extents are capped, rates
	/// stay in `[0, 1]` and the zoom bounds come out positive and ordered.
	pub fn sanitized(self) -> Self {
		let base = Self::default();
		let rate = |value: f64, fallback: f64| finite_or(value, fallback).clamp(0.0, 1.0);
		let (low, high) = (
			positive_or(self.min_zoom, base.min_zoom),
			positive_or(self.max_zoom, base.max_zoom),
		);
		Self {
			kinds: self.kinds.sanitized(),
			structural_link_distance: extent_or(
				self.structural_link_distance,
				base.structural_link_distance,
			),
			group_link_distance: extent_or(self.group_link_distance, base.group_link_distance),
			link_strength: finite_or(self.link_strength, base.link_strength),
			center_strength: finite_or(self.center_strength, base.center_strength),
			collide_strength: finite_or(self.collide_strength, base.collide_strength),
			velocity_decay: rate(self.velocity_decay, base.velocity_decay),
			alpha_min: rate(self.alpha_min, base.alpha_min),
			alpha_decay: rate(self.alpha_decay, base.alpha_decay),
			drag_alpha_target: rate(self.drag_alpha_target, base.drag_alpha_target),
			reheat_alpha: rate(self.reheat_alpha, base.reheat_alpha),
			group_spacing: extent_or(self.group_spacing, base.group_spacing),
			group_origin_x: extent_or(self.group_origin_x, base.group_origin_x),
			group_origin_y: extent_or(self.group_origin_y, base.group_origin_y),
			jitter: extent_or(self.jitter, base.jitter).abs(),
			max_group_peers: self.max_group_peers,
			min_zoom: low.min(high),
			max_zoom: low.max(high),
		}
	}

	pub fn link_distance(&self, kind: LinkKind) -> f64 {
		if kind.is_grouping() {
			self.group_link_distance
		} else {
			self.structural_link_distance
		}
	}
}
