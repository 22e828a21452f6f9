//! Adds one pinned group node per app, links members to it and seeds every
//! member's starting position around its group.

use std::collections::HashMap;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::model::{Graph, Link, LinkKind, Node, NodeKind};
use crate::config::LayoutConfig;

const GROUP_COLUMNS: usize = 3;

/// A node with the position the layout should start it at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeededNode {
	pub node: Node,
	pub x: f64,
	pub y: f64,
	/// Group anchors start (and stay) pinned at `x`, `y`.
	pub pinned: bool,
}

/// Display-ready superset of a [`Graph`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayGraph {
	pub nodes: Vec<SeededNode>,
	pub links: Vec<Link>,
}

impl DisplayGraph {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

/// Id of the group node for an app.
pub fn group_id(app: &str) -> String {
	format!("app:{app}")
}

/// Grid slot of the `index`-th group.
pub fn group_position(index: usize, config: &LayoutConfig) -> (f64, f64) {
	let (col, row) = (index % GROUP_COLUMNS, index / GROUP_COLUMNS);
	(
		config.group_origin_x + col as f64 * config.group_spacing,
		config.group_origin_y + row as f64 * config.group_spacing,
	)
}

/// Groups `graph` by app and returns the display graph.
///
/// Groups keep the order in which their app first appears. Each member gets
/// one `group-member` link plus `group-peer` links to at most
/// `max_group_peers` following members of the same group. Group nodes in
/// the input are dropped; only synthesized anchors are pinned.
pub fn augment<R: Rng>(mut graph: Graph, config: &LayoutConfig, rng: &mut R) -> DisplayGraph {
	let before = graph.nodes.len();
	graph.nodes.retain(|n| n.kind != NodeKind::Group);
	if graph.nodes.len() < before {
		debug!("dropped {} incoming group nodes", before - graph.nodes.len());
	}

	let mut order: Vec<String> = Vec::new();
	let mut members: HashMap<String, Vec<usize>> = HashMap::new();
	for (i, node) in graph.nodes.iter().enumerate() {
		let app = node.app_bucket();
		if !members.contains_key(app) {
			order.push(app.to_string());
		}
		members.entry(app.to_string()).or_default().push(i);
	}

	let mut links = graph.links;
	let mut anchors: HashMap<&str, (f64, f64)> = HashMap::new();
	let mut groups = Vec::with_capacity(order.len());
	for (index, app) in order.iter().enumerate() {
		let (x, y) = group_position(index, config);
		let id = group_id(app);
		anchors.insert(app.as_str(), (x, y));

		let group = &members[app];
		for (pos, &member) in group.iter().enumerate() {
			let member_id = &graph.nodes[member].id;
			links.push(Link::new(member_id.clone(), id.clone(), LinkKind::GroupMember));
			for &peer in group.iter().skip(pos + 1).take(config.max_group_peers) {
				links.push(Link::new(
					member_id.clone(),
					graph.nodes[peer].id.clone(),
					LinkKind::GroupPeer,
				));
			}
		}

		groups.push(SeededNode {
			node: Node {
				id,
				name: app.clone(),
				kind: NodeKind::Group,
				file: String::new(),
				app: app.clone(),
				parent: None,
				view: None,
				line: None,
			},
			x,
			y,
			pinned: true,
		});
	}

	let jitter = config.jitter.abs();
	let mut nodes = groups;
	nodes.reserve(graph.nodes.len());
	for node in graph.nodes.iter() {
		let (gx, gy) = anchors[node.app_bucket()];
		let (dx, dy) = if jitter > 0.0 {
			(rng.gen_range(-jitter..=jitter), rng.gen_range(-jitter..=jitter))
		} else {
			(0.0, 0.0)
		};
		nodes.push(SeededNode {
			node: node.clone(),
			x: gx + dx,
			y: gy + dy,
			pinned: false,
		});
	}

	debug!(
		"augmented graph: {} groups, {} nodes, {} links",
		order.len(),
		nodes.len(),
		links.len()
	);
	DisplayGraph { nodes, links }
}
