use crate::graph::{LinkKind, NodeKind};

/// Fill colours per node kind, taken from the category10 palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeStyle {
	pub fill: &'static str,
	pub label: &'static str,
}

pub fn node_style(kind: NodeKind) -> NodeStyle {
	match kind {
		NodeKind::Class => NodeStyle {
			fill: "#1f77b4",
			label: "Class",
		},
		NodeKind::Function => NodeStyle {
			fill: "#2ca02c",
			label: "Function",
		},
		NodeKind::Method => NodeStyle {
			fill: "#ff7f0e",
			label: "Method",
		},
		NodeKind::Url => NodeStyle {
			fill: "#9467bd",
			label: "URL",
		},
		NodeKind::Group => NodeStyle {
			fill: "#7f7f7f",
			label: "App",
		},
	}
}

/// RGB triple used for a link, drawn with varying alpha.
pub fn link_rgb(kind: LinkKind) -> &'static str {
	match kind {
		LinkKind::Contains => "100, 180, 255",
		LinkKind::RoutesTo => "210, 140, 255",
		LinkKind::GroupMember | LinkKind::GroupPeer => "140, 140, 160",
	}
}
