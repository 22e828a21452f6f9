//! Node, link and graph types exchanged between the builder, the augmenter
//! and the panel host.

use std::fmt;

use serde::{Deserialize, Serialize};

/// App bucket used when a node cannot be attributed to a module.
pub const UNKNOWN_APP: &str = "unknown";

/// What a node stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
	Class,
	Function,
	Method,
	Url,
	Group,
}

impl NodeKind {
	/// Every kind, in legend order.
	pub const ALL: [NodeKind; 5] = [
		NodeKind::Class,
		NodeKind::Function,
		NodeKind::Method,
		NodeKind::Url,
		NodeKind::Group,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			NodeKind::Class => "class",
			NodeKind::Function => "function",
			NodeKind::Method => "method",
			NodeKind::Url => "url",
			NodeKind::Group => "group",
		}
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Relationship carried by a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkKind {
	/// class -> method
	Contains,
	/// url -> view target
	RoutesTo,
	/// node -> its group node
	GroupMember,
	/// bounded fan-out between members of one group
	GroupPeer,
}

impl LinkKind {
	/// Links synthesized by the augmenter rather than read from the report.
	pub fn is_grouping(self) -> bool {
		matches!(self, LinkKind::GroupMember | LinkKind::GroupPeer)
	}
}

/// A structural element of the analyzed project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
	pub id: String,
	pub name: String,
	#[serde(rename = "type")]
	pub kind: NodeKind,
	#[serde(default)]
	pub file: String,
	#[serde(default = "unknown_app")]
	pub app: String,
	/// Enclosing class name, methods only.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parent: Option<String>,
	/// Raw dotted target of a route, urls only.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub view: Option<String>,
	/// 1-based declaration line when the report carries one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub line: Option<u32>,
}

fn unknown_app() -> String {
	UNKNOWN_APP.to_string()
}

impl Node {
	/// The app bucket this node belongs to; empty apps fall into `unknown`.
	pub fn app_bucket(&self) -> &str {
		if self.app.trim().is_empty() {
			UNKNOWN_APP
		} else {
			&self.app
		}
	}

	/// Whether clicking this node should open a file.
	pub fn is_navigable(&self) -> bool {
		self.kind != NodeKind::Group && !self.file.is_empty()
	}
}

/// Directed, typed edge between two node ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
	pub source: String,
	pub target: String,
	#[serde(rename = "type")]
	pub kind: LinkKind,
}

impl Link {
	pub fn new(source: impl Into<String>, target: impl Into<String>, kind: LinkKind) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			kind,
		}
	}
}

/// Nodes in emission order plus an unordered bag of links.
///
/// Ids are unique; links may repeat and may point at ids that are not in
/// `nodes`. The layout drops such links when it binds them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
	#[serde(default)]
	pub nodes: Vec<Node>,
	#[serde(default)]
	pub links: Vec<Link>,
}

impl Graph {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}
}
