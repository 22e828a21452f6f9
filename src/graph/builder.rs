//! Turns a structure report into a [`Graph`].
//!
//! The report has no scope-close markers: app, file and class stay in effect
//! until a later line replaces them. Each recognized line advances an
//! immutable [`ParseContext`] and may emit nodes and links into a
//! [`GraphSink`], which also owns the name index used to resolve routes.

use std::collections::HashMap;

use log::debug;

use super::model::{Graph, Link, LinkKind, Node, NodeKind, UNKNOWN_APP};
use super::report::{self, Classified, ReportLine};

#[derive(Clone, Debug, PartialEq, Eq)]
struct ClassScope {
	name: String,
	id: String,
	indent: usize,
}

/// Scan position inside the report: the last app, file and class seen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseContext {
	app: String,
	file: String,
	class: Option<ClassScope>,
}

impl Default for ParseContext {
	fn default() -> Self {
		Self {
			app: UNKNOWN_APP.to_string(),
			file: String::new(),
			class: None,
		}
	}
}

/// What a single line contributes to the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Emission {
	Node(Node),
	Link(Link),
	/// A url node whose target still has to be looked up by short name.
	Route { node: Node, short_name: String },
}

impl ParseContext {
	fn qualify(&self, name: &str) -> String {
		format!("{}:{}:{}", self.app, self.file, name)
	}

	fn node(&self, id: String, name: &str, kind: NodeKind, line: Option<u32>) -> Node {
		Node {
			id,
			name: name.to_string(),
			kind,
			file: self.file.clone(),
			app: self.app.clone(),
			parent: None,
			view: None,
			line,
		}
	}

	/// Consumes one classified line, returning the next context and whatever
	/// the line emits.
	pub fn advance(self, classified: &Classified<'_>) -> (Self, Vec<Emission>) {
		match classified.line {
			ReportLine::App(app) => (
				Self {
					app: app.to_string(),
					..self
				},
				Vec::new(),
			),
			ReportLine::File(file) => (
				Self {
					file: file.to_string(),
					..self
				},
				Vec::new(),
			),
			ReportLine::Class { name, line } => {
				let id = self.qualify(name);
				let node = self.node(id.clone(), name, NodeKind::Class, line);
				let next = Self {
					class: Some(ClassScope {
						name: name.to_string(),
						id,
						indent: classified.indent,
					}),
					..self
				};
				(next, vec![Emission::Node(node)])
			}
			ReportLine::Member { name, line } => {
				let emitted = match &self.class {
					Some(class) if classified.indent > class.indent => {
						let id = self.qualify(&format!("{}.{}", class.name, name));
						let mut node = self.node(id.clone(), name, NodeKind::Method, line);
						node.parent = Some(class.name.clone());
						vec![
							Emission::Link(Link::new(class.id.clone(), id, LinkKind::Contains)),
							Emission::Node(node),
						]
					}
					_ => vec![Emission::Node(self.node(
						self.qualify(name),
						name,
						NodeKind::Function,
						line,
					))],
				};
				(self, emitted)
			}
			ReportLine::Route {
				pattern,
				target,
				line,
			} => {
				let id = self.qualify(&format!("url:{pattern}"));
				let mut node = self.node(id, pattern, NodeKind::Url, line);
				node.view = Some(target.to_string());
				let short_name = report::short_name(target).to_string();
				(self, vec![Emission::Route { node, short_name }])
			}
		}
	}
}

/// Short name -> first class or function node id carrying it.
#[derive(Clone, Debug, Default)]
pub struct NameIndex {
	first: HashMap<String, String>,
}

impl NameIndex {
	pub fn record(&mut self, node: &Node) {
		if matches!(node.kind, NodeKind::Function | NodeKind::Class) {
			self.first
				.entry(node.name.clone())
				.or_insert_with(|| node.id.clone());
		}
	}

	pub fn resolve(&self, short_name: &str) -> Option<&str> {
		self.first.get(short_name).map(String::as_str)
	}
}

/// Accumulates emissions. A repeated node id overwrites the earlier node
/// in place, keeping its original position in emission order.
#[derive(Debug, Default)]
pub struct GraphSink {
	nodes: Vec<Node>,
	slots: HashMap<String, usize>,
	links: Vec<Link>,
	names: NameIndex,
	unresolved_routes: usize,
}

impl GraphSink {
	fn insert(&mut self, node: Node) {
		self.names.record(&node);
		match self.slots.get(&node.id) {
			Some(&slot) => self.nodes[slot] = node,
			None => {
				self.slots.insert(node.id.clone(), self.nodes.len());
				self.nodes.push(node);
			}
		}
	}

	pub fn accept(&mut self, emission: Emission) {
		match emission {
			Emission::Node(node) => self.insert(node),
			Emission::Link(link) => self.links.push(link),
			Emission::Route { node, short_name } => {
				match self.names.resolve(&short_name) {
					Some(target) => {
						self.links
							.push(Link::new(node.id.clone(), target, LinkKind::RoutesTo));
					}
					None => self.unresolved_routes += 1,
				}
				self.insert(node);
			}
		}
	}

	pub fn finish(self) -> Graph {
		debug!(
			"report parsed: {} nodes, {} links, {} unresolved routes",
			self.nodes.len(),
			self.links.len(),
			self.unresolved_routes
		);
		Graph {
			nodes: self.nodes,
			links: self.links,
		}
	}
}

/// Builds a graph from report text. Never fails: unrecognized or malformed
/// lines are skipped, and an empty report gives an empty graph.
pub fn build_graph(report: &str) -> Graph {
	let (_, sink) = report.lines().filter_map(report::classify).fold(
		(ParseContext::default(), GraphSink::default()),
		|(ctx, mut sink), line| {
			let (ctx, emitted) = ctx.advance(&line);
			emitted.into_iter().for_each(|e| sink.accept(e));
			(ctx, sink)
		},
	);
	sink.finish()
}

#[cfg(test)]
mod tests {
	use std::collections::{BTreeMap, BTreeSet};

	use pretty_assertions::assert_eq;

	use super::*;

	const BLOG: &str = r#"
📦 App: blog
📄 File: blog/views.py
  🏛️ Class: PostView (line 10)
    🔹 Method: get() (line 12)
    🔹 Method: post() (line 20)
  🔸 Function: index() (line 30)
  🔗 URL: "/posts/" -> blog.views.PostView.as_view()
  🔗 URL: "/" -> blog.views.index (line 5)
"#;

	fn ids(graph: &Graph) -> BTreeSet<&str> {
		graph.nodes.iter().map(|n| n.id.as_str()).collect()
	}

	fn link_bag(graph: &Graph) -> BTreeMap<(&str, &str, LinkKind), usize> {
		let mut bag = BTreeMap::new();
		for l in &graph.links {
			*bag.entry((l.source.as_str(), l.target.as_str(), l.kind))
				.or_default() += 1;
		}
		bag
	}

	#[test]
	fn methods_hang_off_their_class() {
		let graph = build_graph(BLOG);
		let get = graph.node("blog:blog/views.py:PostView.get").unwrap();
		assert_eq!(get.kind, NodeKind::Method);
		assert_eq!(get.parent.as_deref(), Some("PostView"));
		assert_eq!(get.line, Some(12));
		assert!(graph.links.contains(&Link::new(
			"blog:blog/views.py:PostView",
			"blog:blog/views.py:PostView.get",
			LinkKind::Contains
		)));

		let index = graph.node("blog:blog/views.py:index").unwrap();
		assert_eq!(index.kind, NodeKind::Function);
		assert_eq!(index.parent, None);
	}

	#[test]
	fn routes_resolve_by_short_name() {
		let graph = build_graph(BLOG);
		let root = graph.node("blog:blog/views.py:url:/").unwrap();
		assert_eq!(root.kind, NodeKind::Url);
		assert_eq!(root.view.as_deref(), Some("blog.views.index"));
		assert_eq!(root.line, Some(5));
		assert!(graph.links.contains(&Link::new(
			"blog:blog/views.py:url:/",
			"blog:blog/views.py:index",
			LinkKind::RoutesTo
		)));
	}

	#[test]
	fn as_view_routes_stay_unlinked() {
		let graph = build_graph(BLOG);
		assert!(graph.node("blog:blog/views.py:url:/posts/").is_some());
		assert!(
			!graph
				.links
				.iter()
				.any(|l| l.source == "blog:blog/views.py:url:/posts/")
		);
	}

	#[test]
	fn route_target_must_already_be_emitted() {
		let graph = build_graph(
			"app a\nfile urls.py\nurl /x -> a.views.late\nfile views.py\ndef late()\n",
		);
		assert_eq!(graph.nodes.len(), 2);
		assert!(graph.links.is_empty());
	}

	#[test]
	fn first_matching_name_wins_across_apps() {
		let report = "\
app first
file a.py
class Foo
app second
file b.py
class Foo
url /foo -> second.b.Foo
";
		let graph = build_graph(report);
		assert_eq!(
			graph.links,
			vec![Link::new(
				"second:b.py:url:/foo",
				"first:a.py:Foo",
				LinkKind::RoutesTo
			)]
		);
	}

	#[test]
	fn methods_never_resolve_routes() {
		let graph = build_graph("file v.py\nclass A\n  def show()\nurl /s -> v.A.show\n");
		assert!(graph.links.iter().all(|l| l.kind != LinkKind::RoutesTo));
	}

	#[test]
	fn redefined_ids_overwrite_in_place() {
		let report = "\
file v.py
class Foo (line 1)
def bar()
class Foo (line 9)
";
		let graph = build_graph(report);
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.nodes[0].id, "unknown:v.py:Foo");
		assert_eq!(graph.nodes[0].line, Some(9));
	}

	#[test]
	fn unattributed_nodes_use_unknown_app() {
		let graph = build_graph("def helper()\n");
		assert_eq!(graph.nodes[0].id, "unknown::helper");
		assert_eq!(graph.nodes[0].app, UNKNOWN_APP);
	}

	#[test]
	fn class_scope_survives_file_changes() {
		let report = "\
file a.py
  class A
file b.py
    def m()
";
		let graph = build_graph(report);
		let m = graph.node("unknown:b.py:A.m").unwrap();
		assert_eq!(m.parent.as_deref(), Some("A"));
		assert_eq!(
			graph.links,
			vec![Link::new("unknown:a.py:A", "unknown:b.py:A.m", LinkKind::Contains)]
		);
	}

	#[test]
	fn member_at_class_depth_is_a_function() {
		let graph = build_graph("file a.py\n  class A\n  def helper()\n");
		assert_eq!(graph.node("unknown:a.py:helper").unwrap().kind, NodeKind::Function);
		assert!(graph.links.is_empty());
	}

	#[test]
	fn garbage_degrades_to_partial_graph() {
		let report = "\
garbage line
🔗 URL: broken
📦
file v.py

class Ok
";
		let graph = build_graph(report);
		assert_eq!(ids(&graph), BTreeSet::from(["unknown:v.py:Ok"]));
		assert!(build_graph("").is_empty());
	}

	#[test]
	fn rebuilding_is_idempotent() {
		let report = format!("{BLOG}{BLOG}");
		let (a, b) = (build_graph(&report), build_graph(&report));
		assert_eq!(ids(&a), ids(&b));
		assert_eq!(link_bag(&a), link_bag(&b));
	}

	#[test]
	fn context_advances_without_emitting_for_app_and_file() {
		let line = report::classify("📦 App: shop").unwrap();
		let (ctx, emitted) = ParseContext::default().advance(&line);
		assert!(emitted.is_empty());
		assert_eq!(ctx.app, "shop");
	}
}
