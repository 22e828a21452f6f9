//! Force simulation over a [`DisplayGraph`].
//!
//! Link, many-body, centering and collision forces are summed into each
//! body's velocity every tick, then integrated with velocity decay. Energy
//! (`alpha`) scales the forces and cools toward `alpha_target`; once it
//! drops below `alpha_min` with nothing holding it up the simulation idles.
//!
//! Bodies are private. Callers read and pin positions through accessors.

use std::collections::HashMap;

use log::debug;

use crate::config::LayoutConfig;
use crate::graph::{DisplayGraph, LinkKind, Node, NodeKind};

/// Keeps coincident bodies from dividing by zero.
const JIGGLE: f64 = 1e-6;

#[derive(Clone, Debug)]
struct Body {
	node: Node,
	x: f64,
	y: f64,
	vx: f64,
	vy: f64,
	fx: Option<f64>,
	fy: Option<f64>,
	charge: f64,
	radius: f64,
}

impl Body {
	fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

/// A link whose endpoints were found among the loaded bodies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundLink {
	pub source: usize,
	pub target: usize,
	pub kind: LinkKind,
	distance: f64,
	strength: f64,
	bias: f64,
}

pub struct Simulation {
	bodies: Vec<Body>,
	links: Vec<BoundLink>,
	index: HashMap<String, usize>,
	alpha: f64,
	alpha_target: f64,
	center: (f64, f64),
	config: LayoutConfig,
}

impl Simulation {
	pub fn new(config: LayoutConfig, center: (f64, f64)) -> Self {
		Self {
			bodies: Vec::new(),
			links: Vec::new(),
			index: HashMap::new(),
			alpha: 0.0,
			alpha_target: 0.0,
			center,
			config,
		}
	}

	/// Replaces every body and link, then restarts at full energy.
	///
	/// A repeated id overwrites the earlier body. Links naming an id that is
	/// not loaded are dropped.
	pub fn load(&mut self, graph: &DisplayGraph) {
		self.bodies.clear();
		self.links.clear();
		self.index.clear();

		for seeded in &graph.nodes {
			let params = self.config.kinds.get(seeded.node.kind);
			let pin = seeded.pinned.then_some((seeded.x, seeded.y));
			let body = Body {
				node: seeded.node.clone(),
				x: seeded.x,
				y: seeded.y,
				vx: 0.0,
				vy: 0.0,
				fx: pin.map(|p| p.0),
				fy: pin.map(|p| p.1),
				charge: params.charge,
				radius: params.radius,
			};
			match self.index.get(&seeded.node.id) {
				Some(&slot) => self.bodies[slot] = body,
				None => {
					self.index.insert(seeded.node.id.clone(), self.bodies.len());
					self.bodies.push(body);
				}
			}
		}

		let mut dropped = 0usize;
		let mut count = vec![0usize; self.bodies.len()];
		let mut bound = Vec::with_capacity(graph.links.len());
		for link in &graph.links {
			let (Some(&source), Some(&target)) =
				(self.index.get(&link.source), self.index.get(&link.target))
			else {
				dropped += 1;
				continue;
			};
			if source == target {
				continue;
			}
			count[source] += 1;
			count[target] += 1;
			bound.push((source, target, link.kind));
		}
		if dropped > 0 {
			debug!("skipped {dropped} links with unknown endpoints");
		}

		self.links = bound
			.into_iter()
			.map(|(source, target, kind)| {
				let (cs, ct) = (count[source] as f64, count[target] as f64);
				BoundLink {
					source,
					target,
					kind,
					distance: self.config.link_distance(kind),
					strength: self.config.link_strength / cs.min(ct),
					bias: cs / (cs + ct),
				}
			})
			.collect();

		self.alpha_target = 0.0;
		self.alpha = self.config.reheat_alpha;
	}

	/// Takes effect on the next [`Simulation::load`].
	pub fn set_config(&mut self, config: LayoutConfig) {
		self.config = config;
	}

	pub fn config(&self) -> &LayoutConfig {
		&self.config
	}

	pub fn set_center(&mut self, x: f64, y: f64) {
		self.center = (x, y);
	}

	pub fn len(&self) -> usize {
		self.bodies.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bodies.is_empty()
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn node(&self, idx: usize) -> Option<&Node> {
		self.bodies.get(idx).map(|b| &b.node)
	}

	pub fn position(&self, idx: usize) -> Option<(f64, f64)> {
		self.bodies.get(idx).map(|b| (b.x, b.y))
	}

	pub fn radius(&self, idx: usize) -> Option<f64> {
		self.bodies.get(idx).map(|b| b.radius)
	}

	/// Every body as `(index, node, position)`.
	pub fn nodes(&self) -> impl Iterator<Item = (usize, &Node, (f64, f64))> + '_ {
		self.bodies
			.iter()
			.enumerate()
			.map(|(i, b)| (i, &b.node, (b.x, b.y)))
	}

	pub fn links(&self) -> &[BoundLink] {
		&self.links
	}

	/// Indices linked to `idx` in either direction.
	pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
		self.links.iter().filter_map(move |l| {
			if l.source == idx {
				Some(l.target)
			} else if l.target == idx {
				Some(l.source)
			} else {
				None
			}
		})
	}

	/// Fixes a body at `(x, y)` until [`Simulation::clear_pin`].
	pub fn set_pin(&mut self, idx: usize, x: f64, y: f64) {
		if let Some(b) = self.bodies.get_mut(idx) {
			b.fx = Some(x);
			b.fy = Some(y);
			b.x = x;
			b.y = y;
			b.vx = 0.0;
			b.vy = 0.0;
		}
	}

	pub fn clear_pin(&mut self, idx: usize) {
		if let Some(b) = self.bodies.get_mut(idx) {
			b.fx = None;
			b.fy = None;
		}
	}

	pub fn is_pinned(&self, idx: usize) -> bool {
		self.bodies.get(idx).is_some_and(Body::is_pinned)
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Energy the simulation cools toward; non-zero keeps it running.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
	}

	/// Raises the current energy to at least `alpha`.
	pub fn reheat(&mut self, alpha: f64) {
		self.alpha = self.alpha.max(alpha);
	}

	pub fn is_active(&self) -> bool {
		self.alpha >= self.config.alpha_min || self.alpha_target >= self.config.alpha_min
	}

	/// Advances one step. Returns `false` once the layout has come to rest.
	pub fn tick(&mut self) -> bool {
		if self.bodies.is_empty() || !self.is_active() {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

		self.apply_links();
		self.apply_charge();
		self.apply_center();
		self.apply_collide();
		self.integrate();
		true
	}

	fn apply_links(&mut self) {
		let alpha = self.alpha;
		for link in &self.links {
			let (s, t) = (&self.bodies[link.source], &self.bodies[link.target]);
			let mut dx = t.x + t.vx - s.x - s.vx;
			let mut dy = t.y + t.vy - s.y - s.vy;
			if dx == 0.0 && dy == 0.0 {
				dx = JIGGLE;
				dy = JIGGLE;
			}
			let len = (dx * dx + dy * dy).sqrt();
			let k = (len - link.distance) / len * alpha * link.strength;
			dx *= k;
			dy *= k;

			let target = &mut self.bodies[link.target];
			target.vx -= dx * link.bias;
			target.vy -= dy * link.bias;
			let source = &mut self.bodies[link.source];
			source.vx += dx * (1.0 - link.bias);
			source.vy += dy * (1.0 - link.bias);
		}
	}

	/// Pairwise repulsion; a body with zero charge pushes nothing.
	fn apply_charge(&mut self) {
		let alpha = self.alpha;
		let n = self.bodies.len();
		let mut dv = vec![(0.0, 0.0); n];
		for i in 0..n {
			let (xi, yi) = (self.bodies[i].x, self.bodies[i].y);
			for j in 0..n {
				let charge = self.bodies[j].charge;
				if i == j || charge == 0.0 {
					continue;
				}
				let mut dx = self.bodies[j].x - xi;
				let mut dy = self.bodies[j].y - yi;
				if dx == 0.0 && dy == 0.0 {
					dx = JIGGLE * (j as f64 - i as f64);
					dy = JIGGLE;
				}
				let mut l2 = dx * dx + dy * dy;
				if l2 < 1.0 {
					l2 = l2.sqrt();
				}
				let w = charge * alpha / l2;
				dv[i].0 += dx * w;
				dv[i].1 += dy * w;
			}
		}
		for (body, (dx, dy)) in self.bodies.iter_mut().zip(dv) {
			body.vx += dx;
			body.vy += dy;
		}
	}

	fn apply_center(&mut self) {
		let k = self.config.center_strength * self.alpha;
		let (cx, cy) = self.center;
		for b in self.bodies.iter_mut().filter(|b| !b.is_pinned()) {
			b.vx += (cx - b.x) * k;
			b.vy += (cy - b.y) * k;
		}
	}

	/// Separates overlapping circles, weighting each push by the other
	/// body's area.
	fn apply_collide(&mut self) {
		let strength = self.config.collide_strength;
		if strength == 0.0 {
			return;
		}
		let n = self.bodies.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let (a, b) = (&self.bodies[i], &self.bodies[j]);
				let r = a.radius + b.radius;
				let mut dx = (a.x + a.vx) - (b.x + b.vx);
				let mut dy = (a.y + a.vy) - (b.y + b.vy);
				let mut l2 = dx * dx + dy * dy;
				if l2 >= r * r {
					continue;
				}
				if l2 == 0.0 {
					dx = JIGGLE * (i as f64 - j as f64 - 0.5);
					dy = JIGGLE;
					l2 = dx * dx + dy * dy;
				}
				let l = l2.sqrt();
				let k = (r - l) / l * strength;
				let (ra2, rb2) = (a.radius * a.radius, b.radius * b.radius);
				let wa = rb2 / (ra2 + rb2);
				dx *= k;
				dy *= k;

				let a = &mut self.bodies[i];
				a.vx += dx * wa;
				a.vy += dy * wa;
				let b = &mut self.bodies[j];
				b.vx -= dx * (1.0 - wa);
				b.vy -= dy * (1.0 - wa);
			}
		}
	}

	fn integrate(&mut self) {
		let keep = 1.0 - self.config.velocity_decay;
		for b in &mut self.bodies {
			match b.fx {
				Some(fx) => {
					b.x = fx;
					b.vx = 0.0;
				}
				None => {
					b.vx *= keep;
					b.x += b.vx;
				}
			}
			match b.fy {
				Some(fy) => {
					b.y = fy;
					b.vy = 0.0;
				}
				None => {
					b.vy *= keep;
					b.y += b.vy;
				}
			}
		}
	}

	/// Number of group anchors currently loaded.
	pub fn group_count(&self) -> usize {
		self.bodies
			.iter()
			.filter(|b| b.node.kind == NodeKind::Group)
			.count()
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::graph::{Link, SeededNode};

	fn seeded(id: &str, kind: NodeKind, x: f64, y: f64) -> SeededNode {
		SeededNode {
			node: Node {
				id: id.into(),
				name: id.into(),
				kind,
				file: String::new(),
				app: "a".into(),
				parent: None,
				view: None,
				line: None,
			},
			x,
			y,
			pinned: kind == NodeKind::Group,
		}
	}

	/// Only the forces a test switches back on act.
	fn quiet_config() -> LayoutConfig {
		let mut config = LayoutConfig::default();
		let kinds = &mut config.kinds;
		for params in [
			&mut kinds.class,
			&mut kinds.function,
			&mut kinds.method,
			&mut kinds.url,
			&mut kinds.group,
		] {
			params.charge = 0.0;
		}
		config.center_strength = 0.0;
		config.collide_strength = 0.0;
		config
	}

	fn distance(sim: &Simulation, a: usize, b: usize) -> f64 {
		let (pa, pb) = (sim.position(a).unwrap(), sim.position(b).unwrap());
		((pa.0 - pb.0).powi(2) + (pa.1 - pb.1).powi(2)).sqrt()
	}

	fn settle(sim: &mut Simulation) -> usize {
		let mut ticks = 0;
		while sim.tick() {
			ticks += 1;
			assert!(ticks < 10_000, "simulation never came to rest");
		}
		ticks
	}

	#[test]
	fn dangling_links_are_skipped() {
		let graph = DisplayGraph {
			nodes: vec![
				seeded("a", NodeKind::Class, 0.0, 0.0),
				seeded("b", NodeKind::Method, 10.0, 0.0),
			],
			links: vec![
				Link::new("a", "b", LinkKind::Contains),
				Link::new("a", "ghost", LinkKind::Contains),
				Link::new("nobody", "b", LinkKind::RoutesTo),
			],
		};
		let mut sim = Simulation::new(LayoutConfig::default(), (0.0, 0.0));
		sim.load(&graph);
		assert_eq!(sim.len(), 2);
		assert_eq!(sim.links().len(), 1);
		assert_eq!((sim.links()[0].source, sim.links()[0].target), (0, 1));
		assert!(sim.tick());
	}

	#[test]
	fn repeated_ids_keep_the_last_body() {
		let graph = DisplayGraph {
			nodes: vec![
				seeded("a", NodeKind::Class, 0.0, 0.0),
				seeded("a", NodeKind::Function, 5.0, 5.0),
			],
			links: vec![],
		};
		let mut sim = Simulation::new(LayoutConfig::default(), (0.0, 0.0));
		sim.load(&graph);
		assert_eq!(sim.len(), 1);
		assert_eq!(sim.node(0).unwrap().kind, NodeKind::Function);
		assert_eq!(sim.position(0), Some((5.0, 5.0)));
	}

	#[test]
	fn links_relax_toward_their_kind_distance() {
		let config = quiet_config();
		let graph = DisplayGraph {
			nodes: vec![
				seeded("c", NodeKind::Class, 0.0, 0.0),
				seeded("m", NodeKind::Method, 200.0, 0.0),
				seeded("f", NodeKind::Function, 0.0, 500.0),
				seeded("g", NodeKind::Function, 10.0, 500.0),
			],
			links: vec![
				Link::new("c", "m", LinkKind::Contains),
				Link::new("f", "g", LinkKind::GroupPeer),
			],
		};
		let mut sim = Simulation::new(config.clone(), (0.0, 0.0));
		sim.load(&graph);
		settle(&mut sim);
		let structural = distance(&sim, 0, 1);
		let grouping = distance(&sim, 2, 3);
		assert!((structural - config.structural_link_distance).abs() < 2.0, "{structural}");
		assert!((grouping - config.group_link_distance).abs() < 2.0, "{grouping}");
	}

	#[test]
	fn groups_neither_move_nor_repel() {
		let mut config = quiet_config();
		config.kinds.group.charge = 0.0;
		config.kinds.class.charge = -300.0;
		let graph = DisplayGraph {
			nodes: vec![
				seeded("app:a", NodeKind::Group, 100.0, 100.0),
				seeded("c", NodeKind::Class, 150.0, 100.0),
			],
			links: vec![],
		};
		let mut sim = Simulation::new(config, (0.0, 0.0));
		sim.load(&graph);
		for _ in 0..50 {
			sim.tick();
		}
		assert_eq!(sim.position(0), Some((100.0, 100.0)));
		// the class pushes on the group, but nothing pushes back on the class
		assert_eq!(sim.position(1), Some((150.0, 100.0)));
		assert_eq!(sim.group_count(), 1);
	}

	#[test]
	fn charged_bodies_spread_apart() {
		let mut config = quiet_config();
		config.kinds.function.charge = -150.0;
		let graph = DisplayGraph {
			nodes: vec![
				seeded("a", NodeKind::Function, 0.0, 0.0),
				seeded("b", NodeKind::Function, 5.0, 0.0),
			],
			links: vec![],
		};
		let mut sim = Simulation::new(config, (0.0, 0.0));
		sim.load(&graph);
		for _ in 0..30 {
			sim.tick();
		}
		assert!(distance(&sim, 0, 1) > 20.0);
	}

	#[test]
	fn collisions_separate_overlapping_bodies() {
		let mut config = quiet_config();
		config.collide_strength = 1.0;
		let graph = DisplayGraph {
			nodes: vec![
				seeded("a", NodeKind::Method, 0.0, 0.0),
				seeded("b", NodeKind::Method, 1.0, 0.0),
			],
			links: vec![],
		};
		let mut sim = Simulation::new(config.clone(), (0.0, 0.0));
		sim.load(&graph);
		settle(&mut sim);
		assert!(distance(&sim, 0, 1) >= 2.0 * config.kinds.method.radius * 0.9);
	}

	#[test]
	fn centering_pulls_free_bodies_in() {
		let mut config = quiet_config();
		config.center_strength = 0.1;
		let graph = DisplayGraph {
			nodes: vec![seeded("far", NodeKind::Url, 1000.0, -1000.0)],
			links: vec![],
		};
		let mut sim = Simulation::new(config, (0.0, 0.0));
		sim.load(&graph);
		settle(&mut sim);
		let (x, y) = sim.position(0).unwrap();
		assert!(x.abs() < 500.0 && y.abs() < 500.0, "{x},{y}");
	}

	#[test]
	fn cools_to_rest_and_restarts_on_reheat() {
		let graph = DisplayGraph {
			nodes: vec![
				seeded("a", NodeKind::Class, 0.0, 0.0),
				seeded("b", NodeKind::Method, 30.0, 0.0),
			],
			links: vec![Link::new("a", "b", LinkKind::Contains)],
		};
		let mut sim = Simulation::new(LayoutConfig::default(), (0.0, 0.0));
		assert!(!sim.tick());
		sim.load(&graph);
		let ticks = settle(&mut sim);
		assert!(ticks > 100 && ticks < 1000, "{ticks}");
		assert!(!sim.is_active());

		sim.reheat(0.5);
		assert!(sim.tick());

		settle(&mut sim);
		sim.set_alpha_target(0.3);
		for _ in 0..2000 {
			assert!(sim.tick());
		}
	}

	#[test]
	fn pins_hold_until_cleared() {
		let mut config = quiet_config();
		config.center_strength = 0.1;
		let graph = DisplayGraph {
			nodes: vec![seeded("a", NodeKind::Function, 0.0, 0.0)],
			links: vec![],
		};
		let mut sim = Simulation::new(config, (500.0, 500.0));
		sim.load(&graph);
		sim.set_pin(0, -40.0, 25.0);
		assert!(sim.is_pinned(0));
		for _ in 0..20 {
			sim.tick();
		}
		assert_eq!(sim.position(0), Some((-40.0, 25.0)));

		sim.clear_pin(0);
		assert!(!sim.is_pinned(0));
		sim.reheat(1.0);
		for _ in 0..20 {
			sim.tick();
		}
		assert!(sim.position(0).unwrap().0 > -40.0);
	}

	#[test]
	fn neighbors_follow_links_both_ways() {
		let graph = DisplayGraph {
			nodes: vec![
				seeded("a", NodeKind::Class, 0.0, 0.0),
				seeded("b", NodeKind::Method, 1.0, 0.0),
				seeded("c", NodeKind::Url, 2.0, 0.0),
			],
			links: vec![
				Link::new("a", "b", LinkKind::Contains),
				Link::new("c", "a", LinkKind::RoutesTo),
			],
		};
		let mut sim = Simulation::new(LayoutConfig::default(), (0.0, 0.0));
		sim.load(&graph);
		let mut around: Vec<usize> = sim.neighbors(0).collect();
		around.sort_unstable();
		assert_eq!(around, vec![1, 2]);
		assert_eq!(sim.index_of("c"), Some(2));
	}
}
