use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;

use super::types::{Dimensions, Point, ViewLink, ViewNode};

const NODE_MASS: f32 = 10.0;
const NODE_SPEED: f32 = 3000.0;
const FORCE_MAX: f32 = 100.0;
const SEED_RADIUS: f64 = 10.0;
const REHEAT_ALPHA: f64 = 0.3;
const JIGGLE_RADIUS: f64 = 1.0;

/// Tuning for the force-directed layout.
#[derive(Clone, Debug, PartialEq)]
pub struct ForceParams {
	/// Upper bound on link attraction; below it attraction equals the score.
	pub link_strength_cap: f64,
	/// Rest length of a link with score 1.
	pub link_min_distance: f64,
	/// Extra rest length added as the score falls to 0.
	pub link_distance_span: f64,
	/// Pairwise repulsion handed to `force_graph`.
	pub charge: f32,
	/// Fraction of the centroid offset removed each tick.
	pub center_strength: f32,
	/// Per-tick decay of the simulation temperature.
	pub alpha_decay: f64,
	/// Temperature below which the simulation stops on its own.
	pub alpha_min: f64,
	/// Velocity damping factor.
	pub damping: f32,
}

impl Default for ForceParams {
	fn default() -> Self {
		Self {
			link_strength_cap: 0.2,
			link_min_distance: 20.0,
			link_distance_span: 60.0,
			charge: 150.0,
			center_strength: 0.05,
			alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
			alpha_min: 0.001,
			damping: 0.9,
		}
	}
}

impl ForceParams {
	pub fn link_strength(&self, score: f64) -> f64 {
		score.clamp(0.0, 1.0).min(self.link_strength_cap)
	}

	pub fn link_distance(&self, score: f64) -> f64 {
		self.link_min_distance + (1.0 - score.clamp(0.0, 1.0)) * self.link_distance_span
	}
}

/// A force simulation that moves view-node positions over time.
///
/// Node indices passed to [`LayoutEngine::set_pin`] and the slice given to
/// [`LayoutEngine::tick`] refer to the node slice the engine was started with.
pub trait LayoutEngine {
	/// Stop any running simulation and start a new one over `nodes`.
	/// Unplaced nodes receive a seed position immediately.
	fn start(
		&mut self,
		nodes: &mut [ViewNode],
		links: &[ViewLink],
		dimensions: Dimensions,
		params: &ForceParams,
	);

	fn stop(&mut self);

	fn is_running(&self) -> bool;

	/// Advance by `dt` seconds and commit every node's position.
	fn tick(&mut self, dt: f32, nodes: &mut [ViewNode]);

	/// Anchor node `index` at `pin`, or release it with `None`.
	fn set_pin(&mut self, index: usize, pin: Option<Point>);
}

/// Seed for a node the view builder left unplaced, on a phyllotaxis spiral
/// around the viewport center.
pub fn phyllotaxis_seed(center: Point, index: usize) -> Point {
	let angle = index as f64 * PI * (3.0 - 5.0_f64.sqrt());
	let radius = SEED_RADIUS * (0.5 + index as f64).sqrt();
	Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
}

/// Small deterministic offset for a node whose start position is already
/// taken. `force_graph` exerts no repulsion between coincident nodes.
fn jiggle(p: Point, index: usize, attempt: usize) -> Point {
	let angle = (index + attempt) as f64 * PI * (3.0 - 5.0_f64.sqrt());
	let radius = JIGGLE_RADIUS * (1 + attempt) as f64;
	Point::new(p.x + radius * angle.cos(), p.y + radius * angle.sin())
}

/// [`LayoutEngine`] backed by `force_graph` for repulsion and anchoring,
/// with score-weighted link springs and a centering pull applied on top.
pub struct ForceLayout {
	graph: Option<ForceGraph<usize, f64>>,
	params: ForceParams,
	center: Point,
	alpha: f64,
}

impl Default for ForceLayout {
	fn default() -> Self {
		Self {
			graph: None,
			params: ForceParams::default(),
			center: Dimensions::default().center(),
			alpha: 0.0,
		}
	}
}

impl ForceLayout {
	#[cfg(test)]
	fn alpha(&self) -> f64 {
		self.alpha
	}

	fn apply_link_forces(&mut self) {
		let Some(graph) = self.graph.as_mut() else {
			return;
		};
		let (params, alpha) = (&self.params, self.alpha);
		let mut shifts: HashMap<DefaultNodeIdx, (f32, f32)> = HashMap::new();

		graph.visit_edges(|source, target, edge| {
			let (dx, dy) = (target.x() - source.x(), target.y() - source.y());
			let dist = (dx * dx + dy * dy).sqrt();
			if dist < 0.001 {
				return;
			}
			let score = edge.user_data;
			let pull = ((dist as f64 - params.link_distance(score)) / dist as f64
				* alpha * params.link_strength(score)) as f32;
			let (fx, fy) = (dx * pull * 0.5, dy * pull * 0.5);

			let s = shifts.entry(source.index()).or_default();
			s.0 += fx;
			s.1 += fy;
			let t = shifts.entry(target.index()).or_default();
			t.0 -= fx;
			t.1 -= fy;
		});

		graph.visit_nodes_mut(|node| {
			if node.data.is_anchor {
				return;
			}
			if let Some(&(sx, sy)) = shifts.get(&node.index()) {
				node.data.x += sx;
				node.data.y += sy;
			}
		});
	}

	fn apply_center_force(&mut self) {
		let Some(graph) = self.graph.as_mut() else {
			return;
		};
		let (mut sx, mut sy, mut n) = (0.0_f32, 0.0_f32, 0usize);
		graph.visit_nodes(|node| {
			sx += node.x();
			sy += node.y();
			n += 1;
		});
		if n == 0 {
			return;
		}
		let strength = self.params.center_strength;
		let (shift_x, shift_y) = (
			(sx / n as f32 - self.center.x as f32) * strength,
			(sy / n as f32 - self.center.y as f32) * strength,
		);
		graph.visit_nodes_mut(|node| {
			if !node.data.is_anchor {
				node.data.x -= shift_x;
				node.data.y -= shift_y;
			}
		});
	}
}

impl LayoutEngine for ForceLayout {
	fn start(
		&mut self,
		nodes: &mut [ViewNode],
		links: &[ViewLink],
		dimensions: Dimensions,
		params: &ForceParams,
	) {
		self.stop();

		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: params.charge,
			// links are sprung per score in apply_link_forces
			force_spring: 0.0,
			force_max: FORCE_MAX,
			node_speed: NODE_SPEED,
			damping_factor: params.damping,
		});
		let center = dimensions.center();
		let mut id_to_idx = HashMap::with_capacity(nodes.len());

		for (i, node) in nodes.iter_mut().enumerate() {
			if let Some(pin) = node.pin {
				node.position = Some(pin);
			}
			node.position.get_or_insert_with(|| phyllotaxis_seed(center, i));
		}

		let key = |p: Point| (p.x.to_bits(), p.y.to_bits());
		let mut occupied: HashSet<(u64, u64)> = nodes
			.iter()
			.filter(|n| n.pin.is_some())
			.filter_map(|n| n.position.map(key))
			.collect();
		for (i, node) in nodes.iter_mut().enumerate() {
			if node.pin.is_some() {
				continue;
			}
			let Some(mut p) = node.position else { continue };
			let base = p;
			let mut attempt = 0;
			while occupied.contains(&key(p)) {
				p = jiggle(base, i, attempt);
				attempt += 1;
			}
			occupied.insert(key(p));
			node.position = Some(p);
		}

		for (i, node) in nodes.iter().enumerate() {
			let p = node.position.unwrap_or(center);
			let idx = graph.add_node(NodeData {
				x: p.x as f32,
				y: p.y as f32,
				mass: NODE_MASS,
				is_anchor: node.pin.is_some(),
				user_data: i,
			});
			id_to_idx.insert(node.id.as_str(), idx);
		}

		let mut linked = 0;
		for link in links {
			if let (Some(&src), Some(&tgt)) = (
				id_to_idx.get(link.source.as_str()),
				id_to_idx.get(link.target.as_str()),
			) {
				graph.add_edge(src, tgt, EdgeData {
					user_data: link.score,
				});
				linked += 1;
			}
		}

		debug!("layout started: {} nodes, {} links", nodes.len(), linked);
		self.graph = Some(graph);
		self.params = params.clone();
		self.center = center;
		self.alpha = 1.0;
	}

	fn stop(&mut self) {
		if self.graph.take().is_some() {
			debug!("layout stopped at alpha {:.4}", self.alpha);
		}
		self.alpha = 0.0;
	}

	fn is_running(&self) -> bool {
		self.graph.is_some() && self.alpha >= self.params.alpha_min
	}

	fn tick(&mut self, dt: f32, nodes: &mut [ViewNode]) {
		if !self.is_running() {
			return;
		}
		self.alpha += (0.0 - self.alpha) * self.params.alpha_decay;
		if let Some(graph) = self.graph.as_mut() {
			graph.update(dt * self.alpha as f32);
		}
		self.apply_link_forces();
		self.apply_center_force();

		if let Some(graph) = self.graph.as_ref() {
			graph.visit_nodes(|node| {
				if let Some(view) = nodes.get_mut(node.data.user_data) {
					view.position = Some(Point::new(node.x() as f64, node.y() as f64));
				}
			});
		}

		if self.alpha < self.params.alpha_min {
			debug!("layout settled");
		}
	}

	fn set_pin(&mut self, index: usize, pin: Option<Point>) {
		let Some(graph) = self.graph.as_mut() else {
			return;
		};
		graph.visit_nodes_mut(|node| {
			if node.data.user_data != index {
				return;
			}
			node.data.is_anchor = pin.is_some();
			if let Some(p) = pin {
				node.data.x = p.x as f32;
				node.data.y = p.y as f32;
			}
		});
		self.alpha = self.alpha.max(REHEAT_ALPHA);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::book_graph::types::NodeKind;

	fn node(id: &str, position: Option<Point>) -> ViewNode {
		ViewNode {
			id: id.into(),
			kind: NodeKind::Chapter,
			book_id: "b1".into(),
			label: id.into(),
			color: "#3b82f6",
			chapter_count: None,
			position,
			pin: None,
		}
	}

	fn link(source: &str, target: &str, score: f64) -> ViewLink {
		ViewLink {
			source: source.into(),
			target: target.into(),
			score,
		}
	}

	fn distance(a: &ViewNode, b: &ViewNode) -> f64 {
		let (p, q) = (a.position.unwrap(), b.position.unwrap());
		((p.x - q.x).powi(2) + (p.y - q.y).powi(2)).sqrt()
	}

	#[test]
	fn link_strength_is_capped_and_distance_shrinks_with_score() {
		let params = ForceParams::default();
		assert_eq!(params.link_strength(0.1), 0.1);
		assert_eq!(params.link_strength(0.9), 0.2);
		assert_eq!(params.link_distance(1.0), 20.0);
		assert_eq!(params.link_distance(0.0), 80.0);
		assert!(params.link_distance(0.8) < params.link_distance(0.3));
	}

	#[test]
	fn start_seeds_unplaced_nodes_and_keeps_placed_ones() {
		let mut nodes = vec![node("a", None), node("b", Some(Point::new(3.0, 4.0)))];
		let dims = Dimensions {
			width: 200.0,
			height: 100.0,
		};
		let mut layout = ForceLayout::default();
		layout.start(&mut nodes, &[], dims, &ForceParams::default());

		assert!(layout.is_running());
		assert_eq!(nodes[0].position, Some(phyllotaxis_seed(dims.center(), 0)));
		assert_eq!(nodes[1].position, Some(Point::new(3.0, 4.0)));
	}

	#[test]
	fn stop_halts_position_updates() {
		let mut nodes = vec![
			node("a", Some(Point::new(0.0, 0.0))),
			node("b", Some(Point::new(300.0, 0.0))),
		];
		let links = [link("a", "b", 1.0)];
		let mut layout = ForceLayout::default();
		layout.start(&mut nodes, &links, Dimensions::default(), &ForceParams::default());
		layout.stop();
		assert!(!layout.is_running());

		let before = nodes.clone();
		layout.tick(0.016, &mut nodes);
		assert_eq!(nodes, before);
	}

	#[test]
	fn linked_nodes_pull_together() {
		let mut nodes = vec![
			node("a", Some(Point::new(0.0, 0.0))),
			node("b", Some(Point::new(400.0, 0.0))),
		];
		let links = [link("a", "b", 1.0)];
		let start = distance(&nodes[0], &nodes[1]);
		let mut layout = ForceLayout::default();
		layout.start(&mut nodes, &links, Dimensions::default(), &ForceParams::default());
		for _ in 0..5 {
			layout.tick(0.016, &mut nodes);
		}
		assert!(distance(&nodes[0], &nodes[1]) < start);
	}

	#[test]
	fn unlinked_nodes_repel_and_settle_around_center() {
		let mut nodes = vec![
			node("a", Some(Point::new(2000.0, 2000.0))),
			node("b", Some(Point::new(2001.0, 2000.0))),
		];
		let dims = Dimensions::default();
		let start = distance(&nodes[0], &nodes[1]);
		let mut layout = ForceLayout::default();
		layout.start(&mut nodes, &[], dims, &ForceParams::default());
		for _ in 0..300 {
			layout.tick(0.016, &mut nodes);
		}

		assert!(distance(&nodes[0], &nodes[1]) > start * 20.0);
		let (a, b) = (nodes[0].position.unwrap(), nodes[1].position.unwrap());
		let center = dims.center();
		assert!(((a.x + b.x) / 2.0 - center.x).abs() < 1.0);
		assert!(((a.y + b.y) / 2.0 - center.y).abs() < 1.0);
	}

	#[test]
	fn coincident_nodes_are_split_apart() {
		let same = Point::new(410.0, 300.0);
		let mut nodes = vec![node("a", Some(same)), node("b", Some(same)), node("c", Some(same))];
		let mut layout = ForceLayout::default();
		layout.start(&mut nodes, &[], Dimensions::default(), &ForceParams::default());
		assert_eq!(nodes[0].position, Some(same));
		assert_ne!(nodes[1].position, nodes[0].position);
		assert_ne!(nodes[2].position, nodes[0].position);
		assert_ne!(nodes[2].position, nodes[1].position);

		for _ in 0..300 {
			layout.tick(0.016, &mut nodes);
		}
		assert!(distance(&nodes[0], &nodes[1]) > 20.0);
		assert!(distance(&nodes[1], &nodes[2]) > 20.0);
	}

	#[test]
	fn pinned_node_keeps_its_spot_when_shared() {
		let pin = Point::new(5.0, 5.0);
		let mut nodes = vec![node("a", Some(pin)), node("b", Some(Point::new(0.0, 0.0)))];
		nodes[1].pin = Some(pin);
		let mut layout = ForceLayout::default();
		layout.start(&mut nodes, &[], Dimensions::default(), &ForceParams::default());
		assert_eq!(nodes[1].position, Some(pin));
		assert_ne!(nodes[0].position, Some(pin));
	}

	#[test]
	fn pinned_nodes_do_not_move() {
		let pin = Point::new(10.0, 20.0);
		let mut nodes = vec![node("a", Some(Point::new(0.0, 0.0))), node("b", None)];
		nodes[0].pin = Some(pin);
		let links = [link("a", "b", 0.7)];
		let mut layout = ForceLayout::default();
		layout.start(&mut nodes, &links, Dimensions::default(), &ForceParams::default());
		assert_eq!(nodes[0].position, Some(pin));
		for _ in 0..20 {
			layout.tick(0.016, &mut nodes);
		}
		assert_eq!(nodes[0].position, Some(pin));
	}

	#[test]
	fn set_pin_moves_and_anchors_node() {
		let mut nodes = vec![node("a", Some(Point::new(0.0, 0.0))), node("b", Some(Point::new(50.0, 0.0)))];
		let mut layout = ForceLayout::default();
		layout.start(&mut nodes, &[], Dimensions::default(), &ForceParams::default());
		layout.set_pin(1, Some(Point::new(-40.0, 25.0)));
		for _ in 0..10 {
			layout.tick(0.016, &mut nodes);
		}
		assert_eq!(nodes[1].position, Some(Point::new(-40.0, 25.0)));
	}

	#[test]
	fn simulation_cools_and_stops_itself() {
		let mut nodes = vec![node("a", None), node("b", None), node("c", None)];
		let mut layout = ForceLayout::default();
		layout.start(&mut nodes, &[link("a", "c", 0.5)], Dimensions::default(), &ForceParams::default());
		let mut ticks = 0;
		while layout.is_running() && ticks < 1000 {
			layout.tick(0.016, &mut nodes);
			ticks += 1;
		}
		assert!(!layout.is_running());
		assert!((250..=350).contains(&ticks));
	}

	#[test]
	fn restart_replaces_previous_simulation() {
		let mut first = vec![node("a", Some(Point::new(0.0, 0.0)))];
		let mut layout = ForceLayout::default();
		layout.start(&mut first, &[], Dimensions::default(), &ForceParams::default());
		for _ in 0..50 {
			layout.tick(0.016, &mut first);
		}
		let cooled = layout.alpha();

		let mut second = vec![node("x", Some(Point::new(1.0, 1.0))), node("y", None)];
		layout.start(&mut second, &[], Dimensions::default(), &ForceParams::default());
		assert!(layout.alpha() > cooled);

		let frozen = first.clone();
		layout.tick(0.016, &mut second);
		assert_eq!(first, frozen);
	}
}
