use std::collections::HashSet;

use log::debug;

use super::hit::find_node_at_position;
use super::layout::{ForceLayout, ForceParams, LayoutEngine};
use super::state::{Action, CoreState, reduce};
use super::types::{DomainGraph, DomainNode, Point, ViewNode, book_key, chapter_key};
use super::view::build_view;

/// Owns the state, the layout engine, and the last known placement of nodes
/// that have left the view (chapters of a collapsed book, aggregates of an
/// expanded one) so they come back where they were.
pub struct GraphStore {
	state: CoreState,
	layout: Box<dyn LayoutEngine>,
	params: ForceParams,
	departed: Vec<ViewNode>,
}

impl Default for GraphStore {
	fn default() -> Self {
		Self::new(Box::new(ForceLayout::default()), ForceParams::default())
	}
}

impl GraphStore {
	pub fn new(layout: Box<dyn LayoutEngine>, params: ForceParams) -> Self {
		Self {
			state: CoreState::default(),
			layout,
			params,
			departed: Vec::new(),
		}
	}

	pub fn state(&self) -> &CoreState {
		&self.state
	}

	pub fn layout_running(&self) -> bool {
		self.layout.is_running()
	}

	pub fn dispatch(&mut self, action: Action) {
		let next = reduce(&self.state, action);
		let rebuild = self.state.needs_rebuild(&next);
		self.state = next;
		if rebuild {
			self.rebuild();
		}
	}

	/// Rebuild the view from the current positions and restart the layout.
	fn rebuild(&mut self) {
		let Some(graph) = self.state.graph.clone() else {
			return;
		};

		let current = std::mem::take(&mut self.state.nodes);
		let mut previous: Vec<ViewNode> = {
			let current_ids: HashSet<&str> = current.iter().map(|n| n.id.as_str()).collect();
			self.departed
				.drain(..)
				.filter(|n| !current_ids.contains(n.id.as_str()))
				.collect()
		};
		previous.extend(current);

		let mut view = build_view(
			Some(&graph),
			&self.state.expanded_books,
			self.state.dimensions,
			&previous,
		);

		self.departed = {
			let kept: HashSet<&str> = view.nodes.iter().map(|n| n.id.as_str()).collect();
			let known = view_ids(&graph);
			previous
				.into_iter()
				.filter(|n| {
					n.position.is_some()
						&& !kept.contains(n.id.as_str())
						&& known.contains(n.id.as_str())
				})
				.collect()
		};

		debug!(
			"view rebuilt: {} nodes, {} links",
			view.nodes.len(),
			view.links.len()
		);
		self.layout.start(
			&mut view.nodes,
			&view.links,
			self.state.dimensions,
			&self.params,
		);
		self.state.nodes = view.nodes;
		self.state.links = view.links;

		if let Some(hovered) = self.state.hovered_node.as_deref()
			&& !self.state.nodes.iter().any(|n| n.id == hovered)
		{
			self.state.hovered_node = None;
		}
	}

	pub fn tick(&mut self, dt: f32) {
		self.layout.tick(dt, &mut self.state.nodes);
	}

	/// Topmost node under a screen-space point.
	pub fn node_at_screen(&self, sx: f64, sy: f64) -> Option<&ViewNode> {
		let (x, y) = self.state.transform.screen_to_world(sx, sy);
		find_node_at_position(&self.state.nodes, x, y)
	}

	pub fn pin_node(&mut self, id: &str, at: Point) {
		self.set_pin(id, Some(at));
	}

	pub fn release_node(&mut self, id: &str) {
		self.set_pin(id, None);
	}

	fn set_pin(&mut self, id: &str, pin: Option<Point>) {
		let Some(index) = self.state.nodes.iter().position(|n| n.id == id) else {
			return;
		};
		let node = &mut self.state.nodes[index];
		node.pin = pin;
		if let Some(p) = pin {
			node.position = Some(p);
		}
		self.layout.set_pin(index, pin);
	}
}

/// Every view-node id the graph can produce, whatever is expanded.
fn view_ids(graph: &DomainGraph) -> HashSet<String> {
	graph
		.nodes
		.iter()
		.map(|node| match node {
			DomainNode::Book { id, .. } => book_key(id),
			DomainNode::Chapter { id, .. } => chapter_key(id),
		})
		.collect()
}
