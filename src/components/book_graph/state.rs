use std::collections::HashSet;
use std::rc::Rc;

use log::{debug, warn};
use serde::Deserialize;

use super::error::GraphError;
use super::types::{Dimensions, DomainGraph, Theme, Transform, UiPhase, ViewLink, ViewNode};

/// UI actions accepted by the graph view.
///
/// On the wire an action is an object tagged by `"type"`. Tags outside the
/// known set decode to [`Action::Unknown`], which the reducer ignores.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
	/// A graph load has begun.
	LoadGraphStart,
	/// A graph finished loading and replaces the current one.
	LoadGraphSuccess {
		/// The loaded graph.
		graph: DomainGraph,
	},
	/// Expand a collapsed book or collapse an expanded one.
	ToggleBook {
		/// Book to toggle.
		#[serde(rename = "bookId")]
		book_id: String,
	},
	/// Change the hovered node, by view-node id.
	SetHoveredNode {
		/// Hovered view-node id, if any.
		node: Option<String>,
	},
	/// Replace the pan/zoom transform.
	SetTransform {
		/// New transform.
		transform: Transform,
	},
	/// Switch between light and dark colors.
	SetTheme {
		/// New theme.
		theme: Theme,
	},
	/// The drawing surface changed size.
	Resize {
		/// Surface width in pixels.
		width: f64,
		/// Surface height in pixels.
		height: f64,
	},
	/// Any unrecognized action kind.
	#[serde(other)]
	Unknown,
}

impl Action {
	/// Decode an action from its JSON wire form.
	pub fn from_json(json: &str) -> Result<Self, GraphError> {
		serde_json::from_str(json).map_err(GraphError::InvalidAction)
	}
}

/// Everything the graph view knows. Updated by value through [`reduce`];
/// only the layout driver writes into `nodes` in place, and only positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoreState {
	pub ui_phase: UiPhase,
	pub graph: Option<Rc<DomainGraph>>,
	pub expanded_books: HashSet<String>,
	pub dimensions: Dimensions,
	pub nodes: Vec<ViewNode>,
	pub links: Vec<ViewLink>,
	pub transform: Transform,
	pub hovered_node: Option<String>,
	pub theme: Theme,
}

impl CoreState {
	pub fn hovered(&self) -> Option<&ViewNode> {
		let id = self.hovered_node.as_deref()?;
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Whether the view must be rebuilt to reflect `next`.
	pub fn needs_rebuild(&self, next: &CoreState) -> bool {
		!opt_rc_eq(&self.graph, &next.graph)
			|| self.expanded_books != next.expanded_books
			|| self.dimensions != next.dimensions
	}
}

fn opt_rc_eq(a: &Option<Rc<DomainGraph>>, b: &Option<Rc<DomainGraph>>) -> bool {
	match (a, b) {
		(Some(a), Some(b)) => Rc::ptr_eq(a, b),
		(None, None) => true,
		_ => false,
	}
}

pub fn reduce(state: &CoreState, action: Action) -> CoreState {
	let mut next = state.clone();
	match action {
		Action::LoadGraphStart => {
			debug!("graph load started");
			next.ui_phase = UiPhase::Loading;
		}
		Action::LoadGraphSuccess { graph } => {
			debug!(
				"graph loaded: {} nodes, {} edges",
				graph.nodes.len(),
				graph.edges.len()
			);
			next.graph = Some(Rc::new(graph));
			next.expanded_books.clear();
			next.ui_phase = UiPhase::Ready;
		}
		Action::ToggleBook { book_id } => {
			if !next.expanded_books.remove(&book_id) {
				next.expanded_books.insert(book_id);
			}
		}
		Action::SetHoveredNode { node } => next.hovered_node = node,
		Action::SetTransform { transform } => next.transform = transform,
		Action::SetTheme { theme } => next.theme = theme,
		Action::Resize { width, height } => next.dimensions = Dimensions { width, height },
		Action::Unknown => warn!("unknown action ignored"),
	}
	next
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::book_graph::types::DomainNode;

	fn loaded() -> CoreState {
		let graph = DomainGraph {
			nodes: vec![DomainNode::Book {
				id: "b1".into(),
				size: None,
			}],
			edges: vec![],
		};
		let mut state = reduce(&CoreState::default(), Action::LoadGraphStart);
		state = reduce(&state, Action::LoadGraphSuccess { graph });
		state
	}

	#[test]
	fn phase_moves_idle_loading_ready() {
		let idle = CoreState::default();
		assert_eq!(idle.ui_phase, UiPhase::Idle);
		let loading = reduce(&idle, Action::LoadGraphStart);
		assert_eq!(loading.ui_phase, UiPhase::Loading);
		assert!(loading.graph.is_none());
		assert_eq!(loaded().ui_phase, UiPhase::Ready);
	}

	#[test]
	fn load_success_collapses_every_book() {
		let mut state = loaded();
		state = reduce(&state, Action::ToggleBook { book_id: "b1".into() });
		assert!(state.expanded_books.contains("b1"));

		let reloaded = reduce(
			&state,
			Action::LoadGraphSuccess {
				graph: DomainGraph::default(),
			},
		);
		assert!(reloaded.expanded_books.is_empty());
		assert!(state.needs_rebuild(&reloaded));
	}

	#[test]
	fn toggle_book_flips_membership() {
		let state = loaded();
		let open = reduce(&state, Action::ToggleBook { book_id: "b1".into() });
		let closed = reduce(&open, Action::ToggleBook { book_id: "b1".into() });
		assert!(open.expanded_books.contains("b1"));
		assert!(closed.expanded_books.is_empty());
		assert!(state.needs_rebuild(&open));
	}

	#[test]
	fn view_only_actions_do_not_require_rebuild() {
		let state = loaded();
		let next = reduce(
			&state,
			Action::SetTransform {
				transform: Transform {
					x: 5.0,
					y: 6.0,
					k: 2.0,
				},
			},
		);
		let next = reduce(&next, Action::SetTheme { theme: Theme::Dark });
		let next = reduce(
			&next,
			Action::SetHoveredNode {
				node: Some("book-b1".into()),
			},
		);
		assert_eq!(next.theme, Theme::Dark);
		assert_eq!(next.transform.k, 2.0);
		assert_eq!(next.hovered_node.as_deref(), Some("book-b1"));
		assert!(!state.needs_rebuild(&next));

		let resized = reduce(
			&next,
			Action::Resize {
				width: 1024.0,
				height: 768.0,
			},
		);
		assert!(next.needs_rebuild(&resized));
	}

	#[test]
	fn unknown_action_leaves_state_unchanged() {
		let mut state = loaded();
		state = reduce(&state, Action::ToggleBook { book_id: "b1".into() });
		let action = Action::from_json(r#"{"type": "SHUFFLE_BOOKS", "seed": 3}"#).unwrap();
		assert_eq!(action, Action::Unknown);

		let next = reduce(&state, action);
		assert_eq!(next, state);
		assert_eq!(next.ui_phase, state.ui_phase);
		assert_eq!(next.expanded_books, state.expanded_books);
		assert_eq!(next.nodes, state.nodes);
		assert_eq!(next.links, state.links);
		assert_eq!(next.transform, state.transform);
		assert_eq!(next.hovered_node, state.hovered_node);
		assert_eq!(next.theme, state.theme);
		assert_eq!(next.dimensions, state.dimensions);
		assert!(!state.needs_rebuild(&next));
	}

	#[test]
	fn actions_decode_from_wire_form() {
		assert_eq!(
			Action::from_json(r#"{"type": "TOGGLE_BOOK", "bookId": "b7"}"#).unwrap(),
			Action::ToggleBook { book_id: "b7".into() }
		);
		assert_eq!(
			Action::from_json(r#"{"type": "SET_THEME", "theme": "dark"}"#).unwrap(),
			Action::SetTheme { theme: Theme::Dark }
		);
		assert_eq!(
			Action::from_json(r#"{"type": "SET_HOVERED_NODE", "node": null}"#).unwrap(),
			Action::SetHoveredNode { node: None }
		);
		assert!(matches!(
			Action::from_json(r#"{"type": "RESIZE", "width": "wide"}"#),
			Err(GraphError::InvalidAction(_))
		));
	}
}
