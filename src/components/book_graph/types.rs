use serde::{Deserialize, Serialize};

use super::error::GraphError;

/// A node of the loaded book graph, tagged by `"type"` on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DomainNode {
	/// Top-level entity, shown as one aggregate node while collapsed.
	Book {
		/// Book id, unique among books.
		id: String,
		/// Declared chapter count, used when no chapters are loaded.
		#[serde(default)]
		size: Option<usize>,
	},
	/// Leaf entity owned by exactly one book.
	Chapter {
		/// Chapter id, unique among chapters.
		id: String,
		/// Id of the owning book.
		book_id: String,
		/// Display title.
		#[serde(default)]
		title: Option<String>,
	},
}

/// A similarity edge between two chapters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomainEdge {
	/// Source chapter id.
	pub source: String,
	/// Target chapter id.
	pub target: String,
	/// Strength in `[0, 1]`.
	pub score: f64,
	/// Optional edge type tag.
	#[serde(default, rename = "type")]
	pub kind: Option<String>,
}

/// Books, chapters and the edges between chapters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainGraph {
	/// Books and chapters, in loader order.
	pub nodes: Vec<DomainNode>,
	/// Chapter-to-chapter edges.
	#[serde(default)]
	pub edges: Vec<DomainEdge>,
}

impl DomainGraph {
	/// Decode a graph from its JSON wire form.
	pub fn from_json(json: &str) -> Result<Self, GraphError> {
		serde_json::from_str(json).map_err(GraphError::InvalidGraph)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiPhase {
	#[default]
	Idle,
	Loading,
	Ready,
}

/// Color scheme used for edges and text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
	/// Dark text on a light page.
	#[default]
	Light,
	/// Light text on a dark page.
	Dark,
}

/// Colors resolved from a [`Theme`] once per draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThemeColors {
	/// RGB of link strokes; alpha comes from the link score.
	pub edge_base: (u8, u8, u8),
	/// Fill for count labels and the hover ring.
	pub text: &'static str,
}

impl Theme {
	/// Fixed colors for this theme.
	pub fn colors(self) -> ThemeColors {
		match self {
			Theme::Light => ThemeColors {
				edge_base: (100, 116, 139),
				text: "#0f172a",
			},
			Theme::Dark => ThemeColors {
				edge_base: (148, 163, 184),
				text: "#e2e8f0",
			},
		}
	}
}

impl ThemeColors {
	/// CSS color of a link stroke with the given alpha.
	pub fn edge_stroke(&self, alpha: f64) -> String {
		let (r, g, b) = self.edge_base;
		format!("rgba({r}, {g}, {b}, {alpha})")
	}
}

/// Pan offset and uniform zoom applied to the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
	/// Horizontal pan in screen pixels.
	pub x: f64,
	/// Vertical pan in screen pixels.
	pub y: f64,
	/// Zoom factor.
	pub k: f64,
}

impl Default for Transform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl Transform {
	/// Map a canvas-local point into layout coordinates.
	pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions {
	pub width: f64,
	pub height: f64,
}

impl Default for Dimensions {
	fn default() -> Self {
		Self {
			width: 800.0,
			height: 600.0,
		}
	}
}

impl Dimensions {
	pub fn center(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}
}

/// World-space coordinate pair. Positions and pins are stored whole so a
/// reader never sees x from one tick and y from another.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
	Book,
	Chapter,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewNode {
	pub id: String,
	pub kind: NodeKind,
	pub book_id: String,
	pub label: String,
	pub color: &'static str,
	pub chapter_count: Option<usize>,
	pub position: Option<Point>,
	pub pin: Option<Point>,
}

impl ViewNode {
	pub fn is_book(&self) -> bool {
		self.kind == NodeKind::Book
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewLink {
	pub source: String,
	pub target: String,
	pub score: f64,
}

pub fn book_key(book_id: &str) -> String {
	format!("book-{book_id}")
}

pub fn chapter_key(chapter_id: &str) -> String {
	format!("chapter-{chapter_id}")
}
