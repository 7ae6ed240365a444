use super::types::{NodeKind, ViewNode};

pub const BOOK_BASE_RADIUS: f64 = 12.0;
pub const BOOK_RADIUS_SCALE: f64 = 2.2;
pub const CHAPTER_RADIUS: f64 = 5.5;

/// Radius a node is drawn with. Hit-testing uses the same value so the
/// clickable area matches the disc on screen.
pub fn node_radius(node: &ViewNode) -> f64 {
	match node.kind {
		NodeKind::Book => {
			let count = node.chapter_count.unwrap_or(1).max(1) as f64;
			BOOK_BASE_RADIUS + count.sqrt() * BOOK_RADIUS_SCALE
		}
		NodeKind::Chapter => CHAPTER_RADIUS,
	}
}

/// Topmost node whose disc contains the world-space point `(x, y)`.
pub fn find_node_at_position(nodes: &[ViewNode], x: f64, y: f64) -> Option<&ViewNode> {
	nodes.iter().rev().find(|node| {
		let Some(p) = node.position else {
			return false;
		};
		let r = node_radius(node);
		let (dx, dy) = (x - p.x, y - p.y);
		dx * dx + dy * dy <= r * r
	})
}
