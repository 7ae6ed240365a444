//! Rebuilds the renderable node/link set from the domain graph and the
//! expansion state, carrying positions over from the previous view.

use std::collections::{HashMap, HashSet};

use super::types::{
	Dimensions, DomainGraph, DomainNode, NodeKind, Point, ViewLink, ViewNode, book_key,
	chapter_key,
};

pub const BOOK_COLORS: &[&str] = &["#3b82f6", "#22c55e", "#f59e0b", "#ef4444", "#8b5cf6"];

const SEED_ANGLE_STEP: f64 = 0.55;
const SEED_BASE_RADIUS: f64 = 10.0;
const SEED_RADIUS_STEP: f64 = 3.2;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct View {
	pub nodes: Vec<ViewNode>,
	pub links: Vec<ViewLink>,
}

#[derive(Clone, Copy)]
struct PrevPlacement {
	position: Point,
	pin: Option<Point>,
}

#[derive(Default)]
struct Centroid {
	x: f64,
	y: f64,
	count: usize,
}

impl Centroid {
	fn mean(&self) -> Option<Point> {
		(self.count > 0).then(|| Point::new(self.x / self.count as f64, self.y / self.count as f64))
	}
}

struct Chapter<'a> {
	id: &'a str,
	book_id: &'a str,
	title: Option<&'a str>,
}

/// Seed position for the `index`-th chapter fanned out around `anchor`.
pub fn chapter_seed(anchor: Point, index: usize) -> Point {
	let i = index as f64;
	let angle = i * SEED_ANGLE_STEP;
	let radius = SEED_BASE_RADIUS + i * SEED_RADIUS_STEP;
	Point::new(anchor.x + angle.cos() * radius, anchor.y + angle.sin() * radius)
}

pub fn build_view(
	graph: Option<&DomainGraph>,
	expanded_books: &HashSet<String>,
	dimensions: Dimensions,
	previous_nodes: &[ViewNode],
) -> View {
	let Some(graph) = graph else {
		return View::default();
	};

	let mut books = Vec::new();
	let mut chapters = Vec::new();
	for node in &graph.nodes {
		match node {
			DomainNode::Book { id, size } => books.push((id.as_str(), *size)),
			DomainNode::Chapter { id, book_id, title } => chapters.push(Chapter {
				id,
				book_id,
				title: title.as_deref(),
			}),
		}
	}

	let mut chapter_counts: HashMap<&str, usize> = HashMap::new();
	for chapter in &chapters {
		*chapter_counts.entry(chapter.book_id).or_default() += 1;
	}

	let prev_positions: HashMap<&str, PrevPlacement> = previous_nodes
		.iter()
		.filter_map(|n| {
			n.position.map(|position| {
				(
					n.id.as_str(),
					PrevPlacement {
						position,
						pin: n.pin,
					},
				)
			})
		})
		.collect();

	let mut centroids: HashMap<&str, Centroid> = HashMap::new();
	for node in previous_nodes.iter().filter(|n| n.kind == NodeKind::Chapter) {
		let Some(p) = node.position else { continue };
		let c = centroids.entry(node.book_id.as_str()).or_default();
		c.x += p.x;
		c.y += p.y;
		c.count += 1;
	}

	let mut nodes = Vec::new();
	let mut visible = HashSet::new();

	for (i, &(book_id, size)) in books.iter().enumerate() {
		let color = BOOK_COLORS[i % BOOK_COLORS.len()];
		let key = book_key(book_id);
		let prev_book = prev_positions.get(key.as_str());

		if expanded_books.contains(book_id) {
			let anchor = prev_book
				.map(|p| p.position)
				.or_else(|| centroids.get(book_id).and_then(Centroid::mean))
				.unwrap_or_else(|| dimensions.center());

			for (index, chapter) in chapters.iter().filter(|c| c.book_id == book_id).enumerate() {
				let id = chapter_key(chapter.id);
				let prev = prev_positions.get(id.as_str());
				visible.insert(id.clone());
				nodes.push(ViewNode {
					id,
					kind: NodeKind::Chapter,
					book_id: book_id.to_string(),
					label: chapter.title.unwrap_or(chapter.id).to_string(),
					color,
					chapter_count: None,
					position: Some(
						prev.map(|p| p.position)
							.unwrap_or_else(|| chapter_seed(anchor, index)),
					),
					pin: prev.and_then(|p| p.pin),
				});
			}
		} else {
			nodes.push(ViewNode {
				id: key,
				kind: NodeKind::Book,
				book_id: book_id.to_string(),
				label: book_id.to_string(),
				color,
				chapter_count: chapter_counts.get(book_id).copied().or(size),
				position: prev_book.map(|p| p.position),
				pin: prev_book.and_then(|p| p.pin),
			});
		}
	}

	let links = graph
		.edges
		.iter()
		.filter_map(|edge| {
			let (source, target) = (chapter_key(&edge.source), chapter_key(&edge.target));
			(visible.contains(&source) && visible.contains(&target)).then_some(ViewLink {
				source,
				target,
				score: edge.score,
			})
		})
		.collect();

	View { nodes, links }
}
