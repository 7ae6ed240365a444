use leptos::prelude::*;

use crate::components::book_graph::{BookGraphCanvas, DomainEdge, DomainGraph, DomainNode};

/// Generate a sample library: `books` books with a varying number of
/// chapters, linked by pseudo-random similarity scores.
fn generate_sample_graph(books: usize, max_chapters: usize) -> DomainGraph {
	let mut nodes = Vec::new();
	let mut chapter_ids = Vec::new();

	for b in 0..books {
		let book_id = format!("book{}", b + 1);
		let count = 1 + (rand_simple(b * 31) * max_chapters as f64) as usize;
		nodes.push(DomainNode::Book {
			id: book_id.clone(),
			size: Some(count),
		});
		for c in 0..count {
			let id = format!("{}-ch{}", book_id, c + 1);
			nodes.push(DomainNode::Chapter {
				id: id.clone(),
				book_id: book_id.clone(),
				title: Some(format!("Chapter {}", c + 1)),
			});
			chapter_ids.push(id);
		}
	}

	let edges = (1..chapter_ids.len())
		.filter_map(|i| {
			let target = (rand_simple(i) * (i as f64)) as usize;
			let score = rand_simple(i * 7 + 3);
			(score > 0.25).then(|| DomainEdge {
				source: chapter_ids[i].clone(),
				target: chapter_ids[target].clone(),
				score,
				kind: Some("similarity".into()),
			})
		})
		.collect();

	DomainGraph { nodes, edges }
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph_data = Signal::derive(move || Some(generate_sample_graph(6, 10)));

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<BookGraphCanvas data=graph_data fullscreen=true />
				<div class="graph-overlay">
					<h1>"Book Graph"</h1>
					<p class="subtitle">
						"Click a book to open its chapters, click a chapter to close it again. Drag to move, shift-drag to pin. Scroll to zoom."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
