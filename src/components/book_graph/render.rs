use std::collections::HashMap;
use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::hit::node_radius;
use super::state::CoreState;
use super::types::{Point, ThemeColors, ViewNode};

const LINK_ALPHA_MIN: f64 = 0.1;
const LINK_ALPHA_SPAN: f64 = 0.8;
const LINK_WIDTH_MIN: f64 = 0.5;
const LINK_WIDTH_SPAN: f64 = 2.0;
const HOVER_RING_GAP: f64 = 4.0;
const HOVER_RING_WIDTH: f64 = 2.0;
const COUNT_FONT: &str = "12px sans-serif";
const LABEL_GAP: f64 = 4.0;

/// Stroke alpha and width for a link of the given score.
pub fn link_style(score: f64) -> (f64, f64) {
	let s = score.clamp(0.0, 1.0);
	(
		LINK_ALPHA_MIN + s * LINK_ALPHA_SPAN,
		LINK_WIDTH_MIN + s * LINK_WIDTH_SPAN,
	)
}

pub fn hover_ring_radius(node: &ViewNode) -> f64 {
	node_radius(node) + HOVER_RING_GAP
}

pub fn render(state: &CoreState, ctx: &CanvasRenderingContext2d) {
	let colors = state.theme.colors();
	let (t, dims) = (state.transform, state.dimensions);

	ctx.save();
	ctx.clear_rect(0.0, 0.0, dims.width, dims.height);
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_links(state, &colors, ctx);
	draw_nodes(state, &colors, ctx);
	if let Some(node) = state.hovered() {
		draw_hover_ring(node, &colors, ctx);
	}
	ctx.restore();
}

fn draw_links(state: &CoreState, colors: &ThemeColors, ctx: &CanvasRenderingContext2d) {
	let placed: HashMap<&str, Point> = state
		.nodes
		.iter()
		.filter_map(|n| n.position.map(|p| (n.id.as_str(), p)))
		.collect();

	for link in &state.links {
		let (Some(s), Some(t)) = (
			placed.get(link.source.as_str()),
			placed.get(link.target.as_str()),
		) else {
			continue;
		};
		let (alpha, width) = link_style(link.score);
		ctx.set_stroke_style_str(&colors.edge_stroke(alpha));
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(s.x, s.y);
		ctx.line_to(t.x, t.y);
		ctx.stroke();
	}
}

fn draw_nodes(state: &CoreState, colors: &ThemeColors, ctx: &CanvasRenderingContext2d) {
	ctx.set_font(COUNT_FONT);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	for node in &state.nodes {
		let Some(p) = node.position else { continue };
		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, node_radius(node), 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node.color);
		ctx.fill();

		if node.is_book() {
			ctx.set_fill_style_str(colors.text);
			let count = node.chapter_count.unwrap_or(0);
			let _ = ctx.fill_text(&count.to_string(), p.x, p.y);
		}
	}
}

fn draw_hover_ring(node: &ViewNode, colors: &ThemeColors, ctx: &CanvasRenderingContext2d) {
	let Some(p) = node.position else { return };
	ctx.begin_path();
	let _ = ctx.arc(p.x, p.y, hover_ring_radius(node), 0.0, 2.0 * PI);
	ctx.set_stroke_style_str(colors.text);
	ctx.set_line_width(HOVER_RING_WIDTH);
	ctx.stroke();

	ctx.set_fill_style_str(colors.text);
	ctx.set_text_align("left");
	let _ = ctx.fill_text(&node.label, p.x + hover_ring_radius(node) + LABEL_GAP, p.y);
}
