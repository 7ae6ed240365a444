use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::Action;
use super::store::GraphStore;
use super::types::{DomainGraph, Point, Theme, Transform};

const FRAME_DT: f32 = 0.016;
const CLICK_SLOP: f64 = 3.0;
const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 10.0;

#[derive(Clone, Debug)]
struct DragState {
	node_id: String,
	book_id: String,
	start_x: f64,
	start_y: f64,
	moved: bool,
}

#[derive(Clone, Debug)]
struct PanState {
	start_x: f64,
	start_y: f64,
	transform_start: Transform,
}

#[derive(Default)]
struct PointerState {
	drag: Option<DragState>,
	pan: Option<PanState>,
}

fn local_position(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

fn preferred_theme(window: &Window) -> Theme {
	match window.match_media("(prefers-color-scheme: dark)") {
		Ok(Some(query)) if query.matches() => Theme::Dark,
		_ => Theme::Light,
	}
}

fn set_cursor(canvas: &HtmlCanvasElement, cursor: &str) {
	let _ = web_sys::HtmlElement::style(canvas).set_property("cursor", cursor);
}

/// Canvas view of a book graph. `data` is `None` while the graph is loading.
#[component]
pub fn BookGraphCanvas(
	#[prop(into)] data: Signal<Option<DomainGraph>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let store = Rc::new(RefCell::new(GraphStore::default()));
	let pointer = Rc::new(RefCell::new(PointerState::default()));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (store_init, animate_init, resize_cb_init) =
		(store.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if animate_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			error!("no window available, graph canvas disabled");
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = context_2d(&canvas) else {
			error!("2d canvas context unavailable");
			return;
		};

		{
			let mut s = store_init.borrow_mut();
			s.dispatch(Action::Resize {
				width: w,
				height: h,
			});
			s.dispatch(Action::SetTheme {
				theme: preferred_theme(&window),
			});
		}

		if fullscreen {
			let (store_resize, canvas_resize) = (store_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				store_resize.borrow_mut().dispatch(Action::Resize {
					width: nw,
					height: nh,
				});
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (store_anim, animate_inner) = (store_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			{
				let mut s = store_anim.borrow_mut();
				if s.layout_running() {
					s.tick(FRAME_DT);
				}
				render::render(s.state(), &ctx);
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let store_data = store.clone();
	Effect::new(move |_| match data.get() {
		Some(graph) => store_data
			.borrow_mut()
			.dispatch(Action::LoadGraphSuccess { graph }),
		None => store_data.borrow_mut().dispatch(Action::LoadGraphStart),
	});

	let (store_md, pointer_md) = (store.clone(), pointer.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = local_position(&canvas, &ev);
		let s = store_md.borrow();
		let mut p = pointer_md.borrow_mut();

		if let Some(node) = s.node_at_screen(x, y) {
			p.drag = Some(DragState {
				node_id: node.id.clone(),
				book_id: node.book_id.clone(),
				start_x: x,
				start_y: y,
				moved: false,
			});
		} else {
			p.pan = Some(PanState {
				start_x: x,
				start_y: y,
				transform_start: s.state().transform,
			});
			set_cursor(&canvas, "grabbing");
		}
	};

	let (store_mm, pointer_mm) = (store.clone(), pointer.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = local_position(&canvas, &ev);
		let mut s = store_mm.borrow_mut();
		let mut p = pointer_mm.borrow_mut();

		if let Some(drag) = p.drag.as_mut() {
			if !drag.moved && (x - drag.start_x).hypot(y - drag.start_y) > CLICK_SLOP {
				drag.moved = true;
			}
			if drag.moved {
				let (wx, wy) = s.state().transform.screen_to_world(x, y);
				s.pin_node(&drag.node_id, Point::new(wx, wy));
			}
		} else if let Some(pan) = p.pan.as_ref() {
			let t = pan.transform_start;
			s.dispatch(Action::SetTransform {
				transform: Transform {
					x: t.x + (x - pan.start_x),
					y: t.y + (y - pan.start_y),
					k: t.k,
				},
			});
		} else {
			let hovered = s.node_at_screen(x, y).map(|n| n.id.clone());
			set_cursor(&canvas, if hovered.is_some() { "pointer" } else { "grab" });
			if hovered != s.state().hovered_node {
				s.dispatch(Action::SetHoveredNode { node: hovered });
			}
		}
	};

	let (store_mu, pointer_mu) = (store.clone(), pointer.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let mut s = store_mu.borrow_mut();
		let mut p = pointer_mu.borrow_mut();
		if let Some(drag) = p.drag.take() {
			if !drag.moved {
				s.dispatch(Action::ToggleBook {
					book_id: drag.book_id,
				});
			} else if !ev.shift_key() {
				s.release_node(&drag.node_id);
			}
		}
		if p.pan.take().is_some()
			&& let Some(canvas) = canvas_ref.get()
		{
			let canvas: HtmlCanvasElement = canvas.into();
			set_cursor(&canvas, "grab");
		}
	};

	let (store_ml, pointer_ml) = (store.clone(), pointer.clone());
	let on_mouseleave = move |_: MouseEvent| {
		let mut s = store_ml.borrow_mut();
		let mut p = pointer_ml.borrow_mut();
		if let Some(drag) = p.drag.take()
			&& drag.moved
		{
			s.release_node(&drag.node_id);
		}
		p.pan = None;
		if s.state().hovered_node.is_some() {
			s.dispatch(Action::SetHoveredNode { node: None });
		}
	};

	let store_wh = store.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = local_position(&canvas, &ev);
		let mut s = store_wh.borrow_mut();
		let t = s.state().transform;
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		let k = (t.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = k / t.k;
		s.dispatch(Action::SetTransform {
			transform: Transform {
				x: x - (x - t.x) * ratio,
				y: y - (y - t.y) * ratio,
				k,
			},
		});
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="book-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
