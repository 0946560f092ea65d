use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent, WheelEvent};

use starchart_shared::CorridorId;

use crate::app::{ActiveTheme, Galaxy, HoveredCorridor};
use crate::colors::{Palette, Rgb, brighten, rgba_css};
use crate::config::LABEL_DEBOUNCE_MS;
use crate::galaxy::GalaxyView;
use crate::hit_test::{self, Hit};
use crate::labels::{PlacedLabel, WealthClass};
use crate::markers::{
    self, ColorRole, MarkerShape, RING_WEIGHT, ROUTE_OPACITY, ROUTE_WEIGHT, corridor_color,
    pulse_alpha, transit_color,
};
use crate::render_loop::RenderScheduler;
use crate::scene::{CorridorOverlay, Layer, MarkerOverlay, Overlay, RingOverlay, RouteOverlay};
use crate::viewport::Viewport;

/// Pointer travel below this still counts as a click rather than a drag.
const CLICK_SLOP_PX: f64 = 5.0;
/// Lines with both ends this far past the same edge are skipped.
const CULL_MARGIN_PX: f64 = 50.0;
const MARKER_FILL_ALPHA: f64 = 0.85;

struct Frame<'a> {
    ctx: &'a CanvasRenderingContext2d,
    w: f64,
    h: f64,
    vp: &'a Viewport,
    palette: Palette,
    hovered: Option<CorridorId>,
    now: f64,
}

impl Frame<'_> {
    fn color(&self, role: ColorRole, alpha: f64) -> String {
        let (r, g, b) = role.resolve(&self.palette);
        rgba_css(r, g, b, alpha)
    }

    fn off_screen(&self, a: (f64, f64), b: (f64, f64)) -> bool {
        let m = CULL_MARGIN_PX;
        (a.0 < -m && b.0 < -m)
            || (a.1 < -m && b.1 < -m)
            || (a.0 > self.w + m && b.0 > self.w + m)
            || (a.1 > self.h + m && b.1 > self.h + m)
    }
}

fn rgb_css((r, g, b): Rgb) -> String {
    rgba_css(r, g, b, 1.0)
}

fn local_point(
    canvas_ref: NodeRef<leptos::html::Canvas>,
    client_x: i32,
    client_y: i32,
    fallback: (i32, i32),
) -> (f64, f64) {
    canvas_ref
        .get_untracked()
        .map(|el| {
            let rect = el.get_bounding_client_rect();
            (client_x as f64 - rect.left(), client_y as f64 - rect.top())
        })
        .unwrap_or((fallback.0 as f64, fallback.1 as f64))
}

/// The galaxy map: a single Canvas 2D element with pan, zoom, hover and
/// click handling.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let Galaxy(galaxy) = expect_context();
    let viewport: RwSignal<Viewport> = expect_context();
    let ActiveTheme(theme) = expect_context();
    let HoveredCorridor(hovered_corridor) = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    let is_dragging = Rc::new(Cell::new(false));
    let drag_start_x = Rc::new(Cell::new(0.0f64));
    let drag_start_y = Rc::new(Cell::new(0.0f64));
    let last_x = Rc::new(Cell::new(0.0f64));
    let last_y = Rc::new(Cell::new(0.0f64));
    let pinch_dist = Rc::new(Cell::new(0.0f64));

    let cached_ctx: RefCell<Option<CanvasRenderingContext2d>> = RefCell::new(None);

    let scheduler = RenderScheduler::new(move || {
        let Some(canvas) = canvas_ref.get_untracked() else {
            return false;
        };
        let canvas: &HtmlCanvasElement = &canvas;
        let Some(parent) = canvas.parent_element() else {
            return false;
        };
        let w = parent.client_width() as f64;
        let h = parent.client_height() as f64;
        if w <= 0.0 || h <= 0.0 {
            return false;
        }

        let dpr = web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0)
            .max(1.0);
        let pw = (w * dpr).round() as u32;
        let ph = (h * dpr).round() as u32;
        if canvas.width() != pw || canvas.height() != ph {
            canvas.set_width(pw);
            canvas.set_height(ph);
            *cached_ctx.borrow_mut() = None;
        }
        if viewport.with_untracked(|vp| vp.width != w || vp.height != h) {
            viewport.update(|vp| vp.resize(w, h));
        }

        let ctx = {
            let mut cache = cached_ctx.borrow_mut();
            if cache.is_none() {
                let Some(ctx) = canvas
                    .get_context("2d")
                    .ok()
                    .flatten()
                    .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
                else {
                    return false;
                };
                *cache = Some(ctx);
            }
            let Some(ctx) = cache.clone() else {
                return false;
            };
            ctx
        };
        ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();

        let vp = viewport.get_untracked();
        galaxy.with_untracked(|g| {
            paint(
                &Frame {
                    ctx: &ctx,
                    w,
                    h,
                    vp: &vp,
                    palette: theme.get_untracked().palette(),
                    hovered: hovered_corridor.get_untracked(),
                    now: js_sys::Date::now(),
                },
                g,
            )
        })
    });
    let scheduler = Rc::new(scheduler);

    // Any change to the scene, theme or hover state repaints.
    let sched_state = scheduler.clone();
    Effect::new(move || {
        galaxy.track();
        theme.track();
        hovered_corridor.track();
        sched_state.mark_dirty();
    });

    // Pan/zoom repaints now and relabels once movement settles.
    let sched_vp = scheduler.clone();
    let relabel_timer: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));
    Effect::new(move || {
        viewport.track();
        sched_vp.mark_dirty();
        if !galaxy.with_untracked(GalaxyView::show_labels) {
            relabel_timer.borrow_mut().take();
            return;
        }
        let timer = Timeout::new(LABEL_DEBOUNCE_MS, move || {
            let vp = viewport.get_untracked();
            galaxy.update(|g| g.relabel(&vp));
        });
        *relabel_timer.borrow_mut() = Some(timer);
    });

    // --- Input handlers ---

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let delta = e.delta_y();
        let x = e.offset_x() as f64;
        let y = e.offset_y() as f64;
        viewport.update(|vp| vp.zoom_at(delta, x, y));
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        move |e: PointerEvent| {
            is_dragging.set(true);
            drag_start_x.set(e.client_x() as f64);
            drag_start_y.set(e.client_y() as f64);
            last_x.set(e.client_x() as f64);
            last_y.set(e.client_y() as f64);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        move |e: PointerEvent| {
            if is_dragging.get() {
                let dx = e.client_x() as f64 - last_x.get();
                let dy = e.client_y() as f64 - last_y.get();
                last_x.set(e.client_x() as f64);
                last_y.set(e.client_y() as f64);
                viewport.update(|vp| vp.pan(dx, dy));
                return;
            }

            let (x, y) = local_point(
                canvas_ref,
                e.client_x(),
                e.client_y(),
                (e.offset_x(), e.offset_y()),
            );
            let vp = viewport.get_untracked();
            let hit = galaxy.with_untracked(|g| hit_test::find_at(g.scene(), &vp, x, y));
            let corridor = match hit {
                Some(Hit::Corridor(id)) => Some(id),
                _ => None,
            };
            if corridor != hovered_corridor.get_untracked() {
                hovered_corridor.set(corridor);
            }
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                let cursor = if hit.is_some() { "pointer" } else { "grab" };
                el.style().set_property("cursor", cursor).ok();
            }
        }
    };

    let on_pointer_up = {
        let is_dragging = is_dragging.clone();
        move |e: PointerEvent| {
            is_dragging.set(false);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }
        }
    };

    let on_pointer_leave = move |_: PointerEvent| {
        if hovered_corridor.get_untracked().is_some() {
            hovered_corridor.set(None);
        }
    };

    let on_click = {
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        move |e: MouseEvent| {
            let dx = (e.client_x() as f64 - drag_start_x.get()).abs();
            let dy = (e.client_y() as f64 - drag_start_y.get()).abs();
            if dx >= CLICK_SLOP_PX || dy >= CLICK_SLOP_PX {
                return;
            }
            let (x, y) = local_point(
                canvas_ref,
                e.client_x(),
                e.client_y(),
                (e.offset_x(), e.offset_y()),
            );
            let vp = viewport.get_untracked();
            let hit = galaxy.with_untracked(|g| hit_test::find_at(g.scene(), &vp, x, y));
            galaxy.update(|g| match hit {
                Some(Hit::Location(id)) => {
                    g.select_location(id);
                }
                Some(Hit::Corridor(id)) => {
                    g.select_corridor(id);
                }
                None => g.hide_location_panel(),
            });
        }
    };

    let on_touch_start = {
        let pinch_dist = pinch_dist.clone();
        move |e: web_sys::TouchEvent| {
            let touches = e.touches();
            if touches.length() != 2 {
                return;
            }
            e.prevent_default();
            let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                return;
            };
            let dx = (t1.client_x() - t0.client_x()) as f64;
            let dy = (t1.client_y() - t0.client_y()) as f64;
            pinch_dist.set((dx * dx + dy * dy).sqrt());
        }
    };

    let on_touch_move = {
        let pinch_dist = pinch_dist.clone();
        move |e: web_sys::TouchEvent| {
            let touches = e.touches();
            if touches.length() != 2 {
                return;
            }
            e.prevent_default();
            let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                return;
            };
            let dx = (t1.client_x() - t0.client_x()) as f64;
            let dy = (t1.client_y() - t0.client_y()) as f64;
            let new_dist = (dx * dx + dy * dy).sqrt();
            let old_dist = pinch_dist.get();
            if old_dist > 0.0 {
                let (mx, my) = local_point(
                    canvas_ref,
                    (t0.client_x() + t1.client_x()) / 2,
                    (t0.client_y() + t1.client_y()) / 2,
                    (0, 0),
                );
                let delta = -(new_dist - old_dist) * 2.0;
                viewport.update(|vp| vp.zoom_at(delta, mx, my));
            }
            pinch_dist.set(new_dist);
        }
    };

    view! {
        <div
            class="map-container"
            style="position: relative; width: 100%; height: 100%; overflow: hidden;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=on_pointer_leave
            on:click=on_click
            on:touchstart=on_touch_start
            on:touchmove=on_touch_move
        >
            <canvas
                node_ref=canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
            />
        </div>
    }
}

// --- Canvas 2D painting ---

/// Paint the whole scene back to front. Returns `true` while a transit pulse
/// needs further frames.
fn paint(frame: &Frame<'_>, galaxy: &GalaxyView) -> bool {
    let ctx = frame.ctx;
    ctx.set_fill_style_str(&rgb_css(frame.palette.background));
    ctx.fill_rect(0.0, 0.0, frame.w, frame.h);

    let scene = galaxy.scene();
    for overlay in scene.layer(Layer::Corridors) {
        if let Overlay::Corridor(corridor) = overlay {
            draw_corridor(frame, corridor);
        }
    }
    for overlay in scene.layer(Layer::Route) {
        if let Overlay::Route(route) = overlay {
            draw_route(frame, route);
        }
    }
    for overlay in scene.layer(Layer::Rings) {
        if let Overlay::Ring(ring) = overlay {
            draw_ring(frame, ring);
        }
    }
    let size = markers::size_px(frame.vp.zoom());
    for overlay in scene.layer(Layer::Markers) {
        if let Overlay::Marker(marker) = overlay {
            draw_marker(frame, marker, size);
        }
    }
    for overlay in scene.layer(Layer::Labels) {
        if let Overlay::Label(label) = overlay {
            draw_label(frame, label);
        }
    }

    galaxy.has_active_transit()
}

fn set_dash(ctx: &CanvasRenderingContext2d, dash: Option<[f64; 2]>) {
    let segments = js_sys::Array::new();
    if let Some([on, off]) = dash {
        segments.push(&on.into());
        segments.push(&off.into());
    }
    ctx.set_line_dash(&segments).ok();
}

fn stroke_line(ctx: &CanvasRenderingContext2d, a: (f64, f64), b: (f64, f64)) {
    ctx.begin_path();
    ctx.move_to(a.0, a.1);
    ctx.line_to(b.0, b.1);
    ctx.stroke();
}

fn draw_corridor(frame: &Frame<'_>, corridor: &CorridorOverlay) {
    if corridor.hidden {
        return;
    }
    let ctx = frame.ctx;
    let a = frame.vp.world_to_screen(corridor.from.0, corridor.from.1);
    let b = frame.vp.world_to_screen(corridor.to.0, corridor.to.1);
    if frame.off_screen(a, b) {
        return;
    }

    let style = corridor.kind.style();
    let (weight, opacity) = if frame.hovered == Some(corridor.corridor_id) {
        (style.weight + 1.0, 1.0)
    } else {
        (style.weight, style.opacity)
    };
    ctx.set_stroke_style_str(&frame.color(corridor_color(corridor.kind), opacity));
    ctx.set_line_width(weight);
    set_dash(ctx, style.dash);
    stroke_line(ctx, a, b);

    if let Some(role) = transit_color(corridor.transit) {
        let (r, g, bl) = role.resolve(&frame.palette);
        let (r, g, bl) = brighten(r, g, bl, 1.2);
        ctx.set_stroke_style_str(&rgba_css(r, g, bl, pulse_alpha(frame.now)));
        ctx.set_line_width(weight + 2.0);
        set_dash(ctx, None);
        stroke_line(ctx, a, b);
    }
    set_dash(ctx, None);
}

fn draw_route(frame: &Frame<'_>, route: &RouteOverlay) {
    if route.hidden || route.points.len() < 2 {
        return;
    }
    let ctx = frame.ctx;
    ctx.set_stroke_style_str(&frame.color(ColorRole::Route, ROUTE_OPACITY));
    ctx.set_line_width(ROUTE_WEIGHT);
    ctx.set_line_join("round");
    ctx.set_line_cap("round");
    set_dash(ctx, None);
    ctx.begin_path();
    for (i, &(wx, wy)) in route.points.iter().enumerate() {
        let (sx, sy) = frame.vp.world_to_screen(wx, wy);
        if i == 0 {
            ctx.move_to(sx, sy);
        } else {
            ctx.line_to(sx, sy);
        }
    }
    ctx.stroke();
    ctx.set_line_cap("butt");
}

fn draw_ring(frame: &Frame<'_>, ring: &RingOverlay) {
    if ring.hidden {
        return;
    }
    let ctx = frame.ctx;
    let (sx, sy) = frame.vp.world_to_screen(ring.pos.0, ring.pos.1);
    let radius = ring.kind.radius();
    if sx < -radius || sy < -radius || sx > frame.w + radius || sy > frame.h + radius {
        return;
    }
    ctx.set_stroke_style_str(&frame.color(ring.kind.color(), 1.0));
    ctx.set_line_width(RING_WEIGHT);
    ctx.begin_path();
    ctx.arc(sx, sy, radius, 0.0, std::f64::consts::TAU).ok();
    ctx.stroke();
}

fn draw_marker(frame: &Frame<'_>, marker: &MarkerOverlay, size: f64) {
    let ctx = frame.ctx;
    let (sx, sy) = frame.vp.world_to_screen(marker.pos.0, marker.pos.1);
    let half = size / 2.0;
    if sx < -half || sy < -half || sx > frame.w + half || sy > frame.h + half {
        return;
    }

    ctx.begin_path();
    match markers::shape(marker.kind) {
        MarkerShape::Circle => {
            ctx.arc(sx, sy, half, 0.0, std::f64::consts::TAU).ok();
        }
        MarkerShape::Triangle => {
            ctx.move_to(sx, sy - half);
            ctx.line_to(sx + half, sy + half);
            ctx.line_to(sx - half, sy + half);
            ctx.close_path();
        }
        MarkerShape::Square => {
            ctx.rect(sx - half, sy - half, size, size);
        }
        MarkerShape::Diamond => {
            ctx.move_to(sx, sy - half);
            ctx.line_to(sx + half, sy);
            ctx.line_to(sx, sy + half);
            ctx.line_to(sx - half, sy);
            ctx.close_path();
        }
    }
    let fill = markers::fill(marker.kind, marker.alignment);
    ctx.set_fill_style_str(&frame.color(fill, MARKER_FILL_ALPHA));
    ctx.fill();

    let stroke = markers::stroke(marker.highlight);
    ctx.set_stroke_style_str(&frame.color(stroke.color, 1.0));
    ctx.set_line_width(stroke.weight);
    ctx.stroke();
}

fn label_border(wealth: WealthClass) -> ColorRole {
    match wealth {
        WealthClass::High => ColorRole::Gold,
        WealthClass::Medium => ColorRole::Primary,
        WealthClass::Low => ColorRole::White,
    }
}

fn draw_label(frame: &Frame<'_>, label: &PlacedLabel) {
    let ctx = frame.ctx;
    let (ax, ay) = frame.vp.world_to_screen(label.anchor.0, label.anchor.1);
    let (cx, cy) = (ax + label.dx, ay + label.dy);
    let (w, h) = (label.width, label.height);
    let (x, y) = (cx - w / 2.0, cy - h / 2.0);
    if x + w < 0.0 || y + h < 0.0 || x > frame.w || y > frame.h {
        return;
    }

    // Leader line from marker to box.
    ctx.set_stroke_style_str(&frame.color(ColorRole::Primary, 0.35));
    ctx.set_line_width(1.0);
    set_dash(ctx, None);
    stroke_line(ctx, (ax, ay), (cx, cy));

    let (br, bg, bb) = frame.palette.background;
    ctx.set_fill_style_str(&rgba_css(br, bg, bb, 0.85));
    ctx.fill_rect(x, y, w, h);
    ctx.set_stroke_style_str(&frame.color(label_border(label.wealth), 0.9));
    ctx.stroke_rect(x, y, w, h);

    ctx.set_font(&format!("bold {}px monospace", label.zoom.font_px()));
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_fill_style_str(&rgb_css(frame.palette.text));
    ctx.fill_text(&label.text, cx, cy).ok();
}
