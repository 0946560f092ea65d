use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Coalesces repaint requests into at most one `requestAnimationFrame` per
/// vsync.
///
/// The paint function returns `true` while something on the map is
/// animating (transit pulses), which keeps frames coming without further
/// `mark_dirty` calls.
pub struct RenderScheduler {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    dirty: Cell<bool>,
    pending: Cell<Option<i32>>,
    frame: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Inner {
    fn request_frame(&self) {
        if self.pending.get().is_some() {
            return;
        }
        let frame = self.frame.borrow();
        let (Some(window), Some(frame)) = (self.window.as_ref(), frame.as_ref()) else {
            return;
        };
        if let Ok(id) = window.request_animation_frame(frame.as_ref().unchecked_ref()) {
            self.pending.set(Some(id));
        }
    }
}

impl RenderScheduler {
    pub fn new(paint: impl Fn() -> bool + 'static) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            dirty: Cell::new(false),
            pending: Cell::new(None),
            frame: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let frame = Closure::<dyn FnMut()>::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.pending.set(None);
            if !inner.dirty.replace(false) {
                return;
            }
            if paint() {
                inner.dirty.set(true);
                inner.request_frame();
            }
        });
        *inner.frame.borrow_mut() = Some(frame);

        Self { inner }
    }

    pub fn mark_dirty(&self) {
        self.inner.dirty.set(true);
        self.inner.request_frame();
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        if let Some(id) = self.inner.pending.take()
            && let Some(window) = self.inner.window.as_ref()
        {
            let _ = window.cancel_animation_frame(id);
        }
        self.inner.dirty.set(false);
        self.inner.frame.borrow_mut().take();
    }
}
