use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue};
use web_sys::{window, HtmlCanvasElement, WebGl2RenderingContext as GL};

use super::gl::WebGlContext;
use crate::params::LightningOptions;
use crate::surface::{LightningSurface, Size, Surface};

/// A canvas element sized by its CSS layout box.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
}

impl Surface for CanvasSurface {
    type Context = WebGlContext;

    fn layout_size(&self) -> Size {
        Size::new(
            self.canvas.client_width().max(0) as u32,
            self.canvas.client_height().max(0) as u32,
        )
    }

    fn resize_backing(&mut self, size: Size) {
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
    }

    fn acquire_context(&mut self) -> Option<WebGlContext> {
        let gl: GL = self
            .canvas
            .get_context("webgl2")
            .ok()
            .flatten()?
            .dyn_into()
            .ok()?;
        Some(WebGlContext::new(gl))
    }
}

type SharedSurface = Rc<RefCell<LightningSurface<CanvasSurface>>>;

// The animation-frame closure lives here so it can hand a reference to itself
// back to `request_animation_frame`. The closure only holds a `Weak` to this
// slot, so dropping the owner frees it.
type FrameSlot = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn parse_options(value: JsValue) -> Result<LightningOptions, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(LightningOptions::default());
    }
    Ok(serde_wasm_bindgen::from_value(value)?)
}

fn request_frame(slot: &RefCell<Option<Closure<dyn FnMut(f64)>>>, handle: &Cell<Option<i32>>) {
    let Some(window) = window() else {
        tracing::warn!("no window; animation loop stopped");
        return;
    };
    let slot = slot.borrow();
    let Some(callback) = slot.as_ref() else {
        return;
    };
    match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        Ok(id) => handle.set(Some(id)),
        Err(err) => tracing::warn!(?err, "requestAnimationFrame failed; animation loop stopped"),
    }
}

fn cancel_frame(handle: &Cell<Option<i32>>) {
    if let (Some(id), Some(window)) = (handle.take(), window()) {
        window.cancel_animation_frame(id).ok();
    }
}

/// Animated lightning background drawn into a canvas.
///
/// Construction never throws for a missing WebGL2 context or a shader
/// failure: the instance comes back inert and `error()` says why.
#[wasm_bindgen]
pub struct LightningBackground {
    surface: SharedSurface,
    frame: FrameSlot,
    handle: Rc<Cell<Option<i32>>>,
    on_resize: Option<Closure<dyn FnMut()>>,
}

#[wasm_bindgen]
impl LightningBackground {
    /// `options` may carry `hue`, `xOffset`, `speed`, `intensity` and `size`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        options: JsValue,
    ) -> Result<LightningBackground, JsValue> {
        let options = parse_options(options)?;
        let surface = LightningSurface::new(CanvasSurface { canvas }, &options);
        let mut background = LightningBackground {
            surface: Rc::new(RefCell::new(surface)),
            frame: Rc::new(RefCell::new(None)),
            handle: Rc::new(Cell::new(None)),
            on_resize: None,
        };
        if background.surface.borrow().is_running() {
            background.install_frame_loop();
            background.listen_for_resize();
            background.schedule();
        }
        Ok(background)
    }

    /// Looks up the canvas by element id and starts on it.
    pub fn attach(canvas_id: &str, options: JsValue) -> Result<LightningBackground, JsValue> {
        let document = window()
            .and_then(|w| w.document())
            .ok_or("no document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| format!("canvas #{canvas_id} not found"))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| format!("#{canvas_id} is not a canvas"))?;
        Self::new(canvas, options)
    }

    #[wasm_bindgen(js_name = updateHue)]
    pub fn update_hue(&self, hue: f32) {
        self.surface.borrow_mut().update_hue(hue);
    }

    #[wasm_bindgen(js_name = updateParameters)]
    pub fn update_parameters(&self, update: JsValue) -> Result<(), JsValue> {
        let update = parse_options(update)?;
        self.surface.borrow_mut().update_parameters(&update);
        Ok(())
    }

    pub fn pause(&self) {
        if self.surface.borrow_mut().pause() {
            cancel_frame(&self.handle);
        }
    }

    pub fn resume(&self) {
        if self.surface.borrow_mut().resume() {
            self.schedule();
        }
    }

    /// Stops the loop and removes the resize listener. Safe to call twice.
    pub fn destroy(&mut self) {
        self.surface.borrow_mut().destroy();
        cancel_frame(&self.handle);
        if let Some(listener) = self.on_resize.take() {
            let removed = window().is_some_and(|window| {
                window
                    .remove_event_listener_with_callback("resize", listener.as_ref().unchecked_ref())
                    .is_ok()
            });
            if !removed {
                // Still registered, so the closure must outlive this instance.
                tracing::warn!("could not remove resize listener");
                listener.forget();
            }
        }
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.surface.borrow().is_running()
    }

    /// Why construction failed, if it did.
    pub fn error(&self) -> Option<String> {
        self.surface.borrow().failure().map(ToString::to_string)
    }
}

impl LightningBackground {
    fn install_frame_loop(&self) {
        let surface = Rc::downgrade(&self.surface);
        let slot: Weak<_> = Rc::downgrade(&self.frame);
        let handle = self.handle.clone();
        let callback = Closure::wrap(Box::new(move |now: f64| {
            handle.set(None);
            let Some(surface) = surface.upgrade() else {
                return;
            };
            // A destroyed surface refuses to draw, so a tick that was
            // already queued when destroy() ran ends here.
            let running = match surface.try_borrow_mut() {
                Ok(mut surface) => {
                    surface.render_frame(now);
                    surface.is_running()
                }
                Err(_) => true,
            };
            if running {
                if let Some(slot) = slot.upgrade() {
                    request_frame(&slot, &handle);
                }
            }
        }) as Box<dyn FnMut(f64)>);
        *self.frame.borrow_mut() = Some(callback);
    }

    // One listener per instance, kept so destroy() can remove this exact
    // reference.
    fn listen_for_resize(&mut self) {
        let Some(window) = window() else {
            return;
        };
        let surface = Rc::downgrade(&self.surface);
        let listener = Closure::wrap(Box::new(move || {
            let Some(surface) = surface.upgrade() else {
                return;
            };
            if let Ok(mut surface) = surface.try_borrow_mut() {
                surface.sync_size();
            };
        }) as Box<dyn FnMut()>);
        match window.add_event_listener_with_callback("resize", listener.as_ref().unchecked_ref()) {
            Ok(()) => self.on_resize = Some(listener),
            Err(err) => tracing::warn!(?err, "could not listen for window resize"),
        }
    }

    fn schedule(&self) {
        if self.handle.get().is_none() {
            request_frame(&self.frame, &self.handle);
        }
    }
}

impl Drop for LightningBackground {
    fn drop(&mut self) {
        self.destroy();
    }
}
