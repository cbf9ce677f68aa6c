//! The animated lightning surface, independent of any particular browser API.
//!
//! A [`LightningSurface`] owns its drawing surface and graphics context. It
//! compiles the program and uploads the quad exactly once at construction,
//! then draws one frame per [`LightningSurface::render_frame`] call until it
//! is paused or destroyed. Scheduling those calls is the host's job.

use glam::Vec2;

use crate::clock::FrameClock;
use crate::error::SurfaceError;
use crate::params::{AnimationParameters, LightningOptions};
use crate::shader::{self, FrameUniforms};

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn as_vec2(self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// Something with a layout size that can hand out a graphics context.
pub trait Surface {
    type Context: GraphicsContext;

    /// Current layout size. Read every frame.
    fn layout_size(&self) -> Size;

    /// Resizes the drawing buffer behind the surface.
    fn resize_backing(&mut self, size: Size);

    /// `None` when the surface cannot produce the context the program needs.
    fn acquire_context(&mut self) -> Option<Self::Context>;
}

/// The handful of GPU operations the lightning pipeline uses.
pub trait GraphicsContext {
    /// Compiles both stages and links them. Called once per surface.
    fn build_program(&mut self, vertex: &str, fragment: &str) -> Result<(), SurfaceError>;

    /// Uploads static (x, y) vertex data and binds it to the position
    /// attribute. Called once per surface.
    fn upload_quad(&mut self, vertices: &[f32]) -> Result<(), SurfaceError>;

    fn set_viewport(&mut self, size: Size);

    fn push_uniforms(&mut self, uniforms: &FrameUniforms);

    /// Draws `vertex_count` vertices as triangles.
    fn draw(&mut self, vertex_count: i32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Running,
    Paused,
    Destroyed,
    Inert,
}

struct Pipeline<S: Surface> {
    surface: S,
    context: S::Context,
    backing: Option<Size>,
}

impl<S: Surface> Pipeline<S> {
    fn build(mut surface: S) -> Result<Self, SurfaceError> {
        let mut context = surface
            .acquire_context()
            .ok_or(SurfaceError::ContextUnavailable)?;
        context.build_program(shader::VERTEX_SHADER, shader::FRAGMENT_SHADER)?;
        context.upload_quad(&shader::QUAD_VERTICES)?;
        Ok(Self {
            surface,
            context,
            backing: None,
        })
    }

    fn sync_size(&mut self) -> Size {
        let size = self.surface.layout_size();
        if self.backing != Some(size) {
            tracing::debug!(width = size.width, height = size.height, "resizing backing buffer");
            self.surface.resize_backing(size);
            self.context.set_viewport(size);
            self.backing = Some(size);
        }
        size
    }
}

pub struct LightningSurface<S: Surface> {
    params: AnimationParameters,
    clock: FrameClock,
    lifecycle: Lifecycle,
    pipeline: Option<Pipeline<S>>,
    failure: Option<SurfaceError>,
}

impl<S: Surface> LightningSurface<S> {
    /// Builds the pipeline on `surface`, logging a fatal failure at error
    /// level.
    pub fn new(surface: S, options: &LightningOptions) -> Self {
        Self::with_reporter(surface, options, |err| {
            tracing::error!(error = %err, "lightning surface disabled");
        })
    }

    /// Like [`LightningSurface::new`], but hands a fatal failure to `report`
    /// instead of the log. On failure the surface is inert: every method is
    /// still safe to call and does nothing.
    pub fn with_reporter<F>(surface: S, options: &LightningOptions, report: F) -> Self
    where
        F: FnOnce(&SurfaceError),
    {
        let params = AnimationParameters::from_options(options);
        match Pipeline::build(surface) {
            Ok(pipeline) => {
                tracing::info!(?params, "lightning surface ready");
                Self {
                    params,
                    clock: FrameClock::new(),
                    lifecycle: Lifecycle::Running,
                    pipeline: Some(pipeline),
                    failure: None,
                }
            }
            Err(err) => {
                report(&err);
                Self {
                    params,
                    clock: FrameClock::new(),
                    lifecycle: Lifecycle::Inert,
                    pipeline: None,
                    failure: Some(err),
                }
            }
        }
    }

    /// Renders one frame at host timestamp `now_ms`. Returns false, drawing
    /// nothing, unless the surface is running.
    pub fn render_frame(&mut self, now_ms: f64) -> bool {
        if self.lifecycle != Lifecycle::Running {
            return false;
        }
        let Some(pipeline) = self.pipeline.as_mut() else {
            return false;
        };
        let size = pipeline.sync_size();
        let time = self.clock.tick(now_ms);
        let uniforms = FrameUniforms::new(size.as_vec2(), time, &self.params);
        pipeline.context.push_uniforms(&uniforms);
        pipeline.context.draw(shader::QUAD_VERTEX_COUNT);
        true
    }

    /// Matches the backing buffer to the layout size right away, without
    /// waiting for the next frame. Does nothing unless running: resizing
    /// clears the canvas, and a paused surface would stay blank until resumed.
    /// The first frame after `resume` picks up the new size instead.
    pub fn sync_size(&mut self) {
        if self.lifecycle == Lifecycle::Running {
            if let Some(pipeline) = self.pipeline.as_mut() {
                pipeline.sync_size();
            }
        }
    }

    pub fn update_hue(&mut self, hue: f32) {
        self.params.hue = hue;
    }

    pub fn update_parameters(&mut self, update: &LightningOptions) {
        self.params.merge(update);
    }

    /// Stops drawing until [`LightningSurface::resume`]. Returns true if the
    /// surface was running.
    pub fn pause(&mut self) -> bool {
        if self.lifecycle != Lifecycle::Running {
            return false;
        }
        self.lifecycle = Lifecycle::Paused;
        self.clock.suspend();
        tracing::debug!("lightning surface paused");
        true
    }

    /// Returns true if the surface was paused and the host should start
    /// scheduling frames again.
    pub fn resume(&mut self) -> bool {
        if self.lifecycle != Lifecycle::Paused {
            return false;
        }
        self.lifecycle = Lifecycle::Running;
        tracing::debug!("lightning surface resumed");
        true
    }

    /// Stops the surface for good and releases the pipeline. Safe to call
    /// more than once.
    pub fn destroy(&mut self) {
        if matches!(self.lifecycle, Lifecycle::Destroyed | Lifecycle::Inert) {
            return;
        }
        self.lifecycle = Lifecycle::Destroyed;
        self.pipeline = None;
        tracing::debug!("lightning surface destroyed");
    }

    /// Whether the host should keep scheduling frames.
    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    pub fn params(&self) -> &AnimationParameters {
        &self.params
    }

    /// The construction failure, if the surface is inert.
    pub fn failure(&self) -> Option<&SurfaceError> {
        self.failure.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::error::ShaderStage;

    #[derive(Default)]
    struct Log {
        programs_built: usize,
        quads: Vec<Vec<f32>>,
        backing: Vec<Size>,
        viewports: Vec<Size>,
        uniforms: Vec<FrameUniforms>,
        draws: Vec<i32>,
    }

    struct MockSurface {
        layout: Rc<Cell<Size>>,
        log: Rc<RefCell<Log>>,
        has_context: bool,
        link_error: Option<SurfaceError>,
    }

    struct MockContext {
        log: Rc<RefCell<Log>>,
        link_error: Option<SurfaceError>,
    }

    impl Surface for MockSurface {
        type Context = MockContext;

        fn layout_size(&self) -> Size {
            self.layout.get()
        }

        fn resize_backing(&mut self, size: Size) {
            self.log.borrow_mut().backing.push(size);
        }

        fn acquire_context(&mut self) -> Option<MockContext> {
            self.has_context.then(|| MockContext {
                log: self.log.clone(),
                link_error: self.link_error.take(),
            })
        }
    }

    impl GraphicsContext for MockContext {
        fn build_program(&mut self, vertex: &str, fragment: &str) -> Result<(), SurfaceError> {
            assert_eq!(vertex, shader::VERTEX_SHADER);
            assert_eq!(fragment, shader::FRAGMENT_SHADER);
            self.log.borrow_mut().programs_built += 1;
            match self.link_error.take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        fn upload_quad(&mut self, vertices: &[f32]) -> Result<(), SurfaceError> {
            self.log.borrow_mut().quads.push(vertices.to_vec());
            Ok(())
        }

        fn set_viewport(&mut self, size: Size) {
            self.log.borrow_mut().viewports.push(size);
        }

        fn push_uniforms(&mut self, uniforms: &FrameUniforms) {
            self.log.borrow_mut().uniforms.push(*uniforms);
        }

        fn draw(&mut self, vertex_count: i32) {
            self.log.borrow_mut().draws.push(vertex_count);
        }
    }

    struct Rig {
        layout: Rc<Cell<Size>>,
        log: Rc<RefCell<Log>>,
    }

    impl Rig {
        fn new(size: Size) -> Self {
            Self {
                layout: Rc::new(Cell::new(size)),
                log: Rc::default(),
            }
        }

        fn surface(&self) -> MockSurface {
            MockSurface {
                layout: self.layout.clone(),
                log: self.log.clone(),
                has_context: true,
                link_error: None,
            }
        }
    }

    #[test]
    fn builds_program_and_quad_once() {
        let rig = Rig::new(Size::new(800, 600));
        let mut surface = LightningSurface::new(rig.surface(), &LightningOptions::default());
        for frame in 0..5 {
            assert!(surface.render_frame(frame as f64 * 16.0));
        }

        let log = rig.log.borrow();
        assert_eq!(log.programs_built, 1);
        assert_eq!(log.quads, vec![shader::QUAD_VERTICES.to_vec()]);
        assert_eq!(log.draws, vec![6; 5]);
        // Size never changed, so the buffer was sized once.
        assert_eq!(log.backing, vec![Size::new(800, 600)]);
        assert_eq!(log.viewports, vec![Size::new(800, 600)]);
    }

    #[test]
    fn uniforms_carry_time_and_resolution() {
        let rig = Rig::new(Size::new(1024, 512));
        let mut surface = LightningSurface::new(rig.surface(), &LightningOptions::default());
        surface.render_frame(5_000.0);
        surface.render_frame(5_500.0);

        let log = rig.log.borrow();
        assert_eq!(log.uniforms[0].time, 0.0);
        assert_eq!(log.uniforms[1].time, 0.5);
        assert_eq!(log.uniforms[1].resolution, Vec2::new(1024.0, 512.0));
        assert_eq!(log.uniforms[1].hue, 220.0);
        assert_eq!(log.uniforms[1].speed, 1.6);
        assert_eq!(log.uniforms[1].intensity, 0.6);
        assert_eq!(log.uniforms[1].scale, 2.0);
        assert_eq!(log.uniforms[1].horizontal_offset, 0.0);
    }

    #[test]
    fn layout_change_resizes_on_next_frame() {
        let rig = Rig::new(Size::new(800, 600));
        let mut surface = LightningSurface::new(rig.surface(), &LightningOptions::default());
        surface.render_frame(0.0);
        rig.layout.set(Size::new(640, 360));
        assert!(surface.render_frame(16.0));

        let log = rig.log.borrow();
        assert_eq!(log.backing, vec![Size::new(800, 600), Size::new(640, 360)]);
        assert_eq!(log.viewports.last(), Some(&Size::new(640, 360)));
        assert_eq!(log.uniforms[1].resolution, Vec2::new(640.0, 360.0));
        assert_eq!(log.draws.len(), 2);
    }

    #[test]
    fn sync_size_resizes_between_frames() {
        let rig = Rig::new(Size::new(800, 600));
        let mut surface = LightningSurface::new(rig.surface(), &LightningOptions::default());
        surface.render_frame(0.0);
        rig.layout.set(Size::new(1920, 1080));
        surface.sync_size();
        assert_eq!(rig.log.borrow().backing.last(), Some(&Size::new(1920, 1080)));

        // Already matched, so the frame does not resize again.
        surface.render_frame(16.0);
        assert_eq!(rig.log.borrow().backing.len(), 2);
    }

    #[test]
    fn parameter_update_changes_only_named_fields() {
        let rig = Rig::new(Size::new(100, 100));
        let options = LightningOptions {
            hue: Some(40.0),
            ..Default::default()
        };
        let mut surface = LightningSurface::new(rig.surface(), &options);
        surface.render_frame(0.0);
        surface.update_parameters(&LightningOptions {
            speed: Some(3.0),
            ..Default::default()
        });
        surface.render_frame(16.0);

        let log = rig.log.borrow();
        let (before, after) = (log.uniforms[0], log.uniforms[1]);
        assert_eq!(after.speed, 3.0);
        assert_eq!(after.hue, before.hue);
        assert_eq!(after.intensity, before.intensity);
        assert_eq!(after.scale, before.scale);
        assert_eq!(after.horizontal_offset, before.horizontal_offset);
    }

    #[test]
    fn hue_update_is_not_clamped() {
        let rig = Rig::new(Size::new(100, 100));
        let mut surface = LightningSurface::new(rig.surface(), &LightningOptions::default());
        surface.update_hue(725.0);
        surface.render_frame(0.0);
        assert_eq!(rig.log.borrow().uniforms[0].hue, 725.0);
    }

    #[test]
    fn destroy_stops_a_queued_frame() {
        let rig = Rig::new(Size::new(100, 100));
        let mut surface = LightningSurface::new(rig.surface(), &LightningOptions::default());
        assert!(surface.render_frame(0.0));
        // The host has already queued the next callback when destroy arrives.
        surface.destroy();
        assert!(!surface.render_frame(16.0));
        assert!(!surface.is_running());
        surface.destroy();

        assert_eq!(rig.log.borrow().draws.len(), 1);
    }

    #[test]
    fn missing_context_reports_once_and_never_draws() {
        let rig = Rig::new(Size::new(100, 100));
        let mut mock = rig.surface();
        mock.has_context = false;
        let reports = Cell::new(0);
        let mut surface = LightningSurface::with_reporter(mock, &LightningOptions::default(), |err| {
            assert_eq!(*err, SurfaceError::ContextUnavailable);
            reports.set(reports.get() + 1);
        });

        assert_eq!(surface.failure(), Some(&SurfaceError::ContextUnavailable));
        assert!(!surface.is_running());
        assert!(!surface.render_frame(0.0));
        surface.update_hue(10.0);
        surface.sync_size();
        assert!(!surface.pause());
        assert!(!surface.resume());
        surface.destroy();
        assert_eq!(reports.get(), 1);

        let log = rig.log.borrow();
        assert_eq!(log.programs_built, 0);
        assert!(log.draws.is_empty());
        assert!(log.backing.is_empty());
    }

    #[test]
    fn link_failure_leaves_surface_inert() {
        let rig = Rig::new(Size::new(100, 100));
        let mut mock = rig.surface();
        mock.link_error = Some(SurfaceError::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "syntax error".into(),
        });
        let mut surface = LightningSurface::with_reporter(mock, &LightningOptions::default(), |_| {});

        assert!(surface.failure().is_some_and(SurfaceError::is_shader_failure));
        assert!(!surface.render_frame(0.0));
        let log = rig.log.borrow();
        assert_eq!(log.programs_built, 1);
        assert!(log.quads.is_empty());
        assert!(log.draws.is_empty());
    }

    #[test]
    fn pause_freezes_time_and_resume_continues() {
        let rig = Rig::new(Size::new(100, 100));
        let mut surface = LightningSurface::new(rig.surface(), &LightningOptions::default());
        surface.render_frame(0.0);
        surface.render_frame(1_000.0);
        assert!(surface.pause());
        assert!(!surface.pause());
        assert!(!surface.render_frame(2_000.0));
        assert!(surface.resume());
        assert!(surface.render_frame(30_000.0));

        let log = rig.log.borrow();
        assert_eq!(log.draws.len(), 3);
        assert_eq!(log.uniforms[2].time, 1.0);
    }

    #[test]
    fn resize_while_paused_waits_for_resume() {
        let rig = Rig::new(Size::new(800, 600));
        let mut surface = LightningSurface::new(rig.surface(), &LightningOptions::default());
        surface.render_frame(0.0);
        surface.pause();
        rig.layout.set(Size::new(640, 360));
        surface.sync_size();
        {
            let log = rig.log.borrow();
            assert_eq!(log.backing, vec![Size::new(800, 600)]);
            assert_eq!(log.draws.len(), 1);
        }

        surface.resume();
        assert!(surface.render_frame(16.0));
        let log = rig.log.borrow();
        assert_eq!(log.backing, vec![Size::new(800, 600), Size::new(640, 360)]);
        assert_eq!(log.uniforms[1].resolution, Vec2::new(640.0, 360.0));
        assert_eq!(log.draws.len(), 2);
    }

    #[test]
    fn destroyed_surface_does_not_resume() {
        let rig = Rig::new(Size::new(100, 100));
        let mut surface = LightningSurface::new(rig.surface(), &LightningOptions::default());
        surface.pause();
        surface.destroy();
        assert!(!surface.resume());
        assert!(!surface.render_frame(0.0));
    }
}
