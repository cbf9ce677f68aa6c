//! Animated "lightning" background for a canvas, drawn with one WebGL2
//! fragment shader over a full-screen quad.
//!
//! The pipeline logic lives in [`surface`] behind small traits so it runs and
//! tests on the host. Browser bindings are only compiled for wasm32.

pub mod clock;
pub mod error;
pub mod field;
pub mod params;
pub mod shader;
pub mod surface;

pub use error::{ShaderStage, SurfaceError};
pub use params::{AnimationParameters, LightningOptions};
pub use shader::FrameUniforms;
pub use surface::{GraphicsContext, LightningSurface, Size, Surface};

// Only compile wasm-specific code when targeting wasm32.
#[cfg(target_arch = "wasm32")]
mod wasm {
    use wasm_bindgen::prelude::*;

    mod gl;
    pub mod render;

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::render::LightningBackground;
