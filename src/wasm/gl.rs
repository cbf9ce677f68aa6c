use js_sys::Float32Array;
use web_sys::{
    WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram, WebGlShader, WebGlUniformLocation,
};

use crate::error::{ShaderStage, SurfaceError};
use crate::shader::{self, FrameUniforms};
use crate::surface::{GraphicsContext, Size};

/// [`GraphicsContext`] over a WebGL2 canvas context.
pub struct WebGlContext {
    gl: GL,
    program: Option<WebGlProgram>,
    // Owns the vertex buffer bound to the position attribute.
    #[allow(dead_code)]
    quad: Option<WebGlBuffer>,
    uniforms: Uniforms,
}

#[derive(Default)]
struct Uniforms {
    resolution: Option<WebGlUniformLocation>,
    time: Option<WebGlUniformLocation>,
    hue: Option<WebGlUniformLocation>,
    x_offset: Option<WebGlUniformLocation>,
    speed: Option<WebGlUniformLocation>,
    intensity: Option<WebGlUniformLocation>,
    size: Option<WebGlUniformLocation>,
}

impl Uniforms {
    fn locate(gl: &GL, program: &WebGlProgram) -> Self {
        let find = |name: &str| gl.get_uniform_location(program, name);
        Self {
            resolution: find(shader::RESOLUTION_UNIFORM),
            time: find(shader::TIME_UNIFORM),
            hue: find(shader::HUE_UNIFORM),
            x_offset: find(shader::X_OFFSET_UNIFORM),
            speed: find(shader::SPEED_UNIFORM),
            intensity: find(shader::INTENSITY_UNIFORM),
            size: find(shader::SIZE_UNIFORM),
        }
    }
}

impl WebGlContext {
    pub fn new(gl: GL) -> Self {
        Self {
            gl,
            program: None,
            quad: None,
            uniforms: Uniforms::default(),
        }
    }
}

fn compile_shader(gl: &GL, stage: ShaderStage, source: &str) -> Result<WebGlShader, SurfaceError> {
    let kind = match stage {
        ShaderStage::Vertex => GL::VERTEX_SHADER,
        ShaderStage::Fragment => GL::FRAGMENT_SHADER,
    };
    let shader = gl.create_shader(kind).ok_or_else(|| SurfaceError::ShaderCompile {
        stage,
        log: "unable to create shader object".into(),
    })?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let log = gl
            .get_shader_info_log(&shader)
            .unwrap_or_else(|| "unknown error".into());
        gl.delete_shader(Some(&shader));
        Err(SurfaceError::ShaderCompile { stage, log })
    }
}

impl GraphicsContext for WebGlContext {
    fn build_program(&mut self, vertex: &str, fragment: &str) -> Result<(), SurfaceError> {
        let gl = &self.gl;
        let vertex = compile_shader(gl, ShaderStage::Vertex, vertex)?;
        let fragment = match compile_shader(gl, ShaderStage::Fragment, fragment) {
            Ok(shader) => shader,
            Err(err) => {
                gl.delete_shader(Some(&vertex));
                return Err(err);
            }
        };

        let program = gl.create_program().ok_or_else(|| SurfaceError::ProgramLink {
            log: "unable to create program object".into(),
        })?;
        gl.attach_shader(&program, &vertex);
        gl.attach_shader(&program, &fragment);
        gl.link_program(&program);
        // The linked program keeps what it needs.
        gl.delete_shader(Some(&vertex));
        gl.delete_shader(Some(&fragment));

        if !gl
            .get_program_parameter(&program, GL::LINK_STATUS)
            .as_bool()
            .unwrap_or(false)
        {
            let log = gl
                .get_program_info_log(&program)
                .unwrap_or_else(|| "unknown error".into());
            gl.delete_program(Some(&program));
            return Err(SurfaceError::ProgramLink { log });
        }

        gl.use_program(Some(&program));
        self.uniforms = Uniforms::locate(gl, &program);
        self.program = Some(program);
        Ok(())
    }

    fn upload_quad(&mut self, vertices: &[f32]) -> Result<(), SurfaceError> {
        let gl = &self.gl;
        let program = self.program.as_ref().ok_or_else(|| SurfaceError::ProgramLink {
            log: "vertex data uploaded before the program was linked".into(),
        })?;
        let location = gl.get_attrib_location(program, shader::POSITION_ATTRIBUTE);
        if location < 0 {
            return Err(SurfaceError::ProgramLink {
                log: format!("attribute {} is not active", shader::POSITION_ATTRIBUTE),
            });
        }
        let location = location as u32;

        let buffer = gl.create_buffer().ok_or(SurfaceError::ContextUnavailable)?;
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
        gl.buffer_data_with_array_buffer_view(
            GL::ARRAY_BUFFER,
            &Float32Array::from(vertices),
            GL::STATIC_DRAW,
        );
        gl.enable_vertex_attrib_array(location);
        gl.vertex_attrib_pointer_with_i32(location, 2, GL::FLOAT, false, 0, 0);
        self.quad = Some(buffer);
        Ok(())
    }

    fn set_viewport(&mut self, size: Size) {
        self.gl.viewport(0, 0, size.width as i32, size.height as i32);
    }

    fn push_uniforms(&mut self, uniforms: &FrameUniforms) {
        let gl = &self.gl;
        let u = &self.uniforms;
        gl.uniform2f(
            u.resolution.as_ref(),
            uniforms.resolution.x,
            uniforms.resolution.y,
        );
        gl.uniform1f(u.time.as_ref(), uniforms.time);
        gl.uniform1f(u.hue.as_ref(), uniforms.hue);
        gl.uniform1f(u.x_offset.as_ref(), uniforms.horizontal_offset);
        gl.uniform1f(u.speed.as_ref(), uniforms.speed);
        gl.uniform1f(u.intensity.as_ref(), uniforms.intensity);
        gl.uniform1f(u.size.as_ref(), uniforms.scale);
    }

    fn draw(&mut self, vertex_count: i32) {
        self.gl.draw_arrays(GL::TRIANGLES, 0, vertex_count);
    }
}
