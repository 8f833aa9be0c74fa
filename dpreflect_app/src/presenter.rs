//! Blits the software back buffer to the window
//!
//! The surface is uploaded to a texture every frame and drawn with a single
//! fullscreen triangle.

#![allow(unsafe_code)]

use glow::HasContext;
use reflect_engine::render::software::surface::Surface;
use thiserror::Error;

/// Presentation errors
#[derive(Error, Debug)]
pub enum PresentError {
    /// A GL object could not be created
    #[error("GL resource creation failed: {0}")]
    Resource(String),

    /// A blit shader failed to compile
    #[error("Shader compilation failed: {0}")]
    Compile(String),

    /// The blit program failed to link
    #[error("Program link failed: {0}")]
    Link(String),
}

const VERTEX_SHADER: &str = r"#version 330 core
out vec2 v_uv;
void main() {
    vec2 pos = vec2(float((gl_VertexID << 1) & 2), float(gl_VertexID & 2)) * 2.0 - 1.0;
    v_uv = vec2(pos.x * 0.5 + 0.5, 0.5 - pos.y * 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

const FRAGMENT_SHADER: &str = r"#version 330 core
in vec2 v_uv;
uniform sampler2D u_frame;
out vec4 color;
void main() {
    color = texture(u_frame, v_uv);
}
";

/// Owns the GL objects used to show a [`Surface`]
pub struct Presenter {
    gl: glow::Context,
    program: glow::Program,
    vao: glow::VertexArray,
    texture: glow::Texture,
}

impl Presenter {
    /// Build the blit program against the current context
    ///
    /// # Arguments
    /// * `loader` - Resolves GL entry points, usually the window's proc address lookup
    pub fn new(loader: impl FnMut(&str) -> *const std::ffi::c_void) -> Result<Self, PresentError> {
        unsafe {
            let gl = glow::Context::from_loader_function(loader);
            let program = link_program(&gl)?;
            let vao = gl.create_vertex_array().map_err(PresentError::Resource)?;
            let texture = gl.create_texture().map_err(PresentError::Resource)?;

            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);

            gl.use_program(Some(program));
            let location = gl.get_uniform_location(program, "u_frame");
            gl.uniform_1_i32(location.as_ref(), 0);

            log::debug!("Presenter ready");
            Ok(Self { gl, program, vao, texture })
        }
    }

    /// Draw `surface` stretched over a `width` x `height` framebuffer
    pub fn present(&self, surface: &Surface, width: u32, height: u32) {
        let pixels = surface.to_rgba8();
        unsafe {
            let gl = &self.gl;
            gl.viewport(0, 0, width as i32, height as i32);
            gl.clear_color(0.0, 0.0, 0.0, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT);

            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                surface.width() as i32,
                surface.height() as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(&pixels),
            );

            gl.use_program(Some(self.program));
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_arrays(glow::TRIANGLES, 0, 3);
        }
    }
}

impl Drop for Presenter {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_texture(self.texture);
            self.gl.delete_vertex_array(self.vao);
            self.gl.delete_program(self.program);
        }
    }
}

unsafe fn compile_shader(gl: &glow::Context, kind: u32, source: &str) -> Result<glow::Shader, PresentError> {
    let shader = gl.create_shader(kind).map_err(PresentError::Resource)?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(PresentError::Compile(log));
    }
    Ok(shader)
}

unsafe fn link_program(gl: &glow::Context) -> Result<glow::Program, PresentError> {
    let vs = compile_shader(gl, glow::VERTEX_SHADER, VERTEX_SHADER)?;
    let fs = compile_shader(gl, glow::FRAGMENT_SHADER, FRAGMENT_SHADER)?;
    let program = gl.create_program().map_err(PresentError::Resource)?;
    gl.attach_shader(program, vs);
    gl.attach_shader(program, fs);
    gl.link_program(program);
    gl.delete_shader(vs);
    gl.delete_shader(fs);

    if !gl.get_program_link_status(program) {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        return Err(PresentError::Link(log));
    }
    Ok(program)
}
