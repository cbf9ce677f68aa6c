//! Fixed GLSL for the lightning background. The fragment stage is mirrored on
//! the CPU by [`crate::field`]; keep the two in step.

use glam::Vec2;

use crate::params::AnimationParameters;

pub const POSITION_ATTRIBUTE: &str = "aPosition";

pub const RESOLUTION_UNIFORM: &str = "iResolution";
pub const TIME_UNIFORM: &str = "iTime";
pub const HUE_UNIFORM: &str = "uHue";
pub const X_OFFSET_UNIFORM: &str = "uXOffset";
pub const SPEED_UNIFORM: &str = "uSpeed";
pub const INTENSITY_UNIFORM: &str = "uIntensity";
pub const SIZE_UNIFORM: &str = "uSize";

/// Two triangles covering clip space, as (x, y) pairs.
pub const QUAD_VERTICES: [f32; 12] = [
    -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, //
    -1.0, 1.0, 1.0, -1.0, 1.0, 1.0,
];

pub const QUAD_VERTEX_COUNT: i32 = (QUAD_VERTICES.len() / 2) as i32;

pub const VERTEX_SHADER: &str = r#"#version 300 es
in vec2 aPosition;

void main() {
    gl_Position = vec4(aPosition, 0.0, 1.0);
}
"#;

pub const FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;

uniform vec2 iResolution;
uniform float iTime;
uniform float uHue;
uniform float uXOffset;
uniform float uSpeed;
uniform float uIntensity;
uniform float uSize;

out vec4 fragColor;

#define OCTAVE_COUNT 10

vec3 hsv2rgb(vec3 c) {
    vec3 rgb = clamp(abs(mod(c.x * 6.0 + vec3(0.0, 4.0, 2.0), 6.0) - 3.0) - 1.0, 0.0, 1.0);
    return c.z * mix(vec3(1.0), rgb, c.y);
}

float hash11(float p) {
    p = fract(p * .1031);
    p *= p + 33.33;
    p *= p + p;
    return fract(p);
}

float hash12(vec2 p) {
    vec3 p3 = fract(vec3(p.xyx) * .1031);
    p3 += dot(p3, p3.yzx + 33.33);
    return fract((p3.x + p3.y) * p3.z);
}

mat2 rotate2d(float theta) {
    float c = cos(theta);
    float s = sin(theta);
    return mat2(c, -s, s, c);
}

float noise(vec2 p) {
    vec2 ip = floor(p);
    vec2 fp = fract(p);
    float a = hash12(ip);
    float b = hash12(ip + vec2(1.0, 0.0));
    float c = hash12(ip + vec2(0.0, 1.0));
    float d = hash12(ip + vec2(1.0, 1.0));

    vec2 t = smoothstep(0.0, 1.0, fp);
    return mix(mix(a, b, t.x), mix(c, d, t.x), t.y);
}

float fbm(vec2 p) {
    float value = 0.0;
    float amplitude = 0.5;
    for (int i = 0; i < OCTAVE_COUNT; ++i) {
        value += amplitude * noise(p);
        p *= rotate2d(0.45);
        p *= 2.0;
        amplitude *= 0.5;
    }
    return value;
}

void main() {
    vec2 uv = gl_FragCoord.xy / iResolution.xy;
    uv = 2.0 * uv - 1.0;
    uv.x *= iResolution.x / iResolution.y;
    uv.x += uXOffset;

    uv += 2.0 * fbm(uv * uSize + 0.8 * iTime * uSpeed) - 1.0;

    float dist = abs(uv.x);
    vec3 baseColor = hsv2rgb(vec3(uHue / 360.0, 0.7, 0.8));
    vec3 col = baseColor * (mix(0.0, 0.07, hash11(iTime * uSpeed)) / dist) * uIntensity;
    fragColor = vec4(col, 1.0);
}
"#;

/// Every uniform the render step pushes, in push order.
pub const UNIFORM_NAMES: [&str; 7] = [
    RESOLUTION_UNIFORM,
    TIME_UNIFORM,
    HUE_UNIFORM,
    X_OFFSET_UNIFORM,
    SPEED_UNIFORM,
    INTENSITY_UNIFORM,
    SIZE_UNIFORM,
];

/// The values pushed to the program for one draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    /// Backing-buffer size in device pixels.
    pub resolution: Vec2,
    /// Seconds since the first frame.
    pub time: f32,
    pub hue: f32,
    pub horizontal_offset: f32,
    pub speed: f32,
    pub intensity: f32,
    pub scale: f32,
}

impl FrameUniforms {
    pub fn new(resolution: Vec2, time: f32, params: &AnimationParameters) -> Self {
        Self {
            resolution,
            time,
            hue: params.hue,
            horizontal_offset: params.horizontal_offset,
            speed: params.speed,
            intensity: params.intensity,
            scale: params.scale,
        }
    }
}
