//! CPU evaluation of the lightning fragment shader.
//!
//! Every function here follows its GLSL counterpart in [`crate::shader`]
//! operation for operation, so a pixel sampled here matches what the GPU
//! draws up to floating-point precision.

use glam::{Mat2, Vec2, Vec3, Vec4};

use crate::shader::FrameUniforms;

pub const OCTAVE_COUNT: usize = 10;
pub const OCTAVE_ROTATION: f32 = 0.45;

const HASH_SCALE: f32 = 0.1031;
const HASH_BIAS: f32 = 33.33;

fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn fract3(v: Vec3) -> Vec3 {
    v - v.floor()
}

fn mix(x: f32, y: f32, a: f32) -> f32 {
    x * (1.0 - a) + y * a
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Branch-free HSV to RGB with every channel in `[0, 1]`. `hue` is a fraction
/// of a turn, not degrees.
pub fn hsv2rgb(hue: f32, saturation: f32, value: f32) -> Vec3 {
    let x = Vec3::splat(hue * 6.0) + Vec3::new(0.0, 4.0, 2.0);
    // GLSL mod: x - y * floor(x / y)
    let wrapped = x - 6.0 * (x / 6.0).floor();
    let rgb = ((wrapped - 3.0).abs() - 1.0).clamp(Vec3::ZERO, Vec3::ONE);
    value * (Vec3::ONE * (1.0 - saturation) + rgb * saturation)
}

pub fn hash11(p: f32) -> f32 {
    let mut p = fract(p * HASH_SCALE);
    p *= p + HASH_BIAS;
    p *= p + p;
    fract(p)
}

pub fn hash12(p: Vec2) -> f32 {
    let mut p3 = fract3(Vec3::new(p.x, p.y, p.x) * HASH_SCALE);
    let yzx = Vec3::new(p3.y, p3.z, p3.x);
    p3 += p3.dot(yzx + HASH_BIAS);
    fract((p3.x + p3.y) * p3.z)
}

/// Value noise: the four cell corners hashed and blended with smoothstep
/// weights.
pub fn noise(p: Vec2) -> f32 {
    let ip = p.floor();
    let fp = p - ip;
    let a = hash12(ip);
    let b = hash12(ip + Vec2::new(1.0, 0.0));
    let c = hash12(ip + Vec2::new(0.0, 1.0));
    let d = hash12(ip + Vec2::new(1.0, 1.0));

    let tx = smoothstep(0.0, 1.0, fp.x);
    let ty = smoothstep(0.0, 1.0, fp.y);
    mix(mix(a, b, tx), mix(c, d, tx), ty)
}

pub fn fbm(p: Vec2) -> f32 {
    let rotation = Mat2::from_angle(OCTAVE_ROTATION);
    let mut p = p;
    let mut value = 0.0;
    let mut amplitude = 0.5;
    for _ in 0..OCTAVE_COUNT {
        value += amplitude * noise(p);
        p = rotation * p * 2.0;
        amplitude *= 0.5;
    }
    value
}

/// Aspect-corrected, offset coordinate of `frag_coord` (window coordinates,
/// origin bottom left) after the fbm domain warp. The warp moves with
/// `time * speed`.
pub fn warp(frag_coord: Vec2, uniforms: &FrameUniforms) -> Vec2 {
    let resolution = uniforms.resolution;
    let mut uv = frag_coord / resolution;
    uv = 2.0 * uv - Vec2::ONE;
    uv.x *= resolution.x / resolution.y;
    uv.x += uniforms.horizontal_offset;

    let drift = 0.8 * uniforms.time * uniforms.speed;
    uv + Vec2::splat(2.0 * fbm(uv * uniforms.scale + Vec2::splat(drift)) - 1.0)
}

/// Colour of the pixel at `frag_coord` for one frame's uniforms.
pub fn shade(frag_coord: Vec2, uniforms: &FrameUniforms) -> Vec4 {
    let uv = warp(frag_coord, uniforms);
    let dist = uv.x.abs();
    let base = hsv2rgb(uniforms.hue / 360.0, 0.7, 0.8);
    let flicker = mix(0.0, 0.07, hash11(uniforms.time * uniforms.speed));
    let col = base * (flicker / dist) * uniforms.intensity;
    col.extend(1.0)
}
