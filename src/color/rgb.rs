//! 8-bit RGB pixel type and the byte layout the drivers write to the wire.

use bytemuck::{Pod, Zeroable};

/// RGB pixel with 8 bits per color, packed with no padding so a `&[Rgb8]`
/// can be reinterpreted as a `&[u8]` of `len() * 3` bytes for wire output.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Rgb8 = Rgb8 { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb8 = Rgb8 { r: 255, g: 255, b: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb8 { r, g, b }
    }
}

/// Reinterpret a slice of packed [`Rgb8`] as raw bytes, for handing to a
/// driver that writes a flat byte stream (e.g. the Adalight/APA102 style
/// serial protocols).
pub fn rgbs_as_bytes(v: &[Rgb8]) -> &[u8] {
    bytemuck::cast_slice(v)
}

/// Linearly interpolate between two colors by `t` clamped to `[0, 1]`.
pub fn lerp_rgb8(from: Rgb8, to: Rgb8, t: f32) -> Rgb8 {
    let t = t.clamp(0.0, 1.0);
    let lerp_u8 = |a: u8, b: u8| -> u8 { (a as f32 + (b as f32 - a as f32) * t).round() as u8 };
    Rgb8::new(lerp_u8(from.r, to.r), lerp_u8(from.g, to.g), lerp_u8(from.b, to.b))
}
