//! Color space conversion utilities
//!
//! Provides pure conversions between color spaces under the D65 illuminant:
//! - 8-bit RGB to XYZ, Lab and HCL
//! - Lab to RGB with clamping at the sRGB gamut boundary
//! - sRGB gamut membership test for Lab values
//! - HSL and HSV views and hexadecimal representation of RGB colors
//!
//! Conversions are not always round-trip exact: values outside the sRGB
//! gamut are clamped when converted back to 8-bit RGB. Hue is `NaN` when
//! chroma is zero, and callers treat a `NaN` hue as "any hue".

use palette::{Lab, Lch, Srgb};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{d65, lab, srgb};
use crate::{DistillError, Result};

/// 8-bit RGB color with alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// CIE XYZ color, D65, scaled so that the reference white has Y = 100
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct XyzColor {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// CIE L*a*b* color, D65
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LabColor {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// Cylindrical Lab: hue in degrees, chroma and lightness
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HclColor {
    pub h: f64,
    pub c: f64,
    pub l: f64,
}

/// Hue/saturation/value view of an RGB color
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HsvColor {
    /// Hue in degrees, `NaN` for achromatic colors
    pub h: f64,
    /// Saturation in [0, 1]
    pub s: f64,
    /// Value in [0, 1]
    pub v: f64,
}

/// Hue/saturation/lightness view of an RGB color
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HslColor {
    /// Hue in degrees, 0 for achromatic colors
    pub h: f64,
    /// Saturation in [0, 1]
    pub s: f64,
    /// Lightness in [0, 1]
    pub l: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };

    /// Create an opaque color
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color with explicit alpha
    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Read one pixel stored in BGRA / BGRX byte order
    ///
    /// The fourth byte is ignored; the returned color is opaque.
    pub fn from_bgra(pixel: [u8; 4]) -> Self {
        let [b, g, r, _] = pixel;
        Self::new(r, g, b)
    }

    /// Packed 0xAARRGGBB value
    pub fn argb(&self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }

    /// Convert to CIE XYZ (observer 2°, D65)
    pub fn to_xyz(&self) -> XyzColor {
        let r = decode_channel(self.r);
        let g = decode_channel(self.g);
        let b = decode_channel(self.b);
        let [x, y, z] = mul(&srgb::RGB_TO_XYZ, [r, g, b]);
        XyzColor { x, y, z }
    }

    /// Convert to Lab
    pub fn to_lab(&self) -> LabColor {
        self.to_xyz().to_lab()
    }

    /// Convert to HCL
    pub fn to_hcl(&self) -> HclColor {
        self.to_lab().to_hcl()
    }

    /// Convert to HSL
    pub fn to_hsl(&self) -> HslColor {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return HslColor { h: 0.0, s: 0.0, l };
        }

        let delta = max - min;
        let s = if l <= 0.5 {
            delta / (max + min)
        } else {
            delta / (2.0 - max - min)
        };

        let sector = if r == max {
            (g - b) / delta
        } else if g == max {
            2.0 + (b - r) / delta
        } else {
            4.0 + (r - g) / delta
        };
        let mut h = sector * 60.0;
        if h < 0.0 {
            h += 360.0;
        }

        HslColor { h, s, l }
    }

    /// Convert to HSV
    ///
    /// Hue is `NaN` when all three channels are equal.
    pub fn to_hsv(&self) -> HsvColor {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let v = max as f64 / 255.0;
        if max == min {
            return HsvColor { h: f64::NAN, s: 0.0, v };
        }

        let (r, g, b) = (self.r as f64, self.g as f64, self.b as f64);
        let delta = (max - min) as f64;
        let sector = if self.r == max {
            (g - b) / delta
        } else if self.g == max {
            2.0 + (b - r) / delta
        } else {
            4.0 + (r - g) / delta
        };

        HsvColor {
            h: (sector * 60.0).rem_euclid(360.0),
            s: delta / max as f64,
            v,
        }
    }

    /// Convert to hexadecimal color string
    ///
    /// # Returns
    ///
    /// Hex color string (e.g., "#FF0000"), alpha is not included
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parse hexadecimal color string
    ///
    /// # Arguments
    ///
    /// * `hex` - Hex color string (e.g., "#FF0000" or "FF0000")
    ///
    /// # Errors
    ///
    /// Returns `DistillError::InvalidHex` if the string is not six hex digits
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(DistillError::InvalidHex { value: hex.to_string() });
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| DistillError::InvalidHex { value: hex.to_string() })
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl XyzColor {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert to Lab relative to the D65 white point
    pub fn to_lab(&self) -> LabColor {
        let [xn, yn, zn] = d65::WHITE_POINT_XYZ;
        let fx = pivot_xyz(self.x / xn);
        let fy = pivot_xyz(self.y / yn);
        let fz = pivot_xyz(self.z / zn);

        LabColor {
            l: (116.0 * fy - 16.0).max(0.0),
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    /// Convert to 8-bit RGB, clamping channels outside the sRGB gamut
    pub fn to_rgb(&self) -> Color {
        let [r, g, b] = encode_xyz([self.x / 100.0, self.y / 100.0, self.z / 100.0]);
        Color::new(clamp_channel(r), clamp_channel(g), clamp_channel(b))
    }
}

impl LabColor {
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Draw a uniformly distributed Lab triple
    ///
    /// L is drawn from [0, 100), a and b from [-100, 100). The result is not
    /// necessarily inside the sRGB gamut.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            l: 100.0 * rng.gen::<f64>(),
            a: 100.0 * (2.0 * rng.gen::<f64>() - 1.0),
            b: 100.0 * (2.0 * rng.gen::<f64>() - 1.0),
        }
    }

    /// Convert to XYZ (Y = 100 for the reference white)
    ///
    /// A `NaN` a* or b* is treated as zero so that achromatic colors built
    /// from an undefined hue still convert.
    pub fn to_xyz(&self) -> XyzColor {
        let fy = (self.l + 16.0) / 116.0;
        let fx = if self.a.is_nan() { fy } else { fy + self.a / 500.0 };
        let fz = if self.b.is_nan() { fy } else { fy - self.b / 200.0 };

        XyzColor {
            x: 100.0 * d65::XN * lab_to_xyz(fx),
            y: 100.0 * d65::YN * lab_to_xyz(fy),
            z: 100.0 * d65::ZN * lab_to_xyz(fz),
        }
    }

    /// Convert to 8-bit RGB, clamping at the gamut boundary
    pub fn to_rgb(&self) -> Color {
        let [r, g, b] = self.to_rgb_unclamped();
        Color::new(clamp_channel(r), clamp_channel(g), clamp_channel(b))
    }

    /// RGB channels rounded to the 0-255 scale but not clamped
    fn to_rgb_unclamped(&self) -> [f64; 3] {
        let xyz = self.to_xyz();
        encode_xyz([xyz.x / 100.0, xyz.y / 100.0, xyz.z / 100.0])
    }

    /// Convert to HCL
    ///
    /// Hue is `NaN` when chroma rounds to zero at four decimals.
    pub fn to_hcl(&self) -> HclColor {
        let c = (self.a * self.a + self.b * self.b).sqrt();
        let h = if (c * lab::ACHROMATIC_SCALE).round() == 0.0 {
            f64::NAN
        } else {
            (self.b.atan2(self.a).to_degrees() + 360.0) % 360.0
        };
        HclColor { h, c, l: self.l }
    }

    /// Check if this Lab color exists in the sRGB gamut
    ///
    /// Converts to RGB without clamping and reports whether every channel
    /// lands in [0, 255]. `NaN` channels are reported as out of gamut.
    pub fn is_valid_rgb(&self) -> bool {
        self.to_rgb_unclamped()
            .iter()
            .all(|channel| (0.0..=255.0).contains(channel))
    }

    /// Whether any component is `NaN`
    pub fn has_nan(&self) -> bool {
        self.l.is_nan() || self.a.is_nan() || self.b.is_nan()
    }

    /// Squared Euclidean distance in Lab
    pub fn distance_squared(&self, other: &LabColor) -> f64 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        dl * dl + da * da + db * db
    }
}

impl HclColor {
    pub const fn new(h: f64, c: f64, l: f64) -> Self {
        Self { h, c, l }
    }

    /// Convert to Lab
    pub fn to_lab(&self) -> LabColor {
        let h = self.h.to_radians();
        LabColor {
            l: self.l,
            a: self.c * h.cos(),
            b: self.c * h.sin(),
        }
    }

    /// Convert to 8-bit RGB
    pub fn to_rgb(&self) -> Color {
        self.to_lab().to_rgb()
    }
}

impl From<Color> for Srgb<u8> {
    fn from(color: Color) -> Self {
        Srgb::new(color.r, color.g, color.b)
    }
}

impl From<Srgb<u8>> for Color {
    fn from(color: Srgb<u8>) -> Self {
        Color::new(color.red, color.green, color.blue)
    }
}

impl From<LabColor> for Lab {
    fn from(color: LabColor) -> Self {
        Lab::new(color.l as f32, color.a as f32, color.b as f32)
    }
}

impl From<Lab> for LabColor {
    fn from(color: Lab) -> Self {
        LabColor::new(color.l as f64, color.a as f64, color.b as f64)
    }
}

impl From<HclColor> for Lch {
    fn from(color: HclColor) -> Self {
        Lch::new(color.l as f32, color.c as f32, color.h as f32)
    }
}

/// 8-bit sRGB channel to linear light, scaled to [0, 100]
fn decode_channel(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    let linear = if c > srgb::DECODE_THRESHOLD {
        ((c + 0.055) / 1.055).powf(srgb::GAMMA)
    } else {
        c / 12.92
    };
    linear * 100.0
}

/// Normalized XYZ to gamma-encoded RGB rounded on the 0-255 scale
fn encode_xyz(xyz: [f64; 3]) -> [f64; 3] {
    mul(&srgb::XYZ_TO_RGB, xyz).map(|linear| {
        let encoded = if linear <= srgb::ENCODE_THRESHOLD {
            12.92 * linear
        } else {
            1.055 * linear.powf(1.0 / srgb::GAMMA) - 0.055
        };
        (255.0 * encoded).round()
    })
}

fn pivot_xyz(n: f64) -> f64 {
    if n > lab::T3 {
        n.cbrt()
    } else {
        n / lab::T2 + lab::T0
    }
}

fn lab_to_xyz(t: f64) -> f64 {
    if t > lab::T1 {
        t * t * t
    } else {
        lab::T2 * (t - lab::T0)
    }
}

fn clamp_channel(channel: f64) -> u8 {
    channel.clamp(0.0, 255.0) as u8
}

fn mul(m: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::FromColor;

    #[test]
    fn test_rgb_to_lab_black() {
        let lab = Color::new(0, 0, 0).to_lab();
        assert!(lab.l < 1.0);
    }

    #[test]
    fn test_rgb_to_lab_white() {
        let lab = Color::new(255, 255, 255).to_lab();
        assert!(lab.l > 99.0);
        assert!(lab.a.abs() < 1.0);
        assert!(lab.b.abs() < 1.0);
    }

    #[test]
    fn test_rgb_to_lab_matches_palette_crate() {
        for &(r, g, b) in &[(200u8, 30u8, 90u8), (12, 180, 40), (90, 90, 250), (128, 128, 128)] {
            let ours = Color::new(r, g, b).to_lab();
            let reference = Lab::from_color(Srgb::new(r, g, b).into_format::<f32>());
            assert!((ours.l - reference.l as f64).abs() < 1.0, "L for {:?}", (r, g, b));
            assert!((ours.a - reference.a as f64).abs() < 1.0, "a for {:?}", (r, g, b));
            assert!((ours.b - reference.b as f64).abs() < 1.0, "b for {:?}", (r, g, b));
        }
    }

    #[test]
    fn test_rgb_lab_roundtrip() {
        for r in (0..=255u16).step_by(15) {
            for g in (0..=255u16).step_by(17) {
                for b in (0..=255u16).step_by(51) {
                    let color = Color::new(r as u8, g as u8, b as u8);
                    let back = color.to_lab().to_rgb();
                    assert!((back.r as i16 - color.r as i16).abs() <= 1, "{:?} -> {:?}", color, back);
                    assert!((back.g as i16 - color.g as i16).abs() <= 1, "{:?} -> {:?}", color, back);
                    assert!((back.b as i16 - color.b as i16).abs() <= 1, "{:?} -> {:?}", color, back);
                }
            }
        }
    }

    #[test]
    fn test_xyz_roundtrip() {
        let lab = LabColor::new(62.0, -18.0, 33.0);
        let back = lab.to_xyz().to_lab();
        assert!((back.l - lab.l).abs() < 0.01);
        assert!((back.a - lab.a).abs() < 0.01);
        assert!((back.b - lab.b).abs() < 0.01);
    }

    #[test]
    fn test_lab_to_hcl_conversion() {
        let lab = LabColor::new(50.0, 25.0, 25.0);
        let hcl = lab.to_hcl();
        assert!((hcl.l - 50.0).abs() < 1e-9);
        assert!((hcl.c - (1250.0f64).sqrt()).abs() < 1e-9);
        assert!((hcl.h - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_hcl_to_lab_roundtrip() {
        let lab = LabColor::new(40.0, -20.0, -35.0);
        let back = lab.to_hcl().to_lab();
        assert!((back.a - lab.a).abs() < 1e-9);
        assert!((back.b - lab.b).abs() < 1e-9);
    }

    #[test]
    fn test_achromatic_hue_is_nan() {
        let hcl = LabColor::new(50.0, 0.0, 0.0).to_hcl();
        assert!(hcl.h.is_nan());
        // NaN hue still converts to a neutral color
        let gray = hcl.to_rgb();
        assert_eq!(gray.r, gray.g);
        assert_eq!(gray.g, gray.b);
    }

    #[test]
    fn test_negative_hue_wraps() {
        let hcl = LabColor::new(50.0, 10.0, -10.0).to_hcl();
        assert!((hcl.h - 315.0).abs() < 1e-9);
    }

    #[test]
    fn test_gamut_checking() {
        assert!(LabColor::new(50.0, 0.0, 0.0).is_valid_rgb());
        assert!(!LabColor::new(50.0, 100.0, 100.0).is_valid_rgb());
        assert!(!LabColor::new(f64::NAN, 0.0, 0.0).is_valid_rgb());
    }

    #[test]
    fn test_gamut_check_does_not_clamp() {
        let outside = LabColor::new(95.0, -90.0, 90.0);
        assert!(!outside.is_valid_rgb());
        assert_eq!(outside.l, 95.0);
        assert_eq!(outside.to_rgb().g, 255);
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(Color::new(255, 0, 0).to_hex(), "#FF0000");
        assert_eq!(Color::new(0, 255, 0).to_hex(), "#00FF00");
        assert_eq!(Color::new(0, 0, 255).to_hex(), "#0000FF");
    }

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#FF0000").unwrap(), Color::new(255, 0, 0));
        assert_eq!(Color::from_hex("0a141e").unwrap(), Color::new(10, 20, 30));
        assert!(Color::from_hex("#FF").is_err());
        assert!(Color::from_hex("#GGGGGG").is_err());
    }

    #[test]
    fn test_from_bgra() {
        let color = Color::from_bgra([30, 20, 10, 0]);
        assert_eq!(color, Color::new(10, 20, 30));
        assert_eq!(color.a, 255);
    }

    #[test]
    fn test_argb_packing() {
        assert_eq!(Color::new(0x12, 0x34, 0x56).argb(), 0xFF12_3456);
    }

    #[test]
    fn test_hsl() {
        let red = Color::new(255, 0, 0).to_hsl();
        assert!((red.h - 0.0).abs() < 1e-9);
        assert!((red.s - 1.0).abs() < 1e-9);
        assert!((red.l - 0.5).abs() < 1e-9);

        let blue = Color::new(0, 0, 255).to_hsl();
        assert!((blue.h - 240.0).abs() < 1e-9);

        let gray = Color::new(128, 128, 128).to_hsl();
        assert_eq!(gray.s, 0.0);
    }

    #[test]
    fn test_hsv() {
        let orange = Color::new(255, 128, 0).to_hsv();
        assert!((orange.h - 128.0 / 255.0 * 60.0).abs() < 1e-9);
        assert!((orange.s - 1.0).abs() < 1e-9);
        assert!((orange.v - 1.0).abs() < 1e-9);

        let magenta = Color::new(200, 50, 200).to_hsv();
        assert!((magenta.h - 300.0).abs() < 1e-9);
        assert!((magenta.s - 0.75).abs() < 1e-9);

        let cyan = Color::new(0, 100, 100).to_hsv();
        assert!((cyan.h - 180.0).abs() < 1e-9);

        let gray = Color::new(51, 51, 51).to_hsv();
        assert!(gray.h.is_nan());
        assert_eq!(gray.s, 0.0);
        assert!((gray.v - 0.2).abs() < 1e-9);
        assert!(Color::BLACK.to_hsv().h.is_nan());
    }

    #[test]
    fn test_palette_interop() {
        let color = Color::new(1, 2, 3);
        let srgb: Srgb<u8> = color.into();
        assert_eq!(Color::from(srgb), color);

        let lab: Lab = LabColor::new(50.0, 10.0, -10.0).into();
        assert!((lab.l - 50.0).abs() < 1e-4);
        let lch: Lch = LabColor::new(50.0, 10.0, 0.0).to_hcl().into();
        assert!((lch.chroma - 10.0).abs() < 1e-4);
    }
}
