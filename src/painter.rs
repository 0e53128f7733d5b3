use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use image::{Rgb, RgbImage};
use lazy_static::lazy_static;

use crate::error::ConfigError;
use crate::solver::{EscapeField, EscapeMode};

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const TABLE_SIZE: usize = 256;

pub trait Painter {
    /// Value escaped pixels are divided by before colouring. May be 0.
    fn denominator(&self, field: &EscapeField) -> f64;

    /// Colour of an escaped pixel; `denom` comes from `denominator`.
    fn value_color(&self, value: f64, denom: f64) -> Rgb<u8>;

    fn paint(&self, field: &EscapeField) -> RgbImage {
        let width = field.width() as u32;
        let height = field.height() as u32;
        let denom = self.denominator(field);

        let mut img = RgbImage::new(width, height);
        for (py, row) in field.values().rows().into_iter().enumerate() {
            for (px, &value) in row.iter().enumerate() {
                let color = if field.is_interior_value(value) || !value.is_finite() {
                    BLACK
                } else {
                    self.value_color(value, denom)
                };
                img.put_pixel(px as u32, py as u32, color);
            }
        }
        img
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Colormap {
    Inferno,
    Greyscale,
    Rainbow,
}

const INFERNO_STOPS: [[u8; 3]; 10] = [
    [0x00, 0x00, 0x04],
    [0x1b, 0x0c, 0x41],
    [0x4a, 0x0c, 0x6b],
    [0x78, 0x1c, 0x6d],
    [0xa5, 0x2c, 0x60],
    [0xcf, 0x44, 0x46],
    [0xed, 0x69, 0x25],
    [0xfb, 0x9b, 0x06],
    [0xf7, 0xd1, 0x3d],
    [0xfc, 0xff, 0xa4],
];

const RAINBOW_STOPS: [[u8; 3]; 10] = [
    [0xbe, 0x0a, 0xff],
    [0x58, 0x0a, 0xff],
    [0x14, 0x7d, 0xf5],
    [0x0a, 0xef, 0xff],
    [0x0a, 0xff, 0x99],
    [0xa1, 0xff, 0x0a],
    [0xde, 0xff, 0x0a],
    [0xff, 0xd3, 0x00],
    [0xff, 0x87, 0x00],
    [0xff, 0x00, 0x00],
];

const GREYSCALE_STOPS: [[u8; 3]; 2] = [[0xff, 0xff, 0xff], [0x00, 0x00, 0x00]];

fn mix(a: u8, b: u8, frac: f64) -> u8 {
    let af = a as f64;
    let bf = b as f64;
    let m = af * (1.0 - frac) + bf * frac;
    f64::round(m) as u8
}

/// Linear interpolation through evenly spaced `stops`.
fn build_table(stops: &[[u8; 3]]) -> Vec<Rgb<u8>> {
    let last = stops.len() - 1;
    (0..TABLE_SIZE)
        .map(|i| {
            let x = i as f64 / (TABLE_SIZE - 1) as f64 * last as f64;
            let n = (x.floor() as usize).min(last);
            let frac = x - n as f64;
            let a = stops[n];
            let b = stops[(n + 1).min(last)];
            Rgb([mix(a[0], b[0], frac), mix(a[1], b[1], frac), mix(a[2], b[2], frac)])
        })
        .collect()
}

lazy_static! {
    static ref INFERNO: Vec<Rgb<u8>> = build_table(&INFERNO_STOPS);
    static ref GREYSCALE: Vec<Rgb<u8>> = build_table(&GREYSCALE_STOPS);
    static ref RAINBOW: Vec<Rgb<u8>> = build_table(&RAINBOW_STOPS);
}

impl Colormap {
    pub fn table(&self) -> &'static [Rgb<u8>] {
        match self {
            Self::Inferno => INFERNO.as_slice(),
            Self::Greyscale => GREYSCALE.as_slice(),
            Self::Rainbow => RAINBOW.as_slice(),
        }
    }

    /// `t` outside [0, 1] is clamped, NaN reads as 0.
    pub fn lookup(&self, t: f64) -> Rgb<u8> {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let i = (t * (TABLE_SIZE - 1) as f64).round() as usize;
        self.table()[i.min(TABLE_SIZE - 1)]
    }
}

impl FromStr for Colormap {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inferno" => Ok(Self::Inferno),
            "greyscale" | "grayscale" => Ok(Self::Greyscale),
            "rainbow" => Ok(Self::Rainbow),
            _ => Err(ConfigError::UnknownColormap(s.to_string())),
        }
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inferno => "inferno",
            Self::Greyscale => "greyscale",
            Self::Rainbow => "rainbow",
        };
        f.write_str(name)
    }
}

/// What escaped values are divided by before the table lookup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Normalize {
    /// Largest escaped value in the frame being painted.
    FieldMax,
    MaxIter,
}

impl FromStr for Normalize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "field-max" | "fieldmax" => Ok(Self::FieldMax),
            "max-iter" | "maxiter" => Ok(Self::MaxIter),
            _ => Err(ConfigError::UnknownNormalize(s.to_string())),
        }
    }
}

pub struct LutPainter {
    colormap: Colormap,
    normalize: Normalize,
}

impl LutPainter {
    pub fn new(colormap: Colormap, normalize: Normalize) -> Self {
        Self {
            colormap,
            normalize,
        }
    }
}

impl Painter for LutPainter {
    fn denominator(&self, field: &EscapeField) -> f64 {
        match self.normalize {
            Normalize::FieldMax => field.max_escaped(),
            Normalize::MaxIter => field.max_iter() as f64,
        }
    }

    fn value_color(&self, value: f64, denom: f64) -> Rgb<u8> {
        let t = if denom > 0.0 { value / denom } else { 0.0 };
        self.colormap.lookup(t)
    }
}

/// Phase-shifted cosine palette over `t = value / max_iter`.
pub struct CosinePainter;

fn cosine_channel(phase: f64) -> u8 {
    let v = 0.5 + 0.5 * phase.cos();
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

impl Painter for CosinePainter {
    fn denominator(&self, field: &EscapeField) -> f64 {
        field.max_iter() as f64
    }

    fn value_color(&self, value: f64, denom: f64) -> Rgb<u8> {
        let t = value / denom;
        if !t.is_finite() {
            return BLACK;
        }
        let turn = 2.0 * PI * t;
        Rgb([
            cosine_channel(3.0 + turn),
            cosine_channel(3.0 + 1.5 * turn),
            cosine_channel(3.0 + 2.0 * turn),
        ])
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorPolicy {
    Lut {
        colormap: Colormap,
        normalize: Normalize,
    },
    Cosine,
}

impl Default for ColorPolicy {
    fn default() -> Self {
        Self::Lut {
            colormap: Colormap::Inferno,
            normalize: Normalize::FieldMax,
        }
    }
}

impl ColorPolicy {
    /// Builds a policy from its name; `colormap` and `normalize` only apply
    /// to `"lut"`.
    pub fn named(
        name: &str,
        colormap: Colormap,
        normalize: Normalize,
    ) -> Result<Self, ConfigError> {
        match name {
            "lut" => Ok(Self::Lut {
                colormap,
                normalize,
            }),
            "cosine" => Ok(Self::Cosine),
            _ => Err(ConfigError::UnknownPolicy(name.to_string())),
        }
    }

    /// The field a policy expects: raw counts for tables, smoothed values for
    /// the cosine palette.
    pub fn escape_mode(&self) -> EscapeMode {
        match self {
            Self::Lut { .. } => EscapeMode::Count,
            Self::Cosine => EscapeMode::Smooth,
        }
    }

    pub fn painter(&self) -> Box<dyn Painter> {
        match *self {
            Self::Lut {
                colormap,
                normalize,
            } => Box::new(LutPainter::new(colormap, normalize)),
            Self::Cosine => Box::new(CosinePainter),
        }
    }
}

impl fmt::Display for ColorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lut {
                colormap,
                normalize,
            } => write!(f, "lut({}, {:?})", colormap, normalize),
            Self::Cosine => write!(f, "cosine"),
        }
    }
}

pub fn colorize(field: &EscapeField, policy: &ColorPolicy) -> RgbImage {
    policy.painter().paint(field)
}

#[cfg(test)]
mod test {
    use ndarray::{array, Array2};

    use super::*;

    fn count_field(values: Array2<f64>, max_iter: u32) -> EscapeField {
        EscapeField::new(values, max_iter, EscapeMode::Count)
    }

    fn inferno() -> ColorPolicy {
        ColorPolicy::default()
    }

    #[test]
    fn test_tables_hit_their_end_stops() {
        for (map, stops) in [
            (Colormap::Inferno, &INFERNO_STOPS[..]),
            (Colormap::Rainbow, &RAINBOW_STOPS[..]),
            (Colormap::Greyscale, &GREYSCALE_STOPS[..]),
        ] {
            let table = map.table();
            assert_eq!(table.len(), TABLE_SIZE);
            assert_eq!(table[0], Rgb(stops[0]));
            assert_eq!(table[TABLE_SIZE - 1], Rgb(stops[stops.len() - 1]));
        }
    }

    #[test]
    fn test_lookup_clamps() {
        let map = Colormap::Inferno;
        assert_eq!(map.lookup(-3.0), map.lookup(0.0));
        assert_eq!(map.lookup(7.0), map.lookup(1.0));
        assert_eq!(map.lookup(f64::NAN), map.lookup(0.0));
    }

    #[test]
    fn test_interior_is_black() {
        let field = count_field(array![[10.0, 3.0], [1.0, 10.0]], 10);
        for policy in [inferno(), ColorPolicy::Cosine] {
            let img = colorize(&field, &policy);
            assert_eq!(*img.get_pixel(0, 0), BLACK);
            assert_eq!(*img.get_pixel(1, 1), BLACK);
        }
    }

    #[test]
    fn test_field_max_maps_to_table_end() {
        let field = count_field(array![[2.0, 4.0], [0.0, 10.0]], 10);
        let img = colorize(&field, &inferno());
        assert_eq!(*img.get_pixel(1, 0), Colormap::Inferno.lookup(1.0));
        assert_eq!(*img.get_pixel(0, 0), Colormap::Inferno.lookup(0.5));
        assert_eq!(*img.get_pixel(0, 1), Colormap::Inferno.lookup(0.0));
    }

    #[test]
    fn test_max_iter_normalization() {
        let policy = ColorPolicy::Lut {
            colormap: Colormap::Greyscale,
            normalize: Normalize::MaxIter,
        };
        let field = count_field(array![[5.0, 10.0]], 10);
        let img = colorize(&field, &policy);
        assert_eq!(*img.get_pixel(0, 0), Colormap::Greyscale.lookup(0.5));
    }

    #[test]
    fn test_all_zero_field_is_uniform() {
        let field = count_field(Array2::zeros((6, 9)), 50);
        for policy in [inferno(), ColorPolicy::Cosine] {
            let img = colorize(&field, &policy);
            assert_eq!(img.dimensions(), (9, 6));
            let first = *img.get_pixel(0, 0);
            assert!(img.pixels().all(|p| *p == first));
        }
        let img = colorize(&field, &inferno());
        assert_eq!(*img.get_pixel(0, 0), Colormap::Inferno.lookup(0.0));
    }

    #[test]
    fn test_non_finite_values_are_black() {
        let field = EscapeField::new(
            array![[f64::NAN, f64::NEG_INFINITY, 1.5]],
            20,
            EscapeMode::Smooth,
        );
        for policy in [inferno(), ColorPolicy::Cosine] {
            let img = colorize(&field, &policy);
            assert_eq!(*img.get_pixel(0, 0), BLACK);
            assert_eq!(*img.get_pixel(1, 0), BLACK);
        }
    }

    #[test]
    fn test_cosine_palette() {
        // t = 0: cos(3) on every channel.
        let expected = cosine_channel(3.0);
        assert_eq!(
            CosinePainter.value_color(0.0, 100.0),
            Rgb([expected, expected, expected])
        );
        let c = CosinePainter.value_color(37.25, 100.0);
        let turn = 2.0 * PI * 0.3725;
        assert_eq!(c.0[1], cosine_channel(3.0 + 1.5 * turn));
        assert_eq!(CosinePainter.value_color(1.0, 0.0), BLACK);
    }

    #[test]
    fn test_policy_escape_mode() {
        assert_eq!(inferno().escape_mode(), EscapeMode::Count);
        assert_eq!(ColorPolicy::Cosine.escape_mode(), EscapeMode::Smooth);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Inferno".parse(), Ok(Colormap::Inferno));
        assert_eq!("grayscale".parse(), Ok(Colormap::Greyscale));
        assert_eq!(
            "viridis".parse::<Colormap>(),
            Err(ConfigError::UnknownColormap("viridis".into()))
        );
        assert_eq!("max-iter".parse(), Ok(Normalize::MaxIter));
        assert!("median".parse::<Normalize>().is_err());
        assert_eq!(
            ColorPolicy::named("cosine", Colormap::Rainbow, Normalize::MaxIter),
            Ok(ColorPolicy::Cosine)
        );
        assert_eq!(
            ColorPolicy::named("lut", Colormap::Rainbow, Normalize::MaxIter),
            Ok(ColorPolicy::Lut {
                colormap: Colormap::Rainbow,
                normalize: Normalize::MaxIter
            })
        );
        assert!(ColorPolicy::named("hsv", Colormap::Rainbow, Normalize::MaxIter).is_err());
    }
}
