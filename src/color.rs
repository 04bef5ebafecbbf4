#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb
{
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb
{
    pub const fn new(r: u8, g: u8, b: u8) -> Self
    {
        Self { r, g, b }
    }
}

pub const WHITE: Rgb = Rgb::new(255, 255, 255);
pub const DIM: Rgb = Rgb::new(34, 34, 34);
pub const GRAY: Rgb = Rgb::new(156, 163, 175);
pub const GREEN: Rgb = Rgb::new(74, 222, 128);
pub const YELLOW: Rgb = Rgb::new(250, 204, 21);
pub const RED: Rgb = Rgb::new(248, 113, 113);
pub const PURPLE: Rgb = Rgb::new(192, 132, 252);

/// A color the player has to name or recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedColor
{
    pub name: &'static str,
    pub rgb: Rgb,
}

pub const PALETTE_RED: NamedColor = NamedColor { name: "RED", rgb: Rgb::new(239, 68, 68) };
pub const PALETTE_BLUE: NamedColor = NamedColor { name: "BLUE", rgb: Rgb::new(59, 130, 246) };
pub const PALETTE_GREEN: NamedColor = NamedColor { name: "GREEN", rgb: Rgb::new(34, 197, 94) };
pub const PALETTE_YELLOW: NamedColor = NamedColor { name: "YELLOW", rgb: Rgb::new(234, 179, 8) };
pub const PALETTE_PURPLE: NamedColor = NamedColor { name: "PURPLE", rgb: Rgb::new(168, 85, 247) };
pub const PALETTE_PINK: NamedColor = NamedColor { name: "PINK", rgb: Rgb::new(236, 72, 153) };
pub const PALETTE_ORANGE: NamedColor = NamedColor { name: "ORANGE", rgb: Rgb::new(249, 115, 22) };

pub fn lerp_color(start: Rgb, end: Rgb, t: f32) -> Rgb
{
    let t = t.clamp(0.0, 1.0);
    Rgb {
        r: lerp(start.r as f32, end.r as f32, t) as u8,
        g: lerp(start.g as f32, end.g as f32, t) as u8,
        b: lerp(start.b as f32, end.b as f32, t) as u8,
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32
{
    a + (b - a) * t
}

/// Converts `hue` (degrees), saturation and lightness in `0.0..=1.0` to RGB.
pub fn hsl(hue: f32, saturation: f32, lightness: f32) -> Rgb
{
    let hue = hue.rem_euclid(360.0);
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let segment = hue / 60.0;
    let x = chroma * (1.0 - (segment % 2.0 - 1.0).abs());
    let (r, g, b) = match segment as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    let channel = |value: f32| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb {
        r: channel(r),
        g: channel(g),
        b: channel(b),
    }
}

pub fn ansi_color(color: Rgb) -> String
{
    format!("\x1b[38;2;{};{};{}m", color.r, color.g, color.b)
}

pub fn ansi_background(color: Rgb) -> String
{
    format!("\x1b[48;2;{};{};{}m", color.r, color.g, color.b)
}
