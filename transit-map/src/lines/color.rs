//! Line color assignment.

use std::collections::HashSet;

/// Twelve colors that stay distinguishable on a light map background.
pub const PALETTE: [&str; 12] = [
    "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#42d4f4", "#f032e6", "#9a6324",
    "#800000", "#469990", "#000075", "#808000",
];

/// How lines get their colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorScheme {
    /// Next palette color in line first-seen order, then generated hues
    /// once the palette runs out. Stable for a given input, changes if
    /// lines are added or reordered.
    #[default]
    Palette,
    /// Hue derived from the line identifier. Stable across runs and inputs.
    Hashed,
}

impl ColorScheme {
    /// A fresh color source for one run.
    pub fn source(self) -> Box<dyn ColorSource + Send> {
        match self {
            ColorScheme::Palette => Box::new(PaletteColors::new()),
            ColorScheme::Hashed => Box::new(HashedColors),
        }
    }
}

/// Hands out one `#rrggbb` color per new line.
pub trait ColorSource {
    fn next_color(&mut self, line_id: &str) -> String;
}

/// Hue step for generated colors. Successive hues never repeat and stay
/// well spread for any number of lines.
const GOLDEN_ANGLE: f64 = 137.507_764;

/// Hands out [`PALETTE`] in order, then golden-angle hues. Never returns
/// the same color twice.
#[derive(Debug, Default)]
pub struct PaletteColors {
    next: usize,
    issued: HashSet<String>,
}

impl PaletteColors {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ColorSource for PaletteColors {
    fn next_color(&mut self, _line_id: &str) -> String {
        loop {
            let color = nth_color(self.next);
            self.next += 1;
            if self.issued.insert(color.clone()) {
                return color;
            }
        }
    }
}

fn nth_color(n: usize) -> String {
    if let Some(color) = PALETTE.get(n) {
        return color.to_string();
    }

    let step = n - PALETTE.len();
    let hue = (step as f64 * GOLDEN_ANGLE) % 360.0;
    // Alternate lightness so neighbouring hues differ in tone too.
    let light = if step % 2 == 0 { 0.40 } else { 0.55 };
    to_hex(hsl_to_rgb(hue, 0.65, light))
}

fn to_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Maps the line identifier to a hue with FNV-1a.
#[derive(Debug, Default)]
pub struct HashedColors;

impl ColorSource for HashedColors {
    fn next_color(&mut self, line_id: &str) -> String {
        let hue = (fnv1a(line_id.as_bytes()) % 360) as f64;
        to_hex(hsl_to_rgb(hue, 0.70, 0.45))
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

/// `hue` in degrees, `sat` and `light` in 0..=1.
fn hsl_to_rgb(hue: f64, sat: f64, light: f64) -> (u8, u8, u8) {
    let chroma = (1.0 - (2.0 * light - 1.0).abs()) * sat;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());

    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let m = light - chroma / 2.0;
    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}
