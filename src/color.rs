//! Color normalization for stroke and canvas colors.
//!
//! Colors travel the wire as hex strings and are canonicalized to lowercase
//! `#rrggbb` at the boundary. Canonical form is what makes "this stroke is
//! an eraser" a plain string comparison against the canvas background.

#[cfg(test)]
#[path = "color_test.rs"]
mod tests;

/// Default pen color for strokes whose color cannot be parsed.
pub const DEFAULT_PEN: &str = "#000000";

/// Default canvas background. An eraser stroke is simply this color.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Parse `#RGB` or `#RRGGBB` values into RGB channels.
#[must_use]
pub fn parse_hex_rgb(raw: &str) -> Option<(u8, u8, u8)> {
    let trimmed = raw.trim();
    let hex = trimmed.strip_prefix('#')?;
    // Length checks below count bytes; multibyte input must not reach the slicing.
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some((r, g, b))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// Normalize a color to canonical lowercase `#rrggbb`, falling back to
/// `fallback` (and finally to [`DEFAULT_PEN`]) when parsing fails.
#[must_use]
pub fn normalize_hex_color(value: &str, fallback: &str) -> String {
    let rgb = parse_hex_rgb(value)
        .or_else(|| parse_hex_rgb(fallback))
        .or_else(|| parse_hex_rgb(DEFAULT_PEN));
    // DEFAULT_PEN always parses.
    let (r, g, b) = rgb.unwrap_or((0, 0, 0));
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Whether `color` matches the canvas `background` after normalization.
#[must_use]
pub fn is_background(color: &str, background: &str) -> bool {
    normalize_hex_color(color, DEFAULT_PEN) == normalize_hex_color(background, DEFAULT_BACKGROUND)
}
