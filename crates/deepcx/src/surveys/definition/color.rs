//! Branding color normalization and readable text contrast.

pub const DEFAULT_PRIMARY_COLOR: &str = "#4F46E5";
pub const DARK_TEXT: &str = "#111111";
pub const LIGHT_TEXT: &str = "#ffffff";

// Luma above which dark text is used on the background.
const LUMA_THRESHOLD: f64 = 160.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Normalize `input` to lowercase `#rrggbb`, or return `fallback` untouched.
///
/// Characters outside `[#0-9a-f]` are dropped after lowercasing, a missing
/// `#` is added, and `#rgb` shorthand is expanded.
pub fn normalize_hex_color(input: &str, fallback: &str) -> String {
    let trimmed = input.trim().to_ascii_lowercase();
    if trimmed.is_empty() {
        return fallback.to_string();
    }

    let prefixed = if trimmed.starts_with('#') {
        trimmed
    } else {
        format!("#{trimmed}")
    };
    let hex: String = prefixed
        .chars()
        .filter(|c| *c == '#' || c.is_ascii_digit() || ('a'..='f').contains(c))
        .collect();

    let digits = &hex[1..];
    let well_formed = hex.starts_with('#')
        && matches!(digits.len(), 3 | 6)
        && digits.chars().all(|c| c.is_ascii_hexdigit());
    if !well_formed {
        return fallback.to_string();
    }

    if digits.len() == 3 {
        let mut expanded = String::with_capacity(7);
        expanded.push('#');
        for c in digits.chars() {
            expanded.push(c);
            expanded.push(c);
        }
        return expanded;
    }

    hex
}

/// Channels of `hex` after normalization against the default color.
pub fn hex_to_rgb(hex: &str) -> Rgb {
    let normalized = normalize_hex_color(hex, DEFAULT_PRIMARY_COLOR).to_ascii_lowercase();
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&normalized[range], 16).unwrap_or_default()
    };
    Rgb {
        r: channel(1..3),
        g: channel(3..5),
        b: channel(5..7),
    }
}

/// Pick dark or light text for the given background.
pub fn contrast_text_color(background: &str) -> &'static str {
    let Rgb { r, g, b } = hex_to_rgb(background);
    let luma = 0.2126 * f64::from(r) + 0.7152 * f64::from(g) + 0.0722 * f64::from(b);
    if luma > LUMA_THRESHOLD {
        DARK_TEXT
    } else {
        LIGHT_TEXT
    }
}
