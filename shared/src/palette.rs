use serde::Serialize;

/// How far hover colours are blended toward white.
pub const HOVER_LIGHTEN_FACTOR: f64 = 0.2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MagnitudeColor {
    /// Design-system token, e.g. `red.400`.
    pub token: &'static str,
    pub hex: &'static str,
    pub hover_hex: String,
}

const SCALE: &[(f64, &str, &str)] = &[
    (6.0, "purple.400", "#9F7AEA"),
    (5.0, "red.400", "#F56565"),
    (4.0, "orange.400", "#ED8936"),
    (3.0, "yellow.400", "#ECC94B"),
    (2.0, "green.400", "#48BB78"),
];

const BASE: (&str, &str) = ("blue.400", "#4299E1");

#[must_use]
pub fn magnitude_color(magnitude: f64) -> MagnitudeColor {
    let (token, hex) = SCALE
        .iter()
        .find(|(min, _, _)| magnitude >= *min)
        .map_or(BASE, |(_, token, hex)| (*token, *hex));
    MagnitudeColor {
        token,
        hex,
        hover_hex: lighten_hex(hex, HOVER_LIGHTEN_FACTOR),
    }
}

/// Blends a `#rrggbb` colour toward white by `factor` (0 = unchanged, 1 = white).
///
/// Malformed input is returned unchanged.
#[must_use]
pub fn lighten_hex(hex: &str, factor: f64) -> String {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return hex.to_owned();
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    let (Some(r), Some(g), Some(b)) = (channel(0..2), channel(2..4), channel(4..6)) else {
        return hex.to_owned();
    };
    let lift = |c: u8| {
        let c = f64::from(c);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let lifted = (c + (255.0 - c) * factor).floor().clamp(0.0, 255.0) as u8;
        lifted
    };
    format!("#{:02x}{:02x}{:02x}", lift(r), lift(g), lift(b))
}
