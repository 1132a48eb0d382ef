//! Marker colors

/// Color for entries whose numeric value is missing
pub const MASKED_COLOR: &str = "#000000";

/// Nine-step sequential "Reds" scale, lightest first
const REDS: [[u8; 3]; 9] = [
    [0xff, 0xf5, 0xf0],
    [0xfe, 0xe0, 0xd2],
    [0xfc, 0xbb, 0xa1],
    [0xfc, 0x92, 0x72],
    [0xfb, 0x6a, 0x4a],
    [0xef, 0x3b, 0x2c],
    [0xcb, 0x18, 0x1d],
    [0xa5, 0x0f, 0x15],
    [0x67, 0x00, 0x0d],
];

fn hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// Map `t` in [0, 1] onto the Reds scale by linear interpolation between stops
///
/// Values outside the range are clamped; NaN maps to the lightest color.
pub fn reds(t: f64) -> String {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (REDS.len() - 1) as f64;
    let lower = scaled.floor() as usize;
    if lower >= REDS.len() - 1 {
        return hex(REDS[REDS.len() - 1]);
    }

    let frac = scaled - lower as f64;
    let (a, b) = (REDS[lower], REDS[lower + 1]);
    let mut rgb = [0u8; 3];
    for i in 0..3 {
        let v = f64::from(a[i]) + (f64::from(b[i]) - f64::from(a[i])) * frac;
        rgb[i] = v.round() as u8;
    }
    hex(rgb)
}
