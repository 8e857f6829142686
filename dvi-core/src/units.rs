//! DVI-unit to typographic conversion.
//!
//! A DVI unit is `num/den * 10^-7` meters, per the pre-amble's scale
//! pair. `to_big_points` converts to `bp` (1/72 inch), the unit SVG and
//! PDF use.

const METERS_PER_INCH: f64 = 0.0254;

pub fn to_big_points(raw: i64, num: u32, den: u32, mag: u32) -> f64 {
    if den == 0 {
        return 0.0;
    }
    let meters_per_dvi_unit = (num as f64 / den as f64) * 1e-7 * (mag as f64 / 1000.0);
    let inches = raw as f64 * meters_per_dvi_unit / METERS_PER_INCH;
    inches * 72.0
}
