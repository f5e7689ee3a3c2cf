//! Unit conversion utilities.
//!
//! Both container formats store lengths in HWPUNIT (1/7200 inch, so one point
//! is 100 units) and font sizes in hundredths of a point.

pub const HWPUNITS_PER_INCH: i64 = 7_200;
pub const HWPUNITS_PER_PT: i64 = 100;
pub const MM_PER_INCH: f64 = 25.4;

#[inline]
pub fn hwpunit_to_pt(units: i64) -> f64 {
    units as f64 / HWPUNITS_PER_PT as f64
}

#[inline]
pub fn hwpunit_to_inch(units: i64) -> f64 {
    units as f64 / HWPUNITS_PER_INCH as f64
}

#[inline]
pub fn hwpunit_to_mm(units: i64) -> f64 {
    hwpunit_to_inch(units) * MM_PER_INCH
}

#[inline]
pub fn mm_to_hwpunit(mm: f64) -> i64 {
    (mm / MM_PER_INCH * HWPUNITS_PER_INCH as f64).round() as i64
}

#[inline]
pub fn pt_to_hwpunit(pt: f64) -> i64 {
    (pt * HWPUNITS_PER_PT as f64).round() as i64
}

/// Parse a length written with an optional unit suffix into millimetres.
///
/// Border widths in HWPX are written as `"0.12 mm"`; bare numbers are taken
/// as millimetres. `cm`, `in` and `pt` suffixes are also understood.
///
/// # Examples
///
/// ```
/// use hwpdoc::common::unit::parse_length_mm;
/// assert_eq!(parse_length_mm("0.5 mm"), Some(0.5));
/// assert_eq!(parse_length_mm("1cm"), Some(10.0));
/// assert_eq!(parse_length_mm("bogus"), None);
/// ```
pub fn parse_length_mm(value: &str) -> Option<f64> {
    let value = value.trim();
    let (number, consumed) = fast_float2::parse_partial::<f64, _>(value).ok()?;
    let suffix = value[consumed..].trim();
    let factor = match suffix {
        "" | "mm" => 1.0,
        "cm" => 10.0,
        "in" => MM_PER_INCH,
        "pt" => MM_PER_INCH / 72.0,
        _ => return None,
    };
    Some(number * factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hwpunit_conversions() {
        assert_eq!(hwpunit_to_pt(1000), 10.0);
        assert_eq!(hwpunit_to_inch(7200), 1.0);
        assert!((hwpunit_to_mm(7200) - 25.4).abs() < 1e-9);
        assert_eq!(mm_to_hwpunit(210.0), 59528);
        assert_eq!(pt_to_hwpunit(10.5), 1050);
    }

    #[test]
    fn test_parse_length_suffixes() {
        assert_eq!(parse_length_mm("0.12 mm"), Some(0.12));
        assert_eq!(parse_length_mm("2"), Some(2.0));
        assert_eq!(parse_length_mm("1 in"), Some(25.4));
        assert_eq!(parse_length_mm("3 furlongs"), None);
    }
}
