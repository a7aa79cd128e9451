//! # Cent Meter
//!
//! A one-line text meter showing how far the slider pitch sits from the
//! nearest equal-tempered note, with a zone label in place of colour.

/// Maximum cent deviation shown by the meter.
/// The meter spans -50 to +50 cents.
const METER_RANGE: f64 = 50.0;

/// Number of cells between the two ends of the meter.
const METER_WIDTH: usize = 21;

/// Renders e.g. `[----------|----*-----] +20c sharp`.
pub fn render(cents: f64) -> String {
    let clamped = cents.clamp(-METER_RANGE, METER_RANGE);
    let fraction = (clamped + METER_RANGE) / (2.0 * METER_RANGE);
    let needle = (fraction * (METER_WIDTH - 1) as f64).round() as usize;
    let center = METER_WIDTH / 2;

    let bar: String = (0..METER_WIDTH)
        .map(|i| {
            if i == needle {
                '*'
            } else if i == center {
                '|'
            } else {
                '-'
            }
        })
        .collect();

    format!("[{}] {:+.0}c {}", bar, cents, zone(cents))
}

fn zone(cents: f64) -> &'static str {
    if cents.abs() < 5.0 {
        "in tune"
    } else if cents > 0.0 {
        "sharp"
    } else {
        "flat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needle_sits_on_center_when_in_tune() {
        assert_eq!(render(0.0), "[----------*----------] +0c in tune");
    }

    #[test]
    fn needle_clamps_at_the_ends() {
        assert!(render(-80.0).starts_with("[*"));
        assert!(render(80.0).contains("*]"));
        assert!(render(80.0).ends_with("sharp"));
        assert!(render(-25.0).ends_with("flat"));
    }
}
