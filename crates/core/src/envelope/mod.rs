use std::f64::consts::PI;

/// Shaping exponent applied to the half-sine. Higher values give a softer
/// attack and a longer dark tail between pulses. Reference renders depend on
/// this exact value.
pub const BREATH_EXPONENT: f64 = 1.45;

/// Brightness of a single breath `dt` milliseconds after its trigger.
///
/// The curve rises from 0 to `amplitude` at `duration_ms / 2` and falls back
/// to 0 at `duration_ms`. Outside of `[0, duration_ms]` the breath has either
/// not started yet or fully decayed, so the result is 0.
pub fn envelope(dt: f64, duration_ms: f64, amplitude: f64) -> f64 {
    if !(dt >= 0.0) || dt > duration_ms || duration_ms <= 0.0 {
        return 0.0;
    }

    let x = dt / duration_ms;
    // sin(pi) lands a hair off zero; never feed a negative base to powf.
    let s = (PI * x).sin().max(0.0);
    amplitude * s.powf(BREATH_EXPONENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn silent_outside_the_breath() {
        assert_eq!(envelope(-0.001, 900.0, 1.0), 0.0);
        assert_eq!(envelope(900.001, 900.0, 1.0), 0.0);
        assert_eq!(envelope(f64::NAN, 900.0, 1.0), 0.0);
    }

    #[test]
    fn starts_and_ends_dark() {
        assert!(envelope(0.0, 900.0, 1.0).abs() < EPS);
        assert!(envelope(900.0, 900.0, 1.0).abs() < EPS);
    }

    #[test]
    fn peaks_at_half_duration() {
        let amp = 0.7;
        let peak = envelope(450.0, 900.0, amp);
        assert!((peak - amp).abs() < EPS);

        for step in 0..=900 {
            let value = envelope(step as f64, 900.0, amp);
            assert!(value <= amp + EPS, "dt={step} gave {value}");
            assert!(value >= 0.0);
        }
    }

    #[test]
    fn follows_the_shaped_half_sine() {
        let expected = (PI * 100.0 / 900.0).sin().powf(1.45);
        assert!((envelope(100.0, 900.0, 1.0) - expected).abs() < EPS);
    }

    #[test]
    fn degenerate_duration_is_dark() {
        assert_eq!(envelope(0.0, 0.0, 1.0), 0.0);
    }
}
