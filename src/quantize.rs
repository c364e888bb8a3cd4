// Quantizer - biases a raw step position toward the nearest grid boundary

/// Quantize a step position toward the grid
///
/// `strength` is a 0..1 dial: 0 leaves the position untouched, 1 snaps it
/// exactly on-grid, and intermediate values drag the note toward the grid
/// while preserving some of the performance feel.
pub fn quantize(step: f64, strength: f64, grid: f64) -> f64 {
    if strength <= 0.0 || grid <= 0.0 {
        return step;
    }

    let snapped = (step / grid).round() * grid;
    step + (snapped - step) * strength.min(1.0)
}

/// Snap a step position fully onto the grid
pub fn snap(step: f64, grid: f64) -> f64 {
    quantize(step, 1.0, grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_strength_is_identity() {
        for step in [0.0, 0.3, 4.7, 15.99, 1000.5] {
            assert_eq!(quantize(step, 0.0, 1.0), step);
            assert_eq!(quantize(step, 0.0, 0.25), step);
        }
    }

    #[test]
    fn test_full_strength_snaps() {
        assert_eq!(quantize(4.3, 1.0, 1.0), 4.0);
        assert_eq!(quantize(4.7, 1.0, 1.0), 5.0);
        assert_eq!(quantize(4.5, 1.0, 1.0), 5.0); // round half away from zero
        assert_eq!(quantize(3.1, 1.0, 2.0), 4.0);
    }

    #[test]
    fn test_partial_strength_interpolates() {
        // Raw 4.4, grid 1.0: snapped = 4.0, half strength lands halfway
        let result = quantize(4.4, 0.5, 1.0);
        assert!((result - 4.2).abs() < 1e-9);
    }

    #[test]
    fn test_full_quantize_is_idempotent() {
        for step in [0.1, 2.6, 7.49, 12.5] {
            let once = quantize(step, 1.0, 1.0);
            let twice = quantize(once, 1.0, 1.0);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_strength_above_one_clamps() {
        assert_eq!(quantize(4.3, 2.0, 1.0), 4.0);
    }

    #[test]
    fn test_degenerate_grid_is_identity() {
        assert_eq!(quantize(4.3, 1.0, 0.0), 4.3);
        assert_eq!(quantize(4.3, 1.0, -1.0), 4.3);
    }

    #[test]
    fn test_snap() {
        assert_eq!(snap(4.3, 1.0), 4.0);
        assert_eq!(snap(0.6, 0.5), 0.5);
    }
}
