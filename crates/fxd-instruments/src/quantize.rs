use crate::types::LotLimits;

/// Tolerance for deciding whether a clamped size still sits on the lot grid.
const GRID_EPS: f64 = 1e-9;

/// Snap a raw (model-suggested) size onto a symbol's lot grid.
///
/// Steps, in order:
/// 1. round to the nearest multiple of `lot_step`;
/// 2. clamp into `[min_lot, max_lot]`;
/// 3. if floating-point residue left the clamped value off-grid relative to
///    `min_lot`, re-snap by rounding the integer ratio
///    `(clamped − min_lot) / lot_step` and recomputing;
/// 4. round to 2 decimal places.
///
/// Non-finite input is treated as 0 before snapping (which then clamps up to
/// `min_lot`). Idempotent: `quantize(quantize(x, l), l) == quantize(x, l)`.
pub fn quantize(raw_size: f64, limits: &LotLimits) -> f64 {
    let raw = if raw_size.is_finite() { raw_size } else { 0.0 };
    let step = limits.lot_step;

    let snapped = round_dp((raw / step).round() * step, 2);
    let mut lots = snapped.clamp(limits.min_lot, limits.max_lot);

    let steps_from_min = (lots - limits.min_lot) / step;
    if (steps_from_min - steps_from_min.round()).abs() > GRID_EPS {
        lots = limits.min_lot + steps_from_min.round() * step;
    }

    round_dp(lots, 2)
}

fn round_dp(x: f64, dp: u32) -> f64 {
    let scale = 10f64.powi(dp as i32);
    (x * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(min: f64, max: f64, step: f64) -> LotLimits {
        LotLimits::new(min, max, step)
    }

    #[test]
    fn rounds_to_nearest_step() {
        let l = grid(0.01, 1.0, 0.01);
        assert_eq!(quantize(0.137, &l), 0.14);
        assert_eq!(quantize(0.132, &l), 0.13);
    }

    #[test]
    fn clamps_below_min_and_above_max() {
        let l = grid(0.01, 1.0, 0.01);
        assert_eq!(quantize(0.0001, &l), 0.01);
        assert_eq!(quantize(7.3, &l), 1.0);
        assert_eq!(quantize(-2.0, &l), 0.01);
    }

    #[test]
    fn zero_and_non_finite_snap_to_min() {
        let l = grid(0.01, 1.0, 0.01);
        assert_eq!(quantize(0.0, &l), 0.01);
        assert_eq!(quantize(f64::NAN, &l), 0.01);
        assert_eq!(quantize(f64::INFINITY, &l), 0.01);
    }

    #[test]
    fn coarse_grid_result_stays_on_the_min_relative_grid() {
        let l = grid(0.05, 1.05, 0.05);
        for raw in [0.0, 0.07, 0.22, 0.2199, 0.99, 5.0] {
            let q = quantize(raw, &l);
            let steps = (q - l.min_lot) / l.lot_step;
            assert!((steps - steps.round()).abs() < 1e-9, "off grid: {q}");
        }
    }

    #[test]
    fn idempotent_across_grids() {
        // Valid grids have min and max aligned to the step, as brokers do.
        let grids = [
            grid(0.01, 1.0, 0.01),
            grid(0.01, 100.0, 0.01),
            grid(0.05, 1.05, 0.05),
            grid(0.1, 50.0, 0.1),
            grid(0.02, 2.0, 0.02),
        ];
        let raws = [0.0, 0.004, 0.137, 0.2199, 1.0, 3.7, 49.99, 120.0, -1.0];
        for l in &grids {
            for &raw in &raws {
                let once = quantize(raw, l);
                let twice = quantize(once, l);
                assert_eq!(once, twice, "raw={raw} grid={l:?}");
            }
        }
    }
}
