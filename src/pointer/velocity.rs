use super::MotionSample;

/// Linear least-squares fit of x(t) and y(t); returns (vx, vy) in px/s.
pub(super) fn least_squares(samples: &[MotionSample]) -> (f32, f32) {
    let mut count = 0u32;
    let mut sum_t = 0.0f64;
    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    let Some(origin_ms) = samples.first().map(|sample| sample.t_ms) else {
        return (0.0, 0.0);
    };

    for sample in samples {
        count += 1;
        sum_t += seconds_since(origin_ms, sample.t_ms);
        sum_x += sample.point.x as f64;
        sum_y += sample.point.y as f64;
    }
    if count < 2 {
        return (0.0, 0.0);
    }

    let n = count as f64;
    let mean_t = sum_t / n;
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;

    let mut var_t = 0.0f64;
    let mut cov_x = 0.0f64;
    let mut cov_y = 0.0f64;
    for sample in samples {
        let dt = seconds_since(origin_ms, sample.t_ms) - mean_t;
        var_t += dt * dt;
        cov_x += dt * (sample.point.x as f64 - mean_x);
        cov_y += dt * (sample.point.y as f64 - mean_y);
    }
    // All samples share one timestamp.
    if var_t <= f64::EPSILON {
        return (0.0, 0.0);
    }

    ((cov_x / var_t) as f32, (cov_y / var_t) as f32)
}

fn seconds_since(origin_ms: u64, t_ms: u64) -> f64 {
    t_ms.saturating_sub(origin_ms) as f64 / 1_000.0
}
