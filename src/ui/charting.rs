/// X (test number) and Y (WPM) bounds for the progress chart.
/// The Y bound is rounded up to the next multiple of ten.
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let highest_wpm = points.iter().map(|&(_, wpm)| wpm).fold(0.0, f64::max);

    let overall_tests = match points.last() {
        Some(p) => p.0,
        None => 1.0,
    };

    (
        overall_tests.max(1.0),
        ((highest_wpm / 10.0).ceil() * 10.0).max(10.0),
    )
}

/// Plot points numbered from 1
pub fn series(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| ((i + 1) as f64, v))
        .collect()
}

/// Like [`series`], skipping slots the moving average leaves empty
pub fn trend_series(trend: &[Option<f64>]) -> Vec<(f64, f64)> {
    trend
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| ((i + 1) as f64, v)))
        .collect()
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
