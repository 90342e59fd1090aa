pub fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        count => Some(data.iter().sum::<f64>() / count as f64),
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}

/// Trailing moving average aligned with the input: the first `window - 1`
/// slots are `None`. Series shorter than the window produce all `None`.
pub fn moving_average(data: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 || data.len() < window {
        return vec![None; data.len()];
    }

    let mut out = vec![None; window - 1];
    out.extend(data.windows(window).map(mean));
    out
}

/// Round for display the way the results screen shows whole numbers
pub fn round_display(value: f64) -> i64 {
    if value.is_finite() {
        value.round() as i64
    } else {
        0
    }
}

/// `m:ss` timer label
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
