/// Mean of the present values, `None` when nothing is present.
pub fn nan_mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}

/// Population standard deviation (ddof = 0) of the present values.
pub fn nan_std(values: &[Option<f64>]) -> Option<f64> {
    let mean = nan_mean(values)?;
    let (sq, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sq, count), v| (sq + (v - mean).powi(2), count + 1));
    Some((sq / count as f64).sqrt())
}

/// z-score of every present value against the present values only.
///
/// Missing inputs stay missing. A zero spread scores every present value 0.
pub fn nan_zscore(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let (Some(mean), Some(std)) = (nan_mean(values), nan_std(values)) else {
        return vec![None; values.len()];
    };
    values
        .iter()
        .map(|v| {
            v.map(|v| if std > 0.0 { (v - mean) / std } else { 0.0 })
        })
        .collect()
}

/// Index of the smallest present value, first one on ties.
pub fn nan_argmin(values: &[Option<f64>]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter_map(|(idx, v)| v.filter(|v| !v.is_nan()).map(|v| (idx, v)))
        .fold(None, |best: Option<(usize, f64)>, (idx, v)| match best {
            Some((_, b)) if b <= v => best,
            _ => Some((idx, v)),
        })
        .map(|(idx, _)| idx)
}
