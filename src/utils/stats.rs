fn finite(values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    values.iter().copied().filter(|v| v.is_finite())
}

/// Arithmetic mean of the finite values, `None` when there are none
pub fn mean(values: &[f64]) -> Option<f64> {
    let (sum, count) = finite(values).fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}

/// Population standard deviation (divides by N) of the finite values
pub fn population_std(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let (sum_sq, count) = finite(values)
        .fold((0.0, 0usize), |(sum, count), v| (sum + (v - mean).powi(2), count + 1));
    Some((sum_sq / count as f64).sqrt())
}

/// Band of one standard deviation around the mean: (lower, upper)
pub fn std_band(values: &[f64]) -> Option<(f64, f64)> {
    let mean = mean(values)?;
    let std_dev = population_std(values)?;
    Some((mean - std_dev, mean + std_dev))
}

/// Y range covering every finite value with 10% padding on each side
pub fn padded_range<'a, I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = &'a f64>,
{
    let (min, max) = values.into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }

    // Flat series still need a visible range
    let range = (max - min).max(1e-8);
    let padding = (range * 0.1).max(max.abs().max(1.0) * 1e-3);
    (min - padding, max + padding)
}
