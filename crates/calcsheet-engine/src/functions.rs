use calcsheet_core::EvalError;

/// Apply an aggregate function by its canonical (uppercase) name.
///
/// An empty value set yields 0 for every aggregate.
pub fn apply(name: &str, values: &[f64]) -> Result<f64, EvalError> {
    match name {
        "SUM" => Ok(sum(values)),
        "MIN" => Ok(min(values)),
        "MAX" => Ok(max(values)),
        "AVERAGE" => Ok(average(values)),
        _ => Err(EvalError::UnknownFunction {
            name: name.to_string(),
        }),
    }
}

/// SUM - Sum of all values
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// MIN - Minimum value (0 when empty)
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(None, |acc: Option<f64>, n| {
        Some(acc.map_or(n, |a| a.min(n)))
    })
    .unwrap_or(0.0)
}

/// MAX - Maximum value (0 when empty)
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(None, |acc: Option<f64>, n| {
        Some(acc.map_or(n, |a| a.max(n)))
    })
    .unwrap_or(0.0)
}

/// AVERAGE - Mean of all values (0 when empty)
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        sum(values) / values.len() as f64
    }
}
