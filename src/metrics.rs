use crate::{
    bayes::Label,
    error::{BayesError, Result},
};

/// Fraction of positions where `predicted` agrees with `actual`.
///
/// Two empty arrays have no disagreements and score 1.0.
pub fn accuracy(predicted: &[Label], actual: &[Label]) -> Result<f64> {
    if predicted.len() != actual.len() {
        return Err(BayesError::DimensionMismatch {
            context: "accuracy labels",
            expected: actual.len(),
            found: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Ok(1.0);
    }

    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p == a)
        .count();
    Ok(correct as f64 / actual.len() as f64)
}
