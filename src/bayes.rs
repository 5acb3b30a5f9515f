use crate::error::{BayesError, Result};
use std::{
    collections::{btree_map::Entry, BTreeMap},
    f64::consts::PI,
};

/// Class labels are arbitrary integers; they need not be contiguous or zero-based.
pub type Label = i64;

/// Smallest variance used when scoring. Features whose training values were all
/// identical would otherwise divide by zero in the density.
pub const VAR_FLOOR: f64 = 1e-9;

/// Running sums for the rows of a single class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassStatistics {
    count: usize,
    feature_sums: Vec<f64>,
    feature_squared_sums: Vec<f64>,
}

impl ClassStatistics {
    fn new(num_features: usize) -> Self {
        ClassStatistics {
            count: 0,
            feature_sums: vec![0.0; num_features],
            feature_squared_sums: vec![0.0; num_features],
        }
    }

    fn observe(&mut self, row: &[f64]) {
        self.count += 1;
        for ((sum, squared_sum), &value) in self
            .feature_sums
            .iter_mut()
            .zip(self.feature_squared_sums.iter_mut())
            .zip(row)
        {
            *sum += value;
            *squared_sum += value * value;
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn feature_sums(&self) -> &[f64] {
        &self.feature_sums
    }

    pub fn feature_squared_sums(&self) -> &[f64] {
        &self.feature_squared_sums
    }

    /// Mean of feature `j` over this class.
    pub fn mean(&self, j: usize) -> f64 {
        self.feature_sums[j] / self.count as f64
    }

    /// Population variance of feature `j`, unfloored. May come out as a tiny
    /// negative number through cancellation when all values are equal.
    pub fn variance(&self, j: usize) -> f64 {
        let mean = self.mean(j);
        self.feature_squared_sums[j] / self.count as f64 - mean * mean
    }

    pub fn means(&self) -> Vec<f64> {
        (0..self.feature_sums.len()).map(|j| self.mean(j)).collect()
    }

    pub fn variances(&self) -> Vec<f64> {
        (0..self.feature_sums.len()).map(|j| self.variance(j)).collect()
    }
}

/// Density of the normal distribution `N(mean, variance)` at `x`.
pub fn gaussian_density(x: f64, mean: f64, variance: f64) -> f64 {
    let exponent = (-(x - mean) * (x - mean) / (2.0 * variance)).exp();
    exponent / (2.0 * PI * variance).sqrt()
}

/// Natural log of [`gaussian_density`], computed without going through `exp`
/// so a far-off value under a tiny variance stays finite instead of becoming `-inf`.
pub fn log_gaussian_density(x: f64, mean: f64, variance: f64) -> f64 {
    let diff = x - mean;
    -0.5 * (2.0 * PI * variance).ln() - diff * diff / (2.0 * variance)
}

/// Trainer for [`Model`]. Holds only the variance floor handed to the model.
#[derive(Debug, Clone, Copy)]
pub struct GaussianNb {
    var_floor: f64,
}

impl Default for GaussianNb {
    fn default() -> Self {
        GaussianNb {
            var_floor: VAR_FLOOR,
        }
    }
}

impl GaussianNb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be positive; [`GaussianNb::fit`] rejects anything else.
    pub fn with_var_floor(mut self, var_floor: f64) -> Self {
        self.var_floor = var_floor;
        self
    }

    /// Fits per-class statistics and priors in a single pass over `features`.
    pub fn fit<R: AsRef<[f64]>>(&self, features: &[R], labels: &[Label]) -> Result<Model> {
        if self.var_floor.is_nan() || self.var_floor <= 0.0 {
            return Err(BayesError::InvalidVarFloor(self.var_floor));
        }
        let first = features.first().ok_or(BayesError::EmptyDataset)?;
        if labels.len() != features.len() {
            return Err(BayesError::LabelCountMismatch {
                rows: features.len(),
                labels: labels.len(),
            });
        }

        let num_features = first.as_ref().len();
        let mut classes = BTreeMap::new();
        for (row, &label) in features.iter().zip(labels) {
            let row = row.as_ref();
            if row.len() != num_features {
                return Err(BayesError::DimensionMismatch {
                    context: "training row",
                    expected: num_features,
                    found: row.len(),
                });
            }

            match classes.entry(label) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(ClassStatistics::new(num_features)),
            }
            .observe(row);
        }

        let fallback = *classes.keys().next().ok_or(BayesError::EmptyDataset)?;
        let total = features.len() as f64;
        let priors: BTreeMap<Label, f64> = classes
            .iter()
            .map(|(&label, stats)| (label, stats.count as f64 / total))
            .collect();

        for (label, stats) in &classes {
            for j in 0..num_features {
                let variance = stats.variance(j);
                if variance < self.var_floor {
                    log::debug!(
                        "class {} feature {} has variance {:e}; flooring to {:e}",
                        label,
                        j,
                        variance,
                        self.var_floor
                    );
                }
            }
        }

        log::debug!(
            "fitted {} classes over {} rows with {} features",
            classes.len(),
            features.len(),
            num_features
        );

        Ok(Model {
            classes,
            priors,
            num_features,
            var_floor: self.var_floor,
            fallback,
        })
    }
}

/// A trained classifier. Only [`GaussianNb::fit`] creates one, so it always
/// knows at least one class.
#[derive(Debug, Clone)]
pub struct Model {
    classes: BTreeMap<Label, ClassStatistics>,
    priors: BTreeMap<Label, f64>,
    num_features: usize,
    var_floor: f64,
    /// Smallest label; returned when no score beats negative infinity.
    fallback: Label,
}

impl Model {
    /// Known labels, ascending. Every score is computed in this order.
    pub fn classes(&self) -> impl Iterator<Item = Label> + '_ {
        self.classes.keys().copied()
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn var_floor(&self) -> f64 {
        self.var_floor
    }

    pub fn prior(&self, label: Label) -> Option<f64> {
        self.priors.get(&label).copied()
    }

    pub fn priors(&self) -> &BTreeMap<Label, f64> {
        &self.priors
    }

    pub fn statistics(&self, label: Label) -> Option<&ClassStatistics> {
        self.classes.get(&label)
    }

    /// Log prior plus summed log densities for every class, in label order.
    pub fn log_posteriors(&self, row: &[f64]) -> Result<Vec<(Label, f64)>> {
        if row.len() != self.num_features {
            return Err(BayesError::DimensionMismatch {
                context: "prediction row",
                expected: self.num_features,
                found: row.len(),
            });
        }

        Ok(self
            .classes
            .iter()
            .map(|(&label, stats)| {
                let log_likelihood: f64 = row
                    .iter()
                    .enumerate()
                    .map(|(j, &x)| {
                        let variance = stats.variance(j).max(self.var_floor);
                        log_gaussian_density(x, stats.mean(j), variance)
                    })
                    .sum();
                (label, self.priors[&label].ln() + log_likelihood)
            })
            .collect())
    }

    /// Label with the strictly largest score; ties go to the first label in order.
    pub fn predict_row(&self, row: &[f64]) -> Result<Label> {
        let (label, score) = self.log_posteriors(row)?.into_iter().fold(
            (self.fallback, f64::NEG_INFINITY),
            |(best_label, best_score), (label, score)| {
                if score > best_score {
                    (label, score)
                } else {
                    (best_label, best_score)
                }
            },
        );

        log::trace!("predicted {} with log-posterior {}", label, score);
        Ok(label)
    }

    /// One predicted label per input row, in input order.
    pub fn predict<R: AsRef<[f64]>>(&self, features: &[R]) -> Result<Vec<Label>> {
        features
            .iter()
            .map(|row| self.predict_row(row.as_ref()))
            .collect()
    }
}

/// Fits a model with the default variance floor.
pub fn fit<R: AsRef<[f64]>>(features: &[R], labels: &[Label]) -> Result<Model> {
    GaussianNb::default().fit(features, labels)
}

pub fn predict<R: AsRef<[f64]>>(model: &Model, features: &[R]) -> Result<Vec<Label>> {
    model.predict(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn constant_classes_scenario() {
        let x = [[0.0], [0.0], [0.0], [10.0], [10.0], [10.0]];
        let y = [0, 0, 0, 1, 1, 1];
        let model = fit(&x, &y).unwrap();

        let zero = model.statistics(0).unwrap();
        let one = model.statistics(1).unwrap();
        assert_eq!(zero.count(), 3);
        assert_eq!(zero.mean(0), 0.0);
        assert_eq!(zero.variance(0), 0.0);
        assert_eq!(one.mean(0), 10.0);
        assert_eq!(one.variance(0), 0.0);
        assert_eq!(model.prior(0), Some(0.5));
        assert_eq!(model.prior(1), Some(0.5));

        assert_eq!(model.predict(&[[0.0], [10.0]]).unwrap(), vec![0, 1]);
    }

    #[test]
    fn midpoint_between_constant_classes_goes_to_smaller_label() {
        let x = [[0.0], [0.0], [0.0], [10.0], [10.0], [10.0]];
        let y = [0, 0, 0, 1, 1, 1];
        let model = fit(&x, &y).unwrap();

        let scores = model.log_posteriors(&[5.0]).unwrap();
        assert_eq!(scores[0].1, scores[1].1);
        assert!(scores[0].1.is_finite());
        assert_eq!(model.predict_row(&[5.0]).unwrap(), 0);
    }

    #[test]
    fn floored_scores_stay_finite() {
        let model = fit(&[[1.0], [1.0]], &[3, 3]).unwrap();
        let scores = model.log_posteriors(&[1e6]).unwrap();
        assert!(scores[0].1.is_finite());
        assert!(scores[0].1 < -1e20);
    }

    #[test]
    fn population_variance() {
        let model = fit(&[[1.0, 4.0], [2.0, 4.0], [3.0, 4.0]], &[7, 7, 7]).unwrap();
        let stats = model.statistics(7).unwrap();
        assert_close(stats.mean(0), 2.0);
        assert_close(stats.variance(0), 2.0 / 3.0);
        assert_close(stats.variance(1), 0.0);
        assert_eq!(stats.means(), vec![2.0, 4.0]);
        assert_eq!(stats.variances().len(), 2);
        assert_eq!(stats.feature_sums(), &[6.0, 12.0]);
        assert_eq!(stats.feature_squared_sums(), &[14.0, 48.0]);
    }

    #[test]
    fn non_contiguous_labels() {
        let x = [[0.1, 0.2], [0.3, 0.1], [50.0, 51.0], [50.5, 50.2], [-20.0, -21.0]];
        let y = [42, 42, -7, -7, 1000];
        let model = fit(&x, &y).unwrap();

        assert_eq!(model.classes().collect::<Vec<_>>(), vec![-7, 42, 1000]);
        let sum: f64 = model.priors().values().sum();
        assert_close(sum, 1.0);
        assert_eq!(model.predict(&x).unwrap(), y.to_vec());
    }

    #[test]
    fn ties_go_to_smallest_label_regardless_of_row_order() {
        let x = [[1.0], [3.0], [1.0], [3.0]];
        let y = [5, 5, 2, 2];
        let model = fit(&x, &y).unwrap();
        for _ in 0..3 {
            assert_eq!(model.predict_row(&[2.0]).unwrap(), 2);
        }
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let x: [[f64; 2]; 0] = [];
        assert!(matches!(fit(&x, &[]), Err(BayesError::EmptyDataset)));
    }

    #[test]
    fn ragged_training_rows_are_rejected() {
        let x = vec![vec![1.0, 2.0], vec![1.0]];
        let err = fit(&x, &[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            BayesError::DimensionMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn label_count_must_match_rows() {
        let err = fit(&[[1.0], [2.0]], &[0]).unwrap_err();
        assert!(matches!(
            err,
            BayesError::LabelCountMismatch { rows: 2, labels: 1 }
        ));
    }

    #[test]
    fn prediction_width_must_match_model() {
        let model = fit(&[[1.0, 2.0], [3.0, 4.0]], &[0, 1]).unwrap();
        assert!(matches!(
            model.predict(&[vec![1.0, 2.0, 3.0]]),
            Err(BayesError::DimensionMismatch {
                expected: 2,
                found: 3,
                ..
            })
        ));
        assert!(model.predict_row(&[1.0]).is_err());
    }

    #[test]
    fn density_matches_standard_normal() {
        assert_close(gaussian_density(0.0, 0.0, 1.0), 1.0 / (2.0 * PI).sqrt());
        assert_close(
            log_gaussian_density(1.5, 0.5, 2.0),
            gaussian_density(1.5, 0.5, 2.0).ln(),
        );
    }

    #[test]
    fn custom_var_floor_is_carried_by_model() {
        let model = GaussianNb::new()
            .with_var_floor(1e-3)
            .fit(&[[0.0], [1.0]], &[0, 1])
            .unwrap();
        assert_eq!(model.var_floor(), 1e-3);
        assert_eq!(model.num_features(), 1);
    }

    #[test]
    fn non_positive_var_floor_is_rejected() {
        let x = [[0.0], [0.0], [10.0], [10.0]];
        let y = [0, 0, 1, 1];
        for floor in [0.0, -1.0, f64::NAN] {
            let result = GaussianNb::new().with_var_floor(floor).fit(&x, &y);
            assert!(matches!(result, Err(BayesError::InvalidVarFloor(_))));
        }

        let model = GaussianNb::new().with_var_floor(1e-12).fit(&x, &y).unwrap();
        assert!(model.log_posteriors(&[10.0]).unwrap().iter().all(|(_, s)| s.is_finite()));
        assert_eq!(model.predict_row(&[10.0]).unwrap(), 1);
    }

    #[test]
    fn unscorable_row_falls_back_to_smallest_label() {
        let model = fit(&[[1.0], [2.0], [5.0], [6.0]], &[9, 9, 4, 4]).unwrap();
        assert_eq!(model.predict_row(&[f64::NAN]).unwrap(), 4);
        assert_eq!(model.predict_row(&[5.5]).unwrap(), 4);
        assert_eq!(model.predict_row(&[1.5]).unwrap(), 9);
    }
}
