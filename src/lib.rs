//! Gaussian Naive Bayes over real-valued feature rows with integer class labels.
//!
//! [`bayes`] fits per-class feature statistics and predicts labels,
//! [`metrics`] scores predictions, and [`dataset`] loads CSV files into the
//! row/label shape the classifier consumes.
pub mod bayes;
pub mod dataset;
pub mod error;
pub mod metrics;

pub use bayes::{fit, predict, ClassStatistics, GaussianNb, Label, Model, VAR_FLOOR};
pub use dataset::{CsvOptions, Dataset, LabelEncoder};
pub use error::{BayesError, Result};
pub use metrics::accuracy;
