use crate::{
    bayes::Label,
    error::{BayesError, Result},
};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{collections::HashMap, io, path::Path};

/// Feature rows paired with one label per row. All rows share one width.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Vec<Vec<f64>>,
    labels: Vec<Label>,
}

impl Dataset {
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<Label>) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(BayesError::LabelCountMismatch {
                rows: features.len(),
                labels: labels.len(),
            });
        }
        if let Some(first) = features.first() {
            let width = first.len();
            if let Some(row) = features.iter().find(|row| row.len() != width) {
                return Err(BayesError::DimensionMismatch {
                    context: "dataset row",
                    expected: width,
                    found: row.len(),
                });
            }
        }

        Ok(Dataset { features, labels })
    }

    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn num_features(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }
}

/// Assigns integer codes to string label tokens, one code per distinct token,
/// counting up from 0 in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    codes: HashMap<String, Label>,
    tokens: Vec<String>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(&mut self, token: &str) -> Label {
        if let Some(&code) = self.codes.get(token) {
            return code;
        }
        let code = self.tokens.len() as Label;
        self.codes.insert(token.to_string(), code);
        self.tokens.push(token.to_string());
        code
    }

    pub fn decode(&self, label: Label) -> Option<&str> {
        usize::try_from(label)
            .ok()
            .and_then(|i| self.tokens.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub has_header: bool,
    /// The label column holds tokens to run through a [`LabelEncoder`].
    pub string_labels: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            has_header: true,
            string_labels: false,
        }
    }
}

/// Reads a CSV whose last column is the label and whose other columns are features.
pub fn read_csv<P: AsRef<Path>>(
    path: P,
    options: &CsvOptions,
    encoder: &mut LabelEncoder,
) -> Result<Dataset> {
    let path = path.as_ref();
    log::debug!("reading dataset from {}", path.display());
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    from_reader(file, options, encoder)
}

pub fn from_reader<R: io::Read>(
    reader: R,
    options: &CsvOptions,
    encoder: &mut LabelEncoder,
) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(options.has_header)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut features = Vec::new();
    let mut labels = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        if record.iter().all(str::is_empty) {
            continue;
        }

        let (row, label) = parse_record(&record, line, options, encoder)?;
        features.push(row);
        labels.push(label);
    }

    log::debug!("read {} rows", labels.len());
    Dataset::new(features, labels)
}

fn parse_record(
    record: &StringRecord,
    line: u64,
    options: &CsvOptions,
    encoder: &mut LabelEncoder,
) -> Result<(Vec<f64>, Label)> {
    let label_column = record.len().checked_sub(1).ok_or(BayesError::MissingLabel { line })?;
    let token = &record[label_column];
    if token.is_empty() {
        return Err(BayesError::MissingLabel { line });
    }

    let label = if options.string_labels {
        encoder.encode(token)
    } else {
        token.parse().map_err(|_| BayesError::InvalidLabel {
            line,
            value: token.to_string(),
        })?
    };

    let row = record
        .iter()
        .take(label_column)
        .enumerate()
        .map(|(column, value)| {
            value.parse().map_err(|_| BayesError::InvalidFeature {
                line,
                column: column + 1,
                value: value.to_string(),
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok((row, label))
}
