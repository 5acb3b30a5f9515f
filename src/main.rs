use anyhow::{Context, Result};
use clap::Parser;
use gaussian_bayes::{accuracy, dataset, CsvOptions, GaussianNb, Label, LabelEncoder};
use log::LevelFilter;
use std::path::{Path, PathBuf};

/// Fit a Gaussian Naive Bayes classifier to a CSV dataset and report its accuracy.
#[derive(Parser, Debug)]
#[command(name = "gnb", version)]
struct Args {
    /// Training CSV; the last column is the label.
    train: PathBuf,

    /// Evaluate on this CSV instead of the training set.
    #[arg(long)]
    test: Option<PathBuf>,

    /// The label column holds string tokens rather than integers.
    #[arg(long)]
    string_labels: bool,

    /// The files have no header line.
    #[arg(long)]
    no_header: bool,

    /// Write per-row predictions to this CSV.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Info)
        .parse_env(env_logger::Env::default().filter_or("GNB_LOG", "info"))
        .init();

    let args = Args::parse();
    let options = CsvOptions {
        has_header: !args.no_header,
        string_labels: args.string_labels,
    };

    let mut encoder = LabelEncoder::new();
    let train = dataset::read_csv(&args.train, &options, &mut encoder)
        .with_context(|| format!("failed to load training data from {}", args.train.display()))?;
    log::info!(
        "loaded {} training rows with {} features",
        train.len(),
        train.num_features()
    );

    let model = GaussianNb::new()
        .fit(train.features(), train.labels())
        .context("failed to fit model")?;

    let eval = match &args.test {
        Some(path) => dataset::read_csv(path, &options, &mut encoder)
            .with_context(|| format!("failed to load test data from {}", path.display()))?,
        None => train,
    };

    let predictions = model.predict(eval.features()).context("prediction failed")?;
    let score = accuracy(&predictions, eval.labels())?;
    println!("Accuracy: {}", score);

    if let Some(path) = &args.output {
        let decoder = args.string_labels.then_some(&encoder);
        write_predictions(path, &predictions, decoder)
            .with_context(|| format!("failed to write predictions to {}", path.display()))?;
        log::info!("wrote {} predictions to {}", predictions.len(), path.display());
    }

    Ok(())
}

fn write_predictions(path: &Path, predictions: &[Label], decoder: Option<&LabelEncoder>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(["ID", "Label"])?;
    for (i, &label) in predictions.iter().enumerate() {
        let label = match decoder.and_then(|d| d.decode(label)) {
            Some(token) => token.to_string(),
            None => label.to_string(),
        };
        writer.write_record([(i + 1).to_string(), label])?;
    }
    writer.flush()?;

    Ok(())
}
