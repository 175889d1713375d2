use anyhow::{bail, Context, Result};
use ann_engine::architecture::{build_network, load_architecture, ArchitectureConfig};
use ann_engine::config::{load_config, TrainingConfig};
use ann_engine::dataset::{load_split, Split};
use ann_engine::layers::SoftmaxCrossEntropy;
use ann_engine::utils::seeded_rng;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

// MLP with minibatches on the crate's matrix engine for MNIST.
const NUM_INPUTS: usize = 784;
const HIDDEN_SIZES: [usize; 2] = [32, 16];
const NUM_OUTPUTS: usize = 10;
const LEAKY_RELU_ALPHA: f32 = 0.01;
const DROP_RATE: f32 = 0.1;

const USAGE: &str = "usage: mnist_mlp <data_dir> [training_config.json] [architecture.json]";

struct Args {
    data_dir: PathBuf,
    training_config: Option<PathBuf>,
    architecture: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args_os().skip(1);
    let data_dir = match args.next() {
        Some(dir) => PathBuf::from(dir),
        None => bail!(USAGE),
    };
    let training_config = args.next().map(PathBuf::from);
    let architecture = args.next().map(PathBuf::from);
    if args.next().is_some() {
        bail!(USAGE);
    }
    Ok(Args {
        data_dir,
        training_config,
        architecture,
    })
}

/// Loads the train and test splits from the standard MNIST file names in `data_dir`.
fn load_mnist(data_dir: &Path) -> Result<(Split, Split)> {
    let train = load_split(
        data_dir.join("train-labels.idx1-ubyte"),
        data_dir.join("train-images.idx3-ubyte"),
    )
    .context("loading training split")?;
    let test = load_split(
        data_dir.join("t10k-labels.idx1-ubyte"),
        data_dir.join("t10k-images.idx3-ubyte"),
    )
    .context("loading test split")?;
    Ok((train, test))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let program_start = Instant::now();
    let args = parse_args()?;

    let config = match &args.training_config {
        Some(path) => load_config(path).with_context(|| format!("reading {}", path.display()))?,
        None => TrainingConfig::default(),
    };
    let architecture = match &args.architecture {
        Some(path) => load_architecture(path).with_context(|| format!("reading {}", path.display()))?,
        None => ArchitectureConfig::mlp(NUM_INPUTS, &HIDDEN_SIZES, NUM_OUTPUTS, LEAKY_RELU_ALPHA, DROP_RATE),
    };
    info!("training config: {:?}", config);

    info!("Loading data...");
    let load_start = Instant::now();
    let (train, test) = load_mnist(&args.data_dir)?;
    let load_time = load_start.elapsed().as_secs_f64();
    info!("Data loading time: {:.2} seconds", load_time);

    if let Some(inputs) = architecture.input_size() {
        if inputs != train.features() {
            bail!(
                "architecture expects {} input features but the samples have {}",
                inputs,
                train.features()
            );
        }
    } else {
        warn!("architecture has no dense layer; inputs pass through unchanged");
    }

    info!("Initializing neural network...");
    let mut rng = seeded_rng(config.seed);
    let mut network = build_network(&architecture, &mut rng)?;
    let mut optimizer = config.build_optimizer();
    let mut loss = SoftmaxCrossEntropy::new();

    info!("Training neural network...");
    let train_start = Instant::now();
    for epoch in 0..config.epochs {
        let epoch_start = Instant::now();
        let report = network.train_epoch(
            &train.samples,
            &train.labels,
            config.batch_size,
            &mut loss,
            optimizer.as_mut(),
            &mut rng,
        )?;
        info!(
            "Epoch {}, acc: {:.4}, loss: {:.4} (data_loss: {:.4}, reg_loss: {:.4}), lr: {:.6} Time: {:.2}s",
            epoch + 1,
            report.accuracy,
            report.total_loss(),
            report.data_loss,
            report.regularization_loss,
            report.learning_rate,
            epoch_start.elapsed().as_secs_f32()
        );
    }
    let train_time = train_start.elapsed().as_secs_f64();
    info!("Total training time: {:.2} seconds", train_time);

    info!("Testing neural network...");
    let test_start = Instant::now();
    let report = network.evaluate(&test.samples, &test.labels, config.batch_size, &mut loss)?;
    let test_time = test_start.elapsed().as_secs_f64();
    info!(
        "Test accuracy: {:.2}%, loss: {:.4}",
        report.accuracy * 100.0,
        report.data_loss
    );

    let total_time = program_start.elapsed().as_secs_f64();
    info!("=== Performance Summary ===");
    info!("Data loading time: {:.2} seconds", load_time);
    info!("Total training time: {:.2} seconds", train_time);
    info!("Testing time: {:.2} seconds", test_time);
    info!("Total program time: {:.2} seconds", total_time);
    Ok(())
}
