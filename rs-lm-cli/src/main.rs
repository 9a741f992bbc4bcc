//! Command line front end: train, evaluate and sample language models over a
//! JSON corpus of annotated documents.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_lm_core::document::Layer;
use rs_lm_core::io::{build_output_path, load_model, read_corpus, save_model, MODEL_EXTENSION};
use rs_lm_core::{LanguageModel, ModelKind, Partition, Settings};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "rs-lm")]
#[command(version)]
#[command(about = "N-gram and hidden Markov language models: perplexity and generation")]
struct Cli {
	/// TOML settings file; defaults apply when omitted
	#[arg(short, long, global = true)]
	settings: Option<PathBuf>,

	/// Verbosity level (-v, -vv)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	verbose: u8,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Train one model on the training partition and save it
	Train {
		/// Corpus file or directory
		#[arg(short, long)]
		corpus: PathBuf,
		/// unigram, bigram, trigram, quadgram or hmm
		#[arg(short, long)]
		model: ModelKind,
		/// Defaults to `<corpus>.<kind>.bin` next to the corpus
		#[arg(short, long)]
		output: Option<PathBuf>,
	},
	/// Train and print the held-out perplexity of one or every model
	Evaluate {
		#[arg(short, long)]
		corpus: PathBuf,
		/// All five variants when omitted
		#[arg(short, long)]
		model: Option<ModelKind>,
	},
	/// Print sentences sampled from a saved model
	Generate {
		#[arg(short = 'f', long)]
		model_file: PathBuf,
		#[arg(short = 'n', long)]
		count: Option<usize>,
		#[arg(long)]
		seed: Option<u64>,
	},
	/// Print corpus statistics
	Inspect {
		#[arg(short, long)]
		corpus: PathBuf,
	},
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	let filter = match cli.verbose {
		0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rs_lm=info")),
		1 => EnvFilter::new("rs_lm=debug"),
		_ => EnvFilter::new("trace"),
	};
	fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	let settings = load_settings(cli.settings.as_deref())?;

	match cli.command {
		Commands::Train { corpus, model, output } => train(&settings, &corpus, model, output),
		Commands::Evaluate { corpus, model } => evaluate(&settings, &corpus, model),
		Commands::Generate { model_file, count, seed } => generate(&settings, &model_file, count, seed),
		Commands::Inspect { corpus } => inspect(&corpus),
	}
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
	let settings = match path {
		Some(path) => Settings::from_file(path).with_context(|| format!("failed to load settings {}", path.display()))?,
		None => Settings::default(),
	};
	let settings = settings.with_env_overrides()?;
	settings.validate()?;
	Ok(settings)
}

fn partition(settings: &Settings, corpus: &Path) -> Result<Partition> {
	let documents = read_corpus(corpus).with_context(|| format!("failed to read corpus {}", corpus.display()))?;
	Ok(Partition::split(documents, &settings.partition)?)
}

fn train(settings: &Settings, corpus: &Path, kind: ModelKind, output: Option<PathBuf>) -> Result<()> {
	let partition = partition(settings, corpus)?;
	let mut model = kind.build(&settings.model)?;
	model.train(partition.training())?;

	match model.evaluate_perplexity(partition.testing()) {
		Ok(perplexity) => info!(%kind, perplexity, "held-out perplexity"),
		Err(e) => warn!(%kind, error = %e, "held-out perplexity unavailable"),
	}

	let output = match output {
		Some(output) => output,
		None => build_output_path(corpus, &format!("{kind}.{MODEL_EXTENSION}"))?,
	};
	save_model(&output, &model)?;
	println!("{}", output.display());
	Ok(())
}

fn evaluate(settings: &Settings, corpus: &Path, kind: Option<ModelKind>) -> Result<()> {
	let partition = partition(settings, corpus)?;
	let kinds = match kind {
		Some(kind) => vec![kind],
		None => ModelKind::ALL.to_vec(),
	};

	for kind in kinds {
		let mut model = kind.build(&settings.model)?;
		model.train(partition.training())?;
		let perplexity = model
			.evaluate_perplexity(partition.testing())
			.with_context(|| format!("{kind} perplexity"))?;
		println!("{kind}\t{perplexity:.4}");
	}
	Ok(())
}

fn generate(settings: &Settings, model_file: &Path, count: Option<usize>, seed: Option<u64>) -> Result<()> {
	let model = load_model(model_file).with_context(|| format!("failed to load model {}", model_file.display()))?;
	let count = count.unwrap_or(settings.generation.count);
	let mut rng = match seed.or(settings.generation.seed) {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};

	for _ in 0..count {
		println!("{}", model.generate(&mut rng)?);
	}
	Ok(())
}

fn inspect(corpus: &Path) -> Result<()> {
	let documents = read_corpus(corpus).with_context(|| format!("failed to read corpus {}", corpus.display()))?;

	let usable = documents.iter().filter(|document| document.is_usable()).count();
	let sentences: u64 = documents.iter().map(|document| document.sentence_count()).sum();
	let tokens: u64 = documents.iter().map(|document| document.token_count()).sum();
	let mut words = BTreeSet::new();
	let mut tags = BTreeSet::new();
	for sentence in documents.iter().flat_map(|document| document.sentences()) {
		words.extend(Layer::Words.project(sentence));
		tags.extend(Layer::Tags.project(sentence));
	}

	println!("documents\t{}", documents.len());
	println!("usable\t{usable}");
	println!("sentences\t{sentences}");
	println!("tokens\t{tokens}");
	println!("words\t{}", words.len());
	println!("tags\t{}", tags.len());
	Ok(())
}
