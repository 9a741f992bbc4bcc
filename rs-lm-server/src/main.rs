use std::collections::BTreeMap;
use std::env;
use std::io;

use actix_cors::Cors;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_lm_core::io::read_corpus;
use rs_lm_core::{AnyModel, LanguageModel, ModelKind, Partition, Settings};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Upper bound on sentences returned by one `/v1/generate` call.
const MAX_COUNT: usize = 1000;

/// Query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	model: Option<String>,
	count: Option<usize>,
	seed: Option<u64>,
}

#[derive(Deserialize)]
struct ModelQuery {
	model: Option<String>,
}

struct ServedModel {
	model: AnyModel,
	/// Held-out perplexity computed at startup, if it could be computed
	perplexity: Option<f64>,
}

/// Trained models, read-only once the server starts.
struct SharedData {
	models: BTreeMap<ModelKind, ServedModel>,
	default_count: usize,
}

impl SharedData {
	fn find(&self, name: Option<&str>) -> Result<(ModelKind, &ServedModel), HttpResponse> {
		let name = name.ok_or_else(|| HttpResponse::BadRequest().body("Missing model name"))?;
		let kind: ModelKind = name.parse().map_err(|e| HttpResponse::BadRequest().body(format!("{e}")))?;
		self.models
			.get(&kind)
			.map(|served| (kind, served))
			.ok_or_else(|| HttpResponse::NotFound().body(format!("Model '{kind}' is not loaded")))
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Samples `count` sentences from one model, one per line. The same `seed`
/// always returns the same text.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<SharedData>, query: web::Query<GenerateParams>) -> impl Responder {
	let (kind, served) = match data.find(query.model.as_deref()) {
		Ok(found) => found,
		Err(response) => return response,
	};

	let count = query.count.unwrap_or(data.default_count);
	if count == 0 || count > MAX_COUNT {
		return HttpResponse::BadRequest().body(format!("Count must be between 1 and {MAX_COUNT}"));
	}

	let mut rng = match query.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};

	let mut lines = Vec::with_capacity(count);
	for _ in 0..count {
		match served.model.generate(&mut rng) {
			Ok(text) => lines.push(text),
			Err(e) => {
				warn!(%kind, error = %e, "generation failed");
				return HttpResponse::InternalServerError().body(format!("Generation failed: {e}"));
			}
		}
	}
	HttpResponse::Ok().body(lines.join("\n"))
}

#[get("/v1/models")]
async fn get_models(data: web::Data<SharedData>) -> impl Responder {
	let names: Vec<&str> = data.models.keys().map(|kind| kind.name()).collect();
	HttpResponse::Ok().body(names.join("\n"))
}

/// Precomputed held-out perplexity of one model, or of every model when no
/// name is given.
#[get("/v1/perplexity")]
async fn get_perplexity(data: web::Data<SharedData>, query: web::Query<ModelQuery>) -> impl Responder {
	let format = |perplexity: Option<f64>| match perplexity {
		Some(value) => format!("{value:.4}"),
		None => "unavailable".to_owned(),
	};

	if query.model.is_none() {
		let lines: Vec<String> = data
			.models
			.iter()
			.map(|(kind, served)| format!("{kind}\t{}", format(served.perplexity)))
			.collect();
		return HttpResponse::Ok().body(lines.join("\n"));
	}

	match data.find(query.model.as_deref()) {
		Ok((_, served)) => HttpResponse::Ok().body(format(served.perplexity)),
		Err(response) => response,
	}
}

/// Loads settings and corpus, partitions it and trains every variant.
fn train_models() -> io::Result<SharedData> {
	let settings = match env::var("RS_LM_SETTINGS") {
		Ok(path) => Settings::from_file(path).map_err(io::Error::other)?,
		Err(_) => Settings::default(),
	}
	.with_env_overrides()
	.map_err(io::Error::other)?;
	settings.validate().map_err(io::Error::other)?;

	let corpus = env::var("RS_LM_CORPUS").unwrap_or_else(|_| "./data/corpus.json".to_owned());
	let documents = read_corpus(&corpus).map_err(io::Error::other)?;
	let partition = Partition::split(documents, &settings.partition).map_err(io::Error::other)?;

	let mut models = BTreeMap::new();
	for kind in ModelKind::ALL {
		let mut model = kind.build(&settings.model).map_err(io::Error::other)?;
		model.train(partition.training()).map_err(io::Error::other)?;
		let perplexity = match model.evaluate_perplexity(partition.testing()) {
			Ok(perplexity) => Some(perplexity),
			Err(e) => {
				warn!(%kind, error = %e, "held-out perplexity unavailable");
				None
			}
		};
		info!(%kind, ?perplexity, "model ready");
		models.insert(kind, ServedModel { model, perplexity });
	}

	Ok(SharedData { models, default_count: settings.generation.count })
}

/// Main entry point for the server.
///
/// Trains the five models once, shares them read-only across workers and
/// starts an Actix-web HTTP server.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000.
/// - `RS_LM_CORPUS` points to the corpus (default `./data/corpus.json`),
///   `RS_LM_SETTINGS` to an optional TOML settings file.
#[actix_web::main]
async fn main() -> io::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rs_lm=info")))
		.init();

	let shared_data = web::Data::new(train_models()?);

	HttpServer::new(move || {
		let cors = Cors::default().allow_any_origin().allowed_methods(vec!["GET"]);
		App::new()
			.wrap(cors)
			.app_data(shared_data.clone())
			.service(get_generated)
			.service(get_models)
			.service(get_perplexity)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
