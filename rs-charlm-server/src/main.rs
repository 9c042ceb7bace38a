use std::path::{Path, PathBuf};

use actix_cors::Cors;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use log::{error, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;

use rs_charlm_core::{Corpus, Error, FrequencyOracle, GenerationConfig, GenerationRequest, Generator, StartSeed, Vocabulary};

/// Query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	temperature: Option<f64>,
	num_chars: Option<usize>,
	rng_seed: Option<u64>,
	seed: Option<String> // -> random window of the corpus if absent
}

/// Query parameters for the `/v1/preview` endpoint
#[derive(Deserialize)]
struct PreviewParams {
	num_chars: Option<usize>,
	rng_seed: Option<u64>,
}

/// Everything a request needs; read-only once the server runs.
struct SharedData {
	config: GenerationConfig,
	corpus: Corpus,
	vocabulary: Vocabulary,
	oracle: FrequencyOracle,
}

impl SharedData {
	/// Loads `<data_dir>/*.txt` and builds (or loads) the oracle cache.
	fn load(data_dir: &Path, config: GenerationConfig) -> Result<Self, Error> {
		let corpus = Corpus::from_dir(data_dir, "txt")?;
		let vocabulary = corpus.vocabulary();
		let oracle = FrequencyOracle::load_or_build(
			FrequencyOracle::cache_path(data_dir)?,
			&corpus,
			&vocabulary,
			config.window_length,
			config.smoothing,
		)?;
		info!("Loaded corpus: {} chars, {} distinct", corpus.len(), vocabulary.len());
		Ok(Self { config, corpus, vocabulary, oracle })
	}

	fn generator(&self) -> Result<Generator<'_, FrequencyOracle>, Error> {
		Ok(Generator::new(&self.oracle, &self.vocabulary, self.config.window_length)?.with_corpus(&self.corpus))
	}

	/// Per-request random source: the query seed, then the configured
	/// seed, then the OS.
	fn rng(&self, rng_seed: Option<u64>) -> StdRng {
		match rng_seed.or(self.config.rng_seed) {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		}
	}
}

/// Maps caller errors to `400` and everything else to `500`.
fn error_response(e: Error) -> HttpResponse {
	if e.is_caller_error() {
		HttpResponse::BadRequest().body(e.to_string())
	} else {
		error!("Generation failed: {e}");
		HttpResponse::InternalServerError().body(e.to_string())
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates a text from the custom `seed` (or a random corpus window).
/// Returns the generated text as the response body.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<SharedData>, query: web::Query<GenerateParams>) -> impl Responder {
	let request = GenerationRequest {
		temperature: query.temperature.unwrap_or(data.config.temperature),
		start_seed: match &query.seed {
			Some(s) => StartSeed::Custom(s.clone()),
			None => StartSeed::Random,
		},
		num_chars: query.num_chars.unwrap_or(data.config.num_chars),
	};

	let mut rng = data.rng(query.rng_seed);
	let text = data
		.config
		.check_num_chars(request.num_chars)
		.and_then(|_| data.generator())
		.and_then(|generator| generator.generate(&request, &mut rng));
	match text {
		Ok(text) => HttpResponse::Ok().body(text),
		Err(e) => error_response(e),
	}
}

/// HTTP GET endpoint `/v1/preview`
///
/// One random-seeded text per configured preview temperature,
/// formatted as `<temperature>\t<text>` lines.
#[get("/v1/preview")]
async fn get_preview(data: web::Data<SharedData>, query: web::Query<PreviewParams>) -> impl Responder {
	let num_chars = query.num_chars.unwrap_or(data.config.num_chars);
	let mut rng = data.rng(query.rng_seed);

	let preview = data
		.config
		.check_num_chars(num_chars)
		.and_then(|_| data.generator())
		.and_then(|generator| generator.preview(&data.config.preview_temperatures, num_chars, &mut rng));
	match preview {
		Ok(samples) => HttpResponse::Ok().body(
			samples
				.iter()
				.map(|(temperature, text)| format!("{temperature:.2}\t{}", text.replace('\n', "\\n")))
				.collect::<Vec<_>>()
				.join("\n"),
		),
		Err(e) => error_response(e),
	}
}

#[get("/v1/vocabulary")]
async fn get_vocabulary(data: web::Data<SharedData>) -> impl Responder {
	HttpResponse::Ok().body(data.vocabulary.chars().iter().collect::<String>())
}

/// Main entry point for the server.
///
/// Loads the corpus from `./data` (or `CHARLM_DATA`), builds the oracle and
/// starts an Actix-web HTTP server.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000.
/// - `CHARLM_CONFIG` may point to a JSON `GenerationConfig`.
/// - `RUST_LOG` controls logging.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();

	let data_dir = PathBuf::from(std::env::var("CHARLM_DATA").unwrap_or_else(|_| "./data".to_owned()));
	let config = match std::env::var("CHARLM_CONFIG") {
		Ok(path) => GenerationConfig::from_json_file(path),
		Err(_) => Ok(GenerationConfig::default()),
	};

	let shared_data = config
		.and_then(|config| SharedData::load(&data_dir, config))
		.map_err(|e| std::io::Error::other(e.to_string()))?;
	let shared_data = web::Data::new(shared_data);

	info!("Listening on 127.0.0.1:5000");
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.service(get_generated)
			.service(get_preview)
			.service(get_vocabulary)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;

	fn shared_data() -> web::Data<SharedData> {
		let config = GenerationConfig { window_length: 4, rng_seed: Some(1), ..GenerationConfig::default() };
		let corpus = Corpus::from_text("the fish trap exists because of the fish");
		let vocabulary = corpus.vocabulary();
		let oracle = FrequencyOracle::build(&corpus, &vocabulary, config.window_length, config.smoothing).unwrap();
		web::Data::new(SharedData { config, corpus, vocabulary, oracle })
	}

	#[actix_web::test]
	async fn generate_with_custom_seed() {
		let app = test::init_service(App::new().app_data(shared_data()).service(get_generated)).await;
		let req = test::TestRequest::get().uri("/v1/generate?seed=fish&num_chars=12").to_request();
		let body = test::call_and_read_body(&app, req).await;

		let text = String::from_utf8(body.to_vec()).unwrap();
		assert_eq!(text.chars().count(), 12);
		assert!(text.starts_with("fish"));
	}

	#[actix_web::test]
	async fn short_seed_is_a_bad_request() {
		let app = test::init_service(App::new().app_data(shared_data()).service(get_generated)).await;
		let req = test::TestRequest::get().uri("/v1/generate?seed=ab").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn oversized_requests_are_rejected() {
		let app = test::init_service(
			App::new().app_data(shared_data()).service(get_generated).service(get_preview),
		)
		.await;

		for uri in ["/v1/generate?seed=fish&num_chars=1000000000", "/v1/preview?num_chars=1000000000"] {
			let req = test::TestRequest::get().uri(uri).to_request();
			let resp = test::call_service(&app, req).await;
			assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
		}
	}

	#[actix_web::test]
	async fn preview_has_one_line_per_temperature() {
		let app = test::init_service(App::new().app_data(shared_data()).service(get_preview)).await;
		let req = test::TestRequest::get().uri("/v1/preview?num_chars=20").to_request();
		let body = test::call_and_read_body(&app, req).await;

		let text = String::from_utf8(body.to_vec()).unwrap();
		assert_eq!(text.lines().count(), 4);
		assert!(text.starts_with("0.20\t"));
	}

	#[actix_web::test]
	async fn vocabulary_is_sorted() {
		let app = test::init_service(App::new().app_data(shared_data()).service(get_vocabulary)).await;
		let req = test::TestRequest::get().uri("/v1/vocabulary").to_request();
		let body = test::call_and_read_body(&app, req).await;
		assert_eq!(&body[..], " abcefhioprstux".as_bytes());
	}
}
