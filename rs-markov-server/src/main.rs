use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{delete, get, put, web, App, HttpResponse, HttpServer, Responder};

use log::info;
use serde::{Deserialize, Serialize};
use rs_markov_core::{MarkovError, MarkovModel, Stats, TokenMode};

mod config;

use config::ServerConfig;

const DEFAULT_LENGTH: usize = 200;
const DEFAULT_TEMPERATURE: f64 = 1.0;

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	length: Option<usize>,
	mode: Option<String>,
	temperature: Option<f64>
}

#[derive(Deserialize)]
struct TrainQuery {
	mode: Option<String>
}

#[derive(Deserialize)]
struct ModelQuery {
	order: Option<usize>
}

#[derive(Serialize)]
struct StatsResponse {
	order: usize,
	trained: bool,
	#[serde(flatten)]
	stats: Stats
}

struct SharedData {
	model: MarkovModel
}

/// Parses an optional mode parameter, `char` when absent.
fn parse_mode(mode: &Option<String>) -> Result<TokenMode, String> {
	match mode {
		None => Ok(TokenMode::default()),
		Some(s) => s.parse::<TokenMode>().map_err(|e| e.to_string()),
	}
}

/// Maps an engine error onto an HTTP response.
fn error_response(e: MarkovError) -> HttpResponse {
	match e {
		MarkovError::InvalidInput(_) | MarkovError::InvalidOrder(_) => HttpResponse::BadRequest().body(e.to_string()),
		MarkovError::NotTrained => HttpResponse::Conflict().body(e.to_string()),
		MarkovError::DegenerateDistribution => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

/// Runs `f` on the shared model inside actix's blocking thread pool.
///
/// The model lock is taken on the pool thread so a long call never stalls
/// the async workers. Lock or pool failures become a ready-made 500 response.
async fn with_model<T, F>(data: web::Data<Mutex<SharedData>>, f: F) -> Result<rs_markov_core::Result<T>, HttpResponse>
where
	F: FnOnce(&mut MarkovModel) -> rs_markov_core::Result<T> + Send + 'static,
	T: Send + 'static,
{
	let outcome = web::block(move || match data.lock() {
		Ok(mut shared_data) => Ok(f(&mut shared_data.model)),
		Err(_) => Err("Model lock failed"),
	})
		.await;

	match outcome {
		Ok(Ok(result)) => Ok(result),
		Ok(Err(msg)) => Err(HttpResponse::InternalServerError().body(msg)),
		Err(_) => Err(HttpResponse::InternalServerError().body("Model task failed")),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Samples text from the loaded model based on query parameters.
/// Returns the generated text as the response body.
#[get("/v1/generate")]
async fn get_generated(
	data: web::Data<Mutex<SharedData>>,
	config: web::Data<ServerConfig>,
	query: web::Query<GenerateParams>
) -> impl Responder {
	let length = query.length.unwrap_or(DEFAULT_LENGTH);
	if length > config.max_length {
		return HttpResponse::BadRequest().body(format!("Length must be <= {}", config.max_length));
	}

	let temperature = query.temperature.unwrap_or(DEFAULT_TEMPERATURE);
	if temperature.is_nan() || temperature < 0.0 {
		return HttpResponse::BadRequest().body("Temperature must be >= 0");
	}

	let mode = match parse_mode(&query.mode) {
		Ok(m) => m,
		Err(e) => return HttpResponse::BadRequest().body(e)
	};

	match with_model(data, move |model| model.generate(length, mode, temperature)).await {
		Ok(Ok(result)) => HttpResponse::Ok().body(result),
		Ok(Err(e)) => error_response(e),
		Err(response) => response,
	}
}

/// HTTP PUT endpoint `/v1/train`
///
/// The request body is the raw corpus. Replaces the current transition table.
#[put("/v1/train")]
async fn put_train(data: web::Data<Mutex<SharedData>>, query: web::Query<TrainQuery>, corpus: String) -> impl Responder {
	let mode = match parse_mode(&query.mode) {
		Ok(m) => m,
		Err(e) => return HttpResponse::BadRequest().body(e)
	};

	let bytes = corpus.len();
	let trained = with_model(data, move |model| {
		model.train(&corpus, mode)?;
		Ok(model.stats())
	})
		.await;

	match trained {
		Ok(Ok(stats)) => {
			info!("trained {} model on {} bytes: {} states", mode, bytes, stats.state_count);
			HttpResponse::Ok().body("Model trained successfully")
		}
		Ok(Err(e)) => error_response(e),
		Err(response) => response,
	}
}

#[get("/v1/stats")]
async fn get_stats(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().json(StatsResponse {
		order: shared_data.model.order(),
		trained: shared_data.model.is_trained(),
		stats: shared_data.model.stats(),
	})
}

/// HTTP PUT endpoint `/v1/model`
///
/// Replaces the model with an untrained one of the requested order.
#[put("/v1/model")]
async fn put_model(data: web::Data<Mutex<SharedData>>, query: web::Query<ModelQuery>) -> impl Responder {
	let order = match query.order {
		Some(o) => o,
		None => return HttpResponse::BadRequest().body("Missing model order"),
	};

	let model = match MarkovModel::new(order) {
		Ok(m) => m,
		Err(e) => return error_response(e),
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	shared_data.model = model;
	info!("created order-{order} model");

	HttpResponse::Ok().body("Model created successfully")
}

#[delete("/v1/model")]
async fn delete_model(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	shared_data.model.clear();
	HttpResponse::Ok().body("Model cleared")
}

/// Registers every endpoint on an app.
fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(get_generated)
		.service(put_train)
		.service(get_stats)
		.service(put_model)
		.service(delete_model);
}

/// Main entry point for the server.
///
/// Creates an untrained model, wraps it in a `Mutex` so requests are
/// serialized, and starts an Actix-web HTTP server.
///
/// # Notes
/// - Address, initial order, body limit and maximum generation length come
///   from `ServerConfig::from_env`.
/// - `generate` and `train` run on the blocking pool (see `with_model`).
/// - Log level is controlled by `RUST_LOG` (default `info`).
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = ServerConfig::from_env();
	let model = MarkovModel::new(config.order)
		.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
	let shared_model = web::Data::new(Mutex::new(SharedData { model }));
	let max_corpus_bytes = config.max_corpus_bytes;
	let (host, port) = (config.host.clone(), config.port);
	let shared_config = web::Data::new(config);

	info!("listening on {}:{} (order {})", host, port, shared_config.order);

	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.app_data(shared_config.clone())
			.app_data(web::PayloadConfig::new(max_corpus_bytes))
			.configure(routes)
	})
		.bind((host.as_str(), port))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;

	fn shared(order: usize) -> web::Data<Mutex<SharedData>> {
		web::Data::new(Mutex::new(SharedData { model: MarkovModel::new(order).unwrap() }))
	}

	macro_rules! service {
		($data:expr) => {
			service!($data, ServerConfig::default())
		};
		($data:expr, $config:expr) => {
			test::init_service(
				App::new()
					.app_data($data.clone())
					.app_data(web::Data::new($config))
					.configure(routes),
			)
			.await
		};
	}

	#[actix_web::test]
	async fn generate_before_training_conflicts() {
		let data = shared(1);
		let app = service!(data);
		let req = test::TestRequest::get().uri("/v1/generate?length=5").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::CONFLICT);
	}

	#[actix_web::test]
	async fn train_then_generate() {
		let data = shared(1);
		let app = service!(data);

		let req = test::TestRequest::put().uri("/v1/train?mode=char").set_payload("abab").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);

		let req = test::TestRequest::get()
			.uri("/v1/generate?length=3&mode=char&temperature=1.0")
			.to_request();
		let body = test::call_and_read_body(&app, req).await;
		assert_eq!(body, "abab");
	}

	#[actix_web::test]
	async fn stats_report_the_table() {
		let data = shared(1);
		let app = service!(data);

		let req = test::TestRequest::put().uri("/v1/train?mode=word").set_payload("a b a c a").to_request();
		test::call_service(&app, req).await;

		let req = test::TestRequest::get().uri("/v1/stats").to_request();
		let body = test::call_and_read_body(&app, req).await;
		let text = std::str::from_utf8(&body).unwrap();
		assert!(text.contains("\"order\":1"), "{text}");
		assert!(text.contains("\"trained\":true"), "{text}");
		assert!(text.contains("\"state_count\":3"), "{text}");
	}

	#[actix_web::test]
	async fn bad_parameters_are_rejected() {
		let data = shared(2);
		let app = service!(data);

		let req = test::TestRequest::put().uri("/v1/train?mode=byte").set_payload("hello").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::put().uri("/v1/train").set_payload("hi").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::put().uri("/v1/model?order=0").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::get().uri("/v1/generate?temperature=-1").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn clear_and_recreate() {
		let data = shared(1);
		let app = service!(data);

		let req = test::TestRequest::put().uri("/v1/train").set_payload("hello world").to_request();
		test::call_service(&app, req).await;

		let req = test::TestRequest::delete().uri("/v1/model").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
		let req = test::TestRequest::get().uri("/v1/generate").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

		let req = test::TestRequest::put().uri("/v1/model?order=3").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
		assert_eq!(data.lock().unwrap().model.order(), 3);
	}

	#[actix_web::test]
	async fn oversized_length_is_rejected() {
		let data = shared(1);
		let config = ServerConfig { max_length: 50, ..ServerConfig::default() };
		let app = service!(data, config);

		let req = test::TestRequest::put().uri("/v1/train?mode=char").set_payload("aaaa").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

		let req = test::TestRequest::get().uri("/v1/generate?length=20000000&mode=char").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::get().uri("/v1/generate?length=51").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		// The limit itself is accepted: the seed plus 50 sampled tokens
		let req = test::TestRequest::get().uri("/v1/generate?length=50").to_request();
		let body = test::call_and_read_body(&app, req).await;
		assert_eq!(body.len(), 51);
	}
}
