use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{get, post, put, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use rs_filter_core::filter::{DuplicateFilter, FilterConfig, FilterPipeline, ProbabilityFilter};
use rs_filter_core::io::read_corpus;
use rs_filter_core::model::ngram_model::ModelStats;
use rs_filter_core::text::preprocess;

/// Low-information filter, optionally combined with a repeat blocker.
type ChatFilter = (ProbabilityFilter, Option<DuplicateFilter>);

#[derive(Parser, Debug)]
#[command(name = "rs-filter-server")]
#[command(about = "Chat message filter backed by a smoothed n-gram model")]
#[command(version)]
struct Args {
	/// Address to bind
	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	/// Port to bind
	#[arg(short, long, default_value_t = 5000)]
	port: u16,

	/// Order of the n-gram model
	#[arg(long, default_value_t = 2)]
	order: usize,

	/// Additive smoothing constant
	#[arg(long, default_value_t = 1.0)]
	smoothing: f64,

	/// Messages to learn from before anything is rejected
	#[arg(long, default_value_t = 10)]
	min_training_messages: usize,

	/// Also reject repeats of a message within this many seconds
	#[arg(long)]
	repeat_window_secs: Option<u64>,

	/// Text file to train on before serving, one message per line
	#[arg(long)]
	corpus: Option<PathBuf>,
}

impl Args {
	fn filter_config(&self) -> FilterConfig {
		FilterConfig {
			order: self.order,
			smoothing: self.smoothing,
			min_training_messages: self.min_training_messages,
		}
	}
}

struct SharedData {
	pipeline: FilterPipeline<ChatFilter>,
}

impl SharedData {
	/// Builds the filter pipeline and trains it on the warm-up corpus, if any.
	fn from_args(args: &Args) -> Result<Self, Box<dyn std::error::Error>> {
		let probability = ProbabilityFilter::from_config(&args.filter_config())?;
		let duplicates = args
			.repeat_window_secs
			.map(|secs| DuplicateFilter::new(Duration::from_secs(secs), true));
		let mut pipeline = FilterPipeline::new((probability, duplicates));

		if let Some(corpus) = &args.corpus {
			let lines = read_corpus(corpus)?;
			for line in &lines {
				pipeline.train(line);
			}
			info!("trained on {} corpus lines from {}", lines.len(), corpus.display());
		}

		Ok(Self { pipeline })
	}
}

#[derive(Deserialize)]
struct MessageBody {
	text: String,
}

#[derive(Deserialize)]
struct ScoreQuery {
	text: String,
}

#[derive(Serialize)]
struct MessageResponse {
	rejected: bool,
	probability: Option<f64>,
}

#[derive(Serialize)]
struct ScoreResponse {
	tokens: Vec<String>,
	log_probability: Option<f64>,
	probability: Option<f64>,
}

#[derive(Serialize)]
struct StatsResponse {
	#[serde(flatten)]
	model: ModelStats,
	messages: usize,
	average_probability: Option<f64>,
	filtering: bool,
}

/// JSON has no infinities or NaN; those are reported as `null`.
fn finite(value: f64) -> Option<f64> {
	value.is_finite().then_some(value)
}

/// HTTP POST endpoint `/v1/messages`
///
/// Trains on the message, then decides whether it should be rejected.
#[post("/v1/messages")]
async fn post_message(data: web::Data<Mutex<SharedData>>, body: web::Json<MessageBody>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let rejected = shared_data.pipeline.process(&body.text);
	let probability = shared_data.pipeline.filter().0.score(&body.text);
	debug!("message rejected={} probability={}", rejected, probability);

	HttpResponse::Ok().json(MessageResponse { rejected, probability: finite(probability) })
}

/// HTTP GET endpoint `/v1/score`
///
/// Scores a message against the current model without training on it.
#[get("/v1/score")]
async fn get_score(data: web::Data<Mutex<SharedData>>, query: web::Query<ScoreQuery>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let tokens = preprocess(&query.text);
	let model = shared_data.pipeline.filter().0.model();
	let log_probability = model.log_probability(&tokens);

	HttpResponse::Ok().json(ScoreResponse {
		tokens,
		log_probability: finite(log_probability),
		probability: finite(log_probability.exp()),
	})
}

#[put("/v1/toggle")]
async fn put_toggle(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let state = if shared_data.pipeline.toggle() { "enabled" } else { "disabled" };
	info!("filtering {}", state);
	HttpResponse::Ok().body(state)
}

#[get("/v1/stats")]
async fn get_stats(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let probability = &shared_data.pipeline.filter().0;
	HttpResponse::Ok().json(StatsResponse {
		model: probability.model().stats(),
		messages: probability.messages(),
		average_probability: probability.average_probability(),
		filtering: shared_data.pipeline.is_enabled(),
	})
}

fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(post_message)
		.service(get_score)
		.service(put_toggle)
		.service(get_stats);
}

/// Main entry point for the server.
///
/// Builds the filter pipeline, wraps it in a `Mutex` so requests are served
/// one at a time against the model, and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let shared_data = SharedData::from_args(&args).map_err(|e| std::io::Error::other(e.to_string()))?;
	let shared_model = web::Data::new(Mutex::new(shared_data));

	info!("listening on {}:{}", args.host, args.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.configure(routes)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::test::{call_and_read_body, call_and_read_body_json, init_service, TestRequest};
	use serde_json::{json, Value};

	fn shared(repeat_window_secs: Option<u64>) -> web::Data<Mutex<SharedData>> {
		let mut argv = vec!["rs-filter-server".to_owned()];
		if let Some(secs) = repeat_window_secs {
			argv.push("--repeat-window-secs".to_owned());
			argv.push(secs.to_string());
		}
		let args = Args::parse_from(argv);
		web::Data::new(Mutex::new(SharedData::from_args(&args).unwrap()))
	}

	#[actix_web::test]
	async fn untrained_score_is_neutral() {
		let app = init_service(App::new().app_data(shared(None)).configure(routes)).await;
		let req = TestRequest::get().uri("/v1/score?text=Hello,%20World!").to_request();
		let body: Value = call_and_read_body_json(&app, req).await;

		assert_eq!(body["tokens"], json!(["hello", "world"]));
		assert_eq!(body["log_probability"], 0.0);
		assert_eq!(body["probability"], 1.0);
	}

	#[actix_web::test]
	async fn repeated_message_is_rejected_after_warm_up() {
		let app = init_service(App::new().app_data(shared(None)).configure(routes)).await;

		for i in 1..=11 {
			let req = TestRequest::post()
				.uri("/v1/messages")
				.set_json(json!({ "text": "lol" }))
				.to_request();
			let body: Value = call_and_read_body_json(&app, req).await;
			assert_eq!(body["rejected"], i == 11, "message {}", i);
		}

		let req = TestRequest::get().uri("/v1/stats").to_request();
		let stats: Value = call_and_read_body_json(&app, req).await;
		assert_eq!(stats["messages"], 11);
		assert_eq!(stats["order"], 2);
		assert_eq!(stats["filtering"], true);
	}

	#[actix_web::test]
	async fn toggle_disables_filtering() {
		let data = shared(Some(600));
		let app = init_service(App::new().app_data(data.clone()).configure(routes)).await;

		let req = TestRequest::put().uri("/v1/toggle").to_request();
		let body = call_and_read_body(&app, req).await;
		assert_eq!(body, web::Bytes::from_static(b"disabled"));

		for _ in 0..2 {
			let req = TestRequest::post()
				.uri("/v1/messages")
				.set_json(json!({ "text": "same" }))
				.to_request();
			let body: Value = call_and_read_body_json(&app, req).await;
			assert_eq!(body["rejected"], false);
		}
		assert_eq!(data.lock().unwrap().pipeline.filter().0.messages(), 2);
	}

	#[actix_web::test]
	async fn repeat_window_rejects_duplicates() {
		let app = init_service(App::new().app_data(shared(Some(600))).configure(routes)).await;

		let mut rejected = Vec::new();
		for text in ["Hi there!", "hi there", "something else"] {
			let req = TestRequest::post()
				.uri("/v1/messages")
				.set_json(json!({ "text": text }))
				.to_request();
			let body: Value = call_and_read_body_json(&app, req).await;
			rejected.push(body["rejected"].as_bool().unwrap());
		}
		assert_eq!(rejected, vec![false, true, false]);
	}

	#[test]
	fn non_finite_values_become_null() {
		assert_eq!(finite(f64::NEG_INFINITY), None);
		assert_eq!(finite(f64::NAN), None);
		assert_eq!(finite(-1.5), Some(-1.5));
	}
}
