use opentelemetry::{global, metrics::MetricsError, trace::TraceError, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
	metrics::{
		reader::{DefaultAggregationSelector, DefaultTemporalitySelector},
		MeterProviderBuilder, PeriodicReader, SdkMeterProvider,
	},
	runtime,
	trace::{BatchConfig, Sampler, Tracer},
	Resource,
};
use opentelemetry_semantic_conventions::{
	resource::{DEPLOYMENT_ENVIRONMENT, SERVICE_NAME, SERVICE_VERSION},
	SCHEMA_URL,
};
use tracing::level_filters::LevelFilter;
use tracing_opentelemetry::MetricsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("metrics error: {0}")]
	Metrics(#[from] MetricsError),
	#[error("trace error: {0}")]
	Trace(#[from] TraceError),
	#[error("subscriber error: {0}")]
	Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

fn environment() -> &'static str {
	if cfg!(debug_assertions) {
		"development"
	} else {
		"production"
	}
}

/// Names the service in exported spans and metrics.
fn service() -> Resource {
	Resource::from_schema_url(
		[
			KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
			KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
			KeyValue::new(DEPLOYMENT_ENVIRONMENT, environment()),
		],
		SCHEMA_URL,
	)
}

/// Exports metrics to `endpoint` every five seconds, and to stdout as well in
/// debug builds.
fn init_meter_provider(endpoint: &str) -> Result<SdkMeterProvider, MetricsError> {
	let exporter = opentelemetry_otlp::new_exporter()
		.tonic()
		.with_endpoint(endpoint)
		.build_metrics_exporter(
			Box::new(DefaultAggregationSelector::new()),
			Box::new(DefaultTemporalitySelector::new()),
		)?;

	let builder = MeterProviderBuilder::default()
		.with_resource(service())
		.with_reader(
			PeriodicReader::builder(exporter, runtime::Tokio)
				.with_interval(std::time::Duration::from_secs(5))
				.build(),
		);

	#[cfg(debug_assertions)]
	let builder = builder.with_reader(
		PeriodicReader::builder(
			opentelemetry_stdout::MetricsExporter::default(),
			runtime::Tokio,
		)
		.build(),
	);

	let provider = builder.build();

	global::set_meter_provider(provider.clone());

	Ok(provider)
}

/// Exports every span to `endpoint` in batches.
fn init_tracer(endpoint: &str) -> Result<Tracer, TraceError> {
	opentelemetry_otlp::new_pipeline()
		.tracing()
		.with_trace_config(
			opentelemetry_sdk::trace::Config::default()
				.with_sampler(Sampler::TraceIdRatioBased(1.0))
				.with_resource(service()),
		)
		.with_batch_config(BatchConfig::default())
		.with_exporter(
			opentelemetry_otlp::new_exporter()
				.tonic()
				.with_endpoint(endpoint),
		)
		.install_batch(runtime::Tokio)
}

/// Initializes the tracing subscriber.
///
/// With an OTLP endpoint, spans and metrics are also exported to it, and the
/// returned guard cleans up the global tracer and meter provider when dropped.
pub fn init_tracing_subscriber(
	level: LevelFilter,
	otlp_endpoint: Option<&str>,
) -> Result<Option<OtelGuard>, Error> {
	let registry = tracing_subscriber::registry()
		.with(level)
		.with(tracing_subscriber::fmt::layer().with_ansi(true));

	let Some(endpoint) = otlp_endpoint else {
		registry.try_init()?;

		return Ok(None);
	};

	let meter_provider = init_meter_provider(endpoint)?;

	registry
		.with(MetricsLayer::new(meter_provider.clone()))
		.with(tracing_opentelemetry::layer().with_tracer(init_tracer(endpoint)?))
		.try_init()?;

	Ok(Some(OtelGuard { meter_provider }))
}

pub struct OtelGuard {
	meter_provider: SdkMeterProvider,
}

impl Drop for OtelGuard {
	fn drop(&mut self) {
		if let Err(err) = self.meter_provider.shutdown() {
			eprintln!("{err:?}");
		}

		opentelemetry::global::shutdown_tracer_provider();
	}
}
