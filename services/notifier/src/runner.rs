use crate::cli::{ExtractArgs, OnceArgs, RunArgs};
use crate::infra::AppState;
use crate::routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use postwatch::config::{AppConfig, ConfigError};
use postwatch::error::AppError;
use postwatch::telemetry;
use postwatch::watch::extractor;
use postwatch::watch::fetch::GithubReadmeFetcher;
use postwatch::watch::notify::{DiscordWebhookNotifier, NotificationSink};
use postwatch::watch::service::PollService;
use postwatch::watch::store::JsonSnapshotStore;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

type NotifierService = PollService<GithubReadmeFetcher, JsonSnapshotStore, DiscordWebhookNotifier>;

fn build_service(
    config: &AppConfig,
) -> Result<(NotifierService, Arc<DiscordWebhookNotifier>), AppError> {
    let webhook = config
        .watch
        .discord_webhook_url
        .clone()
        .ok_or(ConfigError::MissingWebhook)?;

    let fetcher = Arc::new(GithubReadmeFetcher::new(config.watch.github_token.clone())?);
    let store = Arc::new(JsonSnapshotStore::new(config.watch.state_file.clone()));
    let sink = Arc::new(DiscordWebhookNotifier::new(webhook)?);
    let service = PollService::new(
        config.watch.sources.clone(),
        fetcher,
        store,
        Arc::clone(&sink),
    );
    Ok((service, sink))
}

pub(crate) async fn run(mut args: RunArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(secs) = args.interval.take() {
        if secs == 0 {
            return Err(ConfigError::InvalidInterval.into());
        }
        config.watch.interval = Duration::from_secs(secs);
    }
    if let Some(state_file) = args.state_file.take() {
        config.watch.state_file = state_file;
    }
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (mut service, sink) = build_service(&config)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let state = AppState::new(prometheus_handle);
    let app = routes::router()
        .layer(Extension(state.clone()))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    state.readiness.store(true, Ordering::Release);
    info!(?config.environment, %addr, "posting watch notifier ready");

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!(%err, "status server terminated");
        }
    });

    let banner = format!(
        "🤖 **Posting watch started!**\n\
         📊 Watching: {}\n\
         🔄 Checking every {} seconds",
        config.watch.sources.join(", "),
        config.watch.interval.as_secs()
    );
    if let Err(err) = sink.announce(&banner).await {
        warn!(%err, "failed to deliver startup announcement");
    }

    let mut ticker = tokio::time::interval(config.watch.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match service.run_cycle().await {
            Ok(outcome) => {
                info!(
                    checked = outcome.sources_checked,
                    skipped = outcome.sources_skipped.len(),
                    new = outcome.new_postings.len(),
                    "poll cycle finished"
                );
                state.record_cycle(outcome);
            }
            Err(err) => error!(%err, "poll cycle failed"),
        }
    }
}

pub(crate) async fn run_once(mut args: OnceArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(state_file) = args.state_file.take() {
        config.watch.state_file = state_file;
    }

    telemetry::init(&config.telemetry)?;

    let (mut service, _sink) = build_service(&config)?;
    let outcome = service.run_cycle().await?;
    info!(
        checked = outcome.sources_checked,
        skipped = outcome.sources_skipped.len(),
        new = outcome.new_postings.len(),
        "single poll cycle finished"
    );
    Ok(())
}

pub(crate) fn run_extract(args: ExtractArgs) -> Result<(), AppError> {
    let document = std::fs::read_to_string(&args.path)?;
    let postings = extractor::extract(&document, &args.source);
    println!("{}", serde_json::to_string_pretty(&postings)?);
    Ok(())
}
