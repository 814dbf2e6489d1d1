#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate rocket;

use growatt_rs::api::transport::HttpTransport;
use growatt_rs::display::LogDisplay;
use growatt_rs::link::ProbeLink;
use growatt_rs::retry::{RetryPolicy, LOGIN_ATTEMPTS, POLL_ATTEMPTS};
use growatt_rs::settings::{read_settings, Settings};
use growatt_rs::status::LogStatus;
use growatt_rs::{Client, Error, Orchestrator};
use rocket::http::Status;
use rocket::{Build, Rocket};

mod metrics;

#[get("/metrics")]
fn metrics_route() -> Result<String, Status> {
    metrics::read().map_err(|e| {
        log::error!("Unable to encode metrics: {}", e);
        Status::InternalServerError
    })
}

fn rocket() -> Rocket<Build> {
    rocket::build().mount("/", routes![metrics_route])
}

fn orchestrator(
    settings: &Settings,
) -> Result<Orchestrator<HttpTransport, ProbeLink, metrics::MetricsDisplay, metrics::MetricsStatus>, Error>
{
    let client = Client::new(
        settings.api_url.clone(),
        HttpTransport::new()?,
        RetryPolicy::new(LOGIN_ATTEMPTS, settings.retry_delay()),
        RetryPolicy::new(POLL_ATTEMPTS, settings.retry_delay()),
    );
    let link = ProbeLink::new(
        settings.probe_target()?,
        settings.reconnect_delay(),
        settings.link_reset_command.clone(),
    );

    Ok(Orchestrator::new(
        client,
        link,
        metrics::MetricsDisplay(LogDisplay::new(settings.minimum_power_threshold)),
        metrics::MetricsStatus::new(LogStatus),
        settings.credentials(),
        settings.schedule(),
        settings.unclassified_policy(),
    ))
}

#[rocket::main]
async fn main() {
    env_logger::init();

    let orchestrator = match read_settings().and_then(|settings| {
        log::debug!("{:?}", settings);
        if settings.retry_after_any_error {
            log::warn!("Set to retry after any error. This may hide real problems.");
        }
        orchestrator(&settings)
    }) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    /* Both run on this task; the monitor never needs another thread */
    tokio::select! {
        result = orchestrator.run() => {
            if let Err(e) = result {
                log::error!("Giving up: {}", e);
            }
            std::process::exit(1);
        }
        result = rocket().launch() => {
            if let Err(e) = result {
                log::error!("Metrics server failed: {:?}", e);
                std::process::exit(1);
            }
        }
    }
}
