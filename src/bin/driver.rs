//! Ambulance pilot on the console.
//!
//! `driver [--at LAT,LNG] <destination...>` searches for the destination,
//! routes to the first candidate and broadcasts the alert. It then drives
//! along the route, reporting each point, and completes the trip at the end
//! or on Ctrl+C.

use anyhow::{anyhow, Context};
use preclear::api::map_service::{self, SearchArea};
use preclear::api::Coord;
use preclear::client::AlertsClient;
use preclear::config::ClientConfig;
use preclear::views::{CompletionPolicy, DriverSession, DriverView, GeolocationError, Notice};

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

struct Args {
    at: Option<Coord>,
    destination: String,
}

fn args() -> anyhow::Result<Args> {
    let mut at = None;
    let mut words = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--at" {
            let value = args.next().ok_or_else(|| anyhow!("--at needs LAT,LNG"))?;
            at = Some(coord(&value)?);
        } else {
            words.push(arg);
        }
    }

    if words.is_empty() {
        return Err(anyhow!("usage: driver [--at LAT,LNG] <destination...>"));
    }

    Ok(Args {
        at,
        destination: words.join(" "),
    })
}

fn coord(value: &str) -> anyhow::Result<Coord> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| anyhow!("{value:?} is not LAT,LNG"))?;
    Ok(Coord::new(
        lat.trim().parse().context("invalid latitude")?,
        lng.trim().parse().context("invalid longitude")?,
    ))
}

fn show(notice: &Notice) {
    match &notice.description {
        Some(description) => println!("[{:?}] {} - {description}", notice.level, notice.title),
        None => println!("[{:?}] {}", notice.level, notice.title),
    }
}

fn render(view: &DriverView) {
    println!("Ambulance {} ({:?})", view.ambulance_id, view.state);
    if view.alert_banner {
        println!("  ** EMERGENCY MODE ACTIVE **");
    }
    if let Some(destination) = &view.destination {
        println!("  Destination  {destination}");
    }
    if let (Some(eta), Some(distance)) = (&view.eta, &view.distance) {
        println!("  ETA {eta}   Distance {distance}");
    }
    println!("  [{}]", view.action.label);
}

async fn run() -> anyhow::Result<()> {
    let args = args()?;
    let config = ClientConfig::env()?;
    config.log();

    let key = config
        .geoapify_key
        .clone()
        .ok_or_else(|| anyhow!("GEOAPIFY_KEY not set"))?;
    let routing = map_service::Client::new(&config.geoapify_url, key)?;
    let alerts = AlertsClient::new(&config.api_url)?;

    let policy = if config.complete_marks_server {
        CompletionPolicy::MarkCompleted
    } else {
        CompletionPolicy::LocalOnly
    };
    let mut session =
        DriverSession::new(config.ambulance_id.clone(), policy, routing.clone(), alerts);

    let fix = args
        .at
        .ok_or_else(|| GeolocationError("no position source on the console".to_string()));
    if let Some(notice) = session.locate(fix) {
        show(&notice);
    }

    let place = routing
        .search(&args.destination, &SearchArea::default())
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no place matches {:?}", args.destination))?;
    log::info!("destination: {} ({}, {})", place.name, place.location.lat, place.location.lng);
    session.select_destination(place)?;

    match session.request_route().await {
        Ok(notice) => show(&notice),
        Err(e) => {
            show(&e.notice());
            return Err(e.into());
        }
    }
    render(&session.view());

    match session.send_alert().await {
        Ok(notice) => {
            show(&notice);
            if let Some(alert) = session.alert() {
                log::info!("broadcasting as alert {}", alert.id);
            }
        }
        Err(e) => {
            show(&e.notice());
            return Err(e.into());
        }
    }
    render(&session.view());

    let path = session.route().map(|r| r.geometry.clone()).unwrap_or_default();
    let mut ticker = tokio::time::interval(config.poll_interval);
    for point in path {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        if let Err(e) = session.push_location(Coord::from(point)).await {
            show(&e.notice());
        }
    }

    let notice = session.complete_trip().await?;
    show(&notice);
    render(&session.view());

    Ok(())
}
