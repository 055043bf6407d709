use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing_subscriber::EnvFilter;

use metro_router::domain::{TemporalItinerary, hhmm};
use metro_router::loader;
use metro_router::network::{PathFinder, PathFinderConfig};
use metro_router::planner::{Criterion, PlannerConfig, RoutingEngine};
use metro_router::schedule::{CachedSchedule, ScheduleCacheConfig};

const USAGE: &str = "usage: metro-router <bundle.json> <origin> <destination> \
     <YYYY-MM-DDTHH:MM> [--arrive-by | --alternatives]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    DepartAt,
    ArriveBy,
    Alternatives,
}

struct Args {
    bundle: PathBuf,
    origin: String,
    destination: String,
    anchor: NaiveDateTime,
    mode: Mode,
}

fn parse_args() -> Result<Args, String> {
    let mut mode = Mode::DepartAt;
    let mut positional = Vec::new();
    for arg in std::env::args().skip(1) {
        let requested = match arg.as_str() {
            "--arrive-by" => Mode::ArriveBy,
            "--alternatives" => Mode::Alternatives,
            _ => {
                positional.push(arg);
                continue;
            }
        };
        if mode != Mode::DepartAt && mode != requested {
            return Err(USAGE.to_string());
        }
        mode = requested;
    }

    let [bundle, origin, destination, anchor] = <[String; 4]>::try_from(positional)
        .map_err(|_| USAGE.to_string())?;
    let anchor = NaiveDateTime::parse_from_str(&anchor, "%Y-%m-%dT%H:%M")
        .map_err(|e| format!("invalid time {anchor:?}: {e}"))?;

    Ok(Args {
        bundle: PathBuf::from(bundle),
        origin,
        destination,
        anchor,
        mode,
    })
}

fn print_itinerary(itinerary: &TemporalItinerary) {
    println!(
        "{} -> {}: leave {}, arrive {} ({} min, {} change(s))",
        itinerary.origin(),
        itinerary.destination(),
        hhmm(itinerary.first_boarding()),
        hhmm(itinerary.arrival_time()),
        itinerary.total_duration().num_minutes(),
        itinerary.line_changes(),
    );
    for seg in itinerary.segments() {
        println!(
            "  {}  line {} {} -> {}  arrive {}  (wait {} min)",
            hhmm(seg.departure_time()),
            seg.line(),
            seg.from(),
            seg.to(),
            hhmm(seg.arrival_time()),
            seg.wait_time().num_minutes(),
        );
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("metro_router=info")),
        )
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let network = match loader::load(&args.bundle) {
        Ok(network) => network,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", args.bundle.display());
            return ExitCode::FAILURE;
        }
    };

    let config = PlannerConfig::from_env();
    let finder = PathFinder::new(Arc::new(network.catalog), PathFinderConfig::from(&config));
    let provider = CachedSchedule::new(network.timetable, ScheduleCacheConfig::default());
    let engine = RoutingEngine::new(finder, Arc::new(provider), config);

    let (candidates, max_wait) = (engine.config().max_structural_paths, engine.config().max_wait());
    let result = match args.mode {
        Mode::DepartAt => engine
            .plan_forward(&args.origin, &args.destination, args.anchor, candidates, max_wait)
            .await
            .map(|found| found.into_iter().collect::<Vec<_>>()),
        Mode::ArriveBy => engine
            .plan_backward(&args.origin, &args.destination, args.anchor, candidates, max_wait)
            .await
            .map(|found| found.into_iter().collect()),
        Mode::Alternatives => {
            engine
                .plan_alternatives(
                    &args.origin,
                    &args.destination,
                    args.anchor,
                    None,
                    Criterion::default(),
                )
                .await
        }
    };

    match result {
        Ok(itineraries) if !itineraries.is_empty() => {
            for (i, itinerary) in itineraries.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_itinerary(itinerary);
            }
            ExitCode::SUCCESS
        }
        Ok(_) => {
            println!("No route from {} to {}", args.origin, args.destination);
            if let Ok(availability) = engine.check_availability(&args.origin, args.anchor).await {
                println!("{}", availability.message);
                if let Some(suggested) = availability.suggested_alternative {
                    println!("Try {}", suggested.format("%Y-%m-%dT%H:%M"));
                }
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Routing failed: {e}");
            ExitCode::FAILURE
        }
    }
}
