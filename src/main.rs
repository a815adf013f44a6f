#[macro_use]
extern crate failure;

use crate::config::SystemConfig;
use crate::harbor::{LINES_PER_PORT, PortId, VehicleKind};
use crate::simulation::event::EventSink;
use crate::simulation::sink::{ConsoleSink, JsonSink, Silent};
use crate::simulation::{Outcome, Simulation};
use clap::Parser;
use colored::Colorize;
use failure::Error;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod harbor;
mod simulation;

/// Two-port ferry crossing simulation
#[derive(Parser, Debug)]
#[command(name = "ferry-crossing")]
#[command(version)]
struct Cli {
    /// JSON configuration file (defaults are used when omitted)
    config: Option<PathBuf>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of generated vehicles
    #[arg(long)]
    vehicles: Option<u32>,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Do not print events, only the final report
    #[arg(short, long, conflicts_with = "json")]
    quiet: bool,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Fail)]
#[fail(display = "validation failed because of \"{}\"", error)]
struct ValidationError {
    error: String,
}

fn invalid(error: String) -> Error {
    ValidationError { error }.into()
}

fn validate_config(config: &SystemConfig) -> Result<(), Error> {
    let timing = &config.timing;
    let thresholds = &config.thresholds;

    if timing.time_unit_ms == 0 || timing.poll_ms == 0 {
        return Err(invalid("time unit and poll interval must be positive".to_string()));
    }

    if timing.dwell_units[0] > timing.dwell_units[1] {
        return Err(invalid(format!(
            "dwell range {}..={} is empty",
            timing.dwell_units[0], timing.dwell_units[1]
        )));
    }

    if config.fleet.is_empty() {
        if config.vehicles == 0 {
            return Err(invalid("there has to be at least one vehicle".to_string()));
        }

        if config.vehicles % 4 != 0 {
            return Err(invalid(format!(
                "{} vehicles cannot be split into four equal type bands",
                config.vehicles
            )));
        }
    } else {
        let mut ids = HashSet::new();

        for vehicle in config.fleet.iter() {
            if !ids.insert(vehicle.id) {
                return Err(invalid(format!("There is vehicle id \"{}\" collision", vehicle.id)));
            }

            if vehicle.id as usize >= config.fleet.len() {
                return Err(invalid(format!(
                    "Vehicle id \"{}\" is out of range, ids have to be 0..{}",
                    vehicle.id,
                    config.fleet.len()
                )));
            }
        }
    }

    let heaviest = VehicleKind::Truck.weight();

    if thresholds.line_capacity < heaviest || thresholds.ferry_capacity < heaviest {
        return Err(invalid(format!(
            "line capacity {} and ferry capacity {} have to fit a vehicle of weight {}",
            thresholds.line_capacity, thresholds.ferry_capacity, heaviest
        )));
    }

    Ok(())
}

fn get_config(path: &Path) -> Result<SystemConfig, Error> {
    let file = File::open(path)?;

    let config = serde_json::from_reader(file)?;

    Ok(config)
}

fn bootstrap_system(config: SystemConfig, events: Arc<dyn EventSink>) -> Result<Simulation, Error> {
    validate_config(&config)?;

    Ok(Simulation::new(config, events))
}

fn report(outcome: &Outcome) {
    for trip in outcome.mismatches() {
        let end = match trip.end {
            Some(port) => format!("ended on port {}", port),
            None => "never finished".to_string(),
        };

        println!(
            "{} Vehicle ({}) started on port {} but {}!",
            "INFO:".blue(),
            trip.vehicle,
            trip.start,
            end
        );
    }

    let summary = format!(
        "{}/{} vehicles completed a round trip (seed {}).",
        outcome.round_trips(),
        outcome.trips.len(),
        outcome.seed
    );

    if outcome.is_complete() {
        println!("{} {} Success!", "INFO:".blue(), summary.green());
    } else {
        println!("{} {} Fail!", "INFO:".blue(), summary.red());
    }
}

fn run(cli: Cli) -> Result<Outcome, Error> {
    let mut config = match cli.config {
        Some(ref path) => get_config(path)?,
        None => SystemConfig::default(),
    };

    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    if let Some(vehicles) = cli.vehicles {
        config.vehicles = vehicles;
    }

    let events: Arc<dyn EventSink> = if cli.json {
        Arc::new(JsonSink::stdout())
    } else if cli.quiet {
        Arc::new(Silent)
    } else {
        Arc::new(ConsoleSink::stdout())
    };

    let simulation = bootstrap_system(config, events)?;

    tracing::info!(
        seed = simulation.seed(),
        vehicles = simulation.fleet().len(),
        ports = PortId::ALL.len(),
        lines = LINES_PER_PORT,
        "initialization done"
    );

    simulation.run()
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(outcome) => {
            report(&outcome);

            if !outcome.is_complete() {
                process::exit(1);
            }
        }
        Err(error) => {
            eprintln!("{} {}", "ERROR:".red(), error);
            process::exit(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VehicleConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&SystemConfig::default()).is_ok());
    }

    #[test]
    fn uneven_fleet_is_rejected() {
        let mut config = SystemConfig::default();
        config.vehicles = 30;

        assert!(validate_config(&config).is_err());

        config.vehicles = 0;

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn explicit_fleet_needs_dense_unique_ids() {
        let mut config = SystemConfig::default();
        config.fleet = vec![
            VehicleConfig { id: 0, kind: VehicleKind::Car, special: false, port: PortId::West },
            VehicleConfig { id: 0, kind: VehicleKind::Bus, special: false, port: PortId::East },
        ];

        assert!(validate_config(&config).is_err());

        config.fleet[1].id = 2;

        assert!(validate_config(&config).is_err());

        config.fleet[1].id = 1;

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn explicit_fleet_ignores_band_rule() {
        let mut config = SystemConfig::default();
        config.vehicles = 3;
        config.fleet = vec![VehicleConfig { id: 0, kind: VehicleKind::Truck, special: true, port: PortId::East }];

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn capacities_must_fit_a_truck() {
        let mut config = SystemConfig::default();
        config.thresholds.line_capacity = 3;

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn timing_must_be_positive_and_ordered() {
        let mut config = SystemConfig::default();
        config.timing.poll_ms = 0;

        assert!(validate_config(&config).is_err());

        config.timing.poll_ms = 100;
        config.timing.dwell_units = [5, 1];

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn bad_port_in_json_is_rejected() {
        let result: Result<SystemConfig, _> = serde_json::from_str(
            r#"{ "fleet": [{ "id": 0, "kind": "Car", "special": false, "port": 2 }] }"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn bootstrap_refuses_invalid_config() {
        let mut config = SystemConfig::default();
        config.vehicles = 7;

        assert!(bootstrap_system(config, Arc::new(Silent)).is_err());
    }
}
