use crate::config::{SystemConfig, VehicleConfig};
use crate::harbor::coordinator::RoundTrip;
use crate::harbor::{ferry, vehicle, FerryId, Harbor, FERRIES};
use crate::simulation::event::EventSink;
use failure::Error;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub mod event;
pub mod signal;
pub mod sink;

#[derive(Debug, Fail)]
#[fail(display = "could not start worker \"{}\": {}", name, error)]
pub struct SpawnError {
    name: String,
    #[fail(cause)]
    error: std::io::Error,
}

#[derive(Debug, Fail)]
#[fail(display = "worker \"{}\" panicked", name)]
pub struct WorkerPanicked {
    name: String,
}

/// Result of a finished run: where every vehicle started and ended.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub seed: u64,
    pub trips: Vec<RoundTrip>,
}

impl Outcome {
    pub fn round_trips(&self) -> usize {
        self.trips.iter().filter(|trip| trip.is_complete()).count()
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &RoundTrip> {
        self.trips.iter().filter(|trip| !trip.is_complete())
    }

    pub fn is_complete(&self) -> bool {
        self.round_trips() == self.trips.len()
    }
}

/// Owns the shared harbor and the fleet until the workers are started.
pub struct Simulation {
    harbor: Arc<Harbor>,
    fleet: Vec<VehicleConfig>,
    seed: u64,
}

/// `Simulation` runs one worker thread per ferry and per vehicle over a
/// shared `Harbor` and waits for all of them to finish.
impl Simulation {
    pub fn new(mut config: SystemConfig, events: Arc<dyn EventSink>) -> Simulation {
        let seed = config.resolve_seed();
        let fleet = config.fleet(seed);
        let harbor = Arc::new(Harbor::new(&config, &fleet, events));

        Simulation { harbor, fleet, seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn fleet(&self) -> &[VehicleConfig] {
        &self.fleet
    }

    pub fn run(self) -> Result<Outcome, Error> {
        let Simulation { harbor, fleet, seed } = self;

        let ferries = (0..FERRIES)
            .map(|id: FerryId| {
                let harbor = Arc::clone(&harbor);
                spawn(format!("ferry-{}", id), move || ferry::operate(&harbor, id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let vehicles = fleet
            .into_iter()
            .map(|config| {
                let harbor = Arc::clone(&harbor);
                spawn(format!("vehicle-{}", config.id), move || {
                    vehicle::travel(&harbor, config, seed)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        join(vehicles)?;
        tracing::info!("vehicle workers are done, waiting for ferries");

        join(ferries)?;
        tracing::info!("ferry workers are done");

        Ok(Outcome {
            seed,
            trips: harbor.coordinator.round_trips(),
        })
    }
}

fn spawn<F>(name: String, work: F) -> Result<(String, JoinHandle<()>), SpawnError>
where
    F: FnOnce() + Send + 'static,
{
    match thread::Builder::new().name(name.clone()).spawn(work) {
        Ok(handle) => Ok((name, handle)),
        Err(error) => Err(SpawnError { name, error }),
    }
}

fn join(workers: Vec<(String, JoinHandle<()>)>) -> Result<(), WorkerPanicked> {
    for (name, handle) in workers {
        if handle.join().is_err() {
            return Err(WorkerPanicked { name });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ThresholdConfig, TimingConfig};
    use crate::harbor::{PortId, VehicleKind};
    use crate::simulation::event::Event;
    use crate::simulation::sink::Recorder;
    use std::collections::HashMap;
    use std::sync::mpsc::{self, RecvTimeoutError};
    use std::time::Duration;

    const DEADLINE: Duration = Duration::from_secs(30);

    fn fast(vehicles: u32, seed: u64) -> SystemConfig {
        SystemConfig {
            vehicles,
            seed: Some(seed),
            fleet: Vec::new(),
            timing: TimingConfig {
                time_unit_ms: 2,
                poll_ms: 1,
                transit_units: [6, 4],
                dwell_units: [1, 5],
            },
            thresholds: ThresholdConfig::default(),
        }
    }

    /// Fails the test instead of hanging it when the workers never finish.
    fn within_deadline<T, F>(work: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (done, finished) = mpsc::channel();

        thread::spawn(move || {
            let _ = done.send(work());
        });

        match finished.recv_timeout(DEADLINE) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => panic!("simulation still running after {:?}", DEADLINE),
            Err(RecvTimeoutError::Disconnected) => panic!("simulation panicked"),
        }
    }

    fn run(config: SystemConfig) -> (Outcome, Vec<Event>) {
        within_deadline(move || {
            let recorder = Arc::new(Recorder::new());
            let outcome = Simulation::new(config, recorder.clone()).run().unwrap();

            (outcome, recorder.events())
        })
    }

    fn assert_capacities(events: &[Event]) {
        for event in events.iter() {
            match event {
                Event::EnteredLine { line_weight, .. } => assert!(*line_weight <= 20, "{:?}", event),
                Event::Boarded { ferry_load, .. } => assert!(*ferry_load <= 30, "{:?}", event),
                Event::Departed { load, .. } => assert!(*load <= 30, "{:?}", event),
                _ => {}
            }
        }
    }

    fn vehicle(id: u32, kind: VehicleKind, port: PortId) -> VehicleConfig {
        VehicleConfig { id, kind, special: false, port }
    }

    #[test]
    fn every_vehicle_returns_home() {
        let (outcome, events) = run(fast(32, 11));

        assert_eq!(outcome.trips.len(), 32);
        assert!(outcome.is_complete(), "{:?}", outcome.mismatches().collect::<Vec<_>>());

        let completed = events
            .iter()
            .filter(|event| matches!(event, Event::Completed { .. }))
            .count();
        let retired = events
            .iter()
            .filter(|event| matches!(event, Event::FerryRetired { .. }))
            .count();

        assert_eq!(completed, 32);
        assert_eq!(retired, 2);
    }

    #[test]
    fn capacities_hold_throughout() {
        let (_, events) = run(fast(32, 5));

        assert_capacities(&events);
    }

    #[test]
    fn every_seed_and_fleet_size_finishes() {
        for &vehicles in [4, 8, 32, 64].iter() {
            for seed in 0..5 {
                let (outcome, events) = run(fast(vehicles, seed));

                assert_eq!(outcome.trips.len(), vehicles as usize);
                assert!(
                    outcome.is_complete(),
                    "seed {} with {} vehicles: {:?}",
                    seed,
                    vehicles,
                    outcome.mismatches().collect::<Vec<_>>()
                );
                assert_capacities(&events);
            }
        }
    }

    #[test]
    fn lines_board_in_arrival_order() {
        let (_, events) = run(fast(32, 23));

        let mut entered: HashMap<(PortId, usize), Vec<u32>> = HashMap::new();
        let mut boarded: HashMap<(PortId, usize), Vec<u32>> = HashMap::new();

        for event in events.iter() {
            match *event {
                Event::EnteredLine { vehicle, port, line, .. } => entered.entry((port, line)).or_default().push(vehicle),
                Event::Boarded { vehicle, port, line, .. } => boarded.entry((port, line)).or_default().push(vehicle),
                _ => {}
            }
        }

        assert_eq!(entered, boarded);
    }

    #[test]
    fn each_vehicle_crosses_twice() {
        let (outcome, events) = run(fast(16, 3));

        for trip in outcome.trips.iter() {
            let unloads: Vec<PortId> = events
                .iter()
                .filter_map(|event| match *event {
                    Event::Unloaded { vehicle, port, .. } if vehicle == trip.vehicle => Some(port),
                    _ => None,
                })
                .collect();

            assert_eq!(unloads, vec![trip.start.opposite(), trip.start]);
        }
    }

    #[test]
    fn two_cars_cross_together() {
        let mut config = fast(2, 1);
        config.timing.time_unit_ms = 20;
        config.fleet = vec![
            vehicle(0, VehicleKind::Car, PortId::West),
            vehicle(1, VehicleKind::Car, PortId::West),
        ];

        let (outcome, events) = run(config);

        assert!(outcome.is_complete());
        assert!(outcome.trips.iter().all(|trip| trip.end == Some(PortId::West)));

        let first = events
            .iter()
            .find_map(|event| match *event {
                Event::Departed { ferry: 0, load, .. } => Some(load),
                _ => None,
            })
            .unwrap();

        assert_eq!(first, 4);
    }

    #[test]
    fn lone_truck_is_not_starved() {
        let mut config = fast(1, 9);
        config.fleet = vec![vehicle(0, VehicleKind::Truck, PortId::West)];

        let (outcome, events) = run(config);

        assert!(outcome.is_complete());
        assert!(events.iter().any(|event| matches!(
            event,
            Event::Departed { from: PortId::West, load: 4, .. }
        )));
    }

    #[test]
    fn idle_ferry_crosses_to_the_busy_port() {
        let mut config = fast(1, 4);
        config.timing.transit_units = [50, 50];
        config.fleet = vec![vehicle(0, VehicleKind::Motorcycle, PortId::West)];

        let (outcome, events) = run(config);

        assert!(outcome.is_complete());
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::Departed { ferry: 1, rescue: true, .. })));
    }

    #[test]
    fn same_seed_same_result() {
        let first = Simulation::new(fast(8, 77), Arc::new(Recorder::new()));
        let second = Simulation::new(fast(8, 77), Arc::new(Recorder::new()));

        assert_eq!(first.fleet(), second.fleet());

        let first = within_deadline(move || first.run().unwrap());
        let second = within_deadline(move || second.run().unwrap());

        assert_eq!(first.trips, second.trips);
        assert_eq!(first.seed, 77);
    }

    #[test]
    fn independent_simulations_run_side_by_side() {
        let workers: Vec<_> = (0..2)
            .map(|seed| thread::spawn(move || run(fast(8, seed)).0))
            .collect();

        for worker in workers {
            assert!(worker.join().unwrap().is_complete());
        }
    }
}
