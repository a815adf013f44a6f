use crate::config::VehicleConfig;
use crate::harbor::{FerryId, PortId, VehicleId, VehicleKind, FERRIES};
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone)]
struct VehicleRecord {
    kind: VehicleKind,
    port: PortId,
    start: PortId,
    end: Option<PortId>,
    at_booth: bool,
}

#[derive(Debug)]
struct Ledger {
    vehicles: Vec<VehicleRecord>,
    docked: [Option<PortId>; FERRIES],
}

/// Start and end port of one vehicle, as recorded at the end of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundTrip {
    pub vehicle: VehicleId,
    pub start: PortId,
    pub end: Option<PortId>,
}

impl RoundTrip {
    pub fn is_complete(&self) -> bool {
        self.end == Some(self.start)
    }
}

/// Global view of where every vehicle is and which ferries are docked where.
///
/// The ledger lock is the innermost one: it is taken after any ferry or port
/// lock and nothing else is locked while it is held.
#[derive(Debug)]
pub struct Coordinator {
    ledger: Mutex<Ledger>,
}

impl Coordinator {
    /// `fleet` must be sorted by id with ids `0..fleet.len()`.
    pub fn new(fleet: &[VehicleConfig], docked: [Option<PortId>; FERRIES]) -> Coordinator {
        let vehicles = fleet
            .iter()
            .map(|vehicle| VehicleRecord {
                kind: vehicle.kind,
                port: vehicle.port,
                start: vehicle.port,
                end: None,
                at_booth: false,
            })
            .collect();

        Coordinator {
            ledger: Mutex::new(Ledger { vehicles, docked }),
        }
    }

    pub fn port_of(&self, vehicle: VehicleId) -> PortId {
        self.ledger.lock().vehicles[vehicle as usize].port
    }

    pub fn relocate<I: IntoIterator<Item = VehicleId>>(&self, vehicles: I, port: PortId) {
        let mut ledger = self.ledger.lock();

        for vehicle in vehicles {
            ledger.vehicles[vehicle as usize].port = port;
        }
    }

    pub fn enter_booth(&self, vehicle: VehicleId) {
        self.ledger.lock().vehicles[vehicle as usize].at_booth = true;
    }

    pub fn leave_booth(&self, vehicle: VehicleId) {
        self.ledger.lock().vehicles[vehicle as usize].at_booth = false;
    }

    pub fn complete(&self, vehicle: VehicleId, port: PortId) {
        self.ledger.lock().vehicles[vehicle as usize].end = Some(port);
    }

    pub fn all_complete(&self) -> bool {
        self.ledger
            .lock()
            .vehicles
            .iter()
            .all(|vehicle| vehicle.end.is_some())
    }

    /// Vehicles still travelling whose current location is `port`. Vehicles
    /// aboard a ferry count for the port they boarded in until it arrives.
    pub fn remaining_in(&self, port: PortId) -> usize {
        self.ledger
            .lock()
            .vehicles
            .iter()
            .filter(|vehicle| vehicle.end.is_none() && vehicle.port == port)
            .count()
    }

    /// Kinds of the vehicles currently holding a booth in `port`.
    pub fn checking_in(&self, port: PortId) -> Vec<VehicleKind> {
        self.ledger
            .lock()
            .vehicles
            .iter()
            .filter(|vehicle| vehicle.at_booth && vehicle.port == port)
            .map(|vehicle| vehicle.kind)
            .collect()
    }

    pub fn set_docked(&self, ferry: FerryId, port: Option<PortId>) {
        self.ledger.lock().docked[ferry] = port;
    }

    pub fn ferry_docked_at(&self, port: PortId) -> bool {
        self.ledger.lock().docked.contains(&Some(port))
    }

    pub fn round_trips(&self) -> Vec<RoundTrip> {
        self.ledger
            .lock()
            .vehicles
            .iter()
            .enumerate()
            .map(|(id, vehicle)| RoundTrip {
                vehicle: id as VehicleId,
                start: vehicle.start,
                end: vehicle.end,
            })
            .collect()
    }
}
