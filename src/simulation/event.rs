use crate::harbor::{FerryId, PortId, VehicleId, VehicleKind};
use serde::Serialize;

/// Facts the simulation reports as it runs. The core never formats them;
/// what happens to them is up to the `EventSink`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    PortCreated {
        port: PortId,
    },
    BoothCreated {
        port: PortId,
        booth: usize,
    },
    LineCreated {
        port: PortId,
        line: usize,
    },
    FerryCreated {
        ferry: FerryId,
        port: PortId,
    },
    VehicleCreated {
        vehicle: VehicleId,
        kind: VehicleKind,
        special: bool,
        port: PortId,
    },
    Approached {
        vehicle: VehicleId,
        kind: VehicleKind,
        booth: usize,
        port: PortId,
    },
    EnteredLine {
        vehicle: VehicleId,
        kind: VehicleKind,
        line: usize,
        port: PortId,
        line_weight: u32,
    },
    Boarded {
        vehicle: VehicleId,
        kind: VehicleKind,
        ferry: FerryId,
        port: PortId,
        line: usize,
        ferry_load: u32,
    },
    Departed {
        ferry: FerryId,
        from: PortId,
        to: PortId,
        load: u32,
        rescue: bool,
    },
    Arrived {
        ferry: FerryId,
        port: PortId,
        passengers: usize,
    },
    Unloaded {
        vehicle: VehicleId,
        kind: VehicleKind,
        ferry: FerryId,
        port: PortId,
    },
    FerryEmptied {
        ferry: FerryId,
        port: PortId,
    },
    Completed {
        vehicle: VehicleId,
        port: PortId,
    },
    FerryRetired {
        ferry: FerryId,
        port: PortId,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}
