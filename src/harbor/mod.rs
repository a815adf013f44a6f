use crate::config::{Id, SystemConfig, ThresholdConfig, TimingConfig, VehicleConfig};
use crate::harbor::coordinator::Coordinator;
use crate::harbor::ferry::Ferry;
use crate::harbor::port::Port;
use crate::simulation::event::{Event, EventSink};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::sync::Arc;

pub mod booth;
pub mod coordinator;
pub mod ferry;
pub mod port;
pub mod queue;
pub mod vehicle;

pub const BOOTHS_PER_PORT: usize = 4;
pub const NORMAL_BOOTHS: usize = 3;
pub const LINES_PER_PORT: usize = 3;
pub const FERRIES: usize = 2;

pub type VehicleId = Id;
pub type FerryId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PortId {
    West,
    East,
}

impl PortId {
    pub const ALL: [PortId; 2] = [PortId::West, PortId::East];

    pub fn index(self) -> usize {
        match self {
            PortId::West => 0,
            PortId::East => 1,
        }
    }

    pub fn opposite(self) -> PortId {
        match self {
            PortId::West => PortId::East,
            PortId::East => PortId::West,
        }
    }
}

impl TryFrom<u8> for PortId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PortId::West),
            1 => Ok(PortId::East),
            other => Err(format!("there is no port with id \"{}\"", other)),
        }
    }
}

impl From<PortId> for u8 {
    fn from(port: PortId) -> u8 {
        port.index() as u8
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleKind {
    Motorcycle,
    Car,
    Bus,
    Truck,
}

impl VehicleKind {
    /// Capacity units taken in a waiting line or on a ferry.
    pub fn weight(self) -> u32 {
        match self {
            VehicleKind::Motorcycle => 1,
            VehicleKind::Car => 2,
            VehicleKind::Bus => 3,
            VehicleKind::Truck => 4,
        }
    }
}

impl fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VehicleKind::Motorcycle => "Motorcycle",
            VehicleKind::Car => "Car",
            VehicleKind::Bus => "Bus",
            VehicleKind::Truck => "Truck",
        };

        f.write_str(name)
    }
}

/// Anything that takes up room in a `CapacityQueue`.
pub trait Weighted {
    fn weight(&self) -> u32;
}

/// What a waiting line or a loading line actually holds: the vehicle stays
/// with its own thread, the queues only keep track of who is where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub vehicle: VehicleId,
    pub kind: VehicleKind,
}

impl Weighted for Ticket {
    fn weight(&self) -> u32 {
        self.kind.weight()
    }
}

impl From<&VehicleConfig> for Ticket {
    fn from(config: &VehicleConfig) -> Ticket {
        Ticket {
            vehicle: config.id,
            kind: config.kind,
        }
    }
}

/// Everything the ferries and vehicles share. One instance per simulation,
/// handed to every worker behind an `Arc`.
pub struct Harbor {
    pub ports: [Port; 2],
    pub ferries: [Ferry; FERRIES],
    pub coordinator: Coordinator,
    pub timing: TimingConfig,
    pub thresholds: ThresholdConfig,
    events: Arc<dyn EventSink>,
}

impl Harbor {
    pub fn new(config: &SystemConfig, fleet: &[VehicleConfig], events: Arc<dyn EventSink>) -> Harbor {
        let ports = [Port::new(PortId::West), Port::new(PortId::East)];

        for port in ports.iter() {
            events.emit(Event::PortCreated { port: port.id });

            for booth in 0..BOOTHS_PER_PORT {
                events.emit(Event::BoothCreated { port: port.id, booth });
            }

            for line in 0..LINES_PER_PORT {
                events.emit(Event::LineCreated { port: port.id, line });
            }
        }

        // Ferry `i` starts docked in port `i`.
        let ferries = [Ferry::new(0, PortId::West), Ferry::new(1, PortId::East)];

        for ferry in ferries.iter() {
            events.emit(Event::FerryCreated {
                ferry: ferry.id,
                port: PortId::ALL[ferry.id],
            });
        }

        for vehicle in fleet {
            events.emit(Event::VehicleCreated {
                vehicle: vehicle.id,
                kind: vehicle.kind,
                special: vehicle.special,
                port: vehicle.port,
            });
        }

        Harbor {
            ports,
            ferries,
            coordinator: Coordinator::new(fleet, [Some(PortId::West), Some(PortId::East)]),
            timing: config.timing.clone(),
            thresholds: config.thresholds.clone(),
            events,
        }
    }

    pub fn port(&self, id: PortId) -> &Port {
        &self.ports[id.index()]
    }

    pub fn ferry(&self, id: FerryId) -> &Ferry {
        &self.ferries[id]
    }

    pub fn emit(&self, event: Event) {
        self.events.emit(event);
    }
}
