use crate::harbor::port::WaitingLines;
use crate::harbor::queue::CapacityQueue;
use crate::harbor::{FerryId, Harbor, PortId, Ticket};
use crate::simulation::event::Event;
use crate::simulation::signal::Signal;
use parking_lot::Mutex;
use std::thread;

/// 1. `Ferry` when
///     * `AtPort(loading)`
///         * Every tick (one time unit)
///             1) stop if every vehicle has finished both legs
///             2) count the tick
///             3) become ready to load: on the first cycle once `first_cycle_wait`
///                ticks passed or every line is above `nearly_full_line`, on any
///                later cycle right away
///             4) if loaded and full, or loaded and nothing more can board,
///                transition to `Departing`
///             5) if this port has no vehicles left, the opposite one has some
///                and no ferry is docked there, transition to `Departing` (rescue)
///     * `Departing`
///         1) stop loading, undock, reset the tick counter
///         2) transition to `Sailing`
///     * `Sailing`
///         1) spend the transit time of the crossing, no lock held
///         2) move every passenger to the destination port
///         3) transition to `Arrived`
///     * `Arrived(unloading)`
///         1) dock, allow vehicles to leave
///         2) once the loading line is empty transition to `AtPort`
///
/// Lock order: `state` -> port lines -> `wait` -> coordinator ledger.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Berth {
    Docked(PortId),
    Sailing { from: PortId, to: PortId },
}

#[derive(Debug)]
pub struct FerryState {
    pub berth: Berth,
    /// Set on arrival, cleared once everybody got off.
    pub ready_for_round_trip: bool,
    pub loading: CapacityQueue<Ticket>,
}

impl FerryState {
    pub fn docked_at(&self) -> Option<PortId> {
        match self.berth {
            Berth::Docked(port) => Some(port),
            Berth::Sailing { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct WaitState {
    pub ticks: u32,
    pub ready_to_load: bool,
}

#[derive(Debug)]
pub struct Ferry {
    pub id: FerryId,
    pub state: Mutex<FerryState>,
    pub wait: Mutex<WaitState>,
    /// Bumped on docking changes and whenever the loading line changes.
    pub signal: Signal,
}

impl Ferry {
    pub fn new(id: FerryId, port: PortId) -> Ferry {
        Ferry {
            id,
            state: Mutex::new(FerryState {
                berth: Berth::Docked(port),
                ready_for_round_trip: false,
                loading: CapacityQueue::new(),
            }),
            wait: Mutex::new(WaitState::default()),
            signal: Signal::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Loaded,
    Rescue,
}

#[derive(Debug, Clone, Copy)]
struct Departure {
    from: PortId,
    to: PortId,
}

/// Ferry worker. Returns once every vehicle has completed its round trip.
pub fn operate(harbor: &Harbor, id: FerryId) {
    let ferry = harbor.ferry(id);
    let mut cycle: u32 = 0;

    tracing::debug!(ferry = id, "ferry in service");

    while let Some(departure) = wait_for_departure(harbor, ferry, cycle) {
        sail(harbor, ferry, departure);
        unload(harbor, ferry);

        cycle += 1;
    }

    let port = ferry.state.lock().docked_at();

    if let Some(port) = port {
        harbor.emit(Event::FerryRetired { ferry: id, port });
    }
    tracing::debug!(ferry = id, cycles = cycle, "ferry out of service");
}

fn wait_for_departure(harbor: &Harbor, ferry: &Ferry, cycle: u32) -> Option<Departure> {
    loop {
        if harbor.coordinator.all_complete() {
            return None;
        }

        thread::sleep(harbor.timing.tick());

        if let Some(departure) = tick(harbor, ferry, cycle) {
            return Some(departure);
        }
    }
}

fn tick(harbor: &Harbor, ferry: &Ferry, cycle: u32) -> Option<Departure> {
    let thresholds = &harbor.thresholds;

    let mut state = ferry.state.lock();
    let from = state.docked_at()?;
    let port = harbor.port(from);
    let lines = port.lines.lock();
    let mut wait = ferry.wait.lock();

    wait.ticks += 1;

    let became_ready = !wait.ready_to_load
        && (cycle > 0 || wait.ticks >= thresholds.first_cycle_wait || lines.all_above(thresholds.nearly_full_line));

    if became_ready {
        wait.ready_to_load = true;
    }

    let reason = match departure_reason(harbor, &state, &lines, from) {
        Some(reason) => reason,
        None => {
            drop(wait);
            drop(lines);
            drop(state);

            if became_ready {
                tracing::debug!(ferry = ferry.id, port = %from, "ready to load");
                port.signal.notify();
            }

            return None;
        }
    };

    let to = from.opposite();

    wait.ready_to_load = false;
    wait.ticks = 0;
    state.berth = Berth::Sailing { from, to };
    harbor.coordinator.set_docked(ferry.id, None);

    let load = state.loading.weight();

    drop(wait);
    drop(lines);
    drop(state);

    harbor.emit(Event::Departed {
        ferry: ferry.id,
        from,
        to,
        load,
        rescue: reason == Reason::Rescue,
    });

    for port in harbor.ports.iter() {
        port.signal.notify();
    }
    ferry.signal.notify();

    Some(Departure { from, to })
}

/// Why a ferry docked at `port` should leave now, if it should.
pub fn departure_reason(harbor: &Harbor, state: &FerryState, lines: &WaitingLines, port: PortId) -> Option<Reason> {
    let capacity = harbor.thresholds.ferry_capacity;
    let load = state.loading.weight();

    if load > 0 && (load >= capacity || !more_coming(harbor, lines, port, capacity - load)) {
        return Some(Reason::Loaded);
    }

    let other = port.opposite();
    let coordinator = &harbor.coordinator;

    if coordinator.remaining_in(port) == 0 && coordinator.remaining_in(other) > 0 && !coordinator.ferry_docked_at(other) {
        return Some(Reason::Rescue);
    }

    None
}

/// Whether a waiting vehicle could still board into `room` spare units, or a
/// vehicle still at a booth could get into a line and should be waited for.
fn more_coming(harbor: &Harbor, lines: &WaitingLines, port: PortId, room: u32) -> bool {
    if lines.any_head_fits(room) {
        return true;
    }

    let line_capacity = harbor.thresholds.line_capacity;

    harbor
        .coordinator
        .checking_in(port)
        .into_iter()
        .any(|kind| lines.has_room_for(kind, line_capacity))
}

fn sail(harbor: &Harbor, ferry: &Ferry, departure: Departure) {
    let Departure { from, to } = departure;

    thread::sleep(harbor.timing.transit(from));

    let mut state = ferry.state.lock();

    harbor
        .coordinator
        .relocate(state.loading.iter().map(|ticket| ticket.vehicle), to);

    state.berth = Berth::Docked(to);
    state.ready_for_round_trip = true;
    harbor.coordinator.set_docked(ferry.id, Some(to));

    let passengers = state.loading.len();

    drop(state);

    harbor.emit(Event::Arrived {
        ferry: ferry.id,
        port: to,
        passengers,
    });

    ferry.signal.notify();
    harbor.port(to).signal.notify();
}

fn unload(harbor: &Harbor, ferry: &Ferry) {
    loop {
        let observed = ferry.signal.observe();

        {
            let mut state = ferry.state.lock();

            if state.loading.is_empty() {
                state.ready_for_round_trip = false;

                let port = state.docked_at();

                drop(state);

                if let Some(port) = port {
                    harbor.emit(Event::FerryEmptied { ferry: ferry.id, port });
                }

                return;
            }
        }

        ferry.signal.wait(observed, harbor.timing.poll());
    }
}
