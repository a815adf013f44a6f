use crate::config::VehicleConfig;
use crate::harbor::booth;
use crate::harbor::port::{Boarding, Port};
use crate::harbor::{FerryId, Harbor, PortId, Ticket};
use crate::simulation::event::Event;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::thread;

/// Number of one-way crossings that make a round trip.
pub const LEGS: u32 = 2;

/// 1. `Vehicle` on every leg
///     * `CheckingIn`
///         1) pick a booth (any of the four when special, one of the first three
///            otherwise) and wait until it is free
///         2) join the first waiting line with room, waiting until one has room
///         3) free the booth, transition to `Waiting`
///     * `Waiting`
///         * Whenever the port changes
///             * If the current line is empty, rotate the cursor
///             * If a ferry docked here is ready to load and this vehicle heads the
///               current line
///                 * If it fits, move onto the ferry, transition to `Aboard`
///                 * Else rotate the cursor
///     * `Aboard`
///         * Whenever the ferry changes
///             * If docked, done loading, arrived and this vehicle heads the
///               loading line, get off
///     * Between legs rest for a random number of time units
/// 2. After the last leg record the port reached and finish.

/// Vehicle worker. `seed` is the simulation seed; every vehicle draws from its
/// own stream of it so its choices do not depend on scheduling.
pub fn travel(harbor: &Harbor, config: VehicleConfig, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(u64::from(config.id) + 1);

    let ticket = Ticket::from(&config);

    for leg in 0..LEGS {
        if leg > 0 {
            dwell(harbor, &mut rng);
        }

        let port = harbor.coordinator.port_of(ticket.vehicle);

        tracing::debug!(vehicle = ticket.vehicle, leg, port = %port, "starting leg");

        check_in(harbor, ticket, config.special, port, &mut rng);
        let ferry = board(harbor, ticket, port);
        disembark(harbor, ticket, ferry);
    }

    let port = harbor.coordinator.port_of(ticket.vehicle);

    harbor.coordinator.complete(ticket.vehicle, port);
    harbor.emit(Event::Completed {
        vehicle: ticket.vehicle,
        port,
    });
}

fn dwell(harbor: &Harbor, rng: &mut ChaCha8Rng) {
    let [shortest, longest] = harbor.timing.dwell_units;

    thread::sleep(harbor.timing.units(rng.gen_range(shortest..=longest)));
}

fn check_in(harbor: &Harbor, ticket: Ticket, special: bool, port_id: PortId, rng: &mut ChaCha8Rng) {
    let port = harbor.port(port_id);
    let pass = port.booth(booth::pick(rng, special)).occupy(ticket.vehicle);

    harbor.coordinator.enter_booth(ticket.vehicle);
    harbor.emit(Event::Approached {
        vehicle: ticket.vehicle,
        kind: ticket.kind,
        booth: pass.booth().id,
        port: port_id,
    });

    let capacity = harbor.thresholds.line_capacity;

    loop {
        let observed = port.signal.observe();

        {
            let mut lines = port.lines.lock();

            if let Some(line) = lines.join(ticket, capacity) {
                harbor.coordinator.leave_booth(ticket.vehicle);
                harbor.emit(Event::EnteredLine {
                    vehicle: ticket.vehicle,
                    kind: ticket.kind,
                    line,
                    port: port_id,
                    line_weight: lines.weight(line),
                });

                break;
            }
        }

        port.signal.wait(observed, harbor.timing.poll());
    }

    drop(pass);
    port.signal.notify();
}

/// Waits in line until admitted onto a ferry docked in `port_id`.
fn board(harbor: &Harbor, ticket: Ticket, port_id: PortId) -> FerryId {
    let port = harbor.port(port_id);

    loop {
        let observed = port.signal.observe();
        let ferry = find_ferry(harbor, port_id);

        let boarding = match ferry {
            Some(ferry) => try_board(harbor, ticket, port, ferry),
            None => port.lines.lock().skip_empty(),
        };

        match (boarding, ferry) {
            (Boarding::Admitted { .. }, Some(ferry)) => return ferry,
            (Boarding::Empty, _) => {
                port.signal.notify();
                continue;
            }
            (Boarding::Refused { line }, Some(ferry)) => {
                // Not signalled: heads that do not fit would keep waking each other.
                tracing::debug!(vehicle = ticket.vehicle, ferry, line, "no room on ferry");
            }
            _ => {}
        }

        port.signal.wait(observed, harbor.timing.poll());
    }
}

/// A ferry docked in `port`, preferring one that is already loading.
fn find_ferry(harbor: &Harbor, port: PortId) -> Option<FerryId> {
    let mut docked = None;

    for ferry in harbor.ferries.iter() {
        let state = ferry.state.lock();

        if state.docked_at() != Some(port) {
            continue;
        }

        if ferry.wait.lock().ready_to_load {
            return Some(ferry.id);
        }

        docked = docked.or(Some(ferry.id));
    }

    docked
}

fn try_board(harbor: &Harbor, ticket: Ticket, port: &Port, ferry_id: FerryId) -> Boarding {
    let ferry = harbor.ferry(ferry_id);

    let mut state = ferry.state.lock();
    let mut lines = port.lines.lock();
    let wait = ferry.wait.lock();

    if state.docked_at() != Some(port.id) || !wait.ready_to_load {
        return lines.skip_empty();
    }

    let boarding = lines.board(ticket, &mut state.loading, harbor.thresholds.ferry_capacity);

    if let Boarding::Admitted { line } = boarding {
        harbor.emit(Event::Boarded {
            vehicle: ticket.vehicle,
            kind: ticket.kind,
            ferry: ferry_id,
            port: port.id,
            line,
            ferry_load: state.loading.weight(),
        });

        drop(wait);
        drop(lines);
        drop(state);

        port.signal.notify();
        ferry.signal.notify();
    }

    boarding
}

/// Rides along and gets off at the other side, in loading order.
fn disembark(harbor: &Harbor, ticket: Ticket, ferry_id: FerryId) {
    let ferry = harbor.ferry(ferry_id);

    loop {
        let observed = ferry.signal.observe();

        {
            let mut state = ferry.state.lock();
            let loading_again = ferry.wait.lock().ready_to_load;
            let at_head = state.loading.head().map(|head| head.vehicle) == Some(ticket.vehicle);

            match state.docked_at() {
                Some(port) if state.ready_for_round_trip && at_head && !loading_again => {
                    if let Err(error) = state.loading.dequeue() {
                        tracing::error!(%error, ferry = ferry_id, vehicle = ticket.vehicle, "unload failed");
                    }

                    harbor.emit(Event::Unloaded {
                        vehicle: ticket.vehicle,
                        kind: ticket.kind,
                        ferry: ferry_id,
                        port,
                    });

                    drop(state);
                    ferry.signal.notify();

                    return;
                }
                _ => {}
            }
        }

        ferry.signal.wait(observed, harbor.timing.poll());
    }
}
