use crate::simulation::event::{Event, EventSink};
use colored::Colorize;
use parking_lot::Mutex;
use std::io::{self, Write};

/// Human readable output, one line per event. The writer lock is the only
/// thing serializing output; it says nothing about simulation state.
pub struct ConsoleSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn stdout() -> ConsoleSink {
        ConsoleSink::new(Box::new(io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> ConsoleSink {
        ConsoleSink { out: Mutex::new(out) }
    }
}

pub fn describe(event: &Event) -> String {
    match event {
        Event::PortCreated { port } => format!("Created new port with id {}.", port),
        Event::BoothCreated { port, booth } => format!("Created new booth with id {} in port {}.", booth, port),
        Event::LineCreated { port, line } => format!("Created new waiting line with id {} in port {}.", line, port),
        Event::FerryCreated { ferry, port } => format!("Created new ferry with id {} in port {}.", ferry, port),
        Event::VehicleCreated { vehicle, kind, special, port } => format!(
            "Created {} ({}){} in port {}.",
            kind,
            vehicle,
            if *special { " with special passengers" } else { "" },
            port
        ),
        Event::Approached { vehicle, kind, booth, port } => {
            format!("{} ({}) approaches Booth{} on Port {}.", kind, vehicle, booth, port)
        }
        Event::EnteredLine { vehicle, kind, line, port, line_weight } => format!(
            "{} ({}) enters Line{} on Port {} ({}/line).",
            kind, vehicle, line, port, line_weight
        ),
        Event::Boarded { vehicle, kind, ferry, port, line, ferry_load } => format!(
            "{} ({}) is loaded from Line{} to Ferry{} on Port {} ({}/ferry).",
            kind, vehicle, line, ferry, port, ferry_load
        ),
        Event::Departed { ferry, to, load, rescue, .. } => format!(
            "Ferry{} is moving to Port {} carrying {}{}.",
            ferry,
            to,
            load,
            if *rescue { " to pick up stranded vehicles" } else { "" }
        ),
        Event::Arrived { ferry, port, passengers } => {
            format!("Ferry{} arrived at Port {} with {} vehicles.", ferry, port, passengers)
        }
        Event::Unloaded { vehicle, kind, ferry, port } => {
            format!("{} ({}) unloaded from Ferry{} on Port {}.", kind, vehicle, ferry, port)
        }
        Event::FerryEmptied { ferry, port } => format!("Ferry{} is fully unloaded on Port {}.", ferry, port),
        Event::Completed { vehicle, port } => format!("Vehicle ({}) finished its trips on Port {}.", vehicle, port),
        Event::FerryRetired { ferry, port } => format!("Ferry{} stops service on Port {}.", ferry, port),
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: Event) {
        let tag = match event {
            Event::PortCreated { .. }
            | Event::BoothCreated { .. }
            | Event::LineCreated { .. }
            | Event::FerryCreated { .. }
            | Event::VehicleCreated { .. } => "INFO:".blue(),
            Event::Departed { .. } | Event::Arrived { .. } | Event::FerryEmptied { .. } => "UPDATE:".cyan(),
            Event::Completed { .. } | Event::FerryRetired { .. } => "DONE:".green(),
            _ => "UPDATE:".yellow(),
        };

        let mut out = self.out.lock();

        if let Err(error) = writeln!(out, "{} {}", tag, describe(&event)) {
            tracing::warn!(%error, "could not write event");
        }
    }
}

/// One JSON object per line, in the same shape the events serialize to.
pub struct JsonSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl JsonSink {
    pub fn stdout() -> JsonSink {
        JsonSink::new(Box::new(io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> JsonSink {
        JsonSink { out: Mutex::new(out) }
    }
}

impl EventSink for JsonSink {
    fn emit(&self, event: Event) {
        let mut out = self.out.lock();

        if let Err(error) = serde_json::to_writer(&mut *out, &event) {
            tracing::warn!(%error, "could not serialize event");
            return;
        }

        if let Err(error) = writeln!(out) {
            tracing::warn!(%error, "could not write event");
        }
    }
}

/// Drops everything.
pub struct Silent;

impl EventSink for Silent {
    fn emit(&self, _event: Event) {}
}

/// Keeps every event in order of emission, for inspecting a finished run.
#[cfg(test)]
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

#[cfg(test)]
impl Recorder {
    pub fn new() -> Recorder {
        Recorder::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

#[cfg(test)]
impl EventSink for Recorder {
    fn emit(&self, event: Event) {
        self.events.lock().push(event);
    }
}
