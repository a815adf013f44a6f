use crate::harbor::booth::Booth;
use crate::harbor::queue::{CapacityQueue, EmptyQueue};
use crate::harbor::{PortId, Ticket, VehicleKind, Weighted, BOOTHS_PER_PORT, LINES_PER_PORT};
use crate::simulation::signal::Signal;
use parking_lot::Mutex;

/// Result of one boarding attempt against the port's current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boarding {
    /// Moved from `line` onto the ferry.
    Admitted { line: usize },
    /// Head of the current line, but the ferry has no room; the cursor moved on.
    Refused { line: usize },
    /// The current line was empty; the cursor moved on.
    Empty,
    /// Someone else is at the head of the current line.
    NotHead,
}

/// The three waiting lines of a port and the cursor naming the line that
/// boards next. Only the head of the current line is ever serviced, the
/// cursor rotates 0 -> 1 -> 2 -> 0.
#[derive(Debug, Default)]
pub struct WaitingLines {
    lines: [CapacityQueue<Ticket>; LINES_PER_PORT],
    current: usize,
}

impl WaitingLines {
    pub fn new() -> WaitingLines {
        WaitingLines::default()
    }

    /// Joins the first line, in index order, that stays within `capacity`.
    pub fn join(&mut self, ticket: Ticket, capacity: u32) -> Option<usize> {
        let line = self
            .lines
            .iter()
            .position(|line| line.fits(ticket.weight(), capacity))?;

        self.lines[line].enqueue(ticket);

        Some(line)
    }

    pub fn weight(&self, line: usize) -> u32 {
        self.lines[line].weight()
    }

    fn rotate(&mut self) {
        self.current = (self.current + 1) % LINES_PER_PORT;
    }

    /// Moves the cursor past an empty current line. Any waiting vehicle may
    /// do this, whether or not a ferry is loading.
    pub fn skip_empty(&mut self) -> Boarding {
        if self.lines[self.current].is_empty() {
            self.rotate();
            Boarding::Empty
        } else {
            Boarding::NotHead
        }
    }

    /// Transfers `ticket` from the head of the current line to `loading` if
    /// it is that head and fits within `capacity`.
    pub fn board(&mut self, ticket: Ticket, loading: &mut CapacityQueue<Ticket>, capacity: u32) -> Boarding {
        let line = self.current;

        match self.lines[line].head().copied() {
            None => {
                self.rotate();
                Boarding::Empty
            }
            Some(head) if head.vehicle != ticket.vehicle => Boarding::NotHead,
            Some(_) if !loading.fits(ticket.weight(), capacity) => {
                self.rotate();
                Boarding::Refused { line }
            }
            Some(_) => match self.lines[line].dequeue() {
                Ok(head) => {
                    loading.enqueue(head);
                    Boarding::Admitted { line }
                }
                Err(EmptyQueue) => Boarding::Empty,
            },
        }
    }

    /// Every line is heavier than `threshold`.
    pub fn all_above(&self, threshold: u32) -> bool {
        self.lines.iter().all(|line| line.weight() > threshold)
    }

    /// Some line head would fit into `room` spare ferry units.
    pub fn any_head_fits(&self, room: u32) -> bool {
        self.lines
            .iter()
            .filter_map(|line| line.head())
            .any(|head| head.weight() <= room)
    }

    /// A vehicle of `kind` checking in right now would get into some line.
    pub fn has_room_for(&self, kind: VehicleKind, capacity: u32) -> bool {
        self.lines.iter().any(|line| line.fits(kind.weight(), capacity))
    }
}

#[derive(Debug)]
pub struct Port {
    pub id: PortId,
    booths: [Booth; BOOTHS_PER_PORT],
    pub lines: Mutex<WaitingLines>,
    /// Bumped whenever the lines, the cursor or the ferries docked here change.
    pub signal: Signal,
}

impl Port {
    pub fn new(id: PortId) -> Port {
        Port {
            id,
            booths: [Booth::new(0), Booth::new(1), Booth::new(2), Booth::new(3)],
            lines: Mutex::new(WaitingLines::new()),
            signal: Signal::new(),
        }
    }

    pub fn booth(&self, index: usize) -> &Booth {
        &self.booths[index]
    }
}
