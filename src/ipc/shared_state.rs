//! Scalar registers shared by the tracking loops.
//!
//! Each field is an independent atomic cell with exactly one writer. The writer
//! handles ([`PerceptionPublisher`], [`CommandPublisher`]) are handed out once by
//! [`SharedControlState::new`] and cannot be cloned, so the single-writer rule
//! holds by construction. [`StateReader`] is freely cloneable.
//!
//! There is no cross-field consistency: a reader may observe a frame center
//! from one perception cycle and a centroid from the next.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// VALUE TYPES
// ============================================================================

/// Integer pixel coordinate in frame space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn pack(self) -> u64 {
        ((self.x as u32 as u64) << 32) | self.y as u32 as u64
    }

    fn unpack(bits: u64) -> Self {
        Self {
            x: (bits >> 32) as u32 as i32,
            y: bits as u32 as i32,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Pan,
    Tilt,
}

impl Axis {
    /// The coordinate of `p` this axis corrects.
    pub fn component(self, p: Point) -> i32 {
        match self {
            Axis::Pan => p.x,
            Axis::Tilt => p.y,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::Pan => "pan",
            Axis::Tilt => "tilt",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisCommand {
    pub pan: f64,
    pub tilt: f64,
}

impl AxisCommand {
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Pan => self.pan,
            Axis::Tilt => self.tilt,
        }
    }
}

/// Field-by-field read of every cell. Not a transactional snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateSnapshot {
    pub frame_center: Point,
    pub target_centroid: Point,
    pub detected: bool,
    pub command: AxisCommand,
    pub publication: u64,
}

// ============================================================================
// CELLS
// ============================================================================

struct Cells {
    frame_center: AtomicU64,
    target_centroid: AtomicU64,
    detected: AtomicBool,
    pan_command: AtomicU64,
    tilt_command: AtomicU64,
    // Bumped once per perception cycle; paired with `published` so consumers
    // can block until a new frame has been processed.
    publications: Mutex<u64>,
    published: Condvar,
}

impl Cells {
    fn command_cell(&self, axis: Axis) -> &AtomicU64 {
        match axis {
            Axis::Pan => &self.pan_command,
            Axis::Tilt => &self.tilt_command,
        }
    }
}

/// The full set of handles onto one shared state instance.
pub struct SharedControlState {
    pub perception: PerceptionPublisher,
    pub pan: CommandPublisher,
    pub tilt: CommandPublisher,
    pub reader: StateReader,
}

impl SharedControlState {
    /// Zero center, zero centroid, no detection, zero commands.
    pub fn new() -> Self {
        let cells = Arc::new(Cells {
            frame_center: AtomicU64::new(Point::default().pack()),
            target_centroid: AtomicU64::new(Point::default().pack()),
            detected: AtomicBool::new(false),
            pan_command: AtomicU64::new(0f64.to_bits()),
            tilt_command: AtomicU64::new(0f64.to_bits()),
            publications: Mutex::new(0),
            published: Condvar::new(),
        });

        Self {
            perception: PerceptionPublisher { cells: cells.clone() },
            pan: CommandPublisher { axis: Axis::Pan, cells: cells.clone() },
            tilt: CommandPublisher { axis: Axis::Tilt, cells: cells.clone() },
            reader: StateReader { cells },
        }
    }
}

impl Default for SharedControlState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// WRITERS
// ============================================================================

/// Sole writer of frame center, target centroid and the detection flag.
pub struct PerceptionPublisher {
    cells: Arc<Cells>,
}

impl PerceptionPublisher {
    /// Publish one perception cycle. `centroid` is `Some` only for a detection;
    /// on `None` the previous centroid is left in place.
    pub fn publish(&mut self, frame_center: Point, centroid: Option<Point>) {
        let c = &self.cells;
        c.frame_center.store(frame_center.pack(), Ordering::Release);
        if let Some(p) = centroid {
            c.target_centroid.store(p.pack(), Ordering::Release);
        }
        c.detected.store(centroid.is_some(), Ordering::Release);

        let mut seq = c.publications.lock();
        *seq += 1;
        c.published.notify_all();
    }
}

/// Sole writer of one axis' command cell.
pub struct CommandPublisher {
    axis: Axis,
    cells: Arc<Cells>,
}

impl CommandPublisher {
    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn publish(&mut self, value: f64) {
        self.cells
            .command_cell(self.axis)
            .store(value.to_bits(), Ordering::Release);
    }
}

// ============================================================================
// READER
// ============================================================================

#[derive(Clone)]
pub struct StateReader {
    cells: Arc<Cells>,
}

impl StateReader {
    pub fn frame_center(&self) -> Point {
        Point::unpack(self.cells.frame_center.load(Ordering::Acquire))
    }

    pub fn target_centroid(&self) -> Point {
        Point::unpack(self.cells.target_centroid.load(Ordering::Acquire))
    }

    pub fn detected(&self) -> bool {
        self.cells.detected.load(Ordering::Acquire)
    }

    pub fn command(&self, axis: Axis) -> f64 {
        f64::from_bits(self.cells.command_cell(axis).load(Ordering::Acquire))
    }

    pub fn axis_command(&self) -> AxisCommand {
        AxisCommand {
            pan: self.command(Axis::Pan),
            tilt: self.command(Axis::Tilt),
        }
    }

    /// Number of perception cycles published so far.
    pub fn publication(&self) -> u64 {
        *self.cells.publications.lock()
    }

    /// Block until a publication newer than `seen` exists or `timeout` elapses.
    /// Returns the latest publication number, which equals `seen` on timeout.
    pub fn wait_for_publication(&self, seen: u64, timeout: Duration) -> u64 {
        let mut seq = self.cells.publications.lock();
        if *seq == seen {
            self.cells.published.wait_for(&mut seq, timeout);
        }
        *seq
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            frame_center: self.frame_center(),
            target_centroid: self.target_centroid(),
            detected: self.detected(),
            command: self.axis_command(),
            publication: self.publication(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_packing_preserves_negative_coordinates() {
        for p in [Point::new(-1, 0), Point::new(0, -240), Point::new(i32::MIN, i32::MAX)] {
            assert_eq!(Point::unpack(p.pack()), p);
        }
    }

    #[test]
    fn wait_returns_immediately_when_already_behind() {
        let mut state = SharedControlState::new();
        state.perception.publish(Point::new(1, 1), None);
        let seq = state.reader.wait_for_publication(0, Duration::from_secs(5));
        assert_eq!(seq, 1);
    }
}
