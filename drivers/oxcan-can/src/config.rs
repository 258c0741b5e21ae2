//! Static driver configuration.
//!
//! The caller hands the driver a [`CanConfig`] describing which of the
//! adapter's controllers to bring up and which hardware objects each one
//! owns. The tables live in static memory for the lifetime of the driver;
//! the driver borrows them, it never copies them.

/// Number of CAN buses the adapter exposes.
pub const CONTROLLER_COUNT: usize = 5;

/// Size of the transmit-handle routing table.
pub const HTH_COUNT: usize = 16;

/// Direction of a hardware object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Transmit object; addressable as a hardware transmit handle.
    Transmit,
    /// Receive object; frames arrive on it via the interrupt path.
    Receive,
}

/// One hardware object owned by a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareObject {
    /// Object id; doubles as the transmit handle for transmit objects.
    pub object_id: u8,
    /// Transmit or receive.
    pub kind: ObjectKind,
    /// Marks the last object of the controller's run.
    pub end_of_list: bool,
}

/// Configuration for one controller.
#[derive(Debug)]
pub struct ControllerConfig {
    /// Controller id, `0..CONTROLLER_COUNT`.
    pub controller_id: u8,
    /// The controller's hardware objects. The run ends at the first entry
    /// with `end_of_list` set, inclusive.
    pub objects: &'static [HardwareObject],
}

impl ControllerConfig {
    /// Iterates the controller's object run: every entry up to and
    /// including the one carrying the end-of-list flag.
    #[must_use]
    pub fn object_run(&self) -> ObjectRun {
        ObjectRun {
            objects: self.objects,
            done: false,
        }
    }
}

/// Iterator over a controller's hardware-object run.
pub struct ObjectRun {
    objects: &'static [HardwareObject],
    done: bool,
}

impl Iterator for ObjectRun {
    type Item = &'static HardwareObject;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (first, rest) = self.objects.split_first()?;
        self.objects = rest;
        if first.end_of_list {
            self.done = true;
        }
        Some(first)
    }
}

/// Top-level driver configuration.
#[derive(Debug)]
pub struct CanConfig {
    /// One entry per controller to bring up.
    pub controllers: &'static [ControllerConfig],
}
