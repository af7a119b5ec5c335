//! Rig boundary: the named-parameter surface of a loaded avatar model,
//! plus the clock every animator reads wall-clock time from.

pub mod clock;
pub mod memory;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::MemoryRig;
pub use sink::{read_first, set_if_exists, ParameterSink, RigError};
