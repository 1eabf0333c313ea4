//! memspy captures a symbolic snapshot of the calling thread's stack and
//! writes one line per frame to a caller-supplied sink. It's meant to be
//! called from the allocation hooks of a memory profiler, which is why the
//! capture routine takes a skip count: the innermost frames usually belong
//! to the instrumentation itself, not the code under observation.
#[macro_use]
extern crate log;

pub mod core;

pub use crate::core::types::CaptureError;
#[cfg(target_os = "linux")]
pub use crate::core::walker::UnwindWalker;
pub use crate::core::walker::{capture_trace, platform_walker, SentinelWalker, StackWalker};
