/// Core types used throughout memspy: the unresolved-frame marker and the
/// capture error taxonomy.
use thiserror::Error;

#[cfg(unix)]
pub type Pid = libc::pid_t;

/// Emitted in place of a procedure name whenever symbol resolution fails.
/// Trace consumers treat this token as "unknown call site".
pub const UNRESOLVED_MARKER: &str = "?";

/// Everything that can go wrong while capturing a trace. Only `CursorInit`
/// aborts a capture; the rest are reported on the diagnostics channel and
/// the walk carries on with a best-effort record.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[cfg(target_os = "linux")]
    #[error("Couldn't bind an unwind cursor to the captured execution context: {0}")]
    CursorInit(#[source] unwind::Error),
    #[cfg(target_os = "linux")]
    #[error("Couldn't read the instruction pointer register: {0}")]
    RegisterRead(#[source] unwind::Error),
    #[cfg(target_os = "linux")]
    #[error("No symbol information for the procedure at {0:#x}")]
    SymbolUnavailable(u64),
    #[cfg(target_os = "linux")]
    #[error("Symbol resolution failed at {0:#x}: {1}")]
    SymbolResolution(u64, #[source] unwind::Error),
    #[error("Couldn't determine the executable's load bias: {0}")]
    LoadBias(anyhow::Error),
}
