/// The stack-walking core: captures the calling thread's own call stack and
/// writes one symbolized line per frame to a sink.
use std::io::Write;

#[cfg(target_os = "linux")]
use unwind::{get_context, Cursor, RegNum};

#[cfg(target_os = "linux")]
use crate::core::load_bias::load_bias;
#[cfg(target_os = "linux")]
use crate::core::types::CaptureError;
use crate::core::types::UNRESOLVED_MARKER;

/// Captures a symbolic snapshot of the current call stack.
///
/// `capture_trace` writes zero or more newline-terminated lines to `sink`,
/// innermost frame first, in the format
///
/// ```text
/// <symbol-or-?> 0x<relocated-ip> +0x<offset-within-symbol>
/// ```
///
/// where the instruction pointer has been corrected for where the
/// executable image was actually loaded. `skip` hides that many innermost
/// frames without otherwise affecting the walk; callers use it to drop the
/// frames of their own instrumentation (e.g. an allocation-hook
/// trampoline).
///
/// Nothing is ever returned to the caller: failures are reported through
/// the `log` diagnostics channel, and a failure during setup means zero
/// lines are written. The caller is responsible for serializing access to
/// `sink` if multiple threads capture concurrently; the walk itself only
/// touches the calling thread's own register and stack state.
pub trait StackWalker {
    fn capture_trace(&self, sink: &mut dyn Write, skip: usize);
}

/// Returns the stack walker for the current build: unwinding-backed where
/// the platform supports it, the fixed sentinel everywhere else.
#[cfg(target_os = "linux")]
pub fn platform_walker() -> impl StackWalker {
    UnwindWalker
}

/// Returns the stack walker for the current build: unwinding-backed where
/// the platform supports it, the fixed sentinel everywhere else.
#[cfg(not(target_os = "linux"))]
pub fn platform_walker() -> impl StackWalker {
    SentinelWalker
}

/// Convenience entry point: captures through the build-selected walker.
pub fn capture_trace(sink: &mut dyn Write, skip: usize) {
    platform_walker().capture_trace(sink, skip)
}

/// The real thing: walks the live stack with libunwind, confined to the
/// calling thread.
#[cfg(target_os = "linux")]
pub struct UnwindWalker;

#[cfg(target_os = "linux")]
impl StackWalker for UnwindWalker {
    fn capture_trace(&self, sink: &mut dyn Write, skip: usize) {
        if let Err(e) = walk(sink, skip) {
            error!("Stack capture aborted: {}", e);
        }
    }
}

#[cfg(target_os = "linux")]
fn walk(sink: &mut dyn Write, mut skip: usize) -> Result<(), CaptureError> {
    // Re-queried on every capture rather than cached; see load_bias.
    // A missing bias isn't fatal, the trace just degrades to absolute
    // addresses.
    let bias = match load_bias() {
        Ok(bias) => bias,
        Err(e) => {
            warn!("{}", CaptureError::LoadBias(e));
            0
        }
    };

    // Snapshot the calling thread's register state and bind a cursor to it
    // for local unwinding. Failing here aborts the capture: there's no
    // meaningful partial trace without a cursor.
    get_context!(context);
    let mut cursor = Cursor::local(context).map_err(CaptureError::CursorInit)?;

    let mut ip: u64 = 0;
    loop {
        match cursor.step() {
            Ok(true) => (),
            Ok(false) => break,
            Err(e) => {
                debug!("Unwind step stopped the walk: {}", e);
                break;
            }
        }

        if skip > 0 {
            skip -= 1;
            continue;
        }

        // Best effort on a failed register read: keep whatever value we
        // had and let the zero-IP check decide.
        match cursor.register(RegNum::IP) {
            Ok(value) => ip = value,
            Err(e) => warn!("{}", CaptureError::RegisterRead(e)),
        }
        // A zero instruction pointer is the natural end of the stack.
        if ip == 0 {
            break;
        }
        let relocated = ip.wrapping_sub(bias);

        // The resolver works from the cursor, i.e. the original absolute
        // address, not the relocated one.
        let (symbol, offset) = match cursor.procedure_name() {
            Ok(name) => (name.name().to_string(), name.offset()),
            Err(e) if e == unwind::Error::NOINFO => {
                warn!("{}", CaptureError::SymbolUnavailable(relocated));
                (UNRESOLVED_MARKER.to_string(), 0)
            }
            Err(e) => {
                warn!("{}", CaptureError::SymbolResolution(relocated, e));
                (UNRESOLVED_MARKER.to_string(), 0)
            }
        };

        if let Err(e) = writeln!(sink, "{} 0x{:x} +0x{:x}", symbol, relocated, offset) {
            warn!("Couldn't write trace line to the sink: {}", e);
            break;
        }
    }

    Ok(())
}

/// Stand-in for builds without unwinding support. Emits the fixed
/// trace-unavailable sentinel that downstream tooling special-cases:
/// exactly `? -1 -1`, without a trailing newline.
pub struct SentinelWalker;

impl StackWalker for SentinelWalker {
    fn capture_trace(&self, sink: &mut dyn Write, _skip: usize) {
        if let Err(e) = write!(sink, "{} -1 -1", UNRESOLVED_MARKER) {
            warn!("Couldn't write trace sentinel to the sink: {}", e);
        }
    }
}
