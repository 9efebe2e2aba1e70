//! Process exit-code mapping.

use threatgraph_core::ThreatGraphError;

/// Success.
pub const EXIT_OK: i32 = 0;
/// Ordinary failure.
pub const EXIT_ERROR: i32 = 1;
/// The persisted index cannot be trusted; rebuild required.
pub const EXIT_CORRUPTION: i32 = 2;

/// Map an error to its process exit code and surface it on stderr.
pub fn report(err: &ThreatGraphError) -> i32 {
    tracing::error!(error = %err, "command failed");
    eprintln!("error: {err}");
    if err.is_corruption() {
        EXIT_CORRUPTION
    } else {
        EXIT_ERROR
    }
}
