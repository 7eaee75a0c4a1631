//! Exit codes of the `metaexport` binary. Part of the public contract.

use metaexport_core::host::HostError;
use metaexport_core::RecorderError;

/// Report written, or skipped by policy.
pub const SUCCESS: i32 = 0;
/// Missing or unwritable output, bad config, bad events, metadata errors.
pub const CONFIG_ERROR: i32 = 2;

pub fn for_error(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<HostError>() {
        return e.exit_code();
    }
    if let Some(e) = err.downcast_ref::<RecorderError>() {
        return e.exit_code();
    }
    CONFIG_ERROR
}
