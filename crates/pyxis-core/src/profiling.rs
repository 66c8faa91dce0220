//! Profiling hooks based on the `puffin` crate.
//!
//! Scopes are recorded only once [`enable_scopes`] (or [`init_profiling`]) has
//! turned them on, so instrumented code costs a single atomic load otherwise.

pub use puffin::{GlobalProfiler, profile_function, profile_scope};

#[cfg(feature = "profiling")]
use std::sync::OnceLock;

/// Address the puffin HTTP server listens on.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8585";

#[cfg(feature = "profiling")]
static PROFILING_SERVER: OnceLock<puffin_http::Server> = OnceLock::new();

/// Turn puffin scope collection on or off.
#[inline]
pub fn enable_scopes(enabled: bool) {
    puffin::set_scopes_on(enabled);
}

/// Enable scopes and serve them to `puffin_viewer` over HTTP.
///
/// # Example
/// ```no_run
/// pyxis_core::profiling::init_profiling();
/// ```
#[cfg(feature = "profiling")]
pub fn init_profiling() {
    enable_scopes(true);

    match puffin_http::Server::new(DEFAULT_SERVER_ADDR) {
        Ok(server) => {
            tracing::info!("Puffin profiler server started on http://{DEFAULT_SERVER_ADDR}");
            let _ = PROFILING_SERVER.set(server);
        }
        Err(e) => {
            tracing::error!("Failed to start puffin server: {}", e);
        }
    }
}

/// Mark a frame boundary for the profiler.
#[inline]
pub fn new_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}
