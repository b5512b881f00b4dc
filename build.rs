//! Build script for markalloc.
//!
//! Emits feature-combination hints for users integrating the crate.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_PARKING_LOT");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_LOG");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_DIAGNOSTICS");

    let log_enabled = env::var("CARGO_FEATURE_LOG").is_ok();
    let diagnostics_enabled = env::var("CARGO_FEATURE_DIAGNOSTICS").is_ok();
    let profile = env::var("PROFILE").unwrap_or_default();

    // Release builds emit no diagnostics unless opted in; remind users who
    // pulled in the log bridge but left the stderr channel disabled.
    if profile == "release" && log_enabled && !diagnostics_enabled {
        println!(
            "cargo:warning=markalloc: `log` feature is enabled but release builds \
             suppress stderr diagnostics; enable the `diagnostics` feature to keep both channels"
        );
    }
}
