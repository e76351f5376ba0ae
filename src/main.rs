//! solpack - configuration-driven solution packaging pipeline.
//!
//! Resolves configuration, drives the external build and packaging tools,
//! rewrites the solution manifest, and emits variant-specific archive
//! packages with proper error reporting.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let exit_code = match solpack::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    };

    process::exit(exit_code);
}
