//! Command line argument parsing and validation.

use crate::envctx::CiMode;
use crate::pipeline::BuildConfiguration;
use crate::publish::VariantSelection;
use clap::Parser;
use std::path::PathBuf;

/// Configuration-driven solution packaging pipeline
#[derive(Parser, Debug)]
#[command(
    name = "solpack",
    version,
    about = "Packages a versioned component into variant-specific solution archives",
    long_about = "Runs the staged packaging pipeline: validates inputs, bumps the component \
version with rollover, builds, rewrites the solution manifest from configuration, and emits \
size-validated archive packages for each requested variant.

Usage:
  solpack --config solution.cfg --package-variant both
  solpack --name Acme --publisher-prefix acme --build-configuration debug

Exit code 0 = all stages completed; warnings never fail the run."
)]
pub struct Args {
    /// Path to the pipeline configuration file
    #[arg(short, long, value_name = "PATH", default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Override the solution unique name (solution.name)
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Override the publisher unique name (publisher.name)
    #[arg(long, value_name = "NAME")]
    pub publisher_name: Option<String>,

    /// Override the publisher customization prefix (publisher.prefix)
    #[arg(long, value_name = "PREFIX")]
    pub publisher_prefix: Option<String>,

    /// Remove prior output artifacts before rebuilding
    #[arg(long, value_name = "BOOL", default_value_t = true, action = clap::ArgAction::Set)]
    pub clean: bool,

    /// Build configuration forwarded to the build tool
    #[arg(long, value_enum, default_value_t = BuildConfiguration::Release)]
    pub build_configuration: BuildConfiguration,

    /// Package variants to produce
    #[arg(long, value_enum, default_value_t = VariantSelection::Unmanaged)]
    pub package_variant: VariantSelection,

    /// Execution context for output formatting
    #[arg(long, value_enum, default_value_t = CiMode::Auto)]
    pub ci_mode: CiMode,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if !crate::config::is_identifier(name) {
                return Err(format!("--name {name:?} is not a valid identifier"));
            }
        }
        if let Some(name) = &self.publisher_name {
            if !crate::config::is_identifier(name) {
                return Err(format!("--publisher-name {name:?} is not a valid identifier"));
            }
        }
        if let Some(prefix) = &self.publisher_prefix {
            if !crate::config::is_identifier(prefix) {
                return Err(format!("--publisher-prefix {prefix:?} is not a valid identifier"));
            }
        }
        Ok(())
    }

    /// Configuration overrides supplied on the command line.
    ///
    /// Merged on top of the parsed configuration; the original parse is
    /// never mutated.
    pub fn overrides(&self) -> Vec<(String, String, String)> {
        let mut overrides = Vec::new();
        if let Some(name) = &self.name {
            overrides.push(("solution".into(), "name".into(), name.clone()));
        }
        if let Some(name) = &self.publisher_name {
            overrides.push(("publisher".into(), "name".into(), name.clone()));
        }
        if let Some(prefix) = &self.publisher_prefix {
            overrides.push(("publisher".into(), "prefix".into(), prefix.clone()));
        }
        overrides
    }
}
