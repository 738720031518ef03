//! `quarry setup`: enable search support.

use quarry_search::SetupOptions;

use crate::root::open_project;
use crate::{GlobalArgs, SetupArgs};

/// Runs the `quarry setup` command.
///
/// Exits 0 after setting up, and also when search was already set up.
pub fn run(args: &SetupArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut project = open_project(global)?;
    let options = SetupOptions {
        host: args.host.clone(),
        port: args.port,
    };
    if !project.setup(&options)? {
        if !global.quiet {
            eprintln!("  Search support is already set up");
        }
        return Ok(0);
    }
    if !global.quiet {
        let target = if options.is_embedded() {
            "an embedded node".to_string()
        } else {
            format!("{}:{}", args.host.as_deref().unwrap_or_default(), args.port)
        };
        eprintln!("  Set up search support using {target}");
    }
    Ok(0)
}
