//! `quarry generate`: write generated members and search views.

use crate::root::open_project;
use crate::GlobalArgs;

/// Runs the `quarry generate` command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = open_project(global)?;
    let report = project.generate()?;
    if !global.quiet {
        for path in &report.written {
            eprintln!("     Wrote {}", path.display());
        }
        for path in &report.removed {
            eprintln!("   Removed {}", path.display());
        }
        eprintln!(
            "  {} written, {} up to date, {} search views",
            report.written.len(),
            report.unchanged,
            report.views.len()
        );
    }
    Ok(0)
}
