//! `quarry add` and `quarry all`: make entities searchable.

use quarry_model::TypeName;

use crate::root::open_project;
use crate::{AddArgs, GlobalArgs};

/// Runs the `quarry add` command.
pub fn run(args: &AddArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = open_project(global)?;
    let name = TypeName::new(args.type_name.as_str())?;
    let added = project.add(&name)?;
    if !global.quiet {
        if added {
            eprintln!("  Made {name} searchable");
        } else {
            eprintln!("  {name} is already searchable");
        }
    }
    Ok(0)
}

/// Runs the `quarry all` command.
pub fn run_all(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = open_project(global)?;
    let added = project.add_all()?;
    if !global.quiet {
        for name in &added {
            eprintln!("  Made {name} searchable");
        }
        eprintln!("  {} entities changed", added.len());
    }
    Ok(0)
}
