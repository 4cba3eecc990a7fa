//! `repochat tools`: print the tool catalog.

use repochat_core::render_catalog;
use std::path::PathBuf;

pub fn run(root: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(root, None)?;
    let registry = super::build_registry(&config)?;

    println!("Tools (sandbox root: {}):", registry.root().display());
    println!("{}", render_catalog(&registry.list()));
    Ok(())
}
