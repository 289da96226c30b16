use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use timebucket_core::BucketConfig;
use timebucket_core::config::expand_path;

use super::Context;

pub fn run(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(p) => expand_path(p),
        None => BucketConfig::config_path()?,
    };

    let created = if path.exists() {
        false
    } else {
        BucketConfig::create_default_config(&path)?;
        true
    };

    let ctx = Context::resolve(Some(path.as_path()), None, None)?;
    let ranges: Vec<String> = ctx.config.boundaries()?.keys().map(String::from).collect();

    println!("{}", "Paths".bold());
    println!("  Config:     {}", display_path(&path, created));
    println!();
    println!("{}", "Effective settings".bold());
    println!("  Timezone:   {}", ctx.tz);
    println!("  Malformed:  {}", ctx.config.malformed);
    println!("  Ranges:     {}", ranges.join(", "));

    Ok(())
}

fn display_path(path: &Path, created: bool) -> String {
    if created {
        format!("{} {}", path.display(), "(created)".green())
    } else {
        path.display().to_string()
    }
}
