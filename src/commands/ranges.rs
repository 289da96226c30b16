use anyhow::Result;
use owo_colors::OwoColorize;

use super::Context;
use crate::render::{Render, View};

pub fn run(ctx: &Context) -> Result<()> {
    let boundaries = ctx.config.boundaries()?;
    let labels = ctx.config.labels();
    let view = View {
        labels: &labels,
        tz: ctx.tz,
        reference: ctx.reference,
    };

    let local = ctx.local_reference();
    println!(
        "{}",
        format!("Ranges relative to {} ({})", local.format("%Y-%m-%d %H:%M"), ctx.tz).bold()
    );

    for range in boundaries.resolve(&local) {
        println!("{}", range.render(&view));
    }

    Ok(())
}
