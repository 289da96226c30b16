use std::path::Path;

use anyhow::Result;
use log::info;
use timebucket_core::MalformedPolicy;

use super::Context;
use crate::input::read_notifications;
use crate::render::{Render, View, render_json};

pub fn run(ctx: &Context, input: Option<&Path>, malformed: Option<MalformedPolicy>, json: bool) -> Result<()> {
    let bucketer = ctx.config.bucketer()?;
    let labels = ctx.config.labels();
    let policy = malformed.unwrap_or(ctx.config.malformed);

    let notifications = read_notifications(input)?;
    info!(
        "event=group_start module=cli items={} policy={}",
        notifications.len(),
        policy
    );

    let grouping = bucketer.group_fallible(&notifications, &ctx.local_reference(), policy, |n| {
        n.created_at_in(&ctx.tz)
    });

    let view = View {
        labels: &labels,
        tz: ctx.tz,
        reference: ctx.reference,
    };

    if json {
        println!("{}", render_json(&grouping, &view)?);
    } else {
        println!("{}", grouping.render(&view));
    }

    Ok(())
}
