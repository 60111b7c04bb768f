//! Plan Command

use anyhow::{Context as _, Result};
use clap::Args;
use headerprobe_common::{RespType, Scheme, Store};
use headerprobe_planner::Synthesizer;
use std::path::PathBuf;

use super::Context;
use crate::output::{print_lines, print_success, print_warning};

#[derive(Args)]
pub struct PlanArgs {
    /// Response type to plan for (debug, basic, parsing)
    #[arg(short, long, default_value = "basic")]
    pub mode: RespType,

    /// Browser ids to plan for; all registered browsers when omitted
    #[arg(short, long = "browser-id")]
    pub browser_ids: Vec<i64>,

    /// Restrict to one scheme
    #[arg(short, long)]
    pub scheme: Option<Scheme>,

    /// Write URLs to this file (one per line) instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn execute(args: PlanArgs, ctx: &Context) -> Result<()> {
    let db = ctx.open_db()?;

    let browser_ids = if args.browser_ids.is_empty() {
        db.list_browsers()?
            .into_iter()
            .map(|b| b.id)
            .filter(|&id| id != headerprobe_common::UNKNOWN_BROWSER_ID)
            .collect()
    } else {
        args.browser_ids
    };
    if browser_ids.is_empty() {
        anyhow::bail!("no browsers registered; run `headerprobe browsers register` first");
    }

    let mut plan_config = ctx.config.plan.clone();
    if let Some(scheme) = args.scheme {
        plan_config.schemes = vec![scheme];
    }

    let outcome = Synthesizer::new(&db, &ctx.config.templates, &ctx.config.hosts, &plan_config)
        .plan(args.mode, &browser_ids);
    for error in &outcome.errors {
        print_warning(&error.to_string());
    }

    let urls = outcome.urls();
    match args.out {
        Some(path) => {
            let mut content = urls.join("\n");
            content.push('\n');
            std::fs::write(&path, content)
                .with_context(|| format!("writing {}", path.display()))?;
            print_success(&format!("{} URLs written to {}", urls.len(), path.display()));
        }
        None => print_lines(&urls, ctx.format),
    }

    Ok(())
}
