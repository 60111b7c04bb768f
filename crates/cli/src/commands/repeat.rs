//! Repeat Command

use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use headerprobe_common::{RespType, ResultFilter};
use headerprobe_planner::{RepeatOptions, RepeatReconciler, RetryArtifact};
use serde::Serialize;
use std::path::PathBuf;

use super::Context;
use crate::output::{print_list, print_success, print_warning, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct RepeatArgs {
    /// Records required per test and browser
    #[arg(short, long)]
    pub threshold: Option<u32>,

    /// Timeout multiplier for retry URLs
    #[arg(short, long)]
    pub multiplier: Option<u32>,

    /// Keep the original response id range in retry URLs
    #[arg(long)]
    pub mult_resp_ids: bool,

    /// Only consider these browsers; they are also the expected browser set
    #[arg(short, long = "browser-id")]
    pub browser_ids: Vec<i64>,

    /// Only consider browsers on this OS
    #[arg(long)]
    pub os: Option<String>,

    /// Also reconcile debug-mode results
    #[arg(long)]
    pub include_debug: bool,

    /// Write the retry artifact (JSON) here
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Serialize)]
struct BrowserRepeat {
    browser_id: i64,
    urls: usize,
}

impl TableDisplay for BrowserRepeat {
    fn headers() -> Vec<&'static str> {
        vec!["Browser", "URLs to repeat"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.browser_id.to_string(), self.urls.to_string()]
    }
}

pub fn execute(args: RepeatArgs, ctx: &Context) -> Result<()> {
    let db = ctx.open_db()?;

    let mut options = RepeatOptions::from(&ctx.config.repeat);
    if let Some(threshold) = args.threshold {
        options.required_runs = threshold;
    }
    if let Some(multiplier) = args.multiplier {
        options.timeout_multiplier = multiplier;
    }
    options.mult_resp_ids |= args.mult_resp_ids;

    let mut filter = ResultFilter {
        os: args.os,
        ..ResultFilter::default()
    };
    if args.include_debug {
        filter.exclude_resp_types.retain(|t| *t != RespType::Debug);
    }
    if !args.browser_ids.is_empty() {
        filter.browser_ids = Some(args.browser_ids.clone());
        options.browser_ids = Some(args.browser_ids);
    }

    let outcome = RepeatReconciler::new(options).run(&db, &filter)?;

    for warning in &outcome.warnings {
        print_warning(&warning.to_string());
    }

    let summary: Vec<BrowserRepeat> = outcome
        .repeat
        .iter()
        .map(|(&browser_id, urls)| BrowserRepeat {
            browser_id,
            urls: urls.len(),
        })
        .collect();
    print_list(&summary, ctx.format);

    if ctx.format != OutputFormat::Json {
        println!(
            "{} identities, {} incomplete, {} excluded",
            outcome.identities.to_string().bold(),
            outcome.incomplete.to_string().yellow(),
            outcome.warnings.len().to_string().red()
        );
    }

    if let Some(path) = args.out {
        let artifact = RetryArtifact::from(&outcome);
        artifact
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        print_success(&format!(
            "{} retry URLs written to {}",
            artifact.total(),
            path.display()
        ));
    }

    Ok(())
}
