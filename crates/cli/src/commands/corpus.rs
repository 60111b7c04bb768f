//! Corpus Commands

use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use colored::Colorize;
use headerprobe_common::{RespType, Store};
use headerprobe_planner::{CorpusBuilder, CorpusReport};
use serde::Serialize;

use super::Context;
use crate::output::{print_list, print_success, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum CorpusCommands {
    /// Generate responses and store the new ones
    Build {
        /// Restrict to one label
        #[arg(short, long)]
        family: Option<String>,

        /// Which corpus to build
        #[arg(short, long, value_enum, default_value = "all")]
        kind: CorpusKind,
    },

    /// List buildable labels
    Families,

    /// Count stored responses per label and type
    Stats,

    /// Show one stored response
    Show {
        /// Response id
        id: i64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CorpusKind {
    /// Parsing corpus (mutations, families, multi-header families)
    Parsing,
    /// Debug and basic corpora
    Basic,
    /// Both
    All,
}

impl TableDisplay for CorpusReport {
    fn headers() -> Vec<&'static str> {
        vec!["Label", "Generated", "Unique", "Created"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.label.clone(),
            self.generated.to_string(),
            self.unique.to_string(),
            self.created.to_string(),
        ]
    }
}

#[derive(Serialize)]
struct LabelStats {
    label: String,
    debug: u64,
    basic: u64,
    parsing: u64,
}

impl TableDisplay for LabelStats {
    fn headers() -> Vec<&'static str> {
        vec!["Label", "Debug", "Basic", "Parsing"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.label.clone(),
            self.debug.to_string(),
            self.basic.to_string(),
            self.parsing.to_string(),
        ]
    }
}

#[derive(Serialize)]
struct LabelName {
    label: String,
}

impl TableDisplay for LabelName {
    fn headers() -> Vec<&'static str> {
        vec!["Label"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.label.clone()]
    }
}

pub fn execute(cmd: CorpusCommands, ctx: &Context) -> Result<()> {
    match cmd {
        CorpusCommands::Build { family, kind } => {
            let db = ctx.open_db()?;
            let builder = CorpusBuilder::new(&db, &ctx.config);
            let only = family.as_deref();

            let mut reports = Vec::new();
            if matches!(kind, CorpusKind::Basic | CorpusKind::All) {
                reports.extend(builder.build_basic(only).or_else(|e| skip_unknown(e, kind))?);
            }
            if matches!(kind, CorpusKind::Parsing | CorpusKind::All) {
                reports.extend(builder.build_parsing(only).or_else(|e| skip_unknown(e, kind))?);
            }
            if let (Some(label), true) = (only, reports.is_empty()) {
                anyhow::bail!("unknown label: {}", label);
            }

            let created: usize = reports.iter().map(|r| r.created).sum();
            print_list(&reports, ctx.format);
            print_success(&format!("{} new responses stored", created));
        }

        CorpusCommands::Families => {
            let db = ctx.open_db()?;
            let labels: Vec<LabelName> = CorpusBuilder::new(&db, &ctx.config)
                .labels()?
                .into_iter()
                .map(|label| LabelName { label })
                .collect();
            print_list(&labels, ctx.format);
        }

        CorpusCommands::Stats => {
            let db = ctx.open_db()?;
            let labels = CorpusBuilder::new(&db, &ctx.config).labels()?;
            let mut stats = Vec::with_capacity(labels.len());
            for label in labels {
                let count = |resp_type| db.count_responses(Some(&label), Some(resp_type));
                stats.push(LabelStats {
                    debug: count(RespType::Debug)?,
                    basic: count(RespType::Basic)?,
                    parsing: count(RespType::Parsing)?,
                    label,
                });
            }
            print_list(&stats, ctx.format);
        }

        CorpusCommands::Show { id } => {
            let db = ctx.open_db()?;
            let response = db.get_response(id)?.ok_or_else(|| headerprobe_common::Error::NotFound {
                kind: "response".to_string(),
                id: id.to_string(),
            })?;

            if ctx.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&response)?);
                return Ok(());
            }
            println!(
                "{} {} {} {}",
                format!("#{}", response.id).bold(),
                response.spec.label,
                response.spec.resp_type,
                response.spec.status_code
            );
            for (name, value) in &response.spec.headers {
                println!("  {}: {}", name.cyan(), value);
            }
            println!("  {}", response.digest.dimmed());
        }
    }

    Ok(())
}

/// With `--kind all`, a label may exist in only one of the two corpora
fn skip_unknown(
    err: headerprobe_planner::Error,
    kind: CorpusKind,
) -> Result<Vec<CorpusReport>, headerprobe_planner::Error> {
    match (err, kind) {
        (headerprobe_planner::Error::UnknownFamily(_), CorpusKind::All) => Ok(Vec::new()),
        (err, _) => Err(err),
    }
}
