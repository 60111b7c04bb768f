//! Browser Commands

use anyhow::Result;
use clap::Subcommand;
use headerprobe_common::{Browser, Store};
use serde::Serialize;

use super::Context;
use crate::output::{print_info, print_list, print_success, TableDisplay};

#[derive(Subcommand)]
pub enum BrowserCommands {
    /// Register the browsers listed in the configuration
    Register,

    /// List registered browsers
    List,
}

/// Browser display wrapper for serialization
#[derive(Serialize)]
pub struct BrowserDisplay {
    pub id: i64,
    pub name: String,
    pub version: String,
    pub os: String,
    pub headless_mode: String,
    pub automation_mode: String,
}

impl From<Browser> for BrowserDisplay {
    fn from(browser: Browser) -> Self {
        Self {
            id: browser.id,
            name: browser.entry.name,
            version: browser.entry.version,
            os: browser.entry.os,
            headless_mode: browser.entry.headless_mode.as_str().to_string(),
            automation_mode: browser.entry.automation_mode.as_str().to_string(),
        }
    }
}

impl TableDisplay for BrowserDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name", "Version", "OS", "Headless", "Automation"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.version.clone(),
            self.os.clone(),
            self.headless_mode.clone(),
            self.automation_mode.clone(),
        ]
    }
}

pub fn execute(cmd: BrowserCommands, ctx: &Context) -> Result<()> {
    let db = ctx.open_db()?;

    match cmd {
        BrowserCommands::Register => {
            if ctx.config.browsers.is_empty() {
                print_info("No browsers configured");
                return Ok(());
            }
            let mut created = 0;
            for entry in &ctx.config.browsers {
                let (id, new) = db.get_or_create_browser(entry)?;
                if new {
                    created += 1;
                }
                tracing::debug!("Browser {} {} on {} has id {}", entry.name, entry.version, entry.os, id);
            }
            print_success(&format!(
                "{} browsers registered ({} new)",
                ctx.config.browsers.len(),
                created
            ));
        }

        BrowserCommands::List => {
            let browsers: Vec<BrowserDisplay> = db
                .list_browsers()?
                .into_iter()
                .map(BrowserDisplay::from)
                .collect();
            print_list(&browsers, ctx.format);
        }
    }

    Ok(())
}
