//! `livepage render`: one annotated snapshot to stdout.

use std::io::Write;

use anyhow::Result;

use crate::config::LiveConfig;
use crate::core::DocumentName;
use crate::document::{FsStore, PageStore, annotate, strip_generated_ids};

pub fn render_page(config: &LiveConfig, page: &str, strip_ids: bool) -> Result<()> {
    let page = render_to_string(config, page, strip_ids)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{page}")?;
    Ok(())
}

fn render_to_string(config: &LiveConfig, page: &str, strip_ids: bool) -> Result<String> {
    let name = DocumentName::parse(page)?;
    let content = FsStore::new(config.pages_dir()).read(&name)?;

    let mut doc = annotate(&content);
    if strip_ids {
        strip_generated_ids(&mut doc);
    }
    Ok(doc.to_page())
}
