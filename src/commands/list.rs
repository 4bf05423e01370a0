//! List site content

use anyhow::{anyhow, Result};

use crate::content::{Collection, ContentRecord};
use crate::Site;

/// List the documents of one collection, or of all of them
pub fn run(site: &Site, collection: Option<&str>, ids_only: bool) -> Result<()> {
    let content = site.content()?;

    let collections: Vec<&Collection> = match collection {
        Some(name) => vec![content.collection(name).ok_or_else(|| unknown_collection(site, name))?],
        None => content.collections.iter().collect(),
    };

    for collection in collections {
        if ids_only {
            let ids = collection.list_ids()?;
            println!("{} ({}):", collection.name(), ids.len());
            for params in ids {
                println!("  {}", params.id);
            }
        } else {
            let records = collection.list_summaries()?;
            println!("{} ({}):", collection.name(), records.len());
            for record in &records {
                println!("  {}", summary_line(record));
            }
        }
    }

    Ok(())
}

/// `date - title [id]`
fn summary_line(record: &ContentRecord) -> String {
    format!(
        "{} - {} [{}]",
        record.date().unwrap_or("----------"),
        record.title().unwrap_or("(untitled)"),
        record.id
    )
}

pub(crate) fn unknown_collection(site: &Site, name: &str) -> anyhow::Error {
    let available: Vec<&str> = site.config.collections.iter().map(|c| c.name.as_str()).collect();
    anyhow!(
        "Unknown collection: {}. Available: {}",
        name,
        available.join(", ")
    )
}
