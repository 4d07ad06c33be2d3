//! `coursemap join`: attach registry ids to crawled courses.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use coursemap_crawl::store::load_record_payloads;
use coursemap_resolve::{load_registry, save_joined, save_unmatched_report, EntityJoiner, JoinOptions};
use std::path::PathBuf;

#[derive(Args)]
pub struct JoinArgs {
    /// Crawled record file (JSON array).
    #[arg(long, default_value = "courses.json")]
    records: PathBuf,

    /// University registry (JSON array of `{id, name, ...}`).
    #[arg(long, default_value = "assets/data/universities.json")]
    registry: PathBuf,

    /// Joined output (`{"<output-field>": [...]}`).
    #[arg(short, long, default_value = "assets/data/courses.json")]
    out: PathBuf,

    /// Also write unmatched institution names, one per line.
    #[arg(long)]
    unmatched_report: Option<PathBuf>,

    /// JSON pointer to the institution name inside each record.
    #[arg(long, default_value = "/institution/title")]
    institution_pointer: String,

    /// Field added to matched records.
    #[arg(long, default_value = "universityId")]
    foreign_key: String,

    /// Top-level field of the joined document.
    #[arg(long, default_value = "courses")]
    output_field: String,
}

pub fn cmd_join(args: JoinArgs) -> Result<()> {
    // Both inputs are loaded before anything is written.
    let registry = load_registry(&args.registry)
        .with_context(|| format!("failed to load registry: {}", args.registry.display()))?;
    let records = load_record_payloads(&args.records)
        .with_context(|| format!("failed to load records: {}", args.records.display()))?;

    let options = JoinOptions {
        institution_pointer: args.institution_pointer,
        foreign_key: args.foreign_key,
        output_field: args.output_field,
    };
    let joiner = EntityJoiner::new(&registry, options);
    let outcome = joiner.join(&records);

    save_joined(&args.out, &outcome, &joiner.options().output_field)?;
    if let Some(path) = &args.unmatched_report {
        save_unmatched_report(path, &outcome.unmatched)?;
    }

    println!(
        "{} registry={} records={}",
        "Join".green().bold(),
        registry.len(),
        records.len()
    );
    println!(
        "  {} matched={} skipped(no institution)={}",
        "→".yellow(),
        outcome.matched.len(),
        outcome.skipped
    );
    println!("  {} {}", "→".cyan(), args.out.display());

    if !outcome.unmatched.is_empty() {
        println!(
            "\n{} ({}):",
            "Could not find a match for the following institutions".yellow(),
            outcome.unmatched.len()
        );
        for name in &outcome.unmatched {
            println!("- {name}");
        }
    }
    Ok(())
}
