//! Loads a conf.d style configuration and prints the merged view as JSON.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use confd::config::RawSection;
use confd::{Configuration, Section};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dump-config")]
#[command(about = "Print the merged view of a primary config file and its conf.d fragments")]
#[command(version)]
struct Cli {
    /// Name of the main section
    #[arg(short, long)]
    name: String,

    /// Primary configuration file
    path: PathBuf,

    /// Fragment directory
    #[arg(short = 'd', long)]
    confd_path: Option<PathBuf>,

    /// Only merge fragments with this extension
    #[arg(short = 'e', long)]
    conf_ext: Option<String>,

    /// Key in the main section that overrides the fragment directory
    #[arg(long)]
    path_from_main: Option<String>,

    /// Convert numeric-looking values in non-main sections to numbers
    #[arg(long)]
    numbers: bool,

    /// Print only this section
    #[arg(short, long)]
    section: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut builder = Configuration::builder(&cli.name, &cli.path);
    if let Some(dir) = &cli.confd_path {
        builder = builder.confd_path(dir);
    }
    if let Some(ext) = &cli.conf_ext {
        builder = builder.conf_ext(ext);
    }
    if let Some(key) = &cli.path_from_main {
        builder = builder.path_from_main(key);
    }
    if cli.numbers {
        builder = builder.section_parser(numbers);
    }

    let conf = builder.build()?;
    info!(
        name = conf.name(),
        sections = conf.sections().len(),
        "configuration loaded"
    );

    let view = conf.raw(cli.section.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn numbers(options: RawSection) -> Result<Section> {
    Ok(options
        .into_iter()
        .map(|(key, value)| {
            let converted = if let Ok(int) = value.parse::<i64>() {
                Value::from(int)
            } else if let Ok(float) = value.parse::<f64>() {
                Value::from(float)
            } else {
                Value::String(value)
            };
            (key, converted)
        })
        .collect())
}
