use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use xml2xlsx::config::MappingConfig;
use xml2xlsx::{Result, ToolError, convert, template};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert(args) => {
            init_logging(args.quiet)?;
            execute_convert(args)
        }
        Command::Template(args) => {
            init_logging(args.quiet)?;
            execute_template(args)
        }
    }
}

fn init_logging(quiet: bool) -> Result<()> {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn execute_convert(args: ConvertArgs) -> Result<()> {
    if let Some(input) = &args.input {
        if !input.exists() {
            return Err(ToolError::MissingInput(input.clone()));
        }
    }
    if let Some(output) = &args.output {
        ensure_writable(output, args.force)?;
    }

    match (&args.input, &args.output) {
        (Some(input), Some(output)) => convert::xml_to_excel(input, &args.config, output),
        (input, output) => {
            let config = MappingConfig::load(&args.config)?;
            let xml = match input {
                Some(path) => fs::read(path)?,
                None => {
                    let mut buffer = Vec::new();
                    io::stdin().read_to_end(&mut buffer)?;
                    buffer
                }
            };
            let bytes = convert::xml_bytes_to_excel(xml, &config)?;
            match output {
                Some(path) => fs::write(path, bytes)?,
                None => {
                    let mut stdout = io::stdout().lock();
                    stdout.write_all(&bytes)?;
                    stdout.flush()?;
                }
            }
            Ok(())
        }
    }
}

fn execute_template(args: TemplateArgs) -> Result<()> {
    ensure_writable(&args.output, args.force)?;
    let config = template::generate_config_from_files(&args.samples)?;
    template::write_template(&config, &args.output)
}

fn ensure_writable(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(ToolError::OutputExists(output.to_path_buf()));
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Flatten hierarchical XML documents into relational Excel workbooks."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an XML document into a workbook using a mapping file.
    Convert(ConvertArgs),
    /// Generate a starter mapping file from sample XML documents.
    Template(TemplateArgs),
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Input XML file; standard input when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Mapping file (TOML, or JSON with a `.json` extension).
    #[arg(short, long)]
    config: PathBuf,

    /// Output workbook; standard output when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite the output file if it already exists.
    #[arg(short, long)]
    force: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct TemplateArgs {
    /// Path of the mapping file to write.
    #[arg(short, long)]
    output: PathBuf,

    /// Overwrite the output file if it already exists.
    #[arg(short, long)]
    force: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,

    /// Sample XML documents.
    #[arg(required = true)]
    samples: Vec<PathBuf>,
}
