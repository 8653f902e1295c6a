use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sdgen::{
    describe_to_json, generate_with, load_schema, to_xsd, CompilerError, EmitterOptions, Instance, Language,
    SchemaError, WireFormat,
};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Compiler(#[from] CompilerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot tell the format of {0}; pass --from")]
    UnknownInputFormat(PathBuf),
}

#[derive(Parser)]
#[command(name = "sdgen")]
#[command(about = "Generate typed bindings, XSD and data conversions from sdgen record schemas", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate bindings for one target language
    Generate {
        /// Schema description document (`.json`, `.yaml` or `.yml`)
        #[arg(short, long)]
        schema: PathBuf,

        /// Target language: cpp, rust, java, go, csharp or swift
        #[arg(short, long)]
        language: Language,

        /// Root record (defaults to the document's root)
        #[arg(short, long)]
        root: Option<String>,

        /// Output file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Go package name
        #[arg(long, default_value = "model")]
        go_package: String,

        /// Java package declaration
        #[arg(long)]
        java_package: Option<String>,

        /// C# namespace
        #[arg(long)]
        cs_namespace: Option<String>,
    },

    /// Generate the XSD for a record's XML form
    Xsd {
        #[arg(short, long)]
        schema: PathBuf,

        #[arg(short, long)]
        root: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a data file against a record and rewrite it in another format
    Convert {
        #[arg(short, long)]
        schema: PathBuf,

        #[arg(short, long)]
        root: Option<String>,

        /// Input data file
        #[arg(short, long)]
        input: PathBuf,

        /// Input format (defaults to the input file's extension)
        #[arg(long)]
        from: Option<WireFormat>,

        /// Output format: json, yaml or xml
        #[arg(long)]
        to: WireFormat,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the normalized description document as JSON
    Describe {
        #[arg(short, long)]
        schema: PathBuf,

        #[arg(short, long)]
        root: Option<String>,
    },

    /// List target languages and the wire formats their bindings support
    Languages,
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn emit(text: &str, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            fs::write(path, text)?;
            info!(path = %path.display(), bytes = text.len(), "wrote output");
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            schema,
            language,
            root,
            output,
            go_package,
            java_package,
            cs_namespace,
        } => {
            let record = load_schema(&schema, root.as_deref())?;
            let options = EmitterOptions {
                go_package,
                java_package,
                cs_namespace,
            };
            let source = generate_with(&record, language, &options);
            emit(&source, output.as_deref())
        }

        Commands::Xsd { schema, root, output } => {
            let record = load_schema(&schema, root.as_deref())?;
            emit(&to_xsd(&record), output.as_deref())
        }

        Commands::Convert {
            schema,
            root,
            input,
            from,
            to,
            output,
        } => {
            let record = load_schema(&schema, root.as_deref())?;
            let from = match from {
                Some(format) => format,
                None => WireFormat::from_path(&input).ok_or_else(|| CliError::UnknownInputFormat(input.clone()))?,
            };
            let instance = Instance::read_file(&record, from, &input)?;
            info!(record = record.name(), from = %from, to = %to, "converting");
            emit(&instance.to_format(to)?, output.as_deref())
        }

        Commands::Describe { schema, root } => {
            let record = load_schema(&schema, root.as_deref())?;
            emit(&describe_to_json(&record)?, None)
        }

        Commands::Languages => {
            for language in Language::ALL {
                let emitter = language.emitter(&EmitterOptions::default());
                let formats: Vec<&str> = emitter.formats().iter().map(|f| f.name()).collect();
                println!("{:<8} .{:<6} {}", language.name(), language.extension(), formats.join(", "));
            }
            Ok(())
        }
    }
}
