use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tlbgen_core::emit::{EmitOptions, EmptySections};
use tlbgen_core::generator::{Generator, GeneratorOptions};
use tlbgen_core::model::FailurePolicy;
use tlbgen_core::TypeLib;
use tlbgen_utils::{
    error, info, init_logging, init_logging_with_level, GeneratorSettings, LogFormat, LogLevel, MemberErrorMode,
    SectionMode,
};

/// Generate C++ bindings from published type library metadata.
#[derive(Parser, Debug)]
#[command(name = "tlbgen")]
#[command(version)]
#[command(about = "Generate C++ bindings from published type library metadata", long_about = None)]
struct Cli
{
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Emit headers and sources for one or more libraries
    Generate
    {
        /// Library manifests to generate, in order
        #[arg(required = true)]
        libraries: Vec<PathBuf>,
        /// Output directory (default: TLBGEN_OUT_DIR, then the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Leave sections without entities out of the generated files
        #[arg(long, default_value_t = false)]
        suppress_empty_sections: bool,
        /// Log and skip members that fail to decode instead of aborting the library
        #[arg(long, default_value_t = false)]
        skip_failed_members: bool,
        /// Continue with the remaining libraries after one fails
        #[arg(long, default_value_t = false)]
        keep_going: bool,
    },
    /// Print the decoded model of a library
    Inspect
    {
        /// Library manifest to inspect
        library: PathBuf,
        /// Print the whole model as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main()
{
    let cli = Cli::parse();

    // Defaults to INFO level and Pretty format if neither flag nor env is set
    let logging = match cli.log_level {
        Some(level) => init_logging_with_level(level, log_format()),
        None => init_logging(),
    };
    if let Err(e) = logging {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(1);
    }

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn log_format() -> LogFormat
{
    std::env::var(tlbgen_utils::logging::LOG_FORMAT_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LogFormat::Pretty)
}

fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>>
{
    match cli.command {
        Commands::Generate {
            libraries,
            out,
            suppress_empty_sections,
            skip_failed_members,
            keep_going,
        } => {
            let mut settings = GeneratorSettings::from_env()?;
            if let Some(out) = out {
                settings.out_dir = out;
            }
            if suppress_empty_sections {
                settings.sections = SectionMode::Suppress;
            }
            if skip_failed_members {
                settings.on_member_error = MemberErrorMode::Skip;
            }

            let generator = Generator::new(generator_options(&settings, keep_going));
            let report = generator.generate_all(&libraries, &settings.out_dir);
            for path in report.files.iter() {
                println!("{}", path.display());
            }
            info!(
                files = report.files.headers.len() + report.files.sources.len(),
                failed = report.failures.len(),
                "generation finished"
            );

            match report.failures.as_slice() {
                [] => Ok(()),
                [(path, e)] => Err(format!("{}: {e}", path.display()).into()),
                many => {
                    for (path, e) in many {
                        error!(library = %path.display(), "{e}");
                    }
                    Err(format!("{} libraries failed", many.len()).into())
                }
            }
        }
        Commands::Inspect { library, json } => {
            let settings = GeneratorSettings::from_env()?;
            let generator = Generator::new(generator_options(&settings, false));
            let lib = TypeLib::open(&library)?;
            let model = generator.describe(&lib)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&model)?);
            } else {
                let (enums, records, interfaces) = model.counts();
                println!("{} {}.{} {{{}}}", model.name, model.version.0, model.version.1, model.library_id());
                println!("  Enums: {enums}");
                println!("  Structs: {records}");
                println!("  Interfaces: {interfaces}");
                for interface in &model.interfaces {
                    let kind = if interface.dual { "dual" } else { "dispatch" };
                    println!("    {} ({kind}, {} methods)", interface.name, interface.methods.len());
                }
            }
            Ok(())
        }
    }
}

fn generator_options(settings: &GeneratorSettings, keep_going: bool) -> GeneratorOptions
{
    GeneratorOptions {
        emit: EmitOptions {
            sections: match settings.sections {
                SectionMode::Render => EmptySections::Render,
                SectionMode::Suppress => EmptySections::Suppress,
            },
        },
        on_member_error: match settings.on_member_error {
            MemberErrorMode::Abort => FailurePolicy::Abort,
            MemberErrorMode::Skip => FailurePolicy::Skip,
        },
        keep_going,
    }
}
