//! HeartRisk command-line front-end.
//!
//! Loads the network once, then serves either a line-oriented chat session
//! on stdin, a single form submission, or a model summary.

use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use heartrisk::{
    AliasPolicy, ChatFrontend, FormFrontend, FormReport, FormSubmission, RiskConfig, RiskPipeline,
    VERSION,
};

/// Heart-disease risk estimation over a discrete Bayesian network
#[derive(Parser, Debug)]
#[command(name = "heartrisk", version, about)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, value_name = "PATH", help = "Network file to load")]
    model: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Reject unrecognized values instead of passing them to inference"
    )]
    strict_aliases: bool,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Verbose logging")]
    verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - errors only"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Chat session: one `key=value, key=value` message per line",
        long_about = "Reads messages from stdin and prints one reply per message.\n\n\
                      Example:\n  \
                      echo 'sex=male, age=middle-aged, ca=two' | heartrisk chat"
    )]
    Chat,

    #[command(about = "Assess one form submission given as JSON")]
    Form {
        #[arg(
            short,
            long,
            value_name = "FILE",
            default_value = "-",
            help = "JSON file with all thirteen fields, or '-' for stdin"
        )]
        input: String,
    },

    #[command(about = "Print the structure of the loaded network as JSON")]
    ModelInfo,
}

fn main() {
    let args = CliArgs::parse();

    let exit_code = match run(&args) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(args: &CliArgs) -> Result<()> {
    let mut config = RiskConfig::from_env().context("invalid configuration")?;
    if let Some(model) = &args.model {
        config.model_path.clone_from(model);
    }
    if args.strict_aliases {
        config.alias_policy = AliasPolicy::Strict;
    }
    init_logging(args, &config);

    debug!("heartrisk v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let pipeline = Arc::new(RiskPipeline::from_config(&config).with_context(|| {
        format!("failed to load model from {}", config.model_path.display())
    })?);

    match &args.command {
        Commands::Chat => run_chat(&pipeline),
        Commands::Form { input } => run_form(&pipeline, input),
        Commands::ModelInfo => {
            let info = pipeline.model_info().context("no model loaded")?;
            println!("{}", serde_json::to_string_pretty(info)?);
            Ok(())
        }
    }
}

fn run_chat(pipeline: &Arc<RiskPipeline>) -> Result<()> {
    let chat = ChatFrontend::new(Arc::clone(pipeline));
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(reply) = chat.reply(&line) {
            writeln!(stdout, "{reply}")?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn run_form(pipeline: &Arc<RiskPipeline>, input: &str) -> Result<()> {
    let raw = if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {input}"))?
    };

    let report = match serde_json::from_str::<FormSubmission>(&raw) {
        Ok(form) => FormFrontend::new(Arc::clone(pipeline)).submit(&form),
        Err(err) => FormReport::failed(format!("Invalid form submission: {err}")),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init_logging(args: &CliArgs, config: &RiskConfig) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        parse_level(&config.log_level)
    };

    let mut filter = EnvFilter::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        if let Ok(directive) = format!("heartrisk={level}").parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(io::stderr))
        .init();
}

fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{level_str}', defaulting to INFO. Valid levels: trace, debug, info, warn, error"
            );
            Level::INFO
        }
    }
}
