//! `restyle`: patch, compile and preview JSX components

mod config;
mod watch;

use std::env;
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use eyre::{Result, eyre};
use facet::Facet;
use facet_args as args;
use owo_colors::OwoColorize;
use restyle::{ElementProperties, OxcCompiler, SourceCompiler};
use tracing_subscriber::prelude::*;

use crate::config::ResolvedConfig;

/// Patch command - write an edited element back into a source file
#[derive(Facet, Debug)]
struct PatchArgs {
    /// Component source file
    #[facet(args::positional)]
    file: String,

    /// Element as it was selected, as JSON
    #[facet(args::named, args::short = 't')]
    target: String,

    /// Element with the edited properties, as JSON
    #[facet(args::named, args::short = 'u')]
    update: String,

    /// Overwrite the file instead of printing the result
    #[facet(args::named, args::short = 'w')]
    write: bool,
}

/// Compile command - print the code the preview would evaluate
#[derive(Facet, Debug)]
struct CompileArgs {
    /// Component source file
    #[facet(args::positional)]
    file: String,

    /// Stamp data-source-id on every intrinsic element
    #[facet(args::named)]
    instrument: bool,
}

/// Watch command - re-render the preview whenever the file changes
#[derive(Facet, Debug)]
struct WatchArgs {
    /// Component source file
    #[facet(args::positional)]
    file: String,
}

#[derive(Facet, Debug)]
#[repr(u8)]
enum Command {
    /// Apply a property edit to a source file
    Patch(PatchArgs),
    /// Compile a component for execution
    Compile(CompileArgs),
    /// Live preview in the terminal
    Watch(WatchArgs),
}

#[derive(Facet, Debug)]
struct Args {
    #[facet(args::subcommand)]
    command: Command,
}

fn init_tracing() {
    let filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();
    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();
}

fn parse_args() -> Result<Command, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let args_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();

    let parsed: Args = facet_args::from_slice(&args_refs).map_err(|e| {
        eprintln!("{:?}", miette::Report::new(e));
        "Failed to parse arguments".to_string()
    })?;

    Ok(parsed.command)
}

fn main() -> ExitCode {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .build(),
        )
    }))
    .ok();

    let cmd = match parse_args() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing();

    let result = ResolvedConfig::discover().and_then(|config| match cmd {
        Command::Patch(args) => patch(&config, args),
        Command::Compile(args) => compile(&config, args),
        Command::Watch(args) => watch::run(&config, Utf8PathBuf::from(args.file)),
    });

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn parse_element(json: &str, what: &str) -> Result<ElementProperties> {
    facet_json::from_str(json).map_err(|e| eyre!("Invalid {} element: {}", what, e))
}

fn patch(config: &ResolvedConfig, args: PatchArgs) -> Result<ExitCode> {
    let source = fs::read_to_string(&args.file)?;
    let target = parse_element(&args.target, "target")?;
    let update = parse_element(&args.update, "update")?;

    let chain = config.patch_chain(Arc::new(OxcCompiler::new()));
    let result = chain.run(&source, &target, &update);

    let Some(code) = result.code.as_deref().filter(|_| result.success) else {
        for failure in &result.failures {
            eprintln!(
                "  {} {}",
                failure.strategy.yellow(),
                failure.error.dimmed()
            );
        }
        eprintln!(
            "{}: {}",
            "error".red().bold(),
            result.error.as_deref().unwrap_or("patch failed")
        );
        return Ok(ExitCode::FAILURE);
    };

    let strategy = result.strategy.as_deref().unwrap_or_default();
    if args.write {
        if code != source {
            fs::write(&args.file, code)?;
        }
        eprintln!("{} {} ({})", "patched".green().bold(), args.file, strategy);
    } else {
        print!("{code}");
        tracing::info!(%strategy, "patched");
    }
    Ok(ExitCode::SUCCESS)
}

fn compile(config: &ResolvedConfig, args: CompileArgs) -> Result<ExitCode> {
    let source = fs::read_to_string(&args.file)?;
    let compiler = OxcCompiler::new();
    let compiled = compiler.compile_for_execution(&source, &config.compile_options(args.instrument))?;

    println!("{}", compiled.code);
    match compiled.component {
        Some(component) => {
            eprintln!("{} <{} />", "component".green().bold(), component);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!(
                "{}: no component found (tried {})",
                "warning".yellow().bold(),
                config.component_names.join(", ")
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
