use std::path::PathBuf;

use clap::{App, Arg, ArgMatches};
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use crate::compiler::ErrorClass;
use crate::config::{Config, ConfigError, Emit, LogLevel};
use crate::diagnostics::TracingConfig;

// Exit Codes for different types of errors
pub const ERR_SEMANTIC_ERROR: i32 = 1;
pub const ERR_SYNTAX_ERROR: i32 = 3;
pub const ERR_GRAMMAR_ERROR: i32 = 5;
pub const ERR_IO_ERROR: i32 = 6;
pub const ERR_COMPILER_PANIC: i32 = 101;

pub fn exit_code(class: ErrorClass) -> i32 {
    match class {
        ErrorClass::Grammar => ERR_GRAMMAR_ERROR,
        ErrorClass::Syntax => ERR_SYNTAX_ERROR,
        ErrorClass::Semantic => ERR_SEMANTIC_ERROR,
        ErrorClass::Internal => ERR_COMPILER_PANIC,
    }
}

pub fn configure_cli() -> clap::App<'static, 'static> {
    let app = App::new("OpenDSPL Compiler")
        .version("0.1.0")
        .about("Checks OpenDSPL programs and assembles them into a program description for code generators")
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .takes_value(true)
                .required(true)
                .help("Source code file to compile"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .help("File the assembled program is written to. Defaults to stdout"),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .takes_value(true)
                .help("YAML file with compiler settings. Command line flags override its values"),
        )
        .arg(
            Arg::with_name("grammar")
                .short("g")
                .long("grammar")
                .takes_value(true)
                .help("Grammar description to parse with instead of the builtin grammar"),
        )
        .arg(
            Arg::with_name("root")
                .long("root")
                .takes_value(true)
                .help("Grammar rule the input is parsed from"),
        )
        .arg(
            Arg::with_name("emit")
                .long("emit")
                .possible_values(&["none", "json", "yaml"])
                .takes_value(true)
                .help("Format the assembled program is written in"),
        )
        .arg(
            Arg::with_name("log-level")
                .long("log-level")
                .possible_values(&["off", "error", "warn", "info", "debug", "trace"])
                .takes_value(true)
                .help("Sets the level of the compiler's log messages"),
        )
        .arg(
            Arg::with_name("trace-lexer")
                .long("trace-lexer")
                .takes_value(true)
                .help("Prints out a trace of the tokens the scanner produces.  Takes a line range such as `all`, `4`, `2:9`, `:9` or `2:`")
        )
        .arg(
            Arg::with_name("trace-parser")
                .long("trace-parser")
                .takes_value(true)
                .help("Prints out a trace of all the rules the parser tries on the given lines.
                This is for debugging the grammar when adding new syntactical elements.")
        )
        .arg(
            Arg::with_name("trace-semantics")
                .long("trace-semantics")
                .takes_value(true)
                .help("Traces the analysis of parse nodes on the given lines")
        );
    app
}

pub fn get_input(args: &ArgMatches) -> Option<PathBuf> {
    args.value_of("input").map(PathBuf::from)
}

pub fn get_output(args: &ArgMatches) -> Option<PathBuf> {
    args.value_of("output").map(PathBuf::from)
}

/// Reads the configuration file named on the command line, if any, and
/// applies the command line flags on top of it.
pub fn get_config(args: &ArgMatches) -> Result<Config, ConfigError> {
    let mut config = match args.value_of("config") {
        Some(path) => Config::read(&PathBuf::from(path))?,
        None => Config::default(),
    };

    if let Some(grammar) = args.value_of("grammar") {
        config.grammar = Some(grammar.into());
    }
    if let Some(root) = args.value_of("root") {
        config.root = root.into();
    }
    if let Some(emit) = args.value_of("emit").and_then(|e| e.parse::<Emit>().ok()) {
        config.emit = emit;
    }
    if let Some(level) = args
        .value_of("log-level")
        .and_then(|l| l.parse::<LogLevel>().ok())
    {
        config.log_level = level;
    }

    if let Some(trace) = get_tracing(args, "trace-lexer") {
        config.tracing.lexer = trace;
    }
    if let Some(trace) = get_tracing(args, "trace-parser") {
        config.tracing.parser = trace;
    }
    if let Some(trace) = get_tracing(args, "trace-semantics") {
        config.tracing.semantics = trace;
    }

    Ok(config)
}

fn get_tracing(args: &ArgMatches, name: &str) -> Option<TracingConfig> {
    args.value_of(name).map(|range| match range.parse() {
        Ok(config) => config,
        Err(msg) => {
            log::warn!("Ignoring --{}: {}", name, msg);
            TracingConfig::Off
        }
    })
}

/// Installs the terminal logger.  Tracing a stage needs trace level logging,
/// so any stage tracing raises the level to trace.
pub fn configure_logging(config: &Config) -> Result<(), log::SetLoggerError> {
    let tracing = config.tracing;
    let level = if tracing.lexer.is_off() && tracing.parser.is_off() && tracing.semantics.is_off() {
        config.log_level.to_filter()
    } else {
        log::LevelFilter::Trace
    };

    TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
}
