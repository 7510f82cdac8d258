extern crate log;
extern crate simplelog;

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use log::info;

use dspl_lang::cli::*;
use dspl_lang::compiler::{compile_with, grammar::Grammar, load_grammar, Compilation};
use dspl_lang::config::{Config, Emit};

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Compiler panic, please report: {}", panic_info);
        std::process::exit(ERR_COMPILER_PANIC);
    }));

    let code = match run() {
        Ok(()) => 0,
        Err(code) => code,
    };
    std::process::exit(code)
}

fn run() -> Result<(), i32> {
    let args = configure_cli().get_matches();

    let config = get_config(&args).map_err(|e| {
        eprintln!("{}", e);
        ERR_IO_ERROR
    })?;
    configure_logging(&config).expect("Failed to configure logger.");

    let input = get_input(&args).expect("Expected an input source file to compile");
    let text = read_file(&input)?;

    let loaded;
    let grammar = match &config.grammar {
        Some(path) => {
            let grammar_text = read_file(path)?;
            loaded = load_grammar(&grammar_text).map_err(|e| {
                eprintln!("{}: {}", path.display(), e);
                exit_code(e.class)
            })?;
            &loaded
        }
        None => Grammar::builtin(),
    };

    let compile_time = Instant::now();
    let compilation = compile_with(grammar, &text, &config.options()).map_err(|e| {
        eprintln!("{}: {}", input.display(), e);
        exit_code(e.class)
    })?;
    info!(
        "Compiled {} in {}ms",
        input.display(),
        compile_time.elapsed().as_millis()
    );

    emit(&config, &compilation, get_output(&args).as_deref())
}

fn read_file(path: &Path) -> Result<String, i32> {
    std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Could not read {}: {}", path.display(), e);
        ERR_IO_ERROR
    })
}

/// Writes the assembled program in the configured format.
fn emit(config: &Config, compilation: &Compilation, output: Option<&Path>) -> Result<(), i32> {
    let text = match config.emit {
        Emit::None => return Ok(()),
        Emit::Json => serde_json::to_string_pretty(&compilation.program)
            .map_err(|e| e.to_string()),
        Emit::Yaml => serde_yaml::to_string(&compilation.program).map_err(|e| e.to_string()),
    }
    .map_err(|msg| {
        eprintln!("Could not serialize the program: {}", msg);
        ERR_IO_ERROR
    })?;

    let result = match output {
        Some(path) => File::create(path).and_then(|mut file| writeln!(file, "{}", text)),
        None => writeln!(std::io::stdout(), "{}", text),
    };
    result.map_err(|e| {
        eprintln!("Could not write the program: {}", e);
        ERR_IO_ERROR
    })
}
