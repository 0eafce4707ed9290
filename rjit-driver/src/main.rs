//! RJIT middle end driver
//!
//! Reads a typed AST (JSON), lowers it to IR, runs the pass pipeline and
//! prints the resulting IR. Built-in demo programs stand in for a frontend.

mod demos;

use clap::{Parser, Subcommand};
use log::info;
use rjit_ast::TranslationUnit;
use rjit_ir::{IrBuilder, Module};
use rjit_opt::{PassManager, DEFAULT_OPT_LEVEL};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rjitc")]
#[command(about = "RJIT middle end: typed AST to optimised IR")]
#[command(version = "0.1.0")]
struct Cli {
    /// Verbose logging (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a typed AST given as JSON
    Compile {
        /// Input JSON file holding a translation unit
        input: PathBuf,

        /// Output IR file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Optimisation level
        #[arg(short = 'O', long = "opt-level", default_value_t = DEFAULT_OPT_LEVEL)]
        opt_level: u8,

        /// Run only these passes (and their prerequisites), in order
        #[arg(long, value_delimiter = ',')]
        passes: Option<Vec<String>>,

        /// Print the IR before running any pass
        #[arg(long)]
        print_ir: bool,
    },

    /// Run a built-in demo program
    Demo {
        /// One of: add, abs, loop, calls
        #[arg(default_value = "add")]
        name: String,

        /// Print the demo's typed AST as JSON instead of compiling it
        #[arg(long)]
        emit_ast: bool,

        /// Optimisation level
        #[arg(short = 'O', long = "opt-level", default_value_t = DEFAULT_OPT_LEVEL)]
        opt_level: u8,
    },

    /// List the registered passes
    Passes,
}

/// How the pass pipeline is chosen for one run
enum Pipeline {
    Level(u8),
    Named(Vec<String>),
}

fn main() {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    match cli.command {
        Commands::Compile {
            input,
            output,
            opt_level,
            passes,
            print_ir,
        } => {
            let pipeline = match passes {
                Some(names) => Pipeline::Named(names),
                None => Pipeline::Level(opt_level),
            };
            if let Err(e) = compile_file(&input, output.as_deref(), pipeline, print_ir) {
                eprintln!("Error compiling {}: {}", input.display(), e);
                std::process::exit(1);
            }
        }
        Commands::Demo {
            name,
            emit_ast,
            opt_level,
        } => {
            if let Err(e) = run_demo(&name, emit_ast, opt_level) {
                eprintln!("Error running demo: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Passes => list_passes(),
    }
}

fn compile_file(
    input_path: &Path,
    output_path: Option<&Path>,
    pipeline: Pipeline,
    print_ir: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Compiling {}", input_path.display());

    let source = fs::read_to_string(input_path)?;
    let unit: TranslationUnit = serde_json::from_str(&source)?;
    let module_name = input_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("module");

    let ir = compile_unit(&unit, module_name, pipeline, print_ir)?;

    match output_path {
        Some(path) => {
            fs::write(path, &ir)?;
            println!("IR written to: {}", path.display());
        }
        None => print!("{}", ir),
    }
    Ok(())
}

fn run_demo(name: &str, emit_ast: bool, opt_level: u8) -> Result<(), Box<dyn std::error::Error>> {
    let unit = demos::demo(name).ok_or_else(|| {
        format!(
            "Unknown demo '{}' (available: {})",
            name,
            demos::DEMO_NAMES.join(", ")
        )
    })?;

    if emit_ast {
        println!("{}", serde_json::to_string_pretty(&unit)?);
        return Ok(());
    }

    let ir = compile_unit(&unit, name, Pipeline::Level(opt_level), true)?;
    println!("=== Optimised IR (-O{}) ===", opt_level);
    print!("{}", ir);
    Ok(())
}

fn list_passes() {
    let mut manager = PassManager::new();
    manager.initialize();
    for info in manager.passes() {
        let requires = if info.requires.is_empty() {
            String::new()
        } else {
            format!(", requires {}", info.requires.join(", "))
        };
        println!("{:<16} -O{}{}", info.name, info.min_opt_level, requires);
    }
}

/// Lower and optimise one translation unit, returning the IR text
fn compile_unit(
    unit: &TranslationUnit,
    module_name: &str,
    pipeline: Pipeline,
    print_ir: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let module = lower(unit, module_name)?;
    if print_ir {
        println!("=== IR ===");
        print!("{}", module);
        println!("=== End IR ===\n");
    }

    let mut manager = PassManager::new();
    manager.initialize();
    manager.set_module(module);
    match pipeline {
        Pipeline::Level(level) => {
            manager.set_opt_level(level);
            manager.run_passes()?;
        }
        Pipeline::Named(names) => {
            for name in &names {
                manager.run_pass(name)?;
            }
        }
    }

    let module = manager
        .take_module()
        .ok_or("pass manager lost the module")?;
    Ok(module.dump())
}

fn lower(unit: &TranslationUnit, module_name: &str) -> Result<Module, Box<dyn std::error::Error>> {
    let mut builder = IrBuilder::new(module_name);
    builder.lower(unit);
    builder.module().reporter().print_diagnostics();
    Ok(builder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_pipeline_merges_blocks() {
        let unit = demos::demo("add").unwrap();
        let ir = compile_unit(&unit, "add", Pipeline::Level(1), false).unwrap();
        assert!(ir.contains("define i32 @add(i32 %a) {"));
        assert!(!ir.contains("func_exit:"));
    }

    #[test]
    fn test_named_pipeline() {
        let unit = demos::demo("add").unwrap();
        let ir = compile_unit(
            &unit,
            "add",
            Pipeline::Named(vec!["BlockCalculate".to_string()]),
            false,
        )
        .unwrap();
        assert!(ir.contains("func_exit:"));

        let err = compile_unit(&unit, "add", Pipeline::Named(vec!["Inline".to_string()]), false)
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown pass 'Inline'");
    }

    #[test]
    fn test_lowering_errors_surface() {
        let unit = TranslationUnit::new(vec![rjit_ast::TopLevelItem::Function(
            rjit_ast::FunctionDefinition::new(
                "f",
                vec![],
                rjit_common::Type::Void,
                rjit_ast::Statement::compound(vec![rjit_ast::Statement::brk()]),
            ),
        )]);
        let err = compile_unit(&unit, "bad", Pipeline::Level(1), false).unwrap_err();
        assert_eq!(err.to_string(), "Lowering failed: 1 error");
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::parse_from([
            "rjitc",
            "compile",
            "in.json",
            "-O",
            "0",
            "--passes",
            "BlockCalculate,BlockMerge",
        ]);
        match cli.command {
            Commands::Compile { opt_level, passes, .. } => {
                assert_eq!(opt_level, 0);
                assert_eq!(
                    passes,
                    Some(vec!["BlockCalculate".to_string(), "BlockMerge".to_string()])
                );
            }
            _ => panic!("expected compile"),
        }
    }
}
