//! VSOP semantic analyzer
//!
//! Reads a parsed program (JSON AST) and reports semantic errors.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use vsopc::frontend::semantic::{ClassDef, ClassTable};
use vsopc::{FeedbackReport, Program, SemanticAnalyzer};

/// VSOP semantic analyzer
#[derive(Parser, Debug)]
#[command(name = "vsopc")]
#[command(author = "Z1529")]
#[command(version = "0.1.0")]
#[command(about = "Semantic analyzer for the VSOP object-oriented language")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit a JSON feedback report instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a program for semantic errors
    Check {
        /// Parsed program (.json)
        input: PathBuf,
    },
    /// Print the resolved class table
    Classes {
        /// Parsed program (.json)
        input: PathBuf,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Check { input } => check_file(input, cli.json),
        Commands::Classes { input } => dump_classes(input),
        Commands::Version => {
            println!("vsopc 0.1.0");
            println!("VSOP semantic analyzer");
            println!("License: Apache-2.0");
            Ok(true)
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(2);
        }
    }
}

fn load_program(input: &Path) -> Result<Program> {
    let source = fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    Program::from_json(&source).with_context(|| format!("failed to decode the AST in {}", input.display()))
}

/// Returns whether the program is free of semantic errors
fn check_file(input: &Path, json: bool) -> Result<bool> {
    let mut program = load_program(input)?;
    let diagnostics = SemanticAnalyzer::new().analyze(&mut program);
    let file = input.display().to_string();

    if json {
        let report = FeedbackReport::new(&file, &diagnostics, program.class_table.as_ref());
        println!("{}", report.to_json());
    } else if diagnostics.is_empty() {
        println!("{}: no semantic errors", file);
    } else {
        for error in &diagnostics {
            eprintln!("{}:{}", file, error.render());
        }
    }
    Ok(diagnostics.is_empty())
}

fn dump_classes(input: &Path) -> Result<bool> {
    let mut program = load_program(input)?;
    let diagnostics = SemanticAnalyzer::new().analyze(&mut program);
    for error in &diagnostics {
        eprintln!("{}:{}", input.display(), error.render());
    }

    let table = program.class_table.as_ref().context("analysis produced no class table")?;
    for class in table.iter() {
        print_class(table, class);
    }
    Ok(diagnostics.is_empty())
}

fn print_class(table: &ClassTable, class: &ClassDef) {
    let Some(members) = class.resolved() else {
        println!("class {} (unresolved)", class.name);
        return;
    };

    let chain: Vec<&str> = members.ancestors.names().iter().map(String::as_str).collect();
    println!("class {} [{}]", class.name, chain.join(" > "));

    for (label, fields) in [("field", &members.fields), ("inherited field", &members.inherited_fields)] {
        for field in fields.values() {
            println!("  {} {}: {}", label, field.name, field.ty.name());
        }
    }
    for (label, methods) in [("method", &members.methods), ("inherited method", &members.inherited_methods)] {
        for method in methods.values() {
            let formals: Vec<String> = method
                .formals
                .iter()
                .map(|f| format!("{}: {}", f.name, f.ty.name()))
                .collect();
            println!(
                "  {} {}({}): {} from {}",
                label,
                method.name,
                formals.join(", "),
                method.ret_type.name(),
                table.get(method.owner).name
            );
        }
    }
}
