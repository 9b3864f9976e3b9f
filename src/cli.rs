//! Command surface: `check`, `compile`, `translate` (spec §6)
//!
//! A `clap`-derived declarative command table stands in for the "bespoke
//! parser over a declarative command table" spec §9 calls for — `clap`'s
//! derive macros already are that table. Each subcommand function returns
//! a process exit code; `main.rs` just calls `run` and exits with it.

use std::fs;
use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use log::{debug, warn};
use serde_json::{Map, Value};

use crate::assembler::Assembler;
use crate::compiler;
use crate::error::Error;
use crate::extractor;
use crate::model::TranslationModel;
use crate::translator::Translator;

/// niem_translate — compile NIEM schema bundles and translate instance documents
#[derive(Debug, Parser)]
#[command(name = "niemtran", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Assemble and report on a schema bundle without compiling it
    Check(CheckArgs),
    /// Assemble a schema bundle and write a translation model
    Compile(CompileArgs),
    /// Translate an instance document using a compiled model
    Translate(TranslateArgs),
}

#[derive(Debug, ClapArgs)]
pub struct CheckArgs {
    /// Filename-separator character used to split a single positional into a list
    #[arg(short = 's', default_value = ",")]
    pub separator: char,

    /// Continue after warnings
    #[arg(short = 'i')]
    pub ignore: bool,

    /// Suppress domain-specific warnings
    #[arg(short = 'n')]
    pub suppress_domain_warnings: bool,

    /// Verbose output
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Quiet output
    #[arg(short = 'q')]
    pub quiet: bool,

    /// `[catalogs] schemaOrNamespaces` -- one positional is schema-or-namespace
    /// list alone; two or more is catalogs followed by the schema list.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub positionals: Vec<String>,
}

#[derive(Debug, ClapArgs)]
pub struct CompileArgs {
    #[arg(short = 's', default_value = ",")]
    pub separator: char,

    #[arg(short = 'o')]
    pub outfile: Option<PathBuf>,

    #[arg(short = 'q')]
    pub quiet: bool,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub positionals: Vec<String>,
}

#[derive(Debug, ClapArgs)]
pub struct TranslateArgs {
    #[arg(short = 'o')]
    pub outfile: Option<PathBuf>,

    /// Instance-to-JSON direction; the only direction currently implemented
    #[arg(long = "x2j")]
    pub x2j: bool,

    pub model_file: PathBuf,
    pub instance_file: PathBuf,
}

/// Split `[catalogs] schemaOrNamespaces` per spec §6's positional-arity rule:
/// exactly one positional is the schema/namespace list; two or more is
/// catalogs followed by the schema list.
fn split_catalogs_and_schemas(positionals: &[String], separator: char) -> (Vec<PathBuf>, Vec<String>) {
    match positionals.len() {
        0 => (Vec::new(), Vec::new()),
        1 => (Vec::new(), split_list(&positionals[0], separator)),
        _ => {
            let catalogs = split_list(&positionals[0], separator)
                .into_iter()
                .map(PathBuf::from)
                .collect();
            let schemas = positionals[1..]
                .iter()
                .flat_map(|p| split_list(p, separator))
                .collect();
            (catalogs, schemas)
        }
    }
}

fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Run `check` (spec §6/§7): print initialization, assembly, and
/// construction sections in order, collapsing empty sections unless `-v`.
pub fn run_check(args: &CheckArgs) -> i32 {
    if args.verbose && args.quiet {
        eprintln!("check: -v and -q are mutually exclusive");
        return 1;
    }

    let (catalogs, schemas) = split_catalogs_and_schemas(&args.positionals, args.separator);
    if schemas.is_empty() {
        eprintln!("check: no schema or namespace arguments given");
        return 2;
    }

    let mut assembler = Assembler::new();
    let result = assembler.assemble(&catalogs, &schemas);

    let section = |title: &str, lines: &[String]| {
        if args.quiet || (lines.is_empty() && !args.verbose) {
            return;
        }
        println!("{}:", title);
        for line in lines {
            println!("  {}", line);
        }
    };

    section("Initialization", &assembler.initialization_messages());

    let model = match result {
        Ok(model) => model,
        Err(e) => {
            if !args.quiet {
                println!("Assembly: fatal -- {}", e);
                println!("Schema construction: FAILED");
            }
            return 1;
        }
    };

    let warnings = assembler.assembly_warning_messages();
    section("Assembly", &warnings);

    let ns_info = extractor::extract(&model, args.suppress_domain_warnings);
    section("Namespace analysis", &ns_info.warnings);

    let has_warnings = !warnings.is_empty() || !ns_info.warnings.is_empty();
    if !args.quiet {
        println!("Schema construction: OK");
    }

    if has_warnings && !args.ignore {
        1
    } else {
        0
    }
}

/// Run `compile` (spec §6): assemble, extract, compile, write the model file.
pub fn run_compile(args: &CompileArgs) -> i32 {
    let (catalogs, schemas) = split_catalogs_and_schemas(&args.positionals, args.separator);
    if schemas.is_empty() {
        eprintln!("compile: no schema or namespace arguments given");
        return 2;
    }

    let mut assembler = Assembler::new();
    let model = match assembler.assemble(&catalogs, &schemas) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("compile: schema construction failed: {}", e);
            return 2;
        }
    };

    if !args.quiet {
        for warning in assembler.assembly_warning_messages() {
            warn!("{}", warning);
        }
    }

    let ns_info = extractor::extract(&model, false);
    let translation_model = compiler::compile(&model, &ns_info);

    let json = match translation_model.to_json() {
        Ok(json) => json,
        Err(e) => {
            eprintln!("compile: failed to serialize model: {}", e);
            return 2;
        }
    };

    let outfile = args.outfile.clone().unwrap_or_else(|| default_outfile(&schemas));
    debug!("writing translation model to {}", outfile.display());
    if let Err(e) = fs::write(&outfile, json) {
        eprintln!("compile: {}", Error::Io(e));
        return 2;
    }

    if assembler.has_warnings() {
        1
    } else {
        0
    }
}

/// Default output filename: basename of the first schema document with
/// extension `.no`, falling back to `NIEM.no` (spec §6).
fn default_outfile(schemas: &[String]) -> PathBuf {
    schemas
        .first()
        .and_then(|first| PathBuf::from(first).file_stem().map(|s| s.to_owned()))
        .map(|stem| PathBuf::from(format!("{}.no", stem.to_string_lossy())))
        .unwrap_or_else(|| PathBuf::from("NIEM.no"))
}

/// Run `translate` (spec §6): load a compiled model, translate an instance
/// document, and write `data` merged with a full `@context` to `outfile`
/// (or stdout).
pub fn run_translate(args: &TranslateArgs) -> i32 {
    let model_text = match fs::read_to_string(&args.model_file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("translate: {}", Error::Io(e));
            return 2;
        }
    };
    let model = match TranslationModel::from_json(&model_text) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("translate: {}", e);
            return 2;
        }
    };

    let instance_text = match fs::read_to_string(&args.instance_file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("translate: {}", Error::Io(e));
            return 2;
        }
    };

    let translator = Translator::new(&model);
    let output = match translator.translate(&instance_text) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("translate: {}", e);
            return 1;
        }
    };

    let mut context = Map::new();
    for (prefix, uri) in &model.context_bindings {
        context.insert(prefix.clone(), Value::String(with_trailing_hash(uri)));
    }
    for (prefix, uri) in &output.context_extension {
        context.insert(prefix.clone(), Value::String(with_trailing_hash(uri)));
    }

    let mut data = match output.data {
        Value::Object(map) => map,
        other => {
            let mut wrapped = Map::new();
            wrapped.insert("rdf:value".to_string(), other);
            wrapped
        }
    };
    data.insert("@context".to_string(), Value::Object(context));

    let rendered = match serde_json::to_string_pretty(&Value::Object(data)) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("translate: failed to serialize output: {}", e);
            return 2;
        }
    };

    match &args.outfile {
        Some(path) => {
            if let Err(e) = fs::write(path, rendered) {
                eprintln!("translate: {}", Error::Io(e));
                return 2;
            }
        }
        None => println!("{}", rendered),
    }

    if output.flags.extended {
        1
    } else {
        0
    }
}

fn with_trailing_hash(uri: &str) -> String {
    if uri.ends_with('#') {
        uri.to_string()
    } else {
        format!("{}#", uri)
    }
}

/// Dispatch a parsed [`Cli`] to its subcommand, returning the process exit code
pub fn run(cli: &Cli) -> i32 {
    match &cli.command {
        Command::Check(args) => run_check(args),
        Command::Compile(args) => run_compile(args),
        Command::Translate(args) => run_translate(args),
    }
}
