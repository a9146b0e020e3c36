use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use luma::{InterpretResult, TraceLevel, Vm, VmConfig};

#[derive(Parser)]
#[command(name = "luma")]
#[command(version)]
#[command(about = "A compiler and VM for a small dynamically-typed scripting language")]
struct Cli {
    /// Script to run; omitted for an interactive REPL.
    script: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = TraceLevel::Quiet)]
    mode: TraceLevel,

    /// Run a collection cycle before every allocation, to shake out GC bugs.
    #[arg(long)]
    stress_gc: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(64);
        }
    };

    let config = VmConfig { stress_gc: cli.stress_gc, ..VmConfig::default() };
    let mut vm = Vm::new(config, cli.mode);

    match cli.script {
        Some(path) => run_file(&mut vm, &path),
        None => run_repl(&mut vm),
    }
}

fn run_file(vm: &mut Vm, path: &PathBuf) {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Could not read file \"{}\": {}", path.display(), err);
            std::process::exit(74);
        }
    };

    match vm.interpret(&source) {
        InterpretResult::Ok => std::process::exit(0),
        InterpretResult::CompileError => std::process::exit(65),
        InterpretResult::RuntimeError => std::process::exit(70),
    }
}

fn run_repl(vm: &mut Vm) {
    let stdin = io::stdin();
    loop {
        print!(">> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {
                vm.interpret(&line);
            }
            Err(_) => break,
        }
    }
}
