use std::io::{self, IsTerminal};
use std::process;
use std::thread;

use l2lisp::{Config, Interp, LinesFromConsole, LinesFromStdin, LispError, LispResult, Receiver, Value};

/// Deep non-tail recursion in user code recurses in Rust too.
const STACK_SIZE: usize = 512 * 1024 * 1024;

enum Source {
    File(String),
    Stdin,
}

/// Prints each top-level result, or the error in its place.
struct Echo;

impl Receiver for Echo {
    fn receive_result(&mut self, interp: &Interp, value: Value) {
        println!("=> {}", interp.repr(value));
    }

    fn receive_error(&mut self, _interp: &Interp, error: &LispError) {
        println!("{}", error);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::from_env();
    let mut sources = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-prelude" => config.load_prelude = false,
            "--help" | "-h" => {
                println!("Usage: l2lisp [OPTIONS] [FILE|-]...");
                println!();
                println!("Runs each FILE in order. With no FILE, or for '-', reads standard input:");
                println!("interactively on a terminal, otherwise as a script.");
                println!();
                println!("Options:");
                println!("  --no-prelude   Start without the bundled definitions (defun, let, if, ...)");
                println!("  --help, -h     Show this help message");
                println!();
                println!("Environment variables:");
                println!("  L2LISP_HEAP_CELLS            Cons cells available (default 67108864)");
                println!("  L2LISP_MAX_MACRO_EXPANSIONS  Nested macro expansion limit (default 30)");
                println!("  L2LISP_MAX_TRACES            Forms kept in an error trace (default 20)");
                println!("  L2LISP_NO_PRELUDE            Same as --no-prelude");
                println!("  RUST_LOG                     Log filter, e.g. RUST_LOG=l2lisp=debug");
                process::exit(0);
            }
            "-" => sources.push(Source::Stdin),
            other if other.starts_with('-') => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Try 'l2lisp --help' for usage information.");
                process::exit(1);
            }
            path => sources.push(Source::File(path.to_string())),
        }
        i += 1;
    }
    if sources.is_empty() {
        sources.push(Source::Stdin);
    }

    let worker = thread::Builder::new()
        .name("l2lisp".to_string())
        .stack_size(STACK_SIZE)
        .spawn(move || run(config, sources));
    let code = match worker {
        Ok(handle) => handle.join().unwrap_or(101),
        Err(e) => {
            eprintln!("cannot start interpreter thread: {}", e);
            1
        }
    };
    process::exit(code);
}

fn run(config: Config, sources: Vec<Source>) -> i32 {
    let mut interp = match Interp::new(config) {
        Ok(interp) => interp,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };
    for source in sources {
        let outcome = match source {
            Source::File(path) => interp.load(&path).map(|_| ()),
            Source::Stdin => run_stdin(&mut interp),
        };
        if let Err(e) = outcome {
            eprintln!("{}", e);
            return 1;
        }
    }
    0
}

fn run_stdin(interp: &mut Interp) -> LispResult<()> {
    if io::stdin().is_terminal() {
        println!("L2 Lisp ({} natives)", l2lisp::builtins::NATIVES.len());
        println!(
            "  Heap: {} cells used, Symbols: {} interned",
            interp.heap.total_cells(),
            interp.symbols.count()
        );
        let console = LinesFromConsole::new()?;
        interp.run(Box::new(console), Some(&mut Echo))?;
    } else {
        interp.run(Box::new(LinesFromStdin), Some(&mut Echo))?;
    }
    Ok(())
}
