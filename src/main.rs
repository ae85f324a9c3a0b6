use std::fs;
use std::io::{self, Read, Write};
use std::process;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use scheme_interp::config::{Mode, Options, USAGE};
use scheme_interp::read;
use scheme_interp::{Interpreter, Result};

fn init_logging(options: &Options) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.default_filter()));
    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(formatter)
        .with(filter)
        .init();
}

fn read_input(options: &Options) -> Result<String> {
    match options.input {
        Some(ref path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn execute<W: Write>(options: &Options, src: &str, interpreter: &mut Interpreter, out: &mut W) -> Result<()> {
    match options.mode {
        Mode::Tokens => {
            for token in read::tokenize(src)? {
                writeln!(out, "{} : {}", token, token.kind())?;
            }
            Ok(())
        }
        Mode::Parse => {
            for form in read::read_program(src)? {
                writeln!(out, "{}", form)?;
            }
            Ok(())
        }
        Mode::Run => interpreter.run(src, out),
    }
}

fn main() {
    let options = match Options::from_env() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            process::exit(2);
        }
    };
    if options.help {
        print!("{}", USAGE);
        return;
    }
    init_logging(&options);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut interpreter = Interpreter::new();
    let result = read_input(&options).and_then(|src| execute(&options, &src, &mut interpreter, &mut out));

    if let Err(e) = result {
        // Diagnostics go to stdout, after whatever was already printed.
        let _ = writeln!(out, "{}", e);
        let _ = out.flush();
        drop(interpreter);
        process::exit(1);
    }
}
