use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: scheme-interp [options] [FILE]

Reads a program from FILE, or from standard input when FILE is omitted.

Options:
  -h, --help     Print this help message
  --tokens       Print the token stream and exit
  --parse        Print the parsed top-level forms and exit
  --verbose      Log evaluation steps to stderr (overridden by RUST_LOG)
";

/// What the binary should do with its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Run,
    Tokens,
    Parse,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub input: Option<PathBuf>,
    pub mode: Mode,
    pub verbose: bool,
    pub help: bool,
}

impl Options {
    pub fn from_args(mut args: pico_args::Arguments) -> Result<Options, String> {
        let help = args.contains(["-h", "--help"]);
        let tokens = args.contains("--tokens");
        let parse = args.contains("--parse");
        let verbose = args.contains("--verbose");

        let mode = match (tokens, parse) {
            (true, true) => return Err("--tokens and --parse are mutually exclusive".to_string()),
            (true, false) => Mode::Tokens,
            (false, true) => Mode::Parse,
            (false, false) => Mode::Run,
        };

        let input = args
            .opt_free_from_str::<PathBuf>()
            .map_err(|e| e.to_string())?;

        let rest = args.finish();
        if !rest.is_empty() {
            return Err(format!("unexpected arguments: {:?}", rest));
        }

        Ok(Options {
            input,
            mode,
            verbose,
            help,
        })
    }

    pub fn from_env() -> Result<Options, String> {
        Options::from_args(pico_args::Arguments::from_env())
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn default_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
