//! CLI tool for munging text files with linemunge pipelines.
//!
//! Usage:
//!   munge sub '\r$' '' notes.txt --in-place
//!   munge grep 404 access.log --field 8 -o errors.log
//!   munge fields --keep 0,6 access.log
//!   munge sort words.txt --desc
//!   munge merge a.sorted b.sorted -o all.sorted
//!   munge tail access.log --contains ' 404 '
//!
//! Without `-o` or `--in-place`, output goes to stdout.

use clap::{Args, Parser, Subcommand};
use linemunge::{CancelToken, Order, Pipeline, TailOptions};
use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Lazy line-oriented text munging: filter, rewrite, sort, merge and tail files.
#[derive(Parser)]
#[command(name = "munge")]
struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replace every regex match on each line
    Sub {
        pattern: String,
        /// Replacement text; `$1` and `${name}` refer to groups
        replacement: String,
        file: PathBuf,
        #[command(flatten)]
        output: Output,
    },
    /// Keep (or drop) lines matching a regex
    Grep {
        pattern: String,
        file: PathBuf,
        /// Drop matching lines instead of keeping them
        #[arg(short = 'v', long)]
        invert: bool,
        /// Match only at the start of the line or field
        #[arg(short, long)]
        anchored: bool,
        /// Match against this field instead of the whole line
        #[arg(short, long)]
        field: Option<usize>,
        /// Field delimiter
        #[arg(short, long, default_value = " ")]
        delimiter: String,
        #[command(flatten)]
        output: Output,
    },
    /// Keep or drop fields of each line
    Fields {
        file: PathBuf,
        /// Fields to keep, in output order
        #[arg(short, long, value_delimiter = ',', conflicts_with = "drop")]
        keep: Vec<usize>,
        /// Fields to drop
        #[arg(long, value_delimiter = ',')]
        drop: Vec<usize>,
        /// Field delimiter
        #[arg(short, long, default_value = " ")]
        delimiter: String,
        #[command(flatten)]
        output: Output,
    },
    /// Count lines, optionally only those matching a regex
    Count {
        file: PathBuf,
        #[arg(short, long)]
        contains: Option<String>,
    },
    /// Sort lines
    Sort {
        file: PathBuf,
        /// Sort in descending order
        #[arg(long)]
        desc: bool,
        #[command(flatten)]
        output: Output,
    },
    /// Merge files whose lines are already sorted
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Inputs are sorted in descending order
        #[arg(long)]
        desc: bool,
        /// Write output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Follow lines appended to a file
    Tail {
        file: PathBuf,
        #[arg(short, long)]
        contains: Option<String>,
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 10)]
        poll_ms: u64,
        /// Stop following after this many seconds
        #[arg(long)]
        for_secs: Option<u64>,
    },
}

/// Where a rewritten stream goes.
#[derive(Args)]
struct Output {
    /// Write output to file instead of stdout
    #[arg(short, long, conflicts_with = "in_place")]
    output: Option<PathBuf>,

    /// Replace the input file with the output
    #[arg(short, long)]
    in_place: bool,
}

impl Output {
    fn emit(&self, pipeline: Pipeline<String>) -> linemunge::Result<()> {
        if self.in_place {
            pipeline.write_in_place()?;
        } else if let Some(path) = &self.output {
            pipeline.write_to(path)?;
        } else {
            pipeline.display()?;
        }
        Ok(())
    }
}

/// Initialize logging on stderr.
///
/// Uses the `RUST_LOG` env var if set, otherwise falls back to the provided level.
fn init_logging(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn order(desc: bool) -> Order<String> {
    Order::natural().reverse(desc)
}

fn trim_terminator(line: String) -> String {
    line.trim_end_matches(['\r', '\n']).to_string()
}

fn terminate(mut line: String) -> String {
    line.push('\n');
    line
}

fn run(command: Command) -> linemunge::Result<()> {
    match command {
        Command::Sub {
            pattern,
            replacement,
            file,
            output,
        } => output.emit(Pipeline::open(&file)?.substitute(&pattern, &replacement)),
        Command::Grep {
            pattern,
            file,
            invert,
            anchored,
            field,
            delimiter,
            output,
        } => {
            let lines = Pipeline::open(&file)?;
            let selected = match (field, anchored, invert) {
                (None, false, false) => lines.keep_if_contains(&pattern),
                (None, false, true) => lines.drop_if_contains(&pattern),
                (None, true, false) => lines.keep_if_matches(&pattern),
                (None, true, true) => lines.drop_if_matches(&pattern),
                (Some(index), anchored, invert) => {
                    let fields = lines.split(&delimiter);
                    let fields = match (anchored, invert) {
                        (false, false) => fields.keep_if_field_contains(index, &pattern),
                        (false, true) => fields.drop_if_field_contains(index, &pattern),
                        (true, false) => fields.keep_if_field_matches(index, &pattern),
                        (true, true) => fields.drop_if_field_matches(index, &pattern),
                    };
                    fields.join(&delimiter)
                }
            };
            output.emit(selected)
        }
        Command::Fields {
            file,
            keep,
            drop,
            delimiter,
            output,
        } => {
            let fields = Pipeline::open(&file)?
                .map(trim_terminator)
                .split(&delimiter);
            let fields = if keep.is_empty() {
                fields.drop_fields(&drop)
            } else {
                fields.keep_fields(&keep)
            };
            output.emit(fields.join(&delimiter).map(terminate))
        }
        Command::Count { file, contains } => {
            let lines = Pipeline::open(&file)?;
            let count = match contains {
                Some(pattern) => lines.keep_if_contains(&pattern).count()?,
                None => lines.count()?,
            };
            println!("{count}");
            Ok(())
        }
        Command::Sort { file, desc, output } => {
            output.emit(Pipeline::open(&file)?.sort(order(desc))?)
        }
        Command::Merge {
            files,
            desc,
            output,
        } => {
            let inputs = files
                .iter()
                .map(Pipeline::open)
                .collect::<linemunge::Result<Vec<_>>>()?;
            let merged = Pipeline::merge(inputs, order(desc));
            match output {
                Some(path) => merged.write_to(path).map(|_| ()),
                None => merged.display(),
            }
        }
        Command::Tail {
            file,
            contains,
            poll_ms,
            for_secs,
        } => {
            let cancel = CancelToken::new();
            if let Some(secs) = for_secs {
                let cancel = cancel.clone();
                thread::spawn(move || {
                    thread::sleep(Duration::from_secs(secs));
                    cancel.cancel();
                });
            }
            let options = TailOptions::new()
                .poll_interval(Duration::from_millis(poll_ms))
                .cancel_token(cancel);
            let lines = Pipeline::tail_with(&file, options)?;
            match contains {
                Some(pattern) => lines.keep_if_contains(&pattern).display(),
                None => lines.display(),
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
