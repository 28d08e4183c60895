//! Purpose: `rowsplit` CLI entry point: parse a delimited-text file and print rows as JSON.
//! Role: Binary crate root; parses args, runs the parser, emits JSON on stdout.
//! Invariants: Output is written only after the whole input parsed (no partial results).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rowsplit::api::{
    ColumnSchema, Dialect, Error, ErrorKind, ParseOptions, Source, columns::parse_column_list,
    open_source, parse_records, parse_rows, to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Internal)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Try `rowsplit --help`."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    init_tracing();

    let color_mode = cli.color;
    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "rowsplit", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
    };

    result
        .map_err(add_source_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "rowsplit",
    version,
    about = "Quote-aware delimited-text parser",
    long_about = None,
    after_help = r#"EXAMPLES
  $ rowsplit parse people.csv --header
  $ rowsplit parse people.csv --header --columns string,int
  $ cat data.tsv | rowsplit parse - --delimiter tab --format jsonl"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Jsonl,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Parse rows from a file or stdin",
        long_about = r#"Parse delimited text into rows of fields.

Quoted fields may contain the delimiter, doubled quotes, and newlines.
Blank lines are skipped. With --columns, every row is coerced to the
declared types and the first row that fails aborts the whole parse."#
    )]
    Parse(ParseArgs),
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completion scripts",
        after_help = r#"EXAMPLES
  $ rowsplit completion bash > ~/.local/share/bash-completion/completions/rowsplit
  $ rowsplit completion zsh > ~/.zfunc/_rowsplit"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(clap::Args)]
struct ParseArgs {
    #[arg(
        default_value = "-",
        help = "Input path, or - for stdin",
        value_hint = ValueHint::FilePath
    )]
    input: PathBuf,
    #[arg(long, help = "Skip the first row")]
    header: bool,
    #[arg(
        long,
        default_value = ",",
        value_parser = parse_char,
        help = "Field delimiter (a single character, or `tab`)"
    )]
    delimiter: char,
    #[arg(long, default_value = "\"", value_parser = parse_char, help = "Quote character")]
    quote: char,
    #[arg(long, help = "Fail on an unterminated quoted field")]
    strict: bool,
    #[arg(long, help = "Trim whitespace around unquoted fields")]
    trim: bool,
    #[arg(
        long,
        help = "Validate rows against column types, e.g. string,int,float,bool"
    )]
    columns: Option<String>,
    #[arg(long, requires = "columns", help = "Ignore fields beyond --columns")]
    allow_extra: bool,
    #[arg(long, default_value = "json", value_enum, help = "Output format")]
    format: OutputFormat,
}

fn parse_char(value: &str) -> Result<char, String> {
    if matches!(value, "tab" | "\\t") {
        return Ok('\t');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(format!("expected a single character, got {value:?}")),
    }
}

fn run_parse(args: ParseArgs) -> Result<RunOutcome, Error> {
    let dialect = Dialect::default()
        .with_delimiter(args.delimiter)
        .with_quote(args.quote)
        .strict(args.strict)
        .trim(args.trim);
    let options = ParseOptions::default().header(args.header).dialect(dialect);
    let source = Source::from_arg(&args.input);
    debug!(source = %source.describe(), ?options, "parsing input");

    let with_path = |err: Error| match &source {
        Source::Path(path) if err.path().is_none() => err.with_path(path),
        _ => err,
    };

    let reader = open_source(&source)?;
    let values: Vec<Value> = match args.columns {
        Some(list) => {
            let mut schema = ColumnSchema::new(parse_column_list(&list)?);
            if args.allow_extra {
                schema = schema.allow_extra_fields();
            }
            parse_records(reader, &schema, &options).map_err(with_path)?
        }
        None => parse_rows(reader, &options)
            .map_err(with_path)?
            .into_iter()
            .map(|row| json!(row))
            .collect(),
    };

    emit_values(&values, args.format)?;
    Ok(RunOutcome::ok())
}

fn emit_values(values: &[Value], format: OutputFormat) -> Result<(), Error> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match format {
        OutputFormat::Json => serde_json::to_writer_pretty(&mut out, values)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(out)),
        OutputFormat::Jsonl => values.iter().try_for_each(|value| {
            serde_json::to_writer(&mut out, value).map_err(io::Error::from)?;
            writeln!(out)
        }),
    };
    result.and_then(|()| out.flush()).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to write output")
            .with_source(err)
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn add_source_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::SourceUnavailable => {
            err.with_hint("Input could not be read. Check the path, filesystem, and permissions.")
        }
        ErrorKind::Encoding => err.with_hint("Input must be UTF-8 text."),
        ErrorKind::SchemaValidation => {
            err.with_hint("Fix the row, adjust --columns, or drop --columns to see raw rows.")
        }
        _ => err,
    }
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_LOG=debug and share command/context if it persists.",
    )
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::SourceUnavailable => "input unavailable".to_string(),
        ErrorKind::Encoding => "invalid text encoding".to_string(),
        ErrorKind::MalformedQuoting => "malformed quoting".to_string(),
        ErrorKind::SchemaValidation => "row failed validation".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(row) = err.row() {
        inner.insert("row".to_string(), json!(row));
    }
    if let Some(line) = err.line() {
        inner.insert("line".to_string(), json!(line));
    }
    if let Some(column) = err.column() {
        inner.insert("column".to_string(), json!(column));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = vec![format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    )];

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(line) = err.line() {
        lines.push(format!(
            "{} {line}",
            colorize_label("line:", use_color, AnsiColor::Yellow)
        ));
    }

    if let Some(cause) = error_causes(err).first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
