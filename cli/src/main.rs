use std::error::Error;
use std::fs;
use std::io::{self, Write};

use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use xconf::{Document, FormatMode, LoadOptions, Lookup};

#[derive(Parser, Debug)]
#[command(name = "xconf", version, about = "xconf reader, query tool and formatter")]
struct Args {
    /// Input file path. Omit or use '-' to read from stdin.
    input: Option<String>,

    /// Output file path (prints to stdout if omitted).
    #[arg(short, long, value_name = "file")]
    output: Option<String>,

    /// Charset to start decoding with (default: UTF-8). A `!CONFIG` header
    /// switches it for the rest of the input.
    #[arg(long, value_name = "label")]
    charset: Option<String>,

    /// Output layout when re-rendering the document.
    #[arg(long, value_enum, value_name = "mode", default_value_t = FormatArg::File)]
    format: FormatArg,

    /// Print the value of one attribute instead of the document.
    #[arg(long, value_name = "key", conflicts_with_all = ["keys", "json"])]
    get: Option<String>,

    /// Print every attribute and node ID.
    #[arg(long, conflicts_with = "json")]
    keys: bool,

    /// Print the document as JSON.
    #[arg(long)]
    json: bool,

    /// Log loading progress to stderr (repeat for more detail).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    File,
    String,
    Compact,
}

impl From<FormatArg> for FormatMode {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::File => FormatMode::File,
            FormatArg::String => FormatMode::String,
            FormatArg::Compact => FormatMode::Compact,
        }
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);
    if let Err(err) = run(&args) {
        match err.downcast_ref::<xconf::Error>() {
            Some(err) => eprintln!("{}", err.diagnostic()),
            None => eprintln!("ERROR  {err}"),
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "xconf=debug",
        _ => "xconf=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let doc = load_input(args)?;
    debug!(
        keys = doc.key_count(),
        nodes = doc.node_key_count(),
        "input loaded"
    );

    with_output_writer(args.output.as_deref(), |writer| {
        if let Some(key) = &args.get {
            let value = doc.get_key(key)?;
            writeln!(writer, "{value}")?;
        } else if args.keys {
            write_keys(writer, &doc)?;
        } else if args.json {
            write_json(writer, &doc)?;
        } else {
            doc.save(writer, args.format.into())?;
        }
        Ok(())
    })
}

fn load_input(args: &Args) -> Result<Document, Box<dyn Error>> {
    let mut options = LoadOptions::new();
    if let Some(charset) = &args.charset {
        options = options.with_charset(charset.as_str());
    }
    let doc = match args.input.as_deref() {
        None | Some("-") => xconf::from_reader_with_options(io::stdin().lock(), &options)?,
        Some(path) => xconf::from_path_with_options(path, &options)?,
    };
    Ok(doc)
}

fn write_keys(writer: &mut dyn Write, doc: &Document) -> Result<(), Box<dyn Error>> {
    for (key, value) in doc.keys() {
        let masked = xconf::text::mask_value(value);
        writeln!(writer, "key  {key}=\"{masked}\"")?;
    }
    for key in doc.node_keys() {
        writeln!(writer, "node {key}")?;
    }
    Ok(())
}

fn write_json(writer: &mut dyn Write, doc: &Document) -> Result<(), Box<dyn Error>> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"  ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut *writer, formatter);
    doc.serialize(&mut serializer)?;
    writeln!(writer)?;
    Ok(())
}

fn with_output_writer<F>(path: Option<&str>, f: F) -> Result<(), Box<dyn Error>>
where
    F: FnOnce(&mut dyn Write) -> Result<(), Box<dyn Error>>,
{
    match path {
        Some(path) if path != "-" => {
            let mut file = fs::File::create(path)?;
            f(&mut file)
        }
        _ => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            f(&mut handle)
        }
    }
}
