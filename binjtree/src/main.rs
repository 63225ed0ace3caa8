//! jtree command-line tool for checking, formatting, and transcoding JSON.
//!
//! Usage: jtree [OPTIONS] [FILE|DIR]
//!
//! Options:
//!   -f, --from <FORMAT>    Input format (json, yaml, toml, cbor) [default: json]
//!   -t, --to <FORMAT>      Output format (json, compact, yaml, toml, cbor, diag)
//!   -w, --write            Write output to file with inferred name
//!   -o, --output <FILE>    Write output to specified file
//!   --check                Check if input is valid (exit 0 if valid, 1 if invalid)
//!   --allow-trailing       Accept trailing content after a JSON document
//!   --max-depth <N>        Maximum nesting of arrays and objects
//!   -h, --help             Print help
//!   -V, --version          Print version

use libjtree::{encode, is_whitespace, Format, NodeId, ParseOptions, Tree};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod transcode;

/// Formats accepted by `-f`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InputFormat {
    Json,
    Yaml,
    Toml,
    Cbor,
}

impl InputFormat {
    fn from_name(s: &str) -> Option<Self> {
        match s {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "cbor" => Some(Self::Cbor),
            _ => None,
        }
    }

    /// File extensions picked up in directory mode.
    fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Json => &["json"],
            Self::Yaml => &["yaml", "yml"],
            Self::Toml => &["toml"],
            Self::Cbor => &["cbor"],
        }
    }
}

/// Formats accepted by `-t`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Compact,
    Yaml,
    Toml,
    Cbor,
    Diag,
}

impl OutputFormat {
    fn from_name(s: &str) -> Option<Self> {
        match s {
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "cbor" => Some(Self::Cbor),
            "diag" => Some(Self::Diag),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Json | Self::Compact => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Cbor => "cbor",
            Self::Diag => "diag",
        }
    }
}

/// Settings shared by every input processed in one run.
struct Options<'a> {
    from: InputFormat,
    to: OutputFormat,
    output_file: Option<&'a str>,
    write_back: bool,
    check_only: bool,
    parse: ParseOptions,
}

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();

    let mut from_format = InputFormat::Json;
    let mut to_format = OutputFormat::Json;
    let mut write_back = false;
    let mut output_file: Option<&str> = None;
    let mut check_only = false;
    let mut input_path: Option<&str> = None;
    let mut parse = ParseOptions::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-V" | "--version" => {
                println!("jtree {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "-f" | "--from" => {
                let name = flag_value(&args, &mut i, "-f requires a format argument");
                from_format = InputFormat::from_name(name).unwrap_or_else(|| {
                    eprintln!("Error: Unknown input format: {}", name);
                    process::exit(1);
                });
            }
            "-t" | "--to" => {
                let name = flag_value(&args, &mut i, "-t requires a format argument");
                to_format = OutputFormat::from_name(name).unwrap_or_else(|| {
                    eprintln!("Error: Unknown output format: {}", name);
                    process::exit(1);
                });
            }
            "-w" | "--write" => {
                write_back = true;
            }
            "-o" | "--output" => {
                output_file = Some(flag_value(&args, &mut i, "--output requires an argument"));
            }
            "--check" => {
                check_only = true;
            }
            "--allow-trailing" => {
                parse.require_end = false;
            }
            "--max-depth" => {
                let n = flag_value(&args, &mut i, "--max-depth requires a number");
                parse.max_depth = n.parse().unwrap_or_else(|_| {
                    eprintln!("Error: Invalid --max-depth: {}", n);
                    process::exit(1);
                });
            }
            "-" => {
                // Explicit stdin
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                process::exit(1);
            }
            _ => {
                if input_path.is_some() {
                    eprintln!("Error: Multiple input paths not supported");
                    process::exit(1);
                }
                input_path = Some(&args[i]);
            }
        }
        i += 1;
    }

    if write_back && output_file.is_some() {
        eprintln!("Error: --write and --output are mutually exclusive");
        process::exit(1);
    }

    let options = Options {
        from: from_format,
        to: to_format,
        output_file,
        write_back,
        check_only,
        parse,
    };
    debug!(from = ?options.from, to = ?options.to, check = options.check_only, "starting");

    if let Some(path) = input_path {
        if Path::new(path).is_dir() {
            if output_file.is_some() {
                eprintln!("Error: --output cannot be used with directory input");
                process::exit(1);
            }
            process::exit(process_directory(path, &options));
        }
    }

    let input: Vec<u8> = match input_path {
        Some(path) => match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error reading {}: {}", path, e);
                process::exit(1);
            }
        },
        None => {
            let mut buffer = Vec::new();
            if let Err(e) = io::stdin().read_to_end(&mut buffer) {
                eprintln!("Error reading stdin: {}", e);
                process::exit(1);
            }
            buffer
        }
    };

    process::exit(process_input(&input, input_path, &options));
}

/// Install a stderr subscriber filtered by `JTREE_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("JTREE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Consume the argument following flag `args[*i]`, or exit with `missing`.
fn flag_value<'a>(args: &'a [String], i: &mut usize, missing: &str) -> &'a str {
    *i += 1;
    match args.get(*i) {
        Some(value) => value,
        None => {
            eprintln!("Error: {}", missing);
            process::exit(1);
        }
    }
}

fn process_directory(dir_path: &str, options: &Options) -> i32 {
    let entries = match fs::read_dir(dir_path) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error reading directory {}: {}", dir_path, e);
            return 1;
        }
    };

    let extensions = options.from.extensions();
    let mut paths: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.contains(&e))
        })
        .collect();
    paths.sort();

    let mut failed = 0;
    for path in &paths {
        let path_str = path.to_string_lossy();
        let input = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error reading {}: {}", path_str, e);
                failed += 1;
                continue;
            }
        };
        if process_input(&input, Some(&path_str), options) != 0 {
            failed += 1;
        }
    }

    info!(files = paths.len(), failed, "processed directory {}", dir_path);
    if failed > 0 {
        1
    } else {
        0
    }
}

fn process_input(input: &[u8], input_file: Option<&str>, options: &Options) -> i32 {
    let (tree, root) = match decode_input(input, input_file, options) {
        Ok(decoded) => decoded,
        Err(message) => {
            eprintln!("{}", message);
            return 1;
        }
    };
    debug!(nodes = tree.node_count(), "decoded input");

    if options.check_only {
        if let Some(path) = input_file {
            println!("{}: ok", path);
        }
        return 0;
    }

    match encode_output(&tree, root, options.to) {
        Ok(Output::Text(text)) => write_output(text.as_bytes(), input_file, options, true),
        Ok(Output::Binary(bytes)) => write_output(&bytes, input_file, options, false),
        Err(e) => {
            eprintln!("Error: Cannot convert to {:?}: {}", options.to, e);
            return 1;
        }
    }
    0
}

/// Decode `input` into a fresh tree. Errors are formatted for display,
/// JSON parse errors as `file:line:column: message`.
fn decode_input(
    input: &[u8],
    input_file: Option<&str>,
    options: &Options,
) -> Result<(Tree, NodeId), String> {
    let name = input_file.unwrap_or("<stdin>");

    if options.from == InputFormat::Json {
        let mut tree = Tree::new();
        return match tree.parse_with_options(input, &options.parse) {
            Ok(parsed) => {
                let rest = &input[parsed.end..];
                if has_trailing_content(rest) {
                    warn!("{}: ignoring {} bytes after the document", name, rest.len());
                }
                Ok((tree, parsed.root))
            }
            Err(e) => {
                let loc = e.location(input);
                Err(format!("{}:{}:{}: {}", name, loc.line, loc.column, e.kind))
            }
        };
    }

    let decoded = match options.from {
        InputFormat::Cbor => transcode::cbor::decode(input),
        format => {
            let text = std::str::from_utf8(input)
                .map_err(|e| format!("{}: input is not valid UTF-8: {}", name, e))?;
            if format == InputFormat::Yaml {
                transcode::yaml::decode(text)
            } else {
                transcode::toml::decode(text)
            }
        }
    };
    decoded.map_err(|e| format!("{}: {}", name, e))
}

/// Bytes left after a document that JSON would not treat as whitespace.
fn has_trailing_content(rest: &[u8]) -> bool {
    !rest.iter().all(|&b| is_whitespace(b))
}

enum Output {
    Text(String),
    Binary(Vec<u8>),
}

fn encode_output(tree: &Tree, root: NodeId, format: OutputFormat) -> Result<Output, String> {
    match format {
        OutputFormat::Json => encode(tree, root, Format::Pretty)
            .map(Output::Text)
            .map_err(|e| e.to_string()),
        OutputFormat::Compact => encode(tree, root, Format::Compact)
            .map(Output::Text)
            .map_err(|e| e.to_string()),
        OutputFormat::Yaml => transcode::yaml::encode(tree, root).map(Output::Text),
        OutputFormat::Toml => transcode::toml::encode(tree, root).map(Output::Text),
        OutputFormat::Cbor => transcode::cbor::encode(tree, root).map(Output::Binary),
        // Rendered from the encoded bytes so the notation shows the wire form.
        OutputFormat::Diag => {
            let bytes = transcode::cbor::encode(tree, root)?;
            transcode::cbor::diagnostic(&bytes).map(Output::Text)
        }
    }
}

fn write_output(output: &[u8], input_file: Option<&str>, options: &Options, text: bool) {
    if let Some(path) = options.output_file {
        if let Err(e) = fs::write(path, output) {
            eprintln!("Error writing {}: {}", path, e);
            process::exit(1);
        }
    } else if options.write_back {
        let Some(input_path) = input_file else {
            eprintln!("Error: --write requires an input file");
            process::exit(1);
        };
        let output_path = Path::new(input_path).with_extension(options.to.extension());
        if let Err(e) = fs::write(&output_path, output) {
            eprintln!("Error writing {}: {}", output_path.display(), e);
            process::exit(1);
        }
        debug!(path = %output_path.display(), "wrote output");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let mut result = handle.write_all(output);
        // Text output always ends with a newline on a terminal stream.
        if result.is_ok() && text && !output.ends_with(b"\n") {
            result = handle.write_all(b"\n");
        }
        if let Err(e) = result {
            eprintln!("Error writing to stdout: {}", e);
            process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        "jtree - JSON command-line tool

USAGE:
    jtree [OPTIONS] [FILE|DIR]

ARGS:
    [FILE|DIR]    Input file or directory (reads from stdin if not provided)
                  When a directory is given, processes every file with the
                  input format's extension in it

OPTIONS:
    -f, --from <FORMAT>    Input format [default: json]
                           Supported: json, yaml, toml, cbor

    -t, --to <FORMAT>      Output format [default: json]
                           Supported: json (tab-indented), compact, yaml, toml,
                                      cbor, diag

    -w, --write            Write output to file with inferred extension

    -o, --output <FILE>    Write output to specified file (not valid with directory input)

    --check                Check if input is valid (exit 0 if valid, 1 if invalid)

    --allow-trailing       Accept content after the JSON document

    --max-depth <N>        Maximum nesting of arrays and objects [default: 1000]

    -h, --help             Print help

    -V, --version          Print version

ENVIRONMENT:
    JTREE_LOG              Log filter for diagnostics on stderr [default: warn]

EXAMPLES:
    # Reformat a JSON file with tab indentation
    jtree data.json

    # Minify
    jtree -t compact data.json

    # Validate all JSON files in a directory
    jtree --check ./configs/

    # Convert JSON to YAML
    jtree -t yaml data.json

    # Convert TOML to JSON
    jtree -f toml config.toml

    # Convert JSON to CBOR (binary)
    jtree -t cbor data.json -o data.cbor

    # View CBOR in diagnostic notation (RFC 8949 §8)
    jtree -f cbor -t diag data.cbor

    # Reformat every JSON file in a directory in place
    jtree -w ./configs/
"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_content_uses_json_whitespace() {
        assert!(!has_trailing_content(b""));
        assert!(!has_trailing_content(b" \t\r\n"));
        assert!(has_trailing_content(b"\x0c"));
        assert!(has_trailing_content(b"\n}"));
    }
}
