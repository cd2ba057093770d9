mod error;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mapinfo::{BlockRef, Document, LexOptions, Lexer, Token, TokenKind, TokenRef};

use crate::error::CliError;

const SUBCOMMANDS: &[&str] = &["check", "tokens", "dump", "list-blocks", "test", "help"];

#[derive(Parser)]
#[command(name = "mapinfo", version, about = "MAPINFO parser and inspector")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log more (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    syntax: SyntaxArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct SyntaxArgs {
    /// TOML file with lexical options (line_comments, block_comments, hex_numbers)
    #[arg(long, global = true, value_name = "FILE")]
    syntax: Option<PathBuf>,

    /// Do not treat `//` as a comment
    #[arg(long, global = true)]
    no_line_comments: bool,

    /// Do not treat `/* */` as a comment
    #[arg(long, global = true)]
    no_block_comments: bool,

    /// Do not accept `0x` hexadecimal numbers
    #[arg(long, global = true)]
    no_hex: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a MAPINFO file (exit 0 if valid)
    Check(FileArgs),

    /// Print the token stream
    Tokens(FileArgs),

    /// Print every block with its header and values
    Dump(FileArgs),

    /// List blocks, optionally filtered by type
    ListBlocks(ListArgs),

    /// Run .test.mapinfo test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct FileArgs {
    /// MAPINFO source file
    file: PathBuf,
}

#[derive(clap::Args)]
struct ListArgs {
    /// MAPINFO source file
    file: PathBuf,

    /// Only list blocks of this type (case-insensitive)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    block_type: Option<String>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.mapinfo file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let args = with_default_subcommand(std::env::args().collect());
    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let options = match cli.syntax.resolve() {
        Ok(options) => options,
        Err(error) => {
            eprintln!("error: {}", error);
            process::exit(1);
        }
    };
    debug!(?options, "lexical options");

    let mut session = Session {
        files: SimpleFiles::new(),
        options,
        color_choice,
    };

    let result = match cli.command {
        Command::Check(args) => session.check(&args.file),
        Command::Tokens(args) => session.print_tokens(&args.file),
        Command::Dump(args) => session.dump(&args.file),
        Command::ListBlocks(args) => session.list_blocks(&args.file, args.block_type.as_deref()),
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                return;
            }
            let exit_code =
                test_runner::run_tests(&args.path, cli.no_color, &args.category, options);
            process::exit(exit_code);
        }
    };

    if let Err(error) = result {
        session.report(&error);
        process::exit(1);
    }
}

/// A bare `mapinfo FILE` behaves like `mapinfo check FILE`.
fn with_default_subcommand(mut args: Vec<String>) -> Vec<String> {
    let first_positional = (1..args.len())
        .find(|&i| !args[i].starts_with('-') && args[i - 1] != "--syntax");

    if let Some(pos) = first_positional {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "check".to_string());
        }
    }
    args
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mapinfo={level},mapinfo_cli={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl SyntaxArgs {
    fn resolve(&self) -> Result<LexOptions, CliError> {
        let mut options = match &self.syntax {
            Some(path) => {
                let text = read_source(path)?;
                toml::from_str(&text).map_err(|source| CliError::Syntax {
                    path: path.display().to_string(),
                    source,
                })?
            }
            None => LexOptions::default(),
        };

        if self.no_line_comments {
            options.line_comments = false;
        }
        if self.no_block_comments {
            options.block_comments = false;
        }
        if self.no_hex {
            options.hex_numbers = false;
        }
        Ok(options)
    }
}

fn read_source(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

struct Session {
    files: SimpleFiles<String, String>,
    options: LexOptions,
    color_choice: ColorChoice,
}

impl Session {
    fn add_file(&mut self, path: &Path) -> Result<(usize, String), CliError> {
        let source = read_source(path)?;
        let file_id = self.files.add(path.display().to_string(), source.clone());
        Ok((file_id, source))
    }

    fn load(&mut self, path: &Path) -> Result<Document, CliError> {
        let (file_id, source) = self.add_file(path)?;
        let document = mapinfo::Parser::new(source, file_id)
            .with_options(self.options)
            .parse()?;
        Ok(document)
    }

    fn check(&mut self, path: &Path) -> Result<(), CliError> {
        let document = self.load(path)?;
        eprintln!(
            "ok: {} parsed ({} blocks, {} tokens)",
            path.display(),
            document.block_count(),
            document.tokens().len()
        );
        Ok(())
    }

    fn print_tokens(&mut self, path: &Path) -> Result<(), CliError> {
        let (file_id, source) = self.add_file(path)?;
        let mut lexer = Lexer::new(&source, self.options, file_id);

        loop {
            let token = lexer.next_token()?;
            if token.kind == TokenKind::Null {
                break;
            }
            println!("{}", format_token(&source, &token));
        }
        Ok(())
    }

    fn dump(&mut self, path: &Path) -> Result<(), CliError> {
        let document = self.load(path)?;
        for (i, block) in document.blocks().enumerate() {
            if i > 0 {
                println!();
            }
            println!("{} {{", block_heading(&document, &block));
            for value in block.values() {
                let data: Vec<&str> = value.data().map(|d| raw_text(&document, &d)).collect();
                if data.is_empty() {
                    println!("    {}", raw_text(&document, &value));
                } else {
                    println!("    {} = {}", raw_text(&document, &value), data.join(", "));
                }
            }
            println!("}}");
        }
        Ok(())
    }

    fn list_blocks(&mut self, path: &Path, block_type: Option<&str>) -> Result<(), CliError> {
        let document = self.load(path)?;
        let blocks = document
            .blocks()
            .filter(|block| block_type.is_none_or(|name| block.is_type(name)));

        for block in blocks {
            println!("{:>4}  {}", block.index(), block_heading(&document, &block));
        }
        Ok(())
    }

    fn report(&self, error: &CliError) {
        let CliError::Parse(parse_error) = error else {
            eprintln!("error: {}", error);
            return;
        };

        let writer = StandardStream::stderr(self.color_choice);
        let config = term::Config::default();
        let diagnostic = parse_error.to_diagnostic();
        if term::emit_to_write_style(&mut writer.lock(), &config, &self.files, &diagnostic).is_err()
        {
            eprintln!("{}", parse_error);
        }
    }
}

/// `L:C  Kind  text`, 1-based, with the value appended for numbers.
fn format_token(source: &str, token: &Token) -> String {
    let raw = source.get(token.span()).unwrap_or_default();
    let location = format!("{}:{}", token.begin.line + 1, token.begin.column + 1);
    match token.kind {
        TokenKind::Number => format!("{:<9} {:<11} {} ({})", location, token.kind, raw, token.number),
        _ => format!("{:<9} {:<11} {}", location, token.kind, raw),
    }
}

/// The token as written, quotes included.
fn raw_text<'a>(document: &'a Document, token: &TokenRef<'a>) -> &'a str {
    document.source().get(token.token().span()).unwrap_or_default()
}

fn block_heading(document: &Document, block: &BlockRef<'_>) -> String {
    let mut heading = block.type_name().to_string();
    for header in block.header_tokens() {
        heading.push(' ');
        heading.push_str(raw_text(document, &header));
    }
    heading
}
