use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use codespan_reporting::term::termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use serde::Deserialize;
use tracing::debug;

use mapinfo::{BlockRef, Document, LexOptions, ParseError};

const TEST_EXTENSION: &str = ".test.mapinfo";

#[derive(Debug, Deserialize)]
pub struct ExpectedHeader {
    /// Index of the block in the document.
    pub block: usize,
    /// Zero-based header position.
    pub index: usize,
    #[serde(default)]
    pub number: Option<f32>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectedValue {
    /// Index of the block in the document.
    pub block: usize,
    /// Value name (case-insensitive).
    pub name: String,
    #[serde(default)]
    pub number: Option<f32>,
    #[serde(default)]
    pub text: Option<String>,
    /// The value must not exist.
    #[serde(default)]
    pub absent: bool,
    /// Default handed to the accessor. Without one, the value must exist.
    #[serde(default)]
    pub default: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Lexical options for this file. Defaults to the command line options.
    #[serde(default)]
    pub syntax: Option<LexOptions>,

    /// If true, the test expects parsing to fail.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// Expected parse error: the rendered message must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// If set, the parse error must be reported on this 1-based line.
    #[serde(default)]
    pub expect_error_line: Option<usize>,

    /// Block type names in document order.
    #[serde(default)]
    pub expect_block_types: Option<Vec<String>>,

    #[serde(default)]
    pub expect_header: Vec<ExpectedHeader>,

    #[serde(default)]
    pub expect_value: Vec<ExpectedValue>,
}

impl TestConfig {
    fn expects_failure(&self) -> bool {
        self.expect_parse_error || self.expect_error.is_some() || self.expect_error_line.is_some()
    }
}

/// Split a `.test.mapinfo` file into its TOML config and the MAPINFO body after it.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let (frontmatter, body) = split_frontmatter(content)
        .ok_or("expected a `---` line, TOML config, then a closing `---` line")?;

    let config = toml::from_str(frontmatter).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((config, body))
}

/// Both fences must be whole lines. The body starts on the line after the closing fence.
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let mut lines = content.split_inclusive('\n');
    if lines.next()?.trim_end() != "---" {
        return None;
    }

    let start = content.find('\n')? + 1;
    let mut end = start;
    for line in lines {
        if line.trim_end() == "---" {
            return Some((&content[start..end], &content[end + line.len()..]));
        }
        end += line.len();
    }
    None
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path, options: LexOptions) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    let description = config.description.clone();
    debug!(path = %path.display(), "running test");

    let parse_result = mapinfo::Parser::new(source.to_string(), 0)
        .with_options(config.syntax.unwrap_or(options))
        .parse();

    let reason = match parse_result {
        Err(error) if config.expects_failure() => check_error(&config, &error),
        Err(error) => Some(format!("unexpected parse error: {}", error)),
        Ok(_) if config.expects_failure() => {
            Some("expected parse error, but parsing succeeded".to_string())
        }
        Ok(document) => check_document(&config, &document),
    };

    match reason {
        Some(reason) => fail(description, reason),
        None => TestResult {
            path: path.to_path_buf(),
            description,
            outcome: TestOutcome::Pass,
        },
    }
}

/// Returns `Some(reason)` if the parse error does not match expectations.
fn check_error(config: &TestConfig, error: &ParseError) -> Option<String> {
    let rendered = error.to_string();

    if let Some(expected) = &config.expect_error {
        if !rendered.contains(expected.as_str()) {
            return Some(format!(
                "expected error containing \"{}\", got: {}",
                expected, rendered
            ));
        }
    }

    if let Some(expected_line) = config.expect_error_line {
        if error.line() != expected_line {
            return Some(format!(
                "expected error on line {}, but it is on line {}",
                expected_line,
                error.line()
            ));
        }
    }

    None
}

/// Returns `Some(reason)` on the first expectation the document does not meet.
fn check_document(config: &TestConfig, document: &Document) -> Option<String> {
    if let Some(expected) = &config.expect_block_types {
        let actual: Vec<&str> = document.blocks().map(|b| b.type_name()).collect();
        if actual != *expected {
            return Some(format!(
                "block types mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            ));
        }
    }

    for (i, header) in config.expect_header.iter().enumerate() {
        let Some(block) = document.block(header.block) else {
            return Some(format!("expect_header[{}]: no block {}", i, header.block));
        };
        if let Some(reason) = check_header(&block, header) {
            return Some(format!("expect_header[{}]: {}", i, reason));
        }
    }

    for (i, value) in config.expect_value.iter().enumerate() {
        let Some(block) = document.block(value.block) else {
            return Some(format!("expect_value[{}]: no block {}", i, value.block));
        };
        if let Some(reason) = check_value(&block, value) {
            return Some(format!("expect_value[{}]: {}", i, reason));
        }
    }

    None
}

fn check_header(block: &BlockRef<'_>, expected: &ExpectedHeader) -> Option<String> {
    if let Some(number) = expected.number {
        match block.required_header_number(expected.index) {
            Ok(actual) if actual == number => {}
            Ok(actual) => {
                return Some(format!(
                    "header {} is {}, expected {}",
                    expected.index, actual, number
                ));
            }
            Err(error) => return Some(error.message),
        }
    }

    if let Some(text) = &expected.text {
        match block.required_header_str(expected.index) {
            Ok(actual) if actual == text.as_str() => {}
            Ok(actual) => {
                return Some(format!(
                    "header {} is \"{}\", expected \"{}\"",
                    expected.index, actual, text
                ));
            }
            Err(error) => return Some(error.message),
        }
    }

    None
}

fn check_value(block: &BlockRef<'_>, expected: &ExpectedValue) -> Option<String> {
    let exists = block.value(&expected.name).is_some();

    if expected.absent {
        return exists.then(|| format!("value '{}' should be absent", expected.name));
    }
    if !exists && expected.default.is_none() {
        return Some(format!(
            "value '{}' not found in block {}",
            expected.name, expected.block
        ));
    }

    if let Some(number) = expected.number {
        let actual = block.single_number_value(&expected.name, expected.default.unwrap_or(0.0));
        if actual != number {
            return Some(format!(
                "value '{}' is {}, expected {}",
                expected.name, actual, number
            ));
        }
    }

    if let Some(text) = &expected.text {
        let actual = block.single_str_value(&expected.name, "");
        if actual != text.as_str() {
            return Some(format!(
                "value '{}' is \"{}\", expected \"{}\"",
                expected.name, actual, text
            ));
        }
    }

    None
}

/// Test files under `root` keyed by the folder they sit in, relative to `root` and
/// `/`-separated. Files directly in `root` land under "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories = BTreeMap::<String, Vec<PathBuf>>::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|entry| entry.path()) {
            if path.is_dir() {
                pending.push(path);
            } else if is_test_file(&path) {
                let category = category_of(root, &path);
                categories.entry(category).or_default().push(path);
            }
        }
    }

    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(TEST_EXTENSION))
}

fn category_of(root: &Path, file: &Path) -> String {
    let Some(dir) = file.parent().and_then(|dir| dir.strip_prefix(root).ok()) else {
        return String::new();
    };
    dir.components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn category_name(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_EXTENSION, path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_name(category), files.len());
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Writes the PASS/FAIL report to stderr, colored unless disabled.
struct Reporter {
    out: StandardStream,
}

impl Reporter {
    fn new(no_color: bool) -> Self {
        let choice = if no_color { ColorChoice::Never } else { ColorChoice::Auto };
        Reporter {
            out: StandardStream::stderr(choice),
        }
    }

    fn painted(&mut self, text: &str, spec: &ColorSpec) -> io::Result<()> {
        self.out.set_color(spec)?;
        write!(self.out, "{}", text)?;
        self.out.reset()
    }

    fn heading(&mut self, category: &str) -> io::Result<()> {
        writeln!(self.out)?;
        self.painted(category_name(category), ColorSpec::new().set_bold(true))?;
        writeln!(self.out)
    }

    fn result(&mut self, result: &TestResult) -> io::Result<()> {
        let (label, color) = match result.outcome {
            TestOutcome::Pass => ("PASS", Color::Green),
            TestOutcome::Fail(_) => ("FAIL", Color::Red),
        };
        write!(self.out, "  ")?;
        self.painted(label, ColorSpec::new().set_fg(Some(color)))?;
        writeln!(self.out, "  {}", label_for(result))
    }

    fn failures(&mut self, failures: &[TestResult]) -> io::Result<()> {
        if failures.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "\nfailures:")?;
        for failure in failures {
            writeln!(self.out, "\n  --- {} ---", failure.path.display())?;
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    writeln!(self.out, "  {}", line)?;
                }
            }
        }
        Ok(())
    }

    fn summary(&mut self, passed: usize, failed: usize) -> io::Result<()> {
        write!(self.out, "\ntest result: ")?;
        if failed == 0 {
            self.painted("ok", ColorSpec::new().set_fg(Some(Color::Green)))?;
            writeln!(self.out, ". {} passed, 0 failed", passed)
        } else {
            self.painted("FAILED", ColorSpec::new().set_fg(Some(Color::Red)))?;
            writeln!(
                self.out,
                ". {} passed, {} failed (of {})",
                passed,
                failed,
                passed + failed
            )
        }
    }
}

fn label_for<'a>(result: &'a TestResult) -> &'a str {
    result.description.as_deref().unwrap_or_else(|| {
        result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_suffix(TEST_EXTENSION))
            .unwrap_or("?")
    })
}

/// Select the categories to run. Requested names match a category or any of its subfolders.
fn filter_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut filtered = BTreeMap::new();
    for requested in requested {
        let req = requested.trim_matches('/');
        let mut found = false;
        for (cat, files) in all {
            if cat == req || cat.starts_with(&format!("{}/", req)) {
                filtered.insert(cat.as_str(), files);
                found = true;
            }
        }
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| category_name(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    filtered
}

/// Run the test file at `path`, or every test file under it, optionally limited to
/// `categories`. Returns the process exit code: 0 when everything passed, 1 otherwise.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String], options: LexOptions) -> i32 {
    let mut reporter = Reporter::new(no_color);
    match run_and_report(&mut reporter, path, categories, options) {
        Ok(all_passed) => i32::from(!all_passed),
        Err(error) => {
            eprintln!("error: cannot write test report: {}", error);
            1
        }
    }
}

fn run_and_report(
    reporter: &mut Reporter,
    path: &Path,
    categories: &[String],
    options: LexOptions,
) -> io::Result<bool> {
    let mut tally = Tally::default();

    if path.is_file() {
        tally.record(reporter, run_single_test(path, options))?;
    } else {
        let all_categories = discover_categorized(path);
        if all_categories.is_empty() {
            eprintln!("no {} files found in {}", TEST_EXTENSION, path.display());
            return Ok(false);
        }

        let selected = filter_categories(&all_categories, categories);
        if selected.is_empty() {
            eprintln!("no matching categories found");
            return Ok(false);
        }

        for (category, files) in &selected {
            reporter.heading(category)?;
            for file in *files {
                tally.record(reporter, run_single_test(file, options))?;
            }
        }
    }

    reporter.failures(&tally.failures)?;
    reporter.summary(tally.passed, tally.failures.len())?;
    Ok(tally.failures.is_empty())
}

#[derive(Default)]
struct Tally {
    passed: usize,
    failures: Vec<TestResult>,
}

impl Tally {
    fn record(&mut self, reporter: &mut Reporter, result: TestResult) -> io::Result<()> {
        reporter.result(&result)?;
        if matches!(result.outcome, TestOutcome::Pass) {
            self.passed += 1;
        } else {
            self.failures.push(result);
        }
        Ok(())
    }
}
