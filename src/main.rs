use clap::{Parser, Subcommand};
use kiln_transpiler::{CompileError, Diagnostic, GenerateOptions, Pipeline, SourceMap};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Kiln - HTML templates with embedded JavaScript")]
struct Cli {
    /// Log verbosity: -v for debug, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate JavaScript from .kiln files
    Generate {
        /// Path to .kiln file or directory
        #[arg(required_unless_present = "stdin")]
        file: Option<PathBuf>,

        /// Read from stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON with mappings and diagnostics (stdin only)
        #[arg(long)]
        json: bool,

        /// Include IDE ranges and injections in JSON output
        #[arg(long)]
        ranges: bool,

        /// Name of the exported render function
        #[arg(long)]
        function_name: Option<String>,

        /// Also write a .js.map source map next to each generated file
        #[arg(long)]
        source_map: bool,
    },
    /// Report diagnostics for .kiln files; exits non-zero on errors
    Check {
        /// Path to .kiln file or directory
        path: PathBuf,

        /// Output diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the syntax tree of a .kiln file
    Tree {
        file: PathBuf,
    },
}

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Generate { file, stdin, json, ranges, function_name, source_map } => {
            let options = GenerateOptions {
                function_name,
                file_path: None,
                include_ranges: ranges,
            };
            if stdin {
                generate_stdin(json, options)
            } else if let Some(path) = file {
                generate_path(&path, options, source_map)
            } else {
                Err(CompileError::Input {
                    path: PathBuf::from("."),
                    message: "provide a file/directory or use --stdin".to_string(),
                })
            }
        }
        Commands::Check { path, json } => check_path(&path, json),
        Commands::Tree { file } => print_tree(&file),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn is_template(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "kiln")
}

/// Every .kiln file under `path` (or `path` itself).
fn template_files(path: &Path) -> Result<Vec<PathBuf>, CompileError> {
    if path.is_file() {
        if !is_template(path) {
            return Err(CompileError::Input {
                path: path.to_path_buf(),
                message: "not a .kiln file".to_string(),
            });
        }
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(CompileError::Input {
            path: path.to_path_buf(),
            message: "does not exist".to_string(),
        });
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| is_template(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(CompileError::Input {
            path: path.to_path_buf(),
            message: "no .kiln files found".to_string(),
        });
    }
    Ok(files)
}

fn read_template(path: &Path) -> Result<String, CompileError> {
    fs::read_to_string(path).map_err(|source| CompileError::Read { path: path.to_path_buf(), source })
}

fn write_output(path: &Path, contents: &str) -> Result<(), CompileError> {
    fs::write(path, contents).map_err(|source| CompileError::Write { path: path.to_path_buf(), source })
}

fn generate_stdin(json_output: bool, options: GenerateOptions) -> Result<bool, CompileError> {
    let mut source = String::new();
    io::stdin().read_to_string(&mut source).map_err(CompileError::Stdin)?;

    let output = Pipeline::standard().compile(&source, &options)?;

    if json_output {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print!("{}", output.generated.code);
        print_diagnostics(&output.diagnostics, &source, "<stdin>");
    }
    Ok(!output.has_errors())
}

fn generate_path(path: &Path, options: GenerateOptions, source_map: bool) -> Result<bool, CompileError> {
    let start = Instant::now();
    let files = template_files(path)?;
    let pipeline = Pipeline::standard();

    let mut clean = true;
    for file in &files {
        clean &= generate_file(&pipeline, file, &options, source_map)?;
    }

    print_summary(files.len(), start.elapsed());
    Ok(clean)
}

fn generate_file(
    pipeline: &Pipeline,
    path: &Path,
    options: &GenerateOptions,
    source_map: bool,
) -> Result<bool, CompileError> {
    let source = read_template(path)?;
    let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or("template.kiln");
    let options = GenerateOptions {
        file_path: Some(file_name.to_string()),
        ..options.clone()
    };

    let output_path = path.with_extension("js");
    let mut map = SourceMap::new();
    let output = pipeline.compile_with_writer(&source, &options, &mut map)?;
    print_diagnostics(&output.diagnostics, &source, file_name);

    let mut code = output.generated.code.clone();
    if source_map {
        let map_path = path.with_extension("js.map");
        let js_name = output_path.file_name().and_then(|s| s.to_str()).unwrap_or("template.js");
        write_output(&map_path, &map.to_json(js_name))?;
        if let Some(map_name) = map_path.file_name().and_then(|s| s.to_str()) {
            code.push_str(&format!("//# sourceMappingURL={}\n", map_name));
        }
    }

    write_output(&output_path, &code)?;
    print_generated(&output_path.display().to_string());
    Ok(!output.has_errors())
}

fn check_path(path: &Path, json_output: bool) -> Result<bool, CompileError> {
    let pipeline = Pipeline::standard();
    let mut reports = Vec::new();
    let mut error_count = 0;

    for file in template_files(path)? {
        let source = read_template(&file)?;
        let parsed = pipeline.parse(&source)?;
        error_count += parsed.errors().count();

        if json_output {
            reports.push(serde_json::json!({
                "file": file.display().to_string(),
                "diagnostics": parsed.diagnostics(),
            }));
        } else {
            let name = file.display().to_string();
            print_diagnostics(parsed.diagnostics(), &source, &name);
        }
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else if error_count == 0 {
        eprintln!("No errors found");
    } else {
        let noun = if error_count == 1 { "error" } else { "errors" };
        eprintln!("{} {} found", error_count, noun);
    }
    Ok(error_count == 0)
}

fn print_tree(path: &Path) -> Result<bool, CompileError> {
    let source = read_template(path)?;
    let parsed = Pipeline::standard().parse(&source)?;
    print!("{}", parsed.dump());
    for diagnostic in parsed.diagnostics() {
        println!("{}", diagnostic);
    }
    Ok(!parsed.has_errors())
}

fn print_diagnostics(diagnostics: &[Diagnostic], source: &str, filename: &str) {
    let color = io::stderr().is_terminal();
    for diagnostic in diagnostics {
        if color {
            eprint!("{}", diagnostic.render_color(source, filename));
        } else {
            eprint!("{}", diagnostic.render(source, filename));
        }
    }
}

fn print_generated(path: &str) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("  \x1b[32m✓\x1b[0m {}", path);
    } else {
        eprintln!("  ✓ {}", path);
    }
}

fn print_summary(count: usize, elapsed: std::time::Duration) {
    let is_tty = io::stderr().is_terminal();
    let time_str = format_duration(elapsed);
    let files_word = if count == 1 { "file" } else { "files" };

    if is_tty {
        eprintln!("\n\x1b[1mGenerated {} {} in {}\x1b[0m", count, files_word, time_str);
    } else {
        eprintln!("\nGenerated {} {} in {}", count, files_word, time_str);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
