//! Binary to generate/update .expected.js and .expected.json files
//!
//! Usage:
//!   cargo run --bin accept_expected            # Update all
//!   cargo run --bin accept_expected -- basic   # Update only fixtures matching "basic"

use kiln_transpiler::{GenerateOptions, Pipeline};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

fn main() {
    let filter: Option<String> = std::env::args().nth(1);
    let fixture_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");

    let pipeline = Pipeline::standard();
    let mut updated = 0;
    let mut skipped = 0;

    for entry in WalkDir::new(&fixture_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|s| s == "kiln"))
    {
        let path = entry.path();

        if let Some(f) = &filter {
            if !path.to_string_lossy().contains(f.as_str()) {
                skipped += 1;
                continue;
            }
        }

        process_file(&pipeline, path);
        updated += 1;
    }

    println!("Updated {} files, skipped {}", updated, skipped);
}

fn process_file(pipeline: &Pipeline, path: &Path) {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {:?}: {}", path, e);
            return;
        }
    };

    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("render");
    let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or("template.kiln");

    let options = GenerateOptions {
        function_name: Some(name.to_string()),
        file_path: Some(file_name.to_string()),
        include_ranges: true,
    };

    let output = match pipeline.compile(&source, &options) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("ERROR: {:?} failed to compile: {}", path, e);
            return;
        }
    };

    write_file(&path.with_extension("expected.js"), &output.generated.code);

    let json = serde_json::json!({
        "diagnostics": output.diagnostics,
        "injections": output.generated.injections,
        "ranges": output.generated.ranges,
    });
    match serde_json::to_string_pretty(&json) {
        Ok(text) => write_file(&path.with_extension("expected.json"), &format!("{}\n", text)),
        Err(e) => eprintln!("Failed to serialize {:?}: {}", path, e),
    }
}

fn write_file(path: &Path, contents: &str) {
    if let Err(e) = fs::write(path, contents) {
        eprintln!("Failed to write {:?}: {}", path, e);
    } else {
        println!("  wrote {}", path.display());
    }
}
