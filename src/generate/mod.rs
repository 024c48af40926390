mod context;
mod javascript;
mod output;
mod sourcemap;
mod utf16;

pub use context::{GeneratorContext, GeneratorState};
pub use javascript::JavaScriptGenerator;
pub use output::{Injection, Mapping, Output, Range, RangeType, compute_injections};
pub use sourcemap::{NoopSourceMapWriter, SourceMap, SourceMapWriter};
pub use utf16::Utf16Offsets;

use crate::parser::ParserResult;
use serde::Serialize;

pub const DEFAULT_FUNCTION_NAME: &str = "render";
pub const DEFAULT_FILE_PATH: &str = "template.kiln";

/// Generator options
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Name of the exported render function (default `render`).
    pub function_name: Option<String>,
    /// Source path recorded in mappings (default `template.kiln`).
    pub file_path: Option<String>,
    /// Collect IDE ranges and injections.
    pub include_ranges: bool,
}

impl GenerateOptions {
    pub fn function_name(&self) -> &str {
        self.function_name.as_deref().unwrap_or(DEFAULT_FUNCTION_NAME)
    }

    pub fn file_path(&self) -> &str {
        self.file_path.as_deref().unwrap_or(DEFAULT_FILE_PATH)
    }
}

/// Generation result
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResult {
    pub code: String,
    pub mappings: Vec<Mapping>,
    pub ranges: Vec<Range>,
    pub injections: Vec<Injection>,
}

/// Generator trait - lowers a parsed template to code.
///
/// Generation never fails: a tree with error diagnostics still produces
/// output for everything that was recognized.
pub trait Generator {
    fn generate_with_writer(
        &self,
        result: &ParserResult,
        options: &GenerateOptions,
        writer: &mut dyn SourceMapWriter,
    ) -> GenerateResult;

    fn generate(&self, result: &ParserResult, options: &GenerateOptions) -> GenerateResult {
        self.generate_with_writer(result, options, &mut NoopSourceMapWriter)
    }
}
