//! Source map collection and Source Map v3 serialization.

use super::output::Mapping;
use serde_json::json;

/// Receives one call per mapping the generator emits, in generated order.
pub trait SourceMapWriter {
    fn add_mapping(&mut self, file_path: &str, mapping: &Mapping);
}

/// Default writer for callers that only want the generated code.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSourceMapWriter;

impl SourceMapWriter for NoopSourceMapWriter {
    fn add_mapping(&mut self, _file_path: &str, _mapping: &Mapping) {}
}

/// Collecting writer.
#[derive(Debug, Default, Clone)]
pub struct SourceMap {
    sources: Vec<String>,
    entries: Vec<(usize, Mapping)>,
}

impl SourceMapWriter for SourceMap {
    fn add_mapping(&mut self, file_path: &str, mapping: &Mapping) {
        let index = match self.sources.iter().position(|s| s == file_path) {
            Some(index) => index,
            None => {
                self.sources.push(file_path.to_string());
                self.sources.len() - 1
            }
        };
        self.entries.push((index, mapping.clone()));
    }
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.entries.iter().map(|(_, mapping)| mapping)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `mappings` field: `;` between generated lines, `,` between
    /// segments, each segment four base64 VLQ deltas.
    pub fn encode_mappings(&self) -> String {
        let mut entries: Vec<&(usize, Mapping)> = self.entries.iter().collect();
        entries.sort_by_key(|(_, m)| (m.gen_line, m.gen_col));

        let mut out = String::new();
        let mut line = 0;
        let mut prev_gen_col = 0i64;
        let mut prev_source = 0i64;
        let mut prev_src_line = 0i64;
        let mut prev_src_col = 0i64;
        let mut first_in_line = true;

        for (source, mapping) in entries {
            while line < mapping.gen_line {
                out.push(';');
                line += 1;
                prev_gen_col = 0;
                first_in_line = true;
            }
            if !first_in_line {
                out.push(',');
            }
            first_in_line = false;

            let gen_col = mapping.gen_col as i64;
            let source = *source as i64;
            let src_line = mapping.src_line as i64;
            let src_col = mapping.src_col as i64;
            encode_vlq(&mut out, gen_col - prev_gen_col);
            encode_vlq(&mut out, source - prev_source);
            encode_vlq(&mut out, src_line - prev_src_line);
            encode_vlq(&mut out, src_col - prev_src_col);
            prev_gen_col = gen_col;
            prev_source = source;
            prev_src_line = src_line;
            prev_src_col = src_col;
        }
        out
    }

    /// Source Map v3 document for the generated file `file`.
    pub fn to_json(&self, file: &str) -> String {
        json!({
            "version": 3,
            "file": file,
            "sources": self.sources,
            "names": [],
            "mappings": self.encode_mappings(),
        })
        .to_string()
    }
}

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq = (if value < 0 { ((-value) << 1) | 1 } else { value << 1 }) as u64;
    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}
