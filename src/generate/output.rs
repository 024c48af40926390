use serde::Serialize;

/// Generated position to source position. Lines and columns are 0-indexed;
/// both columns count UTF-16 units, as source map consumers expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mapping {
    pub gen_line: usize,
    pub gen_col: usize,
    pub src_line: usize,
    pub src_col: usize,
}

/// Range type for IDE injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeType {
    JavaScript,
    Html,
}

impl RangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeType::JavaScript => "javascript",
            RangeType::Html => "html",
        }
    }
}

/// Range mapping source to compiled positions, both in UTF-16 units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Range {
    pub range_type: RangeType,
    pub source_start: usize,
    pub source_end: usize,
    pub compiled_start: usize,
    pub compiled_end: usize,
    /// Only ranges whose compiled text equals the source text can be injected.
    /// Literal text is escaped on the way out, so its ranges are informational.
    #[serde(skip)]
    pub needs_injection: bool,
}

/// Computed injection with prefix/suffix for IDE language injection.
/// Editors concatenate prefix + source_content + suffix for each injection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Injection {
    #[serde(rename = "type")]
    pub injection_type: String,
    pub start: usize, // source start (UTF-16)
    pub end: usize,   // source end (UTF-16)
    pub prefix: String,
    pub suffix: String,
}

/// Compute prefix/suffix injections from ranges + compiled code.
/// Injections of one type form a single virtual file:
/// prefix1 + source1 + suffix1 + prefix2 + source2 + ... so only the last
/// injection per type carries a suffix.
pub fn compute_injections(code: &str, ranges: &[Range]) -> Vec<Injection> {
    let units: Vec<u16> = code.encode_utf16().collect();
    let mut injections = Vec::new();

    for range_type in [RangeType::JavaScript, RangeType::Html] {
        let mut typed: Vec<_> = ranges
            .iter()
            .filter(|r| r.range_type == range_type && r.needs_injection)
            .collect();
        typed.sort_by_key(|r| r.source_start);

        let count = typed.len();
        let mut prev_end = 0;
        for (index, range) in typed.into_iter().enumerate() {
            let suffix = if index + 1 == count {
                utf16_slice(&units, range.compiled_end, units.len())
            } else {
                String::new()
            };
            injections.push(Injection {
                injection_type: range_type.as_str().to_string(),
                start: range.source_start,
                end: range.source_end,
                prefix: utf16_slice(&units, prev_end, range.compiled_start),
                suffix,
            });
            prev_end = range.compiled_end;
        }
    }

    injections
}

fn utf16_slice(units: &[u16], start: usize, end: usize) -> String {
    let end = end.min(units.len());
    if start >= end {
        return String::new();
    }
    String::from_utf16_lossy(&units[start..end])
}

/// Output buffer that accumulates generated code with mappings
#[derive(Debug, Default)]
pub struct Output {
    code: String,
    line: usize,
    col: usize,
    utf16_len: usize,
    mappings: Vec<Mapping>,
    ranges: Vec<Range>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add text without mapping. Embedded newlines advance the line count.
    pub fn push(&mut self, text: &str) {
        for ch in text.chars() {
            let units = ch.len_utf16();
            self.utf16_len += units;
            if ch == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += units;
            }
        }
        self.code.push_str(text);
    }

    /// Add text with a mapping from its first character to a source line and
    /// UTF-16 column.
    pub fn push_mapped(&mut self, text: &str, src_line: usize, src_col: usize) -> Mapping {
        let mapping = Mapping {
            gen_line: self.line,
            gen_col: self.col,
            src_line,
            src_col,
        };
        self.mappings.push(mapping.clone());
        self.push(text);
        mapping
    }

    pub fn newline(&mut self) {
        self.push("\n");
    }

    pub fn add_range(&mut self, range: Range) {
        self.ranges.push(range);
    }

    /// Current UTF-16 offset in the output.
    pub fn position(&self) -> usize {
        self.utf16_len
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn finish(self) -> (String, Vec<Mapping>, Vec<Range>) {
        (self.code, self.mappings, self.ranges)
    }
}
