//! Structural invariants checked over every fixture and a set of malformed
//! inputs. One trial per (input, invariant) pair.
//!
//! Run with: cargo test --test invariants

use kiln_transpiler::generate::{GeneratorContext, NoopSourceMapWriter};
use kiln_transpiler::{
    GenerateOptions, JavaScriptGenerator, Pipeline, SourceMap, SyntaxKind, parse,
};
use libtest_mimic::{Arguments, Failed, Trial};
use std::fs;

/// Inputs that exercise recovery paths.
const MALFORMED: &[(&str, &str)] = &[
    ("unterminated_attribute", "<div class=\"a>"),
    ("unclosed_block", "@{ if (x) { <p>@x"),
    ("stray_braces", "}}{ @{ } } }"),
    ("orphan_end_tags", "</a></b><br></br>"),
    ("bare_transitions", "@ @( @@@ a@b @"),
    ("unterminated_comment", "<!-- <p>"),
    ("unterminated_cdata", "<![CDATA[ x"),
    ("bad_declaration", "<!foo"),
    ("script_at_eof", "<script>var a = \"</scr"),
    ("nested_unclosed", "<ul><li><b>x</ul></li>"),
    ("attribute_soup", "<a =\"x\" 'y' b= c=\"@d\" e==f>"),
    ("code_strings", "@{ var s = \"}\"; /* } */ // }\n }"),
    ("lone_lt", "a < b <"),
];

type Check = fn(&str) -> Result<(), Failed>;

const INVARIANTS: &[(&str, Check)] = &[
    ("round_trip", check_round_trip),
    ("termination", check_termination),
    ("stack_balance", check_stack_balance),
    ("mapping_order", check_mapping_order),
];

fn check_round_trip(source: &str) -> Result<(), Failed> {
    let result = parse(source)?;
    let rebuilt = result.to_source();
    if rebuilt != source {
        return Err(format!("source {:?} rebuilt as {:?}", source, rebuilt).into());
    }
    Ok(())
}

fn check_termination(source: &str) -> Result<(), Failed> {
    let result = parse(source)?;
    match result.nodes().last().map(|n| n.kind()) {
        Some(SyntaxKind::EndOfFile) => {}
        other => return Err(format!("last node is {:?}, expected EndOfFile", other).into()),
    }
    let documents = result.nodes().iter().filter(|n| n.kind() == SyntaxKind::Document).count();
    if documents != 1 {
        return Err(format!("{} document nodes", documents).into());
    }
    Ok(())
}

fn check_stack_balance(source: &str) -> Result<(), Failed> {
    let result = parse(source)?;
    let generator = JavaScriptGenerator::new();
    let mut writer = NoopSourceMapWriter;
    let mut ctx = GeneratorContext::new("invariant.kiln", &mut writer, source, false);
    for node in result.nodes() {
        generator.emit(node, &mut ctx);
        if ctx.depth() != 0 {
            return Err(format!("state stack depth {} after {:?}", ctx.depth(), node.kind()).into());
        }
    }
    if ctx.max_depth() == 0 {
        return Err("document never entered a generator state".into());
    }
    Ok(())
}

fn check_mapping_order(source: &str) -> Result<(), Failed> {
    let mut map = SourceMap::new();
    let output = Pipeline::standard().compile_with_writer(source, &GenerateOptions::default(), &mut map)?;
    let mappings = &output.generated.mappings;
    if map.len() != mappings.len() {
        return Err(format!("writer saw {} mappings, result has {}", map.len(), mappings.len()).into());
    }
    for pair in mappings.windows(2) {
        if (pair[0].gen_line, pair[0].gen_col) > (pair[1].gen_line, pair[1].gen_col) {
            return Err(format!("mappings out of order: {:?} then {:?}", pair[0], pair[1]).into());
        }
    }
    Ok(())
}

fn inputs() -> Vec<(String, String)> {
    let pattern = format!("{}/tests/fixtures/**/*.kiln", env!("CARGO_MANIFEST_DIR"));
    let mut inputs: Vec<(String, String)> = glob::glob(&pattern)
        .expect("valid glob pattern")
        .filter_map(Result::ok)
        .filter_map(|path| {
            let name = path.file_stem()?.to_str()?.to_string();
            let source = fs::read_to_string(&path).ok()?;
            Some((format!("fixture::{}", name), source))
        })
        .collect();
    inputs.extend(
        MALFORMED
            .iter()
            .map(|(name, source)| (format!("malformed::{}", name), source.to_string())),
    );
    inputs
}

fn main() {
    let args = Arguments::from_args();

    let mut trials = Vec::new();
    for (name, source) in inputs() {
        for (invariant, check) in INVARIANTS {
            let source = source.clone();
            let check = *check;
            trials.push(Trial::test(format!("{}::{}", name, invariant), move || check(&source)));
        }
    }

    libtest_mimic::run(&args, trials).exit();
}
