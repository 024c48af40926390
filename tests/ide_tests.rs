use kiln_transpiler::ide::{Language, LanguageRegions, SemanticTokens, TokenType, encode_relative};
use kiln_transpiler::parse;
use kiln_transpiler::syntax::{SyntaxKind, SyntaxNode, SyntaxVisitor, Trivia, walk_all};

/// Collects element names, skipping everything inside code blocks.
#[derive(Default)]
struct ElementNames {
    names: Vec<String>,
    trivia: usize,
}

impl SyntaxVisitor for ElementNames {
    fn visit_trivia(&mut self, _trivia: &Trivia) {
        self.trivia += 1;
    }

    fn enter(&mut self, node: &SyntaxNode) -> bool {
        if let Some(name) = node.tag_name() {
            if node.kind().is_element() {
                self.names.push(name.to_string());
            }
        }
        node.kind() != SyntaxKind::CodeBlock
    }
}

#[test]
fn test_visitor_can_prune_subtrees() {
    let result = parse("<ul class=\"a\"> <li>a</li> @{ <li>b</li> } </ul>").unwrap();
    let mut visitor = ElementNames::default();
    walk_all(result.nodes(), &mut visitor);
    assert_eq!(visitor.names, ["ul", "li"]);
    assert!(visitor.trivia > 0);
}

#[test]
fn test_tokens_cover_template() {
    let result = parse("<p class=\"x\">@name</p>").unwrap();
    let tokens = SemanticTokens::collect(&result);
    let types: Vec<_> = tokens.iter().map(|t| t.token_type).collect();
    assert_eq!(
        types,
        [
            TokenType::Operator,
            TokenType::Tag,
            TokenType::Attribute,
            TokenType::Operator,
            TokenType::String,
            TokenType::String,
            TokenType::String,
            TokenType::Operator,
            TokenType::Operator,
            TokenType::Code,
            TokenType::Operator,
            TokenType::Tag,
            TokenType::Operator,
        ]
    );
    let data = encode_relative(&tokens);
    assert_eq!(data.len(), tokens.len() * 5);
}

#[test]
fn test_tokens_never_span_lines() {
    let result = parse("<!--\nlong\ncomment\n-->\n<pre>\n@{ let a = 1;\nlet b = 2; }\n</pre>").unwrap();
    for token in SemanticTokens::collect(&result) {
        assert!(token.length > 0);
    }
    let lines: Vec<_> = SemanticTokens::collect(&result).iter().map(|t| t.line).collect();
    assert!(lines.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_regions_for_mixed_document() {
    let source = "<p>@x</p><style>p { color: red }</style>";
    let result = parse(source).unwrap();
    let regions: Vec<_> = LanguageRegions::collect(&result)
        .into_iter()
        .map(|r| (r.language, r.start.offset, r.end.offset))
        .collect();
    assert_eq!(
        regions,
        [
            (Language::Html, 0, 3),
            (Language::JavaScript, 4, 5),
            (Language::Html, 5, 16),
            (Language::Css, 16, 32),
            (Language::Html, 32, 40),
        ]
    );
}

#[test]
fn test_visitor_walks_deeply_nested_markup() {
    let depth = 10_000;
    let source = "<li>".repeat(depth) + &"</li>".repeat(depth);
    let result = parse(&source).unwrap();
    let mut visitor = ElementNames::default();
    walk_all(result.nodes(), &mut visitor);
    assert_eq!(visitor.names.len(), depth);
    assert!(SemanticTokens::collect(&result).len() > depth);
}
