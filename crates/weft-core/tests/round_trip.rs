//! End-to-end round-trip and rewrite behavior over a hand-built source unit.
//!
//! Plays the role of a front end: builds the lossless tree for a fixed
//! source text, span bookkeeping included, then drives visitors, markers,
//! and type attribution over it the way a transformation pipeline would.

use std::sync::Arc;

use biome_text_size::{TextRange, TextSize};
use weft_core::{
    FindSourceFiles, Marker, MarkerBus, Node, NodeKind, PreVisit, RawType, SemType, SourceStyle,
    Traversal, TreeBuilder, TreeVisitor, TypeCache, TypeSignature, TypeSource, print,
    validate_spans,
};

const SOURCE: &str = "// demo\nclass Foo {\n    int x = 1;\n}\n";

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::from(start), TextSize::from(end))
}

/// What a front end would hand over for `SOURCE`
fn parse_fixture() -> Arc<Node> {
    let literal = TreeBuilder::new(NodeKind::Literal)
        .token(" ", "1")
        .span(range(31, 33))
        .build();
    let field = TreeBuilder::new(NodeKind::FieldDecl)
        .prefix("\n    ")
        .token("", "int")
        .token(" ", "x")
        .token(" ", "=")
        .child(literal)
        .token("", ";")
        .span(range(19, 34))
        .build();
    let block = TreeBuilder::new(NodeKind::Block)
        .token(" ", "{")
        .child(field)
        .token("\n", "}")
        .span(range(17, 36))
        .build();
    let class = TreeBuilder::new(NodeKind::ClassDecl)
        .prefix("// demo\n")
        .token("", "class")
        .token(" ", "Foo")
        .child(block)
        .span(range(0, 36))
        .build();
    TreeBuilder::new(NodeKind::CompilationUnit)
        .child(class)
        .suffix("\n")
        .span(range(0, SOURCE.len() as u32))
        .path("src/Foo.java")
        .build()
}

#[test]
fn freshly_parsed_tree_prints_byte_identical() {
    let tree = parse_fixture();
    validate_spans(&tree, SOURCE.len()).unwrap();
    assert_eq!(print(&tree), SOURCE);
}

#[test]
fn detected_style_matches_the_fixture() {
    let style = SourceStyle::detect(SOURCE);
    assert_eq!(style.indent_text(1), "    ");
    assert_eq!(style.line_ending.as_str(), "\n");
}

/// Replaces integer literals with a new value, leaving formatting alone
struct BumpLiteral {
    to: String,
}

impl TreeVisitor<()> for BumpLiteral {
    fn pre_visit(
        &mut self,
        node: &Arc<Node>,
        _cursor: &weft_core::Cursor,
        _ctx: &mut (),
    ) -> PreVisit {
        if node.kind() == NodeKind::Literal {
            let prefix = node.children()[0].as_token().unwrap().prefix.clone();
            return PreVisit::Replace(
                TreeBuilder::new(NodeKind::Literal)
                    .token(prefix, self.to.clone())
                    .build(),
            );
        }
        PreVisit::Descend(Arc::clone(node))
    }
}

#[test]
fn rewrite_touches_only_the_replaced_bytes() {
    let tree = parse_fixture();
    let out = Traversal::new()
        .run(&tree, &mut BumpLiteral { to: "2".into() }, &mut ())
        .unwrap();

    assert_eq!(print(&out), "// demo\nclass Foo {\n    int x = 2;\n}\n");
    // the input tree still prints the original bytes
    assert_eq!(print(&tree), SOURCE);
    // root identity survives the rewrite
    assert!(out.same_node(&tree));
}

#[test]
fn rewrite_to_identical_text_preserves_bytes() {
    let tree = parse_fixture();
    let once = Traversal::new()
        .run(&tree, &mut BumpLiteral { to: "1".into() }, &mut ())
        .unwrap();
    let twice = Traversal::new()
        .run(&once, &mut BumpLiteral { to: "1".into() }, &mut ())
        .unwrap();
    // the second pass replaced "1" with "1" again, producing new nodes but
    // identical bytes
    assert_eq!(print(&twice), print(&once));
    assert_eq!(print(&once), SOURCE);
}

#[test]
fn markers_never_change_printed_output() {
    let tree = parse_fixture();
    let before = print(&tree);

    let mut markers = MarkerBus::new();
    markers.search(&tree, "demo search");
    markers.attach(tree.id(), Marker::Generated);

    assert_eq!(print(&tree), before);
    let pairs: Vec<_> = markers.iter().collect();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].0, tree.id());
}

#[test]
fn file_matcher_short_circuits_on_the_root() {
    let tree = parse_fixture();
    let mut markers = MarkerBus::new();
    let mut matcher = FindSourceFiles::new("src/**/*.java").unwrap();
    Traversal::new().run(&tree, &mut matcher, &mut markers).unwrap();
    assert_eq!(markers.len(), 1);

    let mut markers = MarkerBus::new();
    let mut matcher = FindSourceFiles::new("test/**/*.java").unwrap();
    Traversal::new().run(&tree, &mut matcher, &mut markers).unwrap();
    assert!(markers.is_empty());
}

/// Minimal classpath for the fixture's single field type
struct IntOnly;

impl TypeSource for IntOnly {
    fn describe(&self, signature: &TypeSignature) -> Option<RawType> {
        (signature.fqn == "int").then(|| RawType {
            fqn: "int".into(),
            primitive: true,
            supertype: None,
            members: vec![],
        })
    }
}

/// Attributes every field declaration with its resolved type
struct AttributeFields<'scope> {
    scope: &'scope weft_core::ResolutionScope,
}

impl TreeVisitor<()> for AttributeFields<'_> {
    fn pre_visit(
        &mut self,
        node: &Arc<Node>,
        _cursor: &weft_core::Cursor,
        _ctx: &mut (),
    ) -> PreVisit {
        if node.kind() == NodeKind::FieldDecl && node.type_ref().is_none() {
            let resolved = self
                .scope
                .resolve(&TypeSignature::of("int"))
                .expect("scope is open");
            return PreVisit::Replace(node.with_type(resolved));
        }
        PreVisit::Descend(Arc::clone(node))
    }
}

#[test]
fn attribution_reuses_one_canonical_type_across_occurrences() {
    let cache = TypeCache::new();
    let scope = cache.new_scope(Arc::new(IntOnly));

    let trees = [parse_fixture(), parse_fixture()];
    let mut attributed = Vec::new();
    for tree in &trees {
        let out = Traversal::new()
            .run(tree, &mut AttributeFields { scope: &scope }, &mut ())
            .unwrap();
        // attribution does not disturb the printed bytes
        assert_eq!(print(&out), SOURCE);
        attributed.push(out);
    }

    let field_type = |root: &Arc<Node>| {
        let class = root.children()[0].as_node().unwrap();
        let block = class.children()[2].as_node().unwrap();
        let field = block.children()[1].as_node().unwrap();
        Arc::clone(field.type_ref().expect("field is attributed"))
    };

    let a = field_type(&attributed[0]);
    let b = field_type(&attributed[1]);
    assert!(SemType::is_same_type(&a, &b));
    assert!(Arc::ptr_eq(&a, &b));
}
