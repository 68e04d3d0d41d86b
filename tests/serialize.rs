use rstest::rstest;
use xconf::{Document, ErrorKind, FormatMode, Lookup, NodeRef};

const SOURCE: &str = r#"
!CONFIG { version="1.2" locale="UTF-8" }
// comments are dropped on output
title="Say \"hello\""
path="C:\dir\file.txt"
empty=""
server {
    host="localhost"
    /* nested */
    limits { rps="100" burst="20" }
    routes[] {
        { path="/" }
        { }
        { path="/api" methods[] { { m="GET" } { m="POST" } } }
    }
}
blank[] { }
"#;

/// Structural fingerprint: names, array flags, attributes and their values.
fn shape(node: NodeRef<'_>, out: &mut Vec<String>) {
    out.push(format!("node {} array={}", node.id(), node.is_array()));
    for attr in node.attributes() {
        out.push(format!("attr {}={}", attr.id(), attr.value()));
    }
    for child in node.nodes() {
        shape(child, out);
    }
}

fn fingerprint(doc: &Document) -> Vec<String> {
    let mut out = Vec::new();
    shape(doc.root(), &mut out);
    out
}

#[rstest]
#[case(FormatMode::File)]
#[case(FormatMode::String)]
#[case(FormatMode::Compact)]
fn round_trip(#[case] mode: FormatMode) {
    let doc = xconf::from_str(SOURCE).expect("load");
    let text = doc.save_to_string(mode);
    let again = xconf::from_str(&text).expect("reload");
    assert_eq!(fingerprint(&again), fingerprint(&doc));
    assert_eq!(again.keys(), doc.keys());
    assert_eq!(again.node_keys(), doc.node_keys());
}

#[rstest]
fn file_mode_keeps_header() {
    let doc = xconf::from_str(SOURCE).expect("load");
    let text = doc.save_to_string(FormatMode::File);
    assert!(text.starts_with("!CONFIG { version=\"1.2\" locale=\"UTF-8\" }\n\ntitle="));
    assert_eq!(text.matches("!CONFIG").count(), 1);
    let again = xconf::from_str(&text).expect("reload");
    assert_eq!(again.version(), Some("1.2"));
}

#[rstest]
#[case(FormatMode::String)]
#[case(FormatMode::Compact)]
fn single_line_modes_drop_header(#[case] mode: FormatMode) {
    let doc = xconf::from_str(SOURCE).expect("load");
    let text = doc.save_to_string(mode);
    assert!(!text.contains("!CONFIG"));
    assert!(!text.contains('\n'));
    assert!(!text.ends_with(' '));
}

#[rstest]
fn compact_mode_has_no_whitespace_outside_values() {
    let doc = xconf::from_str("a=\"1\" n { b=\"2\" l[] { { } } }").expect("load");
    assert_eq!(
        doc.save_to_string(FormatMode::Compact),
        "a=\"1\"n{b=\"2\"l[]{{}}}"
    );
}

#[rstest]
fn file_mode_indents_with_tabs() {
    let doc = xconf::from_str("n { m { x=\"1\" } }").expect("load");
    assert_eq!(
        doc.save_to_string(FormatMode::File),
        "n {\n\tm {\n\t\tx=\"1\"\n\t}\n}\n"
    );
}

#[rstest]
fn quotes_are_masked_on_output() {
    let doc = xconf::from_str(SOURCE).expect("load");
    let text = doc.save_to_string(FormatMode::String);
    assert!(text.contains(r#"title="Say \"hello\"""#));
    assert!(text.contains(r#"path="C:\dir\file.txt""#));
    let again = xconf::from_str(&text).expect("reload");
    assert_eq!(again.get_key("title").expect("title"), "Say \"hello\"");
}

#[rstest]
fn attributes_precede_nodes_within_a_body() {
    let doc = xconf::from_str("n { } a=\"1\"").expect("load");
    assert_eq!(doc.save_to_string(FormatMode::String), "a=\"1\" n { }");
}

#[rstest]
fn save_to_file_and_reload() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("out.conf");
    let doc = xconf::from_str(SOURCE).expect("load");
    doc.save_path(&path).expect("save");
    let again = xconf::from_path(&path).expect("reload");
    assert_eq!(fingerprint(&again), fingerprint(&doc));
    assert_eq!(again.version(), Some("1.2"));
}

#[rstest]
fn writer_entry_points_agree() {
    let doc = xconf::from_str(SOURCE).expect("load");
    let mut buf = Vec::new();
    xconf::to_writer_with_mode(&mut buf, &doc, FormatMode::String).expect("write");
    assert_eq!(buf, xconf::to_string_with_mode(&doc, FormatMode::String).into_bytes());
    assert_eq!(
        xconf::to_vec(&doc).expect("vec"),
        xconf::to_string(&doc).into_bytes()
    );
}

#[rstest]
#[case(FormatMode::String)]
#[case(FormatMode::Compact)]
fn header_free_modes_never_emit_a_config_node(#[case] mode: FormatMode) {
    let late = "!CONFIG { version=\"1.0\" }\n!CONFIG { anything=\"goes\" }";
    assert_eq!(
        xconf::from_str(late).expect_err("late header").kind,
        ErrorKind::Config
    );

    let doc = xconf::from_str("!CONFIG { version=\"1.0\" }\nCONFIG { anything=\"goes\" }")
        .expect("load");
    let text = doc.save_to_string(mode);
    assert!(!text.contains("!CONFIG"));
    let again = xconf::from_str(&text).expect("reload");
    assert_eq!(fingerprint(&again), fingerprint(&doc));
    assert_eq!(again.get_key("CONFIG.anything").expect("anything"), "goes");

    let mut built = Document::new();
    let root = built.root_id();
    assert_eq!(
        built.create_node(root, "!CONFIG").expect_err("reserved").kind,
        ErrorKind::Tree
    );
    built.set_default_config();
    built.create_node(root, "n").expect("node");
    let again = xconf::from_str(&built.save_to_string(mode)).expect("reload");
    assert_eq!(fingerprint(&again), fingerprint(&built));
}
