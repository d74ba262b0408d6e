//! XInclude tree tests.
//!
//! Each test builds a small tree of DocBook files in a temporary directory,
//! converts the top-level file and checks the generated AsciiDoc files.

use std::fs;
use std::path::Path;

use docbook_adoc::{Config, Error, convert_file};
use tempfile::TempDir;

const XI: &str = r#"xmlns:xi="http://www.w3.org/2001/XInclude""#;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create directory");
    }
    fs::write(path, content).expect("Failed to write fixture");
}

// ============================================================================
// Inclusion Trees
// ============================================================================

#[test]
fn test_include_becomes_directive_with_leveloffset() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(
        dir.path(),
        "guide.xml",
        &format!(r#"<book {XI}><title>Guide</title><xi:include href="chapters/intro.xml"/></book>"#),
    );
    write(
        dir.path(),
        "chapters/intro.xml",
        "<chapter><title>Intro</title><para>Hello</para></chapter>",
    );

    let document = convert_file(&dir.path().join("guide.xml"), &Config::default())
        .expect("Failed to convert");

    assert_eq!(
        document.content(),
        "= Guide\n:doctype: book\n:experimental:\n\ninclude::chapters/intro.adoc[leveloffset=+1]\n"
    );
    assert_eq!(document.children().len(), 1);
    assert_eq!(document.children()[0].content(), "= Intro\n\nHello\n");
}

#[test]
fn test_anchor_referenced_from_parent_survives_in_child() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(
        dir.path(),
        "guide.xml",
        &format!(
            r#"<article {XI}><title>Guide</title><xi:include href="setup.xml"/><para>See <xref linkend="setup"/>.</para></article>"#
        ),
    );
    write(
        dir.path(),
        "setup.xml",
        r#"<section id="setup"><title>Set Up</title><section id="unused"><title>Later</title><para>x</para></section></section>"#,
    );

    let document = convert_file(&dir.path().join("guide.xml"), &Config::default())
        .expect("Failed to convert");
    let child = &document.children()[0];

    assert!(document.used_ids().contains("setup"));
    assert_eq!(child.content(), "[[setup]]\n= Set Up\n\n== Later\n\nx\n");
    assert!(document.content().ends_with("See <<setup>>.\n"));
}

#[test]
fn test_write_creates_every_output_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(
        dir.path(),
        "guide.xml",
        &format!(r#"<article {XI}><title>Guide</title><xi:include href="part/one.xml"/></article>"#),
    );
    write(
        dir.path(),
        "part/one.xml",
        &format!(r#"<section {XI}><title>One</title><xi:include href="two.xml"/></section>"#),
    );
    write(dir.path(), "part/two.xml", "<section><title>Two</title><para>Deep</para></section>");

    let document = convert_file(&dir.path().join("guide.xml"), &Config::default())
        .expect("Failed to convert");
    assert_eq!(document.document_count(), 3);
    document.write().expect("Failed to write");

    let one = fs::read_to_string(dir.path().join("part/one.adoc")).expect("Missing one.adoc");
    assert!(one.ends_with("include::two.adoc[leveloffset=+1]\n"));
    let two = fs::read_to_string(dir.path().join("part/two.adoc")).expect("Missing two.adoc");
    assert_eq!(two, "= Two\n\nDeep\n");
    assert!(dir.path().join("guide.adoc").exists());
}

// ============================================================================
// Degraded Includes
// ============================================================================

#[test]
fn test_include_cycle_is_not_followed() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(
        dir.path(),
        "a.xml",
        &format!(r#"<article {XI}><title>A</title><xi:include href="b.xml"/></article>"#),
    );
    write(
        dir.path(),
        "b.xml",
        &format!(r#"<section {XI}><title>B</title><xi:include href="./a.xml"/></section>"#),
    );

    let document =
        convert_file(&dir.path().join("a.xml"), &Config::default()).expect("Failed to convert");
    let b = &document.children()[0];

    assert!(b.children().is_empty());
    assert!(b.content().contains("// include cycle: ./a.xml"));
}

#[test]
fn test_missing_include_keeps_converting() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(
        dir.path(),
        "guide.xml",
        &format!(
            r#"<article {XI}><title>Guide</title><xi:include href="missing.xml"/><para>After</para></article>"#
        ),
    );

    let document = convert_file(&dir.path().join("guide.xml"), &Config::default())
        .expect("Failed to convert");

    assert!(document.children().is_empty());
    assert!(document
        .content()
        .ends_with("// include failed: missing.xml\n\nAfter\n"));
}

#[test]
fn test_text_include_is_not_converted() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(
        dir.path(),
        "guide.xml",
        &format!(
            r#"<article {XI}><title>Guide</title><programlisting><xi:include href="main.rs" parse="text"/></programlisting><xi:include href="notes.txt" parse="text"/></article>"#
        ),
    );

    let document = convert_file(&dir.path().join("guide.xml"), &Config::default())
        .expect("Failed to convert");

    assert!(document.children().is_empty());
    assert!(document
        .content()
        .ends_with("----\ninclude::main.rs[]\n----\n\ninclude::notes.txt[]\n"));
}

#[test]
fn test_percent_encoded_href() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(
        dir.path(),
        "guide.xml",
        &format!(r#"<article {XI}><title>Guide</title><xi:include href="my%20notes.xml"/></article>"#),
    );
    write(dir.path(), "my notes.xml", "<section><title>Notes</title><para>n</para></section>");

    let document = convert_file(&dir.path().join("guide.xml"), &Config::default())
        .expect("Failed to convert");

    assert_eq!(document.children().len(), 1);
    assert!(document
        .content()
        .ends_with("include::my notes.adoc[leveloffset=+1]\n"));
}

#[test]
fn test_missing_top_level_file_is_an_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let result = convert_file(&dir.path().join("nope.xml"), &Config::default());
    assert!(matches!(result, Err(Error::MissingSource(_))));
}

#[test]
fn test_malformed_top_level_file_is_an_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "bad.xml", "<article><para>unclosed</article>");
    let result = convert_file(&dir.path().join("bad.xml"), &Config::default());
    assert!(result.is_err());
}
