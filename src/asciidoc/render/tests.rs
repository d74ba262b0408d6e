use super::*;
use crate::asciidoc::{prune_anchors, tidy_lines};
use crate::dom::parse_xml;

fn convert_with(xml: &str, config: &Config) -> String {
    let dom = parse_xml(xml).unwrap();
    let used = UsedIds::new();
    let lines = Converter::new(&dom, config, used.clone()).convert();
    tidy_lines(prune_anchors(lines, &used)).join("\n")
}

fn convert(xml: &str) -> String {
    convert_with(xml, &Config::default())
}

/// Output of `fragment` placed in a titled article, without the header.
fn body_with(fragment: &str, config: &Config) -> String {
    let out = convert_with(&format!("<article><title>T</title>{fragment}</article>"), config);
    let header_end = out.find("\n\n").map_or(out.len(), |i| i + 2);
    out[header_end..].to_string()
}

fn body(fragment: &str) -> String {
    body_with(fragment, &Config::default())
}

// ----------------------------------------------------------------------------
// Inline markup
// ----------------------------------------------------------------------------

#[test]
fn test_constrained_and_unconstrained_marks() {
    assert_eq!(
        body(r#"<para>Run <command>make</command> or <emphasis role="bold">hot</emphasis>dog.</para>"#),
        "Run `make` or **hot**dog."
    );
    assert_eq!(
        body(r#"<para><emphasis role="bold">hot</emphasis> dog</para>"#),
        "*hot* dog"
    );
}

#[test]
fn test_nested_style_escapes_leading_marker() {
    assert_eq!(
        body(r#"<para><emphasis>see <emphasis role="bold">*args</emphasis></emphasis></para>"#),
        "_see **\\*args**_"
    );
}

#[test]
fn test_conditional_inline_gets_own_directive_line() {
    assert_eq!(
        body(r#"<para>Hello <phrase condition="pro">Pro only</phrase> world</para>"#),
        "Hello\nifdef::pro[Pro only]\nworld"
    );
    assert_eq!(
        body(r#"<para>Hi <emphasis condition="a;b">x</emphasis></para>"#),
        "Hi\nifdef::a,b[_x_]"
    );
}

#[test]
fn test_literal_passthrough_and_compat_mode() {
    assert_eq!(body("<para><literal>{name}</literal></para>"), "`+{name}+`");
    let compat = Config::new().with_compat_mode(true);
    assert_eq!(body_with("<para><literal>x</literal></para>", &compat), "+x+");
}

#[test]
fn test_menu_sequence_consumes_siblings() {
    assert_eq!(
        body("<para><guimenu>File</guimenu> &gt; <guimenuitem>Save</guimenuitem></para>"),
        "menu:File[Save]"
    );
}

#[test]
fn test_footnote_escapes_brackets() {
    assert_eq!(
        body("<para>Claim<footnote><para>Source [1]</para></footnote>.</para>"),
        "Claimfootnote:[Source [1\\]]."
    );
}

#[test]
fn test_hard_line_break_instruction() {
    assert_eq!(
        body("<para>Line one<?asciidoc-br?>Line two</para>"),
        "Line one +\nLine two"
    );
}

#[test]
fn test_sentence_per_line() {
    let config = Config::new().with_sentence_per_line(true);
    assert_eq!(
        body_with("<para>One. Two here.</para>", &config),
        "One.\nTwo here."
    );
}

#[test]
fn test_link_prefix_collapses_to_attribute() {
    let config = Config::new().with_attribute("docs", "https://example.org/docs");
    let out = convert_with(
        r#"<article xmlns:xlink="http://www.w3.org/1999/xlink"><title>T</title>
<para><link xlink:href="https://example.org/docs/intro">Intro</link></para></article>"#,
        &config,
    );
    assert!(out.contains(":docs: https://example.org/docs"));
    assert!(out.ends_with("{docs}/intro[Intro]"));
}

// ----------------------------------------------------------------------------
// Sections and anchors
// ----------------------------------------------------------------------------

#[test]
fn test_heading_without_redundant_anchor() {
    assert_eq!(
        body("<section><title>Getting Started</title><para>Text</para></section>"),
        "== Getting Started\n\nText"
    );
}

#[test]
fn test_custom_id_anchor_kept_when_referenced() {
    assert_eq!(
        body(
            r#"<section id="custom-id"><title>Getting Started</title><para>See <xref linkend="custom-id"/>.</para></section>"#
        ),
        "[[custom-id]]\n== Getting Started\n\nSee <<custom-id>>."
    );
}

#[test]
fn test_unreferenced_anchor_is_pruned() {
    assert_eq!(
        body(r#"<section id="custom-id"><title>Getting Started</title><para>Text</para></section>"#),
        "== Getting Started\n\nText"
    );
}

#[test]
fn test_anchor_lookalikes_in_text_survive_pruning() {
    assert_eq!(
        body("<para>Use <code>x[[1]]</code> or <code>m[[key]]</code> to index.</para>"),
        "Use `x[[1]]` or `m[[key]]` to index."
    );
}

#[test]
fn test_normalized_id_with_default_prefix_needs_no_anchor() {
    let config = Config::new().with_idseparator("-").with_normalize_ids(true);
    assert_eq!(
        body_with(
            r#"<section id="Getting_Started"><title>Getting Started</title><para>See <xref linkend="Getting_Started"/>.</para></section>"#,
            &config
        ),
        "== Getting Started\n\nSee <<_getting-started>>."
    );
}

#[test]
fn test_special_section_style() {
    assert_eq!(
        body("<appendix><title>Extras</title><para>x</para></appendix>"),
        "[appendix]\n== Extras\n\nx"
    );
}

#[test]
fn test_special_section_toggles_numbering() {
    let config = Config::new().with_attribute("sectnums", "");
    let out = body_with("<preface><title>Foreword</title><para>x</para></preface>", &config);
    assert!(out.starts_with(":sectnums!:\n[preface]\n== Foreword"));
    assert!(out.ends_with("x\n\n:sectnums:"));
}

#[test]
fn test_book_header_and_parts() {
    let out = convert(
        "<book><info><title>Manual</title><subtitle>Reference</subtitle>\
<author><personname><firstname>Ada</firstname><surname>Lovelace</surname></personname>\
<email>ada@example.org</email></author>\
<revhistory><revision><revnumber>1.2</revnumber><date>2024-05-01</date></revision></revhistory></info>\
<part><title>Basics</title><chapter><title>Intro</title><para>Hi</para></chapter></part></book>",
    );
    assert_eq!(
        out,
        "= Manual: Reference\n\
Ada Lovelace <ada@example.org>\n\
v1.2, 2024-05-01\n\
:doctype: book\n\
:experimental:\n\
\n\
= Basics\n\
\n\
== Intro\n\
\n\
Hi"
    );
}

#[test]
fn test_xinclude_without_resolver() {
    let out = convert(
        r#"<article xmlns:xi="http://www.w3.org/2001/XInclude"><title>T</title><xi:include href="ch1.xml"/></article>"#,
    );
    assert!(out.ends_with("\n\ninclude::ch1.adoc[leveloffset=+1]"));
}

// ----------------------------------------------------------------------------
// Blocks
// ----------------------------------------------------------------------------

#[test]
fn test_admonition_with_title() {
    assert_eq!(
        body("<note><title>Heads up</title><para>Careful.</para></note>"),
        ".Heads up\n[NOTE]\n====\nCareful.\n===="
    );
}

#[test]
fn test_conditional_block() {
    assert_eq!(
        body(r#"<para condition="linux">Only Linux</para>"#),
        "ifdef::linux[]\nOnly Linux\nendif::linux[]"
    );
}

#[test]
fn test_blockquote_attribution_with_comma() {
    assert_eq!(
        body("<blockquote><attribution>Jane Doe, PhD</attribution><para>Quoted.</para></blockquote>"),
        "[quote, \"Jane Doe, PhD\"]\n____\nQuoted.\n____"
    );
}

#[test]
fn test_mediaobject_image() {
    assert_eq!(
        body(
            r#"<mediaobject><imageobject><imagedata fileref="img/a.png" width="50%"/></imageobject><textobject><phrase>Diagram</phrase></textobject></mediaobject>"#
        ),
        "image::img/a.png[Diagram,width=50%]"
    );
}

#[test]
fn test_unknown_element_is_commented_out() {
    let out = body(r#"<para>Before</para><frobnicate a="1">x</frobnicate>"#);
    assert!(out.starts_with("Before\n\n////\n"));
    assert!(out.contains("frobnicate"));
    assert!(out.ends_with("////"));
}

#[test]
fn test_index_terms_grouped_between_blocks() {
    assert_eq!(
        body(
            "<section><title>S</title><indexterm><primary>a</primary></indexterm>\
<indexterm><primary>b</primary><secondary>c</secondary></indexterm><para>Text</para></section>"
        ),
        "== S\n\n(((a)))(((b,c)))\n\nText"
    );
}

#[test]
fn test_index_term_grouping_stops_at_other_nodes() {
    assert_eq!(
        body(
            "<section><title>S</title><indexterm><primary>a</primary></indexterm>\
<!-- note --><indexterm><primary>b</primary></indexterm><para>Text</para></section>"
        ),
        "== S\n\n(((a)))\n\n// note\n\n(((b)))\n\nText"
    );
}

#[test]
fn test_bibliography_entry() {
    assert_eq!(
        body(
            r#"<bibliography><title>Refs</title><biblioentry id="knuth"><abbrev>TAOCP</abbrev><author><surname>Knuth</surname></author><title>The Art</title></biblioentry></bibliography>"#
        ),
        "[bibliography]\n== Refs\n\n* [[[knuth,TAOCP]]] Knuth, The Art"
    );
}

#[test]
fn test_qanda_set() {
    assert_eq!(
        body(
            "<qandaset><qandaentry><question><para>Why?</para></question>\
<answer><para>Because.</para></answer></qandaentry></qandaset>"
        ),
        "[qanda]\nWhy?::\nBecause."
    );
}

#[test]
fn test_glossary_entry_drops_unused_anchor() {
    assert_eq!(
        body(
            r#"<glosslist><glossentry id="g1"><glossterm>API</glossterm><glossdef><para>Interface</para></glossdef></glossentry></glosslist>"#
        ),
        "[glossary]\nAPI::\nInterface"
    );
}

// ----------------------------------------------------------------------------
// Lists
// ----------------------------------------------------------------------------

#[test]
fn test_nested_itemized_list() {
    assert_eq!(
        body(
            "<itemizedlist><listitem><para>One</para><itemizedlist><listitem><para>Inner</para>\
</listitem></itemizedlist></listitem><listitem><para>Two</para></listitem></itemizedlist>"
        ),
        "* One\n** Inner\n* Two"
    );
}

#[test]
fn test_list_item_continuation() {
    assert_eq!(
        body("<orderedlist><listitem><para>First</para><para>More</para></listitem></orderedlist>"),
        ". First\n+\nMore"
    );
}

#[test]
fn test_variable_list() {
    assert_eq!(
        body(
            "<variablelist><varlistentry><term>CPU</term>\
<listitem><para>Processor</para></listitem></varlistentry></variablelist>"
        ),
        "CPU::\nProcessor"
    );
}

#[test]
fn test_simple_list_block() {
    assert_eq!(
        body("<simplelist><member>a</member><member>b</member></simplelist>"),
        "a, b"
    );
}

// ----------------------------------------------------------------------------
// Tables
// ----------------------------------------------------------------------------

#[test]
fn test_table_with_header() {
    assert_eq!(
        body(
            "<table><title>Sizes</title><tgroup cols=\"2\">\
<thead><row><entry>Name</entry><entry>Size</entry></row></thead>\
<tbody><row><entry>a</entry><entry>1</entry></row><row><entry>b</entry><entry>2</entry></row></tbody>\
</tgroup></table>"
        ),
        ".Sizes\n[cols=\"1,1\",options=\"header\"]\n|===\n|Name |Size\n\n|a\n|1\n\n|b\n|2\n|==="
    );
}

#[test]
fn test_table_declared_columns_win_over_header() {
    let out = body(
        "<table><title>Odd</title><tgroup cols=\"3\">\
<thead><row><entry>A</entry><entry>B</entry></row></thead>\
<tbody><row><entry>1</entry><entry>2</entry><entry>3</entry></row></tbody></tgroup></table>",
    );
    assert!(out.contains("[cols=\"1,1,1\",options=\"header\"]"));
}

#[test]
fn test_table_spans_and_block_cells() {
    let out = body(
        "<informaltable><tgroup cols=\"2\"><colspec colname=\"c1\" colwidth=\"2*\"/><colspec colname=\"c2\"/>\
<tbody><row><entry namest=\"c1\" nameend=\"c2\">wide</entry></row>\
<row><entry morerows=\"1\"><para>p1</para><para>p2</para></entry><entry>x</entry></row></tbody>\
</tgroup></informaltable>",
    );
    assert!(out.starts_with("[cols=\"2,1\"]\n|===\n2+|wide\n\n.2+a|\np1\n\np2\n|x\n|==="));
}

#[test]
fn test_verbatim_block_in_cell_escapes_pipes() {
    let out = body(
        "<informaltable><tgroup cols=\"1\"><tbody><row>\
<entry><para>Run:</para><screen>a | b</screen></entry>\
</row></tbody></tgroup></informaltable>",
    );
    assert_eq!(out, "[cols=\"1\"]\n|===\na|\nRun:\n\n----\na \\| b\n----\n|===");
}

#[test]
fn test_nested_table_escapes_both_separators() {
    let out = body(
        "<informaltable><tgroup cols=\"1\"><tbody><row><entry>\
<informaltable><tgroup cols=\"1\"><tbody><row><entry>x!y|z</entry></row></tbody></tgroup></informaltable>\
</entry></row></tbody></tgroup></informaltable>",
    );
    assert!(out.contains("a|\n[cols=\"1\"]\n!===\n!x\\!y\\|z\n!==="));
}

#[test]
fn test_conditional_paragraph_in_cell() {
    let out = body(
        "<informaltable><tgroup cols=\"1\"><tbody><row>\
<entry><para condition=\"pro\">Pro</para></entry>\
</row></tbody></tgroup></informaltable>",
    );
    assert!(out.contains("a|\nifdef::pro[]\nPro\nendif::pro[]\n|==="));
}

// ----------------------------------------------------------------------------
// Listings
// ----------------------------------------------------------------------------

#[test]
fn test_source_listing() {
    assert_eq!(
        body(r#"<programlisting language="rust">fn main() {}</programlisting>"#),
        "[source,rust]\n----\nfn main() {}\n----"
    );
    let undelimited = Config::new().with_delimit_source(false);
    assert_eq!(
        body_with(r#"<programlisting language="rust">fn main() {}</programlisting>"#, &undelimited),
        "[source,rust]\nfn main() {}"
    );
}

#[test]
fn test_callouts_and_callout_list() {
    assert_eq!(
        body(
            "<programlisting>x = 1 <co id=\"c1\"/>\ny = 2<co id=\"c2\"/></programlisting>\
<calloutlist><callout arearefs=\"c1\"><para>Set x</para></callout>\
<callout arearefs=\"c2\"><para>Set y</para></callout></calloutlist>"
        ),
        "----\nx = 1 <1>\ny = 2 <2>\n----\n\n<1> Set x\n<2> Set y"
    );
}

#[test]
fn test_edit_markup_becomes_diff() {
    assert_eq!(
        body("<programlisting>a\n<del>b</del><ins>c</ins>\nd</programlisting>"),
        "[source,diff]\n----\n a\n-b\n+c\n d\n----"
    );
}

#[test]
fn test_entity_in_listing_enables_attribute_subs() {
    assert_eq!(
        body("<screen>install &product;</screen>"),
        "[subs=\"attributes+\"]\n----\ninstall {product}\n----"
    );
}
