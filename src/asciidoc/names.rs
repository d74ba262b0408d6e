//! DocBook element categories and the dispatch table.
//!
//! Category tables are checked first, then a per-name match, so adding an
//! element to a category changes its handler without touching the walker.

/// Admonition elements; rendered as `[NAME]` delimited blocks.
pub const ADMONITIONS: &[&str] = &["caution", "important", "note", "tip", "warning"];

/// Elements rendered as monospaced text.
pub const LITERALS: &[&str] = &[
    "classname",
    "code",
    "command",
    "computeroutput",
    "constant",
    "envar",
    "exceptionname",
    "function",
    "interfacename",
    "literal",
    "markup",
    "methodname",
    "option",
    "parameter",
    "prompt",
    "property",
    "returnvalue",
    "sgmltag",
    "structfield",
    "structname",
    "systemitem",
    "tag",
    "token",
    "type",
    "userinput",
    "varname",
];

/// Elements rendered in italics.
pub const KEYWORDS: &[&str] = &[
    "citetitle",
    "firstterm",
    "foreignphrase",
    "replaceable",
    "wordasword",
];

/// File system names, rendered as monospaced text.
pub const PATHS: &[&str] = &["directory", "filename", "pathname"];

/// User interface elements.
pub const UI_NAMES: &[&str] = &[
    "guibutton",
    "guiicon",
    "guilabel",
    "guimenu",
    "guimenuitem",
    "guisubmenu",
    "keycap",
    "keycombo",
    "menuchoice",
    "mousebutton",
];

/// Elements that open a new heading level.
pub const SECTIONS: &[&str] = &[
    "bibliodiv",
    "chapter",
    "glossdiv",
    "refsect1",
    "refsect2",
    "refsect3",
    "section",
    "sect1",
    "sect2",
    "sect3",
    "sect4",
    "sect5",
    "simplesect",
];

/// Sections that carry an AsciiDoc section style such as `[appendix]`.
pub const SPECIAL_SECTIONS: &[&str] = &[
    "abstract",
    "acknowledgements",
    "appendix",
    "bibliography",
    "colophon",
    "dedication",
    "glossary",
    "index",
    "preface",
];

/// Transparent block wrappers: walked as if their children sat in the parent.
pub const PASSTHROUGH: &[&str] = &["blockinfo", "caption", "partintro", "screenshot", "textobject"];

/// Inline wrappers with no markup of their own.
const PLAIN_INLINE: &[&str] = &[
    "abbrev",
    "acronym",
    "application",
    "citation",
    "del",
    "hardware",
    "ins",
    "orgname",
    "productname",
    "productnumber",
];

/// Metadata containers read by their parent and otherwise skipped.
const INFO: &[&str] = &[
    "appendixinfo",
    "attribution",
    "articleinfo",
    "bibliographyinfo",
    "bookinfo",
    "chapterinfo",
    "glossaryinfo",
    "info",
    "partinfo",
    "prefaceinfo",
    "sect1info",
    "sect2info",
    "sect3info",
    "sect4info",
    "sect5info",
    "sectioninfo",
];

/// Elements whose character data is flowing prose.
const INLINE_CONTAINERS: &[&str] = &[
    "attribution",
    "entry",
    "glossterm",
    "member",
    "para",
    "primary",
    "refpurpose",
    "secondary",
    "simpara",
    "subtitle",
    "term",
    "tertiary",
    "title",
    "titleabbrev",
];

/// Edit-tracking roles that mark inserted text in a listing.
pub const INSERTION_ROLES: &[&str] = &["added", "highlight", "ins", "insert", "inserted", "shaded"];

/// Edit-tracking roles that mark deleted text in a listing.
pub const DELETION_ROLES: &[&str] = &["del", "delete", "deleted", "removed"];

/// How an element is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Document,
    Info,
    Title,
    Section,
    SpecialSection,
    Part,
    Bridgehead,
    Para,
    FormalPara,
    Admonition,
    Example,
    Sidebar,
    BlockQuote,
    Figure,
    MediaObject,
    InlineMediaObject,
    ProgramListing,
    Screen,
    LiteralLayout,
    ItemizedList,
    OrderedList,
    StepAlternatives,
    VariableList,
    SimpleList,
    CalloutList,
    Callout,
    QandaSet,
    QandaDiv,
    GlossList,
    GlossEntry,
    BiblioEntry,
    Remark,
    Table,
    Literal,
    Keyword,
    Path,
    Emphasis,
    Superscript,
    Subscript,
    Quote,
    Phrase,
    Trademark,
    Ui,
    Xref,
    Link,
    Email,
    Uri,
    Footnote,
    FootnoteRef,
    Anchor,
    IndexTerm,
    Include,
    Plain,
    Passthrough,
    Default,
}

impl Handler {
    /// Whether the element starts a block of its own.
    pub fn is_block(self) -> bool {
        !matches!(
            self,
            Handler::Info
                | Handler::Title
                | Handler::InlineMediaObject
                | Handler::Callout
                | Handler::Literal
                | Handler::Keyword
                | Handler::Path
                | Handler::Emphasis
                | Handler::Superscript
                | Handler::Subscript
                | Handler::Quote
                | Handler::Phrase
                | Handler::Trademark
                | Handler::Ui
                | Handler::Xref
                | Handler::Link
                | Handler::Email
                | Handler::Uri
                | Handler::Footnote
                | Handler::FootnoteRef
                | Handler::Anchor
                | Handler::IndexTerm
                | Handler::Plain
        )
    }

    /// Whether the element is a list for depth bookkeeping.
    pub fn is_list(self) -> bool {
        matches!(
            self,
            Handler::ItemizedList | Handler::OrderedList | Handler::StepAlternatives
        )
    }
}

/// Resolve the handler for an element by local name.
///
/// XInclude elements are recognized by namespace before this lookup.
pub fn handler_for(name: &str) -> Handler {
    if ADMONITIONS.contains(&name) {
        return Handler::Admonition;
    }
    if LITERALS.contains(&name) {
        return Handler::Literal;
    }
    if KEYWORDS.contains(&name) {
        return Handler::Keyword;
    }
    if PATHS.contains(&name) {
        return Handler::Path;
    }
    if UI_NAMES.contains(&name) {
        return Handler::Ui;
    }
    if SECTIONS.contains(&name) {
        return Handler::Section;
    }
    if SPECIAL_SECTIONS.contains(&name) {
        return Handler::SpecialSection;
    }
    if PASSTHROUGH.contains(&name) {
        return Handler::Passthrough;
    }
    if PLAIN_INLINE.contains(&name) {
        return Handler::Plain;
    }
    if INFO.contains(&name) {
        return Handler::Info;
    }

    match name {
        "article" | "book" => Handler::Document,
        "title" | "subtitle" | "titleabbrev" => Handler::Title,
        "part" => Handler::Part,
        "bridgehead" => Handler::Bridgehead,
        "para" | "simpara" => Handler::Para,
        "formalpara" => Handler::FormalPara,
        "example" | "informalexample" => Handler::Example,
        "sidebar" => Handler::Sidebar,
        "blockquote" | "epigraph" => Handler::BlockQuote,
        "figure" | "informalfigure" => Handler::Figure,
        "mediaobject" => Handler::MediaObject,
        "inlinemediaobject" => Handler::InlineMediaObject,
        "programlisting" => Handler::ProgramListing,
        "screen" | "synopsis" => Handler::Screen,
        "literallayout" => Handler::LiteralLayout,
        "itemizedlist" => Handler::ItemizedList,
        "orderedlist" | "procedure" | "substeps" => Handler::OrderedList,
        "stepalternatives" => Handler::StepAlternatives,
        "variablelist" => Handler::VariableList,
        "simplelist" => Handler::SimpleList,
        "calloutlist" => Handler::CalloutList,
        "co" => Handler::Callout,
        "qandaset" => Handler::QandaSet,
        "qandadiv" => Handler::QandaDiv,
        "glosslist" => Handler::GlossList,
        "glossentry" => Handler::GlossEntry,
        "biblioentry" | "bibliomixed" => Handler::BiblioEntry,
        "remark" => Handler::Remark,
        "table" | "informaltable" => Handler::Table,
        "emphasis" => Handler::Emphasis,
        "superscript" => Handler::Superscript,
        "subscript" => Handler::Subscript,
        "quote" => Handler::Quote,
        "phrase" => Handler::Phrase,
        "trademark" => Handler::Trademark,
        "xref" => Handler::Xref,
        "link" | "ulink" => Handler::Link,
        "email" => Handler::Email,
        "uri" => Handler::Uri,
        "footnote" => Handler::Footnote,
        "footnoteref" => Handler::FootnoteRef,
        "anchor" => Handler::Anchor,
        "indexterm" => Handler::IndexTerm,
        _ => Handler::Default,
    }
}

/// Whether text directly inside `name` is flowing prose.
pub fn is_inline_container(name: &str) -> bool {
    INLINE_CONTAINERS.contains(&name) || !handler_for(name).is_block()
}

/// Whether `name` is a verbatim block.
pub fn is_verbatim(name: &str) -> bool {
    matches!(
        handler_for(name),
        Handler::ProgramListing | Handler::Screen | Handler::LiteralLayout
    )
}

/// ASCII spelling of a named character entity, if it has one.
pub fn entity_replacement(name: &str) -> Option<&'static str> {
    let replacement = match name {
        "amp" => "&",
        "apos" => "'",
        "copy" => "(C)",
        "gt" => ">",
        "hellip" => "...",
        "lArr" => "<=",
        "larr" => "<-",
        "ldquo" | "rdquo" | "quot" => "\"",
        "lsquo" | "rsquo" => "'",
        "lt" => "<",
        "mdash" => "--",
        "nbsp" => "{nbsp}",
        "ndash" => "&#8211;",
        "rArr" => "=>",
        "rarr" => "->",
        "reg" => "(R)",
        "shy" => "&#173;",
        "thinsp" => "{thinsp}",
        "trade" => "(TM)",
        "zwsp" => "{zwsp}",
        _ => return None,
    };
    Some(replacement)
}
