//! Document post-processing: placeholder cleanup, stylesheet and title injection.
//!
//! Works on the parsed DOM. The parser always synthesizes `<head>` and
//! `<body>`, so whether the rendered markup actually carried them is checked
//! on the raw text first; a missing marker skips that injection with a warning.

use std::sync::LazyLock;

use ego_tree::{NodeId, NodeRef, Tree};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, warn};

use castgraph_shared::GraphConfig;

use crate::render::escape_html;

static HEAD_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head[\s>]").expect("valid regex"));
static HEAD_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head\s*>").expect("valid regex"));
static BODY_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body[\s>]").expect("valid regex"));

static CENTER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("center").expect("valid selector"));
static HEAD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("head").expect("valid selector"));
static BODY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));

/// Content injected into the rendered document.
#[derive(Debug, Clone)]
pub struct Decorations {
    pub title: String,
    /// Inline HTML, inserted as-is.
    pub attribution_html: String,
    pub stylesheets: Vec<String>,
    /// Page background colour.
    pub background: String,
}

impl From<&GraphConfig> for Decorations {
    fn from(config: &GraphConfig) -> Self {
        Self {
            title: config.document.title.clone(),
            attribution_html: config.document.attribution_html.clone(),
            stylesheets: config.document.stylesheets.clone(),
            background: config.graph.background.clone(),
        }
    }
}

impl Default for Decorations {
    fn default() -> Self {
        Self::from(&GraphConfig::default())
    }
}

/// What [`decorate`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorateReport {
    pub placeholders_removed: usize,
    pub head_injected: bool,
    pub body_injected: bool,
}

/// Post-process a rendered document.
pub fn decorate(html: &str, decorations: &Decorations) -> (String, DecorateReport) {
    let has_head = HEAD_OPEN_RE.is_match(html) && HEAD_CLOSE_RE.is_match(html);
    let has_body = BODY_OPEN_RE.is_match(html);

    let mut doc = Html::parse_document(html);
    let mut report = DecorateReport {
        placeholders_removed: remove_placeholders(&mut doc),
        ..Default::default()
    };

    if has_head {
        report.head_injected = inject_head(&mut doc, decorations);
    } else {
        warn!("no <head>...</head> in rendered document, stylesheets not injected");
    }

    if has_body {
        report.body_injected = inject_body(&mut doc, decorations);
    } else {
        warn!("no <body> in rendered document, title and attribution not injected");
    }

    debug!(?report, "document decorated");
    (doc.html(), report)
}

fn remove_placeholders(doc: &mut Html) -> usize {
    let ids: Vec<NodeId> = doc
        .select(&CENTER_SEL)
        .filter(|center| is_placeholder(*center))
        .map(|center| center.id())
        .collect();

    for &id in &ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
    ids.len()
}

/// A `center` whose only content is `hr` rules or empty `h1` headings.
fn is_placeholder(center: ElementRef<'_>) -> bool {
    let mut boilerplate = 0;
    for child in center.children() {
        match child.value() {
            Node::Text(text) if text.trim().is_empty() => {}
            Node::Comment(_) => {}
            Node::Element(el) if el.name() == "hr" => boilerplate += 1,
            Node::Element(el) if el.name() == "h1" => {
                let empty = ElementRef::wrap(child)
                    .is_some_and(|h1| h1.text().all(|t| t.trim().is_empty()));
                if !empty {
                    return false;
                }
                boilerplate += 1;
            }
            _ => return false,
        }
    }
    boilerplate > 0
}

fn inject_head(doc: &mut Html, decorations: &Decorations) -> bool {
    let Some(head) = doc.select(&HEAD_SEL).next().map(|h| h.id()) else {
        return false;
    };

    let mut markup = String::new();
    for href in &decorations.stylesheets {
        markup.push_str(&format!(r#"<link href="{}" rel="stylesheet">"#, escape_html(href)));
    }
    markup.push_str(&format!(
        "<style>\nbody {{\n  background-color: {};\n  margin: 0;\n  padding: 0;\n}}\n#mynetwork {{\n  border: none !important;\n}}\n</style>",
        escape_html(&decorations.background)
    ));

    let fragment = Html::parse_fragment(&markup);
    for child in fragment.root_element().children() {
        append_subtree(&mut doc.tree, head, child);
    }
    true
}

fn inject_body(doc: &mut Html, decorations: &Decorations) -> bool {
    let Some(body) = doc.select(&BODY_SEL).next() else {
        return false;
    };
    let body_id = body.id();
    let anchor = body.first_child().map(|c| c.id());

    let markup = format!(
        concat!(
            r#"<div class="container text-left mt-4 mb-2">"#,
            r#"<h1 style="font-family: 'Cinzel', serif; color: #333; font-size: 25px;">{title}</h1>"#,
            "</div>",
            r#"<div class="container text-left mb-4">"#,
            r#"<p style="font-family: 'Arial', sans-serif; font-size: 1rem; color: #555;">{attribution}</p>"#,
            "</div>",
        ),
        title = escape_html(&decorations.title),
        attribution = decorations.attribution_html,
    );

    let fragment = Html::parse_fragment(&markup);
    for child in fragment.root_element().children() {
        match anchor {
            Some(anchor) => insert_subtree_before(&mut doc.tree, anchor, child),
            None => append_subtree(&mut doc.tree, body_id, child),
        }
    }
    true
}

/// Copy `source` and its descendants as the last child of `parent`.
fn append_subtree(tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<'_, Node>) {
    let Some(mut parent) = tree.get_mut(parent) else {
        return;
    };
    let id = parent.append(source.value().clone()).id();
    for child in source.children() {
        append_subtree(tree, id, child);
    }
}

/// Copy `source` and its descendants as the previous sibling of `anchor`.
fn insert_subtree_before(tree: &mut Tree<Node>, anchor: NodeId, source: NodeRef<'_, Node>) {
    let Some(mut anchor) = tree.get_mut(anchor) else {
        return;
    };
    let id = anchor.insert_before(source.value().clone()).id();
    for child in source.children() {
        append_subtree(tree, id, child);
    }
}
