//! HTML Rendering for headless trees
//!
//! Serializes [`StubHost`] subtrees depth-first:
//! - void elements never get a closing tag
//! - `<script>`/`<style>` children are emitted raw, but JS-string escaped
//! - text escapes `&` and `<`, attribute values escape `&` and `"`

use crate::stub::{StubHost, StubId, StubKind};

// =============================================================================
// RenderConfig
// =============================================================================

/// How void elements are closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoidStyle {
    /// `<br>`
    Html,
    /// `<br />`
    Xhtml,
}

/// Configuration for HTML rendering.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Void element syntax.
    pub void_style: VoidStyle,
}

impl RenderConfig {
    /// Plain HTML output.
    pub const HTML: Self = Self {
        void_style: VoidStyle::Html,
    };

    /// XHTML-compatible output.
    pub const XHTML: Self = Self {
        void_style: VoidStyle::Xhtml,
    };
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::HTML
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Render a stub node and its subtree into `output`.
///
/// Unknown ids render as nothing.
pub fn render_html(host: &StubHost, id: StubId, config: &RenderConfig, output: &mut String) {
    let Some(node) = host.node(id) else {
        return;
    };
    match &node.kind {
        StubKind::Text(text) => escape_text_into(text, output),
        StubKind::Comment(text) => {
            output.push_str("<!--");
            output.push_str(text);
            output.push_str("-->");
        }
        StubKind::DocType {
            name,
            public_id,
            system_id,
        } => {
            output.push_str("<!DOCTYPE ");
            output.push_str(name);
            match (public_id, system_id) {
                (Some(public), system) => {
                    output.push_str(" PUBLIC \"");
                    output.push_str(public);
                    output.push('"');
                    if let Some(system) = system {
                        output.push_str(" \"");
                        output.push_str(system);
                        output.push('"');
                    }
                }
                (None, Some(system)) => {
                    output.push_str(" SYSTEM \"");
                    output.push_str(system);
                    output.push('"');
                }
                (None, None) => {}
            }
            output.push('>');
        }
        StubKind::Element { tag, .. } => {
            output.push('<');
            output.push_str(tag);

            for (name, value) in &node.attrs {
                output.push(' ');
                output.push_str(name);
                if let Some(value) = value {
                    output.push_str("=\"");
                    escape_attr_into(value, output);
                    output.push('"');
                }
            }

            if !node.classes.is_empty() {
                output.push_str(" class=\"");
                for (i, class) in node.classes.iter().enumerate() {
                    if i > 0 {
                        output.push(' ');
                    }
                    escape_attr_into(class, output);
                }
                output.push('"');
            }

            if !node.styles.is_empty() {
                output.push_str(" style=\"");
                for (i, (name, value)) in node.styles.iter().enumerate() {
                    if i > 0 {
                        output.push(';');
                    }
                    escape_attr_into(name, output);
                    output.push(':');
                    escape_attr_into(value, output);
                }
                output.push('"');
            }

            if is_void_element(tag) {
                match config.void_style {
                    VoidStyle::Html => output.push('>'),
                    VoidStyle::Xhtml => output.push_str(" />"),
                }
                return;
            }

            output.push('>');

            if is_raw_text_element(tag) {
                for &child in &node.children {
                    if let Some(text) = host.text(child) {
                        escape_script_into(text, output);
                    }
                }
            } else {
                for &child in &node.children {
                    render_html(host, child, config, output);
                }
            }

            output.push_str("</");
            output.push_str(tag);
            output.push('>');
        }
    }
}

/// Escape text content: `&` and `<`.
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    escape_text_into(s, &mut result);
    result
}

/// Escape an attribute value: `&` and `"`.
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    escape_attr_into(s, &mut result);
    result
}

/// Escape raw `<script>`/`<style>` text so it cannot terminate the element
/// or a JS string literal.
pub fn escape_script(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    escape_script_into(s, &mut result);
    result
}

fn escape_text_into(s: &str, output: &mut String) {
    for c in s.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            _ => output.push(c),
        }
    }
}

fn escape_attr_into(s: &str, output: &mut String) {
    for c in s.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            _ => output.push(c),
        }
    }
}

fn escape_script_into(s: &str, output: &mut String) {
    for c in s.chars() {
        match c {
            '/' => output.push_str("\\/"),
            '<' => output.push_str("\\u003C"),
            '>' => output.push_str("\\u003E"),
            '\u{2028}' => output.push_str("\\u2028"),
            '\u{2029}' => output.push_str("\\u2029"),
            _ => output.push(c),
        }
    }
}

/// Check if element is a void element (no closing tag).
fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

// =============================================================================
// Tests
// =============================================================================
