//! Block YAML writer

use super::scalar::{needs_quotes, render_inline};
use super::Format;
use crate::node::{Chomping, Mapping, Node, NodeKind, Scalar, ScalarStyle, Sequence};

pub(super) fn write(root: &Node, format: &Format) -> String {
    let mut w = Writer {
        out: String::new(),
        format,
    };
    w.head(&root.comments().head, 0);
    if format.explicit_start {
        w.out.push_str("---");
        w.line_comment(root);
        w.out.push('\n');
    }
    match root.kind() {
        NodeKind::Mapping(map) if is_block(root) => w.mapping(map, 0, false),
        NodeKind::Sequence(seq) if is_block(root) => w.sequence(seq, 0, false),
        _ => {
            let text = match root.kind() {
                NodeKind::Scalar(s) => render_inline(s, false),
                _ => flow(root),
            };
            if !text.is_empty() {
                w.out.push_str(&text);
                if !format.explicit_start {
                    w.line_comment(root);
                }
                w.out.push('\n');
            }
        }
    }
    for line in &root.comments().foot {
        w.out.push_str(line);
        w.out.push('\n');
    }
    w.out
}

/// `- key: v` form: no comment between the dash and the first child
fn is_compact(item: &Node) -> bool {
    let first = match item.kind() {
        NodeKind::Mapping(map) => map.iter().next().map(|(_, v)| v),
        NodeKind::Sequence(seq) => seq.iter().next(),
        NodeKind::Scalar(_) => None,
    };
    item.comments().line.is_none() && first.is_some_and(|n| n.comments().head.is_empty())
}

/// Non-empty collection written in block style
fn is_block(node: &Node) -> bool {
    match node.kind() {
        NodeKind::Mapping(m) => !m.is_empty() && !m.is_flow(),
        NodeKind::Sequence(s) => !s.is_empty() && !s.is_flow(),
        NodeKind::Scalar(_) => false,
    }
}

fn is_block_scalar(scalar: &Scalar) -> bool {
    matches!(scalar.style(), ScalarStyle::Literal(_) | ScalarStyle::Folded(_))
}

fn render_key(key: &str, flow: bool) -> String {
    if key.is_empty() || needs_quotes(key, flow) {
        render_inline(&Scalar::new(key, ScalarStyle::DoubleQuoted), flow)
    } else {
        key.to_string()
    }
}

fn flow(node: &Node) -> String {
    match node.kind() {
        NodeKind::Scalar(s) => render_inline(s, true),
        NodeKind::Sequence(seq) => {
            let items: Vec<String> = seq.iter().map(flow).collect();
            format!("[{}]", items.join(", "))
        }
        NodeKind::Mapping(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", render_key(k, true), flow(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

struct Writer<'f> {
    out: String,
    format: &'f Format,
}

impl Writer<'_> {
    fn pad(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat(' ').take(indent));
    }

    /// Comment lines above a node; lines already indented at least as deep
    /// as the node are written verbatim
    fn head(&mut self, lines: &[String], indent: usize) {
        for line in lines {
            let trimmed = line.trim_start();
            if trimmed.is_empty() {
                self.out.push('\n');
                continue;
            }
            if line.len() - trimmed.len() >= indent {
                self.out.push_str(line);
            } else {
                self.pad(indent);
                self.out.push_str(trimmed);
            }
            self.out.push('\n');
        }
    }

    fn line_comment(&mut self, node: &Node) {
        if let Some(comment) = &node.comments().line {
            if !comment.starts_with(char::is_whitespace) {
                self.out.push(' ');
            }
            self.out.push_str(comment);
        }
    }

    fn mapping(&mut self, map: &Mapping, indent: usize, first_inline: bool) {
        for (i, (key, value)) in map.iter().enumerate() {
            if !(first_inline && i == 0) {
                self.head(&value.comments().head, indent);
                self.pad(indent);
            }
            self.out.push_str(&render_key(key, false));
            self.out.push(':');
            self.value(value, indent);
        }
    }

    /// Everything after `key:` for an entry at `indent`
    fn value(&mut self, node: &Node, indent: usize) {
        let child = indent + self.format.indent;
        match node.kind() {
            NodeKind::Scalar(s) if is_block_scalar(s) => self.block_scalar(s, node, child),
            NodeKind::Scalar(s) => {
                let text = render_inline(s, false);
                if !text.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(&text);
                }
                self.line_comment(node);
                self.out.push('\n');
            }
            NodeKind::Mapping(map) if is_block(node) => {
                self.line_comment(node);
                self.out.push('\n');
                self.mapping(map, child, false);
                self.head(&node.comments().foot, child);
            }
            NodeKind::Sequence(seq) if is_block(node) => {
                self.line_comment(node);
                self.out.push('\n');
                let at = if self.format.indent_sequences { child } else { indent };
                self.sequence(seq, at, false);
                self.head(&node.comments().foot, at);
            }
            _ => {
                self.out.push(' ');
                self.out.push_str(&flow(node));
                self.line_comment(node);
                self.out.push('\n');
            }
        }
    }

    /// Items at `indent`; with `first_inline` the first `- ` continues a
    /// line the caller already started
    fn sequence(&mut self, seq: &Sequence, indent: usize, first_inline: bool) {
        let nested = indent + 2;
        for (i, item) in seq.iter().enumerate() {
            if !(first_inline && i == 0) {
                self.head(&item.comments().head, indent);
                self.pad(indent);
            }
            match item.kind() {
                NodeKind::Mapping(map) if is_block(item) && is_compact(item) => {
                    self.out.push_str("- ");
                    self.mapping(map, nested, true);
                }
                NodeKind::Sequence(inner) if is_block(item) && is_compact(item) => {
                    self.out.push_str("- ");
                    self.sequence(inner, nested, true);
                }
                NodeKind::Mapping(map) if is_block(item) => {
                    self.out.push('-');
                    self.line_comment(item);
                    self.out.push('\n');
                    self.mapping(map, nested, false);
                }
                NodeKind::Sequence(inner) if is_block(item) => {
                    self.out.push('-');
                    self.line_comment(item);
                    self.out.push('\n');
                    self.sequence(inner, nested, false);
                }
                _ => {
                    self.out.push('-');
                    self.value(item, indent);
                    continue;
                }
            }
            self.head(&item.comments().foot, nested);
        }
    }

    /// ` |-` header plus body lines at `indent`
    fn block_scalar(&mut self, scalar: &Scalar, node: &Node, indent: usize) {
        let (indicator, chomping) = match scalar.style() {
            ScalarStyle::Folded(c) => ('>', c),
            ScalarStyle::Literal(c) => ('|', c),
            _ => ('|', Chomping::Clip),
        };
        let value = scalar.value();
        let body = match chomping {
            Chomping::Strip => value,
            Chomping::Clip | Chomping::Keep => value.strip_suffix('\n').unwrap_or(value),
        };
        let lines: Vec<&str> = if body.is_empty() {
            Vec::new()
        } else {
            body.split('\n').collect()
        };

        self.out.push(' ');
        self.out.push(indicator);
        if lines.iter().find(|l| !l.is_empty()).is_some_and(|l| l.starts_with(' ')) {
            self.out.push_str(&self.format.indent.to_string());
        }
        match chomping {
            Chomping::Strip => self.out.push('-'),
            Chomping::Keep => self.out.push('+'),
            Chomping::Clip => {}
        }
        self.line_comment(node);
        self.out.push('\n');
        for line in lines {
            if !line.is_empty() {
                self.pad(indent);
                self.out.push_str(line);
            }
            self.out.push('\n');
        }
    }
}
