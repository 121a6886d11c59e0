//! Line-oriented block YAML reader

use super::scalar::{parse_block_header, parse_inline, quoted_end, split_comment};
use super::{Document, Format, ParseError};
use crate::node::{Chomping, Mapping, Node, Scalar, ScalarStyle, Sequence};

/// One physical line, pre-split into indentation, content and comment
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    raw: &'a str,
    indent: usize,
    tab_indent: bool,
    /// Empty for blank and comment-only lines
    text: &'a str,
    comment: Option<&'a str>,
}

impl<'a> Line<'a> {
    fn classify(number: usize, raw: &'a str) -> Self {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let rest = raw.trim_start_matches([' ', '\t']);
        let leading = &raw[..raw.len() - rest.len()];
        let (text, comment) = split_comment(rest);
        Self {
            number,
            raw,
            indent: leading.len(),
            tab_indent: leading.contains('\t'),
            text,
            comment,
        }
    }

    fn is_content(&self) -> bool {
        !self.text.is_empty()
    }
}

fn is_sequence_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

/// Split `key: rest` off a content line; `None` when the line is not an entry
fn split_key(text: &str, line: usize) -> Result<Option<(String, &str)>, ParseError> {
    if text.starts_with(['"', '\'']) {
        let Some(end) = quoted_end(text) else {
            return Ok(None);
        };
        let after = text[end..].trim_start();
        return match after.strip_prefix(':') {
            Some(rest) if rest.is_empty() || rest.starts_with([' ', '\t']) => {
                let key = parse_inline(&text[..end]).map_err(|m| ParseError::syntax(line, m))?;
                Ok(Some((key.value().to_string(), rest.trim())))
            }
            _ => Ok(None),
        };
    }
    if text.starts_with(['[', '{']) || is_sequence_item(text) {
        return Ok(None);
    }
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b':' && (i + 1 == bytes.len() || matches!(bytes[i + 1], b' ' | b'\t')) {
            let key = text[..i].trim_end();
            if key.starts_with('?') {
                return Err(ParseError::Unsupported {
                    line,
                    feature: "complex mapping keys",
                });
            }
            if key.starts_with(['&', '*', '!']) {
                return Err(ParseError::Unsupported {
                    line,
                    feature: "anchors, aliases and tags",
                });
            }
            if key.is_empty() {
                return Err(ParseError::syntax(line, "empty mapping key"));
            }
            return Ok(Some((key.to_string(), text[i + 1..].trim())));
        }
    }
    Ok(None)
}

fn prepend_head(node: &mut Node, mut lines: Vec<String>) {
    let head = &mut node.comments_mut().head;
    lines.append(head);
    *head = lines;
}

fn set_line_comment(node: &mut Node, comment: Option<&str>) {
    if let Some(comment) = comment {
        node.comments_mut().line = Some(comment.to_string());
    }
}

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
    format: Format,
    indent_seen: bool,
    sequence_style_seen: bool,
}

impl<'a> Parser<'a> {
    fn peek_content(&self) -> Option<usize> {
        (self.pos..self.lines.len()).find(|&i| self.lines[i].is_content())
    }

    /// Consume blank/comment lines up to `until` as head comment lines
    fn take_comments(&mut self, until: usize) -> Vec<String> {
        let taken = self.lines[self.pos..until]
            .iter()
            .map(|l| l.raw.trim_end().to_string())
            .collect();
        self.pos = until;
        taken
    }

    fn content(&self, idx: usize) -> Result<Line<'a>, ParseError> {
        let line = self.lines[idx];
        if line.tab_indent {
            return Err(ParseError::syntax(line.number, "tab character in indentation"));
        }
        Ok(line)
    }

    fn parse_node(&mut self, idx: usize) -> Result<Node, ParseError> {
        let line = self.content(idx)?;
        if is_sequence_item(line.text) {
            return self.parse_sequence(line.indent);
        }
        if split_key(line.text, line.number)?.is_some() {
            return self.parse_mapping(line.indent);
        }
        let head = self.take_comments(idx);
        self.pos = idx + 1;
        let mut node = self.inline_value(line.indent, line.text, line.number)?;
        set_line_comment(&mut node, line.comment);
        node.comments_mut().head = head;
        Ok(node)
    }

    fn parse_mapping(&mut self, indent: usize) -> Result<Node, ParseError> {
        let mut mapping = Mapping::new();
        while let Some(idx) = self.peek_content() {
            let line = self.content(idx)?;
            if line.indent < indent || matches!(line.text, "---" | "...") {
                break;
            }
            if line.indent > indent {
                return Err(ParseError::syntax(line.number, "unexpected indentation"));
            }
            let Some((key, rest)) = split_key(line.text, line.number)? else {
                return Err(ParseError::syntax(line.number, "expected a mapping key"));
            };
            if mapping.contains_key(&key) {
                return Err(ParseError::syntax(line.number, format!("duplicate key {key:?}")));
            }
            let head = self.take_comments(idx);
            self.pos = idx + 1;
            let mut value = self.value_after_indicator(indent, rest, line.number, true)?;
            set_line_comment(&mut value, line.comment);
            prepend_head(&mut value, head);
            mapping.insert(key, value);
        }
        Ok(Node::from(mapping))
    }

    fn parse_sequence(&mut self, indent: usize) -> Result<Node, ParseError> {
        let mut seq = Sequence::new();
        while let Some(idx) = self.peek_content() {
            let line = self.content(idx)?;
            if line.indent < indent || !is_sequence_item(line.text) {
                break;
            }
            if line.indent > indent {
                return Err(ParseError::syntax(line.number, "unexpected indentation"));
            }
            let head = self.take_comments(idx);
            let rest = line.text[1..].trim_start();
            let column = indent + (line.text.len() - rest.len());

            let mut item = if is_sequence_item(rest) || split_key(rest, line.number)?.is_some() {
                // Compact nested collection: re-read this line from the item's column.
                self.lines[idx].indent = column;
                self.lines[idx].text = rest;
                self.pos = idx;
                if is_sequence_item(rest) {
                    self.parse_sequence(column)?
                } else {
                    self.parse_mapping(column)?
                }
            } else {
                self.pos = idx + 1;
                let mut value = self.value_after_indicator(indent, rest, line.number, false)?;
                set_line_comment(&mut value, line.comment);
                value
            };
            prepend_head(&mut item, head);
            seq.push(item);
        }
        Ok(Node::from(seq))
    }

    /// Value following `key:` or `-` on a line at `indent`
    fn value_after_indicator(
        &mut self,
        indent: usize,
        rest: &'a str,
        line: usize,
        in_mapping: bool,
    ) -> Result<Node, ParseError> {
        if !rest.is_empty() {
            return self.inline_value(indent + 1, rest, line);
        }
        let Some(next) = self.peek_content() else {
            return Ok(Node::null());
        };
        let child = self.lines[next];
        if child.indent > indent {
            if in_mapping {
                self.note_nesting(indent, child.indent, is_sequence_item(child.text));
            }
            return self.parse_node(next);
        }
        if in_mapping && child.indent == indent && is_sequence_item(child.text) {
            if !self.sequence_style_seen {
                self.format.indent_sequences = false;
                self.sequence_style_seen = true;
            }
            return self.parse_sequence(indent);
        }
        Ok(Node::null())
    }

    fn note_nesting(&mut self, parent: usize, child: usize, sequence: bool) {
        if sequence {
            if !self.sequence_style_seen {
                self.format.indent_sequences = true;
                self.sequence_style_seen = true;
            }
        } else if !self.indent_seen {
            self.format.indent = child - parent;
            self.indent_seen = true;
        }
    }

    /// Scalar, flow collection or block scalar written on the current line
    ///
    /// `min_indent` is the smallest indentation a continuation line may have.
    fn inline_value(
        &mut self,
        min_indent: usize,
        text: &str,
        line: usize,
    ) -> Result<Node, ParseError> {
        match text.as_bytes()[0] {
            b'|' | b'>' => return self.block_scalar(min_indent, text, line),
            b'[' | b'{' => {
                let value: serde_yaml::Value = serde_yaml::from_str(text)
                    .map_err(|source| ParseError::Flow { line, source })?;
                let mut node = Node::from_value(&value);
                node.set_flow_recursive();
                return Ok(node);
            }
            b'&' | b'*' | b'!' => {
                return Err(ParseError::Unsupported {
                    line,
                    feature: "anchors, aliases and tags",
                })
            }
            _ => {}
        }
        if is_sequence_item(text) {
            return Err(ParseError::syntax(line, "block sequence entries are not allowed here"));
        }
        let scalar = parse_inline(text).map_err(|m| ParseError::syntax(line, m))?;
        if scalar.style().is_plain() && (scalar.value().contains(": ") || scalar.value().contains(":\t")) {
            return Err(ParseError::syntax(line, "mapping values are not allowed here"));
        }
        if let Some(next) = self.peek_content() {
            let next = self.lines[next];
            if next.indent >= min_indent {
                return Err(ParseError::Unsupported {
                    line: next.number,
                    feature: "multi-line scalars",
                });
            }
        }
        Ok(Node::from(scalar))
    }

    fn block_scalar(
        &mut self,
        min_indent: usize,
        header: &str,
        line: usize,
    ) -> Result<Node, ParseError> {
        let (style, explicit) =
            parse_block_header(header).map_err(|m| ParseError::syntax(line, m))?;
        let chomping = match style {
            ScalarStyle::Literal(c) | ScalarStyle::Folded(c) => c,
            _ => Chomping::Clip,
        };
        let mut content_indent = explicit.map(|d| min_indent.saturating_sub(1) + d);
        let mut body: Vec<&str> = Vec::new();
        let mut idx = self.pos;
        while idx < self.lines.len() {
            let raw = self.lines[idx].raw;
            if raw.trim().is_empty() {
                body.push("");
                idx += 1;
                continue;
            }
            let indent = raw.len() - raw.trim_start_matches(' ').len();
            let expected = *content_indent.get_or_insert(indent);
            if indent < expected || indent < min_indent {
                break;
            }
            body.push(&raw[expected..]);
            idx += 1;
        }

        let trailing = body.iter().rev().take_while(|l| l.is_empty()).count();
        if chomping != Chomping::Keep {
            // Trailing blank lines stay in the stream as separators.
            body.truncate(body.len() - trailing);
            idx -= trailing;
        }
        self.pos = idx;

        let mut value = body.join("\n");
        match chomping {
            Chomping::Strip => {}
            Chomping::Clip if value.is_empty() => {}
            Chomping::Clip | Chomping::Keep => value.push('\n'),
        }
        Ok(Node::from(Scalar::new(value, style)))
    }
}

pub(super) fn parse(input: &str) -> Result<Document, ParseError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let lines = input
        .lines()
        .enumerate()
        .map(|(i, raw)| Line::classify(i + 1, raw))
        .collect();
    let mut parser = Parser {
        lines,
        pos: 0,
        format: Format::default(),
        indent_seen: false,
        sequence_style_seen: false,
    };

    let mut first = parser.peek_content().ok_or(ParseError::Empty)?;
    let mut preamble = Vec::new();
    let mut marker_comment = None;
    let marker = parser.lines[first];
    if marker.text == "---" {
        preamble = parser.take_comments(first);
        marker_comment = marker.comment;
        parser.format.explicit_start = true;
        parser.pos = first + 1;
        first = parser.peek_content().ok_or(ParseError::Empty)?;
    } else if marker.text.starts_with("--- ") {
        return Err(ParseError::Unsupported {
            line: marker.number,
            feature: "values on the document marker line",
        });
    }

    let mut root = parser.parse_node(first)?;

    if let Some(idx) = parser.peek_content() {
        let line = parser.lines[idx];
        return Err(match line.text {
            "---" => ParseError::Unsupported {
                line: line.number,
                feature: "multi-document streams",
            },
            "..." => ParseError::Unsupported {
                line: line.number,
                feature: "document end markers",
            },
            _ => ParseError::syntax(line.number, "unexpected content after document"),
        });
    }

    let foot = parser.take_comments(parser.lines.len());
    prepend_head(&mut root, preamble);
    set_line_comment(&mut root, marker_comment);
    root.comments_mut().foot = foot;

    Ok(Document {
        root,
        format: parser.format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ScalarTag;
    use crate::path::{resolve, NodePath};

    fn at<'a>(doc: &'a Document, path: &str) -> &'a Node {
        resolve(doc.root(), &NodePath::literal(path)).unwrap()
    }

    #[test]
    fn reads_nested_mappings_and_sequences() {
        let doc = Document::parse(concat!(
            "version: 0.0.5\n",
            "context:\n",
            "  chains:\n",
            "    l1:\n",
            "      fork:\n",
            "        block: 22475020\n",
            "  operators:\n",
            "    - address: \"0x90\"\n",
            "      stake: 1000ETH\n",
            "    - address: \"0x15\"\n",
        ))
        .unwrap();
        assert_eq!(at(&doc, "version").as_str(), Some("0.0.5"));
        assert_eq!(at(&doc, "context.chains.l1.fork.block").as_str(), Some("22475020"));
        assert_eq!(at(&doc, "context.operators.1.address").as_str(), Some("0x15"));
        assert_eq!(at(&doc, "context.operators.0.stake").as_str(), Some("1000ETH"));
        assert_eq!(doc.format().indent, 2);
        assert!(doc.format().indent_sequences);
    }

    #[test]
    fn attaches_comments() {
        let doc = Document::parse(
            "# header\n\nversion: 1 # inline\ncontext:\n  # about name\n  name: devnet\n\
             # trailing\n",
        )
        .unwrap();
        let version = at(&doc, "version");
        assert_eq!(version.comments().head, vec!["# header", ""]);
        assert_eq!(version.comments().line.as_deref(), Some(" # inline"));
        assert_eq!(at(&doc, "context.name").comments().head, vec!["  # about name"]);
        assert_eq!(doc.root().comments().foot, vec!["# trailing"]);
    }

    #[test]
    fn detects_compact_sequences_and_wide_indent() {
        let doc = Document::parse("a:\n    b: 1\nlist:\n- x\n- y\nafter: 2\n").unwrap();
        assert_eq!(doc.format().indent, 4);
        assert!(!doc.format().indent_sequences);
        assert_eq!(at(&doc, "list").as_sequence().unwrap().len(), 2);
        assert_eq!(at(&doc, "after").as_str(), Some("2"));
    }

    #[test]
    fn reads_scalar_styles() {
        let doc = Document::parse(
            "a: 'single'\nb: \"double\"\nc: plain text\nd:\ne: ~\nf: \"22640530\"\n",
        )
        .unwrap();
        assert_eq!(at(&doc, "a").as_scalar().unwrap().style(), ScalarStyle::SingleQuoted);
        assert_eq!(at(&doc, "b").as_scalar().unwrap().style(), ScalarStyle::DoubleQuoted);
        assert_eq!(at(&doc, "c").as_str(), Some("plain text"));
        assert!(at(&doc, "d").is_null());
        assert!(at(&doc, "e").is_null());
        assert_eq!(at(&doc, "f").as_scalar().unwrap().tag(), ScalarTag::Str);
    }

    #[test]
    fn reads_block_scalars() {
        let doc =
            Document::parse("script: |\n  echo one\n\n  echo two\nkeep: >+\n  folded\n\nnext: 1\n")
                .unwrap();
        assert_eq!(at(&doc, "script").as_str(), Some("echo one\n\necho two\n"));
        assert_eq!(at(&doc, "keep").as_str(), Some("folded\n\n"));
        assert_eq!(at(&doc, "next").as_str(), Some("1"));
    }

    #[test]
    fn reads_flow_collections() {
        let doc = Document::parse("stakers: []\nports: [8545, 9545]\nmeta: {a: 1}\n").unwrap();
        let stakers = at(&doc, "stakers").as_sequence().unwrap();
        assert!(stakers.is_empty() && stakers.is_flow());
        assert_eq!(at(&doc, "ports.1").as_str(), Some("9545"));
        assert_eq!(at(&doc, "meta.a").as_str(), Some("1"));
    }

    #[test]
    fn reads_nested_sequence_items() {
        let doc = Document::parse("m:\n  - - a\n    - b\n  -\n    k: v\n").unwrap();
        assert_eq!(at(&doc, "m.0.1").as_str(), Some("b"));
        assert_eq!(at(&doc, "m.1.k").as_str(), Some("v"));
    }

    #[test]
    fn quoted_keys_and_explicit_start() {
        let doc = Document::parse("# pre\n---\n\"odd key\": 1\n").unwrap();
        assert!(doc.format().explicit_start);
        assert_eq!(doc.root().get("odd key").unwrap().as_str(), Some("1"));
        assert_eq!(doc.root().comments().head, vec!["# pre"]);
    }

    #[test]
    fn quote_inside_plain_scalar_does_not_swallow_comment() {
        let input = "a: x 'y # z'\nb: don't # ask\n";
        let doc = Document::parse(input).unwrap();
        let a = at(&doc, "a");
        assert_eq!(a.as_str(), Some("x 'y"));
        assert_eq!(a.comments().line.as_deref(), Some(" # z'"));
        assert_eq!(at(&doc, "b").as_str(), Some("don't"));
        assert_eq!(doc.to_yaml_string(), input);
    }

    #[test]
    fn tab_separates_key_and_value() {
        let doc = Document::parse("a:\tb\n").unwrap();
        assert_eq!(at(&doc, "a").as_str(), Some("b"));

        let doc = Document::parse("name:\tdevnet\nversion: 0.0.1\n\"q\":\t'v'\n").unwrap();
        assert_eq!(at(&doc, "name").as_str(), Some("devnet"));
        assert_eq!(at(&doc, "version").as_str(), Some("0.0.1"));
        assert_eq!(at(&doc, "q").as_str(), Some("v"));
        assert_eq!(doc.to_yaml_string(), "name: devnet\nversion: 0.0.1\nq: 'v'\n");
    }

    #[test]
    fn rejects_unsupported_input() {
        let cases = [
            ("a: &anchor 1\n", 1),
            ("a: 1\n---\nb: 2\n", 2),
            ("a: first\n  continued\n", 2),
            ("a:\n\tb: 1\n", 2),
            ("a: 1\na: 2\n", 2),
            ("a: b: c\n", 1),
            ("a:\n  b: 1\n    c: 2\n", 3),
            ("a: [1, 2\n", 1),
        ];
        for (input, line) in cases {
            let err = Document::parse(input).unwrap_err();
            assert_eq!(err.line(), Some(line), "{input:?}: {err}");
        }
        assert!(matches!(Document::parse("# only\n\n"), Err(ParseError::Empty)));
        assert!(matches!(Document::from_slice(&[0xff, 0xfe]), Err(ParseError::Encoding(_))));
    }
}
