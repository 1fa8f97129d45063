//! Symbolic-expression codec.
//!
//! Grammar: a document is a sequence of top-level values. An atom is a maximal run of
//! characters other than `(`, `)` and whitespace; a list is `'(' value* ')'`.
//! Whitespace only separates atoms. Parsing is single pass recursive descent and fails
//! closed: an open list at end of input or a stray `)` aborts the whole document.

use std::fmt;

/// Nesting deeper than this is rejected instead of recursing further.
pub const MAX_DEPTH: usize = 256;

/// Errors raised while reading or interpreting symbolic expressions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("malformed expression: node not closed at end of input")]
    Unterminated,
    #[error("malformed expression: unmatched ')' at byte {offset}")]
    UnmatchedClose { offset: usize },
    #[error("malformed expression: nesting deeper than {}", MAX_DEPTH)]
    TooDeep,
    #[error("message is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("({tag} ...): missing element {index}")]
    Missing { tag: String, index: usize },
    #[error("({tag} ...): expected atom at element {index}")]
    ExpectedAtom { tag: String, index: usize },
    #[error("({tag} ...): expected list at element {index}")]
    ExpectedList { tag: String, index: usize },
    #[error("({tag} ...): invalid number {atom:?}")]
    InvalidNumber { tag: String, atom: String },
}

/// A parsed value: either a raw atom or a nested list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SExpr {
    Atom(String),
    List(Vec<SExpr>),
}

impl SExpr {
    pub fn atom(value: impl ToString) -> Self {
        Self::Atom(value.to_string())
    }

    pub fn list(items: impl IntoIterator<Item = SExpr>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// `(tag arg0 arg1 ...)`
    pub fn tagged(tag: &str, args: impl IntoIterator<Item = SExpr>) -> Self {
        let mut items = vec![Self::atom(tag)];
        items.extend(args);
        Self::List(items)
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(a) => Some(a),
            Self::List(_) => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Children of a list; empty for atoms.
    pub fn items(&self) -> &[SExpr] {
        match self {
            Self::List(items) => items,
            Self::Atom(_) => &[],
        }
    }

    /// The leading atom of a list, used to dispatch on node kinds.
    pub fn tag(&self) -> Option<&str> {
        self.items().first().and_then(SExpr::as_atom)
    }

    /// Sub-lists of this list, skipping atoms.
    pub fn sublists(&self) -> impl Iterator<Item = &SExpr> + '_ {
        self.items().iter().filter(|c| c.is_list())
    }

    /// First sub-list whose tag equals `tag`.
    pub fn find(&self, tag: &str) -> Option<&SExpr> {
        self.sublists().find(|c| c.tag() == Some(tag))
    }

    fn tag_label(&self) -> String {
        self.tag().unwrap_or_default().to_owned()
    }

    fn get(&self, index: usize) -> Result<&SExpr, CodecError> {
        self.items().get(index).ok_or_else(|| CodecError::Missing {
            tag: self.tag_label(),
            index,
        })
    }

    pub fn atom_at(&self, index: usize) -> Result<&str, CodecError> {
        self.get(index)?
            .as_atom()
            .ok_or_else(|| CodecError::ExpectedAtom {
                tag: self.tag_label(),
                index,
            })
    }

    pub fn list_at(&self, index: usize) -> Result<&SExpr, CodecError> {
        let item = self.get(index)?;
        if item.is_list() {
            Ok(item)
        } else {
            Err(CodecError::ExpectedList {
                tag: self.tag_label(),
                index,
            })
        }
    }

    pub fn f64_at(&self, index: usize) -> Result<f64, CodecError> {
        let atom = self.atom_at(index)?;
        atom.parse().map_err(|_| CodecError::InvalidNumber {
            tag: self.tag_label(),
            atom: atom.to_owned(),
        })
    }

    pub fn i64_at(&self, index: usize) -> Result<i64, CodecError> {
        let atom = self.atom_at(index)?;
        atom.parse().map_err(|_| CodecError::InvalidNumber {
            tag: self.tag_label(),
            atom: atom.to_owned(),
        })
    }

    /// Lenient flag: lists and `false`/`off`/`no`/`0` (any case) read as false.
    pub fn bool_at(&self, index: usize) -> Result<bool, CodecError> {
        Ok(match self.get(index)? {
            Self::List(_) => false,
            Self::Atom(a) => !matches!(a.to_ascii_lowercase().as_str(), "false" | "off" | "no" | "0"),
        })
    }

    /// Three consecutive numbers starting at `index`.
    pub fn vec3_at(&self, index: usize) -> Result<crate::types::Vec3, CodecError> {
        Ok(crate::types::Vec3::new(
            self.f64_at(index)?,
            self.f64_at(index + 1)?,
            self.f64_at(index + 2)?,
        ))
    }
}

impl fmt::Display for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(a) => f.write_str(a),
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Parse a document into its top-level values.
pub fn parse(text: &str) -> Result<Vec<SExpr>, CodecError> {
    let mut pos = 0;
    parse_items(text, &mut pos, 0)
}

/// Parse a byte message; the payload must be valid UTF-8.
pub fn parse_bytes(msg: &[u8]) -> Result<Vec<SExpr>, CodecError> {
    parse(std::str::from_utf8(msg)?)
}

fn parse_items(text: &str, pos: &mut usize, depth: usize) -> Result<Vec<SExpr>, CodecError> {
    if depth > MAX_DEPTH {
        return Err(CodecError::TooDeep);
    }

    let bytes = text.as_bytes();
    let mut items = Vec::new();
    let mut start = *pos;

    while *pos < bytes.len() {
        match bytes[*pos] {
            b'(' => {
                flush_atom(text, start, *pos, &mut items);
                *pos += 1;
                let children = parse_items(text, pos, depth + 1)?;
                items.push(SExpr::List(children));
                start = *pos;
            }
            b')' => {
                if depth == 0 {
                    return Err(CodecError::UnmatchedClose { offset: *pos });
                }
                flush_atom(text, start, *pos, &mut items);
                *pos += 1;
                return Ok(items);
            }
            b if b.is_ascii_whitespace() => {
                flush_atom(text, start, *pos, &mut items);
                *pos += 1;
                start = *pos;
            }
            _ => *pos += 1,
        }
    }

    if depth > 0 {
        return Err(CodecError::Unterminated);
    }
    flush_atom(text, start, *pos, &mut items);
    Ok(items)
}

fn flush_atom(text: &str, start: usize, end: usize, items: &mut Vec<SExpr>) {
    if end > start {
        items.push(SExpr::Atom(text[start..end].to_owned()));
    }
}

/// Render top-level values back to text. Adjacent lists are written without a
/// separator, the compact form simulators send and expect.
pub fn encode(values: &[SExpr]) -> String {
    let mut out = String::new();
    let mut prev_is_list = true;
    for (i, value) in values.iter().enumerate() {
        if i > 0 && !(prev_is_list && value.is_list()) {
            out.push(' ');
        }
        out.push_str(&value.to_string());
        prev_is_list = value.is_list();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atoms(node: &SExpr) -> Vec<&str> {
        node.items().iter().filter_map(SExpr::as_atom).collect()
    }

    #[test]
    fn parses_nested_lists() {
        let doc = parse("(time (now 12.5))(HJ (n hj1)(ax 0.3))").unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc[0].tag(), Some("time"));
        assert_eq!(doc[0].list_at(1).unwrap().f64_at(1).unwrap(), 12.5);
        let hj = &doc[1];
        assert_eq!(hj.find("n").unwrap().atom_at(1).unwrap(), "hj1");
        assert_eq!(hj.find("ax").unwrap().f64_at(1).unwrap(), 0.3);
    }

    #[test]
    fn whitespace_only_separates() {
        let a = parse("(a  b\t(c\n d) )").unwrap();
        let b = parse("(a b (c d))").unwrap();
        assert_eq!(a, b);
        assert_eq!(atoms(&a[0]), vec!["a", "b"]);
    }

    #[test]
    fn trailing_top_level_atom_is_flushed() {
        let doc = parse("(x) tail").unwrap();
        assert_eq!(doc, vec![SExpr::list([SExpr::atom("x")]), SExpr::atom("tail")]);
    }

    #[test]
    fn empty_document_is_valid() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("   ").unwrap().is_empty());
        assert_eq!(parse("()").unwrap(), vec![SExpr::List(vec![])]);
    }

    #[test]
    fn unmatched_open_fails() {
        assert_eq!(parse("(time (now 1.0)"), Err(CodecError::Unterminated));
        assert_eq!(parse("("), Err(CodecError::Unterminated));
    }

    #[test]
    fn unmatched_close_fails() {
        assert_eq!(
            parse("(a))(b)"),
            Err(CodecError::UnmatchedClose { offset: 3 })
        );
        assert_eq!(parse(")"), Err(CodecError::UnmatchedClose { offset: 0 }));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let text = "(".repeat(MAX_DEPTH + 2) + &")".repeat(MAX_DEPTH + 2);
        assert_eq!(parse(&text), Err(CodecError::TooDeep));
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        assert!(matches!(parse_bytes(&[b'(', 0xff, b')']), Err(CodecError::Utf8(_))));
    }

    #[test]
    fn round_trip_is_whitespace_insensitive() {
        let text = "(GS (t 0.00) (pm BeforeKickOff))  (hear left 12.3 self hello world)";
        let parsed = parse(text).unwrap();
        let encoded = encode(&parsed);
        assert_eq!(encoded, "(GS (t 0.00) (pm BeforeKickOff))(hear left 12.3 self hello world)");
        assert_eq!(parse(&encoded).unwrap(), parsed);
    }

    #[test]
    fn encode_separates_top_level_atoms() {
        let values = vec![SExpr::atom("a"), SExpr::atom("b"), SExpr::tagged("c", [])];
        assert_eq!(encode(&values), "a b (c)");
        assert_eq!(parse(&encode(&values)).unwrap(), values);
    }

    #[test]
    fn typed_accessors_report_context() {
        let doc = parse("(ax nope (x))").unwrap();
        let node = &doc[0];
        assert_eq!(
            node.f64_at(1),
            Err(CodecError::InvalidNumber {
                tag: "ax".into(),
                atom: "nope".into()
            })
        );
        assert_eq!(
            node.atom_at(2),
            Err(CodecError::ExpectedAtom {
                tag: "ax".into(),
                index: 2
            })
        );
        assert_eq!(
            node.list_at(1),
            Err(CodecError::ExpectedList {
                tag: "ax".into(),
                index: 1
            })
        );
        assert_eq!(
            node.atom_at(5),
            Err(CodecError::Missing {
                tag: "ax".into(),
                index: 5
            })
        );
    }

    #[test]
    fn bool_accessor_is_lenient() {
        let doc = parse("(TCH n bumper val 1 x OFF (y))").unwrap();
        let node = &doc[0];
        assert!(node.bool_at(4).unwrap());
        assert!(!node.bool_at(6).unwrap());
        assert!(!node.bool_at(7).unwrap());
    }
}
