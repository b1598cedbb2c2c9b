//! CSS Selector Matching
//!
//! Selector lists made of compound selectors (type, `*`, `#id`, `.class`,
//! attribute selectors) joined by descendant or child combinators. Anything
//! else (pseudo-classes, sibling combinators) is rejected at parse time.

use std::fmt;
use std::str::FromStr;

use crate::{DomTree, NodeId};

/// Selector parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected {found:?} at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("unterminated attribute selector starting at offset {offset}")]
    UnterminatedAttribute { offset: usize },
    #[error("expected identifier at offset {offset}")]
    ExpectedIdent { offset: usize },
    #[error("unsupported selector syntax {0:?}")]
    Unsupported(String),
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<AttributeMatcher>,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeMatcher {
    /// [attr=value] - exact match
    Exact(String),
    /// [attr~=value] - whitespace-separated list contains
    Includes(String),
    /// [attr|=value] - exact or prefix with hyphen
    DashMatch(String),
    /// [attr^=value] - starts with
    Prefix(String),
    /// [attr$=value] - ends with
    Suffix(String),
    /// [attr*=value] - contains substring
    Substring(String),
}

impl AttributeSelector {
    /// Check if an attribute value matches
    pub fn matches(&self, value: Option<&str>) -> bool {
        let (matcher, value) = match (&self.matcher, value) {
            (None, value) => return value.is_some(),
            (Some(_), None) => return false,
            (Some(m), Some(v)) => (m, v),
        };

        let fold = |s: &str| {
            if self.case_insensitive {
                s.to_lowercase()
            } else {
                s.to_string()
            }
        };
        let val = fold(value);

        match matcher {
            AttributeMatcher::Exact(expected) => val == fold(expected),
            AttributeMatcher::Includes(expected) => {
                let expected = fold(expected);
                val.split_whitespace().any(|w| w == expected)
            }
            AttributeMatcher::DashMatch(expected) => {
                let expected = fold(expected);
                val == expected || val.starts_with(&format!("{}-", expected))
            }
            // Empty operands never match for the substring family
            AttributeMatcher::Prefix(expected) => !expected.is_empty() && val.starts_with(&fold(expected)),
            AttributeMatcher::Suffix(expected) => !expected.is_empty() && val.ends_with(&fold(expected)),
            AttributeMatcher::Substring(expected) => !expected.is_empty() && val.contains(&fold(expected)),
        }
    }
}

/// Type/id/class/attribute conditions on a single element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
}

impl CompoundSelector {
    pub fn matches(&self, tree: &DomTree, element: NodeId) -> bool {
        let Some(el) = tree.element(element) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if !el.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attributes.iter().all(|a| a.matches(el.get_attr(&a.name)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace
    Descendant,
    /// `>`
    Child,
}

/// Compound selectors joined by combinators, leftmost first
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    /// Each compound with the combinator linking it to the previous one
    /// (ignored for the first)
    parts: Vec<(Combinator, CompoundSelector)>,
}

impl ComplexSelector {
    pub fn matches(&self, tree: &DomTree, element: NodeId) -> bool {
        match self.parts.len() {
            0 => false,
            n => self.matches_from(tree, n - 1, element),
        }
    }

    fn matches_from(&self, tree: &DomTree, idx: usize, element: NodeId) -> bool {
        let (combinator, compound) = &self.parts[idx];
        if !compound.matches(tree, element) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => tree
                .parent_element(element)
                .is_some_and(|p| self.matches_from(tree, idx - 1, p)),
            Combinator::Descendant => tree
                .ancestors(element)
                .filter(|&a| tree.is_element(a))
                .any(|a| self.matches_from(tree, idx - 1, a)),
        }
    }
}

/// Comma-separated selector list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    source: String,
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Parse a selector list
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let selectors = Parser::new(input).parse_list()?;
        Ok(Self {
            source: input.trim().to_string(),
            selectors,
        })
    }

    /// Does the element match any selector in the list
    pub fn matches(&self, tree: &DomTree, element: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(tree, element))
    }

    /// Element itself or any descendant matches
    pub fn matches_or_contains(&self, tree: &DomTree, node: NodeId) -> bool {
        if !tree.is_element(node) {
            return false;
        }
        self.matches(tree, node) || tree.descendants(node).into_iter().any(|d| self.matches(tree, d))
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::Unexpected { found, offset: self.pos },
            None => SelectorError::Empty,
        }
    }

    fn parse_list(&mut self) -> Result<Vec<ComplexSelector>, SelectorError> {
        let mut list = Vec::new();
        loop {
            self.skip_ws();
            list.push(self.parse_complex()?);
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(',') => {
                    self.bump();
                }
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(list)
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut parts = Vec::new();
        let mut combinator = Combinator::Descendant;
        loop {
            let compound = self.parse_compound()?;
            parts.push((combinator, compound));

            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    combinator = Combinator::Child;
                }
                Some(c @ ('+' | '~')) => {
                    return Err(SelectorError::Unsupported(format!("combinator '{}'", c)));
                }
                Some(_) if had_ws => combinator = Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(ComplexSelector { parts })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, SelectorError> {
        let start = self.pos;
        let mut compound = CompoundSelector::default();

        match self.peek() {
            Some('*') => {
                self.bump();
            }
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.parse_ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => compound.attributes.push(self.parse_attribute()?),
                Some(':') => {
                    let rest = &self.input[self.pos..];
                    let end = rest.find(|c: char| c.is_whitespace() || c == ',').unwrap_or(rest.len());
                    return Err(SelectorError::Unsupported(rest[..end].to_string()));
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_ident_start(c) => {}
            _ => return Err(SelectorError::ExpectedIdent { offset: start }),
        }
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        let open = self.pos;
        let unterminated = SelectorError::UnterminatedAttribute { offset: open };
        self.bump();
        self.skip_ws();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();

        let op = match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(AttributeSelector {
                    name,
                    matcher: None,
                    case_insensitive: false,
                });
            }
            None => return Err(unterminated),
            Some('=') => {
                self.bump();
                '='
            }
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                self.bump();
                if self.bump() != Some('=') {
                    return Err(unterminated);
                }
                c
            }
            Some(_) => return Err(self.unexpected()),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                let rest = &self.input[self.pos..];
                let end = rest.find(q).ok_or(unterminated.clone())?;
                let value = rest[..end].to_string();
                self.pos += end + q.len_utf8();
                value
            }
            Some(_) => self.parse_ident()?,
            None => return Err(unterminated),
        };

        self.skip_ws();
        let mut case_insensitive = false;
        if let Some(flag @ ('i' | 'I' | 's' | 'S')) = self.peek() {
            self.bump();
            case_insensitive = flag.eq_ignore_ascii_case(&'i');
            self.skip_ws();
        }
        if self.bump() != Some(']') {
            return Err(unterminated);
        }

        let matcher = match op {
            '=' => AttributeMatcher::Exact(value),
            '~' => AttributeMatcher::Includes(value),
            '|' => AttributeMatcher::DashMatch(value),
            '^' => AttributeMatcher::Prefix(value),
            '$' => AttributeMatcher::Suffix(value),
            _ => AttributeMatcher::Substring(value),
        };
        Ok(AttributeSelector {
            name,
            matcher: Some(matcher),
            case_insensitive,
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> SelectorList {
        SelectorList::parse(s).unwrap()
    }

    #[test]
    fn test_parse_compound() {
        let list = parse("input.ytSearchboxComponentInput.yt-searchbox-input[name=\"search_query\"]");
        assert_eq!(list.len(), 1);
        let compound = &list.selectors[0].parts[0].1;
        assert_eq!(compound.tag.as_deref(), Some("input"));
        assert_eq!(compound.classes.len(), 2);
        assert_eq!(compound.attributes.len(), 1);
    }

    #[test]
    fn test_parse_list_with_combinators() {
        let list = parse("header button[aria-label^=\"Search\"], div > span, #main");
        assert_eq!(list.len(), 3);
        assert_eq!(list.selectors[1].parts[1].0, Combinator::Child);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(SelectorList::parse(""), Err(SelectorError::Empty));
        assert_eq!(SelectorList::parse("   "), Err(SelectorError::Empty));
        assert!(matches!(SelectorList::parse("div:hover"), Err(SelectorError::Unsupported(_))));
        assert!(matches!(SelectorList::parse("a + b"), Err(SelectorError::Unsupported(_))));
        assert!(matches!(
            SelectorList::parse("[data-icon=\"x"),
            Err(SelectorError::UnterminatedAttribute { .. })
        ));
        assert!(matches!(SelectorList::parse("div,"), Err(SelectorError::Empty)));
        assert!(matches!(SelectorList::parse("##"), Err(SelectorError::ExpectedIdent { .. })));
    }

    #[test]
    fn test_attribute_matchers() {
        let sel = |m: AttributeMatcher| AttributeSelector {
            name: "aria-label".into(),
            matcher: Some(m),
            case_insensitive: false,
        };
        assert!(sel(AttributeMatcher::Prefix("Search".into())).matches(Some("Search chats")));
        assert!(sel(AttributeMatcher::Substring("Search".into())).matches(Some("Type to Search")));
        assert!(!sel(AttributeMatcher::Substring("".into())).matches(Some("anything")));
        assert!(sel(AttributeMatcher::Includes("b".into())).matches(Some("a b c")));
        assert!(sel(AttributeMatcher::DashMatch("en".into())).matches(Some("en-US")));
        assert!(!sel(AttributeMatcher::Exact("x".into())).matches(None));
    }

    #[test]
    fn test_case_insensitive_flag() {
        let list = parse("[aria-label=\"search\" i]");
        let attr = &list.selectors[0].parts[0].1.attributes[0];
        assert!(attr.case_insensitive);
        assert!(attr.matches(Some("SEARCH")));
    }

    #[test]
    fn test_match_descendant_and_child() {
        let mut tree = DomTree::new();
        let header = tree.create_element("header");
        let div = tree.create_element("div");
        let button = tree.create_element("button");
        tree.append_child(tree.root(), header).unwrap();
        tree.append_child(header, div).unwrap();
        tree.append_child(div, button).unwrap();
        tree.set_attribute(button, "aria-label", "Search…").unwrap();

        assert!(parse("header button[aria-label^=\"Search\"]").matches(&tree, button));
        assert!(parse("div > button").matches(&tree, button));
        assert!(!parse("header > button").matches(&tree, button));
        assert!(parse("header").matches_or_contains(&tree, header));
        assert!(parse("button").matches_or_contains(&tree, header));
        assert!(!parse("input").matches_or_contains(&tree, header));
    }
}
