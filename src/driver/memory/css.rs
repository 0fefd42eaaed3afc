//! CSS selector subset for the memory driver.
//!
//! Supported: type (`div`, `*`), `.class`, `#id`, `[attr]`,
//! `[attr=v]`, `[attr*=v]`, `[attr^=v]`, `[attr$=v]`, `[attr~=v]`,
//! descendant and `>` combinators, comma-separated lists.

use super::dom::{Dom, NodeId};

// ============================================================================
// Types
// ============================================================================

/// Parsed comma-separated selector list.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SelectorList(Vec<Complex>);

#[derive(Debug, Clone, PartialEq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

#[derive(Debug, Clone, PartialEq)]
struct AttrSelector {
    name: String,
    test: Option<(AttrOp, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Contains,
    Prefix,
    Suffix,
    Word,
}

// ============================================================================
// Matching
// ============================================================================

impl SelectorList {
    /// Returns `true` if any selector in the list matches `node`.
    pub(crate) fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        self.0.iter().any(|complex| complex.matches(dom, node))
    }
}

impl Complex {
    fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        let last = self.compounds.len() - 1;
        self.compounds[last].matches(dom, node) && self.matches_left(dom, node, last)
    }

    /// `compounds[idx]` matched `node`; checks everything to its left.
    fn matches_left(&self, dom: &Dom, node: NodeId, idx: usize) -> bool {
        if idx == 0 {
            return true;
        }
        let left = &self.compounds[idx - 1];
        match self.combinators[idx - 1] {
            Combinator::Child => dom
                .parent(node)
                .is_some_and(|p| left.matches(dom, p) && self.matches_left(dom, p, idx - 1)),
            Combinator::Descendant => {
                let mut current = dom.parent(node);
                while let Some(ancestor) = current {
                    if left.matches(dom, ancestor) && self.matches_left(dom, ancestor, idx - 1) {
                        return true;
                    }
                    current = dom.parent(ancestor);
                }
                false
            }
        }
    }
}

impl Compound {
    fn matches(&self, dom: &Dom, id: NodeId) -> bool {
        let node = dom.node(id);
        if let Some(tag) = &self.tag
            && node.tag() != tag.as_str()
        {
            return false;
        }
        self.ids.iter().all(|i| node.dom_id() == Some(i.as_str()))
            && self.classes.iter().all(|c| node.has_class(c))
            && self.attrs.iter().all(|a| a.matches(node.attribute(&a.name)))
    }
}

impl AttrSelector {
    fn matches(&self, actual: Option<String>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match &self.test {
            None => true,
            Some((AttrOp::Equals, v)) => actual == *v,
            Some((AttrOp::Contains, v)) => !v.is_empty() && actual.contains(v.as_str()),
            Some((AttrOp::Prefix, v)) => !v.is_empty() && actual.starts_with(v.as_str()),
            Some((AttrOp::Suffix, v)) => !v.is_empty() && actual.ends_with(v.as_str()),
            Some((AttrOp::Word, v)) => actual.split_whitespace().any(|w| w == v.as_str()),
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses a selector list.
///
/// # Errors
///
/// Returns a message describing the first unsupported or malformed token.
pub(crate) fn parse(input: &str) -> Result<SelectorList, String> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        pos: 0,
    };
    let mut list = Vec::new();
    loop {
        parser.skip_ws();
        list.push(parser.complex()?);
        parser.skip_ws();
        match parser.peek() {
            None => break,
            Some(',') => parser.pos += 1,
            Some(c) => return Err(format!("unexpected '{c}'")),
        }
    }
    Ok(SelectorList(list))
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn complex(&mut self) -> Result<Complex, String> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_ws => combinators.push(Combinator::Descendant),
                Some(c) => return Err(format!("unexpected '{c}'")),
            }
            compounds.push(self.compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound, String> {
        let mut compound = Compound::default();
        let mut any = false;

        if self.peek() == Some('*') {
            self.pos += 1;
            any = true;
        } else if let Some(tag) = self.ident() {
            compound.tag = Some(tag.to_ascii_lowercase());
            any = true;
        }

        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.required_ident("class name")?);
                }
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.required_ident("id")?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                Some(':') => return Err("pseudo-classes are not supported".to_string()),
                _ => break,
            }
            any = true;
        }

        if any {
            Ok(compound)
        } else {
            Err(match self.peek() {
                Some(c) => format!("expected selector, found '{c}'"),
                None => "empty selector".to_string(),
            })
        }
    }

    fn attribute(&mut self) -> Result<AttrSelector, String> {
        self.skip_ws();
        let name = self.required_ident("attribute name")?;
        self.skip_ws();

        let op = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(AttrSelector { name, test: None });
            }
            Some('=') => {
                self.pos += 1;
                AttrOp::Equals
            }
            Some(c @ ('*' | '^' | '$' | '~')) if self.chars.get(self.pos + 1) == Some(&'=') => {
                self.pos += 2;
                match c {
                    '*' => AttrOp::Contains,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Word,
                }
            }
            Some(c) => return Err(format!("unsupported attribute operator '{c}'")),
            None => return Err("unterminated attribute selector".to_string()),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => self.quoted(quote)?,
            _ => self.required_ident("attribute value")?,
        };
        self.skip_ws();

        if self.peek() != Some(']') {
            return Err("expected ']'".to_string());
        }
        self.pos += 1;
        Ok(AttrSelector {
            name,
            test: Some((op, value)),
        })
    }

    fn quoted(&mut self, quote: char) -> Result<String, String> {
        self.pos += 1;
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => {
                    if let Some(next) = self.peek() {
                        out.push(next);
                        self.pos += 1;
                    }
                }
                c if c == quote => return Ok(out),
                c => out.push(c),
            }
        }
        Err("unterminated string".to_string())
    }

    fn ident(&mut self) -> Option<String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            self.pos += 1;
        }
        (self.pos > start).then(|| self.chars[start..self.pos].iter().collect())
    }

    fn required_ident(&mut self, what: &str) -> Result<String, String> {
        self.ident().ok_or_else(|| format!("expected {what}"))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory::Node;

    fn page() -> (Dom, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.root();
        let cart = dom.append(root, Node::new("div").with_class("float-cart"));
        let item = dom.append(cart, Node::new("div").with_class("shelf-item"));
        let details = dom.append(item, Node::new("div").with_class("shelf-item__details"));
        let title = dom.append(details, Node::new("p").with_text("Galaxy S20"));
        let del = dom.append(
            item,
            Node::new("div")
                .with_class("shelf-item__del")
                .with_attr("data-testid", "remove-btn"),
        );
        let _ = (title, del);
        (dom, cart, item)
    }

    fn count(dom: &Dom, selector: &str) -> usize {
        let list = parse(selector).unwrap();
        let mut all = vec![dom.root()];
        all.extend(dom.descendants(dom.root()));
        all.into_iter().filter(|n| list.matches(dom, *n)).count()
    }

    #[test]
    fn test_descendant_and_child() {
        let (dom, _, _) = page();
        assert_eq!(count(&dom, "div.float-cart .shelf-item"), 1);
        assert_eq!(count(&dom, ".shelf-item__details > p"), 1);
        assert_eq!(count(&dom, ".shelf-item > p"), 0);
        assert_eq!(count(&dom, "html div p"), 1);
    }

    #[test]
    fn test_selector_list_unions() {
        let (dom, _, _) = page();
        assert_eq!(count(&dom, ".shelf-item__del, .shelf-item_del, .missing"), 1);
    }

    #[test]
    fn test_attribute_operators() {
        let (dom, _, _) = page();
        assert_eq!(count(&dom, "[data-testid]"), 1);
        assert_eq!(count(&dom, "[data-testid='remove-btn']"), 1);
        assert_eq!(count(&dom, "[data-testid*=remove]"), 1);
        assert_eq!(count(&dom, "[class^=\"shelf\"]"), 3);
        assert_eq!(count(&dom, "[class~=float-cart]"), 1);
    }

    #[test]
    fn test_rejects_unsupported_syntax() {
        assert!(parse("div:nth-child(2)").is_err());
        assert!(parse("").is_err());
        assert!(parse("div[").is_err());
        assert!(parse("a + b").is_err());
    }
}
