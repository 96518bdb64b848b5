//! In-memory element tree with locator resolution.
//!
//! Used by [`crate::FakeStorefront`] to answer driver queries without a
//! browser. Resolution follows the same rules as the in-browser resolver
//! shipped with the CDP driver:
//!
//! - `css` matches descendants of each scope element, with ancestors outside
//!   the scope allowed to satisfy the descendant combinator (as
//!   `Element.querySelectorAll` does)
//! - `text` matches the innermost elements whose normalized text matches
//! - `role` accepts the implicit role of `button` and checkbox `input`
//!   elements, or an explicit `role` attribute; the accessible name is
//!   `aria-label`, else the text, else `title`
//! - results are deduplicated and kept in document order

use crate::locator::{normalize_whitespace, Step, TextMatch};
use crate::result::{StoreError, StoreResult};
use std::collections::{BTreeMap, BTreeSet};

/// Index of a node in a [`Dom`]
pub type NodeId = usize;

/// Declarative element used to build a [`Dom`].
///
/// `A` is the click action attached to interactive elements.
#[derive(Debug, Clone)]
pub struct Element<A> {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: Option<String>,
    children: Vec<Element<A>>,
    hidden: bool,
    action: Option<A>,
}

impl<A> Element<A> {
    /// Create an element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            text: None,
            children: Vec::new(),
            hidden: false,
            action: None,
        }
    }

    /// Set the `class` attribute
    #[must_use]
    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set the element's own text (rendered before its children)
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// Hide the element (and therefore its subtree)
    #[must_use]
    pub const fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Attach a click action
    #[must_use]
    pub fn on_click(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }
}

#[derive(Debug, Clone)]
struct Node<A> {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Exclusive end of this node's subtree in document order
    end: NodeId,
    hidden: bool,
    action: Option<A>,
}

/// A flattened element tree in document (pre-)order. Node 0 is the root.
#[derive(Debug, Clone)]
pub struct Dom<A> {
    nodes: Vec<Node<A>>,
}

impl<A: Clone> Dom<A> {
    /// Flatten an element tree
    #[must_use]
    pub fn new(root: Element<A>) -> Self {
        let mut dom = Self { nodes: Vec::new() };
        let _ = dom.insert(root, None);
        dom
    }

    fn insert(&mut self, element: Element<A>, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            tag: element.tag,
            attrs: element.attrs,
            text: element.text,
            parent,
            children: Vec::new(),
            end: id + 1,
            hidden: element.hidden,
            action: element.action,
        });
        for child in element.children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id].children.push(child_id);
        }
        self.nodes[id].end = self.nodes.len();
        id
    }

    /// Number of nodes, root included
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty (never true for a built tree)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tag name of a node
    #[must_use]
    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id].tag
    }

    /// Attribute value of a node
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id].attrs.get(name).map(String::as_str)
    }

    /// Resolve a step chain from the root
    ///
    /// # Errors
    ///
    /// Returns error if a selector or pattern cannot be interpreted
    pub fn resolve(&self, steps: &[Step]) -> StoreResult<Vec<NodeId>> {
        self.resolve_from(steps, vec![0])
    }

    fn resolve_from(&self, steps: &[Step], scope: Vec<NodeId>) -> StoreResult<Vec<NodeId>> {
        let mut current = scope;
        for step in steps {
            current = self.apply(step, &current)?;
        }
        Ok(current)
    }

    fn apply(&self, step: &Step, scope: &[NodeId]) -> StoreResult<Vec<NodeId>> {
        let mut out = BTreeSet::new();
        match step {
            Step::Css { selector } => {
                let css = CssSelector::parse(selector)?;
                for &s in scope {
                    out.extend(self.descendants(s).filter(|&d| css.matches(self, d)));
                }
            }
            Step::Text { text } => {
                for &s in scope {
                    for d in self.descendants(s) {
                        if self.text_matches(d, text)? && !self.any_child_matches(d, text)? {
                            let _ = out.insert(d);
                        }
                    }
                }
            }
            Step::Role { role, name } => {
                for &s in scope {
                    for d in self.descendants(s) {
                        if !self.has_role(d, role) {
                            continue;
                        }
                        let named = match name {
                            Some(name) => name.matches(&self.accessible_name(d))?,
                            None => true,
                        };
                        if named {
                            let _ = out.insert(d);
                        }
                    }
                }
            }
            Step::Children => {
                for &s in scope {
                    out.extend(self.nodes[s].children.iter().copied());
                }
            }
            Step::Has { inner } => {
                for &s in scope {
                    if !self.resolve_from(inner, vec![s])?.is_empty() {
                        let _ = out.insert(s);
                    }
                }
            }
            Step::HasText { text } => {
                let needle = text.to_lowercase();
                out.extend(
                    scope
                        .iter()
                        .copied()
                        .filter(|&s| self.normalized_text(s).to_lowercase().contains(&needle)),
                );
            }
            Step::Nth { index } => {
                let mut ordered: Vec<NodeId> = scope.to_vec();
                ordered.sort_unstable();
                ordered.dedup();
                return Ok(ordered.get(*index).copied().into_iter().collect());
            }
        }
        Ok(out.into_iter().collect())
    }

    fn descendants(&self, id: NodeId) -> std::ops::Range<NodeId> {
        id + 1..self.nodes[id].end
    }

    fn text_matches(&self, id: NodeId, text: &TextMatch) -> StoreResult<bool> {
        text.matches(&self.normalized_text(id))
    }

    fn any_child_matches(&self, id: NodeId, text: &TextMatch) -> StoreResult<bool> {
        for &c in &self.nodes[id].children {
            if self.text_matches(c, text)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn has_role(&self, id: NodeId, role: &str) -> bool {
        let node = &self.nodes[id];
        if node.attrs.get("role").is_some_and(|r| r == role) {
            return true;
        }
        match role {
            "button" => node.tag.eq_ignore_ascii_case("button"),
            "checkbox" => {
                node.tag.eq_ignore_ascii_case("input")
                    && node.attrs.get("type").is_some_and(|t| t == "checkbox")
            }
            _ => false,
        }
    }

    /// `aria-label`, else the text content, else `title`
    fn accessible_name(&self, id: NodeId) -> String {
        let attrs = &self.nodes[id].attrs;
        if let Some(label) = attrs.get("aria-label") {
            return label.clone();
        }
        let text = self.normalized_text(id);
        if text.is_empty() {
            attrs.get("title").cloned().unwrap_or_default()
        } else {
            text
        }
    }

    /// Whitespace-normalized text of the subtree (like `textContent`)
    #[must_use]
    pub fn normalized_text(&self, id: NodeId) -> String {
        let raw: Vec<&str> = (id..self.nodes[id].end)
            .filter_map(|n| self.nodes[n].text.as_deref())
            .collect();
        normalize_whitespace(&raw.join(" "))
    }

    /// Rendered text of the subtree with one line per text-bearing element
    /// (like `innerText` for block layout)
    #[must_use]
    pub fn inner_text(&self, id: NodeId) -> String {
        (id..self.nodes[id].end)
            .filter(|&n| self.is_visible(n))
            .filter_map(|n| self.nodes[n].text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether the node and all its ancestors are displayed
    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(n) = cursor {
            if self.nodes[n].hidden {
                return false;
            }
            cursor = self.nodes[n].parent;
        }
        true
    }

    /// Click action of the node or its nearest ancestor that has one
    #[must_use]
    pub fn click_action(&self, id: NodeId) -> Option<A> {
        let mut cursor = Some(id);
        while let Some(n) = cursor {
            if let Some(action) = &self.nodes[n].action {
                return Some(action.clone());
            }
            cursor = self.nodes[n].parent;
        }
        None
    }
}

// =============================================================================
// CSS SUBSET
// =============================================================================

/// One compound selector: `tag.class[attr="value"]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches<A>(&self, node: &Node<A>) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && !tag.eq_ignore_ascii_case(&node.tag) {
                return false;
            }
        }
        let class_list: Vec<&str> = node
            .attrs
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default();
        if !self.classes.iter().all(|c| class_list.contains(&c.as_str())) {
            return false;
        }
        self.attrs.iter().all(|(name, value)| match value {
            Some(v) => node.attrs.get(name) == Some(v),
            None => node.attrs.contains_key(name),
        })
    }
}

/// Compound selectors joined by the descendant combinator
#[derive(Debug, Clone, PartialEq, Eq)]
struct CssSelector {
    parts: Vec<Compound>,
}

impl CssSelector {
    fn parse(input: &str) -> StoreResult<Self> {
        let unsupported = |message: &str| StoreError::UnsupportedSelector {
            selector: input.to_string(),
            message: message.to_string(),
        };

        let chars: Vec<char> = input.chars().collect();
        let mut pos = 0;
        let mut parts = Vec::new();

        while pos < chars.len() {
            if chars[pos].is_whitespace() {
                pos += 1;
                continue;
            }

            let mut compound = Compound::default();
            let tag = read_ident(&chars, &mut pos);
            if !tag.is_empty() {
                compound.tag = Some(tag);
            } else if chars[pos] == '*' {
                compound.tag = Some("*".to_string());
                pos += 1;
            }

            while pos < chars.len() && !chars[pos].is_whitespace() {
                match chars[pos] {
                    '.' => {
                        pos += 1;
                        let class = read_ident(&chars, &mut pos);
                        if class.is_empty() {
                            return Err(unsupported("empty class name"));
                        }
                        compound.classes.push(class);
                    }
                    '[' => {
                        pos += 1;
                        let name = read_ident(&chars, &mut pos);
                        if name.is_empty() {
                            return Err(unsupported("empty attribute name"));
                        }
                        let value = match chars.get(pos) {
                            Some(']') => None,
                            Some('=') => {
                                pos += 1;
                                Some(read_value(&chars, &mut pos).ok_or_else(|| {
                                    unsupported("unterminated attribute value")
                                })?)
                            }
                            _ => return Err(unsupported("only [attr] and [attr=value] are supported")),
                        };
                        if chars.get(pos) != Some(&']') {
                            return Err(unsupported("expected ']'"));
                        }
                        pos += 1;
                        compound.attrs.push((name, value));
                    }
                    other => {
                        return Err(unsupported(&format!("unexpected character {other:?}")));
                    }
                }
            }

            if compound == Compound::default() {
                return Err(unsupported("empty compound selector"));
            }
            parts.push(compound);
        }

        if parts.is_empty() {
            return Err(unsupported("empty selector"));
        }
        Ok(Self { parts })
    }

    fn matches<A>(&self, dom: &Dom<A>, id: NodeId) -> bool {
        let Some((last, ancestors)) = self.parts.split_last() else {
            return false;
        };
        if !last.matches(&dom.nodes[id]) {
            return false;
        }

        let mut cursor = dom.nodes[id].parent;
        for part in ancestors.iter().rev() {
            loop {
                let Some(n) = cursor else {
                    return false;
                };
                cursor = dom.nodes[n].parent;
                if part.matches(&dom.nodes[n]) {
                    break;
                }
            }
        }
        true
    }
}

fn read_ident(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < chars.len() && (chars[*pos].is_alphanumeric() || matches!(chars[*pos], '-' | '_'))
    {
        *pos += 1;
    }
    chars[start..*pos].iter().collect()
}

fn read_value(chars: &[char], pos: &mut usize) -> Option<String> {
    match chars.get(*pos) {
        Some(&quote @ ('"' | '\'')) => {
            let start = *pos + 1;
            let len = chars[start..].iter().position(|&c| c == quote)?;
            *pos = start + len + 1;
            Some(chars[start..start + len].iter().collect())
        }
        _ => {
            let value = read_ident(chars, pos);
            (!value.is_empty()).then_some(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Locator;

    fn sample() -> Dom<&'static str> {
        let card = |name: &'static str| {
            Element::new("div")
                .attr("tabindex", "1")
                .child(Element::new("p").class("title").text(name))
                .child(
                    Element::new("button")
                        .text("Add to cart")
                        .on_click(name),
                )
        };
        Dom::new(
            Element::new("body")
                .child(
                    Element::new("div")
                        .class("grid main")
                        .child(card("T-Shirt"))
                        .child(card("T-Shirt Deluxe")),
                )
                .child(Element::new("p").class("status").text("2 Product(s) found"))
                .child(
                    Element::new("section")
                        .hidden(true)
                        .child(Element::new("p").class("empty").text("Empty")),
                ),
        )
    }

    fn resolve(dom: &Dom<&'static str>, loc: &Locator) -> Vec<NodeId> {
        dom.resolve(loc.steps()).unwrap()
    }

    mod css_tests {
        use super::*;

        #[test]
        fn test_parse_compound() {
            let css = CssSelector::parse(r#"input[data-testid="checkbox"][value='XS']"#).unwrap();
            assert_eq!(css.parts.len(), 1);
            assert_eq!(css.parts[0].tag.as_deref(), Some("input"));
            assert_eq!(css.parts[0].attrs.len(), 2);
            assert_eq!(css.parts[0].attrs[1].1.as_deref(), Some("XS"));
        }

        #[test]
        fn test_parse_quoted_spaces() {
            let css =
                CssSelector::parse(r#"button[title="remove product from cart"] p.a.b"#).unwrap();
            assert_eq!(css.parts.len(), 2);
            assert_eq!(
                css.parts[0].attrs[0].1.as_deref(),
                Some("remove product from cart")
            );
            assert_eq!(css.parts[1].classes, vec!["a", "b"]);
        }

        #[test]
        fn test_parse_rejects_combinators() {
            assert!(CssSelector::parse("div > p").is_err());
            assert!(CssSelector::parse("p:has-text(x)").is_err());
            assert!(CssSelector::parse("").is_err());
            assert!(CssSelector::parse("a[href=\"x").is_err());
        }

        #[test]
        fn test_class_and_descendant_match() {
            let dom = sample();
            assert_eq!(resolve(&dom, &Locator::css("div.grid.main")).len(), 1);
            assert_eq!(resolve(&dom, &Locator::css("div.grid p.title")).len(), 2);
            assert_eq!(resolve(&dom, &Locator::css("div.grid.other")).len(), 0);
            assert_eq!(resolve(&dom, &Locator::css("div[tabindex=\"1\"]")).len(), 2);
        }
    }

    mod resolve_tests {
        use super::*;
        use crate::locator::TextMatch;

        #[test]
        fn test_exact_text_disambiguates() {
            let dom = sample();
            let cards = Locator::css("div[tabindex=\"1\"]").has(Locator::text("T-Shirt"));
            let found = resolve(&dom, &cards);
            assert_eq!(found.len(), 1);

            let button = cards.locator(Locator::role(
                "button",
                Some(TextMatch::pattern("add to cart").ignore_case()),
            ));
            let found = resolve(&dom, &button);
            assert_eq!(found.len(), 1);
            assert_eq!(dom.click_action(found[0]), Some("T-Shirt"));
        }

        #[test]
        fn test_pattern_text_is_innermost() {
            let dom = sample();
            let found = resolve(&dom, &Locator::text(TextMatch::pattern(r"Product\(s\) found")));
            assert_eq!(found.len(), 1);
            assert_eq!(dom.tag(found[0]), "p");
            assert_eq!(dom.inner_text(found[0]), "2 Product(s) found");
        }

        #[test]
        fn test_children_and_nth() {
            let dom = sample();
            let grid = Locator::css("div.grid");
            assert_eq!(resolve(&dom, &grid.clone().children()).len(), 2);
            let second = resolve(&dom, &grid.children().nth(1));
            assert_eq!(dom.normalized_text(second[0]), "T-Shirt Deluxe Add to cart");
            assert!(resolve(&dom, &Locator::css("div.grid").children().nth(5)).is_empty());
        }

        #[test]
        fn test_has_text_is_case_insensitive() {
            let dom = sample();
            let found = resolve(&dom, &Locator::css("button").has_text("ADD"));
            assert_eq!(found.len(), 2);
        }

        #[test]
        fn test_visibility() {
            let dom = sample();
            let empty = resolve(&dom, &Locator::css("p.empty"));
            assert_eq!(empty.len(), 1);
            assert!(!dom.is_visible(empty[0]));
            assert_eq!(dom.inner_text(empty[0]), "");
            assert!(dom.is_visible(resolve(&dom, &Locator::css("p.status"))[0]));
        }

        #[test]
        fn test_click_bubbles_to_ancestor() {
            let dom: Dom<u8> = Dom::new(
                Element::new("body").child(
                    Element::new("button")
                        .on_click(7)
                        .child(Element::new("div").class("icon")),
                ),
            );
            let icon = dom.resolve(Locator::css("div.icon").steps()).unwrap();
            assert_eq!(dom.click_action(icon[0]), Some(7));
            assert_eq!(dom.click_action(0), None);
        }
    }
}
