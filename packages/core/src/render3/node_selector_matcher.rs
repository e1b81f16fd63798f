//! Node Selector Matcher
//!
//! Corresponds to packages/core/src/render3/node_selector_matcher.ts
//!
//! Parses directive selectors and matches them against the static shape of a
//! node (tag, attributes, classes, binding names). Matching runs once per
//! template during the first create pass, so clarity beats cleverness here.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::render3::interfaces::node::{TAttributes, TNode};

/// Regex for parsing CSS selectors, one capture group per token kind.
static SELECTOR_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\:not\()|(([\.\#]?)[-\w]+)|(?:\[([-.\w*\\$]+)(?:=(?:"([^"]*)"|'([^']*)'|([^\]]*)))?\])|(\))|(\s*,\s*)"#).unwrap()
});

/// Match groups in the selector regex.
#[derive(Debug, Clone, Copy)]
enum SelectorRegexp {
    Not = 1,
    Tag = 2,
    Prefix = 3,
    Attribute = 4,
    AttributeValueDouble = 5,
    AttributeValueSingle = 6,
    AttributeValueUnquoted = 7,
    NotEnd = 8,
    Separator = 9,
}

/// One parsed simple selector. A directive selector string may expand to
/// several of these (comma-separated alternatives).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CssSelector {
    pub element: Option<String>,
    pub class_names: Vec<String>,
    /// `(name, value)`; an empty value means presence-only.
    pub attrs: Vec<(String, String)>,
    pub not_selectors: Vec<CssSelector>,
}

impl CssSelector {
    pub fn new() -> Self {
        CssSelector::default()
    }

    /// Parses a selector string into its comma-separated alternatives.
    pub fn parse(selector: &str) -> Result<Vec<CssSelector>, String> {
        let mut results = Vec::new();
        let mut current = CssSelector::new();
        let mut in_not = false;

        for cap in SELECTOR_REGEXP.captures_iter(selector) {
            if cap.get(SelectorRegexp::Not as usize).is_some() {
                if in_not {
                    return Err("Nesting :not in a selector is not allowed".to_string());
                }
                in_not = true;
                current.not_selectors.push(CssSelector::new());
            }

            if let Some(tag_match) = cap.get(SelectorRegexp::Tag as usize) {
                let tag = tag_match.as_str();
                let prefix = cap
                    .get(SelectorRegexp::Prefix as usize)
                    .map(|m| m.as_str())
                    .unwrap_or("");
                let target = if in_not {
                    current.not_selectors.last_mut().unwrap()
                } else {
                    &mut current
                };
                if prefix == "#" {
                    target.add_attribute("id", &tag[1..]);
                } else if prefix == "." {
                    target.add_class_name(&tag[1..]);
                } else {
                    target.set_element(tag);
                }
            }

            if let Some(attr_match) = cap.get(SelectorRegexp::Attribute as usize) {
                let value = if let Some(m) = cap.get(SelectorRegexp::AttributeValueDouble as usize)
                {
                    m.as_str()
                } else if let Some(m) = cap.get(SelectorRegexp::AttributeValueSingle as usize) {
                    m.as_str()
                } else if let Some(m) = cap.get(SelectorRegexp::AttributeValueUnquoted as usize) {
                    m.as_str()
                } else {
                    ""
                };
                let name = Self::unescape_attribute(attr_match.as_str())?;
                let target = if in_not {
                    current.not_selectors.last_mut().unwrap()
                } else {
                    &mut current
                };
                target.add_attribute(&name, value);
            }

            if cap.get(SelectorRegexp::NotEnd as usize).is_some() {
                in_not = false;
            }

            if cap.get(SelectorRegexp::Separator as usize).is_some() {
                if in_not {
                    return Err("Multiple selectors in :not are not supported".to_string());
                }
                Self::push_result(&mut results, current);
                current = CssSelector::new();
            }
        }

        Self::push_result(&mut results, current);
        Ok(results)
    }

    fn push_result(results: &mut Vec<CssSelector>, mut selector: CssSelector) {
        if !selector.not_selectors.is_empty()
            && selector.element.is_none()
            && selector.class_names.is_empty()
            && selector.attrs.is_empty()
        {
            selector.element = Some("*".to_string());
        }
        results.push(selector);
    }

    /// Unescape \$ sequences; an unescaped `$` is rejected.
    fn unescape_attribute(attr: &str) -> Result<String, String> {
        let mut result = String::new();
        let mut escaping = false;
        for ch in attr.chars() {
            if ch == '\\' {
                escaping = true;
                continue;
            }
            if ch == '$' && !escaping {
                return Err(format!(
                    "Error in attribute selector \"{attr}\". Unescaped \"$\" is not supported. \
                     Please escape with \"\\$\"."
                ));
            }
            escaping = false;
            result.push(ch);
        }
        Ok(result)
    }

    pub fn set_element(&mut self, element: &str) {
        self.element = Some(element.to_string());
    }

    pub fn add_attribute(&mut self, name: &str, value: &str) {
        self.attrs.push((name.to_string(), value.to_lowercase()));
    }

    pub fn add_class_name(&mut self, name: &str) {
        self.class_names.push(name.to_lowercase());
    }
}

impl std::fmt::Display for CssSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(element) = &self.element {
            write!(f, "{element}")?;
        }
        for class_name in &self.class_names {
            write!(f, ".{class_name}")?;
        }
        for (name, value) in &self.attrs {
            if value.is_empty() {
                write!(f, "[{name}]")?;
            } else {
                write!(f, "[{name}={value}]")?;
            }
        }
        for not in &self.not_selectors {
            write!(f, ":not({not})")?;
        }
        Ok(())
    }
}

/// Matches one simple selector against a node's static shape.
///
/// Attribute selectors are satisfied by static attributes and, when the
/// selector carries no value, by property-binding names as well (a bound
/// attribute is "present" without a static value). The `class` attribute
/// selector matches against the class list.
fn matches_simple_selector(
    tag_name: Option<&str>,
    attrs: Option<&TAttributes>,
    selector: &CssSelector,
) -> bool {
    if let Some(element) = &selector.element {
        if element != "*" {
            match tag_name {
                Some(tag) if tag == element => {}
                _ => return false,
            }
        }
    }
    for class_name in &selector.class_names {
        if !attrs.map(|a| a.has_class(class_name)).unwrap_or(false) {
            return false;
        }
    }
    for (name, value) in &selector.attrs {
        let Some(attrs) = attrs else {
            return false;
        };
        if name == "class" && !value.is_empty() {
            // [class=...] requires every listed class to be present.
            if !value.split_whitespace().all(|c| attrs.has_class(c)) {
                return false;
            }
            continue;
        }
        match attrs.attr(name) {
            Some(actual) => {
                if !value.is_empty() && !actual.eq_ignore_ascii_case(value) {
                    return false;
                }
            }
            None => {
                // Bound properties satisfy presence-only attribute selectors.
                if !(value.is_empty() && attrs.has_binding(name)) {
                    return false;
                }
            }
        }
    }
    true
}

/// Whether the node shape matches `selector`, including `:not` exclusions.
pub fn is_node_matching_selector(
    tag_name: Option<&str>,
    attrs: Option<&TAttributes>,
    selector: &CssSelector,
) -> bool {
    if !matches_simple_selector(tag_name, attrs, selector) {
        return false;
    }
    for not in &selector.not_selectors {
        if matches_simple_selector(tag_name, attrs, not) {
            return false;
        }
    }
    true
}

/// Whether any selector in the list matches the node.
pub fn is_node_matching_selector_list(tnode: &TNode, selectors: &[CssSelector]) -> bool {
    let tag_name = tnode.value.as_deref();
    let attrs = tnode.merged_attrs.as_ref().or(tnode.attrs.as_ref());
    selectors
        .iter()
        .any(|selector| is_node_matching_selector(tag_name, attrs, selector))
}
