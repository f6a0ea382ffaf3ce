//! Declarative form-fill planning.
//!
//! Given a snapshot of form controls and the values to enter, an ordered
//! list of lookup rules decides which control receives each value. The
//! output is a list of CSS selectors and values; no script text is built.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One form control as captured from the page.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct FormElement {
    /// Tag name: input, textarea or select
    #[serde(default = "default_tag")]
    pub tag: String,
    pub id: Option<String>,
    pub name: Option<String>,
    /// The `type` attribute of an input
    #[serde(rename = "type")]
    pub input_type: Option<String>,
    pub placeholder: Option<String>,
    /// Text of the associated <label>
    pub label: Option<String>,
    pub aria_label: Option<String>,
    pub autocomplete: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

fn default_tag() -> String {
    "input".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LookupRule {
    Id,
    Name,
    Autocomplete,
    AriaLabel,
    Label,
    Placeholder,
    InputType,
}

impl LookupRule {
    pub const DEFAULT_ORDER: [LookupRule; 7] = [
        LookupRule::Id,
        LookupRule::Name,
        LookupRule::Autocomplete,
        LookupRule::AriaLabel,
        LookupRule::Label,
        LookupRule::Placeholder,
        LookupRule::InputType,
    ];

    fn matches(&self, element: &FormElement, field: &str) -> bool {
        let exact = |attr: &Option<String>| attr.as_deref().map(normalize).as_deref() == Some(field);
        let contains = |attr: &Option<String>| {
            attr.as_deref()
                .map(normalize)
                .map(|text| !field.is_empty() && text.contains(field))
                .unwrap_or(false)
        };

        match self {
            LookupRule::Id => exact(&element.id),
            LookupRule::Name => exact(&element.name),
            LookupRule::Autocomplete => element
                .autocomplete
                .as_deref()
                .map(|tokens| {
                    tokens
                        .split_whitespace()
                        .any(|token| normalize(token) == field || autocomplete_alias(field) == Some(token))
                })
                .unwrap_or(false),
            LookupRule::AriaLabel => contains(&element.aria_label),
            LookupRule::Label => contains(&element.label),
            LookupRule::Placeholder => contains(&element.placeholder),
            LookupRule::InputType => match (input_type_for(field), element.input_type.as_deref()) {
                (Some(expected), Some(actual)) => expected.eq_ignore_ascii_case(actual),
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillAction {
    pub field: String,
    pub selector: String,
    pub value: String,
    pub matched_by: LookupRule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillPlan {
    pub actions: Vec<FillAction>,
    pub unmatched: Vec<String>,
}

/// Evaluate `rules` in order for every field; each element is used once.
pub fn plan(elements: &[FormElement], data: &BTreeMap<String, String>, rules: &[LookupRule]) -> FillPlan {
    let mut used = HashSet::new();
    let mut result = FillPlan::default();

    for (field, value) in data {
        let wanted = normalize(field);

        let hit = rules.iter().find_map(|rule| {
            elements
                .iter()
                .enumerate()
                .filter(|(idx, el)| !used.contains(idx) && is_fillable(el))
                .filter(|(_, el)| rule.matches(el, &wanted))
                .find_map(|(idx, el)| selector_for(el).map(|sel| (idx, sel, *rule)))
        });

        match hit {
            Some((idx, selector, rule)) => {
                used.insert(idx);
                result.actions.push(FillAction {
                    field: field.clone(),
                    selector,
                    value: value.clone(),
                    matched_by: rule,
                });
            }
            None => result.unmatched.push(field.clone()),
        }
    }

    result
}

fn is_fillable(element: &FormElement) -> bool {
    if element.hidden {
        return false;
    }
    let tag = element.tag.to_ascii_lowercase();
    if !matches!(tag.as_str(), "input" | "textarea" | "select") {
        return false;
    }
    !matches!(
        element.input_type.as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("hidden" | "submit" | "button" | "reset" | "image" | "file")
    )
}

/// Lowercase and strip everything but letters and digits.
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn input_type_for(field: &str) -> Option<&'static str> {
    match field {
        "email" | "emailaddress" | "mail" => Some("email"),
        "phone" | "telephone" | "tel" | "mobile" | "phonenumber" => Some("tel"),
        "password" | "pass" => Some("password"),
        "url" | "website" | "homepage" => Some("url"),
        "search" | "query" => Some("search"),
        "date" | "birthday" | "dob" => Some("date"),
        _ => None,
    }
}

fn autocomplete_alias(field: &str) -> Option<&'static str> {
    match field {
        "firstname" | "givenname" => Some("given-name"),
        "lastname" | "surname" | "familyname" => Some("family-name"),
        "fullname" | "name" => Some("name"),
        "phone" | "telephone" | "mobile" | "phonenumber" => Some("tel"),
        "zip" | "zipcode" | "postcode" | "postalcode" => Some("postal-code"),
        "address" | "street" | "streetaddress" => Some("street-address"),
        "company" | "organization" => Some("organization"),
        "country" => Some("country-name"),
        _ => None,
    }
}

fn selector_for(element: &FormElement) -> Option<String> {
    let tag = element.tag.to_ascii_lowercase();
    if let Some(id) = element.id.as_deref().filter(|s| !s.is_empty()) {
        return Some(format!("{}[id=\"{}\"]", tag, escape_attr(id)));
    }
    if let Some(name) = element.name.as_deref().filter(|s| !s.is_empty()) {
        return Some(format!("{}[name=\"{}\"]", tag, escape_attr(name)));
    }
    if let Some(label) = element.aria_label.as_deref().filter(|s| !s.is_empty()) {
        return Some(format!("{}[aria-label=\"{}\"]", tag, escape_attr(label)));
    }
    if let Some(placeholder) = element.placeholder.as_deref().filter(|s| !s.is_empty()) {
        return Some(format!("{}[placeholder=\"{}\"]", tag, escape_attr(placeholder)));
    }
    None
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\a "),
            _ => out.push(c),
        }
    }
    out
}
