//! Core data types: widgets, widget sets, status maps and shop context.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Shop used when the host does not tell us which shop we are embedded in.
pub const DEFAULT_SHOP: &str = "default-shop";

/// One installable storefront component.
///
/// The catalog endpoint has shipped several spellings of these fields over
/// time, so every field accepts its camelCase, snake_case and legacy name.
/// An object that carries two spellings of the same field is rejected as a
/// duplicate field; the loader then reports the whole payload as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    /// Stable identifier, used as the merge key
    pub id: String,

    /// Block identifier understood by the theme editor
    #[serde(
        default,
        alias = "external_block_id",
        alias = "shopifyBlockID",
        alias = "shopifyBlockId",
        alias = "shopify_block_id"
    )]
    pub external_block_id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Display description
    #[serde(default, alias = "showDescription", alias = "show_description")]
    pub description: String,

    /// Theme section type the widget attaches to; the status lookup key
    #[serde(alias = "type")]
    pub kind: String,

    /// Positioning hint for the theme editor
    #[serde(default, alias = "placement_target", alias = "position")]
    pub placement_target: String,

    /// Display asset
    #[serde(default, alias = "image_url")]
    pub image_url: String,
}

/// Ordered set of widgets with unique ids.
///
/// Order follows the catalog response and only matters for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WidgetSet {
    widgets: Vec<Widget>,
}

impl WidgetSet {
    /// Build a set, rejecting payloads that repeat an id.
    pub fn new(widgets: Vec<Widget>) -> Result<Self, FetchError> {
        let mut seen = HashSet::with_capacity(widgets.len());
        for widget in &widgets {
            if !seen.insert(widget.id.as_str()) {
                return Err(FetchError::Malformed(format!(
                    "duplicate widget id '{}' in catalog",
                    widget.id
                )));
            }
        }
        Ok(Self { widgets })
    }

    /// An empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Widget> {
        self.widgets.iter()
    }

    /// Look up a widget by id.
    pub fn get(&self, id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    /// Ids in display order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.widgets.iter().map(|w| w.id.as_str())
    }
}

impl<'a> IntoIterator for &'a WidgetSet {
    type Item = &'a Widget;
    type IntoIter = std::slice::Iter<'a, Widget>;

    fn into_iter(self) -> Self::IntoIter {
        self.widgets.iter()
    }
}

/// Widget id → "is active in the current theme".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusMap(BTreeMap<String, bool>);

impl StatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, active: bool) {
        self.0.insert(id.into(), active);
    }

    /// Status for a widget, `None` when it was never reconciled.
    pub fn get(&self, id: &str) -> Option<bool> {
        self.0.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(id, active)| (id.as_str(), *active))
    }

    /// True when the key set is exactly the id set of `widgets`.
    pub fn covers(&self, widgets: &WidgetSet) -> bool {
        self.0.len() == widgets.len() && widgets.ids().all(|id| self.0.contains_key(id))
    }
}

impl FromIterator<(String, bool)> for StatusMap {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The merchant's shop domain (e.g. `my-store.myshopify.com`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopContext(String);

impl ShopContext {
    pub fn new(shop: impl Into<String>) -> Self {
        Self(shop.into())
    }

    /// Use the host-supplied shop, or [`DEFAULT_SHOP`] when there is none.
    pub fn from_host(shop: Option<&str>) -> Self {
        match shop.map(str::trim) {
            Some(s) if !s.is_empty() => Self::new(s),
            _ => Self::new(DEFAULT_SHOP),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
pub(crate) fn widget(id: &str, kind: &str) -> Widget {
    Widget {
        id: id.to_string(),
        external_block_id: format!("block-{}", id),
        name: format!("Widget {}", id),
        description: String::new(),
        kind: kind.to_string(),
        placement_target: "section".to_string(),
        image_url: String::new(),
    }
}
