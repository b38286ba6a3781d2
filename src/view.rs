//! Presentation contract: one row per widget with the action to render.

use serde::Serialize;

use crate::store::ViewState;
use crate::types::{ShopContext, Widget};

/// Theme-editor link that adds `widget`'s app block to the product template.
pub fn theme_editor_link(shop: &ShopContext, widget: &Widget) -> String {
    format!(
        "https://{}/admin/themes/current/editor?template=product&addAppBlockId={}/{}&target={}",
        shop, widget.external_block_id, widget.kind, widget.placement_target
    )
}

/// Action button shown next to a widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WidgetAction {
    /// Already active in the published theme
    Active,
    /// Not active (or status unknown after a failed query): offer to add it
    AddWidget { link: String },
    /// Statuses for the current widget set are still being reconciled
    Pending,
}

/// A widget as the panel displays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetRow {
    pub widget: Widget,
    /// `None` until the status map is complete for the current widget set
    pub active: Option<bool>,
    pub action: WidgetAction,
}

impl ViewState {
    /// Rows in catalog order.
    ///
    /// Until reconciliation finishes for the current widget set every row is
    /// `Pending`; a partial status map is never shown as final.
    pub fn rows(&self) -> Vec<WidgetRow> {
        let reconciled = self.is_reconciled();
        let fallback_shop;
        let shop = match self.shop() {
            Some(shop) => shop,
            None => {
                fallback_shop = ShopContext::from_host(None);
                &fallback_shop
            }
        };

        self.widgets()
            .iter()
            .map(|widget| {
                let active = if reconciled {
                    Some(self.statuses().get(&widget.id).unwrap_or(false))
                } else {
                    None
                };
                let action = match active {
                    None => WidgetAction::Pending,
                    Some(true) => WidgetAction::Active,
                    Some(false) => WidgetAction::AddWidget {
                        link: theme_editor_link(shop, widget),
                    },
                };
                WidgetRow {
                    widget: widget.clone(),
                    active,
                    action,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ViewStore;
    use crate::types::{widget, StatusMap, WidgetSet};

    #[test]
    fn test_theme_editor_link() {
        let mut w = widget("w1", "star-rating");
        w.external_block_id = "0f3c9a".to_string();
        w.placement_target = "mainSection".to_string();

        assert_eq!(
            theme_editor_link(&ShopContext::new("store.myshopify.com"), &w),
            "https://store.myshopify.com/admin/themes/current/editor?template=product&addAppBlockId=0f3c9a/star-rating&target=mainSection"
        );
    }

    #[test]
    fn test_rows_pending_until_reconciled() {
        let store = ViewStore::new();
        let version = store
            .replace_widgets(
                WidgetSet::new(vec![widget("w1", "banner"), widget("w2", "popup")]).unwrap(),
            )
            .unwrap();

        let rows = store.snapshot().rows();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.action == WidgetAction::Pending));

        store.record_shop(&ShopContext::new("store.myshopify.com"));
        let statuses: StatusMap = [("w1".to_string(), true), ("w2".to_string(), false)]
            .into_iter()
            .collect();
        store.apply_statuses(version, statuses);

        let rows = store.snapshot().rows();
        assert_eq!(rows[0].widget.id, "w1");
        assert_eq!(rows[0].action, WidgetAction::Active);
        assert_eq!(rows[1].active, Some(false));
        match &rows[1].action {
            WidgetAction::AddWidget { link } => {
                assert!(link.starts_with("https://store.myshopify.com/admin/themes/current/editor"));
                assert!(link.contains("addAppBlockId=block-w2/popup"));
            }
            other => panic!("expected AddWidget, got {:?}", other),
        }
    }

    #[test]
    fn test_row_serialization() {
        let row = WidgetRow {
            widget: widget("w1", "banner"),
            active: Some(true),
            action: WidgetAction::Active,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["action"]["action"], "active");
        assert_eq!(json["widget"]["kind"], "banner");
    }
}
