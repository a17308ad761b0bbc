use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ir::EdgeSpec;

/// Colour tokens handed to the renderer with every routed link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkTheme {
    /// Canvas-wide link colour used when neither the link nor its slot has one.
    pub default_color: Option<String>,
    /// Per slot data type colours.
    pub type_colors: BTreeMap<String, String>,
    pub fallback_color: String,
}

impl Default for LinkTheme {
    fn default() -> Self {
        Self {
            default_color: None,
            type_colors: BTreeMap::new(),
            fallback_color: "#ff0000".to_string(),
        }
    }
}

impl LinkTheme {
    /// Slot type palette close to what node editors ship with out of the box.
    pub fn node_editor() -> Self {
        let type_colors = [
            ("CLIP", "#FFD500"),
            ("CONDITIONING", "#FFA931"),
            ("IMAGE", "#64B5F6"),
            ("LATENT", "#FF9CF9"),
            ("MASK", "#81C784"),
            ("MODEL", "#B39DDB"),
            ("VAE", "#FF6E6E"),
        ]
        .into_iter()
        .map(|(kind, color)| (kind.to_string(), color.to_string()))
        .collect();
        Self {
            default_color: Some("#9A9".to_string()),
            type_colors,
            fallback_color: "#ff0000".to_string(),
        }
    }

    pub fn base_color(&self, edge: &EdgeSpec) -> String {
        edge.color
            .as_deref()
            .or(edge.slot_color.as_deref())
            .or_else(|| {
                edge.slot_type
                    .as_deref()
                    .and_then(|kind| self.type_colors.get(kind))
                    .map(String::as_str)
            })
            .or(self.default_color.as_deref())
            .unwrap_or(self.fallback_color.as_str())
            .to_string()
    }
}
