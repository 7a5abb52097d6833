//! Category → colour assignment that stays stable across rebuilds.

use crate::error::{ChartError, Result};
use tracing::debug;

/// The ten-colour categorical palette used when no colours are configured.
pub const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
    "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];

/// Ordered mapping from category to colour.
///
/// Key order is the category domain order the map was initialised with; it
/// only changes when the set of categories changes.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryColorMap {
    entries: Vec<(String, String)>,
    palette: Vec<String>,
}

impl CategoryColorMap {
    /// Assign the default palette to `domain`, cycling when there are more
    /// categories than colours.
    pub fn initialize(domain: &[String]) -> Self {
        let palette: Vec<String> = CATEGORY10.iter().map(|c| c.to_string()).collect();
        Self::cycle(domain, palette)
    }

    /// Assign `colors` to `domain` in order, cycling as needed.
    pub fn with_palette(domain: &[String], colors: &[String]) -> Result<Self> {
        if colors.is_empty() {
            return Err(ChartError::InvalidConfig(
                "At least one colour is required".to_string(),
            ));
        }
        Ok(Self::cycle(domain, colors.to_vec()))
    }

    fn cycle(domain: &[String], palette: Vec<String>) -> Self {
        let entries = domain
            .iter()
            .enumerate()
            .map(|(i, cat)| (cat.clone(), palette[i % palette.len()].clone()))
            .collect();
        Self { entries, palette }
    }

    /// Replace the colour values, keeping this map's key order.
    pub fn recolor(&self, colors: &[String]) -> Result<Self> {
        let keys: Vec<String> = self.entries.iter().map(|(k, _)| k.clone()).collect();
        let map = Self::with_palette(&keys, colors)?;
        debug!(categories = map.len(), colors = colors.len(), "recoloured categories");
        Ok(map)
    }

    /// Carry this map over to a freshly resolved domain.
    ///
    /// The same set of categories keeps the map as is, order included. A
    /// different set is assigned anew, in the new domain's order, from this
    /// map's palette.
    pub fn reconcile(&self, domain: &[String]) -> Self {
        let same_set = domain.len() == self.entries.len()
            && domain.iter().all(|cat| self.color_of(cat).is_some());
        if same_set {
            self.clone()
        } else {
            debug!(
                previous = self.entries.len(),
                current = domain.len(),
                "category set changed, reassigning colours"
            );
            Self::cycle(domain, self.palette.clone())
        }
    }

    pub fn color_of(&self, category: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == category)
            .map(|(_, c)| c.as_str())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn palette(&self) -> &[String] {
        &self.palette
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
