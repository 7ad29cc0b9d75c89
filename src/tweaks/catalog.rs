// src/tweaks/catalog.rs

use std::{collections::HashSet, fs, io, path::Path};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use super::Tweak;
use crate::errors::CatalogError;

/// All tweak definitions, grouped by category in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    categories: IndexMap<String, Vec<Tweak>>,
}

impl Catalog {
    /// Loads the definition store. Unlike the undo and config stores, a
    /// missing file is an error here.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => CatalogError::Missing(path.to_path_buf()),
            _ => CatalogError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let categories = serde_json::from_str(&text).map_err(|source| CatalogError::Corrupted {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_categories(categories)?;
        debug!(
            "Loaded {} tweaks in {} categories from '{}'.",
            catalog.len(),
            catalog.categories.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Builds a catalog, stamping each tweak with its category and rejecting
    /// duplicate ids.
    pub fn from_categories(
        mut categories: IndexMap<String, Vec<Tweak>>,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for (category, tweaks) in categories.iter_mut() {
            for tweak in tweaks.iter_mut() {
                if !seen.insert(tweak.id.clone()) {
                    return Err(CatalogError::DuplicateId(tweak.id.clone()));
                }
                tweak.category = category.clone();
            }
        }
        Ok(Self { categories })
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &[Tweak])> {
        self.categories
            .iter()
            .map(|(name, tweaks)| (name.as_str(), tweaks.as_slice()))
    }

    /// Every tweak in catalog order.
    pub fn tweaks(&self) -> impl Iterator<Item = &Tweak> {
        self.categories.values().flatten()
    }

    pub fn find(&self, id: &str) -> Option<&Tweak> {
        self.tweaks().find(|tweak| tweak.id == id)
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Human-readable category name: `system_tweaks` becomes `System Tweaks`.
pub fn display_category(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
