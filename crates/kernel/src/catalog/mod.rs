//! Listing descriptors for the comics catalog.
//!
//! Each listing is one [`SchemaDescriptor`] built by a function in this
//! module tree. [`Catalog::new`] builds every descriptor at startup so a
//! defective descriptor fails fast instead of on the first request.

mod comic;
mod reference;

use std::collections::HashMap;

use crate::listing::{SchemaDescriptor, SchemaError};

pub use comic::{
    comic_authors, comic_chapter_titles, comic_chapters, comic_externals, comic_tags,
    comic_titles, comic_volume_titles, comics,
};
pub use reference::{links, people, tags};

type DescriptorFn = fn() -> Result<SchemaDescriptor, SchemaError>;

/// Every registered listing, in display order.
const DESCRIPTORS: &[DescriptorFn] = &[
    comics,
    comic_titles,
    comic_tags,
    comic_chapters,
    comic_chapter_titles,
    comic_volume_titles,
    comic_authors,
    comic_externals,
    tags,
    people,
    links,
];

/// Registry of listing descriptors by name.
#[derive(Debug, Clone)]
pub struct Catalog {
    descriptors: HashMap<String, SchemaDescriptor>,
    order: Vec<String>,
}

impl Catalog {
    /// Build every descriptor.
    pub fn new() -> Result<Self, SchemaError> {
        let mut descriptors = HashMap::with_capacity(DESCRIPTORS.len());
        let mut order = Vec::with_capacity(DESCRIPTORS.len());

        for build in DESCRIPTORS {
            let descriptor = build()?;
            order.push(descriptor.name().to_string());
            descriptors.insert(descriptor.name().to_string(), descriptor);
        }

        tracing::debug!(listings = order.len(), "catalog built");
        Ok(Self { descriptors, order })
    }

    pub fn get(&self, name: &str) -> Option<&SchemaDescriptor> {
        self.descriptors.get(name)
    }

    /// Listing names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
