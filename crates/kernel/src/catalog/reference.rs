//! Reference-data listings: tags, people and links.

use crate::listing::{ColumnType, CriterionKind, SchemaDescriptor, SchemaError, SortDirection};

use CriterionKind::{Equals, Exists, Href, Prefix, RelativeReference};
use SortDirection::Asc;

/// Tags with their type. Rarely changes, so results are cacheable.
pub fn tags() -> Result<SchemaDescriptor, SchemaError> {
    SchemaDescriptor::builder("tags", "tag", "tag")
        .join("tag_type", "tag", "tag_type", ("tag_type_id", "id"))
        .join_many("comic_tags", "tag", "comic_tag", ("id", "tag_id"))
        .field("code", "tag", "code")
        .field("name", "tag", "name")
        .field("tagTypeCode", "tag_type", "code")
        .typed_field("comicId", "comic_tags", "comic_id", ColumnType::Integer)
        .criterion("codes", Equals("code".into()))
        .criterion("tagTypeCodes", Equals("tagTypeCode".into()))
        .criterion("used", Exists("comicId".into()))
        .default_order("tagTypeCode", Asc)
        .default_order("code", Asc)
        .max_sort_directives(4)
        .cacheable()
        .build()
}

pub fn people() -> Result<SchemaDescriptor, SchemaError> {
    SchemaDescriptor::builder("people", "person", "person")
        .join_many("credits", "person", "comic_author", ("id", "person_id"))
        .join("comic", "credits", "comic", ("comic_id", "id"))
        .field("name", "person", "name")
        .field("comicCode", "comic", "code")
        .field("role", "credits", "role")
        .criterion("names", Equals("name".into()))
        .criterion("namePrefixes", Prefix("name".into()))
        .criterion("comicCodes", Equals("comicCode".into()))
        .criterion("roles", Equals("role".into()))
        .default_order("name", Asc)
        .max_sort_directives(4)
        .build()
}

/// Links addressed by website host and relative reference.
pub fn links() -> Result<SchemaDescriptor, SchemaError> {
    SchemaDescriptor::builder("links", "link", "link")
        .join("website", "link", "website", ("website_id", "id"))
        .join_many("externals", "link", "comic_external", ("id", "link_id"))
        .field("websiteHost", "website", "host")
        .field("relativeReference", "link", "relative_reference")
        .typed_field("externalId", "externals", "id", ColumnType::Integer)
        .criterion("websiteHosts", Equals("websiteHost".into()))
        .criterion(
            "relativeReferences",
            RelativeReference("relativeReference".into()),
        )
        .criterion(
            "hrefs",
            Href {
                host: "websiteHost".into(),
                reference: "relativeReference".into(),
            },
        )
        .criterion("used", Exists("externalId".into()))
        .default_order("websiteHost", Asc)
        .default_order("relativeReference", Asc)
        .max_sort_directives(10)
        .build()
}
