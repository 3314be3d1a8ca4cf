//! Comic-rooted listings.

use crate::listing::{ColumnType, CriterionKind, SchemaDescriptor, SchemaError, SortDirection};

use ColumnType::{Boolean, Integer};
use CriterionKind::{Equals, Exists, Href, Prefix};
use SortDirection::Asc;

/// Comics, filterable by tags, authors, titles and external links.
pub fn comics() -> Result<SchemaDescriptor, SchemaError> {
    SchemaDescriptor::builder("comics", "comic", "comic")
        .join_many("titles", "comic", "comic_title", ("id", "comic_id"))
        .join_many("comic_tags", "comic", "comic_tag", ("id", "comic_id"))
        .join("tag", "comic_tags", "tag", ("tag_id", "id"))
        .join("tag_type", "tag", "tag_type", ("tag_type_id", "id"))
        .join_many("chapters", "comic", "comic_chapter", ("id", "comic_id"))
        .join_many("authors", "comic", "comic_author", ("id", "comic_id"))
        .join("author", "authors", "person", ("person_id", "id"))
        .join_many("externals", "comic", "comic_external", ("id", "comic_id"))
        .join("link", "externals", "link", ("link_id", "id"))
        .join("website", "link", "website", ("website_id", "id"))
        .field("code", "comic", "code")
        .field("createdAt", "comic", "created_at")
        .field("updatedAt", "comic", "updated_at")
        .field("titleContent", "titles", "content")
        .field("tagCode", "tag", "code")
        .field("tagTypeCode", "tag_type", "code")
        .typed_field("chapterId", "chapters", "id", Integer)
        .field("chapterReleasedAt", "chapters", "released_at")
        .field("authorName", "author", "name")
        .field("websiteHost", "website", "host")
        .field("relativeReference", "link", "relative_reference")
        .criterion("codes", Equals("code".into()))
        .criterion("tagCodes", Equals("tagCode".into()))
        .criterion("tagTypeCodes", Equals("tagTypeCode".into()))
        .criterion("authorNames", Equals("authorName".into()))
        .criterion("titlePrefixes", Prefix("titleContent".into()))
        .criterion("hasChapters", Exists("chapterId".into()))
        .criterion(
            "externalHrefs",
            Href {
                host: "websiteHost".into(),
                reference: "relativeReference".into(),
            },
        )
        .default_order("code", Asc)
        .max_sort_directives(4)
        .build()
}

/// Comic titles, one row per (comic, language, title).
pub fn comic_titles() -> Result<SchemaDescriptor, SchemaError> {
    SchemaDescriptor::builder("comic-titles", "comic_title", "comic_title")
        .join("comic", "comic_title", "comic", ("comic_id", "id"))
        .join("language", "comic_title", "language", ("language_id", "id"))
        .field("comicCode", "comic", "code")
        .field("language", "language", "lang")
        .field("content", "comic_title", "content")
        .typed_field("isMain", "comic_title", "is_main", Boolean)
        .preferable("language")
        .criterion("comicCodes", Equals("comicCode".into()))
        .criterion("languages", Equals("language".into()))
        .criterion("isMain", Equals("isMain".into()))
        .criterion("contentPrefixes", Prefix("content".into()))
        .default_order("comicCode", Asc)
        .default_order("language", Asc)
        .max_sort_directives(6)
        .build()
}

/// Tag assignments of comics.
pub fn comic_tags() -> Result<SchemaDescriptor, SchemaError> {
    SchemaDescriptor::builder("comic-tags", "comic_tag", "comic_tag")
        .join("comic", "comic_tag", "comic", ("comic_id", "id"))
        .join("tag", "comic_tag", "tag", ("tag_id", "id"))
        .join("tag_type", "tag", "tag_type", ("tag_type_id", "id"))
        .field("comicCode", "comic", "code")
        .field("tagCode", "tag", "code")
        .field("tagName", "tag", "name")
        .field("tagTypeCode", "tag_type", "code")
        .criterion("comicCodes", Equals("comicCode".into()))
        .criterion("tagTypeCodes", Equals("tagTypeCode".into()))
        .criterion("tagCodes", Equals("tagCode".into()))
        .default_order("comicCode", Asc)
        .default_order("tagTypeCode", Asc)
        .default_order("tagCode", Asc)
        .max_sort_directives(6)
        .build()
}

/// Chapters with their volume and titles.
pub fn comic_chapters() -> Result<SchemaDescriptor, SchemaError> {
    SchemaDescriptor::builder("comic-chapters", "comic_chapter", "comic_chapter")
        .join("comic", "comic_chapter", "comic", ("comic_id", "id"))
        .join("volume", "comic_chapter", "comic_volume", ("volume_id", "id"))
        .join_many("titles", "comic_chapter", "comic_chapter_title", ("id", "chapter_id"))
        .join("title_language", "titles", "language", ("language_id", "id"))
        .field("comicCode", "comic", "code")
        .typed_field("number", "comic_chapter", "number", Integer)
        .field("releasedAt", "comic_chapter", "released_at")
        .typed_field("volumeNumber", "volume", "number", Integer)
        .field("titleContent", "titles", "content")
        .field("titleLanguage", "title_language", "lang")
        .preferable("titleLanguage")
        .criterion("comicCodes", Equals("comicCode".into()))
        .criterion("numbers", Equals("number".into()))
        .criterion("volumeNumbers", Equals("volumeNumber".into()))
        .criterion("released", Exists("releasedAt".into()))
        .default_order("comicCode", Asc)
        .default_order("number", Asc)
        .max_sort_directives(6)
        .build()
}

/// Localized chapter titles.
pub fn comic_chapter_titles() -> Result<SchemaDescriptor, SchemaError> {
    SchemaDescriptor::builder("comic-chapter-titles", "comic_chapter_title", "chapter_title")
        .join("chapter", "chapter_title", "comic_chapter", ("chapter_id", "id"))
        .join("comic", "chapter", "comic", ("comic_id", "id"))
        .join("language", "chapter_title", "language", ("language_id", "id"))
        .field("comicCode", "comic", "code")
        .typed_field("chapterNumber", "chapter", "number", Integer)
        .field("chapterReleasedAt", "chapter", "released_at")
        .field("language", "language", "lang")
        .field("content", "chapter_title", "content")
        .preferable("language")
        .criterion("comicCodes", Equals("comicCode".into()))
        .criterion("chapterNumbers", Equals("chapterNumber".into()))
        .criterion("languages", Equals("language".into()))
        .default_order("comicCode", Asc)
        .default_order("chapterNumber", Asc)
        .default_order("language", Asc)
        .max_sort_directives(8)
        .build()
}

/// Localized volume titles.
pub fn comic_volume_titles() -> Result<SchemaDescriptor, SchemaError> {
    SchemaDescriptor::builder("comic-volume-titles", "comic_volume_title", "volume_title")
        .join("volume", "volume_title", "comic_volume", ("volume_id", "id"))
        .join("comic", "volume", "comic", ("comic_id", "id"))
        .join("language", "volume_title", "language", ("language_id", "id"))
        .field("comicCode", "comic", "code")
        .typed_field("volumeNumber", "volume", "number", Integer)
        .field("language", "language", "lang")
        .field("content", "volume_title", "content")
        .preferable("language")
        .criterion("comicCodes", Equals("comicCode".into()))
        .criterion("volumeNumbers", Equals("volumeNumber".into()))
        .criterion("languages", Equals("language".into()))
        .default_order("comicCode", Asc)
        .default_order("volumeNumber", Asc)
        .default_order("language", Asc)
        .max_sort_directives(8)
        .build()
}

/// People credited on comics.
pub fn comic_authors() -> Result<SchemaDescriptor, SchemaError> {
    SchemaDescriptor::builder("comic-authors", "comic_author", "comic_author")
        .join("comic", "comic_author", "comic", ("comic_id", "id"))
        .join("person", "comic_author", "person", ("person_id", "id"))
        .field("comicCode", "comic", "code")
        .field("personName", "person", "name")
        .field("role", "comic_author", "role")
        .criterion("comicCodes", Equals("comicCode".into()))
        .criterion("personNames", Equals("personName".into()))
        .criterion("roles", Equals("role".into()))
        .default_order("comicCode", Asc)
        .default_order("role", Asc)
        .default_order("personName", Asc)
        .max_sort_directives(6)
        .build()
}

/// External links attached to comics.
pub fn comic_externals() -> Result<SchemaDescriptor, SchemaError> {
    SchemaDescriptor::builder("comic-externals", "comic_external", "comic_external")
        .join("comic", "comic_external", "comic", ("comic_id", "id"))
        .join("link", "comic_external", "link", ("link_id", "id"))
        .join("website", "link", "website", ("website_id", "id"))
        .field("comicCode", "comic", "code")
        .field("websiteHost", "website", "host")
        .field("relativeReference", "link", "relative_reference")
        .typed_field("official", "comic_external", "is_official", Boolean)
        .criterion("comicCodes", Equals("comicCode".into()))
        .criterion("official", Equals("official".into()))
        .criterion(
            "hrefs",
            Href {
                host: "websiteHost".into(),
                reference: "relativeReference".into(),
            },
        )
        .default_order("comicCode", Asc)
        .default_order("websiteHost", Asc)
        .max_sort_directives(6)
        .build()
}
