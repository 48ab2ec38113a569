//! definition::default
//!
//! A basic definition for sites that do not need their own.

use super::builder::{CompiledDefinition, DefinitionBuilder};
use super::field::FieldDefinition;
use super::options::DefinitionOptions;

/// Build the default definition: title, keywords, description and an
/// `<h1>` heading.
pub fn default_definition() -> CompiledDefinition {
    let built = DefinitionBuilder::new("DefaultMetadata")
        .field(
            "title",
            FieldDefinition::tag()
                .head(true)
                .max_length(68)
                .help_text("This is the page title, that appears in the title bar."),
        )
        .field(
            "keywords",
            FieldDefinition::meta_tag()
                .help_text("Comma-separated keywords for search engines."),
        )
        .field(
            "description",
            FieldDefinition::meta_tag()
                .max_length(155)
                .help_text("A short description, displayed in search results."),
        )
        .field(
            "heading",
            FieldDefinition::tag()
                .with_name("h1")
                .help_text("This is the page heading, appearing in the <h1> tag."),
        )
        .options(DefinitionOptions {
            verbose_name: Some("Metadata".into()),
            verbose_name_plural: Some("Metadata".into()),
            ..Default::default()
        })
        .build();

    match built {
        Ok(definition) => definition,
        Err(e) => unreachable!("default definition is statically valid: {e}"),
    }
}
