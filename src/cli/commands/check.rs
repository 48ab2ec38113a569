//! check command - Compile definitions and show their record schemas

use anyhow::Result;

use super::{load_config, load_registry};
use crate::cli::Context;
use crate::definition::{ColumnType, CompiledDefinition, RecordSchema};

/// Compile the configured definitions and print a summary of each.
pub fn check(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    let registry = load_registry(&config)?;
    config.routes()?;

    match config.loaded_from() {
        Some(path) => println!("Config: {}", path.display()),
        None => println!("Config: (defaults)"),
    }
    if !config.file.routes.is_empty() {
        println!("Routes: {}", config.file.routes.len());
    }

    for definition in registry.iter() {
        println!();
        print_definition(definition);
    }

    println!();
    println!("{} definition(s) OK", registry.len());
    Ok(())
}

fn print_definition(definition: &CompiledDefinition) {
    let options = definition.options();
    println!("Definition: {} ({})", definition.name(), definition.verbose_name());

    let backends: Vec<&str> = options.backends.iter().map(|b| b.name()).collect();
    println!("  Backends: {}", backends.join(", "));

    let mut flags = Vec::new();
    if options.use_sites {
        flags.push("sites");
    }
    if options.use_i18n {
        flags.push("i18n");
    }
    if options.use_cache {
        flags.push("cache");
    }
    if options.use_redirect {
        flags.push("redirect");
    }
    if !flags.is_empty() {
        println!("  Options: {}", flags.join(", "));
    }
    if !options.seo_models.is_empty() {
        let models: Vec<&str> = options.seo_models.iter().map(|m| m.as_str()).collect();
        println!("  Linked types: {}", models.join(", "));
    }

    println!("  Fields:");
    for (key, field) in definition.fields() {
        let mut notes = vec![field.kind().to_string()];
        if field.tag_name() != key {
            notes.push(format!("name={}", field.tag_name()));
        }
        if field.is_head() {
            notes.push("head".to_string());
        }
        if !field.is_editable() {
            notes.push("computed".to_string());
        }
        println!("    {:<16} {}", key, notes.join(" "));
        if let Some(help) = field.help() {
            println!("    {:<16} {}", "", help);
        }
    }

    let groups: Vec<&str> = definition.group_names().collect();
    if !groups.is_empty() {
        println!("  Groups:");
        for name in groups {
            let members = definition.group(name).unwrap_or_default();
            println!("    {:<16} {}", name, members.join(", "));
        }
    }

    println!("  Schemas:");
    for schema in definition.schemas() {
        print_schema(schema);
    }
}

fn print_schema(schema: &RecordSchema) {
    println!("    {} ({})", schema.table, schema.verbose_name);
    for column in &schema.columns {
        let null = if column.nullable { " null" } else { "" };
        println!(
            "      {:<16} {}{}",
            column.name,
            column_type(column.column_type),
            null
        );
    }
    if !schema.unique_together.is_empty() {
        println!("      unique: ({})", schema.unique_together.join(", "));
    }
}

fn column_type(column_type: ColumnType) -> String {
    match column_type {
        ColumnType::Char(max) => format!("char({})", max),
        ColumnType::Text => "text".to_string(),
        ColumnType::ObjectType => "object_type".to_string(),
        ColumnType::ObjectId => "object_id".to_string(),
        ColumnType::ViewName => "view_name".to_string(),
        ColumnType::Site => "site".to_string(),
        ColumnType::Language => "language".to_string(),
    }
}
