//! Describe the schema for a sort order or a list of keys.

use anyhow::Result;
use clap::Parser;
use itertools::Itertools;

use segsort_lib::keys::MetaKey;
use segsort_lib::schema::{FieldDescriptor, Schema};
use segsort_lib::sort::SortType;

use crate::commands::command::Command;
use crate::commands::common::{SchemaOptions, SortTypeArg};

/// Print the physical layout of a schema.
#[derive(Debug, Parser)]
#[command(
    name = "schema",
    about = "\x1b[38;5;30m[SCHEMA]\x1b[0m         \x1b[36mShow the header layout, extent and memory cost of a schema\x1b[0m",
    long_about = r#"
Print each key of a schema with its column kind and 1-based header bytes,
followed by the byte extent the schema touches and the memory a record store
spends per record.

The schema is built from a sort order (--sort), from an explicit key list
(--keys), or from the default key set when neither is given.

Example:

    segsort schema --sort line-off --tight
    segsort schema --keys inline,crossline,src_x --copy-headers
"#
)]
pub struct SchemaCmd {
    /// Build the schema required by this sort order
    #[arg(short = 's', long = "sort", value_enum, conflicts_with = "keys")]
    pub sort: Option<SortTypeArg>,

    /// Build the schema from these keys, with their built-in layouts
    #[arg(short = 'k', long = "keys", value_delimiter = ',')]
    pub keys: Vec<MetaKey>,

    #[command(flatten)]
    pub options: SchemaOptions,
}

impl SchemaCmd {
    fn build(&self) -> Result<Schema> {
        let mode = self.options.mode();
        let mut schema = match (self.sort, self.keys.is_empty()) {
            (Some(sort), _) => SortType::from(sort).schema(mode)?,
            (None, false) => Schema::from_keys(&self.keys, mode)?,
            (None, true) => Schema::with_defaults(mode),
        };
        self.options.apply(&mut schema);
        Ok(schema)
    }
}

/// One line per schema entry: key, kind, ordinal and header bytes.
fn describe(schema: &Schema) -> Vec<String> {
    schema
        .iter()
        .map(|(key, entry)| {
            let bytes = match entry.descriptor {
                FieldDescriptor::ScaledFloat { pos, scale_pos } => {
                    format!("{pos}-{} (scale {scale_pos})", pos + 3)
                }
                descriptor => descriptor
                    .byte_range()
                    .map_or_else(|| "-".to_string(), |(start, end)| format!("{start}-{}", end - 1)),
            };
            format!("{:<24} {:<8} {:>3}  {bytes}", key.name(), entry.descriptor.column().to_string(), entry.ordinal)
        })
        .collect()
}

impl Command for SchemaCmd {
    fn execute(&self, _command_line: &str) -> Result<()> {
        let schema = self.build()?;
        println!("{:<24} {:<8} {:>3}  bytes", "key", "kind", "ord");
        for line in describe(&schema) {
            println!("{line}");
        }
        println!(
            "extent: {} bytes ({}-{}), keys: {}",
            schema.extent(),
            schema.start(),
            schema.end().saturating_sub(1),
            schema.iter().map(|(key, _)| key).join(",")
        );
        println!("memory per record: {} bytes", schema.memory_per_record());
        Ok(())
    }
}
