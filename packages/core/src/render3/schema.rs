//! Schemas
//!
//! Corresponds to packages/core/src/metadata/schema.ts and the schema checks
//! in packages/core/src/render3/instructions/element_validation.ts
//!
//! Schemas relax the dev-mode unknown-property/unknown-element checks for
//! elements the compiler cannot know about.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMetadata {
    pub name: String,
}

/// Allows any property on elements with a `-` in their name.
pub fn custom_elements_schema() -> SchemaMetadata {
    SchemaMetadata {
        name: "custom-elements".to_string(),
    }
}

/// Allows any property on any element.
pub fn no_errors_schema() -> SchemaMetadata {
    SchemaMetadata {
        name: "no-errors-schema".to_string(),
    }
}

/// Whether any schema on the view permits unknown members on `tag_name`.
pub fn matching_schemas(schemas: Option<&[SchemaMetadata]>, tag_name: Option<&str>) -> bool {
    let Some(schemas) = schemas else {
        return false;
    };
    schemas.iter().any(|schema| {
        schema.name == "no-errors-schema"
            || (schema.name == "custom-elements"
                && tag_name.map(|t| t.contains('-')).unwrap_or(false))
    })
}
