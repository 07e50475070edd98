// SPDX-License-Identifier: MIT

//! State schema definitions
//!
//! The research state is a fixed record. This table declares, for every field,
//! its type, its default and the reducer that folds a partial update into it.

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

/// Fields of the research state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StateField {
    Question,
    IsValidQuestion,
    Validation,
    Plan,
    SearchResults,
    Report,
    RunMetadata,
}

impl StateField {
    /// Name of the field in the serialized state
    pub fn name(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::IsValidQuestion => "isValidQuestion",
            Self::Validation => "validation",
            Self::Plan => "plan",
            Self::SearchResults => "searchResults",
            Self::Report => "report",
            Self::RunMetadata => "runMetadata",
        }
    }

    /// Declared reducer for this field
    pub fn reducer(self) -> ReducerType {
        STATE_SCHEMA.get(self).reducer
    }
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Supported field types
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Boolean,
    Array,
    Object,
}

/// Reducer types for merging values into state
#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReducerType {
    /// Replace the value (default)
    #[default]
    Overwrite,
    /// Replace the value, falling back to the field default for an empty update
    OverwriteOrDefault,
    /// Concatenate onto the existing sequence
    Append,
    /// Shallow-merge top-level keys; sequences inside are appended
    Merge,
}

/// Definition of a single state field
#[derive(Debug, Clone, Serialize)]
pub struct StateFieldDef {
    pub field: StateField,
    /// Type of the field
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Reducer for merging values
    pub reducer: ReducerType,
    /// Default value, `None` for required or absent-by-default fields
    pub default: Option<Value>,
    /// Set only when the state is created
    pub required: bool,
}

/// Schema defining the research state structure
#[derive(Debug, Clone, Serialize)]
pub struct StateSchema {
    pub fields: Vec<StateFieldDef>,
}

impl StateSchema {
    /// Look up a field definition.
    ///
    /// Every [`StateField`] has exactly one entry in [`STATE_SCHEMA`].
    pub fn get(&self, field: StateField) -> &StateFieldDef {
        self.fields
            .iter()
            .find(|def| def.field == field)
            .unwrap_or_else(|| unreachable!("field {} missing from state schema", field))
    }
}

fn field(
    field: StateField,
    field_type: FieldType,
    reducer: ReducerType,
    default: Option<Value>,
) -> StateFieldDef {
    StateFieldDef {
        field,
        field_type,
        reducer,
        default,
        required: false,
    }
}

/// The research state schema
pub static STATE_SCHEMA: Lazy<StateSchema> = Lazy::new(|| StateSchema {
    fields: vec![
        StateFieldDef {
            required: true,
            ..field(
                StateField::Question,
                FieldType::String,
                ReducerType::Overwrite,
                None,
            )
        },
        field(
            StateField::IsValidQuestion,
            FieldType::Boolean,
            ReducerType::OverwriteOrDefault,
            Some(json!(true)),
        ),
        field(
            StateField::Validation,
            FieldType::Object,
            ReducerType::Overwrite,
            None,
        ),
        field(
            StateField::Plan,
            FieldType::Object,
            ReducerType::Overwrite,
            None,
        ),
        field(
            StateField::SearchResults,
            FieldType::Array,
            ReducerType::Append,
            Some(json!([])),
        ),
        field(
            StateField::Report,
            FieldType::String,
            ReducerType::Overwrite,
            None,
        ),
        field(
            StateField::RunMetadata,
            FieldType::Object,
            ReducerType::Merge,
            Some(json!({ "steps": [] })),
        ),
    ],
});
