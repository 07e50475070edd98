// SPDX-License-Identifier: MIT

//! Reducers - pure merge functions, one per [`ReducerType`]
//!
//! [`reduce`] looks up the reducer declared for a field in [`STATE_SCHEMA`]
//! and dispatches on it, so the table is the single source of truth for how
//! updates merge. Every reducer takes the current value and the incoming
//! update by value and returns the next value. None of them look at anything
//! else, so replaying the same updates from the same initial state always
//! yields the same state.

use serde::de::DeserializeOwned;

use super::schema::{ReducerType, StateField, StateFieldDef, STATE_SCHEMA};
use super::store::{MetadataUpdate, RunMetadata};

/// A state field value every [`ReducerType`] can be applied to
pub trait FieldValue: DeserializeOwned {
    /// What a partial update carries for the field
    type Update;

    /// The update as a whole value; `None` for a present but empty update
    fn replacement(update: Self::Update) -> Option<Self>;

    /// Fold the update into the current value. Sequences append, records
    /// shallow-merge and scalars are replaced.
    fn combine(self, update: Self::Update) -> Self;
}

impl FieldValue for bool {
    type Update = Option<bool>;

    fn replacement(update: Option<bool>) -> Option<Self> {
        update
    }

    fn combine(self, update: Option<bool>) -> Self {
        update.unwrap_or(self)
    }
}

impl<T: DeserializeOwned> FieldValue for Option<T> {
    type Update = T;

    fn replacement(update: T) -> Option<Self> {
        Some(Some(update))
    }

    fn combine(self, update: T) -> Self {
        Some(update)
    }
}

impl<T: DeserializeOwned> FieldValue for Vec<T> {
    type Update = Vec<T>;

    fn replacement(update: Vec<T>) -> Option<Self> {
        Some(update)
    }

    fn combine(self, update: Vec<T>) -> Self {
        append(self, update)
    }
}

impl FieldValue for RunMetadata {
    type Update = MetadataUpdate;

    /// Only an update naming both the run id and the start time is a whole
    /// record
    fn replacement(update: MetadataUpdate) -> Option<Self> {
        Some(RunMetadata {
            run_id: update.run_id?,
            steps: update.steps,
            start_time: update.start_time?,
            end_time: update.end_time,
        })
    }

    fn combine(self, update: MetadataUpdate) -> Self {
        merge_metadata(self, update)
    }
}

/// Merge `update` into `current` with the reducer [`STATE_SCHEMA`] declares
/// for `field`
pub fn reduce<T: FieldValue>(field: StateField, current: T, update: T::Update) -> T {
    reduce_with(STATE_SCHEMA.get(field), current, update)
}

/// Merge `update` into `current` with the reducer declared by `def`
pub fn reduce_with<T: FieldValue>(def: &StateFieldDef, current: T, update: T::Update) -> T {
    log::debug!("Reducing {} with {:?}", def.field, def.reducer);
    match def.reducer {
        ReducerType::Overwrite => match T::replacement(update) {
            Some(value) => overwrite(current, value),
            None => current,
        },
        ReducerType::OverwriteOrDefault => {
            let replacement = T::replacement(update);
            match declared_default(def) {
                Some(default) => overwrite_or_default(current, replacement, default),
                None => replacement.unwrap_or(current),
            }
        }
        ReducerType::Append | ReducerType::Merge => current.combine(update),
    }
}

/// Declared default of `field`, or `T::default()` when it has none
pub fn field_default<T: FieldValue + Default>(field: StateField) -> T {
    declared_default(STATE_SCHEMA.get(field)).unwrap_or_default()
}

fn declared_default<T: DeserializeOwned>(def: &StateFieldDef) -> Option<T> {
    def.default
        .clone()
        .and_then(|value| serde_json::from_value(value).ok())
}

/// `Overwrite`: the update wins
pub fn overwrite<T>(_current: T, update: T) -> T {
    update
}

/// `OverwriteOrDefault`: the update wins, an empty update resets to `default`
pub fn overwrite_or_default<T>(_current: T, update: Option<T>, default: T) -> T {
    update.unwrap_or(default)
}

/// `Append`: new items go after the existing ones, nothing is deduplicated
pub fn append<T>(mut current: Vec<T>, update: Vec<T>) -> Vec<T> {
    current.extend(update);
    current
}

/// `Merge` for run metadata: keys present in the update replace the current
/// ones, except `steps` which is appended.
pub fn merge_metadata(current: RunMetadata, update: MetadataUpdate) -> RunMetadata {
    RunMetadata {
        run_id: update.run_id.unwrap_or(current.run_id),
        steps: append(current.steps, update.steps),
        start_time: update.start_time.unwrap_or(current.start_time),
        end_time: update.end_time.or(current.end_time),
    }
}
