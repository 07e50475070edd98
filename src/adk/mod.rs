// SPDX-License-Identifier: MIT

//! Collaborator primitives: language models and the error hierarchy

pub mod error;
pub mod model;
