// Modloader
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Error types shared across the loader.
//!
//! Only [`LoaderError`] and [`ConfigError`] ever reach the caller of the
//! lifecycle entry points. Import, hook and host errors are per-item
//! failures: they are logged and collected into reports instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::component::ComponentCycleError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot derive a package id from root {}", root.display())]
    MissingPackageId { root: PathBuf },

    #[error("invalid package id '{0}'")]
    InvalidPackageId(String),

    #[error("invalid module pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// A module could not be imported (ImportFailure).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("no analyzable source for module {module}")]
    MissingSource { module: String },

    #[error("no importer provides module {module}")]
    NotProvided { module: String },

    #[error("module {module} failed to initialize: {reason}")]
    Initialization { module: String, reason: String },
}

/// A module-level `register`/`unregister` hook failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The host rejected a component registration or unregistration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("loader has not been initialized")]
    NotInitialized,

    #[error("components are still registered, unregister them first")]
    StillRegistered,

    #[error(transparent)]
    CircularDependency(#[from] ComponentCycleError),
}
