// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Textwerk.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Textwerk operations.
#[derive(Debug, Error)]
pub enum TextwerkError {
    // -- Document errors --
    #[error("cannot open document: {0}")]
    DocumentOpen(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("refusing to overwrite the input document {0}")]
    OutputIsInput(PathBuf),

    // -- Font errors --
    #[error("font family {family:?} is not in the font registry")]
    UnregisteredFont { family: String },

    #[error("font resource failed: {0}")]
    Font(String),

    // -- Request errors --
    #[error("invalid target word: {0}")]
    InvalidTarget(String),

    #[error("invalid color: {0}")]
    InvalidColor(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TextwerkError>;
