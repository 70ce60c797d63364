// -*- coding: utf-8 -*-
//
// Copyright (C) 2024 - 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::MAX_LINE_LEN;
use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors that can occur while editing a properties file.
#[derive(Debug, Error)]
pub enum PropsError {
    /// The file does not exist or is not accessible.
    #[error("Cannot open '{}' for reading", .path.display())]
    NotReadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file could not be opened for writing after it has been read.
    #[error("Cannot open '{}' for writing", .path.display())]
    NotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A line is longer than [MAX_LINE_LEN] bytes.
    #[error("Line {line} has {len} bytes, but at most {max} are allowed", max = MAX_LINE_LEN)]
    LineTooLong { line: usize, len: usize },

    /// Writing the new content failed.
    #[error("Failed to write '{}'", .path.display())]
    WriteInterrupted {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// vim: ts=4 sw=4 expandtab
