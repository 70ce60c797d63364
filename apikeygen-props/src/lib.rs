// -*- coding: utf-8 -*-
//
// Copyright (C) 2024 - 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate registers API keys in the `application.properties`
//! file of the backend service.
//!
//! The file is not parsed as a full properties grammar.
//! Every line is opaque bytes, except for the line starting with
//! [KEYS_PREFIX]. All other lines are written back unmodified,
//! whatever their encoding is.

#![forbid(unsafe_code)]

mod error;

pub use crate::error::PropsError;

use apikeygen_token::Token;
use std::{
    borrow::Cow,
    fs::{self, OpenOptions},
    io::{self, Write as _},
    path::Path,
};

/// The prefix of the line holding the comma separated API keys.
pub const KEYS_PREFIX: &str = "api.security.keys=";

/// Maximum number of bytes in a line, excluding the line break.
pub const MAX_LINE_LEN: usize = 1024;

/// How the keys line was changed by [PropsFile::add_key].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeysLine {
    /// The key was appended to the existing keys line.
    Appended,

    /// There was no keys line. A new one was added at the end of the file.
    Created,
}

/// In-memory content of a properties file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropsFile {
    lines: Vec<Vec<u8>>,
    keys_idx: Option<usize>,
}

impl PropsFile {
    /// Read the properties file at `path`.
    pub fn read(path: &Path) -> Result<Self, PropsError> {
        let content = fs::read(path).map_err(|source| PropsError::NotReadable {
            path: path.to_path_buf(),
            source,
        })?;
        let this = Self::parse_bytes(&content)?;
        tracing::debug!(
            "Read {} lines from '{}'. Keys line: {:?}",
            this.lines.len(),
            path.display(),
            this.keys_idx,
        );
        Ok(this)
    }

    /// Split `content` into lines.
    ///
    /// One trailing `\n` or `\r\n` is removed from each line.
    pub fn parse_bytes(content: &[u8]) -> Result<Self, PropsError> {
        let mut lines = vec![];
        let mut keys_idx = None;
        for (idx, line) in content.split_inclusive(|c: &u8| *c == b'\n').enumerate() {
            let line = match line.strip_suffix(b"\n") {
                Some(line) => line.strip_suffix(b"\r").unwrap_or(line),
                None => line, // Last line without line break.
            };
            if line.len() > MAX_LINE_LEN {
                return Err(PropsError::LineTooLong {
                    line: idx + 1,
                    len: line.len(),
                });
            }
            // Only the first keys line is used.
            if keys_idx.is_none() && line.starts_with(KEYS_PREFIX.as_bytes()) {
                keys_idx = Some(idx);
            }
            lines.push(line.to_vec());
        }
        Ok(Self { lines, keys_idx })
    }

    pub fn parse_str(content: &str) -> Result<Self, PropsError> {
        Self::parse_bytes(content.as_bytes())
    }

    /// Get all lines, without line breaks.
    pub fn lines(&self) -> &[Vec<u8>] {
        &self.lines
    }

    /// Get the comma separated elements of the keys line value.
    ///
    /// Returns `None`, if there is no keys line.
    pub fn keys(&self) -> Option<Vec<Cow<'_, str>>> {
        self.keys_idx.map(|idx| {
            self.lines[idx][KEYS_PREFIX.len()..]
                .split(|c: &u8| *c == b',')
                .map(String::from_utf8_lossy)
                .collect()
        })
    }

    /// Register `token` on the keys line.
    ///
    /// The token is appended as `,<token>` to the first keys line.
    /// If there is no keys line, then a new one is added to the end.
    pub fn add_key(&mut self, token: &Token) -> Result<KeysLine, PropsError> {
        if let Some(idx) = self.keys_idx {
            let line = &mut self.lines[idx];
            let len = line.len() + 1 + token.as_str().len();
            // The next run must still be able to read the file.
            if len > MAX_LINE_LEN {
                return Err(PropsError::LineTooLong { line: idx + 1, len });
            }
            line.push(b',');
            line.extend_from_slice(token.as_str().as_bytes());
            Ok(KeysLine::Appended)
        } else {
            self.lines
                .push(format!("{KEYS_PREFIX}{token}").into_bytes());
            self.keys_idx = Some(self.lines.len() - 1);
            Ok(KeysLine::Created)
        }
    }

    /// Get the file content. Every line is terminated by `\n`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut content = Vec::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            content.extend_from_slice(line);
            content.push(b'\n');
        }
        content
    }

    /// Replace the file at `path` with this content.
    ///
    /// The content is written to a temporary file in the same directory,
    /// synced to disk and then renamed over `path`.
    /// A crash leaves either the old or the new file, but never a truncated one.
    ///
    /// If the replacement file can't get the owner of the original file,
    /// or if the directory is not writable, or if the file has hard links,
    /// then the file is truncated and rewritten in place instead.
    pub fn write(&self, path: &Path) -> Result<(), PropsError> {
        let not_writable = |source: io::Error| PropsError::NotWritable {
            path: path.to_path_buf(),
            source,
        };
        let interrupted = |source: io::Error| PropsError::WriteInterrupted {
            path: path.to_path_buf(),
            source,
        };

        // The target must be writable by us. It must not be created or truncated here.
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(not_writable)?;
        let meta = file.metadata().map_err(not_writable)?;
        drop(file);

        // Replace the file a symlink points to, not the symlink itself.
        let target = fs::canonicalize(path).map_err(not_writable)?;
        let Some(dir) = target.parent() else {
            return Err(not_writable(io::Error::other("File has no parent directory")));
        };

        let tmp = tempfile::Builder::new()
            .prefix(".apikeygen-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .and_then(|tmp| {
                adopt_metadata(tmp.as_file(), &meta)?;
                Ok(tmp)
            });
        let mut tmp = match tmp {
            Ok(tmp) => tmp,
            Err(e) => {
                tracing::debug!("Can't replace '{}' ({e}). Rewriting in place.", target.display());
                return self.write_in_place(&target, path);
            }
        };

        tracing::debug!("Writing temporary file '{}'", tmp.path().display());
        tmp.write_all(&self.to_bytes()).map_err(interrupted)?;
        tmp.as_file().sync_all().map_err(interrupted)?;
        tmp.persist(&target).map_err(|e| interrupted(e.error))?;

        // Make the rename itself durable.
        if cfg!(unix) {
            fs::File::open(dir)
                .and_then(|d| d.sync_all())
                .map_err(interrupted)?;
        }

        tracing::debug!("Replaced '{}'", target.display());
        Ok(())
    }

    /// Truncate `target` and write the content into it.
    /// `path` is the name reported in errors.
    fn write_in_place(&self, target: &Path, path: &Path) -> Result<(), PropsError> {
        let interrupted = |source: io::Error| PropsError::WriteInterrupted {
            path: path.to_path_buf(),
            source,
        };
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(target)
            .map_err(|source| PropsError::NotWritable {
                path: path.to_path_buf(),
                source,
            })?;
        file.write_all(&self.to_bytes()).map_err(interrupted)?;
        file.sync_all().map_err(interrupted)?;
        tracing::debug!("Rewrote '{}' in place", target.display());
        Ok(())
    }
}

/// Give the replacement file `tmp` the owner and mode of the original file.
#[cfg(unix)]
fn adopt_metadata(tmp: &fs::File, meta: &fs::Metadata) -> io::Result<()> {
    use std::os::unix::fs::{fchown, MetadataExt as _};

    // Renaming over one name of a hard linked file would split the links.
    if meta.nlink() > 1 {
        return Err(io::Error::other("File has hard links"));
    }
    // Owner first. chown may clear the setuid/setgid mode bits.
    fchown(tmp, Some(meta.uid()), Some(meta.gid()))?;
    tmp.set_permissions(meta.permissions())
}

#[cfg(not(unix))]
fn adopt_metadata(tmp: &fs::File, meta: &fs::Metadata) -> io::Result<()> {
    tmp.set_permissions(meta.permissions())
}


// vim: ts=4 sw=4 expandtab
