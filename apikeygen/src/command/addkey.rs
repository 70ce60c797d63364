// -*- coding: utf-8 -*-
//
// Copyright (C) 2024 - 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT

use anyhow::{self as ah, Context as _};
use apikeygen_props::{KeysLine, PropsFile};
use apikeygen_token::generate_token;
use std::path::Path;

/// Generate a new truly random and secure API key
/// and append it to the keys line of the properties file.
pub fn run_addkey(properties: &Path) -> ah::Result<()> {
    let token = generate_token().context("Failed to generate API Key")?;
    println!("Generated API Key: {token}");

    let failed = || format!("Failed to add API Key to '{}'", properties.display());
    let mut props = PropsFile::read(properties).with_context(failed)?;
    if props.add_key(&token).with_context(failed)? == KeysLine::Created {
        eprintln!("Warning: api.security.keys line not found, adding new line");
    }
    props.write(properties).with_context(failed)?;

    println!("API Key successfully added to application.properties");
    Ok(())
}

// vim: ts=4 sw=4 expandtab
