// -*- coding: utf-8 -*-
//
// Copyright (C) 2024 - 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![forbid(unsafe_code)]

mod command;
mod logging;

use crate::{command::addkey::run_addkey, logging::init_logging};
use clap::Parser;
use std::{path::PathBuf, process::ExitCode};

/// The default properties file, relative to the working directory.
const PROPERTIES_PATH: &str = "../Java/backend-api/src/main/resources/application.properties";

/// Generate a new API key and register it in the backend `application.properties`.
#[derive(Parser, Debug)]
struct Opts {
    /// Path to the `application.properties` file.
    ///
    /// If not given, then
    /// `../Java/backend-api/src/main/resources/application.properties`
    /// relative to the current working directory is used.
    properties: Option<PathBuf>,

    /// Show detailed information about what happens internally.
    #[arg(long)]
    verbose: bool,

    /// Show version information and exit.
    #[arg(long, short = 'v')]
    version: bool,
}

impl Opts {
    /// Get the properties file path from command line or default.
    pub fn get_properties(&self) -> PathBuf {
        if let Some(properties) = &self.properties {
            properties.clone()
        } else {
            PathBuf::from(PROPERTIES_PATH)
        }
    }
}

fn main() -> ExitCode {
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            // Help is printed to stdout and is not an error.
            let failed = e.use_stderr();
            if e.print().is_err() || failed {
                return ExitCode::FAILURE;
            }
            return ExitCode::SUCCESS;
        }
    };

    if opts.version {
        println!("apikeygen version {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    init_logging(opts.verbose);

    match run_addkey(&opts.get_properties()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

// vim: ts=4 sw=4 expandtab
