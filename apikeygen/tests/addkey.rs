// -*- coding: utf-8 -*-
//
// Copyright (C) 2024 - 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT

use apikeygen_token::Token;
use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

const WARNING: &str = "Warning: api.security.keys line not found, adding new line";

fn run(cwd: &Path, args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_apikeygen"))
        .current_dir(cwd)
        .args(args)
        .output()
        .unwrap()
}

/// Run on `content` and return (output, new content, generated key).
fn run_on(content: &str) -> (Output, String, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("application.properties");
    fs::write(&path, content).unwrap();
    let out = run(dir.path(), &[path.as_path()]);
    let key = generated_key(&out);
    (out, fs::read_to_string(&path).unwrap(), key)
}

fn generated_key(out: &Output) -> String {
    let stdout = String::from_utf8(out.stdout.clone()).unwrap();
    let key = stdout
        .lines()
        .find_map(|l| l.strip_prefix("Generated API Key: "))
        .unwrap()
        .to_string();
    // Key shape.
    key.parse::<Token>().unwrap();
    key
}

#[cfg(unix)]
fn running_as_root() -> bool {
    use std::os::unix::fs::MetadataExt as _;
    let file = tempfile::NamedTempFile::new().unwrap();
    file.as_file().metadata().unwrap().uid() == 0
}

fn stderr(out: &Output) -> String {
    String::from_utf8(out.stderr.clone()).unwrap()
}

#[test]
fn test_append_to_populated_line() {
    let (out, content, key) = run_on("server.port=8080\napi.security.keys=abc\n");
    assert!(out.status.success());
    assert_eq!(content, format!("server.port=8080\napi.security.keys=abc,{key}\n"));
    assert_eq!(
        String::from_utf8(out.stdout.clone()).unwrap(),
        format!("Generated API Key: {key}\nAPI Key successfully added to application.properties\n")
    );
    assert!(!stderr(&out).contains(WARNING));
}

#[test]
fn test_create_missing_line() {
    let (out, content, key) = run_on("server.port=8080\n");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(content, format!("server.port=8080\napi.security.keys={key}\n"));
    assert!(stderr(&out).contains(WARNING));
}

#[test]
fn test_empty_value() {
    let (out, content, key) = run_on("api.security.keys=\n");
    assert!(out.status.success());
    assert_eq!(content, format!("api.security.keys=,{key}\n"));
}

#[test]
fn test_preserve_unrelated_lines() {
    let input = "\
spring.datasource.url=jdbc:mysql://localhost:3306/tutorly
spring.datasource.username=root
api.security.keys=v1,v2
# server settings
server.port=8443
server.ssl.enabled=true";
    let (out, content, key) = run_on(input);
    assert!(out.status.success());
    let lines: Vec<&str> = content.lines().collect();
    let expected: Vec<&str> = input.lines().collect();
    assert_eq!(lines.len(), expected.len());
    for (i, (line, exp)) in lines.iter().zip(expected.iter()).enumerate() {
        if i == 2 {
            assert_eq!(*line, format!("api.security.keys=v1,v2,{key}"));
        } else {
            assert_eq!(line, exp);
        }
    }
    assert!(content.ends_with("server.ssl.enabled=true\n"));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("application.properties");
    let out = run(dir.path(), &[path.as_path()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("application.properties"));
    assert!(!path.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_duplicate_keys_lines() {
    let (out, content, key) =
        run_on("api.security.keys=first\nother=1\napi.security.keys=second\n");
    assert!(out.status.success());
    assert_eq!(
        content,
        format!("api.security.keys=first,{key}\nother=1\napi.security.keys=second\n")
    );
}

#[test]
fn test_line_too_long() {
    let input = format!("a={}\napi.security.keys=abc\n", "x".repeat(2000));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("application.properties");
    fs::write(&path, &input).unwrap();
    let out = run(dir.path(), &[path.as_path()]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(fs::read_to_string(&path).unwrap(), input);
}

#[test]
fn test_repeated_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("application.properties");
    fs::write(&path, "server.port=8080\napi.security.keys=orig\n").unwrap();

    let mut expected = "api.security.keys=orig".to_string();
    for _ in 0..5 {
        let out = run(dir.path(), &[path.as_path()]);
        assert!(out.status.success());
        expected.push(',');
        expected.push_str(&generated_key(&out));
    }
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        format!("server.port=8080\n{expected}\n")
    );
}

#[test]
fn test_default_path() {
    let dir = tempfile::tempdir().unwrap();
    let cwd = dir.path().join("API_Key_Generator");
    let resources: PathBuf = dir.path().join("Java/backend-api/src/main/resources");
    fs::create_dir_all(&cwd).unwrap();
    fs::create_dir_all(&resources).unwrap();
    let path = resources.join("application.properties");
    fs::write(&path, "api.security.keys=abc\n").unwrap();

    let out = run(&cwd, &[]);
    assert!(out.status.success());
    let key = generated_key(&out);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        format!("api.security.keys=abc,{key}\n")
    );
}

#[test]
fn test_non_utf8_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("application.properties");
    fs::write(&path, b"# caf\xe9\napi.security.keys=abc\n").unwrap();
    let out = run(dir.path(), &[path.as_path()]);
    assert!(out.status.success());
    let key = generated_key(&out);

    let mut expected = b"# caf\xe9\napi.security.keys=abc,".to_vec();
    expected.extend_from_slice(key.as_bytes());
    expected.push(b'\n');
    assert_eq!(fs::read(&path).unwrap(), expected);
}

#[cfg(unix)]
#[test]
fn test_readonly_file() {
    use std::os::unix::fs::PermissionsExt as _;

    // Root can write read-only files.
    if running_as_root() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("application.properties");
    let input = "server.port=8080\napi.security.keys=abc\n";
    fs::write(&path, input).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();

    let out = run(dir.path(), &[path.as_path()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("for writing"));
    assert_eq!(fs::read_to_string(&path).unwrap(), input);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_command_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("application.properties");
    fs::write(&path, "api.security.keys=abc\n").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_apikeygen"))
        .current_dir(dir.path())
        .arg("--no-such-option")
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));

    let out = Command::new(env!("CARGO_BIN_EXE_apikeygen"))
        .current_dir(dir.path())
        .arg("--help")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));

    // Nothing was added.
    assert_eq!(fs::read_to_string(&path).unwrap(), "api.security.keys=abc\n");
}

// vim: ts=4 sw=4 expandtab
