//! Targeted directive rewrites in the reverse-proxy configuration.
//!
//! The file is Caddyfile-shaped:
//!
//! ```text
//! *:80 {
//!   tls off
//!   basicauth "USERNAME_PLACEHOLDER" PASSWORD_PLACEHOLDER {
//!     /home
//!     /kibana
//!   }
//!   proxy / localhost:8080
//! }
//! ```
//!
//! Only the matched line is rebuilt. All other lines, including their line
//! endings, are copied byte for byte.

use std::fs;
use std::path::Path;

use crate::error::{ControlPlaneError, Result};
use crate::storage::write_atomic;

const BASICAUTH: &str = "basicauth";
const SITE_ADDRESS: &str = "site address";

struct Line<'a> {
    body: &'a str,
    ending: &'a str,
}

impl<'a> Line<'a> {
    fn indent(&self) -> &'a str {
        let trimmed = self.body.trim_start();
        &self.body[..self.body.len() - trimmed.len()]
    }
}

fn split_lines(text: &str) -> Vec<Line<'_>> {
    text.split_inclusive('\n')
        .map(|raw| {
            let body = raw
                .strip_suffix('\n')
                .map(|b| b.strip_suffix('\r').unwrap_or(b))
                .unwrap_or(raw);
            Line {
                body,
                ending: &raw[body.len()..],
            }
        })
        .collect()
}

/// The line without its trailing comment. A `#` starts a comment at the
/// beginning of a token, outside quotes.
fn code_part(body: &str) -> &str {
    let mut in_quotes = false;
    let mut prev_is_space = true;
    for (i, c) in body.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes && prev_is_space => return &body[..i],
            _ => {}
        }
        prev_is_space = c.is_whitespace();
    }
    body
}

fn brace_delta(code: &str) -> i64 {
    let mut in_quotes = false;
    let mut delta = 0;
    for c in code.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            '{' if !in_quotes => delta += 1,
            '}' if !in_quotes => delta -= 1,
            _ => {}
        }
    }
    delta
}

/// Whitespace-separated tokens. A quoted token keeps its quotes and may
/// contain spaces.
fn tokens(code: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = None;
    let mut in_quotes = false;
    for (i, c) in code.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        }
        if c.is_whitespace() && !in_quotes {
            if let Some(s) = start.take() {
                out.push(&code[s..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push(&code[s..]);
    }
    out
}

fn single_match(path: &Path, directive: &'static str, matches: &[usize]) -> Result<usize> {
    match matches {
        [index] => Ok(*index),
        [] => Err(ControlPlaneError::DirectiveNotFound {
            path: path.to_path_buf(),
            directive,
        }),
        many => Err(ControlPlaneError::DuplicateDirective {
            path: path.to_path_buf(),
            directive,
            count: many.len(),
        }),
    }
}

fn join(lines: &[Line<'_>], index: usize, replacement: &str) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i == index {
            out.push_str(replacement);
        } else {
            out.push_str(line.body);
        }
        out.push_str(line.ending);
    }
    out
}

/// Replace the user and password of the single `basicauth` directive.
///
/// Both forms are understood: `basicauth user pass {` with a path block and
/// `basicauth /path user pass`. Path arguments and the opening brace stay.
pub fn rewrite_credentials(path: &Path, text: &str, username: &str, password: &str) -> Result<String> {
    let lines = split_lines(text);
    let matches: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| tokens(code_part(line.body)).first() == Some(&BASICAUTH))
        .map(|(i, _)| i)
        .collect();
    let index = single_match(path, BASICAUTH, &matches)?;

    let line = &lines[index];
    let code = code_part(line.body).trim_end();
    let mut args: Vec<&str> = tokens(code).into_iter().skip(1).collect();
    let opens_block = args.last() == Some(&"{");
    if opens_block {
        args.pop();
    }
    if args.len() < 2 {
        return Err(ControlPlaneError::MalformedDocument {
            path: path.to_path_buf(),
            reason: "basicauth directive needs a username and a password".to_string(),
        });
    }
    args.truncate(args.len() - 2);

    let mut rebuilt = format!("{}{}", line.indent(), BASICAUTH);
    for arg in args.iter().copied().chain([username, password]) {
        rebuilt.push(' ');
        rebuilt.push_str(arg);
    }
    if opens_block {
        rebuilt.push_str(" {");
    }
    // Trailing whitespace and comment.
    rebuilt.push_str(&line.body[code.len()..]);

    Ok(join(&lines, index, &rebuilt))
}

/// Replace the address of the single top-level site block with `domain`.
pub fn rewrite_domain_name(path: &Path, text: &str, domain: &str) -> Result<String> {
    let lines = split_lines(text);
    let mut depth = 0i64;
    let mut matches = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let code = code_part(line.body);
        let trimmed = code.trim();
        if depth == 0 && trimmed.len() > 1 && trimmed.ends_with('{') {
            matches.push(i);
        }
        depth += brace_delta(code);
    }
    let index = single_match(path, SITE_ADDRESS, &matches)?;

    let line = &lines[index];
    let code = code_part(line.body).trim_end();
    let rebuilt = format!("{}{} {{{}", line.indent(), domain, &line.body[code.len()..]);

    Ok(join(&lines, index, &rebuilt))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ControlPlaneError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Rotate the basic-auth credentials in the proxy configuration file.
pub fn change_credentials(path: &Path, username: &str, password: &str) -> Result<()> {
    let text = read(path)?;
    let updated = rewrite_credentials(path, &text, username, password)?;
    write_atomic(path, updated.as_bytes())?;
    tracing::info!(path = %path.display(), "Proxy credentials rotated");
    Ok(())
}

/// Bind the proxy's site block to `domain`.
pub fn change_domain_name(path: &Path, domain: &str) -> Result<()> {
    let text = read(path)?;
    let updated = rewrite_domain_name(path, &text, domain)?;
    write_atomic(path, updated.as_bytes())?;
    tracing::info!(path = %path.display(), domain = %domain, "Proxy domain name changed");
    Ok(())
}
