//! Glob-style pattern matching for conditional directives.
//!
//! `*` matches any substring; every other character is literal. Compiled
//! patterns are cached per execution context, and since every resolution
//! pass builds a fresh context the cache can never leak a stale compilation
//! across passes (placeholder expansion makes the same source pattern text
//! resolve differently under different build parameters).

use std::collections::HashMap;

use regex::Regex;

#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: HashMap<String, Regex>,
}

impl PatternCache {
    pub fn new() -> Self {
        PatternCache::default()
    }

    /// Whether `text` matches the glob `pattern`, compiling and caching the
    /// pattern on first use.
    pub fn is_match(&mut self, text: &str, pattern: &str) -> Result<bool, regex::Error> {
        if let Some(regex) = self.compiled.get(pattern) {
            return Ok(regex.is_match(text));
        }
        let regex = Regex::new(&compile_glob(pattern))?;
        let matched = regex.is_match(text);
        self.compiled.insert(pattern.to_string(), regex);
        Ok(matched)
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

fn compile_glob(pattern: &str) -> String {
    let escaped: Vec<String> = pattern.split('*').map(|part| regex::escape(part)).collect();
    format!("^{}$", escaped.join(".*"))
}
