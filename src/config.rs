//! Recognizer configuration and its boundary adapters.
//!
//! The recognizer accepts a single structured configuration value,
//! [`RecognizerConfig`]. Callers may supply that value directly, as a
//! mapping of keys to typed values, or as a textual key-value block
//! (either `{key: value, ...}` or one `key = value` pair per line).
//! The textual and mapping shapes are normalized into the structured
//! form exactly once, at the boundary, by [`ConfigSource::resolve`];
//! downstream code only ever sees `RecognizerConfig`.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

lazy_static! {
    /// Matches one `key = value` (or `key: value`) line of a textual config block.
    static ref KV_LINE_REGEX: Regex =
        Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*[:=]\s*(.+?)\s*$").unwrap();
}

/// Which recognition strategy the external recognizer should apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecognitionMethod {
    /// Whole-page recognition without speech bubble segmentation.
    #[default]
    Simple,
    /// Speech-bubble segmentation before recognition.
    Complex,
}

impl RecognitionMethod {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "simple" => Ok(RecognitionMethod::Simple),
            "complex" => Ok(RecognitionMethod::Complex),
            other => Err(Error::InvalidConfigValue(
                "method".to_string(),
                format!("expected 'simple' or 'complex', got '{}'", other),
            )),
        }
    }
}

/// The structured configuration value handed to the recognizer with
/// every page. Fields carry their natural types.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecognizerConfig {
    /// Recognition strategy.
    pub method: RecognitionMethod,
    /// Minimum width in pixels of a candidate speech bubble.
    pub speech_bubble_min_width: u32,
    /// Minimum height in pixels of a candidate speech bubble.
    pub speech_bubble_min_height: u32,
    /// Maximum width in pixels of a candidate speech bubble.
    pub speech_bubble_max_width: u32,
    /// Maximum height in pixels of a candidate speech bubble.
    pub speech_bubble_max_height: u32,
    /// Whether empty recognized lines are kept in the page script.
    pub keep_empty_lines: bool,
    /// Lines below this recognizer confidence (0.0 - 1.0) are dropped.
    pub min_confidence: f64,
    /// OCR language hint, e.g. "eng".
    pub language: String,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            method: RecognitionMethod::Simple,
            speech_bubble_min_width: 60,
            speech_bubble_min_height: 25,
            speech_bubble_max_width: 500,
            speech_bubble_max_height: 500,
            keep_empty_lines: false,
            min_confidence: 0.0,
            language: "eng".to_string(),
        }
    }
}

impl RecognizerConfig {
    /// Builds a config from a mapping, starting from the defaults.
    /// Unknown keys and ill-typed values fail with [`Error::InvalidConfigValue`].
    pub fn from_map(map: &HashMap<String, ConfigValue>) -> Result<Self> {
        let mut config = Self::default();
        for (key, value) in map {
            config.apply(key, value)?;
        }
        Ok(config)
    }

    /// Builds a config from a textual key-value block.
    ///
    /// Two layouts are accepted: a braced block (`{method: 'complex', ...}`)
    /// or one `key = value` pair per line, with `#`/`;` comment lines and
    /// `[section]` headers ignored.
    pub fn from_kv_text(text: &str) -> Result<Self> {
        Self::from_map(&parse_kv_text(text)?)
    }

    fn apply(&mut self, key: &str, value: &ConfigValue) -> Result<()> {
        match key {
            "method" => self.method = RecognitionMethod::parse(value.as_str(key)?)?,
            "speech_bubble_min_width" => self.speech_bubble_min_width = value.as_u32(key)?,
            "speech_bubble_min_height" => self.speech_bubble_min_height = value.as_u32(key)?,
            "speech_bubble_max_width" => self.speech_bubble_max_width = value.as_u32(key)?,
            "speech_bubble_max_height" => self.speech_bubble_max_height = value.as_u32(key)?,
            "keep_empty_lines" => self.keep_empty_lines = value.as_bool(key)?,
            "min_confidence" => self.min_confidence = value.as_f64(key)?,
            "language" => self.language = value.as_str(key)?.to_string(),
            other => {
                return Err(Error::InvalidConfigValue(
                    other.to_string(),
                    "unknown configuration key".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A configuration value interpreted with its natural type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ConfigValue {
    /// Interprets a textual literal: booleans (`true`/`True`), integers,
    /// floats, quoted strings, and bare strings, in that order.
    pub fn parse_literal(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "true" | "True" => return ConfigValue::Bool(true),
            "false" | "False" => return ConfigValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return ConfigValue::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return ConfigValue::Float(f);
        }
        let unquoted = trimmed
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
            .unwrap_or(trimmed);
        ConfigValue::Str(unquoted.to_string())
    }

    fn as_bool(&self, key: &str) -> Result<bool> {
        match self {
            ConfigValue::Bool(b) => Ok(*b),
            other => Err(type_error(key, "boolean", other)),
        }
    }

    fn as_u32(&self, key: &str) -> Result<u32> {
        match self {
            ConfigValue::Int(i) if *i >= 0 && *i <= u32::MAX as i64 => Ok(*i as u32),
            other => Err(type_error(key, "non-negative integer", other)),
        }
    }

    fn as_f64(&self, key: &str) -> Result<f64> {
        match self {
            ConfigValue::Float(f) => Ok(*f),
            ConfigValue::Int(i) => Ok(*i as f64),
            other => Err(type_error(key, "number", other)),
        }
    }

    fn as_str(&self, key: &str) -> Result<&str> {
        match self {
            ConfigValue::Str(s) => Ok(s),
            other => Err(type_error(key, "string", other)),
        }
    }
}

fn type_error(key: &str, expected: &str, got: &ConfigValue) -> Error {
    Error::InvalidConfigValue(key.to_string(), format!("expected {}, got {:?}", expected, got))
}

/// The three accepted configuration shapes, resolved once at the boundary.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Already in the structured form.
    Structured(RecognizerConfig),
    /// A mapping of keys to typed values.
    Map(HashMap<String, ConfigValue>),
    /// A textual key-value block.
    Text(String),
}

impl ConfigSource {
    /// Normalizes this source into the structured form.
    pub fn resolve(self) -> Result<RecognizerConfig> {
        match self {
            ConfigSource::Structured(config) => Ok(config),
            ConfigSource::Map(map) => RecognizerConfig::from_map(&map),
            ConfigSource::Text(text) => RecognizerConfig::from_kv_text(&text),
        }
    }
}

impl From<RecognizerConfig> for ConfigSource {
    fn from(config: RecognizerConfig) -> Self {
        ConfigSource::Structured(config)
    }
}

impl From<HashMap<String, ConfigValue>> for ConfigSource {
    fn from(map: HashMap<String, ConfigValue>) -> Self {
        ConfigSource::Map(map)
    }
}

impl From<&str> for ConfigSource {
    fn from(text: &str) -> Self {
        ConfigSource::Text(text.to_string())
    }
}

fn parse_kv_text(text: &str) -> Result<HashMap<String, ConfigValue>> {
    let trimmed = text.trim();
    if let Some(inner) = trimmed.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        parse_braced_block(inner)
    } else {
        parse_lines(trimmed)
    }
}

fn parse_lines(text: &str) -> Result<HashMap<String, ConfigValue>> {
    let mut map = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            continue; // section header, carried over from ini-style inputs
        }
        let Some(caps) = KV_LINE_REGEX.captures(line) else {
            return Err(Error::InvalidConfigValue(
                line.to_string(),
                "not a 'key = value' pair".to_string(),
            ));
        };
        map.insert(caps[1].to_string(), ConfigValue::parse_literal(&caps[2]));
    }
    Ok(map)
}

fn parse_braced_block(inner: &str) -> Result<HashMap<String, ConfigValue>> {
    let mut map = HashMap::new();
    for entry in split_top_level(inner) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some(split_at) = find_separator(entry) else {
            return Err(Error::InvalidConfigValue(
                entry.to_string(),
                "not a 'key: value' pair".to_string(),
            ));
        };
        let key = unquote(entry[..split_at].trim());
        let value = ConfigValue::parse_literal(&entry[split_at + 1..]);
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

/// Splits on commas that are not inside a quoted string.
fn split_top_level(inner: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in inner.chars() {
        match (c, quote) {
            ('\'' | '"', None) => {
                quote = Some(c);
                current.push(c);
            }
            (c, Some(q)) if c == q => {
                quote = None;
                current.push(c);
            }
            (',', None) => {
                entries.push(std::mem::take(&mut current));
            }
            (c, _) => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        entries.push(current);
    }
    entries
}

/// Finds the `:` or `=` separating key from value, ignoring quoted keys.
fn find_separator(entry: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in entry.char_indices() {
        match (c, quote) {
            ('\'' | '"', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            (':' | '=', None) => return Some(i),
            _ => {}
        }
    }
    None
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| s.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(s)
}
