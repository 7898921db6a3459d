//! # Generator Configuration
//!
//! Environment-backed settings shared by the `tlbgen` binary and anything
//! else that drives a generation run.
//!
//! CLI flags always win. When a flag is absent the matching environment
//! variable is consulted, then the built-in default:
//!
//! | variable                  | values              | default  |
//! |---------------------------|---------------------|----------|
//! | `TLBGEN_OUT_DIR`          | directory path      | `.`      |
//! | `TLBGEN_EMPTY_SECTIONS`   | `render`/`suppress` | `render` |
//! | `TLBGEN_ON_MEMBER_ERROR`  | `abort`/`skip`      | `abort`  |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable naming the output directory.
pub const OUT_DIR_ENV: &str = "TLBGEN_OUT_DIR";

/// Environment variable selecting how empty header sections are emitted.
pub const EMPTY_SECTIONS_ENV: &str = "TLBGEN_EMPTY_SECTIONS";

/// Environment variable selecting what happens when one member fails to decode.
pub const ON_MEMBER_ERROR_ENV: &str = "TLBGEN_ON_MEMBER_ERROR";

/// How a section with no entities is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionMode
{
    /// Title, separator and trailing blank line are always written
    #[default]
    Render,
    /// Sections without entities are left out entirely
    Suppress,
}

impl FromStr for SectionMode
{
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "render" | "keep" => Ok(SectionMode::Render),
            "suppress" | "skip" => Ok(SectionMode::Suppress),
            _ => Err(ConfigError::InvalidValue {
                key: EMPTY_SECTIONS_ENV,
                value: s.to_string(),
            }),
        }
    }
}

/// What to do when a single library member cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberErrorMode
{
    /// Stop and publish nothing for the library
    #[default]
    Abort,
    /// Log the failure and leave the member out of the model
    Skip,
}

impl FromStr for MemberErrorMode
{
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "abort" | "fail" => Ok(MemberErrorMode::Abort),
            "skip" | "drop" => Ok(MemberErrorMode::Skip),
            _ => Err(ConfigError::InvalidValue {
                key: ON_MEMBER_ERROR_ENV,
                value: s.to_string(),
            }),
        }
    }
}

/// Settings for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSettings
{
    /// Directory receiving the emitted files
    pub out_dir: PathBuf,
    /// Empty section handling
    pub sections: SectionMode,
    /// Member decoding failure handling
    pub on_member_error: MemberErrorMode,
}

impl Default for GeneratorSettings
{
    fn default() -> Self
    {
        Self {
            out_dir: PathBuf::from("."),
            sections: SectionMode::default(),
            on_member_error: MemberErrorMode::default(),
        }
    }
}

impl GeneratorSettings
{
    /// Read settings from the process environment.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidValue` if a variable holds an unrecognised value.
    pub fn from_env() -> Result<Self, ConfigError>
    {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup function.
    ///
    /// Unset keys fall back to defaults.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidValue` if a key holds an unrecognised value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(dir) = lookup(OUT_DIR_ENV).filter(|v| !v.is_empty()) {
            settings.out_dir = PathBuf::from(dir);
        }
        if let Some(mode) = lookup(EMPTY_SECTIONS_ENV) {
            settings.sections = mode.parse()?;
        }
        if let Some(mode) = lookup(ON_MEMBER_ERROR_ENV) {
            settings.on_member_error = mode.parse()?;
        }
        Ok(settings)
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError
{
    /// A setting holds a value we do not understand
    #[error("Invalid value for {key}: {value}")]
    InvalidValue
    {
        /// Setting name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

#[cfg(test)]
mod tests
{
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String>
    {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset()
    {
        let settings = GeneratorSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, GeneratorSettings::default());
        assert_eq!(settings.sections, SectionMode::Render);
        assert_eq!(settings.on_member_error, MemberErrorMode::Abort);
    }

    #[test]
    fn test_values_from_lookup()
    {
        let settings = GeneratorSettings::from_lookup(lookup(&[
            (OUT_DIR_ENV, "generated"),
            (EMPTY_SECTIONS_ENV, "Suppress"),
            (ON_MEMBER_ERROR_ENV, "skip"),
        ]))
        .unwrap();
        assert_eq!(settings.out_dir, PathBuf::from("generated"));
        assert_eq!(settings.sections, SectionMode::Suppress);
        assert_eq!(settings.on_member_error, MemberErrorMode::Skip);
    }

    #[test]
    fn test_invalid_value_names_key()
    {
        let error = GeneratorSettings::from_lookup(lookup(&[(ON_MEMBER_ERROR_ENV, "retry")])).unwrap_err();
        let message = error.to_string();
        assert!(message.contains(ON_MEMBER_ERROR_ENV));
        assert!(message.contains("retry"));
    }
}
