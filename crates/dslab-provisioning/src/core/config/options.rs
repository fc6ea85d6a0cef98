//! Config utils.

use std::collections::HashMap;
use std::str::FromStr;

use crate::core::error::{Error, Result};

/// Parses config value string, which consists of two parts - name and options.
/// Example: Compress[cpu_threshold=0.8] parts are name Compress and options string "cpu_threshold=0.8".
pub fn parse_config_value(config_str: &str) -> (String, Option<String>) {
    match config_str.split_once('[') {
        Some((l, r)) => (l.trim().to_string(), Some(r.replace(']', ""))),
        None => (config_str.trim().to_string(), None),
    }
}

/// Parses options string from config value, returns map with option names and values.
pub fn parse_options(options_str: &str) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for option_str in options_str.split(',') {
        if let Some((name, value)) = option_str.split_once('=') {
            options.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    options
}

/// Parses the value of the specified option, returns `None` if the option is absent.
pub fn parse_option<T: FromStr>(options: &HashMap<String, String>, name: &str) -> Result<Option<T>> {
    match options.get(name) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::InvalidConfiguration(format!("can't parse option {}={}", name, value))),
        None => Ok(None),
    }
}
