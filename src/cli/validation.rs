//! CLI argument validation functions
//!
//! Value parsers for arguments that clap cannot check on its own.

use std::fs;
use std::path::PathBuf;

/// Validate that a file path is accessible (exists and is readable)
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }

    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }

    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!("Cannot read configuration file '{}': {}", path_str, e)),
    }
}

/// Validate a profile name, used as the `application-{profile}` file suffix
pub fn validate_profile_name(profile_str: &str) -> Result<String, String> {
    let profile = profile_str.trim();

    if profile.is_empty() {
        return Err("Profile name cannot be empty".to_string());
    }

    if !profile
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!(
            "Profile name may only contain letters, digits, '-' and '_', got: '{}'",
            profile_str
        ));
    }

    Ok(profile.to_string())
}
