//! Plain-text backup of the whole preferences store.
//!
//! Each line holds one entry as `key:type:value`. Backslashes and line
//! breaks inside values are escaped so every entry stays on one line.

use std::fs;
use std::path::Path;

use crate::models::error::{Result, TkConfigError};
use crate::settings::{SettingValue, SettingsStore};

/// Write every preference in `store` to `path`; returns the entry count.
pub fn backup_to_file(store: &dyn SettingsStore, path: &Path) -> Result<usize> {
    check_path(path)?;
    let file_name = path.display().to_string();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| TkConfigError::io(&file_name, e))?;
        }
    }

    let entries = store.entries()?;
    let mut content = String::new();
    for (key, value) in &entries {
        content.push_str(&format_entry(key, value));
        content.push('\n');
    }
    fs::write(path, content).map_err(|e| TkConfigError::io(&file_name, e))?;

    tracing::info!("Backed up {} preferences to {}", entries.len(), file_name);
    Ok(entries.len())
}

/// Load every readable entry of `path` into `store`; returns the count.
///
/// Entries overwrite existing keys; keys absent from the file are kept.
pub fn restore_from_file(store: &mut dyn SettingsStore, path: &Path) -> Result<usize> {
    check_path(path)?;
    let file_name = path.display().to_string();

    if !path.exists() {
        return Err(TkConfigError::NotFound {
            resource: "Backup file".to_string(),
            id: file_name,
        });
    }

    let content = fs::read_to_string(path).map_err(|e| TkConfigError::io(&file_name, e))?;
    let mut restored = 0;
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok((key, value)) => {
                store.put(&key, value)?;
                restored += 1;
            }
            Err(e) => tracing::warn!("Skipping backup line: {}", e),
        }
    }

    tracing::info!("Restored {} preferences from {}", restored, file_name);
    Ok(restored)
}

pub fn format_entry(key: &str, value: &SettingValue) -> String {
    format!("{}:{}:{}", key, value.type_name(), escape(&value.to_string()))
}

/// Parse one `key:type:value` line.
///
/// A qualified type name such as `a.b.Integer` marks a file written by the
/// older format, whose values were stored without escaping; they are taken
/// verbatim. Numbers that do not parse become 0; anything but a
/// case-insensitive `true` is false.
pub fn parse_line(line: &str) -> Result<(String, SettingValue)> {
    let line = line.trim_end_matches('\r');
    let mut parts = line.splitn(3, ':');
    let key = parts.next().unwrap_or_default().trim_start();
    let (type_name, raw) = match (parts.next(), parts.next()) {
        (Some(type_name), Some(raw)) => (type_name, raw),
        _ => {
            return Err(TkConfigError::ParseError(format!(
                "expected key:type:value in {:?}",
                line
            )))
        }
    };

    if key.is_empty() {
        return Err(TkConfigError::ParseError(format!("missing key in {:?}", line)));
    }

    let (type_name, raw) = match type_name.rsplit_once('.') {
        Some((_, short)) => (short, raw.to_string()),
        None => (type_name, unescape(raw)),
    };

    let value = match type_name {
        "String" => SettingValue::String(raw),
        "Boolean" => SettingValue::Bool(raw.trim().eq_ignore_ascii_case("true")),
        "Integer" => SettingValue::Int(raw.trim().parse().unwrap_or(0)),
        "Long" => SettingValue::Long(raw.trim().parse().unwrap_or(0)),
        "Float" => SettingValue::Float(raw.trim().parse().unwrap_or(0.0)),
        other => {
            return Err(TkConfigError::ParseError(format!(
                "unknown type {} for key {}",
                other, key
            )))
        }
    };
    Ok((key.to_string(), value))
}

fn check_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(TkConfigError::InvalidConfiguration(
            "File name missing".to_string(),
        ));
    }
    Ok(())
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    #[test]
    fn test_backup_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("backup.txt");

        let mut store = MemorySettings::new();
        store.put_string("command_0_cmd", "speed?password? ?speed?").unwrap();
        store.put_string("command_0_desc", "line one\nline two \\ end").unwrap();
        store.put_int("commands", 1).unwrap();
        store.put_long("history_0_dateTime", 1_700_000_000_123).unwrap();
        store.put_bool("contact_0_selected", true).unwrap();
        store.put("ratio", SettingValue::Float(0.5)).unwrap();

        assert_eq!(backup_to_file(&store, &path).unwrap(), 6);

        let mut restored = MemorySettings::new();
        assert_eq!(restore_from_file(&mut restored, &path).unwrap(), 6);
        assert_eq!(restored.entries().unwrap(), store.entries().unwrap());
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("speed:String:080").ok(),
            Some(("speed".to_string(), SettingValue::String("080".to_string())))
        );
        assert_eq!(
            parse_line("url:String:http://host:80").ok(),
            Some(("url".to_string(), SettingValue::String("http://host:80".to_string())))
        );
        assert_eq!(
            parse_line("contacts:lang.Integer:2").ok(),
            Some(("contacts".to_string(), SettingValue::Int(2)))
        );
        assert_eq!(
            parse_line("contact_0_selected:Boolean:TRUE").ok(),
            Some(("contact_0_selected".to_string(), SettingValue::Bool(true)))
        );
        assert_eq!(
            parse_line("commands:Integer:abc").ok(),
            Some(("commands".to_string(), SettingValue::Int(0)))
        );
    }

    #[test]
    fn test_parse_line_errors() {
        for line in ["", "no separators", "key:String", ":String:value", "key:Unknown:value"] {
            let err = parse_line(line).unwrap_err();
            assert!(matches!(err, TkConfigError::ParseError(_)), "{}", line);
        }
    }

    #[test]
    fn test_qualified_type_keeps_backslashes() {
        assert_eq!(
            parse_line(r"path:java.lang.String:a\b\\c").ok(),
            Some(("path".to_string(), SettingValue::String(r"a\b\\c".to_string())))
        );
        assert_eq!(
            parse_line(r"path:String:a\\b\nc").ok(),
            Some(("path".to_string(), SettingValue::String("a\\b\nc".to_string())))
        );
    }

    #[test]
    fn test_restore_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemorySettings::new();
        let err = restore_from_file(&mut store, &dir.path().join("none.txt")).unwrap_err();
        assert!(matches!(err, TkConfigError::NotFound { .. }));
    }

    #[test]
    fn test_empty_path_rejected() {
        let store = MemorySettings::new();
        let err = backup_to_file(&store, Path::new("")).unwrap_err();
        assert!(matches!(err, TkConfigError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_restore_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.txt");
        fs::write(&path, "speed:String:100\r\ngarbage\n\n").unwrap();

        let mut store = MemorySettings::new();
        store.put_string("apn-name", "internet").unwrap();
        store.put_string("speed", "080").unwrap();

        assert_eq!(restore_from_file(&mut store, &path).unwrap(), 1);
        assert_eq!(store.get_string("speed", "").unwrap(), "100");
        assert_eq!(store.get_string("apn-name", "").unwrap(), "internet");
    }
}
