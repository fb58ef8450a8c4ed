//! 配置文件读写：首次运行生成带注释的默认配置，之后将用户配置合并到默认值之上。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid yaml at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMeta {
    pub name: &'static str,
    pub description: &'static str,
}

/// A config type that can be persisted as a commented YAML file.
pub trait ConfigSpec: Serialize + DeserializeOwned + Default {
    const FILE_NAME: &'static str;
    fn fields() -> &'static [FieldMeta];
}

/// Loads `FILE_NAME` from `base_dir` (or the working directory).
///
/// A missing file is created from `T::default()`. An existing file is layered
/// over the defaults, and rewritten when it lacks any known field so that new
/// options show up with their descriptions.
pub fn load_or_create<T: ConfigSpec>(base_dir: Option<&Path>) -> Result<T, ConfigError> {
    let path = resolve_path::<T>(base_dir);
    ensure_parent(&path)?;

    if !path.exists() {
        let config = T::default();
        write_with_comments(&config, &path)?;
        return Ok(config);
    }

    let user_yaml = read_yaml(&path)?;
    let complete = has_all_fields::<T>(&user_yaml);

    let mut merged = serde_yaml::to_value(T::default()).map_err(validation)?;
    merge_values(&mut merged, user_yaml);
    let config: T = serde_yaml::from_value(merged).map_err(validation)?;

    if !complete {
        write_with_comments(&config, &path)?;
    }
    Ok(config)
}

pub fn write_with_comments<T: ConfigSpec>(config: &T, path: &Path) -> Result<(), ConfigError> {
    ensure_parent(path)?;
    let yaml = generate_yaml_with_comments(config)?;
    fs::write(path, yaml).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn generate_yaml_with_comments<T: ConfigSpec>(config: &T) -> Result<String, ConfigError> {
    let Value::Mapping(mapping) = serde_yaml::to_value(config).map_err(validation)? else {
        return Err(ConfigError::Validation(
            "config must serialize to a mapping".to_string(),
        ));
    };

    let mut lines = Vec::with_capacity(T::fields().len() * 2);
    for field in T::fields() {
        if !field.description.is_empty() {
            lines.push(format!("# {}", field.description.replace('\n', "\n# ")));
        }
        let key = Value::String(field.name.to_string());
        let val = mapping.get(&key).cloned().unwrap_or(Value::Null);
        let entry = serde_yaml::to_string(&Mapping::from_iter([(key, val)])).map_err(validation)?;
        lines.push(entry.trim().to_string());
    }

    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

fn read_yaml(path: &Path) -> Result<Value, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn has_all_fields<T: ConfigSpec>(user_yaml: &Value) -> bool {
    let Value::Mapping(map) = user_yaml else {
        return false;
    };
    T::fields()
        .iter()
        .all(|field| map.contains_key(Value::String(field.name.to_string())))
}

fn merge_values(default: &mut Value, user: Value) {
    match (default, user) {
        (Value::Mapping(dest), Value::Mapping(src)) => {
            for (key, user_val) in src {
                match dest.get_mut(&key) {
                    Some(dest_val) => merge_values(dest_val, user_val),
                    None => {
                        dest.insert(key, user_val);
                    }
                }
            }
        }
        // An empty document parses as null; keep the defaults in that case.
        (_, Value::Null) => {}
        (dest, other) => *dest = other,
    }
}

fn resolve_path<T: ConfigSpec>(base_dir: Option<&Path>) -> PathBuf {
    match base_dir {
        Some(base) => base.join(T::FILE_NAME),
        None => PathBuf::from(T::FILE_NAME),
    }
}

fn ensure_parent(path: &Path) -> Result<(), ConfigError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn validation(err: serde_yaml::Error) -> ConfigError {
    ConfigError::Validation(err.to_string())
}
