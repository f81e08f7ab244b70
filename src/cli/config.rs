//! `trove config` command
//!
//! Get or set configuration values.
//!
//! # Usage
//! ```bash
//! trove config                                # Show all config
//! trove config user.name                      # Get specific value
//! trove config trust.told_base 0.55           # Set value
//! trove config decay.category_rates.event 0.4 # Nested tables work too
//! trove config --path                         # Show config locations
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use toml_edit::DocumentMut;

use crate::config::{Config, DATA_DIR};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config key (e.g., user.name, recall.noise_floor)
    pub key: Option<String>,

    /// Value to set
    pub value: Option<String>,

    /// List all config values
    #[arg(long)]
    pub list: bool,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Use global config (~/.trove/config.toml) instead of local
    #[arg(short, long)]
    pub global: bool,
}

fn get_config_path(global: bool) -> PathBuf {
    if global {
        Config::global_config_path().unwrap_or_else(|| PathBuf::from(DATA_DIR).join("config.toml"))
    } else {
        Config::find_local_config().unwrap_or_else(|| PathBuf::from(DATA_DIR).join("config.toml"))
    }
}

pub fn run(args: ConfigArgs, explicit: Option<&Path>) -> Result<()> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => get_config_path(args.global),
    };

    if args.path {
        println!("Global: {}", get_config_path(true).display());
        println!("Local:  {}", get_config_path(false).display());
        println!();
        if config_path.exists() {
            println!("✓ Active: {}", config_path.display());
        } else {
            println!("⚠ No config file found at {}", config_path.display());
        }
        return Ok(());
    }

    if args.list || args.key.is_none() {
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            println!("📋 Configuration ({}):\n", config_path.display());
            println!("{}", content);
        } else {
            println!("📋 No config file at {}; defaults apply:\n", config_path.display());
            println!("{}", toml::to_string_pretty(&Config::default())?);
        }
        return Ok(());
    }

    if let Some(key) = &args.key {
        if let Some(value) = &args.value {
            set_config_value(&config_path, key, value)?;
            println!("✅ Set {} = {} (in {})", key, value, config_path.display());
        } else {
            match get_config_value(&config_path, key)? {
                Some(v) => println!("{}", v),
                None => println!("(not set)"),
            }
        }
    }

    Ok(())
}

/// Set a nested config value using dot notation (e.g., "decay.hot_days")
fn set_config_value(path: &Path, key: &str, val: &str) -> Result<()> {
    let content = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };

    let mut doc: DocumentMut = content.parse().context("Failed to parse config.toml")?;

    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((last, sections)) = parts.split_last() else {
        anyhow::bail!("Empty config key");
    };

    let mut table = doc.as_table_mut();
    for section in sections {
        table = table
            .entry(section)
            .or_insert(toml_edit::table())
            .as_table_mut()
            .with_context(|| format!("{} is not a section", section))?;
    }
    table[*last] = toml_edit::value(parse_toml_value(val));

    // Reject values the config cannot load, before touching the file
    let updated = doc.to_string();
    toml::from_str::<Config>(&updated).with_context(|| format!("Invalid value for {}", key))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, updated)?;
    Ok(())
}

/// Get a config value by dot notation key
fn get_config_value(path: &Path, key: &str) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let doc = toml::Value::Table(toml::from_str(&content).context("Failed to parse config.toml")?);

    let val = key
        .split('.')
        .try_fold(&doc, |node, part| node.get(part));

    Ok(val.map(|v| match v {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }))
}

/// Parse string value to appropriate TOML type
fn parse_toml_value(s: &str) -> toml_edit::Value {
    if let Ok(b) = s.parse::<bool>() {
        return b.into();
    }
    if let Ok(i) = s.parse::<i64>() {
        return i.into();
    }
    if let Ok(f) = s.parse::<f64>() {
        return f.into();
    }
    s.into()
}
