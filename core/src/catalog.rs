use crate::types::CatalogItem;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read catalog items from a `.json` / `.jsonl` file or a directory of them.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogItem>> {
    let path = path.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        anyhow::bail!("catalog path {} does not exist", path.display());
    }

    let mut items = Vec::new();
    for file in files {
        if extension(&file) == Some("jsonl") {
            load_jsonl(&file, &mut items)?;
        } else {
            load_json(&file, &mut items)?;
        }
    }
    tracing::info!(path = %path.display(), items = items.len(), "catalog loaded");
    Ok(items)
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn load_jsonl(file: &Path, items: &mut Vec<CatalogItem>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item: CatalogItem =
            serde_json::from_str(&line).with_context(|| format!("{}:{}: invalid catalog item", file.display(), n + 1))?;
        items.push(item);
    }
    Ok(())
}

fn load_json(file: &Path, items: &mut Vec<CatalogItem>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    let json: serde_json::Value =
        serde_json::from_reader(reader).with_context(|| format!("{}: invalid JSON", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                items.push(serde_json::from_value(v).with_context(|| format!("{}: invalid catalog item", file.display()))?);
            }
        }
        serde_json::Value::Object(_) => {
            items.push(serde_json::from_value(json).with_context(|| format!("{}: invalid catalog item", file.display()))?);
        }
        _ => tracing::warn!(file = %file.display(), "ignoring JSON that is neither an object nor an array"),
    }
    Ok(())
}
