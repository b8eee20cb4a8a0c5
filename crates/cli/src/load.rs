use anyhow::{Result, Context};
use serde_json::Value as Json;
use std::path::{Path, PathBuf};
use tfguard_core::{collect_resources, ResourceBlock};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const SKIP_DIRS: &[&str] = &[".terraform", ".terragrunt-cache", ".git"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format { Hcl, Json, Yaml }

fn format_of(path: &Path) -> Option<Format> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with(".tf") {
        Some(Format::Hcl)
    } else if name.ends_with(".json") {
        Some(Format::Json)
    } else if name.ends_with(".yaml") || name.ends_with(".yml") {
        Some(Format::Yaml)
    } else {
        None
    }
}

/// A file to load. `walked` files were found under a directory rather than named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub path: PathBuf,
    pub walked: bool,
}

/// Expands directories into the config files below them, sorted by path. Files named
/// explicitly are passed through as-is; an unsupported extension fails later in
/// [`parse_file`].
pub fn discover(paths: &[PathBuf]) -> Result<Vec<Input>> {
    let mut out = Vec::new();
    for p in paths {
        if !p.is_dir() {
            out.push(Input { path: p.clone(), walked: false });
            continue;
        }
        let walker = WalkDir::new(p)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && SKIP_DIRS.iter().any(|d| e.file_name() == *d)));
        for entry in walker {
            let entry = entry.with_context(|| format!("walk {}", p.display()))?;
            if entry.file_type().is_file() && format_of(entry.path()).is_some() {
                out.push(Input { path: entry.into_path(), walked: true });
            }
        }
    }
    Ok(out)
}

pub fn parse_file(path: &Path) -> Result<Json> {
    let format = format_of(path)
        .with_context(|| format!("unsupported file type: {}", path.display()))?;
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    let doc = match format {
        Format::Hcl => hcl::from_str(&src).with_context(|| format!("parse HCL {}", path.display()))?,
        Format::Json => serde_json::from_str(&src).with_context(|| format!("parse JSON {}", path.display()))?,
        Format::Yaml => serde_yaml::from_str(&src).with_context(|| format!("parse YAML {}", path.display()))?,
    };
    Ok(doc)
}

fn load_file(file: &Path) -> Result<Vec<ResourceBlock>> {
    let doc = parse_file(file)?;
    let blocks = collect_resources(&doc, Some(file))
        .with_context(|| format!("collect resources from {}", file.display()))?;
    Ok(blocks)
}

/// Loads every input. A file named on the command line that cannot be loaded is an
/// error; one found by walking a directory is skipped with a warning.
pub fn load_resources(paths: &[PathBuf]) -> Result<Vec<ResourceBlock>> {
    let mut out = Vec::new();
    for input in discover(paths)? {
        let blocks = match load_file(&input.path) {
            Ok(blocks) => blocks,
            Err(err) if input.walked => {
                warn!(file = %input.path.display(), error = %format!("{err:#}"), "skipping file");
                continue;
            }
            Err(err) => return Err(err),
        };
        debug!(file = %input.path.display(), resources = blocks.len(), "loaded");
        out.extend(blocks);
    }
    info!(resources = out.len(), "resources collected");
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_of() {
        assert_eq!(format_of(Path::new("main.tf")), Some(Format::Hcl));
        assert_eq!(format_of(Path::new("main.tf.json")), Some(Format::Json));
        assert_eq!(format_of(Path::new("x/plan.yml")), Some(Format::Yaml));
        assert_eq!(format_of(Path::new("README.md")), None);
        assert_eq!(format_of(Path::new("terraform.tfvars")), None);
    }

    #[test]
    fn test_named_file_with_unsupported_extension() {
        let inputs = discover(&[PathBuf::from("tests/fixtures/dynamic/README.md")]).unwrap();
        assert_eq!(
            inputs,
            vec![Input { path: PathBuf::from("tests/fixtures/dynamic/README.md"), walked: false }]
        );
        let err = parse_file(&inputs[0].path).unwrap_err();
        assert!(err.to_string().starts_with("unsupported file type"));
        assert!(load_resources(&[inputs[0].path.clone()]).is_err());
    }

    #[test]
    fn test_discover_marks_walked_files() {
        let inputs = discover(&[
            PathBuf::from("tests/fixtures/mixed"),
            PathBuf::from("tests/fixtures/bare.tf"),
        ])
        .unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|i| (i.path.file_name().unwrap().to_string_lossy().into_owned(), i.walked))
            .collect();
        assert_eq!(
            names,
            vec![
                ("bucket.tf".to_string(), true),
                ("list.json".to_string(), true),
                ("multi.yaml".to_string(), true),
                ("playbook.yml".to_string(), true),
                ("bare.tf".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_load_skips_walked_failures_only() {
        let blocks = load_resources(&[PathBuf::from("tests/fixtures/mixed")]).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].id().to_string(), "aws_s3_bucket.mixed");

        assert!(load_resources(&[PathBuf::from("tests/fixtures/mixed/multi.yaml")]).is_err());
    }
}
