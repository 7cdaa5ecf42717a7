//! YAML conversion settings.
//!
//! ```yaml
//! checkpoint_from_path: pretrained/bert_model.ckpt
//! checkpoint_to_path: converted/bert_model
//! exclude_patterns: [adam_m, adam_v, global_step]
//! num_heads: 12
//! use_v2_names: false
//! strict: false
//! overwrite_source: false
//! ```

use crate::checkpoint::{resolve_destination, resolve_source};
use crate::convert::{CollisionPolicy, ConvertOptions};
use crate::filter::ExclusionFilter;
use crate::reshape::HeadCount;
use crate::rules::RuleSet;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for one conversion, from a config file and/or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertSpec {
    /// Source checkpoint path or prefix
    pub checkpoint_from_path: Option<PathBuf>,
    /// Destination checkpoint path or prefix
    pub checkpoint_to_path: Option<PathBuf>,
    /// Substrings of variable names to drop
    pub exclude_patterns: ExclusionFilter,
    /// Attention head count; `<= 0` disables reshaping
    pub num_heads: HeadCount,
    /// Rewrite into the v2 naming convention
    pub use_v2_names: bool,
    /// Treat destination name collisions as errors
    pub strict: bool,
    /// Allow the destination file to be the source file
    pub overwrite_source: bool,
}

/// Source and destination after merging file and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointPaths {
    /// Source checkpoint path or prefix
    pub from: PathBuf,
    /// Destination checkpoint path or prefix
    pub to: PathBuf,
}

impl ConvertSpec {
    /// Rule set selected by `use_v2_names`.
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::from_v2_flag(self.use_v2_names)
    }

    /// Converter options for these settings.
    pub fn options(&self) -> ConvertOptions {
        ConvertOptions::new()
            .with_rule_set(self.rule_set())
            .with_exclude(self.exclude_patterns.clone())
            .with_num_heads(self.num_heads)
            .with_collisions(if self.strict { CollisionPolicy::Error } else { CollisionPolicy::Overwrite })
    }

    /// Require both checkpoint paths.
    ///
    /// # Errors
    ///
    /// [`Error::MissingArgument`] naming the first absent path and
    /// [`Error::ConfigValue`] when the destination file is the existing
    /// source file and `overwrite_source` is not set.
    pub fn paths(&self) -> Result<CheckpointPaths> {
        let from = self
            .checkpoint_from_path
            .clone()
            .ok_or_else(|| Error::MissingArgument { field: "checkpoint_from_path".into() })?;
        let to = self
            .checkpoint_to_path
            .clone()
            .ok_or_else(|| Error::MissingArgument { field: "checkpoint_to_path".into() })?;

        if !self.overwrite_source && writes_over_source(&from, &to) {
            return Err(Error::ConfigValue {
                field: "checkpoint_to_path".into(),
                message: format!("{} is also the source checkpoint", to.display()),
                suggestion: "Write to a different path, or pass --overwrite-source".into(),
            });
        }

        Ok(CheckpointPaths { from, to })
    }
}

/// True when `to` resolves to the file that `from` would be read from.
///
/// A missing source or destination never matches; the reader reports a
/// missing source itself.
fn writes_over_source(from: &Path, to: &Path) -> bool {
    let Ok(source) = resolve_source(from) else {
        return false;
    };
    match (fs::canonicalize(source), fs::canonicalize(resolve_destination(to))) {
        (Ok(source), Ok(destination)) => source == destination,
        _ => false,
    }
}

/// Load conversion settings from a YAML file.
pub fn load_spec<P: AsRef<Path>>(path: P) -> Result<ConvertSpec> {
    let path = path.as_ref();
    let yaml = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("reading config file {}", path.display()), e))?;

    serde_yaml::from_str(&yaml)
        .map_err(|e| Error::ConfigParsing { path: path.to_path_buf(), message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r#"
checkpoint_from_path: pretrained/bert_model.ckpt
checkpoint_to_path: converted/bert_model
exclude_patterns: [adam_m, adam_v]
num_heads: 12
use_v2_names: true
strict: true
overwrite_source: true
"#;
        let spec: ConvertSpec = serde_yaml::from_str(yaml).expect("parse should succeed");

        assert_eq!(spec.checkpoint_from_path, Some(PathBuf::from("pretrained/bert_model.ckpt")));
        assert_eq!(spec.exclude_patterns.patterns(), &["adam_m".to_string(), "adam_v".to_string()]);
        assert_eq!(spec.num_heads, HeadCount::from_flag(12));
        assert_eq!(spec.rule_set(), RuleSet::V2);
        assert!(spec.overwrite_source);

        let options = spec.options();
        assert_eq!(options.collisions, CollisionPolicy::Error);
        assert!(options.exclude.is_excluded("layer/kernel/adam_m"));
    }

    #[test]
    fn test_defaults() {
        let spec: ConvertSpec = serde_yaml::from_str("{}").expect("parse should succeed");
        assert_eq!(spec, ConvertSpec::default());
        assert!(!spec.num_heads.is_enabled());
        assert_eq!(spec.options(), ConvertOptions::default());
    }

    #[test]
    fn test_empty_yaml_pattern_is_ignored() {
        let spec: ConvertSpec = serde_yaml::from_str("exclude_patterns: ['', pooler]").expect("parse should succeed");
        let options = spec.options();
        assert_eq!(options.exclude.patterns(), &["pooler".to_string()]);
        assert!(!options.exclude.is_excluded("bert/embeddings/word_embeddings"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: std::result::Result<ConvertSpec, _> = serde_yaml::from_str("num_head: 12");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_source_path() {
        let spec = ConvertSpec { checkpoint_to_path: Some("out".into()), ..ConvertSpec::default() };
        let err = spec.paths().unwrap_err();
        assert!(matches!(err, Error::MissingArgument { ref field } if field == "checkpoint_from_path"));
    }

    #[test]
    fn test_missing_destination_path() {
        let spec = ConvertSpec { checkpoint_from_path: Some("in".into()), ..ConvertSpec::default() };
        let err = spec.paths().unwrap_err();
        assert!(matches!(err, Error::MissingArgument { ref field } if field == "checkpoint_to_path"));
    }

    fn touch(path: &Path) {
        fs::write(path, b"x").expect("write should succeed");
    }

    fn spec_for(from: PathBuf, to: PathBuf) -> ConvertSpec {
        ConvertSpec { checkpoint_from_path: Some(from), checkpoint_to_path: Some(to), ..ConvertSpec::default() }
    }

    #[test]
    fn test_extensionless_source_with_suffixed_destination_allowed() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        touch(&dir.path().join("model"));

        let spec = spec_for(dir.path().join("model"), dir.path().join("model.safetensors"));
        let paths = spec.paths().expect("distinct files are allowed");
        assert_eq!(paths.to, dir.path().join("model.safetensors"));
    }

    #[test]
    fn test_prefix_resolving_to_destination_rejected() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        touch(&dir.path().join("bert.ckpt.safetensors"));

        let spec = spec_for(dir.path().join("bert.ckpt"), dir.path().join("bert.ckpt.safetensors"));
        let err = spec.paths().unwrap_err();
        assert!(matches!(err, Error::ConfigValue { ref field, .. } if field == "checkpoint_to_path"));

        let spec = ConvertSpec { overwrite_source: true, ..spec };
        assert!(spec.paths().is_ok());
    }

    #[test]
    fn test_same_file_through_relative_segments_rejected() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        fs::create_dir(dir.path().join("sub")).expect("mkdir should succeed");
        touch(&dir.path().join("model.safetensors"));

        let spec = spec_for(dir.path().join("model"), dir.path().join("sub/../model.safetensors"));
        assert!(matches!(spec.paths().unwrap_err(), Error::ConfigValue { .. }));
    }

    #[test]
    fn test_missing_source_is_left_to_reader() {
        let spec = spec_for("ckpt/model".into(), "ckpt/model.safetensors".into());
        assert!(spec.paths().is_ok());
    }

    #[test]
    fn test_load_spec_from_file() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let path = dir.path().join("convert.yaml");
        fs::write(&path, "checkpoint_from_path: a\ncheckpoint_to_path: b\nnum_heads: 4\n")
            .expect("write should succeed");

        let spec = load_spec(&path).expect("load should succeed");
        let paths = spec.paths().expect("paths present");
        assert_eq!(paths.from, PathBuf::from("a"));
        assert_eq!(paths.to, PathBuf::from("b"));
        assert_eq!(spec.num_heads, HeadCount::from_flag(4));
    }

    #[test]
    fn test_load_spec_bad_yaml() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let path = dir.path().join("convert.yaml");
        fs::write(&path, "num_heads: [not, a, number").expect("write should succeed");

        let err = load_spec(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigParsing { .. }));
    }

    #[test]
    fn test_load_spec_missing_file() {
        let err = load_spec("/definitely/not/here/convert.yaml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
