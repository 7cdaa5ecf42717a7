//! CLI command tests

use super::*;
use crate::checkpoint::{CheckpointReader, CheckpointWriter, SafeTensorsReader, SafeTensorsWriter, Tensor};
use crate::config::parse_args;
use crate::Error;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_source(dir: &TempDir) -> PathBuf {
    let mut tensors = BTreeMap::new();
    tensors.insert(
        "bert/encoder/layer_0/attention/self/query/kernel".to_string(),
        Tensor::from_f32(vec![4, 4], (0..16).map(|v| v as f32).collect()),
    );
    tensors.insert(
        "bert/encoder/layer_0/attention/self/query/bias".to_string(),
        Tensor::from_f32(vec![4], vec![0.0; 4]),
    );
    tensors.insert("bert/pooler/dense/bias".to_string(), Tensor::from_f32(vec![4], vec![1.0; 4]));

    let path = dir.path().join("bert_model.ckpt");
    let mut writer = SafeTensorsWriter::create(&path);
    writer.write_all(&tensors).expect("write should succeed");
    path
}

fn run(args: &[&str]) -> crate::Result<()> {
    let mut argv = vec!["renombrar", "--quiet"];
    argv.extend_from_slice(args);
    run_command(parse_args(argv).expect("parse should succeed"))
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

#[test]
fn test_convert_writes_destination() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir);
    let dest = dir.path().join("out/converted");

    run(&[
        "convert",
        "--checkpoint-from-path",
        path_str(&source),
        "--checkpoint-to-path",
        path_str(&dest),
        "--num-heads",
        "2",
        "--exclude-patterns",
        "pooler",
    ])
    .unwrap();

    let reader = SafeTensorsReader::open(dir.path().join("out/converted.safetensors")).unwrap();
    let shapes = reader.list_names_and_shapes().unwrap();
    assert_eq!(shapes.len(), 2);
    assert_eq!(shapes["bert_model/encoder/layer_0/self_attention/query/kernel"], vec![4, 2, 2]);
    assert_eq!(shapes["bert_model/encoder/layer_0/self_attention/query/bias"], vec![2, 2]);
}

#[test]
fn test_convert_missing_source_flag() {
    let err = run(&["convert", "--checkpoint-to-path", "out"]).unwrap_err();
    assert!(matches!(err, Error::MissingArgument { ref field } if field == "checkpoint_from_path"));
}

#[test]
fn test_convert_missing_source_file() {
    let dir = TempDir::new().unwrap();
    let err = run(&[
        "convert",
        "--checkpoint-from-path",
        path_str(&dir.path().join("nope")),
        "--checkpoint-to-path",
        path_str(&dir.path().join("out")),
    ])
    .unwrap_err();
    assert!(matches!(err, Error::CheckpointNotFound { .. }));
}

#[test]
fn test_convert_from_config_file() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir);
    let dest = dir.path().join("from_yaml");
    let config = dir.path().join("convert.yaml");
    std::fs::write(
        &config,
        format!(
            "checkpoint_from_path: {}\ncheckpoint_to_path: {}\nuse_v2_names: true\n",
            source.display(),
            dest.display()
        ),
    )
    .unwrap();

    run(&["convert", "--config", path_str(&config)]).unwrap();

    let reader = SafeTensorsReader::open(&dest).unwrap();
    let shapes = reader.list_names_and_shapes().unwrap();
    assert!(shapes.contains_key("transformer/layer_0/self_attention/query/kernel"));
    assert!(shapes.contains_key("pooler_transform/bias"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir);
    let dest = dir.path().join("dry");

    run(&[
        "convert",
        "--checkpoint-from-path",
        path_str(&source),
        "--checkpoint-to-path",
        path_str(&dest),
        "--dry-run",
    ])
    .unwrap();

    assert!(!dir.path().join("dry.safetensors").exists());
}

#[test]
fn test_audit_json_written() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir);
    let audit = dir.path().join("audit.json");

    run(&[
        "convert",
        "--checkpoint-from-path",
        path_str(&source),
        "--checkpoint-to-path",
        path_str(&dir.path().join("out")),
        "--audit-json",
        path_str(&audit),
        "--exclude-patterns",
        "pooler",
    ])
    .unwrap();

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&audit).unwrap()).unwrap();
    assert_eq!(json["converted"], 2);
    assert_eq!(
        json["renamed"]["bert/encoder/layer_0/attention/self/query/bias"],
        "bert_model/encoder/layer_0/self_attention/query/bias"
    );
    assert_eq!(json["excluded"][0], "bert/pooler/dense/bias");
}

#[test]
fn test_dry_run_audit_json_holds_plan() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir);
    let audit = dir.path().join("plan.json");

    run(&[
        "convert",
        "--checkpoint-from-path",
        path_str(&source),
        "--checkpoint-to-path",
        path_str(&dir.path().join("planned")),
        "--num-heads",
        "2",
        "--dry-run",
        "--audit-json",
        path_str(&audit),
    ])
    .unwrap();

    assert!(!dir.path().join("planned.safetensors").exists());
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&audit).unwrap()).unwrap();
    let kernel = &json["variables"]["bert_model/encoder/layer_0/self_attention/query/kernel"];
    assert_eq!(kernel["source"], "bert/encoder/layer_0/attention/self/query/kernel");
    assert_eq!(kernel["new_shape"], serde_json::json!([4, 2, 2]));
    assert_eq!(json["renamed"]["bert/pooler/dense/bias"], "bert_model/pooler_transform/bias");
}

#[test]
fn test_overwrite_source_requires_flag() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir);
    let before = std::fs::read(&source).unwrap();
    let args = ["convert", "--checkpoint-from-path", path_str(&source), "--checkpoint-to-path", path_str(&source)];

    let err = run(&args).unwrap_err();
    assert!(matches!(err, Error::ConfigValue { .. }));
    assert_eq!(std::fs::read(&source).unwrap(), before);

    let mut forced = args.to_vec();
    forced.push("--overwrite-source");
    run(&forced).unwrap();

    let shapes = SafeTensorsReader::open(&source).unwrap().list_names_and_shapes().unwrap();
    assert!(shapes.contains_key("bert_model/pooler_transform/bias"));
    assert!(shapes.keys().all(|k| !k.starts_with("bert/")));
}

#[test]
fn test_verify_after_convert() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir);
    let dest = dir.path().join("verified");
    let common = ["--num-heads", "2"];

    let mut convert = vec![
        "convert",
        "--checkpoint-from-path",
        path_str(&source),
        "--checkpoint-to-path",
        path_str(&dest),
    ];
    convert.extend_from_slice(&common);
    run(&convert).unwrap();

    let mut verify = vec!["verify", path_str(&source), path_str(&dest)];
    verify.extend_from_slice(&common);
    run(&verify).unwrap();

    let err = run(&["verify", path_str(&source), path_str(&dest)]).unwrap_err();
    assert!(matches!(err, Error::VerificationFailed { failures: 2 }));
}

#[test]
fn test_rules_command() {
    run(&["rules"]).unwrap();
    run(&["rules", "--use-v2-names"]).unwrap();
    assert!(rules::format_rules(crate::rules::RuleSet::V2).starts_with("Rule set v2 (13 rules"));
}

#[test]
fn test_format_plan() {
    use crate::convert::{ConversionPlan, PlannedVariable};

    let mut plan = ConversionPlan::default();
    plan.variables.insert(
        "t/query/bias".into(),
        PlannedVariable {
            source: "s/attention/self/query/bias".into(),
            target: "t/query/bias".into(),
            shape: vec![8],
            new_shape: Some(vec![2, 4]),
        },
    );
    plan.excluded.push("cls/bias".into());

    let text = convert::format_plan(&plan);
    assert!(text.starts_with("Dry run: 1 variable(s) would be written, 1 reshaped, 1 excluded."));
    assert!(text.contains("s/attention/self/query/bias --> t/query/bias  [8] -> [2, 4]"));
}
