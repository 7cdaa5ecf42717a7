//! Property-based tests for CLI argument parsing

use super::*;
use proptest::prelude::*;

// Strategy for checkpoint paths and prefixes
fn checkpoint_path_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_/.-]{0,30}"
}

// Strategy for exclusion pattern lists
fn pattern_list_strategy() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z_/]{1,12}", 1..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_convert_paths_parse(from in checkpoint_path_strategy(), to in checkpoint_path_strategy()) {
        let result = parse_args([
            "renombrar", "convert",
            "--checkpoint-from-path", &from,
            "--checkpoint-to-path", &to,
        ]);
        prop_assert!(result.is_ok());
        match result.unwrap().command {
            Command::Convert(args) => {
                let from_path = args.checkpoint_from_path.expect("source path parsed");
                let to_path = args.checkpoint_to_path.expect("destination path parsed");
                prop_assert_eq!(from_path.to_str(), Some(from.as_str()));
                prop_assert_eq!(to_path.to_str(), Some(to.as_str()));
            }
            _ => prop_assert!(false, "Expected Convert command"),
        }
    }

    #[test]
    fn prop_num_heads_any_integer(heads in -64i64..1024) {
        let heads_str = heads.to_string();
        let result = parse_args(["renombrar", "convert", "--num-heads", &heads_str]);
        prop_assert!(result.is_ok());
        match result.unwrap().command {
            Command::Convert(args) => prop_assert_eq!(args.rules.num_heads, Some(heads)),
            _ => prop_assert!(false, "Expected Convert command"),
        }
    }

    #[test]
    fn prop_exclude_patterns_round_trip(patterns in pattern_list_strategy()) {
        let joined = patterns.join(",");
        let cli = parse_args(["renombrar", "convert", "--exclude-patterns", &joined]).unwrap();
        let Command::Convert(args) = cli.command else {
            return Err(TestCaseError::fail("Expected Convert command"));
        };

        let mut spec = crate::config::ConvertSpec::default();
        apply_rule_overrides(&mut spec, &args.rules);
        prop_assert_eq!(spec.exclude_patterns.patterns(), patterns.as_slice());
    }

    #[test]
    fn prop_non_positive_heads_disable_reshape(heads in -64i64..=0) {
        let heads_str = heads.to_string();
        let cli = parse_args(["renombrar", "verify", "a", "b", "--num-heads", &heads_str]).unwrap();
        let Command::Verify(args) = cli.command else {
            return Err(TestCaseError::fail("Expected Verify command"));
        };

        let mut spec = crate::config::ConvertSpec::default();
        apply_rule_overrides(&mut spec, &args.rules);
        prop_assert!(!spec.num_heads.is_enabled());
    }
}
