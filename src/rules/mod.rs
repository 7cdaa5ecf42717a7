//! Substring rewrite tables for BERT variable names.
//!
//! Two fixed tables exist. [`RuleSet::V1`] produces the `bert_model/...`
//! layout with an `embedding_postprocessor` sub-scope; [`RuleSet::V2`]
//! drops the `bert/` prefix and renames `encoder` to `transformer`.
//! Order matters: rules are applied one after another to the name produced
//! by the previous rule.

mod rewriter;

pub use rewriter::{NameRewriter, Rewrite};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single find/replace-all rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RewriteRule {
    /// Substring searched for in the current name
    pub source_pattern: &'static str,
    /// Replacement for every occurrence of `source_pattern`
    pub target_pattern: &'static str,
}

impl RewriteRule {
    const fn new(source_pattern: &'static str, target_pattern: &'static str) -> Self {
        Self { source_pattern, target_pattern }
    }
}

impl fmt::Display for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.source_pattern, self.target_pattern)
    }
}

const V1_RULES: &[RewriteRule] = &[
    RewriteRule::new("bert", "bert_model"),
    RewriteRule::new("embeddings/word_embeddings", "word_embeddings/embeddings"),
    RewriteRule::new("embeddings/token_type_embeddings", "embedding_postprocessor/type_embeddings"),
    RewriteRule::new("embeddings/position_embeddings", "embedding_postprocessor/position_embeddings"),
    RewriteRule::new("embeddings/LayerNorm", "embedding_postprocessor/layer_norm"),
    RewriteRule::new("attention/self", "self_attention"),
    RewriteRule::new("attention/output/dense", "self_attention_output"),
    RewriteRule::new("attention/output/LayerNorm", "self_attention_layer_norm"),
    RewriteRule::new("intermediate/dense", "intermediate"),
    RewriteRule::new("output/dense", "output"),
    RewriteRule::new("output/LayerNorm", "output_layer_norm"),
    RewriteRule::new("pooler/dense", "pooler_transform"),
];

const V2_RULES: &[RewriteRule] = &[
    RewriteRule::new("bert/", ""),
    RewriteRule::new("encoder", "transformer"),
    RewriteRule::new("embeddings/word_embeddings", "word_embeddings/embeddings"),
    RewriteRule::new("embeddings/token_type_embeddings", "type_embeddings/embeddings"),
    RewriteRule::new("embeddings/position_embeddings", "position_embedding/embeddings"),
    RewriteRule::new("embeddings/LayerNorm", "embeddings/layer_norm"),
    RewriteRule::new("attention/self", "self_attention"),
    RewriteRule::new("attention/output/dense", "self_attention_output"),
    RewriteRule::new("attention/output/LayerNorm", "self_attention_layer_norm"),
    RewriteRule::new("intermediate/dense", "intermediate"),
    RewriteRule::new("output/dense", "output"),
    RewriteRule::new("output/LayerNorm", "output_layer_norm"),
    RewriteRule::new("pooler/dense", "pooler_transform"),
];

/// Which naming convention to rewrite into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSet {
    /// `bert_model/...` names (default)
    #[default]
    V1,
    /// Prefix-less `transformer/...` names
    V2,
}

impl RuleSet {
    /// Select the table from the `use_v2_names` flag.
    pub fn from_v2_flag(use_v2_names: bool) -> Self {
        if use_v2_names {
            Self::V2
        } else {
            Self::V1
        }
    }

    /// Rules of this set in application order.
    pub fn rules(self) -> &'static [RewriteRule] {
        match self {
            Self::V1 => V1_RULES,
            Self::V2 => V2_RULES,
        }
    }

    /// Short identifier ("v1" / "v2").
    pub fn name(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
