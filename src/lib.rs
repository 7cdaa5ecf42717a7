//! Renombrar: BERT checkpoint name and shape converter.
//!
//! Rewrites the variable names of a pretrained BERT checkpoint from the
//! original `bert/...` layout to one of two newer conventions, optionally
//! splitting attention projection weights per head, and writes the result as
//! a new SafeTensors checkpoint.
//!
//! # Example
//!
//! ```no_run
//! use renombrar::checkpoint::{SafeTensorsReader, SafeTensorsWriter};
//! use renombrar::convert::{ConvertOptions, Converter};
//! use renombrar::reshape::HeadCount;
//! use renombrar::rules::RuleSet;
//!
//! let converter = Converter::new(
//!     ConvertOptions::new()
//!         .with_rule_set(RuleSet::V2)
//!         .with_num_heads(HeadCount::from_flag(12)),
//! );
//! let reader = SafeTensorsReader::open("pretrained/bert_model.ckpt")?;
//! let mut writer = SafeTensorsWriter::create("converted/bert_model");
//! let summary = converter.run(&reader, &mut writer)?;
//! println!("Converted {} variable name(s).", summary.converted);
//! # Ok::<(), renombrar::Error>(())
//! ```

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod filter;
pub mod reshape;
pub mod rules;

pub use error::{Error, Result};
