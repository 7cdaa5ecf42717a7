//! Verify command implementation

use crate::checkpoint::SafeTensorsReader;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_rule_overrides, load_spec, ConvertSpec, OutputFormat, VerifyArgs};
use crate::convert::Converter;
use crate::{Error, Result};

pub fn run_verify(args: VerifyArgs, level: LogLevel) -> Result<()> {
    let mut spec = match &args.config {
        Some(path) => load_spec(path)?,
        None => ConvertSpec::default(),
    };
    apply_rule_overrides(&mut spec, &args.rules);
    let converter = Converter::new(spec.options());

    let source = SafeTensorsReader::open(&args.source)?;
    let converted = SafeTensorsReader::open(&args.converted)?;
    let report = converter.verify(&source, &converted)?;

    let output = match args.format {
        OutputFormat::Text => report.to_report().trim_end().to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(&report)
            .map_err(|e| Error::io("serializing verification report", e.into()))?,
    };
    log(level, LogLevel::Normal, &output);

    if report.passed() {
        Ok(())
    } else {
        Err(Error::VerificationFailed { failures: report.issues.len() })
    }
}
