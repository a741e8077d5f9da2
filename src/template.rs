//! Command template validation and instantiation.
//!
//! A template is an ordinary shell command line carrying two placeholders:
//!
//! - `{{INPUT}}` - required exactly once; replaced with the absolute path of
//!   each input file
//! - `{{OUTPUT}}` - optional, at most once; replaced with the input's file
//!   name plus `.out` (a relative name, so the template decides where it
//!   lands, e.g. `gzip -c {{INPUT}} > archive/{{OUTPUT}}`)
//!
//! Placeholder arity is checked once, up front, so a bad template fails
//! before any job is built or run.

use crate::error::{MprunError, Result};
use std::path::Path;

/// The required input-path placeholder.
const INPUT_TOKEN: &str = "{{INPUT}}";

/// The optional output-name placeholder.
const OUTPUT_TOKEN: &str = "{{OUTPUT}}";

/// Suffix appended to the input file name to form the `{{OUTPUT}}` value.
const OUTPUT_SUFFIX: &str = ".out";

/// A validated command template.
///
/// Constructed through [`Template::parse`], which enforces placeholder
/// arity. Instantiation afterwards cannot fail.
#[derive(Debug, Clone)]
pub struct Template {
    raw: String,
    has_output: bool,
}

impl Template {
    /// Validate placeholder arity and build a template.
    ///
    /// # Errors
    ///
    /// Returns `MprunError::Config` when `{{INPUT}}` does not appear exactly
    /// once, or when `{{OUTPUT}}` appears more than once.
    pub fn parse(raw: &str) -> Result<Template> {
        let input_count = raw.matches(INPUT_TOKEN).count();
        if input_count != 1 {
            return Err(MprunError::Config(format!(
                "command template must contain {{{{INPUT}}}} exactly once, found {}: '{}'\n\
                 Fix: write the template with a single {{{{INPUT}}}} where each file path should go.",
                input_count, raw
            )));
        }

        let output_count = raw.matches(OUTPUT_TOKEN).count();
        if output_count > 1 {
            return Err(MprunError::Config(format!(
                "command template may contain {{{{OUTPUT}}}} at most once, found {}: '{}'",
                output_count, raw
            )));
        }

        Ok(Template {
            raw: raw.to_string(),
            has_output: output_count == 1,
        })
    }

    /// Whether the template uses the `{{OUTPUT}}` placeholder.
    pub fn has_output(&self) -> bool {
        self.has_output
    }

    /// Produce the concrete command line for one input file.
    ///
    /// `{{INPUT}}` becomes the path as given (callers pass absolute paths);
    /// `{{OUTPUT}}`, if present, becomes the input's file name with `.out`
    /// appended. Everything outside the placeholders is left untouched.
    pub fn instantiate(&self, input: &Path) -> String {
        let command = self.raw.replace(INPUT_TOKEN, &input.display().to_string());
        if !self.has_output {
            return command;
        }

        let file_name = input.file_name().unwrap_or_else(|| input.as_os_str());
        let output_name = format!("{}{}", file_name.to_string_lossy(), OUTPUT_SUFFIX);
        command.replace(OUTPUT_TOKEN, &output_name)
    }
}
