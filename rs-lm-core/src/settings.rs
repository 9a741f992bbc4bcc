//! Run configuration.
//!
//! ```toml
//! [partition]
//! testing_proportion = 0.2
//! cross_validation_proportion = 0.0
//!
//! [model]
//! infrequency_threshold = 1
//! max_sequence_length = 256
//!
//! [filter]
//! unusual_proportion_threshold = 0.75
//! interesting_words_threshold = 20
//!
//! [generation]
//! seed = 42
//! count = 10
//! ```
//!
//! Every field has a default. Invalid values are rejected by
//! [`Settings::validate`], never silently replaced.

use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// How the ordered document list is split into training and held-out parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionSettings {
	/// Share of documents held out for perplexity evaluation.
	pub testing_proportion: f64,
	/// Share reserved in addition to the testing share. Reserved documents are
	/// appended to the held-out part.
	pub cross_validation_proportion: f64,
}

impl Default for PartitionSettings {
	fn default() -> Self {
		Self { testing_proportion: 0.2, cross_validation_proportion: 0.0 }
	}
}

impl PartitionSettings {
	/// Combined held-out share.
	pub fn held_out_proportion(&self) -> f64 {
		self.testing_proportion + self.cross_validation_proportion
	}

	pub fn validate(&self) -> std::result::Result<(), String> {
		for (name, value) in [
			("testing_proportion", self.testing_proportion),
			("cross_validation_proportion", self.cross_validation_proportion),
		] {
			if !(0.0..1.0).contains(&value) {
				return Err(format!("{name} must be in [0.0, 1.0), got {value}"));
			}
		}
		if self.held_out_proportion() >= 1.0 {
			return Err(format!(
				"held-out proportion must leave training documents, got {}",
				self.held_out_proportion()
			));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
	/// N-grams seen this many times or fewer collapse into the rare key.
	pub infrequency_threshold: u64,
	/// Generation gives up after this many tokens without a stop sentinel.
	pub max_sequence_length: usize,
}

impl Default for ModelSettings {
	fn default() -> Self {
		Self { infrequency_threshold: 1, max_sequence_length: 256 }
	}
}

impl ModelSettings {
	pub fn validate(&self) -> std::result::Result<(), String> {
		if self.max_sequence_length == 0 {
			return Err("max_sequence_length must be > 0".to_owned());
		}
		Ok(())
	}
}

/// Thresholds deciding whether a document is usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
	/// A text whose share of out-of-lexicon words reaches this is not English.
	pub unusual_proportion_threshold: f64,
	/// A text needs more tokens than this to be interesting.
	pub interesting_words_threshold: usize,
}

impl Default for FilterSettings {
	fn default() -> Self {
		Self { unusual_proportion_threshold: 0.75, interesting_words_threshold: 20 }
	}
}

impl FilterSettings {
	pub fn validate(&self) -> std::result::Result<(), String> {
		if !(0.0..=1.0).contains(&self.unusual_proportion_threshold) {
			return Err(format!(
				"unusual_proportion_threshold must be in [0.0, 1.0], got {}",
				self.unusual_proportion_threshold
			));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
	/// Fixed seed for reproducible output. `None` draws from the OS.
	pub seed: Option<u64>,
	/// Sentences produced per request.
	pub count: usize,
}

impl Default for GenerationSettings {
	fn default() -> Self {
		Self { seed: None, count: 10 }
	}
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub partition: PartitionSettings,
	pub model: ModelSettings,
	pub filter: FilterSettings,
	pub generation: GenerationSettings,
}

impl Settings {
	/// Loads and validates settings from a TOML file.
	///
	/// # Errors
	/// - `ModelError::Io` if the file cannot be read
	/// - `ModelError::Toml` if parsing fails
	/// - `ModelError::InvalidSettings` if a value is out of range
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let contents = std::fs::read_to_string(path.as_ref())?;
		Self::from_toml_str(&contents)
	}

	pub fn from_toml_str(toml: &str) -> Result<Self> {
		let settings: Self = toml::from_str(toml)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Validates every section, returning the first error found.
	pub fn validate(&self) -> Result<()> {
		self.partition
			.validate()
			.map_err(|e| ModelError::InvalidSettings(format!("[partition] {e}")))?;
		self.model
			.validate()
			.map_err(|e| ModelError::InvalidSettings(format!("[model] {e}")))?;
		self.filter
			.validate()
			.map_err(|e| ModelError::InvalidSettings(format!("[filter] {e}")))?;
		Ok(())
	}

	/// Applies `RS_LM_*` environment variables on top of the current values.
	///
	/// | Variable | Field |
	/// |----------|-------|
	/// | `RS_LM_TESTING_PROPORTION` | `partition.testing_proportion` |
	/// | `RS_LM_INFREQUENCY_THRESHOLD` | `model.infrequency_threshold` |
	/// | `RS_LM_MAX_SEQUENCE_LENGTH` | `model.max_sequence_length` |
	/// | `RS_LM_SEED` | `generation.seed` |
	///
	/// # Errors
	/// `ModelError::InvalidSettings` naming the first variable whose value
	/// does not parse.
	pub fn with_env_overrides(self) -> Result<Self> {
		self.with_overrides(|key| env::var(key).ok())
	}

	/// Same as [`Settings::with_env_overrides`] with values read from `lookup`.
	pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(p) = parse_override(&lookup, "RS_LM_TESTING_PROPORTION")? {
			self.partition.testing_proportion = p;
		}
		if let Some(n) = parse_override(&lookup, "RS_LM_INFREQUENCY_THRESHOLD")? {
			self.model.infrequency_threshold = n;
		}
		if let Some(n) = parse_override(&lookup, "RS_LM_MAX_SEQUENCE_LENGTH")? {
			self.model.max_sequence_length = n;
		}
		if let Some(n) = parse_override(&lookup, "RS_LM_SEED")? {
			self.generation.seed = Some(n);
		}
		Ok(self)
	}
}

fn parse_override<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
	T: FromStr,
	T::Err: fmt::Display,
	F: Fn(&str) -> Option<String>,
{
	let Some(value) = lookup(key) else {
		return Ok(None);
	};
	value
		.trim()
		.parse()
		.map(Some)
		.map_err(|e| ModelError::InvalidSettings(format!("{key}=`{value}`: {e}")))
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;
	use std::io::Write;

	use tempfile::NamedTempFile;

	use super::*;

	#[test]
	fn defaults_are_valid() {
		let settings = Settings::default();
		assert!(settings.validate().is_ok());
		assert_eq!(settings.model.infrequency_threshold, 1);
		assert_eq!(settings.filter.interesting_words_threshold, 20);
		assert!((settings.partition.testing_proportion - 0.2).abs() < f64::EPSILON);
	}

	#[test]
	fn partial_toml_fills_defaults() {
		let settings = Settings::from_toml_str("[model]\ninfrequency_threshold = 3\n").unwrap();
		assert_eq!(settings.model.infrequency_threshold, 3);
		assert_eq!(settings.model.max_sequence_length, 256);
		assert_eq!(settings.generation.count, 10);
	}

	#[test]
	fn held_out_share_must_leave_training_documents() {
		let toml = "[partition]\ntesting_proportion = 0.6\ncross_validation_proportion = 0.4\n";
		match Settings::from_toml_str(toml) {
			Err(ModelError::InvalidSettings(message)) => assert!(message.starts_with("[partition]")),
			other => panic!("expected invalid settings, got {other:?}"),
		}
	}

	#[test]
	fn zero_sequence_length_rejected() {
		let toml = "[model]\nmax_sequence_length = 0\n";
		assert!(matches!(Settings::from_toml_str(toml), Err(ModelError::InvalidSettings(_))));
	}

	#[test]
	fn malformed_toml_is_a_parse_error() {
		assert!(matches!(Settings::from_toml_str("[model"), Err(ModelError::Toml(_))));
	}

	#[test]
	fn overrides_replace_file_values() {
		let vars: HashMap<&str, &str> =
			HashMap::from([("RS_LM_INFREQUENCY_THRESHOLD", "4"), ("RS_LM_SEED", " 99 ")]);
		let settings = Settings::default()
			.with_overrides(|key| vars.get(key).map(|v| v.to_string()))
			.unwrap();
		assert_eq!(settings.model.infrequency_threshold, 4);
		assert_eq!(settings.generation.seed, Some(99));
		assert_eq!(settings.model.max_sequence_length, 256);
	}

	#[test]
	fn unparsable_override_names_the_variable() {
		let result = Settings::default()
			.with_overrides(|key| (key == "RS_LM_MAX_SEQUENCE_LENGTH").then(|| "many".to_owned()));
		match result {
			Err(ModelError::InvalidSettings(message)) => {
				assert!(message.starts_with("RS_LM_MAX_SEQUENCE_LENGTH=`many`"), "{message}")
			}
			other => panic!("expected invalid settings, got {other:?}"),
		}
	}

	#[test]
	fn from_file_reads_toml() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[generation]\nseed = 7\ncount = 3").unwrap();
		let settings = Settings::from_file(file.path()).unwrap();
		assert_eq!(settings.generation.seed, Some(7));
		assert_eq!(settings.generation.count, 3);
	}
}
