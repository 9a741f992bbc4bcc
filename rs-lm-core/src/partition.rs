use tracing::{debug, warn};

use crate::document::AnnotatedDocument;
use crate::error::{ModelError, Result};
use crate::settings::PartitionSettings;

/// Training and held-out halves of one ordered corpus.
///
/// # Invariants
/// - both halves are non-empty
/// - every document is usable
/// - corpus order is kept: training documents all come before testing ones
#[derive(Clone, Debug)]
pub struct Partition {
	training: Vec<AnnotatedDocument>,
	testing: Vec<AnnotatedDocument>,
}

impl Partition {
	/// Splits `documents` in natural order, without shuffling.
	///
	/// Unusable documents are dropped first. The last
	/// `floor(len * (testing + cross_validation))` documents are held out.
	///
	/// # Errors
	/// `ModelError::DegeneratePartition` if either half ends up empty.
	///
	/// # Example
	/// ```
	/// use rs_lm_core::partition::Partition;
	/// use rs_lm_core::settings::PartitionSettings;
	///
	/// assert!(Partition::split(Vec::new(), &PartitionSettings::default()).is_err());
	/// ```
	pub fn split(documents: Vec<AnnotatedDocument>, settings: &PartitionSettings) -> Result<Self> {
		let total = documents.len();
		let mut usable: Vec<AnnotatedDocument> = documents.into_iter().filter(AnnotatedDocument::is_usable).collect();
		if usable.len() < total {
			warn!(skipped = total - usable.len(), "skipping unusable documents");
		}

		let testing_len = (usable.len() as f64 * settings.held_out_proportion()).floor() as usize;
		let training_len = usable.len() - testing_len.min(usable.len());
		let testing = usable.split_off(training_len);
		let training = usable;

		if training.is_empty() {
			return Err(ModelError::DegeneratePartition("no usable document left for training".to_owned()));
		}
		if testing.is_empty() {
			return Err(ModelError::DegeneratePartition("no usable document left for testing".to_owned()));
		}

		debug!(training = training.len(), testing = testing.len(), "partitioned corpus");
		Ok(Self { training, testing })
	}

	pub fn training(&self) -> &[AnnotatedDocument] {
		&self.training
	}

	pub fn testing(&self) -> &[AnnotatedDocument] {
		&self.testing
	}
}
