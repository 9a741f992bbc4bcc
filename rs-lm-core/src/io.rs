use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use tracing::{debug, info};

use crate::document::AnnotatedDocument;
use crate::error::Result;
use crate::model::language_model::AnyModel;

/// Extension of corpus files inside a corpus directory.
pub const CORPUS_EXTENSION: &str = "json";

/// Extension of saved models.
pub const MODEL_EXTENSION: &str = "bin";

/// Loads a corpus: a JSON array of documents, or a directory of such files.
///
/// Directory entries are read in parallel and concatenated in file-name
/// order, so the corpus order (and therefore the partition) does not depend
/// on scheduling.
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<AnnotatedDocument>> {
	let path = path.as_ref();
	let documents = if path.is_dir() {
		read_corpus_dir(path)?
	} else {
		read_corpus_file(path)?
	};
	info!(path = %path.display(), documents = documents.len(), "loaded corpus");
	Ok(documents)
}

fn read_corpus_file(path: &Path) -> Result<Vec<AnnotatedDocument>> {
	let reader = BufReader::new(File::open(path)?);
	Ok(serde_json::from_reader(reader)?)
}

/// Splits the file list into `num_cpus` chunks, one thread per chunk; every
/// thread sends back its chunk index with the parsed documents.
fn read_corpus_dir(dir: &Path) -> Result<Vec<AnnotatedDocument>> {
	let files = list_files(dir, CORPUS_EXTENSION)?;
	if files.is_empty() {
		return Ok(Vec::new());
	}

	let chunk_size = files.len().div_ceil(num_cpus::get());
	let (tx, rx) = mpsc::channel();
	let mut handles = Vec::new();
	for (index, chunk) in files.chunks(chunk_size).enumerate() {
		let tx = tx.clone();
		let chunk = chunk.to_vec();
		handles.push(thread::spawn(move || {
			let parsed = chunk
				.iter()
				.map(|file| read_corpus_file(file))
				.collect::<Result<Vec<_>>>()
				.map(|documents| documents.into_iter().flatten().collect::<Vec<_>>());
			// The receiver outlives every sender
			let _ = tx.send((index, parsed));
		}));
	}
	drop(tx);

	let mut chunks: Vec<(usize, Vec<AnnotatedDocument>)> = Vec::new();
	for (index, parsed) in rx.iter() {
		chunks.push((index, parsed?));
	}
	for handle in handles {
		handle.join().map_err(|_| io::Error::other("corpus loader thread panicked"))?;
	}

	chunks.sort_by_key(|(index, _)| *index);
	debug!(files = files.len(), chunks = chunks.len(), "read corpus directory");
	Ok(chunks.into_iter().flat_map(|(_, documents)| documents).collect())
}

/// Writes a corpus as one pretty-printed JSON array.
pub fn write_corpus<P: AsRef<Path>>(path: P, documents: &[AnnotatedDocument]) -> Result<()> {
	let writer = BufWriter::new(File::create(path)?);
	serde_json::to_writer_pretty(writer, documents)?;
	Ok(())
}

/// Serializes a model with `postcard`.
pub fn save_model<P: AsRef<Path>>(path: P, model: &AnyModel) -> Result<()> {
	let bytes = postcard::to_stdvec(model)?;
	fs::write(&path, &bytes)?;
	info!(path = %path.as_ref().display(), kind = %model.kind(), bytes = bytes.len(), "saved model");
	Ok(())
}

pub fn load_model<P: AsRef<Path>>(path: P) -> Result<AnyModel> {
	let bytes = fs::read(&path)?;
	let model: AnyModel = postcard::from_bytes(&bytes)?;
	debug!(path = %path.as_ref().display(), kind = %model.kind(), "loaded model");
	Ok(model)
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/corpus.json` + `"bin"` → `data/corpus.bin`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Lists the files with a given extension in a directory, sorted by name.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			files.push(path);
		}
	}

	files.sort();
	Ok(files)
}
