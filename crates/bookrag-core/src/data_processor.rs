use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ChunkingSettings, DataSettings};
use crate::error::{Error, Result};
use crate::splitter::TextSplitter;
use crate::types::{Chunk, Document};

/// Loads documents from a directory and splits them into chunks.
#[derive(Debug, Clone)]
pub struct DataProcessor {
    extensions: Vec<String>,
    recursive: bool,
    splitter: TextSplitter,
}

impl DataProcessor {
    pub fn new(data: &DataSettings, chunking: &ChunkingSettings) -> Result<Self> {
        Ok(Self {
            extensions: data
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            recursive: data.recursive,
            splitter: TextSplitter::from_settings(chunking)?,
        })
    }

    pub fn load_documents(&self, data_dir: &Path) -> Result<Vec<Document>> {
        if !data_dir.is_dir() {
            return Err(Error::InvalidInput(format!(
                "source directory {} does not exist",
                data_dir.display()
            )));
        }
        let files = self.list_files(data_dir);
        let mut documents = Vec::with_capacity(files.len());
        for file_path in &files {
            let content = read_file_content(file_path)?;
            documents.push(Document { source: file_path.to_string_lossy().to_string(), content });
        }
        let sources: Vec<&str> = documents.iter().map(|d| d.source.as_str()).collect();
        tracing::info!(count = documents.len(), ?sources, "Loaded documents");
        Ok(documents)
    }

    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for doc in documents {
            for (chunk_index, span) in self.splitter.split(&doc.content).into_iter().enumerate() {
                chunks.push(Chunk::new(&doc.source, span.text, span.start, chunk_index));
            }
        }
        tracing::info!("Split {} documents into {} chunks.", documents.len(), chunks.len());
        match chunks.get(10) {
            Some(sample) => {
                tracing::debug!(source = %sample.source, "Sample chunk: {}", sample.content)
            }
            None => tracing::debug!("Less than 11 chunks were created."),
        }
        chunks
    }

    pub fn process_directory(&self, data_dir: &Path) -> Result<(Vec<Document>, Vec<Chunk>)> {
        let documents = self.load_documents(data_dir)?;
        let chunks = self.split_documents(&documents);
        Ok((documents, chunks))
    }

    fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut walker = walkdir::WalkDir::new(root).min_depth(1);
        if !self.recursive {
            walker = walker.max_depth(1);
        }
        let mut files: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| self.matches_extension(p))
            .collect();
        files.sort();
        files
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
    }
}
