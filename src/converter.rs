use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::companion::{CompanionIndex, GeometryReader, OgrReader};
use crate::error::{Error, Result};
use crate::mapper::Mapper;
use crate::model::MetadataFile;
use crate::parser::parse_file;
use crate::writer::JsonWriter;

/// A metadata file that produced no output.
#[derive(Debug)]
pub struct Failure {
    pub input: PathBuf,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<PathBuf>,
    pub failures: Vec<Failure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn log_summary(&self) {
        info!(
            "FINISHED: {} converted, {} failed",
            self.converted.len(),
            self.failures.len()
        );
        if !self.failures.is_empty() {
            error!("Failed to process {} files:", self.failures.len());
            for failure in &self.failures {
                error!("  {}: {}", failure.input.display(), failure.error);
            }
        }
    }
}

/// Converts metadata files into GeoBlacklight JSON files in one output directory.
pub struct Converter<G = OgrReader> {
    mapper: Mapper,
    companions: CompanionIndex,
    geometry: G,
    writer: JsonWriter,
    output_dir: PathBuf,
}

impl<G: GeometryReader> Converter<G> {
    pub fn new(
        mapper: Mapper,
        companions: CompanionIndex,
        geometry: G,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mapper,
            companions,
            geometry,
            writer: JsonWriter::new(),
            output_dir: output_dir.into(),
        }
    }

    pub fn output_path(&self, file: &MetadataFile) -> PathBuf {
        self.output_dir.join(file.output_file_name())
    }

    /// Parses, maps and writes a single metadata file.
    pub fn convert_file(&self, path: &Path) -> Result<PathBuf> {
        let file = metadata_file(path)?;
        info!("Starting {}", file.file_name);

        let doc = parse_file(path)?;
        let record = self
            .mapper
            .map_record(&doc, &file, &self.companions, &self.geometry)?;

        let output_path = self.output_path(&file);
        self.writer.write(&record, &output_path)?;
        info!("Written JSON: {:?}", output_path);

        Ok(output_path)
    }

    /// Converts every input in parallel. A failing file is recorded and the
    /// rest of the batch carries on.
    pub fn convert_all(&self, inputs: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport::default();

        // 出力先が重複する入力は並列処理の前に除外
        let mut claimed = HashSet::new();
        let mut pending = Vec::new();
        for input in inputs {
            match metadata_file(input) {
                Ok(file) => {
                    let output_name = file.output_file_name();
                    if claimed.insert(output_name.clone()) {
                        pending.push(input.clone());
                    } else {
                        warn!("Skipping {:?}: {} already claimed", input, output_name);
                        report.failures.push(Failure {
                            input: input.clone(),
                            error: Error::DuplicateOutput(output_name),
                        });
                    }
                }
                Err(e) => report.failures.push(Failure {
                    input: input.clone(),
                    error: e,
                }),
            }
        }

        let results: Vec<(PathBuf, Result<PathBuf>)> = pending
            .into_par_iter()
            .map(|input| {
                let result = self.convert_file(&input);
                (input, result)
            })
            .collect();

        for (input, result) in results {
            match result {
                Ok(output) => report.converted.push(output),
                Err(e) => {
                    error!("{}: {}", input.display(), e);
                    report.failures.push(Failure { input, error: e });
                }
            }
        }

        report
    }
}

fn metadata_file(path: &Path) -> Result<MetadataFile> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::InvalidFileName(path.display().to_string()))?;
    MetadataFile::from_file_name(file_name)
}

/// Every `.xml` file under `dir`, recursively, in sorted order.
pub fn collect_metadata_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_into(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_into(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            // サブディレクトリを再帰的に探索
            collect_into(&path, files)?;
        } else if path.extension().and_then(|s| s.to_str()) == Some("xml") {
            files.push(path);
        }
    }
    Ok(())
}
