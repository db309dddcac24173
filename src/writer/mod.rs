use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::Result;
use crate::model::GblRecord;

const INDENT: &[u8] = b"    ";

#[derive(Default)]
pub struct JsonWriter {}

impl JsonWriter {
    pub fn new() -> Self {
        Self {}
    }

    /// Pretty-printed JSON with four-space indentation.
    pub fn to_json(&self, record: &GblRecord) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let formatter = PrettyFormatter::with_indent(INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
        record.serialize(&mut serializer)?;
        Ok(bytes)
    }

    /// Writes `record` to `output_path`. The file only appears once it has
    /// been written completely.
    pub fn write(&self, record: &GblRecord, output_path: &Path) -> Result<()> {
        let bytes = self.to_json(record)?;

        let dir = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // 同じディレクトリに一時ファイルを作成してからリネーム
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(&bytes)?;
        temp.flush()?;
        temp.persist(output_path).map_err(|e| e.error)?;

        Ok(())
    }
}
