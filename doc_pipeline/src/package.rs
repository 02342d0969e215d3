//! DOCX package container — an OOXML zip held as an ordered part map.
//!
//! A `.docx` file is a zip archive of XML parts plus media. Reading the
//! whole archive into memory keeps the stages simple and makes the
//! pipeline testable without touching the filesystem.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{EngineError, Result};

/// Well-known part names.
pub mod parts {
    pub const CONTENT_TYPES: &str = "[Content_Types].xml";
    pub const PACKAGE_RELS: &str = "_rels/.rels";
    pub const DOCUMENT: &str = "word/document.xml";
    pub const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";
    pub const STYLES: &str = "word/styles.xml";
    pub const MEDIA_PREFIX: &str = "word/media/";
}

#[derive(Debug, Clone, Default)]
pub struct DocxPackage {
    parts: BTreeMap<String, Vec<u8>>,
}

impl DocxPackage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| match e {
            ZipError::InvalidArchive(_) | ZipError::UnsupportedArchive(_) => {
                EngineError::NotDocx(e)
            }
            other => EngineError::Zip(other),
        })?;

        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            parts.insert(name, data);
        }

        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    pub fn require(&self, name: &str) -> Result<&[u8]> {
        self.part(name)
            .ok_or_else(|| EngineError::MissingPart(name.to_string()))
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn set_part(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.parts.insert(name.into(), data);
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// Parts whose names start with `prefix`, e.g. `word/media/`.
    pub fn parts_under<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a [u8])> + 'a {
        self.parts
            .range(prefix.to_string()..)
            .take_while(move |(name, _)| name.starts_with(prefix))
            .map(|(name, data)| (name.as_str(), data.as_slice()))
    }

    pub fn part_size(&self, name: &str) -> Option<usize> {
        self.parts.get(name).map(Vec::len)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.parts {
            writer.start_file(name.clone(), options)?;
            writer.write_all(data)?;
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_parts_through_zip() {
        let mut pkg = DocxPackage::new();
        pkg.set_part(parts::DOCUMENT, b"<w:document/>".to_vec());
        pkg.set_part("word/media/image1.png", vec![0x89, 0x50, 0x4e, 0x47]);

        let bytes = pkg.to_bytes().unwrap();
        let reread = DocxPackage::from_bytes(&bytes).unwrap();

        assert_eq!(reread.part(parts::DOCUMENT), Some(&b"<w:document/>"[..]));
        assert_eq!(reread.part_size("word/media/image1.png"), Some(4));
    }

    #[test]
    fn rejects_non_zip_input() {
        let err = DocxPackage::from_bytes(b"%PDF-1.4 not a zip").unwrap_err();
        assert!(matches!(err, EngineError::NotDocx(_)));
    }

    #[test]
    fn parts_under_filters_by_prefix() {
        let mut pkg = DocxPackage::new();
        pkg.set_part("word/media/image1.png", vec![1]);
        pkg.set_part("word/media/image2.png", vec![2]);
        pkg.set_part("word/styles.xml", vec![3]);

        let media: Vec<&str> = pkg
            .parts_under(parts::MEDIA_PREFIX)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(media, vec!["word/media/image1.png", "word/media/image2.png"]);
    }
}
