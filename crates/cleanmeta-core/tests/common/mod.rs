#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const DOCUMENT_XML: &[u8] =
    b"<?xml version=\"1.0\"?><w:document><w:body><w:p>Quarterly numbers</w:p></w:body></w:document>";
pub const CORE_XML: &[u8] =
    b"<?xml version=\"1.0\"?><cp:coreProperties><dc:creator>X</dc:creator></cp:coreProperties>";

/// Entries of a minimal word-processing document:
///   [Content_Types].xml, _rels/.rels, word/, word/document.xml,
///   word/styles.xml (stored), docProps/, docProps/core.xml,
///   docProps/app.xml, customXml/item1.xml
pub fn write_docx(path: &Path) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    zip.start_file("[Content_Types].xml", deflated).unwrap();
    zip.write_all(b"<Types><Override PartName=\"/docProps/core.xml\"/></Types>")
        .unwrap();
    zip.start_file("_rels/.rels", deflated).unwrap();
    zip.write_all(b"<Relationships><Relationship Target=\"docProps/core.xml\"/></Relationships>")
        .unwrap();
    zip.add_directory("word/", deflated).unwrap();
    zip.start_file("word/document.xml", deflated).unwrap();
    zip.write_all(DOCUMENT_XML).unwrap();
    zip.start_file("word/styles.xml", stored).unwrap();
    zip.write_all(b"<w:styles/>").unwrap();
    zip.add_directory("docProps/", deflated).unwrap();
    zip.start_file("docProps/core.xml", deflated).unwrap();
    zip.write_all(CORE_XML).unwrap();
    zip.start_file("docProps/app.xml", deflated).unwrap();
    zip.write_all(b"<Properties><Company>ACME</Company></Properties>")
        .unwrap();
    zip.start_file("customXml/item1.xml", deflated).unwrap();
    zip.write_all(b"<custom>secret</custom>").unwrap();
    zip.finish().unwrap();
}

/// A plain archive with no office structure.
pub fn write_plain_zip(path: &Path) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    zip.start_file("docProps/readme.txt", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"just a zip").unwrap();
    zip.start_file("data.txt", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"payload").unwrap();
    zip.finish().unwrap();
}

/// Write the fixture to a sibling temp name, then rename, so concurrent
/// readers never observe a half-written file.
pub fn write_docx_atomically(path: &Path) {
    let staging = path.with_extension("staging");
    write_docx(&staging);
    fs::rename(&staging, path).unwrap();
}

/// name → (is_dir, uncompressed bytes) for every entry.
pub fn read_entries(path: &Path) -> BTreeMap<String, (bool, Vec<u8>)> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        entries.insert(entry.name().to_string(), (entry.is_dir(), data));
    }
    entries
}

pub fn entry_names(path: &Path) -> Vec<String> {
    read_entries(path).into_keys().collect()
}

pub fn has_property_entries(path: &Path) -> bool {
    entry_names(path)
        .iter()
        .any(|n| n.starts_with("docProps/") || n.starts_with("customXml/"))
}
