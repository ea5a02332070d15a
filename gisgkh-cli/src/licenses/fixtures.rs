//! In-memory xlsx and zip fixtures shared by the pipeline tests.

use std::io::{Cursor, Write};

use calamine::{Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use zip::CompressionMethod;
use zip::write::FileOptions;

use super::LicenseWorkbook;

/// The header marker as it appears in real registry sheets.
pub(crate) const HEADER_MARKER_CELL: &str = "Номер лицензии";

/// One realistic 22-column sheet row: 20 data cells followed by the two
/// trailing service cells the normalizer drops.
pub(crate) const SAMPLE_ROW: [&str; 22] = [
    "077 № 000123",
    "11.05.2015",
    "Размещена",
    "11.05.2015",
    "№ 123-Л",
    "30.04.2015",
    "г. Москва, ул. Тверская, д. 1",
    "c8ab6857-9ee9-4b0e-91cc-53bba3c84a10",
    "",
    "ООО \"УК Прогресс\"",
    "7701234567",
    "1157746012345",
    "г. Москва, ул. Ленина, д. 10",
    "80-0001234",
    "20.07.2016 12:45:01",
    "01.08.2016",
    "",
    "",
    "",
    "сведения отсутствуют",
    "служебная отметка",
    "служебная отметка",
];

/// Build an xlsx whose first cell at `header_row` (0-based) carries
/// `header_text`, with `data` rows written immediately below it.
pub(crate) fn workbook_bytes(header_text: &str, header_row: u32, data: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(header_row, 0, header_text).unwrap();
    for (i, row) in data.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            sheet
                .write_string(header_row + 1 + i as u32, j as u16, *value)
                .unwrap();
        }
    }
    workbook.save_to_buffer().unwrap()
}

pub(crate) fn open_workbook(bytes: Vec<u8>) -> LicenseWorkbook {
    Xlsx::new(Cursor::new(bytes)).unwrap()
}

/// A minimal xlsx package whose workbook part declares zero sheets.
pub(crate) fn sheetless_workbook() -> LicenseWorkbook {
    let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#;
    let package_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;
    let workbook_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"/>"#;
    let workbook_xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets/></workbook>"#;

    let bytes = zip_bytes(&[
        ("[Content_Types].xml", content_types.as_bytes()),
        ("_rels/.rels", package_rels.as_bytes()),
        ("xl/_rels/workbook.xml.rels", workbook_rels.as_bytes()),
        ("xl/workbook.xml", workbook_xml.as_bytes()),
    ]);
    open_workbook(bytes)
}

/// Pack members into an uncompressed zip archive.
pub(crate) fn zip_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        for (name, bytes) in members {
            let options: FileOptions<'_, ()> =
                FileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file(*name, options).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}
