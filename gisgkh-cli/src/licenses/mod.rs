//! Downloaded license archives and their spreadsheet members.

pub mod row;

#[cfg(test)]
pub(crate) mod fixtures;

pub use row::{LicenseRow, LicenseRows};

use std::collections::HashMap;
use std::io::{Cursor, Read};

use calamine::{Reader, Xlsx};
use zip::ZipArchive;

use crate::api::error::ApiResult;

/// An open workbook handle over one spreadsheet member, held in memory.
pub type LicenseWorkbook = Xlsx<Cursor<Vec<u8>>>;

const WORKBOOK_EXTENSION: &str = ".xlsx";

/// One region's licenses: a workbook handle paired with the region name.
pub struct Licenses {
    region_name: String,
    workbook: LicenseWorkbook,
}

impl Licenses {
    pub fn new(region_name: String, workbook: LicenseWorkbook) -> Self {
        Self {
            region_name,
            workbook,
        }
    }

    pub fn region_name(&self) -> &str {
        &self.region_name
    }

    /// Normalized rows of the first worksheet. Consumes the handle: the
    /// sequence is single-pass and cannot be restarted.
    pub fn rows(self) -> LicenseRows {
        LicenseRows::new(self.workbook)
    }
}

/// Lazy iterator over the spreadsheet members of downloaded archives.
///
/// Archives are opened one at a time: the next region's archive is not
/// touched until the previous one's members are exhausted. Dropping the
/// iterator releases whatever archive handle is currently open.
#[derive(Debug)]
pub struct LicenseWorkbooks {
    archives: std::collections::hash_map::IntoIter<String, Vec<u8>>,
    current: Option<OpenArchive>,
}

#[derive(Debug)]
struct OpenArchive {
    region_name: String,
    archive: ZipArchive<Cursor<Vec<u8>>>,
    members: std::vec::IntoIter<String>,
}

impl LicenseWorkbooks {
    pub(crate) fn new(archives: HashMap<String, Vec<u8>>) -> Self {
        Self {
            archives: archives.into_iter(),
            current: None,
        }
    }

    fn open_archive(&mut self, region_name: String, bytes: Vec<u8>) -> ApiResult<()> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        let members: Vec<String> = archive
            .file_names()
            .filter(|name| name.ends_with(WORKBOOK_EXTENSION))
            .map(str::to_owned)
            .collect();
        self.current = Some(OpenArchive {
            region_name,
            archive,
            members: members.into_iter(),
        });
        Ok(())
    }
}

impl Iterator for LicenseWorkbooks {
    type Item = ApiResult<Licenses>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(open) = self.current.as_mut() {
                if let Some(member) = open.members.next() {
                    let region_name = open.region_name.clone();
                    let result = read_member(&mut open.archive, &member)
                        .map(|workbook| Licenses::new(region_name, workbook));
                    return Some(result);
                }
                self.current = None;
            }
            let (region_name, bytes) = self.archives.next()?;
            if let Err(e) = self.open_archive(region_name, bytes) {
                return Some(Err(e));
            }
        }
    }
}

fn read_member(
    archive: &mut ZipArchive<Cursor<Vec<u8>>>,
    member: &str,
) -> ApiResult<LicenseWorkbook> {
    let mut file = archive.by_name(member)?;
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)?;
    Ok(Xlsx::new(Cursor::new(bytes))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::fixtures::{HEADER_MARKER_CELL, SAMPLE_ROW, workbook_bytes, zip_bytes};
    use crate::api::error::ApiError;

    fn single_archive(region: &str, bytes: Vec<u8>) -> LicenseWorkbooks {
        LicenseWorkbooks::new(HashMap::from([(region.to_string(), bytes)]))
    }

    #[test]
    fn non_spreadsheet_members_are_ignored() {
        let workbook = workbook_bytes(HEADER_MARKER_CELL, 0, &[&SAMPLE_ROW]);
        let archive = zip_bytes(&[
            ("readme.txt", b"not a workbook"),
            ("Реестр лицензий.xlsx", &workbook),
        ]);

        let items: Vec<_> = single_archive("Москва", archive).collect();
        assert_eq!(items.len(), 1);
        let licenses = items.into_iter().next().unwrap().unwrap();
        assert_eq!(licenses.region_name(), "Москва");
    }

    #[test]
    fn every_spreadsheet_member_yields_its_own_workbook() {
        let workbook = workbook_bytes(HEADER_MARKER_CELL, 0, &[&SAMPLE_ROW]);
        let archive = zip_bytes(&[
            ("реестр-1.xlsx", &workbook),
            ("реестр-2.xlsx", &workbook),
        ]);

        let items: Vec<_> = single_archive("Севастополь", archive).collect();
        assert_eq!(items.len(), 2);
        for item in items {
            assert_eq!(item.unwrap().region_name(), "Севастополь");
        }
    }

    #[test]
    fn malformed_archive_surfaces_as_archive_error() {
        let items: Vec<_> = single_archive("Москва", b"garbage".to_vec()).collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items.into_iter().next().unwrap(),
            Err(ApiError::Archive(_))
        ));
    }

    #[test]
    fn no_archives_means_no_workbooks() {
        let mut workbooks = LicenseWorkbooks::new(HashMap::new());
        assert!(workbooks.next().is_none());
    }
}
