//! High-level client for the portal's public REST services.
//!
//! The license pipeline is the main path: region codes are validated
//! against the static reference, resolved to archive uids, and the per
//! region archives are downloaded for lazy workbook extraction. The
//! remaining endpoints are thin JSON reads.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::HeaderMap;
use serde_json::{Value, json};

use super::error::{ApiError, ApiResult};
use super::http::HttpClient;
use super::regions::region_name;
use crate::licenses::LicenseWorkbooks;

/// Public base URL of the portal.
pub const DEFAULT_BASE_URL: &str = "https://dom.gosuslugi.ru";

const LICENSE_UID_PATH: &str = "licenses/api/rest/services/public/licenses/region-license-xls";
const FILESTORE_PATH: &str = "filestore/publicDownloadAllFilesServlet";
const ORGANIZATIONS_SEARCH_PATH: &str =
    "ppa/api/rest/services/ppa/organizations/chooser/search;page=1;itemsPerPage=11";
const ORGANIZATION_BY_GUID_PATH: &str =
    "ppa/api/rest/services/ppa/public/organizations/orgByGuid";
const HOUSES_PATH: &str = "nsi/api/rest/services/nsi/fias/v4/houses";
const HOME_MANAGEMENTS_SEARCH_PATH: &str =
    "homemanagement/api/rest/services/houses/public/searchByOrg";
const HOME_MANAGEMENT_PATH: &str = "homemanagement/api/rest/services/houses/public/1";

/// Connection settings for [`GisGkhClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub keep_alive: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(5),
            keep_alive: false,
        }
    }
}

pub struct GisGkhClient {
    http: HttpClient,
    base_url: String,
}

impl GisGkhClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let http = HttpClient::new(config.timeout, config.keep_alive, HeaderMap::new())?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Resolve every requested code against the region reference before any
    /// network activity. All-or-nothing: the first unknown code fails the
    /// whole request.
    fn resolve_regions(region_codes: &[u32]) -> ApiResult<Vec<(u32, &'static str)>> {
        region_codes
            .iter()
            .map(|&code| {
                region_name(code)
                    .map(|name| (code, name))
                    .ok_or(ApiError::RegionCodeAbsent(code))
            })
            .collect()
    }

    /// Resolve each region to the uid of its current license archive.
    ///
    /// The endpoint is keyed by a two-digit zero-padded region code. A
    /// non-success status for one region is logged and that region is left
    /// out of the result; a transport failure aborts the whole lookup.
    fn license_uids(&self, regions: &[(u32, &'static str)]) -> ApiResult<HashMap<String, String>> {
        let mut uids = HashMap::new();
        for &(code, name) in regions {
            let url = format!("{}/{code:02}", self.url(LICENSE_UID_PATH));
            let response = self.http.get(&url)?;
            if !response.is_success() {
                log::error!(
                    "uid for region {code} was not obtained (HTTP {})",
                    response.status().as_u16()
                );
                continue;
            }
            uids.insert(name.to_string(), response.text());
        }
        Ok(uids)
    }

    /// Download the license archive of every region that produced a uid.
    /// Same per-region tolerance as the uid lookup.
    fn license_archives(
        &self,
        uids: HashMap<String, String>,
    ) -> ApiResult<HashMap<String, Vec<u8>>> {
        let mut archives = HashMap::new();
        for (name, uid) in uids {
            let query = [
                ("context", "licenses".to_string()),
                ("uids", uid),
                ("zipFileName", format!("{name}.zip")),
            ];
            let response = self.http.get_query(&self.url(FILESTORE_PATH), &query)?;
            if !response.is_success() {
                log::error!(
                    "license archive for {name} was not obtained (HTTP {})",
                    response.status().as_u16()
                );
                continue;
            }
            archives.insert(name, response.into_bytes());
        }
        Ok(archives)
    }

    /// Run the full retrieval sequence for the given regions and return a
    /// lazy iterator of per-region license workbooks.
    pub fn license_workbooks(&self, region_codes: &[u32]) -> ApiResult<LicenseWorkbooks> {
        let regions = Self::resolve_regions(region_codes)?;
        let uids = self.license_uids(&regions)?;
        let archives = self.license_archives(uids)?;
        Ok(LicenseWorkbooks::new(archives))
    }

    /// Search registered management organizations by INN.
    pub fn organizations(&self, inn: u64) -> ApiResult<Value> {
        let payload = json!({
            "sortCriteriaList": [
                {"sortedBy": "organizationType", "ascending": false},
                {"sortedBy": "shortName", "ascending": true},
                {"sortedBy": "fullName", "ascending": true},
                {"sortedBy": "parentKpp", "ascending": true},
                {"sortedBy": "kpp", "ascending": true}
            ],
            "organizationStatuses": {"coll": ["REGISTERED"], "operand": "OR"},
            "organizationTypes": {"coll": ["B", "L", "A"], "operand": "OR"},
            "subordinationOrgTypeList": {"coll": ["HEAD", "BRANCH"], "operand": "OR"},
            "commonSearchString": inn,
            "roleConstraints": {
                "coll": [
                    {"roleCode": "1", "roleStatuses": ["APPROVED"]},
                    {"roleCode": "19", "roleStatuses": ["APPROVED"]},
                    {"roleCode": "20", "roleStatuses": ["APPROVED"]},
                    {"roleCode": "22", "roleStatuses": ["APPROVED"]},
                    {"roleCode": "21", "roleStatuses": ["APPROVED"]}
                ],
                "operand": "OR"
            }
        });
        self.http
            .post_json(&self.url(ORGANIZATIONS_SEARCH_PATH), &payload)?
            .error_for_status()?
            .json()
    }

    /// Fetch one organization by its GUID.
    pub fn organization(&self, guid: &str) -> ApiResult<Value> {
        self.http
            .get_query(&self.url(ORGANIZATION_BY_GUID_PATH), &[("organizationGuid", guid)])?
            .error_for_status()?
            .json()
    }

    /// Houses currently actual for the given state-services house code.
    pub fn active_houses(&self, house_code: &str) -> ApiResult<Value> {
        self.houses(house_code, true)
    }

    /// Houses no longer actual for the given state-services house code.
    pub fn not_active_houses(&self, house_code: &str) -> ApiResult<Value> {
        self.houses(house_code, false)
    }

    fn houses(&self, house_code: &str, actual: bool) -> ApiResult<Value> {
        let query = [
            ("houseCodes", house_code.to_string()),
            ("includeDuplicates", "false".to_string()),
            ("actual", actual.to_string()),
        ];
        self.http
            .get_query(&self.url(HOUSES_PATH), &query)?
            .error_for_status()?
            .json()
    }

    /// Page lazily through the house-management search for an organization.
    pub fn home_managements(&self, org_guid: &str, per_page: u32) -> HomeManagements<'_> {
        HomeManagements {
            client: self,
            org_guid: org_guid.to_string(),
            per_page,
            next_page: 1,
            total: 0,
            done: false,
        }
    }

    /// Fetch one house-management record by its GUID.
    pub fn home_management(&self, guid: &str) -> ApiResult<Value> {
        self.http
            .get(&format!("{}/{guid}/", self.url(HOME_MANAGEMENT_PATH)))?
            .error_for_status()?
            .json()
    }

    fn home_management_page(&self, org_guid: &str, page: u64, per_page: u32) -> ApiResult<Value> {
        let url = format!(
            "{}?pageIndex={page}&elementsPerPage={per_page}",
            self.url(HOME_MANAGEMENTS_SEARCH_PATH)
        );
        let payload = json!({"organizationGuid": org_guid, "calcCount": true});
        self.http.post_json(&url, &payload)?.error_for_status()?.json()
    }
}

/// Lazy pager over the house-management search. The first page reports the
/// total, which drives how many further pages are fetched.
pub struct HomeManagements<'a> {
    client: &'a GisGkhClient,
    org_guid: String,
    per_page: u32,
    next_page: u64,
    total: u64,
    done: bool,
}

impl Iterator for HomeManagements<'_> {
    type Item = ApiResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let page = self.next_page;
        match self
            .client
            .home_management_page(&self.org_guid, page, self.per_page)
        {
            Ok(body) => {
                if page == 1 {
                    self.total = body.get("total").and_then(Value::as_u64).unwrap_or(0);
                }
                self.next_page += 1;
                if self.next_page > self.total {
                    self.done = true;
                }
                Some(Ok(body))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
