use std::time::Duration;

use lazy_regex::regex_captures;
use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT},
    Client, RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    util::retry::RetryPolicy,
};

const API_URL: &str = "https://api.curseforge.com";
// gameId=432 == minecraft
const MINECRAFT_GAME_ID: i32 = 432;
// classId=4471 == modpacks
const MODPACK_CLASS_ID: i32 = 4471;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CurseResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Mod {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub links: Option<ModLinks>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ModLinks {
    pub website_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModFile {
    pub id: i32,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub file_date: String,
    #[serde(default)]
    pub is_server_pack: bool,
    pub server_pack_file_id: Option<i32>,
    pub download_url: Option<String>,
}

/// The server pack picked for a modpack
#[derive(Debug, Clone, PartialEq)]
pub struct ServerPackChoice {
    pub file_id: i32,
    pub display_name: String,
    pub file_date: String,
}

/// A resolved server pack download
#[derive(Debug, Clone, PartialEq)]
pub struct ServerPackDownload {
    pub url: String,
    pub file_id: i32,
    pub display_name: String,
}

pub struct CurseAPI {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}
impl CurseAPI {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, API_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::MissingCredential);
        }

        let mut key = HeaderValue::from_str(api_key.trim()).map_err(|_| Error::InvalidCredential)?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))),
        );

        Ok(CurseAPI {
            client: Client::builder()
                .default_headers(headers)
                .timeout(REQUEST_TIMEOUT)
                .build()?,
            base_url: base_url.trim_end_matches('/').to_owned(),
            retry: RetryPolicy::new(MAX_ATTEMPTS, RETRY_BACKOFF),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, f: impl Fn() -> RequestBuilder) -> Result<T> {
        let f = &f;
        let curse_response: CurseResponse<T> = self
            .retry
            .run(
                move || async move { f().send().await?.error_for_status()?.json::<CurseResponse<T>>().await },
                is_transient,
            )
            .await
            .map_err(|err| match err.status() {
                Some(StatusCode::FORBIDDEN) => Error::InvalidCredential,
                Some(status) => Error::TransportError(format!("HTTP {status}")),
                None => Error::TransportError(err.to_string()),
            })?;

        Ok(curse_response.data)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {url}");
        self.fetch(|| self.client.get(url)).await
    }

    pub async fn search(&self, query: &str, game_version: Option<&str>, page_size: u32) -> Result<Vec<Mod>> {
        let mut params: Vec<(&str, String)> = vec![
            ("gameId", MINECRAFT_GAME_ID.to_string()),
            ("classId", MODPACK_CLASS_ID.to_string()),
            ("index", "0".into()),
            ("pageSize", page_size.to_string()),
            ("searchFilter", query.to_owned()),
            // sortField=2 == popularity/relevance
            ("sortField", "2".into()),
            ("sortOrder", "desc".into()),
        ];
        if let Some(game_version) = game_version {
            params.push(("gameVersion", game_version.to_owned()));
        }

        debug!("searching modpacks for '{query}'");
        self.fetch(|| self.client.get(format!("{}/v1/mods/search", self.base_url)).query(&params)).await
    }

    pub async fn resolve_pack_id_from_url(&self, url: &str) -> Result<i32> {
        let slug = slug_from_url(url).ok_or_else(|| {
            Error::NotFound("Invalid CurseForge modpack URL (expected /minecraft/modpacks/<slug>)".into())
        })?;

        let results = self.search(&slug.replace('-', " "), None, 5).await?;
        match results.first() {
            Some(top) => {
                debug!("resolved '{slug}' to {} ({})", top.name, top.id);
                Ok(top.id)
            }
            None => Err(Error::NotFound(format!("No modpack found for the given URL ({slug})"))),
        }
    }

    pub async fn get_mod_files(&self, pack_id: i32) -> Result<Vec<ModFile>> {
        self.get(&format!("{}/v1/mods/{pack_id}/files", self.base_url)).await
    }

    pub async fn get_download_url(&self, pack_id: i32, file_id: i32) -> Result<String> {
        let url: Option<String> = self
            .get(&format!("{}/v1/mods/{pack_id}/files/{file_id}/download-url", self.base_url))
            .await?;

        url.filter(|u| !u.trim().is_empty())
            .ok_or(Error::ResolutionFailed { pack_id, file_id })
    }

    pub async fn choose_latest_server_pack(&self, pack_id: i32) -> Result<ServerPackChoice> {
        let files = self.get_mod_files(pack_id).await?;
        latest_server_pack(&files)
    }

    pub async fn resolve_server_pack_download(&self, pack_id: i32, file_id: Option<i32>) -> Result<ServerPackDownload> {
        let (file_id, display_name) = match file_id {
            Some(file_id) => {
                let files = self.get_mod_files(pack_id).await?;
                server_pack_for_file(&files, pack_id, file_id)?
            }
            None => {
                let choice = self.choose_latest_server_pack(pack_id).await?;
                debug!("latest server pack for {pack_id} is {} from {}", choice.file_id, choice.file_date);
                (choice.file_id, choice.display_name)
            }
        };

        let url = self.get_download_url(pack_id, file_id).await?;
        Ok(ServerPackDownload { url, file_id, display_name })
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    match err.status() {
        Some(status) => status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
        None => err.is_timeout() || err.is_connect() || err.is_request(),
    }
}

/// The slug after `/modpacks/` in a curseforge project url
pub fn slug_from_url(url: &str) -> Option<&str> {
    regex_captures!(r"/modpacks/([^/?#]+)", url).map(|(_, slug)| slug)
}

// the newest file wins, on equal dates the one listed first stays
fn newest<'a>(files: impl Iterator<Item = &'a ModFile>) -> Option<&'a ModFile> {
    files.reduce(|best, f| if f.file_date > best.file_date { f } else { best })
}

/// Picks the newest explicit server pack, falling back to the server pack
/// linked from the newest file overall
pub fn latest_server_pack(files: &[ModFile]) -> Result<ServerPackChoice> {
    if let Some(f) = newest(files.iter().filter(|f| f.is_server_pack)) {
        return Ok(ServerPackChoice {
            file_id: f.id,
            display_name: f.display_name.clone(),
            file_date: f.file_date.clone(),
        });
    }

    match newest(files.iter()) {
        Some(f) => match f.server_pack_file_id {
            Some(server_pack_file_id) => Ok(ServerPackChoice {
                file_id: server_pack_file_id,
                display_name: f.display_name.clone(),
                file_date: f.file_date.clone(),
            }),
            None => Err(Error::NoServerPack("No server pack found for this modpack".into())),
        },
        None => Err(Error::NoServerPack("No files found for this modpack".into())),
    }
}

/// Maps a user picked file id to (server pack file id, display name)
pub fn server_pack_for_file(files: &[ModFile], pack_id: i32, file_id: i32) -> Result<(i32, String)> {
    let file = files
        .iter()
        .find(|f| f.id == file_id)
        .ok_or(Error::FileNotFound { pack_id, file_id })?;

    if file.is_server_pack {
        return Ok((file.id, file.display_name.clone()));
    }

    match file.server_pack_file_id {
        Some(server_pack_file_id) => Ok((server_pack_file_id, file.display_name.clone())),
        None => Err(Error::NoServerPack(format!(
            "Selected file {file_id} does not have an associated server pack"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::StubServer;

    fn file(id: i32, date: &str, is_server_pack: bool, server_pack_file_id: Option<i32>) -> ModFile {
        ModFile {
            id,
            display_name: format!("file-{id}"),
            file_date: date.into(),
            is_server_pack,
            server_pack_file_id,
            download_url: None,
        }
    }

    #[test]
    fn prefers_newest_explicit_server_pack() {
        let files = vec![
            file(1, "2024-01-01T00:00:00Z", true, None),
            // newest overall, but not a server pack
            file(2, "2024-06-01T00:00:00Z", false, Some(99)),
            file(3, "2024-03-01T00:00:00Z", true, None),
        ];

        let choice = latest_server_pack(&files).unwrap();
        assert_eq!(choice.file_id, 3);
        assert_eq!(choice.display_name, "file-3");
        assert_eq!(choice.file_date, "2024-03-01T00:00:00Z");
    }

    #[test]
    fn equal_dates_keep_first_listed() {
        let files = vec![
            file(10, "2024-05-05T00:00:00Z", true, None),
            file(11, "2024-05-05T00:00:00Z", true, None),
        ];

        assert_eq!(latest_server_pack(&files).unwrap().file_id, 10);
    }

    #[test]
    fn falls_back_to_linked_server_pack_of_newest_file() {
        let files = vec![
            file(1, "2023-01-01T00:00:00Z", false, Some(5)),
            file(2, "2024-01-01T00:00:00Z", false, Some(7)),
        ];

        let choice = latest_server_pack(&files).unwrap();
        assert_eq!(choice.file_id, 7);
        assert_eq!(choice.display_name, "file-2");
    }

    #[test]
    fn newest_without_link_has_no_server_pack() {
        let files = vec![
            file(1, "2023-01-01T00:00:00Z", false, Some(5)),
            file(2, "2024-01-01T00:00:00Z", false, None),
        ];

        assert!(matches!(latest_server_pack(&files), Err(Error::NoServerPack(_))));
        assert!(matches!(latest_server_pack(&[]), Err(Error::NoServerPack(_))));
    }

    #[test]
    fn explicit_file_id_resolution() {
        let files = vec![
            file(1, "2024-01-01T00:00:00Z", true, None),
            file(2, "2024-01-01T00:00:00Z", false, Some(1)),
            file(3, "2024-01-01T00:00:00Z", false, None),
        ];

        assert_eq!(server_pack_for_file(&files, 100, 1).unwrap(), (1, "file-1".into()));
        // client file follows its link but keeps its own display name
        assert_eq!(server_pack_for_file(&files, 100, 2).unwrap(), (1, "file-2".into()));
        assert!(matches!(server_pack_for_file(&files, 100, 3), Err(Error::NoServerPack(_))));
        assert!(matches!(
            server_pack_for_file(&files, 100, 4),
            Err(Error::FileNotFound { pack_id: 100, file_id: 4 })
        ));
    }

    #[test]
    fn slug_extraction() {
        assert_eq!(
            slug_from_url("https://www.curseforge.com/minecraft/modpacks/all-the-mods-9"),
            Some("all-the-mods-9")
        );
        assert_eq!(
            slug_from_url("https://www.curseforge.com/minecraft/modpacks/atm9/files?page=2"),
            Some("atm9")
        );
        assert_eq!(slug_from_url("https://www.curseforge.com/minecraft/modpacks/atm9?x=1#top"), Some("atm9"));
        assert_eq!(slug_from_url("https://www.curseforge.com/minecraft/mc-mods/jei"), None);
    }

    #[test]
    fn parses_api_file_listing() {
        let raw = r#"{"data": [
            {"id": 5, "displayName": "Pack 1.0", "fileDate": "2024-02-02T10:00:00.000Z", "isServerPack": false, "serverPackFileId": 6, "downloadUrl": null},
            {"id": 6, "displayName": "Server 1.0", "fileDate": "2024-02-02T10:00:01.000Z", "isServerPack": true}
        ]}"#;

        let res: CurseResponse<Vec<ModFile>> = serde_json::from_str(raw).unwrap();
        assert_eq!(res.data.len(), 2);
        assert_eq!(res.data[0].server_pack_file_id, Some(6));
        assert!(res.data[1].is_server_pack);
        assert_eq!(res.data[1].server_pack_file_id, None);
    }

    #[test]
    fn empty_api_key_is_missing_credential() {
        assert!(matches!(CurseAPI::new("  "), Err(Error::MissingCredential)));
    }

    #[tokio::test]
    async fn forbidden_is_invalid_credential_and_not_retried() {
        let server = StubServer::start(|_, _| (403, r#"{"error": "forbidden"}"#.into()));
        let api = CurseAPI::with_base_url("bad-key", &server.base_url).unwrap();

        let res = api.get_mod_files(1).await;
        assert!(matches!(res, Err(Error::InvalidCredential)));
        assert_eq!(server.hits("/v1/mods/1/files"), 1);
    }

    #[tokio::test]
    async fn server_errors_use_up_the_retry_budget() {
        let server = StubServer::start(|_, _| (500, "{}".into()));
        let api = CurseAPI::with_base_url("key", &server.base_url).unwrap();

        let res = api.get_mod_files(1).await;
        assert!(matches!(res, Err(Error::TransportError(_))));
        assert_eq!(server.hits("/v1/mods/1/files"), MAX_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn null_download_url_fails_resolution() {
        let server = StubServer::start(|_, _| (200, r#"{"data": null}"#.into()));
        let api = CurseAPI::with_base_url("key", &server.base_url).unwrap();

        let res = api.get_download_url(1, 2).await;
        assert!(matches!(res, Err(Error::ResolutionFailed { pack_id: 1, file_id: 2 })));
    }

    #[tokio::test]
    async fn resolves_latest_server_pack_download() {
        let server = StubServer::start(|path, base| match path {
            "/v1/mods/7/files" => (
                200,
                r#"{"data": [
                    {"id": 70, "displayName": "Pack 1.0", "fileDate": "2024-01-01T00:00:00Z", "serverPackFileId": 71},
                    {"id": 71, "displayName": "Server 1.0", "fileDate": "2024-01-01T00:00:01Z", "isServerPack": true}
                ]}"#
                .into(),
            ),
            "/v1/mods/7/files/71/download-url" => (200, format!(r#"{{"data": "{base}/files/server.zip"}}"#)),
            _ => (404, "{}".into()),
        });
        let api = CurseAPI::with_base_url("key", &server.base_url).unwrap();

        let download = api.resolve_server_pack_download(7, None).await.unwrap();
        assert_eq!(download.file_id, 71);
        assert_eq!(download.display_name, "Server 1.0");
        assert_eq!(download.url, format!("{}/files/server.zip", server.base_url));
    }
}
