use super::{Table, TableRef, TableStore};
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Google Sheets v4 REST backend.
///
/// Authenticates with a bearer access token obtained outside this process.
/// Without a token the client stays uninitialized and every call fails with a
/// connectivity error. Each call is attempted once.
#[derive(Clone)]
pub struct SheetsStore {
    client: Option<Client>,
    api_base: String,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
    grid_properties: Option<GridProperties>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridProperties {
    #[serde(default)]
    row_count: usize,
    #[serde(default)]
    column_count: usize,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl SheetsStore {
    pub fn new(api_base: impl Into<String>, access_token: Option<String>) -> Self {
        let access_token = access_token.filter(|t| !t.trim().is_empty());
        let client = match &access_token {
            Some(_) => match Client::builder().timeout(REQUEST_TIMEOUT).build() {
                Ok(client) => Some(client),
                Err(e) => {
                    error!("Error initializing Google Sheets client: {}", e);
                    None
                }
            },
            None => {
                warn!("No Google credentials found. Google Sheets features will not work.");
                None
            }
        };

        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.client.is_some()
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, AppError> {
        let client = self.client.as_ref().ok_or_else(|| {
            AppError::Connectivity("Google Sheets client not initialized".to_string())
        })?;
        let token = self.access_token.as_deref().unwrap_or_default();
        Ok(client.request(method, url).bearer_auth(token))
    }

    /// `{api_base}/spreadsheets/{id}/...segments`, each segment percent-encoded.
    fn url(&self, spreadsheet_id: &str, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| AppError::Connectivity(format!("invalid Sheets API base URL: {}", e)))?;
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                AppError::Connectivity("Sheets API base URL cannot carry a path".to_string())
            })?;
            path.pop_if_empty().push("spreadsheets").push(spreadsheet_id);
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response, AppError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail: String = body.chars().take(300).collect();
        error!("Google Sheets {} failed with {}: {}", what, status, detail);
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                AppError::Connectivity(format!("credentials rejected during {}", what))
            }
            StatusCode::NOT_FOUND => {
                AppError::Connectivity(format!("spreadsheet not found during {}", what))
            }
            _ => AppError::Connectivity(format!("{} returned {}", what, status)),
        })
    }

    /// Resolve a tab id to its properties. The values API addresses tabs by
    /// title; the grid size bounds what a write has to clear.
    async fn tab(&self, table: &TableRef) -> Result<SheetProperties, AppError> {
        let mut url = self.url(&table.spreadsheet_id, &[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title,gridProperties(rowCount,columnCount))");

        let response = self
            .send(self.request(Method::GET, url)?, "metadata lookup")
            .await?;
        let metadata: SpreadsheetMetadata = response.json().await?;

        metadata
            .sheets
            .into_iter()
            .map(|s| s.properties)
            .find(|p| p.sheet_id == table.tab_id)
            .ok_or_else(|| AppError::Connectivity(format!("no tab with gid {} in {}", table.tab_id, table.spreadsheet_id)))
    }
}

/// A1 range covering a whole tab.
fn quoted_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// 1-based column number to its A1 letters: 1 is `A`, 27 is `AA`.
fn column_letter(mut number: usize) -> String {
    let mut letters = Vec::new();
    while number > 0 {
        let rem = (number - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        number = (number - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Ranges still holding cells from an earlier, larger write once `rows` by
/// `columns` values have been written from `A1` into a grid of `grid` size.
fn leftover_ranges(title: &str, rows: usize, columns: usize, grid: GridProperties) -> Vec<String> {
    let tab = quoted_range(title);
    let mut ranges = Vec::new();
    let last_column = grid.column_count.max(columns);
    if grid.row_count > rows && last_column > 0 {
        ranges.push(format!(
            "{}!A{}:{}{}",
            tab,
            rows + 1,
            column_letter(last_column),
            grid.row_count
        ));
    }
    if grid.column_count > columns && rows > 0 {
        ranges.push(format!(
            "{}!{}1:{}{}",
            tab,
            column_letter(columns + 1),
            column_letter(grid.column_count),
            rows
        ));
    }
    ranges
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => if b { "TRUE".to_string() } else { "FALSE".to_string() },
        other => other.to_string(),
    }
}

#[async_trait]
impl TableStore for SheetsStore {
    async fn read(&self, table: &TableRef) -> Result<Table, AppError> {
        let title = self.tab(table).await?.title;
        let range = quoted_range(&title);
        let mut url = self.url(&table.spreadsheet_id, &["values", &range])?;
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "FORMATTED_VALUE");

        let response = self.send(self.request(Method::GET, url)?, "read").await?;
        let range: ValueRange = response.json().await?;

        let values: Vec<Vec<String>> = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        let data = Table::from_values(values);
        info!("Read {} rows from Google Sheets tab '{}'", data.len(), title);
        Ok(data)
    }

    /// Overwrite the tab from `A1`, then clear whatever the previous contents
    /// left below and to the right. A failed overwrite leaves the tab as it
    /// was; a failed clear leaves stale trailing cells but no data loss.
    async fn write(&self, data: &Table, table: &TableRef) -> Result<(), AppError> {
        let tab = self.tab(table).await?;
        let title = tab.title;
        let values = data.to_values();
        let written_rows = values.len();
        let written_columns = data.columns().len();

        let target = format!("{}!A1", quoted_range(&title));
        let mut update_url = self.url(&table.spreadsheet_id, &["values", &target])?;
        update_url
            .query_pairs_mut()
            .append_pair("valueInputOption", "RAW");
        let body = json!({
            "range": target,
            "majorDimension": "ROWS",
            "values": values,
        });
        debug!("Writing {} rows to tab '{}'", data.len(), title);
        self.send(self.request(Method::PUT, update_url)?.json(&body), "write")
            .await?;

        match tab.grid_properties {
            Some(grid) => {
                let ranges = leftover_ranges(&title, written_rows, written_columns, grid);
                if !ranges.is_empty() {
                    debug!("Clearing leftover ranges {:?} in tab '{}'", ranges, title);
                    let clear_url = self.url(&table.spreadsheet_id, &["values:batchClear"])?;
                    self.send(
                        self.request(Method::POST, clear_url)?.json(&json!({ "ranges": ranges })),
                        "clear",
                    )
                    .await?;
                }
            }
            None => warn!("No grid size reported for tab '{}'; trailing cells not cleared", title),
        }

        info!("Wrote {} rows to Google Sheets tab '{}'", data.len(), title);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "google-sheets"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uninitialized_client_fails_with_connectivity_error() {
        let store = SheetsStore::new("https://sheets.googleapis.com/v4", None);
        assert!(!store.is_initialized());

        let result = store.read(&TableRef::new("abc", 0)).await;
        assert!(matches!(result, Err(AppError::Connectivity(_))));
    }

    #[test]
    fn builds_encoded_value_urls() {
        let store = SheetsStore::new("https://sheets.googleapis.com/v4/", Some("token".to_string()));
        let url = store
            .url("abc", &["values", &quoted_range("Sold Items")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/'Sold%20Items'"
        );
    }

    #[test]
    fn quotes_titles_with_apostrophes() {
        assert_eq!(quoted_range("Ana's"), "'Ana''s'");
    }

    #[test]
    fn numbers_columns_like_a1_notation() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
        assert_eq!(column_letter(703), "AAA");
    }

    #[test]
    fn clears_only_what_the_new_contents_do_not_cover() {
        let grid = GridProperties {
            row_count: 1000,
            column_count: 26,
        };
        assert_eq!(
            leftover_ranges("Inventory", 4, 3, grid),
            vec!["'Inventory'!A5:Z1000".to_string(), "'Inventory'!D1:Z4".to_string()]
        );

        let exact = GridProperties {
            row_count: 4,
            column_count: 3,
        };
        assert!(leftover_ranges("Inventory", 4, 3, exact).is_empty());

        let narrow = GridProperties {
            row_count: 10,
            column_count: 2,
        };
        assert_eq!(leftover_ranges("Ana's", 4, 3, narrow), vec!["'Ana''s'!A5:C10".to_string()]);
    }

    #[test]
    fn reads_grid_size_from_metadata() {
        let metadata: SpreadsheetMetadata = serde_json::from_value(json!({
            "sheets": [{"properties": {
                "sheetId": 7,
                "title": "Sold Items",
                "gridProperties": {"rowCount": 1000, "columnCount": 26}
            }}]
        }))
        .unwrap();
        let properties = &metadata.sheets[0].properties;
        let grid = properties.grid_properties.unwrap();
        assert_eq!(properties.sheet_id, 7);
        assert_eq!((grid.row_count, grid.column_count), (1000, 26));
    }

    #[test]
    fn cells_are_stringified() {
        assert_eq!(cell_text(json!(3)), "3");
        assert_eq!(cell_text(json!(1.5)), "1.5");
        assert_eq!(cell_text(json!(true)), "TRUE");
        assert_eq!(cell_text(Value::Null), "");
        assert_eq!(cell_text(json!("x")), "x");
    }
}
