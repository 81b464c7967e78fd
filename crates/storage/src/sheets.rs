use reckon_core::store::{SheetStore, StoreError, Table};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// Google Sheets v4 values API implementation of the store. One worksheet read
/// is one GET; one replace is a clear followed by an update. Credential
/// acquisition happens elsewhere; this client just carries a bearer token.
pub struct SheetsStore {
    client: reqwest::blocking::Client,
    base_url: String,
    spreadsheet_id: String,
    token: String,
}

#[derive(Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl SheetsStore {
    pub fn new(spreadsheet_id: impl Into<String>, token: impl Into<String>) -> SheetsStore {
        SheetsStore {
            client: reqwest::blocking::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            token: token.into(),
        }
    }

    /// Point the client at a different endpoint (local emulator).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> SheetsStore {
        self.base_url = base_url.into();
        self
    }

    fn values_url(&self, worksheet: &str, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}{}",
            self.base_url, self.spreadsheet_id, worksheet, suffix
        )
    }
}

impl SheetStore for SheetsStore {
    fn read(&self, worksheet: &str) -> Result<Table, StoreError> {
        let response = self
            .client
            .get(self.values_url(worksheet, ""))
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        // A worksheet that does not exist yet reads as an empty collection,
        // not an error: first commit against a fresh sheet creates it.
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::BAD_REQUEST {
            tracing::debug!(worksheet, %status, "worksheet missing, treating as empty");
            return Ok(Table::default());
        }
        if !status.is_success() {
            return Err(StoreError::Unavailable(format!(
                "GET {worksheet} returned {status}"
            )));
        }

        let body: ValuesResponse = response
            .json()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(table_from_values(body.values))
    }

    fn replace(&mut self, worksheet: &str, table: &Table) -> Result<(), StoreError> {
        let clear = self
            .client
            .post(self.values_url(worksheet, ":clear"))
            .bearer_auth(&self.token)
            .json(&json!({}))
            .send()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if !clear.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "clear {worksheet} returned {}",
                clear.status()
            )));
        }

        let update = self
            .client
            .put(self.values_url(worksheet, "?valueInputOption=USER_ENTERED"))
            .bearer_auth(&self.token)
            .json(&json!({ "values": values_from_table(table) }))
            .send()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if !update.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "update {worksheet} returned {}",
                update.status()
            )));
        }

        tracing::debug!(worksheet, rows = table.rows.len(), "replaced worksheet");
        Ok(())
    }
}

/// First row is the header; the API trims trailing empty cells, so rows stay
/// ragged here and readers pad by column name.
fn table_from_values(mut values: Vec<Vec<String>>) -> Table {
    if values.is_empty() {
        return Table::default();
    }
    let header = values.remove(0);
    Table { header, rows: values }
}

fn values_from_table(table: &Table) -> Vec<Vec<String>> {
    let mut values = Vec::with_capacity(table.rows.len() + 1);
    values.push(table.header.clone());
    values.extend(table.rows.iter().cloned());
    values
}
