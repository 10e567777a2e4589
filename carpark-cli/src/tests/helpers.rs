//! Test helpers for CLI workspaces and canned feed sources.

use super::*;
use crate::connection::{ConnectionConfig, FeedSourceBuilder};
use camino::{Utf8Path, Utf8PathBuf};
use carpark_data::feed::{FeedService, FeedSource, StubFeedSource};
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;
use tokio::runtime::Runtime;

pub(super) const ALIWAL: &str = "31045.6165,31694.0055";

/// Temporary directory holding a credentials file and a database path.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn credentials_path(&self) -> Utf8PathBuf {
        self.root.join(".env")
    }

    pub(super) fn database_path(&self) -> Utf8PathBuf {
        self.root.join("data").join("car_parks.db")
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn write_credentials(&self, contents: &str) {
        fs::write(self.credentials_path(), contents).expect("write credentials file");
    }

    pub(super) fn read_credentials(&self) -> String {
        fs::read_to_string(self.credentials_path()).expect("read credentials file")
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace").field("root", &self.root).finish()
    }
}

/// One facility rate row at Aliwal Street.
pub(super) fn facility_row(code: &str, category: &str, capacity: i64) -> Value {
    json!({
        "ppCode": code,
        "ppName": "ALIWAL STREET",
        "parkingSystem": "B",
        "vehCat": category,
        "parkCapacity": capacity,
        "geometries": [{"coordinates": ALIWAL}],
        "startTime": "07.00 AM",
        "endTime": "05.00 PM",
        "weekdayRate": "$0.50",
        "weekdayMin": "30 mins"
    })
}

/// Canned responses handed to a fresh [`StubFeedSource`] per build.
#[derive(Debug, Default)]
pub(super) struct StubSourceBuilder {
    pub(super) facility_rows: Option<Vec<Value>>,
    pub(super) availability_rows: Vec<Value>,
    pub(super) token_payload: Option<Value>,
    pub(super) seen: std::cell::RefCell<Vec<ConnectionConfig>>,
}

impl FeedSourceBuilder for StubSourceBuilder {
    fn build(&self, connection: &ConnectionConfig) -> Result<Box<dyn FeedSource>, CliError> {
        self.seen.borrow_mut().push(connection.clone());
        let mut source = StubFeedSource::default()
            .with_rows(FeedService::Availability, self.availability_rows.clone());
        source = match &self.facility_rows {
            Some(rows) => source.with_rows(FeedService::FacilityDetails, rows.clone()),
            None => source.failing_with_status(FeedService::FacilityDetails, 503),
        };
        if let Some(payload) = &self.token_payload {
            source = source.with_token_payload(payload.clone());
        }
        Ok(Box::new(source))
    }
}

pub(super) fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build runtime")
}
