use super::catalog::StaticCatalog;
use super::scripted_vendor::VendorScript;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// A catalog plus the scripted vendor behaviour, as stored in one JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(flatten)]
    pub catalog: StaticCatalog,
    #[serde(default)]
    pub vendor_script: VendorScript,
}

impl Fixture {
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        Ok(serde_json::from_reader(source)?)
    }
}
