//! Contract deployment records and request validation.
//!
//! Deployed contracts live in the system `contracts` table, one document per
//! contract name.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::{Document, StorageError, ID_FIELD};
use crate::transaction::{FieldKind, Payload, PayloadError, PayloadSchema};
use crate::types::sha256_hex;

/// System table holding deployed contracts.
pub const CONTRACTS_TABLE: &str = "contracts";

/// Pseudo-contract that receives deploy and update calls.
pub const DEPLOYER_CONTRACT: &str = "contract";
pub const DEPLOY_ACTION: &str = "deploy";
pub const UPDATE_ACTION: &str = "update";

/// Initialiser run on deploy and update; callers may not invoke it directly.
pub const RESERVED_INIT_ACTION: &str = "createSSC";

pub const MIN_CONTRACT_NAME_LEN: usize = 3;
pub const MAX_CONTRACT_NAME_LEN: usize = 50;

/// Stored form of a deployed contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub owner: String,
    /// Registered module id of the contract code
    pub code: String,
    pub code_hash: String,
    /// Fully qualified tables created by the contract
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub params: Value,
    pub version: u32,
}

impl ContractRecord {
    pub fn to_document(&self) -> Result<Document, StorageError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(doc)) => Ok(doc),
            Ok(_) => Err(StorageError::Serialization(
                "contract record is not an object".to_string(),
            )),
            Err(e) => Err(StorageError::Serialization(e.to_string())),
        }
    }

    pub fn from_document(doc: Document) -> Result<Self, StorageError> {
        serde_json::from_value(Value::Object(doc))
            .map_err(|e| StorageError::CorruptedData(format!("contract record: {e}")))
    }

    /// Record a table the contract created, keeping the list sorted and unique.
    pub fn add_table(&mut self, table: &str) {
        if let Err(pos) = self.tables.binary_search_by(|t| t.as_str().cmp(table)) {
            self.tables.insert(pos, table.to_string());
        }
    }
}

/// Parsed deploy/update payload
#[derive(Debug, Clone, PartialEq)]
pub struct DeployRequest {
    pub name: String,
    pub code: String,
    pub params: Value,
}

impl DeployRequest {
    pub fn schema() -> PayloadSchema {
        PayloadSchema::new()
            .required("name", FieldKind::String)
            .required("code", FieldKind::String)
            .optional("params", FieldKind::Object)
    }

    pub fn parse(payload: &Payload) -> Result<Self, PayloadError> {
        let obj = payload.parse()?;
        Self::schema().validate(&obj)?;
        let text = |field: &str| {
            obj.get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| PayloadError::MissingField(field.to_string()))
        };
        Ok(Self {
            name: text("name")?,
            code: text("code")?,
            params: obj
                .get("params")
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default())),
        })
    }

    pub fn code_hash(&self) -> String {
        sha256_hex(&self.code)
    }
}

/// Contract names are 3 to 50 ASCII letters, digits or underscores.
pub fn is_valid_contract_name(name: &str) -> bool {
    (MIN_CONTRACT_NAME_LEN..=MAX_CONTRACT_NAME_LEN).contains(&name.len())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Fully qualified name of a contract table.
pub fn qualified_table(contract: &str, table: &str) -> String {
    format!("{contract}_{table}")
}

// The `_id` field is owned by the store.
pub(crate) fn strip_id(mut doc: Document) -> Document {
    doc.remove(ID_FIELD);
    doc
}
