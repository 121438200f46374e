use serde::{Deserialize, Serialize};

use crate::dao::models::PartyEntity;

pub const PARTY_PREFIX: &str = "party::";

/// Party document; `_rev` is CouchDB's own revision, `version` is ours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchPartyDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub party: PartyEntity,
}

impl CouchPartyDocument {
    pub fn from_entity(party: PartyEntity, rev: Option<String>) -> Self {
        Self {
            id: party_doc_id(&party.id),
            rev,
            party,
        }
    }

    pub fn into_entity(self) -> PartyEntity {
        self.party
    }
}

pub fn party_doc_id(id: &str) -> String {
    format!("{PARTY_PREFIX}{id}")
}
