use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};

use crate::dao::models::{GuessEntity, ParticipantEntity, PartyEntity, SongEntity};

/// Document stored in the `parties` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPartyDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    admin_token: String,
    songs_per_round: u32,
    started: bool,
    current_round: u32,
    show_results: bool,
    #[serde(default)]
    participants: Vec<ParticipantEntity>,
    #[serde(default)]
    songs: Vec<SongEntity>,
    #[serde(default)]
    guesses: Vec<GuessEntity>,
    created_at: DateTime,
    updated_at: DateTime,
    version: i64,
}

impl From<PartyEntity> for MongoPartyDocument {
    fn from(value: PartyEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            admin_token: value.admin_token,
            songs_per_round: value.songs_per_round,
            started: value.started,
            current_round: value.current_round,
            show_results: value.show_results,
            participants: value.participants,
            songs: value.songs,
            guesses: value.guesses,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            version: version_to_bson(value.version),
        }
    }
}

impl From<MongoPartyDocument> for PartyEntity {
    fn from(value: MongoPartyDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            admin_token: value.admin_token,
            songs_per_round: value.songs_per_round,
            started: value.started,
            current_round: value.current_round,
            show_results: value.show_results,
            participants: value.participants,
            songs: value.songs,
            guesses: value.guesses,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            version: value.version.max(0) as u64,
        }
    }
}

fn version_to_bson(version: u64) -> i64 {
    i64::try_from(version).unwrap_or(i64::MAX)
}

pub fn doc_id(id: &str) -> Document {
    doc! {"_id": id}
}

/// Filter matching a party only while it still holds `version`.
pub fn versioned_doc_id(id: &str, version: u64) -> Document {
    doc! {"_id": id, "version": version_to_bson(version)}
}
