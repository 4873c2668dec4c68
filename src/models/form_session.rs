use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Live, unsaved state of one open product form. Only the search fields are
/// tracked here; none of it is ever written to the database.
#[derive(Debug, Clone, Serialize)]
pub struct FormSession {
    pub id: Uuid,
    pub record_id: Option<i32>,
    pub search_query: String,
    pub search_result: String,
}

impl FormSession {
    pub fn new(record_id: Option<i32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            record_id,
            search_query: String::new(),
            search_result: String::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenFormSessionRequest {
    #[serde(default)]
    pub record_id: Option<i32>,
}

/// A cleared input arrives as `null`; it is treated the same as `""`.
#[derive(Debug, Deserialize)]
pub struct SearchQueryUpdate {
    #[serde(default)]
    pub value: Option<String>,
}
