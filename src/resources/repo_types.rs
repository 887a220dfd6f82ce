use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// An open JSON document plus its surrogate key.
pub type Body = Map<String, Value>;

#[derive(Debug, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub body: Json<Body>,
    pub created_at: OffsetDateTime,
}

/// A stored document, serialized as its body fields plus `_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub body: Body,
    #[serde(skip_serializing)]
    pub created_at: OffsetDateTime,
}

impl From<DocumentRow> for Document {
    fn from(r: DocumentRow) -> Self {
        Self {
            id: r.id,
            body: r.body.0,
            created_at: r.created_at,
        }
    }
}

impl Document {
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }
}

/// Strip keys the store owns so clients cannot overwrite them.
pub fn sanitize(mut body: Body) -> Body {
    body.remove("_id");
    body
}
