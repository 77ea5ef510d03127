use serde::{Deserialize, Serialize};

use crate::model::todo::TodoItem;

/// Version written into every month document
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Serialize)]
struct MonthDocumentOut<'a> {
    version: u32,
    todos: &'a [TodoItem],
}

#[derive(Deserialize)]
struct MonthDocument {
    #[serde(default)]
    #[allow(dead_code)]
    version: Option<u32>,
    #[serde(default)]
    todos: Option<Vec<TodoItem>>,
}

/// Why a month document could not be read in either shape
#[derive(Debug, thiserror::Error)]
#[error("not a month document: {wrapped}; not a todo list: {bare}")]
pub struct DocumentError {
    pub wrapped: String,
    pub bare: String,
}

/// Serialize a month's todos as `{ version: 1, todos: [...] }`.
pub fn serialize_month(todos: &[TodoItem]) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&MonthDocumentOut {
        version: DOCUMENT_VERSION,
        todos,
    })
}

/// Read a month document.
///
/// The wrapped `{ version, todos }` shape is tried first. A document that
/// is not that shape, or has no `todos`, is read as a bare list of items.
pub fn parse_month(source: &str) -> Result<Vec<TodoItem>, DocumentError> {
    let wrapped = match serde_yaml::from_str::<MonthDocument>(source) {
        Ok(MonthDocument {
            todos: Some(todos), ..
        }) => return Ok(todos),
        Ok(_) => "no todos field".to_string(),
        Err(e) => e.to_string(),
    };
    serde_yaml::from_str::<Vec<TodoItem>>(source).map_err(|e| DocumentError {
        wrapped,
        bare: e.to_string(),
    })
}
