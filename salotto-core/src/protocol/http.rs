use serde::{Deserialize, Serialize};

/*
    http dto for http requests

    GET /messages risponde con l'array nudo di Message, quindi non serve un
    DTO dedicato alla lista.
*/

/// Corpo di POST /messages. I campi sono Option così la loro assenza arriva
/// fino all'handler e diventa un 400 con l'errore wire, invece di un rigetto
/// del framework.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppendMessageRequest {
    pub text: Option<String>,
    pub sender: Option<String>,
}
