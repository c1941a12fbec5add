//! Response decoding shared by all steps.
//!
//! gCTS endpoints answer with JSON documents that carry the payload next to a
//! common diagnostic envelope (`log`, `errorLog`, `exception`). ADT endpoints
//! answer with XML.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::error::{GctsError, Result};
use crate::transport::HttpResponse;

/// Decode a JSON response body.
pub fn decode_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    Ok(serde_json::from_slice(&response.body)?)
}

/// Decode an XML response body. Namespace prefixes on element and attribute
/// names are not significant.
pub fn decode_xml<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    Ok(quick_xml::de::from_str(xml_text(response)?)?)
}

/// Decode an XML response body whose root element must be `root` (local
/// name, prefix ignored). Any other document is a decode error.
pub fn decode_xml_document<T: DeserializeOwned>(response: &HttpResponse, root: &str) -> Result<T> {
    let text = xml_text(response)?;
    let found = root_element(text)?;
    if found != root {
        return Err(GctsError::Xml(format!(
            "expected a <{root}> document, found <{found}>"
        )));
    }
    Ok(quick_xml::de::from_str(text)?)
}

fn xml_text(response: &HttpResponse) -> Result<&str> {
    std::str::from_utf8(&response.body)
        .map_err(|e| GctsError::Xml(format!("body is not valid UTF-8: {e}")))
}

/// Local name of the first element in `text`.
fn root_element(text: &str) -> Result<String> {
    let mut reader = Reader::from_str(text);
    loop {
        match reader
            .read_event()
            .map_err(|e| GctsError::Xml(e.to_string()))?
        {
            Event::Start(element) | Event::Empty(element) => {
                return Ok(String::from_utf8_lossy(element.local_name().as_ref()).into_owned());
            }
            Event::Eof => return Err(GctsError::Xml("document has no root element".to_string())),
            _ => {}
        }
    }
}

/// Fail with [`GctsError::Http`] unless the status is 2xx.
pub fn ensure_success(response: &HttpResponse, url: &str) -> Result<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(GctsError::Http {
            status: response.status,
            url: url.to_string(),
        })
    }
}

/// One entry of a gCTS `log` or `errorLog` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GctsLog {
    pub time: i64,
    pub user: String,
    pub section: String,
    pub action: String,
    pub severity: String,
    pub message: String,
    pub code: String,
}

/// Structured `exception` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GctsException {
    pub message: String,
    pub description: String,
    pub code: i64,
}

/// `exception` arrives either as plain text or as an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExceptionField {
    Text(String),
    Structured(GctsException),
}

fn text_or_exception<'de, D>(deserializer: D) -> std::result::Result<Option<GctsException>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<ExceptionField>::deserialize(deserializer)?;
    Ok(field.map(|field| match field {
        ExceptionField::Text(message) => GctsException {
            message,
            ..GctsException::default()
        },
        ExceptionField::Structured(exception) => exception,
    }))
}

/// Diagnostic fields present on most gCTS responses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Diagnostics {
    pub log: Vec<GctsLog>,
    #[serde(rename = "errorLog")]
    pub error_log: Vec<GctsLog>,
    #[serde(deserialize_with = "text_or_exception")]
    pub exception: Option<GctsException>,
}

impl Diagnostics {
    /// Find an `errorLog` entry by its code, wherever it sits in the array.
    pub fn find_error_code(&self, code: &str) -> Option<&GctsLog> {
        self.error_log.iter().find(|entry| entry.code == code)
    }
}
