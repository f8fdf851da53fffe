//! Pure parsing for the dashboard's two-request data protocol.

use crate::dataset::format_row;
use crate::errors::FetchError;
use crate::length_prefixed::decode_frames;
use crate::models::ScrapeSession;
use chrono::NaiveDate;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

pub const CONFIG_SELECTOR: &str = "textarea#tsConfigContainer";

pub const DATA_VALUES_POINTER: &str = "/secondaryInfo/presModelMap/dataDictionary/presModelHolder/genDataDictionaryPresModel/dataSegments/0/dataColumns/0/dataValues";

pub fn extract_session(html: &str) -> Result<ScrapeSession, FetchError> {
    let selector = Selector::parse(CONFIG_SELECTOR)
        .map_err(|err| FetchError::parse(format!("bad selector {CONFIG_SELECTOR}: {err}")))?;
    let document = Html::parse_document(html);
    let element = document
        .select(&selector)
        .next()
        .ok_or_else(|| FetchError::parse(format!("page has no {CONFIG_SELECTOR}")))?;

    let text: String = element.text().collect();
    let blob: Value = serde_json::from_str(&text)
        .map_err(|err| FetchError::parse(format!("session blob is not JSON: {err}")))?;

    Ok(ScrapeSession {
        sheet_id: string_field(&blob, "sheetId")?,
        vizql_root: string_field(&blob, "vizql_root")?,
        session_id: string_field(&blob, "sessionid")?,
    })
}

fn string_field(blob: &Value, name: &str) -> Result<String, FetchError> {
    match blob.get(name) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(Value::Number(value)) => Ok(value.to_string()),
        Some(other) => Err(FetchError::parse(format!(
            "session blob field {name} has unexpected shape: {other}"
        ))),
        None => Err(FetchError::parse(format!("session blob has no {name}"))),
    }
}

/// `<origin>/<vizql_root>/bootstrapSession/sessions/<sessionid>`.
pub fn session_url(origin: &Url, session: &ScrapeSession) -> String {
    let origin = origin.origin().ascii_serialization();
    let root = session.vizql_root.trim_matches('/');
    format!(
        "{origin}/{root}/bootstrapSession/sessions/{}",
        session.session_id
    )
}

/// Pulls the integer column out of the second document of a session response. Anything after
/// the second document is ignored.
pub fn extract_values(body: &str) -> Result<Vec<i64>, FetchError> {
    let frames = decode_frames(body, 2)?;
    if frames.len() < 2 {
        return Err(FetchError::parse(format!(
            "session response holds {} document(s), expected 2",
            frames.len()
        )));
    }

    let values = frames[1]
        .value
        .pointer(DATA_VALUES_POINTER)
        .ok_or_else(|| FetchError::parse(format!("session response has no {DATA_VALUES_POINTER}")))?
        .as_array()
        .ok_or_else(|| FetchError::parse("dataValues is not an array"))?;

    if values.is_empty() {
        return Err(FetchError::parse("dataValues is empty"));
    }

    values.iter().map(as_count).collect()
}

fn as_count(value: &Value) -> Result<i64, FetchError> {
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
        _ => Err(FetchError::parse(format!("dataValues entry {value} is not an integer"))),
    }
}

/// Applies the first-value offset and stamps the row with `today`.
pub fn build_row(
    today: NaiveDate,
    mut values: Vec<i64>,
    first_value_offset: i64,
) -> Result<String, FetchError> {
    if let Some(first) = values.first_mut() {
        *first = first.checked_add(first_value_offset).ok_or_else(|| {
            FetchError::parse(format!(
                "first value {first} overflows with offset {first_value_offset}"
            ))
        })?;
    }
    Ok(format_row(today, &values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(blob: &str) -> String {
        format!(
            r#"<html><body><div id="viz"></div>
            <textarea id="tsConfigContainer" style="display:none">{blob}</textarea>
            </body></html>"#
        )
    }

    fn session_body(values: Value) -> String {
        let first = json!({"worldUpdate": {"applicationPresModel": {}}}).to_string();
        let second = json!({
            "secondaryInfo": {"presModelMap": {"dataDictionary": {"presModelHolder": {
                "genDataDictionaryPresModel": {"dataSegments": {"0": {"dataColumns": [
                    {"dataType": "integer", "dataValues": values},
                    {"dataType": "cstring", "dataValues": ["x"]}
                ]}}}
            }}}}
        })
        .to_string();
        format!("{};{first}{};{second}", first.len(), second.len())
    }

    #[test]
    fn reads_session_blob() {
        let html = page(r#"{"sheetId":"Dashboard 1","vizql_root":"/vizql/w/Covid/v/Dashboard","sessionid":"ABC-1"}"#);
        let session = extract_session(&html).unwrap();
        assert_eq!(session.sheet_id, "Dashboard 1");
        assert_eq!(session.vizql_root, "/vizql/w/Covid/v/Dashboard");
        assert_eq!(session.session_id, "ABC-1");
    }

    #[test]
    fn blob_text_is_html_unescaped() {
        let html = page(r#"{"sheetId":"A &amp; B","vizql_root":"/v","sessionid":"1"}"#);
        assert_eq!(extract_session(&html).unwrap().sheet_id, "A & B");
    }

    #[test]
    fn missing_container_is_parse_error() {
        let err = extract_session("<html><body><p>moved</p></body></html>").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn invalid_blob_is_parse_error() {
        assert!(matches!(extract_session(&page("{not json")), Err(FetchError::Parse(_))));
        let missing = page(r#"{"sheetId":"s","vizql_root":"/v"}"#);
        assert!(matches!(extract_session(&missing), Err(FetchError::Parse(_))));
    }

    #[test]
    fn session_url_uses_page_host_and_blob_fields() {
        let origin = Url::parse("https://public.tableau.com/views/Covid/Dashboard?:embed=y").unwrap();
        let session = ScrapeSession {
            sheet_id: "Dashboard".to_string(),
            vizql_root: "/vizql/w/Covid/v/Dashboard".to_string(),
            session_id: "F00D".to_string(),
        };
        assert_eq!(
            session_url(&origin, &session),
            "https://public.tableau.com/vizql/w/Covid/v/Dashboard/bootstrapSession/sessions/F00D"
        );
    }

    #[test]
    fn values_come_from_second_document() {
        let body = session_body(json!([100, 7, 3]));
        assert_eq!(extract_values(&body).unwrap(), vec![100, 7, 3]);
    }

    #[test]
    fn integral_floats_are_accepted() {
        let body = session_body(json!([100.0, 7]));
        assert_eq!(extract_values(&body).unwrap(), vec![100, 7]);
    }

    #[test]
    fn single_document_is_parse_error() {
        let err = extract_values(r#"2;{}"#).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn unprefixed_body_is_parse_error() {
        let err = extract_values(r#"{"a":1}{"b":2}"#).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn missing_path_is_parse_error() {
        let err = extract_values(r#"2;{}13;{"secondary":1}"#).unwrap_err();
        assert!(matches!(err, FetchError::Parse(msg) if msg.contains("dataValues")));
    }

    #[test]
    fn non_integer_values_are_parse_errors() {
        assert!(extract_values(&session_body(json!(["many", 2]))).is_err());
        assert!(extract_values(&session_body(json!([]))).is_err());
    }

    #[test]
    fn offset_applies_to_first_value_only() {
        let today = NaiveDate::from_ymd_opt(2020, 10, 5).unwrap();
        assert_eq!(build_row(today, vec![120, 4, 9], 80).unwrap(), "10/05/2020,200,4,9");
        assert_eq!(build_row(today, vec![-80], 80).unwrap(), "10/05/2020,0");
    }

    #[test]
    fn offset_overflow_is_parse_error() {
        let today = NaiveDate::from_ymd_opt(2020, 10, 5).unwrap();
        let err = build_row(today, vec![i64::MAX], 80).unwrap_err();
        assert!(matches!(err, FetchError::Parse(msg) if msg.contains("overflows")));
    }

    #[test]
    fn text_after_second_document_is_ignored() {
        let body = format!("{}\n<!-- served by vizql -->", session_body(json!([92, 4])));
        assert_eq!(extract_values(&body).unwrap(), vec![92, 4]);
    }
}
