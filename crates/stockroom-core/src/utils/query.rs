use reqwest::Url;
use serde::Serialize;
use serde_json::Value;

/// Build a URL query string from a serializable filter struct.
///
/// Absent (`None`) values and blank strings are skipped; arrays expand to
/// repeated `key[]=value` pairs. Anything that is not a struct or map yields
/// an empty string.
pub fn build_query<T: Serialize>(params: &T) -> String {
    let Ok(Value::Object(fields)) = serde_json::to_value(params) else {
        return String::new();
    };
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return String::new();
    };

    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &fields {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    let array_key = format!("{}[]", key);
                    for item in items {
                        pairs.append_pair(&array_key, &scalar(item));
                    }
                }
                Value::String(s) if s.trim().is_empty() => {}
                other => {
                    pairs.append_pair(key, &scalar(other));
                }
            }
        }
    }

    url.query().unwrap_or_default().to_string()
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
