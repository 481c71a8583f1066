//! Заголовок OFX-файла: строки `Key:Value` либо однострочный
//! `<?OFX KEY="VAL" ...?>`. Значения наружу отдаются как есть,
//! библиотека их не интерпретирует.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{OfxError, Result};

/// Упорядоченный набор пар ключ-значение. Ключи могут повторяться;
/// при чтении побеждает последняя запись.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header(Vec<(String, String)>);

impl Header {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn parse(raw: &str) -> Result<Header> {
    let trimmed = raw.trim();
    let mut pairs = Vec::new();

    if trimmed.starts_with("<?") {
        let attr = Regex::new(r#"(\w+)="([^"]*)""#).map_err(|e| OfxError::Parse(e.to_string()))?;
        for caps in attr.captures_iter(trimmed) {
            pairs.push((caps[1].to_string(), caps[2].to_string()));
        }
    } else {
        for line in trimmed.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some((k, v)) = line.split_once(':') {
                pairs.push((k.trim().to_string(), v.trim().to_string()));
            }
        }
    }

    Ok(Header(pairs))
}
