//! Починка OFX-овского SGML-«супа» до корректного XML.
//!
//! Исправляются ровно две наблюдаемые поломки: незакрытый листовой тег
//! (`<MEMO>pays rent`) и открытый тег без содержимого и без закрытия.
//! Всё остальное отдаётся XML-парсеру как есть — о прочих дефектах
//! сообщает уже он.

use regex::Regex;

use crate::error::{OfxError, Result};

pub fn normalize(body: &str) -> Result<String> {
    let text = body.replace("\r\n", "\n").replace('\r', "\n");
    let text = escape_stray_ampersands(&text);
    let text = split_single_line(&text);

    // Листовое содержимое: буквы (включая диакритику), цифры, валютные
    // знаки и пунктуация, встречающиеся в полях NAME/MEMO реальных выгрузок.
    let leaf = Regex::new(
        r#"^<([A-Za-z0-9.]+)>([\wà-úÀ-Ú .,\-_+;:\[\]'&/\\*(){}|!£$?=@€±§#%~`"]+)$"#,
    )
    .map_err(|e| OfxError::Parse(e.to_string()))?;

    let mut lines: Vec<String> = text
        .lines()
        .map(|line| close_unclosed_leaf(&leaf, line.trim()))
        .collect();

    self_close_childless(&mut lines)?;

    Ok(lines.join("\n").trim().to_string())
}

/// `<TAG>значение` без закрытия на той же строке → `<TAG>значение</TAG>`.
/// Пустой `<MEMO>` без закрытия встречается в реальных выгрузках и
/// закрывается отдельно. Самодостаточные строки проходят без изменений.
fn close_unclosed_leaf(leaf: &Regex, line: &str) -> String {
    if line == "<MEMO>" {
        return "<MEMO></MEMO>".to_string();
    }
    if let Some(caps) = leaf.captures(line) {
        return format!("<{0}>{1}</{0}>", &caps[1], &caps[2]);
    }
    line.to_string()
}

/// Одинокий `&`, не начинающий ссылку на сущность (`&name;` / `&#123;`),
/// экранируется в `&amp;` — иначе XML-парсер споткнётся.
fn escape_stray_ampersands(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        if is_entity_reference(tail) {
            out.push('&');
        } else {
            out.push_str("&amp;");
        }
        rest = tail;
    }
    out.push_str(rest);
    out
}

fn is_entity_reference(tail: &str) -> bool {
    let t = tail.strip_prefix('#').unwrap_or(tail);
    let n = t.chars().take_while(|c| c.is_ascii_alphanumeric()).count();
    n > 0 && t.chars().nth(n) == Some(';')
}

/// Документ целиком в одну строку: возвращаем каждому тегу свою строку.
/// Закрывающий тег остаётся на строке только у собственной пары — так
/// `<TAG>x</TAG>` не разрывается, а `<SEVERITY>INFO</STATUS>` делится,
/// и листовая починка добирает первую половину.
fn split_single_line(text: &str) -> String {
    let body = text.trim();
    if body.lines().count() > 1 {
        return text.to_string();
    }

    let mut out = String::with_capacity(body.len() + 64);
    let mut line_open: Option<&str> = None;
    let mut rest = body;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let Some(gt) = tail[1..].find('>').map(|i| i + 1) else {
            out.push_str(tail);
            return out;
        };
        let inner = &tail[1..gt];
        if let Some(closed) = inner.strip_prefix('/') {
            if line_open != Some(closed) {
                out.push('\n');
            }
            out.push_str(&tail[..=gt]);
            line_open = None;
        } else if inner.starts_with('?') || inner.starts_with('!') {
            out.push_str(&tail[..=gt]);
        } else {
            out.push('\n');
            out.push_str(&tail[..=gt]);
            line_open = Some(inner);
        }
        rest = &tail[gt + 1..];
    }
    out.push_str(rest);
    out
}

/// Стековый проход: открытия без пары внутри закрывшегося агрегата — это
/// узлы без текста и детей, переписываем их в самозакрытую форму `<TAG/>`.
/// Закрытие без открытия и незакрытые агрегаты в конце не трогаем.
fn self_close_childless(lines: &mut [String]) -> Result<()> {
    let open = Regex::new(r"^<([A-Za-z0-9.]+)>$").map_err(|e| OfxError::Parse(e.to_string()))?;
    let close = Regex::new(r"^</([A-Za-z0-9.]+)>$").map_err(|e| OfxError::Parse(e.to_string()))?;

    let mut stack: Vec<(usize, String)> = Vec::new();
    for i in 0..lines.len() {
        if let Some(caps) = open.captures(&lines[i]) {
            stack.push((i, caps[1].to_string()));
            continue;
        }
        let name = match close.captures(&lines[i]) {
            Some(caps) => caps[1].to_string(),
            None => continue,
        };
        let Some(found) = stack.iter().rposition(|(_, n)| *n == name) else {
            continue;
        };
        for (j, n) in stack.drain(found + 1..) {
            lines[j] = format!("<{n}/>");
        }
        stack.pop();
    }
    Ok(())
}
