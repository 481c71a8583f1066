//! Скалярные преобразования: суммы в двух локальных записях и метки
//! времени формата OFX (`YYYYMMDD[HHMMSS][.fff][[-n:TZ]]`).

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{OfxError, Result};

/// Конструктор даты-времени: (год, месяц, день, час, мин, сек).
/// `None` означает невалидные календарные поля.
pub type TimestampFactory = fn(i32, u32, u32, u32, u32, u32) -> Option<NaiveDateTime>;

/// Фабрика по умолчанию на базе chrono.
pub fn chrono_factory(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(y, mo, d).and_then(|date| date.and_hms_opt(h, mi, s))
}

/// Сумма с опциональным знаком в одной из двух записей:
/// UK/US `1,000.00` (запятая — группировка) либо континентальная
/// `1.000,00` (точка — группировка). Порядок проверки важен: сначала
/// UK/US, затем континентальная, затем прямое чтение числа.
///
/// Историческая причуда: `"100"` цепляется за первый шаблон и читается
/// как `1.00`, а не `100` — поведение сохранено ради совместимости и
/// закреплено тестом.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let s = raw.trim();

    let uk_us = Regex::new(r"^[+-]?[\d,]+\.?\d{2}$").map_err(|e| OfxError::Parse(e.to_string()))?;
    if uk_us.is_match(s) {
        let stripped = s.replace(',', "");
        let tail = Regex::new(r"\.?(\d{2})$").map_err(|e| OfxError::Parse(e.to_string()))?;
        let dotted = tail.replace(&stripped, ".${1}");
        return coerce(&dotted, raw);
    }

    let continental =
        Regex::new(r"^[+-]?[\d.]+,?\d{2}$").map_err(|e| OfxError::Parse(e.to_string()))?;
    if continental.is_match(s) {
        let stripped = s.replace('.', "");
        let tail = Regex::new(r",?(\d{2})$").map_err(|e| OfxError::Parse(e.to_string()))?;
        let dotted = tail.replace(&stripped, ".${1}");
        return coerce(&dotted, raw);
    }

    coerce(s, raw)
}

fn coerce(s: &str, raw: &str) -> Result<Decimal> {
    // Decimal не принимает ведущий плюс
    let s = s.strip_prefix('+').unwrap_or(s);
    s.parse::<Decimal>()
        .map_err(|_| OfxError::Amount(raw.to_string()))
}

/// Метка времени OFX через фабрику по умолчанию.
pub fn parse_datetime(raw: &str, tolerant: bool) -> Result<Option<NaiveDateTime>> {
    parse_datetime_with(raw, tolerant, chrono_factory)
}

/// Метка времени OFX: дата обязательна, время и доли секунды опциональны,
/// суффикс зоны в квадратных скобках принимается и игнорируется.
///
/// Пустой ввод — `Ok(None)`. Нечитаемый непустой ввод: в толерантном
/// режиме `Ok(None)`, в строгом — ошибка с самой строкой.
pub fn parse_datetime_with(
    raw: &str,
    tolerant: bool,
    factory: TimestampFactory,
) -> Result<Option<NaiveDateTime>> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }

    let re = Regex::new(
        r"^(\d{4})(\d{2})(\d{2})(?:(\d{2})(\d{2})(\d{2}))?(?:\.(\d{3}))?(?:\[[^\]]*\])?$",
    )
    .map_err(|e| OfxError::Parse(e.to_string()))?;

    let caps = match re.captures(s) {
        Some(c) => c,
        None if tolerant => return Ok(None),
        None => return Err(OfxError::Timestamp(raw.to_string())),
    };

    let num = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    let year = caps
        .get(1)
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .unwrap_or(0);

    match factory(year, num(2), num(3), num(4), num(5), num(6)) {
        Some(dt) => Ok(Some(dt)),
        None if tolerant => Ok(None),
        None => Err(OfxError::Timestamp(raw.to_string())),
    }
}
