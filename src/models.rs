// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

/// Normalized status strings that count as settled.
pub const SETTLED_STATUSES: [&str; 3] = ["оплачен", "paid", "closed"];

pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn is_settled(status: Option<&str>) -> bool {
    status.is_some_and(|s| SETTLED_STATUSES.contains(&s))
}

/// An untyped scalar as it arrives from the ingestion side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Text(String),
    Number(Decimal),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Text form of the value; `None` for nulls.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Null => None,
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Number(d) => Some(d.normalize().to_string()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<Decimal> for RawValue {
    fn from(d: Decimal) -> Self {
        RawValue::Number(d)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(RawValue::Null)
    }
}

/// Rows of raw values aligned by position with `columns`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<RawValue>) {
        row.resize(self.columns.len(), RawValue::Null);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Canonical invoice fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    InvoiceId,
    Contractor,
    Vessel,
    Country,
    Incoterms,
    Bank,
    SalesChannel,
    InvoiceDate,
    InvoiceAmount,
    InvoiceCurrency,
    Status,
    PaymentDate,
    PaymentAmount,
    CrossRate,
    Manager,
    Comment,
}

impl Field {
    pub const ALL: [Field; 16] = [
        Field::InvoiceId,
        Field::Contractor,
        Field::Vessel,
        Field::Country,
        Field::Incoterms,
        Field::Bank,
        Field::SalesChannel,
        Field::InvoiceDate,
        Field::InvoiceAmount,
        Field::InvoiceCurrency,
        Field::Status,
        Field::PaymentDate,
        Field::PaymentAmount,
        Field::CrossRate,
        Field::Manager,
        Field::Comment,
    ];

    pub const DATES: [Field; 2] = [Field::InvoiceDate, Field::PaymentDate];
    pub const AMOUNTS: [Field; 2] = [Field::InvoiceAmount, Field::PaymentAmount];
    pub const CATEGORICAL: [Field; 4] =
        [Field::Status, Field::Contractor, Field::Country, Field::Manager];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::InvoiceId => "invoice_id",
            Field::Contractor => "contractor",
            Field::Vessel => "vessel",
            Field::Country => "country",
            Field::Incoterms => "incoterms",
            Field::Bank => "bank",
            Field::SalesChannel => "sales_channel",
            Field::InvoiceDate => "invoice_date",
            Field::InvoiceAmount => "invoice_amount",
            Field::InvoiceCurrency => "invoice_currency",
            Field::Status => "status",
            Field::PaymentDate => "payment_date",
            Field::PaymentAmount => "payment_amount",
            Field::CrossRate => "cross_rate",
            Field::Manager => "manager",
            Field::Comment => "comment",
        }
    }

    /// Maps a source header (localized export name or canonical name) to a field.
    pub fn from_source(name: &str) -> Option<Field> {
        let f = match name.trim() {
            "Контрагент" => Field::Contractor,
            "Судно" => Field::Vessel,
            "Страна" => Field::Country,
            "ИНКОТЕРМС" => Field::Incoterms,
            "Банк" => Field::Bank,
            "Канал продаж" => Field::SalesChannel,
            "Номер инвойса" => Field::InvoiceId,
            "Дата инвойса или его отправки" => Field::InvoiceDate,
            "Сумма инвойса" => Field::InvoiceAmount,
            "Валюта инвойса" => Field::InvoiceCurrency,
            "Состояние инвойса" => Field::Status,
            "Дата фактического зачисления" => Field::PaymentDate,
            "Сумма фактической оплаты" => Field::PaymentAmount,
            "кросс-курс" => Field::CrossRate,
            "Менеджер" => Field::Manager,
            "Комментарий" => Field::Comment,
            other => return Field::ALL.into_iter().find(|f| f.as_str() == other),
        };
        Some(f)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of parsing one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell<T> {
    Parsed(T),
    /// Null cell or absent column.
    Missing,
    /// Present but malformed; keeps the original text.
    Invalid(String),
}

impl<T> Cell<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Cell::Parsed(v) => Some(v),
            Cell::Missing | Cell::Invalid(_) => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Cell::Invalid(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvoiceRecord {
    /// Position of the record in the raw input.
    pub row: usize,
    pub invoice_id: Option<String>,
    pub contractor: Option<String>,
    pub vessel: Option<String>,
    pub country: Option<String>,
    pub incoterms: Option<String>,
    pub bank: Option<String>,
    pub sales_channel: Option<String>,
    pub invoice_date: Option<NaiveDateTime>,
    pub invoice_amount: Option<Decimal>,
    pub invoice_currency: Option<String>,
    pub status: Option<String>,
    pub payment_date: Option<NaiveDateTime>,
    pub payment_amount: Option<Decimal>,
    pub cross_rate: Option<Decimal>,
    pub manager: Option<String>,
    pub comment: Option<String>,
    pub amount_reporting_currency: Option<Decimal>,
    pub risk_score: u8,
    pub due_date: Option<NaiveDateTime>,
}

impl InvoiceRecord {
    pub fn is_settled(&self) -> bool {
        is_settled(self.status.as_deref())
    }

    /// Due date strictly before `now`.
    pub fn is_past_due(&self, now: NaiveDateTime) -> bool {
        self.due_date.is_some_and(|d| d < now)
    }

    /// Past due and still outstanding.
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        self.is_past_due(now) && !self.is_settled()
    }

    fn raw_value(&self, field: Field) -> RawValue {
        let date = |d: Option<NaiveDateTime>| {
            d.map(|d| RawValue::Text(d.format(DATETIME_FMT).to_string()))
                .unwrap_or(RawValue::Null)
        };
        let text = |s: &Option<String>| RawValue::from(s.as_deref());
        match field {
            Field::InvoiceId => text(&self.invoice_id),
            Field::Contractor => text(&self.contractor),
            Field::Vessel => text(&self.vessel),
            Field::Country => text(&self.country),
            Field::Incoterms => text(&self.incoterms),
            Field::Bank => text(&self.bank),
            Field::SalesChannel => text(&self.sales_channel),
            Field::InvoiceDate => date(self.invoice_date),
            Field::InvoiceAmount => RawValue::from(self.invoice_amount),
            Field::InvoiceCurrency => text(&self.invoice_currency),
            Field::Status => text(&self.status),
            Field::PaymentDate => date(self.payment_date),
            Field::PaymentAmount => RawValue::from(self.payment_amount),
            Field::CrossRate => RawValue::from(self.cross_rate),
            Field::Manager => text(&self.manager),
            Field::Comment => text(&self.comment),
        }
    }

    /// Renders cleaned records back into a table with canonical headers.
    pub fn to_raw_table(records: &[InvoiceRecord]) -> RawTable {
        let mut table = RawTable::new(Field::ALL.iter().map(|f| f.to_string()).collect());
        for r in records {
            table.push_row(Field::ALL.iter().map(|f| r.raw_value(*f)).collect());
        }
        table
    }
}
