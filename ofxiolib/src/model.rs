//! Доменные сущности OFX-документа — единый типизированный слой.
//! Дерево владения строгое: документ → счета → выписка → операции;
//! перекрёстных ссылок нет, после сборки ничего не мутируется.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::header::Header;
use crate::investment::{InvestmentActivity, InvestmentPosition};

/// Корень одного разобранного сообщения.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub header: Header,
    pub sign_on: SignOn,
    pub accounts: Vec<Account>,
    /// Диагностика мягких сбоев (нечитаемая сумма и т.п.): разбор не
    /// падает, но вызывающая сторона должна их видеть.
    pub warnings: Vec<String>,
}

impl Document {
    /// Счёт документа, когда он ровно один; иначе `None`.
    pub fn account(&self) -> Option<&Account> {
        if self.accounts.len() == 1 {
            self.accounts.first()
        } else {
            None
        }
    }

    /// Операции единственного банковского или карточного счёта —
    /// удобство для самого частого случая.
    pub fn transactions(&self) -> Option<&[Transaction]> {
        match self.account()? {
            Account::Bank(a) => Some(&a.statement.transactions),
            Account::CreditCard(a) => Some(&a.statement.transactions),
            Account::Investment(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignOn {
    pub status: Status,
    pub server_date: Option<NaiveDateTime>,
    pub language: String,
    pub institute: Institute,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Institute {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Status {
    pub code: String,
    pub severity: String,
    pub message: String,
}

impl Status {
    /// Расшифровка кода статуса; незнакомый код — пустая строка, не ошибка.
    pub fn code_description(&self) -> &'static str {
        match self.code.as_str() {
            "0" => "Success",
            "2000" => "General error",
            "15000" => "Must change USERPASS",
            "15500" => "Signon invalid",
            "15501" => "Customer account already in use",
            "15502" => "USERPASS Lockout",
            _ => "",
        }
    }
}

/// Счёт — размеченное объединение трёх разновидностей.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Account {
    Bank(BankAccount),
    CreditCard(CreditCardAccount),
    Investment(InvestmentAccount),
}

impl Account {
    pub fn account_number(&self) -> &str {
        match self {
            Account::Bank(a) => &a.account_number,
            Account::CreditCard(a) => &a.account_number,
            Account::Investment(a) => &a.account_number,
        }
    }

    pub fn transaction_uid(&self) -> &str {
        match self {
            Account::Bank(a) => &a.transaction_uid,
            Account::CreditCard(a) => &a.transaction_uid,
            Account::Investment(a) => &a.transaction_uid,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub transaction_uid: String,
    pub account_number: String,
    /// BANKID — маршрутный номер банка.
    pub routing_number: String,
    /// BRANCHID — номер отделения.
    pub agency_number: String,
    pub account_type: String,
    pub balance: Decimal,
    pub balance_date: Option<NaiveDateTime>,
    pub statement: Statement<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCardAccount {
    pub transaction_uid: String,
    pub account_number: String,
    pub balance: Decimal,
    pub balance_date: Option<NaiveDateTime>,
    pub statement: Statement<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentAccount {
    pub transaction_uid: String,
    pub broker_id: String,
    pub account_number: String,
    pub available_cash: Option<Decimal>,
    pub statement: Statement<InvestmentActivity>,
    /// Позиции по бумагам на дату выписки (INVPOSLIST).
    pub positions: Vec<InvestmentPosition>,
}

/// Выписка; инвестиционные выписки часто опускают границы периода.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement<T> {
    pub currency: String,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub transactions: Vec<T>,
}

/// Операция банковской или карточной выписки.
///
/// `unique_id` вместе с номером счёта однозначно идентифицирует операцию
/// между повторными загрузками одного периода — на этом строится
/// дедупликация у потребителей.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub trn_type: String,
    pub posted_date: Option<NaiveDateTime>,
    /// Дата инициации клиентом; заполняется только при непустом поле.
    pub user_date: Option<NaiveDateTime>,
    pub amount: Decimal,
    pub unique_id: String,
    pub payee: String,
    pub memo: String,
    /// Стандартный отраслевой код, если банк его прислал.
    pub sic: Option<String>,
    /// Номер чека; заполняется только у операций типа CHECK.
    pub check_number: Option<String>,
}

impl Transaction {
    /// Расшифровка типа операции; незнакомый тип — пустая строка, не ошибка.
    pub fn type_description(&self) -> &'static str {
        match self.trn_type.as_str() {
            "CREDIT" => "Generic credit",
            "DEBIT" => "Generic debit",
            "INT" => "Interest earned or paid",
            "DIV" => "Dividend",
            "FEE" => "FI fee",
            "SRVCHG" => "Service charge",
            "DEP" => "Deposit",
            "ATM" => "ATM debit or credit",
            "POS" => "Point of sale debit or credit",
            "XFER" => "Transfer",
            "CHECK" => "Cheque",
            "PAYMENT" => "Electronic payment",
            "CASH" => "Cash withdrawal",
            "DIRECTDEP" => "Direct deposit",
            "DIRECTDEBIT" => "Merchant initiated debit",
            "REPEATPMT" => "Repeating payment/standing order",
            "OTHER" => "Other",
            _ => "",
        }
    }
}
