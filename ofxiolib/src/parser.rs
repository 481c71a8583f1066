//! Точка входа: отделение заголовка, починка разметки, разбор дерева и
//! сборка сущностей по группам сообщений.

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use roxmltree::Node;
use rust_decimal::Decimal;

use crate::error::{OfxError, Result};
use crate::header;
use crate::investment::{InvestmentActivity, InvestmentPosition};
use crate::model::{
    Account, BankAccount, CreditCardAccount, Document, Institute, InvestmentAccount, SignOn,
    Statement, Status, Transaction,
};
use crate::scalar::{chrono_factory, parse_amount, parse_datetime_with, TimestampFactory};
use crate::sgml;

/// Разборщик одного OFX-документа.
///
/// Конструктор даты-времени передаётся явно и живёт в экземпляре, а не в
/// глобальном состоянии: параллельные разборы с разными фабриками не
/// мешают друг другу.
#[derive(Clone, Copy)]
pub struct Parser {
    pub(crate) factory: TimestampFactory,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            factory: chrono_factory,
        }
    }

    /// Подменить конструктор даты-времени (например, в тестах).
    pub fn with_timestamp_factory(factory: TimestampFactory) -> Self {
        Parser { factory }
    }

    /// Прочитать документ из файла. Отсутствующий путь — отдельная
    /// ошибка, без повторных попыток.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Document> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(OfxError::SourceNotFound(path.display().to_string()));
        }
        self.parse_str(&fs::read_to_string(path)?)
    }

    /// Разобрать документ из строки: заголовок до `<OFX>`, дальше тело.
    pub fn parse_str(&self, content: &str) -> Result<Document> {
        let at = find_root(content)?;
        let header = header::parse(&content[..at])?;
        let xml = sgml::normalize(&content[at..])?;
        let tree =
            roxmltree::Document::parse(&xml).map_err(|e| OfxError::Markup(e.to_string()))?;
        let root = tree.root_element();

        let mut warnings = Vec::new();
        let sign_on = self.build_sign_on(root)?;
        let mut accounts = Vec::new();
        self.build_bank_accounts(root, &mut accounts, &mut warnings)?;
        self.build_credit_card_accounts(root, &mut accounts, &mut warnings)?;
        self.build_investment_accounts(root, &mut accounts, &mut warnings)?;

        Ok(Document {
            header,
            sign_on,
            accounts,
            warnings,
        })
    }

    fn build_sign_on(&self, root: Node) -> Result<SignOn> {
        let msgs = child(root, "SIGNONMSGSRSV1")
            .ok_or_else(|| OfxError::Parse("SIGNONMSGSRSV1 group not found".into()))?;
        let sonrs =
            child(msgs, "SONRS").ok_or_else(|| OfxError::Parse("SONRS not found".into()))?;

        let status = match child(sonrs, "STATUS") {
            Some(st) => Status {
                code: child_text(st, "CODE"),
                severity: child_text(st, "SEVERITY"),
                message: child_text(st, "MESSAGE"),
            },
            None => Status::default(),
        };
        let institute = match child(sonrs, "FI") {
            Some(fi) => Institute {
                name: child_text(fi, "ORG"),
                id: child_text(fi, "FID"),
            },
            None => Institute::default(),
        };

        Ok(SignOn {
            status,
            server_date: parse_datetime_with(&child_text(sonrs, "DTSERVER"), true, self.factory)?,
            language: child_text(sonrs, "LANGUAGE"),
            institute,
        })
    }

    fn build_bank_accounts(
        &self,
        root: Node,
        accounts: &mut Vec<Account>,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        let Some(group) = child(root, "BANKMSGSRSV1") else {
            return Ok(());
        };
        for trnrs in group
            .children()
            .filter(|n| n.tag_name().name() == "STMTTRNRS")
        {
            let uid = child_text(trnrs, "TRNUID");
            for response in trnrs.children().filter(|n| n.tag_name().name() == "STMTRS") {
                accounts.push(Account::Bank(
                    self.build_bank_account(&uid, response, warnings)?,
                ));
            }
        }
        Ok(())
    }

    fn build_bank_account(
        &self,
        uid: &str,
        n: Node,
        warnings: &mut Vec<String>,
    ) -> Result<BankAccount> {
        let from = child(n, "BANKACCTFROM");
        let (balance, balance_date) = self.build_ledger_balance(n, warnings)?;
        Ok(BankAccount {
            transaction_uid: uid.to_string(),
            account_number: from.map(|f| child_text(f, "ACCTID")).unwrap_or_default(),
            routing_number: from.map(|f| child_text(f, "BANKID")).unwrap_or_default(),
            agency_number: from.map(|f| child_text(f, "BRANCHID")).unwrap_or_default(),
            account_type: from.map(|f| child_text(f, "ACCTTYPE")).unwrap_or_default(),
            balance,
            balance_date,
            statement: self.build_statement(n, warnings)?,
        })
    }

    fn build_credit_card_accounts(
        &self,
        root: Node,
        accounts: &mut Vec<Account>,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        let Some(group) = child(root, "CREDITCARDMSGSRSV1") else {
            return Ok(());
        };
        for trnrs in group
            .children()
            .filter(|n| n.tag_name().name() == "CCSTMTTRNRS")
        {
            let uid = child_text(trnrs, "TRNUID");
            for response in trnrs
                .children()
                .filter(|n| n.tag_name().name() == "CCSTMTRS")
            {
                accounts.push(Account::CreditCard(self.build_credit_card_account(
                    &uid, response, warnings,
                )?));
            }
        }
        Ok(())
    }

    fn build_credit_card_account(
        &self,
        uid: &str,
        n: Node,
        warnings: &mut Vec<String>,
    ) -> Result<CreditCardAccount> {
        // Часть файлов помечает карточный счёт банковским узлом: сначала
        // пробуем карточное имя, затем откатываемся на банковское.
        let from = child(n, "CCACCTFROM").or_else(|| child(n, "BANKACCTFROM"));
        let (balance, balance_date) = self.build_ledger_balance(n, warnings)?;
        Ok(CreditCardAccount {
            transaction_uid: uid.to_string(),
            account_number: from.map(|f| child_text(f, "ACCTID")).unwrap_or_default(),
            balance,
            balance_date,
            statement: self.build_statement(n, warnings)?,
        })
    }

    fn build_investment_accounts(
        &self,
        root: Node,
        accounts: &mut Vec<Account>,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        let Some(group) = child(root, "INVSTMTMSGSRSV1") else {
            return Ok(());
        };
        for trnrs in group
            .children()
            .filter(|n| n.tag_name().name() == "INVSTMTTRNRS")
        {
            let uid = child_text(trnrs, "TRNUID");
            for response in trnrs
                .children()
                .filter(|n| n.tag_name().name() == "INVSTMTRS")
            {
                accounts.push(Account::Investment(self.build_investment_account(
                    &uid, response, warnings,
                )?));
            }
        }
        Ok(())
    }

    fn build_investment_account(
        &self,
        uid: &str,
        n: Node,
        warnings: &mut Vec<String>,
    ) -> Result<InvestmentAccount> {
        let from = child(n, "INVACCTFROM");
        let available_cash = child(n, "INVBAL").and_then(|bal| {
            let raw = child_text_opt(bal, "AVAILCASH")?;
            match raw.parse::<Decimal>() {
                Ok(d) => Some(d),
                Err(_) => {
                    warnings.push(format!("AVAILCASH: unparsable number '{raw}'"));
                    None
                }
            }
        });

        let currency = child_text(n, "CURDEF");
        let (start_date, end_date, activity) = match child(n, "INVTRANLIST") {
            Some(list) => (
                parse_datetime_with(&child_text(list, "DTSTART"), true, self.factory)?,
                parse_datetime_with(&child_text(list, "DTEND"), true, self.factory)?,
                self.build_activity(list, warnings)?,
            ),
            None => (None, None, Vec::new()),
        };
        let positions = match child(n, "INVPOSLIST") {
            Some(list) => self.build_positions(list, warnings)?,
            None => Vec::new(),
        };

        Ok(InvestmentAccount {
            transaction_uid: uid.to_string(),
            broker_id: from.map(|f| child_text(f, "BROKERID")).unwrap_or_default(),
            account_number: from.map(|f| child_text(f, "ACCTID")).unwrap_or_default(),
            available_cash,
            statement: Statement {
                currency,
                start_date,
                end_date,
                transactions: activity,
            },
            positions,
        })
    }

    fn build_positions(
        &self,
        list: Node,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<InvestmentPosition>> {
        let mut positions = Vec::new();
        for node in list.children().filter(|n| n.is_element()) {
            if let Some(p) = InvestmentPosition::from_node(node, self, warnings)? {
                positions.push(p);
            }
        }
        Ok(positions)
    }

    fn build_activity(
        &self,
        list: Node,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<InvestmentActivity>> {
        let mut activity = Vec::new();
        for node in list.children().filter(|n| n.is_element()) {
            // незнакомые виды активности пропускаются без ошибки
            if let Some(item) = InvestmentActivity::from_node(node, self, warnings)? {
                activity.push(item);
            }
        }
        Ok(activity)
    }

    fn build_statement(&self, n: Node, warnings: &mut Vec<String>) -> Result<Statement<Transaction>> {
        let currency = child_text(n, "CURDEF");
        let Some(list) = child(n, "BANKTRANLIST") else {
            return Ok(Statement {
                currency,
                start_date: None,
                end_date: None,
                transactions: Vec::new(),
            });
        };
        let start_date = parse_datetime_with(&child_text(list, "DTSTART"), true, self.factory)?;
        let end_date = parse_datetime_with(&child_text(list, "DTEND"), true, self.factory)?;

        let mut transactions = Vec::new();
        for t in list.children().filter(|c| c.tag_name().name() == "STMTTRN") {
            transactions.push(self.build_transaction(t, warnings)?);
        }

        Ok(Statement {
            currency,
            start_date,
            end_date,
            transactions,
        })
    }

    pub(crate) fn build_transaction(
        &self,
        t: Node,
        warnings: &mut Vec<String>,
    ) -> Result<Transaction> {
        let trn_type = child_text(t, "TRNTYPE");
        // CHECKNUM осмыслен только у чеков
        let check_number = if trn_type == "CHECK" {
            child_text_opt(t, "CHECKNUM")
        } else {
            None
        };
        Ok(Transaction {
            posted_date: parse_datetime_with(&child_text(t, "DTPOSTED"), false, self.factory)?,
            user_date: parse_datetime_with(&child_text(t, "DTUSER"), false, self.factory)?,
            amount: checked_amount(&child_text(t, "TRNAMT"), "TRNAMT", warnings),
            unique_id: child_text(t, "FITID"),
            payee: child_text(t, "NAME"),
            memo: child_text(t, "MEMO"),
            sic: child_text_opt(t, "SIC"),
            check_number,
            trn_type,
        })
    }

    fn build_ledger_balance(
        &self,
        n: Node,
        warnings: &mut Vec<String>,
    ) -> Result<(Decimal, Option<NaiveDateTime>)> {
        let Some(bal) = child(n, "LEDGERBAL") else {
            return Ok((Decimal::ZERO, None));
        };
        let amount = checked_amount(&child_text(bal, "BALAMT"), "BALAMT", warnings);
        let date = parse_datetime_with(&child_text(bal, "DTASOF"), true, self.factory)?;
        Ok((amount, date))
    }
}

/// Начало тела `<OFX>`, без учёта регистра.
fn find_root(content: &str) -> Result<usize> {
    content
        .to_ascii_uppercase()
        .find("<OFX>")
        .ok_or_else(|| OfxError::Parse("<OFX> root tag not found".into()))
}

/// Нечитаемая сумма не валит разбор целиком: остальная выписка полезна и
/// без неё. Подставляем ноль и фиксируем диагностику.
fn checked_amount(raw: &str, field: &str, warnings: &mut Vec<String>) -> Decimal {
    if raw.is_empty() {
        return Decimal::ZERO;
    }
    match parse_amount(raw) {
        Ok(d) => d,
        Err(_) => {
            warnings.push(format!("{field}: unparsable amount '{raw}', using 0"));
            Decimal::ZERO
        }
    }
}

pub(crate) fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.tag_name().name() == name)
}

pub(crate) fn child_text(node: Node, name: &str) -> String {
    child(node, name)
        .and_then(|n| n.text())
        .unwrap_or("")
        .trim()
        .to_string()
}

pub(crate) fn child_text_opt(node: Node, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
