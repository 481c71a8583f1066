//! Операции инвестиционной выписки: закрытое множество вариантов по виду
//! активности. Общие блоки полей (реквизиты сделки, идентификатор бумаги,
//! ценовая тройка) встроены в варианты по значению и заполняются общими
//! загрузчиками — без иерархий наследования.

use chrono::NaiveDateTime;
use roxmltree::Node;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Transaction;
use crate::parser::{child, child_text, child_text_opt, Parser};
use crate::scalar::parse_datetime_with;

/// Общие реквизиты сделки (агрегат `<INVTRAN>`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvTran {
    /// Идентификатор в системе брокера; не путать с UNIQUEID бумаги.
    pub unique_id: String,
    pub trade_date: Option<NaiveDateTime>,
    pub settlement_date: Option<NaiveDateTime>,
    pub memo: Option<String>,
}

/// Идентификатор торгуемой бумаги (агрегат `<SECID>`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecId {
    pub security_id: String,
    pub security_id_type: String,
}

/// Ценовая тройка плюс субсчета. Отсутствующее поле — `None`, не ноль.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pricing {
    pub units: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub total: Option<Decimal>,
    /// Субсчёт бумаги: CASH, MARGIN, SHORT, OTHER.
    pub sub_account_sec: Option<String>,
    /// Откуда пришли или куда ушли деньги: CASH, MARGIN, SHORT, OTHER.
    pub sub_account_fund: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuySecurity {
    pub inv_tran: InvTran,
    pub sec_id: SecId,
    pub pricing: Pricing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyStock {
    pub inv_tran: InvTran,
    pub sec_id: SecId,
    pub pricing: Pricing,
    /// BUY или BUYTOCOVER.
    pub buy_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyMutualFund {
    pub inv_tran: InvTran,
    pub sec_id: SecId,
    pub pricing: Pricing,
    pub buy_type: String,
    /// RELFITID — связывает пару операций обмена паевых фондов.
    pub related_unique_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellSecurity {
    pub inv_tran: InvTran,
    pub sec_id: SecId,
    pub pricing: Pricing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellStock {
    pub inv_tran: InvTran,
    pub sec_id: SecId,
    pub pricing: Pricing,
    /// SELL или SELLSHORT.
    pub sell_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellMutualFund {
    pub inv_tran: InvTran,
    pub sec_id: SecId,
    pub pricing: Pricing,
    pub sell_type: String,
    pub related_unique_id: Option<String>,
}

/// Доход по бумаге: CGLONG, CGSHORT, DIV, INTEREST, MISC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Income {
    pub inv_tran: InvTran,
    pub sec_id: SecId,
    pub pricing: Pricing,
    pub income_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reinvest {
    pub inv_tran: InvTran,
    pub sec_id: SecId,
    pub pricing: Pricing,
    pub income_type: String,
}

/// Обычный банковский перевод внутри инвестиционного счёта:
/// обёртка над `<STMTTRN>` с добавкой SUBACCTFUND.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankingActivity {
    pub transaction: Transaction,
    pub sub_account_fund: Option<String>,
}

/// Позиция по бумаге на дату выписки — агрегат `<INVPOS>` внутри
/// POSSTOCK/POSMF/POSDEBT/POSOPT/POSOTHER.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestmentPosition {
    pub sec_id: SecId,
    /// Субсчёт хранения: CASH, MARGIN, SHORT, OTHER.
    pub held_in_account: Option<String>,
    /// LONG или SHORT.
    pub position_type: String,
    pub units: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub market_value: Option<Decimal>,
    pub price_date: Option<NaiveDateTime>,
    pub memo: Option<String>,
}

impl InvestmentPosition {
    /// Позиции для всех видов бумаг читаются одинаково — из `<INVPOS>`;
    /// узлы с незнакомым именем пропускаются.
    pub(crate) fn from_node(
        node: Node,
        parser: &Parser,
        warnings: &mut Vec<String>,
    ) -> Result<Option<Self>> {
        match node.tag_name().name() {
            "POSMF" | "POSSTOCK" | "POSDEBT" | "POSOPT" | "POSOTHER" => {}
            _ => return Ok(None),
        }
        let Some(pos) = child(node, "INVPOS") else {
            return Ok(None);
        };
        Ok(Some(InvestmentPosition {
            sec_id: load_sec_id(pos),
            held_in_account: child_text_opt(pos, "HELDINACCT"),
            position_type: child_text(pos, "POSTYPE"),
            units: decimal_opt(pos, "UNITS", warnings),
            unit_price: decimal_opt(pos, "UNITPRICE", warnings),
            market_value: decimal_opt(pos, "MKTVAL", warnings),
            price_date: parse_datetime_with(&child_text(pos, "DTPRICEASOF"), true, parser.factory)?,
            memo: child_text_opt(pos, "MEMO"),
        }))
    }
}

/// Вариант инвестиционной активности, ключ — имя узла списка INVTRANLIST.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InvestmentActivity {
    BuySecurity(BuySecurity),
    BuyStock(BuyStock),
    BuyMutualFund(BuyMutualFund),
    SellSecurity(SellSecurity),
    SellStock(SellStock),
    SellMutualFund(SellMutualFund),
    Income(Income),
    Reinvest(Reinvest),
    Banking(BankingActivity),
}

impl InvestmentActivity {
    /// Диспетчеризация по имени узла. Покупки и продажи читают свои поля из
    /// вложенной обёртки `<INVBUY>`/`<INVSELL>` — так устроен сам формат;
    /// INCOME и REINVEST держат те же поля прямо в узле операции.
    /// Незнакомые имена (включая уже учтённые DTSTART/DTEND) дают `None`.
    pub(crate) fn from_node(
        node: Node,
        parser: &Parser,
        warnings: &mut Vec<String>,
    ) -> Result<Option<Self>> {
        let item = match node.tag_name().name() {
            "BUYOTHER" => match child(node, "INVBUY") {
                Some(wrap) => {
                    let (inv_tran, sec_id, pricing) = load_trade(wrap, parser, warnings)?;
                    Some(Self::BuySecurity(BuySecurity {
                        inv_tran,
                        sec_id,
                        pricing,
                    }))
                }
                None => None,
            },
            "BUYSTOCK" => match child(node, "INVBUY") {
                Some(wrap) => {
                    let (inv_tran, sec_id, pricing) = load_trade(wrap, parser, warnings)?;
                    Some(Self::BuyStock(BuyStock {
                        inv_tran,
                        sec_id,
                        pricing,
                        buy_type: child_text(node, "BUYTYPE"),
                    }))
                }
                None => None,
            },
            "BUYMF" => match child(node, "INVBUY") {
                Some(wrap) => {
                    let (inv_tran, sec_id, pricing) = load_trade(wrap, parser, warnings)?;
                    Some(Self::BuyMutualFund(BuyMutualFund {
                        inv_tran,
                        sec_id,
                        pricing,
                        buy_type: child_text(node, "BUYTYPE"),
                        related_unique_id: child_text_opt(node, "RELFITID"),
                    }))
                }
                None => None,
            },
            "SELLOTHER" => match child(node, "INVSELL") {
                Some(wrap) => {
                    let (inv_tran, sec_id, pricing) = load_trade(wrap, parser, warnings)?;
                    Some(Self::SellSecurity(SellSecurity {
                        inv_tran,
                        sec_id,
                        pricing,
                    }))
                }
                None => None,
            },
            "SELLSTOCK" => match child(node, "INVSELL") {
                Some(wrap) => {
                    let (inv_tran, sec_id, pricing) = load_trade(wrap, parser, warnings)?;
                    Some(Self::SellStock(SellStock {
                        inv_tran,
                        sec_id,
                        pricing,
                        sell_type: child_text(node, "SELLTYPE"),
                    }))
                }
                None => None,
            },
            "SELLMF" => match child(node, "INVSELL") {
                Some(wrap) => {
                    let (inv_tran, sec_id, pricing) = load_trade(wrap, parser, warnings)?;
                    Some(Self::SellMutualFund(SellMutualFund {
                        inv_tran,
                        sec_id,
                        pricing,
                        sell_type: child_text(node, "SELLTYPE"),
                        related_unique_id: child_text_opt(node, "RELFITID"),
                    }))
                }
                None => None,
            },
            "INCOME" => {
                let (inv_tran, sec_id, pricing) = load_trade(node, parser, warnings)?;
                Some(Self::Income(Income {
                    inv_tran,
                    sec_id,
                    pricing,
                    income_type: child_text(node, "INCOMETYPE"),
                }))
            }
            "REINVEST" => {
                let (inv_tran, sec_id, pricing) = load_trade(node, parser, warnings)?;
                Some(Self::Reinvest(Reinvest {
                    inv_tran,
                    sec_id,
                    pricing,
                    income_type: child_text(node, "INCOMETYPE"),
                }))
            }
            "INVBANKTRAN" => match child(node, "STMTTRN") {
                Some(stmt) => Some(Self::Banking(BankingActivity {
                    transaction: parser.build_transaction(stmt, warnings)?,
                    sub_account_fund: child_text_opt(node, "SUBACCTFUND"),
                })),
                None => None,
            },
            _ => None,
        };
        Ok(item)
    }

    /// Идентификатор операции в системе брокера.
    pub fn unique_id(&self) -> &str {
        match self {
            Self::BuySecurity(t) => &t.inv_tran.unique_id,
            Self::BuyStock(t) => &t.inv_tran.unique_id,
            Self::BuyMutualFund(t) => &t.inv_tran.unique_id,
            Self::SellSecurity(t) => &t.inv_tran.unique_id,
            Self::SellStock(t) => &t.inv_tran.unique_id,
            Self::SellMutualFund(t) => &t.inv_tran.unique_id,
            Self::Income(t) => &t.inv_tran.unique_id,
            Self::Reinvest(t) => &t.inv_tran.unique_id,
            Self::Banking(t) => &t.transaction.unique_id,
        }
    }
}

/// Общая сборка тройки (реквизиты, бумага, цены) из узла-хозяина.
fn load_trade(
    host: Node,
    parser: &Parser,
    warnings: &mut Vec<String>,
) -> Result<(InvTran, SecId, Pricing)> {
    Ok((
        load_inv_tran(host, parser)?,
        load_sec_id(host),
        load_pricing(host, warnings),
    ))
}

fn load_inv_tran(host: Node, parser: &Parser) -> Result<InvTran> {
    let Some(n) = child(host, "INVTRAN") else {
        return Ok(InvTran::default());
    };
    Ok(InvTran {
        unique_id: child_text(n, "FITID"),
        trade_date: parse_datetime_with(&child_text(n, "DTTRADE"), false, parser.factory)?,
        settlement_date: parse_datetime_with(&child_text(n, "DTSETTLE"), false, parser.factory)?,
        memo: child_text_opt(n, "MEMO"),
    })
}

fn load_sec_id(host: Node) -> SecId {
    let Some(n) = child(host, "SECID") else {
        return SecId::default();
    };
    SecId {
        security_id: child_text(n, "UNIQUEID"),
        security_id_type: child_text(n, "UNIQUEIDTYPE"),
    }
}

fn load_pricing(host: Node, warnings: &mut Vec<String>) -> Pricing {
    Pricing {
        units: decimal_opt(host, "UNITS", warnings),
        unit_price: decimal_opt(host, "UNITPRICE", warnings),
        total: decimal_opt(host, "TOTAL", warnings),
        sub_account_sec: child_text_opt(host, "SUBACCTSEC"),
        sub_account_fund: child_text_opt(host, "SUBACCTFUND"),
    }
}

/// Числовые поля цен приходят в простой десятичной записи; нечитаемое
/// значение остаётся незаполненным и попадает в диагностику.
fn decimal_opt(host: Node, name: &str, warnings: &mut Vec<String>) -> Option<Decimal> {
    let raw = child_text_opt(host, name)?;
    match raw.parse::<Decimal>() {
        Ok(d) => Some(d),
        Err(_) => {
            warnings.push(format!("{name}: unparsable number '{raw}'"));
            None
        }
    }
}
