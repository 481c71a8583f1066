use ofxiolib::investment::InvestmentActivity;
use ofxiolib::model::Account;
use ofxiolib::parser::Parser;
use rust_decimal::Decimal;

const INVESTMENT_OFX: &str = r#"OFXHEADER:100
DATA:OFXSGML
VERSION:102

<OFX>
<SIGNONMSGSRSV1>
<SONRS>
<STATUS>
<CODE>0
<SEVERITY>INFO
</STATUS>
<DTSERVER>20230701
<LANGUAGE>ENG
</SONRS>
</SIGNONMSGSRSV1>
<INVSTMTMSGSRSV1>
<INVSTMTTRNRS>
<TRNUID>1002
<INVSTMTRS>
<DTASOF>20230630
<CURDEF>USD
<INVACCTFROM>
<BROKERID>broker.example.com
<ACCTID>1234567890
</INVACCTFROM>
<INVTRANLIST>
<DTSTART>20230401
<DTEND>20230630
<BUYSTOCK>
<INVBUY>
<INVTRAN>
<FITID>23321
<DTTRADE>20230415
<DTSETTLE>20230418
<MEMO>buy shares
</INVTRAN>
<SECID>
<UNIQUEID>123456789
<UNIQUEIDTYPE>CUSIP
</SECID>
<UNITS>100
<UNITPRICE>50.00
<TOTAL>-5000.00
<SUBACCTSEC>CASH
<SUBACCTFUND>CASH
</INVBUY>
<BUYTYPE>BUY
<UNITS>1
</BUYSTOCK>
<INCOME>
<INVTRAN>
<FITID>23331
<DTTRADE>20230501
</INVTRAN>
<SECID>
<UNIQUEID>987654321
<UNIQUEIDTYPE>CUSIP
</SECID>
<INCOMETYPE>DIV
<TOTAL>125.00
<SUBACCTSEC>CASH
<SUBACCTFUND>CASH
</INCOME>
<SELLMF>
<INVSELL>
<INVTRAN>
<FITID>23341
<DTTRADE>20230510
</INVTRAN>
<SECID>
<UNIQUEID>744316100
<UNIQUEIDTYPE>CUSIP
</SECID>
<UNITS>-10.00
<UNITPRICE>90.00
<TOTAL>900.00
</INVSELL>
<SELLTYPE>SELL
<RELFITID>23340
</SELLMF>
<INVBANKTRAN>
<STMTTRN>
<TRNTYPE>XFER
<DTPOSTED>20230520
<TRNAMT>1000.00
<FITID>23351
<NAME>FUNDS RECEIVED
</STMTTRN>
<SUBACCTFUND>CASH
</INVBANKTRAN>
<CLOSUREOPT>
<FITID>99999
</CLOSUREOPT>
</INVTRANLIST>
<INVPOSLIST>
<POSSTOCK>
<INVPOS>
<SECID>
<UNIQUEID>123456789
<UNIQUEIDTYPE>CUSIP
</SECID>
<HELDINACCT>CASH
<POSTYPE>LONG
<UNITS>100
<UNITPRICE>52.25
<MKTVAL>5225.00
<DTPRICEASOF>20230630
</INVPOS>
</POSSTOCK>
<POSGADGET>
<INVPOS>
<POSTYPE>LONG
</INVPOS>
</POSGADGET>
</INVPOSLIST>
<INVBAL>
<AVAILCASH>1250.50
<MARGINBALANCE>0.00
<SHORTBALANCE>0.00
</INVBAL>
</INVSTMTRS>
</INVSTMTTRNRS>
</INVSTMTMSGSRSV1>
</OFX>"#;

#[test]
fn investment_statement_end_to_end() {
    let doc = Parser::new().parse_str(INVESTMENT_OFX).expect("parse");
    assert!(doc.warnings.is_empty(), "{:?}", doc.warnings);

    let Some(Account::Investment(inv)) = doc.account() else {
        panic!("expected a single investment account");
    };
    assert_eq!(inv.transaction_uid, "1002");
    assert_eq!(inv.broker_id, "broker.example.com");
    assert_eq!(inv.account_number, "1234567890");
    assert_eq!(
        inv.available_cash,
        Some(Decimal::from_str_exact("1250.50").unwrap())
    );

    let st = &inv.statement;
    assert_eq!(st.currency, "USD");
    assert!(st.start_date.is_some() && st.end_date.is_some());
    // DTSTART/DTEND и незнакомый CLOSUREOPT в операции не попадают
    assert_eq!(st.transactions.len(), 4);

    // инвестиционный счёт не отдаёт банковский список операций
    assert!(doc.transactions().is_none());
}

#[test]
fn positions_are_read_from_invpos() {
    let doc = Parser::new().parse_str(INVESTMENT_OFX).expect("parse");
    let Some(Account::Investment(inv)) = doc.account() else {
        panic!("expected a single investment account");
    };

    // незнакомый POSGADGET пропущен
    assert_eq!(inv.positions.len(), 1);
    let pos = &inv.positions[0];
    assert_eq!(pos.sec_id.security_id, "123456789");
    assert_eq!(pos.held_in_account.as_deref(), Some("CASH"));
    assert_eq!(pos.position_type, "LONG");
    assert_eq!(pos.units, Some(Decimal::from(100)));
    assert_eq!(
        pos.market_value,
        Some(Decimal::from_str_exact("5225.00").unwrap())
    );
    assert!(pos.price_date.is_some());
    assert_eq!(pos.memo, None);
}

#[test]
fn buy_stock_reads_pricing_from_wrapper() {
    let doc = Parser::new().parse_str(INVESTMENT_OFX).expect("parse");
    let Some(Account::Investment(inv)) = doc.account() else {
        panic!("expected a single investment account");
    };

    let InvestmentActivity::BuyStock(buy) = &inv.statement.transactions[0] else {
        panic!("expected BuyStock first");
    };
    assert_eq!(buy.inv_tran.unique_id, "23321");
    assert!(buy.inv_tran.trade_date.is_some());
    assert!(buy.inv_tran.settlement_date.is_some());
    assert_eq!(buy.inv_tran.memo.as_deref(), Some("buy shares"));
    assert_eq!(buy.sec_id.security_id, "123456789");
    assert_eq!(buy.sec_id.security_id_type, "CUSIP");
    assert_eq!(buy.buy_type, "BUY");

    // ценовая тройка берётся из обёртки INVBUY, а не из детей BUYSTOCK:
    // подложный <UNITS>1 рядом с обёрткой не должен быть прочитан
    assert_eq!(buy.pricing.units, Some(Decimal::from(100)));
    assert_eq!(
        buy.pricing.unit_price,
        Some(Decimal::from_str_exact("50.00").unwrap())
    );
    assert_eq!(
        buy.pricing.total,
        Some(Decimal::from_str_exact("-5000.00").unwrap())
    );
    assert_eq!(buy.pricing.sub_account_sec.as_deref(), Some("CASH"));
    assert_eq!(buy.pricing.sub_account_fund.as_deref(), Some("CASH"));
}

#[test]
fn income_reads_fields_from_the_node_itself() {
    let doc = Parser::new().parse_str(INVESTMENT_OFX).expect("parse");
    let Some(Account::Investment(inv)) = doc.account() else {
        panic!("expected a single investment account");
    };

    let InvestmentActivity::Income(income) = &inv.statement.transactions[1] else {
        panic!("expected Income second");
    };
    assert_eq!(income.inv_tran.unique_id, "23331");
    assert_eq!(income.income_type, "DIV");
    assert_eq!(
        income.pricing.total,
        Some(Decimal::from_str_exact("125.00").unwrap())
    );
    // UNITS у дохода не было — поле остаётся незаполненным, не нулём
    assert_eq!(income.pricing.units, None);
}

#[test]
fn sell_mutual_fund_keeps_exchange_pair_id() {
    let doc = Parser::new().parse_str(INVESTMENT_OFX).expect("parse");
    let Some(Account::Investment(inv)) = doc.account() else {
        panic!("expected a single investment account");
    };

    let InvestmentActivity::SellMutualFund(sell) = &inv.statement.transactions[2] else {
        panic!("expected SellMutualFund third");
    };
    assert_eq!(sell.sell_type, "SELL");
    assert_eq!(sell.related_unique_id.as_deref(), Some("23340"));
    assert_eq!(
        sell.pricing.units,
        Some(Decimal::from_str_exact("-10.00").unwrap())
    );
}

#[test]
fn investment_banking_transfer_wraps_statement_transaction() {
    let doc = Parser::new().parse_str(INVESTMENT_OFX).expect("parse");
    let Some(Account::Investment(inv)) = doc.account() else {
        panic!("expected a single investment account");
    };

    let InvestmentActivity::Banking(bank) = &inv.statement.transactions[3] else {
        panic!("expected Banking fourth");
    };
    assert_eq!(bank.transaction.trn_type, "XFER");
    assert_eq!(bank.transaction.type_description(), "Transfer");
    assert_eq!(
        bank.transaction.amount,
        Decimal::from_str_exact("1000.00").unwrap()
    );
    assert_eq!(bank.transaction.unique_id, "23351");
    assert_eq!(bank.sub_account_fund.as_deref(), Some("CASH"));
}

#[test]
fn investment_statement_bounds_may_be_absent() {
    let body = "OFXHEADER:100\n\n<OFX>\n<SIGNONMSGSRSV1>\n<SONRS>\n<STATUS>\n<CODE>0\n<SEVERITY>INFO\n</STATUS>\n<DTSERVER>20230101\n<LANGUAGE>ENG\n</SONRS>\n</SIGNONMSGSRSV1>\n<INVSTMTMSGSRSV1>\n<INVSTMTTRNRS>\n<TRNUID>7\n<INVSTMTRS>\n<CURDEF>USD\n<INVACCTFROM>\n<BROKERID>b\n<ACCTID>42\n</INVACCTFROM>\n<INVTRANLIST>\n<INCOME>\n<INVTRAN>\n<FITID>1\n<DTTRADE>20230501\n</INVTRAN>\n<SECID>\n<UNIQUEID>1\n<UNIQUEIDTYPE>CUSIP\n</SECID>\n<INCOMETYPE>INTEREST\n<TOTAL>1.23\n</INCOME>\n</INVTRANLIST>\n</INVSTMTRS>\n</INVSTMTTRNRS>\n</INVSTMTMSGSRSV1>\n</OFX>";
    let doc = Parser::new().parse_str(body).expect("parse");
    let Some(Account::Investment(inv)) = doc.account() else {
        panic!("expected a single investment account");
    };
    assert_eq!(inv.statement.start_date, None);
    assert_eq!(inv.statement.end_date, None);
    assert_eq!(inv.statement.transactions.len(), 1);
    assert_eq!(inv.available_cash, None);
}
