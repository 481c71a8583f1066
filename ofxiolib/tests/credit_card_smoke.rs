use ofxiolib::model::Account;
use ofxiolib::parser::Parser;
use rust_decimal::Decimal;

const SIGNON: &str = "<SIGNONMSGSRSV1>\n<SONRS>\n<STATUS>\n<CODE>0\n<SEVERITY>INFO\n</STATUS>\n<DTSERVER>20230101\n<LANGUAGE>ENG\n</SONRS>\n</SIGNONMSGSRSV1>";

fn cc_document(acct_from: &str) -> String {
    format!(
        "OFXHEADER:100\n\n<OFX>\n{SIGNON}\n<CREDITCARDMSGSRSV1>\n<CCSTMTTRNRS>\n<TRNUID>100500\n<CCSTMTRS>\n<CURDEF>EUR\n{acct_from}\n<BANKTRANLIST>\n<DTSTART>20230201\n<DTEND>20230228\n<STMTTRN>\n<TRNTYPE>PAYMENT\n<DTPOSTED>20230210\n<TRNAMT>-25.99\n<FITID>555001\n<NAME>COFFEE SHOP\n<MEMO>card payment\n</STMTTRN>\n</BANKTRANLIST>\n<LEDGERBAL>\n<BALAMT>-1000,00\n<DTASOF>20230228\n</LEDGERBAL>\n</CCSTMTRS>\n</CCSTMTTRNRS>\n</CREDITCARDMSGSRSV1>\n</OFX>"
    )
}

#[test]
fn credit_card_account_from_cc_node() {
    let body = cc_document("<CCACCTFROM>\n<ACCTID>4111-1111\n</CCACCTFROM>");
    let doc = Parser::new().parse_str(&body).expect("parse");

    let Some(Account::CreditCard(card)) = doc.account() else {
        panic!("expected a single credit-card account");
    };
    assert_eq!(card.transaction_uid, "100500");
    assert_eq!(card.account_number, "4111-1111");
    // континентальная запись баланса
    assert_eq!(card.balance, Decimal::from_str_exact("-1000.00").unwrap());

    let st = &card.statement;
    assert_eq!(st.currency, "EUR");
    assert_eq!(st.transactions.len(), 1);
    assert_eq!(st.transactions[0].trn_type, "PAYMENT");
    assert_eq!(st.transactions[0].type_description(), "Electronic payment");
    assert_eq!(st.transactions[0].check_number, None);
}

#[test]
fn credit_card_falls_back_to_bank_node() {
    // выгрузки, ошибочно помечающие карточный счёт банковским узлом
    let body = cc_document("<BANKACCTFROM>\n<BANKID>22\n<ACCTID>4222-2222\n<ACCTTYPE>CREDITLINE\n</BANKACCTFROM>");
    let doc = Parser::new().parse_str(&body).expect("parse");

    let Some(Account::CreditCard(card)) = doc.account() else {
        panic!("expected a single credit-card account");
    };
    assert_eq!(card.account_number, "4222-2222");
}

#[test]
fn credit_card_prefers_cc_node_over_bank_node() {
    // при наличии обоих узлов побеждает карточный
    let body = cc_document(
        "<CCACCTFROM>\n<ACCTID>4333-3333\n</CCACCTFROM>\n<BANKACCTFROM>\n<BANKID>22\n<ACCTID>4444-4444\n</BANKACCTFROM>",
    );
    let doc = Parser::new().parse_str(&body).expect("parse");

    let Some(Account::CreditCard(card)) = doc.account() else {
        panic!("expected a single credit-card account");
    };
    assert_eq!(card.account_number, "4333-3333");
}
