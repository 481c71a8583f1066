use clap::{Parser, ValueEnum};
use ofxiolib::{
    investment::InvestmentActivity,
    model::{Account, Document, Statement, Transaction},
    parser::Parser as OfxParser,
};
use std::io::{self, Read, Write};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Fmt {
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "ofxio", version, about = "Выгрузка операций из OFX-файла")]
struct Cli {
    /// Входной OFX-файл (по умолчанию stdin)
    #[arg(short = 'i', long = "input")]
    input: Option<String>,

    /// Формат вывода
    #[arg(long = "format", value_enum, default_value = "csv")]
    format: Fmt,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let parser = OfxParser::new();
    let doc = match cli.input {
        Some(path) => parser.parse_file(path)?,
        None => {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            parser.parse_str(&content)?
        }
    };

    for w in &doc.warnings {
        eprintln!("warning: {w}");
    }

    match cli.format {
        Fmt::Csv => write_csv(&doc)?,
        Fmt::Json => {
            serde_json::to_writer_pretty(io::stdout(), &doc)?;
            io::stdout().write_all(b"\n")?;
        }
    }
    Ok(())
}

fn write_csv(doc: &Document) -> Result<(), Box<dyn std::error::Error>> {
    let mut w = csv::Writer::from_writer(io::stdout());
    w.write_record([
        "account", "kind", "date", "amount", "id", "payee", "memo",
    ])?;

    for account in &doc.accounts {
        match account {
            Account::Bank(a) => write_statement(&mut w, &a.account_number, &a.statement)?,
            Account::CreditCard(a) => write_statement(&mut w, &a.account_number, &a.statement)?,
            Account::Investment(a) => {
                for item in &a.statement.transactions {
                    write_activity(&mut w, &a.account_number, item)?;
                }
            }
        }
    }
    w.flush()?;
    Ok(())
}

fn write_statement<W: Write>(
    w: &mut csv::Writer<W>,
    account: &str,
    st: &Statement<Transaction>,
) -> Result<(), Box<dyn std::error::Error>> {
    for t in &st.transactions {
        let date = date_field(&t.posted_date);
        let amount = t.amount.to_string();
        w.write_record([
            account,
            t.trn_type.as_str(),
            date.as_str(),
            amount.as_str(),
            t.unique_id.as_str(),
            t.payee.as_str(),
            t.memo.as_str(),
        ])?;
    }
    Ok(())
}

fn write_activity<W: Write>(
    w: &mut csv::Writer<W>,
    account: &str,
    item: &InvestmentActivity,
) -> Result<(), Box<dyn std::error::Error>> {
    // для сделок в колонку amount идёт итог TOTAL, для переводов — сумма
    let (kind, date, amount) = match item {
        InvestmentActivity::BuySecurity(t) => ("BUYOTHER", t.inv_tran.trade_date, t.pricing.total),
        InvestmentActivity::BuyStock(t) => ("BUYSTOCK", t.inv_tran.trade_date, t.pricing.total),
        InvestmentActivity::BuyMutualFund(t) => ("BUYMF", t.inv_tran.trade_date, t.pricing.total),
        InvestmentActivity::SellSecurity(t) => ("SELLOTHER", t.inv_tran.trade_date, t.pricing.total),
        InvestmentActivity::SellStock(t) => ("SELLSTOCK", t.inv_tran.trade_date, t.pricing.total),
        InvestmentActivity::SellMutualFund(t) => ("SELLMF", t.inv_tran.trade_date, t.pricing.total),
        InvestmentActivity::Income(t) => ("INCOME", t.inv_tran.trade_date, t.pricing.total),
        InvestmentActivity::Reinvest(t) => ("REINVEST", t.inv_tran.trade_date, t.pricing.total),
        InvestmentActivity::Banking(t) => (
            "INVBANKTRAN",
            t.transaction.posted_date,
            Some(t.transaction.amount),
        ),
    };
    let date = date_field(&date);
    let amount = amount.map(|a| a.to_string()).unwrap_or_default();
    w.write_record([
        account,
        kind,
        date.as_str(),
        amount.as_str(),
        item.unique_id(),
        "",
        "",
    ])?;
    Ok(())
}

fn date_field(date: &Option<chrono::NaiveDateTime>) -> String {
    date.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
