use ofxiolib::parser::Parser;
use std::io::Read;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Пример: читаем OFX со stdin и печатаем собранные счета
    let mut content = String::new();
    std::io::stdin().read_to_string(&mut content)?;
    let doc = Parser::new().parse_str(&content)?;
    for account in &doc.accounts {
        println!("{account:#?}");
    }
    Ok(())
}
