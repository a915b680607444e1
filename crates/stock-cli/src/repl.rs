//! Interactive session: one company per line, analyzed in full

use crate::render;
use std::io::{self, BufRead, Write};
use stock_core::{LookbackPeriod, StockPipeline};

const QUIT_WORDS: [&str; 3] = ["quit", "exit", "종료"];

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Blank,
    Company(&'a str),
}

/// The whole trimmed line names the company, spaces included
fn parse_line(line: &str) -> Input<'_> {
    let company = line.trim();
    if company.is_empty() {
        return Input::Blank;
    }
    if QUIT_WORDS.iter().any(|w| company.eq_ignore_ascii_case(w)) {
        return Input::Quit;
    }
    Input::Company(company)
}

fn print_banner(period: LookbackPeriod) {
    println!("Stock indicator and signal agent");
    println!("Enter a company name, Korean code or ticker (e.g. 삼성전자, 005930, AAPL).");
    println!("Lookback: {period}. Type quit, exit or 종료 to leave.\n");
}

pub async fn run(pipeline: &StockPipeline, period: LookbackPeriod) -> anyhow::Result<()> {
    print_banner(period);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }

        match parse_line(&line) {
            Input::Quit => break,
            Input::Blank => {}
            Input::Company(company) => match pipeline.analyze(company, period).await {
                Ok(report) => println!("{}\n", render::report(&report)),
                Err(e) => eprintln!("Error: {e}\n"),
            },
        }
    }

    println!("Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stock_core::resolve_symbol;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   \n"), Input::Blank);
        assert_eq!(parse_line("quit"), Input::Quit);
        assert_eq!(parse_line("EXIT\n"), Input::Quit);
        assert_eq!(parse_line("종료"), Input::Quit);
        assert_eq!(
            parse_line("삼성전자 주가 어때?"),
            Input::Company("삼성전자 주가 어때?")
        );
        assert_eq!(parse_line("  AAPL\n"), Input::Company("AAPL"));
    }

    #[test]
    fn test_spaced_company_names_resolve() {
        for (line, expected) in [
            ("SK 하이닉스\n", "000660.KS"),
            ("현대 자동차", "005380.KS"),
            ("LG 전자", "066570.KS"),
            ("  삼성 전자  ", "005930.KS"),
        ] {
            let Input::Company(company) = parse_line(line) else {
                panic!("expected a company for {line:?}");
            };
            assert_eq!(resolve_symbol(company).as_str(), expected);
        }
    }
}
