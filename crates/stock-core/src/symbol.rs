//! Company name to ticker resolution
//!
//! The company table is static data built once per process and shared by
//! reference; nothing registers entries at runtime.

use crate::market::Symbol;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Suffix Yahoo Finance uses for KOSPI listings
pub const KOREA_EXCHANGE_SUFFIX: &str = ".KS";

/// Returned for input that has nothing to resolve (empty or whitespace only)
pub const UNRESOLVED_SYMBOL: &str = "UNRESOLVED";

/// A known company
#[derive(Debug, Clone, Copy)]
pub struct CompanyEntry {
    /// Canonical symbol
    pub symbol: &'static str,
    /// English name used for news search
    pub name: &'static str,
    /// Lookup keys, already normalized (ASCII lowercased, no whitespace)
    pub aliases: &'static [&'static str],
    /// Comparable listings for peer comparison
    pub peers: &'static [&'static str],
}

const BUILTIN_COMPANIES: &[CompanyEntry] = &[
    CompanyEntry {
        symbol: "AMZN",
        name: "Amazon",
        aliases: &["amazon", "아마존"],
        peers: &["MSFT", "GOOGL"],
    },
    CompanyEntry {
        symbol: "AAPL",
        name: "Apple",
        aliases: &["apple", "애플"],
        peers: &["MSFT", "GOOGL"],
    },
    CompanyEntry {
        symbol: "TSLA",
        name: "Tesla",
        aliases: &["tesla", "테슬라"],
        peers: &["GM", "F"],
    },
    CompanyEntry {
        symbol: "GOOGL",
        name: "Google",
        aliases: &["google", "구글"],
        peers: &["MSFT", "META"],
    },
    CompanyEntry {
        symbol: "MSFT",
        name: "Microsoft",
        aliases: &["microsoft", "마이크로소프트"],
        peers: &["AAPL", "GOOGL"],
    },
    CompanyEntry {
        symbol: "META",
        name: "Meta",
        aliases: &["meta", "메타"],
        peers: &["GOOGL", "SNAP"],
    },
    CompanyEntry {
        symbol: "NVDA",
        name: "Nvidia",
        aliases: &["nvidia", "엔비디아"],
        peers: &["AMD", "INTC"],
    },
    CompanyEntry {
        symbol: "005930.KS",
        name: "Samsung Electronics",
        aliases: &["삼성전자"],
        peers: &["000660.KS"],
    },
    CompanyEntry {
        symbol: "000660.KS",
        name: "SK Hynix",
        aliases: &["sk하이닉스", "SK하이닉스", "하이닉스"],
        peers: &["005930.KS"],
    },
    CompanyEntry {
        symbol: "035420.KS",
        name: "Naver",
        aliases: &["네이버"],
        peers: &["035720.KS"],
    },
    CompanyEntry {
        symbol: "035720.KS",
        name: "Kakao",
        aliases: &["카카오"],
        peers: &["035420.KS"],
    },
    CompanyEntry {
        symbol: "005380.KS",
        name: "Hyundai Motor",
        aliases: &["현대차", "현대자동차"],
        peers: &["000270.KS"],
    },
    CompanyEntry {
        symbol: "066570.KS",
        name: "LG Electronics",
        aliases: &["lg전자", "LG전자"],
        peers: &["005930.KS"],
    },
    CompanyEntry {
        symbol: "005490.KS",
        name: "POSCO",
        aliases: &["포스코"],
        peers: &["004020.KS"],
    },
];

static BUILTIN_TABLE: LazyLock<SymbolTable> =
    LazyLock::new(|| SymbolTable::from_entries(BUILTIN_COMPANIES));

/// Immutable lookup table of known companies
#[derive(Debug, Clone)]
pub struct SymbolTable {
    entries: Vec<CompanyEntry>,
    by_alias: HashMap<&'static str, usize>,
    by_symbol: HashMap<&'static str, usize>,
}

impl SymbolTable {
    /// The process-wide table of built-in companies
    pub fn builtin() -> &'static SymbolTable {
        &BUILTIN_TABLE
    }

    pub fn from_entries(entries: &[CompanyEntry]) -> Self {
        let entries = entries.to_vec();
        let mut by_alias = HashMap::new();
        let mut by_symbol = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            by_symbol.insert(entry.symbol, index);
            for alias in entry.aliases {
                by_alias.insert(*alias, index);
            }
        }
        Self {
            entries,
            by_alias,
            by_symbol,
        }
    }

    /// Entry whose alias equals the already-normalized key
    pub fn lookup(&self, key: &str) -> Option<&CompanyEntry> {
        self.by_alias.get(key).map(|&i| &self.entries[i])
    }

    pub fn by_symbol(&self, symbol: &Symbol) -> Option<&CompanyEntry> {
        self.by_symbol.get(symbol.as_str()).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[CompanyEntry] {
        &self.entries
    }
}

/// Resolves free text to a market symbol
#[derive(Debug, Clone, Copy)]
pub struct SymbolResolver {
    table: &'static SymbolTable,
}

impl Default for SymbolResolver {
    fn default() -> Self {
        Self::new(SymbolTable::builtin())
    }
}

impl SymbolResolver {
    pub fn new(table: &'static SymbolTable) -> Self {
        Self { table }
    }

    /// Resolve a company name, 6-digit Korean code or ticker
    ///
    /// Lookup order: table alias, 6-digit code with [`KOREA_EXCHANGE_SUFFIX`],
    /// then the input uppercased as a literal ticker. Always returns a
    /// non-empty symbol.
    pub fn resolve(&self, text: &str) -> Symbol {
        let cleaned = strip_whitespace(text);
        if cleaned.is_empty() {
            return Symbol::new(UNRESOLVED_SYMBOL);
        }

        if let Some(entry) = self.table.lookup(&normalize_key(&cleaned)) {
            return Symbol::new(entry.symbol);
        }

        if is_korean_code(&cleaned) {
            return Symbol::new(format!("{cleaned}{KOREA_EXCHANGE_SUFFIX}"));
        }

        Symbol::new(cleaned.to_uppercase())
    }

    /// English company name for news search, or the input itself
    pub fn news_query(&self, text: &str) -> String {
        let key = strip_whitespace(text).to_lowercase();
        match self.table.lookup(&key) {
            Some(entry) => entry.name.to_string(),
            None => text.trim().to_string(),
        }
    }

    /// Comparable listings for a resolved symbol
    pub fn peers(&self, symbol: &Symbol) -> Vec<Symbol> {
        self.table
            .by_symbol(symbol)
            .map(|entry| entry.peers.iter().map(|p| Symbol::new(*p)).collect())
            .unwrap_or_default()
    }
}

/// Resolve with the built-in table
pub fn resolve_symbol(text: &str) -> Symbol {
    SymbolResolver::default().resolve(text)
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// ASCII-only input is lowercased; anything else keeps its case
fn normalize_key(cleaned: &str) -> String {
    if cleaned.is_ascii() {
        cleaned.to_ascii_lowercase()
    } else {
        cleaned.to_string()
    }
}

fn is_korean_code(cleaned: &str) -> bool {
    cleaned.len() == 6 && cleaned.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_is_total() {
        for input in ["", "   ", "051910", "AAPL", "알수없는회사", "brk.b"] {
            let symbol = resolve_symbol(input);
            assert!(!symbol.as_str().is_empty(), "empty symbol for {input:?}");
        }
        assert_eq!(resolve_symbol("").as_str(), UNRESOLVED_SYMBOL);
    }

    #[test]
    fn test_korean_code_gets_exchange_suffix() {
        let symbol = resolve_symbol("051910");
        assert_eq!(symbol.as_str(), "051910.KS");
        assert_ne!(symbol.as_str(), "051910");
        assert_eq!(resolve_symbol(" 051910 ").as_str(), "051910.KS");
        // Not six digits: literal ticker
        assert_eq!(resolve_symbol("05191").as_str(), "05191");
    }

    #[test]
    fn test_table_lookup() {
        assert_eq!(resolve_symbol("Amazon").as_str(), "AMZN");
        assert_eq!(resolve_symbol("아마존").as_str(), "AMZN");
        assert_eq!(resolve_symbol("삼성전자").as_str(), "005930.KS");
        assert_eq!(resolve_symbol("SK 하이닉스").as_str(), "000660.KS");
        assert_eq!(resolve_symbol("sk하이닉스").as_str(), "000660.KS");
        assert_eq!(resolve_symbol("LG전자").as_str(), "066570.KS");
        assert_eq!(resolve_symbol("현대 자동차").as_str(), "005380.KS");
    }

    #[test]
    fn test_non_ascii_keeps_case() {
        // Mixed-case Korean alias that the table does not list
        assert_eq!(resolve_symbol("Lg전자").as_str(), "LG전자");
    }

    #[test]
    fn test_literal_ticker_fallback() {
        assert_eq!(resolve_symbol("aapl").as_str(), "AAPL");
        assert_eq!(resolve_symbol("brk.b").as_str(), "BRK.B");
    }

    #[test]
    fn test_news_query() {
        let resolver = SymbolResolver::default();
        assert_eq!(resolver.news_query("삼성 전자"), "Samsung Electronics");
        assert_eq!(resolver.news_query("SK하이닉스"), "SK Hynix");
        assert_eq!(resolver.news_query("Unknown Corp"), "Unknown Corp");
    }

    #[test]
    fn test_peers() {
        let resolver = SymbolResolver::default();
        let peers = resolver.peers(&Symbol::new("005930.KS"));
        assert_eq!(peers, vec![Symbol::new("000660.KS")]);
        assert!(resolver.peers(&Symbol::new("ZZZZ")).is_empty());
    }

    #[test]
    fn test_builtin_table_is_shared() {
        assert!(std::ptr::eq(SymbolTable::builtin(), SymbolTable::builtin()));
        assert_eq!(SymbolTable::builtin().entries().len(), 14);
    }
}
