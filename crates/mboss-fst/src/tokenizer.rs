// Symbol tokenizer: symbol-to-token and token-to-symbol mapping.
// Origin: eval.cpp (Tokenizer)

use hashbrown::HashMap;

use crate::MachineError;

/// Dense integer token for a symbol.
pub type Token = usize;

/// Token of the empty symbol in every tokenizer.
pub const EMPTY_TOKEN: Token = 0;

/// Bijection between the symbols of one alphabet and dense tokens.
///
/// Tokens are ordered as:
/// 1. The empty symbol (token 0) -- empty string
/// 2. The alphabet symbols, in the order given (tokens 1..)
///
/// A machine has one tokenizer for its input side and one for its output
/// side, each built from the corresponding alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenizer {
    /// Maps token to its symbol string.
    tok2sym: Vec<String>,
    /// Maps symbol string to its token.
    sym2tok: HashMap<String, Token>,
}

impl Tokenizer {
    /// Build a tokenizer from an alphabet of distinct non-empty symbols.
    ///
    /// Empty strings and repeats in `alphabet` are skipped, so every token
    /// maps to a distinct symbol.
    pub fn new<S: AsRef<str>>(alphabet: &[S]) -> Self {
        let mut tok2sym = Vec::with_capacity(alphabet.len() + 1);
        let mut sym2tok = HashMap::with_capacity(alphabet.len() + 1);
        tok2sym.push(String::new());
        sym2tok.insert(String::new(), EMPTY_TOKEN);
        for sym in alphabet {
            let sym = sym.as_ref();
            if !sym2tok.contains_key(sym) {
                sym2tok.insert(sym.to_string(), tok2sym.len());
                tok2sym.push(sym.to_string());
            }
        }
        Self { tok2sym, sym2tok }
    }

    #[inline]
    pub fn empty_token(&self) -> Token {
        EMPTY_TOKEN
    }

    /// Token for `sym`; the empty string maps to [`EMPTY_TOKEN`].
    pub fn sym2tok(&self, sym: &str) -> Result<Token, MachineError> {
        self.sym2tok
            .get(sym)
            .copied()
            .ok_or_else(|| MachineError::UnknownSymbol(sym.to_string()))
    }

    /// Symbol for `tok`, or `None` if the token is out of range.
    pub fn tok2sym(&self, tok: Token) -> Option<&str> {
        self.tok2sym.get(tok).map(String::as_str)
    }

    /// Number of tokens, including the empty token.
    pub fn len(&self) -> usize {
        self.tok2sym.len()
    }

    /// True if the alphabet is empty (only the empty token exists).
    pub fn is_empty(&self) -> bool {
        self.tok2sym.len() == 1
    }

    /// The alphabet symbols, without the empty symbol.
    pub fn symbols(&self) -> &[String] {
        &self.tok2sym[1..]
    }
}
