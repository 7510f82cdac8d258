use crate::compiler::lexer::Token;

/// Cursor over the tokens of one compilation unit.  The cursor can be moved
/// back to any earlier position, which is how the parser backtracks.
pub struct TokenStream<'a> {
    tokens: &'a [Token],
    index: usize,
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: &'a [Token]) -> TokenStream<'a> {
        TokenStream { tokens, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, i: usize) {
        self.index = i;
    }

    pub fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.index);
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.index)
    }

    pub fn get(&self, i: usize) -> Option<&'a Token> {
        self.tokens.get(i)
    }

    /// The token at `i`, or the last token if `i` is past the end.
    pub fn get_or_last(&self, i: usize) -> Option<&'a Token> {
        self.tokens.get(i).or_else(|| self.tokens.last())
    }
}
