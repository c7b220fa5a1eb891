//! Recursive-descent parser for the query subset.
//!
//! ```text
//! query     := [USE string] (MATCH pattern)+ [WHERE or_expr] RETURN items [SKIP n] [LIMIT n]
//! pattern   := node (edge node)*
//! node      := "(" [var] [":" label ("|" label)*] [props] ")"
//! edge      := ["<"] "-" ["[" [var] [":" type] ["*" [n] [".." [n]]] "]" "-"] [">"]
//! or_expr   := and_expr (OR and_expr)*
//! and_expr  := primary (AND primary)*
//! primary   := "(" or_expr ")" | entity op operand
//! ```

use domcypher_core::ParseError;

use crate::ast::{
    Condition, Direction, EdgePattern, EntityRef, HopRange, NodePattern, Operand, Operator,
    Pattern, Predicate, Query, ReturnClause, Value,
};
use crate::lexer::{tokenize, Token, TokenKind};

type PResult<T> = Result<T, ParseError>;

/// Parse query text into a [`Query`].
pub fn parse(input: &str) -> PResult<Query> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
    };
    let query = parser.query()?;
    if let Some(tok) = parser.peek() {
        return Err(ParseError::new(
            format!("unexpected {:?} after RETURN clause", tok.text),
            tok.offset,
        ));
    }
    Ok(query)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |t| t.offset)
    }

    fn error<T>(&self, expected: &str) -> PResult<T> {
        let message = match self.peek() {
            Some(tok) => format!("expected {}, found {:?}", expected, tok.text),
            None => format!("expected {}, found end of query", expected),
        };
        Err(ParseError::new(message, self.offset()))
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_punct(&self, p: &str) -> bool {
        self.peek().is_some_and(|t| t.is_punct(p))
    }

    fn at_keyword(&self, kw: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(kw))
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        let hit = self.at_punct(p);
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        let hit = self.at_keyword(kw);
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn expect_punct(&mut self, p: &str) -> PResult<()> {
        if self.eat_punct(p) {
            return Ok(());
        }
        self.error(&format!("{:?}", p))
    }

    fn expect_keyword(&mut self, kw: &str) -> PResult<()> {
        if self.eat_keyword(kw) {
            return Ok(());
        }
        self.error(kw)
    }

    fn expect_kind(&mut self, kind: TokenKind, what: &str) -> PResult<String> {
        match self.peek() {
            Some(tok) if tok.kind == kind => Ok(self.advance().map(|t| t.text).unwrap_or_default()),
            _ => self.error(what),
        }
    }

    fn ident(&mut self) -> PResult<String> {
        self.expect_kind(TokenKind::Ident, "identifier")
    }

    fn integer<T: std::str::FromStr>(&mut self) -> PResult<T> {
        let offset = self.offset();
        let text = self.expect_kind(TokenKind::Number, "integer")?;
        text.parse()
            .map_err(|_| ParseError::new(format!("expected integer, found {:?}", text), offset))
    }

    fn query(&mut self) -> PResult<Query> {
        let use_url = if self.eat_keyword("USE") {
            Some(self.expect_kind(TokenKind::Str, "quoted URL")?)
        } else {
            None
        };

        let mut matches = Vec::new();
        while self.eat_keyword("MATCH") {
            matches.push(self.pattern()?);
        }
        if matches.is_empty() {
            return self.error("MATCH");
        }

        let predicate = if self.eat_keyword("WHERE") {
            Some(self.or_expr()?)
        } else {
            None
        };

        self.expect_keyword("RETURN")?;
        let returns = self.return_clause()?;

        Ok(Query {
            use_url,
            matches,
            predicate,
            returns,
        })
    }

    fn pattern(&mut self) -> PResult<Pattern> {
        let mut nodes = vec![self.node()?];
        let mut edges = Vec::new();
        while self.at_punct("-") || self.at_punct("<") {
            edges.push(self.edge()?);
            nodes.push(self.node()?);
        }
        Ok(Pattern { nodes, edges })
    }

    fn node(&mut self) -> PResult<NodePattern> {
        self.expect_punct("(")?;
        let variable = if self.peek().is_some_and(|t| t.kind == TokenKind::Ident) {
            Some(self.ident()?)
        } else {
            None
        };

        let mut labels = Vec::new();
        if self.eat_punct(":") {
            labels.push(self.ident()?);
            while self.eat_punct("|") {
                labels.push(self.ident()?);
            }
        }

        let mut properties = Vec::new();
        if self.eat_punct("{") {
            loop {
                let key = self.ident()?;
                self.expect_punct(":")?;
                properties.push((key, self.value()?));
                if !self.eat_punct(",") {
                    break;
                }
            }
            self.expect_punct("}")?;
        }

        self.expect_punct(")")?;
        Ok(NodePattern {
            variable,
            labels,
            properties,
        })
    }

    fn edge(&mut self) -> PResult<EdgePattern> {
        let left = self.eat_punct("<");
        self.expect_punct("-")?;

        let mut variable = None;
        let mut edge_type = None;
        let mut hops = None;
        if self.eat_punct("[") {
            if self.peek().is_some_and(|t| t.kind == TokenKind::Ident) {
                variable = Some(self.ident()?);
            }
            if self.eat_punct(":") {
                edge_type = Some(self.ident()?);
            }
            if self.eat_punct("*") {
                hops = Some(self.hop_range()?);
            }
            self.expect_punct("]")?;
        }
        self.expect_punct("-")?;
        let right = self.eat_punct(">");

        let direction = match (left, right) {
            (false, true) => Direction::Right,
            (true, false) => Direction::Left,
            _ => Direction::Both,
        };
        Ok(EdgePattern {
            variable,
            edge_type,
            direction,
            hops,
        })
    }

    /// After `*`: `n`, `n..m`, `n..`, `..m` or nothing.
    fn hop_range(&mut self) -> PResult<HopRange> {
        let at_number = |p: &Self| p.peek().is_some_and(|t| t.kind == TokenKind::Number);
        let min = if at_number(self) { Some(self.integer()?) } else { None };
        if self.eat_punct("..") {
            let max = if at_number(self) { Some(self.integer()?) } else { None };
            return Ok(HopRange {
                min: min.unwrap_or(1),
                max,
            });
        }
        Ok(match min {
            Some(n) => HopRange { min: n, max: Some(n) },
            None => HopRange { min: 1, max: None },
        })
    }

    fn or_expr(&mut self) -> PResult<Predicate> {
        let mut expr = self.and_expr()?;
        while self.eat_keyword("OR") {
            let rhs = self.and_expr()?;
            expr = Predicate::Or(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> PResult<Predicate> {
        let mut expr = self.primary()?;
        while self.eat_keyword("AND") {
            let rhs = self.primary()?;
            expr = Predicate::And(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn primary(&mut self) -> PResult<Predicate> {
        if self.eat_punct("(") {
            let inner = self.or_expr()?;
            self.expect_punct(")")?;
            return Ok(inner);
        }
        let entity = self.entity()?;
        let op = self.operator()?;
        let operand = self.operand()?;
        Ok(Predicate::Condition(Condition {
            entity,
            op,
            operand,
        }))
    }

    fn entity(&mut self) -> PResult<EntityRef> {
        let variable = self.ident()?;
        let property = if self.eat_punct(".") {
            Some(self.ident()?)
        } else {
            None
        };
        Ok(EntityRef { variable, property })
    }

    fn operator(&mut self) -> PResult<Operator> {
        let op = match self.peek() {
            Some(t) if t.is_punct("=") || t.is_punct("==") => Operator::Eq,
            Some(t) if t.is_punct("<>") => Operator::Neq,
            Some(t) if t.is_punct(">") => Operator::Gt,
            Some(t) if t.is_punct("<") => Operator::Lt,
            Some(t) if t.is_punct(">=") => Operator::Gte,
            Some(t) if t.is_punct("<=") => Operator::Lte,
            Some(t) if t.is_keyword("IS") => Operator::Is,
            Some(t) if t.is_keyword("CONTAINS") => Operator::Contains,
            _ => return self.error("comparison operator"),
        };
        self.pos += 1;
        Ok(op)
    }

    fn operand(&mut self) -> PResult<Operand> {
        let is_literal_keyword = self
            .peek()
            .is_some_and(|t| t.is_keyword("NULL") || t.is_keyword("TRUE") || t.is_keyword("FALSE"));
        match self.peek() {
            Some(t) if t.kind == TokenKind::Ident && !is_literal_keyword => {
                Ok(Operand::Entity(self.entity()?))
            }
            _ => Ok(Operand::Value(self.value()?)),
        }
    }

    fn value(&mut self) -> PResult<Value> {
        let Some(tok) = self.peek().cloned() else {
            return self.error("value");
        };
        let value = match tok.kind {
            TokenKind::Str => Value::Str(tok.text),
            TokenKind::Number => Value::Number(tok.text),
            TokenKind::Punct
                if tok.text == "-"
                    && self.peek_at(1).is_some_and(|t| t.kind == TokenKind::Number) =>
            {
                self.pos += 1;
                let number = self.peek().map(|t| t.text.clone()).unwrap_or_default();
                Value::Number(format!("-{}", number))
            }
            _ if tok.is_keyword("NULL") => Value::Null,
            _ if tok.is_keyword("TRUE") => Value::Bool(true),
            _ if tok.is_keyword("FALSE") => Value::Bool(false),
            _ => return self.error("value"),
        };
        self.pos += 1;
        Ok(value)
    }

    fn return_clause(&mut self) -> PResult<ReturnClause> {
        let mut items = vec![self.entity()?];
        while self.eat_punct(",") {
            items.push(self.entity()?);
        }
        let skip = if self.eat_keyword("SKIP") {
            Some(self.integer()?)
        } else {
            None
        };
        let limit = if self.eat_keyword("LIMIT") {
            Some(self.integer()?)
        } else {
            None
        };
        Ok(ReturnClause { items, skip, limit })
    }
}
