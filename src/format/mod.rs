//! DDL statement formatting.
//!
//! Reflows a single statement into a readable multi-line layout:
//! - Unquoted keywords and type names upper-cased
//! - One column definition per line inside CREATE TABLE
//! - One clause per line for ALTER / DROP / CREATE INDEX
//!
//! Only whitespace and keyword case change. Input whitespace is discarded
//! during tokenizing, so formatting an already formatted statement is a
//! no-op.

use ahash::AHashSet;
use once_cell::sync::Lazy;

const INDENT: &str = "    ";

/// Keywords and type names recognised by the formatter.
///
/// Dialects quote identifiers that collide with any of these so the
/// formatter never changes the case of a name.
pub static KEYWORDS: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    [
        // statements and clauses
        "ADD", "ALL", "ALTER", "AND", "AS", "ASC", "BY", "CASCADE", "CHECK", "COLUMN",
        "CONSTRAINT", "CREATE", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP", "EXISTS",
        "FALSE", "FOREIGN", "FROM", "GRANT", "GROUP", "HAVING", "IF", "IN", "INDEX", "INSERT",
        "INTO", "IS", "JOIN", "KEY", "LIKE", "NOT", "NULL", "ON", "OR", "ORDER", "PRIMARY",
        "REFERENCES", "RESTRICT", "SELECT", "SET", "TABLE", "TO", "TRUE", "UNION", "UNIQUE",
        "UPDATE", "USER", "USING", "VALUES", "VIEW", "WHERE", "WITH", "WITHOUT", "ZONE",
        "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP",
        // type names
        "BIGINT", "BINARY", "BLOB", "BOOLEAN", "BYTEA", "CHAR", "CHARACTER", "CLOB", "DATE",
        "DATETIME", "DECIMAL", "DOUBLE", "FLOAT", "INT", "INTEGER", "LONGBLOB", "LONGTEXT",
        "NUMERIC", "PRECISION", "REAL", "SMALLINT", "TEXT", "TIME", "TIMESTAMP", "TINYINT",
        "UUID", "VARBINARY", "VARCHAR", "VARYING",
    ]
    .into_iter()
    .collect()
});

/// Check whether a word is a formatter keyword (case-insensitive)
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(word.to_ascii_uppercase().as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Quoted,
    Open,
    Close,
    Comma,
}

#[derive(Debug, Clone)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
    /// No whitespace between this token and the previous one
    glued: bool,
}

fn closing_quote(open: char) -> Option<char> {
    match open {
        '\'' => Some('\''),
        '"' => Some('"'),
        '`' => Some('`'),
        '[' => Some(']'),
        _ => None,
    }
}

fn tokenize(sql: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = sql.char_indices().peekable();
    let mut glued = false;

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            glued = false;
            continue;
        }

        let kind = match c {
            '(' => TokenKind::Open,
            ')' => TokenKind::Close,
            ',' => TokenKind::Comma,
            _ if closing_quote(c).is_some() => TokenKind::Quoted,
            _ => TokenKind::Word,
        };

        let end = match kind {
            TokenKind::Open | TokenKind::Close | TokenKind::Comma => {
                chars.next();
                start + c.len_utf8()
            }
            TokenKind::Quoted => {
                let close = closing_quote(c).unwrap_or(c);
                chars.next();
                let mut end = sql.len();
                while let Some((i, ch)) = chars.next() {
                    if ch == close {
                        // A doubled closing quote is an escaped quote
                        if chars.peek().map(|&(_, n)| n) == Some(close) {
                            chars.next();
                            continue;
                        }
                        end = i + ch.len_utf8();
                        break;
                    }
                }
                end
            }
            TokenKind::Word => {
                let mut end = sql.len();
                while let Some(&(i, ch)) = chars.peek() {
                    if ch.is_whitespace() || matches!(ch, '(' | ')' | ',') || closing_quote(ch).is_some() {
                        end = i;
                        break;
                    }
                    chars.next();
                }
                end
            }
        };

        tokens.push(Token {
            kind,
            text: &sql[start..end],
            glued: glued && !tokens.is_empty(),
        });
        glued = true;
    }

    tokens
}

/// Whether a depth-0 keyword starts a new clause line
fn breaks_clause(word: &str, prev_word: Option<&str>) -> bool {
    match word {
        "ADD" | "DROP" | "REFERENCES" | "ON" => true,
        "FOREIGN" => !matches!(prev_word, Some("ADD" | "DROP")),
        _ => false,
    }
}

/// Reflow one DDL statement.
///
/// Empty or whitespace-only input yields an empty string.
pub fn format(sql: &str) -> String {
    let tokens = tokenize(sql);
    let mut out = String::with_capacity(sql.len() + sql.len() / 4);

    // The first `(` of a CREATE TABLE opens its column list
    let column_list_open = {
        let mut words = tokens
            .iter()
            .take_while(|t| t.kind != TokenKind::Open)
            .filter(|t| t.kind == TokenKind::Word)
            .map(|t| t.text.to_ascii_uppercase());
        let is_create_table =
            words.next().as_deref() == Some("CREATE") && words.any(|w| w == "TABLE");
        if is_create_table {
            tokens.iter().position(|t| t.kind == TokenKind::Open)
        } else {
            None
        }
    };

    let mut depth = 0usize;
    let mut in_column_list = false;
    let mut prev_kind: Option<TokenKind> = None;
    let mut prev_word: Option<String> = None;

    for (i, token) in tokens.iter().enumerate() {
        let text = match token.kind {
            TokenKind::Word if is_keyword(token.text) => token.text.to_ascii_uppercase(),
            _ => token.text.to_string(),
        };
        let list_line = in_column_list && depth == 1;

        if i == 0 {
            // no separator
        } else if list_line && token.kind == TokenKind::Close {
            out.push('\n');
        } else if list_line
            && (prev_kind == Some(TokenKind::Comma) || column_list_open == Some(i - 1))
        {
            out.push('\n');
            out.push_str(INDENT);
        } else if depth == 0
            && token.kind == TokenKind::Word
            && breaks_clause(&text, prev_word.as_deref())
        {
            out.push('\n');
            out.push_str(INDENT);
        } else if matches!(token.kind, TokenKind::Close | TokenKind::Comma)
            || prev_kind == Some(TokenKind::Open)
        {
            // tight
        } else if prev_kind == Some(TokenKind::Comma) || !token.glued {
            out.push(' ');
        }

        out.push_str(&text);

        match token.kind {
            TokenKind::Open => {
                if column_list_open == Some(i) {
                    in_column_list = true;
                }
                depth += 1;
            }
            TokenKind::Close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    in_column_list = false;
                }
            }
            _ => {}
        }

        prev_word = (token.kind == TokenKind::Word).then_some(text);
        prev_kind = Some(token.kind);
    }

    out.trim().to_string()
}
