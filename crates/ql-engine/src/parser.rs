//! Parsers for quest source files and individual statements.
//!
//! A source file is a flat sequence of locations: a `# name` header line,
//! the body lines, and a closing line starting with `-`. Bodies are kept as
//! raw lines in [`GameData`] and parsed into [`Statement`]s when a location
//! executes — the same split the binary format uses.

use crate::error::ParseError;
use crate::game::{GameData, GameLocation, MenuEntry};
use crate::lexer::{Token, lex};

/// A single executable statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Append interpolated text plus CRLF to the main text.
    Print(String),
    /// Clear the main text (`*clr`).
    ClearMain,
    /// Define (or redefine) an action with the given body.
    DefineAction {
        /// Action name as shown in the action list.
        name: String,
        /// Statements executed when the action runs.
        body: Vec<Statement>,
    },
    /// Append an object to the object list.
    AddObject(String),
    /// Remove the first object with the given name, if any.
    DelObject(String),
    /// Remove the first action with the given name, if any.
    DelAction(String),
    /// Ask the host to load a library file into the current game.
    IncludeLib(String),
    /// Execute another location and return.
    GoSub(String),
    /// Clear the action list, then execute another location.
    GoTo(String),
    /// Open a message box with the given text.
    Message(String),
    /// Open a menu. The argument is a `label:location;label:location`
    /// list, parsed after interpolation when the statement executes.
    Menu(String),
    /// Assign a string value to a `$`-prefixed variable.
    Assign {
        /// Variable name, including the `$` prefix.
        var: String,
        /// Value to assign, interpolated at execution time.
        value: String,
    },
}

/// Parse a complete quest source file into game data.
pub fn parse_game(source: &str) -> Result<GameData, ParseError> {
    let mut locations = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(header) = trimmed.strip_prefix('#') {
            let name = header.trim().to_string();
            if let Some((outer, _)) = &current {
                return Err(ParseError::NestedLocation {
                    line,
                    name,
                    outer: outer.clone(),
                });
            }
            current = Some((name, Vec::new()));
        } else if trimmed.starts_with('-') {
            match current.take() {
                Some((name, lines)) => locations.push(GameLocation { name, lines }),
                None => return Err(ParseError::StrayStatement { line }),
            }
        } else {
            match &mut current {
                Some((_, lines)) => lines.push(trimmed.to_string()),
                None => return Err(ParseError::StrayStatement { line }),
            }
        }
    }

    if let Some((name, _)) = current {
        return Err(ParseError::UnterminatedLocation { name });
    }
    Ok(GameData { locations })
}

/// Parse one code line (or an injected code string) into statements.
pub fn parse_statements(code: &str) -> Result<Vec<Statement>, ParseError> {
    let tokens = lex(code)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.statements()
}

/// Parse a menu specification of the form `label:location;label:location`.
///
/// Called at execution time, after variable interpolation.
pub fn parse_menu_entries(spec: &str) -> Result<Vec<MenuEntry>, ParseError> {
    spec.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (label, location) = entry.rsplit_once(':').ok_or(ParseError::BadMenuEntry {
                entry: entry.to_string(),
            })?;
            Ok(MenuEntry {
                label: label.trim().to_string(),
                location: location.trim().to_string(),
            })
        })
        .collect()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn statements(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut out = Vec::new();
        if self.at_end() {
            return Ok(out);
        }
        loop {
            out.push(self.statement()?);
            if self.at_end() {
                break;
            }
            self.expect_amp()?;
            // A trailing `&` is tolerated, matching the engine's parser.
            if self.at_end() {
                break;
            }
        }
        Ok(out)
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        match self.next("a statement")? {
            Token::Str(text) => Ok(Statement::Print(text)),
            Token::Star => {
                let word = self.expect_ident()?;
                match word.to_ascii_lowercase().as_str() {
                    "clr" => Ok(Statement::ClearMain),
                    "pl" => Ok(Statement::Print(self.expect_str()?)),
                    _ => Err(ParseError::UnknownStatement {
                        found: format!("*{word}"),
                    }),
                }
            }
            Token::Ident(word) if word.starts_with('$') => {
                self.expect(Token::Eq, "=")?;
                let value = self.expect_str()?;
                Ok(Statement::Assign { var: word, value })
            }
            Token::Ident(word) => match word.to_ascii_lowercase().as_str() {
                "act" => {
                    let name = self.expect_str()?;
                    self.expect(Token::Colon, ":")?;
                    // The action body consumes the rest of the line.
                    let body = self.statements()?;
                    Ok(Statement::DefineAction { name, body })
                }
                "addobj" => Ok(Statement::AddObject(self.expect_str()?)),
                "delobj" => Ok(Statement::DelObject(self.expect_str()?)),
                "delact" => Ok(Statement::DelAction(self.expect_str()?)),
                "inclib" => Ok(Statement::IncludeLib(self.expect_str()?)),
                "gosub" | "gs" => Ok(Statement::GoSub(self.expect_str()?)),
                "goto" | "gt" => Ok(Statement::GoTo(self.expect_str()?)),
                "msg" => Ok(Statement::Message(self.expect_str()?)),
                "menu" => Ok(Statement::Menu(self.expect_str()?)),
                _ => Err(ParseError::UnknownStatement { found: word }),
            },
            other => Err(ParseError::Expected {
                expected: "a statement".to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn next(&mut self, expected: &str) -> Result<Token, ParseError> {
        let token = self.tokens.get(self.pos).cloned().ok_or_else(|| {
            ParseError::Expected {
                expected: expected.to_string(),
                found: "end of line".to_string(),
            }
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, token: Token, label: &str) -> Result<(), ParseError> {
        let found = self.next(label)?;
        if found == token {
            Ok(())
        } else {
            Err(ParseError::Expected {
                expected: label.to_string(),
                found: found.to_string(),
            })
        }
    }

    fn expect_str(&mut self) -> Result<String, ParseError> {
        match self.next("a string literal")? {
            Token::Str(s) => Ok(s),
            other => Err(ParseError::Expected {
                expected: "a string literal".to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.next("a statement keyword")? {
            Token::Ident(w) => Ok(w),
            other => Err(ParseError::Expected {
                expected: "a statement keyword".to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn expect_amp(&mut self) -> Result<(), ParseError> {
        self.expect(Token::Amp, "&")
    }
}
