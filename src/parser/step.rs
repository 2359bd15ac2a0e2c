use std::collections::BTreeMap;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    String(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Enum(String),
    Reference(u64),
    List(Vec<StepValue>),
    /// Typed parameter such as `IFCLENGTHMEASURE(3.)`.
    Typed {
        type_name: String,
        value: Box<StepValue>,
    },
    Null,
    Derived,
}

impl StepValue {
    /// Unwraps typed parameters down to the measure itself.
    #[must_use]
    pub fn inner(&self) -> &StepValue {
        match self {
            StepValue::Typed { value, .. } => value.inner(),
            other => other,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self.inner() {
            StepValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_reference(&self) -> Option<u64> {
        match self {
            StepValue::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Reference ids of a list attribute; anything else yields nothing.
    #[must_use]
    pub fn references(&self) -> Vec<u64> {
        match self {
            StepValue::List(items) => items.iter().filter_map(StepValue::as_reference).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepEntity {
    pub id: u64,
    pub entity_type: String,
    pub values: Vec<StepValue>,
}

impl StepEntity {
    #[must_use]
    pub fn attribute(&self, index: usize) -> Option<&StepValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn string_attribute(&self, index: usize) -> Option<&str> {
        self.attribute(index).and_then(StepValue::as_str)
    }

    #[must_use]
    pub fn reference_attribute(&self, index: usize) -> Option<u64> {
        self.attribute(index).and_then(StepValue::as_reference)
    }
}

/// Entities of the DATA section keyed by instance id, iterated in id order.
#[derive(Debug)]
pub struct StepFile {
    pub entities: BTreeMap<u64, StepEntity>,
    pub schema: String,
}

impl StepFile {
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let mut entities = BTreeMap::new();
        let mut schema = String::new();
        let mut in_data = false;

        for (line, statement) in Statements::new(content) {
            if statement.starts_with("FILE_SCHEMA") {
                if let Some(name) = statement.split('\'').nth(1) {
                    schema = name.to_string();
                }
                continue;
            }
            match statement {
                "DATA" => {
                    in_data = true;
                    continue;
                }
                "ENDSEC" => {
                    in_data = false;
                    continue;
                }
                _ => {}
            }

            if in_data && statement.starts_with('#') {
                let entity = parse_entity(statement)
                    .map_err(|message| ParseError::InvalidStep { line, message })?;
                if let Some(entity) = entity {
                    entities.insert(entity.id, entity);
                }
            }
        }

        Ok(StepFile { entities, schema })
    }

    #[must_use]
    pub fn get_entity(&self, id: u64) -> Option<&StepEntity> {
        self.entities.get(&id)
    }

    pub fn entities_of_type<'a>(
        &'a self,
        entity_type: &'a str,
    ) -> impl Iterator<Item = &'a StepEntity> + 'a {
        self.entities
            .values()
            .filter(move |e| e.entity_type == entity_type)
    }
}

/// Splits STEP text into `;`-terminated statements, skipping comments and
/// respecting string literals. Yields the 1-based line each statement starts on.
struct Statements<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Statements<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 1 }
    }

    fn skip_trivia(&mut self) {
        let src = self.src;
        loop {
            let rest = &src[self.pos..];
            let trimmed = rest.trim_start();
            self.line += rest[..rest.len() - trimmed.len()].matches('\n').count();
            self.pos += rest.len() - trimmed.len();

            if !trimmed.starts_with("/*") {
                return;
            }
            let end = trimmed.find("*/").map_or(trimmed.len(), |i| i + 2);
            self.line += trimmed[..end].matches('\n').count();
            self.pos += end;
        }
    }
}

impl<'a> Iterator for Statements<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_trivia();
        let src = self.src;
        if self.pos >= src.len() {
            return None;
        }

        let start = self.pos;
        let start_line = self.line;
        let mut in_string = false;
        // Relative offset where the current comment ends.
        let mut comment_end = 0;
        let mut end = src.len();
        let mut resume = src.len();

        for (offset, ch) in src[start..].char_indices() {
            if ch == '\n' {
                self.line += 1;
            }
            if offset < comment_end {
                continue;
            }
            match ch {
                '/' if !in_string && src[start + offset..].starts_with("/*") => {
                    let body = offset + 2;
                    comment_end = src[start + body..]
                        .find("*/")
                        .map_or(src.len() - start, |i| body + i + 2);
                }
                '\'' => in_string = !in_string,
                ';' if !in_string => {
                    end = start + offset;
                    resume = end + 1;
                    break;
                }
                _ => {}
            }
        }

        self.pos = resume;
        Some((start_line, src[start..end].trim()))
    }
}

/// Parses `#12=IFCWALL(...)`. Complex instances `#12=(A()B())` are skipped.
fn parse_entity(statement: &str) -> Result<Option<StepEntity>, String> {
    let (lhs, rhs) = statement
        .split_once('=')
        .ok_or_else(|| format!("missing '=' in '{statement}'"))?;
    let id: u64 = lhs
        .trim()
        .trim_start_matches('#')
        .parse()
        .map_err(|_| format!("invalid instance id '{}'", lhs.trim()))?;

    let rhs = rhs.trim_start();
    if rhs.starts_with('(') {
        return Ok(None);
    }

    let mut cursor = Cursor::new(rhs);
    let entity_type = cursor.keyword();
    if entity_type.is_empty() {
        return Err(format!("#{id}: missing entity type"));
    }
    cursor.skip_ws();
    cursor.expect('(').map_err(|e| format!("#{id}: {e}"))?;
    let values = cursor.list_items().map_err(|e| format!("#{id}: {e}"))?;

    Ok(Some(StepEntity {
        id,
        entity_type,
        values,
    }))
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Whitespace and `/* */` comments.
    fn skip_ws(&mut self) {
        let src = self.src;
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            }
            let rest = &src[self.pos..];
            if !rest.starts_with("/*") {
                return;
            }
            self.pos += rest[2..].find("*/").map_or(rest.len(), |i| i + 4);
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        match self.bump() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(format!("expected '{expected}', found '{ch}'")),
            None => Err(format!("expected '{expected}', found end of input")),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &src[start..self.pos]
    }

    fn keyword(&mut self) -> String {
        self.take_while(|c| c.is_ascii_alphanumeric() || c == '_')
            .to_ascii_uppercase()
    }

    /// Items up to and including the closing `)`; the opening one is consumed.
    fn list_items(&mut self) -> Result<Vec<StepValue>, String> {
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(items);
        }

        loop {
            items.push(self.value()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => {}
                Some(')') => return Ok(items),
                Some(ch) => return Err(format!("unexpected '{ch}' in list")),
                None => return Err("unterminated list".to_string()),
            }
        }
    }

    fn value(&mut self) -> Result<StepValue, String> {
        self.skip_ws();
        match self.peek() {
            Some('$') => {
                self.bump();
                Ok(StepValue::Null)
            }
            Some('*') => {
                self.bump();
                Ok(StepValue::Derived)
            }
            Some('#') => {
                self.bump();
                let digits = self.take_while(|c| c.is_ascii_digit());
                digits
                    .parse()
                    .map(StepValue::Reference)
                    .map_err(|_| format!("invalid reference '#{digits}'"))
            }
            Some('\'') => self.string().map(StepValue::String),
            Some('"') => {
                self.bump();
                let hex = self.take_while(|c| c != '"').to_string();
                self.expect('"')?;
                Ok(StepValue::String(hex))
            }
            Some('.') => {
                self.bump();
                let inner = self.take_while(|c| c != '.').to_string();
                self.expect('.')?;
                Ok(match inner.as_str() {
                    "T" => StepValue::Boolean(true),
                    "F" => StepValue::Boolean(false),
                    _ => StepValue::Enum(inner),
                })
            }
            Some('(') => {
                self.bump();
                self.list_items().map(StepValue::List)
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let type_name = self.keyword();
                self.skip_ws();
                self.expect('(')?;
                let mut args = self.list_items()?;
                let value = if args.len() == 1 {
                    args.remove(0)
                } else {
                    StepValue::List(args)
                };
                Ok(StepValue::Typed {
                    type_name,
                    value: Box::new(value),
                })
            }
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let number =
                    self.take_while(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'E' | 'e'));
                parse_number(number)
            }
            Some(ch) => Err(format!("unexpected character '{ch}'")),
            None => Err("unexpected end of input".to_string()),
        }
    }

    /// Reads a quoted literal, collapsing `''` and decoding escapes.
    fn string(&mut self) -> Result<String, String> {
        self.expect('\'')?;
        let mut raw = String::new();
        loop {
            match self.bump() {
                Some('\'') if self.peek() == Some('\'') => {
                    self.bump();
                    raw.push('\'');
                }
                Some('\'') => return Ok(decode_step_string(&raw)),
                Some(ch) => raw.push(ch),
                None => return Err("unterminated string".to_string()),
            }
        }
    }
}

fn parse_number(text: &str) -> Result<StepValue, String> {
    if !text.contains(['.', 'E', 'e']) {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(StepValue::Integer(i));
        }
    }
    text.parse::<f64>()
        .map(StepValue::Real)
        .map_err(|_| format!("invalid number '{text}'"))
}

/// Decodes the ISO 10303-21 control directives inside a string literal:
/// `\X2\hhhh…\X0\` (UCS-2), `\X4\hhhhhhhh…\X0\` (UCS-4), `\X\hh` (ISO 8859-1),
/// `\S\c` (high half of ISO 8859-1) and `\\`.
fn decode_step_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(idx) = rest.find('\\') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];

        if let Some(tail) = rest.strip_prefix("\\X2\\") {
            let (decoded, remaining) = decode_wide(tail, 4);
            out.push_str(&decoded);
            rest = remaining;
        } else if let Some(tail) = rest.strip_prefix("\\X4\\") {
            let (decoded, remaining) = decode_wide(tail, 8);
            out.push_str(&decoded);
            rest = remaining;
        } else if let Some(tail) = rest.strip_prefix("\\X\\") {
            match tail.get(..2).and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
                Some(byte) => {
                    out.push(char::from(byte));
                    rest = &tail[2..];
                }
                None => {
                    out.push_str("\\X\\");
                    rest = tail;
                }
            }
        } else if let Some(tail) = rest.strip_prefix("\\S\\") {
            let mut chars = tail.chars();
            match chars.next() {
                Some(c) if c.is_ascii() => {
                    out.push(char::from(c as u8 + 128));
                    rest = chars.as_str();
                }
                _ => {
                    out.push_str("\\S\\");
                    rest = tail;
                }
            }
        } else if let Some(tail) = rest.strip_prefix("\\\\") {
            out.push('\\');
            rest = tail;
        } else {
            out.push('\\');
            rest = &rest[1..];
        }
    }

    out.push_str(rest);
    out
}

/// Decodes fixed-width hex code points up to the `\X0\` terminator.
fn decode_wide(tail: &str, width: usize) -> (String, &str) {
    let (hex, remaining) = match tail.find("\\X0\\") {
        Some(end) => (&tail[..end], &tail[end + 4..]),
        None => (tail, ""),
    };

    let decoded = hex
        .as_bytes()
        .chunks(width)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .filter_map(|code| u32::from_str_radix(code, 16).ok())
        .filter_map(char::from_u32)
        .collect();

    (decoded, remaining)
}
