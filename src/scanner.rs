use super::{config::MAIN_INDEX, error::*};
use log::{debug, warn};

pub const LINE_COMMENT: &str = "//";
pub const BLOCK_COMMENT: &str = "~~~";

const PROGRAM_START: &str = "[";
const PROGRAM_END: &str = "]";
const LOCAL_INDEX: &str = "here";

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionSource {
    pub params: Vec<String>,
    // Body lines, trimmed and constant-substituted. Blank lines are kept.
    pub lines: Vec<String>,
    // Line of the function header
    pub line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Declaration {
    Scalar(String),
    Array(Vec<String>),
    Object(ScannedProgram),
    Function(FunctionSource),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScannedEntry {
    pub index: String,
    pub line: usize,
    pub declaration: Declaration,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScannedProgram {
    pub entries: Vec<ScannedEntry>,
}

impl ScannedProgram {
    pub fn get(&self, index: &str) -> Option<&Declaration> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.index == index)
            .map(|entry| &entry.declaration)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Section {
    Preamble,
    Body,
    Closed,
}

struct OpenObject {
    index: String,
    line: usize,
    program: ScannedProgram,
}

// Lexical Scanner
// Splits source into declarations
pub struct Scanner {
    // Source code, one trimmed string per physical line
    lines: Vec<String>,
    // Offset of the next line to scan
    current: usize,
    // Constants in declaration order
    constants: Vec<(String, String)>,
    // Where we are relative to the program brackets
    section: Section,
    // Inside a block comment
    in_comment: bool,
    // The top level program
    program: ScannedProgram,
    // Objects being scanned, innermost last
    objects: Vec<OpenObject>,
}

impl Scanner {
    // Do a full scan of the source.
    pub fn scan(source: &str) -> ArrhResult<ScannedProgram> {
        let mut scanner = Self {
            lines: source.split('\n').map(|line| line.trim().to_owned()).collect(),
            current: 0,
            constants: vec![("MAIN".into(), MAIN_INDEX.into())],
            section: Section::Preamble,
            in_comment: false,
            program: ScannedProgram::default(),
            objects: vec![],
        };
        while let Some(line) = scanner.advance() {
            if !scanner.scan_line(line)? {
                break;
            }
        }
        scanner.finish()
    }

    // Scan a single line, returning false once the program is closed.
    fn scan_line(&mut self, raw: String) -> ArrhResult<bool> {
        if self.skip_comment(&raw) {
            return Ok(true);
        }
        let line = strip_line_comment(&raw);
        if line.is_empty() {
            return Ok(true);
        }
        if is_definition(line) {
            if self.section != Section::Preamble {
                return Err(self.error("Constant declared after the preamble"));
            }
            self.define(line)?;
            return Ok(true);
        }
        let line = self.substitute(line);

        if self.section == Section::Preamble {
            return match line.as_str() {
                PROGRAM_START => {
                    self.section = Section::Body;
                    Ok(true)
                }
                PROGRAM_END => Err(self.error("Program end without a matching start")),
                _ => Err(self.error(format!("Expected program start, got \"{}\"", line))),
            };
        }

        if let Some(index) = object_start(&line) {
            let index = self.parse_index(index)?;
            debug!("Start object [{}]", index);
            self.objects.push(OpenObject {
                index,
                line: self.current,
                program: ScannedProgram::default(),
            });
            return Ok(true);
        }

        match line.as_str() {
            PROGRAM_END => match self.objects.pop() {
                Some(object) => {
                    debug!("Finished object [{}]", object.index);
                    self.add_entry(
                        object.index,
                        object.line,
                        Declaration::Object(object.program),
                    );
                    Ok(true)
                }
                None => {
                    self.section = Section::Closed;
                    Ok(false)
                }
            },
            PROGRAM_START => Err(self.error("Unexpected program start inside the program")),
            _ if line.ends_with('{') => {
                self.scan_function(&line)?;
                Ok(true)
            }
            _ => {
                self.scan_entry(&line)?;
                Ok(true)
            }
        }
    }

    // Check that every opened section got closed.
    fn finish(mut self) -> ArrhResult<ScannedProgram> {
        if let Some(object) = self.objects.pop() {
            return Err(ArrhError::structural(
                format!("Unterminated object [{}]", object.index),
                object.line,
            ));
        }
        match self.section {
            Section::Preamble => Err(ArrhError::structural(
                "Missing program start",
                self.lines.len(),
            )),
            Section::Body => {
                warn!("Program body is never closed");
                Ok(self.program)
            }
            Section::Closed => {
                let trailing = self.lines[self.current..]
                    .iter()
                    .filter(|line| !strip_line_comment(line).is_empty())
                    .count();
                if trailing > 0 {
                    warn!("Ignoring {} line(s) after the program end", trailing);
                }
                Ok(self.program)
            }
        }
    }

    // Track block comments, returning true if the line is part of one.
    fn skip_comment(&mut self, line: &str) -> bool {
        if line.starts_with(BLOCK_COMMENT) {
            self.in_comment = !self.in_comment;
            true
        } else {
            self.in_comment
        }
    }

    // Register a `def NAME VALUE` constant.
    fn define(&mut self, line: &str) -> ArrhResult {
        let rest = line["def".len()..].trim();
        let (name, value) = match rest.split_once(char::is_whitespace) {
            Some((name, value)) => (name, value.trim()),
            None => (rest, ""),
        };
        if name.is_empty() || value.is_empty() {
            return Err(self.error(format!("Malformed constant \"{}\"", line)));
        }
        debug!("Constant {} = {}", name, value);
        self.constants.push((name.into(), value.into()));
        Ok(())
    }

    // Replace the first constant found in the line. Later constants are
    // left alone even if they also occur.
    fn substitute(&self, line: &str) -> String {
        for (name, value) in self.constants.iter() {
            if line.contains(name.as_str()) {
                return line.replace(name.as_str(), value);
            }
        }
        line.to_owned()
    }

    // Scan a function header and its body up to the closing brace.
    fn scan_function(&mut self, header: &str) -> ArrhResult {
        let line = self.current;
        let (index, signature) = self.split_declaration(header)?;
        let params = self.parse_params(signature)?;
        let mut lines = vec![];
        let mut in_comment = false;
        loop {
            let raw = match self.advance() {
                Some(raw) => raw,
                None => {
                    return Err(ArrhError::structural(
                        format!("Unterminated function [{}]", index),
                        line,
                    ))
                }
            };
            if raw == "}" {
                break;
            }
            if raw.starts_with(BLOCK_COMMENT) {
                in_comment = !in_comment;
                continue;
            }
            if in_comment || raw.starts_with(LINE_COMMENT) {
                continue;
            }
            lines.push(self.substitute(strip_line_comment(&raw)));
        }
        debug!("Function [{}]({}) with {} line(s)", index, params.join(","), lines.len());
        self.add_entry(
            index,
            line,
            Declaration::Function(FunctionSource {
                params,
                lines,
                line,
            }),
        );
        Ok(())
    }

    // Scan a scalar or array entry.
    fn scan_entry(&mut self, line: &str) -> ArrhResult {
        let (index, value) = self.split_declaration(line)?;
        if value.is_empty() {
            return Err(self.error(format!("Missing value for [{}]", index)));
        }
        let declaration = match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
            Some(items) if items.trim().is_empty() => Declaration::Array(vec![]),
            Some(items) => Declaration::Array(
                items
                    .split(',')
                    .map(|item| unquote(item.trim()).to_owned())
                    .collect(),
            ),
            None => Declaration::Scalar(unquote(value).to_owned()),
        };
        debug!("Entry [{}] => {:?}", index, declaration);
        self.add_entry(index, self.current, declaration);
        Ok(())
    }

    fn split_declaration<'a>(&self, line: &'a str) -> ArrhResult<(String, &'a str)> {
        match line.split_once("=>") {
            Some((index, value)) => Ok((self.parse_index(index)?, value.trim())),
            None => Err(self.error(format!("Expected declaration, got \"{}\"", line))),
        }
    }

    fn parse_index(&self, index: &str) -> ArrhResult<String> {
        let index = index.trim();
        if is_index(index) {
            Ok(index.into())
        } else {
            Err(self.error(format!("Invalid index \"{}\"", index)))
        }
    }

    // Parse `(a, b) {` into parameter names.
    fn parse_params(&self, signature: &str) -> ArrhResult<Vec<String>> {
        let malformed = || self.error(format!("Malformed function header \"{}\"", signature));
        let inner = signature
            .strip_suffix('{')
            .map(str::trim_end)
            .and_then(|s| s.strip_prefix('('))
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(malformed)?;
        if inner.trim().is_empty() {
            return Ok(vec![]);
        }
        inner
            .split(',')
            .map(|param| {
                let name = param.trim();
                let name = name.strip_prefix('$').unwrap_or(name);
                if is_index(name) {
                    Ok(name.to_owned())
                } else {
                    Err(malformed())
                }
            })
            .collect()
    }

    fn add_entry(&mut self, index: String, line: usize, declaration: Declaration) {
        let program = match self.objects.last_mut() {
            Some(object) => &mut object.program,
            None => &mut self.program,
        };
        let kind = std::mem::discriminant(&declaration);
        let previous = program.entries.iter().rev().find(|entry| {
            entry.index == index && std::mem::discriminant(&entry.declaration) == kind
        });
        if let Some(previous) = previous {
            warn!(
                "Line {}: redeclaring [{}] from line {}",
                line, index, previous.line
            );
        }
        program.entries.push(ScannedEntry {
            index,
            line,
            declaration,
        });
    }

    // Consume the next line.
    fn advance(&mut self) -> Option<String> {
        let line = self.lines.get(self.current).cloned();
        if line.is_some() {
            self.current += 1;
        }
        line
    }

    // Build an error for the line just consumed.
    fn error(&self, message: impl Into<String>) -> ArrhError {
        ArrhError::structural(message, self.current)
    }
}

/// Identifier usable as an entry index or parameter name.
pub fn is_index(text: &str) -> bool {
    !text.is_empty()
        && text != LOCAL_INDEX
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Strip one pair of surrounding single quotes.
pub fn unquote(text: &str) -> &str {
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

// Cut a trailing line comment that is not inside a quoted literal.
fn strip_line_comment(line: &str) -> &str {
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        if c == '\'' {
            quoted = !quoted;
        } else if !quoted && line[i..].starts_with(LINE_COMMENT) {
            return line[..i].trim_end();
        }
    }
    line
}

fn is_definition(line: &str) -> bool {
    line.strip_prefix("def")
        .map_or(false, |rest| rest.starts_with(char::is_whitespace))
}

// `INDEX => [` opens a nested object.
fn object_start(line: &str) -> Option<&str> {
    match line.split_once("=>") {
        Some((index, value)) if value.trim() == PROGRAM_START => Some(index),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_scripts::*;
    use mock_logger::MockLogger;

    fn function<'a>(program: &'a ScannedProgram, index: &str) -> &'a FunctionSource {
        match program.get(index) {
            Some(Declaration::Function(source)) => source,
            other => panic!("Expected function at [{}], got {:?}", index, other),
        }
    }

    #[test]
    fn scalars_and_arrays() -> ArrhResult {
        let program = Scanner::scan(
            r#"
            [
            0 => 'hej'
            1 => 42
            2 => [1, 2, 3]
            3 => ['a', 'b']
            4 => []
            ]
        "#,
        )?;
        assert_eq!(program.get("0"), Some(&Declaration::Scalar("hej".into())));
        assert_eq!(program.get("1"), Some(&Declaration::Scalar("42".into())));
        assert_eq!(
            program.get("2"),
            Some(&Declaration::Array(vec!["1".into(), "2".into(), "3".into()]))
        );
        assert_eq!(
            program.get("3"),
            Some(&Declaration::Array(vec!["a".into(), "b".into()]))
        );
        assert_eq!(program.get("4"), Some(&Declaration::Array(vec![])));
        Ok(())
    }

    #[test]
    fn functions() -> ArrhResult {
        let program = Scanner::scan(PARAMETER_SUM)?;
        let sum = function(&program, "1");
        assert_eq!(sum.params, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(sum.lines, vec!["$a + $b".to_string()]);
        let main = function(&program, MAIN_INDEX);
        assert!(main.params.is_empty());
        assert_eq!(main.lines, vec!["[1](1,1)".to_string()]);
        Ok(())
    }

    #[test]
    fn blank_lines_survive_in_function_bodies() -> ArrhResult {
        let program = Scanner::scan(
            r#"
            [
            666 => () {
            if 1 < 2
            'yes'

            'after'
            }
            ]
        "#,
        )?;
        assert_eq!(
            function(&program, "666").lines,
            vec!["if 1 < 2", "'yes'", "", "'after'"]
        );
        Ok(())
    }

    #[test]
    fn comments() -> ArrhResult {
        let program = Scanner::scan(COMMENTS)?;
        assert_eq!(program.get("0"), Some(&Declaration::Scalar("kept".into())));
        assert_eq!(program.get("1"), None);
        assert_eq!(
            function(&program, "666").lines,
            vec!["[0]", "'a // b'"]
        );
        Ok(())
    }

    #[test]
    fn constants() -> ArrhResult {
        let program = Scanner::scan(CONSTANTS)?;
        assert!(program.get("1").is_some());
        assert_eq!(function(&program, "666").lines, vec!["[1]()"]);
        Ok(())
    }

    #[test]
    fn first_constant_wins() -> ArrhResult {
        let program = Scanner::scan(
            r#"
            def A 1
            def B 2
            [
            666 => () {
            [A] ^ [B] ^ [A]
            }
            ]
        "#,
        )?;
        assert_eq!(function(&program, "666").lines, vec!["[1] ^ [B] ^ [1]"]);
        Ok(())
    }

    #[test]
    fn nested_objects() -> ArrhResult {
        let program = Scanner::scan(OBJECTS)?;
        let object = match program.get("1") {
            Some(Declaration::Object(object)) => object,
            other => panic!("Expected object, got {:?}", other),
        };
        assert_eq!(object.get("0"), Some(&Declaration::Scalar("inner".into())));
        assert!(matches!(object.get("2"), Some(Declaration::Function(_))));
        assert!(matches!(program.get("666"), Some(Declaration::Function(_))));
        Ok(())
    }

    #[test]
    fn late_constant() {
        let result = Scanner::scan("[\ndef X 1\n]");
        match result {
            Err(ArrhError::Structural(err)) => assert_eq!(err.line(), 2),
            other => panic!("Expected structural error, got {:?}", other),
        }
    }

    #[test]
    fn structural_errors() {
        let sources = [
            "]",
            "def X\n[\n]",
            "0 => 'x'\n[\n]",
            "[\n0 => [\n1 => 'x'\n",
            "[\n0 => () {\n'x'\n",
            "[\nfoo bar => 'x'\n]",
            "[\nhere => 'x'\n]",
            "[\n0 => (a,,b) {\n}\n]",
            "",
        ];
        for source in sources {
            assert!(
                matches!(Scanner::scan(source), Err(ArrhError::Structural(_))),
                "Expected structural error for {:?}",
                source
            );
        }
    }

    #[test]
    fn unclosed_program_is_tolerated() -> ArrhResult {
        let program = Scanner::scan("[\n0 => 'x'\n")?;
        assert_eq!(program.get("0"), Some(&Declaration::Scalar("x".into())));
        Ok(())
    }

    #[test]
    fn redeclaration_names_the_earlier_line() -> ArrhResult {
        mock_logger::init();
        let program = Scanner::scan("[\n0 => 'a'\n1 => 'b'\n0 => 'c'\n]")?;
        assert_eq!(program.get("0"), Some(&Declaration::Scalar("c".into())));
        assert_eq!(program.entries[0].line, 2);
        MockLogger::entries(|entries| {
            assert!(entries
                .iter()
                .any(|entry| entry.body == "Line 4: redeclaring [0] from line 2"));
        });
        Ok(())
    }
}
