//! Test program parser implementation.

use super::*;
use crate::absint::{ClassId, Nullness, PotentialOptimization};
use crate::core::{InlinerError, InlinerResult};
use std::collections::HashMap;

pub fn parse_program(text: &str) -> InlinerResult<TestProgram> {
    let parser = Parser::new(text);
    parser.parse()
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    program: TestProgram,

    methods: HashMap<&'a str, u32>,
    classes: HashMap<&'a str, u32>,
    /// Call targets, resolved once every method is known.
    method_resolves: Vec<Resolve<'a>>,
}

#[derive(Debug)]
struct Resolve<'a> {
    name: &'a str,
    method: usize,
    call: usize,
    slot: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            program: TestProgram::default(),
            methods: HashMap::new(),
            classes: HashMap::new(),
            method_resolves: Vec::new(),
        }
    }

    fn parse(mut self) -> InlinerResult<TestProgram> {
        if let Err(reason) = self.parse_items() {
            let line = self.line();
            log::debug!("Test program parse error at line {}: {}", line, reason);
            return Err(InlinerError::Parse { line, reason });
        }

        // Resolve all references
        self.resolve_all_references()?;
        self.validate()?;

        Ok(self.program)
    }

    fn line(&self) -> usize {
        self.text[..self.pos].matches('\n').count() + 1
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn current_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch == ';' {
                // Skip comment line
                while let Some(ch) = self.current_char() {
                    self.advance();
                    if ch == '\n' {
                        break;
                    }
                }
            } else if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn try_read(&mut self, ch: char) -> bool {
        self.skip_whitespace();
        if self.current_char() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ch: char) -> Result<(), String> {
        if !self.try_read(ch) {
            return Err(format!("Expected '{}' but found {:?}", ch, self.current_char()));
        }
        Ok(())
    }

    fn read_identifier(&mut self) -> Result<&'a str, String> {
        self.skip_whitespace();
        let start = self.pos;

        match self.current_char() {
            Some(ch) if ch.is_alphabetic() || ch == '_' => {}
            Some(ch) => return Err(format!("Expected identifier but found '{}'", ch)),
            None => return Err("Expected identifier but found EOF".to_string()),
        }

        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' || ch == '$' {
                self.advance();
            } else {
                break;
            }
        }

        Ok(&self.text[start..self.pos])
    }

    /// Consume `keyword` if it is the next identifier.
    fn try_keyword(&mut self, keyword: &str) -> bool {
        let saved = self.pos;
        match self.read_identifier() {
            Ok(ident) if ident == keyword => true,
            _ => {
                self.pos = saved;
                false
            }
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), String> {
        if !self.try_keyword(keyword) {
            return Err(format!("Expected '{}'", keyword));
        }
        Ok(())
    }

    fn read_digits(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        &self.text[start..self.pos]
    }

    fn read_number(&mut self) -> Result<u32, String> {
        self.skip_whitespace();
        let digits = self.read_digits();
        if digits.is_empty() {
            return Err(format!("Expected number but found {:?}", self.current_char()));
        }
        digits
            .parse()
            .map_err(|e| format!("Failed to parse number: {}", e))
    }

    fn read_int(&mut self) -> Result<i64, String> {
        self.skip_whitespace();
        let start = self.pos;
        if self.current_char() == Some('-') {
            self.advance();
        }
        if self.read_digits().is_empty() {
            return Err(format!("Expected integer but found {:?}", self.current_char()));
        }
        self.text[start..self.pos]
            .parse()
            .map_err(|e| format!("Failed to parse integer: {}", e))
    }

    fn read_float(&mut self) -> Result<f64, String> {
        self.skip_whitespace();
        let start = self.pos;
        self.read_digits();
        if self.current_char() == Some('.') {
            self.advance();
            self.read_digits();
        }
        let text = &self.text[start..self.pos];
        if text.is_empty() || text == "." {
            return Err(format!("Expected frequency but found {:?}", self.current_char()));
        }
        text.parse().map_err(|e| format!("Failed to parse frequency: {}", e))
    }

    fn data_type(name: &str) -> Option<DataType> {
        match name {
            "int" => Some(DataType::Int32),
            "long" => Some(DataType::Int64),
            "float" => Some(DataType::Float),
            "double" => Some(DataType::Double),
            "ref" => Some(DataType::Address),
            _ => None,
        }
    }

    fn read_type(&mut self) -> Result<DataType, String> {
        let name = self.read_identifier()?;
        Self::data_type(name).ok_or_else(|| format!("Unknown type '{}'", name))
    }

    fn try_type(&mut self) -> Option<DataType> {
        let saved = self.pos;
        let ty = self.read_identifier().ok().and_then(Self::data_type);
        if ty.is_none() {
            self.pos = saved;
        }
        ty
    }

    fn read_class(&mut self) -> Result<ClassId, String> {
        let name = self.read_identifier()?;
        match self.classes.get(name) {
            Some(&idx) => Ok(ClassId(idx)),
            None => Err(format!("Unknown class '{}'", name)),
        }
    }

    fn parse_items(&mut self) -> Result<(), String> {
        self.skip_whitespace();
        while !self.is_eof() {
            match self.read_identifier()? {
                "class" => self.parse_class(false)?,
                "interface" => self.parse_class(true)?,
                "method" => self.parse_method()?,
                other => {
                    return Err(format!(
                        "Expected 'class', 'interface' or 'method' but found '{}'",
                        other
                    ))
                }
            }
            self.skip_whitespace();
        }
        Ok(())
    }

    fn parse_class(&mut self, is_interface: bool) -> Result<(), String> {
        let name = self.read_identifier()?;
        if self.classes.contains_key(name) {
            return Err(format!("Duplicate class definition: '{}'", name));
        }

        let mut supers = Vec::new();
        if self.try_keyword("extends") {
            loop {
                supers.push(self.read_class()?.0);
                if !self.try_read(',') {
                    break;
                }
            }
        }

        self.classes.insert(name, self.program.classes.len() as u32);
        self.program.classes.push(Class { name: name.to_string(), is_interface, supers });
        Ok(())
    }

    fn parse_method(&mut self) -> Result<(), String> {
        let name = self.read_identifier()?;
        if self.methods.contains_key(name) {
            return Err(format!("Duplicate method definition: '{}'", name));
        }

        self.expect('(')?;
        let mut params = Vec::new();
        if !self.try_read(')') {
            loop {
                params.push(self.read_type()?);
                if self.try_read(')') {
                    break;
                }
                self.expect(',')?;
            }
        }

        self.expect_keyword("size")?;
        let size = self.read_number()?;

        let mut flags = MethodFlags::default();
        loop {
            if self.try_keyword("noinline") {
                flags.noinline = true;
            } else if self.try_keyword("inlined") {
                flags.inlined = true;
            } else if self.try_keyword("decline") {
                flags.decline = true;
            } else {
                break;
            }
        }

        let method_idx = self.program.methods.len();
        self.methods.insert(name, method_idx as u32);
        self.program.methods.push(Method {
            name: name.to_string(),
            params,
            size,
            flags,
            declaration: true,
            calls: Vec::new(),
            predicates: Vec::new(),
        });

        if !self.try_read('{') {
            return Ok(());
        }
        self.program.methods[method_idx].declaration = false;

        while !self.try_read('}') {
            if self.is_eof() {
                return Err(format!("Unterminated body of method '{}'", name));
            }
            match self.read_identifier()? {
                "call" => self.parse_call(method_idx)?,
                "pred" => self.parse_predicate(method_idx)?,
                other => return Err(format!("Expected 'call' or 'pred' but found '{}'", other)),
            }
        }
        Ok(())
    }

    fn parse_call(&mut self, method_idx: usize) -> Result<(), String> {
        let bc_index = self.read_number()?;
        if self.program.methods[method_idx].call_at(bc_index).is_some() {
            return Err(format!("Duplicate call site at bc {}", bc_index));
        }

        let kind = match self.read_identifier()? {
            "static" => CallKind::Static,
            "special" => CallKind::Special,
            "virtual" => CallKind::Virtual,
            "interface" => CallKind::Interface,
            other => return Err(format!("Unknown call kind '{}'", other)),
        };

        let call_idx = self.program.methods[method_idx].calls.len();
        let mut targets = Vec::new();
        loop {
            let name = self.read_identifier()?;
            self.method_resolves.push(Resolve {
                name,
                method: method_idx,
                call: call_idx,
                slot: targets.len(),
            });
            targets.push(MethodId(u32::MAX));
            if !self.try_read('|') {
                break;
            }
        }

        self.expect('(')?;
        let mut arguments = Vec::new();
        if !self.try_read(')') {
            loop {
                arguments.push(self.parse_operand()?);
                if self.try_read(')') {
                    break;
                }
                self.expect(',')?;
            }
        }

        let call_ratio = if self.try_keyword("freq") { self.read_float()? } else { 1.0 };

        self.program.methods[method_idx].calls.push(Call {
            bc_index,
            kind,
            targets,
            call_ratio,
            arguments,
        });
        Ok(())
    }

    fn parse_operand(&mut self) -> Result<Operand, String> {
        if self.try_read('%') {
            return Ok(Operand::Param(self.read_number()?));
        }
        if self.try_keyword("merge") {
            self.expect('(')?;
            let mut operands = vec![self.parse_operand()?];
            while self.try_read(',') {
                operands.push(self.parse_operand()?);
            }
            self.expect(')')?;
            if operands.len() < 2 {
                return Err("merge needs at least two operands".to_string());
            }
            return Ok(Operand::Merge(operands));
        }
        Ok(Operand::Value(self.parse_value()?))
    }

    fn parse_value(&mut self) -> Result<AbsValue, String> {
        match self.read_identifier()? {
            "int" => {
                if self.try_read('[') {
                    let low = self.read_int()?;
                    self.expect(',')?;
                    let high = self.read_int()?;
                    self.expect(']')?;
                    if low > high {
                        return Err(format!("Empty integer range [{}, {}]", low, high));
                    }
                    Ok(AbsValue::int_range(low, high))
                } else {
                    Ok(AbsValue::int_const(self.read_int()?))
                }
            }
            "null" => Ok(AbsValue::null()),
            "nonnull" => {
                if self.try_keyword("class") {
                    Ok(AbsValue::instance_of(self.read_class()?, Nullness::NonNull, false))
                } else if self.try_keyword("exact") {
                    Ok(AbsValue::instance_of(self.read_class()?, Nullness::NonNull, true))
                } else {
                    Ok(AbsValue::non_null())
                }
            }
            "class" => Ok(AbsValue::instance_of(self.read_class()?, Nullness::Unknown, false)),
            "exact" => Ok(AbsValue::instance_of(self.read_class()?, Nullness::Unknown, true)),
            "classobj" => Ok(AbsValue::class_object(self.read_class()?)),
            "top" => Ok(AbsValue::top(self.try_type().unwrap_or(DataType::Unknown))),
            other => Err(format!("Expected a value but found '{}'", other)),
        }
    }

    fn parse_predicate(&mut self, method_idx: usize) -> Result<(), String> {
        self.expect('%')?;
        let param = self.read_number()?;
        let bc_index = self.read_number()?;
        let kind = match self.read_identifier()? {
            "branch" => PotentialOptimization::BranchFolding,
            "nullbranch" => PotentialOptimization::NullBranchFolding,
            "nullcheck" => PotentialOptimization::NullCheckFolding,
            "instanceof" => PotentialOptimization::InstanceOfFolding,
            "checkcast" => PotentialOptimization::CheckCastFolding,
            other => return Err(format!("Unknown predicate kind '{}'", other)),
        };
        let constraint = self.parse_value()?;

        self.program.methods[method_idx].predicates.push(Predicate {
            param,
            predicate: PotentialOptimizationPredicate::new(bc_index, kind, constraint),
        });
        Ok(())
    }

    fn resolve_all_references(&mut self) -> InlinerResult<()> {
        for resolve in &self.method_resolves {
            let Some(&target) = self.methods.get(resolve.name) else {
                return Err(InlinerError::UnknownMethod { name: resolve.name.to_string() });
            };
            self.program.methods[resolve.method].calls[resolve.call].targets[resolve.slot] =
                MethodId(target);
        }
        Ok(())
    }

    fn validate(&self) -> InlinerResult<()> {
        let program = &self.program;
        for method in &program.methods {
            let num_params = method.params.len() as u32;
            for call in &method.calls {
                for operand in &call.arguments {
                    check_operand(method, operand)?;
                }
                for target in &call.targets {
                    let callee = program.method(*target);
                    if callee.params.len() != call.arguments.len() {
                        return Err(InlinerError::InvalidProgram {
                            reason: format!(
                                "Call at bc {} in '{}' passes {} arguments, '{}' takes {}",
                                call.bc_index,
                                method.name,
                                call.arguments.len(),
                                callee.name,
                                callee.params.len()
                            ),
                        });
                    }
                }
            }
            for predicate in &method.predicates {
                if predicate.param >= num_params {
                    return Err(InlinerError::InvalidProgram {
                        reason: format!(
                            "Predicate at bc {} in '{}' refers to parameter {} of {}",
                            predicate.predicate.bc_index,
                            method.name,
                            predicate.param,
                            num_params
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

fn check_operand(method: &Method, operand: &Operand) -> InlinerResult<()> {
    match operand {
        Operand::Param(idx) if *idx as usize >= method.params.len() => {
            Err(InlinerError::InvalidProgram {
                reason: format!(
                    "'{}' has {} parameters, %{} is out of range",
                    method.name,
                    method.params.len(),
                    idx
                ),
            })
        }
        Operand::Merge(operands) => {
            operands.iter().try_for_each(|operand| check_operand(method, operand))
        }
        _ => Ok(()),
    }
}
