// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::rc::Rc;

use crate::token::{Token, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Root,
    Attribute,
    /// Locator content never names attributes.
    Locator,
    Group,
    Projection,
    Filter,
    Sort,
}

impl Indicator {
    fn is_filter_or_sort(self) -> bool {
        matches!(self, Self::Filter | Self::Sort)
    }
}

#[derive(Debug)]
struct Frame {
    indicator: Indicator,
    identifiers: Vec<String>,
    below: Option<Rc<Frame>>,
}

#[derive(Debug, Clone)]
pub struct ScanState {
    indicator: Indicator,
    identifiers: Vec<String>,
    stack: Option<Rc<Frame>>,
}

impl Default for ScanState {
    fn default() -> Self {
        Self {
            indicator: Indicator::Root,
            identifiers: Vec::new(),
            stack: None,
        }
    }
}

impl ScanState {
    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn depth(&self) -> usize {
        std::iter::successors(self.stack.as_deref(), |frame| frame.below.as_deref()).count()
    }

    fn push(&self, indicator: Indicator, identifiers: Vec<String>) -> Self {
        Self {
            indicator,
            identifiers,
            stack: Some(Rc::new(Frame {
                indicator: self.indicator,
                identifiers: self.identifiers.clone(),
                below: self.stack.clone(),
            })),
        }
    }

    fn pop(&self) -> Option<Self> {
        let frame = self.stack.as_deref()?;
        Some(Self {
            indicator: frame.indicator,
            identifiers: frame.identifiers.clone(),
            stack: frame.below.clone(),
        })
    }

    fn pop_while(&self, matches: impl Fn(Indicator) -> bool) -> Self {
        let mut state = self.clone();
        while matches(state.indicator) {
            match state.pop() {
                Some(below) => state = below,
                None => break,
            }
        }
        state
    }

    /// Drops trailing attribute frames and at most one filter/sort frame,
    /// then opens `indicator` over the path being filtered. A failed pop
    /// keeps the state as it was.
    fn reopen(&self, indicator: Indicator) -> Self {
        let state = self.pop_while(|indicator| indicator == Indicator::Attribute);
        if state.indicator.is_filter_or_sort() {
            if let Some(outer) = state.pop() {
                return outer.push(indicator, state.identifiers);
            }
        }
        state.push(indicator, self.identifiers.clone())
    }

    fn close(&self, open: Indicator) -> Self {
        let state = self.pop_while(|indicator| {
            indicator == Indicator::Attribute || indicator.is_filter_or_sort()
        });
        if state.indicator == open {
            if let Some(outer) = state.pop() {
                return outer;
            }
        }
        self.clone()
    }

    fn extended(&self, name: &str) -> Vec<String> {
        let mut identifiers = self.identifiers.clone();
        identifiers.push(name.to_owned());
        identifiers
    }

    pub fn step(&self, previous: Option<&Token<'_>>, token: &Token<'_>, next: Option<&Token<'_>>) -> Self {
        if self.indicator == Indicator::Locator {
            return match token {
                Token::Punct('[' | '(') => self.push(Indicator::Locator, Vec::new()),
                Token::Punct(']' | ')') => self.pop().unwrap_or_else(|| self.clone()),
                _ => self.clone(),
            };
        }

        match token {
            Token::Name(name) => {
                let argument = previous.is_some_and(|token| token.is_punct(':') || token.is_punct('$'));
                let call = next.is_some_and(|token| token.is_punct('('));
                if argument || call {
                    self.clone()
                } else {
                    self.push(Indicator::Attribute, self.extended(name))
                }
            }
            Token::Punct('.') => self.clone(),
            Token::Arrow | Token::Punct('@' | '$') => self.push(Indicator::Attribute, Vec::new()),
            Token::Punct(op @ ('?' | '^')) => {
                let indicator = if *op == '?' { Indicator::Filter } else { Indicator::Sort };
                self.reopen(indicator)
            }
            Token::Punct('[') => self.push(Indicator::Locator, Vec::new()),
            Token::Punct('(') => self.push(Indicator::Group, self.identifiers.clone()),
            Token::Punct(')') => self.close(Indicator::Group),
            Token::Punct('{') => self.reopen(Indicator::Projection),
            Token::Punct('}') => self.close(Indicator::Projection),
            Token::Assign => {
                if self.indicator == Indicator::Attribute {
                    self.pop().unwrap_or_else(|| self.clone())
                } else {
                    self.clone()
                }
            }
            Token::Punct(':') => self.pop_while(|indicator| {
                indicator == Indicator::Attribute || indicator.is_filter_or_sort()
            }),
            _ => self.pop_while(|indicator| indicator == Indicator::Attribute),
        }
    }

    /// The identifier path, or `None` while a locator is left open.
    pub fn finish(&self) -> Option<Vec<String>> {
        (self.indicator != Indicator::Locator).then(|| self.identifiers.clone())
    }
}

pub fn scan(text: &str) -> Option<Vec<String>> {
    let tokens = tokenize(text);
    let mut state = ScanState::default();
    for (index, token) in tokens.iter().enumerate() {
        let previous = index.checked_sub(1).and_then(|index| tokens.get(index));
        state = state.step(previous, token, tokens.get(index + 1));
    }
    let path = state.finish();
    log::debug!("scanned {text:?} to {path:?}");
    path
}

#[cfg(test)]
mod tests {
    use super::{Indicator, ScanState, scan};
    use crate::token::Token;

    fn path(names: &[&str]) -> Option<Vec<String>> {
        Some(names.iter().map(|name| (*name).to_owned()).collect())
    }

    #[test]
    fn attribute_chains_extend_the_path() {
        assert_eq!(scan("/department.instructor"), path(&["department", "instructor"]));
        assert_eq!(scan("/"), path(&[]));
        assert_eq!(scan(""), path(&[]));
    }

    #[test]
    fn locators_do_not_extend_the_path() {
        assert_eq!(scan("/department[1]."), path(&["department"]));
        assert_eq!(scan("/department[comp.(x)]"), path(&["department"]));
    }

    #[test]
    fn open_locator_is_inconclusive() {
        assert_eq!(scan("/department[code"), None);
        assert_eq!(scan("/department[code(x)"), None);
    }

    #[test]
    fn assignment_replaces_its_name() {
        assert_eq!(scan("/department{name:=title"), path(&["department", "title"]));
    }

    #[test]
    fn projection_keeps_the_base_path() {
        assert_eq!(scan("/department{code, sch"), path(&["department", "sch"]));
        assert_eq!(scan("/department{code, "), path(&["department"]));
        assert_eq!(scan("/department{code}"), path(&[]));
    }

    #[test]
    fn filters_compose_without_nesting() {
        assert_eq!(scan("/school?campus='old'"), path(&["school"]));
        let state = ["/", "school", "?", "code", "=", "'ns'", "?", "name"]
            .iter()
            .fold(ScanState::default(), |state, text| {
                let tokens = crate::tokenize(text);
                state.step(None, &tokens[0], None)
            });
        assert_eq!(state.identifiers(), ["school", "name"]);
        assert_eq!(state.depth(), 2);
    }

    #[test]
    fn a_filter_after_a_sort_keeps_the_sorted_base() {
        assert_eq!(scan("/school^name?code"), path(&["school", "code"]));
        assert_eq!(scan("/school^name"), path(&["school", "name"]));
        assert_eq!(scan("/school^name^"), path(&["school"]));
    }

    #[test]
    fn projection_after_a_filter_drops_the_filter_chain() {
        assert_eq!(scan("/school?campus{na"), path(&["school", "na"]));
        assert_eq!(scan("/school.department^code{na"), path(&["school", "department", "na"]));
        let state = ["/", "school", "?", "campus", "{"]
            .iter()
            .fold(ScanState::default(), |state, text| {
                let tokens = crate::tokenize(text);
                state.step(None, &tokens[0], None)
            });
        assert_eq!(state.indicator(), Indicator::Projection);
        assert_eq!(state.depth(), 1);
    }

    #[test]
    fn colon_leaves_attribute_and_filter_scopes() {
        assert_eq!(scan("/school{code}:csv"), path(&[]));
        assert_eq!(scan("/school.department:top"), path(&[]));
        assert_eq!(scan("/school?campus:top"), path(&[]));
        assert_eq!(scan("/school{code:top"), path(&["school"]));
    }

    #[test]
    fn function_names_and_arguments_are_skipped() {
        assert_eq!(scan("/count(department"), path(&["department"]));
        assert_eq!(scan("/department.count(course"), path(&["department", "course"]));
        assert_eq!(scan("/department?exists(course)&"), path(&["department"]));
        assert_eq!(scan("/school.define(x:=code)"), path(&["school"]));
        assert_eq!(scan("/school?name~$pat"), path(&[]));
    }

    #[test]
    fn arrows_and_at_open_a_fresh_scope() {
        assert_eq!(scan("/school->department"), path(&["department"]));
        assert_eq!(scan("/school{name, @code"), path(&["code"]));
    }

    #[test]
    fn unbalanced_close_is_tolerated() {
        assert_eq!(scan("/school)"), path(&["school"]));
        assert_eq!(scan("/school}.name"), path(&["school", "name"]));
        let state = ScanState::default().step(None, &Token::Punct(')'), None);
        assert_eq!(state.indicator(), Indicator::Root);
    }
}
