// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::scanner::scan;

/// Where a completion applies: the path whose children are wanted and the
/// partial name already typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionContext {
    pub path: Vec<String>,
    pub prefix: String,
    /// Byte offset of `prefix` in the text it was taken from.
    pub start: usize,
}

impl CompletionContext {
    pub fn matching(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter(|name| name.starts_with(&self.prefix))
            .cloned()
            .collect()
    }
}

/// Splits the text before the cursor into the word being typed and the
/// scanned path in front of it. `None` means completion does not apply
/// here: inside a literal, after a number, on a parameter or keyword
/// argument, or inside an open locator.
pub fn completion_context(before_cursor: &str) -> Option<CompletionContext> {
    let start = before_cursor
        .char_indices()
        .rev()
        .take_while(|(_, ch)| ch.is_alphanumeric() || *ch == '_')
        .last()
        .map_or(before_cursor.len(), |(index, _)| index);
    let (head, prefix) = before_cursor.split_at(start);

    if prefix.starts_with(|ch: char| ch.is_numeric()) {
        return None;
    }
    if head.matches('\'').count() % 2 == 1 {
        return None;
    }
    if head.ends_with([':', '$']) {
        return None;
    }

    let path = scan(head)?;
    Some(CompletionContext {
        path,
        prefix: prefix.to_owned(),
        start,
    })
}

#[cfg(test)]
mod tests {
    use super::completion_context;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn prefix_is_split_from_the_path() {
        let context = completion_context("/department.na").expect("completable");
        assert_eq!(context.path, strings(&["department"]));
        assert_eq!(context.prefix, "na");
        assert_eq!(context.start, 12);

        let context = completion_context("/dep").expect("completable");
        assert!(context.path.is_empty());
        assert_eq!(context.prefix, "dep");
    }

    #[test]
    fn empty_prefix_after_a_separator() {
        let context = completion_context("/department{code, ").expect("completable");
        assert_eq!(context.path, strings(&["department"]));
        assert_eq!(context.prefix, "");
        assert_eq!(context.start, 18);
    }

    #[test]
    fn no_completion_in_literals_locators_or_numbers() {
        assert_eq!(completion_context("/school?name='Sch"), None);
        assert_eq!(completion_context("/department[co"), None);
        assert_eq!(completion_context("/department.limit(1"), None);
        assert_eq!(completion_context("/school?name~$pa"), None);
        assert!(completion_context("/school?name='it''s'&ca").is_some());
    }

    #[test]
    fn matching_filters_by_prefix() {
        let context = completion_context("/department.s").expect("completable");
        let names = strings(&["code", "school", "school_code", "name"]);
        assert_eq!(context.matching(&names), strings(&["school", "school_code"]));
    }
}
