// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::{Value, json};

pub const PAGE_SIZE: usize = 4;

const SCHOOLS: [(&str, &str, &str); 3] = [
    ("art", "School of Art & Design", "old"),
    ("eng", "School of Engineering", "north"),
    ("ns", "School of Natural Sciences", "old"),
];

const DEPARTMENTS: [(&str, &str, Option<&str>); 7] = [
    ("arthis", "Art History", Some("art")),
    ("astro", "Astronomy", Some("ns")),
    ("be", "Bioengineering", Some("eng")),
    ("chem", "Chemistry", Some("ns")),
    ("comp", "Computer Science", Some("eng")),
    ("lang", "Foreign Languages", None),
    ("mth", "Mathematics", Some("ns")),
];

const COURSES: [(&str, u32, &str, u32, Option<&str>); 6] = [
    ("astro", 105, "General Astronomy", 3, None),
    ("astro", 142, "Solar System Lab", 2, Some("<lab>")),
    ("chem", 100, "Principles of Chemistry", 3, Some("")),
    ("comp", 102, "Introduction to Computing", 3, None),
    ("mth", 101, "College Algebra", 5, None),
    ("mth", 215, "Calculus I", 4, Some("Prerequisite: mth.101")),
];

const SCHEMA: [(&str, &[&str]); 6] = [
    ("", &["course", "department", "instructor", "school"]),
    ("course", &["credits", "department", "description", "no", "title"]),
    ("department", &["code", "course", "name", "school"]),
    ("department.school", &["campus", "code", "department", "name"]),
    ("instructor", &["code", "full_name", "title"]),
    ("school", &["campus", "code", "department", "name"]),
];

fn text(header: &str) -> Value {
    json!({"header": header, "domain": {"type": "text"}})
}

fn integer(header: &str) -> Value {
    json!({"header": header, "domain": {"type": "integer"}})
}

pub fn department_meta() -> Value {
    json!({
        "header": "department",
        "domain": {
            "type": "list",
            "item": {"domain": {"type": "record", "fields": [
                text("code"),
                text("name"),
                text("school_code"),
            ]}}
        }
    })
}

pub fn department_rows() -> Vec<Value> {
    DEPARTMENTS
        .iter()
        .map(|(code, name, school)| json!([code, name, school]))
        .collect()
}

pub fn department_school_meta() -> Value {
    json!({
        "header": "department",
        "domain": {
            "type": "list",
            "item": {"domain": {"type": "record", "fields": [
                text("code"),
                {"header": "school", "domain": {"type": "record", "fields": [
                    text("code"),
                    text("name"),
                ]}},
            ]}}
        }
    })
}

pub fn department_school_rows() -> Vec<Value> {
    DEPARTMENTS
        .iter()
        .map(|(code, _, school)| {
            let school = school.and_then(|school| {
                SCHOOLS
                    .iter()
                    .find(|(candidate, _, _)| *candidate == school)
                    .map(|(code, name, _)| json!([code, name]))
            });
            json!([code, school])
        })
        .collect()
}

pub fn school_meta() -> Value {
    json!({
        "header": "school",
        "domain": {
            "type": "list",
            "item": {"domain": {"type": "record", "fields": [
                text("name"),
                {"header": "department", "domain": {"type": "list", "item": {"domain": {
                    "type": "record",
                    "fields": [text("code"), text("name")]
                }}}},
            ]}}
        }
    })
}

pub fn school_rows() -> Vec<Value> {
    SCHOOLS
        .iter()
        .map(|(school, name, _)| {
            let departments = DEPARTMENTS
                .iter()
                .filter(|(_, _, owner)| *owner == Some(*school))
                .map(|(code, name, _)| json!([code, name]))
                .collect::<Vec<_>>();
            json!([name, departments])
        })
        .collect()
}

pub fn course_meta() -> Value {
    json!({
        "header": "course",
        "domain": {
            "type": "list",
            "item": {"domain": {"type": "record", "fields": [
                text("department_code"),
                integer("no"),
                text("title"),
                integer("credits"),
                text("description"),
            ]}}
        }
    })
}

pub fn course_rows() -> Vec<Value> {
    COURSES
        .iter()
        .map(|(department, no, title, credits, description)| {
            json!([department, no, title, credits, description])
        })
        .collect()
}

pub fn count_meta() -> Value {
    json!({"header": "count(department)", "domain": {"type": "integer"}})
}

pub fn numbered_meta() -> Value {
    json!({"type": "list", "item": {"domain": {"type": "record", "fields": [{"type": "scalar"}]}}})
}

pub fn product(meta: Value, data: Value, more: bool) -> Value {
    json!({"type": "product", "meta": meta, "data": data, "more": more})
}

fn paged(meta: Value, rows: Vec<Value>, page: u32) -> Value {
    let shown = PAGE_SIZE.saturating_mul(page.max(1) as usize);
    let more = rows.len() > shown;
    let rows = rows.into_iter().take(shown).collect::<Vec<_>>();
    product(meta, Value::Array(rows), more)
}

fn normalize(query: &str) -> String {
    query.chars().filter(|ch| !ch.is_whitespace()).collect()
}

// Page `n` returns the first `n * PAGE_SIZE` rows, so a
// "load more" re-renders the whole result.
pub fn evaluate(query: &str, action: &str, page: u32) -> Value {
    let normalized = normalize(query);
    if normalized.is_empty() {
        return json!({"type": "empty"});
    }
    if !normalized.starts_with('/') {
        return json!({"type": "unsupported"});
    }

    let (meta, rows, table) = match normalized.as_str() {
        "/department" => (department_meta(), department_rows(), "department"),
        "/department{code,school}" => {
            (department_school_meta(), department_school_rows(), "department")
        }
        "/school{name,/department{code,name}}" => (school_meta(), school_rows(), "school"),
        "/course" => (course_meta(), course_rows(), "course"),
        "/count(department)" => {
            if action == "analyze" {
                return json!({"type": "sql", "sql": "SELECT COUNT(TRUE)\nFROM \"department\""});
            }
            return product(count_meta(), json!(DEPARTMENTS.len()), false);
        }
        _ => {
            return json!({
                "type": "error",
                "detail": format!("unrecognized query: {query}"),
                "hint": "try /department, /course or /school{name, /department{code, name}}",
            });
        }
    };

    if action == "analyze" {
        return json!({
            "type": "sql",
            "sql": format!("SELECT *\nFROM \"{table}\"\nORDER BY 1 ASC"),
        });
    }
    paged(meta, rows, page)
}

pub fn complete(path: &[String]) -> Value {
    let key = path.join(".");
    let names = SCHEMA
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, names)| names.to_vec())
        .unwrap_or_default();
    json!({"type": "complete", "names": names})
}

#[cfg(test)]
mod tests {
    use super::{PAGE_SIZE, complete, evaluate};
    use serde_json::json;

    #[test]
    fn pages_accumulate_rows() {
        let first = evaluate("/department", "produce", 1);
        assert_eq!(first["data"].as_array().map(Vec::len), Some(PAGE_SIZE));
        assert_eq!(first["more"], json!(true));

        let second = evaluate("/ department", "produce", 2);
        assert_eq!(second["data"].as_array().map(Vec::len), Some(7));
        assert_eq!(second["more"], json!(false));
    }

    #[test]
    fn envelopes_cover_every_kind() {
        assert_eq!(evaluate("  ", "produce", 1)["type"], "empty");
        assert_eq!(evaluate("select 1", "produce", 1)["type"], "unsupported");
        assert_eq!(evaluate("/nowhere", "produce", 1)["type"], "error");
        assert_eq!(evaluate("/course", "analyze", 1)["type"], "sql");
        assert_eq!(evaluate("/count(department)", "produce", 1)["data"], json!(7));
    }

    #[test]
    fn completion_follows_the_schema() {
        let names = complete(&["department".to_owned()]);
        assert_eq!(names["names"], json!(["code", "course", "name", "school"]));
        assert_eq!(complete(&[])["names"][0], "course");
        assert_eq!(complete(&["nope".to_owned()])["names"], json!([]));
    }
}
