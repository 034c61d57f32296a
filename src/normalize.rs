//! Pure normalizers from nested upstream JSON to flat rows.
//!
//! Each entity is described by an ordered table of candidate source
//! paths per target column; the first present and non-empty value
//! wins, then the column's fallback. Normalizers never fail and always
//! produce a fresh row.

use serde_json::Value;

/// Ordered column/value pairs making up one row. All rows produced by
/// one normalizer share the same shape.
pub type FlatRow = Vec<(&'static str, Value)>;

/// One target column: candidate source paths tried in order. Dotted
/// paths traverse nested objects (`category.id`).
struct FieldSpec {
    column: &'static str,
    sources: &'static [&'static str],
    fallback: Fallback,
}

enum Fallback {
    EmptyString,
    Zero,
    Unknown,
    Null,
}

impl Fallback {
    fn value(&self) -> Value {
        match self {
            Fallback::EmptyString => Value::String(String::new()),
            Fallback::Zero => Value::from(0),
            Fallback::Unknown => Value::from("UNK"),
            Fallback::Null => Value::Null,
        }
    }
}

const CATEGORY: &[FieldSpec] = &[
    FieldSpec {
        column: "category_id",
        sources: &["id"],
        fallback: Fallback::Null,
    },
    FieldSpec {
        column: "category_name",
        sources: &["name", "category_name"],
        fallback: Fallback::EmptyString,
    },
];

const COMPETITION: &[FieldSpec] = &[
    FieldSpec {
        column: "competition_id",
        sources: &["id", "competition_id"],
        fallback: Fallback::Null,
    },
    FieldSpec {
        column: "competition_name",
        sources: &["name", "competition_name"],
        fallback: Fallback::EmptyString,
    },
    FieldSpec {
        column: "parent_id",
        sources: &["parent_id"],
        fallback: Fallback::Null,
    },
    FieldSpec {
        column: "type",
        sources: &["type", "competition_type"],
        fallback: Fallback::EmptyString,
    },
    FieldSpec {
        column: "gender",
        sources: &["gender", "gender_type"],
        fallback: Fallback::EmptyString,
    },
    FieldSpec {
        column: "category_id",
        sources: &["category_id", "category.id"],
        fallback: Fallback::Null,
    },
];

const COMPLEX: &[FieldSpec] = &[
    FieldSpec {
        column: "complex_id",
        sources: &["id"],
        fallback: Fallback::Null,
    },
    FieldSpec {
        column: "complex_name",
        sources: &["name", "complex_name"],
        fallback: Fallback::EmptyString,
    },
];

const VENUE: &[FieldSpec] = &[
    FieldSpec {
        column: "venue_id",
        sources: &["id"],
        fallback: Fallback::Null,
    },
    FieldSpec {
        column: "venue_name",
        sources: &["name", "venue_name"],
        fallback: Fallback::EmptyString,
    },
    FieldSpec {
        column: "city_name",
        sources: &["city.name", "city_name"],
        fallback: Fallback::EmptyString,
    },
    FieldSpec {
        column: "country_name",
        sources: &["country.name", "country_name"],
        fallback: Fallback::EmptyString,
    },
    FieldSpec {
        column: "country_code",
        sources: &["country.code", "country_code"],
        fallback: Fallback::Unknown,
    },
    FieldSpec {
        column: "timezone",
        sources: &["timezone", "tz"],
        fallback: Fallback::EmptyString,
    },
    FieldSpec {
        column: "complex_id",
        sources: &["complex_id", "complex.id"],
        fallback: Fallback::Null,
    },
];

const COMPETITOR: &[FieldSpec] = &[
    FieldSpec {
        column: "competitor_id",
        sources: &["id"],
        fallback: Fallback::Null,
    },
    FieldSpec {
        column: "name",
        sources: &["name", "full_name"],
        fallback: Fallback::EmptyString,
    },
    FieldSpec {
        column: "country",
        sources: &["country.name", "country_name"],
        fallback: Fallback::EmptyString,
    },
    FieldSpec {
        column: "country_code",
        sources: &["country.code", "country_code"],
        fallback: Fallback::Unknown,
    },
    FieldSpec {
        column: "abbreviation",
        sources: &["abbreviation", "abbr"],
        fallback: Fallback::EmptyString,
    },
];

const RANKING: &[FieldSpec] = &[
    FieldSpec {
        column: "rank_pos",
        sources: &["rank"],
        fallback: Fallback::Null,
    },
    FieldSpec {
        column: "movement",
        sources: &["movement"],
        fallback: Fallback::Zero,
    },
    FieldSpec {
        column: "points",
        sources: &["points"],
        fallback: Fallback::Zero,
    },
    FieldSpec {
        column: "competitions_played",
        sources: &["competitions_played", "competitions"],
        fallback: Fallback::Zero,
    },
    FieldSpec {
        column: "competitor_id",
        sources: &["competitor.id", "competitor_id"],
        fallback: Fallback::Null,
    },
    FieldSpec {
        column: "ranking_date",
        sources: &["ranking_date"],
        fallback: Fallback::Null,
    },
];

/// Walk a dotted path through nested objects. A missing or non-object
/// intermediate yields `None`, the same as an absent key.
fn lookup<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = item;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Mirrors the upstream feed's loose coalescing: null, empty strings,
/// zero, false and empty containers all fall through to the next
/// candidate.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn resolve(item: &Value, spec: &FieldSpec) -> Value {
    for path in spec.sources {
        if let Some(value) = lookup(item, path) {
            if !is_empty(value) {
                return value.clone();
            }
        }
    }
    spec.fallback.value()
}

fn normalize_with(table: &[FieldSpec], item: &Value) -> FlatRow {
    table
        .iter()
        .map(|spec| (spec.column, resolve(item, spec)))
        .collect()
}

pub fn normalize_category(item: &Value) -> FlatRow {
    normalize_with(CATEGORY, item)
}

pub fn normalize_competition(item: &Value) -> FlatRow {
    normalize_with(COMPETITION, item)
}

pub fn normalize_complex(item: &Value) -> FlatRow {
    normalize_with(COMPLEX, item)
}

pub fn normalize_venue(item: &Value) -> FlatRow {
    normalize_with(VENUE, item)
}

/// Competitor rows derive a missing abbreviation from the first 10
/// characters of the resolved name.
pub fn normalize_competitor(item: &Value) -> FlatRow {
    let mut row = normalize_with(COMPETITOR, item);

    let name: String = row
        .iter()
        .find(|(column, _)| *column == "name")
        .and_then(|(_, value)| value.as_str())
        .unwrap_or_default()
        .chars()
        .take(10)
        .collect();

    if let Some((_, abbreviation)) = row
        .iter_mut()
        .find(|(column, _)| *column == "abbreviation")
    {
        if is_empty(abbreviation) {
            *abbreviation = Value::String(name);
        }
    }

    row
}

pub fn normalize_ranking(item: &Value) -> FlatRow {
    normalize_with(RANKING, item)
}
