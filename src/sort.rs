//! `sort` query directives: `property(,property)*(,asc|desc)`, repeatable.

use crate::entity::Entity;
use crate::error::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(Direction::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(Direction::Desc)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    pub property: String,
    pub direction: Direction,
}

impl Sort {
    /// Parse one `sort` value. A trailing `asc`/`desc` applies to every property before it.
    /// An empty value yields no directives; a direction without a property is rejected.
    pub fn parse(value: &str) -> Result<Vec<Sort>, AppError> {
        let mut parts: Vec<&str> = value.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
        let direction = match parts.last().and_then(|p| Direction::parse(p)) {
            Some(d) => {
                parts.pop();
                if parts.is_empty() {
                    return Err(AppError::BadRequest(format!("sort direction '{}' without a property", value.trim())));
                }
                d
            }
            None => Direction::Asc,
        };
        parts
            .into_iter()
            .map(|property| {
                if !is_identifier(property) {
                    return Err(AppError::BadRequest(format!("invalid sort property '{}'", property)));
                }
                Ok(Sort {
                    property: property.to_string(),
                    direction,
                })
            })
            .collect()
    }

    /// Collect directives from every `sort` pair of a query string.
    pub fn from_query(params: &[(String, String)]) -> Result<Vec<Sort>, AppError> {
        let mut out = Vec::new();
        for (k, v) in params {
            if k == "sort" {
                out.extend(Sort::parse(v)?);
            }
        }
        Ok(out)
    }

    /// Storage-side check: every property must be a column of `E`.
    pub fn check_columns<E: Entity>(sort: &[Sort]) -> Result<(), AppError> {
        match sort.iter().find(|s| !E::has_column(&s.property)) {
            Some(s) => Err(AppError::BadRequest(format!(
                "unknown sort property '{}' for {}",
                s.property,
                E::ENTITY_NAME
            ))),
            None => Ok(()),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
