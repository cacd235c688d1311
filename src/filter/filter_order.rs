use super::error::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: &'static str,
    pub sort: SortDirection,
}

pub struct FilterOrder;

/// Text columns compare case-insensitively
const FOLDED_COLUMNS: &[&str] = &["name", "email"];

impl FilterOrder {
    /// Parse `"name asc, created_at desc"` against a column whitelist.
    ///
    /// Columns come back as the whitelist's `&'static str`, so nothing the
    /// client sends is ever interpolated into SQL.
    pub fn parse(
        order: Option<&str>,
        allowed: &[&'static str],
        default: SortSpec,
    ) -> Result<Vec<SortSpec>, FilterError> {
        let Some(order) = order else {
            return Ok(vec![default]);
        };

        let mut out = Vec::new();
        for part in order.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split_whitespace();
            let Some(col) = it.next() else { continue };

            let column = allowed
                .iter()
                .copied()
                .find(|c| c.eq_ignore_ascii_case(col))
                .ok_or_else(|| FilterError::InvalidColumn(col.to_string()))?;

            let sort = match it.next() {
                None => SortDirection::Asc,
                Some(dir) if dir.eq_ignore_ascii_case("asc") => SortDirection::Asc,
                Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                Some(dir) => return Err(FilterError::InvalidDirection(dir.to_string())),
            };

            if it.next().is_some() {
                return Err(FilterError::InvalidDirection(trimmed.to_string()));
            }

            // First mention of a column wins
            if !out.iter().any(|s: &SortSpec| s.column == column) {
                out.push(SortSpec { column, sort });
            }
        }

        if out.is_empty() {
            out.push(default);
        }
        Ok(out)
    }

    /// `ORDER BY` clause; `id` is appended as a tiebreaker so pages are stable.
    pub fn generate(specs: &[SortSpec]) -> String {
        let mut parts: Vec<String> = specs
            .iter()
            .map(|s| {
                if FOLDED_COLUMNS.contains(&s.column) {
                    format!("lower(\"{}\") {}", s.column, s.sort.to_sql())
                } else {
                    format!("\"{}\" {}", s.column, s.sort.to_sql())
                }
            })
            .collect();
        if !specs.iter().any(|s| s.column == "id") {
            parts.push("\"id\" ASC".to_string());
        }
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[&str] = &["name", "created_at", "updated_at", "size_bytes"];

    fn by_name() -> SortSpec {
        SortSpec { column: "name", sort: SortDirection::Asc }
    }

    #[test]
    fn missing_order_uses_default() {
        let specs = FilterOrder::parse(None, COLUMNS, by_name()).unwrap();
        assert_eq!(specs, vec![by_name()]);
        assert_eq!(FilterOrder::generate(&specs), "ORDER BY lower(\"name\") ASC, \"id\" ASC");
    }

    #[test]
    fn parses_multiple_columns_and_directions() {
        let specs = FilterOrder::parse(Some("created_at DESC, size_bytes"), COLUMNS, by_name()).unwrap();
        assert_eq!(
            specs,
            vec![
                SortSpec { column: "created_at", sort: SortDirection::Desc },
                SortSpec { column: "size_bytes", sort: SortDirection::Asc },
            ]
        );
        assert_eq!(
            FilterOrder::generate(&specs),
            "ORDER BY \"created_at\" DESC, \"size_bytes\" ASC, \"id\" ASC"
        );
    }

    #[test]
    fn rejects_columns_outside_whitelist() {
        let err = FilterOrder::parse(Some("storage_key asc"), COLUMNS, by_name()).unwrap_err();
        assert_eq!(err, FilterError::InvalidColumn("storage_key".to_string()));

        let err = FilterOrder::parse(Some("name; DROP TABLE documents"), COLUMNS, by_name()).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));
    }

    #[test]
    fn rejects_unknown_direction() {
        let err = FilterOrder::parse(Some("name sideways"), COLUMNS, by_name()).unwrap_err();
        assert_eq!(err, FilterError::InvalidDirection("sideways".to_string()));
    }

    #[test]
    fn blank_order_and_duplicates() {
        assert_eq!(FilterOrder::parse(Some(" , "), COLUMNS, by_name()).unwrap(), vec![by_name()]);
        let specs = FilterOrder::parse(Some("name desc, NAME asc"), COLUMNS, by_name()).unwrap();
        assert_eq!(specs, vec![SortSpec { column: "name", sort: SortDirection::Desc }]);
    }
}
