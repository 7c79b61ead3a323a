//! SQL statement builder.
//!
//! Turns a resolved [`SqlMapping`] plus its [`Case`] into three pieces of
//! SQL: a `CREATE TABLE` holding the arguments, an `INSERT` populating it,
//! and the `SELECT` that invokes the function over those columns.

use fnconf_dialect::{FunctionShape, SqlMapping};
use fnconf_error::{ConformanceError, Result};
use fnconf_types::{Case, LiteralType};
use serde::{Deserialize, Serialize};

use crate::engine::EngineProfile;

/// Table name used when cases run one at a time on a connection.
pub const DEFAULT_TABLE_NAME: &str = "conformance_case";

/// Statements for one case, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlStatements {
    /// Absent for zero-argument calls, which select without a table.
    pub ddl: Option<String>,
    pub dml: Option<String>,
    pub query: String,
}

/// Either runnable statements or the semantic type that blocked them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Statements(SqlStatements),
    UnsupportedType(LiteralType),
}

/// Per-case unique table name: `case_<xxh3 of the case, hex>`.
pub fn unique_table_name(case: &Case) -> String {
    format!("case_{:016x}", case.fingerprint())
}

pub struct StatementBuilder<'p> {
    profile: &'p dyn EngineProfile,
    table_name: String,
}

impl<'p> StatementBuilder<'p> {
    pub fn new(profile: &'p dyn EngineProfile) -> Self {
        Self {
            profile,
            table_name: DEFAULT_TABLE_NAME.to_owned(),
        }
    }

    #[must_use]
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Build the statements for `case` using `mapping`'s shape.
    ///
    /// An arity the shape cannot express is a dialect defect and fails the
    /// build; an argument type the engine cannot store is an outcome.
    pub fn build(&self, mapping: &SqlMapping, case: &Case) -> Result<BuildOutcome> {
        let shape = mapping.shape;
        if !shape.accepts_arity(case.args.len()) {
            return Err(ConformanceError::ShapeArity {
                function: mapping.local_name.clone(),
                shape: shape.as_str(),
                expected: shape.arity_description(),
                actual: case.args.len(),
            });
        }

        let column_count = if shape.is_aggregate() { 1 } else { case.args.len() };
        let mut column_defs = Vec::with_capacity(column_count);
        for (idx, arg) in case.args.iter().take(column_count).enumerate() {
            let Some(column_type) = self.profile.column_type(arg.literal_type) else {
                return Ok(BuildOutcome::UnsupportedType(arg.literal_type));
            };
            column_defs.push(format!("{} {column_type}", column_name(idx)));
        }
        let columns: Vec<String> = (0..column_count).map(column_name).collect();

        let query = self.query_text(mapping, case, &columns, column_count > 0);
        if column_count == 0 {
            return Ok(BuildOutcome::Statements(SqlStatements {
                ddl: None,
                dml: None,
                query,
            }));
        }

        let table = &self.table_name;
        let ddl = format!("CREATE TABLE {table} ({});", column_defs.join(", "));
        let rendered: Vec<String> = case
            .args
            .iter()
            .map(|arg| self.profile.render_literal(arg))
            .collect();
        let values = if shape.is_aggregate() {
            rendered
                .iter()
                .map(|value| format!("({value})"))
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            format!("({})", rendered.join(", "))
        };
        let dml = format!("INSERT INTO {table} ({}) VALUES {values};", columns.join(", "));

        Ok(BuildOutcome::Statements(SqlStatements {
            ddl: Some(ddl),
            dml: Some(dml),
            query,
        }))
    }

    fn query_text(
        &self,
        mapping: &SqlMapping,
        case: &Case,
        columns: &[String],
        has_table: bool,
    ) -> String {
        let name = &mapping.local_name;
        let expr = match mapping.shape {
            FunctionShape::Infix => format!("{} {name} {}", columns[0], columns[1]),
            FunctionShape::Postfix => format!("{} {name}", columns[0]),
            FunctionShape::Extract => format!(
                "{name}({} FROM {})",
                self.profile.render_literal(&case.args[0]),
                columns[1]
            ),
            FunctionShape::Between => {
                format!("{} BETWEEN {} AND {}", columns[0], columns[1], columns[2])
            }
            FunctionShape::Aggregate => format!("{name}({})", columns[0]),
            FunctionShape::Call => format!("{name}({})", columns.join(", ")),
        };
        if has_table {
            format!("SELECT {expr} FROM {};", self.table_name)
        } else {
            format!("SELECT {expr};")
        }
    }
}

fn column_name(idx: usize) -> String {
    format!("arg{idx}")
}

#[cfg(test)]
mod tests {
    use fnconf_types::{ExpectedResult, Literal};

    use super::*;
    use crate::engine::{PostgresProfile, SqliteProfile};

    fn mapping(local_name: &str, shape: FunctionShape) -> SqlMapping {
        SqlMapping {
            local_name: local_name.to_owned(),
            shape,
            should_pass: true,
            reason: None,
        }
    }

    fn ints(values: &[i64]) -> Vec<Literal> {
        values
            .iter()
            .map(|v| Literal::new(LiteralType::I32, *v))
            .collect()
    }

    fn statements(outcome: BuildOutcome) -> SqlStatements {
        match outcome {
            BuildOutcome::Statements(s) => s,
            BuildOutcome::UnsupportedType(ty) => panic!("unexpected unsupported type {ty}"),
        }
    }

    #[test]
    fn infix_two_arguments() {
        let case = Case::new("add", ints(&[1, 2]), ExpectedResult::Undefined);
        let built = StatementBuilder::new(&PostgresProfile)
            .build(&mapping("+", FunctionShape::Infix), &case)
            .unwrap();
        let s = statements(built);
        assert_eq!(
            s.ddl.as_deref(),
            Some("CREATE TABLE conformance_case (arg0 integer, arg1 integer);")
        );
        assert_eq!(
            s.dml.as_deref(),
            Some("INSERT INTO conformance_case (arg0, arg1) VALUES (1, 2);")
        );
        assert_eq!(s.query, "SELECT arg0 + arg1 FROM conformance_case;");
    }

    #[test]
    fn postfix_one_argument() {
        let case = Case::new("is_null", ints(&[1]), ExpectedResult::Undefined);
        let s = statements(
            StatementBuilder::new(&PostgresProfile)
                .build(&mapping("IS NULL", FunctionShape::Postfix), &case)
                .unwrap(),
        );
        assert_eq!(s.query, "SELECT arg0 IS NULL FROM conformance_case;");
    }

    #[test]
    fn between_three_arguments() {
        let case = Case::new("between", ints(&[2, 1, 3]), ExpectedResult::Undefined);
        let s = statements(
            StatementBuilder::new(&PostgresProfile)
                .build(&mapping("between", FunctionShape::Between), &case)
                .unwrap(),
        );
        assert_eq!(s.query, "SELECT arg0 BETWEEN arg1 AND arg2 FROM conformance_case;");
    }

    #[test]
    fn extract_uses_first_literal_as_field() {
        let case = Case::new(
            "extract",
            vec![
                Literal::new(LiteralType::String, "YEAR"),
                Literal::new(LiteralType::Date, "2020-05-01"),
            ],
            ExpectedResult::Undefined,
        );
        let s = statements(
            StatementBuilder::new(&PostgresProfile)
                .build(&mapping("EXTRACT", FunctionShape::Extract), &case)
                .unwrap(),
        );
        assert_eq!(
            s.ddl.as_deref(),
            Some("CREATE TABLE conformance_case (arg0 text, arg1 date);")
        );
        assert_eq!(s.query, "SELECT EXTRACT('YEAR' FROM arg1) FROM conformance_case;");
    }

    #[test]
    fn aggregate_inserts_one_row_per_literal() {
        let case = Case::new("sum", ints(&[1, 2, 3]), ExpectedResult::Undefined);
        let s = statements(
            StatementBuilder::new(&PostgresProfile)
                .build(&mapping("sum", FunctionShape::Aggregate), &case)
                .unwrap(),
        );
        assert_eq!(s.ddl.as_deref(), Some("CREATE TABLE conformance_case (arg0 integer);"));
        assert_eq!(
            s.dml.as_deref(),
            Some("INSERT INTO conformance_case (arg0) VALUES (1), (2), (3);")
        );
        assert_eq!(s.query, "SELECT sum(arg0) FROM conformance_case;");
    }

    #[test]
    fn default_call_with_strings_and_nulls() {
        let case = Case::new(
            "concat",
            vec![
                Literal::new(LiteralType::String, "abc"),
                Literal::null(LiteralType::String),
            ],
            ExpectedResult::Undefined,
        );
        let s = statements(
            StatementBuilder::new(&PostgresProfile)
                .build(&mapping("concat", FunctionShape::Call), &case)
                .unwrap(),
        );
        assert_eq!(
            s.dml.as_deref(),
            Some("INSERT INTO conformance_case (arg0, arg1) VALUES ('abc', null);")
        );
        assert_eq!(s.query, "SELECT concat(arg0, arg1) FROM conformance_case;");
    }

    #[test]
    fn zero_argument_call_selects_without_table() {
        let case = Case::new("pi", vec![], ExpectedResult::Undefined);
        let s = statements(
            StatementBuilder::new(&SqliteProfile)
                .build(&mapping("pi", FunctionShape::Call), &case)
                .unwrap(),
        );
        assert_eq!(s.ddl, None);
        assert_eq!(s.dml, None);
        assert_eq!(s.query, "SELECT pi();");
    }

    #[test]
    fn arity_violations_are_defects() {
        let builder = StatementBuilder::new(&PostgresProfile);
        let cases = [
            (FunctionShape::Infix, 3),
            (FunctionShape::Postfix, 2),
            (FunctionShape::Extract, 1),
            (FunctionShape::Between, 2),
            (FunctionShape::Aggregate, 0),
        ];
        for (shape, arity) in cases {
            let values: Vec<i64> = (0..arity).collect();
            let case = Case::new("f", ints(&values), ExpectedResult::Undefined);
            let err = builder.build(&mapping("f", shape), &case).unwrap_err();
            assert!(err.is_configuration_defect(), "{shape} with {arity} args");
        }
    }

    #[test]
    fn unmapped_type_is_an_outcome() {
        let case = Case::new(
            "add",
            vec![Literal::new(LiteralType::I8, 1), Literal::new(LiteralType::I8, 2)],
            ExpectedResult::Undefined,
        );
        let built = StatementBuilder::new(&PostgresProfile)
            .build(&mapping("+", FunctionShape::Infix), &case)
            .unwrap();
        assert_eq!(built, BuildOutcome::UnsupportedType(LiteralType::I8));
    }

    #[test]
    fn arity_is_checked_before_types() {
        let case = Case::new("add", vec![Literal::new(LiteralType::I8, 1)], ExpectedResult::Undefined);
        assert!(
            StatementBuilder::new(&PostgresProfile)
                .build(&mapping("+", FunctionShape::Infix), &case)
                .is_err()
        );
    }

    #[test]
    fn custom_and_unique_table_names() {
        let case = Case::new("abs", ints(&[-1]), ExpectedResult::Undefined);
        let table = unique_table_name(&case);
        assert!(table.starts_with("case_"));
        assert_eq!(table.len(), "case_".len() + 16);
        let builder = StatementBuilder::new(&SqliteProfile).with_table_name(table.clone());
        assert_eq!(builder.table_name(), table);
        let s = statements(builder.build(&mapping("abs", FunctionShape::Call), &case).unwrap());
        assert_eq!(s.query, format!("SELECT abs(arg0) FROM {table};"));
    }
}
