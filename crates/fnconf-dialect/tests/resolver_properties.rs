//! Property tests for dialect resolution.

use fnconf_dialect::{
    Dialect, DialectFile, DialectFunction, Resolution, ResolutionMode, SkipReason,
};
use fnconf_types::{Case, ExpectedResult, Literal, LiteralType};
use proptest::prelude::*;

const DECLARED: [&str; 3] = ["add", "upper", "sum"];

fn dialect() -> Dialect {
    Dialect::new(
        DialectFile::new("engine", "sql")
            .scalar(
                DialectFunction::new("add", "+")
                    .infix()
                    .require_option("overflow", "ERROR")
                    .unsupported_kernel(&["i8", "i8"], "i8"),
            )
            .scalar(DialectFunction::new("upper", "upper"))
            .aggregate(DialectFunction::new("sum", "sum").aggregate()),
    )
}

fn literal_type() -> impl Strategy<Value = LiteralType> {
    prop::sample::select(LiteralType::ALL.to_vec())
}

fn undeclared_name() -> impl Strategy<Value = String> {
    "[a-z_]{1,12}".prop_filter("must not be declared", |name| {
        !DECLARED.contains(&name.as_str())
    })
}

proptest! {
    #[test]
    fn prop_absent_function_never_errors(
        name in undeclared_name(),
        types in prop::collection::vec(literal_type(), 0..5),
    ) {
        let args = types.into_iter().map(Literal::null).collect();
        let case = Case::new(name.clone(), args, ExpectedResult::Undefined);

        let normal = dialect().mapping_for_case(&case);
        prop_assert_eq!(normal.ok(), Some(Resolution::NotApplicable));

        let diagnostic = dialect()
            .with_mode(ResolutionMode::Diagnostic)
            .mapping_for_case(&case);
        prop_assert_eq!(
            diagnostic.ok(),
            Some(Resolution::Skip(SkipReason::FunctionNotInDialect {
                dialect: "engine".to_owned(),
                function: name,
            }))
        );
    }

    #[test]
    fn prop_options_without_requirement_are_ignored(
        key in "[a-z]{1,8}".prop_filter("not a required key", |k| k != "overflow"),
        value in "[A-Z_]{1,10}",
    ) {
        let case = Case::new(
            "add",
            vec![Literal::new(LiteralType::I32, 1), Literal::new(LiteralType::I32, 2)],
            ExpectedResult::Value(Literal::new(LiteralType::I32, 3)),
        )
        .with_option(key, value);
        let resolution = dialect().mapping_for_case(&case).unwrap();
        let Resolution::Mapped(mapping) = resolution else {
            return Err(TestCaseError::fail("expected mapping"));
        };
        prop_assert!(mapping.should_pass);
        prop_assert!(mapping.reason.is_none());
    }

    #[test]
    fn prop_mismatched_required_option_names_both_values(
        requested in "[A-Z_]{1,10}".prop_filter("differs from requirement", |v| v != "ERROR"),
    ) {
        let case = Case::new(
            "add",
            vec![Literal::new(LiteralType::I32, 1), Literal::new(LiteralType::I32, 2)],
            ExpectedResult::Undefined,
        )
        .with_option("overflow", requested.clone());
        let Resolution::Mapped(mapping) = dialect().mapping_for_case(&case).unwrap() else {
            return Err(TestCaseError::fail("expected mapping"));
        };
        prop_assert!(!mapping.should_pass);
        let reason = mapping.reason.unwrap_or_default();
        prop_assert!(reason.contains("engine"));
        prop_assert!(reason.contains("overflow=ERROR"));
        let requested_fragment = format!("overflow={requested}");
        prop_assert!(reason.contains(&requested_fragment));
    }
}
