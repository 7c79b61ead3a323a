use std::fmt;

use serde::{Deserialize, Serialize};

use crate::file::DialectFunction;

/// Syntactic form used to invoke a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionShape {
    /// `a <op> b`
    Infix,
    /// `a <op>`
    Postfix,
    /// `<fn>(<field> FROM a)`
    Extract,
    /// `a BETWEEN b AND c`
    Between,
    /// `<fn>(col)` over one row per argument.
    Aggregate,
    /// `<fn>(a, b, ...)`
    Call,
}

impl FunctionShape {
    /// Derive the shape from the raw document flags.
    ///
    /// Precedence is infix, postfix, extract, between, aggregate. Functions
    /// listed among a dialect's aggregates are aggregates even without the
    /// flag. The second element counts how many shape flags were set.
    pub fn from_flags(function: &DialectFunction, listed_as_aggregate: bool) -> (Self, usize) {
        let flags = [
            (function.infix, Self::Infix),
            (function.postfix, Self::Postfix),
            (function.extract, Self::Extract),
            (function.between, Self::Between),
            (function.aggregate, Self::Aggregate),
        ];
        let set = flags.iter().filter(|(on, _)| *on).count();
        let shape = flags
            .iter()
            .find_map(|(on, shape)| on.then_some(*shape))
            .unwrap_or(if listed_as_aggregate {
                Self::Aggregate
            } else {
                Self::Call
            });
        (shape, set)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Infix => "infix",
            Self::Postfix => "postfix",
            Self::Extract => "extract",
            Self::Between => "between",
            Self::Aggregate => "aggregate",
            Self::Call => "call",
        }
    }

    pub const fn is_aggregate(self) -> bool {
        matches!(self, Self::Aggregate)
    }

    /// Human-readable arity requirement, used in defect diagnostics.
    pub const fn arity_description(self) -> &'static str {
        match self {
            Self::Infix | Self::Extract => "2",
            Self::Postfix => "1",
            Self::Between => "3",
            Self::Aggregate => "at least 1",
            Self::Call => "any",
        }
    }

    pub const fn accepts_arity(self, args: usize) -> bool {
        match self {
            Self::Infix | Self::Extract => args == 2,
            Self::Postfix => args == 1,
            Self::Between => args == 3,
            Self::Aggregate => args >= 1,
            Self::Call => true,
        }
    }
}

impl fmt::Display for FunctionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_flag_selects_shape() {
        let f = DialectFunction::new("add", "+").infix();
        assert_eq!(FunctionShape::from_flags(&f, false), (FunctionShape::Infix, 1));
        let f = DialectFunction::new("is_null", "IS NULL").postfix();
        assert_eq!(FunctionShape::from_flags(&f, false).0, FunctionShape::Postfix);
        let f = DialectFunction::new("between", "between").between();
        assert_eq!(FunctionShape::from_flags(&f, false).0, FunctionShape::Between);
        let f = DialectFunction::new("extract", "EXTRACT").extract();
        assert_eq!(FunctionShape::from_flags(&f, false).0, FunctionShape::Extract);
    }

    #[test]
    fn no_flags_defaults_by_list() {
        let f = DialectFunction::new("upper", "upper");
        assert_eq!(FunctionShape::from_flags(&f, false), (FunctionShape::Call, 0));
        assert_eq!(FunctionShape::from_flags(&f, true), (FunctionShape::Aggregate, 0));
    }

    #[test]
    fn conflicting_flags_follow_precedence() {
        let f = DialectFunction::new("odd", "odd").between().extract().aggregate();
        assert_eq!(FunctionShape::from_flags(&f, true), (FunctionShape::Extract, 3));
        let f = DialectFunction::new("odd", "odd").postfix().infix();
        assert_eq!(FunctionShape::from_flags(&f, false), (FunctionShape::Infix, 2));
    }

    #[test]
    fn arity_rules() {
        assert!(FunctionShape::Infix.accepts_arity(2));
        assert!(!FunctionShape::Infix.accepts_arity(3));
        assert!(FunctionShape::Postfix.accepts_arity(1));
        assert!(FunctionShape::Extract.accepts_arity(2));
        assert!(FunctionShape::Between.accepts_arity(3));
        assert!(!FunctionShape::Between.accepts_arity(2));
        assert!(!FunctionShape::Aggregate.accepts_arity(0));
        assert!(FunctionShape::Aggregate.accepts_arity(7));
        assert!(FunctionShape::Call.accepts_arity(0));
    }
}
