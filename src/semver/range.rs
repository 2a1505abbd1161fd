use std::cmp::Ordering;
use std::fmt;

use crate::error::{AppError, AppResult};
use crate::semver::version::{compare_prerelease, parse_core, Version, VersionCore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone)]
struct Clause {
    op: Op,
    bound: VersionCore,
}

impl Clause {
    fn matches(&self, version: &Version) -> bool {
        let ord = (version.major(), version.minor(), version.patch())
            .cmp(&(self.bound.major, self.bound.minor, self.bound.patch))
            .then_with(|| compare_prerelease(version.prerelease(), &self.bound.prerelease));
        match self.op {
            Op::Eq => ord == Ordering::Equal,
            Op::Gt => ord == Ordering::Greater,
            Op::Ge => ord != Ordering::Less,
            Op::Lt => ord == Ordering::Less,
            Op::Le => ord != Ordering::Greater,
        }
    }
}

/// 版本选择范围：`[qualifier@]constraint [constraint ...]`
///
/// 支持精确版本、`>=`/`<=`/`>`/`<`/`=` 比较、波浪号 `~X.Y.Z`
/// （等价于 `>=X.Y.Z <X.(Y+1).0`）、通配符 `*`，以及空格分隔的与组合。
/// 不带运算符的 `17` 或 `1.8` 按缺失段的区间理解（`>=17.0.0 <18.0.0`）。
#[derive(Debug, Clone)]
pub struct Range {
    raw: String,
    qualifier: String,
    clauses: Vec<Clause>,
}

impl Range {
    pub fn parse(selector: &str) -> AppResult<Range> {
        let trimmed = selector.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_range(selector));
        }
        let (qualifier, rest) = match trimmed.find('@') {
            Some(idx) => (&trimmed[..idx], &trimmed[idx + 1..]),
            None => ("", trimmed),
        };
        if rest.trim().is_empty() {
            return Err(AppError::invalid_range(selector));
        }

        let mut clauses = Vec::new();
        for token in rest.split_whitespace() {
            Self::parse_token(selector, token, &mut clauses)?;
        }
        Ok(Range {
            raw: trimmed.to_string(),
            qualifier: qualifier.to_string(),
            clauses,
        })
    }

    fn parse_token(selector: &str, token: &str, clauses: &mut Vec<Clause>) -> AppResult<()> {
        let bound = |raw: &str| parse_core(raw).map_err(|_| AppError::invalid_range(selector));

        if token == "*" {
            return Ok(());
        }
        if let Some(rest) = token.strip_prefix('~') {
            let low = bound(rest)?;
            let high = VersionCore {
                major: low.major,
                minor: low.minor + 1,
                patch: 0,
                prerelease: String::new(),
                specified: 3,
            };
            clauses.push(Clause { op: Op::Ge, bound: low });
            clauses.push(Clause { op: Op::Lt, bound: high });
            return Ok(());
        }
        for (prefix, op) in [
            (">=", Op::Ge),
            ("<=", Op::Le),
            (">", Op::Gt),
            ("<", Op::Lt),
            ("=", Op::Eq),
        ] {
            if let Some(rest) = token.strip_prefix(prefix) {
                clauses.push(Clause {
                    op,
                    bound: bound(rest)?,
                });
                return Ok(());
            }
        }

        // 裸版本：写满三段按精确匹配，缺段的按该段的区间匹配
        let low = bound(token)?;
        if low.specified == 3 || !low.prerelease.is_empty() {
            clauses.push(Clause { op: Op::Eq, bound: low });
            return Ok(());
        }
        let high = if low.specified == 1 {
            VersionCore {
                major: low.major + 1,
                minor: 0,
                patch: 0,
                prerelease: String::new(),
                specified: 3,
            }
        } else {
            VersionCore {
                major: low.major,
                minor: low.minor + 1,
                patch: 0,
                prerelease: String::new(),
                specified: 3,
            }
        };
        clauses.push(Clause { op: Op::Ge, bound: low });
        clauses.push(Clause { op: Op::Lt, bound: high });
        Ok(())
    }

    /// 范围自带的限定符；未限定时返回 None
    pub fn qualifier(&self) -> Option<&str> {
        if self.qualifier.is_empty() {
            None
        } else {
            Some(&self.qualifier)
        }
    }

    pub fn contains(&self, version: &Version) -> bool {
        if !self.qualifier.is_empty() && self.qualifier != version.qualifier() {
            return false;
        }
        self.clauses.iter().all(|c| c.matches(version))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> Version {
        Version::parse(raw).unwrap()
    }

    fn r(raw: &str) -> Range {
        Range::parse(raw).unwrap()
    }

    #[test]
    fn test_tilde_range() {
        let range = r("~1.8.73");
        assert!(range.contains(&v("1.8.73")));
        assert!(range.contains(&v("1.8.99")));
        assert!(!range.contains(&v("1.8.72")));
        assert!(!range.contains(&v("1.9.0")));
        assert!(!range.contains(&v("2.0.0")));
    }

    #[test]
    fn test_tilde_picks_highest_in_line() {
        // 可用版本 1.8.72、1.8.73、1.9.0 中，~1.8.73 的最高匹配是 1.8.73
        let range = r("~1.8.73");
        let mut available = vec![v("1.9.0"), v("1.8.72"), v("1.8.73")];
        available.sort();
        let best = available.iter().rev().find(|ver| range.contains(ver));
        assert_eq!(best.map(|b| b.to_string()), Some("1.8.73".to_string()));
    }

    #[test]
    fn test_bare_major_matches_whole_line() {
        let range = r("17");
        assert!(range.contains(&v("17")));
        assert!(range.contains(&v("17.0.9")));
        assert!(!range.contains(&v("18.0.0")));
        assert!(!range.contains(&v("16.0.2")));
    }

    #[test]
    fn test_exact_triple_is_exact() {
        let range = r("1.8.73");
        assert!(range.contains(&v("1.8.73")));
        assert!(range.contains(&v("temurin@1.8.73")));
        assert!(!range.contains(&v("1.8.74")));
        assert!(!range.contains(&v("1.8.73-ea")));
    }

    #[test]
    fn test_comparator_conjunction() {
        let range = r(">=1.8.0 <1.9.0");
        assert!(range.contains(&v("1.8.0")));
        assert!(range.contains(&v("1.8.73")));
        assert!(!range.contains(&v("1.9.0")));
        assert!(!range.contains(&v("1.7.9")));
    }

    #[test]
    fn test_qualified_range_filters_qualifier() {
        let range = r("temurin@17");
        assert_eq!(range.qualifier(), Some("temurin"));
        assert!(range.contains(&v("temurin@17.0.9")));
        assert!(!range.contains(&v("zulu@17.0.9")));
        assert!(!range.contains(&v("17.0.9")));
    }

    #[test]
    fn test_unqualified_range_matches_any_qualifier() {
        let range = r("17");
        assert!(range.contains(&v("temurin@17.0.9")));
        assert!(range.contains(&v("17.0.9")));
    }

    #[test]
    fn test_wildcard() {
        let range = r("*");
        assert!(range.contains(&v("1.0.0")));
        assert!(range.contains(&v("temurin@21.0.4")));
        let qualified = r("zulu@*");
        assert!(qualified.contains(&v("zulu@8.0.302")));
        assert!(!qualified.contains(&v("temurin@8.0.302")));
    }

    #[test]
    fn test_operator_bounds_zero_padded() {
        let range = r(">=1.8");
        assert!(range.contains(&v("1.8.0")));
        assert!(range.contains(&v("2.0.0")));
        assert!(!range.contains(&v("1.7.9")));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["", "  ", ">=", "~", "temurin@", "1.2.3.4", ">=x.y"] {
            assert!(
                Range::parse(raw).is_err(),
                "expected parse error for {raw:?}"
            );
        }
    }

    #[test]
    fn test_display_round_trip() {
        assert_eq!(r("~1.8.73").to_string(), "~1.8.73");
        assert_eq!(r("temurin@>=17 <21").to_string(), "temurin@>=17 <21");
    }
}
