use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{AppError, AppResult};

/// 版本号的截断粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPart {
    Major,
    Minor,
    Patch,
}

impl std::str::FromStr for VersionPart {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s {
            "major" => Ok(VersionPart::Major),
            "minor" => Ok(VersionPart::Minor),
            "patch" => Ok(VersionPart::Patch),
            other => Err(AppError::config(format!(
                "无效的版本粒度: {other}（可选 major、minor、patch）"
            ))),
        }
    }
}

/// 解析后的数字核心，`specified` 记录用户实际写了几段
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VersionCore {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: String,
    pub specified: u8,
}

/// 解析 `MAJOR[.MINOR[.PATCH]][-PRERELEASE]`，缺失的段补零
pub(crate) fn parse_core(raw: &str) -> AppResult<VersionCore> {
    let (core, prerelease) = match raw.find('-') {
        Some(idx) => (&raw[..idx], &raw[idx + 1..]),
        None => (raw, ""),
    };
    if core.is_empty() {
        return Err(AppError::invalid_version(raw));
    }

    let mut nums = [0u64; 3];
    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 {
        return Err(AppError::invalid_version(raw));
    }
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::invalid_version(raw));
        }
        nums[i] = part
            .parse()
            .map_err(|_| AppError::invalid_version(raw))?;
    }

    Ok(VersionCore {
        major: nums[0],
        minor: nums[1],
        patch: nums[2],
        prerelease: prerelease.to_string(),
        specified: parts.len() as u8,
    })
}

/// 比较两个预发布标签：正式版高于任何预发布版，
/// 标识符按 `.` 分段，纯数字段按数值比较且低于字母段
pub(crate) fn compare_prerelease(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ln = l.parse::<u64>();
                let rn = r.parse::<u64>();
                let ord = match (ln, rn) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// 带发行商限定符的版本：`[qualifier@]MAJOR[.MINOR[.PATCH]][-PRERELEASE]`
///
/// 相等性以原始字符串为准，排序时限定符按字典序降序优先，
/// 之后才按数字核心与预发布标签比较。
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    qualifier: String,
    core: VersionCore,
}

impl Version {
    pub fn parse(raw: &str) -> AppResult<Version> {
        let (qualifier, rest) = match raw.find('@') {
            Some(idx) => (&raw[..idx], &raw[idx + 1..]),
            None => ("", raw),
        };
        let core = parse_core(rest).map_err(|_| AppError::invalid_version(raw))?;
        Ok(Version {
            raw: raw.to_string(),
            qualifier: qualifier.to_string(),
            core,
        })
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    pub fn major(&self) -> u64 {
        self.core.major
    }

    pub fn minor(&self) -> u64 {
        self.core.minor
    }

    pub fn patch(&self) -> u64 {
        self.core.patch
    }

    pub fn prerelease(&self) -> &str {
        &self.core.prerelease
    }

    pub fn is_prerelease(&self) -> bool {
        !self.core.prerelease.is_empty()
    }

    /// 截断到指定粒度，保留 `qualifier@` 前缀
    pub fn trim_to(&self, part: VersionPart) -> String {
        let truncated = match part {
            VersionPart::Major => format!("{}", self.core.major),
            VersionPart::Minor => format!("{}.{}", self.core.major, self.core.minor),
            VersionPart::Patch => format!(
                "{}.{}.{}",
                self.core.major, self.core.minor, self.core.patch
            ),
        };
        if self.qualifier.is_empty() {
            truncated
        } else {
            format!("{}@{}", self.qualifier, truncated)
        }
    }

    /// 仅比较数字核心与预发布标签，忽略限定符
    pub(crate) fn cmp_precedence(&self, other: &Version) -> Ordering {
        (self.core.major, self.core.minor, self.core.patch)
            .cmp(&(other.core.major, other.core.minor, other.core.patch))
            .then_with(|| compare_prerelease(&self.core.prerelease, &other.core.prerelease))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // 限定符降序：限定符字典序越大，版本越小；空限定符最大
        other
            .qualifier
            .cmp(&self.qualifier)
            .then_with(|| self.cmp_precedence(other))
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 对版本列表按 `(限定符, 截断核心)` 分组，每组保留最大的版本
pub trait VersionSliceExt {
    fn trim_to(&self, part: VersionPart) -> Vec<Version>;
}

impl VersionSliceExt for [Version] {
    fn trim_to(&self, part: VersionPart) -> Vec<Version> {
        let mut latest: HashMap<String, Version> = HashMap::new();
        for v in self {
            let key = v.trim_to(part);
            let replace = latest.get(&key).map_or(true, |prev| *v > *prev);
            if replace {
                latest.insert(key, v.clone());
            }
        }
        let mut result: Vec<Version> = latest.into_values().collect();
        result.sort();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> Version {
        Version::parse(raw).unwrap()
    }

    #[test]
    fn test_parse_round_trip() {
        for raw in [
            "1.8.73",
            "temurin@17.0.9",
            "zulu@21",
            "11.0.2-ea",
            "system@25",
            "red-hat-inc-system@25",
        ] {
            assert_eq!(v(raw).to_string(), raw);
        }
    }

    #[test]
    fn test_parse_zero_pads_missing_parts() {
        let ver = v("8");
        assert_eq!((ver.major(), ver.minor(), ver.patch()), (8, 0, 0));
        let ver = v("1.8");
        assert_eq!((ver.major(), ver.minor(), ver.patch()), (1, 8, 0));
        let ver = v("temurin@21.0.4");
        assert_eq!((ver.major(), ver.minor(), ver.patch()), (21, 0, 4));
        assert_eq!(ver.qualifier(), "temurin");
    }

    #[test]
    fn test_parse_prerelease_and_qualifier() {
        let ver = v("temurin@17.0.1-ea.2");
        assert_eq!(ver.qualifier(), "temurin");
        assert_eq!(ver.prerelease(), "ea.2");
        assert!(ver.is_prerelease());
        assert!(!v("17.0.1").is_prerelease());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["", "abc", "1.x.3", "1.2.3.4", "temurin@", "@", "17.0.9+9"] {
            assert!(
                Version::parse(raw).is_err(),
                "expected parse error for {raw:?}"
            );
        }
    }

    #[test]
    fn test_equality_is_raw_string_equality() {
        assert_eq!(v("1.8"), v("1.8"));
        // 数字核心相同但写法不同的版本并不相等
        assert_ne!(v("1.8"), v("1.8.0"));
    }

    #[test]
    fn test_numeric_core_ordering() {
        assert!(v("1.8.73") < v("1.9.0"));
        assert!(v("1.10.0") > v("1.9.9"));
        assert!(v("17.0.9") < v("21.0.1"));
    }

    #[test]
    fn test_qualifier_orders_descending() {
        // 限定符字典序更大的排在更前（更小）；空限定符排最后（最大）
        assert!(v("zulu@17") < v("temurin@17"));
        assert!(v("temurin@17") < v("17"));
        let mut vs = vec![v("17"), v("zulu@17"), v("temurin@17")];
        vs.sort();
        let sorted: Vec<String> = vs.iter().map(|v| v.to_string()).collect();
        assert_eq!(sorted, vec!["zulu@17", "temurin@17", "17"]);
    }

    #[test]
    fn test_prerelease_sorts_below_release() {
        assert!(v("17.0.1-ea") < v("17.0.1"));
        assert!(v("17.0.1-ea.1") < v("17.0.1-ea.2"));
        assert!(v("17.0.1-1") < v("17.0.1-alpha"));
        assert!(v("17.0.1-alpha") < v("17.0.1-beta"));
    }

    #[test]
    fn test_trim_to_string() {
        let ver = v("temurin@17.3.9");
        assert_eq!(ver.trim_to(VersionPart::Major), "temurin@17");
        assert_eq!(ver.trim_to(VersionPart::Minor), "temurin@17.3");
        assert_eq!(ver.trim_to(VersionPart::Patch), "temurin@17.3.9");
        assert_eq!(v("1.8.73").trim_to(VersionPart::Minor), "1.8");
    }

    #[test]
    fn test_slice_trim_to_keeps_max_per_group() {
        let vs = vec![
            v("1.8.72"),
            v("1.8.73"),
            v("1.9.0"),
            v("temurin@1.8.73"),
            v("temurin@1.8.9"),
        ];
        let trimmed = vs.trim_to(VersionPart::Minor);
        let raws: Vec<String> = trimmed.iter().map(|v| v.to_string()).collect();
        assert_eq!(raws, vec!["temurin@1.8.73", "1.8.73", "1.9.0"]);
    }

    #[test]
    fn test_slice_trim_to_is_idempotent() {
        let vs = vec![v("1.8.72"), v("1.8.73"), v("1.9.0"), v("2.0.1")];
        let once = vs.trim_to(VersionPart::Minor);
        let twice = once.trim_to(VersionPart::Minor);
        assert_eq!(once, twice);
    }
}
