//! UCI option declaration parsing.

use serde::{Deserialize, Serialize};

/// The declared type of a UCI option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Check,
    Spin,
    Combo,
    Button,
    String,
}

impl OptionKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "check" => Some(OptionKind::Check),
            "spin" => Some(OptionKind::Spin),
            "combo" => Some(OptionKind::Combo),
            "button" => Some(OptionKind::Button),
            "string" => Some(OptionKind::String),
            _ => None,
        }
    }
}

/// An option declared by an engine during the `uci` handshake.
///
/// Example line: `option name Hash type spin default 16 min 1 max 65536`.
/// Engines get this wrong in creative ways, so every field besides the name
/// is optional and the raw line is kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOption {
    /// Option name (may contain spaces).
    pub name: String,
    /// Declared type, if recognized.
    pub kind: Option<OptionKind>,
    /// Declared default value.
    pub default: Option<String>,
    /// Minimum value (spin options).
    pub min: Option<i64>,
    /// Maximum value (spin options).
    pub max: Option<i64>,
    /// The unmodified declaration line.
    pub raw: String,
}

impl EngineOption {
    /// Parse an `option name ...` line. Returns `None` if the line does not
    /// declare an option name at all.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let rest = line.strip_prefix("option")?.trim_start();
        let rest = rest.strip_prefix("name")?.trim_start();

        // The name runs until the `type` keyword (or end of line for
        // engines that omit it).
        let (name, tail) = match rest.find(" type ") {
            Some(idx) => (&rest[..idx], &rest[idx + 1..]),
            None => (rest, ""),
        };
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut opt = EngineOption {
            name: name.to_string(),
            kind: None,
            default: None,
            min: None,
            max: None,
            raw: line.to_string(),
        };

        let parts: Vec<&str> = tail.split_whitespace().collect();
        let mut i = 0;
        while i < parts.len() {
            match parts[i] {
                "type" => {
                    i += 1;
                    if i < parts.len() {
                        opt.kind = OptionKind::parse(parts[i]);
                    }
                }
                "default" => {
                    i += 1;
                    // String defaults may contain spaces; take tokens up to
                    // the next keyword. An empty default is legal.
                    let mut value = Vec::new();
                    while i < parts.len() && !is_option_keyword(parts[i]) {
                        value.push(parts[i]);
                        i += 1;
                    }
                    opt.default = Some(value.join(" "));
                    continue;
                }
                "min" => {
                    i += 1;
                    if i < parts.len() {
                        opt.min = parts[i].parse().ok();
                    }
                }
                "max" => {
                    i += 1;
                    if i < parts.len() {
                        opt.max = parts[i].parse().ok();
                    }
                }
                _ => {}
            }
            i += 1;
        }

        Some(opt)
    }
}

fn is_option_keyword(s: &str) -> bool {
    matches!(s, "type" | "default" | "min" | "max" | "var")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_spin_option() {
        let opt =
            EngineOption::parse("option name Hash type spin default 16 min 1 max 65536").unwrap();
        assert_eq!(opt.name, "Hash");
        assert_eq!(opt.kind, Some(OptionKind::Spin));
        assert_eq!(opt.default.as_deref(), Some("16"));
        assert_eq!(opt.min, Some(1));
        assert_eq!(opt.max, Some(65536));
    }

    #[test]
    fn parse_check_option() {
        let opt = EngineOption::parse("option name Ponder type check default false").unwrap();
        assert_eq!(opt.name, "Ponder");
        assert_eq!(opt.kind, Some(OptionKind::Check));
        assert_eq!(opt.default.as_deref(), Some("false"));
        assert_eq!(opt.min, None);
        assert_eq!(opt.max, None);
    }

    #[test]
    fn parse_name_with_spaces() {
        let opt = EngineOption::parse("option name Skill Level type spin default 20 min 0 max 20")
            .unwrap();
        assert_eq!(opt.name, "Skill Level");
    }

    #[test]
    fn parse_button_option() {
        let opt = EngineOption::parse("option name Clear Hash type button").unwrap();
        assert_eq!(opt.name, "Clear Hash");
        assert_eq!(opt.kind, Some(OptionKind::Button));
        assert_eq!(opt.default, None);
    }

    #[test]
    fn parse_string_option_with_empty_default() {
        let opt = EngineOption::parse("option name SyzygyPath type string default").unwrap();
        assert_eq!(opt.kind, Some(OptionKind::String));
        assert_eq!(opt.default.as_deref(), Some(""));
    }

    #[test]
    fn parse_missing_type_keeps_name() {
        let opt = EngineOption::parse("option name WeirdKnob").unwrap();
        assert_eq!(opt.name, "WeirdKnob");
        assert_eq!(opt.kind, None);
    }

    #[test]
    fn parse_keeps_raw_line() {
        let line = "option name Threads type spin default 1 min 1 max 512";
        let opt = EngineOption::parse(line).unwrap();
        assert_eq!(opt.raw, line);
    }

    #[test]
    fn parse_rejects_non_option_lines() {
        assert!(EngineOption::parse("id name Foo").is_none());
        assert!(EngineOption::parse("option type spin").is_none());
    }
}
