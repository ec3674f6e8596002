//! Long-format ("ooTextFile") TextGrid parser
//!
//! Line-oriented: every value Praat writes sits on its own `key = value`
//! line, and the `item [n]:` / `intervals [n]:` headers only establish
//! nesting, so a single pass over `key = value` pairs reconstructs the
//! grid. Short-format files are rejected.

use super::{Interval, IntervalTier, Point, PointTier, TextGrid, Tier};
use crate::error::{NormkitError, Result};

pub fn parse(content: &str) -> Result<TextGrid> {
    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());

    let header = lines.next().unwrap_or_default();
    if !header.contains("ooTextFile") {
        return Err(NormkitError::textgrid("Not an ooTextFile TextGrid"));
    }
    let class = lines.next().unwrap_or_default();
    if !class.contains("TextGrid") {
        return Err(NormkitError::textgrid("Object class is not TextGrid"));
    }

    let mut parser = Parser {
        pairs: lines.filter_map(split_pair).collect(),
        pos: 0,
    };

    let xmin = parser.expect_number("xmin")?;
    let xmax = parser.expect_number("xmax")?;
    let size = parser.expect_number("size")? as usize;

    let mut tiers = Vec::with_capacity(size);
    for _ in 0..size {
        tiers.push(parser.tier()?);
    }

    Ok(TextGrid { xmin, xmax, tiers })
}

/// A `key = value` line split at the first equals sign.
fn split_pair(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    Some((key.trim().to_string(), value.trim().to_string()))
}

struct Parser {
    pairs: Vec<(String, String)>,
    pos: usize,
}

impl Parser {
    fn next_pair(&mut self, key: &str) -> Result<String> {
        // `intervals: size = N` keys the pair as `intervals: size`
        while let Some((k, v)) = self.pairs.get(self.pos) {
            self.pos += 1;
            if k == key || k.ends_with(&format!(": {key}")) || k.ends_with(&format!(":{key}")) {
                return Ok(v.clone());
            }
        }
        Err(NormkitError::textgrid(format!("Missing field '{key}'")))
    }

    fn expect_number(&mut self, key: &str) -> Result<f64> {
        let raw = self.next_pair(key)?;
        raw.parse()
            .map_err(|_| NormkitError::textgrid(format!("Invalid number for '{key}': {raw}")))
    }

    fn expect_text(&mut self, key: &str) -> Result<String> {
        Ok(unquote(&self.next_pair(key)?))
    }

    fn tier(&mut self) -> Result<Tier> {
        let class = self.expect_text("class")?;
        let name = self.expect_text("name")?;
        // Tier-level xmin and xmax are implied by the intervals
        let _ = self.expect_number("xmin")?;
        let _ = self.expect_number("xmax")?;

        match class.as_str() {
            "IntervalTier" => {
                let size = self.expect_number("size")? as usize;
                let mut intervals = Vec::with_capacity(size);
                for _ in 0..size {
                    let xmin = self.expect_number("xmin")?;
                    let xmax = self.expect_number("xmax")?;
                    let text = self.expect_text("text")?;
                    intervals.push(Interval { xmin, xmax, text });
                }
                Ok(Tier::Interval(IntervalTier { name, intervals }))
            }
            "TextTier" => {
                let size = self.expect_number("size")? as usize;
                let mut points = Vec::with_capacity(size);
                for _ in 0..size {
                    let number = self.expect_number("number")?;
                    let mark = self.expect_text("mark")?;
                    points.push(Point { number, mark });
                }
                Ok(Tier::Point(PointTier { name, points }))
            }
            other => Err(NormkitError::textgrid(format!("Unknown tier class: {other}"))),
        }
    }
}

/// Strip surrounding quotes and unescape Praat's doubled quote marks.
fn unquote(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);
    inner.replace("\"\"", "\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"File type = "ooTextFile"
Object class = "TextGrid"

xmin = 0
xmax = 2.5
tiers? <exists>
size = 2
item []:
    item [1]:
        class = "IntervalTier"
        name = "coding"
        xmin = 0
        xmax = 2.5
        intervals: size = 2
        intervals [1]:
            xmin = 0
            xmax = 1.25
            text = "silent"
        intervals [2]:
            xmin = 1.25
            xmax = 2.5
            text = "1a"
    item [2]:
        class = "TextTier"
        name = "notes"
        xmin = 0
        xmax = 2.5
        points: size = 1
        points [1]:
            number = 0.8
            mark = "check ""this"""
"#;

    #[test]
    fn test_parse_long_format() {
        let grid = parse(SAMPLE).unwrap();
        assert_eq!(grid.xmin, 0.0);
        assert_eq!(grid.xmax, 2.5);
        assert_eq!(grid.tiers.len(), 2);

        let coding = grid.interval_tier(1).unwrap();
        assert_eq!(coding.name, "coding");
        assert_eq!(coding.intervals.len(), 2);
        assert_eq!(coding.intervals[0].text, "silent");
        assert_eq!(coding.intervals[1].xmin, 1.25);
        assert_eq!(coding.intervals[1].text, "1a");

        match &grid.tiers[1] {
            Tier::Point(t) => {
                assert_eq!(t.name, "notes");
                assert_eq!(t.points.len(), 1);
                assert_eq!(t.points[0].number, 0.8);
                assert_eq!(t.points[0].mark, "check \"this\"");
            }
            Tier::Interval(_) => panic!("expected point tier"),
        }
    }

    #[test]
    fn test_reject_foreign_files() {
        assert!(parse("not a textgrid").is_err());
        assert!(parse("File type = \"ooTextFile\"\nObject class = \"Sound\"\n").is_err());
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"silent\""), "silent");
        assert_eq!(unquote("\"\""), "");
        assert_eq!(unquote("\"a \"\"b\"\"\""), "a \"b\"");
    }
}
