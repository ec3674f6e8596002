//! Long-format TextGrid serialization

use super::{TextGrid, Tier};
use std::fmt::Write;

/// Render a grid in the long text form Praat writes.
pub fn render(grid: &TextGrid) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File type = \"ooTextFile\"");
    let _ = writeln!(out, "Object class = \"TextGrid\"");
    let _ = writeln!(out);
    let _ = writeln!(out, "xmin = {} ", fmt_time(grid.xmin));
    let _ = writeln!(out, "xmax = {} ", fmt_time(grid.xmax));
    let _ = writeln!(out, "tiers? <exists> ");
    let _ = writeln!(out, "size = {} ", grid.tiers.len());
    let _ = writeln!(out, "item []: ");

    for (i, tier) in grid.tiers.iter().enumerate() {
        let _ = writeln!(out, "    item [{}]:", i + 1);
        match tier {
            Tier::Interval(t) => {
                let _ = writeln!(out, "        class = \"IntervalTier\" ");
                let _ = writeln!(out, "        name = {} ", quote(&t.name));
                let _ = writeln!(out, "        xmin = {} ", fmt_time(grid.xmin));
                let _ = writeln!(out, "        xmax = {} ", fmt_time(grid.xmax));
                let _ = writeln!(out, "        intervals: size = {} ", t.intervals.len());
                for (j, iv) in t.intervals.iter().enumerate() {
                    let _ = writeln!(out, "        intervals [{}]:", j + 1);
                    let _ = writeln!(out, "            xmin = {} ", fmt_time(iv.xmin));
                    let _ = writeln!(out, "            xmax = {} ", fmt_time(iv.xmax));
                    let _ = writeln!(out, "            text = {} ", quote(&iv.text));
                }
            }
            Tier::Point(t) => {
                let _ = writeln!(out, "        class = \"TextTier\" ");
                let _ = writeln!(out, "        name = {} ", quote(&t.name));
                let _ = writeln!(out, "        xmin = {} ", fmt_time(grid.xmin));
                let _ = writeln!(out, "        xmax = {} ", fmt_time(grid.xmax));
                let _ = writeln!(out, "        points: size = {} ", t.points.len());
                for (j, p) in t.points.iter().enumerate() {
                    let _ = writeln!(out, "        points [{}]:", j + 1);
                    let _ = writeln!(out, "            number = {} ", fmt_time(p.number));
                    let _ = writeln!(out, "            mark = {} ", quote(&p.mark));
                }
            }
        }
    }

    out
}

fn fmt_time(value: f64) -> String {
    if value == value.trunc() {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}
