//! Generated regions.
//!
//! A region is the run of lines between a `blok:begin <name>` marker line and
//! the matching `blok:end <name>` line. Markers may sit inside any comment
//! syntax (`// ...` or `{/* ... */}` in JSX); only the marker text matters.

use std::collections::HashMap;

pub const BEGIN: &str = "blok:begin";
pub const END: &str = "blok:end";

/// `// blok:begin name` for TypeScript.
pub fn ts_begin(name: &str) -> String {
    format!("// {} {}", BEGIN, name)
}

pub fn ts_end(name: &str) -> String {
    format!("// {} {}", END, name)
}

/// `{/* blok:begin name */}` for JSX children.
pub fn jsx_begin(name: &str) -> String {
    format!("{{/* {} {} */}}", BEGIN, name)
}

pub fn jsx_end(name: &str) -> String {
    format!("{{/* {} {} */}}", END, name)
}

/// A region located by line index: marker lines are `begin` and `end`,
/// the body is `begin + 1 .. end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub begin: usize,
    pub end: usize,
}

fn marker(line: &str, tag: &str) -> Option<String> {
    let idx = line.find(tag)?;
    let rest = &line[idx + tag.len()..];
    let name: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if name.is_empty() { None } else { Some(name) }
}

/// Find all regions in `content`. Errors on unbalanced, nested, or duplicated markers.
pub fn find(content: &str) -> Result<Vec<Region>, String> {
    let mut regions = Vec::new();
    let mut open: Option<(String, usize)> = None;

    for (idx, line) in content.lines().enumerate() {
        if let Some(name) = marker(line, BEGIN) {
            if let Some((current, _)) = &open {
                return Err(format!(
                    "region '{}' opens inside region '{}' (line {})",
                    name,
                    current,
                    idx + 1
                ));
            }
            if regions.iter().any(|r: &Region| r.name == name) {
                return Err(format!("region '{}' appears more than once", name));
            }
            open = Some((name, idx));
        } else if let Some(name) = marker(line, END) {
            match open.take() {
                Some((current, begin)) if current == name => regions.push(Region {
                    name,
                    begin,
                    end: idx,
                }),
                Some((current, _)) => {
                    return Err(format!(
                        "region '{}' closed by end marker for '{}' (line {})",
                        current,
                        name,
                        idx + 1
                    ));
                }
                None => {
                    return Err(format!(
                        "end marker for '{}' without a begin (line {})",
                        name,
                        idx + 1
                    ));
                }
            }
        }
    }

    if let Some((name, _)) = open {
        return Err(format!("region '{}' is never closed", name));
    }
    Ok(regions)
}

/// Replace the bodies of `existing`'s regions with the bodies from `generated`.
///
/// Returns `Ok(None)` when the two files do not share the same set of region
/// names, in which case the caller replaces the file wholesale.
pub fn splice(existing: &str, generated: &str) -> Result<Option<String>, String> {
    let old_regions = find(existing)?;
    let new_regions = find(generated)?;

    if old_regions.is_empty() || new_regions.is_empty() {
        return Ok(None);
    }
    let mut old_names: Vec<_> = old_regions.iter().map(|r| r.name.as_str()).collect();
    let mut new_names: Vec<_> = new_regions.iter().map(|r| r.name.as_str()).collect();
    old_names.sort_unstable();
    new_names.sort_unstable();
    if old_names != new_names {
        return Ok(None);
    }

    let generated_lines: Vec<&str> = generated.lines().collect();
    let bodies: HashMap<&str, &[&str]> = new_regions
        .iter()
        .map(|r| (r.name.as_str(), &generated_lines[r.begin + 1..r.end]))
        .collect();

    let existing_lines: Vec<&str> = existing.lines().collect();
    let mut out: Vec<&str> = Vec::with_capacity(existing_lines.len());
    let mut cursor = 0;
    for region in &old_regions {
        out.extend_from_slice(&existing_lines[cursor..=region.begin]);
        if let Some(body) = bodies.get(region.name.as_str()) {
            out.extend_from_slice(body);
        }
        cursor = region.end;
    }
    out.extend_from_slice(&existing_lines[cursor..]);

    let mut spliced = out.join("\n");
    if existing.ends_with('\n') {
        spliced.push('\n');
    }
    Ok(Some(spliced))
}
