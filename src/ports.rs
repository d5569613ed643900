use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Ports probed on every sampled host when nothing else is configured.
pub const DEFAULT_PORTS: &[u16] = &[2408, 1701, 500, 4500, 8886, 908];

/// Parse a port list into an ordered, deduplicated `Vec<u16>`.
///
/// Entries are separated by commas, whitespace or newlines. Each entry is a
/// single port (`2408`) or an inclusive range (`8886-8890`). Everything after
/// `#` on a line is a comment. First occurrence wins the position.
pub fn parse_port_list(s: &str) -> Result<Vec<u16>> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();

    for (idx, raw_line) in s.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.split('#').next().unwrap_or("");
        for token in line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let (start, end) = match token.split_once('-') {
                Some((a, b)) => {
                    let start = parse_port(a)
                        .with_context(|| format!("line {line_no}: bad range start in {token:?}"))?;
                    let end = parse_port(b)
                        .with_context(|| format!("line {line_no}: bad range end in {token:?}"))?;
                    if start > end {
                        bail!("line {line_no}: empty range {start}-{end}");
                    }
                    (start, end)
                }
                None => {
                    let p = parse_port(token)
                        .with_context(|| format!("line {line_no}: bad port {token:?}"))?;
                    (p, p)
                }
            };
            for p in start..=end {
                if seen.insert(p) {
                    out.push(p);
                }
            }
        }
    }

    Ok(out)
}

/// Read a ports file. An empty file is an error: a scan with no ports probes nothing.
pub fn load_ports_file(path: impl AsRef<Path>) -> Result<Vec<u16>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read ports file: {}", path.display()))?;
    let ports = parse_port_list(&content)
        .with_context(|| format!("failed to parse ports file: {}", path.display()))?;
    if ports.is_empty() {
        bail!("ports file lists no ports: {}", path.display());
    }
    Ok(ports)
}

fn parse_port(s: &str) -> Result<u16> {
    let val: u32 = s.trim().parse()?;
    if val == 0 || val > 65535 {
        bail!("port out of range: {val}");
    }
    Ok(val as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commas_and_newlines_mix() {
        let ports = parse_port_list("2408, 1701\n500 4500").unwrap();
        assert_eq!(ports, vec![2408, 1701, 500, 4500]);
    }

    #[test]
    fn ranges_dedup_in_first_seen_order() {
        let ports = parse_port_list("8886-8888\n500\n8887").unwrap();
        assert_eq!(ports, vec![8886, 8887, 8888, 500]);
    }

    #[test]
    fn comments_and_blank_lines() {
        let input = r#"
            # warp ports
            2408  # primary
            908

            4500 # nat-t
        "#;
        assert_eq!(parse_port_list(input).unwrap(), vec![2408, 908, 4500]);
    }

    #[test]
    fn out_of_range_and_reversed_fail() {
        assert!(parse_port_list("70000").is_err());
        assert!(parse_port_list("0").is_err());
        assert!(parse_port_list("90-80").is_err());
        assert!(parse_port_list("ssh").is_err());
    }

    #[test]
    fn defaults_are_unique() {
        let uniq: HashSet<_> = DEFAULT_PORTS.iter().collect();
        assert_eq!(uniq.len(), DEFAULT_PORTS.len());
    }
}
