use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use termkeys::{Dialect, KeyCode, Modifiers, Normalizer, Outcome};

#[derive(Debug, Deserialize)]
struct DialectFixture {
    dialect: String,
    #[allow(dead_code)]
    description: String,
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    sequence: String,
    modifiers: Vec<String>,
    code: String,
    #[serde(default)]
    #[allow(dead_code)]
    note: Option<String>,
}

type Expected = (Modifiers, KeyCode);

struct Table {
    dialect: Dialect,
    /// Effective entries after last-definition-wins folding, in first-seen
    /// order.
    entries: Vec<(String, Expected)>,
    raw_len: usize,
}

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures/dialects")
}

fn load_tables() -> Result<Vec<Table>, String> {
    let root = fixture_root();
    let rd = std::fs::read_dir(&root)
        .map_err(|err| format!("read_dir {}: {err}", root.display()))?;
    let mut paths: Vec<PathBuf> = rd
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err(format!("no dialect fixtures found under {}", root.display()));
    }
    paths.iter().map(|path| load_table(path)).collect()
}

fn load_table(path: &Path) -> Result<Table, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("read {}: {err}", path.display()))?;
    let fixture: DialectFixture = serde_json::from_str(&text)
        .map_err(|err| format!("parse {}: {err}", path.display()))?;
    let dialect: Dialect = fixture
        .dialect
        .parse()
        .map_err(|err| format!("{}: {err}", path.display()))?;

    let mut order: Vec<String> = Vec::new();
    let mut folded: BTreeMap<String, Expected> = BTreeMap::new();
    for entry in &fixture.entries {
        let expected = expected_pair(entry).map_err(|err| format!("{}: {err}", path.display()))?;
        if folded.insert(entry.sequence.clone(), expected).is_none() {
            order.push(entry.sequence.clone());
        }
    }

    let entries = order
        .into_iter()
        .filter_map(|seq| folded.get(&seq).map(|exp| (seq.clone(), *exp)))
        .collect();
    Ok(Table {
        dialect,
        entries,
        raw_len: fixture.entries.len(),
    })
}

fn expected_pair(entry: &Entry) -> Result<Expected, String> {
    let mut mods = Modifiers::NONE;
    for name in &entry.modifiers {
        mods |= Modifiers::from_name(&name.to_ascii_uppercase())
            .ok_or_else(|| format!("{:?}: unknown modifier {name:?}", entry.sequence))?;
    }
    let code = entry
        .code
        .parse::<KeyCode>()
        .map_err(|err| format!("{:?}: {err}", entry.sequence))?;
    Ok((mods, code))
}

fn describe(result: Option<Expected>) -> String {
    match result {
        Some((mods, code)) => format!("({mods:?}, {code})"),
        None => "nothing".to_string(),
    }
}

fn table(dialect: Dialect) -> Result<Table, String> {
    load_tables()?
        .into_iter()
        .find(|t| t.dialect == dialect)
        .ok_or_else(|| format!("no fixture table for {dialect}"))
}

#[test]
fn every_dialect_has_a_table() -> Result<(), String> {
    let tables = load_tables()?;
    for dialect in Dialect::ALL {
        if !tables.iter().any(|t| t.dialect == dialect) {
            return Err(format!("missing fixture table for {dialect}"));
        }
    }
    Ok(())
}

#[test]
fn dialect_fixtures_on_fresh_normalizer() -> Result<(), String> {
    let mut failures = Vec::new();
    let mut checked = 0usize;
    for table in load_tables()? {
        for (seq, expected) in &table.entries {
            checked += 1;
            let got = Normalizer::new().normalize(seq, table.dialect);
            if got != Some(*expected) {
                failures.push(format!(
                    "{} {seq:?}: got {}, expected {}",
                    table.dialect,
                    describe(got),
                    describe(Some(*expected))
                ));
            }
        }
    }

    if !failures.is_empty() {
        return Err(format!(
            "{} of {checked} dialect fixture entries failed:\n{}",
            failures.len(),
            failures.join("\n")
        ));
    }
    Ok(())
}

#[test]
fn dialect_fixtures_on_shared_normalizer() -> Result<(), String> {
    let mut failures = Vec::new();
    for table in load_tables()? {
        let mut normalizer = Normalizer::new();
        for (seq, expected) in &table.entries {
            let got = normalizer.normalize(seq, table.dialect);
            if got != Some(*expected) {
                failures.push(format!(
                    "{} {seq:?}: got {}, expected {}",
                    table.dialect,
                    describe(got),
                    describe(Some(*expected))
                ));
            }
            if normalizer.has_pending() {
                failures.push(format!(
                    "{} {seq:?}: left {:?} pending",
                    table.dialect,
                    normalizer.pending()
                ));
            }
        }
    }

    if !failures.is_empty() {
        return Err(format!(
            "sequential replay failed:\n{}",
            failures.join("\n")
        ));
    }
    Ok(())
}

#[test]
fn raw_bytes_decode_like_caret_text() -> Result<(), String> {
    let mut failures = Vec::new();
    for table in load_tables()? {
        for (seq, expected) in &table.entries {
            let raw = termkeys::caret::decode(seq);
            let got = Normalizer::new().normalize_raw(&raw, table.dialect);
            if got != Some(*expected) {
                failures.push(format!("{} {raw:?}: got {}", table.dialect, describe(got)));
            }
        }
    }
    if !failures.is_empty() {
        return Err(failures.join("\n"));
    }
    Ok(())
}

#[test]
fn shadowed_entry_resolves_to_last_definition() -> Result<(), String> {
    let mrxvt = table(Dialect::Mrxvt)?;
    assert_eq!(mrxvt.raw_len, mrxvt.entries.len() + 1);

    let (_, expected) = mrxvt
        .entries
        .iter()
        .find(|(seq, _)| seq == "^[[3~")
        .ok_or("mrxvt table lacks ^[[3~")?;
    assert_eq!(*expected, (Modifiers::SHIFT, KeyCode::INSERT));
    assert_eq!(
        Normalizer::new().normalize("^[[3~", Dialect::Mrxvt),
        Some((Modifiers::SHIFT, KeyCode::INSERT))
    );
    Ok(())
}

#[test]
fn effective_entry_counts() -> Result<(), String> {
    let counts: Vec<(Dialect, usize)> = load_tables()?
        .iter()
        .map(|t| (t.dialect, t.entries.len()))
        .collect();
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    assert_eq!(total, 370, "{counts:?}");
    Ok(())
}

/// Heads that are complete keys in their own right, so a split there cannot
/// wait for the rest: `^[^[` alone is alt+escape, and rxvt forms padded with a
/// trailing space (`^[[a `) start with the unpadded form.
fn complete_prefix(seq: &str, head: &str) -> bool {
    head == "^[^[" || seq.strip_suffix(' ') == Some(head)
}

#[test]
fn split_at_every_point_matches_whole() -> Result<(), String> {
    let mut failures = Vec::new();
    for table in load_tables()? {
        for (seq, expected) in &table.entries {
            let chars: Vec<char> = seq.chars().collect();
            for k in 1..chars.len() {
                let head: String = chars[..k].iter().collect();
                let rest: String = chars[k..].iter().collect();

                let mut n = Normalizer::new();
                match n.feed(&head, table.dialect) {
                    Outcome::Pending => {}
                    _ if complete_prefix(seq, &head) => continue,
                    other => {
                        failures.push(format!(
                            "{} {seq:?} split at {k}: head {head:?} gave {other:?}",
                            table.dialect
                        ));
                        continue;
                    }
                }
                let got = n.normalize(&rest, table.dialect);
                if got != Some(*expected) {
                    failures.push(format!(
                        "{} {seq:?} split at {k}: got {}",
                        table.dialect,
                        describe(got)
                    ));
                }
            }
        }
    }
    if !failures.is_empty() {
        return Err(failures.join("\n"));
    }
    Ok(())
}

#[test]
fn buffer_cut_sequence() {
    let mut n = Normalizer::new();
    let all = Some((Modifiers::CTRL | Modifiers::ALT | Modifiers::SHIFT, KeyCode::DOWN));
    assert_eq!(n.normalize("^[[1;8B", Dialect::Xterm), all);
    assert_eq!(n.normalize("^[[1;", Dialect::Xterm), None);
    assert_eq!(n.normalize("8B^[[", Dialect::Xterm), all);
    assert_eq!(n.normalize("1;8B", Dialect::Xterm), all);
}
