use std::collections::HashSet;
use tracing::debug;

/// A row keyed by ZIP code that carries a residential share.
pub trait ZipShare {
    fn zip(&self) -> &str;
    fn share(&self) -> f64;
}

/// Collapse rows sharing a ZIP to the one with the largest share.
///
/// Rows are stably ordered by share (descending), the first row per ZIP is
/// kept, and the survivors come back in their original order. Equal shares
/// therefore resolve to the earliest row.
pub fn keep_max_share<T: ZipShare>(rows: Vec<T>) -> Vec<T> {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| rows[b].share().total_cmp(&rows[a].share()));

    let mut keep = vec![false; rows.len()];
    let mut seen: HashSet<&str> = HashSet::with_capacity(rows.len());
    for idx in order {
        if seen.insert(rows[idx].zip()) {
            keep[idx] = true;
        }
    }
    drop(seen);

    let before = rows.len();
    let kept: Vec<T> = rows
        .into_iter()
        .zip(keep)
        .filter_map(|(row, k)| k.then_some(row))
        .collect();
    debug!(before, after = kept.len(), "dropped duplicate ZIPs");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        zip: &'static str,
        code: &'static str,
        share: f64,
    }

    impl ZipShare for Row {
        fn zip(&self) -> &str {
            self.zip
        }
        fn share(&self) -> f64 {
            self.share
        }
    }

    fn row(zip: &'static str, code: &'static str, share: f64) -> Row {
        Row { zip, code, share }
    }

    #[test]
    fn test_keeps_larger_share() {
        let out = keep_max_share(vec![row("94601", "06001", 0.4), row("94601", "06013", 0.6)]);
        assert_eq!(out, vec![row("94601", "06013", 0.6)]);

        let out = keep_max_share(vec![row("94601", "06001", 0.6), row("94601", "06013", 0.4)]);
        assert_eq!(out, vec![row("94601", "06001", 0.6)]);
    }

    #[test]
    fn test_original_order_is_restored() {
        let out = keep_max_share(vec![
            row("30002", "A", 0.1),
            row("10001", "B", 1.0),
            row("30002", "C", 0.9),
            row("20001", "D", 0.5),
        ]);
        assert_eq!(
            out,
            vec![row("10001", "B", 1.0), row("30002", "C", 0.9), row("20001", "D", 0.5)]
        );
    }

    #[test]
    fn test_ties_keep_first_row() {
        let out = keep_max_share(vec![
            row("55555", "first", 0.5),
            row("55555", "second", 0.5),
        ]);
        assert_eq!(out, vec![row("55555", "first", 0.5)]);
    }

    #[test]
    fn test_low_shares_are_not_dropped() {
        let out = keep_max_share(vec![row("00501", "X", 0.0), row("00544", "Y", 0.0)]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_unique_and_maximal_over_many_groups() {
        let zips = ["01001", "01002", "01003", "01004", "01005"];
        let mut input = Vec::new();
        for i in 0..60u32 {
            let zip = zips[(i * 7 % 5) as usize];
            let share = ((i * 37) % 101) as f64 / 100.0;
            input.push(row(zip, "c", share));
        }

        let mut max_by_zip: HashMap<&str, f64> = HashMap::new();
        for r in &input {
            let e = max_by_zip.entry(r.zip).or_insert(f64::MIN);
            if r.share > *e {
                *e = r.share;
            }
        }

        let out = keep_max_share(input);
        let mut seen = HashSet::new();
        for r in &out {
            assert!(seen.insert(r.zip), "duplicate {}", r.zip);
            assert_eq!(r.share, max_by_zip[r.zip]);
        }
        assert_eq!(seen.len(), max_by_zip.len());
    }
}
