use crate::competition::Competition;
use std::collections::HashSet;

/// Competitions in `current` whose id does not appear in `previous`.
///
/// Keeps the order of `current`; an id repeated in `current` is reported once.
pub fn detect_new<'a>(current: &'a [Competition], previous: &[Competition]) -> Vec<&'a Competition> {
    let mut seen: HashSet<&str> = previous.iter().map(|c| c.id.as_str()).collect();
    current
        .iter()
        .filter(|c| seen.insert(c.id.as_str()))
        .collect()
}

/// Ids present in `previous` but no longer in `current` (finished or removed).
pub fn detect_gone<'a>(current: &[Competition], previous: &'a [Competition]) -> Vec<&'a Competition> {
    let ids: HashSet<&str> = current.iter().map(|c| c.id.as_str()).collect();
    previous
        .iter()
        .filter(|c| !ids.contains(c.id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::competition::fixtures::competition;

    fn ids(comps: &[&Competition]) -> Vec<String> {
        comps.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn first_run_everything_is_new() {
        let current = vec![
            competition("A2025", "2025-03-01", "2025-03-01"),
            competition("B2025", "2025-04-01", "2025-04-01"),
        ];
        assert_eq!(ids(&detect_new(&current, &[])), ["A2025", "B2025"]);
    }

    #[test]
    fn only_unseen_ids_are_new() {
        let previous = vec![competition("A2025", "2025-03-01", "2025-03-01")];
        let current = vec![
            competition("A2025", "2025-03-01", "2025-03-01"),
            competition("C2025", "2025-06-01", "2025-06-02"),
            competition("B2025", "2025-04-01", "2025-04-01"),
        ];
        assert_eq!(ids(&detect_new(&current, &previous)), ["C2025", "B2025"]);
    }

    #[test]
    fn matching_is_by_id_not_content() {
        let previous = vec![competition("A2025", "2025-03-01", "2025-03-01")];
        let mut moved = competition("A2025", "2025-03-08", "2025-03-09");
        moved.city = "Valparaíso".to_string();
        assert!(detect_new(&[moved], &previous).is_empty());
    }

    #[test]
    fn duplicate_ids_reported_once() {
        let current = vec![
            competition("A2025", "2025-03-01", "2025-03-01"),
            competition("A2025", "2025-03-01", "2025-03-01"),
        ];
        assert_eq!(detect_new(&current, &[]).len(), 1);
    }

    #[test]
    fn gone_lists_finished_competitions() {
        let previous = vec![
            competition("Old2024", "2024-12-01", "2024-12-01"),
            competition("A2025", "2025-03-01", "2025-03-01"),
        ];
        let current = vec![competition("A2025", "2025-03-01", "2025-03-01")];
        assert_eq!(ids(&detect_gone(&current, &previous)), ["Old2024"]);
    }
}
