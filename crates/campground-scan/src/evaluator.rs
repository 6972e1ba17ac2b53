/// Length of the longest run of consecutive available nights.
///
/// Returns 0 for an empty or fully booked window. A run that reaches the last
/// night is counted.
pub fn evaluate(availability: &[bool]) -> usize {
    let mut longest = 0;
    let mut current = 0;

    for &available in availability {
        if available {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }

    longest
}

/// Whether the window holds at least `required` consecutive available nights.
pub fn meets_requirement(availability: &[bool], required: u32) -> bool {
    evaluate(availability) >= required as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_single() {
        assert_eq!(evaluate(&[]), 0);
        assert_eq!(evaluate(&[true]), 1);
        assert_eq!(evaluate(&[false]), 0);
    }

    #[test]
    fn test_longest_run_wins() {
        assert_eq!(evaluate(&[true, true, false, true]), 2);
        assert_eq!(evaluate(&[false, true, false, true, true, true, false]), 3);
    }

    #[test]
    fn test_trailing_run_is_counted() {
        assert_eq!(evaluate(&[true, true, true]), 3);
        assert_eq!(evaluate(&[false, true, true]), 2);
    }

    #[test]
    fn test_meets_requirement_is_inclusive() {
        let window = [false, true, true, true, false];
        assert!(meets_requirement(&window, 3));
        assert!(meets_requirement(&window, 2));
        assert!(!meets_requirement(&window, 4));
    }

    #[test]
    fn test_matches_split_reference_for_all_short_windows() {
        for len in 0..=10usize {
            for bits in 0u32..(1 << len) {
                let window: Vec<bool> = (0..len).map(|i| bits & (1 << i) != 0).collect();
                let expected = window
                    .split(|available| !available)
                    .map(<[bool]>::len)
                    .max()
                    .unwrap_or(0);

                let longest = evaluate(&window);
                assert_eq!(longest, expected, "window {:?}", window);
                assert!(longest <= window.len());
            }
        }
    }
}
