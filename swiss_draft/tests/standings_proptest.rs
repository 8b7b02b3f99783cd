/// Property-based tests for the standings calculator using proptest
///
/// Random match histories check determinism, the percentage floor and that
/// only confirmed results move the table.
use proptest::prelude::*;
use swiss_draft::draft::{GameScore, Match};
use swiss_draft::standings::{PERCENTAGE_FLOOR, POINTS_PER_WIN, compute_standings};

const SCORES: &[(u8, u8, u8)] = &[
    (2, 0, 0),
    (2, 1, 0),
    (0, 2, 0),
    (1, 2, 0),
    (1, 1, 1),
    (1, 0, 1),
    (0, 1, 1),
    (1, 0, 0),
    (0, 0, 1),
    (1, 1, 0),
];

#[derive(Debug, Clone)]
struct Played {
    a: usize,
    b: usize,
    score: (u8, u8, u8),
    confirmed: bool,
}

fn played_strategy(players: usize) -> impl Strategy<Value = Played> {
    (0..players, 1..players, 0..SCORES.len(), any::<bool>()).prop_map(
        move |(a, offset, score, confirmed)| Played {
            a,
            b: (a + offset) % players,
            score: SCORES[score],
            confirmed,
        },
    )
}

fn history_strategy() -> impl Strategy<Value = (usize, Vec<Played>, Vec<usize>)> {
    (2usize..=10).prop_flat_map(|players| {
        (
            Just(players),
            prop::collection::vec(played_strategy(players), 0..30),
            prop::collection::vec(0..players, 0..3),
        )
    })
}

fn build(history: &[Played], byes: &[usize]) -> Vec<Match> {
    let mut matches = Vec::new();
    for (idx, p) in history.iter().enumerate() {
        let (w1, w2, d) = p.score;
        let score = GameScore::new(w1, w2).with_draws(d);
        let mut m = Match::new(idx as u32 + 1, 1, 1, p.a as i64, p.b as i64);
        if p.confirmed {
            m.override_result(score).unwrap();
        } else {
            m.report(p.a as i64, score).unwrap();
        }
        matches.push(m);
    }
    for (idx, &player) in byes.iter().enumerate() {
        matches.push(Match::bye(1000 + idx as u32, 1, 99, player as i64));
    }
    matches
}

proptest! {
    #[test]
    fn test_standings_are_deterministic((players, history, byes) in history_strategy()) {
        let ids: Vec<i64> = (0..players as i64).collect();
        let matches = build(&history, &byes);

        let first = compute_standings(&ids, &matches);
        let second = compute_standings(&ids, &matches);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_percentages_never_below_floor((players, history, byes) in history_strategy()) {
        let ids: Vec<i64> = (0..players as i64).collect();
        let matches = build(&history, &byes);

        for record in compute_standings(&ids, &matches) {
            prop_assert!(record.mwp >= PERCENTAGE_FLOOR);
            prop_assert!(record.gwp >= PERCENTAGE_FLOOR);
            prop_assert!(record.omwp >= PERCENTAGE_FLOOR);
            prop_assert!(record.ogwp >= PERCENTAGE_FLOOR);
            prop_assert!(record.mwp <= 1.0 && record.gwp <= 1.0);
        }
    }

    #[test]
    fn test_only_confirmed_results_count((players, history, byes) in history_strategy()) {
        let ids: Vec<i64> = (0..players as i64).collect();
        let matches = build(&history, &byes);
        let confirmed: Vec<Match> = matches.iter().filter(|m| m.is_confirmed()).cloned().collect();

        prop_assert_eq!(
            compute_standings(&ids, &matches),
            compute_standings(&ids, &confirmed)
        );
    }

    #[test]
    fn test_ranked_by_points((players, history, byes) in history_strategy()) {
        let ids: Vec<i64> = (0..players as i64).collect();
        let matches = build(&history, &byes);
        let standings = compute_standings(&ids, &matches);

        prop_assert_eq!(standings.len(), players);
        for pair in standings.windows(2) {
            prop_assert!(pair[0].points >= pair[1].points);
        }

        let total_points: u32 = standings.iter().map(|r| r.points).sum();
        let wins: u32 = standings.iter().map(|r| r.wins).sum();
        let draws: u32 = standings.iter().map(|r| r.draws).sum();
        prop_assert_eq!(total_points, wins * POINTS_PER_WIN + draws);
    }
}
