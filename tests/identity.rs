use chrono::NaiveDate;

use mlb_gamelogs::game_identity::{GameIdentity, HomeAway, IDENTITY_MODULUS};
use mlb_gamelogs::teams::{MLB_TEAM_CODES, TeamCode};

fn code(raw: &str) -> TeamCode {
    raw.parse().expect("valid team code")
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn same_game_from_either_page_matches() {
    // MIA at PHI, MIA wins 5-2.
    let from_phi = GameIdentity::from_perspective(
        day(2020, 7, 25),
        code("PHI"),
        code("MIA"),
        HomeAway::Home,
        2,
        5,
    );
    let from_mia = GameIdentity::from_perspective(
        day(2020, 7, 25),
        code("MIA"),
        code("PHI"),
        HomeAway::Away,
        5,
        2,
    );
    let direct = GameIdentity::derive(day(2020, 7, 25), code("PHI"), code("MIA"), 2, 5);
    assert_eq!(from_phi, from_mia);
    assert_eq!(from_phi, direct);
    assert_eq!(direct.value(), 1_233_712_716);
}

#[test]
fn symmetry_holds_across_sampled_games() {
    let codes = MLB_TEAM_CODES.iter().map(|c| code(c)).collect::<Vec<_>>();
    for (i, own) in codes.iter().enumerate() {
        let opp = codes[(i * 7 + 3) % codes.len()];
        if *own == opp {
            continue;
        }
        let date = day(2020, 8, 1 + (i as u32 % 28));
        let (rf, ra) = (i as u32 % 11, (i as u32 * 3) % 9);
        for side in [HomeAway::Home, HomeAway::Away] {
            let other_side = match side {
                HomeAway::Home => HomeAway::Away,
                HomeAway::Away => HomeAway::Home,
            };
            let a = GameIdentity::from_perspective(date, *own, opp, side, rf, ra);
            let b = GameIdentity::from_perspective(date, opp, *own, other_side, ra, rf);
            assert_eq!(a, b, "{own} vs {opp} on {date}");
        }
    }
}

#[test]
fn repeated_calls_are_deterministic() {
    let first = GameIdentity::derive(day(2021, 4, 1), code("NYY"), code("TOR"), 3, 2);
    for _ in 0..50 {
        assert_eq!(
            GameIdentity::derive(day(2021, 4, 1), code("NYY"), code("TOR"), 3, 2),
            first
        );
    }
}

#[test]
fn identities_stay_below_modulus() {
    for d in 1..=28u32 {
        for hs in 0..6u32 {
            for aw in 0..6u32 {
                let id = GameIdentity::derive(day(2020, 9, d), code("LAD"), code("SDP"), hs, aw);
                assert!(u64::from(id.value()) < IDENTITY_MODULUS);
                assert!(id.as_i64() >= 0);
            }
        }
    }
}

#[test]
fn doubleheader_with_different_score_differs() {
    let game_one = GameIdentity::derive(day(2020, 7, 25), code("PHI"), code("MIA"), 2, 5);
    let game_two = GameIdentity::derive(day(2020, 7, 25), code("PHI"), code("MIA"), 3, 1);
    assert_ne!(game_one, game_two);
    assert_eq!(game_two.value(), 1_464_473_824);
}

#[test]
fn doubleheader_with_identical_score_collides() {
    // Known limitation: score is the only tie-breaker on a shared date.
    let game_one = GameIdentity::derive(day(2020, 8, 5), code("NYY"), code("PHI"), 3, 1);
    let game_two = GameIdentity::derive(day(2020, 8, 5), code("NYY"), code("PHI"), 3, 1);
    assert_eq!(game_one, game_two);
}

#[test]
fn different_dates_or_scores_spread_out() {
    let mut seen = std::collections::HashSet::new();
    let mut total = 0usize;
    for d in 1..=30u32 {
        for hs in 0..10u32 {
            for aw in 0..10u32 {
                if hs == aw {
                    continue;
                }
                seen.insert(GameIdentity::derive(day(2020, 9, d), code("PHI"), code("MIA"), hs, aw));
                total += 1;
            }
        }
    }
    assert_eq!(seen.len(), total);
}

#[test]
fn prior_day_differs() {
    let a = GameIdentity::derive(day(2020, 7, 25), code("PHI"), code("MIA"), 2, 5);
    let b = GameIdentity::derive(day(2020, 7, 24), code("PHI"), code("MIA"), 2, 5);
    assert_ne!(a, b);
    assert_eq!(b.value(), 880_733_091);
}
