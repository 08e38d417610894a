use block_golf::plugins::course::RulesDef;
use block_golf::plugins::game_state::*;

fn rules() -> RulesDef {
    RulesDef { max_players: 3, max_strokes: 5, shot_clock_secs: 10.0, ..RulesDef::default() }
}

fn seated(names: &[&str]) -> (GolfMatch, Vec<PlayerId>) {
    let mut golf = GolfMatch::new(rules(), vec![3, 4]);
    let ids = names
        .iter()
        .map(|n| golf.admit(n).expect("admit").0)
        .collect();
    (golf, ids)
}

/// Plays `strokes` strokes then holes out the active player and ends the turn.
fn finish_active(golf: &mut GolfMatch, strokes: u32) -> TurnOutcome {
    let p = golf.current_player().expect("active player");
    for _ in 0..strokes {
        golf.record_stroke(p).expect("stroke");
    }
    golf.hole_out(p).expect("hole out");
    golf.end_turn()
}

#[test]
fn lobby_admission_limits() {
    let (mut golf, ids) = seated(&["Ann", "Bo", "Cy"]);
    assert_eq!(ids, vec![PlayerId(1), PlayerId(2), PlayerId(3)]);
    assert_eq!(golf.admit("Dee"), Err(MatchError::MatchFull { max: 3 }));
    assert_eq!(golf.admit("   "), Err(MatchError::EmptyName));
    assert_eq!(golf.phase(), MatchPhase::Lobby);
}

#[test]
fn start_needs_enough_players() {
    let mut golf = GolfMatch::new(RulesDef { min_players: 2, ..rules() }, vec![3]);
    golf.admit("Solo").unwrap();
    assert_eq!(golf.start(), Err(MatchError::NotEnoughPlayers { have: 1, need: 2 }));
    golf.admit("Duo").unwrap();
    assert_eq!(golf.start(), Ok(()));
    assert_eq!(golf.phase(), MatchPhase::Starting);
    assert_eq!(golf.start(), Err(MatchError::NotInLobby));
}

#[test]
fn turns_rotate_round_robin_and_skip_holed_out_players() {
    let (mut golf, ids) = seated(&["Ann", "Bo", "Cy"]);
    golf.start().unwrap();
    assert_eq!(golf.begin_hole(0), Ok(ids[0]));

    golf.record_stroke(ids[0]).unwrap();
    assert_eq!(golf.end_turn().next, NextTurn::Player(ids[1]));

    // Bo sinks it on the first stroke and drops out of the rotation.
    assert_eq!(finish_active(&mut golf, 1).next, NextTurn::Player(ids[2]));
    golf.record_stroke(ids[2]).unwrap();
    assert_eq!(golf.end_turn().next, NextTurn::Player(ids[0]));
    golf.record_stroke(ids[0]).unwrap();
    assert_eq!(golf.end_turn().next, NextTurn::Player(ids[2]));
}

#[test]
fn only_the_active_player_may_shoot() {
    let (mut golf, ids) = seated(&["Ann", "Bo"]);
    assert_eq!(golf.record_stroke(ids[0]), Err(MatchError::NoActiveHole));
    golf.start().unwrap();
    golf.begin_hole(0).unwrap();
    assert_eq!(golf.record_stroke(ids[1]), Err(MatchError::NotYourTurn(ids[1])));
    assert_eq!(golf.record_stroke(ids[0]), Ok(1));
    assert!(golf.shot_in_progress());
}

#[test]
fn penalties_add_strokes_and_are_tracked_separately() {
    let (mut golf, ids) = seated(&["Ann"]);
    golf.start().unwrap();
    golf.begin_hole(0).unwrap();
    golf.record_stroke(ids[0]).unwrap();
    assert_eq!(golf.penalize(ids[0], 1), Ok(2));
    let row = golf.scorecard().row(ids[0]).unwrap();
    assert_eq!(row.strokes[0], 2);
    assert_eq!(row.penalties[0], 1);
}

#[test]
fn stroke_limit_picks_the_ball_up() {
    let (mut golf, ids) = seated(&["Ann", "Bo"]);
    golf.start().unwrap();
    golf.begin_hole(0).unwrap();
    for _ in 0..4 {
        golf.record_stroke(ids[0]).unwrap();
    }
    golf.penalize(ids[0], 2).unwrap(); // 6 > max_strokes
    let outcome = golf.end_turn();
    assert_eq!(outcome.picked_up, Some(ids[0]));
    assert_eq!(outcome.next, NextTurn::Player(ids[1]));
    assert_eq!(golf.status_of(ids[0]), Some(HoleStatus::PickedUp));
    assert_eq!(golf.scorecard().strokes(ids[0], 0), 5);
}

#[test]
fn honors_decide_the_next_tee_order() {
    let (mut golf, ids) = seated(&["Ann", "Bo"]);
    golf.start().unwrap();
    golf.begin_hole(0).unwrap();
    finish_active(&mut golf, 4); // Ann
    let last = finish_active(&mut golf, 2); // Bo
    assert_eq!(last.next, NextTurn::HoleComplete);
    assert_eq!(golf.phase(), MatchPhase::BetweenHoles);
    assert_eq!(golf.advance_hole(), HoleAdvance::Next(1));
    assert_eq!(golf.begin_hole(1), Ok(ids[1]));
}

#[test]
fn match_over_produces_competition_ranking() {
    let (mut golf, ids) = seated(&["Ann", "Bo", "Cy"]);
    golf.start().unwrap();
    golf.begin_hole(0).unwrap();
    finish_active(&mut golf, 3); // Ann par
    finish_active(&mut golf, 3); // Bo par
    finish_active(&mut golf, 5); // Cy
    golf.advance_hole();
    golf.begin_hole(1).unwrap(); // Ann & Bo tied on honors keep seat order
    assert_eq!(golf.current_player(), Some(ids[0]));
    finish_active(&mut golf, 4);
    finish_active(&mut golf, 4);
    let last = finish_active(&mut golf, 2);
    assert_eq!(last.next, NextTurn::HoleComplete);

    let HoleAdvance::MatchOver(standings) = golf.advance_hole() else {
        panic!("expected the match to be over");
    };
    assert_eq!(golf.phase(), MatchPhase::Finished);
    let ranks: Vec<(PlayerId, u32, u32, i32)> =
        standings.iter().map(|s| (s.player, s.total, s.rank, s.to_par)).collect();
    assert_eq!(
        ranks,
        vec![(ids[0], 7, 1, 0), (ids[1], 7, 1, 0), (ids[2], 7, 1, 0)]
    );
}

#[test]
fn ties_share_a_rank_and_the_next_rank_skips() {
    let (mut golf, ids) = seated(&["Ann", "Bo", "Cy"]);
    golf.start().unwrap();
    golf.begin_hole(0).unwrap();
    finish_active(&mut golf, 2);
    finish_active(&mut golf, 2);
    finish_active(&mut golf, 4);
    let standings = golf.standings();
    assert_eq!(standings[0].rank, 1);
    assert_eq!(standings[1].rank, 1);
    assert_eq!(standings[2].player, ids[2]);
    assert_eq!(standings[2].rank, 3);
    assert_eq!(standings[2].to_par, 1);
}

#[test]
fn leaving_mid_turn_passes_play_to_the_next_seat() {
    let (mut golf, ids) = seated(&["Ann", "Bo", "Cy"]);
    golf.start().unwrap();
    golf.begin_hole(0).unwrap();
    golf.end_turn(); // Bo's turn
    let turn = golf.turn_number();
    let removal = golf.remove(ids[1]).unwrap();
    assert!(removal.was_active);
    assert!(!removal.roster_empty);
    assert_eq!(golf.current_player(), None);
    assert_eq!(golf.end_turn().next, NextTurn::Player(ids[2]));
    assert_eq!(golf.turn_number(), turn + 1);
    assert_eq!(golf.remove(ids[1]), Err(MatchError::UnknownPlayer(ids[1])));
}

#[test]
fn earlier_seat_leaving_after_the_active_player_keeps_the_next_seat() {
    let mut golf = GolfMatch::new(RulesDef { max_players: 4, ..rules() }, vec![3]);
    let ids: Vec<PlayerId> = ["Ann", "Bo", "Cy", "Dee"].iter().map(|n| golf.admit(n).unwrap().0).collect();
    golf.start().unwrap();
    golf.begin_hole(0).unwrap();
    golf.end_turn(); // Bo's turn

    // Both leave before the turn is resolved.
    assert!(golf.remove(ids[1]).unwrap().was_active);
    assert!(!golf.remove(ids[0]).unwrap().was_active);
    assert_eq!(golf.end_turn().next, NextTurn::Player(ids[2]));
    assert_eq!(golf.end_turn().next, NextTurn::Player(ids[3]));
}

#[test]
fn late_joiners_spectate_until_the_next_lobby() {
    let (mut golf, ids) = seated(&["Ann"]);
    golf.start().unwrap();
    golf.begin_hole(0).unwrap();
    let (late, seat) = golf.admit("Late").unwrap();
    assert_eq!(seat, Seat::Spectator);
    assert_eq!(golf.record_stroke(late), Err(MatchError::NotYourTurn(late)));

    let first_id = golf.id();
    golf.reset_to_lobby();
    assert_ne!(golf.id(), first_id);
    assert_eq!(golf.phase(), MatchPhase::Lobby);
    let roster: Vec<PlayerId> = golf.roster().iter().map(|p| p.id).collect();
    assert_eq!(roster, vec![ids[0], late]);
    assert!(golf.spectators().is_empty());
}

#[test]
fn shot_clock_expires_once_per_turn() {
    let (mut golf, ids) = seated(&["Ann", "Bo"]);
    golf.start().unwrap();
    golf.begin_hole(0).unwrap();
    assert!(!golf.tick_shot_clock(6.0));
    assert_eq!(golf.shot_clock_remaining(), Some(4.0));
    assert!(golf.tick_shot_clock(4.0));
    assert!(!golf.tick_shot_clock(20.0), "clock stays quiet until the turn ends");
    golf.end_turn();
    assert_eq!(golf.current_player(), Some(ids[1]));
    assert_eq!(golf.shot_clock_remaining(), Some(10.0));
}

#[test]
fn score_labels() {
    assert_eq!(score_label(1, 3), "Hole in one!");
    assert_eq!(score_label(2, 3), "Birdie");
    assert_eq!(score_label(3, 3), "Par");
    assert_eq!(score_label(5, 3), "Double bogey");
    assert_eq!(score_label(9, 3), "+6");
}
