use std::collections::HashMap;

use crate::models::{GameweekData, GameweekScore, ManagerRecord};

/// Reshape raw per-gameweek standings into one record per manager.
///
/// Pure function. Managers are keyed by their entry id; `name` and `team_name`
/// are taken from the first gameweek a manager appears in (they are not
/// expected to change). Output order is first-seen order in the raw data.
pub fn process_gameweek_data(all_gameweek_data: &[GameweekData]) -> Vec<ManagerRecord> {
    let mut records: Vec<ManagerRecord> = Vec::new();
    let mut index_by_id: HashMap<u64, usize> = HashMap::new();

    for page in all_gameweek_data {
        for standing in &page.standings {
            let index = *index_by_id.entry(standing.entry).or_insert_with(|| {
                records.push(ManagerRecord {
                    id: standing.entry,
                    name: standing.player_name.clone(),
                    team_name: standing.entry_name.clone(),
                    gameweeks: Default::default(),
                });
                records.len() - 1
            });

            records[index].gameweeks.insert(
                page.gameweek,
                GameweekScore {
                    points: standing.event_total,
                    total_points: standing.total,
                    rank: standing.rank,
                },
            );
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GameweekStanding;

    fn standing(entry: u64, name: &str, team: &str, event_total: i32, total: i32, rank: u32) -> GameweekStanding {
        GameweekStanding {
            entry,
            player_name: name.to_string(),
            entry_name: team.to_string(),
            event_total,
            total,
            rank,
        }
    }

    #[test]
    fn one_record_per_distinct_manager() {
        let data = vec![
            GameweekData {
                gameweek: 1,
                standings: vec![
                    standing(100, "Alice", "Team A", 60, 60, 1),
                    standing(200, "Bob", "Team B", 55, 55, 2),
                ],
            },
            GameweekData {
                gameweek: 2,
                standings: vec![
                    standing(100, "Alice", "Team A", 40, 100, 1),
                    standing(300, "Cara", "Team C", 70, 70, 3),
                ],
            },
        ];

        let records = process_gameweek_data(&data);
        assert_eq!(records.len(), 3);

        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![100, 200, 300]);
    }

    #[test]
    fn gameweek_map_holds_exactly_the_gameweeks_seen() {
        let data = vec![
            GameweekData {
                gameweek: 2,
                standings: vec![standing(100, "Alice", "Team A", 45, 95, 5)],
            },
            GameweekData {
                gameweek: 5,
                standings: vec![standing(100, "Alice", "Team A", 80, 260, 1)],
            },
        ];

        let records = process_gameweek_data(&data);
        assert_eq!(records.len(), 1);

        let gameweeks = &records[0].gameweeks;
        assert_eq!(gameweeks.keys().copied().collect::<Vec<_>>(), vec![2, 5]);
        assert_eq!(
            gameweeks[&2],
            GameweekScore {
                points: 45,
                total_points: 95,
                rank: 5
            }
        );
        assert_eq!(
            gameweeks[&5],
            GameweekScore {
                points: 80,
                total_points: 260,
                rank: 1
            }
        );
    }

    #[test]
    fn processing_is_idempotent() {
        let data = vec![
            GameweekData {
                gameweek: 1,
                standings: vec![
                    standing(100, "Alice", "Team A", 60, 60, 1),
                    standing(200, "Bob", "Team B", 55, 55, 2),
                ],
            },
            GameweekData {
                gameweek: 2,
                standings: vec![standing(200, "Bob", "Team B", 62, 117, 1)],
            },
        ];

        assert_eq!(process_gameweek_data(&data), process_gameweek_data(&data));
    }

    #[test]
    fn first_seen_name_and_team_win() {
        let data = vec![
            GameweekData {
                gameweek: 1,
                standings: vec![standing(100, "Alice", "Team A", 60, 60, 1)],
            },
            GameweekData {
                gameweek: 2,
                standings: vec![standing(100, "Alice Renamed", "Team A FC", 40, 100, 1)],
            },
        ];

        let records = process_gameweek_data(&data);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Alice");
        assert_eq!(records[0].team_name, "Team A");
        assert_eq!(records[0].gameweeks.len(), 2);
    }

    #[test]
    fn manager_across_two_gameweeks_keeps_one_record() {
        let data = vec![
            GameweekData {
                gameweek: 1,
                standings: vec![standing(100, "Alice", "Team A", 61, 61, 4)],
            },
            GameweekData {
                gameweek: 2,
                standings: vec![standing(100, "Alice", "Team A", 48, 109, 2)],
            },
        ];

        let records = process_gameweek_data(&data);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 100);
        assert_eq!(records[0].team_name, "Team A");
        assert_eq!(records[0].gameweeks.len(), 2);
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert!(process_gameweek_data(&[]).is_empty());
    }
}
