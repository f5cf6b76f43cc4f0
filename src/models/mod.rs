use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of a classic-league standings page for a single gameweek.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameweekStanding {
    pub entry: u64,
    pub player_name: String,
    pub entry_name: String,
    pub event_total: i32,
    pub total: i32,
    pub rank: u32,
}

/// Standings for one gameweek, kept in the order the pages were fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameweekData {
    pub gameweek: u32,
    pub standings: Vec<GameweekStanding>,
}

/// A manager's score line for a single gameweek.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameweekScore {
    pub points: i32,
    pub total_points: i32,
    pub rank: u32,
}

/// Denormalized view of one manager across every fetched gameweek.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerRecord {
    pub id: u64,
    pub name: String,
    pub team_name: String,
    pub gameweeks: BTreeMap<u32, GameweekScore>,
}

impl ManagerRecord {
    /// Most recent gameweek on record, if any.
    pub fn latest(&self) -> Option<(u32, &GameweekScore)> {
        self.gameweeks
            .iter()
            .next_back()
            .map(|(gameweek, score)| (*gameweek, score))
    }

    pub fn format(&self) -> String {
        match self.latest() {
            Some((gameweek, score)) => format!(
                "{} ({}) | GW{}: {} pts | Total: {} | Rank: {}",
                self.name, self.team_name, gameweek, score.points, score.total_points, score.rank
            ),
            None => format!("{} ({}) | no gameweeks recorded", self.name, self.team_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ManagerRecord {
        let mut gameweeks = BTreeMap::new();
        gameweeks.insert(
            1,
            GameweekScore {
                points: 61,
                total_points: 61,
                rank: 4,
            },
        );
        gameweeks.insert(
            2,
            GameweekScore {
                points: 48,
                total_points: 109,
                rank: 2,
            },
        );
        ManagerRecord {
            id: 100,
            name: "Alex Ferguson".to_string(),
            team_name: "Team A".to_string(),
            gameweeks,
        }
    }

    #[test]
    fn latest_picks_highest_gameweek() {
        let record = record();
        let (gameweek, score) = record.latest().unwrap();
        assert_eq!(gameweek, 2);
        assert_eq!(score.total_points, 109);
    }

    #[test]
    fn format_summarizes_latest_gameweek() {
        assert_eq!(
            record().format(),
            "Alex Ferguson (Team A) | GW2: 48 pts | Total: 109 | Rank: 2"
        );
    }
}
